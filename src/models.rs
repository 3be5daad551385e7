use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::*;

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub division: String,
    pub role: String,
    pub device_token: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub division: String,
    pub role: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = permit_letters)]
#[diesel(belongs_to(User, foreign_key = user_id))]
pub struct PermitLetter {
    pub id: i64,
    pub uraian: String,
    pub no_surat: String,
    pub kategori_permit_letter: String,
    pub sub_kategori_permit_letter: String,
    pub status_tahapan: String,
    pub nama_pt: String,
    pub tanggal: NaiveDate,
    pub produk_no_surat_mabes: Option<String>,
    pub dokumen: Option<String>,
    pub released_dokumen: Option<String>,
    pub note: Option<String>,
    pub upload_status: String,
    pub user_id: Option<i64>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = permit_letters)]
pub struct NewPermitLetter {
    pub uraian: String,
    pub no_surat: String,
    pub kategori_permit_letter: String,
    pub sub_kategori_permit_letter: String,
    pub status_tahapan: String,
    pub nama_pt: String,
    pub tanggal: NaiveDate,
    pub produk_no_surat_mabes: Option<String>,
    pub dokumen: Option<String>,
    pub note: Option<String>,
    pub upload_status: String,
    pub user_id: Option<i64>,
}

// None means "leave the column untouched"; only allow-listed fields appear here.
#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = permit_letters)]
pub struct PermitLetterChanges {
    pub uraian: Option<String>,
    pub no_surat: Option<String>,
    pub kategori_permit_letter: Option<String>,
    pub sub_kategori_permit_letter: Option<String>,
    pub status_tahapan: Option<String>,
    pub nama_pt: Option<String>,
    pub tanggal: Option<NaiveDate>,
    pub produk_no_surat_mabes: Option<String>,
    pub dokumen: Option<String>,
    pub released_dokumen: Option<String>,
    pub note: Option<String>,
    pub upload_status: Option<String>,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = notifications)]
pub struct Notification {
    pub id: Uuid,
    pub event_type: String,
    pub notifiable_type: String,
    pub notifiable_id: i64,
    pub data: String,
    pub read_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = notifications)]
pub struct NewNotification {
    pub id: Uuid,
    pub event_type: String,
    pub notifiable_type: String,
    pub notifiable_id: i64,
    pub data: String,
}
