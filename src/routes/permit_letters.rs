use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{NaiveDate, Utc};
use diesel::dsl::sql;
use diesel::pg::Pg;
use diesel::sql_types::{Bool, Text};
use diesel::{prelude::*, result::DatabaseErrorKind};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::AuthenticatedUser;
use crate::dates::normalize_date;
use crate::error::{AppError, AppResult};
use crate::models::{NewPermitLetter, PermitLetter, PermitLetterChanges};
use crate::notify;
use crate::schema::{permit_letters, users};
use crate::state::AppState;
use crate::workflow::{
    choose_destination, update_message, AttachmentSlot, NotificationIntent, Phase, UploadStatus,
    ROLE_ADMIN,
};

#[derive(Serialize)]
pub struct PermitLetterResponse {
    pub id: i64,
    pub uraian: String,
    pub no_surat: String,
    pub tanggal: NaiveDate,
    pub kategori_permit_letter: String,
    pub sub_kategori_permit_letter: String,
    pub status_tahapan: String,
    pub note: Option<String>,
    pub upload_status: String,
    pub nama_pt: String,
    pub produk_no_surat_mabes: Option<String>,
    #[serde(rename = "dokumenUrl")]
    pub dokumen_url: Option<String>,
    pub released_dokumen_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Serialize)]
pub struct SearchMeta {
    pub total: i64,
    pub page: i64,
    #[serde(rename = "perPage")]
    pub per_page: i64,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub meta: SearchMeta,
    pub data: Vec<PermitLetterResponse>,
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub uraian: Option<String>,
    pub no_surat: Option<String>,
    pub nama_pt: Option<String>,
    pub kategori_permit_letter: Option<String>,
    pub sub_kategori_permit_letter: Option<String>,
    pub produk_no_surat_mabes: Option<String>,
    pub upload_status: Option<String>,
    pub tanggal: Option<String>,
    pub page: Option<String>,
    #[serde(rename = "perPage")]
    pub per_page: Option<String>,
}

/// Text fields a multipart request may carry. Only these ever reach the
/// record; anything else in the request body is dropped without error.
#[derive(Default)]
struct SubmittedFields {
    uraian: Option<String>,
    no_surat: Option<String>,
    tanggal: Option<String>,
    kategori_permit_letter: Option<String>,
    sub_kategori_permit_letter: Option<String>,
    status_tahapan: Option<String>,
    nama_pt: Option<String>,
    produk_no_surat_mabes: Option<String>,
    note: Option<String>,
    upload_status: Option<String>,
    dokumen: Option<(String, Vec<u8>)>,
}

async fn collect_fields(multipart: &mut Multipart) -> AppResult<SubmittedFields> {
    let mut fields = SubmittedFields::default();

    while let Some(field) = multipart.next_field().await.map_err(|err| {
        warn!(error = %err, "invalid multipart data");
        AppError::bad_request(format!("invalid multipart data: {err}"))
    })? {
        let name = field.name().map(|n| n.to_string());
        if name.as_deref() == Some("dokumen") {
            let filename = field
                .file_name()
                .map(|n| n.to_string())
                .unwrap_or_else(|| "dokumen".to_string());
            let bytes = field.bytes().await.map_err(|err| {
                warn!(error = %err, "failed to read attachment bytes");
                AppError::bad_request(format!("failed to read attachment: {err}"))
            })?;
            if !bytes.is_empty() {
                fields.dokumen = Some((filename, bytes.to_vec()));
            }
            continue;
        }

        let value = field.text().await.map_err(|err| {
            AppError::bad_request(format!("invalid multipart field: {err}"))
        })?;
        let value = value.trim().to_string();
        if value.is_empty() {
            continue;
        }

        match name.as_deref() {
            Some("uraian") => fields.uraian = Some(value),
            Some("no_surat") => fields.no_surat = Some(value),
            Some("tanggal") => fields.tanggal = Some(value),
            Some("kategori_permit_letter") => fields.kategori_permit_letter = Some(value),
            Some("sub_kategori_permit_letter") => fields.sub_kategori_permit_letter = Some(value),
            Some("status_tahapan") => fields.status_tahapan = Some(value),
            Some("nama_pt") => fields.nama_pt = Some(value),
            Some("produk_no_surat_mabes") => fields.produk_no_surat_mabes = Some(value),
            Some("note") => fields.note = Some(value),
            Some("upload_status") => fields.upload_status = Some(value),
            _ => {}
        }
    }

    Ok(fields)
}

pub async fn upload_permit_letter(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<PermitLetterResponse>)> {
    let fields = collect_fields(&mut multipart).await?;

    let mut missing = Vec::new();
    for (value, field) in [
        (&fields.uraian, "uraian"),
        (&fields.no_surat, "no_surat"),
        (&fields.tanggal, "tanggal"),
        (&fields.kategori_permit_letter, "kategori_permit_letter"),
        (
            &fields.sub_kategori_permit_letter,
            "sub_kategori_permit_letter",
        ),
        (&fields.status_tahapan, "status_tahapan"),
        (&fields.nama_pt, "nama_pt"),
    ] {
        if value.is_none() {
            missing.push(format!("{field} is required"));
        }
    }
    if !missing.is_empty() {
        return Err(AppError::bad_request(missing.join(", ")));
    }

    let tanggal = normalize_date(fields.tanggal.as_deref().unwrap_or_default())
        .ok_or_else(|| AppError::bad_request("invalid tanggal format"))?;
    let no_surat = fields.no_surat.clone().unwrap_or_default();

    // Advisory fast-fail; the unique constraint still decides at commit time.
    {
        let mut conn = state.db()?;
        let already_taken: bool = diesel::select(diesel::dsl::exists(
            permit_letters::table.filter(permit_letters::no_surat.eq(&no_surat)),
        ))
        .get_result(&mut conn)?;
        if already_taken {
            return Err(AppError::conflict("no_surat already exists"));
        }
    }

    let dokumen = match fields.dokumen {
        Some((filename, bytes)) => {
            let relative = state
                .attachments
                .store(AttachmentSlot::Primary.directory(), &filename, bytes)
                .await
                .map_err(AppError::internal)?;
            Some(state.cipher.encrypt(&relative).map_err(AppError::internal)?)
        }
        None => None,
    };

    // Initial status and attribution are never client-controlled.
    let new_record = NewPermitLetter {
        uraian: fields.uraian.unwrap_or_default(),
        no_surat,
        kategori_permit_letter: fields.kategori_permit_letter.unwrap_or_default(),
        sub_kategori_permit_letter: fields.sub_kategori_permit_letter.unwrap_or_default(),
        status_tahapan: fields.status_tahapan.unwrap_or_default(),
        nama_pt: fields.nama_pt.unwrap_or_default(),
        tanggal,
        produk_no_surat_mabes: fields.produk_no_surat_mabes,
        dokumen,
        note: fields.note,
        upload_status: UploadStatus::Pending.as_str().to_string(),
        user_id: Some(user.user_id),
    };

    let (record, admin_ids) = {
        let mut conn = state.db()?;
        let record: PermitLetter = match diesel::insert_into(permit_letters::table)
            .values(&new_record)
            .get_result(&mut conn)
        {
            Ok(record) => record,
            Err(diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                return Err(AppError::conflict(
                    "no_surat or produk_no_surat_mabes already exists",
                ));
            }
            Err(err) => return Err(AppError::from(err)),
        };

        let admin_ids: Vec<i64> = users::table
            .filter(users::role.eq(ROLE_ADMIN))
            .select(users::id)
            .load(&mut conn)?;

        (record, admin_ids)
    };

    info!(
        permit_letter_id = record.id,
        no_surat = %record.no_surat,
        submitter = user.user_id,
        "permit letter created"
    );

    let mut intents = vec![NotificationIntent::record_created(record.id, user.user_id)];
    for admin_id in admin_ids {
        intents.push(NotificationIntent::record_submitted(
            record.id,
            admin_id,
            &user.username,
            &user.division,
        ));
    }
    notify::emit_all(&state, intents).await;

    let response = to_response(&state, record).await;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn get_permit_letter(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<PermitLetterResponse>> {
    let record: PermitLetter = {
        let mut conn = state.db()?;
        permit_letters::table.find(id).first(&mut conn)?
    };
    Ok(Json(to_response(&state, record).await))
}

pub async fn latest_permit_letter(
    State(state): State<AppState>,
) -> AppResult<Json<PermitLetterResponse>> {
    let record: Option<PermitLetter> = {
        let mut conn = state.db()?;
        permit_letters::table
            .order(permit_letters::created_at.desc())
            .first(&mut conn)
            .optional()?
    };
    let record = record.ok_or_else(AppError::not_found)?;
    Ok(Json(to_response(&state, record).await))
}

pub async fn list_permit_letters(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<PermitLetterResponse>>> {
    let records: Vec<PermitLetter> = {
        let mut conn = state.db()?;
        permit_letters::table
            .order(permit_letters::created_at.desc())
            .load(&mut conn)?
    };
    Ok(Json(to_responses(&state, records).await))
}

pub async fn pending_permit_letters(
    state: State<AppState>,
) -> AppResult<Json<Vec<PermitLetterResponse>>> {
    by_upload_status(state, UploadStatus::Pending).await
}

pub async fn approved_permit_letters(
    state: State<AppState>,
) -> AppResult<Json<Vec<PermitLetterResponse>>> {
    by_upload_status(state, UploadStatus::Approved).await
}

pub async fn rejected_permit_letters(
    state: State<AppState>,
) -> AppResult<Json<Vec<PermitLetterResponse>>> {
    by_upload_status(state, UploadStatus::Rejected).await
}

async fn by_upload_status(
    State(state): State<AppState>,
    status: UploadStatus,
) -> AppResult<Json<Vec<PermitLetterResponse>>> {
    let records: Vec<PermitLetter> = {
        let mut conn = state.db()?;
        permit_letters::table
            .filter(permit_letters::upload_status.eq(status.as_str()))
            .order(permit_letters::created_at.desc())
            .load(&mut conn)?
    };
    Ok(Json(to_responses(&state, records).await))
}

pub async fn released_permit_letters(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<PermitLetterResponse>>> {
    let records: Vec<PermitLetter> = {
        let mut conn = state.db()?;
        permit_letters::table
            .filter(permit_letters::status_tahapan.eq(Phase::Release.as_str()))
            .order(permit_letters::created_at.desc())
            .load(&mut conn)?
    };
    Ok(Json(to_responses(&state, records).await))
}

pub async fn search_permit_letters(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<SearchResponse>> {
    let page = parse_page_number(params.page.as_deref(), 1);
    let per_page = parse_page_number(params.per_page.as_deref(), 10);

    let (total, records) = {
        let mut conn = state.db()?;
        let total: i64 = filtered_query(&params).count().get_result(&mut conn)?;
        let records: Vec<PermitLetter> = filtered_query(&params)
            .order(permit_letters::created_at.desc())
            .offset(page.saturating_sub(1).saturating_mul(per_page))
            .limit(per_page)
            .load(&mut conn)?;
        (total, records)
    };

    Ok(Json(SearchResponse {
        meta: SearchMeta {
            total,
            page,
            per_page,
        },
        data: to_responses(&state, records).await,
    }))
}

pub async fn update_permit_letter(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    user: AuthenticatedUser,
    mut multipart: Multipart,
) -> AppResult<Json<PermitLetterResponse>> {
    user.require_admin()?;

    let fields = collect_fields(&mut multipart).await?;

    let existing: PermitLetter = {
        let mut conn = state.db()?;
        permit_letters::table.find(id).first(&mut conn)?
    };

    let tanggal = match fields.tanggal.as_deref() {
        Some(raw) => Some(
            normalize_date(raw).ok_or_else(|| AppError::bad_request("invalid tanggal format"))?,
        ),
        None => None,
    };

    let new_status = fields.upload_status.as_deref().map(UploadStatus::parse);
    let new_phase = fields.status_tahapan.as_deref().map(Phase::parse);

    let mut changes = PermitLetterChanges {
        uraian: fields.uraian,
        no_surat: fields.no_surat,
        kategori_permit_letter: fields.kategori_permit_letter,
        sub_kategori_permit_letter: fields.sub_kategori_permit_letter,
        status_tahapan: fields.status_tahapan.clone(),
        nama_pt: fields.nama_pt,
        tanggal,
        produk_no_surat_mabes: fields.produk_no_surat_mabes,
        note: fields.note.clone(),
        upload_status: fields.upload_status.clone(),
        updated_at: Some(Utc::now().naive_utc()),
        ..Default::default()
    };

    if let Some((filename, bytes)) = fields.dokumen {
        let slot = choose_destination(&user.role, new_phase.as_ref());
        let relative = state
            .attachments
            .store(slot.directory(), &filename, bytes)
            .await
            .map_err(AppError::internal)?;
        let token = state.cipher.encrypt(&relative).map_err(AppError::internal)?;
        match slot {
            AttachmentSlot::Released => changes.released_dokumen = Some(token),
            AttachmentSlot::Primary => changes.dokumen = Some(token),
        }
    }

    let record: PermitLetter = {
        let mut conn = state.db()?;
        match diesel::update(permit_letters::table.find(id))
            .set(&changes)
            .get_result(&mut conn)
        {
            Ok(record) => record,
            Err(diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                return Err(AppError::conflict(
                    "no_surat or produk_no_surat_mabes already exists",
                ));
            }
            Err(err) => return Err(AppError::from(err)),
        }
    };

    // One notification per update at most, whatever combination of tracked
    // fields the request touched.
    let message = update_message(
        new_status.as_ref(),
        fields.note.as_deref(),
        new_phase.as_ref(),
    );
    if let (Some(message), Some(owner)) = (message, existing.user_id) {
        notify::emit(
            &state,
            NotificationIntent::record_updated(record.id, owner, message),
        )
        .await?;
    }

    info!(permit_letter_id = record.id, editor = user.user_id, "permit letter updated");

    Ok(Json(to_response(&state, record).await))
}

pub async fn delete_permit_letter(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    user: AuthenticatedUser,
) -> AppResult<impl IntoResponse> {
    user.require_admin()?;

    let record: PermitLetter = {
        let mut conn = state.db()?;
        permit_letters::table.find(id).first(&mut conn)?
    };

    // Stored files go first, best-effort; a pointer that no longer decrypts
    // or a file already gone must not block record removal.
    for token in [record.dokumen.as_deref(), record.released_dokumen.as_deref()]
        .into_iter()
        .flatten()
    {
        match state.cipher.decrypt(token) {
            Ok(relative) => {
                if let Err(err) = state.attachments.remove(&relative).await {
                    warn!(permit_letter_id = id, error = %err, "failed to remove attachment file");
                }
            }
            Err(err) => {
                warn!(permit_letter_id = id, error = %err, "attachment pointer failed to decrypt on delete");
            }
        }
    }

    {
        let mut conn = state.db()?;
        diesel::delete(permit_letters::table.find(id)).execute(&mut conn)?;
    }

    info!(permit_letter_id = id, editor = user.user_id, "permit letter deleted");

    Ok(StatusCode::NO_CONTENT)
}

fn filtered_query(params: &SearchParams) -> permit_letters::BoxedQuery<'static, Pg> {
    let mut query = permit_letters::table.into_boxed();

    if let Some(value) = present(&params.uraian) {
        query = query.filter(permit_letters::uraian.ilike(contains(value)));
    }
    if let Some(value) = present(&params.no_surat) {
        query = query.filter(permit_letters::no_surat.ilike(contains(value)));
    }
    if let Some(value) = present(&params.nama_pt) {
        query = query.filter(permit_letters::nama_pt.ilike(contains(value)));
    }
    if let Some(value) = present(&params.kategori_permit_letter) {
        query = query.filter(permit_letters::kategori_permit_letter.ilike(contains(value)));
    }
    if let Some(value) = present(&params.sub_kategori_permit_letter) {
        query = query.filter(permit_letters::sub_kategori_permit_letter.ilike(contains(value)));
    }
    if let Some(value) = present(&params.produk_no_surat_mabes) {
        query = query.filter(permit_letters::produk_no_surat_mabes.ilike(contains(value)));
    }
    if let Some(value) = present(&params.upload_status) {
        query = query.filter(permit_letters::upload_status.ilike(contains(value)));
    }
    if let Some(value) = present(&params.tanggal) {
        query = query.filter(
            sql::<Bool>("CAST(tanggal AS TEXT) ILIKE ").bind::<Text, _>(contains(value)),
        );
    }

    query
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn contains(value: &str) -> String {
    format!("%{value}%")
}

fn parse_page_number(raw: Option<&str>, default: i64) -> i64 {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .filter(|n| *n >= 1)
        .unwrap_or(default)
}

async fn to_responses(state: &AppState, records: Vec<PermitLetter>) -> Vec<PermitLetterResponse> {
    let mut out = Vec::with_capacity(records.len());
    for record in records {
        out.push(to_response(state, record).await);
    }
    out
}

async fn to_response(state: &AppState, record: PermitLetter) -> PermitLetterResponse {
    let dokumen_url = attachment_url(state, record.id, record.dokumen.as_deref()).await;
    let released_dokumen_url =
        attachment_url(state, record.id, record.released_dokumen.as_deref()).await;

    PermitLetterResponse {
        id: record.id,
        uraian: record.uraian,
        no_surat: record.no_surat,
        tanggal: record.tanggal,
        kategori_permit_letter: record.kategori_permit_letter,
        sub_kategori_permit_letter: record.sub_kategori_permit_letter,
        status_tahapan: record.status_tahapan,
        note: record.note,
        upload_status: record.upload_status,
        nama_pt: record.nama_pt,
        produk_no_surat_mabes: record.produk_no_surat_mabes,
        dokumen_url,
        released_dokumen_url,
        created_at: record.created_at.and_utc().to_rfc3339(),
        updated_at: record.updated_at.and_utc().to_rfc3339(),
    }
}

/// A record whose pointer no longer decrypts, or whose file is gone from
/// disk, still lists; it just carries a null URL.
async fn attachment_url(state: &AppState, record_id: i64, token: Option<&str>) -> Option<String> {
    let token = token?;
    let relative = match state.cipher.decrypt(token) {
        Ok(path) => path,
        Err(err) => {
            warn!(
                permit_letter_id = record_id,
                error = %err,
                "stored attachment pointer failed to decrypt"
            );
            return None;
        }
    };

    if state.attachments.exists(&relative).await {
        Some(format!(
            "{}/{relative}",
            state.config.app_url.trim_end_matches('/')
        ))
    } else {
        None
    }
}
