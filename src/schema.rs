diesel::table! {
    notifications (id) {
        id -> Uuid,
        #[sql_name = "type"]
        #[max_length = 255]
        event_type -> Varchar,
        #[max_length = 255]
        notifiable_type -> Varchar,
        notifiable_id -> Int8,
        data -> Text,
        read_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    permit_letters (id) {
        id -> Int8,
        #[max_length = 255]
        uraian -> Varchar,
        #[max_length = 255]
        no_surat -> Varchar,
        #[max_length = 255]
        kategori_permit_letter -> Varchar,
        #[max_length = 255]
        sub_kategori_permit_letter -> Varchar,
        #[max_length = 50]
        status_tahapan -> Varchar,
        #[max_length = 255]
        nama_pt -> Varchar,
        tanggal -> Date,
        #[max_length = 255]
        produk_no_surat_mabes -> Nullable<Varchar>,
        dokumen -> Nullable<Text>,
        released_dokumen -> Nullable<Text>,
        #[max_length = 255]
        note -> Nullable<Varchar>,
        #[max_length = 50]
        upload_status -> Varchar,
        user_id -> Nullable<Int8>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    users (id) {
        id -> Int8,
        #[max_length = 100]
        username -> Varchar,
        #[max_length = 255]
        email -> Varchar,
        #[max_length = 255]
        password_hash -> Varchar,
        #[max_length = 100]
        division -> Varchar,
        #[max_length = 16]
        role -> Varchar,
        #[max_length = 255]
        device_token -> Nullable<Varchar>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(permit_letters -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(notifications, permit_letters, users,);
