use std::sync::Arc;

use diesel::{
    pg::PgConnection,
    r2d2::{ConnectionManager, PooledConnection},
};

use crate::{
    auth::jwt::JwtService,
    config::AppConfig,
    crypto::ReferenceCipher,
    db::PgPool,
    error::{AppError, AppResult},
    push::PushSender,
    storage::AttachmentStore,
};

type PgPooledConnection = PooledConnection<ConnectionManager<PgConnection>>;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    pub jwt: JwtService,
    pub cipher: ReferenceCipher,
    pub attachments: Arc<dyn AttachmentStore>,
    pub push: Arc<dyn PushSender>,
}

impl AppState {
    pub fn new(
        pool: PgPool,
        config: AppConfig,
        jwt: JwtService,
        attachments: Arc<dyn AttachmentStore>,
        push: Arc<dyn PushSender>,
    ) -> Self {
        let cipher = ReferenceCipher::new(&config.file_encryption_key);
        Self {
            pool,
            config: Arc::new(config),
            jwt,
            cipher,
            attachments,
            push,
        }
    }

    pub fn db(&self) -> AppResult<PgPooledConnection> {
        self.pool
            .get()
            .map_err(|err| AppError::internal(format!("database pool error: {err}")))
    }
}
