use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::models::Notification;
use crate::notify::NOTIFIABLE_USER;
use crate::schema::notifications;
use crate::state::AppState;

#[derive(Serialize)]
pub struct NotificationResponse {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub event_type: String,
    pub notifiable_type: String,
    pub notifiable_id: i64,
    pub data: String,
    pub read_at: Option<String>,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct NotificationListResponse {
    pub notifications: Vec<NotificationResponse>,
    pub unread_count: usize,
}

impl From<Notification> for NotificationResponse {
    fn from(row: Notification) -> Self {
        Self {
            id: row.id,
            event_type: row.event_type,
            notifiable_type: row.notifiable_type,
            notifiable_id: row.notifiable_id,
            data: row.data,
            read_at: row.read_at.map(|at| at.and_utc().to_rfc3339()),
            created_at: row.created_at.and_utc().to_rfc3339(),
        }
    }
}

pub async fn list_notifications(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<NotificationListResponse>> {
    let rows: Vec<Notification> = {
        let mut conn = state.db()?;
        notifications::table
            .filter(notifications::notifiable_type.eq(NOTIFIABLE_USER))
            .filter(notifications::notifiable_id.eq(user.user_id))
            .order(notifications::created_at.desc())
            .load(&mut conn)?
    };

    let unread_count = rows.iter().filter(|row| row.read_at.is_none()).count();
    Ok(Json(NotificationListResponse {
        notifications: rows.into_iter().map(NotificationResponse::from).collect(),
        unread_count,
    }))
}

pub async fn get_notification(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthenticatedUser,
) -> AppResult<Json<NotificationResponse>> {
    let row: Notification = {
        let mut conn = state.db()?;
        notifications::table
            .filter(notifications::id.eq(id))
            .filter(notifications::notifiable_type.eq(NOTIFIABLE_USER))
            .filter(notifications::notifiable_id.eq(user.user_id))
            .first(&mut conn)?
    };
    Ok(Json(row.into()))
}

pub async fn mark_notification_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthenticatedUser,
) -> AppResult<impl IntoResponse> {
    let now = Utc::now().naive_utc();
    let updated = {
        let mut conn = state.db()?;
        diesel::update(
            notifications::table
                .filter(notifications::id.eq(id))
                .filter(notifications::notifiable_type.eq(NOTIFIABLE_USER))
                .filter(notifications::notifiable_id.eq(user.user_id)),
        )
        .set((
            notifications::read_at.eq(Some(now)),
            notifications::updated_at.eq(now),
        ))
        .execute(&mut conn)?
    };

    if updated == 0 {
        return Err(AppError::not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_notification(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthenticatedUser,
) -> AppResult<impl IntoResponse> {
    let deleted = {
        let mut conn = state.db()?;
        diesel::delete(
            notifications::table
                .filter(notifications::id.eq(id))
                .filter(notifications::notifiable_type.eq(NOTIFIABLE_USER))
                .filter(notifications::notifiable_id.eq(user.user_id)),
        )
        .execute(&mut conn)?
    };

    if deleted == 0 {
        return Err(AppError::not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}
