//! Notification dispatch: a durable row first, then a best-effort push.

use diesel::prelude::*;
use tracing::{error, warn};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{NewNotification, Notification};
use crate::schema::{notifications, users};
use crate::state::AppState;
use crate::workflow::NotificationIntent;

pub const NOTIFIABLE_USER: &str = "User";

/// Persists the event, then attempts push delivery to the recipient's
/// registered device. The insert is the durability boundary: if it fails
/// the emit fails and no push is attempted. A failed push is only logged;
/// the record of "this happened" has already been committed.
pub async fn emit(state: &AppState, intent: NotificationIntent) -> AppResult<Notification> {
    let (stored, device_token) = {
        let mut conn = state.db()?;

        let row = NewNotification {
            id: Uuid::new_v4(),
            event_type: intent.event_type.to_string(),
            notifiable_type: NOTIFIABLE_USER.to_string(),
            notifiable_id: intent.recipient,
            data: serde_json::to_string(&intent.data)?,
        };
        diesel::insert_into(notifications::table)
            .values(&row)
            .execute(&mut conn)?;
        let stored: Notification = notifications::table.find(row.id).first(&mut conn)?;

        let device_token: Option<Option<String>> = users::table
            .find(intent.recipient)
            .select(users::device_token)
            .first(&mut conn)
            .optional()?;

        (stored, device_token.flatten())
    };

    if let Some(token) = device_token {
        let mut data = intent.data;
        if let serde_json::Value::Object(map) = &mut data {
            map.insert("type".to_string(), intent.event_type.into());
        }
        if let Err(err) = state
            .push
            .send(&token, &intent.push_title, &intent.push_body, &data)
            .await
        {
            warn!(
                notification_id = %stored.id,
                recipient = intent.recipient,
                error = %err,
                "push delivery failed"
            );
        }
    }

    Ok(stored)
}

/// Runs a sequence of independent emits; one recipient failing never
/// cancels the rest.
pub async fn emit_all(state: &AppState, intents: Vec<NotificationIntent>) {
    for intent in intents {
        let recipient = intent.recipient;
        if let Err(err) = emit(state, intent).await {
            error!(recipient, error = ?err, "failed to emit notification");
        }
    }
}
