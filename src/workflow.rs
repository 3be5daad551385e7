//! Pure decisions of the permit-letter lifecycle: status and phase values,
//! attachment destination routing, and the notification text a transition
//! produces. Handlers in `routes::permit_letters` do the I/O.

use std::fmt;

use serde_json::{json, Value};

pub const ROLE_ADMIN: &str = "ADMIN";

pub const EVENT_USER_PERMIT_LETTER: &str = "user_permit_letter";
pub const EVENT_ADMIN_PERMIT_LETTER: &str = "admin_permit_letter";

/// Coarse approval outcome of the current submission. The engine accepts
/// operator-defined values verbatim; `Other` carries them unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    Pending,
    Approved,
    Rejected,
    Other(String),
}

impl UploadStatus {
    pub fn parse(value: &str) -> Self {
        match value {
            "PENDING" => Self::Pending,
            "APPROVED" => Self::Approved,
            "REJECTED" => Self::Rejected,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Other(value) => value,
        }
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position within the approval workflow. Conventional progression is
/// Draft -> Verifikasi 3 -> Approval -> Release, but the engine does not
/// reject out-of-order transitions; any value is stored as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Draft,
    Verifikasi3,
    Approval,
    Release,
    Other(String),
}

impl Phase {
    pub fn parse(value: &str) -> Self {
        match value {
            "Draft" => Self::Draft,
            "Verifikasi 3" => Self::Verifikasi3,
            "Approval" => Self::Approval,
            "Release" => Self::Release,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Draft => "Draft",
            Self::Verifikasi3 => "Verifikasi 3",
            Self::Approval => "Approval",
            Self::Release => "Release",
            Self::Other(value) => value,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentSlot {
    Primary,
    Released,
}

impl AttachmentSlot {
    /// Directory under the public upload root that this slot writes to.
    pub fn directory(&self) -> &'static str {
        match self {
            Self::Primary => "permit_letters",
            Self::Released => "permit_letters_released",
        }
    }
}

/// Only an administrator pushing the record into the Release phase writes
/// the released slot; every other combination targets the primary slot.
pub fn choose_destination(role: &str, new_phase: Option<&Phase>) -> AttachmentSlot {
    match new_phase {
        Some(Phase::Release) if role == ROLE_ADMIN => AttachmentSlot::Released,
        _ => AttachmentSlot::Primary,
    }
}

/// Derives the single notification message for an update, if any.
///
/// Precedence is upload_status, then note, then phase: an update touching
/// several tracked fields produces exactly one message, not one per field.
/// A field counts as changed when the request carries it.
pub fn update_message(
    upload_status: Option<&UploadStatus>,
    note: Option<&str>,
    phase: Option<&Phase>,
) -> Option<String> {
    if let Some(status) = upload_status {
        let message = match status {
            UploadStatus::Approved => "Upload Status is APPROVED.".to_string(),
            UploadStatus::Rejected => {
                "Upload Status is REJECTED. Please review the notes for more details.".to_string()
            }
            other => format!("Your permit letter status has been updated to: {other}"),
        };
        return Some(message);
    }

    if note.is_some() {
        return Some(
            "Your permit letter has been updated. Please review the notes for more details."
                .to_string(),
        );
    }

    phase.map(|phase| match phase {
        Phase::Draft | Phase::Verifikasi3 | Phase::Approval => {
            format!("Your permit letter status has been updated to {phase}")
        }
        Phase::Release => format!("Your permit letter is {phase}, you might want to check it"),
        Phase::Other(_) => "Your permit letter status has been updated.".to_string(),
    })
}

/// A notification the workflow decided to send, not yet persisted or
/// delivered. `notify::emit` executes these.
#[derive(Debug, Clone)]
pub struct NotificationIntent {
    pub recipient: i64,
    pub event_type: &'static str,
    pub data: Value,
    pub push_title: String,
    pub push_body: String,
}

impl NotificationIntent {
    pub fn record_created(record_id: i64, submitter: i64) -> Self {
        let message = "Your permit letter has been uploaded and is awaiting review.";
        Self {
            recipient: submitter,
            event_type: EVENT_USER_PERMIT_LETTER,
            data: json!({ "permit_letter_id": record_id, "message": message }),
            push_title: "Permit Letter Uploaded".to_string(),
            push_body: message.to_string(),
        }
    }

    pub fn record_submitted(record_id: i64, admin: i64, submitter: &str, division: &str) -> Self {
        Self {
            recipient: admin,
            event_type: EVENT_ADMIN_PERMIT_LETTER,
            data: json!({ "permit_letter_id": record_id }),
            push_title: "Permit Letter Submitted".to_string(),
            push_body: format!(
                "{submitter} from {division} has submitted a permit letter and is awaiting your review."
            ),
        }
    }

    pub fn record_updated(record_id: i64, owner: i64, message: String) -> Self {
        Self {
            recipient: owner,
            event_type: EVENT_USER_PERMIT_LETTER,
            data: json!({ "permit_letter_id": record_id, "message": message }),
            push_title: "Permit Letter Update".to_string(),
            push_body: message,
        }
    }
}
