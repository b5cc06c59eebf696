//! Opaque pagination cursors over the audit trail's total order.
//!
//! A cursor is the base64url (unpadded) encoding of `"{createdAt}|{id}"`,
//! where `createdAt` is RFC 3339 with microsecond precision, matching what
//! the timestamptz column stores. The `|` separator cannot appear in either
//! component. The id tie-breaker makes the `(created_at DESC, id DESC)`
//! order strict even when events share a timestamp.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use super::error::AuditError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub created_at: DateTime<Utc>,
    pub id: Uuid,
}

impl Cursor {
    pub fn new(created_at: DateTime<Utc>, id: Uuid) -> Self {
        Self { created_at, id }
    }

    pub fn encode(&self) -> String {
        let raw = format!(
            "{}|{}",
            self.created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
            self.id
        );
        URL_SAFE_NO_PAD.encode(raw)
    }

    pub fn decode(token: &str) -> Result<Self, AuditError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| AuditError::InvalidCursor("Invalid cursor".to_string()))?;
        let raw = String::from_utf8(bytes)
            .map_err(|_| AuditError::InvalidCursor("Invalid cursor".to_string()))?;

        let (timestamp, id) = raw
            .split_once('|')
            .ok_or_else(|| AuditError::InvalidCursor("Invalid cursor".to_string()))?;

        let created_at = DateTime::parse_from_rfc3339(timestamp)
            .map_err(|_| AuditError::InvalidCursor("Invalid cursor".to_string()))?
            .with_timezone(&Utc);
        let id = Uuid::parse_str(id)
            .map_err(|_| AuditError::InvalidCursor("Invalid cursor".to_string()))?;

        Ok(Self { created_at, id })
    }
}
