use chrono::{DateTime, Duration, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LetterError;

const DEFAULT_SENDER: &str = "Anonymous";
const DEFAULT_EXPIRY_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Letter {
    pub(crate) letter_id: String,
    pub(crate) sender: String,
    pub(crate) receiver: String,
    pub(crate) content: String,
    pub(crate) is_anonymous: bool,
    pub(crate) is_public: bool,
    pub(crate) created_at: String,
    pub(crate) expiry_date: Option<String>,
    pub(crate) views: u64,
}

impl Letter {
    /// Whether the stored expiry lies strictly before `now`.
    pub(crate) fn is_expired(&self, now: DateTime<Utc>) -> Result<bool, LetterError> {
        match &self.expiry_date {
            Some(raw) => Ok(parse_timestamp(raw)? < now),
            None => Ok(false),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum ExpiryDays {
    Text(String),
    Number(serde_json::Number),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateLetterRequest {
    sender: Option<String>,
    receiver: Option<String>,
    content: Option<String>,
    #[serde(default)]
    is_anonymous: bool,
    #[serde(default)]
    is_public: bool,
    expiry_days: Option<ExpiryDays>,
}

impl CreateLetterRequest {
    pub(crate) fn from_body(body: &[u8]) -> Result<Self, LetterError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return serde_json::from_str("{}")
                .map_err(|e| LetterError::Validation(format!("Invalid request body: {}", e)));
        }
        serde_json::from_slice(body)
            .map_err(|e| LetterError::Validation(format!("Invalid request body: {}", e)))
    }

    /// Validates the request and stamps a fresh record.
    pub(crate) fn into_letter(self, now: DateTime<Utc>) -> Result<Letter, LetterError> {
        let (receiver, content) = match (self.receiver, self.content) {
            (Some(r), Some(c)) => (r, c),
            _ => return Err(LetterError::Validation("Missing required fields".to_string())),
        };

        let expiry_date = match expiry_days(self.expiry_days)? {
            Some(days) => {
                let invalid = || LetterError::Validation("Invalid expiry days".to_string());
                let offset = Duration::try_days(days).ok_or_else(invalid)?;
                Some(format_timestamp(now.checked_add_signed(offset).ok_or_else(invalid)?))
            }
            None => None,
        };

        Ok(Letter {
            letter_id: uuid::Uuid::new_v4().to_string(),
            sender: self.sender.unwrap_or_else(|| DEFAULT_SENDER.to_string()),
            receiver,
            content,
            is_anonymous: self.is_anonymous,
            is_public: self.is_public,
            created_at: format_timestamp(now),
            expiry_date,
            views: 0,
        })
    }
}

/// `None` means the letter never expires.
fn expiry_days(raw: Option<ExpiryDays>) -> Result<Option<i64>, LetterError> {
    let invalid = || LetterError::Validation("Invalid expiry days".to_string());
    match raw {
        None => Ok(Some(DEFAULT_EXPIRY_DAYS)),
        Some(ExpiryDays::Number(number)) => whole_days(&number).map(Some).ok_or_else(invalid),
        Some(ExpiryDays::Text(text)) if text == "never" => Ok(None),
        Some(ExpiryDays::Text(text)) => text.trim().parse::<i64>().map(Some).map_err(|_| invalid()),
    }
}

/// Integral JSON numbers, including `3.0`, that fit in an `i64`.
fn whole_days(number: &serde_json::Number) -> Option<i64> {
    if let Some(days) = number.as_i64() {
        return Some(days);
    }
    let days = number.as_f64()?;
    (days.fract() == 0.0 && days >= i64::MIN as f64 && days < i64::MAX as f64).then(|| days as i64)
}

/// What a reader gets back. The visibility flags stay server-side.
#[derive(Debug, Serialize)]
pub(crate) struct LetterView {
    pub(crate) sender: String,
    pub(crate) receiver: String,
    pub(crate) content: String,
    pub(crate) created_at: String,
    pub(crate) views: u64,
}

impl LetterView {
    pub(crate) fn new(letter: Letter, views: u64) -> Self {
        Self {
            sender: letter.sender,
            receiver: letter.receiver,
            content: letter.content,
            created_at: letter.created_at,
            views,
        }
    }
}

pub(crate) fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Accepts RFC 3339, and naive ISO 8601 read as UTC.
pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, LetterError> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| LetterError::Internal(format!("Invalid expiry date {raw:?}: {e}")))
}
