use crate::domain::content::ContentType;
use crate::domain::fields::ValidationError;
use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_FAVORITE_NAME: &str = "Unnamed Favorite";
pub const DEFAULT_SCHEDULE_NAME: &str = "Unnamed Schedule";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub id: u64,
    pub content_type: ContentType,
    pub rendered_text: String,
    pub created_at: DateTime<Utc>,
    pub display_name: String,
}

/// A stored intent to post some content periodically. Nothing executes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledPost {
    pub id: u64,
    pub content_type: ContentType,
    pub rendered_text: String,
    pub display_name: String,
    pub frequency: Frequency,
    pub time_of_day: TimeOfDay,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// How often a scheduled post should go out. The usual cadences are typed; anything
/// else is kept as the user wrote it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Frequency {
    #[default]
    Daily,
    Weekly,
    Monthly,
    Other(String),
}

impl Frequency {
    /// Case-insensitive for the known cadences. Blank input means daily.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "" | "daily" => Self::Daily,
            "weekly" => Self::Weekly,
            "monthly" => Self::Monthly,
            _ => Self::Other(trimmed.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Frequency {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<Frequency> for String {
    fn from(value: Frequency) -> Self {
        match value {
            Frequency::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

/// `HH:MM`, 24-hour clock. Stored as the normalised string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay(String);

impl TimeOfDay {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let raw = raw.trim();
        NaiveTime::parse_from_str(raw, "%H:%M")
            .map(|t| Self(t.format("%H:%M").to_string()))
            .map_err(|_| ValidationError::invalid("timeOfDay", format!("{raw:?} is not HH:MM")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.0
    }
}
