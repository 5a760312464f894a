//! Raw form field sets as a browser form submits them, and their validated forms.
//!
//! Every field arrives as a string. Validation trims values, rejects empty required
//! fields (reporting all of them at once), then parses option and price fields.

use crate::domain::content::{
    Confidence, ContentType, Direction, EducationLevel, RiskLevel, UnknownChoice,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl ValidationError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignalFields {
    pub symbol: String,
    pub timeframe: String,
    pub direction: String,
    pub confidence: String,
    pub entry: String,
    pub stop_loss: String,
    pub take_profit1: Option<String>,
    pub take_profit2: Option<String>,
    pub analysis_text: String,
    pub risk_level: String,
    pub author: String,
    pub valid_until: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisFields {
    pub symbol: String,
    pub timeframe: String,
    pub analysis_type: String,
    pub title: String,
    pub body: String,
    pub conclusion: String,
    pub author: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EducationFields {
    pub topic: String,
    pub level: String,
    pub title: String,
    pub body: String,
    pub key_points: String,
    pub author: String,
}

/// One field set, tagged with its content type (`{"type": "signal", ...}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentFields {
    Signal(SignalFields),
    Analysis(AnalysisFields),
    Education(EducationFields),
}

impl ContentFields {
    pub fn content_type(&self) -> ContentType {
        match self {
            Self::Signal(_) => ContentType::Signal,
            Self::Analysis(_) => ContentType::Analysis,
            Self::Education(_) => ContentType::Education,
        }
    }
}

/// Expiry of a signal, kept in the form it was entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidUntil {
    /// Wall-clock value from a `datetime-local` input; no zone attached.
    Local(NaiveDateTime),
    Utc(DateTime<Utc>),
}

impl ValidUntil {
    fn parse(raw: &str) -> Option<Self> {
        for fmt in ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
                return Some(Self::Local(dt));
            }
        }
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| Self::Utc(dt.with_timezone(&Utc)))
    }

    pub fn display(&self) -> String {
        match self {
            Self::Local(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
            Self::Utc(dt) => format!("{} UTC", dt.format("%Y-%m-%d %H:%M")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidSignal {
    pub symbol: String,
    pub timeframe: String,
    pub direction: Direction,
    pub confidence: Confidence,
    pub entry: String,
    pub stop_loss: String,
    pub take_profit1: Option<String>,
    pub take_profit2: Option<String>,
    pub analysis_text: String,
    pub risk_level: RiskLevel,
    pub author: String,
    pub valid_until: Option<ValidUntil>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidAnalysis {
    pub symbol: String,
    pub timeframe: String,
    pub analysis_type: String,
    pub title: String,
    pub body: String,
    pub conclusion: String,
    pub author: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidEducation {
    pub topic: String,
    pub level: EducationLevel,
    pub title: String,
    pub body: String,
    pub key_points: String,
    pub author: String,
}

/// Collects the names of required fields whose trimmed value is empty.
fn missing(required: &[(&'static str, &str)]) -> Result<(), ValidationError> {
    let names: Vec<&'static str> = required
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();
    if names.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingFields(names))
    }
}

fn optional(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn choice<T>(field: &'static str, raw: &str) -> Result<T, ValidationError>
where
    T: std::str::FromStr<Err = UnknownChoice>,
{
    raw.parse::<T>()
        .map_err(|e| ValidationError::invalid(field, e.to_string()))
}

fn price(field: &'static str, raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(trimmed.to_string()),
        _ => Err(ValidationError::invalid(
            field,
            format!("{trimmed:?} is not a decimal price"),
        )),
    }
}

impl SignalFields {
    pub fn validate(&self) -> Result<ValidSignal, ValidationError> {
        missing(&[
            ("symbol", self.symbol.as_str()),
            ("timeframe", self.timeframe.as_str()),
            ("direction", self.direction.as_str()),
            ("confidence", self.confidence.as_str()),
            ("entry", self.entry.as_str()),
            ("stopLoss", self.stop_loss.as_str()),
            ("analysisText", self.analysis_text.as_str()),
            ("riskLevel", self.risk_level.as_str()),
            ("author", self.author.as_str()),
        ])?;

        let take_profit1 = optional(&self.take_profit1)
            .map(|v| price("takeProfit1", v))
            .transpose()?;
        let take_profit2 = optional(&self.take_profit2)
            .map(|v| price("takeProfit2", v))
            .transpose()?;
        let valid_until = optional(&self.valid_until)
            .map(|v| {
                ValidUntil::parse(v).ok_or_else(|| {
                    ValidationError::invalid("validUntil", format!("{v:?} is not a date-time"))
                })
            })
            .transpose()?;

        Ok(ValidSignal {
            symbol: self.symbol.trim().to_string(),
            timeframe: self.timeframe.trim().to_string(),
            direction: choice("direction", self.direction.as_str())?,
            confidence: choice("confidence", self.confidence.as_str())?,
            entry: price("entry", self.entry.as_str())?,
            stop_loss: price("stopLoss", self.stop_loss.as_str())?,
            take_profit1,
            take_profit2,
            analysis_text: self.analysis_text.trim().to_string(),
            risk_level: choice("riskLevel", self.risk_level.as_str())?,
            author: self.author.trim().to_string(),
            valid_until,
        })
    }
}

impl AnalysisFields {
    pub fn validate(&self) -> Result<ValidAnalysis, ValidationError> {
        missing(&[
            ("symbol", self.symbol.as_str()),
            ("timeframe", self.timeframe.as_str()),
            ("analysisType", self.analysis_type.as_str()),
            ("title", self.title.as_str()),
            ("body", self.body.as_str()),
            ("conclusion", self.conclusion.as_str()),
            ("author", self.author.as_str()),
        ])?;

        Ok(ValidAnalysis {
            symbol: self.symbol.trim().to_string(),
            timeframe: self.timeframe.trim().to_string(),
            analysis_type: self.analysis_type.trim().to_string(),
            title: self.title.trim().to_string(),
            body: self.body.trim().to_string(),
            conclusion: self.conclusion.trim().to_string(),
            author: self.author.trim().to_string(),
        })
    }
}

impl EducationFields {
    pub fn validate(&self) -> Result<ValidEducation, ValidationError> {
        missing(&[
            ("topic", self.topic.as_str()),
            ("level", self.level.as_str()),
            ("title", self.title.as_str()),
            ("body", self.body.as_str()),
            ("keyPoints", self.key_points.as_str()),
            ("author", self.author.as_str()),
        ])?;

        Ok(ValidEducation {
            topic: self.topic.trim().to_string(),
            level: choice("level", self.level.as_str())?,
            title: self.title.trim().to_string(),
            body: self.body.trim().to_string(),
            key_points: self.key_points.trim().to_string(),
            author: self.author.trim().to_string(),
        })
    }
}
