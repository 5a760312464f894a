use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Signal,
    Analysis,
    Education,
}

impl ContentType {
    pub const ALL: [ContentType; 3] = [Self::Signal, Self::Analysis, Self::Education];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Signal => "signal",
            Self::Analysis => "analysis",
            Self::Education => "education",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = UnknownChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "signal" => Ok(Self::Signal),
            "analysis" => Ok(Self::Analysis),
            "education" => Ok(Self::Education),
            _ => Err(UnknownChoice(s.to_string())),
        }
    }
}

/// A form value that does not name any of the allowed options.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown option {0:?}")]
pub struct UnknownChoice(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Buy,
    Sell,
    Neutral,
}

impl FromStr for Direction {
    type Err = UnknownChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" | "long" => Ok(Self::Buy),
            "sell" | "short" => Ok(Self::Sell),
            "neutral" | "wait" => Ok(Self::Neutral),
            _ => Err(UnknownChoice(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl FromStr for Confidence {
    type Err = UnknownChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(UnknownChoice(s.to_string())),
        }
    }
}

/// Risk appetite of a trading signal (not to be confused with the analyzer's risk tier).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Conservative,
    Moderate,
    Aggressive,
}

impl RiskLevel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Conservative => "Conservative",
            Self::Moderate => "Moderate",
            Self::Aggressive => "Aggressive",
        }
    }
}

impl FromStr for RiskLevel {
    type Err = UnknownChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "conservative" => Ok(Self::Conservative),
            "moderate" => Ok(Self::Moderate),
            "aggressive" => Ok(Self::Aggressive),
            _ => Err(UnknownChoice(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EducationLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl EducationLevel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Advanced => "Advanced",
        }
    }
}

impl FromStr for EducationLevel {
    type Err = UnknownChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            _ => Err(UnknownChoice(s.to_string())),
        }
    }
}

/// Final formatted text of one content type. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedContent {
    content_type: ContentType,
    text: String,
}

impl RenderedContent {
    pub(crate) fn new(content_type: ContentType, text: String) -> Self {
        Self { content_type, text }
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Display for RenderedContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choices_parse_case_insensitively() {
        assert_eq!("BUY".parse::<Direction>(), Ok(Direction::Buy));
        assert_eq!(" short ".parse::<Direction>(), Ok(Direction::Sell));
        assert_eq!("Wait".parse::<Direction>(), Ok(Direction::Neutral));
        assert_eq!("high".parse::<Confidence>(), Ok(Confidence::High));
        assert_eq!("AGGRESSIVE".parse::<RiskLevel>(), Ok(RiskLevel::Aggressive));
        assert_eq!("beginner".parse::<EducationLevel>(), Ok(EducationLevel::Beginner));
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    fn unknown_choice_names_the_value() {
        let err = "sideways".parse::<Direction>().unwrap_err();
        assert_eq!(err.to_string(), "unknown option \"sideways\"");
    }

    #[test]
    fn content_type_round_trips_through_serde() {
        let v = serde_json::to_value(ContentType::Education).unwrap();
        assert_eq!(v, serde_json::json!("education"));
        let back: ContentType = serde_json::from_value(v).unwrap();
        assert_eq!(back, ContentType::Education);
        assert_eq!("Analysis".parse::<ContentType>(), Ok(ContentType::Analysis));
    }
}
