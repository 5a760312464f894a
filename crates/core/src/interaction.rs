//! Input and confirmation capability supplied by whatever front end drives a session.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Question {
    FavoriteName,
    ScheduleName,
    Frequency,
    TimeOfDay,
}

impl Question {
    pub fn prompt(self) -> &'static str {
        match self {
            Self::FavoriteName => "Name this favorite",
            Self::ScheduleName => "Name this scheduled post",
            Self::Frequency => "Frequency (daily, weekly, monthly, or your own)",
            Self::TimeOfDay => "Time of day (HH:MM)",
        }
    }
}

pub trait Interaction {
    /// Asks for a value. `None` means the user cancelled.
    fn ask(&self, question: Question, default: &str) -> Option<String>;

    fn confirm(&self, prompt: &str) -> bool;
}

/// Answers given up front, e.g. from a request body or command-line flags.
/// Unanswered questions take the offered default.
#[derive(Debug, Clone, Default)]
pub struct PresetAnswers {
    pub favorite_name: Option<String>,
    pub schedule_name: Option<String>,
    pub frequency: Option<String>,
    pub time_of_day: Option<String>,
    pub confirmed: bool,
}

impl PresetAnswers {
    pub fn confirmed() -> Self {
        Self {
            confirmed: true,
            ..Self::default()
        }
    }

    pub fn answer(&self, question: Question) -> Option<&str> {
        match question {
            Question::FavoriteName => self.favorite_name.as_deref(),
            Question::ScheduleName => self.schedule_name.as_deref(),
            Question::Frequency => self.frequency.as_deref(),
            Question::TimeOfDay => self.time_of_day.as_deref(),
        }
    }
}

impl Interaction for PresetAnswers {
    fn ask(&self, question: Question, default: &str) -> Option<String> {
        Some(self.answer(question).unwrap_or(default).to_string())
    }

    fn confirm(&self, _prompt: &str) -> bool {
        self.confirmed
    }
}
