use dialoguer::{theme::ColorfulTheme, Confirm, Input};
use fxdesk_core::interaction::{Interaction, PresetAnswers, Question};
use std::io::IsTerminal;

/// Flag values first, then a terminal prompt when attached to one, then the default.
pub struct TerminalInteraction {
    preset: PresetAnswers,
    assume_yes: bool,
    interactive: bool,
}

impl TerminalInteraction {
    pub fn new(preset: PresetAnswers, assume_yes: bool) -> Self {
        Self {
            preset,
            assume_yes,
            interactive: std::io::stdin().is_terminal(),
        }
    }
}

impl Interaction for TerminalInteraction {
    fn ask(&self, question: Question, default: &str) -> Option<String> {
        if let Some(answer) = self.preset.answer(question) {
            return Some(answer.to_string());
        }
        if !self.interactive {
            return Some(default.to_string());
        }
        // A closed or failed terminal cancels.
        let line: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt(question.prompt())
            .default(default.to_string())
            .allow_empty(true)
            .interact_text()
            .ok()?;
        if line.trim().is_empty() {
            Some(default.to_string())
        } else {
            Some(line)
        }
    }

    fn confirm(&self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        if !self.interactive {
            tracing::warn!(prompt, "not a terminal; pass --yes to confirm");
            return false;
        }
        Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .default(false)
            .interact()
            .unwrap_or(false)
    }
}
