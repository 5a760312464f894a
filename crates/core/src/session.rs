//! Single-user editing session: the selected content type, the form drafts, the
//! current preview, an optional image, and the favorites/schedule collections.
//!
//! Front ends (HTTP, CLI) drive a session through plain method calls and supply an
//! [`Interaction`] wherever the user has to name or confirm something.

use crate::analyze::{assess_risk, advise, RiskAssessment, WritingAdvice};
use crate::domain::content::{ContentType, RenderedContent};
use crate::domain::fields::{
    AnalysisFields, ContentFields, EducationFields, SignalFields, ValidationError,
};
use crate::domain::records::{
    Favorite, Frequency, ScheduledPost, TimeOfDay, DEFAULT_FAVORITE_NAME,
    DEFAULT_SCHEDULE_NAME,
};
use crate::image::{ImageAttachment, ImageError};
use crate::interaction::{Interaction, Question};
use crate::render::render;
use crate::storage::{Collection, CollectionError, KeyValueStore, MemoryStore};
use crate::submit::{SubmissionError, SubmissionPayload, Submitter};
use chrono::Utc;
use serde::{Deserialize, Serialize};

const DEFAULT_FREQUENCY: &str = "daily";
const DEFAULT_TIME_OF_DAY: &str = "09:00";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Collection(#[from] CollectionError),

    #[error(transparent)]
    Submission(#[from] SubmissionError),

    #[error(transparent)]
    Image(#[from] ImageError),
}

/// Field values for every form, kept while the user switches between types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drafts {
    pub signal: SignalFields,
    pub analysis: AnalysisFields,
    pub education: EducationFields,
}

/// Output of a successful generate: the text and both analyses of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Generated {
    pub content: RenderedContent,
    pub risk: RiskAssessment,
    pub advice: WritingAdvice,
}

pub struct Session {
    kv: Box<dyn KeyValueStore>,
    current: ContentType,
    drafts: Drafts,
    preview: Option<Generated>,
    image: Option<ImageAttachment>,
    favorites: Collection<Favorite>,
    schedules: Collection<ScheduledPost>,
}

impl Session {
    pub fn open(kv: Box<dyn KeyValueStore>) -> Result<Self, CollectionError> {
        let favorites = Collection::load(kv.as_ref())?;
        let schedules = Collection::load(kv.as_ref())?;
        tracing::debug!(
            favorites = favorites.list().len(),
            schedules = schedules.list().len(),
            "session opened"
        );
        Ok(Self {
            kv,
            current: ContentType::default(),
            drafts: Drafts::default(),
            preview: None,
            image: None,
            favorites,
            schedules,
        })
    }

    /// A session whose collections live only in memory.
    pub fn in_memory() -> Self {
        Self {
            kv: Box::new(MemoryStore::new()),
            current: ContentType::default(),
            drafts: Drafts::default(),
            preview: None,
            image: None,
            favorites: Collection::empty(),
            schedules: Collection::empty(),
        }
    }

    pub fn content_type(&self) -> ContentType {
        self.current
    }

    /// Switches the active form. Any preview belongs to the old type and is dropped.
    pub fn select(&mut self, content_type: ContentType) {
        if self.current != content_type {
            tracing::info!(from = %self.current, to = %content_type, "content type switched");
        }
        self.current = content_type;
        self.preview = None;
    }

    pub fn drafts(&self) -> &Drafts {
        &self.drafts
    }

    /// Replaces the draft matching the field set's type; the selection is unchanged.
    pub fn set_fields(&mut self, fields: ContentFields) {
        match fields {
            ContentFields::Signal(f) => self.drafts.signal = f,
            ContentFields::Analysis(f) => self.drafts.analysis = f,
            ContentFields::Education(f) => self.drafts.education = f,
        }
    }

    pub fn current_fields(&self) -> ContentFields {
        match self.current {
            ContentType::Signal => ContentFields::Signal(self.drafts.signal.clone()),
            ContentType::Analysis => ContentFields::Analysis(self.drafts.analysis.clone()),
            ContentType::Education => ContentFields::Education(self.drafts.education.clone()),
        }
    }

    /// Resets every draft, the preview and the attached image.
    pub fn clear(&mut self) {
        self.drafts = Drafts::default();
        self.preview = None;
        self.image = None;
    }

    pub fn render_current(&self) -> Result<RenderedContent, ValidationError> {
        render(&self.current_fields()).inspect_err(|e| {
            tracing::info!(content_type = %self.current, error = %e, "render rejected");
        })
    }

    /// Renders the current form and analyzes the result. On failure the previous
    /// preview is left as it was.
    pub fn generate(&mut self) -> Result<&Generated, ValidationError> {
        let content = self.render_current()?;
        let generated = Generated {
            risk: assess_risk(content.as_str()),
            advice: advise(content.as_str()),
            content,
        };
        tracing::debug!(
            content_type = %self.current,
            risk_score = generated.risk.score,
            advice = generated.advice.items().len(),
            "preview generated"
        );
        Ok(self.preview.insert(generated))
    }

    pub fn preview(&self) -> Option<&Generated> {
        self.preview.as_ref()
    }

    pub fn attach_image(&mut self, image: ImageAttachment) {
        tracing::info!(name = image.name(), bytes = image.len(), "image attached");
        self.image = Some(image);
    }

    pub fn detach_image(&mut self) -> Option<ImageAttachment> {
        self.image.take()
    }

    pub fn image(&self) -> Option<&ImageAttachment> {
        self.image.as_ref()
    }

    /// Builds the outbound payload from a fresh render of the current fields.
    pub fn prepare_submission(&self) -> Result<SubmissionPayload, SessionError> {
        let content = self.render_current()?;
        Ok(SubmissionPayload::new(&content, self.image.as_ref()))
    }

    pub async fn submit(
        &self,
        submitter: &dyn Submitter,
    ) -> Result<serde_json::Value, SessionError> {
        let payload = self.prepare_submission()?;
        tracing::info!(
            endpoint = submitter.endpoint(),
            content_type = %self.current,
            with_image = payload.image.is_some(),
            "submitting"
        );
        Ok(submitter.submit(&payload).await?)
    }

    pub fn favorites(&self) -> &[Favorite] {
        self.favorites.list()
    }

    pub fn favorite(&self, id: u64) -> Result<&Favorite, SessionError> {
        self.favorites.get(id).ok_or_else(|| {
            CollectionError::NotFound {
                collection: "favorites",
                id,
            }
            .into()
        })
    }

    /// Saves the current render as a favorite. `Ok(None)` when the user cancels naming.
    pub fn save_favorite(
        &mut self,
        ui: &dyn Interaction,
    ) -> Result<Option<Favorite>, SessionError> {
        let content = self.render_current()?;
        let Some(name) = ui.ask(Question::FavoriteName, DEFAULT_FAVORITE_NAME) else {
            return Ok(None);
        };

        let favorite = Favorite {
            id: 0,
            content_type: content.content_type(),
            rendered_text: content.into_string(),
            created_at: Utc::now(),
            display_name: display_name(&name, DEFAULT_FAVORITE_NAME),
        };
        let saved = self.favorites.add(self.kv.as_mut(), favorite)?;
        tracing::info!(id = saved.id, name = %saved.display_name, "favorite saved");
        Ok(Some(saved))
    }

    /// Deletes after confirmation. Returns `false` if the user declined.
    pub fn delete_favorite(&mut self, id: u64, ui: &dyn Interaction) -> Result<bool, SessionError> {
        let name = self.favorite(id)?.display_name.clone();
        if !ui.confirm(&format!("Delete favorite \"{name}\"?")) {
            return Ok(false);
        }
        self.favorites.remove(self.kv.as_mut(), id)?;
        tracing::info!(id, "favorite deleted");
        Ok(true)
    }

    pub fn schedules(&self) -> &[ScheduledPost] {
        self.schedules.list()
    }

    pub fn schedule(&self, id: u64) -> Result<&ScheduledPost, SessionError> {
        self.schedules.get(id).ok_or_else(|| {
            CollectionError::NotFound {
                collection: "scheduled_posts",
                id,
            }
            .into()
        })
    }

    /// Records an intent to post the current render on a schedule. Nothing runs it.
    pub fn schedule_post(
        &mut self,
        ui: &dyn Interaction,
    ) -> Result<Option<ScheduledPost>, SessionError> {
        let content = self.render_current()?;
        let Some(plan) = ask_plan(ui, DEFAULT_SCHEDULE_NAME, DEFAULT_FREQUENCY, DEFAULT_TIME_OF_DAY)?
        else {
            return Ok(None);
        };

        let post = ScheduledPost {
            id: 0,
            content_type: content.content_type(),
            rendered_text: content.into_string(),
            display_name: plan.name,
            frequency: plan.frequency,
            time_of_day: plan.time_of_day,
            active: true,
            created_at: Utc::now(),
        };
        let saved = self.schedules.add(self.kv.as_mut(), post)?;
        tracing::info!(
            id = saved.id,
            frequency = %saved.frequency,
            time_of_day = %saved.time_of_day,
            "scheduled post recorded"
        );
        Ok(Some(saved))
    }

    /// Re-asks name, frequency and time with the current values as defaults.
    pub fn edit_schedule(
        &mut self,
        id: u64,
        ui: &dyn Interaction,
    ) -> Result<Option<ScheduledPost>, SessionError> {
        let current = self.schedule(id)?.clone();
        let Some(plan) = ask_plan(
            ui,
            &current.display_name,
            current.frequency.as_str(),
            current.time_of_day.as_str(),
        )?
        else {
            return Ok(None);
        };

        let updated = self.schedules.update(self.kv.as_mut(), id, |post| {
            post.display_name = plan.name;
            post.frequency = plan.frequency;
            post.time_of_day = plan.time_of_day;
        })?;
        tracing::info!(id, "scheduled post edited");
        Ok(Some(updated))
    }

    pub fn toggle_schedule(&mut self, id: u64) -> Result<ScheduledPost, SessionError> {
        let updated = self
            .schedules
            .update(self.kv.as_mut(), id, |post| post.active = !post.active)?;
        tracing::info!(id, active = updated.active, "scheduled post toggled");
        Ok(updated)
    }

    pub fn delete_schedule(&mut self, id: u64, ui: &dyn Interaction) -> Result<bool, SessionError> {
        let name = self.schedule(id)?.display_name.clone();
        if !ui.confirm(&format!("Delete scheduled post \"{name}\"?")) {
            return Ok(false);
        }
        self.schedules.remove(self.kv.as_mut(), id)?;
        tracing::info!(id, "scheduled post deleted");
        Ok(true)
    }
}

struct Plan {
    name: String,
    frequency: Frequency,
    time_of_day: TimeOfDay,
}

/// Asks for the three schedule answers; `Ok(None)` if any prompt is cancelled.
fn ask_plan(
    ui: &dyn Interaction,
    name: &str,
    frequency: &str,
    time_of_day: &str,
) -> Result<Option<Plan>, ValidationError> {
    let Some(raw_name) = ui.ask(Question::ScheduleName, name) else {
        return Ok(None);
    };
    let Some(raw_frequency) = ui.ask(Question::Frequency, frequency) else {
        return Ok(None);
    };
    let Some(raw_time) = ui.ask(Question::TimeOfDay, time_of_day) else {
        return Ok(None);
    };

    Ok(Some(Plan {
        name: display_name(&raw_name, DEFAULT_SCHEDULE_NAME),
        frequency: Frequency::parse(&raw_frequency),
        time_of_day: TimeOfDay::parse(&raw_time)?,
    }))
}

fn display_name(raw: &str, default: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        default.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::PresetAnswers;
    use crate::storage::JsonFileStore;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSubmitter {
        sent: Mutex<Vec<SubmissionPayload>>,
    }

    #[async_trait::async_trait]
    impl Submitter for RecordingSubmitter {
        fn endpoint(&self) -> &str {
            "memory://submit"
        }

        async fn submit(
            &self,
            payload: &SubmissionPayload,
        ) -> Result<serde_json::Value, SubmissionError> {
            self.sent.lock().unwrap().push(payload.clone());
            Ok(serde_json::json!({"ok": true}))
        }
    }

    /// Declines every prompt.
    struct Cancel;

    impl Interaction for Cancel {
        fn ask(&self, _question: Question, _default: &str) -> Option<String> {
            None
        }

        fn confirm(&self, _prompt: &str) -> bool {
            false
        }
    }

    fn education() -> EducationFields {
        EducationFields {
            topic: "Risk Management".into(),
            level: "Beginner".into(),
            title: "Sizing".into(),
            body: "Risk a fixed fraction.".into(),
            key_points: "1. Use stops".into(),
            author: "Hans".into(),
        }
    }

    fn signal() -> SignalFields {
        SignalFields {
            symbol: "EURUSD".into(),
            timeframe: "1H".into(),
            direction: "BUY".into(),
            confidence: "High".into(),
            entry: "1.0850".into(),
            stop_loss: "1.0820".into(),
            analysis_text: "Holding support.".into(),
            risk_level: "Moderate".into(),
            author: "X".into(),
            ..Default::default()
        }
    }

    fn ready_session() -> Session {
        let mut session = Session::in_memory();
        session.set_fields(ContentFields::Signal(signal()));
        session.set_fields(ContentFields::Education(education()));
        session
    }

    #[test]
    fn switching_type_clears_preview() {
        let mut session = ready_session();
        session.generate().unwrap();
        assert!(session.preview().is_some());

        session.select(ContentType::Education);
        assert!(session.preview().is_none());
        assert_eq!(session.content_type(), ContentType::Education);

        let generated = session.generate().unwrap();
        assert_eq!(generated.content.content_type(), ContentType::Education);
    }

    #[test]
    fn failed_generate_produces_no_preview() {
        let mut session = Session::in_memory();
        session.select(ContentType::Analysis);
        let err = session.generate().unwrap_err();
        assert!(matches!(err, ValidationError::MissingFields(ref f) if f.len() == 7));
        assert!(session.preview().is_none());
    }

    #[test]
    fn failed_generate_keeps_previous_preview() {
        let mut session = ready_session();
        let first = session.generate().unwrap().clone();

        let mut broken = signal();
        broken.entry.clear();
        session.set_fields(ContentFields::Signal(broken));
        assert!(session.generate().is_err());

        assert_eq!(session.preview(), Some(&first));
    }

    #[test]
    fn generate_attaches_both_analyses() {
        let mut session = ready_session();
        let generated = session.generate().unwrap().clone();
        assert_eq!(generated.risk, assess_risk(generated.content.as_str()));
        assert_eq!(generated.advice, advise(generated.content.as_str()));
        assert!(!generated.advice.items().is_empty());
    }

    #[tokio::test]
    async fn submit_re_renders_current_fields() {
        let mut session = ready_session();
        session.generate().unwrap();

        let mut edited = signal();
        edited.symbol = "GBPUSD".into();
        session.set_fields(ContentFields::Signal(edited));

        let submitter = RecordingSubmitter::default();
        session.submit(&submitter).await.unwrap();

        let sent = submitter.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].message.contains("🎯 GBPUSD (1H)"));
        assert!(sent[0].image.is_none());
    }

    #[tokio::test]
    async fn submit_fails_fast_on_invalid_fields() {
        let mut session = ready_session();
        let mut broken = signal();
        broken.author.clear();
        session.set_fields(ContentFields::Signal(broken));

        let submitter = RecordingSubmitter::default();
        let err = session.submit(&submitter).await.unwrap_err();
        assert!(matches!(err, SessionError::Validation(_)));
        assert!(submitter.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn payload_carries_attached_image() {
        let mut session = ready_session();
        let image = ImageAttachment::from_bytes("chart.png", "image/png", vec![1, 2, 3]).unwrap();
        session.attach_image(image);

        let payload = session.prepare_submission().unwrap();
        assert_eq!(payload.image.as_deref(), Some("AQID"));
        assert_eq!(payload.image_name.as_deref(), Some("chart.png"));
        assert_eq!(payload.image_type.as_deref(), Some("image/png"));

        session.detach_image();
        assert!(session.prepare_submission().unwrap().image.is_none());
    }

    #[test]
    fn clear_resets_drafts_and_preview() {
        let mut session = ready_session();
        session.generate().unwrap();
        session.clear();
        assert_eq!(session.drafts(), &Drafts::default());
        assert!(session.preview().is_none());
        assert!(session.render_current().is_err());
    }

    #[test]
    fn favorites_use_default_name_and_confirmation() {
        let mut session = ready_session();

        let fav = session
            .save_favorite(&PresetAnswers::default())
            .unwrap()
            .unwrap();
        assert_eq!(fav.display_name, DEFAULT_FAVORITE_NAME);
        assert_eq!(fav.content_type, ContentType::Signal);
        assert!(fav.rendered_text.starts_with("📊 FOREX SIGNAL"));

        let named = PresetAnswers {
            favorite_name: Some("  Morning EURUSD ".into()),
            ..Default::default()
        };
        let second = session.save_favorite(&named).unwrap().unwrap();
        assert_eq!(second.display_name, "Morning EURUSD");
        assert_ne!(fav.id, second.id);
        assert_eq!(session.favorites().len(), 2);

        assert!(session.save_favorite(&Cancel).unwrap().is_none());
        assert_eq!(session.favorites().len(), 2);

        assert!(!session.delete_favorite(fav.id, &Cancel).unwrap());
        assert_eq!(session.favorites().len(), 2);

        assert!(session
            .delete_favorite(fav.id, &PresetAnswers::confirmed())
            .unwrap());
        assert_eq!(session.favorites()[0].id, second.id);

        let err = session
            .delete_favorite(fav.id, &PresetAnswers::confirmed())
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::Collection(CollectionError::NotFound { .. })
        ));
    }

    #[test]
    fn schedules_are_recorded_edited_and_toggled() {
        let mut session = ready_session();
        session.select(ContentType::Education);

        let post = session
            .schedule_post(&PresetAnswers::default())
            .unwrap()
            .unwrap();
        assert_eq!(post.display_name, DEFAULT_SCHEDULE_NAME);
        assert_eq!(post.frequency, Frequency::Daily);
        assert_eq!(post.time_of_day.as_str(), "09:00");
        assert!(post.active);
        assert_eq!(post.content_type, ContentType::Education);

        let edit = PresetAnswers {
            frequency: Some("Weekly".into()),
            time_of_day: Some("7:30".into()),
            ..Default::default()
        };
        let edited = session.edit_schedule(post.id, &edit).unwrap().unwrap();
        assert_eq!(edited.display_name, DEFAULT_SCHEDULE_NAME);
        assert_eq!(edited.frequency, Frequency::Weekly);
        assert_eq!(edited.time_of_day.as_str(), "07:30");

        let free_form = PresetAnswers {
            frequency: Some("  every Monday ".into()),
            ..Default::default()
        };
        let edited = session.edit_schedule(post.id, &free_form).unwrap().unwrap();
        assert_eq!(edited.frequency, Frequency::Other("every Monday".into()));
        assert_eq!(edited.frequency.as_str(), "every Monday");

        let toggled = session.toggle_schedule(post.id).unwrap();
        assert!(!toggled.active);
        assert!(session.toggle_schedule(post.id).unwrap().active);

        let bad = PresetAnswers {
            time_of_day: Some("late".into()),
            ..Default::default()
        };
        let err = session.edit_schedule(post.id, &bad).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Validation(ValidationError::InvalidValue { field: "timeOfDay", .. })
        ));
        assert_eq!(session.schedule(post.id).unwrap().time_of_day.as_str(), "07:30");

        assert!(matches!(
            session.toggle_schedule(post.id + 1),
            Err(SessionError::Collection(CollectionError::NotFound { .. }))
        ));

        assert!(session
            .delete_schedule(post.id, &PresetAnswers::confirmed())
            .unwrap());
        assert!(session.schedules().is_empty());
    }

    #[test]
    fn collections_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        let mut session = Session::open(Box::new(store.clone())).unwrap();
        session.set_fields(ContentFields::Signal(signal()));
        let fav = session
            .save_favorite(&PresetAnswers::default())
            .unwrap()
            .unwrap();
        let post = session
            .schedule_post(&PresetAnswers::default())
            .unwrap()
            .unwrap();

        let reopened = Session::open(Box::new(store)).unwrap();
        assert_eq!(reopened.favorites(), &[fav]);
        assert_eq!(reopened.schedules(), &[post]);
        // Drafts and selection are not persisted.
        assert_eq!(reopened.drafts(), &Drafts::default());
    }
}
