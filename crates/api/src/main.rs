use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, FromRequest, Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fxdesk_core::analyze::{analyze, Analysis};
use fxdesk_core::domain::content::ContentType;
use fxdesk_core::domain::fields::ContentFields;
use fxdesk_core::domain::records::{Favorite, ScheduledPost};
use fxdesk_core::image::{check_upload, ImageAttachment, ImageError, MAX_IMAGE_BYTES};
use fxdesk_core::interaction::PresetAnswers;
use fxdesk_core::session::{Generated, Session, SessionError};
use fxdesk_core::storage::{CollectionError, JsonFileStore};
use fxdesk_core::submit::{HttpSubmitter, Submitter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = fxdesk_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let session = match open_session(&settings) {
        Ok(session) => session,
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "collections unavailable; starting API with in-memory storage");
            Session::in_memory()
        }
    };
    let submitter = HttpSubmitter::from_settings(&settings)?;
    tracing::info!(endpoint = submitter.endpoint(), "submission endpoint configured");

    let state = AppState {
        session: Arc::new(Mutex::new(session)),
        submitter: Arc::new(submitter),
    };

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn open_session(settings: &fxdesk_core::config::Settings) -> anyhow::Result<Session> {
    use anyhow::Context;

    let dir = settings.data_dir();
    let store = JsonFileStore::open(&dir)
        .with_context(|| format!("open data dir {}", dir.display()))?;
    Session::open(Box::new(store)).context("load collections failed")
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/session/type", get(get_content_type).put(put_content_type))
        .route("/session/fields", put(put_fields))
        .route("/session/clear", post(clear_session))
        .route("/preview", post(preview))
        .route("/analyze", post(analyze_text))
        .route(
            "/image",
            put(put_image)
                .delete(delete_image)
                .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES as usize)),
        )
        .route("/submit", post(submit))
        .route("/favorites", get(list_favorites).post(add_favorite))
        .route("/favorites/:id", get(get_favorite).delete(delete_favorite))
        .route("/schedules", get(list_schedules).post(add_schedule))
        .route(
            "/schedules/:id",
            put(edit_schedule).delete(delete_schedule),
        )
        .route("/schedules/:id/toggle", post(toggle_schedule))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    session: Arc<Mutex<Session>>,
    submitter: Arc<dyn Submitter>,
}

enum ApiError {
    Session(SessionError),
    ConfirmationRequired(String),
    BadBody(String),
}

impl<E: Into<SessionError>> From<E> for ApiError {
    fn from(e: E) -> Self {
        Self::Session(e.into())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ErrorBody {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            Self::ConfirmationRequired(message) => {
                (StatusCode::CONFLICT, "confirmation_required", message)
            }
            Self::BadBody(message) => (StatusCode::BAD_REQUEST, "bad_request", message),
            Self::Session(e) => {
                let (status, kind) = classify(&e);
                let message = e.to_string();
                if status.is_server_error() {
                    let err = anyhow::Error::new(e);
                    sentry_anyhow::capture_anyhow(&err);
                    tracing::error!(error = %err, "request failed");
                }
                (status, kind, message)
            }
        };

        let body = ErrorBody {
            error: kind.to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

fn classify(e: &SessionError) -> (StatusCode, &'static str) {
    match e {
        SessionError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation"),
        SessionError::Collection(CollectionError::NotFound { .. }) => {
            (StatusCode::NOT_FOUND, "not_found")
        }
        SessionError::Collection(_) => (StatusCode::INTERNAL_SERVER_ERROR, "persistence"),
        SessionError::Image(ImageError::UnsupportedType { .. }) => {
            (StatusCode::UNSUPPORTED_MEDIA_TYPE, "image_type")
        }
        SessionError::Image(ImageError::TooLarge { .. } | ImageError::BodyTooLarge { .. }) => {
            (StatusCode::PAYLOAD_TOO_LARGE, "image_size")
        }
        SessionError::Image(ImageError::Io { .. }) => (StatusCode::INTERNAL_SERVER_ERROR, "image"),
        SessionError::Submission(_) => (StatusCode::BAD_GATEWAY, "submission"),
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct TypeBody {
    #[serde(rename = "type")]
    content_type: ContentType,
}

async fn get_content_type(State(state): State<AppState>) -> Json<TypeBody> {
    let session = state.session.lock().await;
    Json(TypeBody {
        content_type: session.content_type(),
    })
}

async fn put_content_type(
    State(state): State<AppState>,
    Json(body): Json<TypeBody>,
) -> Json<TypeBody> {
    let mut session = state.session.lock().await;
    session.select(body.content_type);
    Json(body)
}

async fn put_fields(
    State(state): State<AppState>,
    Json(fields): Json<ContentFields>,
) -> StatusCode {
    state.session.lock().await.set_fields(fields);
    StatusCode::NO_CONTENT
}

async fn clear_session(State(state): State<AppState>) -> StatusCode {
    state.session.lock().await.clear();
    StatusCode::NO_CONTENT
}

async fn preview(State(state): State<AppState>) -> Result<Json<Generated>, ApiError> {
    let mut session = state.session.lock().await;
    let generated = session.generate()?.clone();
    Ok(Json(generated))
}

#[derive(Debug, Deserialize)]
struct AnalyzeRequest {
    text: String,
}

async fn analyze_text(Json(req): Json<AnalyzeRequest>) -> Json<Analysis> {
    Json(analyze(&req.text))
}

#[derive(Debug, Deserialize)]
struct ImageQuery {
    name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageInfo {
    name: String,
    media_type: String,
    bytes: usize,
}

/// Raw image body. Type and declared length are checked from the headers before the
/// body is buffered; the route's body limit catches chunked uploads with no length.
struct ImageUpload {
    media_type: String,
    bytes: Bytes,
}

#[axum::async_trait]
impl<S: Send + Sync> FromRequest<S> for ImageUpload {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let media_type = header_str(req.headers(), header::CONTENT_TYPE).to_string();
        let declared = header_str(req.headers(), header::CONTENT_LENGTH)
            .parse::<u64>()
            .unwrap_or(0);
        check_upload(&media_type, declared)?;

        let bytes = Bytes::from_request(req, state).await.map_err(|rejection| {
            if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                ApiError::from(ImageError::BodyTooLarge {
                    limit: MAX_IMAGE_BYTES,
                })
            } else {
                ApiError::BadBody(rejection.body_text())
            }
        })?;
        Ok(Self { media_type, bytes })
    }
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> &str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

async fn put_image(
    State(state): State<AppState>,
    Query(query): Query<ImageQuery>,
    upload: ImageUpload,
) -> Result<Json<ImageInfo>, ApiError> {
    let name = query.name.unwrap_or_else(|| "image".to_string());
    let image = ImageAttachment::from_bytes(name, upload.media_type, upload.bytes.to_vec())?;

    let info = ImageInfo {
        name: image.name().to_string(),
        media_type: image.media_type().to_string(),
        bytes: image.len(),
    };
    state.session.lock().await.attach_image(image);
    Ok(Json(info))
}

async fn delete_image(State(state): State<AppState>) -> StatusCode {
    match state.session.lock().await.detach_image() {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}

async fn submit(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let payload = state.session.lock().await.prepare_submission()?;
    tracing::info!(
        endpoint = state.submitter.endpoint(),
        with_image = payload.image.is_some(),
        "submitting"
    );
    let response = state.submitter.submit(&payload).await?;
    Ok(Json(serde_json::json!({ "submitted": true, "response": response })))
}

/// JSON body that may be left empty; an empty body means every answer takes its default.
struct JsonOrEmpty<T>(T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for JsonOrEmpty<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadBody(rejection.body_text()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(T::default()));
        }
        serde_json::from_slice(&bytes)
            .map(Self)
            .map_err(|e| ApiError::BadBody(format!("invalid JSON body: {e}")))
    }
}

#[derive(Debug, Default, Deserialize)]
struct NameRequest {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConfirmQuery {
    #[serde(default)]
    confirm: bool,
}

async fn list_favorites(State(state): State<AppState>) -> Json<Vec<Favorite>> {
    Json(state.session.lock().await.favorites().to_vec())
}

async fn add_favorite(
    State(state): State<AppState>,
    JsonOrEmpty(req): JsonOrEmpty<NameRequest>,
) -> Result<Response, ApiError> {
    let answers = PresetAnswers {
        favorite_name: req.name,
        ..Default::default()
    };
    let saved = state.session.lock().await.save_favorite(&answers)?;
    Ok(created_or_empty(saved))
}

async fn get_favorite(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Favorite>, ApiError> {
    let session = state.session.lock().await;
    Ok(Json(session.favorite(id)?.clone()))
}

async fn delete_favorite(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Query(query): Query<ConfirmQuery>,
) -> Result<StatusCode, ApiError> {
    let answers = PresetAnswers {
        confirmed: query.confirm,
        ..Default::default()
    };
    if !state.session.lock().await.delete_favorite(id, &answers)? {
        return Err(ApiError::ConfirmationRequired(format!(
            "deleting favorite {id} requires ?confirm=true"
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleRequest {
    name: Option<String>,
    frequency: Option<String>,
    time_of_day: Option<String>,
}

impl From<ScheduleRequest> for PresetAnswers {
    fn from(req: ScheduleRequest) -> Self {
        Self {
            schedule_name: req.name,
            frequency: req.frequency,
            time_of_day: req.time_of_day,
            ..Default::default()
        }
    }
}

async fn list_schedules(State(state): State<AppState>) -> Json<Vec<ScheduledPost>> {
    Json(state.session.lock().await.schedules().to_vec())
}

async fn add_schedule(
    State(state): State<AppState>,
    JsonOrEmpty(req): JsonOrEmpty<ScheduleRequest>,
) -> Result<Response, ApiError> {
    let saved = state
        .session
        .lock()
        .await
        .schedule_post(&PresetAnswers::from(req))?;
    Ok(created_or_empty(saved))
}

async fn edit_schedule(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    JsonOrEmpty(req): JsonOrEmpty<ScheduleRequest>,
) -> Result<Json<Option<ScheduledPost>>, ApiError> {
    let updated = state
        .session
        .lock()
        .await
        .edit_schedule(id, &PresetAnswers::from(req))?;
    Ok(Json(updated))
}

async fn toggle_schedule(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<ScheduledPost>, ApiError> {
    Ok(Json(state.session.lock().await.toggle_schedule(id)?))
}

async fn delete_schedule(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Query(query): Query<ConfirmQuery>,
) -> Result<StatusCode, ApiError> {
    let answers = PresetAnswers {
        confirmed: query.confirm,
        ..Default::default()
    };
    if !state.session.lock().await.delete_schedule(id, &answers)? {
        return Err(ApiError::ConfirmationRequired(format!(
            "deleting scheduled post {id} requires ?confirm=true"
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}

fn created_or_empty<T: Serialize>(saved: Option<T>) -> Response {
    match saved {
        Some(item) => (StatusCode::CREATED, Json(item)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &fxdesk_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxdesk_core::submit::{SubmissionError, SubmissionPayload};
    use serde_json::{json, Value};

    #[derive(Default)]
    struct RecordingSubmitter {
        sent: std::sync::Mutex<Vec<SubmissionPayload>>,
    }

    #[async_trait::async_trait]
    impl Submitter for RecordingSubmitter {
        fn endpoint(&self) -> &str {
            "memory://submit"
        }

        async fn submit(&self, payload: &SubmissionPayload) -> Result<Value, SubmissionError> {
            self.sent.lock().unwrap().push(payload.clone());
            Ok(json!({"ok": true}))
        }
    }

    async fn serve() -> (String, Arc<RecordingSubmitter>) {
        let submitter = Arc::new(RecordingSubmitter::default());
        let state = AppState {
            session: Arc::new(Mutex::new(Session::in_memory())),
            submitter: submitter.clone(),
        };
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app(state)).await.unwrap();
        });
        (format!("http://{addr}"), submitter)
    }

    fn signal_fields() -> Value {
        json!({
            "type": "signal",
            "symbol": "EURUSD",
            "timeframe": "1H",
            "direction": "BUY",
            "confidence": "High",
            "entry": "1.0850",
            "stopLoss": "1.0820",
            "takeProfit1": "1.0900",
            "analysisText": "Holding support.",
            "riskLevel": "Moderate",
            "author": "X"
        })
    }

    #[tokio::test]
    async fn preview_reports_missing_fields_as_422() {
        let (base, _) = serve().await;
        let http = reqwest::Client::new();

        let res = http.post(format!("{base}/preview")).send().await.unwrap();
        assert_eq!(res.status(), 422);
        let body: ErrorBody = res.json().await.unwrap();
        assert_eq!(body.error, "validation");
        assert!(body.message.contains("symbol"));
    }

    #[tokio::test]
    async fn preview_then_submit_posts_the_render() {
        let (base, submitter) = serve().await;
        let http = reqwest::Client::new();

        let res = http
            .put(format!("{base}/session/fields"))
            .json(&signal_fields())
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 204);

        let preview: Value = http
            .post(format!("{base}/preview"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let text = preview["content"]["text"].as_str().unwrap();
        assert!(text.starts_with("📊 FOREX SIGNAL"));
        assert!(preview["risk"]["score"].is_u64());
        assert!(preview["advice"].is_array());

        let res = http.post(format!("{base}/submit")).send().await.unwrap();
        assert_eq!(res.status(), 200);
        let sent = submitter.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].message, text);
    }

    #[tokio::test]
    async fn switching_type_changes_what_preview_renders() {
        let (base, _) = serve().await;
        let http = reqwest::Client::new();

        http.put(format!("{base}/session/fields"))
            .json(&signal_fields())
            .send()
            .await
            .unwrap();
        let res = http
            .put(format!("{base}/session/type"))
            .json(&json!({"type": "analysis"}))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);

        let current: Value = http
            .get(format!("{base}/session/type"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(current, json!({"type": "analysis"}));

        let res = http.post(format!("{base}/preview")).send().await.unwrap();
        assert_eq!(res.status(), 422);
    }

    #[tokio::test]
    async fn image_upload_checks_type_before_attaching() {
        let (base, submitter) = serve().await;
        let http = reqwest::Client::new();

        let res = http
            .put(format!("{base}/image?name=doc.pdf"))
            .header(header::CONTENT_TYPE, "application/pdf")
            .body(vec![1u8, 2, 3])
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 415);

        let res = http
            .put(format!("{base}/image?name=chart.png"))
            .header(header::CONTENT_TYPE, "image/png")
            .body(vec![1u8, 2, 3])
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
        let info: ImageInfo = res.json().await.unwrap();
        assert_eq!(info.name, "chart.png");
        assert_eq!(info.bytes, 3);

        http.put(format!("{base}/session/fields"))
            .json(&signal_fields())
            .send()
            .await
            .unwrap();
        http.post(format!("{base}/submit")).send().await.unwrap();
        let sent = submitter.sent.lock().unwrap();
        assert_eq!(sent[0].image.as_deref(), Some("AQID"));
        assert_eq!(sent[0].image_type.as_deref(), Some("image/png"));
    }

    #[test]
    fn error_kinds_map_to_statuses() {
        let too_large = SessionError::from(ImageError::TooLarge {
            size: MAX_IMAGE_BYTES + 1,
            limit: MAX_IMAGE_BYTES,
        });
        assert_eq!(classify(&too_large), (StatusCode::PAYLOAD_TOO_LARGE, "image_size"));

        let missing = SessionError::from(CollectionError::NotFound {
            collection: "favorites",
            id: 1,
        });
        assert_eq!(classify(&missing), (StatusCode::NOT_FOUND, "not_found"));

        let rejected = SessionError::from(SubmissionError::Rejected {
            endpoint: "http://x".into(),
            status: 500,
            body: String::new(),
        });
        assert_eq!(classify(&rejected), (StatusCode::BAD_GATEWAY, "submission"));
    }

    #[tokio::test]
    async fn favorites_require_confirmation_to_delete() {
        let (base, _) = serve().await;
        let http = reqwest::Client::new();
        http.put(format!("{base}/session/fields"))
            .json(&signal_fields())
            .send()
            .await
            .unwrap();

        let res = http
            .post(format!("{base}/favorites"))
            .json(&json!({"name": "Morning call"}))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 201);
        let fav: Favorite = res.json().await.unwrap();
        assert_eq!(fav.display_name, "Morning call");

        let res = http
            .delete(format!("{base}/favorites/{}", fav.id))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 409);

        let listed: Vec<Favorite> = http
            .get(format!("{base}/favorites"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);

        let res = http
            .delete(format!("{base}/favorites/{}?confirm=true", fav.id))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 204);

        let res = http
            .get(format!("{base}/favorites/{}", fav.id))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 404);
    }

    #[tokio::test]
    async fn schedules_round_trip_through_routes() {
        let (base, _) = serve().await;
        let http = reqwest::Client::new();
        http.put(format!("{base}/session/fields"))
            .json(&signal_fields())
            .send()
            .await
            .unwrap();

        let post: ScheduledPost = http
            .post(format!("{base}/schedules"))
            .json(&json!({"frequency": "weekly", "timeOfDay": "8:15"}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(post.display_name, "Unnamed Schedule");
        assert_eq!(post.time_of_day.as_str(), "08:15");

        let res = http
            .put(format!("{base}/schedules/{}", post.id))
            .json(&json!({"frequency": "fortnightly"}))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
        let edited: ScheduledPost = res.json().await.unwrap();
        assert_eq!(edited.frequency.as_str(), "fortnightly");

        let res = http
            .put(format!("{base}/schedules/{}", post.id))
            .json(&json!({"timeOfDay": "25:00"}))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 422);

        let res = http
            .put(format!("{base}/schedules/{}", post.id))
            .json(&json!({"timeOfDay": 930}))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 400);
        let body: ErrorBody = res.json().await.unwrap();
        assert_eq!(body.error, "bad_request");

        let toggled: ScheduledPost = http
            .post(format!("{base}/schedules/{}/toggle", post.id))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(!toggled.active);

        let res = http
            .delete(format!("{base}/schedules/{}?confirm=true", post.id))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 204);
    }

    #[tokio::test]
    async fn favorite_body_is_optional_but_must_be_valid() {
        let (base, _) = serve().await;
        let http = reqwest::Client::new();
        http.put(format!("{base}/session/fields"))
            .json(&signal_fields())
            .send()
            .await
            .unwrap();

        let res = http
            .post(format!("{base}/favorites"))
            .json(&json!({"name": 5}))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 400);

        let res = http
            .post(format!("{base}/favorites"))
            .header(header::CONTENT_TYPE, "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 400);

        let listed: Vec<Favorite> = http
            .get(format!("{base}/favorites"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(listed.is_empty());

        let res = http.post(format!("{base}/favorites")).send().await.unwrap();
        assert_eq!(res.status(), 201);
        let fav: Favorite = res.json().await.unwrap();
        assert_eq!(fav.display_name, "Unnamed Favorite");
    }

    #[tokio::test]
    async fn chunked_image_over_limit_is_rejected_as_too_large() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let (base, _) = serve().await;
        let addr = base.trim_start_matches("http://").to_string();
        let stream = tokio::net::TcpStream::connect(&addr).await.unwrap();
        let (mut reader, mut writer) = stream.into_split();

        // No Content-Length: the size is only discovered while buffering.
        let head = format!(
            "PUT /image HTTP/1.1\r\nHost: {addr}\r\nContent-Type: image/png\r\n\
             Transfer-Encoding: chunked\r\nConnection: close\r\n\r\n"
        );
        let chunk = vec![0u8; 1024 * 1024];
        let chunks = (MAX_IMAGE_BYTES as usize / chunk.len()) + 1;
        let send = tokio::spawn(async move {
            writer.write_all(head.as_bytes()).await?;
            for _ in 0..chunks {
                writer
                    .write_all(format!("{:X}\r\n", chunk.len()).as_bytes())
                    .await?;
                writer.write_all(&chunk).await?;
                writer.write_all(b"\r\n").await?;
            }
            writer.write_all(b"0\r\n\r\n").await
        });

        let mut response = Vec::new();
        let _ = reader.read_to_end(&mut response).await;
        let _ = send.await;
        let response = String::from_utf8_lossy(&response);
        assert!(response.starts_with("HTTP/1.1 413"), "{response}");
        assert!(response.contains("\"image_size\""), "{response}");
    }

    #[tokio::test]
    async fn analyze_scores_free_text() {
        let (base, _) = serve().await;
        let res: Value = reqwest::Client::new()
            .post(format!("{base}/analyze"))
            .json(&json!({"text": "guaranteed profit, act now"}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(res["risk"]["score"].as_u64().unwrap() > 0);
    }
}
