use crate::config::Settings;
use crate::submit::{SubmissionError, SubmissionPayload, Submitter};
use anyhow::Context;
use std::time::Duration;

pub const DEFAULT_SUBMIT_URL: &str = "http://localhost:3002/telegram/makePost";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct HttpSubmitter {
    http: reqwest::Client,
    url: String,
}

impl HttpSubmitter {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let url = settings
            .submit_url
            .clone()
            .unwrap_or_else(|| DEFAULT_SUBMIT_URL.to_string());

        let timeout_secs = std::env::var("SUBMIT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Self::new(url, Duration::from_secs(timeout_secs))
    }

    pub fn new(url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build submission http client")?;

        Ok(Self {
            http,
            url: url.into(),
        })
    }
}

#[async_trait::async_trait]
impl Submitter for HttpSubmitter {
    fn endpoint(&self) -> &str {
        &self.url
    }

    async fn submit(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<serde_json::Value, SubmissionError> {
        let transport = |source| SubmissionError::Transport {
            endpoint: self.url.clone(),
            source,
        };

        let res = self
            .http
            .post(&self.url)
            .json(payload)
            .send()
            .await
            .map_err(transport)?;

        let status = res.status();
        let text = res.text().await.map_err(transport)?;
        if !status.is_success() {
            tracing::warn!(endpoint = %self.url, %status, body = %text, "submission rejected");
            return Err(SubmissionError::Rejected {
                endpoint: self.url.clone(),
                status: status.as_u16(),
                body: text,
            });
        }

        // The body is opaque; keep it as JSON when it parses, raw text otherwise.
        let body = serde_json::from_str::<serde_json::Value>(&text)
            .unwrap_or_else(|_| serde_json::json!({ "raw_text": text }));
        tracing::info!(endpoint = %self.url, %status, "submission accepted");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/telegram/makePost")
    }

    fn payload() -> SubmissionPayload {
        SubmissionPayload {
            message: "hello".into(),
            image: None,
            image_name: None,
            image_type: None,
        }
    }

    #[tokio::test]
    async fn posts_payload_and_returns_body_on_2xx() {
        let seen = Arc::new(Mutex::new(None::<Value>));
        let sink = seen.clone();
        let app = Router::new().route(
            "/telegram/makePost",
            post(move |Json(body): Json<Value>| {
                let sink = sink.clone();
                async move {
                    *sink.lock().unwrap() = Some(body);
                    Json(json!({"ok": true, "message_id": 7}))
                }
            }),
        );
        let url = serve(app).await;

        let submitter = HttpSubmitter::new(url, Duration::from_secs(5)).unwrap();
        let res = submitter.submit(&payload()).await.unwrap();
        assert_eq!(res, json!({"ok": true, "message_id": 7}));

        // Absent image keys are not serialized.
        assert_eq!(seen.lock().unwrap().clone(), Some(json!({"message": "hello"})));
    }

    #[tokio::test]
    async fn non_2xx_is_rejected() {
        let app = Router::new().route(
            "/telegram/makePost",
            post(|| async { (StatusCode::BAD_GATEWAY, "telegram down") }),
        );
        let url = serve(app).await;

        let submitter = HttpSubmitter::new(url, Duration::from_secs(5)).unwrap();
        let err = submitter.submit(&payload()).await.unwrap_err();
        assert_eq!(err.status(), Some(502));
        assert!(matches!(err, SubmissionError::Rejected { ref body, .. } if body == "telegram down"));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_transport_error() {
        // Bind then drop to get a port nobody listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let submitter =
            HttpSubmitter::new(format!("http://{addr}/x"), Duration::from_secs(5)).unwrap();
        let err = submitter.submit(&payload()).await.unwrap_err();
        assert!(matches!(err, SubmissionError::Transport { .. }));
        assert_eq!(err.status(), None);
    }
}
