pub mod error;
pub mod http;

pub use error::SubmissionError;
pub use http::HttpSubmitter;

use crate::domain::content::RenderedContent;
use crate::image::ImageAttachment;
use serde::Serialize;

/// JSON body posted to the submission endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_type: Option<String>,
}

impl SubmissionPayload {
    pub fn new(message: &RenderedContent, image: Option<&ImageAttachment>) -> Self {
        Self {
            message: message.as_str().to_string(),
            image: image.map(ImageAttachment::to_base64),
            image_name: image.map(|i| i.name().to_string()),
            image_type: image.map(|i| i.media_type().to_string()),
        }
    }
}

#[async_trait::async_trait]
pub trait Submitter: Send + Sync {
    fn endpoint(&self) -> &str;

    /// Posts once. Any 2xx is success; the response body is returned uninterpreted.
    async fn submit(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<serde_json::Value, SubmissionError>;
}
