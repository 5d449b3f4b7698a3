//! Reqwest-backed implementation of [`PortalApi`].

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use portal_core::model::{Answer, AssessmentOutcome, EmployeeId, TrainingId, UserId, VideoId};

use crate::api::{
    ApiError, AssessmentSheet, CompletionAck, CompletionRequest, PortalApi, TrainingDetail,
    TrainingsPayload,
};
use crate::config::ClientConfig;

/// Standard backend response envelope.
///
/// Some routes omit the `success` flag entirely; absence means success.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: serde::de::Deserialize<'de>"))]
struct Envelope<T> {
    #[serde(default = "default_true")]
    success: bool,
    #[serde(default)]
    data: Option<T>,
    #[serde(default)]
    message: Option<String>,
}

fn default_true() -> bool {
    true
}

impl<T> Envelope<T> {
    fn into_data(self) -> Result<T, ApiError> {
        if !self.success {
            return Err(ApiError::Rejected(
                self.message
                    .unwrap_or_else(|| "backend reported failure".into()),
            ));
        }
        self.data
            .ok_or_else(|| ApiError::Rejected("response carried no data".into()))
    }
}

/// HTTP client for the portal backend.
pub struct HttpPortalApi {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl HttpPortalApi {
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn fetch_envelope<T>(&self, request: reqwest::RequestBuilder) -> Result<T, ApiError>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self.authorized(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status));
        }
        let envelope: Envelope<T> = response.json().await?;
        envelope.into_data()
    }
}

#[async_trait]
impl PortalApi for HttpPortalApi {
    async fn load_trainings(
        &self,
        employee_id: &EmployeeId,
    ) -> Result<TrainingsPayload, ApiError> {
        let url = self.url("api/user/getAll/trainings");
        debug!(%employee_id, %url, "loading trainings");
        let request = self
            .client
            .get(url)
            .query(&[("empID", employee_id.as_str())]);
        self.fetch_envelope(request).await
    }

    async fn training_detail(
        &self,
        training_id: &TrainingId,
        user_id: &UserId,
    ) -> Result<TrainingDetail, ApiError> {
        let url = self.url(&format!(
            "api/user/get/Training/details/simple/{training_id}"
        ));
        debug!(%training_id, %url, "fetching training detail");
        let request = self.client.get(url).query(&[("userId", user_id.as_str())]);
        self.fetch_envelope(request).await
    }

    async fn mark_video_complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionAck, ApiError> {
        let url = self.url("api/user/update/trainingprocess");
        debug!(video = %request.video_id, %url, "persisting completion");
        let response = self
            .authorized(self.client.patch(url).json(request))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status));
        }
        Ok(response.json().await?)
    }

    async fn assessment(&self, video_id: &VideoId) -> Result<AssessmentSheet, ApiError> {
        let url = self.url(&format!("api/user/get/video-assessment/{video_id}"));
        debug!(%video_id, %url, "fetching assessment");
        self.fetch_envelope(self.client.get(url)).await
    }

    async fn submit_assessment(
        &self,
        video_id: &VideoId,
        answers: &[Answer],
    ) -> Result<AssessmentOutcome, ApiError> {
        #[derive(serde::Serialize)]
        struct SubmitBody<'a> {
            answers: &'a [Answer],
        }

        let url = self.url(&format!("api/user/submit/video-assessment/{video_id}"));
        debug!(%video_id, count = answers.len(), %url, "submitting assessment answers");
        let request = self.client.post(url).json(&SubmitBody { answers });
        self.fetch_envelope(request).await
    }
}
