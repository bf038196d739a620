//! `HttpBackend`: the reqwest adapter for the clinic persistence service.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use charta_core::backend::{
    LoadedVisit, PersistenceBackend, SaveDetailRequest, SavePlanRequest, TransportError,
    TransportKind,
};
use charta_core::model::{StatusOption, VisitKey};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Persistence backend speaking JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBackend {
    /// Build a backend for the given base URL (trailing slashes are
    /// tolerated).
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TransportError::new(TransportKind::Unknown, e.to_string()))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Classify a reqwest error into the transport taxonomy.
    fn classify(err: &reqwest::Error) -> TransportKind {
        if err.is_timeout() {
            TransportKind::Timeout
        } else if err.is_connect() {
            TransportKind::Network
        } else if err.is_decode() {
            TransportKind::Parse
        } else if err.is_request() {
            TransportKind::Aborted
        } else if let Some(status) = err.status() {
            TransportKind::from_status(status.as_u16())
        } else {
            TransportKind::Unknown
        }
    }

    fn transport_error(err: reqwest::Error) -> TransportError {
        let mut out = TransportError::new(Self::classify(&err), err.to_string());
        out.status = err.status().map(|s| s.as_u16());
        out
    }

    /// Turn a non-success response into a classified error, preserving the
    /// opaque body as the payload when it parses as JSON.
    async fn error_from_response(response: reqwest::Response) -> TransportError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let mut err = TransportError::from_status(status, format!("backend returned {status}"));
        if let Ok(payload) = serde_json::from_str(&body) {
            err = err.with_payload(payload);
        } else if !body.is_empty() {
            err.message = format!("backend returned {status}: {body}");
        }
        err
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, TransportError> {
        let url = self.endpoint(path);
        tracing::debug!(%url, "backend request");
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(Self::transport_error)?;
        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }
        Ok(response)
    }

    async fn post_unit<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), TransportError> {
        self.post(path, body).await.map(|_| ())
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, TransportError> {
        self.post(path, body)
            .await?
            .json()
            .await
            .map_err(Self::transport_error)
    }
}

#[derive(Serialize)]
struct DeletePlanStepBody<'a> {
    key: &'a VisitKey,
    step: u16,
}

#[derive(Serialize)]
struct DeleteDetailStepBody<'a> {
    key: &'a VisitKey,
    parent: u16,
    number: u16,
}

#[derive(Serialize)]
struct DeleteAttachmentBody<'a> {
    key: &'a VisitKey,
    file_name: &'a str,
}

#[async_trait]
impl PersistenceBackend for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn load_visit(&self, key: &VisitKey) -> Result<LoadedVisit, TransportError> {
        self.post_json("visit/load", key).await
    }

    async fn save_plan(&self, request: &SavePlanRequest) -> Result<(), TransportError> {
        self.post_unit("plan/save", request).await
    }

    async fn save_details(&self, request: &SaveDetailRequest) -> Result<(), TransportError> {
        self.post_unit("detail/save", request).await
    }

    async fn delete_plan_step(&self, key: &VisitKey, step: u16) -> Result<(), TransportError> {
        self.post_unit("plan/delete", &DeletePlanStepBody { key, step })
            .await
    }

    async fn delete_detail_step(
        &self,
        key: &VisitKey,
        parent: u16,
        number: u16,
    ) -> Result<(), TransportError> {
        self.post_unit(
            "detail/delete",
            &DeleteDetailStepBody {
                key,
                parent,
                number,
            },
        )
        .await
    }

    async fn delete_attachment(
        &self,
        key: &VisitKey,
        file_name: &str,
    ) -> Result<(), TransportError> {
        self.post_unit("attachment/delete", &DeleteAttachmentBody { key, file_name })
            .await
    }

    async fn status_options(&self) -> Result<Vec<StatusOption>, TransportError> {
        self.post_json("status/options", &serde_json::json!({})).await
    }
}
