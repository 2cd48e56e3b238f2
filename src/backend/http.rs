use super::{Backend, GenerateRequest, HttpReply, PresetRequest};
use crate::error::BackendError;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Talks to the prompt-generation server over HTTP.
pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, BackendError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(HttpBackend {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: builder.build()?,
        })
    }

    fn url(&self, route: &str) -> String {
        format!("{}{}", self.base_url, route)
    }

    /// `/presets/<name>` with the name as one encoded path segment.
    fn preset_url(&self, name: &str) -> Result<reqwest::Url, BackendError> {
        if matches!(name.trim(), "" | "." | "..") {
            return Err(BackendError::InvalidRequest(format!(
                "preset name \"{}\" cannot be used in a URL",
                name
            )));
        }
        let mut url = reqwest::Url::parse(&self.url("/presets"))
            .map_err(|err| BackendError::InvalidRequest(err.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| {
                BackendError::InvalidRequest(format!("{} cannot be a base URL", self.base_url))
            })?
            .pop_if_empty()
            .push(name);
        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<HttpReply, BackendError> {
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(status, bytes = body.len(), "server replied");
        Ok(HttpReply { status, body })
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn refresh_tree(&self) -> Result<HttpReply, BackendError> {
        self.send(self.client.get(self.url("/refresh_file_tree")))
            .await
    }

    async fn file_content(&self, path: &str) -> Result<HttpReply, BackendError> {
        self.send(
            self.client
                .get(self.url("/get_file_content"))
                .query(&[("path", path)]),
        )
        .await
    }

    async fn list_presets(&self) -> Result<HttpReply, BackendError> {
        self.send(self.client.get(self.url("/presets"))).await
    }

    async fn save_preset(&self, request: &PresetRequest) -> Result<HttpReply, BackendError> {
        self.send(self.client.post(self.url("/presets")).json(request))
            .await
    }

    async fn delete_preset(&self, name: &str) -> Result<HttpReply, BackendError> {
        let url = self.preset_url(name)?;
        self.send(self.client.delete(url)).await
    }

    async fn generate_prompt(&self, request: &GenerateRequest) -> Result<HttpReply, BackendError> {
        self.send(
            self.client
                .post(self.url("/generate"))
                .form(&request.form_fields()),
        )
        .await
    }
}
