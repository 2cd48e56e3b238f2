//! The network contract the picker consumes.
//!
//! Backends hand back the raw status and body; interpreting them (structured
//! error, truncated excerpt, payload) is left to the component that issued
//! the request.

pub mod http;
pub mod local;

use crate::error::BackendError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use http::HttpBackend;
pub use local::LocalBackend;

/// Status and body of one round-trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        HttpReply {
            status,
            body: body.into(),
        }
    }

    pub fn ok_json(value: &serde_json::Value) -> Self {
        HttpReply::new(200, value.to_string())
    }

    pub fn error_json(status: u16, message: impl Into<String>) -> Self {
        HttpReply::new(status, serde_json::json!({ "error": message.into() }).to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json(&self) -> Option<serde_json::Value> {
        serde_json::from_str(&self.body).ok()
    }

    /// The `error` string of a structured body, if there is one.
    pub fn error_field(&self) -> Option<String> {
        self.json()?
            .get("error")?
            .as_str()
            .map(str::to_string)
    }
}

/// Body of a preset create/update request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetRequest {
    pub name: String,
    pub files: Vec<String>,
}

/// Form fields of a prompt generation request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateRequest {
    pub context_files: Vec<String>,
    pub jira_description: String,
    pub additional_instructions: String,
    pub template_id: Option<u32>,
}

impl GenerateRequest {
    /// Form encoding; `context_files` repeats once per path.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields: Vec<(&'static str, String)> = self
            .context_files
            .iter()
            .map(|path| ("context_files", path.clone()))
            .collect();
        fields.push(("jira_description", self.jira_description.clone()));
        fields.push(("additional_instructions", self.additional_instructions.clone()));
        if let Some(id) = self.template_id {
            fields.push(("template_id", id.to_string()));
        }
        fields
    }
}

#[async_trait]
pub trait Backend: Send + Sync {
    async fn refresh_tree(&self) -> Result<HttpReply, BackendError>;

    async fn file_content(&self, path: &str) -> Result<HttpReply, BackendError>;

    async fn list_presets(&self) -> Result<HttpReply, BackendError>;

    async fn save_preset(&self, request: &PresetRequest) -> Result<HttpReply, BackendError>;

    async fn delete_preset(&self, name: &str) -> Result<HttpReply, BackendError>;

    async fn generate_prompt(&self, request: &GenerateRequest) -> Result<HttpReply, BackendError>;
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// A request the fake received, in call order.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        Refresh,
        FileContent(String),
        ListPresets,
        Save(PresetRequest),
        Delete(String),
        Generate(GenerateRequest),
    }

    /// Replays queued replies and records every call.
    #[derive(Default)]
    pub struct FakeBackend {
        replies: Mutex<VecDeque<Result<HttpReply, String>>>,
        calls: Mutex<Vec<Call>>,
    }

    impl FakeBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push_reply(&self, reply: HttpReply) -> &Self {
            self.replies.lock().unwrap().push_back(Ok(reply));
            self
        }

        pub fn push_transport_error(&self, message: &str) -> &Self {
            self.replies
                .lock()
                .unwrap()
                .push_back(Err(message.to_string()));
            self
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn answer(&self, call: Call) -> Result<HttpReply, BackendError> {
            self.calls.lock().unwrap().push(call);
            match self.replies.lock().unwrap().pop_front() {
                Some(Ok(reply)) => Ok(reply),
                Some(Err(message)) => Err(BackendError::Transport(message)),
                None => Err(BackendError::Transport("no reply queued".into())),
            }
        }
    }

    #[async_trait]
    impl Backend for FakeBackend {
        async fn refresh_tree(&self) -> Result<HttpReply, BackendError> {
            self.answer(Call::Refresh)
        }

        async fn file_content(&self, path: &str) -> Result<HttpReply, BackendError> {
            self.answer(Call::FileContent(path.to_string()))
        }

        async fn list_presets(&self) -> Result<HttpReply, BackendError> {
            self.answer(Call::ListPresets)
        }

        async fn save_preset(&self, request: &PresetRequest) -> Result<HttpReply, BackendError> {
            self.answer(Call::Save(request.clone()))
        }

        async fn delete_preset(&self, name: &str) -> Result<HttpReply, BackendError> {
            self.answer(Call::Delete(name.to_string()))
        }

        async fn generate_prompt(
            &self,
            request: &GenerateRequest,
        ) -> Result<HttpReply, BackendError> {
            self.answer(Call::Generate(request.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_field_reads_structured_bodies_only() {
        assert_eq!(
            HttpReply::error_json(500, "boom").error_field().as_deref(),
            Some("boom")
        );
        assert_eq!(HttpReply::new(500, "<html>").error_field(), None);
    }

    #[test]
    fn form_fields_repeat_context_files() {
        let request = GenerateRequest {
            context_files: vec!["a.rs".into(), "b.rs".into()],
            jira_description: "desc".into(),
            additional_instructions: String::new(),
            template_id: Some(2),
        };
        let keys: Vec<&str> = request.form_fields().iter().map(|(k, _)| *k).collect();
        assert_eq!(
            keys,
            vec![
                "context_files",
                "context_files",
                "jira_description",
                "additional_instructions",
                "template_id"
            ]
        );
    }
}
