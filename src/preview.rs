use crate::backend::{Backend, HttpReply};
use crate::error::BackendError;
use crate::notify::{Level, Notifier};
use tracing::debug;

/// Extensions whose content is not text worth showing.
const NON_PREVIEWABLE: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "svg", "webp", "bmp", "ico", "xlsx", "xls", "docx", "doc",
    "pptx", "ppt", "pdf", "zip", "gz", "tar", "rar",
];

pub fn is_previewable(filename: &str) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) => !NON_PREVIEWABLE.contains(&ext.to_ascii_lowercase().as_str()),
        None => true,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewBody {
    Loading,
    Content(String),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewPanel {
    pub path: String,
    pub filename: String,
    pub body: PreviewBody,
}

/// What a preview request turned into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewRequest {
    Refused,
    /// The file was already shown, so the panel closed instead.
    Closed,
    /// Content must be fetched for this path.
    Load(String),
}

#[derive(Debug, Default)]
pub struct Preview {
    current: Option<PreviewPanel>,
}

impl Preview {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&PreviewPanel> {
        self.current.as_ref()
    }

    pub fn close(&mut self) {
        self.current = None;
    }

    pub fn request(
        &mut self,
        path: &str,
        filename: &str,
        notifier: &mut dyn Notifier,
    ) -> PreviewRequest {
        if !is_previewable(filename) {
            notifier.notify(
                Level::Warning,
                format!(
                    "Cannot preview \"{}\": This file type cannot be previewed.",
                    filename
                ),
            );
            return PreviewRequest::Refused;
        }
        if self.current.as_ref().is_some_and(|panel| panel.path == path) {
            self.close();
            return PreviewRequest::Closed;
        }
        self.current = Some(PreviewPanel {
            path: path.to_string(),
            filename: filename.to_string(),
            body: PreviewBody::Loading,
        });
        PreviewRequest::Load(path.to_string())
    }

    /// Fill the panel with the fetched content. Replies for a file that is no
    /// longer shown are ignored.
    pub fn finish(&mut self, path: &str, reply: Result<HttpReply, BackendError>) {
        let Some(panel) = self.current.as_mut().filter(|panel| panel.path == path) else {
            debug!(path, "preview reply for a closed panel");
            return;
        };
        panel.body = match interpret(reply) {
            Ok(content) => PreviewBody::Content(content),
            Err(msg) => PreviewBody::Error(format!("Error loading file: {}", msg)),
        };
    }

    pub async fn open(
        &mut self,
        backend: &dyn Backend,
        path: &str,
        filename: &str,
        notifier: &mut dyn Notifier,
    ) -> PreviewRequest {
        let request = self.request(path, filename, notifier);
        if let PreviewRequest::Load(path) = &request {
            let reply = backend.file_content(path).await;
            self.finish(path, reply);
        }
        request
    }
}

fn interpret(reply: Result<HttpReply, BackendError>) -> Result<String, String> {
    let reply = reply.map_err(|e| e.to_string())?;
    if let Some(error) = reply.error_field() {
        return Err(error);
    }
    if !reply.is_success() {
        return Err(format!("HTTP error! status: {}", reply.status));
    }
    reply
        .json()
        .and_then(|body| body.get("content")?.as_str().map(str::to_string))
        .ok_or_else(|| "response did not include content".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::{Call, FakeBackend};
    use crate::notify::ToastQueue;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn binary_extensions_are_refused() {
        assert!(!is_previewable("logo.PNG"));
        assert!(!is_previewable("archive.tar"));
        assert!(is_previewable("Makefile"));
        assert!(is_previewable("main.rs"));

        let mut preview = Preview::new();
        let mut toasts = ToastQueue::new(Duration::from_secs(3));
        assert_eq!(
            preview.request("img/logo.png", "logo.png", &mut toasts),
            PreviewRequest::Refused
        );
        assert_eq!(
            toasts.latest().unwrap().message,
            "Cannot preview \"logo.png\": This file type cannot be previewed."
        );
        assert!(preview.current().is_none());
    }

    #[tokio::test]
    async fn second_request_for_same_file_closes() {
        let mut preview = Preview::new();
        let mut toasts = ToastQueue::new(Duration::from_secs(3));
        let fake = FakeBackend::new();
        fake.push_reply(HttpReply::ok_json(&json!({ "content": "print()" })));

        preview.open(&fake, "src/app.py", "app.py", &mut toasts).await;
        assert_eq!(
            preview.current().unwrap().body,
            PreviewBody::Content("print()".into())
        );

        let again = preview.open(&fake, "src/app.py", "app.py", &mut toasts).await;
        assert_eq!(again, PreviewRequest::Closed);
        assert!(preview.current().is_none());
        assert_eq!(fake.calls(), vec![Call::FileContent("src/app.py".into())]);
    }

    #[tokio::test]
    async fn failures_render_in_the_panel() {
        let mut preview = Preview::new();
        let mut toasts = ToastQueue::new(Duration::from_secs(3));
        let fake = FakeBackend::new();
        fake.push_reply(HttpReply::error_json(404, "Not a file or not found: x.py"))
            .push_transport_error("timed out");

        preview.open(&fake, "x.py", "x.py", &mut toasts).await;
        assert_eq!(
            preview.current().unwrap().body,
            PreviewBody::Error("Error loading file: Not a file or not found: x.py".into())
        );

        preview.open(&fake, "y.py", "y.py", &mut toasts).await;
        assert_eq!(
            preview.current().unwrap().body,
            PreviewBody::Error("Error loading file: timed out".into())
        );
    }

    #[test]
    fn late_reply_for_closed_panel_is_ignored() {
        let mut preview = Preview::new();
        let mut toasts = ToastQueue::new(Duration::from_secs(3));
        preview.request("a.rs", "a.rs", &mut toasts);
        preview.request("b.rs", "b.rs", &mut toasts);
        preview.finish("a.rs", Ok(HttpReply::ok_json(&json!({ "content": "a" }))));
        assert_eq!(preview.current().unwrap().body, PreviewBody::Loading);
    }
}
