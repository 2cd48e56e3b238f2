use crate::backend::{Backend, GenerateRequest, HttpReply};
use crate::error::BackendError;
use crate::utils;
use anyhow::{Result, bail};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};

const TEMPLATE: &str = "\
# Feature implementation

## Relevant code context

{relevant_code_context}

## Task description

{jira_description}

## Additional instructions

{additional_instructions}
";

/// Concatenate file contents between start/end markers, sorted and deduped
/// by path.
pub fn gather_context(files: &[(String, String)]) -> String {
    let mut files: Vec<&(String, String)> = files.iter().collect();
    files.sort_by(|a, b| a.0.cmp(&b.0));
    files.dedup_by(|a, b| a.0 == b.0);

    let mut context = Vec::new();
    for (path, content) in files {
        let content = content.trim();
        if content.is_empty() {
            continue;
        }
        context.push(format!("--- START FILE: {} ---", path));
        context.push(content.to_string());
        context.push(format!("--- END FILE: {} ---\n", path));
    }
    context.join("\n")
}

/// Fill the built-in template. Empty inputs become `N/A`.
pub fn assemble(files: &[(String, String)], description: &str, instructions: &str) -> String {
    let or_na = |s: &str| {
        if s.trim().is_empty() {
            "N/A".to_string()
        } else {
            s.to_string()
        }
    };
    TEMPLATE
        .replace("{relevant_code_context}", &or_na(&gather_context(files)))
        .replace("{jira_description}", &or_na(description))
        .replace("{additional_instructions}", &or_na(instructions))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPrompt {
    pub text: String,
    pub char_count: usize,
    pub token_estimate: usize,
}

/// Interpret a `/generate` reply. Missing metadata is estimated locally.
pub fn parse_reply(reply: &HttpReply) -> Result<GeneratedPrompt, String> {
    let Some(body) = reply.json() else {
        return Err(format!(
            "Server error: {}",
            utils::truncate_chars(&reply.body, 100)
        ));
    };
    if let Some(error) = body.get("error").and_then(|e| e.as_str()) {
        return Err(error.to_string());
    }
    let Some(text) = body.get("prompt").and_then(|p| p.as_str()) else {
        return Err("Server error: response did not include a prompt".to_string());
    };
    let char_count = body
        .get("char_count")
        .and_then(|c| c.as_u64())
        .map_or_else(|| text.chars().count(), |c| c as usize);
    let token_estimate = body
        .get("token_estimate")
        .and_then(|t| t.as_u64())
        .map_or_else(|| utils::approx_tokens(text), |t| t as usize);
    Ok(GeneratedPrompt {
        text: text.to_string(),
        char_count,
        token_estimate,
    })
}

pub async fn generate(
    backend: &dyn Backend,
    request: &GenerateRequest,
) -> Result<GeneratedPrompt, String> {
    match backend.generate_prompt(request).await {
        Ok(reply) => parse_reply(&reply),
        Err(BackendError::Transport(msg)) => Err(format!("Network error: {}", msg)),
        Err(e) => Err(format!("Network error: {}", e)),
    }
}

pub fn export_file_name(now: chrono::DateTime<Local>) -> String {
    format!(
        "implementation-prompt-{}.md",
        now.format("%Y-%m-%dT%H-%M-%S")
    )
}

/// Write the prompt as a markdown file in `dir`.
pub fn export(text: &str, dir: &Path) -> Result<PathBuf> {
    if text.trim().is_empty() {
        bail!("No content to export");
    }
    let path = dir.join(export_file_name(Local::now()));
    fs::write(&path, text)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::{Call, FakeBackend};
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn empty_inputs_render_as_na() {
        let text = assemble(&[], "", " ");
        assert_eq!(text.matches("N/A").count(), 3);
    }

    #[test]
    fn context_is_sorted_and_deduplicated() {
        let files = vec![
            ("b.rs".to_string(), "b\n".to_string()),
            ("a.rs".to_string(), "a".to_string()),
            ("b.rs".to_string(), "b\n".to_string()),
            ("empty.rs".to_string(), "  ".to_string()),
        ];
        let context = gather_context(&files);
        assert_eq!(
            context,
            "--- START FILE: a.rs ---\na\n--- END FILE: a.rs ---\n\n--- START FILE: b.rs ---\nb\n--- END FILE: b.rs ---\n"
        );
    }

    #[test]
    fn reply_metadata_is_estimated_when_missing() {
        let reply = HttpReply::ok_json(&serde_json::json!({ "prompt": "12345678" }));
        let prompt = parse_reply(&reply).unwrap();
        assert_eq!(prompt.char_count, 8);
        assert_eq!(prompt.token_estimate, 2);

        let failed = HttpReply::error_json(400, "Please provide a Jira description.");
        assert_eq!(
            parse_reply(&failed).unwrap_err(),
            "Please provide a Jira description."
        );
    }

    #[tokio::test]
    async fn generate_reports_network_errors() {
        let fake = FakeBackend::new();
        fake.push_transport_error("connection refused");
        let err = generate(&fake, &GenerateRequest::default()).await.unwrap_err();
        assert_eq!(err, "Network error: connection refused");
        assert!(matches!(fake.calls()[0], Call::Generate(_)));
    }

    #[test]
    fn export_names_file_with_timestamp() {
        let when = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            export_file_name(when),
            "implementation-prompt-2024-03-09T14-05-07.md"
        );

        let dir = TempDir::new().unwrap();
        let path = export("# prompt", dir.path()).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "# prompt");
        assert!(export("  ", dir.path()).is_err());
    }
}
