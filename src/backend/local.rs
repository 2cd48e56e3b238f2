//! In-process stand-in for the prompt-generation server: scans a directory,
//! keeps presets in a JSON file and assembles prompts itself.

use super::{Backend, GenerateRequest, HttpReply, PresetRequest};
use crate::error::BackendError;
use crate::{file_scanner, prompt};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub struct LocalBackend {
    root: PathBuf,
    presets_file: PathBuf,
    include_ignored: bool,
}

impl LocalBackend {
    pub fn new(root: PathBuf, presets_file: PathBuf, include_ignored: bool) -> Self {
        LocalBackend {
            root,
            presets_file,
            include_ignored,
        }
    }

    fn load_presets(&self) -> Result<Map<String, Value>, BackendError> {
        if !self.presets_file.exists() {
            return Ok(Map::new());
        }
        let text = fs::read_to_string(&self.presets_file)?;
        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) | Err(_) => {
                warn!(file = %self.presets_file.display(), "presets file is not a JSON object, starting empty");
                Ok(Map::new())
            }
        }
    }

    fn store_presets(&self, presets: &Map<String, Value>) -> Result<(), BackendError> {
        if let Some(parent) = self.presets_file.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let text = serde_json::to_string_pretty(presets)
            .map_err(|err| BackendError::Transport(err.to_string()))?;
        fs::write(&self.presets_file, text)?;
        Ok(())
    }

    fn presets_reply(presets: Map<String, Value>) -> HttpReply {
        HttpReply::ok_json(&json!({ "success": true, "presets": presets }))
    }

    /// Resolve a root-relative path, refusing anything outside the root.
    fn resolve(&self, rel: &str) -> Option<PathBuf> {
        let root = self.root.canonicalize().ok()?;
        let candidate = root.join(rel).canonicalize().ok()?;
        candidate.starts_with(&root).then_some(candidate)
    }

    fn read_context(&self, rel: &str) -> Option<String> {
        let path = self.resolve(rel)?;
        match fs::read_to_string(&path) {
            Ok(content) => Some(content),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read context file");
                None
            }
        }
    }
}

#[async_trait]
impl Backend for LocalBackend {
    async fn refresh_tree(&self) -> Result<HttpReply, BackendError> {
        let entries = match file_scanner::scan_files(&self.root, self.include_ignored) {
            Ok(entries) => entries,
            Err(e) => {
                return Ok(HttpReply::error_json(
                    500,
                    format!("Error refreshing file tree: {}", e),
                ));
            }
        };
        let markup = file_scanner::build_markup(&self.root, &entries);
        info!(entries = entries.len(), "file tree rescanned");
        Ok(HttpReply::ok_json(&json!({ "markup": [markup] })))
    }

    async fn file_content(&self, path: &str) -> Result<HttpReply, BackendError> {
        if path.trim().is_empty() {
            return Ok(HttpReply::error_json(400, "No file path provided"));
        }
        let Some(resolved) = self.resolve(path) else {
            let joined = self.root.join(path);
            return Ok(if joined.exists() {
                HttpReply::error_json(403, "Access denied: Path outside workspace")
            } else {
                HttpReply::error_json(404, format!("Not a file or not found: {}", path))
            });
        };
        if !resolved.is_file() {
            return Ok(HttpReply::error_json(
                404,
                format!("Not a file or not found: {}", path),
            ));
        }
        match fs::read_to_string(&resolved) {
            Ok(content) => Ok(HttpReply::ok_json(&json!({ "content": content }))),
            Err(_) => Ok(HttpReply::error_json(
                404,
                format!("Could not read file: {}", path),
            )),
        }
    }

    async fn list_presets(&self) -> Result<HttpReply, BackendError> {
        Ok(Self::presets_reply(self.load_presets()?))
    }

    async fn save_preset(&self, request: &PresetRequest) -> Result<HttpReply, BackendError> {
        if request.name.trim().is_empty() {
            return Ok(HttpReply::error_json(400, "Preset name is required"));
        }
        if request.files.is_empty() {
            return Ok(HttpReply::error_json(400, "Selected files list is required"));
        }
        let mut presets = self.load_presets()?;
        presets.insert(request.name.clone(), json!({ "files": request.files }));
        self.store_presets(&presets)?;
        info!(name = %request.name, files = request.files.len(), "preset saved");
        Ok(Self::presets_reply(presets))
    }

    async fn delete_preset(&self, name: &str) -> Result<HttpReply, BackendError> {
        let mut presets = self.load_presets()?;
        if presets.remove(name).is_none() {
            return Ok(HttpReply::error_json(
                404,
                format!("Preset '{}' not found", name),
            ));
        }
        self.store_presets(&presets)?;
        info!(name, remaining = presets.len(), "preset deleted");
        Ok(Self::presets_reply(presets))
    }

    async fn generate_prompt(&self, request: &GenerateRequest) -> Result<HttpReply, BackendError> {
        if request.context_files.is_empty() {
            return Ok(HttpReply::error_json(
                400,
                "Please select at least one context file.",
            ));
        }
        if request.jira_description.trim().is_empty() {
            return Ok(HttpReply::error_json(
                400,
                "Please provide a Jira description.",
            ));
        }
        let files: Vec<(String, String)> = request
            .context_files
            .iter()
            .filter_map(|rel| self.read_context(rel).map(|content| (rel.clone(), content)))
            .collect();
        let text = prompt::assemble(
            &files,
            &request.jira_description,
            &request.additional_instructions,
        );
        let char_count = text.chars().count();
        Ok(HttpReply::ok_json(&json!({
            "prompt": text,
            "char_count": char_count,
            "token_estimate": char_count / 4,
        })))
    }
}

/// Default location of the local presets file for a scanned root.
pub fn default_presets_file(root: &Path) -> PathBuf {
    root.join(".promptpick-presets.json")
}
