use serde::{Deserialize, Serialize};

/// Explicit role of a rendered unit. Anything the client does not know is
/// kept as `Unknown` and sorted last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Folder,
    File,
    #[serde(other)]
    Unknown,
}

/// One node of the markup fragment returned by the tree service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkupNode {
    pub role: Role,
    #[serde(default)]
    pub name: String,
    /// Server-relative path, files only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MarkupNode>,
    /// Fallback label for units without a role the client understands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl MarkupNode {
    pub fn folder(name: impl Into<String>, children: Vec<MarkupNode>) -> Self {
        MarkupNode {
            role: Role::Folder,
            name: name.into(),
            path: None,
            children,
            text: None,
        }
    }

    pub fn file(name: impl Into<String>, path: impl Into<String>) -> Self {
        MarkupNode {
            role: Role::File,
            name: name.into(),
            path: Some(path.into()),
            children: Vec::new(),
            text: None,
        }
    }

    #[cfg(test)]
    pub fn unknown(text: impl Into<String>) -> Self {
        MarkupNode {
            role: Role::Unknown,
            name: String::new(),
            path: None,
            children: Vec::new(),
            text: Some(text.into()),
        }
    }
}

/// Body of `GET /refresh_file_tree`.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct TreePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markup: Option<Vec<MarkupNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
