//! Result shapes handed back to the host.

use serde::Serialize;

/// One child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirEntry {
    pub name: String,
    pub is_directory: bool,
    pub is_file: bool,
    /// `gh://` URL of the child.
    pub url: String,
}

/// File metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stat {
    pub length: u64,
    pub name: String,
    pub is_directory: bool,
    pub is_file: bool,
    /// Guessed from the file name. `None` when unknown.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl Stat {
    pub(crate) fn file(name: &str, length: u64, path: &str) -> Self {
        Self {
            length,
            name: name.to_string(),
            is_directory: false,
            is_file: true,
            content_type: guess_type(path),
        }
    }
}

pub(crate) fn guess_type(path: &str) -> Option<String> {
    mime_guess::from_path(path)
        .first()
        .map(|mime| mime.essence_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_from_extension() {
        assert_eq!(guess_type("docs/readme.md").as_deref(), Some("text/markdown"));
        assert_eq!(guess_type("logo.png").as_deref(), Some("image/png"));
        assert_eq!(guess_type("Makefile"), None);
    }

    #[test]
    fn stat_serializes_host_field_names() {
        let stat = Stat::file("a.json", 2, "dir/a.json");
        let value = serde_json::to_value(&stat).unwrap();
        assert_eq!(value["isFile"], true);
        assert_eq!(value["isDirectory"], false);
        assert_eq!(value["type"], "application/json");
        assert_eq!(value["length"], 2);
    }

    #[test]
    fn unknown_type_is_omitted() {
        let stat = Stat::file("LICENSE", 0, "LICENSE");
        let value = serde_json::to_value(&stat).unwrap();
        assert!(value.get("type").is_none());
    }
}
