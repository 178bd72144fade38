//! Shared directory roots configured by the administrator.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One shared directory tree.
///
/// `host_path` is the private filesystem location, never exposed to
/// clients; `web_path` is the public URL prefix under which the same tree
/// is served. The 1-based index used in object ids is the position of the
/// root in the configured list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedRoot {
    #[serde(rename = "hostpath")]
    pub host_path: PathBuf,
    #[serde(rename = "webpath")]
    pub web_path: String,
}

impl SharedRoot {
    pub fn new(host_path: impl Into<PathBuf>, web_path: impl Into<String>) -> Self {
        Self {
            host_path: host_path.into(),
            web_path: web_path.into(),
        }
    }

    /// The web path with a guaranteed trailing slash, ready for child
    /// names to be appended.
    pub fn web_prefix(&self) -> String {
        if self.web_path.ends_with('/') {
            self.web_path.clone()
        } else {
            format!("{}/", self.web_path)
        }
    }

    /// Display title of the root: the last component of its web path.
    pub fn title(&self) -> &str {
        self.web_path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(&self.web_path)
    }
}
