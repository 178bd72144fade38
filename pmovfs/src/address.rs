//! Opaque object-id codec.
//!
//! Real paths are hidden by mapping folders to numbers: `1.1.2` is the
//! second folder inside the first folder of the first shared root, each
//! position taken in the *sorted* sibling list. A `$` suffix addresses a
//! file in the final directory: `1.1.2$3` is its third file. Nothing in
//! an id ever reveals a host path. Every failure (malformed token,
//! out-of-range index, unreadable directory) is reported as the same
//! opaque [`InvalidAddress`] so error behavior leaks nothing either.

use crate::listing::list;
use crate::roots::SharedRoot;
use std::path::PathBuf;
use thiserror::Error;
use tracing::trace;

/// Opaque addressing failure.
///
/// Deliberately carries no detail: the protocol must not distinguish
/// "does not exist", "exists but forbidden" and "malformed id".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid object id")]
pub struct InvalidAddress;

/// Result of decoding an object id.
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualNode {
    /// Private filesystem location. Directories keep their components
    /// joined, files include the file name.
    pub real_path: PathBuf,
    /// Public URL of the same node (trailing slash for directories).
    pub web_path: String,
    pub is_directory: bool,
    /// ObjectID of the enclosing container.
    pub parent_id: String,
}

/// Resolves an object id against the configured shared roots.
///
/// The id is split on `$` into a folder path and an optional file index;
/// the folder path is split on `.`, its first segment selecting a root
/// (1-based) and each further segment indexing the sorted subfolder list
/// of the directory reached so far. A present file index addresses the
/// sorted file list of the final directory.
///
/// File-vs-directory expectations are *not* validated here; callers
/// check [`VirtualNode::is_directory`] themselves.
pub fn decode(object_id: &str, roots: &[SharedRoot]) -> Result<VirtualNode, InvalidAddress> {
    let (path_part, file_part) = match object_id.split_once('$') {
        Some((path, file)) => (path, Some(file)),
        None => (object_id, None),
    };

    let mut segments = path_part.split('.');
    let root_index = parse_index(segments.next().ok_or(InvalidAddress)?)?;
    let root = roots.get(root_index - 1).ok_or(InvalidAddress)?;

    let mut real_path = root.host_path.clone();
    let mut web_path = root.web_prefix();

    for segment in segments {
        let index = parse_index(segment)?;
        let listing = list(&real_path, false).map_err(|_| InvalidAddress)?;
        let name = listing.folders.get(index - 1).ok_or(InvalidAddress)?;
        real_path.push(name);
        web_path.push_str(name);
        web_path.push('/');
    }

    let node = match file_part {
        None => VirtualNode {
            real_path,
            web_path,
            is_directory: true,
            parent_id: parent_of(path_part),
        },
        Some(file) => {
            let index = parse_index(file)?;
            let listing = list(&real_path, true).map_err(|_| InvalidAddress)?;
            let name = listing.files.get(index - 1).ok_or(InvalidAddress)?;
            real_path.push(name);
            web_path.push_str(name);
            VirtualNode {
                real_path,
                web_path,
                is_directory: false,
                parent_id: path_part.to_string(),
            }
        }
    };
    trace!(object_id, web_path = %node.web_path, "object id resolved");
    Ok(node)
}

/// ObjectID of the container enclosing a *folder* id: everything before
/// the last dot, or the root container when there is none.
pub fn parent_of(object_id: &str) -> String {
    match object_id.rsplit_once('.') {
        Some((parent, _)) => parent.to_string(),
        None => pmodidlite::ROOT_ID.to_string(),
    }
}

/// Child id of the folder at 1-based `position` under `parent_id`.
pub fn folder_id(parent_id: &str, position: usize) -> String {
    format!("{}.{}", parent_id, position)
}

/// Child id of the file at 1-based `position` under `parent_id`.
pub fn file_id(parent_id: &str, position: usize) -> String {
    format!("{}${}", parent_id, position)
}

/// 1-based positive index; anything else is an invalid address.
fn parse_index(segment: &str) -> Result<usize, InvalidAddress> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(InvalidAddress);
    }
    match segment.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(InvalidAddress),
    }
}
