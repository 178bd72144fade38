//! Media classification: content sniffing, titles, icons, thumbnails.
//!
//! Classification reads file *bytes*, never extensions; the sniffer is a
//! trait so tests can substitute fixed classifications without media
//! files on disk.

use std::io;
use std::path::Path;

/// Icon candidates looked up inside a directory, best first.
pub const FOLDER_ICONS: [&str; 4] = ["folder.png", "folder.jpg", "album.png", "album.jpg"];

/// Media class of a shareable item. Anything else is "unknown" and is
/// never exposed to renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaClass {
    Audio,
    Video,
}

/// Maps a MIME type to a media class: `audio/*`, `video/*`, or unknown.
pub fn class_from_mime(mime: &str) -> Option<MediaClass> {
    if mime.starts_with("audio/") {
        Some(MediaClass::Audio)
    } else if mime.starts_with("video/") {
        Some(MediaClass::Video)
    } else {
        None
    }
}

/// Display title of a media file: extension stripped, every `.` and `_`
/// replaced by a space.
pub fn derive_title(file_name: &str) -> String {
    let stem = match file_name.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem,
        _ => file_name,
    };
    stem.replace(['.', '_'], " ")
}

/// MIME detection by content inspection.
pub trait MimeSniffer: Send + Sync {
    /// Detected MIME type of the file, or `None` when unrecognized.
    fn sniff(&self, path: &Path) -> io::Result<Option<String>>;
}

/// Default sniffer, backed by the `infer` magic-number database.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentSniffer;

impl MimeSniffer for ContentSniffer {
    fn sniff(&self, path: &Path) -> io::Result<Option<String>> {
        Ok(infer::get_from_path(path)?.map(|kind| kind.mime_type().to_string()))
    }
}

/// Icon of a directory: the first of [`FOLDER_ICONS`] present inside it.
/// Returns the icon file name, to be appended to the directory's paths.
pub fn find_dir_icon(dir: &Path) -> Option<&'static str> {
    FOLDER_ICONS
        .iter()
        .copied()
        .find(|icon| dir.join(icon).exists())
}

/// Thumbnail of a media file inside `dir`: `<stem>.png` or `<stem>.jpg`
/// beside it, else the directory fallback list. Returns the icon file
/// name relative to `dir`; `None` when nothing matches.
pub fn find_file_icon(dir: &Path, file_name: &str) -> Option<String> {
    let stem = match file_name.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem,
        _ => file_name,
    };
    for ext in ["png", "jpg"] {
        let candidate = format!("{}.{}", stem, ext);
        if dir.join(&candidate).exists() {
            return Some(candidate);
        }
    }
    find_dir_icon(dir).map(str::to_string)
}

/// DLNA profile of a thumbnail image, from its file extension.
pub fn thumb_profile(icon_name: &str) -> &'static str {
    let lower = icon_name.to_ascii_lowercase();
    if lower.ends_with(".png") {
        "PNG_TN"
    } else if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
        "JPEG_TN"
    } else {
        "*"
    }
}

/// protocolInfo of a thumbnail resource, profile included.
pub fn thumb_protocol_info(icon_name: &str) -> String {
    let lower = icon_name.to_ascii_lowercase();
    let mime = if lower.ends_with(".png") {
        "image/png"
    } else if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
        "image/jpeg"
    } else {
        return "*:*:*:*".to_string();
    };
    format!("http-get:*:{}:DLNA.ORG_PN={}", mime, thumb_profile(icon_name))
}
