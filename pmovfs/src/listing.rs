//! Deterministic, sorted directory enumeration.

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::Path;

/// Sorted content of one directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    /// Subfolder names, ascending code-point order.
    pub folders: Vec<String>,
    /// File names, ascending code-point order. Empty unless requested.
    pub files: Vec<String>,
}

/// Enumerates `path`, partitioning entries into subfolders and files.
///
/// `.`/`..` never appear; symlinks are resolved, and anything that is not
/// a readable directory goes into the file bucket. Both lists are sorted
/// ascending by name, case-sensitive, so that two listings of an
/// unchanged directory are identical; the address codec relies on this.
pub fn list(path: &Path, include_files: bool) -> io::Result<Listing> {
    let mut listing = Listing::default();
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let name = decode_name(&entry.file_name());
        // fs::metadata follows symlinks; a broken link counts as a file,
        // like the original endpoint's isDir() check.
        let is_dir = fs::metadata(entry.path()).map(|m| m.is_dir()).unwrap_or(false);
        if is_dir {
            listing.folders.push(name);
        } else if include_files {
            listing.files.push(name);
        }
    }
    listing.folders.sort();
    listing.files.sort();
    Ok(listing)
}

/// Decodes a file name for display and URL building.
///
/// UTF-8 names pass through; anything else is reinterpreted as Latin-1
/// via [`pmodidlite::decode_text`], never rejected.
pub fn decode_name(name: &OsStr) -> String {
    match name.to_str() {
        Some(s) => s.to_string(),
        #[cfg(unix)]
        None => {
            use std::os::unix::ffi::OsStrExt;
            pmodidlite::decode_text(name.as_bytes()).into_owned()
        }
        #[cfg(not(unix))]
        None => name.to_string_lossy().into_owned(),
    }
}
