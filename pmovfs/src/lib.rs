//! # PMOVfs
//!
//! Virtual filesystem layer for the PMOShare ContentDirectory.
//!
//! Maps opaque, remote-visible object ids onto the administrator's shared
//! directory trees without ever leaking real host paths:
//!
//! - **Shared roots** ([`SharedRoot`]): the configured host/web path pairs.
//! - **Address codec** ([`address`]): decodes ids like `"1.2$3"` by walking
//!   sorted directory listings; any failure collapses to a single opaque
//!   [`InvalidAddress`] error.
//! - **Directory listing** ([`listing`]): deterministic, sorted enumeration
//!   of subfolders and files.
//! - **Media classification** ([`media`]): content-based MIME sniffing,
//!   display-title derivation, icon lookup and DLNA thumbnail profiles.
//!
//! Addresses are computed fresh per request and are only stable while the
//! target directory is unmodified; concurrent mutation between the
//! addressing and resolving passes of one call is a known limitation, not
//! a supported scenario.

pub mod address;
pub mod listing;
pub mod media;
pub mod roots;

pub use address::{InvalidAddress, VirtualNode, decode, file_id, folder_id, parent_of};
pub use listing::{Listing, list};
pub use media::{
    ContentSniffer, MediaClass, MimeSniffer, class_from_mime, derive_title, find_dir_icon,
    find_file_icon, thumb_profile, thumb_protocol_info,
};
pub use roots::SharedRoot;
