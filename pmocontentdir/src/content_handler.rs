//! # ContentDirectory Handler - Logique métier du service
//!
//! Implémente les actions du service ContentDirectory au-dessus des
//! dossiers partagés configurés. Chaque appel est sans état : aucun
//! document, listing ou résultat de classification ne survit à la
//! requête ; seuls les dossiers partagés (lecture seule) et la révision
//! constante [`SYSTEM_UPDATE_ID`] sont partagés entre appels.
//!
//! ## Architecture
//!
//! ```text
//! Transport (enveloppe SOAP/HTTP, externe)
//!       ↓ BrowseRequest décodé
//! ContentDirectory (ce module)
//!       ↓ pmovfs  - résolution d'object id, listing, classification
//!       ↓ pmodidlite - construction et découpe du document DIDL-Lite
//!       ↑ ActionResult (carte de champs, ou sentinelle `illegal`)
//! ```
//!
//! ## Politique d'erreur
//!
//! Toute adresse invalide et toute défaillance filesystem est rabattue
//! sur la sentinelle [`ActionResult::Illegal`] à la frontière de ce
//! module, jamais propagée en faute brute. Un fichier de type inconnu
//! n'est pas une erreur : il est omis du listing (mais consomme sa
//! position dans le compteur de fichiers, les adresses des suivants
//! restent donc stables).

use crate::config::Config;
use crate::request::{ActionResult, BrowseFlag, BrowseRequest, BrowseResponse};
use pmodidlite::{
    Document, ITEM_CLASS_AUDIO, ITEM_CLASS_VIDEO, ResourceAttrs, ROOT_ID, ROOT_PARENT_ID,
};
use pmovfs::media::{find_dir_icon, find_file_icon, thumb_protocol_info};
use pmovfs::{
    ContentSniffer, InvalidAddress, MediaClass, MimeSniffer, SharedRoot, address, class_from_mime,
    derive_title, listing,
};
use std::fs;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Révision constante du système ; les clients peuvent la sonder via
/// GetSystemUpdateID pour détecter des changements structurels.
pub const SYSTEM_UPDATE_ID: u32 = 13;

/// Échec interne d'un Browse, résorbé en sentinelle avant de sortir.
#[derive(Debug, Error)]
enum BrowseError {
    #[error(transparent)]
    InvalidAddress(#[from] InvalidAddress),
    #[error("unknown media type")]
    UnknownMedia,
}

/// Handler du service ContentDirectory.
pub struct ContentDirectory {
    roots: Vec<SharedRoot>,
    protocol_info: String,
    sniffer: Arc<dyn MimeSniffer>,
}

impl ContentDirectory {
    /// Crée le handler avec le sniffer de contenu par défaut.
    pub fn new(config: Config) -> Self {
        Self::with_sniffer(config, Arc::new(ContentSniffer))
    }

    /// Crée le handler avec un sniffer injecté (tests, caches).
    pub fn with_sniffer(config: Config, sniffer: Arc<dyn MimeSniffer>) -> Self {
        Self {
            roots: config.folders,
            protocol_info: config.protocol_info,
            sniffer,
        }
    }

    /// Répartit une requête décodée vers l'action nommée.
    ///
    /// Les actions sans argument ignorent le contenu de `request`.
    pub fn handle(&self, action: &str, request: &BrowseRequest) -> ActionResult {
        match action {
            "Browse" => self.browse(request),
            "Search" => self.search(request),
            "GetSystemUpdateID" => self.get_system_update_id(),
            "GetSearchCapabilities" => self.get_search_capabilities(),
            "GetSortCapabilities" => self.get_sort_capabilities(),
            "GetProtocolInfo" => self.get_protocol_info(),
            _ => {
                warn!(action, "unknown ContentDirectory action");
                ActionResult::Illegal
            }
        }
    }

    /// Action Browse : métadonnées d'un objet ou listing de ses enfants.
    pub fn browse(&self, request: &BrowseRequest) -> ActionResult {
        debug!(
            object_id = %request.object_id,
            browse_flag = request.browse_flag.as_wire(),
            starting_index = request.starting_index,
            requested_count = request.requested_count,
            "📂 ContentDirectory::Browse"
        );

        let outcome = match request.browse_flag {
            BrowseFlag::Metadata => self.browse_metadata(&request.object_id),
            BrowseFlag::DirectChildren => self.browse_direct_children(
                &request.object_id,
                request.starting_index,
                request.requested_count,
            ),
        };

        match outcome {
            Ok(response) => {
                debug!(
                    returned = response.number_returned,
                    total = response.total_matches,
                    "✅ Browse completed"
                );
                response.into_fields()
            }
            Err(err) => {
                warn!(object_id = %request.object_id, error = %err, "Browse failed");
                ActionResult::Illegal
            }
        }
    }

    /// Métadonnées d'un seul objet. Tout-ou-rien : counts 1/1 ou sentinelle.
    fn browse_metadata(&self, object_id: &str) -> Result<BrowseResponse, BrowseError> {
        if object_id == ROOT_ID {
            let mut doc = Document::new(ROOT_PARENT_ID);
            doc.add_container("root", ROOT_ID)
                .search_class(ITEM_CLASS_AUDIO)
                .search_class(ITEM_CLASS_VIDEO);
            return Ok(single(doc));
        }

        let node = address::decode(object_id, &self.roots)?;
        if node.is_directory {
            let mut doc = Document::new(node.parent_id.clone());
            doc.add_container(title_of(&node.web_path), object_id);
            Ok(single(doc))
        } else {
            let file_name = title_of(&node.web_path);
            let mime = self
                .sniffer
                .sniff(&node.real_path)
                .map_err(|_| InvalidAddress)?
                .ok_or(BrowseError::UnknownMedia)?;
            let class = class_from_mime(&mime).ok_or(BrowseError::UnknownMedia)?;
            let size = fs::metadata(&node.real_path).map_err(|_| InvalidAddress)?.len();

            let mut doc = Document::new(node.parent_id.clone());
            doc.add_item(upnp_class(class), derive_title(file_name), object_id)
                .resource(
                    node.web_path.clone(),
                    ResourceAttrs {
                        protocol_info: Some(format!("http-get:*:{}:*", mime)),
                        size: Some(size),
                        ..Default::default()
                    },
                );
            Ok(single(doc))
        }
    }

    /// Listing des enfants directs d'un container, avec pagination.
    fn browse_direct_children(
        &self,
        object_id: &str,
        starting_index: u32,
        requested_count: i32,
    ) -> Result<BrowseResponse, BrowseError> {
        let doc = if object_id == ROOT_ID {
            self.build_root_children()
        } else {
            let node = address::decode(object_id, &self.roots)?;
            if !node.is_directory {
                return Err(InvalidAddress.into());
            }
            self.build_directory_children(object_id, &node)?
        };

        let total_matches = doc.count();
        let doc = doc.slice(starting_index, requested_count);
        Ok(BrowseResponse {
            result: doc.to_xml(),
            number_returned: doc.count(),
            total_matches,
            update_id: SYSTEM_UPDATE_ID,
        })
    }

    /// Un container par dossier partagé configuré.
    ///
    /// Les valeurs descriptives sont des littéraux hérités de l'endpoint
    /// historique ; comportement conservé tel quel, pas des métadonnées
    /// réelles par dossier.
    fn build_root_children(&self) -> Document {
        let mut doc = Document::new(ROOT_ID);
        for (index, root) in self.roots.iter().enumerate() {
            doc.add_container(root.title(), (index + 1).to_string())
                .creator("Creator")
                .genre("Genre")
                .artist("Artist", None)
                .author("Author")
                .album("Album")
                .date("2014-01-01")
                .actor("Actor")
                .director("Director");
        }
        doc
    }

    /// Sous-dossiers puis fichiers d'un répertoire résolu, triés.
    fn build_directory_children(
        &self,
        object_id: &str,
        node: &address::VirtualNode,
    ) -> Result<Document, BrowseError> {
        let listing = listing::list(&node.real_path, true).map_err(|_| InvalidAddress)?;
        let mut doc = Document::new(object_id);

        for (position, folder) in listing.folders.iter().enumerate() {
            let handle =
                doc.add_container(folder.as_str(), address::folder_id(object_id, position + 1));
            if let Some(icon) = find_dir_icon(&node.real_path.join(folder)) {
                handle.icon(format!("{}{}/{}", node.web_path, folder, icon));
            }
        }

        // Le compteur avance pour chaque fichier brut, y compris ceux
        // écartés comme inconnus : leurs positions restent adressables.
        let mut file_counter = 0usize;
        for file in &listing.files {
            file_counter += 1;
            let path = node.real_path.join(file);
            let mime = match self.sniffer.sniff(&path) {
                Ok(Some(mime)) => mime,
                Ok(None) => continue,
                Err(err) => {
                    debug!(file = %file, error = %err, "sniffing failed, entry skipped");
                    continue;
                }
            };
            let Some(class) = class_from_mime(&mime) else {
                continue;
            };
            let size = fs::metadata(&path).ok().map(|m| m.len());

            let handle = doc
                .add_item(
                    upnp_class(class),
                    derive_title(file),
                    address::file_id(object_id, file_counter),
                )
                .resource(
                    format!("{}{}", node.web_path, file),
                    ResourceAttrs {
                        protocol_info: Some(format!("http-get:*:{}:*", mime)),
                        size,
                        ..Default::default()
                    },
                );
            if let Some(icon) = find_file_icon(&node.real_path, file) {
                let icon_url = format!("{}{}", node.web_path, icon);
                handle
                    .resource(
                        icon_url.clone(),
                        ResourceAttrs {
                            protocol_info: Some(thumb_protocol_info(&icon)),
                            ..Default::default()
                        },
                    )
                    .icon(icon_url);
            }
        }
        Ok(doc)
    }

    /// Action Search : non supportée, résultat vide (comme l'endpoint
    /// d'origine), jamais une faute.
    pub fn search(&self, request: &BrowseRequest) -> ActionResult {
        debug!(object_id = %request.object_id, "🔍 ContentDirectory::Search (stub)");
        single(Document::new(ROOT_ID)).into_fields()
    }

    pub fn get_system_update_id(&self) -> ActionResult {
        ActionResult::Fields(vec![("Id", SYSTEM_UPDATE_ID.to_string())])
    }

    pub fn get_search_capabilities(&self) -> ActionResult {
        ActionResult::Fields(vec![("SearchCaps", String::new())])
    }

    pub fn get_sort_capabilities(&self) -> ActionResult {
        ActionResult::Fields(vec![("SortCaps", String::new())])
    }

    /// Vient de ConnectionManager, mais assez simple pour être servi ici,
    /// comme dans l'endpoint d'origine.
    pub fn get_protocol_info(&self) -> ActionResult {
        ActionResult::Fields(vec![
            ("Source", self.protocol_info.clone()),
            ("Sink", String::new()),
        ])
    }
}

fn upnp_class(class: MediaClass) -> &'static str {
    match class {
        MediaClass::Audio => ITEM_CLASS_AUDIO,
        MediaClass::Video => ITEM_CLASS_VIDEO,
    }
}

/// Dernier composant d'un web path (nom du dossier ou du fichier).
fn title_of(web_path: &str) -> &str {
    web_path
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(web_path)
}

/// Réponse à un seul nœud : numberReturned = totalMatches = 1.
fn single(doc: Document) -> BrowseResponse {
    let count = doc.count();
    BrowseResponse {
        result: doc.to_xml(),
        number_returned: count,
        total_matches: count,
        update_id: SYSTEM_UPDATE_ID,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::{self, Write as _};
    use std::path::Path;
    use tempfile::TempDir;

    // En-têtes magiques reconnus par le sniffer par défaut.
    const ID3_HEADER: &[u8] = b"ID3\x04\x00\x00\x00\x00\x00\x00";
    const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n";

    fn write_file(path: &Path, bytes: &[u8]) {
        File::create(path).unwrap().write_all(bytes).unwrap();
    }

    fn share(dir: &TempDir) -> Config {
        Config {
            folders: vec![SharedRoot::new(dir.path(), "http://host/media/")],
            ..Default::default()
        }
    }

    fn handler(dir: &TempDir) -> ContentDirectory {
        ContentDirectory::new(share(dir))
    }

    /// Sniffer de test par extension : classification fixe sans vrais
    /// fichiers média sur disque.
    struct ExtSniffer;

    impl MimeSniffer for ExtSniffer {
        fn sniff(&self, path: &Path) -> io::Result<Option<String>> {
            Ok(match path.extension().and_then(|e| e.to_str()) {
                Some("mp3") => Some("audio/mpeg".to_string()),
                Some("mkv") => Some("video/x-matroska".to_string()),
                _ => None,
            })
        }
    }

    #[test]
    fn test_metadata_root() {
        let dir = tempfile::tempdir().unwrap();
        let result = handler(&dir).browse(&BrowseRequest::metadata("0"));
        assert_eq!(result.field("NumberReturned"), Some("1"));
        assert_eq!(result.field("TotalMatches"), Some("1"));
        let xml = result.field("Result").unwrap();
        assert!(xml.contains("<container id=\"0\" parentID=\"-1\" restricted=\"1\">"));
        assert!(xml.contains("<dc:title>root</dc:title>"));
        assert!(xml.contains(
            "<upnp:searchClass includeDerived=\"1\">object.item.audioItem</upnp:searchClass>"
        ));
        assert!(xml.contains(
            "<upnp:searchClass includeDerived=\"1\">object.item.videoItem</upnp:searchClass>"
        ));
    }

    #[test]
    fn test_metadata_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("Rock")).unwrap();
        let result = handler(&dir).browse(&BrowseRequest::metadata("1.1"));
        assert_eq!(result.field("NumberReturned"), Some("1"));
        let xml = result.field("Result").unwrap();
        assert!(xml.contains("<container id=\"1.1\" parentID=\"1\" restricted=\"1\">"));
        assert!(xml.contains("<dc:title>Rock</dc:title>"));
    }

    #[test]
    fn test_metadata_file() {
        let dir = tempfile::tempdir().unwrap();
        write_file(&dir.path().join("a_song.mp3"), ID3_HEADER);
        let result = handler(&dir).browse(&BrowseRequest::metadata("1$1"));
        assert_eq!(result.field("NumberReturned"), Some("1"));
        assert_eq!(result.field("TotalMatches"), Some("1"));
        let xml = result.field("Result").unwrap();
        assert!(xml.contains("<item id=\"1$1\" parentID=\"1\" restricted=\"1\">"));
        assert!(xml.contains("<dc:title>a song</dc:title>"));
        assert!(xml.contains("<upnp:class>object.item.audioItem</upnp:class>"));
        assert!(xml.contains(&format!(
            "<res protocolInfo=\"http-get:*:audio/mpeg:*\" size=\"{}\">http://host/media/a_song.mp3</res>",
            ID3_HEADER.len()
        )));
    }

    #[test]
    fn test_metadata_unknown_file_is_illegal() {
        let dir = tempfile::tempdir().unwrap();
        write_file(&dir.path().join("notes.mp3"), b"no magic here");
        let result = handler(&dir).browse(&BrowseRequest::metadata("1$1"));
        assert!(result.is_illegal());
    }

    #[test]
    fn test_metadata_bad_address_is_illegal() {
        let dir = tempfile::tempdir().unwrap();
        let cd = handler(&dir);
        assert!(cd.browse(&BrowseRequest::metadata("1.99")).is_illegal());
        assert!(cd.browse(&BrowseRequest::metadata("garbage")).is_illegal());
    }

    #[test]
    fn test_direct_children_scenario() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("Rock")).unwrap();
        write_file(&dir.path().join("a_song.mp3"), ID3_HEADER);

        let result = handler(&dir).browse(&BrowseRequest::direct_children("1", 0, -1));
        assert_eq!(result.field("NumberReturned"), Some("2"));
        assert_eq!(result.field("TotalMatches"), Some("2"));
        assert_eq!(result.field("UpdateID"), Some("13"));
        let xml = result.field("Result").unwrap();
        assert!(xml.contains("<container id=\"1.1\" parentID=\"1\" restricted=\"1\">"));
        assert!(xml.contains("<dc:title>Rock</dc:title>"));
        assert!(xml.contains("<item id=\"1$1\" parentID=\"1\" restricted=\"1\">"));
        assert!(xml.contains("<dc:title>a song</dc:title>"));
        assert!(xml.contains(&format!(
            "<res protocolInfo=\"http-get:*:audio/mpeg:*\" size=\"{}\">http://host/media/a_song.mp3</res>",
            ID3_HEADER.len()
        )));
    }

    #[test]
    fn test_direct_children_root_lists_shares_with_legacy_values() {
        let video = tempfile::tempdir().unwrap();
        let music = tempfile::tempdir().unwrap();
        let config = Config {
            folders: vec![
                SharedRoot::new(video.path(), "http://host/media/video/"),
                SharedRoot::new(music.path(), "http://host/media/music/"),
            ],
            ..Default::default()
        };
        let result =
            ContentDirectory::new(config).browse(&BrowseRequest::direct_children("0", 0, -1));
        assert_eq!(result.field("NumberReturned"), Some("2"));
        let xml = result.field("Result").unwrap();
        assert!(xml.contains("<container id=\"1\" parentID=\"0\" restricted=\"1\">"));
        assert!(xml.contains("<container id=\"2\" parentID=\"0\" restricted=\"1\">"));
        assert!(xml.contains("<dc:title>video</dc:title>"));
        assert!(xml.contains("<dc:title>music</dc:title>"));
        // Valeurs héritées, conservées telles quelles
        assert!(xml.contains("<dc:creator>Creator</dc:creator>"));
        assert!(xml.contains("<upnp:artist>Artist</upnp:artist>"));
        assert!(xml.contains("<dc:date>2014-01-01</dc:date>"));
        assert!(xml.contains("<upnp:director>Director</upnp:director>"));
    }

    #[test]
    fn test_unknown_file_skipped_but_counter_consumed() {
        let dir = tempfile::tempdir().unwrap();
        // trié : a_data.bin (inconnu, position 1) avant b_song.mp3 (position 2)
        write_file(&dir.path().join("a_data.bin"), b"opaque data");
        write_file(&dir.path().join("b_song.mp3"), ID3_HEADER);

        let result = handler(&dir).browse(&BrowseRequest::direct_children("1", 0, -1));
        assert_eq!(result.field("NumberReturned"), Some("1"));
        assert_eq!(result.field("TotalMatches"), Some("1"));
        let xml = result.field("Result").unwrap();
        assert!(xml.contains("<item id=\"1$2\""));
        assert!(!xml.contains("1$1"));
    }

    #[test]
    fn test_direct_children_of_file_is_illegal() {
        let dir = tempfile::tempdir().unwrap();
        write_file(&dir.path().join("a_song.mp3"), ID3_HEADER);
        let result = handler(&dir).browse(&BrowseRequest::direct_children("1$1", 0, -1));
        assert!(result.is_illegal());
    }

    #[test]
    fn test_direct_children_out_of_range_is_illegal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("Rock")).unwrap();
        let result = handler(&dir).browse(&BrowseRequest::direct_children("1.99", 0, -1));
        assert!(result.is_illegal());
    }

    #[test]
    fn test_pagination_window() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["A", "B", "C"] {
            std::fs::create_dir(dir.path().join(name)).unwrap();
        }
        let cd = handler(&dir);

        // fenêtre hors bornes : vide, jamais une erreur
        let result = cd.browse(&BrowseRequest::direct_children("1", 5, 2));
        assert_eq!(result.field("NumberReturned"), Some("0"));
        assert_eq!(result.field("TotalMatches"), Some("3"));
        assert!(!result.field("Result").unwrap().contains("<container"));

        let result = cd.browse(&BrowseRequest::direct_children("1", 1, 1));
        assert_eq!(result.field("NumberReturned"), Some("1"));
        assert_eq!(result.field("TotalMatches"), Some("3"));
        let xml = result.field("Result").unwrap();
        assert!(xml.contains("<dc:title>B</dc:title>"));
        assert!(!xml.contains("<dc:title>A</dc:title>"));
    }

    #[test]
    fn test_folder_icon_attached() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("Rock")).unwrap();
        write_file(&dir.path().join("Rock/folder.png"), PNG_HEADER);
        let result = handler(&dir).browse(&BrowseRequest::direct_children("1", 0, -1));
        let xml = result.field("Result").unwrap();
        assert!(xml.contains("<upnp:icon>http://host/media/Rock/folder.png</upnp:icon>"));
    }

    #[test]
    fn test_file_thumbnail_adds_resource_and_icon() {
        let dir = tempfile::tempdir().unwrap();
        write_file(&dir.path().join("a_song.mp3"), ID3_HEADER);
        write_file(&dir.path().join("a_song.jpg"), b"\xff\xd8\xff\xdb");
        let result = handler(&dir).browse(&BrowseRequest::direct_children("1", 0, -1));
        let xml = result.field("Result").unwrap();
        assert!(xml.contains(
            "<res protocolInfo=\"http-get:*:image/jpeg:DLNA.ORG_PN=JPEG_TN\">\
             http://host/media/a_song.jpg</res>"
        ));
        assert!(xml.contains("<upnp:icon>http://host/media/a_song.jpg</upnp:icon>"));
    }

    #[test]
    fn test_injected_sniffer_classifies_without_content() {
        let dir = tempfile::tempdir().unwrap();
        write_file(&dir.path().join("clip.mkv"), b"");
        let cd = ContentDirectory::with_sniffer(share(&dir), Arc::new(ExtSniffer));
        let result = cd.browse(&BrowseRequest::direct_children("1", 0, -1));
        let xml = result.field("Result").unwrap();
        assert!(xml.contains("<upnp:class>object.item.videoItem</upnp:class>"));
        assert!(xml.contains("protocolInfo=\"http-get:*:video/x-matroska:*\""));
    }

    #[test]
    fn test_action_dispatch() {
        let dir = tempfile::tempdir().unwrap();
        let cd = handler(&dir);
        let request = BrowseRequest::metadata("0");

        let result = cd.handle("GetSystemUpdateID", &request);
        assert_eq!(result.field("Id"), Some("13"));

        let result = cd.handle("GetSearchCapabilities", &request);
        assert_eq!(result.field("SearchCaps"), Some(""));

        let result = cd.handle("GetSortCapabilities", &request);
        assert_eq!(result.field("SortCaps"), Some(""));

        let result = cd.handle("GetProtocolInfo", &request);
        assert!(result.field("Source").unwrap().contains("http-get:*:audio/mpeg:*"));
        assert_eq!(result.field("Sink"), Some(""));

        assert!(cd.handle("SelfDestruct", &request).is_illegal());
    }

    #[test]
    fn test_search_stub_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let result = handler(&dir).handle("Search", &BrowseRequest::metadata("0"));
        assert_eq!(result.field("NumberReturned"), Some("0"));
        assert_eq!(result.field("TotalMatches"), Some("0"));
        assert_eq!(result.field("UpdateID"), Some("13"));
        assert!(result.field("Result").unwrap().contains("DIDL-Lite"));
    }
}
