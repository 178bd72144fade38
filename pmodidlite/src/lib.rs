//! # pmodidlite - Générateur DIDL-Lite
//!
//! Construction de documents DIDL-Lite pour le service ContentDirectory.
//!
//! Contrairement à un modèle dérivé via serde, les nœuds conservent ici
//! l'ordre d'appel de leurs champs descriptifs : `upnp:artist` est
//! répétable (avec un attribut `role` distinct par appel), et les
//! éléments `res` s'intercalent entre les champs descriptifs exactement
//! dans l'ordre où ils ont été ajoutés.
//!
//! ## Utilisation
//!
//! ```
//! use pmodidlite::{Document, ResourceAttrs, ITEM_CLASS_AUDIO, ROOT_ID};
//!
//! let mut doc = Document::new(ROOT_ID);
//! doc.add_item(ITEM_CLASS_AUDIO, "a song", "1$1")
//!     .resource(
//!         "http://example.com/media/a_song.mp3",
//!         ResourceAttrs {
//!             protocol_info: Some("http-get:*:audio/mpeg:*".to_string()),
//!             size: Some(4096),
//!             ..Default::default()
//!         },
//!     );
//!
//! let xml = doc.to_xml();
//! assert!(xml.contains("<dc:title>a song</dc:title>"));
//! ```
//!
//! ## Pagination
//!
//! [`Document::slice`] consomme le document et retourne la fenêtre
//! demandée ; le total avant découpe est à capturer par l'appelant,
//! voir [`Document::count`].

use quick_xml::escape::escape;
use std::borrow::Cow;
use std::fmt::Write;

/// ObjectID du container racine.
pub const ROOT_ID: &str = "0";
/// ObjectID (synthétique) du parent de la racine.
pub const ROOT_PARENT_ID: &str = "-1";

/// Classe UPnP des containers de type dossier.
pub const CONTAINER_CLASS_FOLDER: &str = "object.container.storageFolder";
/// Classe UPnP des items vidéo.
pub const ITEM_CLASS_VIDEO: &str = "object.item.videoItem";
/// Classe UPnP des items audio.
pub const ITEM_CLASS_AUDIO: &str = "object.item.audioItem";

/// protocolInfo par défaut d'une ressource.
pub const DEFAULT_PROTOCOL_INFO: &str = "*:*:*:*";

const DIDL_NS: &str = "urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/";
const DC_NS: &str = "http://purl.org/dc/elements/1.1/";
const UPNP_NS: &str = "urn:schemas-upnp-org:metadata-1-0/upnp/";
const DLNA_NS: &str = "urn:schemas-dlna-org:metadata-1-0/";

/// Attributs optionnels d'un élément `res`.
///
/// `protocol_info` absent vaut [`DEFAULT_PROTOCOL_INFO`].
#[derive(Debug, Clone, Default)]
pub struct ResourceAttrs {
    pub protocol_info: Option<String>,
    /// Taille du fichier en octets (attribut `size`).
    pub size: Option<u64>,
    pub duration: Option<String>,
    pub bitrate: Option<u32>,
    pub resolution: Option<String>,
}

#[derive(Debug, Clone)]
struct Resource {
    protocol_info: String,
    size: Option<u64>,
    duration: Option<String>,
    bitrate: Option<u32>,
    resolution: Option<String>,
    url: String,
}

/// Élément descriptif simple, avec au plus un attribut.
#[derive(Debug, Clone)]
struct Property {
    tag: &'static str,
    text: String,
    attr: Option<(&'static str, String)>,
}

#[derive(Debug, Clone)]
enum Child {
    Property(Property),
    Resource(Resource),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Container,
    Item,
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    id: String,
    title: String,
    class: String,
    children: Vec<Child>,
}

/// Document DIDL-Lite en cours de construction.
///
/// Séquence ordonnée de containers et d'items partageant un même contexte
/// parent. Le document est construit à chaque requête puis jeté après
/// sérialisation ; aucune API d'arbre mutable n'est exposée au-delà du
/// handle d'ajout.
#[derive(Debug, Clone)]
pub struct Document {
    parent_id: String,
    nodes: Vec<Node>,
}

impl Document {
    /// Crée un document vide lié à un contexte parent.
    pub fn new(parent_id: impl Into<String>) -> Self {
        Self {
            parent_id: parent_id.into(),
            nodes: Vec::new(),
        }
    }

    /// ObjectID parent commun à tous les nœuds du document.
    pub fn parent_id(&self) -> &str {
        &self.parent_id
    }

    /// Nombre de nœuds (containers et items confondus).
    pub fn count(&self) -> u32 {
        self.nodes.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ajoute un container (classe `object.container.storageFolder`).
    pub fn add_container(
        &mut self,
        title: impl Into<String>,
        id: impl Into<String>,
    ) -> NodeHandle<'_> {
        self.push_node(NodeKind::Container, CONTAINER_CLASS_FOLDER, title, id)
    }

    /// Ajoute un item de la classe média donnée.
    pub fn add_item(
        &mut self,
        class: impl Into<String>,
        title: impl Into<String>,
        id: impl Into<String>,
    ) -> NodeHandle<'_> {
        let class = class.into();
        self.push_node(NodeKind::Item, class, title, id)
    }

    fn push_node(
        &mut self,
        kind: NodeKind,
        class: impl Into<String>,
        title: impl Into<String>,
        id: impl Into<String>,
    ) -> NodeHandle<'_> {
        self.nodes.push(Node {
            kind,
            id: id.into(),
            title: title.into(),
            class: class.into(),
            children: Vec::new(),
        });
        NodeHandle {
            node: self.nodes.last_mut().unwrap(),
        }
    }

    /// Fenêtre de pagination.
    ///
    /// Saute les `starting_index` premiers nœuds (base 0) puis en conserve
    /// au plus `requested_count` ; une valeur négative signifie « tout le
    /// reste ». Un index de départ hors bornes donne un document vide,
    /// jamais une erreur. Le total avant découpe est perdu : l'appelant
    /// doit le capturer avant d'appeler cette méthode.
    pub fn slice(self, starting_index: u32, requested_count: i32) -> Document {
        let keep = if requested_count < 0 {
            usize::MAX
        } else {
            requested_count as usize
        };
        let nodes = self
            .nodes
            .into_iter()
            .skip(starting_index as usize)
            .take(keep)
            .collect();
        Document {
            parent_id: self.parent_id,
            nodes,
        }
    }

    /// Sérialise le document en XML DIDL-Lite, sans prologue.
    ///
    /// La sérialisation est pure : deux appels sur un document non modifié
    /// produisent le même résultat.
    pub fn to_xml(&self) -> String {
        let mut xml = String::new();
        let _ = write!(
            &mut xml,
            "<DIDL-Lite xmlns=\"{}\" xmlns:dc=\"{}\" xmlns:upnp=\"{}\" xmlns:dlna=\"{}\">",
            DIDL_NS, DC_NS, UPNP_NS, DLNA_NS
        );
        for node in &self.nodes {
            write_node(&mut xml, node, &self.parent_id);
        }
        xml.push_str("</DIDL-Lite>");
        xml
    }
}

fn write_node(xml: &mut String, node: &Node, parent_id: &str) {
    let tag = match node.kind {
        NodeKind::Container => "container",
        NodeKind::Item => "item",
    };
    let _ = write!(
        xml,
        "<{} id=\"{}\" parentID=\"{}\" restricted=\"1\">",
        tag,
        escape(&node.id),
        escape(parent_id)
    );
    write_text_element(xml, "dc:title", &node.title, None);
    write_text_element(xml, "upnp:class", &node.class, None);
    for child in &node.children {
        match child {
            Child::Property(p) => {
                write_text_element(xml, p.tag, &p.text, p.attr.as_ref());
            }
            Child::Resource(r) => write_resource(xml, r),
        }
    }
    let _ = write!(xml, "</{}>", tag);
}

fn write_text_element(
    xml: &mut String,
    tag: &str,
    text: &str,
    attr: Option<&(&'static str, String)>,
) {
    match attr {
        Some((name, value)) => {
            let _ = write!(xml, "<{} {}=\"{}\">", tag, name, escape(value));
        }
        None => {
            let _ = write!(xml, "<{}>", tag);
        }
    }
    xml.push_str(&escape(text));
    let _ = write!(xml, "</{}>", tag);
}

fn write_resource(xml: &mut String, res: &Resource) {
    let _ = write!(xml, "<res protocolInfo=\"{}\"", escape(&res.protocol_info));
    if let Some(size) = res.size {
        let _ = write!(xml, " size=\"{}\"", size);
    }
    if let Some(ref duration) = res.duration {
        let _ = write!(xml, " duration=\"{}\"", escape(duration));
    }
    if let Some(bitrate) = res.bitrate {
        let _ = write!(xml, " bitrate=\"{}\"", bitrate);
    }
    if let Some(ref resolution) = res.resolution {
        let _ = write!(xml, " resolution=\"{}\"", escape(resolution));
    }
    xml.push('>');
    xml.push_str(&escape(&res.url));
    xml.push_str("</res>");
}

/// Handle d'édition du dernier nœud ajouté.
///
/// Chaque setter ajoute un élément enfant (jamais de remplacement) et
/// retourne le handle, ce qui permet le chaînage :
///
/// ```
/// use pmodidlite::{Document, ROOT_ID};
///
/// let mut doc = Document::new(ROOT_ID);
/// doc.add_container("Concerts", "1.1")
///     .genre("Jazz")
///     .artist("Trio X", None)
///     .artist("Trio X", Some("Performer"));
/// ```
#[derive(Debug)]
pub struct NodeHandle<'a> {
    node: &'a mut Node,
}

impl NodeHandle<'_> {
    fn push_property(self, tag: &'static str, text: impl Into<String>) -> Self {
        self.push_property_attr(tag, text, None)
    }

    fn push_property_attr(
        self,
        tag: &'static str,
        text: impl Into<String>,
        attr: Option<(&'static str, String)>,
    ) -> Self {
        self.node.children.push(Child::Property(Property {
            tag,
            text: text.into(),
            attr,
        }));
        self
    }

    pub fn creator(self, value: impl Into<String>) -> Self {
        self.push_property("dc:creator", value)
    }

    pub fn genre(self, value: impl Into<String>) -> Self {
        self.push_property("upnp:genre", value)
    }

    /// Ajoute un artiste, avec un rôle optionnel.
    ///
    /// Répétable : chaque appel ajoute un élément `upnp:artist` distinct,
    /// les rôles ne s'écrasent jamais.
    pub fn artist(self, value: impl Into<String>, role: Option<&str>) -> Self {
        let attr = role.map(|r| ("role", r.to_string()));
        self.push_property_attr("upnp:artist", value, attr)
    }

    pub fn author(self, value: impl Into<String>) -> Self {
        self.push_property("upnp:author", value)
    }

    pub fn album(self, value: impl Into<String>) -> Self {
        self.push_property("upnp:album", value)
    }

    pub fn track(self, value: impl Into<String>) -> Self {
        self.push_property("upnp:originalTrackNumber", value)
    }

    pub fn actor(self, value: impl Into<String>) -> Self {
        self.push_property("upnp:actor", value)
    }

    pub fn director(self, value: impl Into<String>) -> Self {
        self.push_property("upnp:director", value)
    }

    pub fn date(self, value: impl Into<String>) -> Self {
        self.push_property("dc:date", value)
    }

    /// Déclare une classe recherchable (attribut `includeDerived="1"`).
    pub fn search_class(self, value: impl Into<String>) -> Self {
        self.push_property_attr(
            "upnp:searchClass",
            value,
            Some(("includeDerived", "1".to_string())),
        )
    }

    pub fn long_description(self, value: impl Into<String>) -> Self {
        self.push_property("upnp:longDescription", value)
    }

    pub fn description(self, value: impl Into<String>) -> Self {
        self.push_property("dc:description", value)
    }

    pub fn language(self, value: impl Into<String>) -> Self {
        self.push_property("dc:language", value)
    }

    pub fn icon(self, url: impl Into<String>) -> Self {
        self.push_property("upnp:icon", url)
    }

    /// Ajoute une ressource `res`.
    ///
    /// Répétable : un item peut porter sa ressource principale puis une
    /// vignette. `protocol_info` absent vaut [`DEFAULT_PROTOCOL_INFO`].
    pub fn resource(self, url: impl Into<String>, attrs: ResourceAttrs) -> Self {
        self.node.children.push(Child::Resource(Resource {
            protocol_info: attrs
                .protocol_info
                .unwrap_or_else(|| DEFAULT_PROTOCOL_INFO.to_string()),
            size: attrs.size,
            duration: attrs.duration,
            bitrate: attrs.bitrate,
            resolution: attrs.resolution,
            url: url.into(),
        }));
        self
    }
}

/// Décode du texte hérité : UTF-8 si valide, sinon réinterprétation
/// Latin-1 transcodée en UTF-8. Ne rejette jamais son entrée.
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(s) => Cow::Borrowed(s),
        Err(_) => Cow::Owned(bytes.iter().map(|&b| b as char).collect()),
    }
}
