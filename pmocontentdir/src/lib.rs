//! # PMOContentDir
//!
//! Cœur du service ContentDirectory de PMOShare : expose les dossiers
//! partagés configurés à des renderers UPnP via le protocole de
//! navigation hiérarchique Browse.
//!
//! # Architecture
//!
//! Le crate ne fait aucun framing d'enveloppe : le collaborateur
//! transport fournit un [`BrowseRequest`] décodé et récupère un
//! [`ActionResult`], carte de champs plate qu'il sérialise lui-même
//! (ou la sentinelle `illegal` qu'il convertit en faute protocolaire).
//!
//! - [`config`] : chargement YAML des dossiers partagés
//! - [`request`] : enregistrements requête/réponse du contrat transport
//! - [`content_handler`] : l'orchestrateur Browse et les autres actions
//!
//! # Utilisation de base
//!
//! ```no_run
//! use pmocontentdir::{BrowseRequest, Config, ContentDirectory};
//!
//! # fn main() -> anyhow::Result<()> {
//! let directory = ContentDirectory::new(Config::load()?);
//! let result = directory.browse(&BrowseRequest::direct_children("1", 0, -1));
//! println!("{:?}", result.field("Result"));
//! # Ok(())
//! # }
//! ```
//!
//! Chaque requête est traitée de manière synchrone et sans état : les
//! adresses, listings et classifications sont recalculés à chaque appel,
//! aucune coordination n'est nécessaire entre requêtes concurrentes.

pub mod config;
pub mod content_handler;
pub mod request;

pub use config::Config;
pub use content_handler::{ContentDirectory, SYSTEM_UPDATE_ID};
pub use request::{ActionResult, BrowseFlag, BrowseRequest, BrowseResponse, ILLEGAL_TOKEN};
