//! Enregistrements échangés avec le collaborateur transport.
//!
//! Le transport (enveloppe SOAP, HTTP) décode la requête entrante en un
//! [`BrowseRequest`] et sérialise lui-même la carte de champs retournée ;
//! le cœur ne fait jamais de framing d'enveloppe.

/// Jeton littéral rendu par le transport pour [`ActionResult::Illegal`].
pub const ILLEGAL_TOKEN: &str = "illegal";

/// Mode de récupération d'un Browse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowseFlag {
    /// Métadonnées d'un seul objet adressé.
    Metadata,
    /// Listing complet des enfants d'un container.
    DirectChildren,
}

impl BrowseFlag {
    /// Décode la valeur UPnP du champ `BrowseFlag`.
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "BrowseMetadata" => Some(Self::Metadata),
            "BrowseDirectChildren" => Some(Self::DirectChildren),
            _ => None,
        }
    }

    pub fn as_wire(self) -> &'static str {
        match self {
            Self::Metadata => "BrowseMetadata",
            Self::DirectChildren => "BrowseDirectChildren",
        }
    }
}

/// Requête Browse décodée.
#[derive(Debug, Clone)]
pub struct BrowseRequest {
    pub object_id: String,
    pub browse_flag: BrowseFlag,
    /// Index de départ de la fenêtre, base 0.
    pub starting_index: u32,
    /// Nombre d'éléments demandés ; négatif = « tous ».
    pub requested_count: i32,
    /// Filtre de propriétés, ignoré.
    pub filter: String,
}

impl BrowseRequest {
    /// Requête de métadonnées d'un objet.
    pub fn metadata(object_id: impl Into<String>) -> Self {
        Self {
            object_id: object_id.into(),
            browse_flag: BrowseFlag::Metadata,
            starting_index: 0,
            requested_count: -1,
            filter: "*".to_string(),
        }
    }

    /// Requête du listing des enfants d'un container.
    pub fn direct_children(
        object_id: impl Into<String>,
        starting_index: u32,
        requested_count: i32,
    ) -> Self {
        Self {
            object_id: object_id.into(),
            browse_flag: BrowseFlag::DirectChildren,
            starting_index,
            requested_count,
            filter: "*".to_string(),
        }
    }
}

/// Résultat d'un Browse réussi, avant mise à plat pour le transport.
#[derive(Debug, Clone, PartialEq)]
pub struct BrowseResponse {
    /// Document DIDL-Lite sérialisé.
    pub result: String,
    /// Taille de la fenêtre retournée.
    pub number_returned: u32,
    /// Total avant pagination.
    pub total_matches: u32,
    /// Révision du système, constante côté PMOShare.
    pub update_id: u32,
}

impl BrowseResponse {
    pub fn into_fields(self) -> ActionResult {
        ActionResult::Fields(vec![
            ("Result", self.result),
            ("NumberReturned", self.number_returned.to_string()),
            ("TotalMatches", self.total_matches.to_string()),
            ("UpdateID", self.update_id.to_string()),
        ])
    }
}

/// Carte de champs plate renvoyée au transport.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionResult {
    /// Champs de sortie de l'action, sérialisés tels quels.
    Fields(Vec<(&'static str, String)>),
    /// Sentinelle d'échec : résultat à un seul élément dont la valeur est
    /// le jeton [`ILLEGAL_TOKEN`], signalant au transport de produire une
    /// faute protocolaire.
    Illegal,
}

impl ActionResult {
    pub fn is_illegal(&self) -> bool {
        matches!(self, Self::Illegal)
    }

    /// Valeur d'un champ de sortie, s'il existe.
    pub fn field(&self, name: &str) -> Option<&str> {
        match self {
            Self::Fields(fields) => fields
                .iter()
                .find(|(field, _)| *field == name)
                .map(|(_, value)| value.as_str()),
            Self::Illegal => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browse_flag_wire_names() {
        assert_eq!(BrowseFlag::from_wire("BrowseMetadata"), Some(BrowseFlag::Metadata));
        assert_eq!(
            BrowseFlag::from_wire("BrowseDirectChildren"),
            Some(BrowseFlag::DirectChildren)
        );
        assert_eq!(BrowseFlag::from_wire("BrowseEverything"), None);
        assert_eq!(BrowseFlag::DirectChildren.as_wire(), "BrowseDirectChildren");
    }

    #[test]
    fn test_response_fields() {
        let response = BrowseResponse {
            result: "<DIDL-Lite/>".to_string(),
            number_returned: 2,
            total_matches: 5,
            update_id: 13,
        };
        let result = response.into_fields();
        assert_eq!(result.field("Result"), Some("<DIDL-Lite/>"));
        assert_eq!(result.field("NumberReturned"), Some("2"));
        assert_eq!(result.field("TotalMatches"), Some("5"));
        assert_eq!(result.field("UpdateID"), Some("13"));
        assert!(!result.is_illegal());
    }

    #[test]
    fn test_illegal_has_no_fields() {
        assert!(ActionResult::Illegal.is_illegal());
        assert_eq!(ActionResult::Illegal.field("Result"), None);
    }
}
