use thiserror::Error;

/// Problems raised while turning source documents into content-store rows.
///
/// Only `MissingParentEntity` and `MalformedCompoundNumber` abort work; the rest are
/// collected as warnings and the record they describe is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    #[error("element marker <<{opened}>> is not closed by a matching marker (next closer: {})", .closed.as_deref().unwrap_or("none"))]
    ParseMismatch {
        opened: String,
        closed: Option<String>,
    },

    #[error("element marker <<{marker}>> is opened again before it is closed; keeping the innermost span")]
    OverlappingSpan { marker: String },

    #[error("closing marker <</{marker}>> has no opening marker")]
    StrayClosingMarker { marker: String },

    #[error("{entity} {key} does not exist")]
    MissingParentEntity { entity: &'static str, key: String },

    #[error("reference <<LINK {marker}>> in element {source_element_id} does not resolve: {reason}")]
    MissingReference {
        source_element_id: i64,
        marker: String,
        reason: String,
    },

    #[error("number '{raw}' is not a compound major.minor number")]
    MalformedCompoundNumber { raw: String },

    #[error("solution entry {number} follows entry {previous}; list numbering repeats or runs backwards")]
    EntryOutOfOrder { previous: u32, number: u32 },

    #[error("unknown element type '{name}'")]
    UnknownElementType { name: String },
}

impl IngestError {
    pub fn missing_section(section: u32) -> Self {
        Self::MissingParentEntity {
            entity: "section",
            key: section.to_string(),
        }
    }

    pub fn missing_subsection(section: u32, subsection: u32) -> Self {
        Self::MissingParentEntity {
            entity: "subsection",
            key: format!("{section}.{subsection}"),
        }
    }
}
