//! Decoding of stored document payloads returned by remote stores

use serde::Deserialize;

use crate::domain::DomainError;
use crate::domain::knowledge_base::{Document, StoreHit};

/// Document fields as stored in a search index; the id may be absent or numeric
#[derive(Debug, Deserialize)]
pub(crate) struct DocumentPayload {
    #[serde(default)]
    id: Option<serde_json::Value>,
    city: String,
    #[serde(default)]
    section: Option<String>,
    #[serde(default)]
    subsection: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

impl DocumentPayload {
    /// Build a document, using `fallback_id` when the payload carries no id
    pub(crate) fn into_document(self, fallback_id: &serde_json::Value) -> Document {
        let id = self
            .id
            .as_ref()
            .map(id_string)
            .unwrap_or_else(|| id_string(fallback_id));

        let mut document = Document::new(
            id,
            self.city,
            self.section.unwrap_or_default(),
            self.text.unwrap_or_default(),
        );
        if let Some(subsection) = self.subsection {
            document = document.with_subsection(subsection);
        }
        document
    }
}

fn id_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Decode one scored payload into a hit
pub(crate) fn decode_hit(
    store: &str,
    payload: serde_json::Value,
    fallback_id: &serde_json::Value,
    score: f64,
) -> Result<StoreHit, DomainError> {
    let payload: DocumentPayload = serde_json::from_value(payload).map_err(|e| {
        DomainError::provider(store, format!("Failed to parse document payload: {}", e))
    })?;

    Ok(StoreHit::new(payload.into_document(fallback_id), score))
}
