//! Loading of travel guide passages for the in-memory store

use std::path::Path;

use tracing::{debug, info};

use crate::domain::DomainError;
use crate::domain::embedding::EmbeddingProvider;
use crate::domain::knowledge_base::IndexedDocument;

/// Passages embedded per request when filling missing vectors
const EMBED_BATCH_SIZE: usize = 32;

/// Read a JSON array of passages, each optionally carrying a `vectors` map
pub async fn load_documents(path: impl AsRef<Path>) -> Result<Vec<IndexedDocument>, DomainError> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        DomainError::knowledge_base(format!("Failed to read {}: {}", path.display(), e))
    })?;

    let documents = parse_documents(&content)
        .map_err(|e| DomainError::knowledge_base(format!("{}: {}", path.display(), e)))?;

    info!(path = %path.display(), count = documents.len(), "Loaded documents");
    Ok(documents)
}

fn parse_documents(content: &str) -> Result<Vec<IndexedDocument>, String> {
    let documents: Vec<IndexedDocument> =
        serde_json::from_str(content).map_err(|e| format!("Invalid document file: {}", e))?;

    if let Some(document) = documents.iter().find(|d| d.document.id.is_empty()) {
        return Err(format!(
            "Document in {} / {} has an empty id",
            document.document.city, document.document.section
        ));
    }

    Ok(documents)
}

/// Embed the text of every document lacking a vector for `field`
///
/// Returns the number of documents that were embedded.
pub async fn embed_missing(
    documents: &mut [IndexedDocument],
    embedder: &dyn EmbeddingProvider,
    field: &str,
) -> Result<usize, DomainError> {
    let missing: Vec<usize> = documents
        .iter()
        .enumerate()
        .filter(|(_, d)| d.vector(field).is_none())
        .map(|(position, _)| position)
        .collect();

    for chunk in missing.chunks(EMBED_BATCH_SIZE) {
        let texts: Vec<String> = chunk
            .iter()
            .map(|&position| documents[position].document.text.clone())
            .collect();

        let vectors = embedder.embed_batch(&texts).await?;
        if vectors.len() != chunk.len() {
            return Err(DomainError::provider(
                embedder.provider_name(),
                format!("Expected {} embeddings, got {}", chunk.len(), vectors.len()),
            ));
        }

        for (&position, vector) in chunk.iter().zip(vectors) {
            documents[position].vectors.insert(field.to_string(), vector);
        }
        debug!(field, embedded = chunk.len(), "Embedded document batch");
    }

    Ok(missing.len())
}
