//! Travel guide passages stored in the knowledge base

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Searchable fields of a [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentField {
    City,
    Section,
    Subsection,
    Text,
}

impl DocumentField {
    /// All fields in their canonical order
    pub const ALL: [DocumentField; 4] = [Self::City, Self::Section, Self::Subsection, Self::Text];

    /// Field name as stored by the search backends
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::City => "city",
            Self::Section => "section",
            Self::Subsection => "subsection",
            Self::Text => "text",
        }
    }
}

impl fmt::Display for DocumentField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "city" => Ok(Self::City),
            "section" => Ok(Self::Section),
            "subsection" => Ok(Self::Subsection),
            "text" => Ok(Self::Text),
            other => Err(format!("Unknown document field: {}", other)),
        }
    }
}

/// A single passage of a city travel guide
///
/// Documents are owned by the index and are read-only to the retrieval core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub city: String,
    pub section: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subsection: Option<String>,
    pub text: String,
}

impl Document {
    pub fn new(
        id: impl Into<String>,
        city: impl Into<String>,
        section: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            city: city.into(),
            section: section.into(),
            subsection: None,
            text: text.into(),
        }
    }

    pub fn with_subsection(mut self, subsection: impl Into<String>) -> Self {
        self.subsection = Some(subsection.into());
        self
    }

    /// Subsection, treating an empty string the same as a missing one
    pub fn subsection(&self) -> Option<&str> {
        self.subsection.as_deref().filter(|s| !s.is_empty())
    }

    /// Value of a searchable field
    pub fn field(&self, field: DocumentField) -> Option<&str> {
        match field {
            DocumentField::City => Some(self.city.as_str()),
            DocumentField::Section => Some(self.section.as_str()),
            DocumentField::Subsection => self.subsection(),
            DocumentField::Text => Some(self.text.as_str()),
        }
    }

    /// Heading path of the passage, e.g. `Eat / Budget`
    pub fn heading(&self) -> String {
        match self.subsection() {
            Some(subsection) if !self.section.is_empty() => {
                format!("{} / {}", self.section, subsection)
            }
            Some(subsection) => subsection.to_string(),
            None => self.section.clone(),
        }
    }
}

/// A document together with its precomputed vectors, keyed by vector field name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedDocument {
    #[serde(flatten)]
    pub document: Document,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub vectors: HashMap<String, Vec<f32>>,
}

impl IndexedDocument {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            vectors: HashMap::new(),
        }
    }

    pub fn with_vector(mut self, field: impl Into<String>, vector: Vec<f32>) -> Self {
        self.vectors.insert(field.into(), vector);
        self
    }

    pub fn vector(&self, field: &str) -> Option<&[f32]> {
        self.vectors.get(field).map(Vec::as_slice)
    }
}

impl From<Document> for IndexedDocument {
    fn from(document: Document) -> Self {
        Self::new(document)
    }
}
