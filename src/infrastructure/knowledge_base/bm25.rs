//! Okapi BM25 scoring for a single text field

use std::collections::HashMap;

use unicode_segmentation::UnicodeSegmentation;

const K1: f64 = 1.2;
const B: f64 = 0.75;

/// Lower-cased unicode words
pub fn tokenize(text: &str) -> Vec<String> {
    text.unicode_words().map(str::to_lowercase).collect()
}

/// Inverted index over one field of a document collection
///
/// Documents are identified by their insertion position.
#[derive(Debug, Default, Clone)]
pub struct Bm25Field {
    postings: HashMap<String, HashMap<usize, u32>>,
    lengths: Vec<u32>,
    total_length: u64,
}

impl Bm25Field {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the next document; `None` indexes an empty value
    pub fn push(&mut self, text: Option<&str>) -> usize {
        let doc = self.lengths.len();
        let tokens = text.map(tokenize).unwrap_or_default();

        for token in &tokens {
            *self
                .postings
                .entry(token.clone())
                .or_default()
                .entry(doc)
                .or_insert(0) += 1;
        }

        self.lengths.push(tokens.len() as u32);
        self.total_length += tokens.len() as u64;
        doc
    }

    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }

    fn average_length(&self) -> f64 {
        if self.lengths.is_empty() {
            0.0
        } else {
            self.total_length as f64 / self.lengths.len() as f64
        }
    }

    fn idf(&self, document_frequency: usize) -> f64 {
        let n = self.lengths.len() as f64;
        let df = document_frequency as f64;
        (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
    }

    /// BM25 score of every document matching at least one query term
    pub fn scores(&self, terms: &[String]) -> HashMap<usize, f64> {
        let mut scores: HashMap<usize, f64> = HashMap::new();
        let average = self.average_length();
        if average == 0.0 {
            return scores;
        }

        for term in terms {
            let Some(postings) = self.postings.get(term) else {
                continue;
            };
            let idf = self.idf(postings.len());

            for (&doc, &tf) in postings {
                let tf = tf as f64;
                let length = self.lengths[doc] as f64;
                let norm = K1 * (1.0 - B + B * length / average);
                *scores.entry(doc).or_insert(0.0) += idf * tf * (K1 + 1.0) / (tf + norm);
            }
        }

        scores
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("Koshary, Egypt's national dish!"),
            vec!["koshary", "egypt's", "national", "dish"]
        );
        assert!(tokenize("  ...  ").is_empty());
    }

    #[test]
    fn test_scores_only_matching_documents() {
        let mut field = Bm25Field::new();
        field.push(Some("street food in cairo"));
        field.push(Some("museums in rome"));
        field.push(None);

        let scores = field.scores(&tokenize("Cairo food"));

        assert_eq!(scores.len(), 1);
        assert!(scores[&0] > 0.0);
        assert_eq!(field.len(), 3);
    }

    #[test]
    fn test_rarer_terms_score_higher() {
        let mut field = Bm25Field::new();
        field.push(Some("tea tea house"));
        field.push(Some("tea market"));
        field.push(Some("tea garden"));

        let common = field.scores(&tokenize("tea"));
        let rare = field.scores(&tokenize("market"));

        assert!(rare[&1] > common[&1]);
    }

    #[test]
    fn test_term_frequency_increases_score() {
        let mut field = Bm25Field::new();
        field.push(Some("pasta pasta pasta roma"));
        field.push(Some("pasta pizza gelato roma"));
        field.push(Some("colosseum forum"));

        let scores = field.scores(&tokenize("pasta"));
        assert!(scores[&0] > scores[&1]);
    }

    #[test]
    fn test_empty_index() {
        assert!(Bm25Field::new().scores(&tokenize("anything")).is_empty());
    }
}
