//! Paper metadata record and the remote catalog contract.

use papersage_core::Result;
use serde::{Deserialize, Serialize};

/// Bibliographic record of one paper, keyed by canonical arXiv id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperMetadata {
    pub arxiv_id: String,
    pub title: String,
    pub authors: Vec<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// RFC 3339 timestamp.
    pub published: String,
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal_ref: Option<String>,
}

/// Remote source of paper metadata.
pub trait MetadataCatalog: Send + Sync {
    /// Look up a batch of canonical ids in one request.
    ///
    /// Records come back in whatever order the catalog chooses and may cover
    /// only part of the batch; callers key them by `arxiv_id`.
    fn fetch_batch(&self, ids: &[String]) -> Result<Vec<PaperMetadata>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abstract_field_name_on_wire() {
        let record = PaperMetadata {
            arxiv_id: "1810.04805".into(),
            title: "BERT".into(),
            authors: vec!["Jacob Devlin".into()],
            abstract_text: "We introduce BERT.".into(),
            published: "2018-10-11T00:00:00+00:00".into(),
            categories: vec!["cs.CL".into()],
            doi: None,
            journal_ref: None,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["abstract"], "We introduce BERT.");
        assert!(json.get("doi").is_none());

        let back: PaperMetadata = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
