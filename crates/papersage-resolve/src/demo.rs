//! Seed papers for an empty collection.

use crate::types::PaperRecord;

const DEMO_PAPERS: [(&str, &str, &str); 3] = [
    (
        "2010.15980",
        "SPECTER: Document-level Representation Learning using Citation-informed Transformers",
        "We present SPECTER, a pre-trained language model to generate document-level embedding of scientific papers.",
    ),
    (
        "1706.03762",
        "Attention Is All You Need",
        "We propose a new simple network architecture, the Transformer, based solely on attention mechanisms.",
    ),
    (
        "1810.04805",
        "BERT: Pre-training of Deep Bidirectional Transformers for Language Understanding",
        "We introduce BERT, a new language representation model which stands for Bidirectional Encoder Representations from Transformers.",
    ),
];

/// The three demo papers, point ids 0, 1, 2.
pub fn demo_papers() -> Vec<PaperRecord> {
    DEMO_PAPERS
        .iter()
        .enumerate()
        .map(|(i, (arxiv_id, title, text))| PaperRecord {
            id: i as u64,
            arxiv_id: arxiv_id.to_string(),
            title: title.to_string(),
            text: text.to_string(),
        })
        .collect()
}
