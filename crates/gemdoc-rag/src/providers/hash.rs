//! In-process feature-hashing embedder

use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use once_cell::sync::Lazy;
use unicode_segmentation::UnicodeSegmentation;

use crate::error::Result;
use crate::providers::embedding::{ensure_not_blank, EmbeddingProvider};
use crate::types::EmbeddingVector;

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "an", "and", "are", "as", "at", "be", "but", "by", "do", "does", "for", "from",
        "had", "has", "have", "how", "in", "is", "it", "its", "of", "on", "or", "that", "the",
        "their", "them", "they", "this", "to", "was", "were", "what", "when", "where", "which",
        "who", "why", "with",
    ]
    .into_iter()
    .collect()
});

/// Weight of a whole-word feature relative to one of its trigrams
const WORD_WEIGHT: f32 = 2.0;

/// Deterministic embedder hashing word unigrams and character trigrams into a
/// fixed number of buckets.
///
/// Lexical rather than semantic: texts sharing words score high. Needs no
/// network and no model files.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimensions: usize,
}

impl HashEmbedder {
    /// Create an embedder with `dimensions` buckets (at least 1)
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    /// Lowercased content words, stop words removed
    fn tokens(text: &str) -> Vec<String> {
        text.unicode_words()
            .map(|w| w.to_lowercase())
            .filter(|w| !STOP_WORDS.contains(w.as_str()))
            .collect()
    }

    fn bucket(&self, feature: &str, seed: u64) -> usize {
        let hash = feature
            .bytes()
            .fold(seed, |acc, b| (acc ^ b as u64).wrapping_mul(0x100_0000_01b3));
        (hash % self.dimensions as u64) as usize
    }

    fn generate(&self, text: &str) -> Vec<f32> {
        let mut frequencies: BTreeMap<String, u32> = BTreeMap::new();
        for token in Self::tokens(text) {
            *frequencies.entry(token).or_insert(0) += 1;
        }

        let mut embedding = vec![0.0f32; self.dimensions];
        for (word, freq) in &frequencies {
            let weight = (*freq as f32).sqrt();
            embedding[self.bucket(word, 0xcbf2_9ce4_8422_2325)] += WORD_WEIGHT * weight;

            // Padded so short words still produce a trigram
            let padded: Vec<char> = format!(" {} ", word).chars().collect();
            for window in padded.windows(3) {
                let trigram: String = window.iter().collect();
                embedding[self.bucket(&trigram, 0x8422_2325_cbf2_9ce4)] += weight;
            }
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }
        embedding
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(384)
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<EmbeddingVector> {
        ensure_not_blank(text)?;
        Ok(EmbeddingVector::new(self.generate(text)))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> String {
        format!("hash-v1-{}", self.dimensions)
    }

    fn name(&self) -> &str {
        "hash"
    }
}
