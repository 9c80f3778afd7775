//! In-memory vector index with exact cosine search

use parking_lot::RwLock;
use std::collections::HashSet;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{EmbeddingVector, ScoredChunk, TextChunk};

/// A chunk paired with its (unit-length) embedding
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub chunk: TextChunk,
    pub vector: EmbeddingVector,
}

#[derive(Default)]
struct IndexInner {
    entries: Vec<IndexEntry>,
    documents: HashSet<Uuid>,
}

/// Append-only vector index shared by ingestion and queries.
///
/// Vectors are normalized on insert so scoring is a dot product. All entries
/// must come from the embedding model named at construction.
pub struct VectorIndex {
    model_id: String,
    dimensions: usize,
    inner: RwLock<IndexInner>,
}

impl VectorIndex {
    /// Create an empty index for vectors of `dimensions` produced by `model_id`
    pub fn new(model_id: impl Into<String>, dimensions: usize) -> Self {
        Self {
            model_id: model_id.into(),
            dimensions,
            inner: RwLock::new(IndexInner::default()),
        }
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn check(&self, vector: &EmbeddingVector) -> Result<()> {
        if vector.dim() != self.dimensions {
            return Err(Error::DimensionMismatch {
                expected: self.dimensions,
                actual: vector.dim(),
            });
        }
        if let Some(i) = vector.first_non_finite() {
            return Err(Error::embedding(format!(
                "vector has a non-finite value at position {}",
                i
            )));
        }
        Ok(())
    }

    /// Insert one chunk
    pub fn insert(&self, chunk: TextChunk, vector: EmbeddingVector) -> Result<IndexEntry> {
        self.check(&vector)?;
        let entry = IndexEntry {
            chunk,
            vector: vector.normalized(),
        };

        let mut inner = self.inner.write();
        inner.documents.insert(entry.chunk.document_id);
        inner.entries.push(entry.clone());
        Ok(entry)
    }

    /// Insert a document's chunks atomically.
    ///
    /// Every vector is validated before the write lock is taken; on error
    /// nothing is inserted. Readers never observe a partial batch.
    pub fn insert_batch(&self, batch: Vec<(TextChunk, EmbeddingVector)>) -> Result<usize> {
        for (_, vector) in &batch {
            self.check(vector)?;
        }

        let entries: Vec<IndexEntry> = batch
            .into_iter()
            .map(|(chunk, vector)| IndexEntry {
                chunk,
                vector: vector.normalized(),
            })
            .collect();
        let count = entries.len();

        let mut inner = self.inner.write();
        for entry in &entries {
            inner.documents.insert(entry.chunk.document_id);
        }
        inner.entries.extend(entries);

        tracing::debug!("Indexed {} chunks (total {})", count, inner.entries.len());
        Ok(count)
    }

    /// Top `top_k` entries by cosine similarity, best first.
    ///
    /// Equal scores keep insertion order.
    pub fn search(&self, query: &EmbeddingVector, top_k: usize) -> Result<Vec<ScoredChunk>> {
        self.check(query)?;
        let query = query.normalized();

        let inner = self.inner.read();
        if inner.entries.is_empty() {
            return Err(Error::EmptyIndex);
        }

        let mut scored: Vec<(usize, f32)> = inner
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, entry.vector.dot(query.as_slice()) + 0.0))
            .collect();

        // `+ 0.0` above folds -0.0 into 0.0 so total_cmp keeps such ties stable

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| ScoredChunk {
                chunk: inner.entries[i].chunk.clone(),
                score,
            })
            .collect())
    }

    /// Number of indexed chunks
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }

    /// Number of distinct documents indexed
    pub fn document_count(&self) -> usize {
        self.inner.read().documents.len()
    }
}

impl std::fmt::Debug for VectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorIndex")
            .field("model_id", &self.model_id)
            .field("dimensions", &self.dimensions)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn chunk(doc: Uuid, index: u32, content: &str) -> TextChunk {
        TextChunk::new(doc, "doc.pdf", index, 0, content.chars().count(), content.to_string())
    }

    fn vector(values: &[f32]) -> EmbeddingVector {
        EmbeddingVector::new(values.to_vec())
    }

    #[test]
    fn test_empty_index() {
        let index = VectorIndex::new("test", 3);
        assert!(index.is_empty());
        assert!(matches!(
            index.search(&vector(&[1.0, 0.0, 0.0]), 3),
            Err(Error::EmptyIndex)
        ));
    }

    #[test]
    fn test_identical_vector_ranks_first() {
        let index = VectorIndex::new("test", 3);
        let doc = Uuid::new_v4();
        index.insert(chunk(doc, 0, "x"), vector(&[1.0, 0.0, 0.0])).unwrap();
        index.insert(chunk(doc, 1, "y"), vector(&[0.0, 2.0, 0.0])).unwrap();
        index.insert(chunk(doc, 2, "xy"), vector(&[1.0, 1.0, 0.0])).unwrap();

        let results = index.search(&vector(&[0.0, 5.0, 0.0]), 3).unwrap();
        assert_eq!(results[0].chunk.content, "y");
        assert!((results[0].score - 1.0).abs() < 1e-6);
        assert_eq!(results[1].chunk.content, "xy");
        assert_eq!(results[2].chunk.content, "x");
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let index = VectorIndex::new("test", 2);
        let doc = Uuid::new_v4();
        for i in 0..4 {
            index.insert(chunk(doc, i, &format!("c{}", i)), vector(&[1.0, 0.0])).unwrap();
        }

        let results = index.search(&vector(&[1.0, 0.0]), 4).unwrap();
        let order: Vec<u32> = results.iter().map(|r| r.chunk.index).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_dimension_mismatch() {
        let index = VectorIndex::new("test", 3);
        let doc = Uuid::new_v4();
        let err = index.insert(chunk(doc, 0, "x"), vector(&[1.0, 0.0])).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { expected: 3, actual: 2 }));

        index.insert(chunk(doc, 0, "x"), vector(&[1.0, 0.0, 0.0])).unwrap();
        assert!(matches!(
            index.search(&vector(&[1.0]), 1),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_batch_is_all_or_nothing() {
        let index = VectorIndex::new("test", 2);
        let doc = Uuid::new_v4();
        let batch = vec![
            (chunk(doc, 0, "a"), vector(&[1.0, 0.0])),
            (chunk(doc, 1, "b"), vector(&[1.0, 0.0, 0.0])),
        ];

        assert!(index.insert_batch(batch).is_err());
        assert_eq!(index.len(), 0);
        assert_eq!(index.document_count(), 0);
    }

    #[test]
    fn test_zero_vectors_score_zero() {
        let index = VectorIndex::new("test", 2);
        let doc = Uuid::new_v4();
        index.insert(chunk(doc, 0, "zero"), vector(&[0.0, 0.0])).unwrap();
        index.insert(chunk(doc, 1, "one"), vector(&[0.0, 1.0])).unwrap();

        let results = index.search(&vector(&[0.0, 1.0]), 2).unwrap();
        assert_eq!(results[0].chunk.content, "one");
        assert_eq!(results[1].score, 0.0);

        let results = index.search(&vector(&[0.0, 0.0]), 2).unwrap();
        assert!(results.iter().all(|r| r.score == 0.0));
    }

    #[test]
    fn test_document_count() {
        let index = VectorIndex::new("test", 1);
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        index
            .insert_batch(vec![
                (chunk(a, 0, "a0"), vector(&[1.0])),
                (chunk(a, 1, "a1"), vector(&[1.0])),
                (chunk(b, 0, "b0"), vector(&[1.0])),
            ])
            .unwrap();

        assert_eq!(index.len(), 3);
        assert_eq!(index.document_count(), 2);
    }

    #[test]
    fn test_non_finite_vectors_rejected() {
        let index = VectorIndex::new("test", 2);
        let doc = Uuid::new_v4();

        let batch: Vec<_> = (0..64u32)
            .map(|i| {
                let v = if i % 3 == 0 {
                    vector(&[f32::INFINITY, f32::INFINITY])
                } else {
                    vector(&[1.0, i as f32])
                };
                (chunk(doc, i, "c"), v)
            })
            .collect();
        assert!(matches!(
            index.insert_batch(batch),
            Err(Error::EmbeddingService(_))
        ));
        assert!(index.is_empty());

        for i in 0..64u32 {
            index.insert(chunk(doc, i, "c"), vector(&[1.0, i as f32])).unwrap();
        }
        assert!(index.search(&vector(&[f32::NAN, 1.0]), 10).is_err());
        assert_eq!(index.search(&vector(&[0.0, 1.0]), 10).unwrap().len(), 10);
    }

    proptest! {
        #[test]
        fn prop_results_sorted_and_bounded(
            vectors in prop::collection::vec(prop::collection::vec(-1.0f32..1.0, 4), 1..30),
            query in prop::collection::vec(-1.0f32..1.0, 4),
            top_k in 1usize..40,
        ) {
            let index = VectorIndex::new("prop", 4);
            let doc = Uuid::new_v4();
            for (i, v) in vectors.iter().enumerate() {
                index.insert(chunk(doc, i as u32, "c"), EmbeddingVector::new(v.clone())).unwrap();
            }

            let results = index.search(&EmbeddingVector::new(query), top_k).unwrap();
            prop_assert_eq!(results.len(), top_k.min(vectors.len()));
            for pair in results.windows(2) {
                prop_assert!(pair[0].score >= pair[1].score);
            }
            for r in &results {
                prop_assert!(r.score <= 1.0 + 1e-5 && r.score >= -1.0 - 1e-5);
            }
        }
    }
}
