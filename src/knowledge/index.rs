use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{EmbeddingModel, KnowledgeError, KnowledgeRetriever, Passage};

/// One pre-embedded passage of the knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    #[serde(default)]
    pub source: Option<String>,
    pub content: String,
    pub embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct IndexFile {
    entries: Vec<IndexEntry>,
}

/// In-memory vector index searched by cosine similarity.
#[derive(Debug, Default)]
pub struct KnowledgeIndex {
    entries: Vec<IndexEntry>,
}

impl KnowledgeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load an index exported as `{ "entries": [ { id, source, content, embedding } ] }`.
    ///
    /// All embeddings must share one dimension.
    pub fn load(path: &Path) -> Result<Self, KnowledgeError> {
        let raw = std::fs::read_to_string(path)?;
        let file: IndexFile = serde_json::from_str(&raw)?;

        let mut index = Self::new();
        for entry in file.entries {
            index.insert(entry)?;
        }
        tracing::info!(
            path = %path.display(),
            entries = index.len(),
            "Knowledge index loaded"
        );
        Ok(index)
    }

    pub fn insert(&mut self, entry: IndexEntry) -> Result<(), KnowledgeError> {
        if entry.embedding.is_empty() {
            return Err(KnowledgeError::InvalidIndex(format!(
                "entry {} has an empty embedding",
                entry.id
            )));
        }
        if let Some(dim) = self.dimension() {
            if entry.embedding.len() != dim {
                return Err(KnowledgeError::InvalidIndex(format!(
                    "entry {} has dimension {}, expected {}",
                    entry.id,
                    entry.embedding.len(),
                    dim
                )));
            }
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimension(&self) -> Option<usize> {
        self.entries.first().map(|e| e.embedding.len())
    }

    /// Top-k passages by cosine similarity, best first.
    pub fn search(&self, query_embedding: &[f32], top_k: usize) -> Vec<Passage> {
        let mut scored: Vec<(f32, &IndexEntry)> = self
            .entries
            .iter()
            .map(|entry| (cosine_similarity(query_embedding, &entry.embedding), entry))
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        scored
            .into_iter()
            .take(top_k)
            .map(|(score, entry)| Passage {
                id: entry.id.clone(),
                source: entry.source.clone(),
                content: entry.content.clone(),
                score,
            })
            .collect()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Embeds the query and searches a `KnowledgeIndex`.
pub struct VectorRetriever<E: EmbeddingModel> {
    embedder: E,
    index: KnowledgeIndex,
}

impl<E: EmbeddingModel> VectorRetriever<E> {
    pub fn new(embedder: E, index: KnowledgeIndex) -> Self {
        Self { embedder, index }
    }
}

impl<E: EmbeddingModel> KnowledgeRetriever for VectorRetriever<E> {
    fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<Passage>, KnowledgeError> {
        if self.index.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }
        let embedding = self.embedder.embed(query)?;
        Ok(self.index.search(&embedding, top_k))
    }
}

/// Retriever used when no knowledge index is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyKnowledge;

impl KnowledgeRetriever for EmptyKnowledge {
    fn retrieve(&self, _query: &str, _top_k: usize) -> Result<Vec<Passage>, KnowledgeError> {
        Ok(Vec::new())
    }
}
