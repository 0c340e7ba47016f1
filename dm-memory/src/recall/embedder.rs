//! Sentence embedding backends.
//!
//! The local backend runs an ONNX sentence-transformer through `fastembed`
//! and is only compiled with the `semantic` feature. Without it,
//! [`LocalEmbedder::new`] reports the backend as unavailable so the manager
//! falls back to lightweight recall.

use crate::error::{MemoryError, MemoryResult};

/// Default sentence-embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "all-MiniLM-L6-v2";

/// Produces fixed-size embedding vectors for text.
pub trait Embedder {
    /// Model identifier, for logging.
    fn model_name(&self) -> &str;

    /// Embed a single text.
    fn embed(&self, text: &str) -> MemoryResult<Vec<f32>>;
}

/// Scale a vector to unit length in place. Zero vectors are left untouched.
pub fn normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

/// Inner product of two vectors (cosine similarity when both are unit length).
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Local ONNX embedder.
#[cfg(feature = "semantic")]
pub struct LocalEmbedder {
    model: std::sync::Mutex<fastembed::TextEmbedding>,
    model_name: String,
}

#[cfg(feature = "semantic")]
impl std::fmt::Debug for LocalEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalEmbedder")
            .field("model_name", &self.model_name)
            .finish()
    }
}

#[cfg(feature = "semantic")]
impl LocalEmbedder {
    /// Load the named model, downloading it on first use.
    pub fn new(model: &str) -> MemoryResult<Self> {
        use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

        let model_enum = match model {
            "all-MiniLM-L6-v2" | "sentence-transformers/all-MiniLM-L6-v2" => {
                EmbeddingModel::AllMiniLML6V2
            }
            "bge-small-en-v1.5" | "BAAI/bge-small-en-v1.5" => EmbeddingModel::BGESmallENV15,
            "bge-base-en-v1.5" | "BAAI/bge-base-en-v1.5" => EmbeddingModel::BGEBaseENV15,
            other => {
                return Err(MemoryError::EmbeddingUnavailable(format!(
                    "unsupported embedding model: {other}"
                )))
            }
        };

        let options = InitOptions::new(model_enum).with_show_download_progress(false);
        let embedding = TextEmbedding::try_new(options).map_err(|e| {
            MemoryError::EmbeddingUnavailable(format!("failed to initialize {model}: {e}"))
        })?;

        tracing::info!(model = %model, "Initialized local embedder");

        Ok(Self {
            model: std::sync::Mutex::new(embedding),
            model_name: model.to_string(),
        })
    }
}

#[cfg(feature = "semantic")]
impl Embedder for LocalEmbedder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn embed(&self, text: &str) -> MemoryResult<Vec<f32>> {
        let mut model = self
            .model
            .lock()
            .map_err(|e| MemoryError::Embedding(format!("model lock poisoned: {e}")))?;

        let mut vector = model
            .embed(vec![text], None)
            .map_err(|e| MemoryError::Embedding(e.to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| MemoryError::Embedding("no embedding returned".to_string()))?;

        normalize(&mut vector);
        Ok(vector)
    }
}

/// Placeholder when the `semantic` feature is disabled.
#[cfg(not(feature = "semantic"))]
#[derive(Debug)]
pub struct LocalEmbedder {
    model_name: String,
}

#[cfg(not(feature = "semantic"))]
impl LocalEmbedder {
    /// Always fails: the crate was built without an embedding backend.
    pub fn new(model: &str) -> MemoryResult<Self> {
        Err(MemoryError::EmbeddingUnavailable(format!(
            "{model} requires the `semantic` feature"
        )))
    }
}

#[cfg(not(feature = "semantic"))]
impl Embedder for LocalEmbedder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn embed(&self, _text: &str) -> MemoryResult<Vec<f32>> {
        Err(MemoryError::EmbeddingUnavailable(
            "built without the `semantic` feature".to_string(),
        ))
    }
}
