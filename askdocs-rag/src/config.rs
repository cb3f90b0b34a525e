//! Configuration for the document Q&A pipeline.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Configuration parameters for the [`QaPipeline`](crate::pipeline::QaPipeline).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineConfig {
    /// Name of the vector store collection holding chunk embeddings.
    pub collection: String,
    /// Maximum chunk size in bytes.
    pub chunk_size: usize,
    /// Number of overlapping bytes between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of results requested when the caller does not specify `k`.
    pub default_k: usize,
    /// Upper bound on caller-supplied `k`.
    pub max_k: usize,
    /// Jaccard similarity at or above which two result texts are treated as
    /// near-duplicates and compressed to one.
    pub dedup_threshold: f64,
    /// Bound on each external call (embedding, search, generation).
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            collection: "documents".to_string(),
            chunk_size: 1000,
            chunk_overlap: 200,
            default_k: 5,
            max_k: 20,
            dedup_threshold: 0.9,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl PipelineConfig {
    /// Create a new builder for constructing a [`PipelineConfig`].
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`PipelineConfig`].
#[derive(Debug, Clone, Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// Set the vector store collection name.
    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.config.collection = name.into();
        self
    }

    /// Set the maximum chunk size in bytes.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in bytes.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the default number of search results per query.
    pub fn default_k(mut self, k: usize) -> Self {
        self.config.default_k = k;
        self
    }

    /// Set the maximum caller-supplied `k`.
    pub fn max_k(mut self, k: usize) -> Self {
        self.config.max_k = k;
        self
    }

    /// Set the near-duplicate similarity threshold.
    pub fn dedup_threshold(mut self, threshold: f64) -> Self {
        self.config.dedup_threshold = threshold;
        self
    }

    /// Set the per-call timeout for external providers.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Build the [`PipelineConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if:
    /// - `chunk_size == 0` or `chunk_overlap >= chunk_size`
    /// - `default_k == 0`, `max_k == 0`, or `default_k > max_k`
    /// - `dedup_threshold` is outside `(0.0, 1.0]`
    /// - `collection` is empty
    pub fn build(self) -> Result<PipelineConfig> {
        let c = &self.config;
        if c.chunk_size == 0 {
            return Err(RagError::Config("chunk_size must be greater than zero".to_string()));
        }
        if c.chunk_overlap >= c.chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                c.chunk_overlap, c.chunk_size
            )));
        }
        if c.default_k == 0 || c.max_k == 0 {
            return Err(RagError::Config("k bounds must be greater than zero".to_string()));
        }
        if c.default_k > c.max_k {
            return Err(RagError::Config(format!(
                "default_k ({}) must not exceed max_k ({})",
                c.default_k, c.max_k
            )));
        }
        if !(c.dedup_threshold > 0.0 && c.dedup_threshold <= 1.0) {
            return Err(RagError::Config(format!(
                "dedup_threshold ({}) must be within (0.0, 1.0]",
                c.dedup_threshold
            )));
        }
        if c.collection.is_empty() {
            return Err(RagError::Config("collection must not be empty".to_string()));
        }
        Ok(self.config)
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}
