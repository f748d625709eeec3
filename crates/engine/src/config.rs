//! Store configuration via `haystack.toml`
//!
//! A store is configured once at construction. The metric, optional pinned
//! dimension, snapshot compression and limits are store-wide and never
//! chosen per call. Configuration can be built in code or read from a TOML
//! file.

use haystack_core::{DistanceMetric, HaystackError, HaystackResult, Limits};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Config file name used by `write_default_if_missing` callers.
pub const CONFIG_FILE_NAME: &str = "haystack.toml";

/// Compression applied to the snapshot body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotCompression {
    /// Body is stored raw
    #[default]
    None,
    /// Body is zstd compressed
    Zstd,
}

/// Store configuration loaded from `haystack.toml`.
///
/// # Example
///
/// ```toml
/// metric = "cosine"
/// # dimension = 1024
/// compression = "zstd"
/// compression_level = 3
/// parallel_threshold = 16384
/// unindexed_keys = ["text"]
///
/// [limits]
/// max_tags_per_vector = 4096
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Similarity metric for the whole store.
    #[serde(default)]
    pub metric: DistanceMetric,
    /// Pinned dimension. When unset, the first insert fixes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<usize>,
    /// Snapshot body compression.
    #[serde(default)]
    pub compression: SnapshotCompression,
    /// zstd level used when `compression = "zstd"`.
    #[serde(default = "default_compression_level")]
    pub compression_level: i32,
    /// Candidate count at which scoring and batch norms go parallel.
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,
    /// Tag keys that get no posting list. Still filterable by scan.
    #[serde(default = "default_unindexed_keys")]
    pub unindexed_keys: Vec<String>,
    /// Size limits.
    #[serde(default)]
    pub limits: Limits,
}

fn default_compression_level() -> i32 {
    3
}

fn default_parallel_threshold() -> usize {
    16_384
}

fn default_unindexed_keys() -> Vec<String> {
    vec!["text".to_string()]
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            metric: DistanceMetric::default(),
            dimension: None,
            compression: SnapshotCompression::default(),
            compression_level: default_compression_level(),
            parallel_threshold: default_parallel_threshold(),
            unindexed_keys: default_unindexed_keys(),
            limits: Limits::default(),
        }
    }
}

impl StoreConfig {
    /// Builder-style metric override
    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Builder-style dimension pin
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = Some(dimension);
        self
    }

    /// Builder-style compression override
    pub fn with_compression(mut self, compression: SnapshotCompression) -> Self {
        self.compression = compression;
        self
    }

    /// Builder-style parallel threshold override
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Builder-style limits override
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Check that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the pinned dimension violates the limits, the
    /// compression level is outside the zstd range, or the parallel
    /// threshold is zero.
    pub fn validate(&self) -> HaystackResult<()> {
        if let Some(dimension) = self.dimension {
            self.limits
                .validate_dimension(dimension)
                .map_err(|e| HaystackError::config(format!("dimension: {}", e)))?;
        }
        if self.compression == SnapshotCompression::Zstd
            && !zstd::compression_level_range().contains(&self.compression_level)
        {
            return Err(HaystackError::config(format!(
                "compression_level {} is outside the zstd range",
                self.compression_level
            )));
        }
        if self.parallel_threshold == 0 {
            return Err(HaystackError::config("parallel_threshold must be > 0"));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Haystack store configuration
#
# Similarity metric: "cosine" (default), "euclidean" (negative squared L2)
# or "dot_product"
metric = "cosine"

# Pin the vector dimension. When unset, the first insert fixes it.
# dimension = 1024

# Snapshot body compression: "none" (default) or "zstd"
compression = "none"
compression_level = 3

# Candidate count at which search scoring fans out over worker threads
parallel_threshold = 16384

# Tag keys kept out of the posting lists (large unique values such as text)
unindexed_keys = ["text"]

# [limits]
# max_dimension = 65536
# max_tag_key_bytes = 1024
# max_tag_value_bytes = 16777216
# max_tags_per_vector = 4096
# max_predicate_depth = 64
# max_k = 1000000
# max_snapshot_bytes = 17179869184
"#
    }

    /// Parse and validate config from TOML text.
    pub fn from_toml_str(content: &str) -> HaystackResult<Self> {
        let config: StoreConfig = toml::from_str(content)
            .map_err(|e| HaystackError::config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> HaystackResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            HaystackError::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config = Self::from_toml_str(&content).map_err(|e| {
            HaystackError::config(format!("'{}': {}", path.display(), e))
        })?;
        tracing::debug!(target: "haystack::config", path = %path.display(), metric = %config.metric, "Loaded store config");
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> HaystackResult<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml())?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> HaystackResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| HaystackError::config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
