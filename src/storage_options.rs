use serde::{Deserialize, Serialize};
use zarrs::array::codec::GzipCodec;

use crate::solver::{ChunkShapeSolver, DEFAULT_TOLERANCE};

/// Representation of the storage options of a conversion job.
///
/// Found under the `storage_options` key of a job configuration, e.g.
/// `{"compress": 4, "shuffle": true, "chunksize": 1e6}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StorageOptions {
    /// Chunk volume budget in bytes, before compression.
    pub chunksize: f64,
    /// Gzip compression level; 0 disables compression. Must be in the range 0..=9.
    #[serde(default)]
    pub compress: u8,
    /// Whether the writer should apply a byte shuffle filter.
    #[serde(default)]
    pub shuffle: bool,
    /// Bytes per element to size chunks with.
    /// Defaults to the width of the array's data type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_size: Option<u64>,
    /// Default 0.8. Must be in the range (0, 1].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<f64>,
}

impl StorageOptions {
    pub fn new(chunksize: f64) -> Self {
        Self {
            chunksize,
            compress: 0,
            shuffle: false,
            word_size: None,
            tolerance: None,
        }
    }

    /// Parse and validate storage options from JSON.
    pub fn from_json_str(s: &str) -> crate::Result<Self> {
        let out: Self = serde_json::from_str(s)?;
        out.validate()?;
        Ok(out)
    }

    /// Extract and validate the `storage_options` of a whole job configuration document.
    pub fn from_job_configuration(configuration: &serde_json::Value) -> crate::Result<Self> {
        let Some(value) = configuration.get("storage_options") else {
            return Err(crate::Error::configuration(
                "job configuration has no storage_options",
            ));
        };
        let out = Self::deserialize(value)?;
        out.validate()?;
        Ok(out)
    }

    pub fn validate(&self) -> crate::Result<()> {
        self.gzip_codec()?;
        self.solver(None).validate()
    }

    /// The gzip codec for the configured compression level, if compression is enabled.
    pub fn gzip_codec(&self) -> crate::Result<Option<GzipCodec>> {
        if self.compress == 0 {
            return Ok(None);
        }
        let codec = GzipCodec::new(u32::from(self.compress)).map_err(|e| {
            crate::Error::configuration(format!("invalid gzip compression level: {e}"))
        })?;
        Ok(Some(codec))
    }

    /// Build a solver for these options.
    ///
    /// `element_width` is used if no `word_size` is configured,
    /// falling back to the solver's default.
    pub fn solver(&self, element_width: Option<u64>) -> ChunkShapeSolver {
        let mut solver = ChunkShapeSolver::new(self.chunksize)
            .with_tolerance(self.tolerance.unwrap_or(DEFAULT_TOLERANCE));
        if let Some(w) = self.word_size.or(element_width) {
            solver = solver.with_element_width(w);
        }
        solver
    }
}
