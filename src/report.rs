use std::fmt;

/// What a chunk shape computation asked for, and what it achieved.
///
/// Purely observational: producing a report never changes the chunk shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkReport {
    /// Shape of the array being chunked.
    pub shape: Vec<u64>,
    /// The chunk shape which was returned.
    pub chunk_shape: Vec<u64>,
    /// Bytes per element used for the volume calculations.
    pub element_width: u64,
    /// Requested chunk volume in bytes.
    pub requested_bytes: f64,
    /// Chunk volume in bytes of the returned chunk shape.
    pub achieved_bytes: u64,
    /// Number of chunks the array would have at exactly the requested volume.
    pub requested_chunks: u64,
    /// Number of chunks the array has with the returned chunk shape.
    pub achieved_chunks: u64,
    /// Axes which collapsed to an extent of 1 because no larger divisor fit the guess.
    pub degenerate_axes: Vec<usize>,
    /// Whether the last axis was rescaled by the tolerance pass.
    pub topped_up: bool,
    /// Minimum acceptable fraction of the requested volume.
    pub tolerance: f64,
}

impl ChunkReport {
    pub(crate) fn new(
        shape: &[u64],
        chunk_shape: &[u64],
        element_width: u64,
        requested_bytes: f64,
        degenerate_axes: Vec<usize>,
        topped_up: bool,
        tolerance: f64,
    ) -> Self {
        let array_elements: f64 = shape.iter().map(|&n| n as f64).product();
        let requested_elements = requested_bytes / element_width as f64;
        let achieved_chunks = shape
            .iter()
            .zip(chunk_shape)
            .fold(1u64, |acc, (&n, &c)| acc.saturating_mul(n / c));
        let achieved_bytes = chunk_shape
            .iter()
            .fold(element_width, |acc, &c| acc.saturating_mul(c));
        Self {
            shape: shape.to_vec(),
            chunk_shape: chunk_shape.to_vec(),
            element_width,
            requested_bytes,
            achieved_bytes,
            requested_chunks: (array_elements / requested_elements) as u64,
            achieved_chunks,
            degenerate_axes,
            topped_up,
            tolerance,
        }
    }

    /// Achieved chunk volume as a fraction of the requested volume.
    pub fn fill_fraction(&self) -> f64 {
        self.achieved_bytes as f64 / self.requested_bytes
    }

    /// Whether the achieved volume is within tolerance of the request.
    ///
    /// Chunks which cover the whole array always meet the tolerance,
    /// as no larger chunk is possible.
    pub fn tolerance_met(&self) -> bool {
        self.chunk_shape == self.shape || self.fill_fraction() >= self.tolerance
    }

    /// Whether any axis collapsed to a chunk extent of 1.
    pub fn is_degenerate(&self) -> bool {
        !self.degenerate_axes.is_empty()
    }

    /// Emit the report through the `log` facade.
    pub fn log(&self) {
        log::debug!("{self}");
        for &axis in &self.degenerate_axes {
            log::warn!(
                "axis {axis} of length {} has no divisor near its ideal chunk extent; using 1",
                self.shape[axis]
            );
        }
        if !self.tolerance_met() {
            log::warn!(
                "chunk shape {:?} holds {}B, below {:.0}% of the requested {}B",
                self.chunk_shape,
                self.achieved_bytes,
                self.tolerance * 100.0,
                self.requested_bytes
            );
        }
    }
}

impl fmt::Display for ChunkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "chunk shape {:?} - wanted {}/{}B will get {}/{}B",
            self.chunk_shape,
            self.requested_chunks,
            self.requested_bytes,
            self.achieved_chunks,
            self.achieved_bytes
        )
    }
}
