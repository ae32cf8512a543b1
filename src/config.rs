use serde::Serialize;
use thiserror::Error;

/// A half-open integer range `[start, end)` used for coordinate sampling.
#[derive(Copy, Clone, Debug, Serialize)]
pub struct CoordRange {
    pub start: u32,
    pub end: u32,
}

impl CoordRange {
    pub fn new(start: u32, end: u32) -> Self {
        CoordRange { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

impl std::fmt::Display for CoordRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

#[derive(Debug, Error)]
pub enum ParamError {
    #[error("empty {axis} coordinate range {range} (start must be below end)")]
    EmptyRange {
        axis: &'static str,
        range: CoordRange,
    },
    #[error("tile count must be at least 1")]
    NoTiles,
    #[error("{axis} distance threshold must be a positive integer")]
    ZeroThreshold { axis: &'static str },
    #[error("total read count must be at least 1")]
    NoReads,
}

/// Simulation parameters shared by read generation and duplicate counting.
///
/// The defaults reproduce the flow cell geometry used in the reference
/// experiments: tiles of roughly 32k x 49k coordinate units, 112 tiles, and
/// a 2500-unit search distance along each axis (so the full search window is
/// about twice that per axis).
#[derive(Copy, Clone, Debug, Serialize)]
pub struct SimParams {
    pub x_range: CoordRange,
    pub y_range: CoordRange,
    pub tile_count: u32,
    /// Strict upper bound on |Δx| for two reads to be locally co-located.
    pub x_dist: u32,
    /// Strict upper bound on |Δy| for two reads to be locally co-located.
    pub y_dist: u32,
    /// Number of reads simulated per experiment.
    pub total_reads: usize,
    /// Base RNG seed. `None` seeds from entropy; sweeps derive one stream
    /// per parameter combination so results are scheduling-independent.
    pub seed: Option<u64>,
}

impl Default for SimParams {
    fn default() -> Self {
        SimParams {
            x_range: CoordRange::new(1100, 33000),
            y_range: CoordRange::new(1000, 50000),
            tile_count: 112,
            x_dist: 2500,
            y_dist: 2500,
            total_reads: 10_000_000,
            seed: None,
        }
    }
}

impl SimParams {
    /// Checks that every sampling range is non-degenerate, so generation
    /// can never silently produce nonsense statistics.
    pub fn validate(&self) -> Result<(), ParamError> {
        if self.x_range.is_empty() {
            return Err(ParamError::EmptyRange {
                axis: "x",
                range: self.x_range,
            });
        }
        if self.y_range.is_empty() {
            return Err(ParamError::EmptyRange {
                axis: "y",
                range: self.y_range,
            });
        }
        if self.tile_count == 0 {
            return Err(ParamError::NoTiles);
        }
        if self.x_dist == 0 {
            return Err(ParamError::ZeroThreshold { axis: "x" });
        }
        if self.y_dist == 0 {
            return Err(ParamError::ZeroThreshold { axis: "y" });
        }
        if self.total_reads == 0 {
            return Err(ParamError::NoReads);
        }
        Ok(())
    }
}
