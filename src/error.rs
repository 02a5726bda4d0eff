//! Error types shared by the render core.
//!
//! Empty input and fully filtered input are not errors: the orchestrator
//! turns them into container notices. Everything here is either contained at
//! the orchestrator boundary ([`RenderError`]) or degraded locally
//! ([`NameLookupError`]).

/// Unexpected failures while fitting, aggregating or drawing a render.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The mode string is not one of `markers`, `density` or `grid`.
    #[error("unknown render mode {0:?}")]
    UnknownMode(String),

    /// Record coordinates produced a bounding box that cannot be projected.
    #[error("cannot fit viewport to bounds ({min_lat}, {min_lon}) .. ({max_lat}, {max_lon})")]
    InvalidBounds {
        min_lat: f64,
        min_lon: f64,
        max_lat: f64,
        max_lon: f64,
    },

    /// A record coordinate is NaN or infinite.
    #[error("record at ({lat}, {lon}) has a non-finite coordinate")]
    NonFiniteCoordinate { lat: f64, lon: f64 },

    /// Summed event counts no longer fit in a `u64`.
    #[error("event counts overflow in {0}")]
    CountOverflow(String),

    /// Grid step must be a positive finite number of degrees.
    #[error("invalid grid step {0}")]
    InvalidGridStep(f64),

    /// The container has no drawable area.
    #[error("container {container:?} has no drawable area ({width}x{height})")]
    SurfaceTooSmall {
        container: String,
        width: usize,
        height: usize,
    },
}

/// Failures while fetching the grunt name table.
#[derive(Debug, thiserror::Error)]
pub enum NameLookupError {
    #[error("invalid asset url: {0}")]
    Url(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("asset server responded with {0}")]
    Status(u16),

    #[error("malformed name table: {0}")]
    Parse(#[from] simd_json::Error),
}
