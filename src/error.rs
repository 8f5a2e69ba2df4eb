use thiserror::Error;

/// Recoverable failures of beam operations.
#[derive(Debug, Error)]
pub enum BeamError {
    #[error("beam has no vertices")]
    EmptyBeam,
    #[error("vector is degenerate: {0}")]
    DegenerateVector(String),
    #[error("projection plane is parallel to the propagation direction, n.prop = {0}")]
    ParallelPlane(f32),
    #[error("invalid beam frame: {0}")]
    InvalidFrame(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BeamError>;
