//! Error types for floor generation.
//!
//! `AttemptFailure` is internal to the retry loop: a single attempt gave up and
//! generation restarts from scratch. `GenerationError` is what callers see.

/// Why one generation attempt was abandoned
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AttemptFailure {
    #[error("no point could host the entrance room")]
    EntranceNotPlaced,

    #[error("no point pair could host the exit and boss rooms")]
    ExitNotPlaced,

    #[error("no point could host the bonus room")]
    BonusNotPlaced,

    #[error("point ({x}, {y}) has no corridor to any neighbour")]
    IsolatedPoint { x: usize, y: usize },

    #[error("boss room is not reachable from the entrance")]
    BossUnreachable,

    #[error("bonus room is not reachable from the entrance")]
    BonusUnreachable,

    #[error("bonus room has {0} corridors, expected exactly one")]
    BonusEdgeCount(usize),
}

/// Errors surfaced by floor generation and configuration loading
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// The configured grid cannot hold the mandatory rooms
    #[error("a {points_per_axis}x{points_per_axis} point grid cannot hold {required} mandatory rooms")]
    GridTooSmall {
        points_per_axis: usize,
        required: usize,
    },

    #[error("entrance anchor ({x}, {y}) lies outside a {points_per_axis}x{points_per_axis} grid")]
    AnchorOutOfGrid {
        x: usize,
        y: usize,
        points_per_axis: usize,
    },

    /// Every attempt failed; carries the reason the last one was abandoned
    #[error("floor generation gave up after {attempts} attempts (last failure: {last})")]
    AttemptsExhausted { attempts: u32, last: AttemptFailure },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("RON error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GenerationError>;
