use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("target count must be a positive integer, got {0}")]
    InvalidTargetCount(i64),
}
