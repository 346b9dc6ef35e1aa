use thiserror::Error;
use crate::promise::State;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("promise already {0}")]
    Settled(State),
    #[error("promise rejected: {0}")]
    Rejected(String),
    #[error("type mismatch, expected {expected}")]
    TypeMismatch { expected: &'static str },
    #[error("machine terminated")]
    Terminated,
    #[error("resolver dropped")]
    Dropped,
    #[error("promise dropped before settling")]
    Abandoned,
}
