use thiserror::Error;

use crate::handles::MixGroupHandle;

/// Errors surfaced by control-thread APIs.
///
/// The audio thread never returns this type; its failures are silent drops
/// or debug assertions, per the engine's real-time contract.
#[derive(Error, Debug)]
pub enum AeError {
    #[error("pool exhausted: {0}")]
    PoolExhausted(&'static str),

    #[error("invalid handle passed to {0}")]
    InvalidHandle(&'static str),

    #[error("routing would introduce a cycle between {from:?} and {to:?}")]
    RoutingCycle {
        from: MixGroupHandle,
        to: MixGroupHandle,
    },

    #[error("command queue full, command dropped")]
    CommandQueueFull,

    #[error("invalid parameter: {0}")]
    InvalidParam(&'static str),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type AeResult<T> = Result<T, AeError>;
