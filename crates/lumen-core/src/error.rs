//! Error types for handshake and parameter validation.
//!
//! The flow-control state machines themselves surface no errors: unknown
//! reply ids are ignored and clock anomalies clamp to zero. Everything
//! that can actually fail happens at the handshake boundary.

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParamError {
    #[error("buffer limit must be nonzero")]
    ZeroBufferLimit,

    #[error("minimum recharge rate must be nonzero")]
    ZeroRechargeRate,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandshakeError {
    #[error("missing handshake field: {0}")]
    MissingField(&'static str),

    #[error("unexpected value type for handshake field: {0}")]
    WrongType(&'static str),

    #[error("invalid flow parameters: {0}")]
    InvalidParams(#[from] ParamError),
}
