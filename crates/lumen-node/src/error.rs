//! Node error types.

use lumen_core::{HandshakeError, MessageCode};

#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("handshake error: {0}")]
    Handshake(#[from] HandshakeError),

    #[error("no announced cost for message code {0}")]
    UnknownMessageCode(MessageCode),
}
