//! Core types for the lumen light-client subprotocol.
//!
//! This crate holds the passive data model shared by servers and clients:
//! the flow parameters a server advertises at handshake, the per-message
//! cost table, the keyed handshake field list those travel in, and the
//! request/reply identifier types. Protocol state machines live in
//! `lumen-flow`; node integration lives in `lumen-node`.

pub mod cost;
pub mod error;
pub mod handshake;
pub mod params;
pub mod types;

pub use cost::{CostEntry, CostList, CostTable};
pub use error::{HandshakeError, ParamError};
pub use handshake::{FieldList, FieldValue, FlowHandshake};
pub use params::FlowParams;
pub use types::{MessageCode, ReplyHeader, RequestId};
