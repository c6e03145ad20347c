//! Newtype wrappers for protocol identifier fields.
//!
//! These types prevent accidental mixing of request identifiers, message
//! codes, and raw buffer values, all of which share the same underlying
//! 64-bit representation.

use core::fmt;

/// A request identifier, unique per in-flight request on a link.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[must_use]
pub struct RequestId(u64);

impl RequestId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl From<u64> for RequestId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RequestId({})", self.0)
    }
}

/// A protocol message code, keying the per-message cost table.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[must_use]
pub struct MessageCode(u64);

impl MessageCode {
    pub const fn new(code: u64) -> Self {
        Self(code)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl From<u64> for MessageCode {
    fn from(code: u64) -> Self {
        Self(code)
    }
}

impl fmt::Display for MessageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl fmt::Debug for MessageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessageCode({:#x})", self.0)
    }
}

/// The flow-control fields carried in every reply message.
///
/// `bv` is the buffer value the server computed for the client when it
/// finished serving the request; the payload itself travels separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyHeader {
    pub req_id: RequestId,
    pub bv: u64,
}
