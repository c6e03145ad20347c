//! Bidirectional flow control for the lumen light-client subprotocol.
//!
//! A server serves bandwidth-bounded data to light clients. Each side of
//! a link keeps a *buffer value* for the other: a credit that drains as
//! requests are accepted and recharges linearly over time. The server
//! holds the authoritative value per client ([`ClientTracker`]); the
//! client keeps a conservative estimate per server ([`ServerTracker`]) so
//! it can pace itself without polling. Every reply carries the server's
//! authoritative value, and the client resyncs its estimate against it.
//!
//! The state machines here are deliberately decoupled from I/O and wall
//! clocks: every time-dependent operation has an `_at` variant taking an
//! explicit [`std::time::Instant`], and the convenience wrappers simply
//! pass `Instant::now()`.

pub mod client;
pub mod constants;
pub mod manager;
pub mod recharge;
pub mod server;

pub use client::{Admission, ClientTracker, ProcessedRequest};
pub use constants::{SAFETY_MARGIN, TIME_CONSTANT};
pub use manager::{ClientManager, NodeId, ProcessedOutcome, UnthrottledManager};
pub use server::{SendBudget, ServerTracker};
