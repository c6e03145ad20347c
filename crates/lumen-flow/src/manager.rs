//! Pluggable admission and accounting hook for the serving side.
//!
//! A [`ClientTracker`](crate::client::ClientTracker) keeps per-client
//! buffer arithmetic; fleet-wide decisions (capacity sharing between
//! clients, load shedding) belong to a [`ClientManager`]. Trackers hold a
//! [`NodeId`] handle into the manager rather than a back-reference, so
//! ownership stays acyclic: the tracker references the manager, the
//! manager knows only handles.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use lumen_core::FlowParams;

/// Handle identifying one registered client within a manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[must_use]
pub struct NodeId(u64);

impl NodeId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

/// Outcome of the post-service accounting hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessedOutcome {
    /// The manager's view of the client's remaining drain capacity.
    ///
    /// When below the buffer limit, the tracker raises its buffer value
    /// to at least `buf_limit - capacity`; the adjustment never lowers it.
    pub capacity: u64,
    /// The actual cost of the request, reported to higher layers.
    pub real_cost: u64,
}

/// Fleet-wide admission and accounting, consulted by every client tracker.
pub trait ClientManager: Send + Sync {
    /// Register a client at tracker construction.
    fn add_node(&self, params: FlowParams) -> NodeId;

    /// Unregister a client at tracker destruction.
    fn remove_node(&self, node: NodeId);

    /// Whether a request from this client may be served right now.
    fn accept(&self, node: NodeId, now: Instant) -> bool;

    /// Post-service accounting for a request of the given charged cost.
    fn processed(&self, node: NodeId, cost: u64, now: Instant) -> ProcessedOutcome;
}

/// The identity manager: admits every request and never discounts.
///
/// Reports full remaining capacity, so the tracker's own arithmetic is
/// left untouched, and echoes the charged cost back as the real cost.
#[derive(Debug, Default)]
pub struct UnthrottledManager {
    next_id: AtomicU64,
    nodes: Mutex<HashMap<NodeId, FlowParams>>,
}

impl UnthrottledManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of currently registered clients.
    pub fn node_count(&self) -> usize {
        self.nodes.lock().expect("manager mutex poisoned").len()
    }
}

impl ClientManager for UnthrottledManager {
    fn add_node(&self, params: FlowParams) -> NodeId {
        let id = NodeId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.nodes
            .lock()
            .expect("manager mutex poisoned")
            .insert(id, params);
        tracing::debug!(node = id.as_u64(), "flow: client registered");
        id
    }

    fn remove_node(&self, node: NodeId) {
        self.nodes
            .lock()
            .expect("manager mutex poisoned")
            .remove(&node);
        tracing::debug!(node = node.as_u64(), "flow: client unregistered");
    }

    fn accept(&self, _node: NodeId, _now: Instant) -> bool {
        true
    }

    fn processed(&self, node: NodeId, cost: u64, _now: Instant) -> ProcessedOutcome {
        let capacity = self
            .nodes
            .lock()
            .expect("manager mutex poisoned")
            .get(&node)
            .map_or(u64::MAX, |params| params.buf_limit);
        ProcessedOutcome {
            capacity,
            real_cost: cost,
        }
    }
}
