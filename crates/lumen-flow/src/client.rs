//! Server-side buffer accounting for one connected client.
//!
//! A [`ClientTracker`] holds the authoritative buffer value the server
//! maintains for a client: recharge on every touch, admission check on
//! arrival, debit once the request has been served. The value returned by
//! [`ClientTracker::request_processed`] is the BV field the server puts
//! on the wire with the reply.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use lumen_core::FlowParams;

use crate::manager::{ClientManager, NodeId};
use crate::recharge::recharge;

/// Result of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    /// The client's buffer value after recharge.
    pub buffer_value: u64,
    /// Whether the request may be served now.
    pub admitted: bool,
}

/// Result of post-service accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessedRequest {
    /// The buffer value to report back to the client with the reply.
    pub buffer_value: u64,
    /// The actual cost of the request, for higher-layer accounting.
    pub real_cost: u64,
}

struct ClientState {
    buf_value: u64,
    last_time: Instant,
}

impl ClientState {
    /// Apply the recharge law up to `now` and re-anchor `last_time`.
    ///
    /// A clock reading earlier than `last_time` counts as zero elapsed
    /// time; `last_time` still moves to the observed instant.
    fn recharge_to(&mut self, params: FlowParams, now: Instant) {
        let dt = now.saturating_duration_since(self.last_time);
        self.buf_value = recharge(self.buf_value, params, dt);
        self.last_time = now;
    }
}

/// The server's view of one connected client.
pub struct ClientTracker {
    params: FlowParams,
    manager: Option<(Arc<dyn ClientManager>, NodeId)>,
    state: Mutex<ClientState>,
}

impl ClientTracker {
    /// Track a client without fleet-wide management: every request is
    /// admitted and costs are reported unchanged.
    pub fn new(params: FlowParams) -> Self {
        Self::new_at(params, Instant::now())
    }

    /// [`ClientTracker::new`] with an explicit construction instant.
    pub fn new_at(params: FlowParams, now: Instant) -> Self {
        Self {
            params,
            manager: None,
            state: Mutex::new(ClientState {
                buf_value: params.buf_limit,
                last_time: now,
            }),
        }
    }

    /// Track a client under a manager; registers it for the tracker's
    /// lifetime and unregisters on drop.
    pub fn with_manager(params: FlowParams, manager: Arc<dyn ClientManager>) -> Self {
        Self::with_manager_at(params, manager, Instant::now())
    }

    /// [`ClientTracker::with_manager`] with an explicit construction instant.
    pub fn with_manager_at(
        params: FlowParams,
        manager: Arc<dyn ClientManager>,
        now: Instant,
    ) -> Self {
        let node = manager.add_node(params);
        let mut tracker = Self::new_at(params, now);
        tracker.manager = Some((manager, node));
        tracker
    }

    pub fn params(&self) -> FlowParams {
        self.params
    }

    /// The node handle this tracker registered with its manager, if any.
    pub fn node_id(&self) -> Option<NodeId> {
        self.manager.as_ref().map(|(_, node)| *node)
    }

    /// Current buffer value, without advancing the recharge clock.
    pub fn buffer_value(&self) -> u64 {
        self.lock().buf_value
    }

    /// Admission check for an incoming request.
    ///
    /// Recharges to `now` and consults the manager; without a manager
    /// every request is admitted. The returned buffer value is
    /// informational; the debit happens in [`ClientTracker::request_processed`].
    pub fn accept_request(&self) -> Admission {
        self.accept_request_at(Instant::now())
    }

    pub fn accept_request_at(&self, now: Instant) -> Admission {
        let mut state = self.lock();
        state.recharge_to(self.params, now);
        let admitted = match &self.manager {
            Some((manager, node)) => manager.accept(*node, now),
            None => true,
        };
        if !admitted {
            tracing::debug!(buffer = state.buf_value, "flow: request deferred by manager");
        }
        Admission {
            buffer_value: state.buf_value,
            admitted,
        }
    }

    /// Charge a served request against the client's buffer.
    ///
    /// Recharges to `now`, debits `cost`, recharges again at the same
    /// instant, then lets the manager's accounting raise the value when
    /// fleet-wide capacity turns out better than the local drift. The
    /// adjustment is monotone upward. Honoring the admission contract
    /// keeps `cost` within the buffer; the debit saturates at zero if a
    /// caller violates that.
    pub fn request_processed(&self, cost: u64) -> ProcessedRequest {
        self.request_processed_at(cost, Instant::now())
    }

    pub fn request_processed_at(&self, cost: u64, now: Instant) -> ProcessedRequest {
        let mut state = self.lock();
        state.recharge_to(self.params, now);
        debug_assert!(
            cost <= state.buf_value,
            "request cost {cost} exceeds buffer value {}",
            state.buf_value
        );
        state.buf_value = state.buf_value.saturating_sub(cost);
        state.recharge_to(self.params, now);

        let real_cost = match &self.manager {
            Some((manager, node)) => {
                let outcome = manager.processed(*node, cost, now);
                if outcome.capacity < self.params.buf_limit {
                    let floor = self.params.buf_limit - outcome.capacity;
                    if floor > state.buf_value {
                        tracing::debug!(
                            from = state.buf_value,
                            to = floor,
                            "flow: manager raised client buffer"
                        );
                        state.buf_value = floor;
                    }
                }
                outcome.real_cost
            }
            None => cost,
        };

        tracing::trace!(
            buffer = state.buf_value,
            cost,
            real_cost,
            "flow: request charged"
        );
        ProcessedRequest {
            buffer_value: state.buf_value,
            real_cost,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ClientState> {
        self.state.lock().expect("client tracker mutex poisoned")
    }
}

impl Drop for ClientTracker {
    fn drop(&mut self) {
        if let Some((manager, node)) = &self.manager {
            manager.remove_node(*node);
        }
    }
}
