//! Client-side buffer estimation for one connected server.
//!
//! A [`ServerTracker`] mirrors what the server's accounting will say
//! about us: it debits the estimate when a request is queued, answers how
//! long to wait before a request of a given cost is safely admissible,
//! and resyncs against the authoritative buffer value piggybacked on
//! every reply.
//!
//! The reconciliation relies on the cumulative-cost bookkeeping: each
//! queued request records the running sum of max costs at queue time, so
//! when its reply arrives, `sum_cost - snapshot` is exactly the cost of
//! everything queued after it — the drain the server had not yet seen
//! when it computed the reported value.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use lumen_core::{FlowParams, RequestId};

use crate::constants::{SAFETY_MARGIN, TIME_CONSTANT};
use crate::recharge::recharge;

/// Answer to "may I send a request of this cost now?".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SendBudget {
    /// Minimum time to hold the request before sending. Zero means send now.
    pub wait: Duration,
    /// Estimated buffer level after the hypothetical send, relative to
    /// the buffer limit; in `[0, 1]`, and `0.0` whenever `wait` is
    /// nonzero. Callers may use it to prefer less-loaded peers.
    pub headroom: f64,
}

struct PendingRequest {
    /// Running cost sum immediately after this request was queued.
    snapshot: u64,
    queued_at: Instant,
}

struct ServerState {
    buf_estimate: u64,
    last_time: Instant,
    /// Sum of max costs of every request ever queued, wrapping mod 2^64.
    sum_cost: u64,
    pending: HashMap<RequestId, PendingRequest>,
}

impl ServerState {
    fn recharge_to(&mut self, params: FlowParams, now: Instant) {
        let dt = now.saturating_duration_since(self.last_time);
        self.buf_estimate = recharge(self.buf_estimate, params, dt);
        self.last_time = now;
    }
}

/// The client's view of one connected server.
pub struct ServerTracker {
    params: FlowParams,
    state: Mutex<ServerState>,
}

impl ServerTracker {
    pub fn new(params: FlowParams) -> Self {
        Self::new_at(params, Instant::now())
    }

    /// [`ServerTracker::new`] with an explicit construction instant.
    pub fn new_at(params: FlowParams, now: Instant) -> Self {
        Self {
            params,
            state: Mutex::new(ServerState {
                buf_estimate: params.buf_limit,
                last_time: now,
                sum_cost: 0,
                pending: HashMap::new(),
            }),
        }
    }

    pub fn params(&self) -> FlowParams {
        self.params
    }

    /// Current buffer estimate, without advancing the recharge clock.
    pub fn buffer_estimate(&self) -> u64 {
        self.lock().buf_estimate
    }

    /// Number of requests awaiting a reply.
    pub fn pending_len(&self) -> usize {
        self.lock().pending.len()
    }

    /// Minimum wait before a request with the given maximum cost is
    /// safely admissible, and the headroom left if sent after that wait.
    ///
    /// The cost is inflated by one [`SAFETY_MARGIN`] worth of drain and
    /// clamped to the buffer limit, so a request the limit can never
    /// afford still becomes admissible once the buffer fills.
    pub fn can_send(&self, max_cost: u64) -> SendBudget {
        self.can_send_at(max_cost, Instant::now())
    }

    pub fn can_send_at(&self, max_cost: u64, now: Instant) -> SendBudget {
        let mut state = self.lock();
        state.recharge_to(self.params, now);

        let margin = self
            .params
            .min_recharge
            .saturating_mul(SAFETY_MARGIN.as_millis() as u64)
            / TIME_CONSTANT.as_millis() as u64;
        let cost = max_cost.saturating_add(margin).min(self.params.buf_limit);

        if state.buf_estimate >= cost {
            SendBudget {
                wait: Duration::ZERO,
                headroom: (state.buf_estimate - cost) as f64 / self.params.buf_limit as f64,
            }
        } else {
            let deficit = cost - state.buf_estimate;
            let wait_ms =
                deficit as u128 * TIME_CONSTANT.as_millis() / self.params.min_recharge as u128;
            tracing::trace!(deficit, wait_ms = wait_ms as u64, "flow: send deferred");
            SendBudget {
                wait: Duration::from_millis(wait_ms as u64),
                headroom: 0.0,
            }
        }
    }

    /// Debit the estimate for a request about to go on the wire.
    ///
    /// Callers must queue requests in the exact order they are sent; the
    /// reconciliation math assumes the server observes the same order.
    /// The method does not re-check admissibility — that is
    /// [`ServerTracker::can_send`]'s job — and the debit saturates at
    /// zero if the caller ignored it.
    pub fn queue_request(&self, req_id: RequestId, max_cost: u64) {
        self.queue_request_at(req_id, max_cost, Instant::now());
    }

    pub fn queue_request_at(&self, req_id: RequestId, max_cost: u64, now: Instant) {
        let mut state = self.lock();
        state.buf_estimate = state.buf_estimate.saturating_sub(max_cost);
        state.sum_cost = state.sum_cost.wrapping_add(max_cost);
        let snapshot = state.sum_cost;
        let previous = state.pending.insert(
            req_id,
            PendingRequest {
                snapshot,
                queued_at: now,
            },
        );
        debug_assert!(previous.is_none(), "request id {req_id} reused while pending");
        tracing::trace!(
            %req_id,
            max_cost,
            estimate = state.buf_estimate,
            "flow: request queued"
        );
    }

    /// Resync the estimate against the buffer value carried by a reply.
    ///
    /// Replies for unknown ids (duplicates, or requests already purged)
    /// are ignored. The reply is ground truth: any recharge accrued while
    /// the request was in flight is discarded and the recharge clock
    /// restarts at `now`.
    pub fn got_reply(&self, req_id: RequestId, bv: u64) {
        self.got_reply_at(req_id, bv, Instant::now());
    }

    pub fn got_reply_at(&self, req_id: RequestId, bv: u64, now: Instant) {
        let mut state = self.lock();
        let bv = bv.min(self.params.buf_limit);
        let Some(entry) = state.pending.remove(&req_id) else {
            tracing::warn!(%req_id, "flow: reply for unknown request id ignored");
            return;
        };

        // Max cost of requests queued after this one; the server had not
        // seen them when it computed the reported value.
        let unseen = state.sum_cost.wrapping_sub(entry.snapshot);
        state.buf_estimate = bv.saturating_sub(unseen);
        state.last_time = now;
        tracing::trace!(
            %req_id,
            bv,
            unseen,
            estimate = state.buf_estimate,
            "flow: estimate resynced"
        );
    }

    /// Drop pending entries older than `max_age`, returning how many.
    ///
    /// A reply that never arrives would otherwise leak its entry for the
    /// life of the link. Late replies for purged ids are then ignored.
    pub fn purge_pending(&self, max_age: Duration) -> usize {
        self.purge_pending_at(max_age, Instant::now())
    }

    pub fn purge_pending_at(&self, max_age: Duration, now: Instant) -> usize {
        let mut state = self.lock();
        let before = state.pending.len();
        state.pending.retain(|req_id, entry| {
            let keep = now.saturating_duration_since(entry.queued_at) <= max_age;
            if !keep {
                tracing::warn!(%req_id, "flow: purged stale pending request");
            }
            keep
        });
        before - state.pending.len()
    }

    fn lock(&self) -> MutexGuard<'_, ServerState> {
        self.state.lock().expect("server tracker mutex poisoned")
    }
}
