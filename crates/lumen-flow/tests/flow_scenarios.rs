//! End-to-end flow-control scenarios: drain, recharge, wait computation,
//! reply reconciliation, and clock anomalies, all driven with explicit
//! instants so every intermediate value is exact.

use std::sync::Arc;
use std::time::{Duration, Instant};

use lumen_core::{FlowParams, RequestId};
use lumen_flow::{ClientTracker, ServerTracker, UnthrottledManager};

const PARAMS: FlowParams = FlowParams::new(1000, 100);

fn at(t0: Instant, ms: u64) -> Instant {
    t0 + Duration::from_millis(ms)
}

// ---------------------------------------------------------------------------
// Serving side: basic drain and recharge
// ---------------------------------------------------------------------------

#[test]
fn serving_drain_and_recharge() {
    let t0 = Instant::now();
    let manager = Arc::new(UnthrottledManager::new());
    let tracker = ClientTracker::with_manager_at(PARAMS, manager, t0);

    let admission = tracker.accept_request_at(at(t0, 0));
    assert_eq!((admission.buffer_value, admission.admitted), (1000, true));

    let processed = tracker.request_processed_at(300, at(t0, 0));
    assert_eq!((processed.buffer_value, processed.real_cost), (700, 300));

    // Two milliseconds recharge 200 units.
    let admission = tracker.accept_request_at(at(t0, 2));
    assert_eq!((admission.buffer_value, admission.admitted), (900, true));

    // A long gap saturates at the ceiling.
    let admission = tracker.accept_request_at(at(t0, 100));
    assert_eq!((admission.buffer_value, admission.admitted), (1000, true));
}

// ---------------------------------------------------------------------------
// Estimating side: wait computation
// ---------------------------------------------------------------------------

#[test]
fn estimator_admits_limit_sized_request() {
    let t0 = Instant::now();
    let tracker = ServerTracker::new_at(PARAMS, t0);

    // 1200 + safety margin clamps to the limit, which a full buffer affords.
    let budget = tracker.can_send_at(1200, at(t0, 0));
    assert_eq!(budget.wait, Duration::ZERO);
    assert_eq!(budget.headroom, 0.0);

    // The caller may still queue it; the debit saturates at zero.
    tracker.queue_request_at(RequestId::new(1), 1200, at(t0, 0));
    assert_eq!(tracker.buffer_estimate(), 0);
}

#[test]
fn estimator_safety_margin_wait() {
    let t0 = Instant::now();
    let tracker = ServerTracker::new_at(PARAMS, t0);
    tracker.queue_request_at(RequestId::new(1), 900, at(t0, 0));
    assert_eq!(tracker.buffer_estimate(), 100);

    // Cost 150 inflates to 250; the 150-unit deficit refills in 1 ms.
    let budget = tracker.can_send_at(150, at(t0, 0));
    assert_eq!(budget.wait, Duration::from_millis(1));
    assert_eq!(budget.headroom, 0.0);

    // After the advertised wait the same request is admissible.
    let budget = tracker.can_send_at(150, at(t0, 1));
    assert_eq!(budget.wait, Duration::ZERO);
}

// ---------------------------------------------------------------------------
// Estimating side: reply reconciliation
// ---------------------------------------------------------------------------

#[test]
fn estimator_reply_reconciliation() {
    let t0 = Instant::now();
    let tracker = ServerTracker::new_at(PARAMS, t0);

    tracker.queue_request_at(RequestId::new(1), 400, at(t0, 0));
    assert_eq!(tracker.buffer_estimate(), 600);
    tracker.queue_request_at(RequestId::new(2), 200, at(t0, 0));
    assert_eq!(tracker.buffer_estimate(), 400);

    // The reply to request 1 reports 700; request 2 (cost 200) was queued
    // after it, so the current estimate is 500.
    tracker.got_reply_at(RequestId::new(1), 700, at(t0, 5));
    assert_eq!(tracker.buffer_estimate(), 500);
    assert_eq!(tracker.pending_len(), 1);
}

#[test]
fn estimator_ignores_unsolicited_reply() {
    let t0 = Instant::now();
    let tracker = ServerTracker::new_at(PARAMS, t0);
    tracker.queue_request_at(RequestId::new(1), 400, at(t0, 0));
    tracker.queue_request_at(RequestId::new(2), 200, at(t0, 0));
    tracker.got_reply_at(RequestId::new(1), 700, at(t0, 5));

    tracker.got_reply_at(RequestId::new(99), 999, at(t0, 5));
    assert_eq!(tracker.buffer_estimate(), 500);
    assert_eq!(tracker.pending_len(), 1);

    // A duplicate of an already-consumed reply is equally ignored.
    tracker.got_reply_at(RequestId::new(1), 700, at(t0, 6));
    assert_eq!(tracker.buffer_estimate(), 500);
}

// ---------------------------------------------------------------------------
// Clock anomalies
// ---------------------------------------------------------------------------

#[test]
fn serving_backward_clock_recharges_nothing() {
    let t0 = Instant::now();
    let tracker = ClientTracker::new_at(PARAMS, at(t0, 10));
    tracker.request_processed_at(500, at(t0, 10));
    assert_eq!(tracker.buffer_value(), 500);

    // An out-of-order reading counts as zero elapsed time, and the
    // recharge anchor moves to the earlier instant.
    let admission = tracker.accept_request_at(at(t0, 5));
    assert_eq!(admission.buffer_value, 500);

    // Accrual then restarts from the moved anchor.
    let admission = tracker.accept_request_at(at(t0, 6));
    assert_eq!(admission.buffer_value, 600);
}

// ---------------------------------------------------------------------------
// Both sides of one link
// ---------------------------------------------------------------------------

#[test]
fn paired_trackers_converge() {
    let t0 = Instant::now();
    let server_side = ClientTracker::new_at(PARAMS, t0);
    let client_side = ServerTracker::new_at(PARAMS, t0);

    // Client paces, sends, server serves, reply resyncs the estimate.
    let mut now = t0;
    for (i, cost) in [(1u64, 300u64), (2, 250), (3, 400)] {
        let budget = client_side.can_send_at(cost, now);
        now += budget.wait;
        client_side.queue_request_at(RequestId::new(i), cost, now);

        let admission = server_side.accept_request_at(now);
        assert!(admission.admitted);
        let processed = server_side.request_processed_at(cost, now);
        client_side.got_reply_at(RequestId::new(i), processed.buffer_value, now);

        // With no other requests in flight, reconciliation adopts the
        // authoritative value exactly.
        assert_eq!(client_side.buffer_estimate(), processed.buffer_value);
        now += Duration::from_millis(1);
    }
}
