//! The linear recharge law shared by both trackers.

use std::time::Duration;

use lumen_core::FlowParams;

use crate::constants::TIME_CONSTANT;

/// Advance a buffer value by `dt` of linear recharge, clamped to the ceiling.
///
/// Credits accrue at `min_recharge` buffer units per [`TIME_CONSTANT`];
/// partial time constants truncate. The caller is responsible for
/// clamping a non-monotone clock reading to `dt = 0`.
pub fn recharge(buf: u64, params: FlowParams, dt: Duration) -> u64 {
    let ticks = dt.as_millis() / TIME_CONSTANT.as_millis();
    let credit = params.min_recharge as u128 * ticks;
    (buf as u128 + credit).min(params.buf_limit as u128) as u64
}
