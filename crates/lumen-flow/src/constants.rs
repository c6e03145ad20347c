//! Flow-control timing constants.

use std::time::Duration;

/// Granularity of all recharge and wait arithmetic.
///
/// Buffer credits accrue in whole multiples of this constant;
/// sub-constant remainders truncate.
pub const TIME_CONSTANT: Duration = Duration::from_millis(1);

/// Extra drain a sender budgets for when deciding whether a request fits.
///
/// Inflating the cost by one time constant's worth of recharge absorbs
/// clock skew and scheduling jitter around borderline admission decisions.
pub const SAFETY_MARGIN: Duration = Duration::from_millis(1);
