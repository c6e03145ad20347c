//! Flow-control parameters advertised by a server at handshake.

use crate::error::ParamError;

/// The immutable per-link flow parameters a server announces to a client.
///
/// `buf_limit` is the buffer ceiling and the initial buffer value;
/// `min_recharge` is the guaranteed recharge rate in buffer units per
/// time constant (one millisecond).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowParams {
    pub buf_limit: u64,
    pub min_recharge: u64,
}

impl FlowParams {
    pub const fn new(buf_limit: u64, min_recharge: u64) -> Self {
        Self {
            buf_limit,
            min_recharge,
        }
    }

    /// Reject parameter sets the flow-control arithmetic cannot run on.
    ///
    /// A zero recharge rate would make every wait computation divide by
    /// zero; a zero buffer limit admits no request at all.
    pub fn validate(&self) -> Result<(), ParamError> {
        if self.buf_limit == 0 {
            return Err(ParamError::ZeroBufferLimit);
        }
        if self.min_recharge == 0 {
            return Err(ParamError::ZeroRechargeRate);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_params() {
        assert!(FlowParams::new(1000, 100).validate().is_ok());
    }

    #[test]
    fn test_zero_buffer_limit_rejected() {
        assert_eq!(
            FlowParams::new(0, 100).validate(),
            Err(ParamError::ZeroBufferLimit)
        );
    }

    #[test]
    fn test_zero_recharge_rejected() {
        assert_eq!(
            FlowParams::new(1000, 0).validate(),
            Err(ParamError::ZeroRechargeRate)
        );
    }
}
