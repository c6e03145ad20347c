//! Handshake field list and the flow-control fields it carries.
//!
//! The handshake is a keyed list of values exchanged when a link comes
//! up. Its wire encoding belongs to the transport layer; this module
//! defines the list itself, the three flow-control keys, and the typed
//! extraction a client performs on the server's announcement.

use crate::cost::{CostList, CostTable};
use crate::error::HandshakeError;
use crate::params::FlowParams;

/// Handshake key announcing the buffer ceiling (`buf_limit`).
pub const KEY_BUFFER_LIMIT: &str = "flowControl/BL";
/// Handshake key announcing the minimum recharge rate (`min_recharge`).
pub const KEY_MIN_RECHARGE: &str = "flowControl/MRR";
/// Handshake key announcing the maximum request cost table.
pub const KEY_COST_TABLE: &str = "flowControl/MRC";

/// One handshake field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Uint(u64),
    Costs(CostList),
}

/// An ordered list of `(key, value)` handshake fields.
///
/// Lookups take the last match for a key, so a later duplicate
/// overwrites an earlier one, as if the list had been folded into a map
/// front to back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldList(Vec<(&'static str, FieldValue)>);

impl FieldList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn add(&mut self, key: &'static str, value: FieldValue) {
        self.0.push((key, value));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn get(&self, key: &str) -> Option<&FieldValue> {
        self.0.iter().rev().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn get_uint(&self, key: &'static str) -> Result<u64, HandshakeError> {
        match self.get(key) {
            Some(FieldValue::Uint(v)) => Ok(*v),
            Some(_) => Err(HandshakeError::WrongType(key)),
            None => Err(HandshakeError::MissingField(key)),
        }
    }

    pub fn get_costs(&self, key: &'static str) -> Result<&CostList, HandshakeError> {
        match self.get(key) {
            Some(FieldValue::Costs(list)) => Ok(list),
            Some(_) => Err(HandshakeError::WrongType(key)),
            None => Err(HandshakeError::MissingField(key)),
        }
    }
}

/// The flow-control half of a server's handshake announcement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowHandshake {
    pub params: FlowParams,
    pub costs: CostTable,
}

impl FlowHandshake {
    /// Build the fields a server appends to its handshake list.
    pub fn to_fields(&self) -> FieldList {
        let mut fields = FieldList::new();
        fields.add(KEY_BUFFER_LIMIT, FieldValue::Uint(self.params.buf_limit));
        fields.add(KEY_MIN_RECHARGE, FieldValue::Uint(self.params.min_recharge));
        fields.add(KEY_COST_TABLE, FieldValue::Costs(self.costs.encode()));
        fields
    }

    /// Extract and validate the flow fields of a received handshake list.
    pub fn from_fields(fields: &FieldList) -> Result<Self, HandshakeError> {
        let params = FlowParams {
            buf_limit: fields.get_uint(KEY_BUFFER_LIMIT)?,
            min_recharge: fields.get_uint(KEY_MIN_RECHARGE)?,
        };
        params.validate()?;
        let costs = fields.get_costs(KEY_COST_TABLE)?.decode();
        Ok(Self { params, costs })
    }
}
