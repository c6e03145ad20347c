//! Per-peer flow-control state for both sides of a link.
//!
//! A node serving light clients holds a [`ServingPeer`] per connection;
//! a light client holds a [`RemotePeer`] per server it talks to. Both
//! are created when the handshake completes and dropped with the
//! connection; no flow state survives a disconnect.

use std::sync::Arc;
use std::time::Duration;

use lumen_core::{
    CostTable, FieldList, FlowHandshake, FlowParams, MessageCode, ReplyHeader, RequestId,
};
use lumen_flow::{Admission, ClientManager, ClientTracker, SendBudget, ServerTracker};

use crate::error::NodeError;

/// A server's flow-control view of one connected light client.
pub struct ServingPeer {
    tracker: ClientTracker,
    announced: FlowHandshake,
}

impl ServingPeer {
    /// Serve a client under the given announced parameters, with every
    /// request admitted unconditionally.
    pub fn new(params: FlowParams, costs: CostTable) -> Self {
        Self {
            tracker: ClientTracker::new(params),
            announced: FlowHandshake { params, costs },
        }
    }

    /// Serve a client with admission and accounting delegated to a
    /// fleet-wide manager.
    pub fn with_manager(
        params: FlowParams,
        costs: CostTable,
        manager: Arc<dyn ClientManager>,
    ) -> Self {
        Self {
            tracker: ClientTracker::with_manager(params, manager),
            announced: FlowHandshake { params, costs },
        }
    }

    /// The flow fields this node appends to its handshake list.
    pub fn announcement(&self) -> FieldList {
        self.announced.to_fields()
    }

    pub fn params(&self) -> FlowParams {
        self.announced.params
    }

    pub fn tracker(&self) -> &ClientTracker {
        &self.tracker
    }

    /// Admission check for a request that just arrived.
    pub fn accept_request(&self) -> Admission {
        self.tracker.accept_request()
    }

    /// Cost charged for serving `amount` items of `code`, as announced.
    pub fn served_cost(&self, code: MessageCode, amount: u64) -> Result<u64, NodeError> {
        self.announced
            .costs
            .cost(code, amount, self.announced.params.buf_limit)
            .ok_or(NodeError::UnknownMessageCode(code))
    }

    /// Charge a served request and build the flow fields of its reply.
    pub fn request_served(
        &self,
        req_id: RequestId,
        code: MessageCode,
        amount: u64,
    ) -> Result<ReplyHeader, NodeError> {
        let cost = self.served_cost(code, amount)?;
        let processed = self.tracker.request_processed(cost);
        tracing::trace!(
            %req_id,
            %code,
            cost,
            real_cost = processed.real_cost,
            bv = processed.buffer_value,
            "peer: request served"
        );
        Ok(ReplyHeader {
            req_id,
            bv: processed.buffer_value,
        })
    }
}

/// A light client's flow-control view of one connected server.
pub struct RemotePeer {
    params: FlowParams,
    costs: CostTable,
    tracker: ServerTracker,
}

impl RemotePeer {
    /// Apply the flow fields of a server's handshake announcement.
    pub fn from_handshake(fields: &FieldList) -> Result<Self, NodeError> {
        let handshake = FlowHandshake::from_fields(fields)?;
        tracing::debug!(
            buf_limit = handshake.params.buf_limit,
            min_recharge = handshake.params.min_recharge,
            costs = handshake.costs.len(),
            "peer: flow parameters negotiated"
        );
        Ok(Self {
            params: handshake.params,
            tracker: ServerTracker::new(handshake.params),
            costs: handshake.costs,
        })
    }

    pub fn params(&self) -> FlowParams {
        self.params
    }

    pub fn tracker(&self) -> &ServerTracker {
        &self.tracker
    }

    /// Maximum cost of a request for `amount` items of `code`, clamped
    /// to the announced buffer limit.
    pub fn request_cost(&self, code: MessageCode, amount: u64) -> Result<u64, NodeError> {
        self.costs
            .cost(code, amount, self.params.buf_limit)
            .ok_or(NodeError::UnknownMessageCode(code))
    }

    /// Minimum wait before a request of the given cost may be sent.
    pub fn wait_before(&self, max_cost: u64) -> SendBudget {
        self.tracker.can_send(max_cost)
    }

    /// Record a request the moment it goes on the wire, in wire order.
    pub fn queue_request(&self, req_id: RequestId, max_cost: u64) {
        self.tracker.queue_request(req_id, max_cost);
    }

    /// Resync the estimate from a reply's flow fields.
    pub fn reply_received(&self, header: ReplyHeader) {
        self.tracker.got_reply(header.req_id, header.bv);
    }

    /// Drop bookkeeping for requests whose replies never arrived.
    pub fn purge_pending(&self, max_age: Duration) -> usize {
        self.tracker.purge_pending(max_age)
    }
}
