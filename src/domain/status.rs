//! Order lifecycle state machine.
//!
//! `ordered → on_the_way → delivered`, with `cancelled` reachable from the
//! first two states and the return flow
//! (`return_requested → return_received`) reachable from `cancelled` or
//! `delivered`. Customers only get `cancel` and `request_return`; staff may
//! force any enumerated status.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    Ordered,
    OnTheWay,
    Delivered,
    Cancelled,
    ReturnRequested,
    ReturnReceived,
}

impl OrderStatus {
    /// Source states from which a customer cancel is legal. Writes that
    /// enforce the transition must predicate on this same set.
    pub const CANCELLABLE: &'static [OrderStatus] = &[Self::Ordered, Self::OnTheWay];

    /// Source states from which a return may be requested: orders that ended
    /// up cancelled or delivered. Anything still in flight must be cancelled
    /// first.
    pub const RETURNABLE: &'static [OrderStatus] = &[Self::Cancelled, Self::Delivered];

    pub fn can_cancel(self) -> bool {
        Self::CANCELLABLE.contains(&self)
    }

    pub fn can_request_return(self) -> bool {
        Self::RETURNABLE.contains(&self)
    }
}
