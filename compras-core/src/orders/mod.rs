//! Purchase orders: amount calculation and the creation transaction

mod coordinator;
pub mod money;

pub use coordinator::OrderService;
pub use money::{OrderTotals, compute_totals};
