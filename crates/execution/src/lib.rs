// In crates/execution/src/lib.rs

use rust_decimal::Decimal;

pub mod error;
pub mod simulated;
pub mod types;

// Re-export public types
pub use error::{Error, Result};
pub use simulated::SimulatedExecutor;
pub use types::{Execution, OrderRequest, OrderSide, Portfolio, Position, SimulationSettings};

/// The universal interface for an execution handler.
///
/// An `Executor` takes an `OrderRequest` and fills it against a price,
/// updating the portfolio it is given.
pub trait Executor {
    /// The name of the executor (e.g., "SimulatedExecutor").
    fn name(&self) -> &'static str;

    /// Fills an order at `current_price`.
    ///
    /// Returns the fill and, when the order closed a position, that position.
    fn execute(
        &mut self,
        order_request: &OrderRequest,
        current_price: Decimal,
        current_time: chrono::DateTime<chrono::Utc>,
        portfolio: &mut Portfolio,
    ) -> Result<(Execution, Option<Position>)>;
}
