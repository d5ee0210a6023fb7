//! Single-column sorting.
//!
//! One column is active at a time. Locally the engine reorders the working
//! rows; in remote mode it contributes `sort` and `direction` to the
//! outgoing query.

mod compare;
mod engine;

pub use compare::compare_values;
pub use engine::{SortEngine, SortIndicator, SortState};
