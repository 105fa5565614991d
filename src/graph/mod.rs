//! Graph aggregation, data structures and layout.

pub mod aggregate;
pub mod color;
pub mod layout;
pub mod quadtree;
pub mod types;

pub use aggregate::aggregate;
pub use layout::LayoutRun;
pub use types::{GraphData, GraphState};
