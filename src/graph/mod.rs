//! Graph store, force layout and visual reducers.

pub mod layout;
pub mod quadtree;
pub mod style;
pub mod types;

pub use layout::LayoutSettings;
pub use types::GraphState;
