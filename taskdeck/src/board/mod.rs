//! Board domain logic.
//!
//! Everything that decides what the board looks like and what gets
//! persisted lives here, free of any terminal or network concern:
//!
//! - [`project`]: derives per-column task sequences from the flat list.
//! - [`order`]: position arithmetic for intra-column reordering.
//! - [`drag`]: drag session vocabulary (phases, targets, origin).
//! - [`hit`]: pointer collision testing against drawn regions.
//! - [`engine`]: the optimistic mutation engine tying it all together.

pub mod drag;
pub mod engine;
pub mod hit;
pub mod order;
pub mod project;

pub use drag::{DragOrigin, DragPhase, DropTarget};
pub use engine::{BoardEngine, Notice, StoreCommand};
pub use hit::HitMap;
pub use project::ColumnView;
