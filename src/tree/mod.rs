//! The graph layout and expansion engine: a node/edge store with base physics, the family
//! expansion state machine and the genealogical constraints, tweening and highlighting on top.

pub mod bloodline;
pub mod config;
pub mod constraints;
mod expand;
pub mod node;
mod overlap;
pub mod physics;
pub mod session;
mod state;
pub mod store;
pub mod trigger;
pub mod tween;
pub mod union;

pub use bloodline::{Bloodline, trace};
pub use config::{LayoutConfig, PhysicsConfig};
pub use expand::ExpansionController;
pub use node::{Edge, EdgeKind, GraphNode, NodeKind, NodeStyle, TriggerKind, UnionState};
pub use overlap::plan_level;
pub use state::TreeState;
pub use store::GraphStore;
