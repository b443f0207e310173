//! Graph compiler and execution engine.
//!
//! A graph is a set of named nodes (each wrapping an executor capability)
//! connected by at most one outgoing edge per node, either direct or
//! decision-driven. [`GraphBuilder`] collects nodes and edges and validates
//! them into an immutable [`Graph`]; [`Engine`] drives a conversation
//! [`State`](trellis_core::State) through the graph until the terminal
//! sentinel or the step budget.

pub mod builder;
pub mod edge;
pub mod engine;
pub mod fallback;
pub mod node;
pub mod registry;

pub use builder::{Graph, GraphBuilder};
pub use edge::{normalize_token, ConditionalEdge, Edge, RouteDecider};
pub use engine::{Engine, RunError};
pub use fallback::{FallbackPolicy, KeywordRule};
pub use node::NodeExecutor;
pub use registry::NodeRegistry;
