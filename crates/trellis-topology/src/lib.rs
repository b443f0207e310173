//! Topology strategies over the Trellis graph engine.
//!
//! All three topologies are configurations of the same engine, differing only
//! in node set and edge shape:
//!
//! - [`SupervisorTopology`] is a star: one hub routes to workers, every
//!   worker reports back to the hub.
//! - [`HierarchicalTopology`] is a three-level tree: root delegates to teams,
//!   teams delegate to workers, reports flow back up.
//! - [`NetworkTopology`] is a mesh: every agent may route to any agent
//!   (itself included) or end the run.
//!
//! [`TopologyCatalog`] holds compiled graphs by id and exposes the
//! `run(graph_id, messages)` entry point.

pub mod catalog;
pub mod hierarchy;
pub mod network;
pub mod node;
pub mod supervisor;

pub use catalog::TopologyCatalog;
pub use hierarchy::{HierarchicalTopology, TeamSpec};
pub use network::NetworkTopology;
pub use node::{AgentNode, HintRouter};
pub use supervisor::{SupervisorTopology, WorkerSpec};
