//! Project tree configuration and run planning.
//!
//! The project tree is a JSON object mapping project names to
//! [`ProjectNode`]s. Composite projects list children in `project_list`
//! (or `project_list_<arch>`); leaf projects point at a CMake source
//! directory. [`Planner`] walks the tree for one run and produces the
//! ordered [`PlannedStep`]s.

mod node;
mod plan;
mod tree;

pub use node::ProjectNode;
pub use plan::{PlannedStep, Planner};
pub use tree::ProjectTree;
