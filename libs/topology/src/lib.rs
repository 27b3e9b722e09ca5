//! # gas-topology
//!
//! Topology and constraint resolution for GPU-aware Kubernetes scheduling.
//!
//! Given the Pod and Node snapshots of one scheduling evaluation, this crate
//! resolves which GPU tiles a pod's containers may use and which ones they
//! should prefer. It never talks to the cluster and never decides node
//! fitness; filter, score and bind logic consume its results.
//!
//! ## Components
//!
//! - **Label codec** (`labels`): node labels to disabled, descheduled and
//!   preferred tile mappings
//! - **Tile sanitizer and combiner** (`tiles`): drop tiles the node does not
//!   have, fold descheduled into disabled
//! - **PCI group resolver** (`pci`): cards sharing a PCI switch, treated as
//!   one allocation unit
//! - **Resource request extractor** (`requests`): per-container GPU requests
//!   and the same-GPU index
//! - **Preferred-tile reorderer** (`reorder`)
//! - **Tile annotation decoder** (`annotations`): tiles committed by an
//!   earlier scheduling pass
//! - **Presence predicates** (`predicates`): early-exit gates
//!
//! ## Tolerant Decoding
//!
//! Malformed or missing metadata means "no constraint". Decoders skip the
//! offending label, clause or tile and keep going; nothing here returns an
//! error for bad cluster metadata. All functions are pure over their inputs
//! and safe to call concurrently.

mod annotations;
mod error;
mod labels;
mod macros;
mod node;
mod pci;
mod predicates;
mod quantity;
mod reorder;
mod requests;
mod tiles;

pub use annotations::*;
pub use error::{TopologyError, TopologyResult};
pub use labels::*;
pub use node::*;
pub use pci::*;
pub use predicates::*;
pub use quantity::*;
pub use reorder::*;
pub use requests::*;
pub use tiles::*;

/// Prefix of every GPU resource name.
pub const RESOURCE_PREFIX: &str = "gpu.intel.com/";

/// Resource advertised by the GPU device plugin, one unit per card.
pub const GPU_PLUGIN_RESOURCE: &str = "gpu.intel.com/i915";

/// Resource counting all tiles on a node.
pub const TILES_RESOURCE: &str = "gpu.intel.com/tiles";

/// Node label describing PCI groups.
pub const PCI_GROUP_LABEL: &str = "gpu.intel.com/pci-groups";
