//! Per-node tile geometry and the usable-tile view.

use k8s_openapi::api::core::v1::Node;
use serde::Serialize;

use crate::labels::TileLabels;
use crate::quantity::quantity_as_i64;
use crate::tiles::{combine_mappings, sanitize_tiles, DisabledTiles, PreferredTiles, TileIndex};
use crate::{GPU_PLUGIN_RESOURCE, TILES_RESOURCE};

fn capacity_of(node: &Node, resource: &str) -> Option<i64> {
    node.status
        .as_ref()
        .and_then(|s| s.capacity.as_ref())
        .and_then(|c| c.get(resource))
        .and_then(|q| quantity_as_i64(q).ok())
}

/// Number of GPUs the node advertises, 0 when unknown.
pub fn gpu_count(node: &Node) -> i64 {
    capacity_of(node, GPU_PLUGIN_RESOURCE).unwrap_or(0).max(0)
}

/// Tiles per GPU, derived from the node's tile and GPU capacities.
///
/// `None` when either capacity is missing or not positive.
pub fn tiles_per_gpu(node: &Node) -> Option<TileIndex> {
    let gpus = gpu_count(node);
    let tiles = capacity_of(node, TILES_RESOURCE)?;
    if gpus <= 0 || tiles <= 0 {
        return None;
    }
    TileIndex::try_from(tiles / gpus).ok().filter(|&n| n > 0)
}

/// Tile constraints of a node as the candidate loop consumes them.
///
/// `disabled` holds disabled and descheduled tiles together; `preferred` is
/// kept separate for reordering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NodeTileView {
    pub disabled: DisabledTiles,
    pub preferred: PreferredTiles,
}

impl NodeTileView {
    /// Build the view using the node's own tile geometry.
    pub fn from_node(node: &Node) -> Self {
        Self::with_tiles_per_gpu(node, tiles_per_gpu(node))
    }

    /// Build the view, sanitizing against `tiles_per_gpu` when given.
    ///
    /// Without a tile count the mappings are returned unsanitized.
    pub fn with_tiles_per_gpu(node: &Node, tiles_per_gpu: Option<TileIndex>) -> Self {
        let (mut disabled, descheduled, preferred) = TileLabels::from_node(node).into_parts();
        combine_mappings(&descheduled, &mut disabled);

        match tiles_per_gpu {
            Some(count) => Self {
                disabled: sanitize_tiles(&disabled, count),
                preferred: sanitize_tiles(&preferred, count),
            },
            None => Self { disabled, preferred },
        }
    }

    /// Check if a tile is usable, i.e. neither disabled nor descheduled.
    pub fn is_usable(&self, card: &str, tile: TileIndex) -> bool {
        !self.disabled.contains(card, tile)
    }

    /// Usable tiles of a card out of `0..tiles_per_gpu`, preferred ones first.
    pub fn candidate_tiles(&self, card: &str, tiles_per_gpu: TileIndex) -> Vec<TileIndex> {
        let usable: Vec<TileIndex> = (0..tiles_per_gpu)
            .filter(|&tile| self.is_usable(card, tile))
            .collect();
        crate::reorder::reorder_preferred_tiles_first(usable, self.preferred.tiles(card))
    }
}
