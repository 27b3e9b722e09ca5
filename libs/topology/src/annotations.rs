//! Pod annotations: same-GPU container grouping and committed tile choices.
//!
//! The tile annotation records, per container, the card/tile combinations an
//! earlier scheduling pass committed to:
//!
//! ```text
//! annotation ::= container ("|" container)*
//! container  ::= card_tile ("," card_tile)*
//! card_tile  ::= "card" N ":" "gt" M ("+" "gt" M)*
//! ```
//!
//! For example `card0:gt0+gt1,card1:gt2|card0:gt0` decodes to the keys
//! `0.0`, `0.1` and `1.2`. Keys keep the indices as written, so `card007:gt01`
//! decodes to `007.01`.

use std::collections::{BTreeMap, BTreeSet};

use k8s_openapi::api::core::v1::Pod;
use tracing::trace;

use crate::error::{TopologyError, TopologyResult};
use crate::tiles::TileIndex;

/// Annotation listing containers that must share one GPU.
pub const SAME_GPU_ANNOTATION: &str = "gas-same-gpu";

/// Annotation recording the tiles committed for each container.
pub const TILE_ANNOTATION: &str = "gas-container-tiles";

const CONTAINER_SEPARATOR: &str = "|";
const CARD_SEPARATOR: &str = ",";
const CARD_TILE_SEPARATOR: &str = ":";
const TILE_SEPARATOR: &str = "+";
const CARD_PREFIX: &str = "card";
const TILE_PREFIX: &str = "gt";

/// Largest card index [`encode_tile_annotation`] can write and still decode.
pub const MAX_ANNOTATION_INDEX: u16 = i16::MAX as u16;

/// Number of `:`-separated parts in a card clause.
const CARD_CLAUSE_PARTS: usize = 2;

/// Tiles chosen on one card for one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardTiles {
    /// Card index, the `N` of `card<N>`.
    pub card: u16,

    /// Tiles chosen on the card.
    pub tiles: Vec<TileIndex>,
}

impl CardTiles {
    /// Create a card clause.
    pub fn new(card: u16, tiles: impl Into<Vec<TileIndex>>) -> Self {
        Self {
            card,
            tiles: tiles.into(),
        }
    }
}

fn pod_annotations(pod: &Pod) -> &BTreeMap<String, String> {
    static EMPTY: BTreeMap<String, String> = BTreeMap::new();
    pod.metadata.annotations.as_ref().unwrap_or(&EMPTY)
}

/// Container names listed in the pod's same-GPU annotation.
pub fn same_gpu_container_names(pod: &Pod) -> BTreeSet<String> {
    pod_annotations(pod)
        .get(SAME_GPU_ANNOTATION)
        .map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// The pod's tile annotation, if present.
pub fn pod_tile_annotation(pod: &Pod) -> Option<&str> {
    pod_annotations(pod).get(TILE_ANNOTATION).map(String::as_str)
}

/// Decode a tile annotation into `"<card>.<tile>"` keys.
///
/// Clauses without exactly one `:` are skipped, as are card or tile indices
/// that are not signed 16-bit decimals; the rest of the annotation is still
/// decoded. Indices are used verbatim in the keys.
pub fn card_tile_indices(annotation: &str) -> BTreeSet<String> {
    let mut indices = BTreeSet::new();

    for container in annotation.split(CONTAINER_SEPARATOR) {
        for clause in container.split(CARD_SEPARATOR) {
            match parse_card_clause(clause) {
                Ok((card, tiles)) => {
                    for tile in tiles {
                        match tile {
                            Ok(tile) => {
                                indices.insert(format!("{card}.{tile}"));
                            }
                            Err(e) => trace!(clause = %clause, error = %e, "Skipping tile"),
                        }
                    }
                }
                Err(e) => trace!(clause = %clause, error = %e, "Skipping annotation clause"),
            }
        }
    }

    indices
}

/// Decode the tile annotation of a pod, empty if it has none.
pub fn pod_card_tile_indices(pod: &Pod) -> BTreeSet<String> {
    pod_tile_annotation(pod)
        .map(card_tile_indices)
        .unwrap_or_default()
}

/// Split `card<N>:<tiles>` into the validated card index and per-tile results.
fn parse_card_clause(
    clause: &str,
) -> TopologyResult<(&str, impl Iterator<Item = TopologyResult<&str>> + '_)> {
    let parts: Vec<&str> = clause.split(CARD_TILE_SEPARATOR).collect();
    if parts.len() != CARD_CLAUSE_PARTS {
        return Err(TopologyError::MalformedClause(clause.to_string()));
    }

    let card = parts[0]
        .strip_prefix(CARD_PREFIX)
        .filter(|index| is_index(index))
        .ok_or_else(|| TopologyError::InvalidCardIndex(parts[0].to_string()))?;

    let tiles = parts[1].split(TILE_SEPARATOR).map(|tile| {
        let index = tile.strip_prefix(TILE_PREFIX).unwrap_or(tile);
        if is_index(index) {
            Ok(index)
        } else {
            Err(TopologyError::InvalidTileIndex(tile.to_string()))
        }
    });

    Ok((card, tiles))
}

/// Indices are signed decimal numbers within the 16-bit range.
fn is_index(index: &str) -> bool {
    index.parse::<i16>().is_ok()
}

/// Encode per-container card/tile choices in the tile annotation grammar.
pub fn encode_tile_annotation(containers: &[Vec<CardTiles>]) -> String {
    containers
        .iter()
        .map(|cards| {
            cards
                .iter()
                .map(|ct| {
                    let tiles: Vec<String> =
                        ct.tiles.iter().map(|t| format!("{TILE_PREFIX}{t}")).collect();
                    format!(
                        "{CARD_PREFIX}{}{CARD_TILE_SEPARATOR}{}",
                        ct.card,
                        tiles.join(TILE_SEPARATOR)
                    )
                })
                .collect::<Vec<_>>()
                .join(CARD_SEPARATOR)
        })
        .collect::<Vec<_>>()
        .join(CONTAINER_SEPARATOR)
}
