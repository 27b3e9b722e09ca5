//! Node label codec for tile states.
//!
//! Tile states are published as namespaced node labels:
//!
//! ```text
//! telemetry.aware.scheduling.<policy>/gas-tile-disable-card0_gt1=<any>
//! telemetry.aware.scheduling.<policy>/gas-tile-deschedule-card1_gt0=<any>
//! telemetry.aware.scheduling.<policy>/gas-tile-preference-card0=gt3
//! ```
//!
//! Decoding is tolerant: labels outside the namespace, unknown names and
//! malformed card/tile tokens are skipped, never reported as errors.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use k8s_openapi::api::core::v1::Node;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::error::{TopologyError, TopologyResult};
use crate::tiles::{
    combine_mappings, DescheduledTiles, DisabledTiles, PreferredTiles, TileIndex,
};

/// Namespace prefix of tile-state labels.
pub const LABEL_NAMESPACE_PREFIX: &str = "telemetry.aware.scheduling.";

/// Label name prefix for disabled tiles.
pub const TILE_DISABLE_LABEL_PREFIX: &str = "gas-tile-disable-";

/// Label name prefix for descheduled tiles.
pub const TILE_DESCHEDULE_LABEL_PREFIX: &str = "gas-tile-deschedule-";

/// Label name prefix for preferred tiles. The label value carries the tile.
pub const TILE_PREFERENCE_LABEL_PREFIX: &str = "gas-tile-preference-";

/// Number of `/`-separated segments in a namespaced label.
const NAMESPACED_LABEL_PARTS: usize = 2;

static CARD_TILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^card([0-9]+)_gt([0-9]+)$").expect("card/tile pattern is a valid regex")
});

/// A card identifier paired with one of its tiles.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CardTile {
    /// Card identifier, `card<N>`.
    pub card: String,

    /// Tile index within the card.
    pub tile: TileIndex,
}

impl CardTile {
    /// Parse a `card<N>_gt<M>` token.
    pub fn parse(combo: &str) -> TopologyResult<Self> {
        let captures = CARD_TILE_RE
            .captures(combo)
            .ok_or_else(|| TopologyError::InvalidCardTile(combo.to_string()))?;

        let tile = captures[2]
            .parse::<TileIndex>()
            .map_err(|_| TopologyError::InvalidTileIndex(captures[2].to_string()))?;

        Ok(Self {
            card: format!("card{}", &captures[1]),
            tile,
        })
    }
}

/// The three tile-state mappings decoded from one node's labels.
///
/// The states are kept separate here; folding descheduled into disabled is
/// the caller's choice (see [`disabled_tile_mapping`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TileLabels {
    pub disabled: DisabledTiles,
    pub descheduled: DescheduledTiles,
    pub preferred: PreferredTiles,
}

impl TileLabels {
    /// Decode tile states from a label mapping.
    pub fn from_labels(labels: &BTreeMap<String, String>) -> Self {
        let mut decoded = Self::default();

        for (label, value) in labels {
            let Some(name) = label_without_namespace(label) else {
                continue;
            };

            if let Some(combo) = name.strip_prefix(TILE_DISABLE_LABEL_PREFIX) {
                if let Some(ct) = parse_or_skip(label, combo) {
                    decoded.disabled.push(ct.card, ct.tile);
                }
            } else if let Some(combo) = name.strip_prefix(TILE_DESCHEDULE_LABEL_PREFIX) {
                if let Some(ct) = parse_or_skip(label, combo) {
                    decoded.descheduled.push(ct.card, ct.tile);
                }
            } else if let Some(card) = name.strip_prefix(TILE_PREFERENCE_LABEL_PREFIX) {
                let combo = format!("{card}_{value}");
                if let Some(ct) = parse_or_skip(label, &combo) {
                    decoded.preferred.push(ct.card, ct.tile);
                }
            }
        }

        decoded
    }

    /// Decode tile states from a node's labels.
    pub fn from_node(node: &Node) -> Self {
        Self::from_labels(node_labels(node))
    }

    /// Split into `(disabled, descheduled, preferred)`.
    pub fn into_parts(self) -> (DisabledTiles, DescheduledTiles, PreferredTiles) {
        (self.disabled, self.descheduled, self.preferred)
    }
}

fn parse_or_skip(label: &str, combo: &str) -> Option<CardTile> {
    match CardTile::parse(combo) {
        Ok(ct) => Some(ct),
        Err(e) => {
            debug!(label = %label, error = %e, "Ignoring malformed tile label");
            None
        }
    }
}

/// Decode tile states from a label mapping.
pub fn create_tile_mapping(
    labels: &BTreeMap<String, String>,
) -> (DisabledTiles, DescheduledTiles, PreferredTiles) {
    TileLabels::from_labels(labels).into_parts()
}

/// Tiles that are either disabled or descheduled.
pub fn disabled_tile_mapping(labels: &BTreeMap<String, String>) -> DisabledTiles {
    let (mut disabled, descheduled, _) = create_tile_mapping(labels);
    combine_mappings(&descheduled, &mut disabled);
    disabled
}

/// Disabled-or-descheduled tiles, and preferred tiles, as separate mappings.
pub fn disabled_and_preferred_tile_mapping(
    labels: &BTreeMap<String, String>,
) -> (DisabledTiles, PreferredTiles) {
    let (mut disabled, descheduled, preferred) = create_tile_mapping(labels);
    combine_mappings(&descheduled, &mut disabled);
    (disabled, preferred)
}

/// Strip the tile-state namespace from a label name.
///
/// Returns `None` unless the label starts with the namespace prefix and has
/// exactly two `/`-separated segments.
pub fn label_without_namespace(label: &str) -> Option<&str> {
    if !label.starts_with(LABEL_NAMESPACE_PREFIX) {
        return None;
    }

    let parts: Vec<&str> = label.split('/').collect();
    if parts.len() == NAMESPACED_LABEL_PARTS {
        Some(parts[1])
    } else {
        None
    }
}

/// Reassemble a label value split over `name`, `name2`, `name3`, ...
///
/// Label values have a length ceiling, so long values continue in labels with
/// a running numeric postfix starting at 2. Reassembly stops at the first
/// missing postfix; a gap ends the value even if later parts exist.
pub fn concatenate_split_label(labels: &BTreeMap<String, String>, name: &str) -> String {
    let mut value = labels.get(name).cloned().unwrap_or_default();

    let mut postfix = 2;
    while let Some(continued) = labels.get(&format!("{name}{postfix}")) {
        value.push_str(continued);
        postfix += 1;
    }

    value
}

/// A node's labels, empty when the node has none.
pub(crate) fn node_labels(node: &Node) -> &BTreeMap<String, String> {
    static EMPTY: BTreeMap<String, String> = BTreeMap::new();
    node.metadata.labels.as_ref().unwrap_or(&EMPTY)
}
