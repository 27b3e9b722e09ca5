//! Tile-state mappings, the mapping combiner and the tile sanitizer.
//!
//! A tile-state mapping records, per card identifier (`card<N>`), the tile
//! indices that are in one state (disabled, descheduled or preferred). The
//! mappings accumulate: a card may carry several tiles, and the same tile may
//! appear twice when sources overlap. Deduplication is left to consumers.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::ops::Deref;

use serde::Serialize;
use tracing::warn;

use crate::macros::define_tile_map;

/// A 0-based tile index within a card.
pub type TileIndex = u32;

/// Untyped card to tile-index mapping shared by all tile states.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TileMap {
    /// Tiles per card identifier, in insertion order per card.
    inner: BTreeMap<String, Vec<TileIndex>>,
}

impl TileMap {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a tile to a card, creating the card entry if absent.
    pub fn push(&mut self, card: impl Into<String>, tile: TileIndex) {
        self.inner.entry(card.into()).or_default().push(tile);
    }

    /// Tiles recorded for a card, empty if the card is unknown.
    pub fn tiles(&self, card: &str) -> &[TileIndex] {
        self.inner.get(card).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Check if the card has an entry (possibly with no tiles).
    pub fn contains_card(&self, card: &str) -> bool {
        self.inner.contains_key(card)
    }

    /// Check if a specific tile of a card is recorded.
    pub fn contains(&self, card: &str, tile: TileIndex) -> bool {
        self.tiles(card).contains(&tile)
    }

    /// Card identifiers in sorted order.
    pub fn cards(&self) -> impl Iterator<Item = &str> {
        self.inner.keys().map(String::as_str)
    }

    /// Iterate over `(card, tiles)` pairs in card order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[TileIndex])> {
        self.inner.iter().map(|(c, t)| (c.as_str(), t.as_slice()))
    }

    /// Number of cards with an entry.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Check if no card has an entry.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Append every tile list of `source` to the same card in `self`.
    pub fn extend_from(&mut self, source: &TileMap) {
        for (card, tiles) in &source.inner {
            self.inner
                .entry(card.clone())
                .or_default()
                .extend_from_slice(tiles);
        }
    }

    /// Copy of this mapping without tiles at or beyond `tiles_per_gpu`.
    ///
    /// Card entries are kept even when all their tiles are dropped.
    pub fn sanitized(&self, tiles_per_gpu: TileIndex) -> TileMap {
        let mut sanitized = BTreeMap::new();

        for (card, tiles) in &self.inner {
            let mut kept = Vec::with_capacity(tiles.len());
            for &tile in tiles {
                if tile < tiles_per_gpu {
                    kept.push(tile);
                } else {
                    warn!(card = %card, tile, tiles_per_gpu, "Skipping a non-existing tile");
                }
            }
            sanitized.insert(card.clone(), kept);
        }

        TileMap { inner: sanitized }
    }
}

impl<C: Into<String>> FromIterator<(C, Vec<TileIndex>)> for TileMap {
    fn from_iter<I: IntoIterator<Item = (C, Vec<TileIndex>)>>(iter: I) -> Self {
        let mut map = TileMap::new();
        for (card, tiles) in iter {
            map.inner.entry(card.into()).or_default().extend(tiles);
        }
        map
    }
}

impl<'a> IntoIterator for &'a TileMap {
    type Item = (&'a String, &'a Vec<TileIndex>);
    type IntoIter = btree_map::Iter<'a, String, Vec<TileIndex>>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

define_tile_map!(DisabledTiles, "disabled");
define_tile_map!(DescheduledTiles, "descheduled");
define_tile_map!(PreferredTiles, "preferred");

/// Fold `source` into `dest`, appending tiles per card without deduplication.
///
/// Used to merge descheduled tiles into the disabled mapping for consumers
/// that only distinguish usable from unusable tiles.
pub fn combine_mappings(source: &TileMap, dest: &mut TileMap) {
    dest.extend_from(source);
}

/// Drop tiles at or beyond `tiles_per_gpu` from any typed mapping.
///
/// Out-of-range tiles come from labels describing a GPU that has since been
/// reconfigured or replaced; each one is logged at `warn` and skipped.
pub fn sanitize_tiles<M>(tiles: &M, tiles_per_gpu: TileIndex) -> M
where
    M: Deref<Target = TileMap> + From<TileMap>,
{
    M::from(tiles.sanitized(tiles_per_gpu))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_accumulates_per_card() {
        let mut map = TileMap::new();
        map.push("card0", 1);
        map.push("card0", 3);
        map.push("card2", 0);

        assert_eq!(map.tiles("card0"), &[1, 3]);
        assert_eq!(map.tiles("card2"), &[0]);
        assert!(map.tiles("card9").is_empty());
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_combine_appends_without_dedup() {
        let source: TileMap = [("card0", vec![1])].into_iter().collect();
        let mut dest: TileMap = [("card0", vec![2])].into_iter().collect();

        combine_mappings(&source, &mut dest);

        assert_eq!(dest.tiles("card0"), &[2, 1]);
    }

    #[test]
    fn test_combine_keeps_duplicates_and_creates_cards() {
        let source: TileMap = [("card0", vec![1]), ("card1", vec![0])].into_iter().collect();
        let mut dest: TileMap = [("card0", vec![1])].into_iter().collect();

        combine_mappings(&source, &mut dest);

        assert_eq!(dest.tiles("card0"), &[1, 1]);
        assert_eq!(dest.tiles("card1"), &[0]);
    }

    #[test]
    fn test_combine_typed_mappings() {
        let descheduled: DescheduledTiles = [("card1", vec![2])].into_iter().collect();
        let mut disabled: DisabledTiles = [("card0", vec![0])].into_iter().collect();

        combine_mappings(&descheduled, &mut disabled);

        assert!(disabled.contains("card0", 0));
        assert!(disabled.contains("card1", 2));
    }

    #[test]
    fn test_sanitize_drops_out_of_range_tiles() {
        let disabled: DisabledTiles = [("card0", vec![0, 1, 9])].into_iter().collect();

        let sanitized = sanitize_tiles(&disabled, 8);

        assert_eq!(sanitized.tiles("card0"), &[0, 1]);
    }

    #[test]
    fn test_sanitize_keeps_emptied_cards() {
        let preferred: PreferredTiles = [("card3", vec![4])].into_iter().collect();

        let sanitized = preferred.sanitized(2);

        assert!(sanitized.contains_card("card3"));
        assert!(sanitized.tiles("card3").is_empty());
    }

    #[test]
    fn test_typed_mapping_serializes_as_plain_map() {
        let disabled: DisabledTiles = [("card0", vec![1, 2])].into_iter().collect();

        let json = serde_json::to_value(&disabled).unwrap();

        assert_eq!(json, serde_json::json!({"card0": [1, 2]}));
        assert_eq!(DisabledTiles::STATE, "disabled");
    }
}
