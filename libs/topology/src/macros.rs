//! Macros for defining typed tile-state mappings.

/// Macro to define a typed tile-state mapping.
///
/// This generates a newtype wrapper around [`TileMap`](crate::TileMap) with:
/// - A `STATE` constant naming the tile state it records
/// - `Deref`/`DerefMut` to the underlying [`TileMap`](crate::TileMap)
/// - `From<TileMap>` and `into_inner()` conversions
/// - `sanitized()` dropping tiles the node does not have
/// - Transparent `Serialize`
///
/// Distinct wrappers keep disabled, descheduled and preferred mappings from
/// being passed where another is expected.
///
/// # Example
///
/// ```ignore
/// define_tile_map!(DisabledTiles, "disabled");
///
/// let mut disabled = DisabledTiles::new();
/// disabled.push("card0", 1);
/// ```
macro_rules! define_tile_map {
    ($name:ident, $state:literal) => {
        #[doc = concat!("Card to tile-index mapping for tiles in the `", $state, "` state.")]
        #[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
        #[serde(transparent)]
        pub struct $name($crate::TileMap);

        impl $name {
            /// The tile state recorded by this mapping.
            pub const STATE: &'static str = $state;

            /// Creates an empty mapping.
            #[must_use]
            pub fn new() -> Self {
                Self::default()
            }

            /// Returns the untyped mapping.
            #[must_use]
            pub fn into_inner(self) -> $crate::TileMap {
                self.0
            }

            /// Returns a copy without tiles at or beyond `tiles_per_gpu`.
            #[must_use]
            pub fn sanitized(&self, tiles_per_gpu: $crate::TileIndex) -> Self {
                Self(self.0.sanitized(tiles_per_gpu))
            }
        }

        impl std::ops::Deref for $name {
            type Target = $crate::TileMap;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl std::ops::DerefMut for $name {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut self.0
            }
        }

        impl From<$crate::TileMap> for $name {
            fn from(map: $crate::TileMap) -> Self {
                Self(map)
            }
        }

        impl<C: Into<String>> FromIterator<(C, Vec<$crate::TileIndex>)> for $name {
            fn from_iter<I: IntoIterator<Item = (C, Vec<$crate::TileIndex>)>>(iter: I) -> Self {
                Self(iter.into_iter().collect())
            }
        }
    };
}

pub(crate) use define_tile_map;
