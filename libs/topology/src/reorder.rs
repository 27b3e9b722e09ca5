//! Preferred-tile reordering for candidate enumeration.

/// Move preferred tiles to the front, in preference order.
///
/// For each value of `preferred`, its first occurrence in `tiles` is swapped
/// into the next front position. The tile it displaces takes its old slot,
/// so the non-preferred tiles are not kept in relative order. Preferred values
/// missing from `tiles` are skipped; a value already at or in front of the
/// next position stays where it is and still takes up a front position.
///
/// The list is reordered in place and handed back, so callers own it for the
/// duration of one evaluation. It must not be shared across concurrent
/// scheduling evaluations.
pub fn reorder_preferred_tiles_first<T: PartialEq>(mut tiles: Vec<T>, preferred: &[T]) -> Vec<T> {
    move_preferred_to_front(&mut tiles, preferred);
    tiles
}

/// In-place form of [`reorder_preferred_tiles_first`].
pub fn move_preferred_to_front<T: PartialEq>(tiles: &mut [T], preferred: &[T]) {
    let mut cursor = 0;

    for pref in preferred {
        let Some(index) = tiles.iter().position(|tile| tile == pref) else {
            continue;
        };

        if index > cursor {
            tiles.swap(cursor, index);
        }
        cursor += 1;
    }
}
