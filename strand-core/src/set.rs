//! Range-set algebra: resolving an overlapping listing into the valid set.

use std::cmp::Ordering;

use crate::range::RangeName;

/// Resolves a range list into a set of non-overlapping ranges.
///
/// While any two ranges overlap, the one with the lower term is removed
/// and the scan restarts. When terms are equal (possible transiently
/// when two controllers raced), the loser is chosen deterministically:
/// smaller `rand` first, then smaller file name by byte order.
///
/// The function is generic over the carrier item so callers can keep
/// file names and observed write rates attached to each range; `range_of`
/// projects the [`RangeName`] out of an item.
///
/// Applying the resolution twice gives the same result as applying it
/// once: the output contains no overlapping pair.
pub fn remove_stale<T, F>(mut items: Vec<T>, range_of: F) -> Vec<T>
where
    F: Fn(&T) -> RangeName,
{
    'scan: loop {
        for i in 0..items.len() {
            for j in (i + 1)..items.len() {
                let x = range_of(&items[i]);
                let y = range_of(&items[j]);
                if !x.overlaps(&y) {
                    continue;
                }

                let remove_first = match x.term.cmp(&y.term) {
                    Ordering::Less => true,
                    Ordering::Greater => false,
                    Ordering::Equal => {
                        (x.rand, x.file_name()) < (y.rand, y.file_name())
                    }
                };

                items.remove(if remove_first { i } else { j });
                continue 'scan;
            }
        }
        return items;
    }
}
