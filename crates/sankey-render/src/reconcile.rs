//! Keyed enter/update/exit join over an ordered element map.

use indexmap::IndexMap;
use rustc_hash::FxHashSet;

/// Element counts touched by one [`keyed_join`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoinStats {
    pub entered: usize,
    pub updated: usize,
    pub exited: usize,
}

/// Reconciles `existing` against `data`.
///
/// Entries whose key no longer appears are removed. New keys get an element from `enter`,
/// appended in data order. `update` then runs on every entered and retained element, so it
/// must set every mutable attribute. Retained entries keep their position and their element
/// value (and therefore identity).
///
/// Keys are expected to be unique within `data`; a repeated key reuses the element created
/// for its first occurrence and the last datum wins.
pub fn keyed_join<D, E, K, N, U>(
    existing: &mut IndexMap<String, E>,
    data: &[D],
    key_of: K,
    mut enter: N,
    mut update: U,
) -> JoinStats
where
    K: Fn(&D) -> &str,
    N: FnMut(&D) -> E,
    U: FnMut(&mut E, &D),
{
    let mut stats = JoinStats::default();

    let wanted: FxHashSet<&str> = data.iter().map(&key_of).collect();
    let before = existing.len();
    existing.retain(|key, _| wanted.contains(key.as_str()));
    stats.exited = before - existing.len();

    for datum in data {
        let key = key_of(datum);
        match existing.get_mut(key) {
            Some(element) => {
                update(element, datum);
                stats.updated += 1;
            }
            None => {
                let mut element = enter(datum);
                update(&mut element, datum);
                existing.insert(key.to_string(), element);
                stats.entered += 1;
            }
        }
    }

    stats
}
