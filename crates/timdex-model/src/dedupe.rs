use std::collections::HashSet;
use std::hash::Hash;

/// Remove exact duplicates, keeping the first occurrence of each value.
pub fn dedupe<T>(items: Vec<T>) -> Vec<T>
where
    T: Eq + Hash + Clone,
{
    let mut seen = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

pub(crate) fn dedupe_slot<T>(slot: &mut Option<Vec<T>>)
where
    T: Eq + Hash + Clone,
{
    if let Some(items) = slot.take() {
        *slot = Some(dedupe(items));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_first_occurrence_order() {
        let items = vec!["b", "a", "b", "c", "a"];
        assert_eq!(dedupe(items), vec!["b", "a", "c"]);
    }

    #[test]
    fn empty_slot_stays_empty() {
        let mut slot: Option<Vec<String>> = None;
        dedupe_slot(&mut slot);
        assert!(slot.is_none());
    }
}
