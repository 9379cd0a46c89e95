//! Deduplication of bibliography entries by `ref_id`.

use std::collections::{HashMap, HashSet};

use crate::models::BibliographyEntry;

/// Find entries sharing a `ref_id`
///
/// Returns groups of indices (ascending) for every `ref_id` that occurs more
/// than once, ordered by the position of each group's first member.
pub fn find_duplicates(entries: &[BibliographyEntry]) -> Vec<Vec<usize>> {
    let mut by_ref: HashMap<&str, Vec<usize>> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();

    for (idx, entry) in entries.iter().enumerate() {
        let indices = by_ref.entry(entry.ref_id.as_str()).or_default();
        if indices.is_empty() {
            order.push(entry.ref_id.as_str());
        }
        indices.push(idx);
    }

    order
        .into_iter()
        .filter_map(|ref_id| by_ref.remove(ref_id))
        .filter(|group| group.len() > 1)
        .collect()
}

/// Remove entries whose `ref_id` repeats, keeping the first of each group
///
/// Survivors keep their order. Matching is exact string equality; `[1]` and
/// `[ 1]` are different ids.
pub fn deduplicate_bibliography(entries: Vec<BibliographyEntry>) -> Vec<BibliographyEntry> {
    let groups = find_duplicates(&entries);

    if groups.is_empty() {
        return entries;
    }

    let mut to_remove: HashSet<usize> = HashSet::new();
    for group in groups {
        for &idx in &group[1..] {
            tracing::debug!(
                "Dropping duplicate bibliography entry {}: {}",
                entries[idx].ref_id,
                entries[idx].full_citation
            );
            to_remove.insert(idx);
        }
    }

    entries
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !to_remove.contains(i))
        .map(|(_, e)| e)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ref_id: &str, citation: &str) -> BibliographyEntry {
        BibliographyEntry::new(ref_id, citation)
    }

    fn sample() -> Vec<BibliographyEntry> {
        vec![
            entry("[1]", "A"),
            entry("[2]", "B"),
            entry("[1]", "A again"),
            entry("[3]", "C"),
            entry("[2]", "B again"),
        ]
    }

    #[test]
    fn test_find_duplicates() {
        assert_eq!(find_duplicates(&sample()), vec![vec![0, 2], vec![1, 4]]);
        assert!(find_duplicates(&[entry("[1]", "A"), entry("[2]", "B")]).is_empty());
    }

    #[test]
    fn test_deduplicate_keep_first() {
        let deduped = deduplicate_bibliography(sample());
        assert_eq!(
            deduped,
            vec![entry("[1]", "A"), entry("[2]", "B"), entry("[3]", "C")]
        );
    }

    #[test]
    fn test_no_duplicates_unchanged() {
        let entries = vec![entry("[2]", "B"), entry("[1]", "A")];
        assert_eq!(
            deduplicate_bibliography(entries.clone()),
            entries
        );
        assert!(deduplicate_bibliography(Vec::new()).is_empty());
    }
}
