//! Title index for identifier-less matching
//!
//! Maps a normalized title key to every entry carrying it, in listing
//! order. Lookups take the first entry: ties are broken by first-seen order,
//! never by merging.

use super::title_normalizer::normalize_title;
use crate::models::PlaylistEntry;
use std::collections::HashMap;

/// Normalized title → entries, built once per scan
#[derive(Debug, Default)]
pub struct TitleIndex {
    by_key: HashMap<String, Vec<PlaylistEntry>>,
}

impl TitleIndex {
    /// Index `entries` in listing order. Titles that normalize to an empty
    /// key are not indexed.
    pub fn build(entries: &[PlaylistEntry]) -> Self {
        let mut by_key: HashMap<String, Vec<PlaylistEntry>> = HashMap::new();
        for entry in entries {
            let key = normalize_title(&entry.title);
            if key.is_empty() {
                continue;
            }
            by_key.entry(key).or_default().push(entry.clone());
        }
        Self { by_key }
    }

    /// All entries under an already-normalized key
    pub fn lookup(&self, key: &str) -> &[PlaylistEntry] {
        if key.is_empty() {
            return &[];
        }
        self.by_key.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Try each raw title in order; the first key with entries wins and its
    /// first entry is returned
    pub fn first_match<'a, I>(&self, raw_titles: I) -> Option<&PlaylistEntry>
    where
        I: IntoIterator<Item = &'a str>,
    {
        raw_titles
            .into_iter()
            .map(normalize_title)
            .find_map(|key| self.lookup(&key).first())
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(position: u32, title: &str) -> PlaylistEntry {
        PlaylistEntry::new(
            position,
            title,
            Some(format!("vid{}", position)),
            format!("PLI_{}", position),
        )
    }

    #[test]
    fn test_multiple_entries_per_key_keep_order() {
        let entries = vec![
            entry(0, "Song (Live)"),
            entry(1, "Other"),
            entry(2, "song [Official Video]"),
        ];
        let index = TitleIndex::build(&entries);

        let hits = index.lookup("song");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].entry_id, "PLI_0");
        assert_eq!(hits[1].entry_id, "PLI_2");
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_first_match_tries_keys_in_order() {
        let entries = vec![entry(0, "Song"), entry(1, "Song Band")];
        let index = TitleIndex::build(&entries);

        let hit = index.first_match(["Song Band", "Song"]).unwrap();
        assert_eq!(hit.entry_id, "PLI_1");

        let hit = index.first_match(["Song Nobody", "Song"]).unwrap();
        assert_eq!(hit.entry_id, "PLI_0");

        assert!(index.first_match(["Missing Nobody", "Missing"]).is_none());
    }

    #[test]
    fn test_empty_keys_never_match() {
        let entries = vec![entry(0, "(Official Video)"), entry(1, "Real")];
        let index = TitleIndex::build(&entries);

        assert_eq!(index.len(), 1);
        assert!(index.lookup("").is_empty());
        assert!(index.first_match(["[HD]", "Official"]).is_none());
    }
}
