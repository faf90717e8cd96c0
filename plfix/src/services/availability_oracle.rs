//! Availability oracle
//!
//! Decides which entries of a scanned playlist are broken. Two detection
//! policies exist and can be combined:
//!
//! - **Primary absence**: the entry's content id no longer exists in the
//!   primary catalog.
//! - **Secondary unavailability**: the secondary catalog flags a track
//!   unavailable, the track maps onto an entry (by content id, else by
//!   normalized title), and the entry's content still exists in the primary
//!   catalog. Content that exists nowhere is the primary policy's business
//!   and is excluded here.
//!
//! Output is always in listing order, whatever order the evidence arrived in.

use super::catalog_reader::CatalogReader;
use super::title_index::TitleIndex;
use crate::catalog::{CatalogError, SecondaryCatalog, SecondaryTrack};
use crate::models::{BrokenReason, BrokenRecord, MatchConfidence, PlaylistEntry};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Unmapped tracks kept for the run summary sample
pub const UNMAPPED_SAMPLE_SIZE: usize = 5;

/// Availability oracle errors (all fatal for the run)
#[derive(Debug, Error)]
pub enum OracleError {
    /// Policy needs the secondary catalog but none was configured
    #[error("Detection policy '{0}' requires a secondary catalog view")]
    SecondaryUnavailable(DetectionPolicy),

    #[error("Catalog query failed: {0}")]
    Catalog(#[from] CatalogError),
}

/// Which detection policies to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetectionPolicy {
    /// Absent from the primary catalog
    #[default]
    PrimaryAbsence,
    /// Flagged unavailable by the secondary catalog
    SecondaryUnavailability,
    /// Primary first, then secondary
    Both,
}

impl DetectionPolicy {
    pub fn uses_primary(self) -> bool {
        matches!(self, DetectionPolicy::PrimaryAbsence | DetectionPolicy::Both)
    }

    pub fn uses_secondary(self) -> bool {
        matches!(
            self,
            DetectionPolicy::SecondaryUnavailability | DetectionPolicy::Both
        )
    }
}

impl fmt::Display for DetectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectionPolicy::PrimaryAbsence => write!(f, "primary"),
            DetectionPolicy::SecondaryUnavailability => write!(f, "secondary"),
            DetectionPolicy::Both => write!(f, "both"),
        }
    }
}

impl FromStr for DetectionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "primary" => Ok(DetectionPolicy::PrimaryAbsence),
            "secondary" => Ok(DetectionPolicy::SecondaryUnavailability),
            "both" => Ok(DetectionPolicy::Both),
            other => Err(format!(
                "unknown detection policy '{}' (expected primary, secondary or both)",
                other
            )),
        }
    }
}

/// Oracle output for one scan
#[derive(Debug, Clone, Default)]
pub struct Classification {
    /// Broken records in listing order, one per entry
    pub broken: Vec<BrokenRecord>,
    /// Unavailable secondary tracks that matched no entry
    pub unmapped: Vec<SecondaryTrack>,
}

impl Classification {
    /// Capped "title - artist" sample of unmapped tracks
    pub fn unmapped_sample(&self) -> Vec<String> {
        self.unmapped
            .iter()
            .take(UNMAPPED_SAMPLE_SIZE)
            .map(SecondaryTrack::label)
            .collect()
    }
}

/// Availability oracle
pub struct AvailabilityOracle {
    reader: CatalogReader,
    secondary: Option<Arc<dyn SecondaryCatalog>>,
}

impl AvailabilityOracle {
    pub fn new(reader: CatalogReader, secondary: Option<Arc<dyn SecondaryCatalog>>) -> Self {
        Self { reader, secondary }
    }

    /// Classify `entries` (one scan of `playlist_id`) under `policy`
    pub async fn classify(
        &self,
        playlist_id: &str,
        entries: &[PlaylistEntry],
        policy: DetectionPolicy,
    ) -> Result<Classification, OracleError> {
        if policy.uses_secondary() && self.secondary.is_none() {
            return Err(OracleError::SecondaryUnavailable(policy));
        }

        let mut classification = Classification::default();
        let mut seen: HashSet<String> = HashSet::new();

        if policy.uses_primary() {
            for record in self.primary_absence(entries).await? {
                if seen.insert(record.entry.entry_id.clone()) {
                    classification.broken.push(record);
                }
            }
        }

        if policy.uses_secondary() {
            let (records, unmapped) = self.secondary_unavailability(playlist_id, entries).await?;
            for record in records {
                if seen.insert(record.entry.entry_id.clone()) {
                    classification.broken.push(record);
                }
            }
            classification.unmapped = unmapped;
        }

        sort_by_listing_order(&mut classification.broken, entries);

        tracing::info!(
            playlist_id = %playlist_id,
            policy = %policy,
            entries = entries.len(),
            broken = classification.broken.len(),
            unmapped = classification.unmapped.len(),
            "Availability classification complete"
        );
        Ok(classification)
    }

    /// Entries whose content id fails the primary existence check
    pub async fn primary_absence(
        &self,
        entries: &[PlaylistEntry],
    ) -> Result<Vec<BrokenRecord>, CatalogError> {
        let ids: Vec<String> = entries
            .iter()
            .filter_map(|e| e.content_id.clone())
            .collect();
        let existence = self.reader.batch_exists(&ids).await?;

        let broken: Vec<BrokenRecord> = entries
            .iter()
            .filter(|e| {
                e.content_id()
                    .is_some_and(|id| !existence.get(id).copied().unwrap_or(false))
            })
            .cloned()
            .map(BrokenRecord::not_found_primary)
            .collect();

        tracing::debug!(
            checked = ids.len(),
            broken = broken.len(),
            "Primary-absence policy complete"
        );
        Ok(broken)
    }

    /// Entries the secondary catalog flags unavailable and whose content
    /// still exists in the primary catalog
    ///
    /// Returns the records (listing order) and the unavailable tracks that
    /// mapped onto no entry.
    pub async fn secondary_unavailability(
        &self,
        playlist_id: &str,
        entries: &[PlaylistEntry],
    ) -> Result<(Vec<BrokenRecord>, Vec<SecondaryTrack>), OracleError> {
        let secondary = self
            .secondary
            .as_ref()
            .ok_or(OracleError::SecondaryUnavailable(
                DetectionPolicy::SecondaryUnavailability,
            ))?;
        let tracks = secondary.playlist_view(playlist_id).await?;

        let mut by_content_id: HashMap<&str, &PlaylistEntry> = HashMap::new();
        for entry in entries {
            if let Some(id) = entry.content_id() {
                by_content_id.entry(id).or_insert(entry);
            }
        }
        let index = TitleIndex::build(entries);

        let mut mapped: Vec<BrokenRecord> = Vec::new();
        let mut mapped_ids: HashSet<&str> = HashSet::new();
        let mut unmapped: Vec<SecondaryTrack> = Vec::new();

        for track in tracks.iter().filter(|t| !t.is_available) {
            let Some((entry, confidence)) = map_track(track, &by_content_id, &index) else {
                tracing::debug!(
                    title = %track.title,
                    artist = %track.artist,
                    "Unavailable secondary track matches no playlist entry"
                );
                unmapped.push(track.clone());
                continue;
            };

            // First reason wins
            if mapped_ids.insert(entry.entry_id.as_str()) {
                mapped.push(BrokenRecord::new(
                    entry.clone(),
                    BrokenReason::UnavailableSecondary,
                    confidence,
                ));
            }
        }

        // Existence gate: content gone everywhere is not this policy's case
        let ids: Vec<String> = mapped
            .iter()
            .filter_map(|r| r.entry.content_id.clone())
            .collect();
        let existence = self.reader.batch_exists(&ids).await?;

        let mut broken: Vec<BrokenRecord> = Vec::with_capacity(mapped.len());
        for record in mapped {
            let exists = record
                .entry
                .content_id()
                .is_some_and(|id| existence.get(id).copied().unwrap_or(false));
            if exists {
                broken.push(record);
            } else {
                tracing::debug!(
                    entry_id = %record.entry.entry_id,
                    title = %record.entry.title,
                    "Secondary-unavailable entry fails the primary existence gate, excluded"
                );
            }
        }

        sort_by_listing_order(&mut broken, entries);

        if !unmapped.is_empty() {
            tracing::info!(
                unmapped = unmapped.len(),
                "Some unavailable secondary tracks could not be mapped to playlist entries"
            );
        }
        Ok((broken, unmapped))
    }
}

/// Map one unavailable track onto an entry: content id first, then
/// "{title} {artist}", then "{title}"
fn map_track<'a>(
    track: &SecondaryTrack,
    by_content_id: &HashMap<&str, &'a PlaylistEntry>,
    index: &'a TitleIndex,
) -> Option<(&'a PlaylistEntry, MatchConfidence)> {
    if let Some(entry) = track
        .content_id
        .as_deref()
        .and_then(|id| by_content_id.get(id).copied())
    {
        return Some((entry, MatchConfidence::IdentifierMatch));
    }

    let with_artist = format!("{} {}", track.title, track.artist);
    index
        .first_match([with_artist.as_str(), track.title.as_str()])
        .map(|entry| (entry, MatchConfidence::TitleMatch))
}

/// Stable sort of records by the entries' listing order
fn sort_by_listing_order(records: &mut [BrokenRecord], entries: &[PlaylistEntry]) {
    let order: HashMap<&str, usize> = entries
        .iter()
        .enumerate()
        .map(|(i, e)| (e.entry_id.as_str(), i))
        .collect();
    records.sort_by_key(|r| order.get(r.entry.entry_id.as_str()).copied().unwrap_or(usize::MAX));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_parsing() {
        assert_eq!(
            "primary".parse::<DetectionPolicy>().unwrap(),
            DetectionPolicy::PrimaryAbsence
        );
        assert_eq!(
            "Secondary".parse::<DetectionPolicy>().unwrap(),
            DetectionPolicy::SecondaryUnavailability
        );
        assert_eq!(
            "both".parse::<DetectionPolicy>().unwrap(),
            DetectionPolicy::Both
        );
        assert!("all".parse::<DetectionPolicy>().is_err());
        assert_eq!(DetectionPolicy::default(), DetectionPolicy::PrimaryAbsence);
    }

    #[test]
    fn test_policy_flags() {
        assert!(DetectionPolicy::Both.uses_primary());
        assert!(DetectionPolicy::Both.uses_secondary());
        assert!(!DetectionPolicy::PrimaryAbsence.uses_secondary());
        assert!(!DetectionPolicy::SecondaryUnavailability.uses_primary());
    }

    #[test]
    fn test_map_track_prefers_identifier() {
        let entries = vec![
            PlaylistEntry::new(0, "Song", Some("a".to_string()), "PLI_0"),
            PlaylistEntry::new(1, "Other", Some("b".to_string()), "PLI_1"),
        ];
        let by_id: HashMap<&str, &PlaylistEntry> = entries
            .iter()
            .map(|e| (e.content_id().unwrap(), e))
            .collect();
        let index = TitleIndex::build(&entries);

        // Title says "Song" but the id points at entry 1
        let track = SecondaryTrack {
            title: "Song".to_string(),
            artist: "Band".to_string(),
            content_id: Some("b".to_string()),
            is_available: false,
        };
        let (entry, confidence) = map_track(&track, &by_id, &index).unwrap();
        assert_eq!(entry.entry_id, "PLI_1");
        assert_eq!(confidence, MatchConfidence::IdentifierMatch);

        // Unknown id falls back to title
        let track = SecondaryTrack {
            content_id: Some("zzz".to_string()),
            ..track
        };
        let (entry, confidence) = map_track(&track, &by_id, &index).unwrap();
        assert_eq!(entry.entry_id, "PLI_0");
        assert_eq!(confidence, MatchConfidence::TitleMatch);
    }

    #[test]
    fn test_unmapped_sample_is_capped() {
        let unmapped: Vec<SecondaryTrack> = (0..8)
            .map(|i| SecondaryTrack {
                title: format!("T{}", i),
                artist: "A".to_string(),
                content_id: None,
                is_available: false,
            })
            .collect();
        let classification = Classification {
            broken: Vec::new(),
            unmapped,
        };
        let sample = classification.unmapped_sample();
        assert_eq!(sample.len(), UNMAPPED_SAMPLE_SIZE);
        assert_eq!(sample[0], "T0 - A");
    }
}
