//! Candidate ranker
//!
//! Heuristic scoring of search results from title and channel signals.
//! One batched metadata fetch per ranking.

use crate::catalog::{CatalogError, ContentMetadata, PrimaryCatalog};
use crate::models::Candidate;
use std::collections::HashMap;
use std::sync::Arc;

const OFFICIAL_BONUS: i64 = 4;
const TOPIC_CHANNEL_BONUS: i64 = 3;
const ARTIST_CHANNEL_BONUS: i64 = 5;
const LYRIC_PENALTY: i64 = 1;
const EXTENDED_PENALTY: i64 = 1;
/// Titles shorter than this earn a brevity bonus
const BREVITY_THRESHOLD: i64 = 30;

/// Score one candidate from its title and channel name
///
/// ```
/// use plfix::services::candidate_ranker::score_candidate;
///
/// assert_eq!(score_candidate("Song Official Lyric Video", "Artist - Topic"), 6);
/// ```
pub fn score_candidate(title: &str, channel_title: &str) -> i64 {
    let title = title.to_lowercase();
    let channel = channel_title.to_lowercase();
    let mut score = 0;

    if title.contains("official") {
        score += OFFICIAL_BONUS;
    }
    if channel.contains("topic") {
        score += TOPIC_CHANNEL_BONUS;
    }
    if channel.contains("official artist channel") {
        score += ARTIST_CHANNEL_BONUS;
    }
    if title.contains("lyric") {
        score -= LYRIC_PENALTY;
    }
    if title.contains("extended") {
        score -= EXTENDED_PENALTY;
    }

    let length = title.chars().count() as i64;
    score + (BREVITY_THRESHOLD - length).max(0) / 10
}

#[derive(Clone)]
pub struct CandidateRanker {
    catalog: Arc<dyn PrimaryCatalog>,
}

impl CandidateRanker {
    pub fn new(catalog: Arc<dyn PrimaryCatalog>) -> Self {
        Self { catalog }
    }

    /// Rank `content_ids` by descending score
    ///
    /// Equal scores keep input order. Ids the metadata fetch does not
    /// return are dropped.
    pub async fn rank(&self, content_ids: &[String]) -> Result<Vec<Candidate>, CatalogError> {
        if content_ids.is_empty() {
            return Ok(Vec::new());
        }

        let metadata: HashMap<String, ContentMetadata> = self
            .catalog
            .fetch_content_metadata(content_ids)
            .await?
            .into_iter()
            .map(|m| (m.content_id.clone(), m))
            .collect();

        let mut candidates: Vec<Candidate> = Vec::with_capacity(content_ids.len());
        for id in content_ids {
            let Some(meta) = metadata.get(id) else {
                tracing::debug!(content_id = %id, "No metadata for candidate, dropped");
                continue;
            };
            if candidates.iter().any(|c| &c.content_id == id) {
                continue;
            }
            candidates.push(Candidate {
                content_id: id.clone(),
                score: score_candidate(&meta.title, &meta.channel_title),
                title: meta.title.clone(),
                channel_title: meta.channel_title.clone(),
            });
        }

        // Vec::sort_by is stable
        candidates.sort_by(|a, b| b.score.cmp(&a.score));
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_example() {
        // 4 (official) - 1 (lyric) + 3 (topic) + 0 (25 chars)
        assert_eq!(score_candidate("Song Official Lyric Video", "Artist - Topic"), 6);
    }

    #[test]
    fn test_score_signals() {
        assert_eq!(
            score_candidate("Song", "Band - Official Artist Channel"),
            5 + 2
        );
        assert_eq!(
            score_candidate("A Very Long Extended Club Mix Of The Song", "Someone"),
            -1
        );
        // 30 - 9 = 21 → 2
        assert_eq!(score_candidate("Some Song", "uploader"), 2);
        assert_eq!(score_candidate("", ""), 3);
    }

    #[test]
    fn test_brevity_counts_characters() {
        // 10 characters, 20 bytes
        assert_eq!(score_candidate("éééééééééé", "x"), 2);
    }
}
