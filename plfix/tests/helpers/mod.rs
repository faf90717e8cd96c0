//! Test Helper Utilities
//!
//! Shared utilities for testing plfix

#![allow(dead_code)]

pub mod fake_catalog;

pub use fake_catalog::{FakeCatalog, FakeSecondary};

use plfix::catalog::{ContentMetadata, SecondaryTrack};

/// Metadata record for a fake search result
pub fn meta(content_id: &str, title: &str, channel: &str) -> ContentMetadata {
    ContentMetadata {
        content_id: content_id.to_string(),
        title: title.to_string(),
        channel_title: channel.to_string(),
        length_seconds: Some(200),
    }
}

/// Secondary-catalog track flagged unavailable
pub fn unavailable_track(title: &str, artist: &str, content_id: Option<&str>) -> SecondaryTrack {
    SecondaryTrack {
        title: title.to_string(),
        artist: artist.to_string(),
        content_id: content_id.map(str::to_string),
        is_available: false,
    }
}
