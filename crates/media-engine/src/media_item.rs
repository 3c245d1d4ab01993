//! Playable items handed to the media player

use keypoint_core::{Book, KeyPoint, KeyPointId};

/// Kind of content a media item carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum MediaType {
    AudioBookChapter,
}

/// Descriptive metadata shown by the platform media surfaces
#[derive(Debug, Clone, PartialEq)]
pub struct MediaMetadata {
    pub title: String,
    /// Book title, shown where a music player shows the artist
    pub artist: String,
    pub artwork_uri: Option<String>,
    pub media_type: MediaType,
    pub is_playable: bool,
    pub is_browsable: bool,
}

/// One track in the player's queue
#[derive(Debug, Clone, PartialEq)]
pub struct MediaItem {
    /// Key point id rendered as a string
    pub media_id: String,
    pub uri: String,
    pub metadata: MediaMetadata,
}

impl MediaItem {
    /// Builds the track for a key point of `book`
    pub fn from_key_point(book: &Book, key_point: &KeyPoint) -> Self {
        Self {
            media_id: key_point.id.to_string(),
            uri: key_point.audio.as_str().to_string(),
            metadata: MediaMetadata {
                title: key_point.title.clone(),
                artist: book.title.clone(),
                artwork_uri: Some(book.cover.as_str().to_string()),
                media_type: MediaType::AudioBookChapter,
                is_playable: true,
                is_browsable: false,
            },
        }
    }

    /// Parses the media id back into a key point id
    pub fn key_point_id(&self) -> Option<KeyPointId> {
        self.media_id.parse().ok()
    }
}

/// Builds the queue for a whole book, in key point order
pub fn track_list(book: &Book) -> Vec<MediaItem> {
    book.key_points
        .iter()
        .map(|key_point| MediaItem::from_key_point(book, key_point))
        .collect()
}
