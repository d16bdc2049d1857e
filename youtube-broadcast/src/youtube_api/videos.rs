//! YouTube Videos API types.
//!
//! Every broadcast is backed by a video with the same id. Tags and category can only be set
//! on the video, so they are pushed with `videos.update` after the broadcast exists.

use serde::{Deserialize, Serialize};

/// Request body for `videos.update` with `part=snippet`.
///
/// YouTube replaces the whole snippet, so title and category must always be sent.
///
/// See: <https://developers.google.com/youtube/v3/docs/videos/update>
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoUpdateRequest {
    /// The video (= broadcast) id.
    pub id: String,
    pub snippet: VideoSnippet,
}

/// See: <https://developers.google.com/youtube/v3/docs/videos#snippet>
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSnippet {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub category_id: String,
}

/// A `video` resource as returned by `videos.update`.
///
/// See: <https://developers.google.com/youtube/v3/docs/videos#resource>
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<VideoSnippet>,
}
