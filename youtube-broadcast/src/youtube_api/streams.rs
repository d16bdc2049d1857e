//! YouTube Live Streams API types.
//!
//! ## [`LiveStream`] - Technical Infrastructure
//! - **Technical config**: Ingestion protocol, resolution, frame rate
//! - **Ingestion details**: Ingestion address and stream key for the encoder
//! - **Health monitoring**: Stream status
//! - **Relationship**: One stream can power many broadcasts over time, so it is created once
//!   and its id is kept in the configuration

use crate::youtube_api::types::PageInfo;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Response structure for the `liveStreams.list` API call.
///
/// See: <https://developers.google.com/youtube/v3/live/docs/liveStreams/list>
#[derive(Debug, Serialize, Deserialize)]
pub struct LiveStreamListResponse {
    /// A list of live streams that match the request criteria.
    #[serde(default)]
    pub items: VecDeque<LiveStream>,
    #[serde(rename = "pageInfo", default)]
    pub page_info: PageInfo,
}

/// A `liveStream` resource represents the video pipeline that sends content to YouTube.
///
/// See: <https://developers.google.com/youtube/v3/live/docs/liveStreams#resource>
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveStream {
    /// The ID that YouTube assigns to uniquely identify the stream.
    pub id: String,
    pub snippet: LiveStreamSnippet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cdn: Option<LiveStreamCdn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<LiveStreamStatus>,
}

/// See: <https://developers.google.com/youtube/v3/live/docs/liveStreams#snippet>
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveStreamSnippet {
    /// The stream's title.
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Ingestion settings of a stream.
///
/// See: <https://developers.google.com/youtube/v3/live/docs/liveStreams#cdn>
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStreamCdn {
    pub ingestion_type: IngestionType,
    pub resolution: Resolution,
    pub frame_rate: FrameRate,
    /// Only present in responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingestion_info: Option<IngestionInfo>,
}

/// Where the encoder should send its data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionInfo {
    /// The stream key.
    pub stream_name: String,
    pub ingestion_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_ingestion_address: Option<String>,
}

/// The protocol the encoder uses to send data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum IngestionType {
    Rtmp,
    Hls,
    #[value(skip)]
    Dash,
    #[value(skip)]
    Webrtc,
}

/// Resolution of the inbound video data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum Resolution {
    #[serde(rename = "1440p")]
    #[value(name = "1440p")]
    P1440,
    #[serde(rename = "1080p")]
    #[value(name = "1080p")]
    P1080,
    #[serde(rename = "720p")]
    #[value(name = "720p")]
    P720,
    #[serde(rename = "480p")]
    #[value(name = "480p")]
    P480,
    #[serde(rename = "360p")]
    #[value(name = "360p")]
    P360,
    /// Reported for streams whose resolution YouTube derives from the data.
    #[serde(rename = "variable")]
    #[value(skip)]
    Variable,
}

/// Frame rate of the inbound video data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum FrameRate {
    #[serde(rename = "30fps")]
    #[value(name = "30")]
    Fps30,
    #[serde(rename = "60fps")]
    #[value(name = "60")]
    Fps60,
    #[serde(rename = "variable")]
    #[value(skip)]
    Variable,
}

/// The status of a live stream.
///
/// See: <https://developers.google.com/youtube/v3/live/docs/liveStreams#status>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StreamStatus {
    /// The stream is receiving data.
    Active,
    /// The stream exists but lacks valid CDN settings.
    Created,
    /// An error condition exists on the stream.
    Error,
    /// The stream is not receiving data.
    Inactive,
    /// The stream has valid CDN settings.
    Ready,
}

impl fmt::Display for StreamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Created => write!(f, "created"),
            Self::Error => write!(f, "error"),
            Self::Inactive => write!(f, "inactive"),
            Self::Ready => write!(f, "ready"),
        }
    }
}

/// Contains information about the live stream's status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStreamStatus {
    pub stream_status: StreamStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_status: Option<LiveStreamHealthStatus>,
}

/// The health of the data arriving on a stream, e.g. `good`, `ok`, `bad` or `noData`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveStreamHealthStatus {
    pub status: String,
}

/// Request body for `liveStreams.insert`.
///
/// See: <https://developers.google.com/youtube/v3/live/docs/liveStreams/insert>
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveStreamInsertRequest {
    pub snippet: LiveStreamSnippet,
    pub cdn: LiveStreamCdn,
}

impl LiveStreamInsertRequest {
    pub fn new(
        name: impl Into<String>,
        ingestion_type: IngestionType,
        resolution: Resolution,
        frame_rate: FrameRate,
    ) -> Self {
        Self {
            snippet: LiveStreamSnippet {
                title: name.into(),
                description: Some("Streaming with YouTube API".to_string()),
            },
            cdn: LiveStreamCdn {
                ingestion_type,
                resolution,
                frame_rate,
                ingestion_info: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn serialize_insert_request() {
        let request = LiveStreamInsertRequest::new(
            "hive cam",
            IngestionType::Rtmp,
            Resolution::P1080,
            FrameRate::Fps30,
        );
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "snippet": {
                    "title": "hive cam",
                    "description": "Streaming with YouTube API"
                },
                "cdn": {
                    "ingestionType": "rtmp",
                    "resolution": "1080p",
                    "frameRate": "30fps"
                }
            })
        );
    }

    #[test]
    fn deserialize_created_stream() {
        let stream: LiveStream = serde_json::from_value(json!({
            "kind": "youtube#liveStream",
            "id": "stream-1",
            "snippet": {
                "publishedAt": "2024-05-01T07:00:00Z",
                "channelId": "channel",
                "title": "hive cam",
                "description": "Streaming with YouTube API",
                "isDefaultStream": false
            },
            "cdn": {
                "ingestionType": "rtmp",
                "ingestionInfo": {
                    "streamName": "abcd-efgh-ijkl",
                    "ingestionAddress": "rtmp://a.rtmp.youtube.com/live2",
                    "backupIngestionAddress": "rtmp://b.rtmp.youtube.com/live2?backup=1"
                },
                "resolution": "1080p",
                "frameRate": "60fps"
            },
            "status": {
                "streamStatus": "ready",
                "healthStatus": { "status": "noData" }
            }
        }))
        .unwrap();

        assert_eq!(stream.id, "stream-1");
        let cdn = stream.cdn.unwrap();
        assert_eq!(cdn.frame_rate, FrameRate::Fps60);
        assert_eq!(cdn.ingestion_info.unwrap().stream_name, "abcd-efgh-ijkl");
        let status = stream.status.unwrap();
        assert_eq!(status.stream_status, StreamStatus::Ready);
        assert_eq!(status.health_status.unwrap().status, "noData");
    }
}
