//! The subset of the YouTube Data API v3 needed to run a broadcast lifecycle.
//!
//! # Core Concepts: Broadcasts vs Streams
//!
//! The YouTube Live API has two main resource types that work together but serve different
//! purposes:
//!
//! ## [`broadcasts::LiveBroadcast`] - Viewer-Facing Events
//! - **What viewers see**: Title, description, scheduled time
//! - **Event lifecycle**: Created → Ready → Testing → Live → Complete
//! - **Relationship**: Each broadcast = exactly one YouTube video, whose tags and category are
//!   set through [`videos::VideoUpdateRequest`]
//!
//! ## [`streams::LiveStream`] - Technical Infrastructure
//! - **Technical config**: Ingestion protocol, resolution, frame rate
//! - **Ingestion details**: Ingestion address and stream key
//! - **Relationship**: One stream can power multiple broadcasts over time
//!
//! ## Typical Workflow
//! 1. Create a [`streams::LiveStream`] (done once, its id is persisted)
//! 2. Create a [`broadcasts::LiveBroadcast`] for each live event
//! 3. Bind the broadcast to the stream; it goes live once the encoder sends data
//! 4. Transition the broadcast to `complete` to end it
//!
//! All calls go through the [`LiveStreamingApi`] trait so the workflow can be driven against
//! something other than the real service.

pub mod broadcasts;
pub mod client;
pub mod streams;
pub mod types;
pub mod videos;

pub use client::YouTubeClient;
pub use types::PageInfo;

pub use broadcasts::{
    BroadcastLifeCycleStatus, BroadcastPrivacyStatus, BroadcastStatus, LiveBroadcast,
    LiveBroadcastInsertRequest, LiveBroadcastSnippet, LiveBroadcastStatus,
};

pub use streams::{
    FrameRate, IngestionInfo, IngestionType, LiveStream, LiveStreamInsertRequest,
    LiveStreamSnippet, LiveStreamStatus, Resolution, StreamStatus,
};

pub use videos::{Video, VideoSnippet, VideoUpdateRequest};

use std::future::Future;

/// The live streaming operations of an authenticated YouTube account.
///
/// Lookups by id return `Ok(None)` when the service answers but knows no such resource.
pub trait LiveStreamingApi {
    /// `liveStreams.insert`
    fn insert_live_stream(
        &self,
        request: &LiveStreamInsertRequest,
    ) -> impl Future<Output = eyre::Result<LiveStream>> + Send;

    /// `liveStreams.list` filtered by id.
    fn get_live_stream(
        &self,
        stream_id: &str,
    ) -> impl Future<Output = eyre::Result<Option<LiveStream>>> + Send;

    /// `liveBroadcasts.insert`
    fn insert_live_broadcast(
        &self,
        request: &LiveBroadcastInsertRequest,
    ) -> impl Future<Output = eyre::Result<LiveBroadcast>> + Send;

    /// `liveBroadcasts.bind`
    fn bind_live_broadcast(
        &self,
        broadcast_id: &str,
        stream_id: &str,
    ) -> impl Future<Output = eyre::Result<LiveBroadcast>> + Send;

    /// `liveBroadcasts.transition`
    fn transition_live_broadcast(
        &self,
        broadcast_id: &str,
        status: BroadcastStatus,
    ) -> impl Future<Output = eyre::Result<LiveBroadcast>> + Send;

    /// `liveBroadcasts.list` filtered by id.
    fn get_live_broadcast(
        &self,
        broadcast_id: &str,
    ) -> impl Future<Output = eyre::Result<Option<LiveBroadcast>>> + Send;

    /// `videos.update` with `part=snippet`.
    fn update_video(
        &self,
        request: &VideoUpdateRequest,
    ) -> impl Future<Output = eyre::Result<Video>> + Send;
}
