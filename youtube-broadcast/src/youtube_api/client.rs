//! HTTP client for the YouTube Data API v3.

use crate::youtube_api::{
    LiveStreamingApi,
    broadcasts::{
        BroadcastStatus, LiveBroadcast, LiveBroadcastInsertRequest, LiveBroadcastListResponse,
    },
    streams::{LiveStream, LiveStreamInsertRequest, LiveStreamListResponse},
    videos::{Video, VideoUpdateRequest},
};
use eyre::Context;
use http::Method;
use serde::Serialize;
use tracing::instrument;

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// Client for interacting with the YouTube Data API v3.
///
/// This client wraps an OAuth2 access token and provides methods to call the live streaming
/// endpoints. The token is expected to be fresh; obtaining and refreshing it is the job of
/// [`CredentialManager`](crate::credentials::CredentialManager).
#[derive(Clone)]
pub struct YouTubeClient {
    access_token: String,
    /// HTTP client for API requests
    client: reqwest::Client,
    base_url: String,
}

impl std::fmt::Debug for YouTubeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YouTubeClient")
            .field("access_token", &"[redacted]")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl YouTubeClient {
    /// Creates a new YouTube API client.
    ///
    /// # Arguments
    ///
    /// * `access_token` - A currently valid OAuth2 access token
    /// * `client` - Shared HTTP client for making API requests
    pub fn new(access_token: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            access_token: access_token.into(),
            client,
            base_url: API_BASE.to_string(),
        }
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Makes an authenticated HTTP request to the YouTube API with common error handling.
    ///
    /// This method consolidates the shared logic across all YouTube API requests:
    /// - Authorization header setup
    /// - Query parameters
    /// - JSON body for requests that need one
    /// - Status code validation and error handling
    ///
    /// # Returns
    ///
    /// The raw [`reqwest::Response`] for method-specific JSON parsing.
    #[instrument(skip(self, json_body), level = tracing::Level::TRACE)]
    pub(crate) async fn make_authenticated_request(
        &self,
        method: Method,
        url: &str,
        query_params: &[(&str, &str)],
        json_body: Option<&impl Serialize>,
    ) -> eyre::Result<reqwest::Response> {
        let mut request = self
            .client
            .request(method.clone(), url)
            .bearer_auth(&self.access_token)
            .query(query_params);

        if let Some(body) = json_body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("send {} request to YouTube API: {}", method, url))?;

        let status_code = response.status();
        if !status_code.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(eyre::eyre!(
                "YouTube API {} request failed with status {}: {}",
                method,
                status_code,
                error_text
            ));
        }

        Ok(response)
    }
}

impl LiveStreamingApi for YouTubeClient {
    /// Creates a new live stream with the given ingestion settings.
    ///
    /// The response carries the stream key and is not recorded on the span.
    ///
    /// # Required Scopes
    ///
    /// * `https://www.googleapis.com/auth/youtube.force-ssl`
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/live/docs/liveStreams/insert>
    #[instrument(skip(self), level = "debug")]
    async fn insert_live_stream(
        &self,
        request: &LiveStreamInsertRequest,
    ) -> eyre::Result<LiveStream> {
        let url = self.url("liveStreams");
        let query_params = [("part", "snippet,cdn,contentDetails")];

        let stream: LiveStream = self
            .make_authenticated_request(Method::POST, &url, &query_params, Some(request))
            .await?
            .json()
            .await
            .context("parse YouTube API liveStreams.insert response as JSON")?;

        tracing::debug!(stream_id = stream.id, "successfully created stream");
        Ok(stream)
    }

    /// Gets a specific live stream by ID.
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/live/docs/liveStreams/list>
    #[instrument(skip(self), level = "debug")]
    async fn get_live_stream(&self, stream_id: &str) -> eyre::Result<Option<LiveStream>> {
        let url = self.url("liveStreams");
        let query_params = [("part", "id,snippet,cdn,status"), ("id", stream_id)];

        let response: LiveStreamListResponse = self
            .make_authenticated_request(Method::GET, &url, &query_params, None::<&()>)
            .await?
            .json()
            .await
            .context("parse YouTube API liveStreams.list response as JSON")?;

        Ok(response.items.into_iter().next())
    }

    /// Creates a broadcast scheduled for the given time.
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/live/docs/liveBroadcasts/insert>
    #[instrument(skip(self), ret, level = "debug")]
    async fn insert_live_broadcast(
        &self,
        request: &LiveBroadcastInsertRequest,
    ) -> eyre::Result<LiveBroadcast> {
        let url = self.url("liveBroadcasts");
        let query_params = [("part", "snippet,contentDetails,status")];

        let broadcast: LiveBroadcast = self
            .make_authenticated_request(Method::POST, &url, &query_params, Some(request))
            .await?
            .json()
            .await
            .context("parse YouTube API liveBroadcasts.insert response as JSON")?;

        tracing::debug!(broadcast_id = broadcast.id, "successfully created broadcast");
        Ok(broadcast)
    }

    /// Binds a broadcast to a stream.
    ///
    /// A broadcast can only be bound to one stream; binding again replaces the previous
    /// binding.
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/live/docs/liveBroadcasts/bind>
    #[instrument(skip(self), ret, level = "debug")]
    async fn bind_live_broadcast(
        &self,
        broadcast_id: &str,
        stream_id: &str,
    ) -> eyre::Result<LiveBroadcast> {
        let url = self.url("liveBroadcasts/bind");
        let query_params = [
            ("part", "id,contentDetails"),
            ("id", broadcast_id),
            ("streamId", stream_id),
        ];

        let broadcast: LiveBroadcast = self
            .make_authenticated_request(Method::POST, &url, &query_params, None::<&()>)
            .await?
            .json()
            .await
            .context("parse YouTube API liveBroadcasts.bind response as JSON")?;

        Ok(broadcast)
    }

    /// Changes the status of a YouTube live broadcast and initiates processes associated with
    /// the new status.
    ///
    /// # Required Scopes
    ///
    /// * `https://www.googleapis.com/auth/youtube`
    /// * `https://www.googleapis.com/auth/youtube.force-ssl`
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/live/docs/liveBroadcasts/transition>
    #[instrument(skip(self), ret, level = "debug")]
    async fn transition_live_broadcast(
        &self,
        broadcast_id: &str,
        status: BroadcastStatus,
    ) -> eyre::Result<LiveBroadcast> {
        let url = self.url("liveBroadcasts/transition");
        let status_string = status.to_string();
        let query_params = [
            ("part", "id,snippet,status"),
            ("id", broadcast_id),
            ("broadcastStatus", &status_string),
        ];

        let broadcast: LiveBroadcast = self
            .make_authenticated_request(Method::POST, &url, &query_params, None::<&()>)
            .await?
            .json()
            .await
            .context("parse YouTube API transition response as JSON")?;

        tracing::debug!(
            broadcast_id = broadcast.id,
            "successfully transitioned broadcast"
        );

        Ok(broadcast)
    }

    /// Gets a specific live broadcast by ID.
    ///
    /// # API Cost
    ///
    /// This operation costs 1 quota unit per call.
    ///
    /// See: <https://developers.google.com/youtube/v3/live/docs/liveBroadcasts/list>
    #[instrument(skip(self), level = "debug")]
    async fn get_live_broadcast(&self, broadcast_id: &str) -> eyre::Result<Option<LiveBroadcast>> {
        let url = self.url("liveBroadcasts");
        let query_params = [("part", "id,snippet,status"), ("id", broadcast_id)];

        let response: LiveBroadcastListResponse = self
            .make_authenticated_request(Method::GET, &url, &query_params, None::<&()>)
            .await?
            .json()
            .await
            .context("parse YouTube API liveBroadcasts.list response as JSON")?;

        Ok(response.items.into_iter().next())
    }

    /// Replaces the snippet of a video.
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/videos/update>
    #[instrument(skip(self), ret, level = "debug")]
    async fn update_video(&self, request: &VideoUpdateRequest) -> eyre::Result<Video> {
        let url = self.url("videos");
        let query_params = [("part", "snippet")];

        let video: Video = self
            .make_authenticated_request(Method::PUT, &url, &query_params, Some(request))
            .await?
            .json()
            .await
            .context("parse YouTube API videos.update response as JSON")?;

        Ok(video)
    }
}
