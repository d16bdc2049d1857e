//! Sequencing of the broadcast lifecycle.
//!
//! Each public method on [`BroadcastOrchestrator`] is one CLI command. Steps inside a method run
//! strictly in order and stop at the first failure. Nothing is rolled back: a broadcast that was
//! created before a later step failed stays on YouTube, and its id stays in the configuration so
//! that `stop-broadcast` can still end it.

use crate::config::{Config, ConfigStore};
use crate::error::{AuthError, Error, Precondition, RemoteOperation};
use crate::youtube_api::broadcasts::{
    InitialBroadcastStatus, LiveBroadcastInsertContentDetails, LiveBroadcastInsertSnippet,
    LiveBroadcastInsertStatus, MonitorStream,
};
use crate::youtube_api::{
    BroadcastLifeCycleStatus, BroadcastStatus, FrameRate, IngestionType, LiveBroadcast,
    LiveBroadcastInsertRequest, LiveStream, LiveStreamInsertRequest, LiveStreamingApi,
    Resolution, VideoSnippet, VideoUpdateRequest,
};
use jiff::Timestamp;
use std::future::Future;
use tracing::{Span, instrument};

/// Time zone that decides the date and half of day in broadcast titles.
pub const TITLE_TIME_ZONE: &str = "Europe/Berlin";

/// Produces an authenticated API handle.
pub trait Authenticator {
    type Api: LiveStreamingApi;

    /// With `force_new` any cached credential is discarded and the user is asked again.
    fn authenticate(
        &self,
        force_new: bool,
    ) -> impl Future<Output = Result<Self::Api, AuthError>> + Send;
}

/// Title and date of a broadcast about to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastTitle {
    /// `<base> dd.mm.yyyy (1)` before noon, `(2)` from noon on.
    pub title: String,
    /// `dd.mm.yyyy`
    pub date: String,
}

/// Computes the title for a broadcast created at `now`.
pub fn broadcast_title(base: &str, now: Timestamp) -> Result<BroadcastTitle, jiff::Error> {
    broadcast_title_in(base, now, TITLE_TIME_ZONE)
}

fn broadcast_title_in(
    base: &str,
    now: Timestamp,
    time_zone: &str,
) -> Result<BroadcastTitle, jiff::Error> {
    let local = now.in_tz(time_zone)?;
    let date = local.strftime("%d.%m.%Y").to_string();
    let half = if local.hour() < 12 { 1 } else { 2 };
    Ok(BroadcastTitle {
        title: format!("{base} {date} ({half})"),
        date,
    })
}

/// Parameters of `create-stream`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStream {
    pub name: String,
    pub ingestion_type: IngestionType,
    pub resolution: Resolution,
    pub frame_rate: FrameRate,
}

/// What `start-broadcast` left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedBroadcast {
    pub broadcast_id: String,
    pub stream_id: String,
    pub title: String,
    /// Whether the broadcast id made it into the configuration file.
    pub persisted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// The broadcast was transitioned to `complete`.
    Completed,
    /// The broadcast had already ended; nothing was sent.
    AlreadyComplete,
}

/// Result of looking up one configured resource.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    /// No id is configured.
    NotConfigured,
    /// YouTube does not know the configured id.
    NotFound { id: String },
    Found(T),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub stream: Lookup<LiveStream>,
    pub broadcast: Lookup<LiveBroadcast>,
}

/// State carried through the steps of `start-broadcast`.
struct OrchestratorSession<Api> {
    api: Api,
    stream_id: String,
    title: BroadcastTitle,
    broadcast_id: Option<String>,
}

impl<Api> OrchestratorSession<Api> {
    fn broadcast_id(&self) -> &str {
        self.broadcast_id.as_deref().unwrap_or_default()
    }
}

/// Logs a failed remote step and turns it into an [`Error`].
fn remote_failure(operation: RemoteOperation) -> impl FnOnce(eyre::Report) -> Error {
    move |detail| {
        tracing::error!(%operation, "{detail:#}");
        Error::remote(operation, detail)
    }
}

fn is_complete(broadcast: &LiveBroadcast) -> bool {
    broadcast
        .status
        .as_ref()
        .is_some_and(|s| s.life_cycle_status == BroadcastLifeCycleStatus::Complete)
}

/// Drives the remote operations for one configuration.
#[derive(Debug)]
pub struct BroadcastOrchestrator<A, S> {
    auth: A,
    store: S,
    config: Config,
    title_time_zone: &'static str,
}

impl<A, S> BroadcastOrchestrator<A, S>
where
    A: Authenticator,
    S: ConfigStore,
{
    pub fn new(auth: A, store: S, config: Config) -> Self {
        Self {
            auth,
            store,
            config,
            title_time_zone: TITLE_TIME_ZONE,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Discards the cached credential and runs the consent flow.
    #[instrument(skip(self))]
    pub async fn login(&self) -> Result<(), Error> {
        self.auth.authenticate(true).await?;
        tracing::info!("login complete");
        Ok(())
    }

    /// Creates a new ingest stream. The id is only reported, not stored.
    #[instrument(skip(self))]
    pub async fn create_stream(&self, stream: NewStream) -> Result<LiveStream, Error> {
        let api = self.auth.authenticate(false).await?;
        let request = LiveStreamInsertRequest::new(
            stream.name,
            stream.ingestion_type,
            stream.resolution,
            stream.frame_rate,
        );
        let created = api
            .insert_live_stream(&request)
            .await
            .map_err(remote_failure(RemoteOperation::CreateStream))?;
        tracing::info!(stream_id = created.id, "created stream");
        Ok(created)
    }

    /// Creates a broadcast for the configured stream and binds the two.
    pub async fn start_broadcast(&mut self) -> Result<StartedBroadcast, Error> {
        self.start_broadcast_at(Timestamp::now()).await
    }

    #[instrument(skip(self), fields(stream_id, broadcast_id))]
    pub(crate) async fn start_broadcast_at(
        &mut self,
        now: Timestamp,
    ) -> Result<StartedBroadcast, Error> {
        let Some(stream_id) = self.config.stream_settings.stream_id().map(str::to_owned) else {
            return Err(Precondition::MissingStreamId.into());
        };
        Span::current().record("stream_id", stream_id.as_str());

        let base = &self.config.stream_settings.title;
        let title = broadcast_title_in(base, now, self.title_time_zone).map_err(|e| {
            tracing::error!(time_zone = self.title_time_zone, "cannot compute title: {e}");
            Precondition::TitleTimeZone
        })?;

        let api = self.auth.authenticate(false).await?;
        let mut session = OrchestratorSession {
            api,
            stream_id,
            title,
            broadcast_id: None,
        };

        self.create_broadcast(&mut session, now).await?;
        Span::current().record("broadcast_id", session.broadcast_id());
        let persisted = self.persist_broadcast_id(&session).await;
        self.bind(&session).await?;
        self.push_metadata(&session).await?;

        tracing::info!(
            title = session.title.title,
            "broadcast is ready and goes live once the stream receives data"
        );
        Ok(StartedBroadcast {
            broadcast_id: session.broadcast_id().to_owned(),
            stream_id: session.stream_id,
            title: session.title.title,
            persisted,
        })
    }

    async fn create_broadcast(
        &self,
        session: &mut OrchestratorSession<A::Api>,
        now: Timestamp,
    ) -> Result<(), Error> {
        let settings = &self.config.stream_settings;
        let request = LiveBroadcastInsertRequest {
            snippet: LiveBroadcastInsertSnippet {
                title: session.title.title.clone(),
                description: format!("{}\n{}", settings.description, session.title.date),
                scheduled_start_time: now,
            },
            content_details: LiveBroadcastInsertContentDetails {
                monitor_stream: MonitorStream {
                    enable_monitor_stream: false,
                },
                enable_auto_start: true,
                enable_auto_stop: false,
            },
            status: LiveBroadcastInsertStatus {
                privacy_status: settings.privacy.into(),
                self_declared_made_for_kids: false,
                broadcast_status: InitialBroadcastStatus::Upcoming,
            },
        };

        let broadcast = session
            .api
            .insert_live_broadcast(&request)
            .await
            .map_err(remote_failure(RemoteOperation::CreateBroadcast))?;
        if broadcast.id.is_empty() {
            return Err(remote_failure(RemoteOperation::CreateBroadcast)(eyre::eyre!(
                "response carried no broadcast id"
            )));
        }

        tracing::info!(
            broadcast_id = broadcast.id,
            title = session.title.title,
            "created broadcast"
        );
        session.broadcast_id = Some(broadcast.id);
        Ok(())
    }

    /// Stores the new broadcast id so that a later `stop-broadcast` finds it.
    ///
    /// Failing to write the file is not fatal; the broadcast exists either way.
    async fn persist_broadcast_id(&mut self, session: &OrchestratorSession<A::Api>) -> bool {
        let broadcast_id = session.broadcast_id();
        let previous = self
            .config
            .stream_settings
            .broadcast_id
            .replace(broadcast_id.to_owned());
        if let Some(previous) = previous.filter(|p| !p.is_empty() && p != broadcast_id) {
            tracing::warn!(
                previous,
                "replacing stored broadcast id; \
                the previous broadcast can no longer be stopped with this tool"
            );
        }

        match self.store.save(&self.config).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    broadcast_id,
                    "could not store broadcast id, continuing anyway: {:#}",
                    eyre::Report::new(e)
                );
                false
            }
        }
    }

    async fn bind(&self, session: &OrchestratorSession<A::Api>) -> Result<(), Error> {
        let broadcast_id = session.broadcast_id();
        let bound = session
            .api
            .bind_live_broadcast(broadcast_id, &session.stream_id)
            .await
            .map_err(remote_failure(RemoteOperation::BindBroadcast))?;
        if bound.id != broadcast_id {
            return Err(remote_failure(RemoteOperation::BindBroadcast)(eyre::eyre!(
                "YouTube acknowledged binding broadcast {} instead of {}",
                bound.id,
                broadcast_id
            )));
        }
        tracing::info!("bound broadcast to stream");
        Ok(())
    }

    /// Tags and category only exist on the video behind the broadcast.
    async fn push_metadata(&self, session: &OrchestratorSession<A::Api>) -> Result<(), Error> {
        let settings = &self.config.stream_settings;
        let request = VideoUpdateRequest {
            id: session.broadcast_id().to_owned(),
            snippet: VideoSnippet {
                title: session.title.title.clone(),
                description: settings.description.clone(),
                tags: settings.tags.clone(),
                category_id: settings.category.to_string(),
            },
        };
        session
            .api
            .update_video(&request)
            .await
            .map_err(remote_failure(RemoteOperation::UpdateVideoMetadata))?;
        tracing::debug!("updated video metadata");
        Ok(())
    }

    /// Ends the broadcast whose id is stored in the configuration.
    ///
    /// The stored id is left in place.
    #[instrument(skip(self), fields(broadcast_id))]
    pub async fn stop_broadcast(&self) -> Result<StopOutcome, Error> {
        let Some(broadcast_id) = self.config.stream_settings.broadcast_id() else {
            return Err(Precondition::MissingBroadcastId.into());
        };
        Span::current().record("broadcast_id", broadcast_id);

        let api = self.auth.authenticate(false).await?;

        match api.get_live_broadcast(broadcast_id).await {
            Ok(Some(broadcast)) if is_complete(&broadcast) => {
                tracing::info!("broadcast has already ended");
                return Ok(StopOutcome::AlreadyComplete);
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("could not look up broadcast before stopping it: {e:#}");
            }
        }

        api.transition_live_broadcast(broadcast_id, BroadcastStatus::Complete)
            .await
            .map_err(remote_failure(RemoteOperation::TransitionBroadcast))?;
        tracing::info!("broadcast ended");
        Ok(StopOutcome::Completed)
    }

    /// Looks up the configured stream and the stored broadcast without changing either.
    #[instrument(skip(self))]
    pub async fn status(&self) -> Result<StatusReport, Error> {
        let settings = &self.config.stream_settings;
        let (stream_id, broadcast_id) = (settings.stream_id(), settings.broadcast_id());
        if stream_id.is_none() && broadcast_id.is_none() {
            return Ok(StatusReport {
                stream: Lookup::NotConfigured,
                broadcast: Lookup::NotConfigured,
            });
        }

        let api = self.auth.authenticate(false).await?;

        let stream = match stream_id {
            None => Lookup::NotConfigured,
            Some(id) => match api.get_live_stream(id).await {
                Ok(Some(stream)) => Lookup::Found(stream),
                Ok(None) => Lookup::NotFound { id: id.to_owned() },
                Err(e) => return Err(remote_failure(RemoteOperation::GetStream)(e)),
            },
        };
        let broadcast = match broadcast_id {
            None => Lookup::NotConfigured,
            Some(id) => match api.get_live_broadcast(id).await {
                Ok(Some(broadcast)) => Lookup::Found(broadcast),
                Ok(None) => Lookup::NotFound { id: id.to_owned() },
                Err(e) => return Err(remote_failure(RemoteOperation::GetBroadcast)(e)),
            },
        };

        Ok(StatusReport { stream, broadcast })
    }
}
