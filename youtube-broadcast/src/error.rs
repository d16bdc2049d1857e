//! Error kinds surfaced by the broadcast operations.
//!
//! Inside the API client and the OAuth plumbing errors are carried as [`eyre::Report`] with
//! context attached at every step. At the operation boundary they are sorted into [`Error`] so
//! that the CLI can tell a bad configuration from a failed login, a missing precondition or a
//! failed remote call without looking at message text.

use crate::config::ConfigError;
use std::fmt;
use std::path::PathBuf;

/// Failure of one top-level operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The configuration file is missing or invalid. Nothing was attempted.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No authenticated handle could be produced.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A local precondition failed before any remote call was issued.
    #[error(transparent)]
    Precondition(#[from] Precondition),

    /// A remote call failed or answered with an unexpected shape.
    ///
    /// Earlier steps of the same operation are not undone.
    #[error("{operation} failed: {detail:#}")]
    Remote {
        operation: RemoteOperation,
        detail: eyre::Report,
    },
}

impl Error {
    pub(crate) fn remote(operation: RemoteOperation, detail: eyre::Report) -> Self {
        Self::Remote { operation, detail }
    }

    /// Process exit code for this kind of failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Auth(_) => 3,
            Self::Precondition(_) => 4,
            Self::Remote { .. } => 5,
        }
    }
}

/// Failure to produce an authenticated handle.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The app-credentials (client secret) file could not be read or understood.
    #[error("failed to load app credentials from `{}`: {detail:#}", path.display())]
    AppCredentials { path: PathBuf, detail: eyre::Report },

    /// The interactive consent flow did not produce a token.
    #[error("interactive login failed: {0:#}")]
    Consent(eyre::Report),

    /// The cached token was expired and could not be refreshed.
    #[error("refreshing the cached token failed (run `login` to authorize again): {0:#}")]
    Refresh(eyre::Report),
}

/// Local state that must exist before an operation talks to YouTube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Precondition {
    #[error(
        "no `stream_id` is set under `stream_settings`; \
        run `create-stream` and put the returned id into the config"
    )]
    MissingStreamId,

    #[error(
        "no `broadcast_id` is stored under `stream_settings`; \
        no broadcast was started with this config"
    )]
    MissingBroadcastId,

    #[error("the time zone used for broadcast titles is not available on this system")]
    TitleTimeZone,
}

/// The remote operations this tool issues, used to label [`Error::Remote`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteOperation {
    CreateStream,
    GetStream,
    CreateBroadcast,
    BindBroadcast,
    TransitionBroadcast,
    GetBroadcast,
    UpdateVideoMetadata,
}

impl fmt::Display for RemoteOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateStream => write!(f, "create stream"),
            Self::GetStream => write!(f, "look up stream"),
            Self::CreateBroadcast => write!(f, "create broadcast"),
            Self::BindBroadcast => write!(f, "bind broadcast to stream"),
            Self::TransitionBroadcast => write!(f, "transition broadcast"),
            Self::GetBroadcast => write!(f, "look up broadcast"),
            Self::UpdateVideoMetadata => write!(f, "update video metadata"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_distinguish_kinds() {
        let config = Error::from(ConfigError::MissingSection {
            section: "stream_settings",
        });
        let auth = Error::from(AuthError::Consent(eyre::eyre!("user closed the tab")));
        let precondition = Error::from(Precondition::MissingStreamId);
        let remote = Error::remote(
            RemoteOperation::BindBroadcast,
            eyre::eyre!("status 403 Forbidden"),
        );

        assert_eq!(config.exit_code(), 2);
        assert_eq!(auth.exit_code(), 3);
        assert_eq!(precondition.exit_code(), 4);
        assert_eq!(remote.exit_code(), 5);
    }

    #[test]
    fn remote_error_names_operation_and_cause_chain() {
        let detail = eyre::eyre!("status 404 Not Found").wrap_err("send request");
        let err = Error::remote(RemoteOperation::TransitionBroadcast, detail);
        assert_eq!(
            err.to_string(),
            "transition broadcast failed: send request: status 404 Not Found"
        );
    }
}
