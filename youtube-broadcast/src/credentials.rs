//! The OAuth credential lifecycle.
//!
//! A single credential is cached in a durable slot (by default `token.secret` next to where the
//! tool is run). Every operation asks [`CredentialManager`] for it, which
//!
//! 1. reuses the cached credential while it is valid,
//! 2. refreshes it once it expired and a refresh token is available, or
//! 3. falls back to the interactive consent flow.
//!
//! Newly minted or refreshed credentials are written back to the slot before use. Reusing a
//! valid credential never writes.

use crate::error::AuthError;
use crate::orchestrator::Authenticator;
use crate::youtube_api::YouTubeClient;
use eyre::Context;
use jiff::{SignedDuration, Timestamp};
use oauth2::TokenResponse;
use oauth2::basic::BasicTokenResponse;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::instrument;

/// The only scope this tool ever asks for.
pub const SCOPE: &str = "https://www.googleapis.com/auth/youtube";

/// File name of the credential slot when none is given.
pub const DEFAULT_TOKEN_FILE: &str = "token.secret";

/// A credential counts as expired this long before its recorded expiry.
const EXPIRY_BUFFER: SignedDuration = SignedDuration::from_mins(5);

/// A cached OAuth credential, stored in the Google "authorized user" layout.
///
/// The layout carries the client id, secret and token endpoint so a refresh does not need the
/// app-credentials file.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    #[serde(rename = "token")]
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub token_uri: String,
    pub client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Absent means the token endpoint did not say; such a credential is assumed valid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<Timestamp>,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"[redacted]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[redacted]"),
            )
            .field("token_uri", &self.token_uri)
            .field("client_id", &self.client_id)
            .field("scopes", &self.scopes)
            .field("expiry", &self.expiry)
            .finish_non_exhaustive()
    }
}

impl Credential {
    /// Builds the credential for a token obtained through the consent flow.
    pub fn minted(token: &BasicTokenResponse, app: &AppCredentials, now: Timestamp) -> Self {
        Self {
            access_token: token.access_token().secret().clone(),
            refresh_token: token.refresh_token().map(|t| t.secret().clone()),
            token_uri: app.token_uri.clone(),
            client_id: app.client_id.clone(),
            client_secret: app.client_secret.clone(),
            scopes: granted_scopes(token),
            expiry: expiry_of(token, now),
        }
    }

    /// Builds the successor of `self` from a refresh response.
    ///
    /// Google usually leaves the refresh token out of refresh responses; the existing one is
    /// kept in that case.
    pub fn refreshed(&self, token: &BasicTokenResponse, now: Timestamp) -> Self {
        Self {
            access_token: token.access_token().secret().clone(),
            refresh_token: token
                .refresh_token()
                .map(|t| t.secret().clone())
                .or_else(|| self.refresh_token.clone()),
            scopes: token
                .scopes()
                .map(|_| granted_scopes(token))
                .unwrap_or_else(|| self.scopes.clone()),
            expiry: expiry_of(token, now),
            ..self.clone()
        }
    }

    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        let Some(expiry) = self.expiry else {
            return false;
        };
        match expiry.checked_sub(EXPIRY_BUFFER) {
            Ok(deadline) => now >= deadline,
            Err(_) => true,
        }
    }

    pub fn is_valid_at(&self, now: Timestamp) -> bool {
        !self.access_token.is_empty() && !self.is_expired_at(now)
    }
}

fn granted_scopes(token: &BasicTokenResponse) -> Vec<String> {
    match token.scopes() {
        Some(scopes) => scopes.iter().map(|s| s.as_str().to_owned()).collect(),
        None => vec![SCOPE.to_owned()],
    }
}

fn expiry_of(token: &BasicTokenResponse, now: Timestamp) -> Option<Timestamp> {
    let expires_in = SignedDuration::try_from(token.expires_in()?).ok()?;
    now.checked_add(expires_in).ok()
}

fn default_auth_uri() -> String {
    "https://accounts.google.com/o/oauth2/auth".to_string()
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// The OAuth client an operator registered in the Google Cloud console.
#[derive(Clone, PartialEq, Deserialize)]
pub struct AppCredentials {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl fmt::Debug for AppCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppCredentials")
            .field("client_id", &self.client_id)
            .field("auth_uri", &self.auth_uri)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

/// The downloadable client-secret file: one `installed` or `web` object.
#[derive(Deserialize)]
struct ClientSecretFile {
    installed: Option<AppCredentials>,
    web: Option<AppCredentials>,
}

impl AppCredentials {
    pub fn from_json(json: &[u8]) -> eyre::Result<Self> {
        let file: ClientSecretFile =
            serde_json::from_slice(json).context("parse client secret JSON")?;
        file.installed
            .or(file.web)
            .ok_or_else(|| eyre::eyre!("neither an `installed` nor a `web` client is defined"))
    }

    pub async fn from_file(path: &Path) -> eyre::Result<Self> {
        let json = tokio::fs::read(path)
            .await
            .with_context(|| format!("read {}", path.display()))?;
        Self::from_json(&json)
    }
}

/// The durable slot holding the cached credential.
pub trait CredentialStore {
    /// `Ok(None)` when nothing is cached yet.
    fn load(&self) -> impl Future<Output = eyre::Result<Option<Credential>>> + Send;

    fn save(&self, credential: &Credential) -> impl Future<Output = eyre::Result<()>> + Send;
}

/// Obtains credentials from the authorization server.
pub trait Authorizer {
    /// Runs the interactive consent flow for the client in `app_credentials_file`.
    fn consent(
        &self,
        app_credentials_file: &Path,
    ) -> impl Future<Output = Result<Credential, AuthError>> + Send;

    fn refresh(
        &self,
        credential: &Credential,
    ) -> impl Future<Output = Result<Credential, AuthError>> + Send;
}

/// A [`CredentialStore`] backed by one JSON file.
#[derive(Debug, Clone)]
pub struct TokenFile {
    path: PathBuf,
}

impl TokenFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for TokenFile {
    async fn load(&self) -> eyre::Result<Option<Credential>> {
        let json = match tokio::fs::read(&self.path).await {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("read {}", self.path.display()));
            }
        };
        let credential = serde_json::from_slice(&json)
            .with_context(|| format!("parse credential in {}", self.path.display()))?;
        Ok(Some(credential))
    }

    async fn save(&self, credential: &Credential) -> eyre::Result<()> {
        let json = serde_json::to_vec_pretty(credential).context("serialize credential")?;

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);
        let mut file = options
            .open(&self.path)
            .await
            .with_context(|| format!("open {}", self.path.display()))?;

        // a slot that already existed keeps its old mode on open
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))
                .await
                .with_context(|| format!("restrict permissions of {}", self.path.display()))?;
        }

        file.write_all(&json)
            .await
            .with_context(|| format!("write {}", self.path.display()))?;
        file.flush()
            .await
            .with_context(|| format!("write {}", self.path.display()))?;
        Ok(())
    }
}

/// Keeps the cached credential usable.
#[derive(Debug)]
pub struct CredentialManager<A, S> {
    authorizer: A,
    store: S,
    app_credentials_file: PathBuf,
    http: reqwest::Client,
}

impl<A, S> CredentialManager<A, S>
where
    A: Authorizer,
    S: CredentialStore,
{
    /// # Arguments
    ///
    /// * `authorizer` - Runs consent and refresh against the authorization server
    /// * `store` - The credential slot
    /// * `app_credentials_file` - Client-secret file, only read when consent is needed
    /// * `http` - HTTP client handed to every [`YouTubeClient`] this manager produces
    pub fn new(
        authorizer: A,
        store: S,
        app_credentials_file: impl Into<PathBuf>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            authorizer,
            store,
            app_credentials_file: app_credentials_file.into(),
            http,
        }
    }

    /// Returns a credential that is valid right now.
    ///
    /// With `force_new` the cached credential is ignored and consent always runs.
    pub async fn credential(&self, force_new: bool) -> Result<Credential, AuthError> {
        self.credential_at(force_new, Timestamp::now()).await
    }

    #[instrument(skip(self), level = "debug")]
    pub(crate) async fn credential_at(
        &self,
        force_new: bool,
        now: Timestamp,
    ) -> Result<Credential, AuthError> {
        let cached = if force_new {
            tracing::info!("discarding cached credential");
            None
        } else {
            match self.store.load().await {
                Ok(cached) => cached,
                Err(e) => {
                    tracing::warn!("ignoring unreadable credential cache: {e:#}");
                    None
                }
            }
        };

        let credential = match cached {
            Some(cached) if cached.is_valid_at(now) => {
                tracing::debug!(expiry = ?cached.expiry, "reusing cached credential");
                return Ok(cached);
            }
            Some(cached) if cached.refresh_token.is_some() => {
                tracing::info!("cached credential expired, refreshing");
                self.authorizer.refresh(&cached).await?
            }
            _ => {
                tracing::info!("no usable credential, starting interactive login");
                self.authorizer.consent(&self.app_credentials_file).await?
            }
        };

        if let Err(e) = self.store.save(&credential).await {
            tracing::warn!("could not cache credential: {e:#}");
        }

        Ok(credential)
    }
}

impl<A, S> Authenticator for CredentialManager<A, S>
where
    A: Authorizer + Sync,
    S: CredentialStore + Sync,
{
    type Api = YouTubeClient;

    async fn authenticate(&self, force_new: bool) -> Result<YouTubeClient, AuthError> {
        let credential = self.credential(force_new).await?;
        Ok(YouTubeClient::new(credential.access_token, self.http.clone()))
    }
}
