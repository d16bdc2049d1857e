//! OAuth 2.0 flows against Google's authorization server.
//!
//! This module performs the two network-facing credential operations: the interactive consent
//! flow (browser plus a loopback redirect endpoint) and the refresh-token exchange. Deciding
//! which one to run is up to [`CredentialManager`](crate::credentials::CredentialManager).

use crate::credentials::{AppCredentials, Authorizer, Credential, SCOPE};
use crate::error::AuthError;
use bytes::Bytes;
use eyre::Context;
use http_body_util::Full;
use hyper::service::service_fn;
use hyper::{Request, Response, body};
use jiff::Timestamp;
use oauth2::basic::{BasicClient, BasicTokenResponse};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge,
    RedirectUrl, RefreshToken, Scope, TokenUrl, reqwest,
};
use std::future::Future;
use std::path::Path;

const OAUTH_DONE_HTML: &str = include_str!("../oauth_success.html");

/// Runs OAuth 2.0 flows for the YouTube scope.
#[derive(Debug, Clone)]
pub struct OAuthManager {
    oauth_done_html: &'static str,
    http_client: reqwest::Client,
}

impl OAuthManager {
    pub fn new() -> eyre::Result<Self> {
        let http_client = reqwest::ClientBuilder::new()
            // SSRF no thank you.
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("build OAuth HTTP client")?;
        Ok(Self {
            oauth_done_html: OAUTH_DONE_HTML,
            http_client,
        })
    }

    /// Performs a complete OAuth 2.0 authorization flow to obtain a new access token.
    ///
    /// This method initiates the full OAuth flow, including:
    /// 1. Opening the user's browser for authorization
    /// 2. Setting up a local HTTP server to receive the authorization callback
    /// 3. Exchanging the authorization code for an access token
    ///
    /// Offline access is requested with a forced consent prompt so that Google hands out a
    /// refresh token every time. There is no timeout: the flow waits until the browser comes
    /// back.
    pub async fn authenticate(&self, app: &AppCredentials) -> eyre::Result<BasicTokenResponse> {
        let csrf = CsrfToken::new_random();
        let (redirect_url, eventually_authorization_code) = self
            .setup_redirect(csrf.clone())
            .await
            .context("set up redirect endpoint")?;

        let auth_url = AuthUrl::new(app.auth_uri.clone()).context("invalid authorization URL")?;
        let token_url = TokenUrl::new(app.token_uri.clone()).context("invalid token URL")?;
        let mut client = BasicClient::new(ClientId::new(app.client_id.clone()))
            .set_auth_uri(auth_url)
            .set_token_uri(token_url)
            .set_redirect_uri(redirect_url);
        if let Some(secret) = &app.client_secret {
            client = client.set_client_secret(ClientSecret::new(secret.clone()));
        }

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
        let (auth_url, _csrf_token) = client
            // We never re-use the CSRF since we only go through the flow exactly once.
            .authorize_url(move || csrf)
            .add_scope(Scope::new(SCOPE.to_string()))
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent")
            .set_pkce_challenge(pkce_challenge)
            .url();

        tracing::info!(url = %auth_url, "asking user to follow OAuth flow");
        if let Err(e) = webbrowser::open(auth_url.as_ref()) {
            tracing::warn!("could not open a browser ({e}); open the URL above manually");
        }
        let authorization_code = eventually_authorization_code
            .await
            .context("await user authorization code")?;

        let token_result = client
            .exchange_code(authorization_code)
            .set_pkce_verifier(pkce_verifier)
            .request_async(&self.http_client)
            .await
            .context("exchange authorization code with access token")?;

        Ok(token_result)
    }

    /// Exchanges the refresh token of `credential` for a new access token.
    ///
    /// A rejected refresh token (`invalid_grant`) is an error like any other; the caller has to
    /// go through [`Self::authenticate`] again.
    pub async fn refresh_token(&self, credential: &Credential) -> eyre::Result<BasicTokenResponse> {
        let Some(refresh_token) = &credential.refresh_token else {
            eyre::bail!("no refresh token available");
        };

        tracing::debug!("attempting to refresh OAuth token");

        let token_url =
            TokenUrl::new(credential.token_uri.clone()).context("invalid token URL")?;
        let mut client =
            BasicClient::new(ClientId::new(credential.client_id.clone())).set_token_uri(token_url);
        if let Some(secret) = &credential.client_secret {
            client = client.set_client_secret(ClientSecret::new(secret.clone()));
        }

        match client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.clone()))
            .request_async(&self.http_client)
            .await
        {
            Ok(new_token) => {
                tracing::debug!("successfully refreshed OAuth token");
                Ok(new_token)
            }
            Err(ref e @ oauth2::RequestTokenError::ServerResponse(ref sr))
                if matches!(
                    sr.error(),
                    oauth2::basic::BasicErrorResponseType::InvalidGrant
                ) =>
            {
                Err(eyre::eyre!("refresh token was revoked or has expired: {e}"))
            }
            Err(e) => Err(e).context("exchange refresh token"),
        }
    }

    /// Sets up a local HTTP server to receive the OAuth authorization callback.
    ///
    /// Creates a temporary HTTP server on a random local port to handle the OAuth
    /// redirect after user authorization. The server validates the CSRF token and
    /// extracts the authorization code from the callback.
    ///
    /// # Returns
    ///
    /// A tuple containing:
    /// - The redirect URL to use in the OAuth flow
    /// - A future that resolves to the authorization code when the callback is received
    async fn setup_redirect(
        &self,
        csrf: CsrfToken,
    ) -> eyre::Result<(
        RedirectUrl,
        impl Future<Output = eyre::Result<AuthorizationCode>>,
    )> {
        let socket = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .context("bind to localhost")?;
        let addr = socket.local_addr().context("get local address")?;
        let url = RedirectUrl::new(format!("http://{}:{}", addr.ip(), addr.port()))
            .context("construct redirect url")?;
        let (tx, rx) = tokio::sync::oneshot::channel();
        let oauth_done = self.oauth_done_html;
        tokio::spawn(async move {
            let r = async move {
                let (conn, _) = socket.accept().await.context("accept")?;
                let conn = hyper_util::rt::TokioIo::new(conn);
                let (got, mut gotten) = tokio::sync::mpsc::channel(1);
                let service = service_fn(move |req: Request<body::Incoming>| {
                    let csrf = csrf.clone();
                    let got = got.clone();
                    async move {
                        let code = parse_callback(req.uri().query().unwrap_or(""), &csrf)?;
                        got.send(code)
                            .await
                            .map_err(|_| "redirect server is shutting down")?;
                        Ok::<_, &'static str>(Response::new(Full::<Bytes>::from(oauth_done)))
                    }
                });
                let mut serve = std::pin::pin!(
                    hyper::server::conn::http1::Builder::new().serve_connection(conn, service)
                );

                tokio::select! {
                    exit = &mut serve => {
                        if let Err(e) = exit {
                            Err(e).context("redirect server got bad request")
                        } else {
                            eyre::bail!("redirect server exit prematurely");
                        }
                    }
                    code = gotten.recv() => {
                        let code = code.ok_or_else(|| eyre::eyre!("redirect service went away"))?;
                        // let the completion page reach the browser before closing
                        serve.as_mut().graceful_shutdown();
                        if let Err(e) = serve.await {
                            tracing::debug!("redirect connection closed uncleanly: {e}");
                        }
                        Ok(code)
                    }
                }
            };
            let _ = tx.send(r.await);
        });
        Ok((url, async move {
            rx.await.context("redirect future dropped prematurely")?
        }))
    }
}

/// Extracts the authorization code from the query of the redirect request.
///
/// The `state` parameter must echo `csrf`; anything else is rejected before the code is
/// looked at.
fn parse_callback(query: &str, csrf: &CsrfToken) -> Result<AuthorizationCode, &'static str> {
    let mut presented_state = None;
    let mut presented_code = None;
    let mut presented_error = None;
    for (k, v) in form_urlencoded::parse(query.as_bytes()) {
        match &*k {
            "state" => presented_state = Some(v),
            "code" => presented_code = Some(v),
            "error" => presented_error = Some(v),
            _ => {}
        }
    }
    if presented_state.as_deref() != Some(csrf.secret().as_str()) {
        return Err("invalid csrf token");
    }
    if presented_error.is_some() {
        return Err("authorization was denied");
    }
    let Some(code) = presented_code else {
        return Err("no authorization code found");
    };
    Ok(AuthorizationCode::new(code.into_owned()))
}

impl Authorizer for OAuthManager {
    async fn consent(&self, app_credentials_file: &Path) -> Result<Credential, AuthError> {
        let app = AppCredentials::from_file(app_credentials_file)
            .await
            .map_err(|detail| AuthError::AppCredentials {
                path: app_credentials_file.to_path_buf(),
                detail,
            })?;
        let token = self.authenticate(&app).await.map_err(AuthError::Consent)?;
        tracing::info!("interactive login succeeded");
        Ok(Credential::minted(&token, &app, Timestamp::now()))
    }

    async fn refresh(&self, credential: &Credential) -> Result<Credential, AuthError> {
        let token = self
            .refresh_token(credential)
            .await
            .map_err(AuthError::Refresh)?;
        Ok(credential.refreshed(&token, Timestamp::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn csrf() -> CsrfToken {
        CsrfToken::new("expected-state".to_string())
    }

    #[test]
    fn callback_with_matching_state_yields_code() {
        let code = parse_callback("state=expected-state&code=4%2F0Ab&scope=x", &csrf()).unwrap();
        assert_eq!(code.secret(), "4/0Ab");
    }

    #[test]
    fn callback_with_wrong_state_is_rejected() {
        assert_eq!(
            parse_callback("state=forged&code=abc", &csrf()).unwrap_err(),
            "invalid csrf token"
        );
        assert_eq!(
            parse_callback("code=abc", &csrf()).unwrap_err(),
            "invalid csrf token"
        );
    }

    #[test]
    fn callback_without_code_is_rejected() {
        assert_eq!(
            parse_callback("state=expected-state&error=access_denied", &csrf()).unwrap_err(),
            "authorization was denied"
        );
        assert_eq!(
            parse_callback("state=expected-state", &csrf()).unwrap_err(),
            "no authorization code found"
        );
    }

    #[tokio::test]
    async fn redirect_endpoint_delivers_code_and_completion_page() {
        let manager = OAuthManager::new().unwrap();
        let (url, code) = manager.setup_redirect(csrf()).await.unwrap();

        let callback = format!(
            "{}/?state=expected-state&code=the-code",
            url.as_str().trim_end_matches('/')
        );
        let http = ::reqwest::Client::builder().no_proxy().build().unwrap();
        let page = http
            .get(callback)
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();

        assert_eq!(page, OAUTH_DONE_HTML);
        assert_eq!(code.await.unwrap().secret(), "the-code");
    }

    #[tokio::test]
    async fn app_credentials_file_problems_are_auth_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("client_secret.json");

        let err = OAuthManager::new()
            .unwrap()
            .consent(&missing)
            .await
            .unwrap_err();
        match err {
            AuthError::AppCredentials { path, .. } => assert_eq!(path, missing),
            other => panic!("unexpected error: {other}"),
        }
    }
}
