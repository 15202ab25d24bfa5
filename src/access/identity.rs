use crate::config::types::{DevUserConfig, IdentityConfig};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tracing::info;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("invalid authority URL: {0}")]
    Authority(String),

    #[error("hosted identity config incomplete: missing {0}")]
    MissingField(&'static str),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub sub: String,
    pub email: Option<String>,
    pub username: Option<String>,
}

impl From<&DevUserConfig> for UserProfile {
    fn from(config: &DevUserConfig) -> Self {
        Self {
            sub: config.sub.clone(),
            email: config.email.clone(),
            username: config.username.clone(),
        }
    }
}

/// State pushed by the identity capability.
#[derive(Debug, Clone, Default)]
pub struct AuthState {
    pub is_loading: bool,
    pub is_authenticated: bool,
    pub user: Option<UserProfile>,
    pub error: Option<String>,
}

/// Hosted login/redirect/token issuance, consumed as a capability. The
/// provider pushes state changes; callers never poll.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn state(&self) -> watch::Receiver<AuthState>;

    async fn sign_in(&self) -> Result<(), IdentityError>;

    async fn sign_out(&self) -> Result<(), IdentityError>;
}

/// Development identity: signs the configured user in immediately.
pub struct DevIdentity {
    user: UserProfile,
    state_tx: watch::Sender<AuthState>,
}

impl DevIdentity {
    pub fn new(user: UserProfile) -> Self {
        let (state_tx, _) = watch::channel(AuthState::default());
        Self { user, state_tx }
    }
}

#[async_trait]
impl IdentityProvider for DevIdentity {
    fn state(&self) -> watch::Receiver<AuthState> {
        self.state_tx.subscribe()
    }

    async fn sign_in(&self) -> Result<(), IdentityError> {
        info!(sub = %self.user.sub, "Dev identity authenticated");
        self.state_tx.send_replace(AuthState {
            is_loading: false,
            is_authenticated: true,
            user: Some(self.user.clone()),
            error: None,
        });
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        self.state_tx.send_replace(AuthState::default());
        Ok(())
    }
}

/// Hosted identity provider. Sign-in emits the authorization URL for the
/// host environment to open; the redirect and token exchange happen
/// outside this process, so the pushed state stays unauthenticated until
/// the provider reports back.
pub struct HostedIdentity {
    authority: String,
    client_id: String,
    redirect_uri: String,
    scopes: String,
    state_tx: watch::Sender<AuthState>,
}

impl HostedIdentity {
    pub fn new(config: &IdentityConfig) -> Result<Self, IdentityError> {
        let authority = config
            .authority
            .clone()
            .ok_or(IdentityError::MissingField("authority"))?;
        let client_id = config
            .client_id
            .clone()
            .ok_or(IdentityError::MissingField("client_id"))?;
        let redirect_uri = config
            .redirect_uri
            .clone()
            .ok_or(IdentityError::MissingField("redirect_uri"))?;

        let (state_tx, _) = watch::channel(AuthState::default());

        Ok(Self {
            authority,
            client_id,
            redirect_uri,
            scopes: config.scopes.clone(),
            state_tx,
        })
    }

    /// Authorization-code flow entry point.
    pub fn authorize_url(&self) -> Result<String, IdentityError> {
        let base = format!("{}/oauth2/authorize", self.authority.trim_end_matches('/'));
        let url = reqwest::Url::parse_with_params(
            &base,
            &[
                ("client_id", self.client_id.as_str()),
                ("response_type", "code"),
                ("scope", self.scopes.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
            ],
        )
        .map_err(|e| IdentityError::Authority(e.to_string()))?;
        Ok(url.to_string())
    }
}

#[async_trait]
impl IdentityProvider for HostedIdentity {
    fn state(&self) -> watch::Receiver<AuthState> {
        self.state_tx.subscribe()
    }

    async fn sign_in(&self) -> Result<(), IdentityError> {
        let url = self.authorize_url()?;
        info!(url = %url, "Open the sign-in URL to authenticate");
        println!("Sign in at: {}", url);
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        self.state_tx.send_replace(AuthState::default());
        Ok(())
    }
}
