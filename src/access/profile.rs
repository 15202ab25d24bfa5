use crate::access::identity::UserProfile;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// Wire payload for the profile sync endpoint. Field names match what the
/// backend expects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilePayload {
    pub sub: String,
    pub email: Option<String>,
    #[serde(rename = "cognitoUsername")]
    pub cognito_username: Option<String>,
}

impl From<&UserProfile> for ProfilePayload {
    fn from(user: &UserProfile) -> Self {
        Self {
            sub: user.sub.clone(),
            email: user.email.clone(),
            cognito_username: user.username.clone(),
        }
    }
}

/// Fire-and-forget profile sync, sent once per authenticated session start.
/// Failure never blocks access to the stream; it is logged and forgotten.
pub async fn sync_profile(endpoint: String, user: UserProfile) {
    let payload = ProfilePayload::from(&user);

    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            warn!(error = %e, "Could not build profile sync client");
            return;
        }
    };

    match client.post(&endpoint).json(&payload).send().await {
        Ok(response) if response.status().is_success() => {
            info!(sub = %payload.sub, "Profile synced");
        }
        Ok(response) => {
            warn!(
                sub = %payload.sub,
                status = response.status().as_u16(),
                "Profile sync rejected"
            );
        }
        Err(e) => {
            warn!(sub = %payload.sub, error = %e, "Profile sync failed");
        }
    }
}
