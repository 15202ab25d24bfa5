pub mod identity;
pub mod profile;

pub use identity::{AuthState, DevIdentity, HostedIdentity, IdentityError, IdentityProvider, UserProfile};

/// The branch the access gate renders for a given auth state.
#[derive(Debug, Clone, PartialEq)]
pub enum GateView {
    Loading,
    Failed(String),
    SignInRequired,
    Granted(UserProfile),
}

/// Pure guard over the identity capability's pushed state: loading and
/// error states short-circuit everything behind the gate; only an
/// authenticated user gets through. No retry logic; state changes are
/// pushed by the identity capability itself.
pub fn gate_view(state: &AuthState) -> GateView {
    if state.is_loading {
        return GateView::Loading;
    }
    if let Some(error) = &state.error {
        return GateView::Failed(error.clone());
    }
    if state.is_authenticated {
        if let Some(user) = &state.user {
            return GateView::Granted(user.clone());
        }
    }
    GateView::SignInRequired
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserProfile {
        UserProfile {
            sub: "user-1".to_string(),
            email: Some("viewer@example.com".to_string()),
            username: Some("viewer".to_string()),
        }
    }

    #[test]
    fn test_loading_short_circuits() {
        let state = AuthState {
            is_loading: true,
            is_authenticated: true,
            user: Some(user()),
            error: None,
        };
        assert_eq!(gate_view(&state), GateView::Loading);
    }

    #[test]
    fn test_error_surfaces() {
        let state = AuthState {
            is_loading: false,
            is_authenticated: false,
            user: None,
            error: Some("token exchange failed".to_string()),
        };
        assert_eq!(
            gate_view(&state),
            GateView::Failed("token exchange failed".to_string())
        );
    }

    #[test]
    fn test_authenticated_user_granted() {
        let state = AuthState {
            is_loading: false,
            is_authenticated: true,
            user: Some(user()),
            error: None,
        };
        assert_eq!(gate_view(&state), GateView::Granted(user()));
    }

    #[test]
    fn test_unauthenticated_requires_sign_in() {
        let state = AuthState::default();
        assert_eq!(gate_view(&state), GateView::SignInRequired);
    }

    #[test]
    fn test_authenticated_without_profile_requires_sign_in() {
        let state = AuthState {
            is_loading: false,
            is_authenticated: true,
            user: None,
            error: None,
        };
        assert_eq!(gate_view(&state), GateView::SignInRequired);
    }
}
