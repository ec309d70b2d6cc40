//! Login, logout, identity fetch, and profile update.

use blog_console_protocol::{
    ProfileUpdate, SigninRequest, SigninResponse, UserIdentity, ME_PATH, PROFILE_PATH,
    SIGNIN_PATH, SIGNOUT_PATH,
};
use tracing::{debug, info, warn};

use crate::client::ApiClient;
use crate::error::{ConsoleError, Result};
use crate::navigation::{Navigator, Route};
use crate::session::{Session, SessionPort};
use crate::transport::{HttpRequest, Method};
use crate::validation::LoginForm;

pub const LOGIN_FAILED: &str = "Login failed";
pub const INVALID_CREDENTIALS: &str = "Invalid username or password";
pub const IDENTITY_FETCH_FAILED: &str = "Failed to get user data";

/// Message shown for a failed login.
pub fn login_error_message(err: &ConsoleError) -> String {
    match err {
        ConsoleError::Validation(validation) => validation.to_string(),
        ConsoleError::Unauthorized { .. } => INVALID_CREDENTIALS.to_string(),
        ConsoleError::Http { message, .. } => message.clone(),
        _ => LOGIN_FAILED.to_string(),
    }
}

/// Submits credentials. On success token and identity come from the same
/// response; no identity fetch follows.
pub fn login(client: &ApiClient, session: &Session, form: &LoginForm) -> Result<UserIdentity> {
    form.validate()?;
    session.begin_loading();

    let request = SigninRequest {
        username: form.username.trim().to_string(),
        password: form.password.clone(),
    };
    let outcome = client
        .post_json::<_, SigninResponse>(SIGNIN_PATH, &request)
        .and_then(|response| {
            let token = response
                .token
                .filter(|token| !token.is_empty())
                .ok_or(ConsoleError::MissingToken)?;
            session.establish(&token, response.user.clone())?;
            Ok(response.user)
        });

    match outcome {
        Ok(identity) => {
            info!(username = %identity.username, "Logged in");
            Ok(identity)
        }
        Err(err) => {
            warn!(error = %err, "Login failed");
            session.fail_loading(login_error_message(&err));
            Err(err)
        }
    }
}

/// Explicit logout. The signout call is best-effort; local state clears
/// regardless, and navigation is an in-app transition. A rejected token on
/// signout never arms the redirect guard.
pub fn logout(client: &ApiClient, session: &Session, navigator: &dyn Navigator) {
    if session.token_present() {
        let signout = HttpRequest::new(Method::Post, SIGNOUT_PATH);
        if let Err(err) = client.send_without_expiry(signout) {
            debug!(error = %err, "Signout request failed; clearing locally anyway");
        }
    }
    session.clear_session();
    session.clear_attempt();
    session.clear_error();
    info!("Logged out");
    navigator.navigate(&Route::Login);
}

/// Fetches the current user. Any failure drops token, flag, and identity.
pub fn fetch_identity(client: &ApiClient, session: &Session) -> Result<UserIdentity> {
    session.begin_loading();
    match client.get_json::<UserIdentity>(ME_PATH) {
        Ok(identity) => {
            if session.complete_identity_fetch(identity.clone()) {
                info!(username = %identity.username, "Identity loaded");
            }
            Ok(identity)
        }
        Err(err) => {
            warn!(error = %err, "Identity fetch failed");
            session.fail_identity_fetch(IDENTITY_FETCH_FAILED);
            Err(err)
        }
    }
}

pub fn update_profile(
    client: &ApiClient,
    session: &Session,
    update: &ProfileUpdate,
) -> Result<UserIdentity> {
    let identity: UserIdentity = client.put_json(PROFILE_PATH, update)?;
    if !session.set_identity(identity.clone()) {
        debug!("Profile updated after session was cleared");
    }
    Ok(identity)
}
