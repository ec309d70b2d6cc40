//! login, logout, whoami, status, profile.

use std::io::{self, BufRead};

use blog_console_protocol::ProfileUpdate;
use console_core::navigation::post_login_destination;
use console_core::{JsonFileStore, LoginForm, Notice, Route};
use tracing::warn;

use super::{CliError, CommandResult, Context};
use crate::output::{render_identity, render_status};

pub fn login(
    ctx: &Context,
    username: String,
    password: Option<String>,
    next: Option<&str>,
) -> CommandResult {
    let from = next.map(parse_route).transpose()?;
    let password = match password {
        Some(password) => password,
        None => read_password_line(io::stdin().lock())?,
    };
    let console = ctx.open()?;
    let identity = console
        .login(&LoginForm::new(username, password))
        .map_err(|err| {
            // Login failures carry their own message in the session error slot.
            let message = console
                .snapshot()
                .error
                .unwrap_or_else(|| err.to_string());
            CliError::Notice(Notice::error(message))
        })?;
    let destination = post_login_destination(from.as_ref());
    Ok(ctx.render(&identity, || {
        format!(
            "{}\n{}\nContinue at {}",
            Notice::success("Logged in"),
            render_identity(&identity),
            destination
        )
    }))
}

fn parse_route(path: &str) -> Result<Route, CliError> {
    Route::parse(path)
        .ok_or_else(|| CliError::Notice(Notice::error(format!("Unknown route: {}", path))))
}

fn read_password_line(mut input: impl BufRead) -> Result<String, CliError> {
    let mut line = String::new();
    input
        .read_line(&mut line)
        .map_err(|source| CliError::Input {
            what: "password from stdin".to_string(),
            source,
        })?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

pub fn logout(ctx: &Context) -> CommandResult {
    let console = ctx.open()?;
    console.logout();
    let tab = JsonFileStore::new(ctx.storage.tab_file(&ctx.scope));
    if let Err(err) = tab.destroy() {
        warn!(error = %err, "Failed to remove tab scope file");
    }
    Ok(Notice::success("Logged out").to_string())
}

pub fn whoami(ctx: &Context) -> CommandResult {
    let console = ctx.open_protected(Route::Profile)?;
    match console.snapshot().identity {
        Some(identity) => Ok(ctx.render(&identity, || render_identity(&identity))),
        None => Err(CliError::Notice(Notice::error(
            "Still loading user data. Try again in a moment.",
        ))),
    }
}

/// Local view of the stored session. Makes no requests.
pub fn status(ctx: &Context) -> CommandResult {
    let console = ctx.open()?;
    let snapshot = console.snapshot();
    let value = serde_json::json!({
        "tab": ctx.scope,
        "tokenPresent": snapshot.token_present,
        "attemptStarted": snapshot.attempt_started,
        "redirecting": snapshot.redirecting,
    });
    Ok(ctx.render(&value, || render_status(&snapshot, &ctx.scope)))
}

pub fn profile(
    ctx: &Context,
    full_name: Option<String>,
    phone_number: Option<String>,
) -> CommandResult {
    let console = ctx.open_protected(Route::Profile)?;
    if full_name.is_none() && phone_number.is_none() {
        return match console.snapshot().identity {
            Some(identity) => Ok(ctx.render(&identity, || render_identity(&identity))),
            None => Err(CliError::Notice(Notice::error("Failed to get user data"))),
        };
    }

    let update = ProfileUpdate {
        full_name,
        phone_number,
    };
    let identity = console
        .update_profile(&update)
        .map_err(|err| CliError::action(err, "Failed to update profile"))?;
    Ok(ctx.render(&identity, || {
        format!(
            "{}\n{}",
            Notice::success("Profile updated successfully"),
            render_identity(&identity)
        )
    }))
}
