//! users list | create | update | delete (admin only)

use blog_console_protocol::{Role, UpdateUserRequest};
use console_core::{filter_users, NewUserForm, Notice, Route};

use super::{CliError, CommandResult, Context};
use crate::output::{render_identity, render_users};

pub fn list(ctx: &Context, search: Option<String>) -> CommandResult {
    let console = ctx.open_protected(Route::Users)?;
    let users = console
        .users()
        .list()
        .map_err(|err| CliError::action(err, "Failed to fetch users"))?;
    let shown = filter_users(&users, search.as_deref().unwrap_or(""));
    Ok(ctx.render(&shown, || render_users(&shown)))
}

pub fn create(ctx: &Context, form: NewUserForm) -> CommandResult {
    form.validate()
        .map_err(|err| CliError::Notice(Notice::error(err.to_string())))?;
    let console = ctx.open_protected(Route::Users)?;
    let user = console
        .users()
        .create(&form)
        .map_err(|err| CliError::action(err, "Failed to create user"))?;
    Ok(ctx.render(&user, || {
        format!(
            "{}\n{}",
            Notice::success("User created successfully"),
            render_identity(&user)
        )
    }))
}

pub fn update(ctx: &Context, user_id: i64, changes: UpdateUserRequest) -> CommandResult {
    let console = ctx.open_protected(Route::Users)?;
    let user = console
        .users()
        .update(user_id, &changes)
        .map_err(|err| CliError::action(err, "Failed to update user"))?;
    Ok(ctx.render(&user, || {
        format!(
            "{}\n{}",
            Notice::success("User updated successfully"),
            render_identity(&user)
        )
    }))
}

pub fn delete(ctx: &Context, user_id: i64) -> CommandResult {
    let console = ctx.open_protected(Route::Users)?;
    console
        .users()
        .delete(user_id)
        .map_err(|err| CliError::action(err, "Failed to delete user"))?;
    Ok(Notice::success("User deleted successfully").to_string())
}

/// Accepts `admin`, `ROLE_ADMIN`, and so on; unknown names pass through.
pub fn normalize_role(value: &str) -> String {
    let upper = value.trim().to_ascii_uppercase();
    let prefixed = if upper.starts_with("ROLE_") {
        upper
    } else {
        format!("ROLE_{}", upper)
    };
    match Role::parse(&prefixed) {
        Role::Unknown => value.trim().to_string(),
        known => known.as_str().to_string(),
    }
}
