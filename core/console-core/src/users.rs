//! User administration (admin only on the backend).

use blog_console_protocol::{
    user_path, CreateUserRequest, UpdateUserRequest, UserIdentity, USERS_PATH,
};
use tracing::info;

use crate::client::ApiClient;
use crate::error::Result;
use crate::validation::NewUserForm;

pub struct UserService<'a> {
    client: &'a ApiClient,
}

impl<'a> UserService<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub fn list(&self) -> Result<Vec<UserIdentity>> {
        self.client.get_json(USERS_PATH)
    }

    pub fn create(&self, form: &NewUserForm) -> Result<UserIdentity> {
        form.validate()?;
        let request = CreateUserRequest {
            username: form.username.trim().to_string(),
            password: form.password.clone(),
            full_name: non_empty(form.full_name.as_deref()),
            phone_number: non_empty(form.phone_number.as_deref()),
            role: form.role.clone(),
        };
        let user: UserIdentity = self.client.post_json(USERS_PATH, &request)?;
        info!(user_id = user.user_id, username = %user.username, "User created");
        Ok(user)
    }

    pub fn update(&self, user_id: i64, changes: &UpdateUserRequest) -> Result<UserIdentity> {
        let user: UserIdentity = self.client.put_json(&user_path(user_id), changes)?;
        info!(user_id, "User updated");
        Ok(user)
    }

    pub fn delete(&self, user_id: i64) -> Result<()> {
        self.client.delete(&user_path(user_id))?;
        info!(user_id, "User deleted");
        Ok(())
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Case-insensitive search over username and full name.
pub fn filter_users<'u>(users: &'u [UserIdentity], query: &str) -> Vec<&'u UserIdentity> {
    let needle = query.trim().to_lowercase();
    users
        .iter()
        .filter(|user| {
            needle.is_empty()
                || user.username.to_lowercase().contains(&needle)
                || user
                    .full_name
                    .as_deref()
                    .map(|name| name.to_lowercase().contains(&needle))
                    .unwrap_or(false)
        })
        .collect()
}
