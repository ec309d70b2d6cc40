//! REST wire types for the blog admin console backend.
//!
//! This crate is shared by the console library and the CLI to prevent schema
//! drift. The backend remains the authority on validation; these types only
//! mirror the JSON it produces and accepts (camelCase field names).

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

pub const API_PREFIX: &str = "/api";

pub const SIGNIN_PATH: &str = "/api/auth/signin";
pub const SIGNOUT_PATH: &str = "/api/auth/signout";
pub const ME_PATH: &str = "/api/auth/me";
pub const PROFILE_PATH: &str = "/api/auth/profile";
pub const USERS_PATH: &str = "/api/auth/users";
pub const BLOGS_PATH: &str = "/api/blogs";

pub const DEFAULT_PAGE_SIZE: u32 = 10;

pub fn user_path(user_id: i64) -> String {
    format!("{}/{}", USERS_PATH, user_id)
}

pub fn blog_path(blog_id: i64) -> String {
    format!("{}/{}", BLOGS_PATH, blog_id)
}

pub fn blog_images_path(blog_id: i64) -> String {
    format!("{}/{}/images/multiple", BLOGS_PATH, blog_id)
}

pub fn blog_image_path(image_id: i64) -> String {
    format!("{}/images/{}", BLOGS_PATH, image_id)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Identity
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Collaborator,
    User,
    Unknown,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ROLE_ADMIN",
            Role::Collaborator => "ROLE_COLLABORATOR",
            Role::User => "ROLE_USER",
            Role::Unknown => "ROLE_UNKNOWN",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "ROLE_ADMIN" => Role::Admin,
            "ROLE_COLLABORATOR" => Role::Collaborator,
            "ROLE_USER" => Role::User,
            _ => Role::Unknown,
        }
    }

    /// Display label without the `ROLE_` prefix.
    pub fn label(&self) -> &'static str {
        self.as_str().trim_start_matches("ROLE_")
    }

    pub fn can_manage_users(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// Server-verified profile of a user. Also the shape of user-management rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub user_id: i64,
    pub username: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl UserIdentity {
    pub fn role(&self) -> Role {
        Role::parse(&self.role)
    }

    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.username)
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at.as_deref().and_then(parse_timestamp)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigninRequest {
    pub username: String,
    pub password: String,
}

/// Signin payload: identity fields plus the bearer token at the same level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigninResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(flatten)]
    pub user: UserIdentity,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub role: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Blogs
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogAuthor {
    pub user_id: i64,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogImage {
    pub image_id: i64,
    pub file_name: String,
    pub file_url: String,
    pub content_type: String,
    pub file_size: u64,
    pub display_order: i32,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    pub blog_id: i64,
    pub title: String,
    pub description: String,
    pub author: BlogAuthor,
    #[serde(default)]
    pub images: Vec<BlogImage>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogPayload {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pageable {
    #[serde(default)]
    pub page_number: u32,
}

/// Blog listings arrive either as a paged envelope or as a bare array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BlogListing {
    Paged {
        content: Vec<Blog>,
        #[serde(default, rename = "totalPages")]
        total_pages: Option<u32>,
        #[serde(default)]
        pageable: Option<Pageable>,
    },
    Plain(Vec<Blog>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPage {
    pub blogs: Vec<Blog>,
    pub total_pages: u32,
    pub current_page: u32,
}

impl BlogListing {
    pub fn into_page(self) -> BlogPage {
        match self {
            BlogListing::Paged {
                content,
                total_pages,
                pageable,
            } => BlogPage {
                blogs: content,
                total_pages: total_pages.filter(|pages| *pages > 0).unwrap_or(1),
                current_page: pageable.map(|p| p.page_number).unwrap_or(0),
            },
            BlogListing::Plain(blogs) => BlogPage {
                blogs,
                total_pages: 1,
                current_page: 0,
            },
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ApiErrorBody {
    /// Extracts the most specific human-readable message from an error body.
    pub fn parse_message(body: &[u8]) -> Option<String> {
        let parsed: ApiErrorBody = serde_json::from_slice(body).ok()?;
        parsed
            .message
            .or(parsed.error)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
    }
}

/// Parses backend timestamps, which may be RFC3339 or zone-less local times.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blog_json(id: i64) -> serde_json::Value {
        serde_json::json!({
            "blogId": id,
            "title": "Hello",
            "description": "Body",
            "author": { "userId": 1, "username": "admin" },
            "createdAt": "2026-01-30T12:00:00",
            "updatedAt": "2026-01-30T12:00:00"
        })
    }

    #[test]
    fn signin_response_flattens_identity_and_token() {
        let payload = r#"{"token":"abc.def","userId":1,"username":"admin","role":"ROLE_ADMIN"}"#;
        let response: SigninResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(response.token.as_deref(), Some("abc.def"));
        assert_eq!(response.user.user_id, 1);
        assert_eq!(response.user.username, "admin");
        assert_eq!(response.user.role(), Role::Admin);
        assert!(response.user.full_name.is_none());
    }

    #[test]
    fn profile_update_omits_absent_fields() {
        let update = ProfileUpdate {
            full_name: Some("Ada".to_string()),
            phone_number: None,
        };
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value, serde_json::json!({ "fullName": "Ada" }));
    }

    #[test]
    fn role_labels_strip_prefix() {
        assert_eq!(Role::parse("ROLE_COLLABORATOR").label(), "COLLABORATOR");
        assert_eq!(Role::parse("ROLE_SOMETHING"), Role::Unknown);
        assert!(Role::Admin.can_manage_users());
        assert!(!Role::Collaborator.can_manage_users());
    }

    #[test]
    fn paged_listing_reads_page_metadata() {
        let payload = serde_json::json!({
            "content": [blog_json(1), blog_json(2)],
            "totalPages": 4,
            "pageable": { "pageNumber": 2 }
        });
        let page = serde_json::from_value::<BlogListing>(payload)
            .unwrap()
            .into_page();
        assert_eq!(page.blogs.len(), 2);
        assert_eq!(page.total_pages, 4);
        assert_eq!(page.current_page, 2);
        assert!(page.blogs[0].images.is_empty());
    }

    #[test]
    fn plain_listing_defaults_to_single_page() {
        let payload = serde_json::json!([blog_json(7)]);
        let page = serde_json::from_value::<BlogListing>(payload)
            .unwrap()
            .into_page();
        assert_eq!(page.blogs[0].blog_id, 7);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.current_page, 0);
    }

    #[test]
    fn error_body_prefers_message_over_error() {
        let body = br#"{"message":"Bad credentials","error":"Unauthorized"}"#;
        assert_eq!(
            ApiErrorBody::parse_message(body).as_deref(),
            Some("Bad credentials")
        );
        assert_eq!(ApiErrorBody::parse_message(b"not json"), None);
    }

    #[test]
    fn parses_zone_less_timestamps() {
        let parsed = parse_timestamp("2026-01-30T12:00:00.123").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2026-01-30T12:00:00.123+00:00");
        assert!(parse_timestamp("2026-01-30T12:00:00Z").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn endpoint_paths_are_prefixed() {
        assert_eq!(blog_images_path(3), "/api/blogs/3/images/multiple");
        assert_eq!(blog_image_path(9), "/api/blogs/images/9");
        assert_eq!(user_path(5), "/api/auth/users/5");
        assert!(ME_PATH.starts_with(API_PREFIX));
    }
}
