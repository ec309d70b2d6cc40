//! Client-side form validation.
//!
//! Every check here runs before any network call. A rejected form never
//! touches session state or the backend; the error's `Display` text is the
//! message shown to the user.

use crate::patterns::{RE_HTML_BLOCK_BREAK, RE_HTML_ENTITY, RE_HTML_TAG, RE_WHITESPACE_RUN};

pub const MIN_DESCRIPTION_CHARS: usize = 150;
pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_BLOG_IMAGES: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Username and password are required")]
    MissingCredentials,

    #[error("Please fill in all required fields")]
    MissingRequiredFields,

    #[error("Description must be at least 150 characters")]
    DescriptionTooShort { length: usize },

    #[error("Title must be at most 200 characters")]
    TitleTooLong { length: usize },

    #[error("Maximum 10 images allowed total")]
    TooManyImages { requested: usize },

    #[error("Only image files can be uploaded: {file_name}")]
    UnsupportedImage { file_name: String },
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Submission is enabled only when both fields are non-empty.
    pub fn can_submit(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.can_submit() {
            Ok(())
        } else {
            Err(ValidationError::MissingCredentials)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BlogDraft {
    pub title: String,
    pub description: String,
}

impl BlogDraft {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }

    /// Length is measured on the raw description (markup included), matching
    /// what the backend stores.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() || self.description.trim().is_empty() {
            return Err(ValidationError::MissingRequiredFields);
        }

        let title_length = self.title.trim().chars().count();
        if title_length > MAX_TITLE_CHARS {
            return Err(ValidationError::TitleTooLong {
                length: title_length,
            });
        }

        let length = self.description.chars().count();
        if length < MIN_DESCRIPTION_CHARS {
            return Err(ValidationError::DescriptionTooShort { length });
        }

        Ok(())
    }

    /// Trimmed copy sent to the backend.
    pub fn normalized(&self) -> BlogDraft {
        BlogDraft {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
        }
    }
}

/// Rejects an image selection that would push a blog past the image limit.
///
/// `existing` counts images already attached server-side, `pending` those
/// already selected but not uploaded, `incoming` the new selection.
pub fn check_image_capacity(
    existing: usize,
    pending: usize,
    incoming: usize,
) -> Result<(), ValidationError> {
    let requested = existing + pending + incoming;
    if requested > MAX_BLOG_IMAGES {
        return Err(ValidationError::TooManyImages { requested });
    }
    Ok(())
}

/// Images that can still be attached to a blog.
pub fn remaining_image_slots(existing: usize, pending: usize) -> usize {
    MAX_BLOG_IMAGES.saturating_sub(existing + pending)
}

#[derive(Debug, Clone, Default)]
pub struct NewUserForm {
    pub username: String,
    pub password: String,
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub role: String,
}

impl NewUserForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.username.trim().is_empty() || self.password.is_empty() {
            return Err(ValidationError::MissingCredentials);
        }
        Ok(())
    }
}

/// Visible text of rich-text HTML, used for character counters.
pub fn text_content(html: &str) -> String {
    let with_breaks = RE_HTML_BLOCK_BREAK.replace_all(html, "\n");
    let stripped = RE_HTML_TAG.replace_all(&with_breaks, "");
    let decoded = RE_HTML_ENTITY.replace_all(&stripped, |caps: &regex::Captures| {
        match &caps[1] {
            "nbsp" => " ",
            "amp" => "&",
            "lt" => "<",
            "gt" => ">",
            "quot" => "\"",
            _ => "'",
        }
        .to_string()
    });
    RE_WHITESPACE_RUN
        .replace_all(&decoded, " ")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_requires_both_fields() {
        assert!(!LoginForm::new("admin", "").can_submit());
        assert!(!LoginForm::new("", "secret").can_submit());
        assert!(LoginForm::new("admin", "secret").can_submit());
        assert_eq!(
            LoginForm::default().validate(),
            Err(ValidationError::MissingCredentials)
        );
    }

    #[test]
    fn rejects_description_below_minimum() {
        let draft = BlogDraft::new("Title", "x".repeat(120));
        assert_eq!(
            draft.validate(),
            Err(ValidationError::DescriptionTooShort { length: 120 })
        );
        assert_eq!(
            draft.validate().unwrap_err().to_string(),
            "Description must be at least 150 characters"
        );
    }

    #[test]
    fn accepts_description_at_minimum() {
        let draft = BlogDraft::new("Title", "x".repeat(150));
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn rejects_blank_fields() {
        let draft = BlogDraft::new("   ", "x".repeat(200));
        assert_eq!(draft.validate(), Err(ValidationError::MissingRequiredFields));
    }

    #[test]
    fn rejects_long_titles() {
        let draft = BlogDraft::new("t".repeat(201), "x".repeat(200));
        assert_eq!(
            draft.validate(),
            Err(ValidationError::TitleTooLong { length: 201 })
        );
    }

    #[test]
    fn image_capacity_counts_existing_and_new() {
        assert_eq!(
            check_image_capacity(8, 0, 5),
            Err(ValidationError::TooManyImages { requested: 13 })
        );
        assert!(check_image_capacity(8, 1, 1).is_ok());
        assert_eq!(remaining_image_slots(8, 1), 1);
        assert_eq!(remaining_image_slots(12, 0), 0);
    }

    #[test]
    fn new_user_requires_username_and_password() {
        let form = NewUserForm {
            username: "editor".to_string(),
            password: String::new(),
            role: "ROLE_COLLABORATOR".to_string(),
            ..Default::default()
        };
        assert_eq!(form.validate(), Err(ValidationError::MissingCredentials));
    }

    #[test]
    fn text_content_strips_markup() {
        let html = "<p>Hello&nbsp;<strong>world</strong></p><p>a &amp; b</p>";
        assert_eq!(text_content(html), "Hello world\na & b");
    }
}
