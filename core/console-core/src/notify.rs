//! User-facing notices for finished actions.

use std::fmt;

use serde::Serialize;

use crate::blogs::StepOutcome;
use crate::error::{ConsoleError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    /// Validation failures speak for themselves; anything else gets the
    /// action's fallback text.
    pub fn failure(err: &ConsoleError, fallback: &str) -> Self {
        match err {
            ConsoleError::Validation(validation) => Self::error(validation.to_string()),
            _ => Self::error(fallback),
        }
    }

    pub fn from_result<T>(result: &Result<T>, success: &str, fallback: &str) -> Self {
        match result {
            Ok(_) => Self::success(success),
            Err(err) => Self::failure(err, fallback),
        }
    }

    /// Notice for a two-step blog save.
    pub fn from_outcome(outcome: &Result<StepOutcome>, success: &str, fallback: &str) -> Self {
        match outcome {
            Ok(StepOutcome::Complete(_)) => Self::success(success),
            Ok(StepOutcome::ImagesFailed { blog, .. }) => Self::error(format!(
                "Blog {} was saved, but uploading images failed",
                blog.blog_id
            )),
            Err(err) => Self::failure(err, fallback),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self.level {
            NoticeLevel::Success => "✓",
            NoticeLevel::Error => "✗",
        };
        write!(f, "{} {}", marker, self.message)
    }
}
