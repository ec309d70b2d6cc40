//! Compiled regex patterns for reading rich-text (HTML) blog content.
//!
//! Blog descriptions are authored in a rich-text editor and stored as HTML.
//! These patterns reduce that HTML to its visible text for character counts.

use once_cell::sync::Lazy;
use regex::Regex;

pub static RE_HTML_BLOCK_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<\s*(br|/p|/div|/li|/h[1-6])\s*/?\s*>").unwrap());
pub static RE_HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
pub static RE_HTML_ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(nbsp|amp|lt|gt|quot|#39);").unwrap());
pub static RE_WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").unwrap());
