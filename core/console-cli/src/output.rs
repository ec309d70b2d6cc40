//! Plain-text rendering for command output.

use blog_console_protocol::{parse_timestamp, Blog, BlogPage, UserIdentity};
use console_core::navigation::role_label;
use console_core::validation::text_content;
use console_core::SessionSnapshot;

const PREVIEW_CHARS: usize = 80;

pub fn format_timestamp(value: &str) -> String {
    parse_timestamp(value)
        .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| value.to_string())
}

fn preview(html: &str) -> String {
    let text = text_content(html).replace('\n', " ");
    if text.chars().count() <= PREVIEW_CHARS {
        return text;
    }
    let cut: String = text.chars().take(PREVIEW_CHARS).collect();
    format!("{}…", cut.trim_end())
}

pub fn render_identity(user: &UserIdentity) -> String {
    let mut lines = vec![
        format!("{} (#{})", user.display_name(), user.user_id),
        format!("  username: {}", user.username),
        format!("  role:     {}", role_label(&user.role)),
    ];
    if let Some(phone) = user.phone_number.as_deref() {
        lines.push(format!("  phone:    {}", phone));
    }
    if let Some(created) = user.created_at.as_deref() {
        lines.push(format!("  joined:   {}", format_timestamp(created)));
    }
    lines.join("\n")
}

pub fn render_status(snapshot: &SessionSnapshot, scope: &str) -> String {
    let identity = snapshot
        .identity
        .as_ref()
        .map(|user| user.username.clone())
        .unwrap_or_else(|| "-".to_string());
    [
        format!("tab:              {}", scope),
        format!("token stored:     {}", yes_no(snapshot.token_present)),
        format!("identity:         {}", identity),
        format!("attempt flag:     {}", yes_no(snapshot.attempt_started)),
        format!("redirect guard:   {}", yes_no(snapshot.redirecting)),
    ]
    .join("\n")
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

pub fn render_blog_page(page: &BlogPage) -> String {
    if page.blogs.is_empty() {
        return "No blogs yet.".to_string();
    }
    let mut lines: Vec<String> = page
        .blogs
        .iter()
        .map(|blog| {
            format!(
                "#{:<5} {}  [{} image(s), by {}, {}]",
                blog.blog_id,
                blog.title,
                blog.images.len(),
                blog.author.username,
                format_timestamp(&blog.created_at)
            )
        })
        .collect();
    lines.push(format!(
        "page {} of {}",
        page.current_page + 1,
        page.total_pages.max(1)
    ));
    lines.join("\n")
}

pub fn render_blog(blog: &Blog) -> String {
    let mut lines = vec![
        format!("#{} {}", blog.blog_id, blog.title),
        format!(
            "by {}, created {}, updated {}",
            blog.author.full_name.as_deref().unwrap_or(&blog.author.username),
            format_timestamp(&blog.created_at),
            format_timestamp(&blog.updated_at)
        ),
        String::new(),
        preview(&blog.description),
    ];
    let mut images: Vec<_> = blog.images.iter().collect();
    images.sort_by_key(|image| image.display_order);
    for image in images {
        lines.push(format!(
            "  image #{} {} ({}, {} bytes)",
            image.image_id, image.file_name, image.content_type, image.file_size
        ));
    }
    lines.join("\n")
}

pub fn render_users(users: &[&UserIdentity]) -> String {
    let mut lines = vec![format!("All Users ({})", users.len())];
    for user in users {
        lines.push(format!(
            "#{:<5} {:<20} {:<14} {}",
            user.user_id,
            user.username,
            role_label(&user.role),
            user.full_name.as_deref().unwrap_or("")
        ));
    }
    lines.join("\n")
}
