//! blogs list | show | create | update | delete | delete-image

use std::path::{Path, PathBuf};

use console_core::validation::{check_image_capacity, remaining_image_slots};
use console_core::{BlogDraft, ImageFile, Notice, Route, StepOutcome};

use super::{read_text_file, CliError, CommandResult, Context};
use crate::output::{render_blog, render_blog_page};

/// Description given inline or as a file path.
pub struct DescriptionSource {
    pub inline: Option<String>,
    pub file: Option<PathBuf>,
}

impl DescriptionSource {
    fn resolve(&self) -> Result<Option<String>, CliError> {
        match (&self.inline, &self.file) {
            (Some(text), _) => Ok(Some(text.clone())),
            (None, Some(path)) => read_text_file(path).map(Some),
            (None, None) => Ok(None),
        }
    }
}

fn load_images(paths: &[PathBuf]) -> Result<Vec<ImageFile>, CliError> {
    paths.iter().map(|path| load_image(path)).collect()
}

fn load_image(path: &Path) -> Result<ImageFile, CliError> {
    ImageFile::load(path).map_err(|err| CliError::action(err, "Failed to read image"))
}

fn outcome_result(outcome: StepOutcome, success: &str) -> CommandResult {
    match outcome {
        StepOutcome::Complete(blog) => Ok(format!(
            "{}\n{}",
            Notice::success(success),
            render_blog(&blog)
        )),
        partial @ StepOutcome::ImagesFailed { .. } => {
            let notice = Notice::from_outcome(&Ok(partial), success, success);
            Err(CliError::Notice(notice))
        }
    }
}

pub fn list(ctx: &Context, page: Option<u32>, size: Option<u32>) -> CommandResult {
    let console = ctx.open_protected(Route::Blogs)?;
    let page = console
        .blogs()
        .list(page, size)
        .map_err(|err| CliError::action(err, "Failed to fetch blogs"))?;
    Ok(ctx.render(&page, || render_blog_page(&page)))
}

pub fn show(ctx: &Context, blog_id: i64) -> CommandResult {
    let console = ctx.open_protected(Route::BlogDetail(blog_id))?;
    let blog = console
        .blogs()
        .get(blog_id)
        .map_err(|err| CliError::action(err, "Failed to fetch blog"))?;
    Ok(ctx.render(&blog, || render_blog(&blog)))
}

pub fn create(
    ctx: &Context,
    title: String,
    description: DescriptionSource,
    images: &[PathBuf],
) -> CommandResult {
    let description = description.resolve()?.unwrap_or_default();
    let draft = BlogDraft::new(title, description);
    // Field checks come before touching image files or the network.
    draft
        .validate()
        .and_then(|_| check_image_capacity(0, 0, images.len()))
        .map_err(|err| CliError::Notice(Notice::error(err.to_string())))?;
    let images = load_images(images)?;

    let console = ctx.open_protected(Route::CreateBlog)?;
    let outcome = console
        .blogs()
        .publish(&draft, &images)
        .map_err(|err| CliError::action(err, "Failed to create blog"))?;
    outcome_result(outcome, "Blog created successfully!")
}

pub fn update(
    ctx: &Context,
    blog_id: i64,
    title: Option<String>,
    description: DescriptionSource,
    images: &[PathBuf],
) -> CommandResult {
    let description = description.resolve()?;
    let images = load_images(images)?;

    let console = ctx.open_protected(Route::EditBlog(blog_id))?;
    let current = console
        .blogs()
        .get(blog_id)
        .map_err(|err| CliError::action(err, "Failed to fetch blog"))?;
    let draft = BlogDraft::new(
        title.unwrap_or(current.title),
        description.unwrap_or(current.description),
    );
    let outcome = console
        .blogs()
        .revise(blog_id, &draft, current.images.len(), &images)
        .map_err(|err| CliError::action(err, "Failed to update blog"))?;
    let slots = match &outcome {
        StepOutcome::Complete(blog) => remaining_image_slots(blog.images.len(), 0),
        StepOutcome::ImagesFailed { .. } => 0,
    };
    outcome_result(outcome, "Blog updated successfully!")
        .map(|text| format!("{}\n{}", text, slots_line(slots)))
}

fn slots_line(slots: usize) -> String {
    match slots {
        0 => "No image slots left".to_string(),
        1 => "1 image slot left".to_string(),
        n => format!("{} image slots left", n),
    }
}

pub fn delete(ctx: &Context, blog_id: i64) -> CommandResult {
    let console = ctx.open_protected(Route::Blogs)?;
    console
        .blogs()
        .delete(blog_id)
        .map_err(|err| CliError::action(err, "Failed to delete blog"))?;
    Ok(Notice::success("Blog deleted successfully").to_string())
}

pub fn delete_image(ctx: &Context, image_id: i64) -> CommandResult {
    let console = ctx.open_protected(Route::Blogs)?;
    console
        .blogs()
        .delete_image(image_id)
        .map_err(|err| CliError::action(err, "Failed to delete image"))?;
    Ok(Notice::success("Image deleted successfully").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn inline_description_wins_over_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("body.html");
        std::fs::write(&path, "<p>from file</p>").unwrap();

        let both = DescriptionSource {
            inline: Some("inline".to_string()),
            file: Some(path.clone()),
        };
        assert_eq!(both.resolve().unwrap().as_deref(), Some("inline"));

        let file_only = DescriptionSource {
            inline: None,
            file: Some(path),
        };
        assert_eq!(
            file_only.resolve().unwrap().as_deref(),
            Some("<p>from file</p>")
        );
    }

    #[test]
    fn slot_count_reads_naturally() {
        assert_eq!(slots_line(0), "No image slots left");
        assert_eq!(slots_line(1), "1 image slot left");
        assert_eq!(slots_line(7), "7 image slots left");
    }

    #[test]
    fn missing_description_file_is_an_input_error() {
        let source = DescriptionSource {
            inline: None,
            file: Some(PathBuf::from("/nonexistent/body.html")),
        };
        assert!(matches!(source.resolve(), Err(CliError::Input { .. })));
    }
}
