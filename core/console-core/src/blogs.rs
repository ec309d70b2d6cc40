//! Blog service: listing, CRUD, and image uploads.
//!
//! `publish` and `revise` run every client-side check before the first
//! request. The content step and the image step are separate requests; an
//! image failure after saved content is reported as such and not rolled back.

use std::path::Path;

use blog_console_protocol::{
    blog_image_path, blog_images_path, blog_path, Blog, BlogImage, BlogListing, BlogPage,
    BlogPayload, BLOGS_PATH, DEFAULT_PAGE_SIZE,
};
use tracing::{info, warn};

use crate::client::ApiClient;
use crate::error::{ConsoleError, Result};
use crate::transport::{FilePart, HttpRequest, Method, RequestBody};
use crate::validation::{check_image_capacity, BlogDraft, ValidationError};

const FILES_FIELD: &str = "files";
const DISPLAY_ORDERS_FIELD: &str = "displayOrders";

/// An image read from disk, ready for multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn load(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let content_type = image_content_type(path).ok_or_else(|| {
            ValidationError::UnsupportedImage {
                file_name: file_name.clone(),
            }
        })?;
        let bytes = fs_err::read(path)
            .map_err(|err| ConsoleError::io(format!("reading {}", path.display()), err))?;
        Ok(Self {
            file_name,
            content_type: content_type.to_string(),
            bytes,
        })
    }

    fn to_part(&self) -> FilePart {
        FilePart {
            field: FILES_FIELD.to_string(),
            file_name: self.file_name.clone(),
            content_type: self.content_type.clone(),
            bytes: self.bytes.clone(),
        }
    }
}

fn image_content_type(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

/// Result of a two-step save.
#[derive(Debug)]
pub enum StepOutcome {
    Complete(Blog),
    /// Content saved; the image upload failed.
    ImagesFailed { blog: Blog, error: ConsoleError },
}

impl StepOutcome {
    pub fn blog(&self) -> &Blog {
        match self {
            StepOutcome::Complete(blog) => blog,
            StepOutcome::ImagesFailed { blog, .. } => blog,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, StepOutcome::Complete(_))
    }
}

pub struct BlogService<'a> {
    client: &'a ApiClient,
}

impl<'a> BlogService<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub fn list(&self, page: Option<u32>, size: Option<u32>) -> Result<BlogPage> {
        let request = HttpRequest::new(Method::Get, BLOGS_PATH)
            .with_query("page", page.unwrap_or(0))
            .with_query("size", size.unwrap_or(DEFAULT_PAGE_SIZE));
        let listing: BlogListing = self.client.request_json(request)?;
        Ok(listing.into_page())
    }

    pub fn get(&self, blog_id: i64) -> Result<Blog> {
        self.client.get_json(&blog_path(blog_id))
    }

    pub fn create(&self, draft: &BlogDraft) -> Result<Blog> {
        self.client.post_json(BLOGS_PATH, &payload(draft))
    }

    pub fn update(&self, blog_id: i64, draft: &BlogDraft) -> Result<Blog> {
        self.client.put_json(&blog_path(blog_id), &payload(draft))
    }

    pub fn delete(&self, blog_id: i64) -> Result<()> {
        self.client.delete(&blog_path(blog_id))?;
        info!(blog_id, "Blog deleted");
        Ok(())
    }

    pub fn upload_images(
        &self,
        blog_id: i64,
        files: &[ImageFile],
        display_orders: Option<&[i32]>,
    ) -> Result<Vec<BlogImage>> {
        let fields = display_orders
            .unwrap_or_default()
            .iter()
            .map(|order| (DISPLAY_ORDERS_FIELD.to_string(), order.to_string()))
            .collect();
        let body = RequestBody::Multipart {
            files: files.iter().map(ImageFile::to_part).collect(),
            fields,
        };
        let request = HttpRequest::new(Method::Post, blog_images_path(blog_id)).with_body(body);
        let images: Vec<BlogImage> = self.client.request_json(request)?;
        info!(blog_id, count = images.len(), "Images uploaded");
        Ok(images)
    }

    pub fn delete_image(&self, image_id: i64) -> Result<()> {
        self.client.delete(&blog_image_path(image_id))?;
        info!(image_id, "Image deleted");
        Ok(())
    }

    /// Creates a blog, then uploads its images.
    pub fn publish(&self, draft: &BlogDraft, images: &[ImageFile]) -> Result<StepOutcome> {
        draft.validate()?;
        check_image_capacity(0, 0, images.len())?;

        let blog = self.create(draft)?;
        info!(blog_id = blog.blog_id, "Blog created");
        Ok(self.attach_images(blog, images))
    }

    /// Updates a blog's content, then uploads additional images.
    pub fn revise(
        &self,
        blog_id: i64,
        draft: &BlogDraft,
        existing_images: usize,
        images: &[ImageFile],
    ) -> Result<StepOutcome> {
        draft.validate()?;
        check_image_capacity(existing_images, 0, images.len())?;

        let blog = self.update(blog_id, draft)?;
        info!(blog_id, "Blog updated");
        Ok(self.attach_images(blog, images))
    }

    fn attach_images(&self, mut blog: Blog, images: &[ImageFile]) -> StepOutcome {
        if images.is_empty() {
            return StepOutcome::Complete(blog);
        }
        match self.upload_images(blog.blog_id, images, None) {
            Ok(uploaded) => {
                blog.images.extend(uploaded);
                StepOutcome::Complete(blog)
            }
            Err(error) => {
                warn!(blog_id = blog.blog_id, error = %error, "Image upload failed after content was saved");
                StepOutcome::ImagesFailed { blog, error }
            }
        }
    }
}

fn payload(draft: &BlogDraft) -> BlogPayload {
    let normalized = draft.normalized();
    BlogPayload {
        title: normalized.title,
        description: normalized.description,
    }
}
