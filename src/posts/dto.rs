use serde::Deserialize;

use super::{
    repo_types::{NewPost, Post},
    sanitize::{derive_excerpt, sanitize_html},
};
use crate::error::AppError;

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_CATEGORY_LEN: usize = 50;
pub const MAX_PAGE: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub published: bool,
}

/// Partial update; absent fields keep their current value.
#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub category: Option<String>,
    pub content: Option<String>,
    pub published: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}
fn default_limit() -> i64 {
    20
}

impl Pagination {
    pub fn clamped(&self) -> (i64, i64) {
        (self.limit.clamp(1, MAX_PAGE), self.offset.max(0))
    }
}

/// Validates and sanitizes raw editor input into a storable post.
fn build_post(
    title: &str,
    excerpt: Option<&str>,
    category: Option<&str>,
    content: &str,
    published: bool,
) -> Result<NewPost, AppError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("Title is required".into()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::Validation(format!(
            "Title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    let category = category.map(str::trim).filter(|c| !c.is_empty());
    if category.is_some_and(|c| c.chars().count() > MAX_CATEGORY_LEN) {
        return Err(AppError::Validation(format!(
            "Category must be at most {MAX_CATEGORY_LEN} characters"
        )));
    }

    let content = sanitize_html(content);
    let excerpt = match excerpt.map(str::trim).filter(|e| !e.is_empty()) {
        // stored as plain text: markup dropped, entities decoded
        Some(given) => derive_excerpt(given),
        None => derive_excerpt(&content),
    };

    Ok(NewPost {
        title: title.to_string(),
        excerpt,
        category: category.map(str::to_string),
        content,
        published,
    })
}

impl TryFrom<CreatePostRequest> for NewPost {
    type Error = AppError;

    fn try_from(req: CreatePostRequest) -> Result<Self, Self::Error> {
        build_post(
            &req.title,
            req.excerpt.as_deref(),
            req.category.as_deref(),
            &req.content,
            req.published,
        )
    }
}

impl UpdatePostRequest {
    /// Applies the patch on top of `current`, re-validating the result.
    pub fn merge(self, current: &Post) -> Result<NewPost, AppError> {
        // Without a new excerpt, keep the old one unless the content changed.
        let keep_excerpt = self.excerpt.is_none() && self.content.is_none();
        let mut post = build_post(
            self.title.as_deref().unwrap_or(&current.title),
            self.excerpt.as_deref(),
            self.category.as_deref().or(current.category.as_deref()),
            self.content.as_deref().unwrap_or(&current.content),
            self.published.unwrap_or(current.published),
        )?;
        // stored excerpt is already plain text
        if keep_excerpt {
            post.excerpt = current.excerpt.clone();
        }
        Ok(post)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(title: &str, content: &str) -> CreatePostRequest {
        CreatePostRequest {
            title: title.into(),
            excerpt: None,
            category: None,
            content: content.into(),
            published: false,
        }
    }

    #[test]
    fn title_required() {
        assert!(NewPost::try_from(create("   ", "<p>x</p>")).is_err());
        assert!(NewPost::try_from(create(&"t".repeat(MAX_TITLE_LEN + 1), "")).is_err());
    }

    #[test]
    fn content_sanitized_and_excerpt_derived() {
        let post = NewPost::try_from(create(" Hello ", "<p>Body text</p><script>x()</script>")).unwrap();
        assert_eq!(post.title, "Hello");
        assert!(!post.content.contains("script"));
        assert_eq!(post.excerpt, "Body text");
    }

    #[test]
    fn given_excerpt_is_stored_as_text() {
        let mut req = create("Menu", "<p>x</p>");
        req.excerpt = Some("  Fish & Chips <b>tonight</b> ".into());
        assert_eq!(NewPost::try_from(req).unwrap().excerpt, "Fish & Chips tonight");
    }

    #[test]
    fn pagination_is_clamped() {
        assert_eq!(Pagination { limit: 0, offset: -5 }.clamped(), (1, 0));
        assert_eq!(Pagination { limit: 1000, offset: 3 }.clamped(), (MAX_PAGE, 3));
    }
}
