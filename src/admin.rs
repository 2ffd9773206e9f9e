//! Admin editor: passcode gate, draft validation and image intake.
//!
//! The passcode gate only keeps casual visitors out of the editing screens. Secrets
//! are compared in plain text against configured constants, with no hashing, rate
//! limiting or expiry. It is not an access-control boundary and must not be relied
//! on as one.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::models::{mint_id, HeroSlide, Product, ProductCategory, SlideId, StockStatus};

/// Upper bound for uploaded images
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Products per page in the admin catalog list
pub const PRODUCTS_PER_PAGE: usize = 12;

fn default_admin_passcode() -> String {
    "3210".to_string()
}

fn default_owner_passcode() -> String {
    "4560".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passcodes {
    #[serde(default = "default_admin_passcode")]
    pub admin: String,
    #[serde(default = "default_owner_passcode")]
    pub owner: String,
}

impl Default for Passcodes {
    fn default() -> Self {
        Self {
            admin: default_admin_passcode(),
            owner: default_owner_passcode(),
        }
    }
}

/// Editing privilege, ordered from least to most.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccessRole {
    #[default]
    None,
    Admin,
    Owner,
}

impl AccessRole {
    pub fn can_edit(&self) -> bool {
        *self >= AccessRole::Admin
    }
}

/// Exact string comparison against the configured passcodes; owner wins if both match.
pub fn authorize(secret: &str, passcodes: &Passcodes) -> AccessRole {
    if !passcodes.owner.is_empty() && secret == passcodes.owner {
        AccessRole::Owner
    } else if !passcodes.admin.is_empty() && secret == passcodes.admin {
        AccessRole::Admin
    } else {
        AccessRole::None
    }
}

/// Splits a comma-separated spec line, trimming and dropping empty segments.
pub fn parse_specs(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Form contents for a product create/edit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductDraft {
    /// None for a new product
    pub id: Option<String>,
    pub name: String,
    pub code: String,
    pub category: Option<String>,
    /// Comma-separated spec line as typed
    pub specs: String,
    pub description: String,
    pub image_url: String,
    pub status: Option<String>,
    pub featured: bool,
    pub youtube_url: Option<String>,
    pub related_products: Vec<String>,
}

impl ProductDraft {
    /// Prefills a form from an existing record.
    pub fn from_product(product: &Product) -> Self {
        Self {
            id: Some(product.id.clone()),
            name: product.name.clone(),
            code: product.code.clone(),
            category: Some(product.category.as_str().to_string()),
            specs: product.specs.join(", "),
            description: product.description.clone(),
            image_url: product.image_url.clone(),
            status: Some(product.status.as_str().to_string()),
            featured: product.featured,
            youtube_url: product.youtube_url.clone(),
            related_products: product.related_products.clone().unwrap_or_default(),
        }
    }

    /// Fills code and name from a manufacturer URL of the form `.../product/<slug>`.
    pub fn apply_product_url(&mut self, url: &str) -> bool {
        let Some(code) = product_code_from_url(url) else {
            return false;
        };
        if self.name.trim().is_empty() {
            self.name = format!("MikroTik® {}", code);
        }
        self.code = code;
        true
    }

    /// Produces the record to store, minting an id for new products.
    pub fn validate(self) -> Result<Product, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingField("name"));
        }
        let code = self.code.trim();
        if code.is_empty() {
            return Err(ValidationError::MissingField("code"));
        }
        let category = match non_empty(self.category) {
            Some(raw) => raw.parse::<ProductCategory>()?,
            None => ProductCategory::default(),
        };
        let status = match non_empty(self.status) {
            Some(raw) => raw.parse::<StockStatus>()?,
            None => StockStatus::default(),
        };
        let related: Vec<String> = self
            .related_products
            .into_iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect();

        Ok(Product {
            id: non_empty(self.id).unwrap_or_else(mint_id),
            name: name.to_string(),
            code: code.to_string(),
            category,
            specs: parse_specs(&self.specs),
            description: self.description.trim().to_string(),
            image_url: self.image_url.trim().to_string(),
            status,
            featured: self.featured,
            youtube_url: non_empty(self.youtube_url),
            related_products: if related.is_empty() { None } else { Some(related) },
        })
    }
}

fn product_code_from_url(url: &str) -> Option<String> {
    let (_, rest) = url.split_once("/product/")?;
    let slug = rest.split(['/', '?', '#']).next()?.trim();
    if slug.is_empty() {
        return None;
    }
    Some(slug.to_uppercase().replace('_', "-"))
}

/// Form contents for a banner create/edit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlideDraft {
    /// Slide being edited; None or an unknown id appends.
    pub target: Option<SlideId>,
    pub title: String,
    pub subtitle: String,
    pub image: String,
    pub category_id: Option<String>,
}

impl SlideDraft {
    pub fn from_slide(slide: &HeroSlide) -> Self {
        Self {
            target: Some(slide.id.clone()),
            title: slide.title.clone(),
            subtitle: slide.subtitle.clone(),
            image: slide.image.clone(),
            category_id: slide.category_id.clone(),
        }
    }

    pub fn validate(self) -> Result<HeroSlide, ValidationError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::MissingField("title"));
        }
        let subtitle = self.subtitle.trim();
        if subtitle.is_empty() {
            return Err(ValidationError::MissingField("subtitle"));
        }
        let image = self.image.trim();
        if image.is_empty() {
            return Err(ValidationError::MissingField("image"));
        }
        Ok(HeroSlide {
            id: self.target.filter(|id| !id.is_empty()).unwrap_or_else(SlideId::mint),
            title: title.to_string(),
            subtitle: subtitle.to_string(),
            image: image.to_string(),
            category_id: non_empty(self.category_id),
        })
    }
}

/// Checks an image before it is handed to the upload service.
pub fn validate_image(content_type: &str, size: usize) -> Result<(), ValidationError> {
    if !content_type.starts_with("image/") {
        return Err(ValidationError::UnsupportedImageType(content_type.to_string()));
    }
    if size > MAX_IMAGE_BYTES {
        return Err(ValidationError::ImageTooLarge {
            size,
            limit: MAX_IMAGE_BYTES,
        });
    }
    Ok(())
}

/// One page of a list, 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_count: usize,
}

/// Slices `items` into fixed-size pages, clamping `page` into range.
pub fn paginate<T: Clone>(items: &[T], page: usize, per_page: usize) -> Page<T> {
    let per_page = per_page.max(1);
    let page_count = items.len().div_ceil(per_page).max(1);
    let page = page.clamp(1, page_count);
    let start = (page - 1) * per_page;
    let end = (start + per_page).min(items.len());
    Page {
        items: items[start.min(end)..end].to_vec(),
        page,
        page_count,
    }
}
