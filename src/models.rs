//! Data models and structures used throughout the application

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Filter label matching every category.
pub const ALL_CATEGORIES: &str = "All";

/// Closed set of hardware categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ProductCategory {
    #[default]
    Routing,
    Switching,
    Wireless,
    #[serde(rename = "5G/LTE")]
    FiveGLte,
    IoT,
    Accessories,
}

impl ProductCategory {
    pub const ALL: [ProductCategory; 6] = [
        ProductCategory::Routing,
        ProductCategory::Switching,
        ProductCategory::Wireless,
        ProductCategory::FiveGLte,
        ProductCategory::IoT,
        ProductCategory::Accessories,
    ];

    /// Display name, which doubles as the filter key.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductCategory::Routing => "Routing",
            ProductCategory::Switching => "Switching",
            ProductCategory::Wireless => "Wireless",
            ProductCategory::FiveGLte => "5G/LTE",
            ProductCategory::IoT => "IoT",
            ProductCategory::Accessories => "Accessories",
        }
    }
}

impl fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProductCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidCategory(s.to_string()))
    }
}

/// Availability shown next to a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum StockStatus {
    #[default]
    #[serde(rename = "In Stock")]
    InStock,
    #[serde(rename = "Low Stock")]
    LowStock,
    // Older catalogs used "Out of Stock" and "Pre-Order".
    #[serde(rename = "Backorder", alias = "Out of Stock", alias = "Pre-Order")]
    Backorder,
}

impl StockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::InStock => "In Stock",
            StockStatus::LowStock => "Low Stock",
            StockStatus::Backorder => "Backorder",
        }
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StockStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "In Stock" => Ok(StockStatus::InStock),
            "Low Stock" => Ok(StockStatus::LowStock),
            "Backorder" | "Out of Stock" | "Pre-Order" => Ok(StockStatus::Backorder),
            other => Err(ValidationError::InvalidStatus(other.to_string())),
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// A catalog entry. Replaced as a whole on every edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub code: String,
    pub category: ProductCategory,
    /// Display order matters, duplicates allowed
    pub specs: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub status: StockStatus,
    #[serde(default, skip_serializing_if = "is_false")]
    pub featured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube_url: Option<String>,
    /// Weak references to other product ids; may dangle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_products: Option<Vec<String>>,
}

impl Product {
    /// Embeddable form of `youtube_url`.
    pub fn youtube_embed_url(&self) -> Option<String> {
        let url = self.youtube_url.as_deref()?.trim();
        if url.is_empty() {
            return None;
        }
        let embed = url.replace("watch?v=", "embed/");
        Some(embed.split('&').next().unwrap_or_default().to_string())
    }
}

/// Stable identity of a hero slide, independent of its list position.
///
/// The default is the empty id carried by slides saved before ids existed;
/// [`SlideId::mint`] creates a fresh one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct SlideId(pub String);

impl SlideId {
    pub fn mint() -> Self {
        SlideId(format!("slide-{}", mint_id()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SlideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A promotional banner on the home view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroSlide {
    // Slides saved before ids existed deserialize with an empty id.
    #[serde(default)]
    pub id: SlideId,
    pub title: String,
    pub subtitle: String,
    #[serde(default)]
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
}

/// Scalar site configuration editable from the admin panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSettings {
    pub whatsapp_number: String,
    pub about: String,
    pub address: String,
    pub map_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    pub fn parse(value: &str) -> Option<Theme> {
        match value {
            "dark" => Some(Theme::Dark),
            "light" => Some(Theme::Light),
            _ => None,
        }
    }

    pub fn toggled(self) -> Theme {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

/// Static presentation data for a category pill. The count is never stored here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDescriptor {
    pub name: &'static str,
    pub id: &'static str,
    pub icon: &'static str,
}

/// A category pill with its live product count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub name: String,
    pub id: String,
    pub icon: String,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A web citation attached to an assistant answer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroundingSource {
    pub title: String,
    pub uri: String,
}

/// One entry of the chat transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<GroundingSource>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            sources: Vec::new(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            sources: Vec::new(),
        }
    }

    /// Adds sources not already present, keeping arrival order.
    pub fn merge_sources<I>(&mut self, sources: I)
    where
        I: IntoIterator<Item = GroundingSource>,
    {
        for source in sources {
            if !self.sources.contains(&source) {
                self.sources.push(source);
            }
        }
    }
}

static LAST_MINTED: AtomicI64 = AtomicI64::new(0);

/// Mints a timestamp-derived id, strictly increasing within the process.
pub fn mint_id() -> String {
    let now = chrono::Utc::now().timestamp_millis();
    let mut last = LAST_MINTED.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_MINTED.compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return next.to_string(),
            Err(actual) => last = actual,
        }
    }
}
