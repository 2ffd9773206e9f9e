//! Catalog store: the authoritative in-memory state, kept durable on every change

use std::collections::HashSet;

use log::{debug, info, warn};
use serde::de::DeserializeOwned;

use crate::db::KeyValueStore;
use crate::error::StorageError;
use crate::models::{HeroSlide, Product, SiteSettings, SlideId, Theme};
use crate::seed::{default_settings, seed_hero_slides, seed_products};

pub const PRODUCTS_KEY: &str = "nexlyn_products";
pub const HERO_SLIDES_KEY: &str = "nexlyn_hero_slides";
pub const WHATSAPP_KEY: &str = "nexlyn_wa";
pub const ABOUT_KEY: &str = "nexlyn_about";
pub const ADDRESS_KEY: &str = "nexlyn_address";
pub const MAP_URL_KEY: &str = "nexlyn_map_url";
pub const THEME_KEY: &str = "nexlyn_theme";

/// Everything the storefront persists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogState {
    pub products: Vec<Product>,
    pub hero_slides: Vec<HeroSlide>,
    pub settings: SiteSettings,
    pub theme: Theme,
}

impl Default for CatalogState {
    fn default() -> Self {
        Self {
            products: seed_products(),
            hero_slides: seed_hero_slides(),
            settings: default_settings(),
            theme: Theme::default(),
        }
    }
}

impl CatalogState {
    /// Serializes the full state into its durable entries.
    pub fn to_entries(&self) -> Result<Vec<(&'static str, String)>, StorageError> {
        Ok(vec![
            (PRODUCTS_KEY, serde_json::to_string(&self.products)?),
            (HERO_SLIDES_KEY, serde_json::to_string(&self.hero_slides)?),
            (WHATSAPP_KEY, self.settings.whatsapp_number.clone()),
            (ABOUT_KEY, self.settings.about.clone()),
            (ADDRESS_KEY, self.settings.address.clone()),
            (MAP_URL_KEY, self.settings.map_url.clone()),
            (THEME_KEY, self.theme.as_str().to_string()),
        ])
    }
}

/// Outcome of the durable write that follows a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    Persisted,
    /// Nothing changed, nothing was written.
    Unchanged,
    /// In-memory state changed but the durable copy could not be written.
    Failed(String),
}

impl SyncStatus {
    pub fn warning(&self) -> Option<&str> {
        match self {
            SyncStatus::Failed(msg) => Some(msg),
            _ => None,
        }
    }
}

fn read_raw<S: KeyValueStore>(backend: &S, key: &str) -> Option<String> {
    match backend.read(key) {
        Ok(value) => value,
        Err(e) => {
            warn!("[load] Failed to read {}: {}; using default", key, e);
            None
        }
    }
}

fn read_json<S: KeyValueStore, T: DeserializeOwned>(backend: &S, key: &str) -> Option<T> {
    let raw = read_raw(backend, key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("[load] Failed to parse {}: {}; using default", key, e);
            None
        }
    }
}

/// Reads every key independently; an absent or unreadable key falls back to its default.
pub fn load_state<S: KeyValueStore>(backend: &S) -> CatalogState {
    let defaults = default_settings();
    let products = read_json(backend, PRODUCTS_KEY).unwrap_or_else(seed_products);
    let hero_slides = read_json(backend, HERO_SLIDES_KEY).unwrap_or_else(seed_hero_slides);
    let theme = match read_raw(backend, THEME_KEY) {
        Some(raw) => Theme::parse(&raw).unwrap_or_else(|| {
            warn!("[load] Unknown theme {:?}; using default", raw);
            Theme::default()
        }),
        None => Theme::default(),
    };

    CatalogState {
        products: dedupe_products(products),
        hero_slides,
        settings: SiteSettings {
            whatsapp_number: read_raw(backend, WHATSAPP_KEY).unwrap_or(defaults.whatsapp_number),
            about: read_raw(backend, ABOUT_KEY).unwrap_or(defaults.about),
            address: read_raw(backend, ADDRESS_KEY).unwrap_or(defaults.address),
            map_url: read_raw(backend, MAP_URL_KEY).unwrap_or(defaults.map_url),
        },
        theme,
    }
}

/// Keeps ids unique: a later record with a repeated id replaces the earlier one in place.
fn dedupe_products(products: Vec<Product>) -> Vec<Product> {
    let mut result: Vec<Product> = Vec::with_capacity(products.len());
    for product in products {
        match result.iter_mut().find(|p| p.id == product.id) {
            Some(existing) => {
                warn!("[load] Duplicate product id {}; keeping the last record", product.id);
                *existing = product;
            }
            None => result.push(product),
        }
    }
    result
}

/// Gives slides saved without an id a fresh one. Returns true if anything changed.
fn assign_missing_slide_ids(slides: &mut [HeroSlide]) -> bool {
    let mut seen = HashSet::new();
    let mut changed = false;
    for slide in slides.iter_mut() {
        if slide.id.is_empty() || !seen.insert(slide.id.clone()) {
            slide.id = SlideId::mint();
            seen.insert(slide.id.clone());
            changed = true;
        }
    }
    changed
}

/// Owns the catalog state. Mutation methods are the only write path and each one
/// is followed by a full durable write.
pub struct CatalogStore<S: KeyValueStore> {
    backend: S,
    state: CatalogState,
    last_warning: Option<String>,
}

impl<S: KeyValueStore> CatalogStore<S> {
    /// Hydrates from `backend`, never failing.
    pub fn load(backend: S) -> Self {
        let mut state = load_state(&backend);
        let migrated = assign_missing_slide_ids(&mut state.hero_slides);
        info!(
            "[load] Catalog ready: {} products, {} slides",
            state.products.len(),
            state.hero_slides.len()
        );
        let mut store = Self {
            backend,
            state,
            last_warning: None,
        };
        if migrated {
            info!("[load] Assigned ids to legacy hero slides");
            // Save migrated slides
            let _ = store.persist();
        }
        store
    }

    pub fn state(&self) -> &CatalogState {
        &self.state
    }

    pub fn products(&self) -> &[Product] {
        &self.state.products
    }

    pub fn product(&self, id: &str) -> Option<&Product> {
        self.state.products.iter().find(|p| p.id == id)
    }

    pub fn featured_products(&self) -> Vec<&Product> {
        self.state.products.iter().filter(|p| p.featured).collect()
    }

    pub fn hero_slides(&self) -> &[HeroSlide] {
        &self.state.hero_slides
    }

    pub fn settings(&self) -> &SiteSettings {
        &self.state.settings
    }

    pub fn theme(&self) -> Theme {
        self.state.theme
    }

    /// Warning from the most recent failed durable write, cleared by the next success.
    pub fn last_warning(&self) -> Option<&str> {
        self.last_warning.as_deref()
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn replace_all(&mut self, products: Vec<Product>) -> SyncStatus {
        self.state.products = dedupe_products(products);
        self.persist()
    }

    /// Replaces the record with the same id, or appends it.
    pub fn upsert(&mut self, product: Product) -> SyncStatus {
        match self.state.products.iter_mut().find(|p| p.id == product.id) {
            Some(existing) => *existing = product,
            None => self.state.products.push(product),
        }
        self.persist()
    }

    pub fn remove_by_id(&mut self, id: &str) -> SyncStatus {
        let before = self.state.products.len();
        self.state.products.retain(|p| p.id != id);
        if self.state.products.len() == before {
            return SyncStatus::Unchanged;
        }
        self.persist()
    }

    /// Replaces the slide with the same id, or appends it.
    pub fn upsert_slide(&mut self, mut slide: HeroSlide) -> SyncStatus {
        if slide.id.is_empty() {
            slide.id = SlideId::mint();
        }
        match self.state.hero_slides.iter_mut().find(|s| s.id == slide.id) {
            Some(existing) => *existing = slide,
            None => self.state.hero_slides.push(slide),
        }
        self.persist()
    }

    pub fn remove_slide(&mut self, id: &SlideId) -> SyncStatus {
        let before = self.state.hero_slides.len();
        self.state.hero_slides.retain(|s| &s.id != id);
        if self.state.hero_slides.len() == before {
            return SyncStatus::Unchanged;
        }
        self.persist()
    }

    pub fn update_settings(&mut self, settings: SiteSettings) -> SyncStatus {
        if self.state.settings == settings {
            return SyncStatus::Unchanged;
        }
        self.state.settings = settings;
        self.persist()
    }

    pub fn set_theme(&mut self, theme: Theme) -> SyncStatus {
        if self.state.theme == theme {
            return SyncStatus::Unchanged;
        }
        self.state.theme = theme;
        self.persist()
    }

    pub fn toggle_theme(&mut self) -> SyncStatus {
        self.set_theme(self.state.theme.toggled())
    }

    /// Writes the full current state. Failures are reported, never raised.
    fn persist(&mut self) -> SyncStatus {
        let result = self
            .state
            .to_entries()
            .and_then(|entries| self.backend.write_all(&entries));
        match result {
            Ok(()) => {
                debug!("[persist] Catalog state written");
                self.last_warning = None;
                SyncStatus::Persisted
            }
            Err(e) => {
                warn!("[persist] Failed to write catalog state: {}", e);
                let message = format!("Changes are kept for this session but could not be saved: {}", e);
                self.last_warning = Some(message.clone());
                SyncStatus::Failed(message)
            }
        }
    }
}
