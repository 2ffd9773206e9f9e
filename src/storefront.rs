//! Storefront controller: ties the catalog store, filters, banner timer and admin gate
//! to the current view.

use std::fmt;
use std::sync::{Arc, Mutex};

use log::{debug, info, warn};

use crate::admin::{authorize, paginate, AccessRole, Page, Passcodes, ProductDraft, SlideDraft, PRODUCTS_PER_PAGE};
use crate::aggregate::{category_counts, category_summaries, CategoryCounts};
use crate::banner::{lock_rotator, BannerRotator, BannerTimer, BannerTiming, SharedRotator};
use crate::db::KeyValueStore;
use crate::error::AdminError;
use crate::filter::{filter_products, related_products};
use crate::models::{
    CategorySummary, HeroSlide, Product, SiteSettings, SlideId, Theme, ALL_CATEGORIES,
};
use crate::store::{CatalogStore, SyncStatus};
use crate::whatsapp::{deep_link, InquiryContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Home,
    Products,
    Detail,
    Admin,
    About,
    Contact,
}

impl View {
    pub fn as_str(&self) -> &'static str {
        match self {
            View::Home => "home",
            View::Products => "products",
            View::Detail => "detail",
            View::Admin => "admin",
            View::About => "about",
            View::Contact => "contact",
        }
    }

    pub fn parse(value: &str) -> Option<View> {
        match value.trim().to_lowercase().as_str() {
            "home" => Some(View::Home),
            "products" => Some(View::Products),
            "detail" => Some(View::Detail),
            "admin" => Some(View::Admin),
            "about" => Some(View::About),
            "contact" => Some(View::Contact),
            _ => None,
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owner-only summary of the site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerOverview {
    pub total_products: usize,
    pub total_slides: usize,
    pub theme: Theme,
    pub role: AccessRole,
}

pub struct Storefront<S: KeyValueStore> {
    store: CatalogStore<S>,
    passcodes: Passcodes,
    selected_category: String,
    search_query: String,
    view: View,
    active_product: Option<String>,
    role: AccessRole,
    rotator: SharedRotator,
    timer: BannerTimer,
}

impl<S: KeyValueStore> Storefront<S> {
    pub fn new(store: CatalogStore<S>, passcodes: Passcodes, timing: BannerTiming) -> Self {
        let rotator = Arc::new(Mutex::new(BannerRotator::new(store.hero_slides().len())));
        let timer = BannerTimer::new(rotator.clone(), timing);
        Self {
            store,
            passcodes,
            selected_category: ALL_CATEGORIES.to_string(),
            search_query: String::new(),
            view: View::Home,
            active_product: None,
            role: AccessRole::None,
            rotator,
            timer,
        }
    }

    /// Shows the home view, arming the banner rotation.
    pub fn open(&mut self) {
        self.navigate(View::Home);
    }

    pub fn store(&self) -> &CatalogStore<S> {
        &self.store
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn selected_category(&self) -> &str {
        &self.selected_category
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn role(&self) -> AccessRole {
        self.role
    }

    pub fn is_banner_running(&self) -> bool {
        self.timer.is_running()
    }

    pub fn navigate(&mut self, view: View) {
        if view != View::Detail {
            self.active_product = None;
        }
        if self.view != view {
            debug!("[navigate] {} -> {}", self.view, view);
        }
        self.view = view;
        if view == View::Home {
            self.timer.start();
        } else {
            self.timer.stop();
        }
    }

    /// Top-level menu navigation, which also clears the search box.
    pub fn open_menu_item(&mut self, view: View) {
        self.search_query.clear();
        self.navigate(view);
    }

    /// Any label is accepted; one that no product carries just shows nothing.
    pub fn select_category(&mut self, category: &str) {
        self.selected_category = category.to_string();
    }

    pub fn set_search_query(&mut self, query: &str) {
        self.search_query = query.to_string();
        if !query.is_empty() && self.view != View::Products {
            self.navigate(View::Products);
        }
    }

    pub fn visible_products(&self) -> Vec<&Product> {
        filter_products(
            self.store.products(),
            &self.selected_category,
            &self.search_query,
        )
    }

    pub fn category_counts(&self) -> CategoryCounts {
        category_counts(self.store.products())
    }

    pub fn category_summaries(&self) -> Vec<CategorySummary> {
        category_summaries(self.store.products())
    }

    pub fn featured_products(&self) -> Vec<&Product> {
        self.store.featured_products()
    }

    pub fn active_slide(&self) -> Option<&HeroSlide> {
        let index = lock_rotator(&self.rotator).active_index();
        self.store.hero_slides().get(index)
    }

    /// Whether the banner is mid exit animation.
    pub fn is_banner_exiting(&self) -> bool {
        lock_rotator(&self.rotator).is_exiting()
    }

    /// Jumps to the active slide's category. Slides without one do nothing.
    pub fn click_banner(&mut self) -> bool {
        let Some(category) = self.active_slide().and_then(|s| s.category_id.clone()) else {
            return false;
        };
        info!("[click_banner] Showing {}", category);
        self.select_category(&category);
        self.navigate(View::Products);
        true
    }

    pub fn open_product(&mut self, id: &str) -> Option<&Product> {
        if self.store.product(id).is_none() {
            warn!("[open_product] No product with id {}", id);
            return None;
        }
        self.navigate(View::Detail);
        self.active_product = Some(id.to_string());
        self.store.product(id)
    }

    pub fn active_product(&self) -> Option<&Product> {
        self.active_product
            .as_deref()
            .and_then(|id| self.store.product(id))
    }

    pub fn related(&self) -> Vec<&Product> {
        match self.active_product() {
            Some(product) => related_products(self.store.products(), product),
            None => Vec::new(),
        }
    }

    pub fn inquiry_link(&self, context: InquiryContext<'_>) -> String {
        deep_link(&self.store.settings().whatsapp_number, context)
    }

    pub fn authorize(&mut self, secret: &str) -> AccessRole {
        self.role = authorize(secret, &self.passcodes);
        match self.role {
            AccessRole::None => warn!("[authorize] Passcode rejected"),
            role => info!("[authorize] Signed in as {:?}", role),
        }
        self.role
    }

    pub fn sign_out(&mut self) {
        self.role = AccessRole::None;
    }

    fn require_editor(&self) -> Result<(), AdminError> {
        if self.role.can_edit() {
            Ok(())
        } else {
            Err(AdminError::Unauthorized)
        }
    }

    pub fn save_product(&mut self, draft: ProductDraft) -> Result<SyncStatus, AdminError> {
        self.require_editor()?;
        let product = draft.validate()?;
        info!("[save_product] Saving {} ({})", product.id, product.code);
        Ok(self.store.upsert(product))
    }

    pub fn delete_product(&mut self, id: &str) -> Result<SyncStatus, AdminError> {
        self.require_editor()?;
        if self.store.product(id).is_none() {
            return Err(AdminError::NotFound(id.to_string()));
        }
        let status = self.store.remove_by_id(id);
        if self.active_product.as_deref() == Some(id) {
            self.active_product = None;
            if self.view == View::Detail {
                self.navigate(View::Products);
            }
        }
        Ok(status)
    }

    pub fn save_slide(&mut self, draft: SlideDraft) -> Result<SyncStatus, AdminError> {
        self.require_editor()?;
        let slide = draft.validate()?;
        info!("[save_slide] Saving slide {}", slide.id);
        let active = self.active_slide_id();
        let status = self.store.upsert_slide(slide);
        self.sync_rotator(active);
        Ok(status)
    }

    pub fn delete_slide(&mut self, id: &SlideId) -> Result<SyncStatus, AdminError> {
        self.require_editor()?;
        if !self.store.hero_slides().iter().any(|s| &s.id == id) {
            return Err(AdminError::NotFound(id.to_string()));
        }
        let active = self.active_slide_id();
        let status = self.store.remove_slide(id);
        self.sync_rotator(active);
        Ok(status)
    }

    pub fn update_settings(&mut self, settings: SiteSettings) -> Result<SyncStatus, AdminError> {
        self.require_editor()?;
        Ok(self.store.update_settings(settings))
    }

    pub fn toggle_theme(&mut self) -> SyncStatus {
        self.store.toggle_theme()
    }

    pub fn admin_page(&self, page: usize) -> Result<Page<Product>, AdminError> {
        self.require_editor()?;
        Ok(paginate(self.store.products(), page, PRODUCTS_PER_PAGE))
    }

    pub fn owner_overview(&self) -> Result<OwnerOverview, AdminError> {
        if self.role != AccessRole::Owner {
            return Err(AdminError::Unauthorized);
        }
        Ok(OwnerOverview {
            total_products: self.store.products().len(),
            total_slides: self.store.hero_slides().len(),
            theme: self.store.theme(),
            role: self.role,
        })
    }

    fn active_slide_id(&self) -> Option<SlideId> {
        self.active_slide().map(|s| s.id.clone())
    }

    /// Keeps the banner on the slide it was showing, wherever that slide now sits.
    fn sync_rotator(&mut self, active: Option<SlideId>) {
        let slides = self.store.hero_slides();
        let position = active.and_then(|id| slides.iter().position(|s| s.id == id));
        lock_rotator(&self.rotator).relocate(slides.len(), position);
    }
}
