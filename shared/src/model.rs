use serde::{Deserialize, Serialize};

use crate::api::{find_category, Category, District, Region};
use crate::config::CatalogConfig;
use crate::filter::CatalogQuery;
use crate::generation::LatestOnly;
use crate::location::BrowserLocation;
use crate::pagination::ServiceListing;
use crate::query::{resolve_category_id, to_query_params, QueryParams};
use crate::session::Session;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadingFlags {
    pub categories: bool,
    pub regions: bool,
    pub districts: bool,
    pub services: bool,
}

/// One tracker per independent read.
#[derive(Debug, Clone, Default)]
pub struct FetchTrackers {
    pub categories: LatestOnly,
    pub regions: LatestOnly,
    pub districts: LatestOnly,
    pub services: LatestOnly,
}

impl FetchTrackers {
    pub fn invalidate_all(&mut self) {
        self.categories.invalidate();
        self.regions.invalidate();
        self.districts.invalidate();
        self.services.invalidate();
    }
}

/// Catalog screen state. Config and session outlive a mount; everything else
/// is rebuilt from the URL each time the screen mounts.
#[derive(Debug, Default)]
pub struct Model {
    pub config: CatalogConfig,
    pub session: Session,
    pub mounted: bool,

    pub query: CatalogQuery,

    // Reference data
    pub categories: Vec<Category>,
    pub regions: Vec<Region>,
    pub districts: Vec<District>,

    pub listing: ServiceListing,
    pub loading: LoadingFlags,

    pub trackers: FetchTrackers,
    /// Request key of the last services fetch that was issued.
    pub services_key: Option<QueryParams>,
    /// Last location written to (or read from) the address bar.
    pub last_location: Option<BrowserLocation>,
}

impl Model {
    /// Drops per-mount state. Trackers are invalidated rather than reset so
    /// tokens stay monotonic across mounts.
    pub fn reset_screen(&mut self) {
        self.mounted = false;
        self.query = CatalogQuery::default();
        self.categories.clear();
        self.regions.clear();
        self.districts.clear();
        self.listing = ServiceListing::default();
        self.loading = LoadingFlags::default();
        self.trackers.invalidate_all();
        self.services_key = None;
        self.last_location = None;
    }

    pub fn selected_category(&self) -> Option<&Category> {
        let slug = self.query.filter.category_slug.as_deref()?;
        find_category(&self.categories, slug)
    }

    pub fn resolved_category_id(&self) -> Option<u64> {
        resolve_category_id(&self.categories, self.query.filter.category_slug.as_deref())
    }

    /// Backend parameters for the current state; also the fetch dedup key.
    pub fn services_request_key(&self) -> QueryParams {
        to_query_params(
            &self.query.filter,
            self.query.sort,
            self.query.search.as_deref(),
            Some(self.query.page()),
            Some(self.config.page_size),
            self.resolved_category_id(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterIntent;

    fn cleaning() -> Category {
        Category {
            id: 3,
            name: "Tozalash".into(),
            slug: "cleaning".into(),
            image: None,
            kind: None,
            services_count: 0,
            sub_categories: Vec::new(),
        }
    }

    #[test]
    fn request_key_resolves_category_once_loaded() {
        let mut model = Model::default();
        model
            .query
            .apply(FilterIntent::SelectCategory("cleaning".into()));
        assert!(!model.services_request_key().contains_key("category_id"));

        model.categories = vec![cleaning()];
        assert_eq!(model.services_request_key().get("category_id"), Some("3"));
    }

    #[test]
    fn reset_keeps_config_and_invalidates_trackers() {
        let mut model = Model::default();
        model.config.page_size = 12;
        let token = model.trackers.services.issue();
        model.mounted = true;

        model.reset_screen();
        assert_eq!(model.config.page_size, 12);
        assert!(!model.mounted);
        assert!(!model.trackers.services.complete(token));
    }
}
