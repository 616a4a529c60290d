// lib.rs - Catalog filter, pagination and URL sync core

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod api;
pub mod capabilities;
pub mod config;
pub mod error;
pub mod filter;
pub mod generation;
pub mod location;
pub mod model;
pub mod pagination;
pub mod query;
pub mod session;
pub mod view;

use secrecy::SecretString;

pub use app::App;
pub use capabilities::{Capabilities, Effect, HttpOutput, HttpResult};
pub use config::CatalogConfig;
pub use crux_core::{render::Render, App as CruxApp};
pub use error::{CatalogError, CatalogResult, ConfigError};
pub use filter::{CatalogQuery, FilterIntent, FilterState, PriceRange, SortOption};
pub use generation::Generation;
pub use location::BrowserLocation;
pub use model::Model;
pub use view::ViewModel;

pub const DEFAULT_API_BASE_URL: &str = "https://api.example.com/";
pub const DEFAULT_PAGE_SIZE: u32 = 6;
pub const MAX_PAGE_SIZE: u32 = 100;
pub const PRICE_FLOOR: u64 = 0;
pub const PRICE_CEILING: u64 = 1_000_000;
pub const RATING_MIN: u8 = 1;
pub const RATING_MAX: u8 = 5;

#[derive(Debug, Clone)]
pub enum Event {
    Noop,

    // Shell lifecycle
    Configured(Box<CatalogConfig>),
    SessionStarted {
        user_id: String,
        token: SecretString,
    },
    SessionEnded,

    ScreenMounted {
        location: BrowserLocation,
    },
    /// Back/forward or any navigation the core did not ask for.
    LocationChanged {
        location: BrowserLocation,
    },
    ScreenUnmounted,

    // User intents
    Filter(FilterIntent),
    SortChanged {
        sort: Option<SortOption>,
    },
    SearchChanged {
        term: Option<String>,
    },
    PageChanged {
        page: u32,
    },

    // Fetch completions
    CategoriesFetched {
        generation: Generation,
        result: Box<HttpResult>,
    },
    RegionsFetched {
        generation: Generation,
        result: Box<HttpResult>,
    },
    DistrictsFetched {
        generation: Generation,
        region_slug: String,
        result: Box<HttpResult>,
    },
    ServicesFetched {
        generation: Generation,
        page: u32,
        result: Box<HttpResult>,
    },
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::Configured(_) => "configured",
            Self::SessionStarted { .. } => "session_started",
            Self::SessionEnded => "session_ended",
            Self::ScreenMounted { .. } => "screen_mounted",
            Self::LocationChanged { .. } => "location_changed",
            Self::ScreenUnmounted => "screen_unmounted",
            Self::Filter(intent) => intent.name(),
            Self::SortChanged { .. } => "sort_changed",
            Self::SearchChanged { .. } => "search_changed",
            Self::PageChanged { .. } => "page_changed",
            Self::CategoriesFetched { .. } => "categories_fetched",
            Self::RegionsFetched { .. } => "regions_fetched",
            Self::DistrictsFetched { .. } => "districts_fetched",
            Self::ServicesFetched { .. } => "services_fetched",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::Filter(_)
                | Self::SortChanged { .. }
                | Self::SearchChanged { .. }
                | Self::PageChanged { .. }
        )
    }
}

pub mod app {
    use super::*;
    use crate::api::{
        districts_path, find_category, parse_categories, parse_districts, parse_regions,
        parse_services, CATEGORIES_PATH, REGIONS_PATH, SERVICES_PATH,
    };
    use crate::capabilities::{from_crux, into_success_body, ACCEPT_JSON};
    use crate::location::{from_location, to_location};
    use crate::model::LoadingFlags;
    use crate::pagination::ServiceListing;
    use crate::session::Session;
    use tracing::{debug, info, warn};

    #[derive(Default)]
    pub struct App;

    impl App {
        /// GET with the JSON accept header and, when logged in, the bearer
        /// token. `on_done` turns the outcome into the completion event.
        fn send_get<F>(model: &Model, caps: &Capabilities, url: &str, on_done: F)
        where
            F: FnOnce(HttpResult) -> Event + Send + 'static,
        {
            let mut builder = caps.http.get(url);
            builder = builder.header("Accept", ACCEPT_JSON);

            if let Some(bearer) = model.session.bearer() {
                builder = builder.header("Authorization", bearer.as_str());
            }

            builder.send(move |result| on_done(from_crux(result)));
        }

        fn fetch_categories(model: &mut Model, caps: &Capabilities) {
            let url = match model.config.endpoint(CATEGORIES_PATH, None) {
                Ok(url) => url,
                Err(e) => {
                    warn!(error = %e, "cannot build categories url");
                    return;
                }
            };
            let generation = model.trackers.categories.issue();
            model.loading.categories = true;
            Self::send_get(model, caps, &url, move |result| Event::CategoriesFetched {
                generation,
                result: Box::new(result),
            });
        }

        fn fetch_regions(model: &mut Model, caps: &Capabilities) {
            let url = match model.config.endpoint(REGIONS_PATH, None) {
                Ok(url) => url,
                Err(e) => {
                    warn!(error = %e, "cannot build regions url");
                    return;
                }
            };
            let generation = model.trackers.regions.issue();
            model.loading.regions = true;
            Self::send_get(model, caps, &url, move |result| Event::RegionsFetched {
                generation,
                result: Box::new(result),
            });
        }

        /// Loads districts for the selected region, superseding any fetch
        /// issued for an earlier one. No region means no districts.
        fn fetch_districts(model: &mut Model, caps: &Capabilities) {
            model.districts.clear();

            let Some(region_slug) = model.query.filter.region_slug.clone() else {
                model.trackers.districts.invalidate();
                model.loading.districts = false;
                return;
            };

            let url = match model.config.endpoint(&districts_path(&region_slug), None) {
                Ok(url) => url,
                Err(e) => {
                    warn!(region = %region_slug, error = %e, "cannot build districts url");
                    model.trackers.districts.invalidate();
                    model.loading.districts = false;
                    return;
                }
            };
            let generation = model.trackers.districts.issue();
            model.loading.districts = true;
            Self::send_get(model, caps, &url, move |result| Event::DistrictsFetched {
                generation,
                region_slug,
                result: Box::new(result),
            });
        }

        /// Issues a services fetch when the request key moved since the last one.
        fn refresh_services(model: &mut Model, caps: &Capabilities) {
            if model.query.filter.category_slug.is_some() && model.loading.categories {
                debug!("waiting for categories before fetching services");
                model.loading.services = true;
                return;
            }

            let key = model.services_request_key();
            if model.services_key.as_ref() == Some(&key) {
                model.loading.services = model.trackers.services.in_flight();
                return;
            }

            let url = match model.config.endpoint(SERVICES_PATH, Some(&key)) {
                Ok(url) => url,
                Err(e) => {
                    warn!(error = %e, "cannot build services url");
                    model.trackers.services.invalidate();
                    model.listing = ServiceListing::empty(model.query.page());
                    model.loading.services = false;
                    return;
                }
            };

            debug!(query = %key, "fetching services");
            let generation = model.trackers.services.issue();
            let page = model.query.page();
            model.services_key = Some(key);
            model.loading.services = true;
            Self::send_get(model, caps, &url, move |result| Event::ServicesFetched {
                generation,
                page,
                result: Box::new(result),
            });
        }

        /// Mirrors the query into the address bar if it changed.
        fn sync_location(model: &mut Model, caps: &Capabilities) {
            let location = to_location(&model.query, model.config.page_size);
            if model.last_location.as_ref() == Some(&location) {
                return;
            }
            debug!(href = %location, "replacing location");
            model.last_location = Some(location.clone());
            caps.navigation.replace(location);
        }

        /// Common tail of every state change on a mounted screen.
        fn settle(model: &mut Model, caps: &Capabilities) {
            Self::refresh_services(model, caps);
            Self::sync_location(model, caps);
            caps.render.render();
        }

        /// Drops sub-category ids the selected category does not list. Left
        /// alone until categories load.
        fn sanitize_sub_categories(model: &Model, ids: Vec<u64>) -> Vec<u64> {
            let Some(slug) = model.query.filter.category_slug.as_deref() else {
                if !ids.is_empty() {
                    debug!("dropping sub-categories without a category");
                }
                return Vec::new();
            };
            match find_category(&model.categories, slug) {
                Some(category) => ids
                    .into_iter()
                    .filter(|id| {
                        let known = category.has_sub_category(*id);
                        if !known {
                            debug!(id, category = slug, "dropping unknown sub-category");
                        }
                        known
                    })
                    .collect(),
                None => ids,
            }
        }

        fn prune_sub_categories(model: &mut Model) {
            let ids = model.query.filter.sub_category_ids.clone();
            let kept = Self::sanitize_sub_categories(model, ids);
            if kept != model.query.filter.sub_category_ids {
                model.query.filter = model.query.filter.clone().set_sub_category_ids(kept);
            }
        }

        fn read_list<T>(
            resource: &'static str,
            result: HttpResult,
            parse: fn(&[u8]) -> CatalogResult<Vec<T>>,
        ) -> Vec<T> {
            let parsed = into_success_body(result)
                .map_err(CatalogError::from)
                .and_then(|body| parse(&body));
            match parsed {
                Ok(items) => {
                    debug!(resource, count = items.len(), "loaded");
                    items
                }
                Err(e) => {
                    warn!(resource, error = %e, "load failed, showing empty list");
                    Vec::new()
                }
            }
        }

        fn read_listing(result: HttpResult, page: u32, page_size: u32) -> ServiceListing {
            let parsed = into_success_body(result)
                .map_err(CatalogError::from)
                .and_then(|body| parse_services(&body));
            match parsed {
                Ok(response) => ServiceListing::from_response(response, page, page_size),
                Err(e) => {
                    warn!(error = %e, "services load failed, showing empty page");
                    ServiceListing::empty(page)
                }
            }
        }

        /// Applies the state a location describes. Returns whether the region
        /// moved, which makes the district list stale.
        fn restore(model: &mut Model, location: &BrowserLocation) -> bool {
            let restored = from_location(location);
            let region_changed = restored.filter.region_slug != model.query.filter.region_slug;
            model.query = restored;
            Self::prune_sub_categories(model);
            region_changed
        }
    }

    impl crux_core::App for App {
        type Event = Event;
        type Model = Model;
        type ViewModel = ViewModel;
        type Capabilities = Capabilities;

        #[tracing::instrument(skip_all, fields(event = event.name()))]
        fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
            if event.is_user_initiated() {
                debug!("user action");
            }

            match event {
                Event::Noop => {}

                Event::Configured(config) => match config.validate() {
                    Ok(()) => {
                        info!(
                            base = %config.api_base_url,
                            page_size = config.page_size,
                            "configured"
                        );
                        let base_changed = config.api_base_url != model.config.api_base_url;
                        model.config = *config;
                        if model.mounted {
                            if base_changed {
                                // The services key carries no host; force a refetch.
                                debug!("api base changed, reloading catalog data");
                                model.services_key = None;
                                Self::fetch_categories(model, caps);
                                Self::fetch_regions(model, caps);
                                Self::fetch_districts(model, caps);
                            }
                            Self::settle(model, caps);
                        }
                    }
                    Err(e) => warn!(error = %e, "rejecting configuration"),
                },

                Event::SessionStarted { user_id, token } => {
                    info!(user = %user_id, "session started");
                    model.session = Session::login(user_id, token);
                }

                Event::SessionEnded => {
                    model.session = std::mem::take(&mut model.session).logout();
                    info!("session ended");
                }

                Event::ScreenMounted { location } => {
                    model.reset_screen();
                    model.mounted = true;
                    let has_region = Self::restore(model, &location);
                    model.last_location = Some(location);

                    Self::fetch_categories(model, caps);
                    Self::fetch_regions(model, caps);
                    if has_region {
                        Self::fetch_districts(model, caps);
                    }
                    Self::settle(model, caps);
                }

                Event::LocationChanged { location } => {
                    if !model.mounted {
                        return;
                    }
                    let region_changed = Self::restore(model, &location);
                    model.last_location = Some(location);
                    if region_changed {
                        Self::fetch_districts(model, caps);
                    }
                    Self::settle(model, caps);
                }

                Event::ScreenUnmounted => {
                    model.mounted = false;
                    model.trackers.invalidate_all();
                    model.loading = LoadingFlags::default();
                }

                Event::Filter(intent) => {
                    if !model.mounted {
                        debug!("ignoring intent on unmounted screen");
                        return;
                    }
                    let intent = match intent {
                        FilterIntent::SetSubCategoryIds(ids) => {
                            FilterIntent::SetSubCategoryIds(Self::sanitize_sub_categories(model, ids))
                        }
                        other => other,
                    };
                    let region_before = model.query.filter.region_slug.clone();
                    model.query.apply(intent);
                    if model.query.filter.region_slug != region_before {
                        Self::fetch_districts(model, caps);
                    }
                    Self::settle(model, caps);
                }

                Event::SortChanged { sort } => {
                    if !model.mounted {
                        return;
                    }
                    model.query.set_sort(sort);
                    Self::settle(model, caps);
                }

                Event::SearchChanged { term } => {
                    if !model.mounted {
                        return;
                    }
                    model.query.set_search(term);
                    Self::settle(model, caps);
                }

                Event::PageChanged { page } => {
                    if !model.mounted {
                        return;
                    }
                    model.query.go_to_page(page);
                    model.listing.set_current_page(model.query.page());
                    Self::settle(model, caps);
                }

                Event::CategoriesFetched { generation, result } => {
                    if !model.trackers.categories.complete(generation) {
                        debug!(generation = generation.value(), "discarding stale categories");
                        return;
                    }
                    model.loading.categories = false;
                    model.categories = Self::read_list("categories", *result, parse_categories);
                    Self::prune_sub_categories(model);
                    Self::settle(model, caps);
                }

                Event::RegionsFetched { generation, result } => {
                    if !model.trackers.regions.complete(generation) {
                        debug!(generation = generation.value(), "discarding stale regions");
                        return;
                    }
                    model.loading.regions = false;
                    model.regions = Self::read_list("regions", *result, parse_regions);
                    caps.render.render();
                }

                Event::DistrictsFetched {
                    generation,
                    region_slug,
                    result,
                } => {
                    if !model.trackers.districts.complete(generation) {
                        debug!(
                            generation = generation.value(),
                            region = %region_slug,
                            "discarding stale districts"
                        );
                        return;
                    }
                    model.loading.districts = false;
                    model.districts = Self::read_list("districts", *result, parse_districts);
                    caps.render.render();
                }

                Event::ServicesFetched {
                    generation,
                    page,
                    result,
                } => {
                    if !model.trackers.services.complete(generation) {
                        debug!(generation = generation.value(), "discarding stale services");
                        return;
                    }
                    model.loading.services = false;
                    model.listing = Self::read_listing(*result, page, model.config.page_size);
                    caps.render.render();
                }
            }
        }

        fn view(&self, model: &Model) -> ViewModel {
            ViewModel::build(model)
        }
    }
}
