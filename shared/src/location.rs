//! Address-bar mapping in both directions.
//!
//! Outbound: [`CatalogQuery`] → `/category[/{slug}]?{query}`.
//! Inbound: the same shape back into a [`CatalogQuery`]. Every dimension
//! written out is read back, so a shared link reproduces the view.

use std::fmt;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::form_urlencoded;

use crate::filter::{CatalogQuery, FilterState, SortOption};
use crate::query::{self, to_query_params};
use crate::{PRICE_CEILING, PRICE_FLOOR, RATING_MAX, RATING_MIN};

pub const CATALOG_ROOT: &str = "/category";

pub(crate) const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BrowserLocation {
    pub path: String,
    /// Encoded query string without the leading `?`.
    pub query: String,
}

impl BrowserLocation {
    pub fn new(path: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: query.into(),
        }
    }

    /// Splits `path?query#fragment`; the fragment is dropped.
    pub fn from_href(href: &str) -> Self {
        let href = href.split('#').next().unwrap_or_default();
        match href.split_once('?') {
            Some((path, query)) => Self::new(path, query),
            None => Self::new(href, ""),
        }
    }

    pub fn href(&self) -> String {
        if self.query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query)
        }
    }

    /// Category slug carried by the path, if any.
    pub fn category_slug(&self) -> Option<String> {
        let mut segments = self.path.split('/').filter(|s| !s.is_empty());
        if segments.next() != Some(CATALOG_ROOT.trim_start_matches('/')) {
            return None;
        }
        let raw = segments.next()?;
        match percent_decode_str(raw).decode_utf8() {
            Ok(slug) if !slug.is_empty() => Some(slug.into_owned()),
            Ok(_) => None,
            Err(e) => {
                debug!(segment = raw, error = %e, "undecodable category segment");
                None
            }
        }
    }
}

impl fmt::Display for BrowserLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.href())
    }
}

pub fn category_path(slug: Option<&str>) -> String {
    match slug {
        Some(slug) => format!(
            "{CATALOG_ROOT}/{}",
            utf8_percent_encode(slug, PATH_SEGMENT)
        ),
        None => CATALOG_ROOT.to_string(),
    }
}

/// Location mirroring `query`. `category_id` stays out of the visible URL;
/// the path already names the category.
pub fn to_location(query: &CatalogQuery, page_size: u32) -> BrowserLocation {
    let params = to_query_params(
        &query.filter,
        query.sort,
        query.search.as_deref(),
        Some(query.page()),
        Some(page_size),
        None,
    );
    BrowserLocation::new(
        category_path(query.filter.category_slug.as_deref()),
        params.encode(),
    )
}

/// Rebuilds the catalog state a location describes. Values that do not
/// parse are skipped one by one; the rest still apply.
pub fn from_location(location: &BrowserLocation) -> CatalogQuery {
    let mut region = None;
    let mut district = None;
    let mut price_min = None;
    let mut price_max = None;
    let mut ratings = Vec::new();
    let mut sort = None;
    let mut search = None;
    let mut page = 1;
    let mut sub_categories: Vec<(Option<usize>, u64)> = Vec::new();

    for (key, value) in form_urlencoded::parse(location.query.as_bytes()) {
        match key.as_ref() {
            query::CITY_ID => region = non_empty(&value),
            query::DISTRICT_ID => district = non_empty(&value),
            query::PRICE_MIN => price_min = value.parse::<u64>().ok(),
            query::PRICE_MAX => price_max = value.parse::<u64>().ok(),
            query::RATING => {
                ratings = value
                    .split(',')
                    .filter_map(|r| r.trim().parse::<u8>().ok())
                    .filter(|r| (RATING_MIN..=RATING_MAX).contains(r))
                    .collect();
            }
            query::SORT => sort = SortOption::parse(&value),
            query::SEARCH => search = non_empty(&value),
            query::PAGE => page = value.parse::<u32>().unwrap_or(1),
            other => {
                if let Some(index) = sub_category_index(other) {
                    match value.parse::<u64>() {
                        Ok(id) => sub_categories.push((index, id)),
                        Err(_) => debug!(key = other, value = %value, "skipping sub-category id"),
                    }
                }
            }
        }
    }

    // Stable: unindexed keys keep their order after the indexed ones.
    sub_categories.sort_by_key(|(index, _)| index.unwrap_or(usize::MAX));

    let mut filter = FilterState::default();
    if let Some(slug) = location.category_slug() {
        filter = filter.select_category(slug);
    }
    filter = filter
        .select_region(region)
        .select_district(district)
        .set_price_range(
            price_min.unwrap_or(PRICE_FLOOR),
            price_max.unwrap_or(PRICE_CEILING),
        )
        .set_sub_category_ids(sub_categories.into_iter().map(|(_, id)| id).collect());
    for rating in ratings {
        if !filter.ratings.contains(&rating) {
            filter = filter.toggle_rating(rating);
        }
    }

    CatalogQuery::new(filter, sort, search, page)
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// `sub_category_ids[3]` → `Some(Some(3))`, `sub_category_ids[]` or
/// `sub_category_ids` → `Some(None)`, anything else → `None`.
fn sub_category_index(key: &str) -> Option<Option<usize>> {
    let rest = key.strip_prefix(query::SUB_CATEGORY_IDS)?;
    if rest.is_empty() || rest == "[]" {
        return Some(None);
    }
    let inner = rest.strip_prefix('[')?.strip_suffix(']')?;
    inner.parse::<usize>().ok().map(Some)
}
