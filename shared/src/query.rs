//! Filter state → query parameters.
//!
//! The same parameter list feeds the backend request and the shareable URL,
//! and doubles as the request key that decides whether a new fetch is needed.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::form_urlencoded;

use crate::api::{find_category, Category};
use crate::filter::{FilterState, SortOption};

pub const CATEGORY_ID: &str = "category_id";
pub const CITY_ID: &str = "city_id";
pub const DISTRICT_ID: &str = "district_id";
pub const PRICE_MIN: &str = "price_min";
pub const PRICE_MAX: &str = "price_max";
pub const RATING: &str = "rating";
pub const SORT: &str = "sort";
pub const SEARCH: &str = "search";
pub const SUB_CATEGORY_IDS: &str = "sub_category_ids";
pub const PAGE: &str = "page";
pub const SIZE: &str = "size";

pub fn sub_category_key(index: usize) -> String {
    format!("{SUB_CATEGORY_IDS}[{index}]")
}

/// Ordered `key=value` pairs. Order is fixed by [`to_query_params`], so two
/// equal states always compare equal here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push((key.into(), value.into()));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn without(mut self, key: &str) -> Self {
        self.0.retain(|(k, _)| k != key);
        self
    }

    /// `application/x-www-form-urlencoded`, no leading `?`.
    pub fn encode(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.0 {
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }
}

impl fmt::Display for QueryParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Looks the slug up in the loaded categories. `None` while the list is not
/// loaded yet or when the slug is unknown; the category filter is then
/// simply left out of that request.
pub fn resolve_category_id(categories: &[Category], slug: Option<&str>) -> Option<u64> {
    let slug = slug?;
    let id = find_category(categories, slug).map(|c| c.id);
    if id.is_none() {
        debug!(slug, loaded = categories.len(), "category slug not resolved");
    }
    id
}

pub fn to_query_params(
    filter: &FilterState,
    sort: Option<SortOption>,
    search: Option<&str>,
    page: Option<u32>,
    page_size: Option<u32>,
    category_id: Option<u64>,
) -> QueryParams {
    let mut params = QueryParams::new();

    if let Some(id) = category_id {
        params.push(CATEGORY_ID, id.to_string());
    }
    if let Some(region) = &filter.region_slug {
        params.push(CITY_ID, region.clone());
    }
    if let Some(district) = &filter.district_slug {
        params.push(DISTRICT_ID, district.clone());
    }
    if filter.price_range.has_lower_bound() {
        params.push(PRICE_MIN, filter.price_range.min().to_string());
    }
    if filter.price_range.has_upper_bound() {
        params.push(PRICE_MAX, filter.price_range.max().to_string());
    }
    if !filter.ratings.is_empty() {
        let joined = filter
            .ratings
            .iter()
            .map(u8::to_string)
            .collect::<Vec<_>>()
            .join(",");
        params.push(RATING, joined);
    }
    if let Some(sort) = sort {
        params.push(SORT, sort.as_str());
    }
    if let Some(search) = search.map(str::trim).filter(|s| !s.is_empty()) {
        params.push(SEARCH, search);
    }
    for (index, id) in filter.sub_category_ids.iter().enumerate() {
        params.push(sub_category_key(index), id.to_string());
    }
    if let Some(page) = page {
        params.push(PAGE, page.to_string());
    }
    if let Some(size) = page_size {
        params.push(SIZE, size.to_string());
    }

    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PRICE_CEILING;
    use proptest::prelude::*;

    fn category(id: u64, slug: &str) -> Category {
        Category {
            id,
            name: slug.to_uppercase(),
            slug: slug.into(),
            image: None,
            kind: None,
            services_count: 0,
            sub_categories: Vec::new(),
        }
    }

    #[test]
    fn default_state_emits_only_paging() {
        let params = to_query_params(&FilterState::default(), None, None, Some(1), Some(6), None);
        let expected: QueryParams = [(PAGE, "1"), (SIZE, "6")].into_iter().collect();
        assert_eq!(params, expected);
    }

    #[test]
    fn price_bounds_are_omitted_at_defaults() {
        let filter = FilterState::default().set_price_range(0, PRICE_CEILING);
        let params = to_query_params(&filter, None, None, None, None, None);
        assert!(!params.contains_key(PRICE_MIN));
        assert!(!params.contains_key(PRICE_MAX));

        let filter = filter.set_price_range(1, PRICE_CEILING - 1);
        let params = to_query_params(&filter, None, None, None, None, None);
        assert_eq!(params.get(PRICE_MIN), Some("1"));
        assert_eq!(params.get(PRICE_MAX), Some("999999"));
    }

    #[test]
    fn sub_categories_are_indexed_in_order() {
        let filter = FilterState::default().set_sub_category_ids(vec![5, 12, 7]);
        let params = to_query_params(&filter, None, None, None, None, None);
        assert_eq!(params.get("sub_category_ids[0]"), Some("5"));
        assert_eq!(params.get("sub_category_ids[1]"), Some("12"));
        assert_eq!(params.get("sub_category_ids[2]"), Some("7"));
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn sort_and_search_pass_through() {
        let params = to_query_params(
            &FilterState::default(),
            Some(SortOption::Cheap),
            Some(" gilam "),
            None,
            None,
            None,
        );
        assert_eq!(params.get(SORT), Some("cheap"));
        assert_eq!(params.get(SEARCH), Some("gilam"));
    }

    #[test]
    fn category_resolution() {
        let categories = vec![category(3, "cleaning"), category(8, "repair")];
        assert_eq!(resolve_category_id(&categories, Some("repair")), Some(8));
        assert_eq!(resolve_category_id(&categories, Some("moving")), None);
        assert_eq!(resolve_category_id(&[], Some("repair")), None);
        assert_eq!(resolve_category_id(&categories, None), None);
    }

    #[test]
    fn encode_escapes_brackets() {
        let params: QueryParams = [("sub_category_ids[0]", "5"), ("search", "a b")]
            .into_iter()
            .collect();
        assert_eq!(params.encode(), "sub_category_ids%5B0%5D=5&search=a+b");
    }

    #[test]
    fn without_drops_a_key() {
        let params: QueryParams = [(CATEGORY_ID, "3"), (PAGE, "1")].into_iter().collect();
        assert_eq!(params.without(CATEGORY_ID).encode(), "page=1");
    }

    proptest! {
        #[test]
        fn rating_value_has_one_item_per_selected_rating(
            ratings in prop::collection::btree_set(1u8..=5, 0..=5),
        ) {
            let mut filter = FilterState::default();
            for r in &ratings {
                filter = filter.toggle_rating(*r);
            }
            let params = to_query_params(&filter, None, None, None, None, None);
            match params.get(RATING) {
                Some(value) => {
                    prop_assert!(!ratings.is_empty());
                    prop_assert_eq!(value.split(',').count(), ratings.len());
                }
                None => prop_assert!(ratings.is_empty()),
            }
        }

        #[test]
        fn mapping_is_deterministic(
            min in 0u64..1_500_000,
            max in 0u64..1_500_000,
            page in 1u32..50,
        ) {
            let filter = FilterState::default().set_price_range(min, max);
            let a = to_query_params(&filter, None, None, Some(page), Some(6), Some(3));
            let b = to_query_params(&filter.clone(), None, None, Some(page), Some(6), Some(3));
            prop_assert_eq!(a, b);
        }
    }
}
