//! Filter state and the reducer that owns it.
//!
//! Every intent produces a new [`FilterState`]; nothing mutates one in place
//! from outside this module. Page resets live one level up, in
//! [`CatalogQuery`], so the reducer stays a pure function of state and intent.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{PRICE_CEILING, PRICE_FLOOR, RATING_MAX, RATING_MIN};

/// Inclusive price bounds. `min <= max` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "PriceBounds")]
pub struct PriceRange {
    min: u64,
    max: u64,
}

/// Wire shape of [`PriceRange`]; deserialized values go through
/// [`PriceRange::new`].
#[derive(Deserialize)]
struct PriceBounds {
    min: u64,
    max: u64,
}

impl From<PriceBounds> for PriceRange {
    fn from(bounds: PriceBounds) -> Self {
        Self::new(bounds.min, bounds.max)
    }
}

impl PriceRange {
    /// Clamps both ends to the absolute bounds and swaps a reversed pair.
    pub fn new(min: u64, max: u64) -> Self {
        let min = min.clamp(PRICE_FLOOR, PRICE_CEILING);
        let max = max.clamp(PRICE_FLOOR, PRICE_CEILING);
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub const fn full() -> Self {
        Self {
            min: PRICE_FLOOR,
            max: PRICE_CEILING,
        }
    }

    pub const fn min(&self) -> u64 {
        self.min
    }

    pub const fn max(&self) -> u64 {
        self.max
    }

    pub const fn has_lower_bound(&self) -> bool {
        self.min > PRICE_FLOOR
    }

    pub const fn has_upper_bound(&self) -> bool {
        self.max < PRICE_CEILING
    }

    pub const fn is_full(&self) -> bool {
        !self.has_lower_bound() && !self.has_upper_bound()
    }
}

impl Default for PriceRange {
    fn default() -> Self {
        Self::full()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOption {
    Popular,
    Cheap,
    Expensive,
    New,
    Rating,
}

impl SortOption {
    pub const ALL: [SortOption; 5] = [
        Self::Popular,
        Self::Cheap,
        Self::Expensive,
        Self::New,
        Self::Rating,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Popular => "popular",
            Self::Cheap => "cheap",
            Self::Expensive => "expensive",
            Self::New => "new",
            Self::Rating => "rating",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Popular => "Mashhur",
            Self::Cheap => "Narx: pastdan yuqoriga",
            Self::Expensive => "Narx: yuqoridan pastga",
            Self::New => "Yangi",
            Self::Rating => "Reyting",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub category_slug: Option<String>,
    pub region_slug: Option<String>,
    pub district_slug: Option<String>,
    pub price_range: PriceRange,
    pub ratings: BTreeSet<u8>,
    pub sub_category_ids: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterIntent {
    SelectCategory(String),
    SelectRegion(Option<String>),
    SelectDistrict(Option<String>),
    SetPriceRange { min: u64, max: u64 },
    ToggleRating(u8),
    SetSubCategoryIds(Vec<u64>),
    ClearAll,
}

impl FilterIntent {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SelectCategory(_) => "select_category",
            Self::SelectRegion(_) => "select_region",
            Self::SelectDistrict(_) => "select_district",
            Self::SetPriceRange { .. } => "set_price_range",
            Self::ToggleRating(_) => "toggle_rating",
            Self::SetSubCategoryIds(_) => "set_sub_category_ids",
            Self::ClearAll => "clear_all",
        }
    }
}

/// Applies one intent to `state`, returning the next state.
pub fn reduce(state: &FilterState, intent: FilterIntent) -> FilterState {
    let next = state.clone();
    match intent {
        FilterIntent::SelectCategory(slug) => next.select_category(slug),
        FilterIntent::SelectRegion(slug) => next.select_region(slug),
        FilterIntent::SelectDistrict(slug) => next.select_district(slug),
        FilterIntent::SetPriceRange { min, max } => next.set_price_range(min, max),
        FilterIntent::ToggleRating(value) => next.toggle_rating(value),
        FilterIntent::SetSubCategoryIds(ids) => next.set_sub_category_ids(ids),
        FilterIntent::ClearAll => FilterState::default(),
    }
}

impl FilterState {
    /// Selecting the active category deselects it.
    #[must_use]
    pub fn select_category(mut self, slug: impl Into<String>) -> Self {
        let slug = slug.into();
        if self.category_slug.as_deref() == Some(slug.as_str()) {
            self.category_slug = None;
        } else {
            self.category_slug = Some(slug);
        }
        self.sub_category_ids.clear();
        self
    }

    /// Blank slugs count as "no region".
    #[must_use]
    pub fn select_region(mut self, slug: Option<String>) -> Self {
        self.region_slug = normalize_slug(slug);
        self.district_slug = None;
        self
    }

    #[must_use]
    pub fn select_district(mut self, slug: Option<String>) -> Self {
        let slug = normalize_slug(slug);
        if slug.is_some() && self.region_slug.is_none() {
            debug!(district = ?slug, "ignoring district without a region");
            return self;
        }
        self.district_slug = slug;
        self
    }

    #[must_use]
    pub fn set_price_range(mut self, min: u64, max: u64) -> Self {
        self.price_range = PriceRange::new(min, max);
        self
    }

    #[must_use]
    pub fn toggle_rating(mut self, value: u8) -> Self {
        if !(RATING_MIN..=RATING_MAX).contains(&value) {
            debug!(value, "ignoring rating outside 1..=5");
            return self;
        }
        if !self.ratings.remove(&value) {
            self.ratings.insert(value);
        }
        self
    }

    /// Replaces the selection wholesale. Repeated ids keep their first position.
    #[must_use]
    pub fn set_sub_category_ids(mut self, ids: Vec<u64>) -> Self {
        let mut seen = BTreeSet::new();
        self.sub_category_ids = ids.into_iter().filter(|id| seen.insert(*id)).collect();
        self
    }

    #[must_use]
    pub fn clear_all(self) -> Self {
        Self::default()
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Everything that decides which services page is shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogQuery {
    pub filter: FilterState,
    pub sort: Option<SortOption>,
    pub search: Option<String>,
    page: u32,
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self {
            filter: FilterState::default(),
            sort: None,
            search: None,
            page: 1,
        }
    }
}

impl CatalogQuery {
    pub fn new(
        filter: FilterState,
        sort: Option<SortOption>,
        search: Option<String>,
        page: u32,
    ) -> Self {
        Self {
            filter,
            sort,
            search: normalize_search(search),
            page: page.max(1),
        }
    }

    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Runs the reducer and goes back to the first page.
    pub fn apply(&mut self, intent: FilterIntent) {
        self.filter = reduce(&self.filter, intent);
        self.page = 1;
    }

    pub fn set_sort(&mut self, sort: Option<SortOption>) {
        self.sort = sort;
        self.page = 1;
    }

    pub fn set_search(&mut self, search: Option<String>) {
        self.search = normalize_search(search);
        self.page = 1;
    }

    /// Pure page change: filters are left alone.
    pub fn go_to_page(&mut self, page: u32) {
        self.page = page.max(1);
    }
}

fn normalize_slug(slug: Option<String>) -> Option<String> {
    slug.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn normalize_search(search: Option<String>) -> Option<String> {
    search
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn with_district() -> FilterState {
        FilterState::default()
            .select_region(Some("tashkent".into()))
            .select_district(Some("chilonzor".into()))
    }

    #[test]
    fn selecting_active_category_twice_returns_to_default() {
        let once = reduce(
            &FilterState::default(),
            FilterIntent::SelectCategory("cleaning".into()),
        );
        assert_eq!(once.category_slug.as_deref(), Some("cleaning"));

        let twice = reduce(&once, FilterIntent::SelectCategory("cleaning".into()));
        assert_eq!(twice.category_slug, None);
        assert!(twice.sub_category_ids.is_empty());
    }

    #[test]
    fn switching_category_clears_sub_categories() {
        let state = FilterState::default()
            .select_category("cleaning")
            .set_sub_category_ids(vec![5, 12]);
        let next = state.select_category("repair");
        assert_eq!(next.category_slug.as_deref(), Some("repair"));
        assert!(next.sub_category_ids.is_empty());
    }

    #[test]
    fn region_change_clears_district() {
        let next = with_district().select_region(Some("samarkand".into()));
        assert_eq!(next.region_slug.as_deref(), Some("samarkand"));
        assert_eq!(next.district_slug, None);
    }

    #[test]
    fn removing_region_clears_district() {
        let next = with_district().select_region(None);
        assert_eq!(next.region_slug, None);
        assert_eq!(next.district_slug, None);
    }

    #[test]
    fn district_without_region_is_ignored() {
        let next = FilterState::default().select_district(Some("chilonzor".into()));
        assert_eq!(next.district_slug, None);
    }

    #[test]
    fn district_selection_does_not_cascade() {
        let next = with_district().select_district(None);
        assert_eq!(next.region_slug.as_deref(), Some("tashkent"));
        assert_eq!(next.district_slug, None);
    }

    #[test]
    fn price_range_is_clamped_and_ordered() {
        let range = PriceRange::new(2_000_000, 50_000);
        assert_eq!(range.min(), 50_000);
        assert_eq!(range.max(), PRICE_CEILING);
        assert!(PriceRange::default().is_full());
    }

    #[test]
    fn deserialized_price_range_is_normalized() {
        let range: PriceRange =
            serde_json::from_str(r#"{"min": 300000, "max": 50000}"#).unwrap();
        assert_eq!((range.min(), range.max()), (50_000, 300_000));

        let state: FilterState = serde_json::from_value(serde_json::json!({
            "category_slug": null,
            "region_slug": null,
            "district_slug": null,
            "price_range": {"min": 5_000_000, "max": 10},
            "ratings": [],
            "sub_category_ids": []
        }))
        .unwrap();
        assert!(state.price_range.min() <= state.price_range.max());
        assert_eq!(state.price_range.max(), PRICE_CEILING);
    }

    #[test]
    fn place_slugs_are_trimmed() {
        let state = FilterState::default()
            .select_region(Some("  tashkent ".into()))
            .select_district(Some(" chilonzor".into()));
        assert_eq!(state.region_slug.as_deref(), Some("tashkent"));
        assert_eq!(state.district_slug.as_deref(), Some("chilonzor"));

        let blank = state.select_region(Some("   ".into()));
        assert_eq!(blank.region_slug, None);
        assert_eq!(blank.district_slug, None);
    }

    #[test]
    fn rating_toggle_adds_then_removes() {
        let on = FilterState::default().toggle_rating(4);
        assert!(on.ratings.contains(&4));
        let off = on.toggle_rating(4);
        assert!(off.ratings.is_empty());
    }

    #[test]
    fn rating_out_of_range_is_ignored() {
        let state = FilterState::default().toggle_rating(0).toggle_rating(6);
        assert!(state.ratings.is_empty());
    }

    #[test]
    fn sub_category_ids_drop_duplicates_keeping_order() {
        let state = FilterState::default().set_sub_category_ids(vec![7, 3, 7, 1]);
        assert_eq!(state.sub_category_ids, vec![7, 3, 1]);
    }

    #[test]
    fn clear_all_resets_everything() {
        let state = with_district()
            .select_category("cleaning")
            .set_price_range(10, 20)
            .toggle_rating(5);
        assert!(reduce(&state, FilterIntent::ClearAll).is_default());
    }

    #[test]
    fn sort_parse_round_trips() {
        for sort in SortOption::ALL {
            assert_eq!(SortOption::parse(sort.as_str()), Some(sort));
        }
        assert_eq!(SortOption::parse("cheapest"), None);
    }

    #[test]
    fn blank_search_is_dropped() {
        let mut query = CatalogQuery::default();
        query.set_search(Some("   ".into()));
        assert_eq!(query.search, None);
        query.set_search(Some("  plumber ".into()));
        assert_eq!(query.search.as_deref(), Some("plumber"));
    }

    fn intent_strategy() -> impl Strategy<Value = FilterIntent> {
        let slug = prop::sample::select(vec!["cleaning", "repair", "tashkent", "bukhara"]);
        prop_oneof![
            slug.clone().prop_map(|s| FilterIntent::SelectCategory(s.to_string())),
            prop::option::of(slug.clone())
                .prop_map(|s| FilterIntent::SelectRegion(s.map(str::to_string))),
            prop::option::of(slug).prop_map(|s| FilterIntent::SelectDistrict(s.map(str::to_string))),
            (0u64..2_000_000, 0u64..2_000_000)
                .prop_map(|(min, max)| FilterIntent::SetPriceRange { min, max }),
            (0u8..8).prop_map(FilterIntent::ToggleRating),
            prop::collection::vec(1u64..50, 0..5).prop_map(FilterIntent::SetSubCategoryIds),
            Just(FilterIntent::ClearAll),
        ]
    }

    proptest! {
        #[test]
        fn every_intent_resets_page(
            intents in prop::collection::vec(intent_strategy(), 0..8),
            intent in intent_strategy(),
            page in 2u32..100,
        ) {
            let mut query = CatalogQuery::default();
            for i in intents {
                query.apply(i);
            }
            query.go_to_page(page);
            prop_assert_eq!(query.page(), page);

            query.apply(intent);
            prop_assert_eq!(query.page(), 1);
        }

        #[test]
        fn page_change_keeps_filters(
            intents in prop::collection::vec(intent_strategy(), 0..8),
            page in 1u32..100,
        ) {
            let mut query = CatalogQuery::default();
            for i in intents {
                query.apply(i);
            }
            let before = query.filter.clone();
            query.go_to_page(page);
            prop_assert_eq!(query.filter, before);
        }

        #[test]
        fn invariants_hold_after_any_sequence(
            intents in prop::collection::vec(intent_strategy(), 0..16),
        ) {
            let mut state = FilterState::default();
            for i in intents {
                state = reduce(&state, i);
                prop_assert!(state.price_range.min() <= state.price_range.max());
                prop_assert!(state.district_slug.is_none() || state.region_slug.is_some());
                prop_assert!(state.ratings.iter().all(|r| (1..=5).contains(r)));
            }
        }

        #[test]
        fn region_change_always_clears_district(
            region in "[a-z]{3,8}",
            district in "[a-z]{3,8}",
            next_region in prop::option::of("[a-z]{3,8}"),
        ) {
            let state = FilterState::default()
                .select_region(Some(region))
                .select_district(Some(district));
            let next = reduce(&state, FilterIntent::SelectRegion(next_region));
            prop_assert_eq!(next.district_slug, None);
        }
    }
}
