//! Everything the shell renders, derived from the model in one pass.

use serde::{Deserialize, Serialize};

use crate::api::Service;
use crate::filter::{FilterState, SortOption};
use crate::location::{to_location, CATALOG_ROOT};
use crate::model::{LoadingFlags, Model};
use crate::pagination::PageState;
use crate::{RATING_MAX, RATING_MIN};

pub const ALL_SERVICES_TITLE: &str = "Barcha xizmatlar";
pub const HOME_LABEL: &str = "Bosh sahifa";
pub const CATEGORIES_LABEL: &str = "Kategoriyalar";
pub const SORT_PLACEHOLDER: &str = "Saralash";
pub const CURRENCY_SUFFIX: &str = "so'm";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breadcrumb {
    pub label: String,
    /// `None` for the current page.
    pub href: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubCategoryView {
    pub id: u64,
    pub name: String,
    pub slug: String,
    pub is_selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryView {
    pub id: u64,
    pub name: String,
    pub slug: String,
    pub image: Option<String>,
    pub services_count: u64,
    pub is_active: bool,
    pub sub_categories: Vec<SubCategoryView>,
}

/// Region or district row in a picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOption {
    pub name: String,
    pub slug: String,
    pub is_selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceView {
    pub min: u64,
    pub max: u64,
    pub min_text: String,
    pub max_text: String,
    pub is_full: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingOption {
    pub value: u8,
    pub is_selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOptionView {
    pub value: String,
    pub label: String,
    pub is_selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCard {
    pub id: u64,
    pub slug: String,
    pub name: String,
    pub is_premium: bool,
    pub rating: f64,
    pub price_text: String,
    pub image: Option<String>,
    pub category: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub view_count: u64,
    pub comment_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewModel {
    pub title: String,
    pub category_image: Option<String>,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub categories: Vec<CategoryView>,
    pub regions: Vec<PlaceOption>,
    pub districts: Vec<PlaceOption>,
    pub price: PriceView,
    pub ratings: Vec<RatingOption>,
    pub sort_options: Vec<SortOptionView>,
    pub sort_label: String,
    pub search: Option<String>,
    pub services: Vec<ServiceCard>,
    pub pagination: PageState,
    pub active_filter_count: usize,
    pub has_active_filters: bool,
    pub is_empty: bool,
    pub loading: LoadingFlags,
    pub href: String,
}

impl ViewModel {
    pub fn build(model: &Model) -> Self {
        let query = &model.query;
        let filter = &query.filter;
        let selected = model.selected_category();

        let title = match (&filter.category_slug, selected) {
            (Some(_), Some(category)) => category.name.clone(),
            (Some(slug), None) => title_from_slug(slug),
            (None, _) => ALL_SERVICES_TITLE.to_string(),
        };

        let categories = model
            .categories
            .iter()
            .map(|c| {
                let is_active = filter.category_slug.as_deref() == Some(c.slug.as_str());
                CategoryView {
                    id: c.id,
                    name: c.name.clone(),
                    slug: c.slug.clone(),
                    image: c.image.clone(),
                    services_count: c.services_count,
                    is_active,
                    sub_categories: c
                        .sub_categories
                        .iter()
                        .map(|s| SubCategoryView {
                            id: s.id,
                            name: s.name.clone(),
                            slug: s.slug.clone(),
                            is_selected: is_active && filter.sub_category_ids.contains(&s.id),
                        })
                        .collect(),
                }
            })
            .collect();

        let regions = model
            .regions
            .iter()
            .map(|r| PlaceOption {
                name: r.name.clone(),
                slug: r.slug.clone(),
                is_selected: filter.region_slug.as_deref() == Some(r.slug.as_str()),
            })
            .collect();

        let districts = model
            .districts
            .iter()
            .map(|d| PlaceOption {
                name: d.name.clone(),
                slug: d.slug.clone(),
                is_selected: filter.district_slug.as_deref() == Some(d.slug.as_str()),
            })
            .collect();

        let price = PriceView {
            min: filter.price_range.min(),
            max: filter.price_range.max(),
            min_text: format_price_short(filter.price_range.min()),
            max_text: format_price_short(filter.price_range.max()),
            is_full: filter.price_range.is_full(),
        };

        let ratings = (RATING_MIN..=RATING_MAX)
            .rev()
            .map(|value| RatingOption {
                value,
                is_selected: filter.ratings.contains(&value),
            })
            .collect();

        let sort_options = SortOption::ALL
            .iter()
            .map(|option| SortOptionView {
                value: option.as_str().to_string(),
                label: option.label().to_string(),
                is_selected: query.sort == Some(*option),
            })
            .collect();

        let services: Vec<ServiceCard> = model
            .listing
            .displayed(model.config.page_size)
            .iter()
            .map(ServiceCard::from)
            .collect();

        let active_filter_count = active_filter_count(filter);
        let breadcrumbs = breadcrumbs(filter.category_slug.as_ref().map(|_| title.as_str()));

        Self {
            title,
            category_image: selected.and_then(|c| c.image.clone()),
            breadcrumbs,
            categories,
            regions,
            districts,
            price,
            ratings,
            sort_options,
            sort_label: query
                .sort
                .map_or(SORT_PLACEHOLDER, SortOption::label)
                .to_string(),
            search: query.search.clone(),
            is_empty: services.is_empty() && !model.loading.services,
            services,
            pagination: *model.listing.page_state(),
            active_filter_count,
            has_active_filters: has_active_filters(filter),
            loading: model.loading,
            href: to_location(query, model.config.page_size).href(),
        }
    }
}

impl From<&Service> for ServiceCard {
    fn from(service: &Service) -> Self {
        Self {
            id: service.id,
            slug: service.slug.clone(),
            name: service.name.clone(),
            is_premium: service.is_premium,
            rating: service.rating,
            price_text: price_text(service.price_from, service.price_to),
            image: service.cover_image().map(str::to_string),
            category: service.category.as_ref().map(|c| c.name.clone()),
            city: service.city.as_ref().map(|c| c.name.clone()),
            district: service.district.as_ref().map(|d| d.name.clone()),
            view_count: service.view_count,
            comment_count: service.comment_count,
        }
    }
}

/// Number of dimensions narrowing the listing.
pub fn active_filter_count(filter: &FilterState) -> usize {
    [
        filter.category_slug.is_some(),
        filter.region_slug.is_some(),
        filter.district_slug.is_some(),
        !filter.price_range.is_full(),
        !filter.ratings.is_empty(),
        !filter.sub_category_ids.is_empty(),
    ]
    .into_iter()
    .filter(|active| *active)
    .count()
}

pub fn has_active_filters(filter: &FilterState) -> bool {
    active_filter_count(filter) > 0
}

/// `home-cleaning` → `Home Cleaning`.
pub fn title_from_slug(slug: &str) -> String {
    slug.split('-')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn breadcrumbs(category: Option<&str>) -> Vec<Breadcrumb> {
    let mut trail = vec![Breadcrumb {
        label: HOME_LABEL.to_string(),
        href: Some("/".to_string()),
    }];
    match category {
        Some(name) => {
            trail.push(Breadcrumb {
                label: CATEGORIES_LABEL.to_string(),
                href: Some(CATALOG_ROOT.to_string()),
            });
            trail.push(Breadcrumb {
                label: name.to_string(),
                href: None,
            });
        }
        None => trail.push(Breadcrumb {
            label: CATEGORIES_LABEL.to_string(),
            href: None,
        }),
    }
    trail
}

/// Thousands separated by spaces: `1500000` → `1 500 000`.
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(ch);
    }
    out
}

pub fn format_price(value: u64) -> String {
    format!("{} {CURRENCY_SUFFIX}", group_thousands(value))
}

/// Compact slider label: `1.5M`, `50K`, `900`.
pub fn format_price_short(value: u64) -> String {
    fn compact(value: u64, unit: u64, suffix: &str) -> String {
        let whole = value / unit;
        let tenth = (value % unit) * 10 / unit;
        if tenth == 0 {
            format!("{whole}{suffix}")
        } else {
            format!("{whole}.{tenth}{suffix}")
        }
    }

    if value >= 1_000_000 {
        compact(value, 1_000_000, "M")
    } else if value >= 1_000 {
        compact(value, 1_000, "K")
    } else {
        value.to_string()
    }
}

pub fn price_text(from: u64, to: u64) -> String {
    if to > from {
        format!(
            "{} - {} {CURRENCY_SUFFIX}",
            group_thousands(from),
            group_thousands(to)
        )
    } else {
        format_price(from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Category;
    use crate::filter::FilterIntent;

    #[test]
    fn titles_from_slugs() {
        assert_eq!(title_from_slug("home-cleaning"), "Home Cleaning");
        assert_eq!(title_from_slug("repair"), "Repair");
        assert_eq!(title_from_slug("a--b"), "A B");
    }

    #[test]
    fn price_formatting() {
        assert_eq!(format_price(0), "0 so'm");
        assert_eq!(format_price(50_000), "50 000 so'm");
        assert_eq!(format_price(1_000_000), "1 000 000 so'm");
        assert_eq!(format_price_short(1_000_000), "1M");
        assert_eq!(format_price_short(1_500_000), "1.5M");
        assert_eq!(format_price_short(50_000), "50K");
        assert_eq!(format_price_short(999), "999");
        assert_eq!(price_text(50_000, 300_000), "50 000 - 300 000 so'm");
        assert_eq!(price_text(50_000, 0), "50 000 so'm");
    }

    #[test]
    fn counts_active_filters() {
        let filter = FilterState::default()
            .select_category("cleaning")
            .select_region(Some("tashkent".into()))
            .set_price_range(50_000, 300_000)
            .toggle_rating(4)
            .toggle_rating(5);
        assert_eq!(active_filter_count(&filter), 4);
        assert!(has_active_filters(&filter));
        assert_eq!(active_filter_count(&FilterState::default()), 0);
    }

    #[test]
    fn breadcrumb_trail() {
        let root = breadcrumbs(None);
        assert_eq!(root.len(), 2);
        assert_eq!(root[1].href, None);

        let nested = breadcrumbs(Some("Tozalash"));
        assert_eq!(nested[1].href.as_deref(), Some("/category"));
        assert_eq!(nested[2].label, "Tozalash");
    }

    #[test]
    fn view_uses_loaded_category_name() {
        let mut model = Model::default();
        model.categories = vec![Category {
            id: 3,
            name: "Tozalash".into(),
            slug: "cleaning".into(),
            image: Some("c.png".into()),
            kind: None,
            services_count: 4,
            sub_categories: Vec::new(),
        }];
        model
            .query
            .apply(FilterIntent::SelectCategory("cleaning".into()));

        let view = ViewModel::build(&model);
        assert_eq!(view.title, "Tozalash");
        assert_eq!(view.category_image.as_deref(), Some("c.png"));
        assert!(view.categories[0].is_active);
        assert_eq!(view.href, "/category/cleaning?page=1&size=6");
    }

    #[test]
    fn view_without_category() {
        let view = ViewModel::build(&Model::default());
        assert_eq!(view.title, ALL_SERVICES_TITLE);
        assert_eq!(view.sort_label, SORT_PLACEHOLDER);
        assert_eq!(view.ratings.first().map(|r| r.value), Some(5));
        assert!(view.is_empty);
        assert!(!view.has_active_filters);
    }
}
