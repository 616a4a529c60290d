//! Backend payloads and the lenient parsers that read them.
//!
//! The listing backend is inconsistent about envelopes. Lists may arrive as
//! `{data: {data: [...]}}`, `{data: [...]}`, `{results: [...]}` or a bare
//! array. Parsers probe those shapes in that order and give up with an error;
//! the caller decides whether that error becomes an empty value.

use percent_encoding::utf8_percent_encode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{CatalogError, CatalogResult};
use crate::location::PATH_SEGMENT;

pub const CATEGORIES_PATH: &str = "category/view";
pub const REGIONS_PATH: &str = "address/cities";
pub const SERVICES_PATH: &str = "service/view";

pub fn districts_path(region_slug: &str) -> String {
    format!(
        "{REGIONS_PATH}/{}",
        utf8_percent_encode(region_slug, PATH_SEGMENT)
    )
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubCategory {
    pub id: u64,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: u64,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub services_count: u64,
    #[serde(default)]
    pub sub_categories: Vec<SubCategory>,
}

impl Category {
    pub fn has_sub_category(&self, id: u64) -> bool {
        self.sub_categories.iter().any(|s| s.id == id)
    }
}

pub fn find_category<'a>(categories: &'a [Category], slug: &str) -> Option<&'a Category> {
    categories.iter().find(|c| c.slug == slug)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: u64,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct District {
    pub id: u64,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CityWithDistricts {
    #[serde(default)]
    districts: Vec<District>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceImage {
    pub id: u64,
    #[serde(default)]
    pub small: Option<String>,
    #[serde(default)]
    pub medium: Option<String>,
    #[serde(default)]
    pub large: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRef {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: u64,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub comment_count: u64,
    #[serde(default)]
    pub price_from: u64,
    #[serde(default)]
    pub price_to: u64,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub images: Vec<ServiceImage>,
    #[serde(default)]
    pub category: Option<NamedRef>,
    #[serde(default)]
    pub city: Option<NamedRef>,
    #[serde(default)]
    pub district: Option<NamedRef>,
}

impl Service {
    pub fn cover_image(&self) -> Option<&str> {
        self.images
            .first()
            .and_then(|img| img.medium.as_deref().or(img.small.as_deref()).or(img.large.as_deref()))
    }
}

/// Pagination metadata the backend attaches when it paginates itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingMeta {
    pub total: u64,
    pub per_page: u32,
    pub current_page: u32,
    pub last_page: u32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServicesResponse {
    pub items: Vec<Service>,
    pub meta: Option<ListingMeta>,
}

fn parse_json(resource: &'static str, body: &[u8]) -> CatalogResult<Value> {
    serde_json::from_slice(body).map_err(|e| CatalogError::malformed(resource, e.to_string()))
}

fn non_null(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

/// First present envelope among `data.data`, `data`, `results`, or the root
/// itself when it is already a list.
fn list_envelope(raw: &Value) -> Option<&Value> {
    if raw.is_array() {
        return Some(raw);
    }
    non_null(raw.get("data").and_then(|d| d.get("data")))
        .or_else(|| non_null(raw.get("data")))
        .or_else(|| non_null(raw.get("results")))
}

/// Deserializes each element on its own so one bad row does not sink the list.
fn parse_items<T: DeserializeOwned>(resource: &'static str, list: &Value) -> CatalogResult<Vec<T>> {
    let Some(rows) = list.as_array() else {
        return Err(CatalogError::malformed(resource, "expected a list"));
    };
    let mut items = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        match serde_json::from_value::<T>(row.clone()) {
            Ok(item) => items.push(item),
            Err(e) => warn!(resource, index, error = %e, "skipping malformed row"),
        }
    }
    Ok(items)
}

fn parse_list<T: DeserializeOwned>(resource: &'static str, body: &[u8]) -> CatalogResult<Vec<T>> {
    let raw = parse_json(resource, body)?;
    let list = list_envelope(&raw)
        .ok_or_else(|| CatalogError::malformed(resource, "no list envelope found"))?;
    parse_items(resource, list)
}

pub fn parse_categories(body: &[u8]) -> CatalogResult<Vec<Category>> {
    parse_list("categories", body)
}

pub fn parse_regions(body: &[u8]) -> CatalogResult<Vec<Region>> {
    parse_list("regions", body)
}

/// The city endpoint returns one object; districts hang off it.
pub fn parse_districts(body: &[u8]) -> CatalogResult<Vec<District>> {
    let raw = parse_json("districts", body)?;
    let city = non_null(raw.get("data").and_then(|d| d.get("data")))
        .or_else(|| non_null(raw.get("data")))
        .or_else(|| non_null(raw.get("result")))
        .or_else(|| non_null(raw.get("results")))
        .ok_or_else(|| CatalogError::malformed("districts", "no city envelope found"))?;
    match city.get("districts") {
        Some(list) => parse_items("districts", list),
        None => Ok(Vec::new()),
    }
}

pub fn parse_services(body: &[u8]) -> CatalogResult<ServicesResponse> {
    let raw = parse_json("services", body)?;
    let list = list_envelope(&raw)
        .ok_or_else(|| CatalogError::malformed("services", "no list envelope found"))?;
    let items = parse_items("services", list)?;

    let meta = non_null(raw.get("data").and_then(|d| d.get("meta")))
        .or_else(|| non_null(raw.get("meta")))
        .and_then(|m| match serde_json::from_value::<ListingMeta>(m.clone()) {
            Ok(meta) => Some(meta),
            Err(e) => {
                warn!(error = %e, "ignoring malformed listing meta");
                None
            }
        });

    Ok(ServicesResponse { items, meta })
}
