//! Book listing queries.
//!
//! Query parameters are turned into a store-neutral [`BookQuery`]. The Mongo
//! store renders it with [`BookFilter::to_document`], the in-memory store
//! evaluates it with [`BookFilter::matches`].

use mongodb::bson::{doc, oid::ObjectId, Document};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::models::Book;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 9;
pub const RELATED_LIMIT: i64 = 12;
/// Lexical cutoff between "new" and "old" publish dates.
pub const NEW_RELEASE_CUTOFF: &str = "2023";
/// Category value meaning "no category filter" on `/book-info`.
pub const ALL_CATEGORIES: &str = "All";

/// Raw listing parameters. Numbers stay strings so that garbage falls back to
/// defaults instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BookListParams {
    /// Exact productType match
    pub category: Option<String>,
    /// Case-insensitive substring of the book name
    pub search: Option<String>,
    /// "low" or "high" price ordering
    pub sort: Option<String>,
    /// "new" (published 2023 or later) or "old"
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// 1-based page number, default 1
    pub page: Option<String>,
    /// Page size, default 9
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CategoryParams {
    pub category: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceOrder {
    Ascending,
    Descending,
}

impl PriceOrder {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(PriceOrder::Ascending),
            "high" => Some(PriceOrder::Descending),
            _ => None,
        }
    }

    pub fn to_document(self) -> Document {
        match self {
            PriceOrder::Ascending => doc! { "price": 1 },
            PriceOrder::Descending => doc! { "price": -1 },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edition {
    New,
    Old,
}

impl Edition {
    /// "new" selects recent books; any other non-empty value selects older ones.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "" => None,
            "new" => Some(Edition::New),
            _ => Some(Edition::Old),
        }
    }

    fn admits(self, publish_date: &str) -> bool {
        match self {
            Edition::New => publish_date >= NEW_RELEASE_CUTOFF,
            Edition::Old => publish_date < NEW_RELEASE_CUTOFF,
        }
    }
}

/// Additive predicates over the `books` collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookFilter {
    pub product_type: Option<String>,
    pub name_contains: Option<String>,
    pub edition: Option<Edition>,
    pub exclude_id: Option<ObjectId>,
}

impl BookFilter {
    pub fn to_document(&self) -> Document {
        let mut filter = Document::new();
        if let Some(product_type) = &self.product_type {
            filter.insert("productType", product_type.as_str());
        }
        if let Some(search) = &self.name_contains {
            filter.insert(
                "name",
                doc! { "$regex": escape_regex(search), "$options": "i" },
            );
        }
        match self.edition {
            Some(Edition::New) => {
                filter.insert("publishDate", doc! { "$gte": NEW_RELEASE_CUTOFF });
            }
            Some(Edition::Old) => {
                filter.insert("publishDate", doc! { "$lt": NEW_RELEASE_CUTOFF });
            }
            None => {}
        }
        if let Some(id) = self.exclude_id {
            filter.insert("_id", doc! { "$ne": id });
        }
        filter
    }

    /// Same semantics as the rendered document: a predicate on a missing
    /// field never matches.
    pub fn matches(&self, book: &Book) -> bool {
        if let Some(product_type) = &self.product_type {
            if book.product_type.as_ref() != Some(product_type) {
                return false;
            }
        }
        if let Some(search) = &self.name_contains {
            let needle = search.to_lowercase();
            match &book.name {
                Some(name) if name.to_lowercase().contains(&needle) => {}
                _ => return false,
            }
        }
        if let Some(edition) = self.edition {
            match &book.publish_date {
                Some(date) if edition.admits(date) => {}
                _ => return false,
            }
        }
        if let Some(id) = self.exclude_id {
            if book.id == Some(id) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookQuery {
    pub filter: BookFilter,
    pub order: Option<PriceOrder>,
    pub skip: u64,
    /// `None` returns every match.
    pub limit: Option<i64>,
}

impl BookQuery {
    /// Every book, in store order.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn from_params(params: &BookListParams) -> Self {
        let filter = BookFilter {
            product_type: non_empty(&params.category),
            name_contains: non_empty(&params.search),
            edition: params.kind.as_deref().and_then(Edition::parse),
            exclude_id: None,
        };

        let page = match parse_number(&params.page) {
            0 => DEFAULT_PAGE,
            page => page,
        };
        let limit = match parse_number(&params.limit) {
            0 => DEFAULT_PAGE_SIZE,
            limit => limit,
        };
        let skip = page.saturating_sub(1).saturating_mul(limit);

        Self {
            filter,
            order: params.sort.as_deref().and_then(PriceOrder::parse),
            skip: u64::try_from(skip).unwrap_or(0),
            limit: Some(limit),
        }
    }

    /// Unpaginated category listing; `All` or nothing disables the filter.
    pub fn in_category(category: Option<&str>) -> Self {
        let product_type = category
            .filter(|c| !c.is_empty() && *c != ALL_CATEGORIES)
            .map(str::to_string);
        Self {
            filter: BookFilter {
                product_type,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Up to [`RELATED_LIMIT`] books sharing `book`'s productType, minus itself.
    pub fn related_to(id: ObjectId, book: &Book) -> Self {
        Self {
            filter: BookFilter {
                product_type: Some(book.product_type.clone().unwrap_or_default()),
                exclude_id: Some(id),
                ..Default::default()
            },
            limit: Some(RELATED_LIMIT),
            ..Default::default()
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_deref().filter(|v| !v.is_empty()).map(str::to_string)
}

fn parse_number(value: &Option<String>) -> i64 {
    value
        .as_deref()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0)
}

fn escape_regex(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if "\\.+*?()|[]{}^$#&-~".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
