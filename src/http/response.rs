//! Hypermedia response shapes.
//!
//! Every resource carries a `_links` map and every collection is a `Page`
//! with `self`/`next`/`prev` links.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single hypermedia link.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Link {
    pub href: String,
    /// HTTP method when it is not GET.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

impl Link {
    pub fn get(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            method: None,
        }
    }

    pub fn with_method(href: impl Into<String>, method: &str) -> Self {
        Self {
            href: href.into(),
            method: Some(method.to_string()),
        }
    }
}

/// Relation name → link.
pub type Links = BTreeMap<String, Link>;

/// Builder for a `_links` map.
#[derive(Debug, Default)]
pub struct LinksBuilder(Links);

impl LinksBuilder {
    pub fn new(self_href: impl Into<String>) -> Self {
        let mut links = Links::new();
        links.insert("self".to_string(), Link::get(self_href));
        Self(links)
    }

    pub fn link(mut self, rel: &str, link: Link) -> Self {
        self.0.insert(rel.to_string(), link);
        self
    }

    pub fn build(self) -> Links {
        self.0
    }
}

/// A page of a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub skip: usize,
    pub limit: usize,
    #[serde(rename = "_links")]
    pub links: Links,
}

impl<T> Page<T> {
    /// `query` holds extra query parameters to preserve in page links.
    pub fn new(
        items: Vec<T>,
        total: usize,
        skip: usize,
        limit: usize,
        base: &str,
        query: &[(&str, String)],
    ) -> Self {
        let href = |skip: usize| {
            let mut params = url::form_urlencoded::Serializer::new(String::new());
            params.append_pair("skip", &skip.to_string());
            params.append_pair("limit", &limit.to_string());
            for (k, v) in query {
                params.append_pair(k, v);
            }
            format!("{}?{}", base, params.finish())
        };

        let mut links = LinksBuilder::new(href(skip));
        let next = skip.saturating_add(limit);
        if next < total {
            links = links.link("next", Link::get(href(next)));
        }
        if skip > 0 {
            links = links.link("prev", Link::get(href(skip.saturating_sub(limit))));
        }

        Self {
            items,
            total,
            skip,
            limit,
            links: links.build(),
        }
    }
}

/// Percent-encode a single query value.
pub fn encode_query_value(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
