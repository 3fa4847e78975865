//! URL handling module for Sumi-Glean
//!
//! This module provides URL canonicalization and link classification for a
//! single-site crawl: which links are pages to traverse, which are documents
//! to extract, and which are filtered out.

mod filter;
mod normalize;

use crate::config::FilterConfig;
use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use url::Url;

pub use filter::{combined_suffixes, SegmentRule};
pub use normalize::canonicalize;

/// A site-scoped URL in normalized form, used as the deduplication key
///
/// Only [`canonicalize`] and [`SiteScope::seed`] construct these, so every
/// value is on the site origin with no query, no fragment and no trailing
/// slash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalUrl(Url);

impl CanonicalUrl {
    pub(crate) fn from_normalized(url: Url) -> Self {
        Self(url)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Returns a fetchable variant of this page with one query pair added
    ///
    /// Used for locale variants such as `?lang=hi`.
    pub fn with_query_pair(&self, key: &str, value: &str) -> Url {
        let mut url = self.0.clone();
        url.query_pairs_mut().append_pair(key, value);
        url
    }
}

impl fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl Serialize for CanonicalUrl {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0.as_str())
    }
}

/// Why a link is not traversed
///
/// Rejection is a classification, not an error: callers drop rejected links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// `javascript:`, `mailto:` and other non-HTTP links
    PseudoLink,
    /// The link could not be resolved into a URL
    Malformed,
    /// Host or port differs from the site origin
    CrossOrigin,
    /// A path segment is on the denylist
    Denylisted { segment: String },
    /// The path ends in a forbidden extension
    ForbiddenExtension { extension: String },
    /// A linked document, handed to the document pipeline instead
    Document(CanonicalUrl),
}

/// The crawl's origin plus the link filtering rules
#[derive(Debug, Clone)]
pub struct SiteScope {
    origin: Url,
    denied_segments: Vec<SegmentRule>,
    forbidden_extensions: HashSet<String>,
    document_extensions: HashSet<String>,
}

impl SiteScope {
    /// Builds the scope from the seed URL and the filter configuration
    pub fn new(seed: &Url, filter: &FilterConfig) -> Self {
        let mut origin = seed.clone();
        origin.set_path("/");
        origin.set_query(None);
        origin.set_fragment(None);

        Self {
            origin,
            denied_segments: filter
                .denied_segments
                .iter()
                .map(|entry| SegmentRule::parse(entry))
                .collect(),
            forbidden_extensions: lowercase_set(&filter.forbidden_extensions),
            document_extensions: lowercase_set(&filter.document_extensions),
        }
    }

    /// The origin every canonical URL is rebuilt on (path `/`)
    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Canonical form of the seed URL
    ///
    /// The seed itself is never filtered, only normalized.
    pub fn seed(&self, seed: &Url) -> CanonicalUrl {
        match canonicalize(self, seed, seed.as_str()) {
            Ok(url) | Err(Rejection::Document(url)) => url,
            Err(_) => {
                let mut url = self.origin.clone();
                url.set_path(seed.path().trim_end_matches('/'));
                if url.path().is_empty() {
                    url.set_path("/");
                }
                CanonicalUrl::from_normalized(url)
            }
        }
    }

    /// Returns true when `url` has the origin's host and explicit port
    ///
    /// The scheme is ignored: `http://host/x` on an `https://host` site is
    /// internal, since default ports compare as absent for either scheme.
    pub fn is_same_origin(&self, url: &Url) -> bool {
        let same_host = match (url.host_str(), self.origin.host_str()) {
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            _ => false,
        };
        same_host && url.port() == self.origin.port()
    }

    pub fn denied_segments(&self) -> &[SegmentRule] {
        &self.denied_segments
    }

    pub fn forbidden_extensions(&self) -> &HashSet<String> {
        &self.forbidden_extensions
    }

    pub fn document_extensions(&self) -> &HashSet<String> {
        &self.document_extensions
    }

    /// Returns true when a name (e.g. anchor text `Annual Report.pdf`) ends
    /// in a document extension
    pub fn names_document(&self, name: &str) -> bool {
        let name = name.trim().to_lowercase();
        self.document_extensions
            .iter()
            .any(|extension| name.ends_with(extension.as_str()))
    }
}

fn lowercase_set(items: &[String]) -> HashSet<String> {
    items.iter().map(|item| item.to_lowercase()).collect()
}
