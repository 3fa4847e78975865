//! HTML parser for extracting page content, links and tables
//!
//! This module handles parsing HTML content to extract:
//! - Links to follow and document references (from `<a href>` tags)
//! - Page title
//! - Visible text of the primary content region
//! - Tables as header plus rows

use crate::config::{compile_selector, ExtractConfig};
use crate::output::Table;
use crate::url::{canonicalize, CanonicalUrl, Rejection, SiteScope};
use crate::{ConfigError, GleanError, Result};
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeSet;
use url::Url;

/// Extracted information from an HTML page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPage {
    /// The page title, site suffix removed; empty when missing
    pub title: String,

    /// Whitespace-normalized text of the content region
    pub content: String,

    /// Accepted internal links, sorted and unique, the page itself excluded
    pub links: Vec<CanonicalUrl>,

    /// Linked documents, sorted and unique
    pub documents: Vec<CanonicalUrl>,

    /// Tables of the content region
    pub tables: Vec<Table>,
}

/// Precompiled selectors and extraction settings
#[derive(Debug, Clone)]
pub struct PageExtractor {
    strip: Vec<Selector>,
    content: Vec<Selector>,
    anchors: Selector,
    title: Selector,
    table: Selector,
    row: Selector,
    cell: Selector,
    title_suffix: String,
    tables: bool,
}

impl PageExtractor {
    pub fn from_config(config: &ExtractConfig) -> std::result::Result<Self, ConfigError> {
        let compile_all = |selectors: &[String]| {
            selectors
                .iter()
                .map(|s| compile_selector(s))
                .collect::<std::result::Result<Vec<_>, _>>()
        };

        Ok(Self {
            strip: compile_all(&config.strip_selectors)?,
            content: compile_all(&config.content_selectors)?,
            anchors: compile_selector("a[href]")?,
            title: compile_selector("title")?,
            table: compile_selector("table")?,
            row: compile_selector("tr")?,
            cell: compile_selector("th, td")?,
            title_suffix: config.title_suffix.clone(),
            tables: config.tables,
        })
    }

    /// Parses a fetched page
    ///
    /// # Extraction Order
    ///
    /// 1. Parse; an empty body is malformed markup
    /// 2. Title from `<title>`
    /// 3. Links and document references from the full document
    /// 4. Strip non-content elements
    /// 5. Text and tables from the first matching content region
    ///
    /// Links are harvested before stripping so navigation menus still lead
    /// the crawl.
    ///
    /// # Example
    ///
    /// ```
    /// use sumi_glean::config::{ExtractConfig, FilterConfig};
    /// use sumi_glean::crawler::PageExtractor;
    /// use sumi_glean::url::SiteScope;
    /// use url::Url;
    ///
    /// let seed = Url::parse("https://example.test/").unwrap();
    /// let scope = SiteScope::new(&seed, &FilterConfig::default());
    /// let extractor = PageExtractor::from_config(&ExtractConfig::default()).unwrap();
    ///
    /// let html = r#"<html><head><title>Home</title></head>
    ///     <body><nav><a href="/about/">About</a></nav><main>Hello  there</main></body></html>"#;
    /// let page = extractor.parse(html, &scope.seed(&seed), &scope).unwrap();
    ///
    /// assert_eq!(page.title, "Home");
    /// assert_eq!(page.content, "Hello there");
    /// assert_eq!(page.links[0].as_str(), "https://example.test/about");
    /// ```
    pub fn parse(&self, html: &str, page_url: &CanonicalUrl, scope: &SiteScope) -> Result<ParsedPage> {
        self.parse_at(html, page_url, page_url.as_url(), scope)
    }

    /// Parses a page whose relative links resolve against `base`
    ///
    /// `base` differs from `page_url` when the fetch was redirected.
    pub fn parse_at(
        &self,
        html: &str,
        page_url: &CanonicalUrl,
        base: &Url,
        scope: &SiteScope,
    ) -> Result<ParsedPage> {
        if html.trim().is_empty() {
            return Err(GleanError::HtmlParse {
                url: page_url.to_string(),
                message: "empty document".to_string(),
            });
        }

        let mut document = Html::parse_document(html);

        let title = self.extract_title(&document);
        let (links, documents) = self.harvest_links(&document, page_url, base, scope);

        self.strip_chrome(&mut document);
        let region = self.content_region(&document);
        let content = normalized_text(region);
        let tables = if self.tables {
            self.extract_tables(region)
        } else {
            Vec::new()
        };

        Ok(ParsedPage {
            title,
            content,
            links,
            documents,
            tables,
        })
    }

    /// Extracts only the content text, for locale variants of a page
    pub fn content_only(&self, html: &str) -> String {
        let mut document = Html::parse_document(html);
        self.strip_chrome(&mut document);
        normalized_text(self.content_region(&document))
    }

    fn extract_title(&self, document: &Html) -> String {
        let raw = document
            .select(&self.title)
            .next()
            .map(|element| element.text().collect::<String>())
            .unwrap_or_default();

        let trimmed = raw.trim();
        let without_suffix = if self.title_suffix.is_empty() {
            trimmed
        } else {
            trimmed
                .strip_suffix(self.title_suffix.as_str())
                .or_else(|| trimmed.strip_suffix(self.title_suffix.trim()))
                .unwrap_or(trimmed)
        };
        without_suffix.trim().to_string()
    }

    /// Collects accepted page links and document references
    fn harvest_links(
        &self,
        document: &Html,
        page_url: &CanonicalUrl,
        base: &Url,
        scope: &SiteScope,
    ) -> (Vec<CanonicalUrl>, Vec<CanonicalUrl>) {
        let mut links = BTreeSet::new();
        let mut documents = BTreeSet::new();

        for element in document.select(&self.anchors) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };

            match canonicalize(scope, base, href) {
                Ok(url) => {
                    let anchor_text = element.text().collect::<String>();
                    if scope.names_document(&anchor_text) {
                        documents.insert(url);
                    } else if &url != page_url {
                        links.insert(url);
                    }
                }
                Err(Rejection::Document(url)) => {
                    documents.insert(url);
                }
                Err(rejection) => {
                    tracing::trace!("Dropped link {} on {}: {:?}", href, page_url, rejection);
                }
            }
        }

        (links.into_iter().collect(), documents.into_iter().collect())
    }

    fn strip_chrome(&self, document: &mut Html) {
        for selector in &self.strip {
            let ids: Vec<_> = document
                .root_element()
                .select(selector)
                .map(|element| element.id())
                .collect();
            for id in ids {
                if let Some(mut node) = document.tree.get_mut(id) {
                    node.detach();
                }
            }
        }
    }

    /// Detached nodes stay in the arena, so the search starts from the root
    fn content_region<'a>(&self, document: &'a Html) -> ElementRef<'a> {
        let root = document.root_element();
        self.content
            .iter()
            .find_map(|selector| root.select(selector).next())
            .unwrap_or(root)
    }

    fn extract_tables(&self, region: ElementRef<'_>) -> Vec<Table> {
        region
            .select(&self.table)
            .filter_map(|table| self.extract_table(table))
            .collect()
    }

    /// Converts one `<table>` into header plus rows
    ///
    /// A first row made only of `th` cells is the header; otherwise numeric
    /// column names are generated. Tables without data cells yield `None`.
    fn extract_table(&self, table: ElementRef<'_>) -> Option<Table> {
        let mut rows: Vec<(bool, Vec<String>)> = table
            .select(&self.row)
            .map(|row| {
                let cells: Vec<ElementRef<'_>> = row.select(&self.cell).collect();
                let all_header =
                    !cells.is_empty() && cells.iter().all(|cell| cell.value().name() == "th");
                let texts: Vec<String> = cells.into_iter().map(normalized_text).collect();
                (all_header, texts)
            })
            .filter(|(_, cells)| !cells.is_empty())
            .collect();

        let has_header = matches!(rows.first(), Some((true, _)));
        let header = if has_header {
            Some(rows.remove(0).1)
        } else {
            None
        };

        let data: Vec<Vec<String>> = rows.into_iter().map(|(_, cells)| cells).collect();
        if data
            .iter()
            .all(|row| row.iter().all(|cell| cell.is_empty()))
        {
            return None;
        }

        let width = data
            .iter()
            .map(Vec::len)
            .chain(header.iter().map(Vec::len))
            .max()
            .unwrap_or(0);

        let mut header = header.unwrap_or_default();
        for index in header.len()..width {
            header.push(index.to_string());
        }

        let rows = data
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();

        Some(Table { header, rows })
    }
}

/// Visible text with every whitespace run collapsed to one space
fn normalized_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
