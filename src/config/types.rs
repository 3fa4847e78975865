use serde::Deserialize;

/// Main configuration structure for Sumi-Glean
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub http: HttpConfig,
    pub filter: FilterConfig,
    pub extract: ExtractConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// URL the crawl starts from; its origin scopes the whole crawl
    pub seed_url: String,

    /// Maximum number of pages ever claimed for fetching
    pub max_pages: u32,

    /// Number of concurrent workers
    pub concurrency: u32,

    /// Fixed part of the delay applied before every request (milliseconds)
    pub polite_delay_ms: u64,

    /// Upper bound of the random extra delay added on top (milliseconds)
    pub polite_jitter_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            seed_url: String::new(),
            max_pages: 500,
            concurrency: 8,
            polite_delay_ms: 50,
            polite_jitter_ms: 50,
        }
    }
}

/// HTTP request configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HttpConfig {
    pub user_agent: String,
    pub accept_language: String,

    /// Whole-request timeout (seconds)
    pub timeout_secs: u64,

    /// Connection establishment timeout (seconds)
    pub connect_timeout_secs: u64,

    /// Retries after the first attempt for transient failures
    pub max_retries: u32,

    /// Base delay of the exponential backoff (milliseconds)
    pub retry_backoff_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("Mozilla/5.0 (compatible; sumi-glean/{})", env!("CARGO_PKG_VERSION")),
            accept_language: "en-US,en;q=0.9".to_string(),
            timeout_secs: 10,
            connect_timeout_secs: 5,
            max_retries: 2,
            retry_backoff_ms: 500,
        }
    }
}

/// Link filtering rules applied by the canonicalizer
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FilterConfig {
    /// Path segments that exclude a link; a trailing `*` matches by prefix
    pub denied_segments: Vec<String>,

    /// Combined suffixes never traversed (e.g. ".tar.gz")
    pub forbidden_extensions: Vec<String>,

    /// Combined suffixes routed to the document pipeline
    pub document_extensions: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            denied_segments: to_strings(&["download*", "admin", "auth", "login", "internal"]),
            forbidden_extensions: to_strings(&[
                ".zip", ".tar", ".gz", ".rar", ".7z", ".xml", ".exe", ".msi", ".tar.gz", ".tgz",
                ".html",
            ]),
            document_extensions: to_strings(&[".pdf"]),
        }
    }
}

/// Content extraction configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ExtractConfig {
    /// Site-name suffix removed from page titles
    pub title_suffix: String,

    /// Elements removed before text and table extraction
    pub strip_selectors: Vec<String>,

    /// Content region candidates, highest priority first
    pub content_selectors: Vec<String>,

    /// Locale of the secondary-language variant (e.g. "hi"); disabled when unset
    pub secondary_language: Option<String>,

    /// Query parameter carrying the locale
    pub locale_param: String,

    /// Whether tables are extracted
    pub tables: bool,

    /// Whether linked documents are downloaded and extracted
    pub documents: bool,

    /// Maximum concurrent document downloads
    pub document_concurrency: u32,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            title_suffix: String::new(),
            strip_selectors: to_strings(&[
                "script",
                "style",
                "noscript",
                "header",
                "nav",
                "footer",
                "aside",
                "form",
                "a.language.link",
            ]),
            content_selectors: to_strings(&[
                "div#content",
                "div.content.clearfix",
                "section",
                "div.container",
                "main",
                "body",
            ]),
            secondary_language: None,
            locale_param: "lang".to_string(),
            tables: true,
            documents: true,
            document_concurrency: 4,
        }
    }
}

/// Output configuration
///
/// Relative file and directory names are resolved against `directory`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    pub directory: String,
    pub results_file: String,
    pub text_dir: String,
    pub tables_dir: String,
    pub documents_dir: String,
    pub graph_file: String,

    /// Byte ceiling of one consolidated text or table file
    pub chunk_bytes: u64,

    /// Markdown crawl summary; not written when unset
    pub summary_path: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: "./crawl-output".to_string(),
            results_file: "output.json".to_string(),
            text_dir: "text".to_string(),
            tables_dir: "csv".to_string(),
            documents_dir: "pdfs".to_string(),
            graph_file: "site_structure.csv".to_string(),
            chunk_bytes: 1024 * 1024,
            summary_path: None,
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
