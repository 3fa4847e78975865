//! Configuration module for Sumi-Glean
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key has a default, so a file only needs to name what it changes.
//!
//! # Example
//!
//! ```no_run
//! use sumi_glean::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("glean.toml")).unwrap();
//! println!("Crawl starts at: {}", config.crawler.seed_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, ExtractConfig, FilterConfig, HttpConfig, OutputConfig};

// Re-export parser and validation functions
pub use parser::{compute_config_hash, hash_content, load_config, parse_config, parse_config_str};
pub use validation::{compile_selector, validate};
