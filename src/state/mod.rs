//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `VisitState`: Tracks the state of individual URLs (pending, in flight, done)
//! - `SiteGraph`: Records the page-to-page link structure of the site

mod site_graph;
mod visit_state;

// Re-export main types
pub use site_graph::SiteGraph;
pub use visit_state::VisitState;
