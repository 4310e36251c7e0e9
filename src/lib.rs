//! Keyword search over a job portal, driven through headless Chrome.
//!
//! One session reads the results page; each listing's detail page is then
//! fetched on its own session by a bounded worker pool. The merged table can be
//! exported or summarised through the HTTP API.

pub mod analysis;
pub mod api;
pub mod browser;
pub mod collector;
pub mod config;
pub mod details;
pub mod error;
pub mod export;
pub mod model;
pub mod table;
pub mod worker;

#[cfg(test)]
mod testing;
