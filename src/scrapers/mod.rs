//! News source scrapers.
//!
//! Scrapers follow a two-phase pattern:
//!
//! 1. **Indexing**: discover article URLs on the source's listing page
//! 2. **Fetching**: download each article and extract its fields
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | G1 PEGN | [`pegn`] | Regex link discovery + readability extraction | Sequential, 1s between articles |
//!
//! Failed article fetches are logged and skipped; a failed listing page
//! yields an empty collection.

pub mod pegn;
