//! News source scrapers.
//!
//! Each scraper follows the same two-phase pattern:
//!
//! 1. **Indexing**: discover article links on the source's listing page
//! 2. **Fetching**: download one article and extract its body text
//!
//! | Source | Module | Method |
//! |--------|--------|--------|
//! | Naver News IT/science | [`naver`] | HTML scraping with fixed CSS selectors |
//!
//! Scrapers take any [`crate::fetch::PageSource`], so tests can feed them
//! canned pages.

pub mod naver;
