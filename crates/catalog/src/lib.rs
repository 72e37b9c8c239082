//! Term and rule catalogs for Anxiousroid.
//!
//! A catalog is a static JSON array of entries, each carrying an
//! `index_regex`. Searching a catalog returns every entry whose pattern
//! matches anywhere in the query, in catalog order. There is no ranking and
//! no deduplication: this is presence filtering.
//!
//! Catalogs are loaded lazily on first use and are immutable afterwards.
//! Construct one [`TermIndex`] and one [`RuleIndex`] per process and share
//! them by `Arc`.

pub mod index;
pub mod source;

pub use index::{Catalog, CatalogEntry, RuleIndex, TermIndex};
pub use source::CatalogSource;
