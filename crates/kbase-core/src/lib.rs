//! Core types, store trait and catalog services for the kbase knowledge base.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! catalog components ([`HierarchyStore`], [`CountAggregator`],
//! [`PublicationFilter`], [`SearchEngine`]) are generic over any
//! [`CatalogStore`] handed to them at construction time; [`MemoryStore`] is
//! the in-process implementation used by tests.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod admin;
pub mod article;
pub mod cascade;
pub mod catalog;
pub mod category;
pub mod counts;
pub mod error;
pub mod hierarchy;
pub mod memory;
pub mod patch;
pub mod public;
pub mod search;
pub mod slug;
pub mod store;
pub mod subcategory;
pub mod validate;

pub use catalog::Catalog;
pub use counts::CountAggregator;
pub use error::{Entity, Error, Result};
pub use hierarchy::HierarchyStore;
pub use memory::MemoryStore;
pub use public::{PublicationFilter, ViewCounter};
pub use search::SearchEngine;
pub use store::CatalogStore;
