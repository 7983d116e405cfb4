//! # Repositories
//!
//! One repository per table. Each holds a clone of the pool and is handed
//! out by [`Database`](crate::Database).
//!
//! - [`product`] - Product lifecycle, queries and rating aggregation

pub mod product;
