//! # Bags
//!
//! A small policy-gated resource layer for the gateway to delegate into.
//! Bags hold tiddlers; each bag's policy decides who may read it.

pub mod error;
pub mod filter;
pub mod model;
pub mod representation;
pub mod routes;
pub mod store;

pub use error::BagError;
pub use model::{Bag, Policy, PolicyOp, Tiddler};
pub use routes::routes;
pub use store::BagStore;
