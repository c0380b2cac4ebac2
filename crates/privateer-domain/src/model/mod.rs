//! Domain Models
//!
//! The vocabulary shared by the issuer, the delegation engine and the
//! storage adapters.

pub mod mapping;
pub mod usersign;
