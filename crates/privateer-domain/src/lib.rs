//! # Privateer Domain Layer
//!
//! Capability mappings and the identities they delegate to.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Domain Layer (This Crate)                     │
//! │  ┌─────────────────────────────────────────────────────────────┐│
//! │  │  model/     - MappingRecord, Token, Usersign                ││
//! │  │  repository/- MappingRegistry, UserDirectory (ports)        ││
//! │  └─────────────────────────────────────────────────────────────┘│
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A mapping binds an unguessable token to a target URI and to the user
//! the request will be re-issued as. Nothing here knows about HTTP; the
//! gateway crate owns the request rewriting.

pub mod model;
pub mod repository;

pub use model::{
    mapping::{MappingRecord, Token, MAPPING_COLLECTION},
    usersign::{Usersign, GUEST_NAME},
};

pub use repository::{
    mapping_registry::{MappingRegistry, RepositoryError},
    user_directory::UserDirectory,
};
