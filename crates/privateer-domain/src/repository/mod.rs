//! Repository Traits - The "Ports" of Hexagonal Architecture
//!
//! ```text
//! Domain Layer             │  Adapter Layer
//! ─────────────────────────┼──────────────────────────────
//! trait MappingRegistry    │  InMemoryMappingRegistry
//!   fn create()            │  JsonFileMappingRegistry
//!   fn get()               │
//! trait UserDirectory      │  InMemoryUserDirectory
//! ```
//!
//! Ports take `&self`: the gateway shares one instance across concurrent
//! requests, so adapters carry their own interior locking.

pub mod mapping_registry;
pub mod user_directory;
