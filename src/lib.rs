//! # Docket
//!
//! A live catalog client and fuzzy retrieval engine for a classified
//! document store.
//!
//! Docket authenticates against the store's API, ingests the authoritative
//! document list (an initial bulk fetch plus full-snapshot updates streamed
//! over a persistent WebSocket), reconciles it into a single in-memory
//! catalog, and serves ranked, category-scoped, free-text queries against
//! that catalog. State is memory resident for the session's lifetime; there
//! is no durable storage.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐
//! │  Bulk fetch  │    │  Live sync    │
//! │  (HTTP GET)  │    │  (WebSocket)  │
//! └──────┬───────┘    └──────┬───────┘
//!        │    replace(snapshot)│
//!        ▼                    ▼
//!       ┌──────────────────────┐
//!       │     CatalogStore     │
//!       └─────┬──────────┬─────┘
//!             ▼          ▼
//!     ┌────────────┐ ┌────────────┐
//!     │  Category  │ │   Query    │
//!     │   Index    │ │   Engine   │
//!     └────────────┘ └────────────┘
//! ```
//!
//! Every update replaces the snapshot wholesale. The engines are pure
//! readers; user actions re-run them against the current snapshot and never
//! mutate it.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`client`] | Authentication and bulk-fetch HTTP client |
//! | [`store`] | In-memory catalog snapshot |
//! | [`sync`] | Live WebSocket update channel |
//! | [`index`] | Category bucket derivation |
//! | [`search`] | Fuzzy query engine |

pub mod client;
pub mod config;
pub mod index;
pub mod models;
pub mod search;
pub mod store;
pub mod sync;
