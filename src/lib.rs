//! Per-user movie catalog with a lossless single-line text codec.
//!
//! # Examples
//!
//! In-memory usage with [`core::catalog::Catalog`]:
//! ```
//! use moviecat::{core::catalog::Catalog, movie::MovieDraft, types::MovieField};
//!
//! let mut catalog = Catalog::new();
//! catalog.add_movie("alice", MovieDraft {
//!     title: "Alien".to_string(),
//!     year: 1979,
//!     director: "Ridley Scott".to_string(),
//!     genre: "Horror".to_string(),
//!     cast: vec!["Sigourney Weaver".to_string()],
//!     plot_summary: "A crew, a signal, a stowaway.".to_string(),
//! });
//! catalog.rate_movie("alice", "Alien", 5).expect("rate");
//!
//! let horror: Vec<_> = catalog.filter_movies("alice", MovieField::Genre, "Horror").collect();
//! assert_eq!(horror.len(), 1);
//! assert_eq!(catalog.recommend_movies("alice")[0].title, "Alien");
//! ```
//!
//! File-backed usage:
//! ```no_run
//! use moviecat::{config::CatalogConfig, core::catalog::Catalog};
//!
//! let mut catalog = Catalog::open(CatalogConfig::with_store_path("movies.json")).expect("open");
//! let report = catalog.import_movies("friends.txt", "bob").expect("import");
//! println!("{} imported, {} skipped", report.accepted, report.skipped_count());
//! catalog.shutdown().expect("save");
//! ```
#![deny(missing_docs)]

/// Record line encoding and decoding.
pub mod codec;
/// Catalog construction settings.
pub mod config;
/// Core in-memory catalog and recommendation helpers.
pub mod core;
/// Movie records and drafts.
pub mod movie;
/// Persistence abstraction and flat-file implementation.
pub mod persist;
/// Shared primitive types and enums.
pub mod types;
