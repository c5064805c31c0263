//! Alexandria: Open Library dump ingestion pipeline
//!
//! This crate loads the Open Library author and work data dumps into a local
//! document store, in two strictly sequential passes:
//!
//! 1. **Author Pass** -- Stream the author dump line by line, parse each
//!    record, and upsert it keyed by its Open Library id
//! 2. **Work Pass** -- Stream the works dump, parse each record, resolve its
//!    author references against the store filled by the first pass, and
//!    upsert the book with a snapshot of the resolved display names
//!
//! Dump lines carry tab-separated key columns in front of the JSON payload;
//! the extractors locate the payload and parse it tolerantly. A malformed
//! line is logged and skipped, never fatal: the standing policy is
//! catch-log-continue at the line boundary, with per-pass counters reported
//! back to the caller.
//!
//! # Key Modules
//!
//! - [`source`] -- Buffered line reader over a dump file
//! - [`extract`] -- Tolerant per-line record extraction
//! - [`store`] -- Lookup/sink contracts plus JSON-file and in-memory stores
//! - [`loader`] -- Two-pass orchestrator with phase tracking
//! - [`stats`] -- Per-pass counters (seen / parsed / skipped / persisted)
//! - [`models`] -- Core record types (Author, Book)
//! - [`config`] -- Constants for prefixes, limits, and formats
//!
//! # Example Usage
//!
//! ```bash
//! # Load both dumps, authors before works
//! alexandria load --authors ol_dump_authors.txt --works ol_dump_works.txt -d store/
//!
//! # Load a single dump
//! alexandria authors -i ol_dump_authors.txt -d store/
//! alexandria works -i ol_dump_works.txt -d store/
//! ```

pub mod config;
pub mod extract;
pub mod loader;
pub mod models;
pub mod source;
pub mod stats;
pub mod store;
