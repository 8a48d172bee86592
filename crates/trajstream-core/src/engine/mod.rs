//! # Engine Module
//!
//! Stateful machinery that turns the stateless frame codecs into random access over a file on
//! disk.
//!
//! ## Overview
//!
//! A reader opens its file once, walks it with the indexer to record where every frame lives,
//! and then serves individual frames by reading exactly one frame's bytes, decoding them and
//! keeping the result in a bounded cache.
//!
//! ## Architecture
//!
//! - **Indexing** ([`indexer`]) - Header-only scan producing the frame table and its scan status
//! - **Reading** ([`reader`]) - The `TrajectoryReader` capability and the per-format `StreamingReader`
//! - **Caching** ([`cache`]) - Least-recently-used frame cache
//! - **Configuration** ([`config`]) - Cache capacity and the policy for truncated files
//! - **Progress Monitoring** ([`progress`]) - Callback-based reporting of scan progress
//! - **Error Handling** ([`error`]) - Reader-level error taxonomy
//!
//! ## Key Capabilities
//!
//! - **Bounded memory** regardless of trajectory length
//! - **Observable truncation** so a corrupt file is never mistaken for a short one
//! - **Decode instrumentation** through per-reader hit, miss and decode counters

pub mod cache;
pub mod config;
pub mod error;
pub mod indexer;
pub mod progress;
pub mod reader;
