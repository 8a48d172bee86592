//! # Core Module
//!
//! Stateless building blocks of the trajectory decoder.
//!
//! - **Data Models** ([`models`]) - Frame index entries, decoded frames and trajectory metadata
//! - **Binary Codecs** ([`io`]) - Byte/bit level decoding of the TRR and XTC frame formats
//!
//! Nothing in this module touches the file system; codecs operate on byte slices holding exactly
//! one frame (or the leading bytes of one frame while indexing).

pub mod io;
pub mod models;
