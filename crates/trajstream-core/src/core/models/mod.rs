//! Data models shared by every layer of the decoder.
//!
//! All lengths are in Ångström. Trajectory files store nanometres, and every codec applies
//! [`NM_TO_ANGSTROM`] before a value leaves the `io` module.

pub mod frame;
pub mod info;

/// Conversion factor from file length units (nm) to output length units (Å).
pub const NM_TO_ANGSTROM: f32 = 10.0;
