//! Binary codecs for GROMACS trajectory formats.
//!
//! Each format implements [`traits::TrajectoryFormat`], which splits the work into a cheap
//! header probe used while indexing and a full frame decode used on demand. Both formats are
//! XDR encoded, so all multi-byte fields are big-endian.

pub mod bitstream;
pub(crate) mod bytes;
pub mod error;
pub mod traits;
pub mod trr;
pub mod xtc;

#[cfg(test)]
pub(crate) mod fixtures;
