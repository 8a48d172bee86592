//! XTC: GROMACS lossy-compressed coordinate trajectories.
//!
//! Every frame starts with a fixed 52-byte big-endian header (magic, atom count, step, time and
//! the 3×3 box). Systems of up to nine atoms store plain floats; larger systems store a
//! compression preamble followed by a bit-packed integer payload that is decoded by
//! `decompress_coordinates`.

use super::bitstream::{BitCursor, size_of_int, size_of_ints};
use super::bytes::ByteCursor;
use super::error::DecodeError;
use super::traits::{FrameProbe, TrajectoryFormat};
use crate::core::models::NM_TO_ANGSTROM;
use crate::core::models::frame::FrameData;

pub const XTC_MAGIC: i32 = 1995;
pub const HEADER_LEN: usize = 52;
/// lsize, precision, six min/max ints, smallidx and byte count.
pub const PREAMBLE_LEN: usize = 40;
/// Frames with at most this many atoms are stored uncompressed.
pub const MAX_UNCOMPRESSED_ATOMS: u32 = 9;

/// First usable tier of [`MAGIC_INTS`]; smaller indices map to zero-sized ranges.
const FIRST_IDX: usize = 9;

/// Joint encoding is only used when every axis range fits in 24 bits.
const MAX_JOINT_RANGE: u32 = 0xff_ffff;

/// Quantisation tiers for small-delta runs, roughly 2^(i/3).
#[rustfmt::skip]
pub const MAGIC_INTS: [u32; 73] = [
    0, 0, 0, 0, 0, 0, 0, 0, 0, 8, 10, 12, 16, 20, 25, 32, 40, 50, 64,
    80, 101, 128, 161, 203, 256, 322, 406, 512, 645, 812, 1024, 1290,
    1625, 2048, 2580, 3250, 4096, 5060, 6501, 8192, 10321, 13003,
    16384, 20642, 26007, 32768, 41285, 52015, 65536, 82570, 104031,
    131072, 165140, 208063, 262144, 330280, 416127, 524287, 660561,
    832255, 1048576, 1321122, 1664510, 2097152, 2642245, 3329021,
    4194304, 5284491, 6658042, 8388607, 10568983, 13316085, 16777216,
];

#[derive(Debug, Clone, PartialEq)]
pub struct XtcHeader {
    pub natoms: u32,
    pub step: i32,
    pub time: f32,
    /// Box in file units (nm).
    pub box_nm: [f32; 9],
}

impl XtcHeader {
    fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, DecodeError> {
        let magic = cursor.read_i32()?;
        if magic != XTC_MAGIC {
            return Err(DecodeError::BadMagic {
                expected: XTC_MAGIC,
                found: magic,
            });
        }
        let natoms = cursor.read_i32()?;
        let natoms = u32::try_from(natoms)
            .map_err(|_| DecodeError::InvalidFrameSize(format!("negative atom count {}", natoms)))?;
        let step = cursor.read_i32()?;
        let time = cursor.read_f32()?;
        let mut box_nm = [0f32; 9];
        for value in &mut box_nm {
            *value = cursor.read_f32()?;
        }
        Ok(Self {
            natoms,
            step,
            time,
            box_nm,
        })
    }

    pub fn is_compressed(&self) -> bool {
        self.natoms > MAX_UNCOMPRESSED_ATOMS
    }
}

/// Decoded coordinates in file units (nm), structure-of-arrays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Coordinates {
    pub x: Vec<f32>,
    pub y: Vec<f32>,
    pub z: Vec<f32>,
}

impl Coordinates {
    fn with_capacity(n: usize) -> Self {
        Self {
            x: Vec::with_capacity(n),
            y: Vec::with_capacity(n),
            z: Vec::with_capacity(n),
        }
    }

    #[inline]
    fn len(&self) -> usize {
        self.x.len()
    }

    #[inline]
    fn push_scaled(&mut self, coord: [i32; 3], inv_precision: f32) {
        self.x.push(coord[0] as f32 * inv_precision);
        self.y.push(coord[1] as f32 * inv_precision);
        self.z.push(coord[2] as f32 * inv_precision);
    }
}

pub struct Xtc;

impl TrajectoryFormat for Xtc {
    const NAME: &'static str = "XTC";
    const EXTENSION: &'static str = "xtc";
    const MAX_HEADER_LEN: usize = HEADER_LEN + PREAMBLE_LEN;

    fn probe_frame(header: &[u8]) -> Result<FrameProbe, DecodeError> {
        let mut cursor = ByteCursor::new(header);
        let head = XtcHeader::read(&mut cursor)?;

        let size = if head.is_compressed() {
            cursor.skip(PREAMBLE_LEN - 4)?;
            let byte_count = cursor.read_i32()?;
            let byte_count = u64::try_from(byte_count).map_err(|_| {
                DecodeError::InvalidFrameSize(format!("negative payload length {}", byte_count))
            })?;
            (HEADER_LEN + PREAMBLE_LEN) as u64 + padded_len(byte_count)
        } else {
            (HEADER_LEN + 4) as u64 + u64::from(head.natoms) * 12
        };

        Ok(FrameProbe {
            size,
            time: f64::from(head.time),
            atom_count: head.natoms,
        })
    }

    fn decode_frame(bytes: &[u8], frame_number: u64) -> Result<FrameData, DecodeError> {
        let mut cursor = ByteCursor::new(bytes);
        let head = XtcHeader::read(&mut cursor)?;

        let coords = if head.is_compressed() {
            decompress_coordinates(&mut cursor, head.natoms)?
        } else {
            read_plain_coordinates(&mut cursor, head.natoms)?
        };

        let scale = |v: Vec<f32>| v.into_iter().map(|c| c * NM_TO_ANGSTROM).collect();
        Ok(FrameData {
            frame_number,
            count: head.natoms,
            x: scale(coords.x),
            y: scale(coords.y),
            z: scale(coords.z),
            box_vectors: head.box_nm.map(|v| v * NM_TO_ANGSTROM),
            time: f64::from(head.time),
        })
    }
}

#[inline]
fn padded_len(len: u64) -> u64 {
    len.div_ceil(4) * 4
}

fn read_plain_coordinates(
    cursor: &mut ByteCursor<'_>,
    natoms: u32,
) -> Result<Coordinates, DecodeError> {
    cursor.skip(4)?;
    let mut coords = Coordinates::with_capacity(natoms as usize);
    for _ in 0..natoms {
        coords.x.push(cursor.read_f32()?);
        coords.y.push(cursor.read_f32()?);
        coords.z.push(cursor.read_f32()?);
    }
    Ok(coords)
}

fn magic_int(idx: i32) -> Result<u32, DecodeError> {
    usize::try_from(idx)
        .ok()
        .and_then(|i| MAGIC_INTS.get(i).copied())
        .ok_or_else(|| DecodeError::CorruptPayload(format!("small index {} out of range", idx)))
}

/// Decodes the compressed coordinate block that follows the 52-byte header.
///
/// Returns coordinates in nm. Any inconsistency in the stream is a hard error; partially decoded
/// coordinates are never returned.
pub(crate) fn decompress_coordinates(
    cursor: &mut ByteCursor<'_>,
    natoms: u32,
) -> Result<Coordinates, DecodeError> {
    let lsize = cursor.read_i32()?;
    if u32::try_from(lsize).ok() != Some(natoms) {
        return Err(DecodeError::AtomCountMismatch {
            header: natoms,
            compressed: lsize,
        });
    }

    let precision = cursor.read_f32()?;
    if !(precision.is_finite() && precision > 0.0) {
        return Err(DecodeError::CorruptPayload(format!(
            "invalid quantisation precision {}",
            precision
        )));
    }

    let mut min_int = [0i32; 3];
    let mut max_int = [0i32; 3];
    for value in min_int.iter_mut().chain(max_int.iter_mut()) {
        *value = cursor.read_i32()?;
    }

    let mut size_int = [0u32; 3];
    for axis in 0..3 {
        let range = i64::from(max_int[axis]) - i64::from(min_int[axis]) + 1;
        size_int[axis] = u32::try_from(range)
            .ok()
            .filter(|&r| r > 0)
            .ok_or_else(|| {
                DecodeError::CorruptPayload(format!(
                    "invalid bounds [{}, {}] on axis {}",
                    min_int[axis], max_int[axis], axis
                ))
            })?;
    }

    let mut bitsize_int = [0u32; 3];
    let bitsize = if (size_int[0] | size_int[1] | size_int[2]) > MAX_JOINT_RANGE {
        for axis in 0..3 {
            bitsize_int[axis] = size_of_int(size_int[axis]);
        }
        0
    } else {
        size_of_ints(&size_int)
    };

    let mut small_idx = cursor.read_i32()?;
    if !(FIRST_IDX as i32..MAGIC_INTS.len() as i32).contains(&small_idx) {
        return Err(DecodeError::CorruptPayload(format!(
            "initial small index {} out of range",
            small_idx
        )));
    }
    let mut smaller = (magic_int((small_idx - 1).max(FIRST_IDX as i32))? / 2) as i32;
    let mut small_num = (magic_int(small_idx)? / 2) as i32;
    let mut size_small = [magic_int(small_idx)?; 3];

    let byte_count = cursor.read_i32()?;
    let byte_count = usize::try_from(byte_count).map_err(|_| {
        DecodeError::InvalidFrameSize(format!("negative payload length {}", byte_count))
    })?;
    let payload = cursor.take(byte_count)?;

    let natoms = natoms as usize;
    let inv_precision = 1.0f32 / precision;
    let mut bits = BitCursor::new(payload);
    // Every decoded atom consumes at least one payload bit.
    let mut out = Coordinates::with_capacity(natoms.min(payload.len().saturating_mul(8)));
    let push = |out: &mut Coordinates, coord: [i32; 3]| {
        if out.len() >= natoms {
            return Err(DecodeError::CorruptPayload(format!(
                "run overflows the declared {} atoms",
                natoms
            )));
        }
        out.push_scaled(coord, inv_precision);
        Ok(())
    };

    let mut run = 0u32;
    let mut decoded = 0usize;
    while decoded < natoms {
        let mut this_coord = if bitsize == 0 {
            [
                bits.decode_bits(bitsize_int[0])? as i32,
                bits.decode_bits(bitsize_int[1])? as i32,
                bits.decode_bits(bitsize_int[2])? as i32,
            ]
        } else {
            bits.decode_ints(bitsize, size_int)?
        };
        decoded += 1;
        for axis in 0..3 {
            this_coord[axis] = this_coord[axis].wrapping_add(min_int[axis]);
        }
        let mut prev_coord = this_coord;

        // `run` carries over to the next point when the flag bit is clear.
        let mut is_smaller = 0i32;
        if bits.decode_bits(1)? == 1 {
            run = bits.decode_bits(5)?;
            is_smaller = (run % 3) as i32 - 1;
            run -= run % 3;
        }

        if run > 0 {
            for k in (0..run).step_by(3) {
                let delta = bits.decode_ints(small_idx as u32, size_small)?;
                decoded += 1;
                for axis in 0..3 {
                    this_coord[axis] = delta[axis]
                        .wrapping_add(prev_coord[axis])
                        .wrapping_sub(small_num);
                }
                if k == 0 {
                    // The first small point precedes the big one in atom order.
                    std::mem::swap(&mut this_coord, &mut prev_coord);
                    push(&mut out, prev_coord)?;
                } else {
                    prev_coord = this_coord;
                }
                push(&mut out, this_coord)?;
            }
        } else {
            push(&mut out, this_coord)?;
        }

        small_idx += is_smaller;
        if is_smaller < 0 {
            small_num = smaller;
            smaller = if small_idx > FIRST_IDX as i32 {
                (magic_int(small_idx - 1)? / 2) as i32
            } else {
                0
            };
        } else if is_smaller > 0 {
            smaller = small_num;
            small_num = (magic_int(small_idx)? / 2) as i32;
        }
        size_small = [magic_int(small_idx)?; 3];
        if size_small.contains(&0) {
            return Err(DecodeError::CorruptPayload(format!(
                "small index {} selects an empty range",
                small_idx
            )));
        }
    }

    if out.len() != natoms {
        return Err(DecodeError::CorruptPayload(format!(
            "decoded {} of {} atoms",
            out.len(),
            natoms
        )));
    }
    Ok(out)
}
