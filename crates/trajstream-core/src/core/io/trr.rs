//! TRR: GROMACS full-precision trajectories.
//!
//! A frame is a header of block sizes followed by optional blocks (box, virial, pressure,
//! coordinates, velocities, forces); a block is present when its declared size is non-zero.
//! Reals are 4 or 8 bytes wide and the width is inferred from the block sizes.

use super::bytes::ByteCursor;
use super::error::DecodeError;
use super::traits::{FrameProbe, TrajectoryFormat};
use crate::core::models::NM_TO_ANGSTROM;
use crate::core::models::frame::FrameData;

pub const TRR_MAGIC: i32 = 1993;
/// Version strings longer than this are treated as corruption.
pub const MAX_VERSION_LEN: usize = 128;
/// Thirteen `i32` fields: ten block sizes, atom count, step and energy-term count.
const SIZES_LEN: usize = 13 * 4;

#[derive(Debug, Clone, PartialEq)]
pub struct TrrHeader {
    pub ir_size: u32,
    pub e_size: u32,
    pub box_size: u32,
    pub vir_size: u32,
    pub pres_size: u32,
    pub top_size: u32,
    pub sym_size: u32,
    pub x_size: u32,
    pub v_size: u32,
    pub f_size: u32,
    pub natoms: u32,
    pub step: i32,
    pub nre: i32,
    /// Width of every real in the frame (4 or 8).
    pub real_width: usize,
    pub time: f64,
    pub lambda: f64,
    /// Bytes from the start of the frame to the first data block.
    pub header_len: usize,
}

impl TrrHeader {
    fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, DecodeError> {
        let magic = cursor.read_i32()?;
        if magic != TRR_MAGIC {
            return Err(DecodeError::BadMagic {
                expected: TRR_MAGIC,
                found: magic,
            });
        }
        cursor.skip(4)?;
        let version_len = cursor.read_i32()?;
        let version_len = usize::try_from(version_len)
            .ok()
            .filter(|&len| len <= MAX_VERSION_LEN)
            .ok_or_else(|| {
                DecodeError::InvalidFrameSize(format!("version string length {}", version_len))
            })?;
        cursor.skip(version_len.div_ceil(4) * 4)?;

        let mut sizes = [0u32; 11];
        for (i, size) in sizes.iter_mut().enumerate() {
            let raw = cursor.read_i32()?;
            *size = u32::try_from(raw).map_err(|_| {
                DecodeError::InvalidFrameSize(format!(
                    "negative size {} in header field {}",
                    raw, i
                ))
            })?;
        }
        let [
            ir_size,
            e_size,
            box_size,
            vir_size,
            pres_size,
            top_size,
            sym_size,
            x_size,
            v_size,
            f_size,
            natoms,
        ] = sizes;
        let step = cursor.read_i32()?;
        let nre = cursor.read_i32()?;

        let real_width = infer_real_width(box_size, [x_size, v_size, f_size], natoms)?;
        check_atom_blocks([x_size, v_size, f_size], natoms, real_width)?;
        let time = cursor.read_real(real_width)?;
        let lambda = cursor.read_real(real_width)?;

        Ok(Self {
            ir_size,
            e_size,
            box_size,
            vir_size,
            pres_size,
            top_size,
            sym_size,
            x_size,
            v_size,
            f_size,
            natoms,
            step,
            nre,
            real_width,
            time,
            lambda,
            header_len: cursor.position(),
        })
    }

    /// Total frame length: header plus every block that is present.
    pub fn frame_size(&self) -> u64 {
        self.header_len as u64
            + [
                self.box_size,
                self.vir_size,
                self.pres_size,
                self.x_size,
                self.v_size,
                self.f_size,
            ]
            .iter()
            .map(|&s| u64::from(s))
            .sum::<u64>()
    }
}

/// The box always holds nine reals; without a box, fall back to the first per-atom block.
fn infer_real_width(
    box_size: u32,
    atom_blocks: [u32; 3],
    natoms: u32,
) -> Result<usize, DecodeError> {
    let (block, count) = if box_size != 0 {
        (box_size, 9u64)
    } else if let Some(&block) = atom_blocks.iter().find(|&&s| s != 0) {
        (block, u64::from(natoms) * 3)
    } else {
        return Ok(4);
    };
    if count == 0 || u64::from(block) % count != 0 {
        return Err(DecodeError::InvalidPrecision(i64::from(block)));
    }
    match u64::from(block) / count {
        4 => Ok(4),
        8 => Ok(8),
        other => Err(DecodeError::InvalidPrecision(other as i64)),
    }
}

/// Every per-atom block that is present must hold exactly three reals per atom, and a frame
/// with atoms must carry at least one such block.
fn check_atom_blocks(atom_blocks: [u32; 3], natoms: u32, width: usize) -> Result<(), DecodeError> {
    let expected = u64::from(natoms) * 3 * width as u64;
    let mut present = atom_blocks.iter().filter(|&&s| s != 0).peekable();
    if natoms != 0 && present.peek().is_none() {
        return Err(DecodeError::InvalidFrameSize(format!(
            "{} atoms declared without coordinate, velocity or force blocks",
            natoms
        )));
    }
    if let Some(&size) = present.find(|&&s| u64::from(s) != expected) {
        return Err(DecodeError::InvalidFrameSize(format!(
            "per-atom block of {} bytes for {} atoms",
            size, natoms
        )));
    }
    Ok(())
}

/// Reads one length in nm and returns it in Å, scaling before narrowing to `f32`.
#[inline]
fn read_length(cursor: &mut ByteCursor<'_>, width: usize) -> Result<f32, DecodeError> {
    Ok((cursor.read_real(width)? * f64::from(NM_TO_ANGSTROM)) as f32)
}

pub struct Trr;

impl TrajectoryFormat for Trr {
    const NAME: &'static str = "TRR";
    const EXTENSION: &'static str = "trr";
    const MAX_HEADER_LEN: usize = 12 + MAX_VERSION_LEN + SIZES_LEN + 16;

    fn probe_frame(header: &[u8]) -> Result<FrameProbe, DecodeError> {
        let head = TrrHeader::read(&mut ByteCursor::new(header))?;
        Ok(FrameProbe {
            size: head.frame_size(),
            time: head.time,
            atom_count: head.natoms,
        })
    }

    fn decode_frame(bytes: &[u8], frame_number: u64) -> Result<FrameData, DecodeError> {
        let mut cursor = ByteCursor::new(bytes);
        let head = TrrHeader::read(&mut cursor)?;
        let width = head.real_width;
        let natoms = head.natoms as usize;

        let mut box_vectors = [0f32; 9];
        if head.box_size != 0 {
            for value in &mut box_vectors {
                *value = read_length(&mut cursor, width)?;
            }
        }
        cursor.skip(head.vir_size as usize)?;
        cursor.skip(head.pres_size as usize)?;

        let frame_size = head.frame_size();
        if frame_size > bytes.len() as u64 {
            return Err(DecodeError::Truncated {
                position: 0,
                needed: usize::try_from(frame_size).unwrap_or(usize::MAX),
                available: bytes.len(),
            });
        }

        let (mut x, mut y, mut z) = (vec![0f32; natoms], vec![0f32; natoms], vec![0f32; natoms]);
        if head.x_size != 0 {
            for i in 0..natoms {
                x[i] = read_length(&mut cursor, width)?;
                y[i] = read_length(&mut cursor, width)?;
                z[i] = read_length(&mut cursor, width)?;
            }
        }

        Ok(FrameData {
            frame_number,
            count: head.natoms,
            x,
            y,
            z,
            box_vectors,
            time: head.time,
        })
    }
}
