use nalgebra::{Matrix3, Point3};
use serde::Serialize;

/// Location and summary of one frame inside a trajectory file.
///
/// Entries are produced once by the indexer and never change afterwards. Consecutive entries are
/// contiguous: `next.offset == self.offset + self.size`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameIndexEntry {
    pub frame_number: u64,
    pub offset: u64,
    pub size: u32,
    pub time: f64,
    pub atom_count: u32,
}

impl FrameIndexEntry {
    #[inline]
    pub fn end(&self) -> u64 {
        self.offset + u64::from(self.size)
    }
}

/// One decoded frame in structure-of-arrays layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameData {
    pub frame_number: u64,
    pub count: u32,
    pub x: Vec<f32>,
    pub y: Vec<f32>,
    pub z: Vec<f32>,
    /// Row-major 3×3 simulation cell (`xx, xy, xz, yx, yy, yz, zx, zy, zz`).
    #[serde(rename = "box")]
    pub box_vectors: [f32; 9],
    pub time: f64,
}

impl FrameData {
    pub fn positions(&self) -> impl Iterator<Item = Point3<f32>> + '_ {
        self.x
            .iter()
            .zip(&self.y)
            .zip(&self.z)
            .map(|((&x, &y), &z)| Point3::new(x, y, z))
    }

    pub fn box_matrix(&self) -> Matrix3<f32> {
        Matrix3::from_row_slice(&self.box_vectors)
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}
