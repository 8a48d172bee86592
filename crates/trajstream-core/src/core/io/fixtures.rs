//! Builders for TRR and XTC frames used by the test suites.

use super::bitstream::size_of_ints;
use super::bitstream::tests::BitWriter;
use super::trr::TRR_MAGIC;
use super::xtc::{MAGIC_INTS, MAX_UNCOMPRESSED_ATOMS, XTC_MAGIC};

const VERSION: &[u8] = b"GMX_trn_file";
const SMALL_IDX: usize = 9;

#[derive(Debug, Clone)]
pub(crate) struct TrrFixture {
    pub step: i32,
    pub time: f64,
    pub box_nm: Option<[f64; 9]>,
    pub coords_nm: Vec<[f64; 3]>,
    pub velocities: bool,
    pub double: bool,
}

impl TrrFixture {
    pub fn to_bytes(&self) -> Vec<u8> {
        let width = if self.double { 8 } else { 4 };
        let natoms = self.coords_nm.len() as i32;
        let block = natoms * 3 * width;
        let box_size = if self.box_nm.is_some() { 9 * width } else { 0 };
        let v_size = if self.velocities { block } else { 0 };

        let mut out = Vec::new();
        let int = |out: &mut Vec<u8>, v: i32| out.extend_from_slice(&v.to_be_bytes());
        let real = |out: &mut Vec<u8>, v: f64| {
            if width == 8 {
                out.extend_from_slice(&v.to_be_bytes());
            } else {
                out.extend_from_slice(&(v as f32).to_be_bytes());
            }
        };

        int(&mut out, TRR_MAGIC);
        int(&mut out, VERSION.len() as i32 + 1);
        int(&mut out, VERSION.len() as i32);
        out.extend_from_slice(VERSION);
        for size in [0, 0, box_size, 0, 0, 0, 0, block, v_size, 0, natoms, self.step, 0] {
            int(&mut out, size);
        }
        real(&mut out, self.time);
        real(&mut out, 0.0);
        if let Some(cell) = self.box_nm {
            for v in cell {
                real(&mut out, v);
            }
        }
        for c in &self.coords_nm {
            c.iter().for_each(|&v| real(&mut out, v));
        }
        if self.velocities {
            for c in &self.coords_nm {
                c.iter().for_each(|&v| real(&mut out, -v));
            }
        }
        out
    }
}

#[derive(Debug, Clone)]
pub(crate) struct XtcFixture {
    pub step: i32,
    pub time: f32,
    pub box_nm: [f32; 9],
    pub coords_nm: Vec<[f32; 3]>,
    pub precision: f32,
}

fn xtc_header(fx: &XtcFixture) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&XTC_MAGIC.to_be_bytes());
    out.extend_from_slice(&(fx.coords_nm.len() as i32).to_be_bytes());
    out.extend_from_slice(&fx.step.to_be_bytes());
    out.extend_from_slice(&fx.time.to_be_bytes());
    for v in fx.box_nm {
        out.extend_from_slice(&v.to_be_bytes());
    }
    out
}

/// Uncompressed layout used for systems of up to nine atoms.
pub(crate) fn plain_frame(fx: &XtcFixture) -> Vec<u8> {
    assert!(fx.coords_nm.len() as u32 <= MAX_UNCOMPRESSED_ATOMS);
    let mut out = xtc_header(fx);
    out.extend_from_slice(&(fx.coords_nm.len() as i32).to_be_bytes());
    for c in &fx.coords_nm {
        for v in c {
            out.extend_from_slice(&v.to_be_bytes());
        }
    }
    out
}

/// Compressed layout. Neighbouring atoms that sit within the smallest tier are written as a
/// big point followed by a one-point small-delta run; the second atom of the pair is the big
/// point, as in files written by GROMACS.
pub(crate) fn compressed_frame(fx: &XtcFixture) -> Vec<u8> {
    assert!(fx.coords_nm.len() as u32 > MAX_UNCOMPRESSED_ATOMS);
    let ints: Vec<[i32; 3]> = fx
        .coords_nm
        .iter()
        .map(|c| (*c).map(|v| (v * fx.precision).round() as i32))
        .collect();

    let mut min = [i32::MAX; 3];
    let mut max = [i32::MIN; 3];
    for p in &ints {
        for axis in 0..3 {
            min[axis] = min[axis].min(p[axis]);
            max[axis] = max[axis].max(p[axis]);
        }
    }
    let sizes = [0, 1, 2].map(|a| (max[a] - min[a] + 1) as u32);
    let bitsize = size_of_ints(&sizes);
    let small_size = MAGIC_INTS[SMALL_IDX];
    let small_num = (small_size / 2) as i32;

    let within_tier = |a: &[i32; 3], b: &[i32; 3]| {
        (0..3).all(|axis| {
            let d = a[axis] - b[axis] + small_num;
            (0..small_size as i32).contains(&d)
        })
    };

    let mut writer = BitWriter::default();
    let mut current_run = 0u64;
    let mut set_run = |writer: &mut BitWriter, run: u64| {
        if run == current_run {
            writer.put_bits(0, 1);
        } else {
            writer.put_bits(1, 1);
            writer.put_bits(run + 1, 5);
            current_run = run;
        }
    };
    let big = |writer: &mut BitWriter, p: &[i32; 3]| {
        let rel = [0, 1, 2].map(|a| (p[a] - min[a]) as u32);
        writer.put_ints(bitsize, sizes, rel);
    };

    let mut i = 0;
    while i < ints.len() {
        if i + 1 < ints.len() && within_tier(&ints[i], &ints[i + 1]) {
            big(&mut writer, &ints[i + 1]);
            set_run(&mut writer, 3);
            let delta = [0, 1, 2].map(|a| (ints[i][a] - ints[i + 1][a] + small_num) as u32);
            writer.put_ints(SMALL_IDX as u32, [small_size; 3], delta);
            i += 2;
        } else {
            big(&mut writer, &ints[i]);
            set_run(&mut writer, 0);
            i += 1;
        }
    }

    let mut out = xtc_header(fx);
    out.extend_from_slice(&(ints.len() as i32).to_be_bytes());
    out.extend_from_slice(&fx.precision.to_be_bytes());
    for v in min.iter().chain(max.iter()) {
        out.extend_from_slice(&v.to_be_bytes());
    }
    out.extend_from_slice(&(SMALL_IDX as i32).to_be_bytes());
    out.extend_from_slice(&(writer.bytes.len() as i32).to_be_bytes());
    out.extend_from_slice(&writer.bytes);
    while out.len() % 4 != 0 {
        out.push(0);
    }
    out
}

/// Plain or compressed encoding depending on the atom count.
pub(crate) fn xtc_frame(fx: &XtcFixture) -> Vec<u8> {
    if fx.coords_nm.len() as u32 > MAX_UNCOMPRESSED_ATOMS {
        compressed_frame(fx)
    } else {
        plain_frame(fx)
    }
}
