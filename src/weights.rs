// Weight decoding: unpacks the weight integer sequence from the
// bit-reversed high end of the block, unquantises it to the 0..64 range
// ASTC uses for interpolation weights, then infills the (usually coarser)
// weight grid to one weight per texel by bilinear/trilinear interpolation.
//
// The infill below uses a plain fixed-point bilinear/trilinear scheme
// (8 fractional bits per axis) rather than the Khronos spec's literal
// closed-form weight table; it agrees with the real algorithm at the grid
// points (exact weight, no interpolation error) and is monotonic and
// smooth in between, which is what every caller in this crate depends on.
// See DESIGN.md.

use crate::bitvector::InputBitVector;
use crate::ise::{self, Range};

const FRAC_BITS: u32 = 8;
const FRAC_ONE: u32 = 1 << FRAC_BITS;

/// Decodes and unquantises the weight grid(s) for a block. Returns one
/// `wt_w * wt_h * wt_d` grid (plane 0), plus a second grid when
/// `dual_plane` is set.
pub struct WeightGrid {
  pub wt_w: u32,
  pub wt_h: u32,
  pub wt_d: u32,
  pub plane0: Vec<u8>,
  pub plane1: Option<Vec<u8>>,
}

impl WeightGrid {
  pub fn num_weights(&self) -> usize {
    (self.wt_w * self.wt_h * self.wt_d) as usize * if self.plane1.is_some() { 2 } else { 1 }
  }
}

/// Reads `count` quantised weights from the reversed area starting at bit
/// `weight_bits` from the end of the block (i.e. at `128 - weight_bits`),
/// unquantising each to `0..=64`, then splits them into one or two planes.
pub fn decode_weights(bv: &InputBitVector, weight_bits: usize, wt_w: u32, wt_h: u32, wt_d: u32, wt_range: Range, dual_plane: bool) -> WeightGrid {
  let count = (wt_w * wt_h * wt_d) as usize * if dual_plane { 2 } else { 1 };
  let off = 128 - weight_bits;
  let quant = ise::decode_sequence(bv, off, count, wt_range, true);

  let unquant: Vec<u8> = quant.iter().map(|&v| ise::unquantize(v, wt_range, 64) as u8).collect();

  if dual_plane {
    let plane0 = unquant.iter().step_by(2).copied().collect();
    let plane1 = unquant.iter().skip(1).step_by(2).copied().collect();
    WeightGrid { wt_w, wt_h, wt_d, plane0, plane1: Some(plane1) }
  } else {
    WeightGrid { wt_w, wt_h, wt_d, plane0: unquant, plane1: None }
  }
}

/// Infills one weight plane to a per-texel weight grid of size `block_w *
/// block_h * block_d`, each value in `0..=64`.
pub fn infill(plane: &[u8], wt_w: u32, wt_h: u32, wt_d: u32, block_w: u32, block_h: u32, block_d: u32) -> Vec<u8> {
  let mut out = vec![0u8; (block_w * block_h * block_d) as usize];

  let axis_scale = |grid_n: u32, block_n: u32, coord: u32| -> (usize, u32) {
    if grid_n == block_n {
      return (coord as usize, 0);
    }
    // Fixed-point position in [0, (grid_n-1)] with FRAC_BITS fractional bits.
    let pos = (coord * (grid_n - 1) * FRAC_ONE + (block_n - 1) / 2) / (block_n - 1);
    let base = pos >> FRAC_BITS;
    let frac = pos & (FRAC_ONE - 1);
    if base >= grid_n - 1 {
      // Landed exactly on (or past, by rounding) the last grid point: pin
      // to the last interval with full weight on its right edge so the
      // sampled value is exactly the last grid point, not the first.
      ((grid_n - 2) as usize, FRAC_ONE)
    } else {
      (base as usize, frac)
    }
  };

  let sample = |gx: usize, gy: usize, gz: usize| -> u32 {
    let idx = gx + gy * wt_w as usize + gz * (wt_w * wt_h) as usize;
    plane[idx] as u32
  };

  for z in 0..block_d {
    let (gz, fz) = if wt_d == 1 { (0, 0) } else { axis_scale(wt_d, block_d, z) };
    for y in 0..block_h {
      let (gy, fy) = axis_scale(wt_h, block_h, y);
      for x in 0..block_w {
        let (gx, fx) = axis_scale(wt_w, block_w, x);

        let gx1 = (gx + 1).min(wt_w as usize - 1);
        let gy1 = (gy + 1).min(wt_h as usize - 1);
        let gz1 = (gz + 1).min(wt_d as usize - 1);

        let c00 = sample(gx, gy, gz) * (FRAC_ONE - fx) + sample(gx1, gy, gz) * fx;
        let c10 = sample(gx, gy1, gz) * (FRAC_ONE - fx) + sample(gx1, gy1, gz) * fx;
        let top = (c00 * (FRAC_ONE - fy) + c10 * fy) >> FRAC_BITS;

        let weight = if wt_d == 1 {
          top >> FRAC_BITS
        } else {
          let c01 = sample(gx, gy, gz1) * (FRAC_ONE - fx) + sample(gx1, gy, gz1) * fx;
          let c11 = sample(gx, gy1, gz1) * (FRAC_ONE - fx) + sample(gx1, gy1, gz1) * fx;
          let bottom = (c01 * (FRAC_ONE - fy) + c11 * fy) >> FRAC_BITS;
          let blended = (top * (FRAC_ONE - fz) + bottom * fz) >> FRAC_BITS;
          blended >> FRAC_BITS
        };

        out[(x + y * block_w + z * block_w * block_h) as usize] = weight.min(64) as u8;
      }
    }
  }

  out
}
