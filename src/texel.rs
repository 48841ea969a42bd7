// Per-texel synthesis: for every texel in the block, pick its partition's
// endpoint pair, pick its interpolated weight (and the second plane's
// weight when dual-plane selects a different weight for one channel), and
// blend the two endpoints with it.

use crate::fp16::Fp16;

/// Blends two 16-bit "div-64k" endpoint scalars with a weight in `0..=64`,
/// per spec §4.6: `((64-w)*v0 + w*v1 + 32) >> 6`, then converts the single
/// blended 16-bit result to `Fp16` -- never the endpoints individually.
fn lerp_channel(v0: u16, v1: u16, weight: u32) -> Fp16 {
  let blended = ((64 - weight) * v0 as u32 + weight * v1 as u32 + 32) >> 6;
  Fp16::from_uint16_div_64k(blended as u16)
}

/// One texel's interpolated colour, given its partition's endpoint pair
/// (raw 16-bit div-64k scalars, as returned by `endpoints::decode_endpoints`),
/// the plane-0 weight (`0..=64`), the optional plane-1 weight, and which
/// channel (if any) plane 1 drives (`colour_component_selector`).
pub fn synth_texel(v0: [u16; 4], v1: [u16; 4], weight0: u32, weight1: Option<u32>, dual_plane_channel: Option<usize>) -> [Fp16; 4] {
  core::array::from_fn(|c| {
    let w = match (dual_plane_channel, weight1) {
      (Some(sel), Some(w1)) if sel == c => w1,
      _ => weight0,
    };
    lerp_channel(v0[c], v1[c], w)
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  const ZERO: u16 = 0x0000;
  const ONE: u16 = 0xffff;

  #[test]
  fn full_weight_zero_picks_v0() {
    let v0 = [ZERO, ONE, ZERO, ONE];
    let v1 = [ONE, ZERO, ONE, ZERO];
    let out = synth_texel(v0, v1, 0, None, None);
    assert_eq!(out[0].to_unorm8(), 0);
    assert_eq!(out[1].to_unorm8(), 255);
  }

  #[test]
  fn full_weight_64_picks_v1() {
    let v0 = [ZERO, ONE, ZERO, ONE];
    let v1 = [ONE, ZERO, ONE, ZERO];
    let out = synth_texel(v0, v1, 64, None, None);
    assert_eq!(out[0].to_unorm8(), 255);
    assert_eq!(out[1].to_unorm8(), 0);
  }

  #[test]
  fn halfway_weight_is_midpoint() {
    let v0 = [ZERO; 4];
    let v1 = [ONE, ONE, ONE, ONE];
    let out = synth_texel(v0, v1, 32, None, None);
    assert!((120..=136).contains(&out[0].to_unorm8()));
  }

  #[test]
  fn dual_plane_channel_uses_second_weight() {
    let v0 = [ZERO; 4];
    let v1 = [ONE; 4];
    let out = synth_texel(v0, v1, 0, Some(64), Some(2));
    assert_eq!(out[0].to_unorm8(), 0);
    assert_eq!(out[2].to_unorm8(), 255);
  }
}
