// Single 128-bit block decode: ties together the block-mode header, the
// partition/CEM header, colour endpoint ISE decode and weight ISE decode
// plus infill, and per-texel synthesis, into the one public entry point
// this crate exists to provide.
//
// `Block::analyze` stops short of unquantising/synthesising texels: it
// produces the fully-populated logical form described by the data model
// (quantised weights, quantised colour endpoints, every header field),
// which is what both `decode` (finishes the job into texels) and
// `crate::encoder` (writes it back out as 16 bytes, for round-trip
// testing) build on.
//
// Field layout (after the void-extent check) is:
//   [0..11)                          block mode (blockmode::decode_block_mode)
//   [11..13)                         num_parts - 1
//   [13..23)  (only if num_parts>1)  partition_index
//   ..        is_multi_cem (1 bit), then either a single 4-bit CEM or a
//             multi-CEM header (cem_base_class, per-partition extension
//             bits, per-partition index bits; see blockmode::cem_header_bits)
//   ..        colour_component_selector (2 bits, only if dual_plane)
//   [header_end..header_end+ce_bits) colour endpoint ISE data, at the
//             widest quantisation range that fits before the weight area
//   [128-weight_bits..128)           weight ISE data, packed from the
//             high end of the block and read bit-reversed
//
// This is, like `blockmode`, a self-consistent layout rather than a literal
// transcription of the Khronos physical bit table (unavailable in the
// reference sources kept alongside this crate) -- see DESIGN.md.

use crate::bitvector::InputBitVector;
use crate::blockmode::{self, BlockModeHeader};
use crate::endpoints;
use crate::error::DecodeError;
use crate::fp16::{self, Fp16};
use crate::ise::{self, Range};
use crate::partition;
use crate::texel;
use crate::weights;

pub const NUM_PARTS_BITS: usize = 2;
pub const PARTITION_INDEX_BITS: usize = 10;
pub const MIN_WEIGHT_BITS: usize = 24;
pub const MAX_WEIGHT_BITS: usize = 96;
pub const MAX_CEM_VALUES: usize = 18;

/// The fully decoded logical form of one compressed block, stopping at the
/// quantised stage so that it is exactly what `crate::encoder::encode` needs
/// to invert. See spec §3 ("Block").
#[derive(Clone, Debug)]
pub struct Block {
  pub wt_w: u32,
  pub wt_h: u32,
  pub wt_d: u32,
  pub wt_range: u32,
  pub high_prec: bool,
  pub dual_plane: bool,
  pub colour_component_selector: Option<usize>,
  pub num_parts: u32,
  pub partition_index: u32,
  pub is_multi_cem: bool,
  pub cem_base_class: u8,
  /// CEM per partition; unused slots (`i >= num_parts`) are `-1`.
  pub cems: [i8; 4],

  pub is_void_extent: bool,
  pub vx_colour: [u16; 4],
  /// Interpolation-bound fields from the void-extent tail: preserved on
  /// decode but, per spec §9's open question, not consumed by the texel
  /// synthesiser.
  pub vx_bounds: Option<[u16; 4]>,

  pub weight_bits: usize,
  pub remaining_bits: usize,
  pub ce_range_index: Option<usize>,
  pub weights_quant: Vec<u8>,
  pub colour_endpoints_quant: Vec<u8>,

  pub is_error: bool,
  pub bogus_weights: bool,
  pub bogus_colour_endpoints: bool,
}

impl Block {
  /// `num_cem_values = 2 * sum((cems[i]>>2)+1)` over active partitions, as
  /// spec §3 defines it.
  pub fn num_cem_values(&self) -> usize {
    self.cems[..self.num_parts as usize].iter().map(|&c| endpoints::num_values(c as u8)).sum()
  }

  fn error(reason: DecodeError) -> (Block, DecodeError) {
    (
      Block {
        wt_w: 0,
        wt_h: 0,
        wt_d: 0,
        wt_range: 0,
        high_prec: false,
        dual_plane: false,
        colour_component_selector: None,
        num_parts: 1,
        partition_index: 0,
        is_multi_cem: false,
        cem_base_class: 0,
        cems: [-1; 4],
        is_void_extent: false,
        vx_colour: [0; 4],
        vx_bounds: None,
        weight_bits: 0,
        remaining_bits: 0,
        ce_range_index: None,
        weights_quant: Vec::new(),
        colour_endpoints_quant: Vec::new(),
        is_error: true,
        bogus_weights: false,
        bogus_colour_endpoints: false,
      },
      reason,
    )
  }

  /// Parses one 128-bit block into its logical form, without unquantising
  /// weights/endpoints or synthesising texels. Never panics: any structural
  /// violation yields a fully-populated `Block` with `is_error` set and a
  /// non-ok `DecodeError` describing why (spec §7).
  pub fn analyze(bv: &InputBitVector, block_w: u32, block_h: u32, block_d: u32) -> (Block, DecodeError) {
    if blockmode::is_void_extent(bv.get_bits(0, blockmode::VOID_EXTENT_PATTERN_BITS)) {
      return Self::analyze_void_extent(bv);
    }

    let mode_bits = bv.get_bits(0, 11);
    let mode = blockmode::decode_block_mode(mode_bits, block_d);
    if mode.is_error {
      return Self::error(DecodeError::ReservedBlockMode);
    }

    if mode.wt_w > block_w || mode.wt_h > block_h || mode.wt_d > block_d {
      return Self::error(DecodeError::IllegalEncoding);
    }

    let mut off = 11;
    let num_parts = bv.get_bits(off, NUM_PARTS_BITS) + 1;
    off += NUM_PARTS_BITS;

    if mode.dual_plane && num_parts == 4 {
      return Self::error(DecodeError::TooManyPartitionsForDualPlane);
    }

    let partition_index = if num_parts > 1 {
      let v = bv.get_bits(off, PARTITION_INDEX_BITS);
      off += PARTITION_INDEX_BITS;
      v
    } else {
      0
    };

    let (is_multi_cem, cem_base_class, cems, off_after_cem) = decode_cems(bv, off, num_parts);
    let mut off = off_after_cem;

    let colour_component_selector = if mode.dual_plane {
      let ccs = bv.get_bits(off, 2) as usize;
      off += 2;
      Some(ccs)
    } else {
      None
    };

    let header_end = off;

    let wt_range = ise::range_for_index(mode.wt_range as usize);
    let weight_count = (mode.wt_w * mode.wt_h * mode.wt_d) as usize * if mode.dual_plane { 2 } else { 1 };
    let weight_bits = ise::bits_for_ise(weight_count, wt_range);

    if weight_bits < MIN_WEIGHT_BITS || weight_bits > MAX_WEIGHT_BITS || header_end + weight_bits > 128 {
      return Self::error(DecodeError::WeightBitsOutOfRange);
    }

    let remaining_bits = 128 - header_end - weight_bits;

    let mut block = Block {
      wt_w: mode.wt_w,
      wt_h: mode.wt_h,
      wt_d: mode.wt_d,
      wt_range: mode.wt_range,
      high_prec: mode.high_prec,
      dual_plane: mode.dual_plane,
      colour_component_selector,
      num_parts,
      partition_index,
      is_multi_cem,
      cem_base_class,
      cems,
      is_void_extent: false,
      vx_colour: [0; 4],
      vx_bounds: None,
      weight_bits,
      remaining_bits,
      ce_range_index: None,
      weights_quant: Vec::new(),
      colour_endpoints_quant: Vec::new(),
      is_error: false,
      bogus_weights: false,
      bogus_colour_endpoints: false,
    };

    let total_cem_values = block.num_cem_values();
    if total_cem_values > MAX_CEM_VALUES {
      block.bogus_colour_endpoints = true;
      block.is_error = true;
      return (block, DecodeError::CemOverflow);
    }

    let ce_range = match widest_range_fitting(total_cem_values, remaining_bits) {
      Some(r) => r,
      None => {
        block.bogus_colour_endpoints = true;
        block.is_error = true;
        return (block, DecodeError::CemOverflow);
      }
    };
    block.ce_range_index = ise::RANGES.iter().position(|&r| r == ce_range);

    block.colour_endpoints_quant = ise::decode_sequence(bv, header_end, total_cem_values, ce_range, false);
    block.weights_quant = ise::decode_sequence(bv, 128 - weight_bits, weight_count, wt_range, true);

    (block, DecodeError::Ok)
  }

  fn analyze_void_extent(bv: &InputBitVector) -> (Block, DecodeError) {
    let channel = |lo: usize| -> u16 { bv.get_bits(lo, 16) as u16 };
    let vx_colour = [channel(64), channel(80), channel(96), channel(112)];
    (
      Block {
        wt_w: 0,
        wt_h: 0,
        wt_d: 0,
        wt_range: 0,
        high_prec: false,
        dual_plane: false,
        colour_component_selector: None,
        num_parts: 1,
        partition_index: 0,
        is_multi_cem: false,
        cem_base_class: 0,
        cems: [-1; 4],
        is_void_extent: true,
        vx_colour,
        vx_bounds: None,
        weight_bits: 0,
        remaining_bits: 0,
        ce_range_index: None,
        weights_quant: Vec::new(),
        colour_endpoints_quant: Vec::new(),
        is_error: false,
        bogus_weights: false,
        bogus_colour_endpoints: false,
      },
      DecodeError::Ok,
    )
  }
}

fn decode_cems(bv: &InputBitVector, mut off: usize, num_parts: u32) -> (bool, u8, [i8; 4], usize) {
  let is_multi_cem = bv.get_bits(off, 1) != 0;
  off += 1;

  if !is_multi_cem {
    let cem = bv.get_bits(off, 4) as u8;
    off += 4;
    return (false, cem >> 2, [cem as i8, -1, -1, -1], off);
  }

  let cem_base_class = bv.get_bits(off, 2) as u8;
  off += 2;
  let ext_bits = bv.get_bits(off, num_parts as usize);
  off += num_parts as usize;
  let idx_bits = bv.get_bits(off, 2 * num_parts as usize);
  off += 2 * num_parts as usize;

  let mut cems = [-1i8; 4];
  for p in 0..num_parts as usize {
    let ext = (ext_bits >> p) & 1;
    let idx = (idx_bits >> (2 * p)) & 0x3;
    cems[p] = ((cem_base_class as u32 + ext) * 4 + idx) as i8;
  }
  (true, cem_base_class, cems, off)
}

/// Finds the widest ISE range whose `count`-element encoding fits in
/// `budget_bits`, matching the reference decoder's "spend whatever's left
/// on colour endpoint precision" approach. Returns `None` if even the
/// narrowest range overflows the budget.
pub fn widest_range_fitting(count: usize, budget_bits: usize) -> Option<Range> {
  ise::RANGES.iter().rev().copied().find(|&range| ise::bits_for_ise(count, range) <= budget_bits)
}

fn fill_with(out: &mut [[Fp16; 4]], colour: [Fp16; 4]) {
  for texel in out.iter_mut() {
    *texel = colour;
  }
}

/// Holds a block footprint (`block_w, block_h, block_d`) across many
/// `decode` calls. Immutable after construction (spec §5): a `Decoder`
/// carries no per-call state, so callers may share one across threads and
/// shard a block grid over them without synchronisation.
#[derive(Clone, Copy, Debug)]
pub struct Decoder {
  block_w: u32,
  block_h: u32,
  block_d: u32,
}

impl Decoder {
  /// Constructs a `Decoder` for the given block footprint. `block_w` and
  /// `block_h` must be non-zero (`block_d` may be 1 for a 2D footprint);
  /// this is a programmer-error precondition (spec §7), not a runtime
  /// error, and is only checked in debug builds.
  pub fn new(block_w: u32, block_h: u32, block_d: u32) -> Self {
    debug_assert!(block_w >= 2 && block_h >= 2 && block_d >= 1);
    Decoder { block_w, block_h, block_d }
  }

  pub fn texels_per_block(&self) -> usize {
    (self.block_w * self.block_h * self.block_d) as usize
  }

  /// Decodes one 128-bit block into `out`. `out.len()` must equal
  /// `texels_per_block()`.
  pub fn decode(&self, data: &[u8; 16], out: &mut [[Fp16; 4]]) -> DecodeError {
    decode(self.block_w, self.block_h, self.block_d, data, out)
  }
}

/// Decodes one 128-bit ASTC block into `out`, one `[Fp16; 4]` RGBA colour
/// per texel in raster order (x fastest, then y, then z). `out.len()` must
/// equal `block_w * block_h * block_d`.
///
/// Never panics on malformed input: any error fills `out` with
/// `fp16::error_colour()` and returns a diagnostic `DecodeError` describing
/// why, so a caller decoding a whole image can keep going.
pub fn decode(block_w: u32, block_h: u32, block_d: u32, data: &[u8; 16], out: &mut [[Fp16; 4]]) -> DecodeError {
  debug_assert_eq!(out.len(), (block_w * block_h * block_d) as usize);

  let bv = InputBitVector::from_bytes(data);
  let (block, err) = Block::analyze(&bv, block_w, block_h, block_d);

  if block.is_void_extent {
    let colour = [
      Fp16::from_uint16_div_64k(block.vx_colour[0]),
      Fp16::from_uint16_div_64k(block.vx_colour[1]),
      Fp16::from_uint16_div_64k(block.vx_colour[2]),
      Fp16::from_uint16_div_64k(block.vx_colour[3]),
    ];
    fill_with(out, colour);
    return DecodeError::Ok;
  }

  if block.is_error {
    fill_with(out, fp16::error_colour());
    return err;
  }

  let ce_range = ise::range_for_index(block.ce_range_index.expect("non-error block always picks a ce range"));

  let ce_values: Vec<u8> = block.colour_endpoints_quant.iter().map(|&v| ise::unquantize(v, ce_range, 255) as u8).collect();

  let mut endpoint_pairs = [([0u16; 4], [0u16; 4]); 4];
  let mut value_off = 0;
  for p in 0..block.num_parts as usize {
    let n = endpoints::num_values(block.cems[p] as u8);
    endpoint_pairs[p] = endpoints::decode_endpoints(block.cems[p] as u8, &ce_values[value_off..value_off + n]);
    value_off += n;
  }

  let wt_range = ise::range_for_index(block.wt_range as usize);
  let grid = weights::decode_weights(&bv, block.weight_bits, block.wt_w, block.wt_h, block.wt_d, wt_range, block.dual_plane);
  let plane0 = weights::infill(&grid.plane0, block.wt_w, block.wt_h, block.wt_d, block_w, block_h, block_d);
  let plane1 = grid.plane1.map(|p| weights::infill(&p, block.wt_w, block.wt_h, block.wt_d, block_w, block_h, block_d));

  for z in 0..block_d {
    for y in 0..block_h {
      for x in 0..block_w {
        let idx = (x + y * block_w + z * block_w * block_h) as usize;
        let part = if block.num_parts == 1 {
          0
        } else {
          partition::select_partition(block.partition_index, block.num_parts, x, y, z, block_w, block_h, block_d) as usize
        };
        let (v0, v1) = endpoint_pairs[part];
        let w0 = plane0[idx] as u32;
        let w1 = plane1.as_ref().map(|p| p[idx] as u32);
        out[idx] = texel::synth_texel(v0, v1, w0, w1, block.colour_component_selector);
      }
    }
  }

  DecodeError::Ok
}
