// Encoder: the inverse of `block::Block::analyze`, writing a fully
// populated `Block` back out as 16 bytes. Not a rate-distortion optimiser —
// its only job is to synthesise well-formed blocks (and occasional
// deliberately-malformed ones) for round-trip testing the decoder, per
// spec §4.9.

use crate::bitvector::OutputBitVector;
use crate::block::{self, Block};
use crate::blockmode;
use crate::ise;

/// Failure modes the encoder can report. Unlike `DecodeError`, these never
/// reach a texel buffer — they simply mean "this `Block` cannot be
/// represented as 16 bytes", and the caller (the round-trip test generator)
/// is expected to either skip the block or use it for negative decode
/// testing by constructing the bytes some other way.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncodeError {
  TooManyCemValues,
  ColourEndpointBitsExhausted,
  TooManyPartitionsForDualPlane,
  WeightBitsTooFew,
  WeightBitsTooMany,
  UnknownBlockModeShape,
}

/// Encodes a well-formed `Block` into 16 bytes. Rejects (spec §4.9) any
/// block where `num_cem_values > 18`, `remaining_bits` is too small for the
/// chosen colour-endpoint range, `dual_plane && num_parts == 4`,
/// `weight_bits < 24`, or `weight_bits > 96`. The last case additionally
/// would have set `bogus_weights` had decoding gotten that far; the encoder
/// simply refuses to emit such a block rather than emitting bits nobody
/// could make sense of.
pub fn encode(b: &Block) -> Result<[u8; 16], EncodeError> {
  if b.is_void_extent {
    return Ok(encode_void_extent(b));
  }

  if b.dual_plane && b.num_parts == 4 {
    return Err(EncodeError::TooManyPartitionsForDualPlane);
  }

  let total_cem_values = b.num_cem_values();
  if total_cem_values > block::MAX_CEM_VALUES {
    return Err(EncodeError::TooManyCemValues);
  }

  let mode = blockmode::encode_block_mode(b.wt_w, b.wt_h, b.wt_d, b.wt_range, b.high_prec, b.dual_plane)
    .ok_or(EncodeError::UnknownBlockModeShape)?;

  let mut bw = OutputBitVector::new();
  bw.set_bits(0, 11, mode);

  let mut off = 11;
  bw.set_bits(off, block::NUM_PARTS_BITS, b.num_parts - 1);
  off += block::NUM_PARTS_BITS;

  if b.num_parts > 1 {
    bw.set_bits(off, block::PARTITION_INDEX_BITS, b.partition_index);
    off += block::PARTITION_INDEX_BITS;
  }

  off = encode_cems(&mut bw, off, b);

  if b.dual_plane {
    let ccs = b.colour_component_selector.unwrap_or(0);
    bw.set_bits(off, 2, ccs as u32);
    off += 2;
  }

  let header_end = off;

  let wt_range = ise::range_for_index(b.wt_range as usize);
  let weight_count = (b.wt_w * b.wt_h * b.wt_d) as usize * if b.dual_plane { 2 } else { 1 };
  let weight_bits = ise::bits_for_ise(weight_count, wt_range);

  if weight_bits < block::MIN_WEIGHT_BITS {
    return Err(EncodeError::WeightBitsTooFew);
  }
  if weight_bits > block::MAX_WEIGHT_BITS || header_end + weight_bits > 128 {
    return Err(EncodeError::WeightBitsTooMany);
  }

  let remaining_bits = 128 - header_end - weight_bits;
  let ce_range = block::widest_range_fitting(total_cem_values, remaining_bits).ok_or(EncodeError::ColourEndpointBitsExhausted)?;
  if ise::bits_for_ise(total_cem_values, ce_range) > remaining_bits {
    return Err(EncodeError::ColourEndpointBitsExhausted);
  }

  ise::encode_sequence(&mut bw, header_end, &b.colour_endpoints_quant, ce_range, false);
  ise::encode_sequence(&mut bw, 128 - weight_bits, &b.weights_quant, wt_range, true);

  Ok(bw.to_bytes())
}

fn encode_cems(bw: &mut OutputBitVector, mut off: usize, b: &Block) -> usize {
  bw.set_bits(off, 1, u32::from(b.is_multi_cem));
  off += 1;

  if !b.is_multi_cem {
    bw.set_bits(off, 4, b.cems[0] as u32);
    return off + 4;
  }

  bw.set_bits(off, 2, b.cem_base_class as u32);
  off += 2;

  let mut ext_bits = 0u32;
  let mut idx_bits = 0u32;
  for p in 0..b.num_parts as usize {
    let cem = b.cems[p] as u32;
    let ext = (cem / 4).wrapping_sub(b.cem_base_class as u32) & 1;
    let idx = cem & 0x3;
    ext_bits |= ext << p;
    idx_bits |= idx << (2 * p);
  }
  bw.set_bits(off, b.num_parts as usize, ext_bits);
  off += b.num_parts as usize;
  bw.set_bits(off, 2 * b.num_parts as usize, idx_bits);
  off + 2 * b.num_parts as usize
}

/// Holds a block footprint across many `encode` calls, mirroring
/// `block::Decoder` (spec §5). The footprint is not actually consulted by
/// `encode` -- a `Block` is self-describing -- but callers that round-trip
/// test a whole image want one `Encoder` paired with one `Decoder` rather
/// than re-deriving the footprint at every call site.
#[derive(Clone, Copy, Debug)]
pub struct Encoder {
  block_w: u32,
  block_h: u32,
  block_d: u32,
}

impl Encoder {
  pub fn new(block_w: u32, block_h: u32, block_d: u32) -> Self {
    debug_assert!(block_w >= 2 && block_h >= 2 && block_d >= 1);
    Encoder { block_w, block_h, block_d }
  }

  pub fn block_dims(&self) -> (u32, u32, u32) {
    (self.block_w, self.block_h, self.block_d)
  }

  pub fn encode(&self, b: &Block) -> Result<[u8; 16], EncodeError> {
    encode(b)
  }
}

fn encode_void_extent(b: &Block) -> [u8; 16] {
  let mut bw = OutputBitVector::new();
  bw.set_bits(0, blockmode::VOID_EXTENT_PATTERN_BITS, blockmode::VOID_EXTENT_PATTERN);
  // Applicability bits [9..13) and the interpolation-bound area are left
  // zero; the decoder treats any block matching the low-9-bit pattern as
  // void-extent regardless of them (spec §4.8).
  bw.set_bits(64, 16, b.vx_colour[0] as u32);
  bw.set_bits(80, 16, b.vx_colour[1] as u32);
  bw.set_bits(96, 16, b.vx_colour[2] as u32);
  bw.set_bits(112, 16, b.vx_colour[3] as u32);
  bw.to_bytes()
}
