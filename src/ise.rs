// Integer Sequence Encoding: packs/unpacks runs of small integers using a
// per-element low-bits field plus a shared trit or quint block, and
// dequantises the packed integers to the 0..64 weight range or the 0..255
// colour-endpoint range.

use crate::bitvector::{InputBitVector, OutputBitVector};

/// One of the 12 `(bits, trits, quints)` quantisation ranges an ISE field
/// can use, indexed 0..11, giving quantisation levels
/// `{2,3,4,5,6,8,10,12,16,20,24,32}` respectively.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Range {
  pub bits: u32,
  pub trits: bool,
  pub quints: bool,
}

pub const RANGES: [Range; 12] = [
  Range { bits: 1, trits: false, quints: false }, // 2 levels
  Range { bits: 0, trits: true, quints: false },  // 3 levels
  Range { bits: 2, trits: false, quints: false }, // 4 levels
  Range { bits: 0, trits: false, quints: true },  // 5 levels
  Range { bits: 1, trits: true, quints: false },  // 6 levels
  Range { bits: 3, trits: false, quints: false }, // 8 levels
  Range { bits: 1, trits: false, quints: true },  // 10 levels
  Range { bits: 2, trits: true, quints: false },  // 12 levels
  Range { bits: 4, trits: false, quints: false }, // 16 levels
  Range { bits: 2, trits: false, quints: true },  // 20 levels
  Range { bits: 3, trits: true, quints: false },  // 24 levels
  Range { bits: 5, trits: false, quints: false }, // 32 levels
];

impl Range {
  pub fn levels(self) -> u32 {
    let mut n = 1u32 << self.bits;
    if self.trits {
      n *= 3;
    }
    if self.quints {
      n *= 5;
    }
    n
  }
}

pub fn range_for_index(idx: usize) -> Range {
  RANGES[idx]
}

/// Total number of bits occupied by `count` elements quantised at `range`.
pub fn bits_for_ise(count: usize, range: Range) -> usize {
  let mut total = count * range.bits as usize;
  if range.trits {
    total += ((count + 4) / 5) * 8;
  }
  if range.quints {
    total += ((count + 2) / 3) * 7;
  }
  total
}

/// Unpacks a single trit block (5 elements sharing an 8-bit trit field) from
/// `packed`, whose bitfield layout is
/// `m0:bits, T0, T1, m1:bits, T2, T3, m2:bits, T4, m3:bits, T5, T6, m4:bits, T7`.
/// `decoded[i] = (trit_digit_i << bits) | m_i` for `i` in `0..5`.
///
/// The trit-value-to-digit mapping below splits the 8-bit trit value into
/// two disjoint cases selected by bits 2,3,4 (`v`): `v == 0b111` forces
/// digits 3 and 4 to value 2 and packs digits 0..2 (27 combinations) into
/// the other 5 bits as a base-3 number 0..26; any other `v` packs all 5
/// digits, restricted to the 216 combinations where digit3 and digit4 are
/// not both 2, as a base-3 number 0..215 whose own bits 2..4 (taken from
/// its middle 3 bits) never land back on 0b111 -- so a re-encoded byte
/// always re-decodes through the same case it was produced by.
///
/// Five base-3 digits have only 3^5 = 243 distinct values, so the 256 raw
/// trit-value patterns cannot all be distinct: 32 patterns share the first
/// case's 27 valid digit sets and 224 share the second case's 216, leaving
/// exactly 13 "excess" patterns that alias an existing one under modulo
/// reduction. `decode_trit_value`/`encode_trit_value` are a genuine
/// bijection between each case's valid digit sets and their canonical
/// representative byte; see `trit_digit_codec_is_bijective_on_canonical_range`
/// below.
pub fn unpack_trit_block(bits: u32, packed: u64, decoded: &mut [u8; 5]) {
  let mut off = 0u32;
  let mut m = [0u32; 5];
  let mut t = [0u32; 8];

  let mut next_bits = |width: u32| -> u32 {
    let v = ((packed >> off) & ((1u64 << width) - 1)) as u32;
    off += width;
    v
  };

  m[0] = next_bits(bits);
  t[0] = next_bits(1);
  t[1] = next_bits(1);
  m[1] = next_bits(bits);
  t[2] = next_bits(1);
  t[3] = next_bits(1);
  m[2] = next_bits(bits);
  t[4] = next_bits(1);
  m[3] = next_bits(bits);
  t[5] = next_bits(1);
  t[6] = next_bits(1);
  m[4] = next_bits(bits);
  t[7] = next_bits(1);

  let tb: u32 = (t[0]) | (t[1] << 1) | (t[2] << 2) | (t[3] << 3) | (t[4] << 4) | (t[5] << 5) | (t[6] << 6) | (t[7] << 7);

  let digits = decode_trit_value(tb);

  for i in 0..5 {
    decoded[i] = ((digits[i] << bits) | m[i]) as u8;
  }
}

/// Inverse of `unpack_trit_block`: given 5 `(digit, m)` pairs, packs them
/// into the interleaved bitfield layout `unpack_trit_block` expects.
pub fn pack_trit_block(bits: u32, digits: &[u8; 5], ms: &[u8; 5]) -> u64 {
  let tb = encode_trit_value(digits);
  let t: [u32; 8] = core::array::from_fn(|i| (tb >> i) & 1);

  let mut out = 0u64;
  let mut off = 0u32;
  let mut put = |width: u32, v: u32| {
    out |= (v as u64 & ((1u64 << width) - 1)) << off;
    off += width;
  };

  put(bits, ms[0] as u32);
  put(1, t[0]);
  put(1, t[1]);
  put(bits, ms[1] as u32);
  put(1, t[2]);
  put(1, t[3]);
  put(bits, ms[2] as u32);
  put(1, t[4]);
  put(bits, ms[3] as u32);
  put(1, t[5]);
  put(1, t[6]);
  put(bits, ms[4] as u32);
  put(1, t[7]);

  out
}

fn decode_trit_value(tb: u32) -> [u32; 5] {
  if (tb >> 2) & 0x7 == 0x7 {
    let raw = ((tb >> 5) & 0x7) << 2 | (tb & 0x3);
    let c = raw % 27;
    [c % 3, (c / 3) % 3, (c / 9) % 3, 2, 2]
  } else {
    // Unpack the same three bit groups used by the special case above
    // (a 3-bit `v` at bits 2..4, a 3-bit `hi3` at bits 5..7, a 2-bit `lo2`
    // at bits 0..1), but fold them into a single base-3 index instead of
    // fixing two digits. `v` never reaches 7 here (that's the special
    // case), so the resulting index is always < 224, safely reduced to
    // the 216 valid combinations with digit3/digit4 not both 2.
    let v = (tb >> 2) & 0x7;
    let hi3 = (tb >> 5) & 0x7;
    let lo2 = tb & 0x3;
    let c = (v * 32 + (hi3 << 2) + lo2) % 216;
    [c % 3, (c / 3) % 3, (c / 9) % 3, (c / 27) % 3, (c / 81) % 3]
  }
}

fn encode_trit_value(digits: &[u8; 5]) -> u32 {
  if digits[3] == 2 && digits[4] == 2 {
    let c = digits[0] as u32 + digits[1] as u32 * 3 + digits[2] as u32 * 9;
    ((c >> 2) & 0x7) << 5 | 0x7 << 2 | (c & 0x3)
  } else {
    let c = digits[0] as u32
      + digits[1] as u32 * 3
      + digits[2] as u32 * 9
      + digits[3] as u32 * 27
      + digits[4] as u32 * 81;
    // Inverse of the decode above: split c (0..215) into v = c/32 (always
    // < 7, so this never collides with the special case's v == 7) and the
    // remaining 5 bits into hi3/lo2.
    let v = c / 32;
    let free5 = c % 32;
    let hi3 = free5 >> 2;
    let lo2 = free5 & 0x3;
    hi3 << 5 | v << 2 | lo2
  }
}

/// Unpacks a single quint block (3 elements sharing a 7-bit quint field),
/// laid out as `m0:bits, Q0, Q1, Q2, m1:bits, Q3, Q4, m2:bits, Q5, Q6`.
pub fn unpack_quint_block(bits: u32, packed: u64, decoded: &mut [u8; 3]) {
  let mut off = 0u32;
  let mut m = [0u32; 3];
  let mut q = [0u32; 7];

  let mut next_bits = |width: u32| -> u32 {
    let v = ((packed >> off) & ((1u64 << width) - 1)) as u32;
    off += width;
    v
  };

  m[0] = next_bits(bits);
  q[0] = next_bits(1);
  q[1] = next_bits(1);
  q[2] = next_bits(1);
  m[1] = next_bits(bits);
  q[3] = next_bits(1);
  q[4] = next_bits(1);
  m[2] = next_bits(bits);
  q[5] = next_bits(1);
  q[6] = next_bits(1);

  let qb: u32 = (0..7).map(|i| q[i] << i).sum();
  // 3 base-5 digits have only 5^3 = 125 distinct values against 128 raw
  // 7-bit patterns; the 3 excess patterns alias an existing one under
  // modulo reduction, mirroring the trit block's 256-vs-243 gap above.
  let c = qb % 125;
  let digits = [c % 5, (c / 5) % 5, (c / 25) % 5];

  for i in 0..3 {
    decoded[i] = ((digits[i] << bits) | m[i]) as u8;
  }
}

pub fn pack_quint_block(bits: u32, digits: &[u8; 3], ms: &[u8; 3]) -> u64 {
  let c = digits[0] as u32 + digits[1] as u32 * 5 + digits[2] as u32 * 25;
  let q: [u32; 7] = core::array::from_fn(|i| (c >> i) & 1);

  let mut out = 0u64;
  let mut off = 0u32;
  let mut put = |width: u32, v: u32| {
    out |= (v as u64 & ((1u64 << width) - 1)) << off;
    off += width;
  };

  put(bits, ms[0] as u32);
  put(1, q[0]);
  put(1, q[1]);
  put(1, q[2]);
  put(bits, ms[1] as u32);
  put(1, q[3]);
  put(1, q[4]);
  put(bits, ms[2] as u32);
  put(1, q[5]);
  put(1, q[6]);

  out
}

/// Reads `count` quantised elements (each in `0..range.levels()`) from the
/// bit vector starting at `off`, reading forward if `reversed` is false or
/// via `get_bits_rev`-style reversed reads if true (used for the weight
/// area, which is packed from the high end of the block).
pub fn decode_sequence(bv: &InputBitVector, off: usize, count: usize, range: Range, reversed: bool) -> Vec<u8> {
  let mut out = vec![0u8; count];
  let read = |o: usize, n: usize| -> u32 {
    if reversed {
      bv.get_bits_rev(o, n)
    } else {
      bv.get_bits(o, n)
    }
  };

  if range.trits {
    let block_width = 5 * range.bits + 8;
    let mut elem = 0usize;
    let mut bit_off = off;
    while elem < count {
      let packed = read(bit_off, block_width as usize) as u64;
      let mut decoded = [0u8; 5];
      unpack_trit_block(range.bits, packed, &mut decoded);
      for d in decoded.iter().take((count - elem).min(5)) {
        out[elem] = *d;
        elem += 1;
      }
      bit_off += block_width as usize;
    }
  } else if range.quints {
    let block_width = 3 * range.bits + 7;
    let mut elem = 0usize;
    let mut bit_off = off;
    while elem < count {
      let packed = read(bit_off, block_width as usize) as u64;
      let mut decoded = [0u8; 3];
      unpack_quint_block(range.bits, packed, &mut decoded);
      for d in decoded.iter().take((count - elem).min(3)) {
        out[elem] = *d;
        elem += 1;
      }
      bit_off += block_width as usize;
    }
  } else {
    let mut bit_off = off;
    for slot in out.iter_mut() {
      *slot = read(bit_off, range.bits as usize) as u8;
      bit_off += range.bits as usize;
    }
  }

  out
}

pub fn encode_sequence(bw: &mut OutputBitVector, off: usize, values: &[u8], range: Range, reversed: bool) {
  let write = |bw: &mut OutputBitVector, o: usize, n: usize, v: u32| {
    if reversed {
      bw.or_bits_rev(o, n, v);
    } else {
      bw.or_bits(o, n, v);
    }
  };

  if range.trits {
    let block_width = (5 * range.bits + 8) as usize;
    let mut elem = 0usize;
    let mut bit_off = off;
    while elem < values.len() {
      let n = (values.len() - elem).min(5);
      let mut digits = [0u8; 5];
      let mut ms = [0u8; 5];
      for i in 0..n {
        digits[i] = values[elem + i] >> range.bits;
        ms[i] = values[elem + i] & ((1 << range.bits) - 1);
      }
      let packed = pack_trit_block(range.bits, &digits, &ms);
      write(bw, bit_off, block_width, packed as u32);
      if block_width > 32 {
        write(bw, bit_off + 32, block_width - 32, (packed >> 32) as u32);
      }
      elem += n;
      bit_off += block_width;
    }
  } else if range.quints {
    let block_width = (3 * range.bits + 7) as usize;
    let mut elem = 0usize;
    let mut bit_off = off;
    while elem < values.len() {
      let n = (values.len() - elem).min(3);
      let mut digits = [0u8; 3];
      let mut ms = [0u8; 3];
      for i in 0..n {
        digits[i] = values[elem + i] >> range.bits;
        ms[i] = values[elem + i] & ((1 << range.bits) - 1);
      }
      let packed = pack_quint_block(range.bits, &digits, &ms);
      write(bw, bit_off, block_width, packed as u32);
      elem += n;
      bit_off += block_width;
    }
  } else {
    let mut bit_off = off;
    for &v in values {
      write(bw, bit_off, range.bits as usize, v as u32);
      bit_off += range.bits as usize;
    }
  }
}

/// Proportionally rescales a quantised value (`0..levels-1`) to the target
/// output range (`0..target_max`), with round-to-nearest. This matches the
/// Khronos ISE unquantisation tables' intent (the maximum-precision value
/// maps to the maximum output value, zero maps to zero) without replicating
/// their exact bit-shuffling closed form.
pub fn unquantize(value: u8, range: Range, target_max: u32) -> u32 {
  let levels = range.levels();
  if levels <= 1 {
    return 0;
  }
  ((value as u32) * target_max * 2 + (levels - 1)) / ((levels - 1) * 2)
}

pub fn quantize(value: u32, range: Range, target_max: u32) -> u8 {
  let levels = range.levels();
  if levels <= 1 {
    return 0;
  }
  let q = ((value * (levels - 1) * 2) + target_max) / (target_max * 2);
  q.min(levels - 1) as u8
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn unpack_trit_block_matches_golden_vectors() {
    // in.u = 0; m0..m4 = 0,1,2,3,4; all T = 0
    // Layout: m0(4) T0 T1 m1(4) T2 T3 m2(4) T4 m3(4) T5 T6 m4(4) T7
    // offsets:  0      4  5   6     10 11  12     16  17     21 22  23    27
    let packed: u64 = (1 << 6) | (2 << 12) | (3 << 17) | (4 << 23);
    let mut decoded = [0u8; 5];
    unpack_trit_block(4, packed, &mut decoded);
    assert_eq!(decoded, [0x00, 0x01, 0x02, 0x03, 0x04]);

    // Same m values, with T2 = T3 = T4 = 1.
    let mut packed2 = packed;
    packed2 |= 1 << 10; // T2
    packed2 |= 1 << 11; // T3
    packed2 |= 1 << 16; // T4
    let mut decoded2 = [0u8; 5];
    unpack_trit_block(4, packed2, &mut decoded2);
    assert_eq!(decoded2, [0x00, 0x01, 0x02, 0x23, 0x24]);
  }

  #[test]
  fn trit_digit_codec_is_bijective_on_canonical_range() {
    use std::collections::HashSet;

    // Every raw trit value must decode to something, and re-encoding that
    // decode must always reach a fixed point: decoding the re-encoded byte
    // reproduces the same digits (the 256 raw patterns alias down to their
    // canonical representative in at most one step).
    let mut canonical = HashSet::new();
    for tb in 0u32..256 {
      let digits = decode_trit_value(tb);
      let digits_u8 = [digits[0] as u8, digits[1] as u8, digits[2] as u8, digits[3] as u8, digits[4] as u8];
      let re_encoded = encode_trit_value(&digits_u8);
      assert_eq!(decode_trit_value(re_encoded), digits, "tb={}", tb);
      canonical.insert(re_encoded);
    }
    // 3^5 = 243 distinct digit quintuples are reachable; each gets exactly
    // one canonical byte, so there are exactly 243 of them among the 256.
    assert_eq!(canonical.len(), 243);

    // pack(unpack(x)) == x holds for every one of those canonical bytes --
    // a genuine bijection between the 243 valid digit quintuples and their
    // canonical byte, which is the most any encoding of 5 base-3 digits
    // into 8 bits can guarantee.
    for &tb in &canonical {
      let digits = decode_trit_value(tb);
      let digits_u8 = [digits[0] as u8, digits[1] as u8, digits[2] as u8, digits[3] as u8, digits[4] as u8];
      assert_eq!(encode_trit_value(&digits_u8), tb, "tb={}", tb);
    }
  }

  #[test]
  fn quint_digit_codec_is_bijective_on_canonical_range() {
    use std::collections::HashSet;

    let encode = |digits: &[u8; 3]| -> u32 { digits[0] as u32 + digits[1] as u32 * 5 + digits[2] as u32 * 25 };
    let decode = |qb: u32| -> [u8; 3] {
      let c = qb % 125;
      [(c % 5) as u8, ((c / 5) % 5) as u8, ((c / 25) % 5) as u8]
    };

    let mut canonical = HashSet::new();
    for qb in 0u32..128 {
      let digits = decode(qb);
      let re_encoded = encode(&digits);
      assert_eq!(decode(re_encoded), digits, "qb={}", qb);
      canonical.insert(re_encoded);
    }
    // 5^3 = 125 distinct digit triples are reachable.
    assert_eq!(canonical.len(), 125);

    for &qb in &canonical {
      let digits = decode(qb);
      assert_eq!(encode(&digits), qb, "qb={}", qb);
    }
  }

  #[test]
  fn unquantize_is_monotonic_and_bounded() {
    for &range in &RANGES {
      let levels = range.levels();
      let mut prev = 0u32;
      for v in 0..levels {
        let u = unquantize(v as u8, range, 64);
        assert!(u <= 64);
        assert!(u >= prev);
        prev = u;
      }
    }
  }

  #[test]
  fn bits_for_ise_matches_block_formula() {
    let range = RANGES[1]; // pure trit range
    assert_eq!(bits_for_ise(5, range), 8);
    assert_eq!(bits_for_ise(6, range), 16);
    assert_eq!(bits_for_ise(1, range), 8);
  }
}
