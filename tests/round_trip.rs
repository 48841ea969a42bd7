// Cross-module round-trip coverage: for a matrix of block footprints,
// weight-grid shapes, partition counts, dual-plane settings and colour
// endpoint modes, a `Block` synthesised by the test generator below must
// survive `encode` -> `decode` with every field intact (spec §8, scenario
// 6). Unit-level round trips for individual header fields live next to the
// code they exercise (`block::tests`, `encoder::tests`); this file is the
// "multiple modules together" test the crate's test-tooling section calls
// for.

use astc_decode::block::{self, Block};
use astc_decode::{encode, Fp16};
use astc_decode::blockmode::SHAPES_2D;
use astc_decode::ise;

// The 2D block footprints the reference test generator exercises (spec §8,
// scenario 6). Each is paired with a weight-grid shape no larger than it.
const BLOCK_SIZES: [(u32, u32); 6] = [(4, 4), (5, 4), (5, 5), (6, 5), (6, 6), (8, 6)];

fn pick_shape(block_w: u32, block_h: u32) -> (u32, u32) {
  SHAPES_2D
    .iter()
    .skip(1)
    .map(|&(w, h, _)| (w as u32, h as u32))
    .filter(|&(w, h)| w <= block_w && h <= block_h)
    .max_by_key(|&(w, h)| w * h)
    .expect("at least one weight shape fits every tested block size")
}

fn make_block(wt_w: u32, wt_h: u32, wt_range: u32, num_parts: u32, cem: u8, dual_plane: bool) -> Option<Block> {
  let range = ise::range_for_index(wt_range as usize);
  let weight_count = (wt_w * wt_h) as usize * if dual_plane { 2 } else { 1 };
  let weight_bits = ise::bits_for_ise(weight_count, range);
  if !(block::MIN_WEIGHT_BITS..=block::MAX_WEIGHT_BITS).contains(&weight_bits) {
    return None;
  }

  let cems = core::array::from_fn(|i| if i < num_parts as usize { cem as i8 } else { -1 });
  let mut block = Block {
    wt_w,
    wt_h,
    wt_d: 1,
    wt_range,
    high_prec: false,
    dual_plane,
    colour_component_selector: if dual_plane { Some(0) } else { None },
    num_parts,
    partition_index: if num_parts > 1 { 17 } else { 0 },
    is_multi_cem: false,
    cem_base_class: cem >> 2,
    cems,
    is_void_extent: false,
    vx_colour: [0; 4],
    vx_bounds: None,
    weight_bits,
    remaining_bits: 0,
    ce_range_index: None,
    weights_quant: (0..weight_count).map(|i| (i % range.levels() as usize) as u8).collect(),
    colour_endpoints_quant: Vec::new(),
    is_error: false,
    bogus_weights: false,
    bogus_colour_endpoints: false,
  };

  let total_cem_values = block.num_cem_values();
  let header_bits = 11 + 2 + if num_parts > 1 { 10 } else { 0 } + 5 + if dual_plane { 2 } else { 0 };
  let remaining = 128usize.checked_sub(header_bits + weight_bits)?;
  let ce_range = block::widest_range_fitting(total_cem_values, remaining)?;
  block.colour_endpoints_quant = (0..total_cem_values).map(|i| (i % ce_range.levels() as usize) as u8).collect();

  Some(block)
}

#[test]
fn encode_decode_round_trips_across_block_sizes_and_cems() {
  let mut tested = 0;
  let mut skipped = 0;

  for &(block_w, block_h) in &BLOCK_SIZES {
    let (wt_w, wt_h) = pick_shape(block_w, block_h);

    for &num_parts in &[1u32, 2, 3] {
      for &dual_plane in &[false, true] {
        if dual_plane && num_parts == 4 {
          continue;
        }
        for &cem in &[0u8, 4, 6, 8, 12] {
          for wt_range in 0..12u32 {
            let Some(block) = make_block(wt_w, wt_h, wt_range, num_parts, cem, dual_plane) else {
              skipped += 1;
              continue;
            };

            let bytes = match encode(&block) {
              Ok(b) => b,
              Err(_) => {
                skipped += 1;
                continue;
              }
            };

            let bv = astc_decode::bitvector::InputBitVector::from_bytes(&bytes);
            let (decoded, err) = Block::analyze(&bv, block_w, block_h, 1);
            assert!(err.is_ok(), "decode failed for {block_w}x{block_h} wt={wt_w}x{wt_h} parts={num_parts} cem={cem} dual={dual_plane}: {err}");

            assert_eq!(decoded.wt_w, block.wt_w);
            assert_eq!(decoded.wt_h, block.wt_h);
            assert_eq!(decoded.wt_range, block.wt_range);
            assert_eq!(decoded.dual_plane, block.dual_plane);
            assert_eq!(decoded.num_parts, block.num_parts);
            assert_eq!(&decoded.cems[..num_parts as usize], &block.cems[..num_parts as usize]);
            assert_eq!(decoded.weights_quant, block.weights_quant);
            assert_eq!(decoded.colour_endpoints_quant, block.colour_endpoints_quant);

            let mut out = vec![[Fp16::zero(); 4]; (block_w * block_h) as usize];
            let decode_err = block::decode(block_w, block_h, 1, &bytes, &mut out);
            assert!(decode_err.is_ok());

            tested += 1;
          }
        }
      }
    }
  }

  assert!(tested > 50, "expected broad coverage of the matrix, only ran {tested} (skipped {skipped})");
}

#[test]
fn void_extent_is_constant_across_every_tested_block_size() {
  let bytes: [u8; 16] = [0xfc, 0xfd, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x34, 0x12, 0, 0, 0xff, 0xff, 0, 0];

  for &(block_w, block_h) in &BLOCK_SIZES {
    let mut out = vec![[Fp16::zero(); 4]; (block_w * block_h) as usize];
    let err = block::decode(block_w, block_h, 1, &bytes, &mut out);
    assert!(err.is_ok());
    let first = out[0];
    assert!(out.iter().all(|&t| t == first));
  }
}
