//! ASTC texture block decoder.
//!
//! This crate decodes compressed ASTC blocks (one block is always 128 bits,
//! `block_w * block_h * block_d` texels) into `[Fp16; 4]` RGBA colours. The
//! library itself performs no I/O: it is a pure, single-threaded-per-call
//! decode (and, for test purposes, encode) of the block format described in
//! the `block` module. Container parsing (`.astc` files) and image output
//! (`.tga` files) live in the `astc-decode` binary built on top of this
//! library.

pub mod bitvector;
pub mod block;
pub mod blockmode;
pub mod encoder;
pub mod endpoints;
pub mod error;
pub mod fp16;
pub mod ise;
pub mod partition;
pub mod texel;
pub mod weights;

pub use block::{decode, Block, Decoder};
pub use encoder::{encode, EncodeError, Encoder};
pub use error::DecodeError;
pub use fp16::Fp16;
