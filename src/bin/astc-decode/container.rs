// .astc container I/O: a 16-byte header (magic, block dimensions, image
// dimensions) followed by raster-ordered 16-byte blocks.

use std::fmt;
use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

const MAGIC: u32 = 0x5CA1_AB13;

#[derive(Clone, Copy, Debug)]
pub struct Header {
  pub block_w: u32,
  pub block_h: u32,
  pub block_d: u32,
  pub xsize: u32,
  pub ysize: u32,
  pub zsize: u32,
}

impl Header {
  pub fn blocks_x(&self) -> u32 {
    (self.xsize + self.block_w - 1) / self.block_w
  }

  pub fn blocks_y(&self) -> u32 {
    (self.ysize + self.block_h - 1) / self.block_h
  }

  pub fn blocks_z(&self) -> u32 {
    (self.zsize + self.block_d - 1) / self.block_d
  }

  pub fn num_blocks(&self) -> u64 {
    self.blocks_x() as u64 * self.blocks_y() as u64 * self.blocks_z() as u64
  }
}

#[derive(Debug)]
pub enum ContainerError {
  Io(io::Error),
  BadMagic(u32),
  TruncatedBlockStream { expected: u64, got: u64 },
}

impl fmt::Display for ContainerError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ContainerError::Io(e) => write!(f, "I/O error: {e}"),
      ContainerError::BadMagic(got) => write!(f, "bad magic: expected {MAGIC:#010x}, got {got:#010x}"),
      ContainerError::TruncatedBlockStream { expected, got } => {
        write!(f, "truncated block stream: expected {expected} blocks, got {got}")
      }
    }
  }
}

impl std::error::Error for ContainerError {}

impl From<io::Error> for ContainerError {
  fn from(e: io::Error) -> Self {
    ContainerError::Io(e)
  }
}

pub fn read_header<R: Read>(r: &mut R) -> Result<Header, ContainerError> {
  let magic = r.read_u32::<LittleEndian>()?;
  if magic != MAGIC {
    return Err(ContainerError::BadMagic(magic));
  }

  let block_w = r.read_u8()? as u32;
  let block_h = r.read_u8()? as u32;
  let block_d = r.read_u8()? as u32;
  let xsize = r.read_uint::<LittleEndian>(3)? as u32;
  let ysize = r.read_uint::<LittleEndian>(3)? as u32;
  let zsize = r.read_uint::<LittleEndian>(3)? as u32;

  Ok(Header { block_w, block_h, block_d, xsize, ysize, zsize })
}

pub fn write_header<W: Write>(w: &mut W, h: &Header) -> io::Result<()> {
  w.write_u32::<LittleEndian>(MAGIC)?;
  w.write_u8(h.block_w as u8)?;
  w.write_u8(h.block_h as u8)?;
  w.write_u8(h.block_d as u8)?;
  w.write_uint::<LittleEndian>(h.xsize as u64, 3)?;
  w.write_uint::<LittleEndian>(h.ysize as u64, 3)?;
  w.write_uint::<LittleEndian>(h.zsize as u64, 3)?;
  Ok(())
}

/// Reads exactly `num_blocks` raw 16-byte blocks, raster-ordered. Any short
/// read is reported as `TruncatedBlockStream` rather than a bare EOF.
pub fn read_blocks<R: Read>(r: &mut R, num_blocks: u64) -> Result<Vec<[u8; 16]>, ContainerError> {
  let mut blocks = Vec::with_capacity(num_blocks as usize);
  for _ in 0..num_blocks {
    let mut buf = [0u8; 16];
    match r.read_exact(&mut buf) {
      Ok(()) => blocks.push(buf),
      Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
        return Err(ContainerError::TruncatedBlockStream { expected: num_blocks, got: blocks.len() as u64 });
      }
      Err(e) => return Err(e.into()),
    }
  }
  Ok(blocks)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Cursor;

  #[test]
  fn header_round_trips() {
    let h = Header { block_w: 4, block_h: 4, block_d: 1, xsize: 640, ysize: 480, zsize: 1 };
    let mut buf = Vec::new();
    write_header(&mut buf, &h).unwrap();
    assert_eq!(buf.len(), 16);

    let mut cursor = Cursor::new(buf);
    let decoded = read_header(&mut cursor).unwrap();
    assert_eq!(decoded.block_w, 4);
    assert_eq!(decoded.xsize, 640);
    assert_eq!(decoded.ysize, 480);
  }

  #[test]
  fn bad_magic_is_rejected() {
    let buf = [0u8; 16];
    let mut cursor = Cursor::new(buf);
    assert!(matches!(read_header(&mut cursor), Err(ContainerError::BadMagic(0))));
  }

  #[test]
  fn blocks_x_y_round_up_to_cover_the_image() {
    let h = Header { block_w: 4, block_h: 4, block_d: 1, xsize: 10, ysize: 9, zsize: 1 };
    assert_eq!(h.blocks_x(), 3);
    assert_eq!(h.blocks_y(), 3);
    assert_eq!(h.num_blocks(), 9);
  }

  #[test]
  fn truncated_block_stream_is_reported() {
    let mut cursor = Cursor::new(vec![0u8; 20]);
    let err = read_blocks(&mut cursor, 2).unwrap_err();
    assert!(matches!(err, ContainerError::TruncatedBlockStream { expected: 2, got: 1 }));
  }
}
