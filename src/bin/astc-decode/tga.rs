// Uncompressed TGA writer: 18-byte header, BGR/BGRA pixel body, written
// top-to-bottom in the same order the image was decoded rather than TGA's
// usual bottom-up convention, to keep the byte layout predictable.

use std::io::{self, Write};

const CHUNK_PIXELS: usize = 4096;

/// Writes `pixels` (RGBA, row-major, `width * height` entries) as an
/// uncompressed TGA. Drops the alpha channel (24 bits per pixel) unless at
/// least one pixel has alpha != 255, in which case it writes BGRA (32 bpp).
pub fn write_tga<W: Write>(w: &mut W, width: u16, height: u16, pixels: &[[u8; 4]]) -> io::Result<()> {
  debug_assert_eq!(pixels.len(), width as usize * height as usize);

  let has_alpha = pixels.iter().any(|p| p[3] != 255);
  let bytes_per_pixel = if has_alpha { 4 } else { 3 };

  let mut header = [0u8; 18];
  header[2] = 2; // uncompressed true-colour
  header[12..14].copy_from_slice(&width.to_le_bytes());
  header[14..16].copy_from_slice(&height.to_le_bytes());
  header[16] = bytes_per_pixel * 8;
  w.write_all(&header)?;

  let mut buf = Vec::with_capacity(CHUNK_PIXELS * bytes_per_pixel as usize);
  for chunk in pixels.chunks(CHUNK_PIXELS) {
    buf.clear();
    for p in chunk {
      buf.push(p[2]);
      buf.push(p[1]);
      buf.push(p[0]);
      if has_alpha {
        buf.push(p[3]);
      }
    }
    w.write_all(&buf)?;
  }

  Ok(())
}
