// CLI front-end: reads a .astc container, decodes every block through the
// library, and writes the result as an uncompressed .tga. The decoder
// library performs no I/O; everything in this binary is plumbing around it.

mod container;
mod tga;

use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use astc_decode::block;
use astc_decode::fp16::Fp16;
use container::{ContainerError, Header};

#[derive(Parser, Debug)]
#[command(name = "astc-decode", about = "Decode an ASTC texture to TGA")]
struct CliArgs {
  /// Path to the input .astc file.
  #[arg(long)]
  input: PathBuf,

  /// Path to write the decoded .tga image to.
  #[arg(long)]
  output: PathBuf,
}

#[derive(Debug)]
enum CliError {
  Container(ContainerError),
  Io(std::io::Error),
}

impl fmt::Display for CliError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      CliError::Container(e) => write!(f, "{e}"),
      CliError::Io(e) => write!(f, "{e}"),
    }
  }
}

impl From<ContainerError> for CliError {
  fn from(e: ContainerError) -> Self {
    CliError::Container(e)
  }
}

impl From<std::io::Error> for CliError {
  fn from(e: std::io::Error) -> Self {
    CliError::Io(e)
  }
}

fn run(args: &CliArgs) -> Result<(), CliError> {
  let input = File::open(&args.input)?;
  let mut reader = BufReader::new(input);
  let header: Header = container::read_header(&mut reader)?;

  log::info!(
    "{}: {}x{}x{} image, {}x{}x{} blocks",
    args.input.display(),
    header.xsize,
    header.ysize,
    header.zsize,
    header.block_w,
    header.block_h,
    header.block_d
  );

  if header.zsize > 1 || header.block_d > 1 {
    log::warn!("volumetric container: only the first depth slice is written to TGA");
  }

  let num_blocks = header.num_blocks();
  let blocks = container::read_blocks(&mut reader, num_blocks)?;

  let blocks_x = header.blocks_x();
  let blocks_y = header.blocks_y();
  let texels_per_block = (header.block_w * header.block_h * header.block_d) as usize;

  let mut out_texels = vec![[Fp16::zero(); 4]; texels_per_block];
  let mut pixels = vec![[0u8; 4]; header.xsize as usize * header.ysize as usize];

  let mut error_count: u64 = 0;
  for by in 0..blocks_y {
    for bx in 0..blocks_x {
      let block_index = (bx + by * blocks_x) as usize;
      let err = block::decode(header.block_w, header.block_h, header.block_d, &blocks[block_index], &mut out_texels);
      if !err.is_ok() {
        error_count += 1;
        log::warn!("block ({bx}, {by}): {err}");
      }

      for ty in 0..header.block_h {
        let py = by * header.block_h + ty;
        if py >= header.ysize {
          continue;
        }
        for tx in 0..header.block_w {
          let px = bx * header.block_w + tx;
          if px >= header.xsize {
            continue;
          }
          let texel = out_texels[(tx + ty * header.block_w) as usize];
          pixels[(px + py * header.xsize) as usize] =
            [texel[0].to_unorm8(), texel[1].to_unorm8(), texel[2].to_unorm8(), texel[3].to_unorm8()];
        }
      }
    }
  }

  if error_count > 0 {
    log::error!("{error_count} block(s) failed to decode");
  }

  let output = File::create(&args.output)?;
  let mut writer = BufWriter::new(output);
  tga::write_tga(&mut writer, header.xsize as u16, header.ysize as u16, &pixels)?;

  Ok(())
}

fn main() -> ExitCode {
  env_logger::init();
  let args = CliArgs::parse();

  match run(&args) {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      log::error!("{e}");
      ExitCode::FAILURE
    }
  }
}
