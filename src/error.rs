use std::fmt;

/// Outcome of decoding a single 128-bit block. All variants other than `Ok`
/// still leave the output buffer filled with the error colour — the
/// decoder never aborts, and a non-ok result is purely diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeError {
  Ok,
  ReservedBlockMode,
  IllegalEncoding,
  WeightBitsOutOfRange,
  TooManyPartitionsForDualPlane,
  CemOverflow,
}

impl DecodeError {
  pub fn is_ok(self) -> bool {
    self == DecodeError::Ok
  }
}

impl fmt::Display for DecodeError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let msg = match self {
      DecodeError::Ok => "ok",
      DecodeError::ReservedBlockMode => "reserved block mode",
      DecodeError::IllegalEncoding => "illegal encoding",
      DecodeError::WeightBitsOutOfRange => "weight bits out of range",
      DecodeError::TooManyPartitionsForDualPlane => "too many partitions for dual plane",
      DecodeError::CemOverflow => "colour endpoint mode overflow",
    };
    f.write_str(msg)
  }
}
