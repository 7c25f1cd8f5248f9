//! Clipboard port. The terminal implementation uses the OSC 52 escape, which
//! most modern terminal emulators forward to the system clipboard.

use std::io::{self, Write};

use base64::{Engine as _, engine::general_purpose::STANDARD as B64};

/// Payloads above this many encoded bytes are refused; many terminals
/// silently truncate larger OSC 52 sequences.
pub const OSC52_MAX_ENCODED: usize = 74_994;

pub trait Clipboard {
  fn set_text(&mut self, text: &str) -> io::Result<()>;
}

/// Writes OSC 52 sequences to `W` (stdout in the binary).
pub struct Osc52<W> {
  out: W,
}

impl<W: Write> Osc52<W> {
  pub fn new(out: W) -> Self { Self { out } }

  pub fn into_inner(self) -> W { self.out }
}

impl<W: Write> Clipboard for Osc52<W> {
  fn set_text(&mut self, text: &str) -> io::Result<()> {
    let encoded = B64.encode(text);
    if encoded.len() > OSC52_MAX_ENCODED {
      return Err(io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("{} bytes exceed the OSC 52 limit", encoded.len()),
      ));
    }
    write!(self.out, "\x1b]52;c;{encoded}\x07")?;
    self.out.flush()
  }
}

/// A clipboard that always fails; used when stdout is not a terminal.
pub struct Unavailable;

impl Clipboard for Unavailable {
  fn set_text(&mut self, _text: &str) -> io::Result<()> {
    Err(io::Error::new(io::ErrorKind::Unsupported, "no clipboard available"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn osc52_sequence() {
    let mut clip = Osc52::new(Vec::new());
    clip.set_text("乾").unwrap();
    let out = String::from_utf8(clip.into_inner()).unwrap();
    assert_eq!(out, format!("\x1b]52;c;{}\x07", B64.encode("乾")));
  }

  #[test]
  fn oversized_payload_is_refused() {
    let mut clip = Osc52::new(Vec::new());
    let big = "x".repeat(OSC52_MAX_ENCODED);
    assert!(clip.set_text(&big).is_err());
    assert!(clip.into_inner().is_empty());
  }
}
