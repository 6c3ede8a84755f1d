//! Foreground color introducers for the `AnsiText` converter variant.
//!
//! Two choices are reachable from the CLI: 24-bit truecolor (the default)
//! and xterm-256 (`--ansi256`). Both are SGR foreground sequences; the
//! `ColorCells` variant does not use this trait — its palette math is the
//! exact 6×6×6 cube in [`crate::charset::cube_index`], not the
//! nearest-match quantization `ansi_colours` performs here.

use std::io::{self, Write};

const RESET: &[u8] = b"\x1b[0m";

/// A quantized pixel color that knows how to introduce itself in an SGR
/// sequence. `write_cell` is the one entry point callers use — it owns the
/// introducer/glyph/reset shape so no caller assembles that sequence by hand.
pub trait Colorize: Sized {
    fn quantize(rgb: [u8; 3]) -> Self;
    fn sgr_foreground(&self) -> String;

    /// Writes one sampled pixel's ANSI-text cell: `<introducer><glyph><reset>`.
    fn write_cell(out: &mut impl Write, rgb: [u8; 3], glyph: u8) -> io::Result<()> {
        let color = Self::quantize(rgb);
        out.write_all(color.sgr_foreground().as_bytes())?;
        out.write_all(&[glyph])?;
        out.write_all(RESET)
    }
}

/// 24-bit truecolor, kept as the three sampled channels rather than an
/// opaque RGB triple — there is no quantization step to hide behind a
/// constructor here, unlike [`Xterm256`].
pub struct Truecolor {
    r: u8,
    g: u8,
    b: u8,
}

impl Colorize for Truecolor {
    fn quantize(rgb: [u8; 3]) -> Self {
        Self { r: rgb[0], g: rgb[1], b: rgb[2] }
    }

    fn sgr_foreground(&self) -> String {
        format!("\x1b[38;2;{};{};{}m", self.r, self.g, self.b)
    }
}

/// A nearest-match slot in the terminal's 256-color palette, found via
/// `ansi_colours`' perceptual lookup rather than the exact 6×6×6 cube
/// formula `crate::charset::cube_index` uses for the `ColorCells` backend.
pub struct Xterm256 {
    code: u8,
}

impl Colorize for Xterm256 {
    fn quantize(rgb: [u8; 3]) -> Self {
        Self { code: ansi_colours::ansi256_from_rgb(rgb) }
    }

    fn sgr_foreground(&self) -> String {
        format!("\x1b[38;5;{}m", self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truecolor_escape_has_no_padding() {
        let mut buf = Vec::new();
        Truecolor::write_cell(&mut buf, [1, 2, 3], b'@').unwrap();
        assert_eq!(&buf, b"\x1b[38;2;1;2;3m@\x1b[0m");
    }

    #[test]
    fn xterm256_escape_uses_the_five_field_introducer() {
        let mut buf = Vec::new();
        Xterm256::write_cell(&mut buf, [0, 0, 0], b'.').unwrap();
        assert!(buf.starts_with(b"\x1b[38;5;"));
        assert!(buf.ends_with(b".\x1b[0m"));
    }
}
