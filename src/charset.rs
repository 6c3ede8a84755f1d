//! Luminance→glyph ramp and the xterm-256 6×6×6 color cube.
//!
//! Both tables are read-only and shared by reference across every converter
//! worker; there is nothing here that needs locking.

/// Glyph ramp ordered lightest to darkest, 67 characters wide.
pub const ASCII_CHARS: &[u8; 67] =
    br#" .'`^",:;Il!i~+_-?][}{1)(|\/tfjrxnuvczXYUJCLQ0OZmwqpdbkhao*#MW&8%B@"#;

/// Maps a 0..=255 luminance value to a glyph from [`ASCII_CHARS`].
///
/// `idx = luma * (len - 1) / 255`, truncated, so index 255 always lands on
/// the last (darkest) glyph.
pub fn glyph_for_luma(luma: u8) -> u8 {
    let idx = (luma as u32 * (ASCII_CHARS.len() as u32 - 1)) / 255;
    ASCII_CHARS[idx as usize]
}

/// Mean of the three channels: `(R+G+B)/3`, integer division, no rounding.
pub fn luminance(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 + g as u32 + b as u32) / 3) as u8
}

/// xterm-256 6×6×6 cube index for an RGB triple:
/// `16 + 36·r6 + 6·g6 + b6` with each channel quantized to `[0,5]` via
/// `(c * 6) / 256` (floor).
pub fn cube_index(r: u8, g: u8, b: u8) -> u8 {
    let q = |c: u8| (c as u32 * 6) / 256;
    (16 + 36 * q(r) + 6 * q(g) + q(b)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramp_has_sixty_seven_glyphs() {
        assert_eq!(ASCII_CHARS.len(), 67);
    }

    #[test]
    fn space_is_lightest() {
        assert_eq!(ASCII_CHARS[0], b' ');
    }

    #[test]
    fn solid_gray_128_maps_through_the_formulas() {
        // idx = floor(128 * 66 / 255) = 33; cube = 16 + 36*3 + 6*3 + 3 = 145.
        let luma = luminance(128, 128, 128);
        assert_eq!(luma, 128);
        assert_eq!(glyph_for_luma(luma), ASCII_CHARS[33]);
        assert_eq!(cube_index(128, 128, 128), 145);
    }

    #[test]
    fn cube_index_stays_in_range() {
        for r in (0..=255u8).step_by(17) {
            for g in (0..=255u8).step_by(17) {
                for b in (0..=255u8).step_by(17) {
                    let idx = cube_index(r, g, b);
                    assert!((16..=231).contains(&idx));
                }
            }
        }
    }

    #[test]
    fn checkerboard_scenario() {
        assert_eq!(cube_index(255, 0, 0), 196);
        assert_eq!(cube_index(0, 0, 255), 21);
    }
}
