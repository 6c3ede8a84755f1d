//! The calibration screen: a border-and-cross frame shown until the
//! operator confirms their terminal size, then a full reset.
//!
//! The height uses its own `0.45` constant, left unreconciled with the
//! `0.5` the main conversion path uses everywhere else — an intentional
//! quirk of calibration sizing, not a bug.

use std::io::{self, Write};

const BORDER: char = '#';
const CROSS: char = '+';
const SOLID: char = '█';

pub fn generate_calibration_frame(width: usize, height: usize) -> Vec<String> {
    let width = width.max(1);
    let height = height.max(1);
    let mut grid = vec![vec![SOLID; width]; height];

    for x in 0..width {
        grid[0][x] = BORDER;
        grid[height - 1][x] = BORDER;
    }
    for row in grid.iter_mut() {
        row[0] = BORDER;
        row[width - 1] = BORDER;
    }

    let center_row = height / 2;
    let center_col = width / 2;
    for cell in grid[center_row].iter_mut() {
        *cell = CROSS;
    }
    for row in grid.iter_mut() {
        row[center_col] = CROSS;
    }

    grid.into_iter().map(|row| row.into_iter().collect()).collect()
}

/// `height = floor(aspect_ratio * width * 0.45)`, the calibration-only
/// sizing constant.
pub fn calibration_height(raw_width: u32, raw_height: u32, ascii_width: usize) -> usize {
    let ratio = raw_height as f64 / raw_width as f64;
    ((ratio * ascii_width as f64 * 0.45).floor() as usize).max(1)
}

/// Displays the calibration frame and blocks until the operator presses
/// Enter, then fully resets the terminal (`ESC c`).
pub fn show_calibration(out: &mut impl Write, width: usize, height: usize) -> io::Result<()> {
    let frame = generate_calibration_frame(width, height);

    write!(out, "\x1b[?25l\x1b[2J\x1b[H")?;
    for line in &frame {
        writeln!(out, "{line}")?;
    }
    writeln!(out, "\n[INFO] Resize the terminal if needed, then press ENTER to begin...")?;
    out.flush()?;

    let mut discard = String::new();
    io::stdin().read_line(&mut discard)?;

    write!(out, "\x1bc")?; // Full terminal reset.
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn border_wraps_every_edge() {
        let frame = generate_calibration_frame(5, 4);
        assert!(frame[0].chars().all(|c| c == BORDER));
        assert!(frame[3].chars().all(|c| c == BORDER));
        assert!(frame.iter().all(|row| row.starts_with(BORDER) && row.ends_with(BORDER)));
    }

    #[test]
    fn cross_passes_through_the_center() {
        let frame = generate_calibration_frame(5, 5);
        assert_eq!(frame[2].chars().nth(2), Some(CROSS));
        assert!(frame[1].chars().nth(2) == Some(CROSS));
    }

    #[test]
    fn calibration_height_uses_point_four_five() {
        assert_eq!(calibration_height(4, 2, 100), ((0.5f64 * 100.0 * 0.45).floor() as usize));
    }
}
