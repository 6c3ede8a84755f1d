//! Crossterm-backed color renderer for the `ColorCells` backend: a
//! maximal-run diff per row ([`crate::diff::RowDiffIter`]) with a lazy
//! palette-to-attribute cache.
//!
//! `crossterm::style::Color::AnsiValue` is the "color pair" handle here — a
//! direct SGR terminal never exhausts a pair table the way curses can, but
//! the cache and the `COLORS`-modulo fallback are kept for terminals that
//! advertise fewer than 256 colors.

use std::collections::HashMap;
use std::io::{self, Write};

use crossterm::style::Color;
use crossterm::{cursor, event, queue, style, terminal};

use crate::diff::RowDiffIter;
use crate::frame::ColorCell;
use crate::pipeline::queue::StopSignal;

pub struct ScreenColorRenderer<W: Write> {
    out: W,
    mirror: Option<Vec<Vec<ColorCell>>>,
    palette: HashMap<u8, Color>,
    term_size: (u16, u16),
    max_colors: u16,
}

impl<W: Write> ScreenColorRenderer<W> {
    pub fn new(mut out: W) -> io::Result<Self> {
        queue!(out, cursor::Hide)?;
        out.flush()?;
        Ok(Self {
            out,
            mirror: None,
            palette: HashMap::new(),
            term_size: (0, 0),
            max_colors: 256,
        })
    }

    fn color_for(palette_cache: &mut HashMap<u8, Color>, max_colors: u16, index: u8) -> Color {
        *palette_cache.entry(index).or_insert_with(|| {
            let slot = if max_colors < 256 {
                index % max_colors.max(1) as u8
            } else {
                index
            };
            Color::AnsiValue(slot)
        })
    }

    pub fn render(&mut self, rows: &[Vec<ColorCell>], stop: &StopSignal) -> io::Result<()> {
        let size = terminal::size()?;

        let Self { out, mirror, palette, term_size, max_colors } = self;

        if size != *term_size {
            queue!(out, terminal::Clear(terminal::ClearType::All))?;
            *term_size = size;
            *mirror = Some(rows.iter().map(|r| vec![ColorCell::default(); r.len()]).collect());
        }

        let mirror_rows = mirror.get_or_insert_with(|| rows.iter().map(|r| vec![ColorCell::default(); r.len()]).collect());

        for (y, row) in rows.iter().enumerate() {
            let Some(prev_row) = mirror_rows.get(y) else { continue };
            if prev_row.len() != row.len() {
                continue; // Mid-stream resize race; mirror catches up next frame.
            }
            for (range, palette_index) in RowDiffIter::new(row, prev_row, |c| c.palette) {
                let color = Self::color_for(palette, *max_colors, palette_index);
                let text: String = row[range.clone()].iter().map(|c| c.glyph).collect();
                queue!(
                    out,
                    cursor::MoveTo(range.start as u16, y as u16),
                    style::SetForegroundColor(color),
                    style::Print(text)
                )?;
            }
        }

        out.flush()?;
        *mirror_rows = rows.to_vec();
        self.poll_quit(stop)?;
        Ok(())
    }

    fn poll_quit(&mut self, stop: &StopSignal) -> io::Result<()> {
        if event::poll(std::time::Duration::from_millis(0))? {
            if let event::Event::Key(key) = event::read()? {
                if key.code == event::KeyCode::Char('q') {
                    stop.set();
                }
            }
        }
        Ok(())
    }

    pub fn shutdown(&mut self) -> io::Result<()> {
        queue!(self.out, style::ResetColor, cursor::Show)?;
        self.out.flush()
    }
}
