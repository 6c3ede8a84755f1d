//! Crossterm-backed monochrome renderer for the `PlainText` backend:
//! per-row character-level diffing against a cell-addressable back buffer,
//! with a clear-and-redraw fallback when a row changed too much for a
//! targeted write to be worthwhile.

use std::io::{self, Write};

use crossterm::{cursor, event, queue, style, terminal};

use crate::pipeline::queue::StopSignal;

pub struct ScreenMonoRenderer<W: Write> {
    out: W,
    mirror: Option<Vec<String>>,
}

impl<W: Write> ScreenMonoRenderer<W> {
    pub fn new(mut out: W) -> io::Result<Self> {
        queue!(out, cursor::Hide)?;
        out.flush()?;
        Ok(Self { out, mirror: None })
    }

    /// Blits one frame and polls the keyboard once for `q`, setting `stop`
    /// if it was pressed. Resize does not clear — crossterm clips writes
    /// to the current terminal bounds on its own.
    pub fn render(&mut self, lines: &[String], stop: &StopSignal) -> io::Result<()> {
        let (width, _height) = terminal::size()?;
        let clip = width.saturating_sub(1).max(1) as usize;

        let row_count = lines.len().max(self.mirror.as_ref().map_or(0, Vec::len));
        for row in 0..row_count {
            let new_line = lines.get(row).map(String::as_str).unwrap_or("");
            let old_line = self
                .mirror
                .as_ref()
                .and_then(|m| m.get(row))
                .map(String::as_str)
                .unwrap_or("");
            if new_line == old_line {
                continue;
            }
            self.update_row(row as u16, new_line, old_line, clip)?;
        }

        self.out.flush()?;
        self.mirror = Some(lines.to_vec());
        self.poll_quit(stop)?;
        Ok(())
    }

    fn update_row(&mut self, row: u16, new_line: &str, old_line: &str, clip: usize) -> io::Result<()> {
        let new_chars: Vec<char> = new_line.chars().collect();
        let old_chars: Vec<char> = old_line.chars().collect();
        let common = new_chars.len().min(old_chars.len());

        let mut start = 0;
        while start < common && new_chars[start] == old_chars[start] {
            start += 1;
        }
        let mut end = common.saturating_sub(1);
        while end > start && new_chars[end] == old_chars[end] {
            end -= 1;
        }

        let delta = (new_chars.len() as isize - old_chars.len() as isize).unsigned_abs();

        if new_chars.len() > 0 && delta > new_chars.len() / 2 {
            let redraw: String = new_chars.iter().take(clip).collect();
            queue!(self.out, cursor::MoveTo(0, row), terminal::Clear(terminal::ClearType::UntilNewLine))?;
            queue!(self.out, style::Print(redraw))?;
            return Ok(());
        }

        let write_end = end.min(new_chars.len().saturating_sub(1)).min(clip.saturating_sub(1));
        if start <= write_end && !new_chars.is_empty() {
            let span: String = new_chars[start..=write_end].iter().collect();
            queue!(self.out, cursor::MoveTo(start as u16, row), style::Print(span))?;
        }

        if new_chars.len() > old_chars.len() {
            let tail_start = old_chars.len().max(start).min(clip);
            if tail_start < new_chars.len() {
                let tail: String = new_chars[tail_start..new_chars.len().min(clip)].iter().collect();
                queue!(self.out, cursor::MoveTo(tail_start as u16, row), style::Print(tail))?;
            }
        } else if old_chars.len() > new_chars.len() {
            let pad_start = new_chars.len().min(clip);
            let pad_len = (old_chars.len() - new_chars.len()).min(clip.saturating_sub(pad_start));
            if pad_len > 0 {
                queue!(self.out, cursor::MoveTo(pad_start as u16, row), style::Print(" ".repeat(pad_len)))?;
            }
        }

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
        queue!(self.out, cursor::Show)?;
        self.out.flush()
    }
}
