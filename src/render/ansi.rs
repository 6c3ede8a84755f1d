//! ANSI direct-write renderer for the `PlainText`/`AnsiText` backends:
//! line-level diffing, writing only the lines that changed.
//!
//! `HideCursor` hides the cursor on construction and restores it on drop,
//! covering every exit path including a panic unwind. The diff rule is
//! simple by design: a line is dirty if it differs at all from the mirror,
//! no character-level patching within a line.

use std::io::{self, Write};
use std::ops::{Deref, DerefMut};

const HIDE_CURSOR: &[u8] = b"\x1b[?25l";
const SHOW_CURSOR: &[u8] = b"\x1b[?25h";
const CLEAR_AND_HOME: &[u8] = b"\x1b[2J\x1b[H";

/// Hides the cursor on construction, shows it again on drop — so every
/// exit path (including a panic unwind) restores terminal state.
struct HideCursor<W: Write>(W);

impl<W: Write> HideCursor<W> {
    fn new(mut writer: W) -> Self {
        let _ = writer.write_all(HIDE_CURSOR);
        Self(writer)
    }

    fn show(&mut self) -> io::Result<()> {
        self.0.write_all(SHOW_CURSOR)
    }
}

impl<W: Write> Drop for HideCursor<W> {
    fn drop(&mut self) {
        let _ = self.show();
    }
}

impl<W: Write> Deref for HideCursor<W> {
    type Target = W;
    fn deref(&self) -> &W {
        &self.0
    }
}

impl<W: Write> DerefMut for HideCursor<W> {
    fn deref_mut(&mut self) -> &mut W {
        &mut self.0
    }
}

pub struct AnsiRenderer<W: Write> {
    out: HideCursor<W>,
    mirror: Option<Vec<String>>,
    term_size: (u16, u16),
}

impl<W: Write> AnsiRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: HideCursor::new(out),
            mirror: None,
            term_size: (0, 0),
        }
    }

    /// Blits one frame. `lines` must already be the frame's rows (escapes
    /// included, for the `AnsiText` variant — they're part of the line's
    /// character sequence as far as the diff is concerned).
    pub fn render(&mut self, lines: &[String]) -> io::Result<()> {
        let current_size = crossterm::terminal::size().unwrap_or(self.term_size);
        let mut buf = Vec::new();

        if current_size != self.term_size {
            buf.extend_from_slice(CLEAR_AND_HOME);
            self.mirror = None;
            self.term_size = current_size;
        }

        match &self.mirror {
            None => {
                for line in lines {
                    buf.extend_from_slice(line.as_bytes());
                    buf.push(b'\n');
                }
            }
            Some(prev) => {
                for i in changed_line_indices(lines, prev) {
                    let mut new_line = lines.get(i).cloned().unwrap_or_default();
                    if let Some(old_line) = prev.get(i) {
                        let (new_len, old_len) = (new_line.chars().count(), old_line.chars().count());
                        if new_len < old_len {
                            new_line.push_str(&" ".repeat(old_len - new_len));
                        }
                    }
                    write!(buf, "\x1b[{};1H", i + 1)?;
                    buf.extend_from_slice(new_line.as_bytes());
                }
            }
        }

        self.out.write_all(&buf)?;
        self.out.flush()?;
        self.mirror = Some(lines.to_vec());
        Ok(())
    }

    /// Scrolls the last frame fully out of view — enough newlines to clear
    /// its row count, falling back to the terminal's current row count if no
    /// frame was ever drawn — then restores the cursor. Safe to call on
    /// every exit path; the `Drop` impl on `HideCursor` covers the rest.
    pub fn shutdown(&mut self) -> io::Result<()> {
        let rows = self
            .mirror
            .as_ref()
            .map(Vec::len)
            .filter(|&n| n > 0)
            .or_else(|| crossterm::terminal::size().ok().map(|(_, h)| h as usize))
            .unwrap_or(1);
        self.out.write_all("\n".repeat(rows).as_bytes())?;
        self.out.show()
    }
}

fn changed_line_indices(new: &[String], old: &[String]) -> Vec<usize> {
    let max_lines = new.len().max(old.len());
    (0..max_lines)
        .filter(|&i| {
            let a = new.get(i).map(String::as_str).unwrap_or("");
            let b = old.get(i).map(String::as_str).unwrap_or("");
            a != b
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_frames_have_no_changed_lines() {
        let a = vec!["abc".to_string(), "def".to_string()];
        assert!(changed_line_indices(&a, &a.clone()).is_empty());
    }

    #[test]
    fn single_character_change_flags_only_that_row() {
        let old = vec!["aaa".to_string(), "bbb".to_string()];
        let new = vec!["aaa".to_string(), "bXb".to_string()];
        assert_eq!(changed_line_indices(&new, &old), vec![1]);
    }

    #[test]
    fn shrinking_row_count_flags_the_dropped_rows() {
        let old = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let new = vec!["a".to_string()];
        assert_eq!(changed_line_indices(&new, &old), vec![1, 2]);
    }
}
