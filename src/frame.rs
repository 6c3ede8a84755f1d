//! The three pipeline data shapes: the raw decoded frame, the tagged
//! `AsciiFrame` the converter produces, and the timing-annotated item
//! actually carried on `ascii_queue`.

/// A decoded BGR frame at the source's native resolution. Owned by the
/// extractor until enqueued; a converter worker takes ownership on dequeue
/// and drops it once conversion finishes.
#[derive(Clone)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    /// 3 bytes per pixel, row-major, BGR order.
    pub data: Vec<u8>,
}

impl RawFrame {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), width as usize * height as usize * 3);
        Self { width, height, data }
    }
}

/// One glyph + its xterm-256 palette slot, the cell type for [`AsciiFrame::ColorCells`].
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct ColorCell {
    pub glyph: char,
    pub palette: u8,
}

/// The converter's output shape, chosen once at startup by the selected
/// renderer backend. Every item on `ascii_queue` carries the same variant.
#[derive(Clone)]
pub enum AsciiFrame {
    /// One line per row, newline-joined; all rows the same visible width.
    PlainText(Vec<String>),
    /// Same shape as `PlainText`, but each character carries a 24-bit (or
    /// xterm-256) SGR color introducer and trailing reset.
    AnsiText(Vec<String>),
    /// Dense row-major grid of (glyph, palette index).
    ColorCells(Vec<Vec<ColorCell>>),
}

impl AsciiFrame {
    pub fn row_count(&self) -> usize {
        match self {
            AsciiFrame::PlainText(rows) | AsciiFrame::AnsiText(rows) => rows.len(),
            AsciiFrame::ColorCells(rows) => rows.len(),
        }
    }
}

/// An [`AsciiFrame`] paired with the mean conversion latency (ms) of the
/// batch that produced it. The latency is logging-only.
pub struct AsciiItem {
    pub frame: AsciiFrame,
    pub conversion_ms: f64,
}
