//! TerminalRenderer: flushes composited frames to a real terminal.
//!
//! Almost every cell is a half block whose upper and lower colors change
//! independently, so the encoder keeps a [`Pen`] with the last emitted
//! foreground, background and weight and only writes the parts that differ.
//! Rows are addressed with explicit cursor moves; nothing relies on line wrap.

use std::io::{self, Write};
use std::ops::Range;

use anyhow::Result;

use crossterm::{
    cursor,
    style::{
        Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
    },
    terminal, QueueableCommand,
};

use crate::compositor::Compositor;
use crate::fb::{Cell, CellStyle, FrameBuffer, Rgb};

const STATUS_STYLE: CellStyle = CellStyle {
    fg: Rgb::new(230, 230, 230),
    bg: Rgb::new(20, 20, 40),
    bold: true,
};

/// What one flush wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlushStats {
    /// The screen was cleared and every row rewritten.
    pub full: bool,
    /// Changed spans emitted.
    pub runs: usize,
    /// Bytes queued for the terminal.
    pub bytes: usize,
}

pub struct TerminalRenderer {
    stdout: io::Stdout,
    /// Cells currently on screen; `None` forces a full redraw.
    shown: Option<FrameBuffer>,
    staging: FrameBuffer,
    bytes: Vec<u8>,
    last_flush: FlushStats,
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self {
            stdout: io::stdout(),
            shown: None,
            staging: FrameBuffer::new(0, 0),
            bytes: Vec::with_capacity(64 * 1024),
            last_flush: FlushStats::default(),
        }
    }

    /// Switch to raw mode on the alternate screen.
    pub fn enter(&mut self) -> Result<()> {
        terminal::enable_raw_mode()?;
        crossterm::execute!(
            self.stdout,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            terminal::DisableLineWrap
        )?;
        self.shown = None;
        Ok(())
    }

    /// Restore the terminal. Safe to call after a failed frame.
    pub fn exit(&mut self) -> Result<()> {
        crossterm::execute!(
            self.stdout,
            ResetColor,
            SetAttribute(Attribute::Reset),
            terminal::EnableLineWrap,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()?;
        self.shown = None;
        Ok(())
    }

    /// Forget what is on screen; the next frame is drawn in full.
    pub fn invalidate(&mut self) {
        self.shown = None;
    }

    pub fn last_flush(&self) -> FlushStats {
        self.last_flush
    }

    /// Fold the compositor's canvas into cells, overlay `status` on the top
    /// row and write whatever changed since the previous frame.
    pub fn present(&mut self, compositor: &mut Compositor, status: Option<&str>) -> Result<FlushStats> {
        compositor.end_frame(&mut self.staging);
        if let Some(text) = status {
            self.staging.put_str(0, 0, text, STATUS_STYLE);
        }

        self.bytes.clear();
        let stats = encode_frame(self.shown.as_ref(), &self.staging, &mut self.bytes)?;
        if stats.bytes > 0 {
            self.stdout.write_all(&self.bytes)?;
            self.stdout.flush()?;
        }
        if stats.full {
            tracing::debug!(
                cols = self.staging.width(),
                rows = self.staging.height(),
                bytes = stats.bytes,
                "full terminal redraw"
            );
        }

        // The staged frame is now on screen; recycle the old one as staging.
        let drawn = std::mem::replace(&mut self.staging, FrameBuffer::new(0, 0));
        if let Some(old) = self.shown.replace(drawn) {
            self.staging = old;
        }
        self.last_flush = stats;
        Ok(stats)
    }
}

/// Encode `next` into `out` as terminal commands.
///
/// Without a same-sized `prev` the screen is cleared and every row is
/// written; otherwise only spans whose cells differ from `prev` are.
pub fn encode_frame(prev: Option<&FrameBuffer>, next: &FrameBuffer, out: &mut Vec<u8>) -> Result<FlushStats> {
    let start = out.len();
    let prev = prev.filter(|p| p.width() == next.width() && p.height() == next.height());
    let full = prev.is_none();
    if full {
        out.queue(terminal::Clear(terminal::ClearType::All))?;
    }

    let width = next.width() as usize;
    let mut pen = Pen::default();
    let mut runs = 0;
    if width > 0 {
        for (y, row) in next.cells().chunks(width).enumerate() {
            let old = prev.map(|p| &p.cells()[y * width..(y + 1) * width]);
            for span in changed_spans(old, row) {
                out.queue(cursor::MoveTo(span.start as u16, y as u16))?;
                for cell in &row[span] {
                    pen.apply(out, cell.style)?;
                    out.queue(Print(cell.ch))?;
                }
                runs += 1;
            }
        }
    }

    if pen.is_inked() {
        out.queue(ResetColor)?;
        out.queue(SetAttribute(Attribute::Reset))?;
    }
    Ok(FlushStats {
        full,
        runs,
        bytes: out.len() - start,
    })
}

/// Column ranges of `row` that differ from `old`; the whole row when there is no `old`.
fn changed_spans(old: Option<&[Cell]>, row: &[Cell]) -> Vec<Range<usize>> {
    let Some(old) = old else {
        return if row.is_empty() { Vec::new() } else { vec![0..row.len()] };
    };

    let mut spans = Vec::new();
    let mut open = None;
    for (x, (a, b)) in old.iter().zip(row).enumerate() {
        match (a == b, open) {
            (false, None) => open = Some(x),
            (true, Some(begin)) => {
                spans.push(begin..x);
                open = None;
            }
            _ => {}
        }
    }
    if let Some(begin) = open {
        spans.push(begin..row.len());
    }
    spans
}

/// Terminal style state as last emitted.
#[derive(Debug, Default)]
struct Pen {
    fg: Option<Rgb>,
    bg: Option<Rgb>,
    bold: bool,
}

impl Pen {
    fn apply(&mut self, out: &mut Vec<u8>, style: CellStyle) -> Result<()> {
        if self.bold != style.bold {
            let attr = if style.bold {
                Attribute::Bold
            } else {
                Attribute::NormalIntensity
            };
            out.queue(SetAttribute(attr))?;
            self.bold = style.bold;
        }
        if self.fg != Some(style.fg) {
            out.queue(SetForegroundColor(term_color(style.fg)))?;
            self.fg = Some(style.fg);
        }
        if self.bg != Some(style.bg) {
            out.queue(SetBackgroundColor(term_color(style.bg)))?;
            self.bg = Some(style.bg);
        }
        Ok(())
    }

    fn is_inked(&self) -> bool {
        self.fg.is_some() || self.bg.is_some() || self.bold
    }
}

fn term_color(rgb: Rgb) -> Color {
    Color::Rgb {
        r: rgb.r,
        g: rgb.g,
        b: rgb.b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(v: u8) -> Cell {
        Cell::half_block(Rgb::new(v, v, v), Rgb::default())
    }

    #[test]
    fn adjacent_changes_merge_into_one_span() {
        let a = FrameBuffer::new(5, 1);
        let mut b = FrameBuffer::new(5, 1);
        for x in 1..=3 {
            b.set(x, 0, block(9));
        }
        assert_eq!(changed_spans(Some(a.cells()), b.cells()), vec![1..4]);
    }

    #[test]
    fn span_reaching_row_end_is_closed() {
        let a = FrameBuffer::new(4, 1);
        let mut b = FrameBuffer::new(4, 1);
        b.set(0, 0, block(1));
        b.set(3, 0, block(1));
        assert_eq!(changed_spans(Some(a.cells()), b.cells()), vec![0..1, 3..4]);
    }

    #[test]
    fn first_frame_is_full_and_covers_every_row() {
        let next = FrameBuffer::new(3, 2);
        let mut out = Vec::new();
        let stats = encode_frame(None, &next, &mut out).unwrap();
        assert!(stats.full);
        assert_eq!(stats.runs, 2);
        assert_eq!(stats.bytes, out.len());
    }

    #[test]
    fn resized_frame_is_redrawn_in_full() {
        let prev = FrameBuffer::new(2, 1);
        let next = FrameBuffer::new(3, 2);
        let mut out = Vec::new();
        let stats = encode_frame(Some(&prev), &next, &mut out).unwrap();
        assert!(stats.full);
        assert_eq!(stats.runs, 2);
    }

    #[test]
    fn identical_frames_write_nothing() {
        let a = FrameBuffer::new(4, 2);
        let mut out = Vec::new();
        let stats = encode_frame(Some(&a), &a.clone(), &mut out).unwrap();
        assert_eq!(stats, FlushStats::default());
        assert!(out.is_empty());
    }

    #[test]
    fn pen_skips_unchanged_colors() {
        let prev = FrameBuffer::new(3, 1);
        let mut next = FrameBuffer::new(3, 1);
        let fg = Rgb::new(200, 10, 10);
        for (x, bg) in [(0, 1u8), (1, 2), (2, 3)] {
            next.set(x, 0, Cell::half_block(fg, Rgb::new(bg, bg, bg)));
        }
        let mut out = Vec::new();
        let stats = encode_frame(Some(&prev), &next, &mut out).unwrap();
        assert_eq!(stats.runs, 1);

        let text = String::from_utf8_lossy(&out);
        assert_eq!(text.matches("38;2;200;10;10").count(), 1);
        assert_eq!(text.matches("48;2;").count(), 3);
        assert_eq!(text.matches('▀').count(), 3);
    }
}
