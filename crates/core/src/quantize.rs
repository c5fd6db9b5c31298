//! Median-cut palette quantization and nearest-color lookup.
//!
//! The quantizer starts with one box holding every distinct source color and
//! repeatedly splits the box with the widest total range along its widest
//! channel, until 256 boxes exist or every box holds a single color. Alpha is
//! a channel like the others, so colors that differ only in alpha still end up
//! in separate boxes. Each box contributes the floor of its members'
//! per-channel mean.
//!
//! Inputs are de-duplicated first, so any source with at most 256 distinct
//! colors is reproduced exactly.

use crate::palette::Palette;
use crate::types::{Color, PALETTE_SIZE};

/// Result of a quantization pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quantized {
    /// Full 256-entry palette; entries past `used` are opaque black.
    pub palette: Palette,
    /// Number of entries produced by the median cut.
    pub used: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Channel {
    R,
    G,
    B,
    A,
}

impl Channel {
    const ALL: [Channel; 4] = [Channel::R, Channel::G, Channel::B, Channel::A];

    fn of(self, c: &Color) -> u8 {
        match self {
            Channel::R => c.r,
            Channel::G => c.g,
            Channel::B => c.b,
            Channel::A => c.a,
        }
    }
}

#[derive(Debug, Clone)]
struct ColorBox {
    colors: Vec<Color>,
}

impl ColorBox {
    /// Per-channel `max - min`, in `Channel::ALL` order.
    fn ranges(&self) -> [u8; 4] {
        if self.colors.is_empty() {
            return [0; 4];
        }
        Channel::ALL.map(|ch| {
            let (lo, hi) = self
                .colors
                .iter()
                .map(|c| ch.of(c))
                .fold((u8::MAX, 0u8), |(lo, hi), v| (lo.min(v), hi.max(v)));
            hi - lo
        })
    }

    fn total_range(&self) -> u32 {
        self.ranges().iter().map(|&r| r as u32).sum()
    }

    /// Widest channel; ties prefer R, then G, then B, then A.
    fn widest_channel(&self) -> Channel {
        let ranges = self.ranges();
        let mut best = 0;
        for (i, &r) in ranges.iter().enumerate().skip(1) {
            if r > ranges[best] {
                best = i;
            }
        }
        Channel::ALL[best]
    }

    /// Sort along the widest channel and move the upper half into a new box.
    fn split(&mut self) -> ColorBox {
        let channel = self.widest_channel();
        self.colors.sort_by_key(|c| channel.of(c));
        let mid = self.colors.len() / 2;
        ColorBox {
            colors: self.colors.split_off(mid),
        }
    }

    fn average(&self) -> Color {
        if self.colors.is_empty() {
            return Color::BLACK;
        }
        let mut sum = [0u64; 4];
        for c in &self.colors {
            sum[0] += c.r as u64;
            sum[1] += c.g as u64;
            sum[2] += c.b as u64;
            sum[3] += c.a as u64;
        }
        let n = self.colors.len() as u64;
        Color::rgba(
            (sum[0] / n) as u8,
            (sum[1] / n) as u8,
            (sum[2] / n) as u8,
            (sum[3] / n) as u8,
        )
    }
}

/// Reduce `colors` to at most `max_colors` (capped at 256) representatives.
///
/// ```
/// use indexed_raster_core::quantize::median_cut;
/// use indexed_raster_core::types::Color;
///
/// let q = median_cut(&[Color::rgb(255, 0, 0), Color::rgb(0, 0, 255)], 256);
/// assert_eq!(q.used, 2);
/// assert_eq!(q.palette.get(2), Color::BLACK);
/// ```
pub fn median_cut(colors: &[Color], max_colors: usize) -> Quantized {
    let target = max_colors.clamp(1, PALETTE_SIZE);
    let mut palette = Palette::filled(Color::BLACK);

    let mut unique = colors.to_vec();
    unique.sort_unstable();
    unique.dedup();

    if unique.is_empty() {
        return Quantized { palette, used: 0 };
    }

    let mut boxes = vec![ColorBox { colors: unique }];
    while boxes.len() < target {
        let mut widest = 0usize;
        let mut widest_range = 0u32;
        for (i, b) in boxes.iter().enumerate() {
            let range = b.total_range();
            if range > widest_range {
                widest_range = range;
                widest = i;
            }
        }
        if widest_range == 0 {
            break;
        }
        let upper = boxes[widest].split();
        boxes.push(upper);
    }

    for (i, b) in boxes.iter().enumerate() {
        palette.set(i as u8, b.average());
    }

    tracing::trace!(
        sources = colors.len(),
        used = boxes.len(),
        "median cut finished"
    );

    Quantized {
        palette,
        used: boxes.len(),
    }
}

/// Index of the entry closest to `color` by squared RGB distance.
///
/// Entries at the same RGB distance are told apart by alpha distance; any
/// remaining tie resolves to the lowest index.
#[inline]
pub fn nearest_index(palette: &Palette, color: Color) -> u8 {
    let mut best = 0usize;
    let mut best_key = (u32::MAX, u8::MAX);
    for (i, entry) in palette.colors().iter().enumerate() {
        let key = (color.distance_sq(*entry), color.a.abs_diff(entry.a));
        if key < best_key {
            best_key = key;
            best = i;
            if key == (0, 0) {
                break;
            }
        }
    }
    best as u8
}
