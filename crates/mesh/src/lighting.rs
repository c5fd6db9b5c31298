//! Banded lighting: intensity -> bright / medium / dark palette index.
//!
//! The mapping from a polygon's base color to its three shade indices is an
//! explicit table rather than fixed arithmetic, so a palette that does not
//! follow the default layout can describe its own bands, and a base color the
//! table does not know is reported instead of indexing into unrelated colors.

use std::ops::RangeInclusive;

use crate::types::{BRIGHT_THRESHOLD, DARK_BAND_OFFSET, MEDIUM_BAND_OFFSET, MEDIUM_THRESHOLD, PALETTE_SIZE};

/// Which shade a lit face falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Band {
    Bright,
    Medium,
    Dark,
}

impl Band {
    /// Band for a lighting intensity. Intensity is clamped to `[0, 1]` first.
    pub fn for_intensity(intensity: f32) -> Band {
        let i = intensity.clamp(0.0, 1.0);
        if i > BRIGHT_THRESHOLD {
            Band::Bright
        } else if i > MEDIUM_THRESHOLD {
            Band::Medium
        } else {
            Band::Dark
        }
    }
}

/// Palette indices for the three shades of one base color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShadeBands {
    pub bright: u8,
    pub medium: u8,
    pub dark: u8,
}

impl ShadeBands {
    pub fn pick(&self, band: Band) -> u8 {
        match band {
            Band::Bright => self.bright,
            Band::Medium => self.medium,
            Band::Dark => self.dark,
        }
    }
}

/// Base color -> shade indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandTable {
    entries: Box<[Option<ShadeBands>; PALETTE_SIZE]>,
}

impl Default for BandTable {
    /// Bases 1-7 with medium at `+7` and dark at `+14`.
    fn default() -> Self {
        Self::offset_layout(1..=7, MEDIUM_BAND_OFFSET, DARK_BAND_OFFSET)
    }
}

impl BandTable {
    /// Table with no entries; every base color is unshaded.
    pub fn empty() -> Self {
        Self {
            entries: Box::new([None; PALETTE_SIZE]),
        }
    }

    /// Each base in `bases` maps to itself, `base + medium`, `base + dark`.
    ///
    /// Bases whose shades would overflow the palette are left out.
    pub fn offset_layout(bases: RangeInclusive<u8>, medium: u8, dark: u8) -> Self {
        let mut table = Self::empty();
        for base in bases {
            if let (Some(m), Some(d)) = (base.checked_add(medium), base.checked_add(dark)) {
                table.set(
                    base,
                    ShadeBands {
                        bright: base,
                        medium: m,
                        dark: d,
                    },
                );
            }
        }
        table
    }

    pub fn set(&mut self, base: u8, bands: ShadeBands) {
        self.entries[base as usize] = Some(bands);
    }

    pub fn remove(&mut self, base: u8) {
        self.entries[base as usize] = None;
    }

    pub fn get(&self, base: u8) -> Option<ShadeBands> {
        self.entries[base as usize]
    }

    /// Lit palette index for `base` at `intensity`, or `None` if unmapped.
    ///
    /// ```
    /// use indexed_raster_mesh::BandTable;
    ///
    /// let table = BandTable::default();
    /// assert_eq!(table.shade(3, 0.9), Some(3));
    /// assert_eq!(table.shade(3, 0.5), Some(10));
    /// assert_eq!(table.shade(3, 0.1), Some(17));
    /// assert_eq!(table.shade(9, 0.9), None);
    /// ```
    pub fn shade(&self, base: u8, intensity: f32) -> Option<u8> {
        self.get(base).map(|b| b.pick(Band::for_intensity(intensity)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_are_exclusive() {
        assert_eq!(Band::for_intensity(0.67), Band::Medium);
        assert_eq!(Band::for_intensity(0.6701), Band::Bright);
        assert_eq!(Band::for_intensity(0.33), Band::Dark);
        assert_eq!(Band::for_intensity(0.3301), Band::Medium);
    }

    #[test]
    fn out_of_range_intensity_is_clamped() {
        assert_eq!(Band::for_intensity(7.0), Band::Bright);
        assert_eq!(Band::for_intensity(-1.0), Band::Dark);
    }

    #[test]
    fn default_table_covers_seven_bases() {
        let t = BandTable::default();
        assert_eq!(t.get(0), None);
        assert_eq!(
            t.get(7),
            Some(ShadeBands {
                bright: 7,
                medium: 14,
                dark: 21
            })
        );
        assert_eq!(t.get(8), None);
    }

    #[test]
    fn offset_layout_skips_overflowing_bases() {
        let t = BandTable::offset_layout(240..=250, 7, 14);
        assert!(t.get(241).is_some());
        assert!(t.get(242).is_none());
    }

    #[test]
    fn custom_entries_override_layout() {
        let mut t = BandTable::empty();
        t.set(
            40,
            ShadeBands {
                bright: 41,
                medium: 42,
                dark: 43,
            },
        );
        assert_eq!(t.shade(40, 1.0), Some(41));
        t.remove(40);
        assert_eq!(t.shade(40, 1.0), None);
    }
}
