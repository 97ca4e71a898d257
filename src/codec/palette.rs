//! Indexed color tables

use crate::error::{Error, Result};

/// A single palette entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// Unpack from `0x00RRGGBB`
    pub const fn from_u32(rgb: u32) -> Self {
        Rgb {
            r: (rgb >> 16) as u8,
            g: (rgb >> 8) as u8,
            b: rgb as u8,
        }
    }

    /// Pack into `0x00RRGGBB`
    pub const fn to_u32(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }
}

/// Palette of at most 256 RGB entries
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Palette {
    entries: Vec<Rgb>,
}

/// Maximum number of palette entries
pub const MAX_PALETTE_SIZE: usize = 256;

const VGA16: [u32; 16] = [
    0x000000, 0x800000, 0x008000, 0x808000, 0x000080, 0x800080, 0x008080, 0xc0c0c0, 0x808080,
    0xff0000, 0x00ff00, 0xffff00, 0x0000ff, 0xff00ff, 0x00ffff, 0xffffff,
];

impl Palette {
    /// Create a palette from its entries
    pub fn new(entries: Vec<Rgb>) -> Result<Self> {
        if entries.len() > MAX_PALETTE_SIZE {
            return Err(Error::invalid_input(format!(
                "Palette has {} entries, at most {} are allowed",
                entries.len(),
                MAX_PALETTE_SIZE
            )));
        }
        Ok(Palette { entries })
    }

    /// Create a palette from packed `0x00RRGGBB` values
    pub fn from_rgb_values(values: &[u32]) -> Result<Self> {
        Self::new(values.iter().map(|&v| Rgb::from_u32(v)).collect())
    }

    /// Linear gray ramp with `2^depth` entries
    pub fn grayscale(depth: u32) -> Self {
        let size = 1usize << depth.min(8);
        let step = if size > 1 { 255 / (size - 1) } else { 0 };
        let entries = (0..size)
            .map(|i| {
                let v = (i * step) as u8;
                Rgb::new(v, v, v)
            })
            .collect();
        Palette { entries }
    }

    /// The 16 color VGA palette
    pub fn vga16() -> Self {
        Palette {
            entries: VGA16.iter().map(|&v| Rgb::from_u32(v)).collect(),
        }
    }

    /// Number of entries (the map size)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Rgb] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<Rgb> {
        self.entries.get(index).copied()
    }

    /// Color for a pixel index; indices past the map size are black
    pub fn lookup(&self, index: u8) -> Rgb {
        self.get(index as usize).unwrap_or_default()
    }

    /// Exactly `count` entries, truncated or padded with black
    pub fn rgbs(&self, count: usize) -> Vec<Rgb> {
        let mut rgbs: Vec<Rgb> = self.entries.iter().take(count).copied().collect();
        rgbs.resize(count, Rgb::default());
        rgbs
    }
}
