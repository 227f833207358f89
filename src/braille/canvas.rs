/// Braille dot canvas used for outlines drawn over the filled cells.
/// Each character cell holds a 2x4 dot grid (U+2800 to U+28FF).
pub struct BrailleCanvas {
    width: usize,  // Characters
    height: usize, // Characters
    cells: Vec<u8>,
}

/// Dot bit for (x % 2, y % 4)
const DOT_BITS: [[u8; 4]; 2] = [[0x01, 0x02, 0x04, 0x40], [0x08, 0x10, 0x20, 0x80]];

impl BrailleCanvas {
    /// Effective dot resolution: width*2 x height*4
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0u8; width * height],
        }
    }

    pub fn set_pixel(&mut self, x: usize, y: usize) {
        let cx = x / 2;
        let cy = y / 4;

        if cx >= self.width || cy >= self.height {
            return;
        }

        self.cells[cy * self.width + cx] |= DOT_BITS[x % 2][y % 4];
    }

    /// Set a pixel using signed coordinates (ignores negative values)
    pub fn set_pixel_signed(&mut self, x: i32, y: i32) {
        if x >= 0 && y >= 0 {
            self.set_pixel(x as usize, y as usize);
        }
    }

    /// Glyph at a character cell, `None` when no dot is set
    pub fn glyph(&self, col: usize, row: usize) -> Option<char> {
        if col >= self.width || row >= self.height {
            return None;
        }
        match self.cells[row * self.width + col] {
            0 => None,
            bits => char::from_u32(0x2800 + bits as u32),
        }
    }

    /// Non-empty cells as (column, row, glyph)
    pub fn glyphs(&self) -> impl Iterator<Item = (usize, usize, char)> + '_ {
        (0..self.height).flat_map(move |row| {
            (0..self.width).filter_map(move |col| self.glyph(col, row).map(|ch| (col, row, ch)))
        })
    }

    #[cfg(test)]
    pub fn to_string(&self) -> String {
        (0..self.height)
            .map(|row| {
                (0..self.width)
                    .map(|col| self.glyph(col, row).unwrap_or('\u{2800}'))
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
