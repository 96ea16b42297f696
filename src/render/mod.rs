//! Rendering
//!
//! The generation core only promises a glyph grid. `GlyphBackend` is the
//! seam: the ratatui widget and the raw crossterm writer are interchangeable
//! sinks for the same frame.

pub mod term;
pub mod tui;

use std::io;

use crate::world::map::{Map, Position};

pub use term::TermGlyphs;
pub use tui::TuiGlyphs;

/// One screen cell.
#[derive(Debug, Clone, Copy)]
pub struct GlyphCell {
    pub glyph: char,
    pub fg: (u8, u8, u8),
    pub bg: (u8, u8, u8),
}

const VOID: GlyphCell = GlyphCell {
    glyph: ' ',
    fg: (0, 0, 0),
    bg: (0, 0, 0),
};

/// A rendered viewport, row-major.
#[derive(Debug, Clone)]
pub struct GlyphFrame {
    pub width: u16,
    pub height: u16,
    cells: Vec<GlyphCell>,
}

impl GlyphFrame {
    pub fn cell(&self, x: u16, y: u16) -> &GlyphCell {
        &self.cells[y as usize * self.width as usize + x as usize]
    }
}

/// Anything that can put a frame on screen.
pub trait GlyphBackend {
    fn present(&mut self, frame: &GlyphFrame) -> io::Result<()>;
}

/// Project a viewport of the map into a frame. Cells beyond the map edge
/// render as void.
pub fn frame_from_map(map: &Map, origin: Position, width: u16, height: u16) -> GlyphFrame {
    let mut cells = Vec::with_capacity(width as usize * height as usize);
    for sy in 0..height {
        for sx in 0..width {
            let wx = origin.x + sx as i32;
            let wy = origin.y + sy as i32;
            let cell = match map.get_tile(wx, wy) {
                Some(tile) => GlyphCell {
                    glyph: tile.glyph(),
                    fg: tile.tile_type.fg_color(),
                    bg: tile.tile_type.bg_color(),
                },
                None => VOID,
            };
            cells.push(cell);
        }
    }
    GlyphFrame {
        width,
        height,
        cells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::tile::TileType;

    #[test]
    fn viewport_clips_to_void_outside_the_map() {
        let map = Map::filled(4, 4, TileType::Floor);
        let frame = frame_from_map(&map, Position::new(2, 2), 4, 4);
        assert_eq!(frame.cell(0, 0).glyph, '.');
        assert_eq!(frame.cell(1, 1).glyph, '.');
        assert_eq!(frame.cell(2, 0).glyph, ' ');
        assert_eq!(frame.cell(0, 2).glyph, ' ');
    }

    #[test]
    fn negative_origin_pans_into_void() {
        let map = Map::filled(4, 4, TileType::Floor);
        let frame = frame_from_map(&map, Position::new(-2, -2), 4, 4);
        assert_eq!(frame.cell(0, 0).glyph, ' ');
        assert_eq!(frame.cell(2, 2).glyph, '.');
    }
}
