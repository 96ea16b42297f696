//! Direct crossterm writer backend
//!
//! Queues the whole frame into stdout and flushes once. No intermediate
//! buffer, no diffing; fine for a map viewer, crude for a game.

use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::{Color, Print, SetBackgroundColor, SetForegroundColor};

use super::{GlyphBackend, GlyphFrame};

pub struct TermGlyphs {
    out: io::Stdout,
}

impl TermGlyphs {
    pub fn new() -> Self {
        Self { out: io::stdout() }
    }
}

impl Default for TermGlyphs {
    fn default() -> Self {
        Self::new()
    }
}

impl GlyphBackend for TermGlyphs {
    fn present(&mut self, frame: &GlyphFrame) -> io::Result<()> {
        let mut out = self.out.lock();
        for y in 0..frame.height {
            queue!(out, MoveTo(0, y))?;
            for x in 0..frame.width {
                let cell = frame.cell(x, y);
                let (fr, fg_, fb) = cell.fg;
                let (br, bg_, bb) = cell.bg;
                queue!(
                    out,
                    SetForegroundColor(Color::Rgb {
                        r: fr,
                        g: fg_,
                        b: fb
                    }),
                    SetBackgroundColor(Color::Rgb {
                        r: br,
                        g: bg_,
                        b: bb
                    }),
                    Print(cell.glyph)
                )?;
            }
        }
        out.flush()
    }
}
