//! Ratatui widget backend

use std::io::{self, Stdout};

use ratatui::backend::CrosstermBackend;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::widgets::Widget;
use ratatui::Terminal;

use super::{GlyphBackend, GlyphFrame};

pub struct TuiGlyphs {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TuiGlyphs {
    pub fn new() -> io::Result<Self> {
        let backend = CrosstermBackend::new(io::stdout());
        Ok(Self {
            terminal: Terminal::new(backend)?,
        })
    }
}

impl GlyphBackend for TuiGlyphs {
    fn present(&mut self, frame: &GlyphFrame) -> io::Result<()> {
        self.terminal.draw(|f| {
            f.render_widget(FrameWidget(frame), f.area());
        })?;
        Ok(())
    }
}

/// Renders a glyph frame into the ratatui buffer cell by cell.
struct FrameWidget<'a>(&'a GlyphFrame);

impl Widget for FrameWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let w = area.width.min(self.0.width);
        let h = area.height.min(self.0.height);
        for y in 0..h {
            for x in 0..w {
                let src = self.0.cell(x, y);
                if let Some(cell) = buf.cell_mut((area.x + x, area.y + y)) {
                    let (fr, fg, fb) = src.fg;
                    let (br, bg, bb) = src.bg;
                    cell.set_char(src.glyph)
                        .set_fg(Color::Rgb(fr, fg, fb))
                        .set_bg(Color::Rgb(br, bg, bb));
                }
            }
        }
    }
}
