use std::io::Write;

use colored::Colorize;

use super::format_card;
use crate::browser::ScrollMetrics;
use crate::render::{RenderSurface, StudentCard};

/// Prints cards as they arrive. Output already on screen cannot be taken
/// back, so a clear draws a divider and restarts the line count.
pub struct TerminalSurface<W: Write> {
    out: W,
    lines: usize,
    cards: usize,
    viewport_rows: usize,
    // first row of the reader's current screen
    position: usize,
}

impl TerminalSurface<std::io::Stdout> {
    pub fn stdout(viewport_rows: usize) -> Self {
        Self::new(std::io::stdout(), viewport_rows)
    }
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W, viewport_rows: usize) -> Self {
        Self {
            out,
            lines: 0,
            cards: 0,
            viewport_rows: viewport_rows.max(1),
            position: 0,
        }
    }

    pub fn cards_shown(&self) -> usize {
        self.cards
    }

    pub fn lines_written(&self) -> usize {
        self.lines
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Page the reader forward by one screen, stopping once the last screen
    /// of output is in view. Returns the new position.
    pub fn scroll_down(&mut self) -> usize {
        let last_screen = self.lines.saturating_sub(self.viewport_rows);
        self.position = (self.position + self.viewport_rows).min(last_screen);
        self.position
    }

    pub fn scroll_metrics(&self) -> ScrollMetrics {
        ScrollMetrics {
            viewport_height: self.viewport_rows as f64,
            scroll_offset: self.position as f64,
            document_height: self.lines as f64,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_line(&mut self, line: &str) {
        let _ = writeln!(self.out, "{line}");
        self.lines += 1;
    }
}

impl<W: Write> RenderSurface for TerminalSurface<W> {
    fn clear(&mut self) {
        if self.lines > 0 {
            let divider = "─".repeat(40);
            self.write_line(&divider.dimmed().to_string());
        }
        self.lines = 0;
        self.cards = 0;
        self.position = 0;
    }

    fn append(&mut self, card: StudentCard) {
        for line in format_card(&card) {
            self.write_line(&line);
        }
        self.write_line("");
        self.cards += 1;
        let _ = self.out.flush();
    }
}
