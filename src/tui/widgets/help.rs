//! Help popup widget - displays keyboard shortcuts

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

use crate::tui::theme::Theme;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const POPUP_WIDTH: u16 = 42;
const POPUP_HEIGHT: u16 = 12;

const KEYBINDINGS: [(&str, &str); 5] = [
    ("Tab / Shift+Tab", "Switch table"),
    ("1-2", "Jump to table"),
    ("Left/Right or h/l", "Scroll periods"),
    ("?", "Toggle help"),
    ("q / Esc", "Quit"),
];

/// Help popup widget showing keyboard shortcuts
pub struct HelpPopup {
    theme: Theme,
}

impl HelpPopup {
    pub fn new(theme: Theme) -> Self {
        Self { theme }
    }

    /// Centered popup area, clamped to the terminal
    pub fn centered_area(area: Rect) -> Rect {
        let x = area.x + (area.width.saturating_sub(POPUP_WIDTH)) / 2;
        let y = area.y + (area.height.saturating_sub(POPUP_HEIGHT)) / 2;
        Rect {
            x,
            y,
            width: POPUP_WIDTH.min(area.width),
            height: POPUP_HEIGHT.min(area.height),
        }
    }
}

impl Widget for HelpPopup {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);

        let block = Block::default()
            .title(format!(" unireport v{} ", VERSION))
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.accent()));
        let inner = block.inner(area);
        block.render(area, buf);

        let mut constraints = vec![Constraint::Length(1); 3 + KEYBINDINGS.len() + 2];
        constraints.push(Constraint::Min(0));
        let chunks = Layout::vertical(constraints).split(inner);

        Paragraph::new(Line::from(Span::styled(
            "Keys",
            Style::default()
                .fg(self.theme.period())
                .add_modifier(Modifier::BOLD),
        )))
        .render(chunks[1], buf);
        buf.set_string(
            chunks[2].x,
            chunks[2].y,
            "─".repeat(inner.width as usize),
            Style::default().fg(self.theme.muted()),
        );

        for (idx, (key, desc)) in KEYBINDINGS.iter().enumerate() {
            let line = Line::from(vec![
                Span::styled(format!("  {:<19}", key), Style::default().fg(self.theme.accent())),
                Span::styled(*desc, Style::default().fg(self.theme.text())),
            ]);
            Paragraph::new(line).render(chunks[3 + idx], buf);
        }

        Paragraph::new(Line::from(Span::styled(
            "Press ? to close",
            Style::default().fg(self.theme.muted()),
        )))
        .alignment(Alignment::Center)
        .render(chunks[3 + KEYBINDINGS.len() + 1], buf);
    }
}
