//! Tab bar widget for table navigation

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    widgets::Widget,
};

use crate::tui::theme::Theme;

/// Tables a report can show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Usage,
    Sessions,
}

impl Tab {
    pub fn label(self) -> &'static str {
        match self {
            Self::Usage => "Usage",
            Self::Sessions => "Sessions",
        }
    }

    pub fn all() -> &'static [Tab] {
        &[Tab::Usage, Tab::Sessions]
    }

    /// Next tab (wrapping)
    pub fn next(self) -> Self {
        match self {
            Self::Usage => Self::Sessions,
            Self::Sessions => Self::Usage,
        }
    }

    /// Previous tab (wrapping)
    pub fn prev(self) -> Self {
        // two tabs: previous and next coincide
        self.next()
    }

    /// Tab from number key (1-2)
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::Usage),
            2 => Some(Self::Sessions),
            _ => None,
        }
    }
}

/// Tab bar widget showing available tables
pub struct TabBar {
    selected: Tab,
    theme: Theme,
}

impl TabBar {
    pub fn new(selected: Tab, theme: Theme) -> Self {
        Self { selected, theme }
    }
}

impl Widget for TabBar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let labels: Vec<String> = Tab::all()
            .iter()
            .map(|tab| {
                if *tab == self.selected {
                    format!("[{}]", tab.label())
                } else {
                    tab.label().to_string()
                }
            })
            .collect();
        let total_width = labels.iter().map(|l| l.len() as u16 + 2).sum::<u16>().saturating_sub(2);

        let mut x = area.x + area.width.saturating_sub(total_width) / 2;
        for (tab, display) in Tab::all().iter().zip(&labels) {
            let width = display.len() as u16;
            if x + width > area.x + area.width {
                break;
            }
            let style = if *tab == self.selected {
                Style::default()
                    .fg(self.theme.accent())
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.muted())
            };
            buf.set_string(x, area.y, display, style);
            x += width + 2;
        }
    }
}
