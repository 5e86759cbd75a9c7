//! Pivot table view - one report table with horizontally scrolling periods

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use super::tabs::{Tab, TabBar};
use crate::render::format_cell;
use crate::tui::theme::Theme;
use crate::types::{DisplayCell, Report, ReportTable, RowKind};

/// Width of the row label column
const LABEL_WIDTH: u16 = 18;

/// Narrowest period column, including the gap
const MIN_COLUMN_WIDTH: u16 = 9;

const HEADER_LABEL: &str = "Service";

/// Width of every period column of a table: widest header or cell plus a gap
pub fn column_width(table: &ReportTable) -> u16 {
    let widest_cell = table
        .display_rows()
        .iter()
        .flat_map(|row| row.cells.iter().map(|c| format_cell(c).len()))
        .chain(table.columns().iter().map(String::len))
        .max()
        .unwrap_or(0);
    (widest_cell as u16 + 2).max(MIN_COLUMN_WIDTH)
}

/// Number of period columns that fit beside the label column (at least one)
pub fn visible_column_count(area_width: u16, column_width: u16) -> usize {
    (area_width.saturating_sub(LABEL_WIDTH) / column_width.max(1)).max(1) as usize
}

/// Largest useful column offset: the last period stays on screen
pub fn max_column_offset(table: &ReportTable) -> usize {
    table.columns().len().saturating_sub(1)
}

/// Report table view widget
pub struct PivotView<'a> {
    report: &'a Report,
    selected_tab: Tab,
    column_offset: usize,
    theme: Theme,
}

impl<'a> PivotView<'a> {
    pub fn new(report: &'a Report, theme: Theme) -> Self {
        Self {
            report,
            selected_tab: Tab::Usage,
            column_offset: 0,
            theme,
        }
    }

    pub fn with_tab(mut self, tab: Tab) -> Self {
        self.selected_tab = tab;
        self
    }

    pub fn with_column_offset(mut self, offset: usize) -> Self {
        self.column_offset = offset;
        self
    }

    fn table(&self) -> &'a ReportTable {
        match self.selected_tab {
            Tab::Usage => &self.report.usage,
            Tab::Sessions => &self.report.session,
        }
    }
}

impl Widget for PivotView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let table = self.table();
        let rows = table.display_rows();
        let width = column_width(table);
        let offset = self.column_offset.min(max_column_offset(table));
        let count = visible_column_count(area.width, width);
        let end = (offset + count).min(table.columns().len());

        let chunks = Layout::vertical([
            Constraint::Length(1),                  // Top padding
            Constraint::Length(1),                  // Tabs
            Constraint::Length(1),                  // Separator
            Constraint::Length(1),                  // Title
            Constraint::Length(1),                  // Header
            Constraint::Length(rows.len() as u16),  // Table rows
            Constraint::Length(1),                  // Separator
            Constraint::Length(1),                  // Keybindings
            Constraint::Min(0),
        ])
        .split(area);

        TabBar::new(self.selected_tab, self.theme).render(chunks[1], buf);
        self.render_separator(chunks[2], buf);
        self.render_title(chunks[3], buf, offset, end);

        let header_style = Style::default()
            .fg(self.theme.period())
            .add_modifier(Modifier::BOLD);
        let mut header = vec![Span::styled(
            format!("{:<w$}", HEADER_LABEL, w = LABEL_WIDTH as usize),
            Style::default().fg(self.theme.text()).add_modifier(Modifier::BOLD),
        )];
        for period in &table.columns()[offset..end] {
            header.push(Span::styled(
                format!("{:>w$}", period, w = width as usize),
                header_style,
            ));
        }
        Paragraph::new(Line::from(header)).render(chunks[4], buf);

        for (i, row) in rows.iter().enumerate() {
            let y = chunks[5].y + i as u16;
            if y >= chunks[5].y + chunks[5].height {
                break;
            }
            let label_style = match row.kind {
                RowKind::Category => Style::default().fg(self.theme.text()),
                RowKind::Total => Style::default()
                    .fg(self.theme.total())
                    .add_modifier(Modifier::BOLD),
                RowKind::Change => Style::default()
                    .fg(self.theme.muted())
                    .add_modifier(Modifier::BOLD),
            };
            let mut spans = vec![Span::styled(
                format!("{:<w$}", row.label, w = LABEL_WIDTH as usize),
                label_style,
            )];
            for cell in &row.cells[offset..end] {
                let color = match (cell, row.kind) {
                    (DisplayCell::Rate(rate), _) => self.theme.rate_color(*rate),
                    (DisplayCell::Count(_), RowKind::Total) => self.theme.total(),
                    (DisplayCell::Count(_), _) => self.theme.text(),
                };
                spans.push(Span::styled(
                    format!("{:>w$}", format_cell(cell), w = width as usize),
                    Style::default().fg(color),
                ));
            }
            Paragraph::new(Line::from(spans)).render(
                Rect {
                    x: chunks[5].x,
                    y,
                    width: chunks[5].width,
                    height: 1,
                },
                buf,
            );
        }

        self.render_separator(chunks[6], buf);
        self.render_keybindings(chunks[7], buf);
    }
}

impl PivotView<'_> {
    fn render_separator(&self, area: Rect, buf: &mut Buffer) {
        buf.set_string(
            area.x,
            area.y,
            "─".repeat(area.width as usize),
            Style::default().fg(self.theme.muted()),
        );
    }

    fn render_title(&self, area: Rect, buf: &mut Buffer, offset: usize, end: usize) {
        let total = self.table().columns().len();
        let position = if total == 0 {
            String::new()
        } else {
            format!("  periods {}-{} of {}", offset + 1, end, total)
        };
        let line = Line::from(vec![
            Span::styled(
                format!(
                    "{} ({})",
                    self.report.institution_name, self.report.institution_id
                ),
                Style::default()
                    .fg(self.theme.text())
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {}{}", self.report.granularity.kind(), position),
                Style::default().fg(self.theme.muted()),
            ),
        ]);
        Paragraph::new(line).render(area, buf);
    }

    fn render_keybindings(&self, area: Rect, buf: &mut Buffer) {
        let key = Style::default().fg(self.theme.accent());
        let desc = Style::default().fg(self.theme.muted());
        let line = Line::from(vec![
            Span::styled("Tab", key),
            Span::styled(":table  ", desc),
            Span::styled("←/→", key),
            Span::styled(":scroll  ", desc),
            Span::styled("?", key),
            Span::styled(":help  ", desc),
            Span::styled("q", key),
            Span::styled(":quit", desc),
        ]);
        Paragraph::new(line)
            .alignment(Alignment::Center)
            .render(area, buf);
    }
}
