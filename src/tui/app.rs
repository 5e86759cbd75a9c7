//! Application state and event loop

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget, DefaultTerminal, Frame};

use super::theme::Theme;
use super::widgets::{
    help::HelpPopup,
    pivot::{max_column_offset, PivotView},
    tabs::Tab,
};
use crate::types::Report;

/// Read-only viewer state over one finished report
pub struct App<'a> {
    report: &'a Report,
    theme: Theme,
    should_quit: bool,
    current_tab: Tab,
    column_offset: usize,
    show_help: bool,
}

impl<'a> App<'a> {
    pub fn new(report: &'a Report, theme: Theme) -> Self {
        Self {
            report,
            theme,
            should_quit: false,
            current_tab: Tab::default(),
            column_offset: 0,
            show_help: false,
        }
    }

    /// Handle keyboard events
    pub fn handle_event(&mut self, event: Event) {
        let Event::Key(key) = event else {
            return;
        };
        if key.kind != KeyEventKind::Press {
            return;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Tab => {
                self.current_tab = self.current_tab.next();
            }
            KeyCode::BackTab => {
                self.current_tab = self.current_tab.prev();
            }
            KeyCode::Left | KeyCode::Char('h') => {
                self.column_offset = self.column_offset.saturating_sub(1);
            }
            KeyCode::Right | KeyCode::Char('l') => {
                // both tables share the period columns
                let max = max_column_offset(&self.report.usage);
                self.column_offset = (self.column_offset + 1).min(max);
            }
            KeyCode::Char(c @ '1'..='2') => {
                if let Some(tab) = Tab::from_number(c as u8 - b'0') {
                    self.current_tab = tab;
                }
            }
            KeyCode::Char('?') => {
                self.show_help = !self.show_help;
            }
            _ => {}
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn draw(&self, frame: &mut Frame) {
        frame.render_widget(self, frame.area());
    }
}

impl Widget for &App<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        PivotView::new(self.report, self.theme)
            .with_tab(self.current_tab)
            .with_column_offset(self.column_offset)
            .render(area, buf);

        if self.show_help {
            let popup_area = HelpPopup::centered_area(area);
            HelpPopup::new(self.theme).render(popup_area, buf);
        }
    }
}

/// Show a report until the user quits
pub fn run(report: &Report) -> anyhow::Result<()> {
    // detection talks to the terminal, so it runs before raw mode
    let theme = Theme::detect();
    let mut terminal = ratatui::init();
    let result = run_app(&mut terminal, App::new(report, theme));
    ratatui::restore();
    result
}

fn run_app(terminal: &mut DefaultTerminal, mut app: App<'_>) -> anyhow::Result<()> {
    loop {
        terminal.draw(|frame| app.draw(frame))?;

        if app.should_quit() {
            break;
        }

        if event::poll(Duration::from_millis(250))? {
            app.handle_event(event::read()?);
        }
    }
    Ok(())
}
