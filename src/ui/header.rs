use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};
use reflex::{util::format_tenths, Status};
use unicode_width::UnicodeWidthStr;

use crate::App;

const POINTS_FIELD_WIDTH: usize = 6;

pub fn title(status: Status) -> (&'static str, Style) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    match status {
        Status::Won => ("ALL CLEARED", bold.fg(Color::Green)),
        Status::Lost => ("GAME OVER", bold.fg(Color::Red)),
        Status::Idle | Status::Playing => ("LET'S PLAY", bold),
    }
}

pub struct Header<'a> {
    app: &'a App,
}

impl<'a> Header<'a> {
    pub fn new(app: &'a App) -> Self {
        Self { app }
    }
}

impl Widget for Header<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let app = self.app;
        let label_style = Style::default().add_modifier(Modifier::DIM);
        let field_style = Style::default().add_modifier(Modifier::UNDERLINED | Modifier::BOLD);
        let button_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2), // title
                Constraint::Length(1), // points
                Constraint::Length(1), // time
                Constraint::Length(1), // actions
            ])
            .split(area);

        let (message, message_style) = title(app.banner());
        Paragraph::new(Span::styled(message, message_style))
            .alignment(Alignment::Center)
            .render(rows[0], buf);

        let pad = POINTS_FIELD_WIDTH.saturating_sub(app.points_input.width());
        Line::from(vec![
            Span::styled("Points: ", label_style),
            Span::styled(format!("{}{}", app.points_input, " ".repeat(pad)), field_style),
        ])
        .render(rows[1], buf);

        Line::from(vec![
            Span::styled("Time:   ", label_style),
            Span::raw(format!("{}s", format_tenths(app.game.elapsed()))),
        ])
        .render(rows[2], buf);

        let mut actions = vec![Span::styled(
            if app.has_played {
                "[p] Restart"
            } else {
                "[p] Play"
            },
            button_style,
        )];
        if app.game.status() == Status::Playing {
            // the label names what pressing the button will do
            let toggle = if app.game.autoplay_enabled() {
                "OFF"
            } else {
                "ON"
            };
            actions.push(Span::raw("   "));
            actions.push(Span::styled(format!("[a] Auto play {toggle}"), button_style));
        }
        actions.push(Span::styled("   [esc] quit", label_style));
        Line::from(actions).render(rows[3], buf);
    }
}
