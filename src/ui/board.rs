use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};
use reflex::{
    target::{Target, TargetState},
    util::{format_tenths, to_cell},
    Game, Status,
};

use super::{RENDER_WINDOW, TARGET_SIZE};

pub struct Board<'a> {
    game: &'a Game,
}

impl<'a> Board<'a> {
    pub fn new(game: &'a Game) -> Self {
        Self { game }
    }
}

/// Cells covered by `target`, clipped to the play area
pub fn target_rect(play: Rect, target: &Target) -> Option<Rect> {
    let pos = target.position();
    let rect = Rect::new(
        play.x.saturating_add(to_cell(pos.x)),
        play.y.saturating_add(to_cell(pos.y)),
        TARGET_SIZE.width as u16,
        TARGET_SIZE.height as u16,
    )
    .intersection(play);

    (!rect.is_empty()).then_some(rect)
}

fn render_target(target: &Target, rect: Rect, buf: &mut Buffer) {
    let (style, body) = match target.state() {
        TargetState::Active => (
            Style::default().fg(Color::Black).bg(Color::White),
            target.value().to_string(),
        ),
        TargetState::Selected => (
            Style::default().fg(Color::White).bg(Color::Rgb(165, 42, 42)),
            format_tenths(target.remaining()),
        ),
        TargetState::Expired => return,
    };

    let mut block = Block::default().borders(Borders::ALL).style(style);
    if target.state() == TargetState::Selected {
        block = block.title(target.value().to_string());
    }

    Clear.render(rect, buf);
    Paragraph::new(body)
        .alignment(Alignment::Center)
        .block(block)
        .render(rect, buf);
}

impl Widget for Board<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let game = self.game;
        let mut block = Block::default().borders(Borders::ALL);
        if game.status() == Status::Playing {
            if let Some(next) = game.expected_value() {
                block = block.title_bottom(
                    Span::styled(
                        format!(" Next: {next} "),
                        Style::default().add_modifier(Modifier::BOLD),
                    )
                    .into_right_aligned_line(),
                );
            }
        }

        let play = block.inner(area);
        block.render(area, buf);

        // drawn highest value first so lower values end up on top
        for target in game.visible_targets(RENDER_WINDOW).rev() {
            if let Some(rect) = target_rect(play, target) {
                render_target(target, rect, buf);
            }
        }
    }
}
