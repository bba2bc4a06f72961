mod board;
mod header;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    widgets::{Block, Borders},
    Frame,
};
use reflex::layout::Size;

use crate::App;

pub use board::target_rect;

const HEADER_HEIGHT: u16 = 5;

/// Cells a target covers, borders included
pub const TARGET_SIZE: Size = Size {
    width: 6.0,
    height: 3.0,
};
pub const TARGET_MARGIN: f64 = 1.0;

/// How many targets past the expected one get drawn
pub const RENDER_WINDOW: u32 = 1500;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Areas {
    pub header: Rect,
    pub board: Rect,
    /// Inside of the board border; layouts are generated in this space
    pub play: Rect,
}

pub fn areas(frame: Rect) -> Areas {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(HEADER_HEIGHT), Constraint::Min(0)])
        .split(frame);

    let board = chunks[1];
    Areas {
        header: chunks[0],
        board,
        play: Block::default().borders(Borders::ALL).inner(board),
    }
}

pub fn draw(app: &App, f: &mut Frame) {
    let areas = areas(f.area());
    f.render_widget(header::Header::new(app), areas.header);
    f.render_widget(board::Board::new(&app.game), areas.board);
}
