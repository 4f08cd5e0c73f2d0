use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::game::{Feedback, GameColor};
use crate::App;

fn tui_color(color: GameColor) -> Color {
    match color {
        GameColor::Red => Color::Red,
        GameColor::Green => Color::Green,
        GameColor::Blue => Color::Blue,
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let session = &self.session;
        let state = session.state();

        let bold = Style::default().add_modifier(Modifier::BOLD);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(2)
            .vertical_margin(1)
            .constraints([
                Constraint::Length(3), // target announcement
                Constraint::Min(5),    // rotating color pane
                Constraint::Length(3), // score / feedback line
                Constraint::Length(4), // records panel
            ])
            .split(area);

        let announcement = if state.active {
            Span::styled(
                format!("PRESS ON {}", state.target),
                bold.fg(tui_color(state.target)),
            )
        } else {
            Span::styled("PAUSED", bold.fg(Color::Yellow))
        };
        Paragraph::new(announcement)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("blixt"))
            .render(chunks[0], buf);

        let (pane_style, pane_text) = if state.active {
            (Style::default().bg(tui_color(state.current)), "")
        } else {
            (
                Style::default().bg(Color::DarkGray).fg(Color::White),
                "press space to restart",
            )
        };
        Paragraph::new(pane_text)
            .alignment(Alignment::Center)
            .style(pane_style)
            .render(chunks[1], buf);

        let score_text = match session.feedback() {
            Feedback::Idle => format!("Score: {} | Press space to start", state.score),
            Feedback::NewTarget => format!("Score: {} | New round", state.score),
            Feedback::Hit { reaction_ms } => {
                format!("Score: {} | Reaction: {} ms", state.score, reaction_ms)
            }
            Feedback::Miss => format!("Score: {} | Miss!", state.score),
            Feedback::Paused => format!("Score: {} | Paused", state.score),
        };
        Paragraph::new(score_text)
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("space react · p pause · esc quit"),
            )
            .render(chunks[2], buf);

        let board = session.leaderboard();
        let scores = board.top_scores();
        let times = board.best_times_ms();
        let records = vec![
            Line::from(format!(
                "Scores: {}, {}, {}",
                scores[0], scores[1], scores[2]
            )),
            Line::from(format!(
                "Times: {} ms, {} ms, {} ms",
                times[0], times[1], times[2]
            )),
        ];
        Paragraph::new(records)
            .block(Block::default().borders(Borders::ALL).title("Records"))
            .render(chunks[3], buf);
    }
}
