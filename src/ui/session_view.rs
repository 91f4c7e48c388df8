use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use keytrain::session::{SessionController, SessionState};

const CORRECT: Color = Color::Green;
const WRONG: Color = Color::Red;
const PENDING: Color = Color::Gray;
const NEXT_LINE: Color = Color::DarkGray;

/// Two practice lines plus a status bar.
pub struct SessionView<'a> {
    session: &'a SessionController,
    last_wrong: bool,
}

impl<'a> SessionView<'a> {
    pub fn new(session: &'a SessionController, last_wrong: bool) -> Self {
        Self {
            session,
            last_wrong,
        }
    }
}

fn display_char(ch: char) -> String {
    match ch {
        '\n' => "\u{21b5}".to_string(), // ↵
        _ => ch.to_string(),
    }
}

/// Style the active line: typed part, the char under the cursor, the rest.
fn active_line(line: &str, cursor: usize, last_wrong: bool) -> Line<'static> {
    let spans: Vec<Span<'static>> = line
        .chars()
        .enumerate()
        .map(|(i, ch)| {
            let style = if i < cursor {
                Style::default().fg(CORRECT)
            } else if i == cursor {
                let bg = if last_wrong { WRONG } else { Color::White };
                Style::default().fg(Color::Black).bg(bg)
            } else {
                Style::default().fg(PENDING)
            };
            Span::styled(display_char(ch), style)
        })
        .collect();
    Line::from(spans)
}

fn format_time(ms: i64) -> String {
    let secs = ms.max(0) / 1000;
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn status_text(session: &SessionController) -> String {
    let totals = session.stats().total();
    let hint = match session.state() {
        SessionState::Ready => "type to start, Esc to quit",
        SessionState::Running => "Esc to stop",
        _ => "",
    };
    format!(
        " {}  hits {}  errors {}  {hint}",
        format_time(session.current_time_ms()),
        totals.hits,
        totals.errors
    )
}

impl Widget for SessionView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Length(1), Constraint::Min(0)])
            .split(area);

        let monitor = self.session.monitor();
        let lines = vec![
            active_line(self.session.line1(), monitor.cursor(), self.last_wrong),
            Line::styled(
                self.session.line2().replace('\n', "\u{21b5}"),
                Style::default().fg(NEXT_LINE),
            ),
        ];
        let title = format!(" {} ", self.session.exercise().name);
        Paragraph::new(lines)
            .block(Block::bordered().title(title))
            .render(rows[0], buf);

        Paragraph::new(status_text(self.session))
            .style(Style::default().add_modifier(Modifier::DIM))
            .render(rows[1], buf);
    }
}
