use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
    Frame,
};
use std::time::Instant;
use unicode_width::UnicodeWidthStr;

use crate::{
    app::App,
    certificate::Certificate,
    display::format_status,
    level::Level,
    metrics::tokenize,
    session::{Phase, Session},
};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

pub fn draw(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}

fn level_picker(current: Level) -> Line<'static> {
    let mut spans = vec![Span::raw("Level: ")];
    for level in Level::ALL {
        let style = if level == current {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().add_modifier(Modifier::DIM)
        };
        spans.push(Span::styled(level.to_string(), style));
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}

/// Reference words coloured by whether the word typed at the same
/// position matches.
fn reference_line(session: &Session) -> Line<'_> {
    let green_bold = Style::default().fg(Color::Green).add_modifier(Modifier::BOLD);
    let red_bold = Style::default().fg(Color::Red).add_modifier(Modifier::BOLD);
    let dim_bold = Style::default().add_modifier(Modifier::BOLD | Modifier::DIM);

    let typed = tokenize(session.typed_text());
    let mut spans = Vec::new();
    for (idx, word) in tokenize(session.reference_text()).into_iter().enumerate() {
        let style = match typed.get(idx) {
            Some(t) if *t == word => green_bold,
            Some(_) => red_bold,
            None => dim_bold,
        };
        if idx > 0 {
            spans.push(Span::raw(" "));
        }
        spans.push(Span::styled(word, style));
    }
    Line::from(spans)
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let now = Instant::now();
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);
        let bold_style = Style::default().add_modifier(Modifier::BOLD);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // title / status
                Constraint::Length(1),
                Constraint::Length(1), // level picker
                Constraint::Length(1),
                Constraint::Min(3),    // body
                Constraint::Length(1), // notice
                Constraint::Length(1), // legend
            ])
            .split(area);

        level_picker(self.test.level()).render(chunks[2], buf);

        if let Some(notice) = &self.notice {
            Paragraph::new(Span::styled(
                notice.as_str(),
                Style::default().fg(Color::Yellow),
            ))
            .render(chunks[5], buf);
        }

        let legend = match self.test.phase() {
            Phase::Idle => {
                Paragraph::new(Span::styled("Typing Test", bold_style))
                    .alignment(Alignment::Center)
                    .render(chunks[0], buf);

                let name = Paragraph::new(vec![
                    Line::from(vec![
                        Span::raw("Name: "),
                        Span::styled(self.test.name().value(), bold_style),
                        Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
                    ]),
                    Line::from(Span::styled(
                        format!("{} seconds per test", self.test.settings().duration.as_secs()),
                        italic_style,
                    )),
                ]);
                name.render(chunks[4], buf);

                "(enter) start / (tab) level / (f2) use name as profile id / (esc)ape"
            }
            Phase::Running | Phase::Finished => {
                let session = match self.test.session() {
                    Some(session) => session,
                    None => return,
                };

                Paragraph::new(Span::styled(format_status(&session.status(now)), bold_style))
                    .alignment(Alignment::Center)
                    .render(chunks[0], buf);

                if self.test.phase() == Phase::Running {
                    let body = Layout::default()
                        .direction(Direction::Vertical)
                        .constraints([Constraint::Min(2), Constraint::Min(3)])
                        .split(chunks[4]);

                    Paragraph::new(reference_line(session))
                        .wrap(Wrap { trim: true })
                        .render(body[0], buf);

                    Paragraph::new(session.typed_text())
                        .block(Block::default().borders(Borders::ALL).title("your text"))
                        .wrap(Wrap { trim: false })
                        .render(body[1], buf);

                    "(ctrl+r) restart / (tab) level for next test / (esc)ape"
                } else {
                    if let Some(result) = self.test.result() {
                        let lines = Certificate::new(result, &result.name).lines();
                        let width = lines.iter().map(|l| l.width()).max().unwrap_or(0) as u16 + 4;
                        let body = chunks[4];
                        let x = body.x + body.width.saturating_sub(width) / 2;
                        let cert_area = Rect::new(
                            x,
                            body.y,
                            width.min(body.width),
                            (lines.len() as u16 + 2).min(body.height),
                        );
                        Paragraph::new(lines.into_iter().map(Line::from).collect::<Vec<_>>())
                            .block(Block::default().borders(Borders::ALL))
                            .alignment(Alignment::Center)
                            .render(cert_area, buf);
                    }

                    "(enter) new test / (n)ew setup / (s)ave certificate / (o)pen in browser / (f2) apply id / (esc)ape"
                }
            }
        };

        Paragraph::new(Span::styled(legend, italic_style)).render(chunks[6], buf);
    }
}
