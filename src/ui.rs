pub mod charting;
pub mod screen;
pub mod statistics;

use keytempo::{
    classify::CharClass,
    metrics::{format_clock, Metrics},
    notification::{Notifications, ToastKind},
    session::SessionState,
    text::TextSource,
    RenderSink,
};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Axis, Block, Borders, Chart, Clear, Dataset, Gauge, GraphType, Paragraph, Widget, Wrap,
    },
};
use unicode_width::UnicodeWidthStr;
use webbrowser::Browser;

use crate::{App, AppState};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

fn bold_style() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim_bold_style() -> Style {
    bold_style().add_modifier(Modifier::DIM)
}

fn italic_style() -> Style {
    Style::default().add_modifier(Modifier::ITALIC)
}

/// Builds styled spans for the prompt, merging neighbours that share a style
#[derive(Default)]
pub struct SpanSink {
    parts: Vec<(String, Style)>,
}

impl SpanSink {
    fn push(&mut self, c: char, style: Style) {
        match self.parts.last_mut() {
            Some((text, last_style)) if *last_style == style => text.push(c),
            _ => self.parts.push((c.to_string(), style)),
        }
    }

    pub fn into_line(self) -> Line<'static> {
        Line::from(
            self.parts
                .into_iter()
                .map(|(text, style)| Span::styled(text, style))
                .collect::<Vec<_>>(),
        )
    }
}

impl RenderSink for SpanSink {
    fn char(&mut self, _idx: usize, expected: char, typed: Option<char>, class: CharClass) {
        match class {
            CharClass::Correct => self.push(expected, bold_style().fg(Color::Green)),
            CharClass::Incorrect => {
                let shown = match typed {
                    Some(' ') | None => '·',
                    Some(c) => c,
                };
                self.push(shown, bold_style().fg(Color::Red))
            }
            CharClass::Current => {
                self.push(expected, dim_bold_style().add_modifier(Modifier::UNDERLINED))
            }
            CharClass::Untouched => self.push(expected, dim_bold_style()),
        }
    }
}

fn stats_line(metrics: &Metrics) -> String {
    format!(
        "{} cpm   {}% acc   {}",
        metrics.speed,
        metrics.accuracy,
        format_clock(metrics.elapsed_secs)
    )
}

fn settings_line(app: &App) -> String {
    let source = match &app.text_source {
        TextSource::Provider => "",
        TextSource::Fallback { .. } => "   (local text)",
        TextSource::Custom => "   (custom text)",
    };
    format!(
        "{} · {}{}",
        app.config.language.display_name(),
        app.config.difficulty,
        source
    )
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Loading => render_loading(self, area, buf),
            AppState::Typing => render_typing(self, area, buf),
            AppState::Results | AppState::Statistics => render_results(self, area, buf),
        }
    }
}

fn render_loading(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(50),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(area);

    Paragraph::new(Span::styled(
        format!("loading {} text…", app.config.language.display_name().to_lowercase()),
        italic_style().fg(Color::Yellow),
    ))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);
}

fn render_typing(app: &App, area: Rect, buf: &mut Buffer) {
    let session = &app.session;
    let prompt_width = session.reference_text().width();
    let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);

    let prompt_occupied_lines = if prompt_width <= max_chars_per_line as usize {
        1
    } else {
        ((prompt_width as f64 / max_chars_per_line as f64).ceil() + 1.0) as u16
    };
    // settings, stats, gauge, spacer above the prompt; legend below
    let header_lines: u16 = 4;
    let free = area
        .height
        .saturating_sub(prompt_occupied_lines + header_lines + 1)
        / 2;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(free),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(prompt_occupied_lines),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    Paragraph::new(Span::styled(settings_line(app), italic_style().fg(Color::Gray)))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    let stats_style = if session.state() == SessionState::Idle {
        dim_bold_style()
    } else {
        bold_style()
    };
    Paragraph::new(Span::styled(stats_line(session.metrics()), stats_style))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

    Gauge::default()
        .gauge_style(Style::default().fg(Color::Magenta))
        .ratio(session.progress().clamp(0.0, 1.0))
        .label("")
        .render(chunks[3], buf);

    let mut sink = SpanSink::default();
    session.render_to(&mut sink);
    Paragraph::new(sink.into_line())
        .alignment(if prompt_occupied_lines == 1 {
            // when the prompt is small enough to fit on one line
            // centering the text gives a nice zen feeling
            Alignment::Center
        } else {
            Alignment::Left
        })
        .wrap(Wrap { trim: true })
        .render(chunks[5], buf);

    Paragraph::new(Span::styled(
        "(tab) new text / (ctrl+l) language / (ctrl+d) difficulty / (esc)ape",
        italic_style(),
    ))
    .render(chunks[7], buf);
}

fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(1),    // chart
            Constraint::Length(1), // stats
            Constraint::Length(1), // settings
            Constraint::Length(1), // padding
            Constraint::Length(1), // legend
        ])
        .split(area);

    let tuples: Vec<(f64, f64)> = app
        .session
        .speed_samples()
        .iter()
        .map(|&s| s.into())
        .collect();
    let (overall_duration, highest_speed) = charting::compute_chart_params(&tuples);

    let datasets = vec![Dataset::default()
        .marker(ratatui::symbols::Marker::Braille)
        .style(Style::default().fg(Color::Magenta))
        .graph_type(GraphType::Line)
        .data(&tuples)];

    Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title("seconds")
                .bounds([1.0, overall_duration])
                .labels(vec![
                    Span::styled("1", bold_style()),
                    Span::styled(charting::format_label(overall_duration), bold_style()),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("cpm")
                .bounds([0.0, highest_speed])
                .labels(vec![
                    Span::styled("0", bold_style()),
                    Span::styled(charting::format_label(highest_speed), bold_style()),
                ]),
        )
        .render(chunks[0], buf);

    let stats = match app.session.result() {
        Some(result) => format!(
            "{} cpm   {}% acc   {}",
            result.speed,
            result.accuracy,
            format_clock(result.elapsed_secs)
        ),
        None => stats_line(app.session.metrics()),
    };
    Paragraph::new(Span::styled(stats, bold_style()))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    Paragraph::new(Span::styled(
        settings_line(app),
        italic_style().fg(Color::Cyan),
    ))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);

    let legend = if app.web_statistics_url().is_some() && Browser::is_available() {
        "(r)etry / (n)ew / (s)tats / (l)anguage / (d)ifficulty / (o)pen web stats / (esc)ape"
    } else {
        "(r)etry / (n)ew / (s)tats / (l)anguage / (d)ifficulty / (esc)ape"
    };
    Paragraph::new(Span::styled(legend, italic_style()))
        .wrap(Wrap { trim: true })
        .render(chunks[4], buf);
}

/// Toasts stacked in the top right corner
pub struct ToastOverlay<'a>(pub &'a Notifications);

impl Widget for ToastOverlay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.0.is_empty() {
            return;
        }
        let toasts = self.0.visible();

        let widest = toasts
            .iter()
            .map(|t| t.message.width())
            .max()
            .unwrap_or(0) as u16;
        let width = (widest + 4).min(area.width);
        let height = (toasts.len() as u16 + 2).min(area.height);
        let rect = Rect::new(area.right().saturating_sub(width), area.y, width, height);

        let lines: Vec<Line> = toasts
            .iter()
            .map(|t| {
                let color = match t.kind {
                    ToastKind::Info => Color::Yellow,
                    ToastKind::Success => Color::Green,
                    ToastKind::Error => Color::Red,
                };
                Line::from(Span::styled(t.message.clone(), bold_style().fg(color)))
            })
            .collect();

        Clear.render(rect, buf);
        Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL))
            .render(rect, buf);
    }
}
