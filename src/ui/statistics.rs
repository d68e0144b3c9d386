use keytempo::{
    history::{StatisticsReport, TestRecord},
    metrics::format_clock,
};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Widget, Wrap},
};

use super::charting::{format_label, padded_bounds};
use crate::{App, StatisticsView};

pub fn render_statistics(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(2)
        .vertical_margin(1)
        .constraints([
            Constraint::Length(1), // title
            Constraint::Min(5),    // body
            Constraint::Length(1), // legend
        ])
        .split(area);

    let title = match &app.statistics {
        StatisticsView::Loaded(report) => format!("Statistics · {} tests", report.total_tests()),
        _ => "Statistics".to_string(),
    };
    Paragraph::new(Span::styled(
        title,
        Style::default().add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center)
    .render(chunks[0], buf);

    match &app.statistics {
        StatisticsView::Idle | StatisticsView::Loading => {
            message(chunks[1], buf, "loading statistics…", Color::Yellow)
        }
        StatisticsView::Failed(reason) => message(chunks[1], buf, reason, Color::Red),
        StatisticsView::Loaded(report) => render_report(report, chunks[1], buf),
    }

    let legend = if app.web_statistics_url().is_some() {
        "(b)ack / (r)etry / (n)ew / (o)pen web stats / (esc)ape"
    } else {
        "(b)ack / (r)etry / (n)ew / (esc)ape"
    };
    Paragraph::new(Span::styled(
        legend,
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(chunks[2], buf);
}

fn message(area: Rect, buf: &mut Buffer, text: &str, color: Color) {
    Paragraph::new(Span::styled(
        text.to_string(),
        Style::default().fg(color).add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .render(area, buf);
}

fn render_report(report: &StatisticsReport, area: Rect, buf: &mut Buffer) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // cards
            Constraint::Length(1), // progress
            Constraint::Min(3),    // charts
        ])
        .split(area);

    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(rows[0]);

    if let Some(last) = &report.last_result {
        card(
            "Last test",
            last.chars_per_minute,
            last.accuracy,
            last.time,
            cards[0],
            buf,
        );
    }
    if let Some(best) = &report.best_performance {
        card(
            "Best",
            best.chars_per_minute,
            best.accuracy,
            best.time,
            cards[1],
            buf,
        );
    }
    if let Some(avg) = &report.avg_statistics {
        card(
            "Average",
            avg.chars_per_minute,
            avg.accuracy,
            avg.time,
            cards[2],
            buf,
        );
    }

    let progress = &report.progress_metrics;
    Paragraph::new(Line::from(vec![
        Span::raw("progress  "),
        progress_span("speed", progress.speed_progress),
        Span::raw("   "),
        progress_span("accuracy", progress.accuracy_progress),
        Span::raw("   "),
        progress_span("time", progress.time_progress),
    ]))
    .alignment(Alignment::Center)
    .render(rows[1], buf);

    let charts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[2]);

    history_chart(
        report,
        "speed (cpm)",
        |r| r.chars_per_minute,
        Color::Magenta,
        charts[0],
        buf,
    );
    history_chart(
        report,
        "accuracy (%)",
        |r| r.accuracy,
        Color::Cyan,
        charts[1],
        buf,
    );
}

fn card(
    title: &str,
    speed: Option<f64>,
    accuracy: Option<f64>,
    time: Option<f64>,
    area: Rect,
    buf: &mut Buffer,
) {
    let value = |v: Option<f64>| v.map_or("-".to_string(), |v| format!("{}", v.round()));
    let lines = vec![
        Line::from(format!("speed     {} cpm", value(speed))),
        Line::from(format!("accuracy  {}%", value(accuracy))),
        Line::from(format!(
            "time      {}",
            time.map_or("-".to_string(), |t| format_clock(t.round().max(0.0) as u64))
        )),
    ];
    Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(
                    title.to_string(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
        )
        .render(area, buf);
}

fn progress_span(label: &str, value: f64) -> Span<'static> {
    let color = if value > 0.0 {
        Color::Green
    } else if value < 0.0 {
        Color::Red
    } else {
        Color::Gray
    };
    Span::styled(format!("{label} {value:+.1}%"), Style::default().fg(color))
}

fn history_chart<F: Fn(&TestRecord) -> f64>(
    report: &StatisticsReport,
    title: &str,
    f: F,
    color: Color,
    area: Rect,
    buf: &mut Buffer,
) {
    let points = report.series(f);
    let values: Vec<f64> = points.iter().map(|p| p.1).collect();
    let [low, high] = padded_bounds(&values);
    let tests = (points.len() as f64).max(1.0);

    let datasets = vec![Dataset::default()
        .marker(ratatui::symbols::Marker::Braille)
        .style(Style::default().fg(color))
        .graph_type(GraphType::Line)
        .data(&points)];

    let bold = Style::default().add_modifier(Modifier::BOLD);
    Chart::new(datasets)
        .block(Block::default().title(title.to_string()))
        .x_axis(
            Axis::default()
                .title("test")
                .bounds([1.0, tests])
                .labels(vec![
                    Span::styled("1", bold),
                    Span::styled(format_label(tests), bold),
                ]),
        )
        .y_axis(
            Axis::default()
                .bounds([low, high])
                .labels(vec![
                    Span::styled(format_label(low), bold),
                    Span::styled(format_label(high), bold),
                ]),
        )
        .render(area, buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use keytempo::{config::Config, config::MemoryConfigStore, history::ResultLog};
    use std::sync::mpsc;

    use crate::{AppState, Services};

    fn record(cpm: f64, accuracy: f64, time: f64) -> TestRecord {
        TestRecord {
            id: None,
            user_id: "local".into(),
            chars_per_minute: cpm,
            accuracy,
            time_seconds: time,
            language: "ru".into(),
            difficulty: "easy".into(),
            created_at: None,
        }
    }

    fn app_with(view: StatisticsView) -> (App, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let (tx, _rx) = mpsc::channel();
        let mut app = App::new(
            Config {
                offline: true,
                ..Config::default()
            },
            Some("ok".into()),
            Services::offline(ResultLog::new(dir.path().join("results.csv"))),
            Box::new(MemoryConfigStore::default()),
            tx,
        );
        app.state = AppState::Statistics;
        app.statistics = view;
        (app, dir)
    }

    fn rendered(app: &App) -> String {
        let area = Rect::new(0, 0, 100, 30);
        let mut buffer = Buffer::empty(area);
        render_statistics(app, area, &mut buffer);
        buffer.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_loaded_report_shows_cards() {
        let report = StatisticsReport::from_records(
            "local",
            vec![record(200.0, 90.0, 40.0), record(260.0, 96.0, 31.0)],
        )
        .unwrap();
        let (app, _dir) = app_with(StatisticsView::Loaded(Box::new(report)));
        let content = rendered(&app);

        assert!(content.contains("Statistics · 2 tests"));
        assert!(content.contains("Last test"));
        assert!(content.contains("260 cpm"));
        assert!(content.contains("0:31"));
        assert!(content.contains("speed +100.0%"));
    }

    #[test]
    fn test_failure_is_shown() {
        let (app, _dir) = app_with(StatisticsView::Failed("server unreachable".into()));
        assert!(rendered(&app).contains("server unreachable"));
    }

    #[test]
    fn test_loading_placeholder() {
        let (app, _dir) = app_with(StatisticsView::Loading);
        assert!(rendered(&app).contains("loading statistics"));
    }
}
