use ratatui::Frame;

use crate::{ui::statistics::render_statistics, App, AppState};

/// A UI Screen boundary: responsible for rendering one app state
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame);
}

/// Loading, typing and results all render through the App widget
pub struct SessionScreen;

impl Screen for SessionScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        f.render_widget(app, f.area());
    }
}

pub struct StatisticsScreen;

impl Screen for StatisticsScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_statistics(app, f.area(), f.buffer_mut());
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: &AppState) -> Box<dyn Screen> {
    match state {
        AppState::Loading | AppState::Typing | AppState::Results => Box::new(SessionScreen),
        AppState::Statistics => Box::new(StatisticsScreen),
    }
}
