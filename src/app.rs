use std::path::PathBuf;

use crate::{
    backend::Backend,
    config::{ConfigManager, DroidmonConfig},
    event::{AppEvent, Event, EventHandler},
    metrics::{SeriesKey, SeriesStore},
    monitor::{Connection, Monitor},
    poller::Poller,
    ui::{
        dashboard::DashboardWidget,
        state::{Focussable, UiState},
    },
};
use color_eyre::eyre::Result;
use log::*;
use ratatui::{
    DefaultTerminal,
    buffer::Buffer,
    crossterm::event::{KeyCode, KeyEvent, KeyModifiers},
    layout::Rect,
    prelude::*,
};
use tui_logger::TuiWidgetEvent;

pub struct App {
    pub running: bool,
    pub events: EventHandler,
    pub config: ConfigManager,
    pub monitor: Monitor,
    pub ui_state: UiState,
    backend: Option<Backend>,
    poller: Option<Poller>,
    epoch: u32,
}

impl App {
    pub fn new(config_path: PathBuf, url_override: Option<String>) -> Result<Self> {
        let events = EventHandler::new();
        let config = ConfigManager::new(config_path, url_override, events.clone_sender())?;
        let capacity = config.current().history_capacity();
        Ok(Self {
            running: true,
            events,
            config,
            monitor: Monitor::new(capacity),
            ui_state: UiState::default(),
            backend: None,
            poller: None,
            epoch: 0,
        })
    }

    /// Run the application's main loop.
    pub async fn run(&mut self, mut terminal: DefaultTerminal) -> Result<()> {
        if let Err(err) = self.start(self.config.current()) {
            error!(target: "App", "Failed to start: {:#}", err);
        }
        while self.running {
            terminal.draw(|frame| self.render(frame.area(), frame.buffer_mut()))?;
            let event = self.events.next().await?;
            self.handle_event(event)?;
        }
        self.stop();
        Ok(())
    }

    pub fn handle_event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Tick => self.tick(),
            Event::Crossterm(event) => match event {
                crossterm::event::Event::Key(key_event)
                    if key_event.kind == crossterm::event::KeyEventKind::Press =>
                {
                    self.handle_key_events(key_event)?
                }
                _ => {}
            },
            Event::App(app_event) => match app_event {
                AppEvent::Quit => self.quit(),
                AppEvent::Reload => self.reload_config(),
                AppEvent::CheckStatus => self.check_status(),
                AppEvent::Status(epoch, _) if !self.is_current_epoch(epoch) => {
                    debug!(target: "App", "Dropping status reply from epoch {}", epoch)
                }
                AppEvent::Status(_, Some(status)) => self.monitor.set_status(status.into()),
                AppEvent::Status(_, None) => {
                    let adb_available = match &self.monitor.connection {
                        Connection::Connected { adb_available }
                        | Connection::Disconnected { adb_available } => *adb_available,
                        Connection::Unknown => None,
                    };
                    self.monitor
                        .set_status(Connection::Disconnected { adb_available })
                }
                AppEvent::Metrics(update) => {
                    if self.monitor.apply(update) {
                        self.ui_state
                            .update_process_count(self.monitor.processes.len());
                    }
                }
                AppEvent::PollFailed(token, reason) => {
                    if self.is_current_epoch(token.epoch) {
                        self.monitor.record_failure(reason);
                    }
                }
            },
        }
        Ok(())
    }

    /// Handles the key events and updates the state of [`App`].
    pub fn handle_key_events(&mut self, key_event: KeyEvent) -> Result<()> {
        match key_event.code {
            KeyCode::Esc | KeyCode::Char('q') => self.events.send(AppEvent::Quit),
            KeyCode::Char('c' | 'C') if key_event.modifiers == KeyModifiers::CONTROL => {
                self.events.send(AppEvent::Quit)
            }
            KeyCode::Char('r') => self.events.send(AppEvent::Reload),
            KeyCode::Char('s') => self.events.send(AppEvent::CheckStatus),
            KeyCode::Char('d') => self.ui_state.toggle_debug(),
            KeyCode::Char(c @ '1'..='4') => {
                let index = c as usize - '1' as usize;
                self.ui_state.select(SeriesKey::ALL[index]);
            }
            KeyCode::Right => self.ui_state.select(self.ui_state.selected.next()),
            KeyCode::Left => self.ui_state.select(self.ui_state.selected.prev()),
            KeyCode::Tab => self.ui_state.focus_next(),
            KeyCode::BackTab => self.ui_state.focus_prev(),
            KeyCode::Up | KeyCode::Down | KeyCode::PageUp | KeyCode::PageDown => {
                self.scroll(key_event.code)
            }
            _ => {}
        }
        Ok(())
    }

    fn scroll(&mut self, code: KeyCode) {
        match self.ui_state.focus {
            Some(Focussable::Processes) => {
                let delta = match code {
                    KeyCode::Up => -1,
                    KeyCode::Down => 1,
                    KeyCode::PageUp => -10,
                    _ => 10,
                };
                self.ui_state
                    .scroll_processes(delta, self.monitor.processes.len());
            }
            Some(Focussable::Logs) => {
                let event = match code {
                    KeyCode::Up => TuiWidgetEvent::UpKey,
                    KeyCode::Down => TuiWidgetEvent::DownKey,
                    KeyCode::PageUp => TuiWidgetEvent::PrevPageKey,
                    _ => TuiWidgetEvent::NextPageKey,
                };
                self.ui_state.logger_state.transition(event);
            }
            _ => {}
        }
    }

    /// Handles the tick event of the terminal.
    fn tick(&mut self) {
        self.ui_state.tick();
    }

    /// Set running to false to quit the application.
    fn quit(&mut self) {
        self.running = false;
    }

    /// Replies from a replaced poller's backend no longer count.
    fn is_current_epoch(&self, epoch: u32) -> bool {
        self.poller.as_ref().is_some_and(|p| p.epoch() == epoch)
    }

    fn reload_config(&mut self) {
        debug!(target: "App", "Reload!");
        match self.config.reload() {
            Ok(config) => {
                if let Err(e) = self.start(config) {
                    error!(target: "App", "{:#}", e);
                }
            }
            Err(e) => error!(target: "App", "{:#}", e),
        }
    }

    /// (Re)start polling with the given settings. The previous poller and
    /// its in-flight requests are cancelled first; the new one runs under a
    /// fresh epoch so its cycles order after everything the old one sent.
    fn start(&mut self, config: DroidmonConfig) -> Result<()> {
        self.stop();
        let capacity = config.history_capacity();
        if capacity != self.monitor.series.capacity() {
            info!(target: "App", "History capacity changed to {}", capacity);
            self.monitor.series = SeriesStore::new(capacity);
        }
        let backend = Backend::new(&config.backend)?;
        self.epoch += 1;
        self.poller = Some(Poller::start(
            backend.clone(),
            config.poll_interval(),
            self.epoch,
            self.events.clone_sender(),
        ));
        self.backend = Some(backend);
        self.check_status();
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(poller) = self.poller.take() {
            debug!(target: "App", "Stopping poller (epoch {})", poller.epoch());
            poller.stop();
        }
    }

    /// Ask the backend for the device status without blocking the UI.
    fn check_status(&mut self) {
        let Some(backend) = self.backend.clone() else {
            warn!(target: "App", "No backend configured");
            return;
        };
        let sender = self.events.clone_sender();
        let epoch = self.epoch;
        tokio::spawn(async move {
            let status = match backend.status().await {
                Ok(status) => Some(status),
                Err(err) => {
                    warn!(target: "Backend", "Status check failed: {:#}", err);
                    None
                }
            };
            let _ = sender.send(Event::App(AppEvent::Status(epoch, status)));
        });
    }

    fn backend_url(&self) -> String {
        self.config.current().backend.url
    }
}

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let backend_url = self.backend_url();
        DashboardWidget {
            ui: &self.ui_state,
            monitor: &self.monitor,
            backend_url: &backend_url,
        }
        .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::{
        metrics::{DeviceStatus, Reading},
        monitor::{CycleToken, MetricsUpdate},
    };

    fn app() -> App {
        let dir = tempfile::tempdir().unwrap();
        App::new(dir.path().join("missing.toml"), None).unwrap()
    }

    fn status(epoch: u32, connected: Option<bool>) -> Event {
        Event::App(AppEvent::Status(
            epoch,
            connected.map(|device_connected| DeviceStatus {
                device_connected,
                adb_available: Some(true),
            }),
        ))
    }

    fn key(code: KeyCode) -> Event {
        Event::Crossterm(crossterm::event::Event::Key(KeyEvent::new(
            code,
            KeyModifiers::NONE,
        )))
    }

    fn metrics(epoch: u32, cycle: u64, cpu: f64) -> Event {
        Event::App(AppEvent::Metrics(MetricsUpdate {
            token: CycleToken::new(epoch, cycle),
            label: format!("10:00:{cycle:02}"),
            reading: Reading {
                cpu,
                ..Default::default()
            },
            processes: None,
        }))
    }

    #[tokio::test]
    async fn series_selection_keys() {
        let mut app = app();
        app.handle_event(key(KeyCode::Char('3'))).unwrap();
        assert_eq!(app.ui_state.selected, SeriesKey::Battery);
        app.handle_event(key(KeyCode::Right)).unwrap();
        assert_eq!(app.ui_state.selected, SeriesKey::Temperature);
        app.handle_event(key(KeyCode::Right)).unwrap();
        assert_eq!(app.ui_state.selected, SeriesKey::Cpu);
        app.handle_event(key(KeyCode::Left)).unwrap();
        assert_eq!(app.ui_state.selected, SeriesKey::Temperature);
    }

    #[tokio::test]
    async fn quit_key_round_trips_through_events() {
        let mut app = app();
        app.handle_event(key(KeyCode::Char('q'))).unwrap();
        assert!(app.running);
        loop {
            match app.events.next().await.unwrap() {
                event @ Event::App(_) => {
                    app.handle_event(event).unwrap();
                    break;
                }
                _ => continue,
            }
        }
        assert!(!app.running);
    }

    #[tokio::test]
    async fn metrics_events_feed_the_monitor() {
        let mut app = app();
        app.handle_event(metrics(1, 2, 40.0)).unwrap();
        app.handle_event(metrics(1, 1, 10.0)).unwrap();
        assert_eq!(app.monitor.series.values_of(SeriesKey::Cpu), vec![40.0]);
        assert_eq!(app.monitor.latest.map(|r| r.cpu), Some(40.0));
    }

    #[tokio::test]
    async fn failed_status_keeps_adb_flag() {
        let mut app = app();
        app.start(app.config.current()).unwrap();
        app.handle_event(status(app.epoch, Some(true))).unwrap();
        app.handle_event(status(app.epoch, None)).unwrap();
        assert_eq!(
            app.monitor.connection,
            Connection::Disconnected {
                adb_available: Some(true)
            }
        );
        app.stop();
    }

    #[tokio::test]
    async fn status_from_replaced_backend_is_dropped() {
        let mut app = app();
        app.start(app.config.current()).unwrap();
        app.start(app.config.current()).unwrap();
        app.handle_event(status(app.epoch, Some(true))).unwrap();
        // The first backend's request times out after the second answered.
        app.handle_event(status(app.epoch - 1, None)).unwrap();
        app.handle_event(status(app.epoch - 1, Some(false))).unwrap();
        assert_eq!(
            app.monitor.connection,
            Connection::Connected {
                adb_available: Some(true)
            }
        );
        app.stop();
    }

    #[tokio::test]
    async fn status_before_polling_starts_is_dropped() {
        let mut app = app();
        app.handle_event(status(0, Some(true))).unwrap();
        assert_eq!(app.monitor.connection, Connection::Unknown);
    }

    #[tokio::test]
    async fn failures_from_replaced_pollers_are_ignored() {
        let mut app = app();
        app.start(app.config.current()).unwrap();
        app.handle_event(Event::App(AppEvent::PollFailed(
            CycleToken::new(app.epoch, 1),
            "boom".to_string(),
        )))
        .unwrap();
        app.start(app.config.current()).unwrap();
        app.handle_event(Event::App(AppEvent::PollFailed(
            CycleToken::new(app.epoch - 1, 2),
            "late".to_string(),
        )))
        .unwrap();
        assert_eq!(app.monitor.failures, 1);
        assert_eq!(app.monitor.last_error.as_deref(), Some("boom"));
        app.stop();
    }

    #[tokio::test]
    async fn reload_applies_new_capacity_under_a_new_epoch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("droidmon.toml");
        std::fs::write(&path, "history_capacity = 20\n").unwrap();
        let mut app = App::new(path.clone(), None).unwrap();
        app.start(app.config.current()).unwrap();
        let first_epoch = app.epoch;
        app.handle_event(metrics(first_epoch, 1, 10.0)).unwrap();
        assert_eq!(app.monitor.series.len(), 1);

        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "history_capacity = 5").unwrap();
        drop(file);
        app.handle_event(Event::App(AppEvent::Reload)).unwrap();

        assert_eq!(app.epoch, first_epoch + 1);
        assert_eq!(app.monitor.series.capacity(), 5);
        assert!(app.monitor.series.is_empty());
        // The new poller's first cycle beats a late reply from the old one.
        app.handle_event(metrics(app.epoch, 1, 30.0)).unwrap();
        app.handle_event(metrics(first_epoch, 2, 20.0)).unwrap();
        assert_eq!(app.monitor.series.values_of(SeriesKey::Cpu), vec![30.0]);
        app.stop();
    }

    #[tokio::test]
    async fn reload_with_same_capacity_keeps_history() {
        let mut app = app();
        app.start(app.config.current()).unwrap();
        app.handle_event(metrics(app.epoch, 1, 10.0)).unwrap();
        app.handle_event(Event::App(AppEvent::Reload)).unwrap();
        assert_eq!(app.epoch, 2);
        assert_eq!(app.monitor.series.values_of(SeriesKey::Cpu), vec![10.0]);
        app.stop();
    }
}
