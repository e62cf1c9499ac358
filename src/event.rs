use std::time::Duration;

use color_eyre::eyre::{OptionExt, Result};
use crossterm::event::Event as CrosstermEvent;
use futures::{FutureExt, StreamExt};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::{
    metrics::DeviceStatus,
    monitor::{CycleToken, MetricsUpdate},
};

/// Frequency of UI tick events.
pub const TICK_FPS: f64 = 30.0;

#[derive(Clone, Debug)]
pub enum Event {
    /// Emitted at [`TICK_FPS`] to drive animations.
    Tick,
    Crossterm(CrosstermEvent),
    App(AppEvent),
}

#[derive(Clone, Debug)]
pub enum AppEvent {
    Quit,
    Reload,
    /// Ask the backend whether a device is attached.
    CheckStatus,
    /// Status reply for the poller epoch that asked; `None` when the
    /// request itself failed.
    Status(u32, Option<DeviceStatus>),
    /// A poll cycle completed and was normalized.
    Metrics(MetricsUpdate),
    PollFailed(CycleToken, String),
}

#[derive(Debug)]
pub struct EventHandler {
    sender: UnboundedSender<Event>,
    receiver: UnboundedReceiver<Event>,
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHandler {
    /// Spawns the terminal/tick reader and hands back the receiving end.
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let actor = EventTask::new(sender.clone());
        tokio::spawn(async { actor.run().await });
        Self { sender, receiver }
    }

    pub async fn next(&mut self) -> Result<Event> {
        self.receiver
            .recv()
            .await
            .ok_or_eyre("Event channel closed")
    }

    pub fn send(&mut self, app_event: AppEvent) {
        // The receiver lives as long as self.
        let _ = self.sender.send(Event::App(app_event));
    }

    pub fn clone_sender(&self) -> UnboundedSender<Event> {
        self.sender.clone()
    }
}

struct EventTask {
    sender: UnboundedSender<Event>,
}

impl EventTask {
    fn new(sender: UnboundedSender<Event>) -> Self {
        Self { sender }
    }

    async fn run(self) -> Result<()> {
        let tick_rate = Duration::from_secs_f64(1.0 / TICK_FPS);
        let mut reader = crossterm::event::EventStream::new();
        let mut tick = tokio::time::interval(tick_rate);
        loop {
            let tick_delay = tick.tick();
            let crossterm_event = reader.next().fuse();
            tokio::select! {
              _ = self.sender.closed() => {
                break;
              }
              _ = tick_delay => {
                self.send(Event::Tick);
              }
              Some(Ok(evt)) = crossterm_event => {
                self.send(Event::Crossterm(evt));
              }
            };
        }
        Ok(())
    }

    fn send(&self, event: Event) {
        let _ = self.sender.send(event);
    }
}
