//! Fixed-cadence poll loop: fetch, normalize, and hand the result to the app
//! as an [`AppEvent`].
//!
//! Each tick spawns its own request so a slow backend never delays the timer.
//! Responses may therefore land out of order; every update carries a
//! [`CycleToken`] and the [`crate::monitor::Monitor`] drops stale ones.

use std::time::Duration;

use chrono::Local;
use color_eyre::eyre::Result;
use log::*;
use tokio::{
    sync::mpsc::UnboundedSender,
    task::{JoinHandle, JoinSet},
    time::{MissedTickBehavior, interval},
};

use crate::{
    backend::Backend,
    event::{AppEvent, Event},
    metrics::{Reading, process::sort_by_cpu},
    monitor::{CycleToken, MetricsUpdate},
};

pub const LABEL_FORMAT: &str = "%H:%M:%S";

#[derive(Debug)]
pub struct Poller {
    epoch: u32,
    handle: JoinHandle<()>,
}

impl Poller {
    /// Start polling immediately, then every `period`.
    pub fn start(
        backend: Backend,
        period: Duration,
        epoch: u32,
        sender: UnboundedSender<Event>,
    ) -> Self {
        info!(
            target: "Poller",
            "Polling {} every {:?} (epoch {})",
            backend.metrics_url(),
            period,
            epoch
        );
        let handle = tokio::spawn(poll_loop(backend, period, epoch, sender));
        Self { epoch, handle }
    }

    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    /// Cancel the timer and every request still in flight.
    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn poll_loop(backend: Backend, period: Duration, epoch: u32, sender: UnboundedSender<Event>) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // Dropped (and so aborted) together with this task.
    let mut in_flight = JoinSet::new();
    let mut cycle = 0;
    loop {
        ticker.tick().await;
        while in_flight.try_join_next().is_some() {}
        if sender.is_closed() {
            debug!(target: "Poller", "Event channel closed, stopping");
            return;
        }
        cycle += 1;
        let token = CycleToken::new(epoch, cycle);
        let backend = backend.clone();
        let sender = sender.clone();
        in_flight.spawn(async move {
            let event = match poll_once(&backend, token).await {
                Ok(update) => AppEvent::Metrics(update),
                Err(err) => {
                    warn!(target: "Poller", "Cycle {}.{} failed: {:#}", epoch, cycle, err);
                    AppEvent::PollFailed(token, format!("{:#}", err))
                }
            };
            let _ = sender.send(Event::App(event));
        });
    }
}

/// One fetch-normalize step, labelled with the local wall clock.
pub async fn poll_once(backend: &Backend, token: CycleToken) -> Result<MetricsUpdate> {
    let snapshot = backend.snapshot().await?;
    let label = Local::now().format(LABEL_FORMAT).to_string();
    Ok(MetricsUpdate {
        token,
        label,
        reading: Reading::from_snapshot(&snapshot),
        processes: snapshot.processes.as_deref().map(sort_by_cpu),
    })
}
