use std::{fmt::Debug, time::Instant};

use crate::{event::TICK_FPS, metrics::SeriesKey, ui::theme::Theme};
use tui_logger::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focussable {
    Chart,
    Processes,
    Logs,
    Debug,
}

pub struct UiState {
    pub tick: f64,
    pub time: Instant,
    pub theme: Theme,
    pub focus: Option<Focussable>,
    /// Series drawn on the main chart.
    pub selected: SeriesKey,
    /// First visible row of the process table.
    pub process_offset: usize,
    pub debug: bool,
    pub logger_state: TuiWidgetState,
}

impl Debug for UiState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiState")
            .field("tick", &self.tick)
            .field("time", &self.time)
            .field("focus", &self.focus)
            .field("selected", &self.selected)
            .field("process_offset", &self.process_offset)
            .finish()
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            logger_state: TuiWidgetState::new(),
            tick: Default::default(),
            time: Instant::now(),
            theme: Theme::dark(),
            focus: None,
            selected: SeriesKey::Cpu,
            process_offset: 0,
            debug: false,
        }
    }
}

impl UiState {
    pub fn tick(&mut self) {
        self.tick += 1.0;
        if self.tick > 2.0 * TICK_FPS {
            self.tick = 0.0;
            self.time = Instant::now();
        }
    }

    pub fn step_of_8_in_1_second(&self) -> usize {
        (self.tick * 8.0 / TICK_FPS) as usize % 8
    }

    pub fn step_of_4_in_1_second(&self) -> usize {
        (self.tick * 4.0 / TICK_FPS) as usize % 4
    }

    pub fn select(&mut self, key: SeriesKey) {
        self.selected = key;
    }

    pub fn toggle_debug(&mut self) {
        self.debug = !self.debug;
        if !self.debug && self.focus == Some(Focussable::Debug) {
            self.focus = Some(Focussable::Chart);
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = match self.focus {
            None => Some(Focussable::Chart),
            Some(Focussable::Chart) => Some(Focussable::Processes),
            Some(Focussable::Processes) => Some(Focussable::Logs),
            Some(Focussable::Logs) if self.debug => Some(Focussable::Debug),
            Some(Focussable::Logs) | Some(Focussable::Debug) => Some(Focussable::Chart),
        }
    }

    pub fn focus_prev(&mut self) {
        self.focus = match self.focus {
            None => Some(Focussable::Chart),
            Some(Focussable::Chart) if self.debug => Some(Focussable::Debug),
            Some(Focussable::Chart) => Some(Focussable::Logs),
            Some(Focussable::Processes) => Some(Focussable::Chart),
            Some(Focussable::Logs) => Some(Focussable::Processes),
            Some(Focussable::Debug) => Some(Focussable::Logs),
        }
    }

    pub fn is_focussed(&self, target: Focussable) -> bool {
        self.focus == Some(target)
    }

    pub fn scroll_processes(&mut self, delta: isize, rows: usize) {
        let max = rows.saturating_sub(1);
        self.process_offset = self.process_offset.saturating_add_signed(delta).min(max);
    }

    /// Keep the scroll position valid after the table shrank.
    pub fn update_process_count(&mut self, rows: usize) {
        self.process_offset = self.process_offset.min(rows.saturating_sub(1));
    }
}
