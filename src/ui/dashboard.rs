use std::time::{Duration, Instant};

use crate::{
    metrics::SeriesKey,
    monitor::{Connection, Monitor},
    ui::{
        card::MetricCard,
        chart::SeriesChart,
        debug::DebugWidget,
        process::ProcessTable,
        state::{Focussable, UiState},
    },
};
use ratatui::{buffer::Buffer, layout::Rect, macros::*, prelude::*, style::Stylize, widgets::*};
use tui_logger::*;

/// How long after the last applied cycle the header still shows live signal.
const FRESH_WINDOW: Duration = Duration::from_secs(5);

pub struct DashboardWidget<'a> {
    pub ui: &'a UiState,
    pub monitor: &'a Monitor,
    pub backend_url: &'a str,
}

impl DashboardWidget<'_> {
    fn signal_throbber(&self) -> &'static str {
        const FRAMES: [&str; 4] = ["ᔐ", "ᯇ", "ᔑ", "ᯇ"];
        FRAMES[self.ui.step_of_4_in_1_second()]
    }

    fn waiting_throbber(&self) -> &'static str {
        const FRAMES: [&str; 8] = ["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];
        FRAMES[self.ui.step_of_8_in_1_second()]
    }

    fn connection_spans(&self) -> Vec<Span<'static>> {
        let theme = &self.ui.theme;
        let adb = |available: Option<bool>| match available {
            Some(true) => Span::from(" adb ").fg(theme.primary_background),
            Some(false) => Span::from(" no adb ").fg(theme.error),
            None => Span::from(""),
        };
        match &self.monitor.connection {
            Connection::Unknown => vec![
                Span::from("○").fg(theme.primary_background),
                Span::from(" Checking device").fg(theme.foreground),
            ],
            Connection::Connected { adb_available } => vec![
                Span::from("●").fg(theme.success),
                Span::from(" Device connected").fg(theme.foreground),
                adb(*adb_available),
            ],
            Connection::Disconnected { adb_available } => vec![
                Span::from("●").fg(theme.error),
                Span::from(" Device not connected").fg(theme.foreground),
                adb(*adb_available),
            ],
        }
    }

    fn header(&self, area: Rect, buf: &mut Buffer) {
        let theme = &self.ui.theme;
        let [left, right] = horizontal![*=2, *=1].areas(area);
        let mut spans = vec![
            Span::from(" droidmon ").fg(theme.primary).bold(),
            Span::from(self.backend_url.to_string()).fg(theme.primary_background),
            Span::from("  "),
        ];
        spans.extend(self.connection_spans());
        Line::from(spans).render(left, buf);

        let signal = match &self.monitor.last_label {
            Some(label) if self.monitor.is_fresh(Instant::now(), FRESH_WINDOW) => {
                vec![
                    Span::from(self.signal_throbber()).fg(theme.success),
                    Span::from(format!(" {label}")).fg(theme.foreground),
                ]
            }
            Some(label) => vec![
                Span::from("ᯇ").fg(theme.accent),
                Span::from(format!(" {label}")).fg(theme.primary_background),
            ],
            None => vec![
                Span::from(self.waiting_throbber()).fg(theme.primary),
                Span::from(" waiting").fg(theme.primary_background),
            ],
        };
        let mut spans = signal;
        if self.monitor.failures > 0 {
            spans.push(Span::from(format!("  {} failed", self.monitor.failures)).fg(theme.error));
        }
        if let Some(reason) = &self.monitor.last_error {
            spans.push(Span::from(format!(": {reason}")).fg(theme.error));
        }
        spans.push(Span::from(" "));
        Line::from(spans)
            .alignment(Alignment::Right)
            .render(right, buf);
    }

    fn logs(&self, area: Rect, buf: &mut Buffer) {
        let panel_style = Style::default()
            .bg(self.ui.theme.surface)
            .fg(self.ui.theme.foreground);
        let border_color = match self.ui.focus {
            Some(Focussable::Logs) => self.ui.theme.accent,
            _ => self.ui.theme.foreground,
        };
        TuiLoggerSmartWidget::default()
            .style_error(panel_style.fg(self.ui.theme.error))
            .style_debug(panel_style)
            .style_warn(panel_style.fg(self.ui.theme.warning))
            .style_trace(panel_style)
            .style_info(panel_style)
            .style(panel_style)
            .border_style(panel_style.fg(border_color))
            .output_separator(':')
            .output_timestamp(Some("%H:%M:%S".to_string()))
            .output_level(Some(TuiLoggerLevelOutput::Abbreviated))
            .output_target(true)
            .output_file(false)
            .output_line(false)
            .state(&self.ui.logger_state)
            .render(area, buf);
    }
}

/// ```"not rust"
///  droidmon http://127.0.0.1:5000  ● Device connected adb        ᔐ 10:00:20
/// ╭ CPU ────────╮╭ Memory ─────╮╭ Battery ────╮╭ Temperature ╮
/// ╰─────────────╯╰─────────────╯╰─────────────╯╰─────────────╯
/// ╭ 1 CPU 2 Memory 3 Battery 4 Temperature ───╮╭ Processes ──╮
/// ╰───────────────────────────────────────────╯╰─────────────╯
/// ╭ logs ─────────────────────────────────────────────────────╮
/// ╰───────────────────────────────────────────────────────────╯
/// ```
impl Widget for &DashboardWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);
        let main_style = Style::default()
            .bg(self.ui.theme.background)
            .fg(self.ui.theme.foreground);
        Block::new().style(main_style).render(area, buf);

        let [header_rect, window_rect, log_rect] = vertical![==1, >=10, ==10].areas(area);
        self.header(header_rect, buf);
        self.logs(log_rect, buf);

        let main_rect = if self.ui.debug {
            let [main_rect, panel_rect] = horizontal![>=5, ==40].areas(window_rect);
            DebugWidget {
                ui: self.ui,
                monitor: self.monitor,
            }
            .render(panel_rect, buf);
            main_rect
        } else {
            window_rect
        };

        let [cards_rect, body_rect] = vertical![==5, *=1].areas(main_rect);
        let cards = Layout::horizontal(SeriesKey::ALL.map(|_| Constraint::Fill(1)))
            .spacing(1)
            .horizontal_margin(1)
            .split(cards_rect);
        for (key, area) in SeriesKey::ALL.into_iter().zip(cards.iter()) {
            MetricCard {
                key,
                monitor: self.monitor,
                ui: self.ui,
            }
            .render(*area, buf);
        }

        let [chart_rect, table_rect] = Layout::horizontal([Constraint::Fill(3), Constraint::Fill(2)])
            .spacing(1)
            .horizontal_margin(1)
            .areas(body_rect);
        SeriesChart {
            monitor: self.monitor,
            ui: self.ui,
        }
        .render(chart_rect, buf);
        ProcessTable {
            processes: &self.monitor.processes,
            ui: self.ui,
        }
        .render(table_rect, buf);
    }
}
