use crate::{
    metrics::{BatteryStatus, Reading, SeriesKey},
    monitor::Monitor,
    ui::{state::UiState, theme::Theme},
};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    macros::*,
    prelude::*,
    style::Stylize,
    widgets::*,
};

/// Temperature gauges read full at this many degrees.
const TEMPERATURE_FULL_SCALE: f64 = 50.0;

/// Sparkline values are scaled by this to keep one decimal of precision.
const SPARK_SCALE: f64 = 10.0;

/// Headline text for a series.
pub fn readout(key: SeriesKey, reading: &Reading) -> String {
    match key {
        SeriesKey::Cpu => format!("{:.1}%", reading.cpu),
        SeriesKey::Memory => format!("{:.1} MB", reading.memory.used_mb),
        SeriesKey::Battery => format!("{:.1}%", reading.battery),
        SeriesKey::Temperature => format!("{:.1}°C", reading.temperature),
    }
}

/// Map a charted value onto `[0, 100]` for gauges and sparklines.
pub fn gauge_percent(key: SeriesKey, value: f64) -> f64 {
    let percent = match key {
        SeriesKey::Temperature => value / TEMPERATURE_FULL_SCALE * 100.0,
        _ => value,
    };
    if percent.is_finite() {
        percent.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Small card for one metric:
///
/// ```"not rust"
/// ╭ CPU ─────────────────────────╮
/// │ 42.5%                        │
/// │ ██████████▌                  │
/// │ ▁▂▂▃▅▆▇▅▃▂▂▁                 │
/// ╰──────────────────────────────╯
/// ```
pub struct MetricCard<'a> {
    pub key: SeriesKey,
    pub monitor: &'a Monitor,
    pub ui: &'a UiState,
}

impl MetricCard<'_> {
    fn subtitle(&self, reading: &Reading) -> Option<Span<'static>> {
        match self.key {
            SeriesKey::Memory => Some(span!(
                self.ui.theme.primary_background;
                "{:.0}% of {:.0} MB",
                reading.memory.used_percent,
                reading.memory.total_kb as f64 / 1024.0
            )),
            SeriesKey::Battery => {
                let status = BatteryStatus::from_level(reading.battery);
                Some(Span::styled(
                    status.label(),
                    self.ui.theme.battery_status(status),
                ))
            }
            _ => None,
        }
    }

    fn sparkline_data(&self) -> Vec<u64> {
        self.monitor
            .series
            .values_of(self.key)
            .into_iter()
            .map(|v| (gauge_percent(self.key, v) * SPARK_SCALE).round() as u64)
            .collect()
    }
}

impl Widget for MetricCard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let theme: &Theme = &self.ui.theme;
        let color = theme.series(self.key);
        let selected = self.ui.selected == self.key;
        let border_color = if selected {
            theme.accent
        } else {
            theme.primary_background
        };
        let border = Block::bordered()
            .title_top(ratatui::macros::line![" ", self.key.name().fg(color).bold(), " "])
            .border_style(Style::default().bg(theme.surface).fg(border_color))
            .bg(theme.surface)
            .border_type(BorderType::Rounded);
        let inner = border.inner(area);
        border.render(area, buf);

        let Some(reading) = self.monitor.latest else {
            let text = Text::from("No Data Yet");
            let area = inner.centered(
                Constraint::Length(text.width() as u16),
                Constraint::Length(1),
            );
            text.render(area, buf);
            return;
        };

        let [top, middle, bottom] = vertical![==1, ==1, ==1].areas(inner);
        let [value, extra] = horizontal![*=1, *=1].areas(top);
        Text::from(readout(self.key, &reading))
            .fg(Theme::lighten(color, 0.5))
            .bold()
            .render(value, buf);
        if let Some(subtitle) = self.subtitle(&reading) {
            Line::from(subtitle)
                .alignment(Alignment::Right)
                .render(extra, buf);
        }

        let percent = gauge_percent(self.key, self.key.value_of(&reading));
        Gauge::default()
            .ratio(percent / 100.0)
            .label("")
            .use_unicode(true)
            .gauge_style(Style::default().fg(color).bg(Theme::darken(color, 0.8)))
            .render(middle, buf);

        let data = self.sparkline_data();
        Sparkline::default()
            .data(data)
            .max((100.0 * SPARK_SCALE) as u64)
            .fg(color)
            .render(bottom, buf);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::metrics::MemoryUsage;

    fn reading() -> Reading {
        Reading {
            cpu: 42.5,
            memory: MemoryUsage::from_kb(1_000_000, 400_000),
            battery: 85.0,
            temperature: 25.3,
        }
    }

    #[test]
    fn readouts() {
        let r = reading();
        assert_eq!(readout(SeriesKey::Cpu, &r), "42.5%");
        assert_eq!(readout(SeriesKey::Memory, &r), "585.9 MB");
        assert_eq!(readout(SeriesKey::Battery, &r), "85.0%");
        assert_eq!(readout(SeriesKey::Temperature, &r), "25.3°C");
    }

    #[test]
    fn gauges_are_bounded() {
        assert_eq!(gauge_percent(SeriesKey::Cpu, 150.0), 100.0);
        assert_eq!(gauge_percent(SeriesKey::Battery, -3.0), 0.0);
        assert_eq!(gauge_percent(SeriesKey::Temperature, 25.0), 50.0);
        assert_eq!(gauge_percent(SeriesKey::Temperature, 80.0), 100.0);
        assert_eq!(gauge_percent(SeriesKey::Memory, f64::NAN), 0.0);
    }

    #[test]
    fn renders_placeholder_then_values() {
        let ui = UiState::default();
        let mut monitor = Monitor::new(20);
        let area = Rect::new(0, 0, 30, 5);

        let mut buf = Buffer::empty(area);
        MetricCard {
            key: SeriesKey::Cpu,
            monitor: &monitor,
            ui: &ui,
        }
        .render(area, &mut buf);
        assert!(buffer_text(&buf).contains("No Data Yet"));

        monitor.series.push_reading("10:00:00", &reading());
        monitor.latest = Some(reading());
        let mut buf = Buffer::empty(area);
        MetricCard {
            key: SeriesKey::Battery,
            monitor: &monitor,
            ui: &ui,
        }
        .render(area, &mut buf);
        let text = buffer_text(&buf);
        assert!(text.contains("Battery"));
        assert!(text.contains("85.0%"));
        assert!(text.contains("Charged"));
    }

    pub(crate) fn buffer_text(buf: &Buffer) -> String {
        buf.content().iter().map(|c| c.symbol()).collect()
    }
}
