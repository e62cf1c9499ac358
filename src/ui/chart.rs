use crate::{
    metrics::{SeriesKey, SeriesStore},
    monitor::Monitor,
    ui::state::{Focussable, UiState},
};
use ratatui::{
    buffer::Buffer, layout::Rect, macros::line as rline, prelude::*, style::Stylize, widgets::*,
};

/// Every series shares this y range.
pub const Y_BOUNDS: [f64; 2] = [0.0, 100.0];

/// Points are placed by position, not by time: the four series are appended
/// together so index `i` is the same cycle in all of them.
pub fn chart_points(values: &[f64]) -> Vec<(f64, f64)> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| (i as f64, *v))
        .collect()
}

/// First, middle and last time label of the shared x axis.
pub fn axis_labels(series: &SeriesStore) -> Vec<String> {
    let labels = series.labels_of(SeriesKey::Cpu);
    match labels.len() {
        0 => vec![],
        1 => labels,
        2 => labels,
        n => vec![
            labels[0].clone(),
            labels[(n - 1) / 2].clone(),
            labels[n - 1].clone(),
        ],
    }
}

/// The large chart for the selected series.
///
/// ```"not rust"
/// ╭ CPU  Memory  Battery  Temperature ─────────────────────╮
/// │100 │                                                    │
/// │    │        ⢀⡠⠤⠒⠉⠉⠑⠢⡀                                   │
/// │  0 │⠤⠔⠒⠉⠁            ⠈⠒⠤⠤⠤                              │
/// │    └────────────────────────────────────────────────────│
/// │    10:00:01          10:00:10                  10:00:20 │
/// ╰─────────────────────────────────────────────────────────╯
/// ```
pub struct SeriesChart<'a> {
    pub monitor: &'a Monitor,
    pub ui: &'a UiState,
}

impl SeriesChart<'_> {
    fn title_line(&self) -> Line<'static> {
        let mut spans = vec![Span::from(" ")];
        for key in SeriesKey::ALL {
            let span = Span::from(format!("{} {} ", key.index() + 1, key.name()));
            spans.push(if key == self.ui.selected {
                span.fg(self.ui.theme.series(key)).bold()
            } else {
                span.fg(self.ui.theme.primary_background)
            });
        }
        Line::from(spans)
    }
}

impl Widget for SeriesChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let theme = &self.ui.theme;
        let border_color = if self.ui.is_focussed(Focussable::Chart) {
            theme.accent
        } else {
            theme.primary_background
        };
        let border = Block::bordered()
            .title_top(self.title_line())
            .border_style(Style::default().bg(theme.surface).fg(border_color))
            .bg(theme.surface)
            .border_type(BorderType::Rounded);
        let inner = border.inner(area);
        border.render(area, buf);

        let series = &self.monitor.series;
        if series.is_empty() {
            let text = Text::from("Waiting for data");
            let area = inner.centered(
                Constraint::Length(text.width() as u16),
                Constraint::Length(1),
            );
            text.render(area, buf);
            return;
        }

        let key = self.ui.selected;
        let data = chart_points(&series.values_of(key));
        let legend = match series.latest(key) {
            Some(value) => format!("{} {:.1}{}", key.name(), value, key.unit()),
            None => key.name().to_string(),
        };
        let dataset = Dataset::default()
            .name(legend)
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().bg(theme.surface).fg(theme.series(key)))
            .data(&data);
        let base_style = Style::default().bg(theme.surface).fg(theme.foreground);
        let x_max = (series.capacity().saturating_sub(1)).max(1) as f64;
        let x_axis = Axis::default()
            .style(base_style)
            .bounds([0.0, x_max])
            .labels(axis_labels(series).into_iter().map(Line::from));
        let y_axis = Axis::default()
            .title(key.unit())
            .style(base_style)
            .bounds(Y_BOUNDS)
            .labels([rline!["0"], rline!["50"], rline!["100"]]);
        Chart::new(vec![dataset])
            .x_axis(x_axis)
            .y_axis(y_axis)
            .style(base_style)
            .render(inner, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{metrics::Reading, ui::card::tests::buffer_text};

    #[test]
    fn points_by_position() {
        assert_eq!(
            chart_points(&[5.0, 7.5, 1.0]),
            vec![(0.0, 5.0), (1.0, 7.5), (2.0, 1.0)]
        );
        assert!(chart_points(&[]).is_empty());
    }

    #[test]
    fn axis_label_picks() {
        let mut series = SeriesStore::new(20);
        assert!(axis_labels(&series).is_empty());
        series.push_reading("a", &Reading::default());
        assert_eq!(axis_labels(&series), vec!["a"]);
        series.push_reading("b", &Reading::default());
        assert_eq!(axis_labels(&series), vec!["a", "b"]);
        for label in ["c", "d", "e"] {
            series.push_reading(label, &Reading::default());
        }
        assert_eq!(axis_labels(&series), vec!["a", "c", "e"]);
    }

    #[test]
    fn renders_waiting_then_chart() {
        let mut ui = UiState::default();
        let mut monitor = Monitor::new(20);
        let area = Rect::new(0, 0, 60, 12);
        let mut buf = Buffer::empty(area);
        SeriesChart {
            monitor: &monitor,
            ui: &ui,
        }
        .render(area, &mut buf);
        assert!(buffer_text(&buf).contains("Waiting for data"));

        monitor.series.push_reading("10:00:01", &Reading::default());
        monitor.series.push_reading("10:00:02", &Reading::default());
        ui.select(SeriesKey::Temperature);
        let mut buf = Buffer::empty(area);
        SeriesChart {
            monitor: &monitor,
            ui: &ui,
        }
        .render(area, &mut buf);
        let text = buffer_text(&buf);
        assert!(text.contains("4 Temperature"));
        assert!(text.contains("10:00:01"));
    }
}
