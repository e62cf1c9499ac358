use crate::{
    metrics::ProcessRow,
    ui::state::{Focussable, UiState},
};
use ratatui::{buffer::Buffer, layout::Rect, prelude::*, style::Stylize, widgets::*};

pub const PLACEHOLDER: &str = "No process data";

/// Cell text for each row, or one placeholder row when there is nothing to
/// show.
pub fn table_rows(processes: &[ProcessRow]) -> Vec<[String; 4]> {
    if processes.is_empty() {
        return vec![[
            PLACEHOLDER.to_string(),
            "-".to_string(),
            "-".to_string(),
            "-".to_string(),
        ]];
    }
    processes
        .iter()
        .map(|p| {
            [
                p.name.clone(),
                p.pid.map(|pid| pid.to_string()).unwrap_or_default(),
                format!("{:.1}%", p.cpu),
                format!("{:.1} MB", p.memory_mb),
            ]
        })
        .collect()
}

/// Busiest processes first, as sorted by the poller.
///
/// ```"not rust"
/// ╭ Processes ────────────────────────────────────╮
/// │ Name                  PID     CPU     Memory  │
/// │ com.spotify.music     1234    2.3%    180.4 MB│
/// │ com.android.chrome    2210    1.1%    312.0 MB│
/// ╰───────────────────────────────────────────────╯
/// ```
pub struct ProcessTable<'a> {
    pub processes: &'a [ProcessRow],
    pub ui: &'a UiState,
}

impl Widget for ProcessTable<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let theme = &self.ui.theme;
        let border_color = if self.ui.is_focussed(Focussable::Processes) {
            theme.accent
        } else {
            theme.primary_background
        };
        let block = Block::bordered()
            .title_top(ratatui::macros::line![
                " ",
                "Processes".fg(theme.primary),
                format!(" ({}) ", self.processes.len()).fg(theme.foreground),
            ])
            .border_style(Style::default().bg(theme.surface).fg(border_color))
            .bg(theme.surface)
            .border_type(BorderType::Rounded);

        let header = Row::new(["Name", "PID", "CPU", "Memory"])
            .style(Style::default().fg(theme.primary).bold());
        let placeholder = self.processes.is_empty();
        let rows = table_rows(self.processes).into_iter().map(|cells| {
            let row = Row::new(cells);
            if placeholder {
                row.fg(theme.primary_background)
            } else {
                row.fg(theme.foreground)
            }
        });
        let widths = [
            Constraint::Fill(1),
            Constraint::Length(7),
            Constraint::Length(7),
            Constraint::Length(10),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .column_spacing(1)
            .block(block)
            .style(Style::default().bg(theme.surface));
        let mut state = TableState::default().with_offset(self.ui.process_offset);
        StatefulWidget::render(table, area, buf, &mut state);
    }
}
