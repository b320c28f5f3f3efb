/*
 * This file is part of it87mon.
 *
 * Copyright (C) 2025 it87mon contributors
 *
 * it87mon is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * it87mon is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with it87mon. If not, see <https://www.gnu.org/licenses/>.
 */

use ratatui::layout::{Alignment, Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::widgets::{Block, BorderType, Borders, List, ListItem, ListState, Paragraph};

use crate::app::{App, Focus, Metric};

fn list_state(len: usize, idx: usize) -> ListState {
    let mut state = ListState::default();
    if len > 0 {
        // row 0 is the column header
        state.select(Some(idx + 1));
    }
    state
}

pub fn ui(f: &mut Frame, app: &App) {
    let size = f.area();

    // header | columns | chip | status
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(size);

    let header_cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(80), Constraint::Percentage(20)])
        .split(chunks[0]);

    let header_text = format!(
        " Motherboard: {}    |    Source: {}    |    Polls: {} ",
        if app.board_name.is_empty() { "?" } else { &app.board_name },
        app.source,
        app.polls
    );
    let header = Paragraph::new(header_text).style(Style::default().fg(Color::Yellow));
    f.render_widget(header, header_cols[0]);

    let metric_label = match app.metric {
        Metric::C => "Metric: °C",
        Metric::F => "Metric: °F",
        Metric::K => "Metric: K",
    };
    let metric_widget = Paragraph::new(metric_label)
        .alignment(Alignment::Right)
        .style(Style::default().fg(Color::Gray));
    f.render_widget(metric_widget, header_cols[1]);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(33),
            Constraint::Percentage(34),
            Constraint::Percentage(33),
        ])
        .split(chunks[1]);

    let (temps, voltages, fans) = match &app.readings {
        Some(r) => (r.temps.as_slice(), r.voltages.as_slice(), r.fans.as_slice()),
        None => (&[][..], &[][..], &[][..]),
    };

    let highlight = Style::default().bg(Color::Blue).fg(Color::White);
    let focus_style = |focus: Focus| -> Style {
        if app.focus == focus {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        }
    };
    let panel = |title: String, focus: Focus| {
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .title(title)
            .border_style(focus_style(focus))
    };
    let header_style =
        Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD | Modifier::UNDERLINED);

    let unit = match app.metric {
        Metric::C => "°C",
        Metric::F => "°F",
        Metric::K => "K",
    };
    let mut temps_items: Vec<ListItem> = Vec::with_capacity(temps.len() + 1);
    temps_items.push(ListItem::new(format!("{:<20} {:>7}", "Name", unit)).style(header_style));
    temps_items.extend(temps.iter().map(|(name, c)| {
        let (val, unit_str) = app.convert_temp(*c);
        ListItem::new(format!("{:<20} {:>5.1} {}", name, val, unit_str))
    }));

    let mut volts_items: Vec<ListItem> = Vec::with_capacity(voltages.len() + 1);
    volts_items.push(ListItem::new(format!("{:<20} {:>7}", "Name", "V")).style(header_style));
    volts_items.extend(
        voltages
            .iter()
            .map(|(name, v)| ListItem::new(format!("{:<20} {:>7.3} V", name, v))),
    );

    let mut fans_items: Vec<ListItem> = Vec::with_capacity(fans.len() + 1);
    fans_items.push(ListItem::new(format!("{:<20} {:>6}", "Name", "RPM")).style(header_style));
    fans_items.extend(fans.iter().map(|(name, rpm)| {
        let item = ListItem::new(format!("{:<20} {:>6} RPM", name, rpm));
        if *rpm == 0 {
            item.style(Style::default().fg(Color::DarkGray))
        } else {
            item
        }
    }));

    let temps_list = List::new(temps_items)
        .block(panel(format!(" TEMP ({}) ", temps.len()), Focus::Temps))
        .highlight_style(highlight);
    let volts_list = List::new(volts_items)
        .block(panel(format!(" VOLTAGE ({}) ", voltages.len()), Focus::Voltages))
        .highlight_style(highlight);
    let fans_list = List::new(fans_items)
        .block(panel(format!(" FANS ({}) ", fans.len()), Focus::Fans))
        .highlight_style(highlight);

    let mut temps_state = list_state(temps.len(), app.temps_idx);
    let mut volts_state = list_state(voltages.len(), app.volts_idx);
    let mut fans_state = list_state(fans.len(), app.fans_idx);
    f.render_stateful_widget(temps_list, cols[0], &mut temps_state);
    f.render_stateful_widget(volts_list, cols[1], &mut volts_state);
    f.render_stateful_widget(fans_list, cols[2], &mut fans_state);

    let chip = &app.chip;
    let chip_lines = vec![
        Line::from(format!(
            "{} {} at 0x{:04x} ({} port range{})",
            chip.vendor_name(),
            chip.model_name(),
            chip.base_address(),
            chip.ports_count(),
            if chip.ports_count() == 1 { "" } else { "s" }
        )),
        Line::from(format!(
            "Channels: {} temperature, {} voltage, {} tachometer",
            chip.temperature_sensors_limit(),
            chip.voltage_sensors_limit(),
            chip.tachometer_sensors_limit()
        )),
        Line::from(format!("Refresh every {} ms", app.refresh_interval.as_millis())),
    ];
    let chip_block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(" CHIP ");
    f.render_widget(Paragraph::new(chip_lines).block(chip_block), chunks[2]);

    let status = Paragraph::new(app.status.as_str()).style(Style::default().fg(Color::Gray));
    f.render_widget(status, chunks[3]);
}
