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

use std::time::{Duration, Instant};

use crate::config::MonitorConfig;
use crate::sensor::{ChannelLabels, ChipReadings, SensorChip};

pub const HELP_STATUS: &str = "Tab/←→: switch | ↑/↓: move | m: unit | r: refresh | q: quit";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Focus {
    Temps,
    Voltages,
    Fans,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Metric {
    C,
    F,
    K,
}

pub struct App {
    pub chip: Box<dyn SensorChip>,
    pub labels: ChannelLabels,
    pub last_refresh: Instant,
    pub refresh_interval: Duration,
    pub readings: Option<ChipReadings>,
    pub status: String,
    // header
    pub board_name: String,
    pub source: String,
    // selection and focus
    pub focus: Focus,
    pub temps_idx: usize,
    pub volts_idx: usize,
    pub fans_idx: usize,
    pub metric: Metric,
    pub polls: u64,
}

impl App {
    pub fn new(chip: Box<dyn SensorChip>, cfg: &MonitorConfig, board_name: String, source: &str) -> Self {
        let mut app = Self {
            chip,
            labels: cfg.labels.clone(),
            last_refresh: Instant::now(),
            refresh_interval: cfg.refresh_interval(),
            readings: None,
            status: HELP_STATUS.to_string(),
            board_name,
            source: source.to_string(),
            focus: Focus::Temps,
            temps_idx: 0,
            volts_idx: 0,
            fans_idx: 0,
            metric: Metric::C,
            polls: 0,
        };
        app.refresh();
        app
    }

    /// Poll the chip once and clamp selections to the new lists
    pub fn refresh(&mut self) {
        let readings = self.chip.read_all(&self.labels);
        let clamp = |idx: &mut usize, len: usize| {
            if *idx >= len {
                *idx = len.saturating_sub(1);
            }
        };
        clamp(&mut self.temps_idx, readings.temps.len());
        clamp(&mut self.volts_idx, readings.voltages.len());
        clamp(&mut self.fans_idx, readings.fans.len());

        let expected = usize::from(self.chip.temperature_sensors_limit())
            + usize::from(self.chip.voltage_sensors_limit())
            + usize::from(self.chip.tachometer_sensors_limit());
        let got = readings.temps.len() + readings.voltages.len() + readings.fans.len();
        self.status = if got < expected {
            format!("{} of {} channels failed to read | {}", expected - got, expected, HELP_STATUS)
        } else {
            HELP_STATUS.to_string()
        };

        self.readings = Some(readings);
        self.polls += 1;
        self.last_refresh = Instant::now();
    }

    pub fn refresh_due(&self) -> bool {
        self.last_refresh.elapsed() >= self.refresh_interval
    }

    pub fn focus_next(&mut self) {
        self.focus = match self.focus {
            Focus::Temps => Focus::Voltages,
            Focus::Voltages => Focus::Fans,
            Focus::Fans => Focus::Temps,
        };
    }

    pub fn focus_prev(&mut self) {
        self.focus = match self.focus {
            Focus::Temps => Focus::Fans,
            Focus::Voltages => Focus::Temps,
            Focus::Fans => Focus::Voltages,
        };
    }

    fn focused_len(&self) -> usize {
        let Some(r) = &self.readings else { return 0 };
        match self.focus {
            Focus::Temps => r.temps.len(),
            Focus::Voltages => r.voltages.len(),
            Focus::Fans => r.fans.len(),
        }
    }

    fn focused_idx_mut(&mut self) -> &mut usize {
        match self.focus {
            Focus::Temps => &mut self.temps_idx,
            Focus::Voltages => &mut self.volts_idx,
            Focus::Fans => &mut self.fans_idx,
        }
    }

    pub fn move_up(&mut self) {
        let idx = self.focused_idx_mut();
        *idx = idx.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        let len = self.focused_len();
        let idx = self.focused_idx_mut();
        if *idx + 1 < len {
            *idx += 1;
        }
    }

    pub fn cycle_metric(&mut self) {
        self.metric = match self.metric {
            Metric::C => Metric::F,
            Metric::F => Metric::K,
            Metric::K => Metric::C,
        };
    }

    pub fn convert_temp(&self, celsius: i32) -> (f64, &'static str) {
        let c = f64::from(celsius);
        match self.metric {
            Metric::C => (c, "°C"),
            Metric::F => (c * 9.0 / 5.0 + 32.0, "°F"),
            Metric::K => (c + 273.15, "K"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::it87::It87x;
    use crate::sim::SimulatedIte;
    use crate::superio::{ConfigPorts, SuperIoBus};

    fn no_sleep(_: Duration) {}

    fn demo_app() -> App {
        let sim = SimulatedIte::new(0x8728).with_demo_readings();
        let bus = SuperIoBus::new(sim, ConfigPorts::new(0x2e)).with_sleeper(no_sleep);
        let chip = It87x::probe(bus).unwrap();
        App::new(Box::new(chip), &MonitorConfig::default(), "Test Board".to_string(), "simulated")
    }

    #[test]
    fn test_app_new_polls_once() {
        let app = demo_app();
        assert_eq!(app.polls, 1);
        assert_eq!(app.focus, Focus::Temps);
        assert_eq!(app.status, HELP_STATUS);

        let r = app.readings.as_ref().unwrap();
        assert_eq!(r.name, "IT8728F");
        assert_eq!(r.temps.len(), 3);
        assert_eq!(r.voltages.len(), 9);
        assert_eq!(r.fans.len(), 5);
        assert_eq!(r.temps[0], ("temp1".to_string(), 38));
    }

    #[test]
    fn test_labels_applied() {
        let sim = SimulatedIte::new(0x8728).with_demo_readings();
        let bus = SuperIoBus::new(sim, ConfigPorts::new(0x2e)).with_sleeper(no_sleep);
        let chip = It87x::probe(bus).unwrap();
        let mut cfg = MonitorConfig::default();
        cfg.labels.temperature_labels.insert(1, "CPU".to_string());

        let app = App::new(Box::new(chip), &cfg, String::new(), "simulated");
        assert_eq!(app.readings.unwrap().temps[1].0, "CPU");
    }

    #[test]
    fn test_focus_cycle() {
        let mut app = demo_app();
        app.focus_next();
        assert_eq!(app.focus, Focus::Voltages);
        app.focus_next();
        assert_eq!(app.focus, Focus::Fans);
        app.focus_next();
        assert_eq!(app.focus, Focus::Temps);
        app.focus_prev();
        assert_eq!(app.focus, Focus::Fans);
    }

    #[test]
    fn test_move_bounds() {
        let mut app = demo_app();
        app.move_up();
        assert_eq!(app.temps_idx, 0);
        for _ in 0..10 {
            app.move_down();
        }
        assert_eq!(app.temps_idx, 2);

        app.focus = Focus::Voltages;
        for _ in 0..20 {
            app.move_down();
        }
        assert_eq!(app.volts_idx, 8);
        assert_eq!(app.temps_idx, 2);
    }

    #[test]
    fn test_refresh_counts_polls() {
        let mut app = demo_app();
        app.refresh();
        app.refresh();
        assert_eq!(app.polls, 3);
        assert!(!app.refresh_due());
    }

    #[test]
    fn test_convert_temp() {
        let mut app = demo_app();
        assert_eq!(app.convert_temp(40), (40.0, "°C"));
        app.cycle_metric();
        assert_eq!(app.convert_temp(40), (104.0, "°F"));
        app.cycle_metric();
        let (k, unit) = app.convert_temp(-5);
        assert!((k - 268.15).abs() < 1e-9);
        assert_eq!(unit, "K");
        app.cycle_metric();
        assert_eq!(app.metric, Metric::C);
    }
}
