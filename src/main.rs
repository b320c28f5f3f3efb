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

use std::io::stdout;

use anyhow::Context;
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::Terminal;
use tracing::{error, info, warn};

use it87mon::app::App;
use it87mon::config::{config_path, load_config, save_config_to, MonitorConfig};
use it87mon::events::handle_key_event;
use it87mon::logger::{init_logging, LogTarget};
use it87mon::port::{DevPort, PortIo};
use it87mon::sensor::SensorChip;
use it87mon::sim::SimulatedIte;
use it87mon::superio::SuperIoBus;
use it87mon::system::{is_root, kernel_module_loaded, read_board_name, IT87_KERNEL_MODULE};
use it87mon::ui::ui;
use it87mon::{detect, service};

const USAGE: &str = "\
usage: it87mon [save-config] [--dump | --service] [--simulate] [--logging]

  (no mode)     interactive monitor
  save-config   write the active configuration to the user config file
  --dump        print one JSON snapshot and exit
  --service     poll forever, logging each snapshot
  --simulate    use a built-in simulated IT8728F instead of /dev/port
  --logging     log JSON lines to the configured log file";

/// Simulated chip ID used by `--simulate`
const SIMULATED_CHIP_ID: u16 = 0x8728;

fn open_chip(cfg: &MonitorConfig, simulate: bool) -> anyhow::Result<Box<dyn SensorChip>> {
    let ports = cfg.candidate_ports();
    let first = *ports.first().context("no configuration ports to scan")?;
    let io: Box<dyn PortIo> = if simulate {
        let last = ports[ports.len() - 1];
        Box::new(SimulatedIte::new(SIMULATED_CHIP_ID).on_ports(last).with_demo_readings())
    } else {
        Box::new(DevPort::open()?)
    };
    let chip = detect(SuperIoBus::new(io, first), &ports)?;
    Ok(Box::new(chip))
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("{}", USAGE);
        return Ok(());
    }

    let simulate = args.iter().any(|a| a == "--simulate");
    let dump = args.iter().any(|a| a == "--dump");
    let service_mode = args.iter().any(|a| a == "--service");
    let logging_enabled = args.iter().any(|a| a == "--logging");
    let save = args.get(1).map(|s| s.as_str()) == Some("save-config");

    if dump && service_mode {
        eprintln!("--dump and --service are mutually exclusive\n\n{}", USAGE);
        std::process::exit(2);
    }

    if !simulate && !save && !is_root() {
        eprintln!("Error: it87mon requires root privileges to access /dev/port.");
        eprintln!(
            "Please run with: sudo {}  (or pass --simulate)",
            args.first().map(String::as_str).unwrap_or("it87mon")
        );
        std::process::exit(1);
    }

    let cfg = load_config();
    let interactive = !dump && !service_mode && !save;
    let target = LogTarget::choose(logging_enabled, interactive, &cfg.log_path);
    if let Some(path) = init_logging(&target)? {
        if path != cfg.log_path {
            warn!(path = %path.display(), "log path unavailable, using fallback");
        }
    }
    info!(args = ?args, "startup");

    if save {
        let path = config_path();
        save_config_to(&cfg, &path).with_context(|| format!("writing {}", path.display()))?;
        println!("Wrote config to {}", path.display());
        return Ok(());
    }

    if !simulate && kernel_module_loaded(IT87_KERNEL_MODULE) {
        warn!("the {} kernel driver is loaded and may access the chip concurrently", IT87_KERNEL_MODULE);
    }

    let mut chip = match open_chip(&cfg, simulate) {
        Ok(chip) => chip,
        Err(e) => {
            error!(error = %e, "no supported chip found");
            eprintln!("it87mon: {:#}", e);
            std::process::exit(1);
        }
    };

    if dump {
        service::dump_snapshot(chip.as_mut(), &cfg.labels, &mut stdout())?;
        return Ok(());
    }

    if service_mode {
        service::run_service(chip.as_mut(), &cfg.labels, cfg.refresh_interval(), None)?;
        return Ok(());
    }

    let source = if simulate { "simulated" } else { "/dev/port" };
    let app = App::new(chip, &cfg, read_board_name(), source);

    // Terminal init
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!(error = %err, "fatal error");
        eprintln!("error: {err}");
        std::process::exit(1);
    }

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<ratatui::backend::CrosstermBackend<std::io::Stdout>>,
    mut app: App,
) -> anyhow::Result<()> {
    loop {
        terminal.draw(|f| ui(f, &app))?;

        let timeout = app
            .refresh_interval
            .saturating_sub(app.last_refresh.elapsed());
        if event::poll(timeout).unwrap_or(false) {
            if let Event::Key(key_event) = event::read()? {
                if key_event.kind == KeyEventKind::Press && handle_key_event(&mut app, key_event)? {
                    return Ok(());
                }
            }
        }

        if app.refresh_due() {
            app.refresh();
        }
    }
}
