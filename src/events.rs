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

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::App;

/// Process one key press. Returns true when the user asked to quit.
pub fn handle_key_event(app: &mut App, key_event: KeyEvent) -> anyhow::Result<bool> {
    let KeyEvent { code, modifiers, .. } = key_event;

    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
        return Ok(true);
    }

    match code {
        KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
        KeyCode::Tab | KeyCode::Right => app.focus_next(),
        KeyCode::BackTab | KeyCode::Left => app.focus_prev(),
        KeyCode::Up | KeyCode::Char('k') => app.move_up(),
        KeyCode::Down | KeyCode::Char('j') => app.move_down(),
        KeyCode::Char('m') => app.cycle_metric(),
        KeyCode::Char('r') => app.refresh(),
        _ => {}
    }
    Ok(false)
}
