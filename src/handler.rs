use std::time::Instant;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use crate::app::{App, InputMode};
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        // Hit areas are stale until the next draw
        AppEvent::Resize => app.card_area = None,
        AppEvent::Tick => app.on_tick(Instant::now()),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_custom_range_editing(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    if app.show_mode_picker {
        match key.code {
            KeyCode::Esc => app.show_mode_picker = false,
            KeyCode::Char('j') | KeyCode::Down => app.mode_picker_nav_down(),
            KeyCode::Char('k') | KeyCode::Up => app.mode_picker_nav_up(),
            KeyCode::Enter => app.confirm_mode_picker(),
            _ => {}
        }
        return;
    }

    if app.show_range_picker {
        match key.code {
            KeyCode::Esc => app.show_range_picker = false,
            KeyCode::Char('j') | KeyCode::Down => app.range_picker_nav_down(),
            KeyCode::Char('k') | KeyCode::Up => app.range_picker_nav_up(),
            KeyCode::Enter => app.confirm_range_picker(),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Card
        KeyCode::Char('n') => app.generate_card(),
        KeyCode::Char(' ') | KeyCode::Enter => app.flip_card(),
        KeyCode::Char('y') => app.mark(true),
        KeyCode::Char('w') => app.mark(false),

        // Selection
        KeyCode::Char('m') => app.open_mode_picker(),
        KeyCode::Char('r') => app.open_range_picker(),
        KeyCode::Char('c') => app.begin_custom_range(),
        KeyCode::Char('t') => app.cycle_timer(),

        _ => {}
    }
}

fn handle_custom_range_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.cancel_custom_range(),
        KeyCode::Enter => app.apply_custom_range(),
        KeyCode::Tab | KeyCode::BackTab => app.toggle_custom_field(),
        KeyCode::Backspace => {
            app.custom_input_mut().pop();
        }
        KeyCode::Char(c) => {
            let input = app.custom_input_mut();
            // Page numbers never need more than a handful of characters
            if input.chars().count() < 6 {
                input.push(c);
            }
        }
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    if app.input_mode == InputMode::Editing || app.show_mode_picker || app.show_range_picker {
        return;
    }

    if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
        if app.card_area.is_some_and(|area| is_in_area(mouse.column, mouse.row, area)) {
            app.flip_card();
        }
    }
}

/// Check if a point is within a Rect
fn is_in_area(x: u16, y: u16, area: Rect) -> bool {
    x >= area.x && x < area.x + area.width && y >= area.y && y < area.y + area.height
}
