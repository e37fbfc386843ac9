pub mod app;
pub mod ui;

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use crate::config::Identity;
use crate::error::Result;
use crate::models::Household;
use crate::storage::JsonStore;
use app::{App, InputMode};
use ui::ui;

/// How often the board checks the store for changes made elsewhere.
const REFRESH_INTERVAL: Duration = Duration::from_millis(500);

pub fn run_tui(store: JsonStore, identity: Identity, household: Household) -> Result<()> {
    let mut app = App::new(store, identity, household)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if !event::poll(REFRESH_INTERVAL)? {
            let res = app.refresh_if_stale();
            app.report(res);
            continue;
        }

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            let res = match app.input_mode {
                InputMode::Normal => match key.code {
                    KeyCode::Char('q') => return Ok(()),
                    KeyCode::Down | KeyCode::Char('j') => {
                        app.next();
                        Ok(())
                    }
                    KeyCode::Up | KeyCode::Char('k') => {
                        app.previous();
                        Ok(())
                    }
                    KeyCode::Tab | KeyCode::Left | KeyCode::Right | KeyCode::Char('h') | KeyCode::Char('l') => {
                        app.switch_column();
                        Ok(())
                    }
                    KeyCode::Char(' ') => app.toggle_selected(),
                    KeyCode::Char('d') | KeyCode::Delete => app.delete_selected(),
                    KeyCode::Char('a') => {
                        app.start_add();
                        Ok(())
                    }
                    KeyCode::Char('e') => {
                        app.start_edit();
                        Ok(())
                    }
                    KeyCode::Char('s') => app.cycle_sort(),
                    KeyCode::Char('S') => app.flip_sort(),
                    KeyCode::Char('f') => app.cycle_filter(),
                    KeyCode::Char('F') => app.toggle_filter(),
                    KeyCode::Char('x') => app.clear_filters(),
                    KeyCode::Char('r') => app.reload(),
                    _ => Ok(()),
                },
                InputMode::Editing | InputMode::Adding => match key.code {
                    KeyCode::Enter => app.handle_input(),
                    KeyCode::Esc => {
                        app.cancel_input();
                        Ok(())
                    }
                    KeyCode::Char(c) => {
                        app.input_buffer.push(c);
                        Ok(())
                    }
                    KeyCode::Backspace => {
                        app.input_buffer.pop();
                        Ok(())
                    }
                    _ => Ok(()),
                },
            };
            // store errors leave the board as it was and show up in the footer
            app.report(res);
        }
    }
}
