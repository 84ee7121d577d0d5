// File: ./src/tui/mod.rs
// Terminal host: month grid with expandable days
pub mod action;
pub mod state;
pub mod view;

use crate::calendar::{Calendar, today};
use crate::config::Config;
use crate::model::CalendarRequest;
use crate::source::EventSource;
use crate::tui::action::{Action, AppEvent};
use crate::tui::state::AppState;
use anyhow::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, MouseButton,
        MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use directories::ProjectDirs;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::sync::{Arc, Mutex};
use std::{fs, io, time::Duration};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// Logs go to a file; the terminal belongs to the UI.
fn init_file_logging() {
    let Some(proj) = ProjectDirs::from("com", "evcal", "evcal") else {
        return;
    };
    let dir = proj.data_dir();
    if !dir.exists() {
        let _ = fs::create_dir_all(dir);
    }
    if let Ok(file) = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("evcal.log"))
    {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init();
    }
}

pub async fn run(month: Option<String>, year: Option<String>) -> Result<()> {
    init_file_logging();

    // Restore the terminal before the default hook prints
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        tracing::error!("panic: {}", info);
        default_hook(info);
    }));

    let config = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!(error = %e, "no usable config, using defaults");
            Config::default()
        }
    };
    let zone = config.zone()?;
    let source: Arc<dyn EventSource> = Arc::from(config.event_source()?);
    let request = CalendarRequest::from_input(month.as_deref(), year.as_deref(), today(zone))?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut state = AppState::new(request);
    let (action_tx, mut action_rx) = mpsc::channel(10);
    let (event_tx, mut event_rx) = mpsc::channel(10);

    // SPAWN ACTOR
    tokio::spawn(async move {
        while let Some(action) = action_rx.recv().await {
            match action {
                Action::Quit => break,
                Action::LoadMonth(request) => {
                    let _ = event_tx
                        .send(AppEvent::Status("Fetching events...".to_string()))
                        .await;
                    match Calendar::load(request, source.as_ref()).await {
                        Ok(calendar) => {
                            let _ = event_tx.send(AppEvent::CalendarLoaded(calendar)).await;
                        }
                        Err(e) => {
                            let _ = event_tx.send(AppEvent::Error(e.to_string())).await;
                        }
                    }
                }
            }
        }
    });

    let _ = action_tx.send(Action::LoadMonth(request)).await;

    // UI Loop
    loop {
        state.viewport_width = terminal.size()?.width;
        terminal.draw(|f| view::draw(f, &mut state))?;
        state.realign();
        state.tick();

        while let Ok(event) = event_rx.try_recv() {
            match event {
                AppEvent::CalendarLoaded(calendar) => {
                    let days = calendar.buckets.len();
                    state.set_calendar(calendar);
                    state.message = format!("Days with events: {}", days);
                }
                AppEvent::Error(msg) => {
                    state.message = format!("Error: {}", msg);
                    state.loading = false;
                }
                AppEvent::Status(msg) => state.message = msg,
            }
        }

        if !event::poll(Duration::from_millis(50))? {
            continue;
        }
        match event::read()? {
            Event::Mouse(mouse_event) => match mouse_event.kind {
                MouseEventKind::Moved => state.hover_at(mouse_event.column, mouse_event.row),
                MouseEventKind::Down(MouseButton::Left) => {
                    state.click_at(mouse_event.column, mouse_event.row)
                }
                _ => {}
            },
            Event::Key(key) => match key.code {
                KeyCode::Char('q') => {
                    let _ = action_tx.send(Action::Quit).await;
                    break;
                }
                KeyCode::Left | KeyCode::Char('h') => state.move_selection(-1),
                KeyCode::Right | KeyCode::Char('l') => state.move_selection(1),
                KeyCode::Up | KeyCode::Char('k') => state.move_selection(-7),
                KeyCode::Down | KeyCode::Char('j') => state.move_selection(7),
                KeyCode::Enter | KeyCode::Char(' ') => state.toggle_selected(),
                KeyCode::Esc => state.escape(),
                KeyCode::Char('n') | KeyCode::PageDown => {
                    state.loading = true;
                    let _ = action_tx.send(Action::LoadMonth(state.request.next())).await;
                }
                KeyCode::Char('p') | KeyCode::PageUp => {
                    state.loading = true;
                    let _ = action_tx
                        .send(Action::LoadMonth(state.request.previous()))
                        .await;
                }
                KeyCode::Char('t') => {
                    if let Ok(current) = CalendarRequest::from_input(None, None, today(zone)) {
                        state.loading = true;
                        let _ = action_tx.send(Action::LoadMonth(current)).await;
                    }
                }
                _ => {}
            },
            Event::Resize(width, _) => state.viewport_width = width,
            _ => {}
        }
    }

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    Ok(())
}
