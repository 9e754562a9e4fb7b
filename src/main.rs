// src/main.rs
use std::env;
use std::error::Error;
use std::fs::OpenOptions;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CEvent};
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*};

mod app;
mod form;
mod model;
mod slack;
mod store;
mod ui;

use app::App;
use model::{AppEvent, Command, Config, Error as AppError};
use slack::SlackClient;
use ui::draw_ui;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // parse flags
    let args: Vec<String> = env::args().collect();
    let debug_mode = args.iter().any(|s| s == "--debug");

    // initialize tracing to file only when --debug is passed
    if debug_mode {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open("slack_status_tui.log")?;
        let filter = EnvFilter::new("debug");
        let fmt_layer = fmt::layer()
            .with_writer(move || file.try_clone().expect("log file clone"))
            .with_target(false);
        Registry::default().with(filter).with(fmt_layer).init();
        info!("Tracing initialized to slack_status_tui.log (debug)");
    }

    info!("Starting Slack Status TUI");

    let cwd = env::current_dir()?;
    let (mut app, initial) = App::new(&cwd);

    // Terminal setup
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    crossterm::terminal::enable_raw_mode()?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Channel for background tasks -> UI
    let (tx, mut rx) = mpsc::unbounded_channel::<AppEvent>();

    dispatch(&app, initial, &tx);

    let tick_rate = Duration::from_millis(50);
    let mut last_tick = Instant::now();
    let mut quit = false;

    while !quit {
        // Advance spinner + redraw periodically
        if last_tick.elapsed() >= tick_rate {
            if app.loading {
                app.throbber_state.calc_next();
            }
            terminal.draw(|f| draw_ui(f, &mut app)).ok();
            last_tick = Instant::now();
        }

        // Drain background events
        while let Ok(ev) = rx.try_recv() {
            let commands = app.handle_event(ev);
            if dispatch(&app, commands, &tx) {
                quit = true;
            }
        }

        // Input handling
        if event::poll(Duration::from_millis(20))? {
            if let CEvent::Key(key) = event::read()? {
                let commands = app.handle_key(key);
                if dispatch(&app, commands, &tx) {
                    quit = true;
                }
            }
        }
    }

    // Cleanup
    crossterm::terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    info!("Exiting Slack Status TUI");
    Ok(())
}

/// Turn each pending command into a one-shot background task reporting back
/// over the channel. Returns true when a quit was requested.
fn dispatch(app: &App, commands: Vec<Command>, tx: &UnboundedSender<AppEvent>) -> bool {
    let mut quit = false;
    for command in commands {
        debug!("Dispatching {:?}", command);
        match command {
            Command::Quit => quit = true,
            Command::FetchStatus => {
                let Some(client) = app.client.clone() else {
                    let _ = tx.send(AppEvent::Failed(no_client()));
                    continue;
                };
                let tx2 = tx.clone();
                tokio::spawn(async move {
                    match client.get_profile().await {
                        Ok(info) => {
                            let _ = tx2.send(AppEvent::StatusLoaded(info));
                        }
                        Err(e) => {
                            let _ = tx2.send(AppEvent::Failed(e));
                        }
                    }
                });
            }
            Command::SetStatus {
                text,
                emoji,
                expiration,
            } => {
                let Some(client) = app.client.clone() else {
                    let _ = tx.send(AppEvent::Failed(no_client()));
                    continue;
                };
                let tx2 = tx.clone();
                tokio::spawn(async move {
                    match client.set_custom_status(&text, &emoji, expiration).await {
                        Ok(()) => {
                            let _ = tx2.send(AppEvent::StatusSet);
                        }
                        Err(e) => {
                            let _ = tx2.send(AppEvent::Failed(e));
                        }
                    }
                });
            }
            Command::LoadTemplates => {
                let Some(path) = app.templates_path.clone() else {
                    let _ = tx.send(AppEvent::Failed(no_templates_file()));
                    continue;
                };
                let tx2 = tx.clone();
                tokio::spawn(async move {
                    let result = task::spawn_blocking(move || store::load_templates(&path)).await;
                    let _ = match flatten(result) {
                        Ok(templates) => tx2.send(AppEvent::TemplatesLoaded(templates)),
                        Err(e) => tx2.send(AppEvent::Failed(e)),
                    };
                });
            }
            Command::SaveTemplate(template) => {
                let Some(path) = app.templates_path.clone() else {
                    let _ = tx.send(AppEvent::Failed(no_templates_file()));
                    continue;
                };
                let mut list = app.templates.clone();
                let tx2 = tx.clone();
                tokio::spawn(async move {
                    let result = task::spawn_blocking(move || -> Result<_, AppError> {
                        list.push(template);
                        store::write_templates(&path, &list)?;
                        Ok(list)
                    })
                    .await;
                    let _ = match flatten(result) {
                        Ok(saved) => tx2.send(AppEvent::TemplatesSaved(saved)),
                        Err(e) => tx2.send(AppEvent::Failed(e)),
                    };
                });
            }
            Command::DeleteTemplate(label) => {
                let Some(path) = app.templates_path.clone() else {
                    let _ = tx.send(AppEvent::Failed(no_templates_file()));
                    continue;
                };
                let list = app.templates.clone();
                let tx2 = tx.clone();
                tokio::spawn(async move {
                    let result = task::spawn_blocking(move || -> Result<_, AppError> {
                        let remaining = store::remove_by_label(&list, &label);
                        store::write_templates(&path, &remaining)?;
                        Ok(remaining)
                    })
                    .await;
                    let _ = match flatten(result) {
                        Ok(saved) => tx2.send(AppEvent::TemplatesSaved(saved)),
                        Err(e) => tx2.send(AppEvent::Failed(e)),
                    };
                });
            }
            Command::SaveConfig {
                token,
                confirm_delete,
            } => {
                let path = app.config_path.clone();
                let tx2 = tx.clone();
                tokio::spawn(async move {
                    let client = match SlackClient::new(&token) {
                        Ok(c) => c,
                        Err(e) => {
                            let _ = tx2.send(AppEvent::Failed(e));
                            return;
                        }
                    };
                    if let Err(e) = client.auth_test().await {
                        let _ = tx2.send(AppEvent::Failed(AppError::Remote(format!(
                            "token validation failed: {e}"
                        ))));
                        return;
                    }
                    let config = Config {
                        slack_token: token,
                        confirm_delete: Some(confirm_delete),
                    };
                    if let Err(e) = store::save_config(&path, &config) {
                        let _ = tx2.send(AppEvent::Failed(e));
                        return;
                    }
                    let _ = tx2.send(AppEvent::ConfigUpdated {
                        config,
                        client,
                        message: "Settings saved".into(),
                        path,
                    });
                });
            }
        }
    }
    quit
}

fn flatten<T>(result: Result<Result<T, AppError>, task::JoinError>) -> Result<T, AppError> {
    match result {
        Ok(inner) => inner,
        Err(e) => Err(AppError::Persist(e.to_string())),
    }
}

fn no_client() -> AppError {
    AppError::Config("no Slack client configured".into())
}

fn no_templates_file() -> AppError {
    AppError::TemplateIo("no templates file available".into())
}
