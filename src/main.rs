mod cli;
mod ui;

use std::io;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use tui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use projement::{config, db, logging, ProjectError};

use crate::cli::Cli;
use crate::ui::{
    dashboard::{handle_input as handle_dashboard_input, load_projects, render_dashboard, DashboardAction, DashboardState},
    log_hours::{handle_input as handle_log_hours_input, render_log_hours, LogHoursAction, LogHoursState},
};

// Represents the current screen in the app
enum AppScreen {
    Dashboard,
    LogHours(i32), // Contains project_id
}

// Main application state
struct AppState {
    db: db::Database,
    page_size: usize,
    screen: AppScreen,
    dashboard_state: Option<DashboardState>,
    log_hours_state: Option<LogHoursState>,
}

impl AppState {
    fn new(db: db::Database, page_size: usize) -> Self {
        Self {
            db,
            page_size,
            screen: AppScreen::Dashboard,
            dashboard_state: None,
            log_hours_state: None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = config::init()?;

    match cli.batch_command() {
        None => {
            logging::init_file(&config.log_file)?;
            config::log_loaded(&config);
            let db = db::init(&config).await?;
            run_dashboard(db, config.page_size).await
        }
        Some(command) => {
            logging::init_stderr();
            config::log_loaded(&config);
            let db = db::init(&config).await?;
            cli::run(command, &db, config.page_size).await
        }
    }
}

async fn run_dashboard(db: db::Database, page_size: usize) -> Result<()> {
    // Create app state
    let mut app_state = AppState::new(db, page_size);

    // Load the projects before taking over the terminal
    load_dashboard_screen(&mut app_state, 1).await?;

    // Setup terminal
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the main app loop
    let result = run_app(&mut terminal, &mut app_state).await;

    // Restore terminal
    terminal::disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    // Show any error message
    if let Err(err) = result {
        tracing::error!(error = %err, "dashboard stopped");
        println!("Error: {}", err);
    }

    Ok(())
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app_state: &mut AppState) -> Result<()> {
    loop {
        // Render current screen
        terminal.draw(|f| match app_state.screen {
            AppScreen::Dashboard => {
                if let Some(state) = &mut app_state.dashboard_state {
                    render_dashboard(f, state);
                }
            }
            AppScreen::LogHours(_) => {
                if let Some(state) = &mut app_state.log_hours_state {
                    render_log_hours(f, state);
                }
            }
        })?;

        // Handle input for current screen
        let should_quit = match app_state.screen {
            AppScreen::Dashboard => handle_dashboard_screen(app_state).await?,
            AppScreen::LogHours(_) => handle_log_hours_screen(app_state).await?,
        };

        if should_quit {
            break;
        }
    }

    Ok(())
}

async fn load_dashboard_screen(app_state: &mut AppState, page: usize) -> Result<()> {
    let projects = load_projects(&app_state.db).await?;
    tracing::debug!(count = projects.len(), "projects loaded");

    let today = chrono::Local::now().date_naive();
    let mut state = DashboardState::new(projects, app_state.page_size, today);
    state.restore_page(page);

    app_state.dashboard_state = Some(state);
    app_state.log_hours_state = None;
    app_state.screen = AppScreen::Dashboard;

    Ok(())
}

fn current_page(app_state: &AppState) -> usize {
    app_state.dashboard_state.as_ref().map_or(1, |state| state.page())
}

async fn handle_dashboard_screen(app_state: &mut AppState) -> Result<bool> {
    if let Some(state) = &mut app_state.dashboard_state {
        match handle_dashboard_input(state)? {
            Some(DashboardAction::Exit) => {
                return Ok(true);
            }
            Some(DashboardAction::Reload) => {
                let page = state.page();
                load_dashboard_screen(app_state, page).await?;
            }
            Some(DashboardAction::LogHours(project_id)) => {
                // Fetch fresh numbers so the form shows what is stored now
                let listed = app_state.db.fetch_project(project_id).await?;
                app_state.log_hours_state = Some(LogHoursState::new(listed));
                app_state.screen = AppScreen::LogHours(project_id);
            }
            None => {}
        }
    }

    Ok(false)
}

async fn handle_log_hours_screen(app_state: &mut AppState) -> Result<bool> {
    if let Some(state) = &mut app_state.log_hours_state {
        match handle_log_hours_input(state)? {
            Some(LogHoursAction::Cancel) => {
                app_state.log_hours_state = None;
                app_state.screen = AppScreen::Dashboard;
            }
            Some(LogHoursAction::Save(project_id, hours)) => match app_state.db.log_hours(project_id, &hours).await {
                Ok(project) => {
                    let page = current_page(app_state);
                    load_dashboard_screen(app_state, page).await?;
                    if let Some(dashboard) = &mut app_state.dashboard_state {
                        dashboard.set_status(format!("Logged hours for {}", project));
                    }
                }
                // Someone else may have logged in the meantime; show why it failed
                Err(ProjectError::Validation(errors)) => state.set_error(errors.to_string()),
                Err(err) => return Err(err.into()),
            },
            None => {}
        }
    }

    Ok(false)
}
