use std::{io, time::{Duration, Instant}};
use tui::{
    backend::CrosstermBackend,
    Terminal,
};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{error, info};

mod app;
mod models;
mod services;
mod utils;

use app::state::{App, FetchResponse, InputMode, RequestKind, SearchAction};
use app::ui;
use models::config::Config;
use services::api::MarketClient;
use services::logger;

const CONFIG_PATH: &str = "config.json";

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::load(CONFIG_PATH)?;
    logger::init(&config.log_file)?;
    info!(page_size = config.page_size, api = %config.api_base, "starting");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app and run it
    let client = MarketClient::new(&config);
    let app = App::new(config);
    let res = run_app(&mut terminal, app, client).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!(error = ?err, "application error");
        println!("{:?}", err)
    }

    Ok(())
}

fn spawn_list_fetch(client: &MarketClient, app: &mut App, tx: &mpsc::Sender<FetchResponse>) {
    let seq = app.begin_refresh();
    let page_size = app.config.page_size;
    let client = client.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = client.fetch_list(page_size).await;
        if let Err(e) = &result {
            error!(error = %e, "price fetch error");
        }
        let _ = tx.send(FetchResponse { seq, kind: RequestKind::List, result }).await;
    });
}

fn spawn_search(
    client: &MarketClient,
    seq: u64,
    query: String,
    limit: usize,
    tx: &mpsc::Sender<FetchResponse>,
) {
    let client = client.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = client.search(&query, limit).await;
        if let Err(e) = &result {
            error!(error = %e, query = %query, "search error");
        }
        let _ = tx.send(FetchResponse { seq, kind: RequestKind::Search(query), result }).await;
    });
}

async fn run_app<B: tui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    client: MarketClient,
) -> io::Result<()> {
    let (tx, mut rx) = mpsc::channel(8);

    spawn_list_fetch(&client, &mut app, &tx);
    let refresh_every = Duration::from_secs(app.config.refresh_interval);
    let mut last_refresh = Instant::now();

    loop {
        // Apply finished fetches
        while let Ok(response) = rx.try_recv() {
            app.apply_response(response);
        }

        if !refresh_every.is_zero() && last_refresh.elapsed() >= refresh_every {
            spawn_list_fetch(&client, &mut app, &tx);
            last_refresh = Instant::now();
        }

        // Handle input
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                match app.input_mode {
                    InputMode::Normal => match key.code {
                        KeyCode::Char('q') => return Ok(()),
                        KeyCode::Down | KeyCode::Char('j') => app.next(),
                        KeyCode::Up | KeyCode::Char('k') => app.previous(),
                        KeyCode::Char('r') => {
                            spawn_list_fetch(&client, &mut app, &tx);
                            last_refresh = Instant::now();
                        }
                        KeyCode::Char('s') => app.cycle_sort(),
                        KeyCode::Char('d') => app.toggle_sort_direction(),
                        KeyCode::Char('f') => app.toggle_fill_area(),
                        KeyCode::Char('c') => app.toggle_compact_labels(),
                        KeyCode::Char('/') | KeyCode::Char('e') => app.enter_edit_mode(),
                        KeyCode::Esc => app.clear_search(),
                        _ => {}
                    },
                    InputMode::Editing => match key.code {
                        KeyCode::Enter => {
                            if let SearchAction::Search { seq, query } = app.submit_search() {
                                let limit = app.config.search_limit;
                                spawn_search(&client, seq, query, limit, &tx);
                            }
                        }
                        KeyCode::Esc => {
                            app.exit_edit_mode();
                        }
                        KeyCode::Char(c) => {
                            app.input.push(c);
                        }
                        KeyCode::Backspace => {
                            app.input.pop();
                        }
                        _ => {}
                    }
                }
            }
        }

        // Draw UI
        terminal.draw(|f| ui::draw(f, &mut app))?;
    }
}
