//! esdash entry point: parses CLI arguments, establishes the gateway,
//! drives the terminal, and runs the single-writer dashboard loop
//! (spec.md §5, §6).

use std::io;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use crossterm::event::{self, Event as CtEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;

use esdash::assembler::assemble;
use esdash::cli::{parse_uri, Args};
use esdash::dashboard::{render, Command, Dashboard, Message};
use esdash::gateway::error::GatewayError;
use esdash::gateway::{EsGateway, HttpGateway};

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

const CHANNEL_CAPACITY: usize = 256;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let uri = match parse_uri(&args.uri) {
        Ok(uri) => uri,
        Err(err) => {
            eprintln!("esdash: {err}");
            std::process::exit(1);
        }
    };

    let gateway = match HttpGateway::new(uri.base_url(), uri.username.clone(), uri.password.clone(), args.insecure) {
        Ok(gw) => gw,
        Err(err) => {
            eprintln!("esdash: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = gateway.ping().await {
        eprintln!("esdash: could not reach {}: {err}", uri.base_url());
        if matches!(err, GatewayError::Tls(_)) && !args.insecure {
            eprintln!("hint: pass --insecure to skip TLS certificate verification");
        }
        std::process::exit(1);
    }

    let log_dir = std::env::temp_dir().join("esdash-logs");
    let _guard = esdash::logging::init_file_logging(args.verbose, args.quiet, log_dir.to_string_lossy().as_ref());
    tracing::info!(uri = %uri.base_url(), interval = args.interval, "starting esdash");

    let exit_code = run(args, gateway).await;
    std::process::exit(exit_code);
}

async fn run(args: Args, gateway: HttpGateway) -> i32 {
    let gateway: Arc<dyn EsGateway> = Arc::new(gateway);
    let poll_interval = Duration::from_secs(args.interval);

    let mut terminal = match setup_terminal() {
        Ok(t) => t,
        Err(err) => {
            tracing::error!(%err, "failed to set up terminal");
            eprintln!("esdash: failed to set up terminal: {err}");
            return 1;
        }
    };

    install_panic_hook();

    let (tx, mut rx) = mpsc::channel::<Message>(CHANNEL_CAPACITY);

    spawn_input_reader(tx.clone());

    let mut dash = Dashboard::new(poll_interval);
    dash.fetching = true;
    spawn_fetch(gateway.clone(), poll_interval, tx.clone());

    let mut exit_code = 0;

    while let Some(msg) = rx.recv().await {
        let cmd = dash.update(msg);
        run_command(cmd, &gateway, poll_interval, &tx);
        while let Some(side) = dash.take_side_command() {
            run_command(Some(side), &gateway, poll_interval, &tx);
        }

        if dash.quit {
            break;
        }

        if let Err(err) = terminal.draw(|frame| render(frame, &mut dash)) {
            tracing::error!(%err, "render failed");
            exit_code = 2;
            break;
        }
    }

    if let Err(err) = teardown_terminal(&mut terminal) {
        tracing::error!(%err, "failed to restore terminal");
        if exit_code == 0 {
            exit_code = 2;
        }
    }

    exit_code
}

fn run_command(cmd: Option<Command>, gateway: &Arc<dyn EsGateway>, poll_interval: Duration, tx: &mpsc::Sender<Message>) {
    let Some(cmd) = cmd else { return };
    match cmd {
        Command::Fetch => spawn_fetch(gateway.clone(), poll_interval, tx.clone()),
        Command::ScheduleTick { delay_ms, gen } => spawn_tick(delay_ms, gen, tx.clone()),
        Command::ScheduleCountdown { gen } => spawn_countdown(gen, tx.clone()),
        Command::DeleteIndices(names) => spawn_delete(gateway.clone(), names, tx.clone()),
        Command::LoadSettings { name, nonce } => spawn_load_settings(gateway.clone(), name, nonce, tx.clone()),
        Command::SubmitSettings { names, diff, nonce } => spawn_submit_settings(gateway.clone(), names, diff, nonce, tx.clone()),
        Command::Quit => {}
    }
}

fn spawn_fetch(gateway: Arc<dyn EsGateway>, poll_interval: Duration, tx: mpsc::Sender<Message>) {
    tokio::spawn(async move {
        let deadline = esdash::dashboard::fetch_timeout(poll_interval);
        let result = tokio::time::timeout(deadline, assemble(gateway)).await;
        let msg = match result {
            Ok(Ok(snapshot)) => Message::Snapshot(Box::new(snapshot)),
            Ok(Err(err)) => Message::FetchError(err),
            Err(_) => Message::FetchError(esdash::assembler::AssembleError::DeadlineExceeded(deadline)),
        };
        let _ = tx.send(msg).await;
    });
}

fn spawn_tick(delay_ms: u64, gen: u64, tx: mpsc::Sender<Message>) {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        let _ = tx.send(Message::Tick { gen }).await;
    });
}

fn spawn_countdown(gen: u64, tx: mpsc::Sender<Message>) {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        let _ = tx.send(Message::CountdownTick { gen }).await;
    });
}

fn spawn_delete(gateway: Arc<dyn EsGateway>, names: Vec<String>, tx: mpsc::Sender<Message>) {
    tokio::spawn(async move {
        let err = gateway.delete_index(&names).await.err().map(Arc::new);
        let _ = tx.send(Message::DeleteResult { names, err }).await;
    });
}

fn spawn_load_settings(gateway: Arc<dyn EsGateway>, name: String, nonce: u64, tx: mpsc::Sender<Message>) {
    tokio::spawn(async move {
        match gateway.get_index_settings(&name).await {
            Ok(values) => {
                let _ = tx.send(Message::SettingsLoaded { values, err: None, nonce }).await;
            }
            Err(err) => {
                let _ = tx
                    .send(Message::SettingsLoaded {
                        values: esdash::gateway::types::IndexSettingsValues::default(),
                        err: Some(Arc::new(err)),
                        nonce,
                    })
                    .await;
            }
        }
    });
}

fn spawn_submit_settings(
    gateway: Arc<dyn EsGateway>,
    names: Vec<String>,
    diff: std::collections::HashMap<String, Option<String>>,
    nonce: u64,
    tx: mpsc::Sender<Message>,
) {
    tokio::spawn(async move {
        let err = gateway.update_index_settings(&names, &diff).await.err().map(Arc::new);
        let _ = tx.send(Message::SettingsResult { names, err, nonce }).await;
    });
}

/// Runs a blocking crossterm event-poll loop on a dedicated OS thread and
/// forwards every event as a [`Message`] (spec.md §5 "dedicated blocking
/// thread for crossterm input").
fn spawn_input_reader(tx: mpsc::Sender<Message>) {
    std::thread::spawn(move || loop {
        let poll = event::poll(Duration::from_millis(100));
        match poll {
            Ok(true) => match event::read() {
                Ok(CtEvent::Key(key)) if key.kind != KeyEventKind::Release => {
                    if tx.blocking_send(Message::Key(key)).is_err() {
                        return;
                    }
                }
                Ok(CtEvent::Mouse(mouse)) => {
                    if tx.blocking_send(Message::Mouse(mouse)).is_err() {
                        return;
                    }
                }
                Ok(CtEvent::Resize(width, height)) => {
                    if tx.blocking_send(Message::WindowSize { width, height }).is_err() {
                        return;
                    }
                }
                _ => {}
            },
            Ok(false) => {}
            Err(_) => return,
        }
    });
}

fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()
}

/// Restores the terminal before the default panic hook prints its message,
/// so a mid-render panic doesn't leave the operator's shell in raw mode
/// inside the alternate screen.
fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        default_hook(info);
        std::process::exit(2);
    }));
}
