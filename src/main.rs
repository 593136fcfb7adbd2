use std::io;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{poll, read, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use repodeck::app::App;
use repodeck::handlers::{self, KeyAction};
use repodeck::launch::LaunchPlan;
use repodeck::scan;
use repodeck::store::Store;
use repodeck::ui;

/// Browse a curated tree of repositories and open one with an ide, a shell,
/// or a claude session.
#[derive(Parser)]
#[command(name = "repodeck", version)]
struct Cli {
    /// Workspace root all repository paths are relative to
    #[arg(long)]
    root: PathBuf,
    /// Directory holding repos.json, runner-config.json and cache.json
    #[arg(long)]
    state_dir: PathBuf,
    /// Launch script, used only for desktop shortcut creation
    #[arg(long)]
    launch_script: Option<PathBuf>,
    /// Print the loaded configuration and exit
    #[arg(long)]
    print_config: bool,
    /// First-time setup: scan the workspace, write defaults, and exit
    #[arg(long)]
    setup: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.print_config {
        return print_config(&cli);
    }
    if cli.setup {
        return setup(&cli);
    }

    if !io::stdin().is_terminal() {
        anyhow::bail!("repodeck must be run in an interactive terminal");
    }

    enable_raw_mode().context("Failed to enable raw mode - are you in a terminal?")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to setup terminal")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    let mut app = App::new(&cli.root, &cli.state_dir, cli.launch_script.clone());
    let result = run_app(&mut terminal, &mut app);

    // Restore the terminal even on error.
    let _ = disable_raw_mode();
    let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
    let _ = terminal.show_cursor();

    // A foreground launch takes over the terminal for good: run it with
    // inherited stdio and exit with the child's status.
    match result? {
        Some(plan) => {
            let code = plan.run_foreground()?;
            process::exit(code);
        }
        None => Ok(()),
    }
}

fn print_config(cli: &Cli) -> Result<()> {
    let store = Store::new(&cli.state_dir);
    let config = store.load_config();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

/// One-time setup: scan the workspace and persist the repository list plus
/// a (possibly default) configuration.
fn setup(cli: &Cli) -> Result<()> {
    let store = Store::new(&cli.state_dir);
    let mut repos = store.load_repos();
    let found = scan::scan_repositories(&cli.root);
    let count = found.len();
    repos.replace(found);
    store.save_repos(&repos)?;
    store.save_config(&store.load_config())?;
    println!(
        "Found {count} repositories under {}; state written to {}",
        cli.root.display(),
        cli.state_dir.display()
    );
    Ok(())
}

/// The cooperative event loop: draw, wait for a key, mutate, repeat.
/// Returns a plan when a foreground launch should follow terminal restore.
fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<Option<LaunchPlan>> {
    loop {
        app.status.clear_expired();
        terminal.draw(|f| ui::draw(f, app))?;

        if !poll(Duration::from_millis(100))? {
            continue;
        }
        let Event::Key(key) = read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match handlers::handle_key(app, key) {
            KeyAction::Continue => {}
            KeyAction::Quit => return Ok(None),
            KeyAction::Launch(plan) => return Ok(Some(plan)),
            KeyAction::ScanDiffs => {
                run_blocking(terminal, app, "Scanning local changes...", App::scan_diffs_now)?;
            }
            KeyAction::ScanRepos => {
                run_blocking(terminal, app, "Scanning for repositories...", App::scan_repos_now)?;
            }
            KeyAction::FetchAll => {
                run_blocking(terminal, app, "Fetching all repositories...", App::fetch_all_now)?;
            }
            KeyAction::PushAll => {
                run_blocking(terminal, app, "Pushing...", App::push_ahead_now)?;
            }
        }
    }
}

/// Draw one frame with a busy indicator, then run the blocking operation.
/// Git queries are synchronous and block the loop for their duration.
fn run_blocking(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    label: &str,
    op: fn(&mut App),
) -> Result<()> {
    app.busy = Some(label.to_string());
    terminal.draw(|f| ui::draw(f, app))?;
    op(app);
    app.busy = None;
    Ok(())
}
