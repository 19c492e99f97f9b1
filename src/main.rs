// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, IsTerminal, Write};

use hbnb::console::{Console, PROMPT};
use hbnb::{storage, Config, Storage};

/// HBNB command interpreter
#[derive(Parser, Debug)]
#[command(name = "hbnb")]
#[command(about = "Manage HBNB objects in the configured storage")]
#[command(version)]
struct Cli {
    /// Enable verbose logging (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a single console command, e.g. `hbnb run count State`
    Run {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        words: Vec<String>,
    },
    /// Browse stored objects in a terminal UI
    #[cfg(feature = "tui")]
    Ui,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Console output goes to stdout, so logs stay quiet on stderr by default
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with_writer(io::stderr)
        .init();

    let config = Config::from_env()?;
    let mut storage = storage::open_or_exit(&config);

    match cli.command {
        Some(Command::Run { words }) => run_once(storage.as_mut(), &words.join(" ")),
        #[cfg(feature = "tui")]
        Some(Command::Ui) => run_ui_mode(storage.as_ref()),
        None => run_repl(storage.as_mut()),
    }
}

fn run_once(storage: &mut dyn Storage, line: &str) -> Result<()> {
    let mut console = Console::new(storage);
    if let Some(output) = console.execute(line)? {
        println!("{}", output);
    }
    Ok(())
}

fn run_repl(storage: &mut dyn Storage) -> Result<()> {
    let interactive = io::stdin().is_terminal();
    let mut console = Console::new(storage);
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        if interactive {
            print!("{}", PROMPT);
            io::stdout().flush()?;
        }

        let Some(line) = lines.next() else {
            // EOF
            if interactive {
                println!();
            }
            break;
        };
        let line = line?;

        match line.trim() {
            "quit" | "EOF" => break,
            "" => continue,
            command => match console.execute(command) {
                Ok(Some(output)) => println!("{}", output),
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(error = %e, command, "command failed");
                    println!("** {} **", e);
                }
            },
        }
    }

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(storage: &dyn Storage) -> Result<()> {
    let objects = storage.query(None)?;
    tracing::info!(count = objects.len(), "starting object browser");

    let mut app = ui::App::new(objects);
    ui::run_ui(&mut app)
}
