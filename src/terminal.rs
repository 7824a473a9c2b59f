//! Line-oriented terminal front end.
//!
//! Every state change redraws the screen; each input line is either a
//! search or one of the slash commands.

use anyhow::{Context, Result};
use skycast_ui::{render, Orchestrator, Screen};
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "Type a city, address, postal code or \"lat, lon\" and press Enter.\n\
Commands: /locate (use my location), /dismiss (clear error), /help, /quit";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command<'a> {
    Search(&'a str),
    Locate,
    Dismiss,
    Help,
    Quit,
    Unknown(&'a str),
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Self {
        let trimmed = line.trim();
        match trimmed {
            "/locate" => Self::Locate,
            "/dismiss" => Self::Dismiss,
            "/help" | "/?" => Self::Help,
            "/quit" | "/exit" => Self::Quit,
            cmd if cmd.starts_with('/') => Self::Unknown(cmd),
            _ => Self::Search(line),
        }
    }
}

pub async fn run(orchestrator: Orchestrator, color: bool) -> Result<()> {
    let mut updates = orchestrator.subscribe();
    let renderer = tokio::spawn(async move {
        loop {
            let frame = {
                let state = updates.borrow_and_update();
                render(&Screen::from_state(&state), color)
            };
            println!("\n{}", frame);
            if updates.changed().await.is_err() {
                break;
            }
        }
    });

    println!("{}", HELP);
    // Runs once; the orchestrator ignores later calls.
    let _ = orchestrator.start();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        match Command::parse(&line) {
            Command::Search(text) => {
                let _ = orchestrator.submit_query(text);
            }
            Command::Locate => {
                let _ = orchestrator.use_current_location();
            }
            Command::Dismiss => orchestrator.dismiss_error(),
            Command::Help => println!("{}", HELP),
            Command::Quit => break,
            Command::Unknown(cmd) => {
                println!("Unknown command {}\n{}", cmd, HELP);
            }
        }
    }

    renderer.abort();
    Ok(())
}
