//! Line-oriented front-end for the Dungeon Master.
//!
//! Reads player actions from stdin and prints narrative to stdout:
//! - Lines starting with `#` are commands (quit, recap, mode, help)
//! - `remember: <note>` pins a fact
//! - `reset` clears the current scene
//! - Everything else is sent to the Dungeon Master

use crate::prompt::OPENING_SCENE;
use crate::session::{Session, TurnOutcome};
use llm::ChatService;
use std::io::{self, BufRead, Write};

/// Run the game loop until stdin closes or the player quits.
pub async fn run_headless<C: ChatService>(mut game: Session<C>) -> io::Result<()> {
    println!("=== AI Dungeon Master ===");
    println!("Retrieval mode: {}", game.memory().mode());
    if let Some(reason) = game.memory().fallback_reason() {
        println!("[WARN] {reason}");
    }
    println!();
    print_help();
    println!();
    println!("[DM]");
    println!("{OPENING_SCENE}");
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Error reading input: {e}");
                break;
            }
        };
        let line = line.trim();

        if let Some(command) = line.strip_prefix('#') {
            match command.split_whitespace().next() {
                Some("quit") | Some("exit") => {
                    println!("Goodbye!");
                    break;
                }
                Some("recap") => {
                    println!("[RECAP]");
                    println!("{}", game.memory().recap());
                }
                Some("mode") => {
                    println!("[MODE] {}", game.memory().mode());
                    if let Some(reason) = game.memory().fallback_reason() {
                        println!("  {reason}");
                    }
                }
                Some("help") => print_help(),
                _ => println!("[ERROR] Unknown command. Type #help for help."),
            }
            stdout.flush()?;
            continue;
        }

        print!("[PROCESSING]");
        stdout.flush()?;
        let outcome = game.handle(line).await;
        print!("\r            \r");

        match outcome {
            TurnOutcome::Pinned(note) => println!("[PINNED] {}", note.note),
            TurnOutcome::PinUsage => println!("[ERROR] Usage: remember: <note>"),
            TurnOutcome::Reset => println!("[RESET] Scene cleared. Long-term notes kept."),
            TurnOutcome::Narrative(text) => {
                println!("[DM]");
                for para in text.split("\n\n") {
                    println!("{para}");
                }
                println!();
            }
        }
        stdout.flush()?;
    }

    Ok(())
}

fn print_help() {
    println!("[HELP]");
    println!("  #quit             - Exit the game");
    println!("  #recap            - Show recent long-term notes");
    println!("  #mode             - Show the retrieval mode");
    println!("  #help             - Show this help");
    println!("  remember: <note>  - Pin a fact the DM must respect");
    println!("  reset             - Clear the current scene");
    println!("  (anything else is sent as a player action)");
}

/// Retrieval override from command line flags, if any.
///
/// The last of `--semantic` / `--lightweight` wins.
pub fn parse_mode_override(args: &[String]) -> Option<bool> {
    args.iter().rev().find_map(|a| match a.as_str() {
        "--semantic" => Some(true),
        "--lightweight" => Some(false),
        _ => None,
    })
}
