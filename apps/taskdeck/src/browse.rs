//! Interactive post browser on stdin.

use std::sync::Arc;

use anyhow::Result;
use client_core::RemoteCollectionController;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::render;

pub const HELP: &str = "commands: n next | p previous | g <page> | /<query> search | clear | r retry | q quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseCommand {
    Next,
    Previous,
    Page(u32),
    /// A blank query clears the search.
    Search(String),
    Clear,
    Retry,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<BrowseCommand, String> {
    let trimmed = line.trim();
    if let Some(query) = trimmed.strip_prefix('/') {
        return Ok(BrowseCommand::Search(query.to_string()));
    }

    let (word, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (trimmed, ""),
    };
    match word.to_ascii_lowercase().as_str() {
        "n" | "next" => Ok(BrowseCommand::Next),
        "p" | "prev" | "previous" => Ok(BrowseCommand::Previous),
        "g" | "page" => rest
            .parse::<u32>()
            .map(BrowseCommand::Page)
            .map_err(|_| format!("expected a page number, got '{rest}'")),
        "s" | "search" => Ok(BrowseCommand::Search(rest.to_string())),
        "clear" => Ok(BrowseCommand::Clear),
        "r" | "retry" => Ok(BrowseCommand::Retry),
        "h" | "help" | "?" => Ok(BrowseCommand::Help),
        "q" | "quit" | "exit" => Ok(BrowseCommand::Quit),
        "" => Err("empty command".to_string()),
        other => Err(format!("unknown command '{other}'")),
    }
}

/// Issues `command` against `controller`. Returns `false` when nothing was
/// requested.
pub fn dispatch(controller: &Arc<RemoteCollectionController>, command: &BrowseCommand) -> bool {
    match command {
        BrowseCommand::Next => controller.next_page().is_some(),
        BrowseCommand::Previous => controller.previous_page().is_some(),
        BrowseCommand::Page(page) => {
            controller.load_page(*page);
            true
        }
        BrowseCommand::Search(query) => {
            controller.search(query);
            true
        }
        BrowseCommand::Clear => {
            controller.clear_search();
            true
        }
        BrowseCommand::Retry => {
            controller.retry();
            true
        }
        BrowseCommand::Help | BrowseCommand::Quit => false,
    }
}

pub async fn run(controller: Arc<RemoteCollectionController>) -> Result<()> {
    controller.load_page(1);
    println!("{}", render::browse_view(&controller.settled().await));
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };
        debug!(?command, "browse: command");

        match command {
            BrowseCommand::Quit => break,
            BrowseCommand::Help => println!("{HELP}"),
            command => {
                if dispatch(&controller, &command) {
                    println!("{}", render::browse_view(&controller.settled().await));
                } else {
                    println!("no page in that direction");
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/browse_tests.rs"]
mod tests;
