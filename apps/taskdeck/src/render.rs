//! Plain-text views printed by the CLI.

use client_core::{BrowseMode, BrowseState};
use shared::domain::{Post, Task, TaskCounts, User};

pub fn task_line(task: &Task) -> String {
    let mark = if task.completed { 'x' } else { ' ' };
    format!("[{mark}] {}  ({})", task.title, task.id)
}

pub fn task_list(tasks: &[&Task], counts: TaskCounts) -> String {
    let mut lines: Vec<String> = tasks.iter().map(|task| task_line(task)).collect();
    if lines.is_empty() {
        lines.push("No tasks.".to_string());
    }
    lines.push(format!(
        "{} total, {} active, {} completed",
        counts.total, counts.active, counts.completed
    ));
    lines.join("\n")
}

pub fn browse_view(state: &BrowseState) -> String {
    let mut lines = vec![match state.mode() {
        BrowseMode::Listing { page, total_pages } => format!("Page {page} of {total_pages}"),
        BrowseMode::Searching { query } => {
            format!("Search \"{query}\": {} found", state.items().len())
        }
    }];

    if state.is_loading() {
        lines.push("Loading...".to_string());
    }
    if let Some(error) = state.error() {
        lines.push(format!("Error: {error} (r to retry)"));
    }
    if state.is_empty() && !state.is_loading() && state.error().is_none() {
        lines.push("No posts found.".to_string());
    }
    lines.extend(state.items().iter().map(post_line));

    if state.shows_pagination() {
        let previous = if state.has_previous() { "[p] previous" } else { "" };
        let next = if state.has_next() { "[n] next" } else { "" };
        lines.push(format!("{previous}  {next}").trim().to_string());
    }
    lines.join("\n")
}

pub fn post_line(post: &Post) -> String {
    format!("{:>4}  {}", post.id.0, post.title)
}

pub fn post_detail(post: &Post) -> String {
    format!(
        "#{} by user {}\n{}\n\n{}",
        post.id, post.user_id, post.title, post.body
    )
}

pub fn user_line(user: &User) -> String {
    format!(
        "{:>3}  {} (@{}) <{}>",
        user.id.0, user.name, user.username, user.email
    )
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
