use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use client_core::{
    HttpPostSource, PersistenceError, PostSource, RemoteCollectionController, TaskStore,
};
use shared::{
    domain::{PostId, TaskFilter, TaskId},
    error::{Classified, ErrorReport},
};
use storage::{open_slot, TASKS_SLOT_KEY};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod browse;
mod config;
mod render;

use config::{load_settings, Settings};

#[derive(Parser, Debug)]
#[command(name = "taskdeck", about = "Local task list and remote post browser")]
struct Cli {
    #[arg(long, default_value = config::CONFIG_FILE)]
    config: PathBuf,
    #[arg(long)]
    api_base_url: Option<String>,
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    page_size: Option<u32>,
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    request_timeout_secs: Option<u64>,
    /// `sqlite:` URL or path of a JSON file.
    #[arg(long)]
    storage_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage the local task list.
    Tasks {
        #[command(subcommand)]
        command: TaskCommand,
    },
    /// Query the remote post collection.
    Posts {
        #[command(subcommand)]
        command: PostCommand,
    },
    /// List the remote users.
    Users,
    /// Page through and search posts interactively.
    Browse,
}

#[derive(Subcommand, Debug)]
enum TaskCommand {
    Add {
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
    },
    Toggle {
        id: TaskId,
    },
    Remove {
        id: TaskId,
    },
    List {
        #[arg(long, value_enum, default_value_t = FilterArg::All)]
        filter: FilterArg,
    },
}

#[derive(Subcommand, Debug)]
enum PostCommand {
    Page { page: u32 },
    Search { query: String },
    Show { id: i64 },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FilterArg {
    All,
    Active,
    Completed,
}

impl From<FilterArg> for TaskFilter {
    fn from(value: FilterArg) -> Self {
        match value {
            FilterArg::All => TaskFilter::All,
            FilterArg::Active => TaskFilter::Active,
            FilterArg::Completed => TaskFilter::Completed,
        }
    }
}

impl Cli {
    fn settings(&self) -> Settings {
        let mut settings = load_settings(&self.config);
        if let Some(v) = &self.api_base_url {
            settings.api_base_url = v.clone();
        }
        if let Some(v) = self.page_size {
            settings.page_size = v;
        }
        if let Some(v) = self.request_timeout_secs {
            settings.request_timeout_secs = v;
        }
        if let Some(v) = &self.storage_url {
            settings.storage_url = v.clone();
        }
        settings
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = cli.settings();
    info!(
        api_base_url = %settings.api_base_url,
        storage_url = %settings.storage_url,
        page_size = settings.page_size,
        "taskdeck: settings loaded"
    );

    match cli.command {
        Command::Tasks { command } => run_tasks(&settings, command).await,
        Command::Posts { command } => run_posts(&settings, command).await,
        Command::Users => {
            let users = post_source(&settings)?
                .fetch_users()
                .await
                .map_err(reported)?;
            for user in users {
                println!("{}", render::user_line(&user));
            }
            Ok(())
        }
        Command::Browse => {
            let source = post_source(&settings)?;
            browse::run(RemoteCollectionController::new(source, settings.page_size)).await
        }
    }
}

fn post_source(settings: &Settings) -> Result<Arc<dyn PostSource>> {
    let source = HttpPostSource::with_timeout(&settings.api_base_url, settings.request_timeout())
        .with_context(|| format!("invalid api base url '{}'", settings.api_base_url))?;
    Ok(Arc::new(source))
}

/// Logs a typed core error with its code before handing it to `anyhow`.
fn reported<E>(err: E) -> anyhow::Error
where
    E: Classified + Send + Sync + 'static,
{
    let report = ErrorReport::from_error(&err);
    warn!(
        code = %report.code,
        retryable = report.code.is_retryable(),
        "taskdeck: {}",
        report.message
    );
    anyhow::Error::new(err)
}

fn report_persistence(error: Option<&PersistenceError>) {
    if let Some(err) = error {
        eprintln!(
            "warning: change kept in memory only ({})",
            ErrorReport::from_error(err)
        );
    }
}

async fn run_tasks(settings: &Settings, command: TaskCommand) -> Result<()> {
    let slot = open_slot(&settings.storage_url, TASKS_SLOT_KEY).await?;
    let (mut store, warning) = TaskStore::open(slot).await;
    if let Some(err) = warning {
        eprintln!("warning: starting with an empty task list: {err}");
    }

    match command {
        TaskCommand::Add { title } => {
            let outcome = store.create(&title.join(" ")).await.map_err(reported)?;
            report_persistence(outcome.persist_error.as_ref());
            println!("added {}", render::task_line(&outcome.value));
        }
        TaskCommand::Toggle { id } => {
            let outcome = store.toggle_complete(id).await.map_err(reported)?;
            report_persistence(outcome.persist_error.as_ref());
            println!("{}", render::task_line(&outcome.value));
        }
        TaskCommand::Remove { id } => {
            let outcome = store.remove(id).await.map_err(reported)?;
            report_persistence(outcome.persist_error.as_ref());
            println!("removed {}", render::task_line(&outcome.value));
        }
        TaskCommand::List { filter } => {
            let tasks = store.list_filtered(filter.into());
            println!("{}", render::task_list(&tasks, store.counts()));
        }
    }
    Ok(())
}

async fn run_posts(settings: &Settings, command: PostCommand) -> Result<()> {
    let source = post_source(settings)?;
    let state = match command {
        PostCommand::Show { id } => {
            let post = source.fetch_post(PostId(id)).await.map_err(reported)?;
            println!("{}", render::post_detail(&post));
            return Ok(());
        }
        PostCommand::Page { page } => {
            let controller = RemoteCollectionController::new(source, settings.page_size);
            controller.load_page(page);
            controller.settled().await
        }
        PostCommand::Search { query } => {
            let controller = RemoteCollectionController::new(source, settings.page_size);
            controller.search(&query);
            controller.settled().await
        }
    };

    println!("{}", render::browse_view(&state));
    match state.error() {
        Some(error) => anyhow::bail!("{error}"),
        None => Ok(()),
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
