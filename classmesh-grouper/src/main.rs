//! classmesh - Cross-institution class grouping CLI
//!
//! Creates universities and classes, groups every class on create/edit, and
//! prints the resulting catalog as JSON.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use classmesh_common::config::{self, ROOT_FOLDER_ENV};
use classmesh_common::db::init_database;
use classmesh_grouper::config::{build_engine, resolve_max_lock_wait_ms, resolve_threshold};
use classmesh_grouper::services::{seed_catalog, GroupingService, SeedFile, DEFAULT_MAX_LOCK_WAIT_MS};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

/// Command-line arguments for classmesh
#[derive(Parser, Debug)]
#[command(name = "classmesh")]
#[command(about = "Groups equivalent classes across universities")]
#[command(version)]
struct Cli {
    /// Root folder holding classmesh.db
    #[arg(long, global = true)]
    root_folder: Option<PathBuf>,

    /// Database file (overrides the root folder location)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Fuzzy match threshold in [0, 1]
    #[arg(long, global = true)]
    threshold: Option<f64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage universities
    #[command(subcommand)]
    University(UniversityCommand),

    /// Create, edit or re-group classes
    #[command(subcommand)]
    Class(ClassCommand),

    /// Inspect class groups
    #[command(subcommand)]
    Groups(GroupsCommand),

    /// Load universities and classes from a TOML seed file
    Seed {
        file: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum UniversityCommand {
    Add { name: String },
}

#[derive(Subcommand, Debug)]
enum ClassCommand {
    /// Create a class and assign it to a group
    Add {
        /// University name
        #[arg(long)]
        university: String,
        name: String,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// Rename and/or retag a class, then re-assign it
    Edit(EditArgs),

    /// Re-run grouping for a class
    Assign { class_id: Uuid },
}

#[derive(Args, Debug)]
struct EditArgs {
    class_id: Uuid,

    #[arg(long)]
    name: Option<String>,

    /// Replaces the full tag list
    #[arg(long = "tag")]
    tags: Vec<String>,

    /// Remove every tag
    #[arg(long, conflicts_with = "tags")]
    clear_tags: bool,
}

#[derive(Subcommand, Debug)]
enum GroupsCommand {
    List,
    Members { group_id: Uuid },
    /// The group a class belongs to, with every class in it
    ByClass { class_id: Uuid },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let toml_config =
        config::load_toml_config(cli.config.as_deref()).context("Failed to load config file")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&toml_config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting classmesh v{}", env!("CARGO_PKG_VERSION"));

    let db_path = match &cli.database {
        Some(path) => path.clone(),
        None => {
            let root_folder =
                config::resolve_root_folder(cli.root_folder.as_deref(), ROOT_FOLDER_ENV, &toml_config);
            ensure_directory(&root_folder)?;
            config::database_path(&root_folder)
        }
    };
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    let threshold = resolve_threshold(cli.threshold, &toml_config, &pool)
        .await
        .context("Invalid grouping threshold")?;
    let max_lock_wait_ms = resolve_max_lock_wait_ms(&pool, DEFAULT_MAX_LOCK_WAIT_MS).await?;

    let service = GroupingService::new(pool, build_engine(&toml_config), threshold)
        .with_max_lock_wait_ms(max_lock_wait_ms);

    run(&service, cli.command).await
}

async fn run(service: &GroupingService, command: Command) -> Result<()> {
    match command {
        Command::University(UniversityCommand::Add { name }) => {
            print_json(&service.create_university(&name).await?)
        }
        Command::Class(ClassCommand::Add { university, name, tags }) => {
            let university = service
                .find_university(&university)
                .await?
                .ok_or_else(|| anyhow!("Unknown university: {}", university))?;
            print_json(&service.create_class(university.id, &name, &tags).await?)
        }
        Command::Class(ClassCommand::Edit(args)) => {
            let tags = if args.clear_tags || !args.tags.is_empty() {
                Some(args.tags.as_slice())
            } else {
                None
            };
            print_json(
                &service
                    .update_class(args.class_id, args.name.as_deref(), tags)
                    .await?,
            )
        }
        Command::Class(ClassCommand::Assign { class_id }) => {
            print_json(&service.assign_class(class_id).await?)
        }
        Command::Groups(GroupsCommand::List) => print_json(&service.list_groups().await?),
        Command::Groups(GroupsCommand::Members { group_id }) => {
            print_json(&service.group_members(group_id).await?)
        }
        Command::Groups(GroupsCommand::ByClass { class_id }) => {
            print_json(&service.siblings_of_class(class_id).await?)
        }
        Command::Seed { file } => {
            let seed = SeedFile::load(&file)
                .with_context(|| format!("Failed to read seed file {}", file.display()))?;
            let report = seed_catalog(service, &seed).await?;
            info!(
                classes_created = report.classes_created,
                groups_created = report.groups_created,
                "Seed complete"
            );
            print_json(&report)
        }
    }
}

fn ensure_directory(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create root folder {}", path.display()))?;
        info!("Created root folder: {}", path.display());
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
