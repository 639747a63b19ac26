//! # CLI Layer
//!
//! The only place that:
//! - Owns the tokio runtime
//! - Installs the tracing subscriber
//! - Prints to stdout
//!
//! Handlers call the [`Database`] facade and turn a degraded [`Outcome`]
//! into an error, so a storage fault ends the process with a message.

use super::render;
use super::setup::{AddArgs, CategoryCommands, Cli, Commands, ProfileCommands, SettingsCommands};
use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Parser;
use holdingsapp::backup::{self, BackupDocument};
use holdingsapp::config::HoldingsConfig;
use holdingsapp::model::{CollectionItem, ProfileUpdate};
use holdingsapp::{Database, Outcome};
use std::path::Path;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = HoldingsConfig::load(cli.config.as_deref())?;
    debug!(?config, "Loaded configuration");
    let db = Database::open(&config)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(dispatch(&db, cli.command))
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Unwrap an outcome, treating a fallback value as a failure.
fn checked<T>(outcome: Outcome<T>) -> Result<T> {
    Ok(outcome.into_result()?)
}

async fn dispatch(db: &Database, command: Option<Commands>) -> Result<()> {
    // Naked `holdings` lists.
    let command = command.unwrap_or(Commands::List { category: None });
    match command {
        Commands::List { category } => handle_list(db, category.as_deref()).await,
        Commands::Show { id } => handle_show(db, &id).await,
        Commands::Add(args) => handle_add(db, args).await,
        Commands::Remove { id } => handle_remove(db, &id).await,
        Commands::Categories { action } => {
            handle_categories(db, action.unwrap_or(CategoryCommands::List { user: false })).await
        }
        Commands::Settings { action } => {
            handle_settings(db, action.unwrap_or(SettingsCommands::Show)).await
        }
        Commands::Profile { action } => {
            handle_profile(db, action.unwrap_or(ProfileCommands::Show)).await
        }
        Commands::Export { file } => handle_export(db, file.as_deref()).await,
        Commands::Import { file } => handle_import(db, &file).await,
    }
}

async fn handle_list(db: &Database, category: Option<&str>) -> Result<()> {
    let mut items = checked(db.load_items().await)?;
    if let Some(category) = category {
        items.retain(|item| item.category == category);
    }
    print!("{}", render::item_list(&items, Utc::now().date_naive()));
    Ok(())
}

async fn handle_show(db: &Database, id: &str) -> Result<()> {
    match checked(db.get_item(id).await)? {
        Some(item) => {
            print!("{}", render::item_detail(&item, Utc::now().date_naive()));
            Ok(())
        }
        None => bail!("No item with id '{}'", id),
    }
}

async fn handle_add(db: &Database, args: AddArgs) -> Result<()> {
    let mut item = CollectionItem::new(
        Uuid::new_v4().to_string(),
        args.name,
        args.category.trim(),
        args.location,
        args.last_used.unwrap_or_else(|| Utc::now().date_naive()),
    );
    item.price_paid = args.price_paid;
    item.price_expected = args.price_expected;
    item.notes = args.notes;
    item.image_url = args.image;

    checked(db.save_item(&item).await)?;
    println!("{}", item.id);
    Ok(())
}

async fn handle_remove(db: &Database, id: &str) -> Result<()> {
    if checked(db.get_item(id).await)?.is_none() {
        bail!("No item with id '{}'", id);
    }
    checked(db.delete_item(id).await)?;
    println!("Removed {}", id);
    Ok(())
}

async fn handle_categories(db: &Database, action: CategoryCommands) -> Result<()> {
    match action {
        CategoryCommands::List { user } => {
            let names = if user {
                checked(db.get_user_categories().await)?
            } else {
                checked(db.get_categories().await)?
            };
            for name in names {
                println!("{}", name);
            }
        }
        CategoryCommands::Add { name } => {
            if name.trim().is_empty() {
                bail!("Category name cannot be empty");
            }
            checked(db.add_category(&name).await)?;
            println!("Added category '{}'", name.trim());
        }
        CategoryCommands::Delete { name } => {
            checked(db.delete_category(&name).await?)?;
            println!("Deleted category '{}'", name.trim());
        }
    }
    Ok(())
}

async fn handle_settings(db: &Database, action: SettingsCommands) -> Result<()> {
    match action {
        SettingsCommands::Show => {
            let settings = checked(db.get_settings().await)?.unwrap_or_default();
            print!("{}", render::settings(&settings));
        }
        SettingsCommands::Set {
            currency,
            theme,
            notifications,
            onboarding_completed,
        } => {
            let mut settings = checked(db.get_settings().await)?.unwrap_or_default();
            if let Some(currency) = currency {
                settings.currency = currency;
            }
            if let Some(theme) = theme {
                settings.theme = theme.into();
            }
            if let Some(enabled) = notifications {
                settings.notifications_enabled = enabled;
            }
            if let Some(done) = onboarding_completed {
                settings.onboarding_completed = done;
            }
            checked(db.save_settings(&settings).await)?;
            print!("{}", render::settings(&settings));
        }
    }
    Ok(())
}

async fn handle_profile(db: &Database, action: ProfileCommands) -> Result<()> {
    match action {
        ProfileCommands::Show => match checked(db.get_profile().await)? {
            Some(profile) => print!("{}", render::profile(&profile)),
            None => println!("No profile set."),
        },
        ProfileCommands::Set {
            name,
            email,
            avatar,
            clear_avatar,
        } => {
            let update = ProfileUpdate {
                name,
                email,
                avatar: if clear_avatar { Some(None) } else { avatar.map(Some) },
            };
            if update.is_empty() {
                bail!("Nothing to update");
            }
            checked(db.save_profile(&update).await)?;
            if let Some(profile) = checked(db.get_profile().await)? {
                print!("{}", render::profile(&profile));
            }
        }
    }
    Ok(())
}

async fn handle_export(db: &Database, file: Option<&Path>) -> Result<()> {
    let document = checked(backup::export(db).await)?;
    let text = document.to_json_pretty()?;
    match file {
        Some(path) => {
            std::fs::write(path, text)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!(
                "Exported {} items to {}",
                document.inventory.len(),
                path.display()
            );
        }
        None => println!("{}", text),
    }
    Ok(())
}

async fn handle_import(db: &Database, file: &Path) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let document = BackupDocument::from_json(&text)?;
    let mut report = backup::restore(db, &document).await;
    if !report.is_complete() {
        let fault = report.faults.remove(0);
        return Err(anyhow::Error::new(fault).context(format!(
            "restore incomplete ({} items restored)",
            report.items_restored
        )));
    }
    println!("Restored {} items", report.items_restored);
    Ok(())
}
