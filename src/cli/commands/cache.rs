//! Cache command - inspect or clear the lookup cache

use crate::cache::{CacheFile, CacheStore, CachedLookup};
use crate::cli::args::{CacheAction, CacheArgs, OutputFormat};
use crate::config::Config;
use crate::error::{CascadeError, CascadeResult};
use crate::ui::{self, UiContext};
use chrono::Utc;
use console::style;
use std::path::Path;
use tokio::fs;

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: &Config) -> CascadeResult<()> {
    let mut store = CacheStore::new(config.cache.name.clone(), config.cache_settings());

    match args.action {
        CacheAction::Show { format } => show_cache(&mut store, config, format).await,
        CacheAction::Clear { yes } => clear_cache(&mut store, yes).await,
        CacheAction::Path => {
            println!("{}", store.file_path().display());
            Ok(())
        }
    }
}

async fn show_cache(
    store: &mut CacheStore,
    config: &Config,
    format: OutputFormat,
) -> CascadeResult<()> {
    let path = store.file_path();
    let Some(file) = read_cache_file(&path).await? else {
        match format {
            OutputFormat::Json => println!("null"),
            OutputFormat::Plain => {
                let ctx = UiContext::detect();
                ui::step_info(&ctx, &format!("No lookup cache at {}", path.display()));
            }
        }
        return Ok(());
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&file)?),
        OutputFormat::Plain => print_summary(&file, &path, config),
    }

    Ok(())
}

fn print_summary(file: &CacheFile, path: &Path, config: &Config) {
    let ctx = UiContext::detect();
    let age = (Utc::now() - file.written_at).num_seconds().max(0);
    // Matches the store: a file as old as its lifetime is already stale
    let fresh = u64::try_from(age).is_ok_and(|age| age < config.cache.lifetime_secs);

    ui::intro(&ctx, &format!("Lookup cache '{}'", file.name));
    ui::key_value(&ctx, "File", &path.display().to_string());
    ui::key_value(
        &ctx,
        "Written",
        &file.written_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    );
    ui::key_value_status(
        &ctx,
        "Age",
        &format!("{}s of {}s", age, config.cache.lifetime_secs),
        fresh,
    );
    ui::key_value(&ctx, "Entries", &file.entries.len().to_string());
    println!();

    for (digest, entry) in &file.entries {
        match entry {
            CachedLookup::Single { path } => {
                println!("  {} {}", style(digest).dim(), path.display())
            }
            CachedLookup::Multiple { paths } => {
                println!("  {} {} path(s)", style(digest).dim(), paths.len());
                for path in paths {
                    println!("      {}", path.display());
                }
            }
            CachedLookup::Absent => println!("  {} {}", style(digest).dim(), style("absent").dim()),
        }
    }
}

async fn read_cache_file(path: &Path) -> CascadeResult<Option<CacheFile>> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(CascadeError::io(format!("reading {}", path.display()), e)),
    };

    match CacheFile::from_bytes(&bytes) {
        Some(file) => Ok(Some(file)),
        None => Err(CascadeError::User(format!(
            "{} is corrupt or from another version; run: cascade cache clear",
            path.display()
        ))),
    }
}

async fn clear_cache(store: &mut CacheStore, yes: bool) -> CascadeResult<()> {
    let ctx = UiContext::detect().with_auto_yes(yes);
    let path = store.file_path();

    if !path.exists() {
        ui::step_info(&ctx, "No lookup cache to clear");
        return Ok(());
    }

    if !ui::confirm(&ctx, &format!("Remove {}?", path.display()), false).await? {
        ui::remark(&ctx, "Aborted.");
        return Ok(());
    }

    if store.clear()? {
        ui::step_ok_detail(&ctx, "Lookup cache cleared", &path.display().to_string());
    }

    Ok(())
}
