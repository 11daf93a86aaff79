//! Cache command - inspect cached responses

use crate::cache::{CacheEntryInfo, DiskCache};
use crate::cli::args::{CacheAction, CacheArgs, OutputFormat};
use crate::config::{Config, ConfigManager};
use crate::error::AwsmapResult;
use chrono::Utc;
use console::style;
use serde::Serialize;

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: &Config) -> AwsmapResult<()> {
    let cache = DiskCache::new(ConfigManager::cache_dir(config));

    match args.action {
        CacheAction::List { format } => list_entries(&cache, format).await,
        CacheAction::Path => {
            println!("{}", cache.root().display());
            Ok(())
        }
    }
}

async fn list_entries(cache: &DiskCache, format: OutputFormat) -> AwsmapResult<()> {
    let entries = cache.entries().await?;

    match format {
        OutputFormat::Table => print_table(&entries),
        OutputFormat::Json => println!("{}", entries_json(&entries)?),
        OutputFormat::Plain => {
            for entry in &entries {
                println!("{}", entry.key);
            }
        }
    }

    Ok(())
}

fn print_table(entries: &[CacheEntryInfo]) {
    if entries.is_empty() {
        println!("No cached responses.");
        return;
    }

    println!("{:<64} {:>10} {:>10}", "KEY", "SIZE", "AGE");
    println!("{}", "-".repeat(86));

    let now = Utc::now();
    for entry in entries {
        println!(
            "{:<64} {:>10} {:>10}",
            entry.key,
            format_size(entry.size),
            style(format_age(now.signed_duration_since(entry.modified))).dim()
        );
    }

    println!();
    println!("Total: {} response(s)", entries.len());
}

fn entries_json(entries: &[CacheEntryInfo]) -> AwsmapResult<String> {
    #[derive(Serialize)]
    struct EntryJson<'a> {
        key: &'a str,
        size: u64,
        modified: String,
    }

    let rows: Vec<EntryJson<'_>> = entries
        .iter()
        .map(|e| EntryJson {
            key: &e.key,
            size: e.size,
            modified: e.modified.to_rfc3339(),
        })
        .collect();

    Ok(serde_json::to_string_pretty(&rows)?)
}

fn format_size(bytes: u64) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1} MiB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1} KiB", bytes as f64 / 1024.0)
    } else {
        format!("{} B", bytes)
    }
}

fn format_age(age: chrono::Duration) -> String {
    if age.num_days() > 0 {
        format!("{}d", age.num_days())
    } else if age.num_hours() > 0 {
        format!("{}h", age.num_hours())
    } else if age.num_minutes() > 0 {
        format!("{}m", age.num_minutes())
    } else {
        "now".to_string()
    }
}
