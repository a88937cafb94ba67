//! Cache command - inspect and clear built stylesheets

use crate::cache::{format_bytes, CacheState, CacheStore, EntryInfo};
use crate::cli::args::{CacheAction, CacheArgs, OutputFormat};
use crate::cli::commands::short_sha;
use crate::config::Config;
use crate::error::ShowcaseResult;
use crate::ui::{self, UiContext};
use console::style;

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: &Config) -> ShowcaseResult<()> {
    match args.action {
        CacheAction::Path => {
            println!("{}", config.cache.root_dir().display());
            Ok(())
        }
        CacheAction::List { format } => {
            let store = CacheStore::open(config.cache.root_dir()).await?;
            list_entries(&store, format).await
        }
        CacheAction::Clear { yes } => {
            let store = CacheStore::open(config.cache.root_dir()).await?;
            clear_entries(&store, yes).await
        }
    }
}

async fn list_entries(store: &CacheStore, format: OutputFormat) -> ShowcaseResult<()> {
    let entries = store.list().await?;

    if entries.is_empty() {
        match format {
            OutputFormat::Json => println!("[]"),
            OutputFormat::Plain => {}
            OutputFormat::Table => println!("No cache entries found."),
        }
        return Ok(());
    }

    match format {
        OutputFormat::Table => print_entry_table(&entries),
        OutputFormat::Json => print_entry_json(&entries)?,
        OutputFormat::Plain => {
            for entry in &entries {
                println!("{}", entry.key);
            }
        }
    }

    Ok(())
}

fn dependency_label(entry: &EntryInfo) -> String {
    entry
        .descriptor
        .as_ref()
        .and_then(|d| d.dependency())
        .map(|(name, sha)| format!("{}@{}", name, short_sha(sha)))
        .unwrap_or_else(|| "-".to_string())
}

fn print_entry_table(entries: &[EntryInfo]) {
    println!(
        "{:<14} {:<10} {:<40} {:<10} {:<16}",
        "KEY", "STATE", "THEME", "SIZE", "CREATED"
    );
    println!("{}", "-".repeat(92));

    let mut total = 0;
    for entry in entries {
        let state = match entry.state {
            CacheState::Ready => style("ready").green().to_string(),
            CacheState::Building => style("building").yellow().to_string(),
        };
        let size = entry.size_bytes.map(format_bytes).unwrap_or_default();
        let created = entry
            .created_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        total += entry.size_bytes.unwrap_or(0);

        println!(
            "{:<14} {:<10} {:<40} {:<10} {:<16}",
            &entry.key[..12],
            state,
            dependency_label(entry),
            size,
            created
        );
    }

    println!();
    println!(
        "Total: {} entr{} ({})",
        entries.len(),
        if entries.len() == 1 { "y" } else { "ies" },
        format_bytes(total)
    );
}

fn print_entry_json(entries: &[EntryInfo]) -> ShowcaseResult<()> {
    #[derive(serde::Serialize)]
    struct EntryJson<'a> {
        key: &'a str,
        state: CacheState,
        dependency: Option<&'a str>,
        sha: Option<&'a str>,
        size_bytes: Option<u64>,
        created_at: Option<String>,
    }

    let json: Vec<EntryJson<'_>> = entries
        .iter()
        .map(|e| {
            let dependency = e.descriptor.as_ref().and_then(|d| d.dependency());
            EntryJson {
                key: &e.key,
                state: e.state,
                dependency: dependency.map(|(name, _)| name),
                sha: dependency.map(|(_, sha)| sha),
                size_bytes: e.size_bytes,
                created_at: e.created_at.map(|t| t.to_rfc3339()),
            }
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

async fn clear_entries(store: &CacheStore, yes: bool) -> ShowcaseResult<()> {
    let ctx = UiContext::detect().with_auto_yes(yes);

    let ready = store
        .list()
        .await?
        .into_iter()
        .filter(|e| e.state == CacheState::Ready)
        .count();
    if ready == 0 {
        ui::remark(&ctx, "No built entries to clear");
        return Ok(());
    }

    let prompt = format!("Remove {} built stylesheet(s)?", ready);
    if !ui::confirm(&ctx, &prompt, false).await? {
        ui::step_warn_hint(&ctx, "Nothing removed", "Pass --yes to clear without a prompt");
        return Ok(());
    }

    let removed = store.clear_ready().await?;
    let freed: u64 = removed.iter().filter_map(|e| e.size_bytes).sum();
    let noun = if removed.len() == 1 { "entry" } else { "entries" };
    ui::step_ok_detail(
        &ctx,
        &format!("Removed {} {}", removed.len(), noun),
        &format_bytes(freed),
    );

    Ok(())
}
