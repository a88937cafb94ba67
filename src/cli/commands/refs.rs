//! Refs command - list tags and branches of a theme repository

use crate::cache::CacheKey;
use crate::cli::args::{OutputFormat, RefsArgs};
use crate::cli::commands::short_sha;
use crate::config::Config;
use crate::error::ShowcaseResult;
use crate::forge::{Forge, GithubForge, RefEntry};
use console::style;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct RefRow<'a> {
    kind: &'static str,
    name: &'a str,
    sha: &'a str,
}

/// Execute the refs command
pub async fn execute(args: RefsArgs, config: &Config) -> ShowcaseResult<()> {
    CacheKey::check_names(&args.org, &args.repo)?;

    let forge = GithubForge::new(&config.forge);
    let tags = forge.list_tags(&args.org, &args.repo).await?;
    let branches = forge.list_branches(&args.org, &args.repo).await?;
    let rows = rows(&tags, &branches);

    match args.format {
        OutputFormat::Table => print_table(&rows),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Plain => {
            for row in &rows {
                println!("{}", row.name);
            }
        }
    }

    Ok(())
}

fn rows<'a>(tags: &'a [RefEntry], branches: &'a [RefEntry]) -> Vec<RefRow<'a>> {
    let tags = tags.iter().map(|r| ("tag", r));
    let branches = branches.iter().map(|r| ("branch", r));
    tags.chain(branches)
        .map(|(kind, r)| RefRow {
            kind,
            name: &r.name,
            sha: &r.sha,
        })
        .collect()
}

fn print_table(rows: &[RefRow<'_>]) {
    println!(
        "{:<8} {:<40} {:<12}",
        style("KIND").bold(),
        style("NAME").bold(),
        style("SHA").bold()
    );
    println!("{}", "-".repeat(62));

    for row in rows {
        let kind = match row.kind {
            "tag" => style(row.kind).cyan(),
            _ => style(row.kind).green(),
        };
        println!("{:<8} {:<40} {:<12}", kind, row.name, short_sha(row.sha));
    }

    println!();
    println!("Total: {} ref(s)", rows.len());
}
