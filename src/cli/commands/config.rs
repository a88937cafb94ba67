//! Config command - show or edit configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::{ShowcaseError, ShowcaseResult};
use crate::ui::{self, UiContext};
use std::path::PathBuf;

/// Keys accepted by `config set`
const VALID_KEYS: &[&str] = &[
    "general.log_format",
    "general.journal",
    "server.host",
    "server.port",
    "cache.root",
    "cache.poll_interval_ms",
    "cache.max_poll_interval_ms",
    "cache.max_wait_secs",
    "forge.api_url",
    "forge.token",
    "forge.user_agent",
    "forge.timeout_secs",
    "build.program",
    "build.args",
];

/// Execute the config command
pub async fn execute(
    args: ConfigArgs,
    manager: &ConfigManager,
    config: &Config,
) -> ShowcaseResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => init_config(manager, force).await?,
        Some(ConfigAction::Set { key, value }) => {
            // Edit the file as written, not the copy with anchored paths
            let mut config = manager.load_raw().await?;
            set_value(&mut config, &key, &value)?;
            manager.save(&config).await?;
            ui::step_ok(&UiContext::detect(), &format!("Set {} = {}", key, value));
        }
    }

    Ok(())
}

fn show_config(config: &Config) -> ShowcaseResult<()> {
    let mut shown = config.clone();
    if shown.forge.token.is_some() {
        shown.forge.token = Some("********".to_string());
    }
    println!("{}", toml::to_string_pretty(&shown)?);
    Ok(())
}

async fn init_config(manager: &ConfigManager, force: bool) -> ShowcaseResult<()> {
    let ctx = UiContext::detect();
    let path = manager.path();

    if path.exists() && !force {
        ui::step_warn_hint(
            &ctx,
            &format!("Config already exists at {}", path.display()),
            "Use --force to overwrite",
        );
        return Ok(());
    }

    manager.save(&Config::default()).await?;
    ui::step_ok_detail(
        &ctx,
        "Configuration initialized",
        &path.display().to_string(),
    );

    Ok(())
}

/// Apply a dot-separated `key = value` to `config`
fn set_value(config: &mut Config, key: &str, value: &str) -> ShowcaseResult<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["general", "log_format"] => match value {
            "text" | "json" => config.general.log_format = value.to_string(),
            _ => {
                return Err(ShowcaseError::User(format!(
                    "Invalid log format: {}. Use text or json",
                    value
                )))
            }
        },
        ["general", "journal"] => config.general.journal = parse_bool(value)?,

        ["server", "host"] => config.server.host = value.to_string(),
        ["server", "port"] => {
            config.server.port = value
                .parse()
                .map_err(|_| ShowcaseError::User(format!("Invalid port: {}", value)))?
        }

        ["cache", "root"] => config.cache.root = Some(PathBuf::from(value)),
        ["cache", "poll_interval_ms"] => config.cache.poll_interval_ms = parse_u64(value)?,
        ["cache", "max_poll_interval_ms"] => {
            config.cache.max_poll_interval_ms = parse_u64(value)?
        }
        ["cache", "max_wait_secs"] => config.cache.max_wait_secs = parse_u64(value)?,

        ["forge", "api_url"] => config.forge.api_url = value.trim_end_matches('/').to_string(),
        ["forge", "token"] => {
            config.forge.token = (!value.is_empty()).then(|| value.to_string());
        }
        ["forge", "user_agent"] => config.forge.user_agent = value.to_string(),
        ["forge", "timeout_secs"] => config.forge.timeout_secs = parse_u64(value)?,

        ["build", "program"] => config.build.program = value.to_string(),
        ["build", "args"] => {
            config.build.args = value
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        _ => {
            let ctx = UiContext::detect();
            ui::step_error_detail(&ctx, "Unknown config key", key);
            ui::remark(&ctx, "Valid keys:");
            for key in VALID_KEYS {
                eprintln!("  {}", key);
            }
            return Err(ShowcaseError::User(format!("Unknown config key: {}", key)));
        }
    }

    Ok(())
}

fn parse_bool(value: &str) -> ShowcaseResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ShowcaseError::User(format!(
            "Invalid boolean value: {}. Use true/false",
            value
        ))),
    }
}

fn parse_u64(value: &str) -> ShowcaseResult<u64> {
    value
        .parse()
        .map_err(|_| ShowcaseError::User(format!("Invalid number: {}", value)))
}
