//! Build command - build one theme and print its stylesheet

use crate::cli::args::BuildArgs;
use crate::cli::commands::{short_sha, with_cache_dir};
use crate::config::Config;
use crate::error::{ShowcaseError, ShowcaseResult};
use crate::render::render_error;
use crate::showcase::Showcase;
use crate::ui::{TaskSpinner, UiContext};
use std::io::Write;
use tokio::fs;

/// Execute the build command
///
/// A failed build still prints its diagnostic stylesheet before the
/// error is returned, matching what the server would send.
pub async fn execute(args: BuildArgs, config: &Config) -> ShowcaseResult<()> {
    let ctx = UiContext::detect();
    let config = with_cache_dir(config, args.cache_dir);
    let showcase = Showcase::from_config(&config).await?;

    let theme = &args.theme;
    let resolved = showcase
        .resolve(&theme.org, &theme.repo, &theme.reference)
        .await?;
    let label = format!(
        "{}/{}@{}",
        resolved.org,
        resolved.repo,
        short_sha(&resolved.sha)
    );

    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start(&format!("Building {}", label));

    match showcase.ensure(&resolved, args.force).await {
        Ok(path) => {
            spinner.stop(&format!("Built {}", label));
            let css = fs::read(&path)
                .await
                .map_err(|e| ShowcaseError::io(format!("reading {}", path.display()), e))?;
            write_stdout(&css)
        }
        Err(e) => {
            spinner.stop_error(&format!("Build of {} failed", label));
            if e.is_build_failure() {
                write_stdout(render_error(&e).as_bytes())?;
            }
            Err(e)
        }
    }
}

fn write_stdout(bytes: &[u8]) -> ShowcaseResult<()> {
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(bytes)
        .and_then(|()| stdout.flush())
        .map_err(|e| ShowcaseError::io("writing stylesheet to stdout", e))
}
