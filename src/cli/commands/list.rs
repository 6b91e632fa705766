//! List command - glob a directory across every overlay root

use super::build_resolver;
use crate::cli::args::{ListArgs, OutputFormat};
use crate::config::Config;
use crate::error::CascadeResult;
use crate::ui::{self, UiContext};

/// Execute the list command
pub async fn execute(args: ListArgs, config: &Config) -> CascadeResult<()> {
    let mut resolver = build_resolver(config, &args.search)?;
    let directory = args.directory.unwrap_or_default();

    let files = resolver.list_files(&directory, &args.filter)?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&files)?),
        OutputFormat::Plain if files.is_empty() => {
            let ctx = UiContext::detect();
            ui::step_info(
                &ctx,
                &format!("No files match '{}' in '{}'", args.filter, directory),
            );
        }
        OutputFormat::Plain => {
            for file in &files {
                println!("{}", file.display());
            }
        }
    }

    Ok(())
}
