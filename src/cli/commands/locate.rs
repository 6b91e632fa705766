//! Locate command - resolve a file across the overlay roots

use super::{build_resolver, finish};
use crate::cli::args::{LocateArgs, OutputFormat};
use crate::config::Config;
use crate::error::CascadeResult;
use crate::resolver::Lookup;
use crate::ui::{self, UiContext};
use std::path::PathBuf;

/// Execute the locate command
pub async fn execute(args: LocateArgs, config: &Config) -> CascadeResult<()> {
    let mut resolver = build_resolver(config, &args.search)?;

    let mut lookup = Lookup::new(args.directory.clone(), args.name.clone())
        .multiple(args.all)
        .use_cache(!args.no_cache);
    if let Some(ext) = args.ext {
        lookup = lookup.extension(ext);
    }

    let located = resolver.locate(&lookup);
    finish(&mut resolver);
    let paths = located?.into_paths();

    // A miss is an empty result, not an error
    match args.format {
        OutputFormat::Json if args.all => println!("{}", serde_json::to_string_pretty(&paths)?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&paths.first())?),
        OutputFormat::Plain if paths.is_empty() => {
            let ctx = UiContext::detect();
            if ctx.is_interactive() {
                ui::step_info(
                    &ctx,
                    &format!("No file found for '{}' in '{}'", args.name, args.directory),
                );
            }
        }
        OutputFormat::Plain => print_plain(&paths),
    }

    Ok(())
}

fn print_plain(paths: &[PathBuf]) {
    for path in paths {
        println!("{}", path.display());
    }
}
