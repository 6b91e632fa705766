//! CLI command implementations

pub mod cache;
pub mod config;
pub mod list;
pub mod locate;

pub use cache::execute as cache;
pub use config::execute as config;
pub use list::execute as list;
pub use locate::execute as locate;

use crate::cache::PersistStatus;
use crate::cli::args::RootArgs;
use crate::config::Config;
use crate::error::CascadeResult;
use crate::paths::Position;
use crate::resolver::Resolver;
use tracing::debug;

/// Resolver for `config` with the command-line search overrides applied
pub(crate) fn build_resolver(config: &Config, search: &RootArgs) -> CascadeResult<Resolver> {
    let mut config = config.clone();
    if search.module.is_some() {
        config.context.active_module = search.module.clone();
    }
    config
        .context
        .extra_roots
        .extend(search.request_roots.iter().cloned());
    config.context.packages.extend(search.package.iter().cloned());

    let mut resolver = Resolver::from_config(&config)?;
    let paths = resolver.paths_mut();
    paths.add_roots(&search.prepend, Position::Prepend)?;
    paths.add_roots(&search.roots, Position::Append)?;
    paths.push_flash_all(&search.flash)?;

    debug!(
        "Search path: {} roots, {} flash",
        paths.len(),
        paths.flash().len()
    );
    Ok(resolver)
}

/// Write the lookup cache once the command is done with the resolver.
///
/// Write failures are already logged by the store and never fail a command.
pub(crate) fn finish(resolver: &mut Resolver) -> PersistStatus {
    let status = resolver.persist();
    debug!("Lookup cache persist: {:?}", status);
    status
}
