use crate::cli::CommandLineArgs;
use crate::resource_manager::ResourceManager;
use crate::source_loader::SourceLoader;

use std::num::NonZeroUsize;
use std::sync::Arc;

/// Shared application state passed to each pivot request handler.
#[derive(Debug)]
pub struct AppState {
    /// Command line arguments.
    pub args: CommandLineArgs,

    /// Resource manager.
    pub resource_manager: ResourceManager,

    /// Source loader and cache.
    pub loader: SourceLoader,
}

impl AppState {
    /// Create and return an [AppState].
    pub fn new(args: &CommandLineArgs) -> Self {
        let loader = SourceLoader::with_store(
            args.source_cache_size,
            args.source_cache_ttl,
            args.source_size_limit,
        );
        Self::with_loader(args, loader)
    }

    /// Create and return an [AppState] using the given source loader.
    pub fn with_loader(args: &CommandLineArgs, loader: SourceLoader) -> Self {
        let task_limit = args
            .thread_limit
            .map(NonZeroUsize::get)
            .unwrap_or_else(|| std::cmp::max(num_cpus::get().saturating_sub(1), 1));
        let resource_manager = ResourceManager::new(
            args.connection_limit.map(NonZeroUsize::get),
            Some(task_limit),
        );

        Self {
            args: args.clone(),
            resource_manager,
            loader,
        }
    }
}

/// AppState wrapped in an Atomic Reference Count (Arc) to allow multiple references.
pub type SharedAppState = Arc<AppState>;
