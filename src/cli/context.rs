//! Command execution context
//!
//! Loads config and opens the cache once, so handlers only deal with their
//! own command.

use std::sync::Arc;

use crate::cache::{self, CachedExpenseClient, HybridCache};
use crate::cli::{GlobalOptions, OutputFormat};
use crate::client::HttpExpenseClient;
use crate::config::Config;
use crate::error::Result;

/// Context for command execution containing config, cache, and runtime options.
pub struct CommandContext {
    /// Loaded and validated configuration (defaults when no file exists)
    pub config: Config,
    /// Cache shared by every client built from this context
    pub cache: Arc<HybridCache>,
    /// Output format preference
    pub format: OutputFormat,
    /// Whether reads skip cached entries
    pub no_cache: bool,
}

impl CommandContext {
    /// Create a new command context.
    ///
    /// Opening the cache never fails: an unusable store degrades to a
    /// memory-only persistent tier.
    ///
    /// # Errors
    /// Returns error if an existing config file cannot be parsed or is invalid.
    pub fn new(opts: &GlobalOptions) -> Result<Self> {
        let config = Config::load_or_default(opts.config_path())?;
        let cache = Arc::new(cache::open(&config.cache));

        Ok(Self {
            config,
            cache,
            format: opts.format,
            no_cache: opts.no_cache,
        })
    }

    /// Build the cached API client for the configured account.
    pub fn client(&self) -> Result<CachedExpenseClient<HttpExpenseClient>> {
        let raw_client = HttpExpenseClient::from_config(&self.config)?;
        let user_id = self.config.user_id.as_deref();

        let client = CachedExpenseClient::new(raw_client, self.cache.clone(), user_id);

        Ok(client.with_refresh(self.no_cache))
    }
}
