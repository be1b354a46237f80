use crate::cli::actions::Action;
use crate::pipeline::PipelineConfig;
use crate::varco;
use anyhow::{Context, Result};
use url::Url;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server {
            port,
            dsn,
            cache_capacity,
            sessions_enabled,
        } => {
            // Fail early on an unparseable DSN instead of inside the pool.
            Url::parse(&dsn).context("Invalid database connection string")?;

            let config = PipelineConfig::new()
                .with_cache_capacity(cache_capacity)
                .with_sessions_enabled(sessions_enabled);

            varco::new(port, dsn, config).await?;
        }
    }

    Ok(())
}
