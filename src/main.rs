use anyhow::Result;
use clap::Parser;

use prereview_workflow::cli::{commands, Cli};
use prereview_workflow::config::{config, init_config};
use prereview_workflow::telemetry::init_telemetry;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = config()?;
    init_telemetry(&loaded.observability)?;
    init_config()?;
    let config = commands::effective_config(&cli, loaded);

    let result = tokio::runtime::Runtime::new()?.block_on(async {
        commands::run(cli, &config).await
    });

    #[cfg(feature = "metrics")]
    prereview_workflow::observability::workflow_metrics().log_stats();

    result
}
