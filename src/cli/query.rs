//! Query command - one-shot search without the HTTP server

use clap::Args;

use crate::config::AppConfig;
use crate::domain::query::QueryRequest;
use crate::infrastructure::logging;

#[derive(Args)]
pub struct QueryArgs {
    /// Query text
    pub text: String,

    /// Scope to search ("all" searches every collection)
    #[arg(long, default_value = "all")]
    pub scope: String,

    /// Maximum number of hits to return
    #[arg(long, default_value_t = QueryRequest::DEFAULT_MAX_RESULTS)]
    pub max_results: usize,
}

pub async fn run(args: QueryArgs) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().unwrap_or_default();

    // The result JSON goes to stdout; keep log noise down for one-shots
    let mut logging_config = config.logging.clone();
    logging_config.level = "warn".to_string();
    logging::init_logging(&logging_config);

    let state = crate::create_app_state(&config).await?;
    state.search_service.start().await?;

    let request = QueryRequest::new(args.text, args.scope, args.max_results);
    let result = state.search_service.query(request).await?;

    println!("{}", serde_json::to_string_pretty(&result)?);

    state.search_service.stop().await?;
    Ok(())
}
