use anyhow::Context;
use clap::Parser;
use confluence_snapshot::app::jobs::{
    PermissionsPipeline, RemoveRestrictionsPipeline, SpacesPipeline, UserUsagePipeline,
    WatchersPipeline,
};
use confluence_snapshot::core::{ConfigProvider, Pipeline};
use confluence_snapshot::utils::error::{EtlError, ErrorSeverity};
use confluence_snapshot::utils::logger;
use confluence_snapshot::{CliConfig, EtlEngine, JobCommand, LocalStorage, Settings};

#[tokio::main]
async fn main() {
    // .env 中的憑證視同環境變數
    dotenvy::dotenv().ok();

    let config = CliConfig::parse();

    if config.json_logs {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    let job = config.job.kind();
    tracing::info!("Starting confluence-snapshot {}", env!("CARGO_PKG_VERSION"));

    let settings = match config
        .resolve_settings()
        .and_then(|settings| settings.validate_for(job).map(|_| settings))
    {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(exit_code(&e));
        }
    };
    tracing::debug!("Resolved settings: {:?}", settings);

    match run_job(&config.job, settings)
        .await
        .with_context(|| format!("job {} failed", job.name()))
    {
        Ok(output_path) => {
            tracing::info!("📁 Output saved to: {}", output_path);
            println!("✅ {} snapshot completed", job.name());
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            let Some(etl_error) = e.downcast_ref::<EtlError>() else {
                tracing::error!("❌ {:#}", e);
                std::process::exit(1);
            };

            tracing::error!(
                "❌ {:#} (Category: {:?}, Severity: {:?})",
                e,
                etl_error.category(),
                etl_error.severity()
            );
            if let Some(status) = etl_error.status() {
                tracing::error!("HTTP status: {}", status);
            }
            tracing::error!("💡 Recovery suggestion: {}", etl_error.recovery_suggestion());

            eprintln!("❌ {}", etl_error.user_friendly_message());
            eprintln!("💡 {}", etl_error.recovery_suggestion());
            std::process::exit(exit_code(etl_error));
        }
    }
}

/// 依錯誤嚴重程度決定退出碼
fn exit_code(error: &EtlError) -> i32 {
    match error.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

async fn run_job(job: &JobCommand, settings: Settings) -> anyhow::Result<String> {
    let storage = LocalStorage::new(settings.output_path());

    let output_path = match job {
        JobCommand::UserUsage => run(UserUsagePipeline::new(storage, settings)?).await?,
        JobCommand::Spaces => run(SpacesPipeline::new(storage, settings)?).await?,
        JobCommand::Permissions { .. } => run(PermissionsPipeline::new(storage, settings)?).await?,
        JobCommand::Watchers => run(WatchersPipeline::new(storage, settings)?).await?,
        JobCommand::RemoveRestrictions { space_key, dry_run } => {
            run(RemoveRestrictionsPipeline::new(
                storage,
                settings,
                space_key.as_str(),
                *dry_run,
            )?)
            .await?
        }
    };
    Ok(output_path)
}

async fn run<P: Pipeline>(pipeline: P) -> Result<String, EtlError> {
    EtlEngine::new(pipeline).run().await
}
