use clap::Parser;
use kino_digest::utils::error::ErrorSeverity;
use kino_digest::utils::{logger, validation::Validate};
use kino_digest::{build_pipeline, CliConfig, DigestEngine, DigestError};

fn report(stage: &str, e: &DigestError) -> i32 {
    tracing::error!(
        "❌ {}: {} (Category: {:?}, Severity: {:?})",
        stage,
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("🎬 kino-digest {}", env!("CARGO_PKG_VERSION"));
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = match cli.resolve().and_then(|c| c.validate().map(|_| c)) {
        Ok(config) => config,
        Err(e) => std::process::exit(report("Configuration validation failed", &e).max(1)),
    };

    let pipeline = match build_pipeline(config) {
        Ok(pipeline) => pipeline,
        Err(e) => std::process::exit(report("Startup failed", &e).max(1)),
    };

    match DigestEngine::new(pipeline).run().await {
        Ok(summary) => {
            tracing::info!("✅ Digest ready ({} bytes)", summary.len());
        }
        Err(e) => {
            let exit_code = report("Digest run failed", &e);
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }
}
