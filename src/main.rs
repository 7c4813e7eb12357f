use std::fs::File;
use std::io::{self, BufWriter};
use std::sync::Arc;

use inbox_router::analysis::AnalysisOrchestrator;
use inbox_router::config::RouterConfig;
use inbox_router::email::DirectorySource;
use inbox_router::error::{Result, SourceError};
use inbox_router::llm::create_provider;
use inbox_router::pipeline::{DecisionSink, JsonLinesSink, LogSink, PipelineController};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries decisions only.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let config = RouterConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  export ANTHROPIC_API_KEY=sk-ant-...  (or set ROUTER_LLM_BACKEND=openai and OPENAI_API_KEY)");
        std::process::exit(1);
    });

    eprintln!("📬 Inbox Router v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.llm.model);
    eprintln!("   Mail directory: {}", config.storage_path.display());

    let llm = create_provider(&config.llm)?;
    let orchestrator = Arc::new(AnalysisOrchestrator::new(llm, config.analysis.clone()));

    let reference = config.load_reference_entities()?;
    let controller = PipelineController::new(orchestrator)
        .with_reference(reference)
        .with_max_concurrent(config.max_concurrent);

    let source = DirectorySource::new(&config.storage_path).with_seed_sample(config.seed_sample);

    let sink: Box<dyn DecisionSink> = match &config.decisions_out {
        Some(path) => {
            let file = File::create(path).map_err(|source| SourceError::Io {
                path: path.clone(),
                source,
            })?;
            Box::new(JsonLinesSink::new(BufWriter::new(file)))
        }
        None => Box::new(JsonLinesSink::new(io::stdout())),
    };

    let report = controller.run(&source, sink.as_ref()).await?;
    for outcome in &report.outcomes {
        LogSink.emit(outcome).await?;
    }

    tracing::info!(
        routed = report.succeeded(),
        failed = report.failed(),
        total = report.total(),
        "Done"
    );
    Ok(())
}
