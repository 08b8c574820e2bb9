// Mobi entry point.
//
// Startup sequence:
// 1. Load config (the log directory comes from it)
// 2. Initialize tracing (log to file, not terminal)
// 3. Build the generative-model client
// 4. Seed the store
// 5. Create mpsc channels
// 6. Spawn app logic task
// 7. Run the line front end on stdin/stdout
// 8. Cleanup on exit

use std::path::Path;
use std::sync::Arc;

use mobi_app::app;
use mobi_cli::repl;
use mobi_core::config;
use mobi_core::MobiState;
use mobi_llm::{GenerativeModel, LlmClient};

use anyhow::Context;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load config
    let config = config::load_config().context("failed to load configuration")?;

    // 2. Initialize tracing (log to file, not terminal)
    init_tracing(Path::new(&config.logging.directory))?;
    info!("Mobi starting up");
    info!(
        "Config loaded: api={}, coach suggestions={}",
        config.api.base_url, config.coach.suggestion_count
    );

    // 3. Build the LLM client from config
    let llm_client = LlmClient::from_config(&config);
    match &llm_client {
        LlmClient::Active(_) => info!("LLM client initialized (API key configured)"),
        LlmClient::Disabled => {
            info!("LLM client disabled (no API key)");
            eprintln!(
                "Aviso: no hay clave de API ({}); las funciones de IA usarán respuestas por defecto.",
                config::API_KEY_ENV
            );
        }
    }
    let model: Arc<dyn GenerativeModel> = Arc::new(llm_client);

    // 4. Seed the store with the demo data
    let store = MobiState::with_seed_data();
    info!(
        "Store seeded: {} leads, {} objections",
        store.leads().len(),
        store.objections().len()
    );

    // 5. Create mpsc channels (before AppState so llm_tx can be passed in)
    let (llm_tx, llm_rx) = mpsc::channel(256);
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (ui_tx, ui_rx) = mpsc::channel(256);

    let app_state = app::AppState::new(config, store, model, llm_tx);

    // 6. Spawn app logic task
    let app_handle = tokio::spawn(async move {
        if let Err(e) = app::run(llm_rx, cmd_rx, ui_tx, app_state).await {
            error!("Application loop error: {}", e);
        }
    });

    // 7. Run the front end (until quit or end of input)
    info!("Application ready");
    let stdin = BufReader::new(tokio::io::stdin());
    let mut printer = repl::Printer::new(std::io::stdout(), repl::default_output_dir());
    if let Err(e) = repl::run(stdin, &mut printer, ui_rx, cmd_tx).await {
        error!("Front end error: {}", e);
    }

    // 8. Cleanup: wait for app task to finish (with timeout)
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        let _ = app_handle.await;
    })
    .await;

    info!("Mobi shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file (not the terminal, which is used by
/// the command line).
fn init_tracing(log_dir: &Path) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

    let log_file = std::fs::File::create(log_dir.join("mobi.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("mobi_core=info,mobi_llm=info,mobi_app=info,mobi_cli=info,warn")
        }))
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
