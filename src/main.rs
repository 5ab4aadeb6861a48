use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use assistant_chat::{
    logging, new_cancel_signal, working_dir, CancelSignal, ChatConfig, ChatError, ChatSession,
    Palette, ShellToolExecutor,
};
use assistant_service::ServiceError;
use assistants_api::{AssistantsApiConfig, BlockingAssistantsApi};
use clap::Parser;
use signal_hook::consts::SIGINT;
use signal_hook::flag;

const INTERRUPTED_EXIT_CODE: u8 = 130;

/// Chat with an assistant from the terminal.
#[derive(Debug, Parser)]
#[command(name = "assistant-chat", version, about)]
struct Cli {
    /// Trace every request and response body to stderr.
    #[arg(long)]
    debug: bool,

    /// Path of the thread record (default: ./.assistant/store.json).
    #[arg(long, value_name = "PATH")]
    store: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(cli.debug);

    match run(cli) {
        Ok(end) => {
            tracing::debug!(?end, "session finished");
            ExitCode::SUCCESS
        }
        Err(error @ ChatError::Interrupted { .. }) => {
            tracing::warn!(%error, "session interrupted");
            eprintln!("error: {error}");
            ExitCode::from(INTERRUPTED_EXIT_CODE)
        }
        Err(error) => {
            tracing::error!(%error, "session aborted");
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<assistant_chat::SessionEnd, ChatError> {
    let cwd = working_dir()?;
    let mut config = ChatConfig::from_env(&cwd)?.with_debug(cli.debug);
    if let Some(store) = cli.store {
        config = config.with_store_path(store);
    }

    let api = BlockingAssistantsApi::new(
        AssistantsApiConfig::new(config.api_key.clone())
            .with_base_url(config.base_url.clone())
            .with_trace(config.debug),
    )
    .map_err(ServiceError::from)?;
    let executor = ShellToolExecutor::new().with_timeout(config.tools.timeout);
    let cancel = install_interrupt_handler()?;

    let stdout = io::stdout();
    let palette = Palette::new(stdout.is_terminal());
    let mut session = ChatSession::start(
        &config,
        Arc::new(api),
        Arc::new(executor),
        cancel,
        io::stdin().lock(),
        stdout.lock(),
        palette,
    )?;
    session.run()
}

/// First Ctrl-C cancels the busy run. A second one exits: directly when the flag is
/// still set, or through `ChatError::Interrupted` once the orchestrator has consumed it.
fn install_interrupt_handler() -> io::Result<CancelSignal> {
    let cancel = new_cancel_signal();
    flag::register_conditional_shutdown(
        SIGINT,
        i32::from(INTERRUPTED_EXIT_CODE),
        Arc::clone(&cancel),
    )?;
    flag::register(SIGINT, Arc::clone(&cancel))?;
    Ok(cancel)
}
