use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use shielded_tx_workflow::api::Services;
use shielded_tx_workflow::config_models::cli_args;
use shielded_tx_workflow::mock_services::SimulatedChain;
use shielded_tx_workflow::models::address::Address;
use shielded_tx_workflow::models::fee::PublicSigner;
use shielded_tx_workflow::state::session::Session;
use shielded_tx_workflow::state::status::StatusQueue;
use shielded_tx_workflow::state::watchers::WatcherRegistry;
use shielded_tx_workflow::workflow::Outcome;
use shielded_tx_workflow::workflow::TransactionWorkflow;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::FmtSubscriber;
use tx_workflow_src::terminal_prompter::TerminalPrompter;

pub mod tx_workflow_src;

pub fn main() -> Result<()> {
    let tokio_runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_io()
        .enable_time()
        .build()?;

    let result = tokio_runtime.block_on(async {
        // Fetch the CLI arguments
        let args: cli_args::Args = cli_args::Args::parse();
        set_up_logger(&args)?;
        run(args).await
    });

    tokio_runtime.shutdown_timeout(tokio::time::Duration::from_secs(10));
    result
}

fn set_up_logger(args: &cli_args::Args) -> Result<()> {
    if args.tokio_console {
        #[cfg(feature = "tokio-console")]
        {
            console_subscriber::init();
            return Ok(());
        }
        #[cfg(not(feature = "tokio-console"))]
        anyhow::bail!("--tokio-console requires building with the tokio-console feature");
    }

    // Configure logger to use ISO-8601, of which rfc3339 is a subset.
    // Accepted `RUST_LOG` values are `trace`, `debug`, `info`, `warn`,
    // and `error`. Logs go to stderr so they do not interleave with prompts.
    let info_env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_env_filter());
    let subscriber = FmtSubscriber::builder()
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_env_filter(info_env_filter)
        .with_writer(std::io::stderr)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Unable to set global default subscriber: {}", e))
}

/// filter used when `RUST_LOG` is unset
fn default_env_filter() -> EnvFilter {
    EnvFilter::new("info")
}

/// local wallets of the demo session
fn demo_signers() -> Vec<PublicSigner> {
    vec![
        PublicSigner {
            name: "primary".into(),
            address: Address::new("0x70997970c51812dc3a010c7d01b50e0d17dc79c8"),
        },
        PublicSigner {
            name: "savings".into(),
            address: Address::new("0x3c44cdddb6a900fa2b585dd299e03d12fa4293bc"),
        },
    ]
}

async fn run(args: cli_args::Args) -> Result<()> {
    let chain_config = args.chain_config()?;
    let config = args.workflow_config();

    let chain = Arc::new(SimulatedChain::demo(chain_config.clone()));
    let status = StatusQueue::default();
    let watchers = WatcherRegistry::default();
    let session = Arc::new(Session::login(
        chain_config.clone(),
        config,
        demo_signers(),
        status.clone(),
        watchers.clone(),
    )?);

    let prompter = Arc::new(TerminalPrompter::new(
        chain_config,
        chain.tokens(),
        status.clone(),
    ));
    println!("Simulated chain ready. The wallet password is `demo`.");

    let intent = match args.intent {
        Some(intent) => intent,
        None => match prompter.select_intent().await? {
            Some(intent) => intent,
            None => return Ok(()),
        },
    };

    let workflow = TransactionWorkflow::new(
        Services::uniform(chain),
        session.clone(),
        prompter.clone(),
    );
    let outcome = workflow.run(intent).await;
    drop(workflow);

    if let Outcome::Sent { tx_hash } = &outcome {
        println!("Waiting for {} to be mined...", tx_hash);
        if let Some(watched) = watchers.take(tx_hash) {
            let result = watched.handle.await?;
            tracing::debug!("watcher finished: {:?}", result);
        }
        prompter.flush_status();
    }

    let pending = watchers.active();
    if pending > 0 {
        tracing::info!("{} confirmation watcher(s) still running at exit", pending);
    }

    match Arc::try_unwrap(session) {
        Ok(session) => {
            session.lock();
        }
        Err(_) => tracing::warn!("session still shared at exit"),
    }
    println!("Workflow {}.", outcome);
    Ok(())
}
