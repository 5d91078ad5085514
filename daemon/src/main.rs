//! EHR agreement daemon: runs a local devnet of party nodes.
//!
//! Every hosted party gets its own node, vault and HTTP server. The parties
//! share one in-process network, one notary and one attachment store.

mod devnet;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use devnet::DevnetConfig;
use ehr_crypto::keypair_from_name;
use ehr_ledger::LedgerNotary;
use ehr_node::{init_logging, AgreementNode, NodeServices, ShutdownController};
use ehr_nullables::{NullAttachments, NullDirectory, NullNetwork, NullStore};
use ehr_rpc::RpcServer;
use ehr_types::{Clock, Party, PartyName, SystemClock};

#[derive(Parser)]
#[command(name = "ehr-daemon", about = "EHR share agreement daemon")]
struct Cli {
    /// Path to a TOML devnet configuration. Without one, the default
    /// three-party devnet is used.
    #[arg(long, env = "EHR_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Overrides the key-derivation secret from the file.
    #[arg(long, env = "EHR_SECRET", global = true)]
    secret: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "EHR_LOG_LEVEL", global = true)]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "EHR_LOG_FORMAT", global = true)]
    log_format: Option<String>,

    /// Enable the Prometheus metrics endpoint on every node.
    #[arg(long, env = "EHR_ENABLE_METRICS", global = true)]
    metrics: bool,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Manage a local devnet.
    #[command(name = "devnet")]
    Devnet {
        #[command(subcommand)]
        action: DevnetAction,
    },
}

#[derive(clap::Subcommand)]
enum DevnetAction {
    /// Run every configured party until interrupted.
    Run,
    /// Print the effective configuration as TOML.
    Config,
}

fn load_config(cli: &Cli) -> anyhow::Result<DevnetConfig> {
    let mut config = match &cli.config {
        Some(path) => DevnetConfig::from_toml_file(path)?,
        None => DevnetConfig::default(),
    };
    if let Some(secret) = &cli.secret {
        config.secret = secret.clone();
    }
    if let Some(level) = &cli.log_level {
        config.node.log_level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.node.log_format = format.clone();
    }
    config.node.enable_metrics |= cli.metrics;
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Command::Devnet { action } => match action {
            DevnetAction::Config => {
                print!("{}", toml::to_string_pretty(&config)?);
                Ok(())
            }
            DevnetAction::Run => {
                init_logging(config.node.log_format()?, &config.node.log_level)?;
                run(config).await
            }
        },
    }
}

async fn run(config: DevnetConfig) -> anyhow::Result<()> {
    let network = NullNetwork::new();
    let directory = Arc::new(NullDirectory::new());
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let notary = Arc::new(LedgerNotary::with_clock(NullStore::new(), clock.clone()));
    let attachments = Arc::new(NullAttachments::new(config.attachment_limit));

    // Every party must be resolvable before any node can start a flow.
    let mut hosted = Vec::with_capacity(config.parties.len());
    for spec in &config.parties {
        let name = PartyName::parse(&spec.name)?;
        let keypair = keypair_from_name(config.secret.as_bytes(), &name);
        directory.register(Party::new(name, keypair.public));
        hosted.push((spec, keypair));
    }

    let shutdown = ShutdownController::new();
    let mut nodes = Vec::new();
    let mut servers = Vec::new();
    for (spec, keypair) in hosted {
        let node_config = config.node_config(spec);
        let me = Party::new(PartyName::parse(&spec.name)?, keypair.public);
        let services = NodeServices {
            identity: directory.clone(),
            transport: Arc::new(network.endpoint(me.clone())),
            finality: notary.clone(),
            vault: Arc::new(NullStore::new()),
            attachments: attachments.clone(),
            notifier: None,
            clock: clock.clone(),
        };
        let node = Arc::new(
            AgreementNode::new(node_config.clone(), keypair, services)
                .with_context(|| format!("starting node for {}", spec.name))?,
        );
        network.register(&me, node.responder());
        tracing::info!(party = %me, key = %me.key, "node ready");

        if node_config.enable_rpc {
            let server = RpcServer::new(node_config.rpc_port, node.clone());
            servers.push(tokio::spawn(server.serve(shutdown.subscribe())));
        }
        nodes.push(node);
    }

    tracing::info!(
        parties = nodes.len(),
        servers = servers.len(),
        "devnet running"
    );
    shutdown.wait_for_signal().await;

    for server in servers {
        match server.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "HTTP server failed"),
            Err(e) => tracing::error!(error = %e, "HTTP server task panicked"),
        }
    }
    tracing::info!("devnet exited cleanly");
    Ok(())
}
