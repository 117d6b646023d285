//! pdctl - protected download front end
//!
//! Wires the file-backed cursor store, the HTTP blob service and the
//! optional attestation helper into a download processor and runs one
//! command against it.

mod cli;
mod display;
mod error;
mod logging;
mod setup;

use crate::cli::{Cli, Commands, RequestArgs};
use crate::display::{CommandReport, OutputRenderer};
use crate::error::CliError;
use clap::Parser;
use pd_config::Config;
use pd_events::{EventReceiver, EventSender};
use pd_keys::{KeySet, MasterKeyProvider};
use pd_processor::CancellationToken;
use pd_types::{
    BlobConstraints, ClientVersion, ClientVersionType, DownloadBlobRequest,
    GetManifestConfigRequest,
};
use std::path::Path;
use std::process;
use tokio::select;
use tracing::{error, info};

const PUBLIC_KEY_FILE: &str = "public.key";
const KEYSET_FILE: &str = "keyset.bin";

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    init_tracing(json_mode, cli.global.debug);

    if let Err(e) = run(cli).await {
        error!("Application error: {}", e);
        if !json_mode {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    info!("Starting pdctl v{}", env!("CARGO_PKG_VERSION"));

    // File config (or defaults), then environment overrides
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;
    config.merge_env()?;
    config.validate()?;

    let (event_sender, event_receiver) = pd_events::channel();
    let report =
        execute_command_with_events(cli.command, &config, event_sender, event_receiver).await?;

    OutputRenderer::new(cli.global.json)
        .render(&report)
        .map_err(pd_errors::Error::from)?;

    info!("Command completed successfully");
    Ok(())
}

/// Execute a command while draining its events into the log
async fn execute_command_with_events(
    command: Commands,
    config: &Config,
    event_sender: EventSender,
    mut event_receiver: EventReceiver,
) -> Result<CommandReport, CliError> {
    let mut command_future = Box::pin(execute_command(command, config, event_sender));

    loop {
        select! {
            result = &mut command_future => {
                while let Ok(message) = event_receiver.try_recv() {
                    logging::log_event_with_tracing(&message);
                }
                return result;
            }

            message = event_receiver.recv() => {
                if let Some(message) = message {
                    logging::log_event_with_tracing(&message);
                }
            }
        }
    }
}

async fn execute_command(
    command: Commands,
    config: &Config,
    events: EventSender,
) -> Result<CommandReport, CliError> {
    match command {
        Commands::Keygen { out } => keygen(config, &out).await,

        Commands::Download { request, mode, out } => {
            let processor = setup::build_processor(config, events)?;
            let constraints = constraints(&request);
            let public_key = read_file(&request.public_key).await?;
            let download = DownloadBlobRequest::new(request.api_key, constraints, public_key)
                .with_download_mode(mode);
            let client_id = processor.translator().client_id(request.client)?.to_string();

            let response = processor
                .download_with_cancellation(download, interrupt_token())
                .await?;
            write_file(&out, &response.blob).await?;

            Ok(CommandReport::Download {
                client_id,
                status: response.download_status,
                blob_bytes: response.blob.len(),
                protection_components: response.protection_components.len(),
                page_token_bytes: response.next_page_token.len(),
                out,
            })
        }

        Commands::Manifest {
            request,
            compress,
            out,
        } => {
            let processor = setup::build_processor(config, events)?;
            let constraints = constraints(&request);
            let public_key = read_file(&request.public_key).await?;
            let manifest = GetManifestConfigRequest::new(request.api_key, constraints, public_key)
                .with_compression(compress);
            let client_id = processor.translator().client_id(request.client)?.to_string();

            let response = processor
                .get_manifest_config_with_cancellation(manifest, interrupt_token())
                .await?;
            write_file(&out, &response.manifest_config).await?;

            Ok(CommandReport::Manifest {
                client_id,
                manifest_bytes: response.manifest_config.len(),
                out,
            })
        }

        Commands::ProvisionVm { public_key } => {
            let processor = setup::build_processor(config, events)?;
            let public_key = read_file(&public_key).await?;
            let key_hash = KeySet::from_public_key(&public_key)?.public_key_hash_for_logging();
            processor.provision_attested_environment(&public_key).await?;
            Ok(CommandReport::ProvisionVm { key_hash })
        }

        Commands::Decrypt {
            keyset,
            client,
            input,
            out,
        } => {
            let registry = config.client_registry()?;
            let client_id = registry.client_id(client).ok_or_else(|| {
                CliError::InvalidArguments(format!("client {} is not registered", client.name()))
            })?;
            let wrapped = read_file(&keyset).await?;
            let master = setup::master_keys(config).read_or_generate().await?;
            let key_set = KeySet::from_encrypted_key_set(&wrapped, &master)?;
            let ciphertext = read_file(&input).await?;
            let plaintext = key_set.decrypt(&ciphertext, client_id.as_bytes())?;
            write_file(&out, &plaintext).await?;
            Ok(CommandReport::Decrypt {
                plaintext_bytes: plaintext.len(),
                out,
            })
        }
    }
}

async fn keygen(config: &Config, out: &Path) -> Result<CommandReport, CliError> {
    tokio::fs::create_dir_all(out)
        .await
        .map_err(CliError::file(out))?;

    let key_set = KeySet::generate();
    let master = setup::master_keys(config).read_or_generate().await?;
    let wrapped = key_set.to_encrypted_key_set(&master)?;

    let public_key = out.join(PUBLIC_KEY_FILE);
    let keyset = out.join(KEYSET_FILE);
    write_file(&public_key, key_set.public_key()).await?;
    write_file(&keyset, &wrapped).await?;

    Ok(CommandReport::Keygen {
        public_key,
        keyset,
        key_hash: key_set.public_key_hash_for_logging(),
    })
}

fn constraints(request: &RequestArgs) -> BlobConstraints {
    let constraints = BlobConstraints::new(request.client)
        .with_device_tier(request.tier)
        .with_client_group(request.group)
        .with_variant(request.variant);
    match request.pkvm_version {
        Some(version) => constraints.with_client_version(ClientVersion {
            kind: ClientVersionType::AttestedPkvm,
            version,
        }),
        None => constraints,
    }
}

/// Token cancelled on Ctrl-C so an interrupted run never moves the cursor
fn interrupt_token() -> CancellationToken {
    let token = CancellationToken::new();
    let on_interrupt = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, cancelling");
            on_interrupt.cancel();
        }
    });
    token
}

async fn read_file(path: &Path) -> Result<Vec<u8>, CliError> {
    tokio::fs::read(path).await.map_err(CliError::file(path))
}

async fn write_file(path: &Path, contents: &[u8]) -> Result<(), CliError> {
    tokio::fs::write(path, contents)
        .await
        .map_err(CliError::file(path))
}

/// Initialize tracing on stderr so stdout stays free for results
fn init_tracing(json_mode: bool, debug_enabled: bool) {
    let default_filter = if debug_enabled {
        "info,pdctl=debug,pd=debug,pd_processor=debug,pd_keys=debug"
    } else {
        "warn,pdctl=info,pd::events=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json_mode {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
