//! Command line interface definition

use clap::{Parser, Subcommand};
use pd_types::{Client, ClientGroup, DeviceTier, DownloadMode, Variant};
use std::path::PathBuf;

/// pdctl - protected blob and manifest downloads
#[derive(Parser)]
#[command(name = "pdctl")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Download protected blobs and manifests on behalf of registered clients")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Arguments shared by download and manifest requests
#[derive(clap::Args)]
pub struct RequestArgs {
    /// Logical client to act for
    #[arg(long, value_enum)]
    pub client: Client,

    /// Distribution service API key
    #[arg(long, env = "PD_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// File holding the caller's raw public key
    #[arg(long, value_name = "FILE")]
    pub public_key: PathBuf,

    /// Device tier label
    #[arg(long, value_enum, default_value = "unknown")]
    pub tier: DeviceTier,

    /// Client group label
    #[arg(long, value_enum, default_value = "all")]
    pub group: ClientGroup,

    /// Variant label
    #[arg(long, value_enum, default_value = "unspecified")]
    pub variant: Variant,

    /// Act as an attested environment client of this version
    #[arg(long, value_name = "VERSION")]
    pub pkvm_version: Option<i64>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Generate a caller keypair for receiving re-encrypted payloads
    Keygen {
        /// Directory for public.key and keyset.bin
        #[arg(long, value_name = "DIR")]
        out: PathBuf,
    },

    /// Download the next blob for a client
    #[command(alias = "dl")]
    Download {
        #[command(flatten)]
        request: RequestArgs,

        /// Download mode reported to the service
        #[arg(long, value_enum, default_value = "background")]
        mode: DownloadMode,

        /// Where to write the blob
        #[arg(long, value_name = "FILE")]
        out: PathBuf,
    },

    /// Fetch the manifest of blobs available to a client
    Manifest {
        #[command(flatten)]
        request: RequestArgs,

        /// Ask the service for a deflated manifest
        #[arg(long)]
        compress: bool,

        /// Where to write the manifest
        #[arg(long, value_name = "FILE")]
        out: PathBuf,
    },

    /// Store the attested environment's public key
    #[command(name = "provision-vm")]
    ProvisionVm {
        /// File holding the raw public key
        #[arg(long, value_name = "FILE")]
        public_key: PathBuf,
    },

    /// Open a payload that was re-encrypted to a keyset made by `keygen`
    Decrypt {
        /// Wrapped keyset written by `keygen`
        #[arg(long, value_name = "FILE")]
        keyset: PathBuf,

        /// Client the payload was downloaded for
        #[arg(long, value_enum)]
        client: Client,

        /// Encrypted payload
        #[arg(long = "in", value_name = "FILE")]
        input: PathBuf,

        /// Where to write the plaintext
        #[arg(long, value_name = "FILE")]
        out: PathBuf,
    },
}
