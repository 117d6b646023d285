//! Output rendering for command results

use serde::Serialize;
use std::path::PathBuf;

/// What a finished command reports
#[derive(Debug, Serialize)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum CommandReport {
    Keygen {
        public_key: PathBuf,
        keyset: PathBuf,
        key_hash: String,
    },
    Download {
        client_id: String,
        status: pd_types::DownloadStatus,
        blob_bytes: usize,
        protection_components: usize,
        page_token_bytes: usize,
        out: PathBuf,
    },
    Manifest {
        client_id: String,
        manifest_bytes: usize,
        out: PathBuf,
    },
    ProvisionVm {
        key_hash: String,
    },
    Decrypt {
        plaintext_bytes: usize,
        out: PathBuf,
    },
}

/// Prints reports for humans or as a single JSON document
pub struct OutputRenderer {
    json: bool,
}

impl OutputRenderer {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn render(&self, report: &CommandReport) -> Result<(), serde_json::Error> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(report)?);
            return Ok(());
        }
        match report {
            CommandReport::Keygen {
                public_key,
                keyset,
                key_hash,
            } => {
                println!("Generated keypair {key_hash}");
                println!("  public key: {}", public_key.display());
                println!("  keyset:     {}", keyset.display());
            }
            CommandReport::Download {
                client_id,
                status,
                blob_bytes,
                protection_components,
                page_token_bytes,
                out,
            } => {
                println!("Downloaded {blob_bytes} bytes for {client_id} ({status:?})");
                println!("  protection components: {protection_components}");
                println!("  next page token:       {page_token_bytes} bytes");
                println!("  written to:            {}", out.display());
            }
            CommandReport::Manifest {
                client_id,
                manifest_bytes,
                out,
            } => {
                println!("Fetched {manifest_bytes} byte manifest for {client_id}");
                println!("  written to: {}", out.display());
            }
            CommandReport::ProvisionVm { key_hash } => {
                println!("Provisioned attested environment key {key_hash}");
            }
            CommandReport::Decrypt {
                plaintext_bytes,
                out,
            } => {
                println!("Decrypted {plaintext_bytes} bytes to {}", out.display());
            }
        }
        Ok(())
    }
}
