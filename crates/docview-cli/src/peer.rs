//! Simulated receiving peer
//!
//! Consumes the packets the simulated radio delivers, rebuilds files with
//! a `FileAssembler` and writes each completed file into an output
//! directory.

use std::path::{Path, PathBuf};

use docview_core::{AssemblyEvent, FileAssembler};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::{CliError, Result};

/// Name used when the announced name cannot be a file name
const FALLBACK_NAME: &str = "received.bin";

/// What the peer saw before its channel closed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerReport {
    /// Files written to the output directory
    pub files: Vec<PathBuf>,
    /// Transfers the sender abandoned
    pub aborted: usize,
    /// Packets that broke the framing
    pub framing_errors: usize,
}

/// Receive until the radio's channel closes
pub async fn run_peer(
    mut packets: mpsc::UnboundedReceiver<Vec<u8>>,
    out_dir: PathBuf,
) -> Result<PeerReport> {
    let mut assembler = FileAssembler::new();
    let mut report = PeerReport::default();

    while let Some(packet) = packets.recv().await {
        match assembler.push(&packet) {
            Ok(AssemblyEvent::Started { name, size }) => {
                info!("Peer receiving {} ({} bytes)", name, size);
            }
            Ok(AssemblyEvent::Progress { received, size }) => {
                debug!("Peer received {}/{} bytes", received, size);
            }
            Ok(AssemblyEvent::Completed(file)) => {
                let path = out_dir.join(output_name(&file.name));
                tokio::fs::write(&path, &file.data).await.map_err(|e| {
                    CliError::Peer(format!("Failed to write {}: {}", path.display(), e))
                })?;
                info!("Peer saved {} bytes to {}", file.data.len(), path.display());
                report.files.push(path);
            }
            Ok(AssemblyEvent::Aborted(reason)) => {
                warn!("Peer discarded transfer: {}", reason);
                report.aborted += 1;
            }
            Err(e) => {
                warn!("Peer framing error: {}", e);
                report.framing_errors += 1;
            }
        }
    }

    Ok(report)
}

/// Reduce an announced name to a plain file name
fn output_name(announced: &str) -> &str {
    let name = announced
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    match name {
        "" | "." | ".." => FALLBACK_NAME,
        name => name,
    }
}

/// Create the output directory if needed
pub async fn prepare_output(out_dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(out_dir).await?;
    Ok(())
}
