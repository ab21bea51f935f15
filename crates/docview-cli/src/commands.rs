//! Command handlers for the Docview CLI

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use docview_ble::{BleTransport, SimulatedRadio};
use docview_core::{
    ChannelReporter, FsFileStore, TransferController, TransferSnapshot, TransferStatus,
};
use tracing::{info, warn};

use crate::cli::{Cli, Commands};
use crate::config::AppConfig;
use crate::error::{CliError, Result};
use crate::peer::{prepare_output, run_peer};

/// Options of the `send` command
#[derive(Debug, Clone)]
pub struct SendOptions {
    pub file: PathBuf,
    pub out: PathBuf,
    pub connect_delay: Duration,
}

/// Command dispatcher for handling CLI commands
pub struct CommandDispatcher;

impl CommandDispatcher {
    /// Execute a CLI command
    pub async fn execute(cli: Cli, mut config: AppConfig) -> Result<()> {
        match cli.command {
            Commands::Send {
                file,
                out,
                mtu,
                fail_every,
                connect_delay_ms,
                disconnect_after,
                timeout_ms,
            } => {
                if let Some(mtu) = mtu {
                    config.radio.max_packet_size = mtu;
                }
                if fail_every.is_some() {
                    config.radio.fail_every = fail_every;
                }
                if disconnect_after.is_some() {
                    config.radio.disconnect_after = disconnect_after;
                }
                if let Some(timeout_ms) = timeout_ms {
                    config.transfer.transfer_timeout_ms = timeout_ms;
                }
                config.validate()?;

                let options = SendOptions {
                    file,
                    out,
                    connect_delay: Duration::from_millis(connect_delay_ms),
                };
                let snapshot = Self::handle_send_command(config, options).await?;
                if snapshot.status != TransferStatus::Complete {
                    let reason = snapshot
                        .failure
                        .clone()
                        .unwrap_or_else(|| snapshot.status_line());
                    return Err(CliError::TransferFailed(reason));
                }
                Ok(())
            }
        }
    }

    /// Send one file through the simulated radio to the in-process peer
    pub async fn handle_send_command(
        config: AppConfig,
        options: SendOptions,
    ) -> Result<TransferSnapshot> {
        let path = options
            .file
            .to_str()
            .ok_or_else(|| CliError::Config(format!("Path is not UTF-8: {:?}", options.file)))?
            .to_string();
        prepare_output(&options.out).await?;

        let (radio, peer_rx) = SimulatedRadio::new(config.radio.clone())?;
        let transport = BleTransport::new(radio.clone());
        if let Err(e) = transport.init() {
            warn!("Radio not ready: {}", e);
        }

        let (reporter, mut status_rx) = ChannelReporter::channel();
        let controller = TransferController::new(
            Arc::new(transport),
            radio.service(),
            Arc::new(FsFileStore::new()),
            Arc::new(reporter),
            config.transfer.clone(),
        )?;

        let peer = tokio::spawn(run_peer(peer_rx, options.out.clone()));

        info!("Sending {} to simulated peer", path);
        let started = controller.start(&path);

        if started.is_ok() {
            let radio = radio.clone();
            let delay = options.connect_delay;
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                // The status callback blocks on the session lock
                if let Err(e) = tokio::task::spawn_blocking(move || radio.connect_peer()).await {
                    warn!("Peer connect task failed: {}", e);
                }
            });

            while let Some(snapshot) = status_rx.recv().await {
                print_snapshot(&snapshot);
                if snapshot.status.is_terminal() {
                    break;
                }
            }
        }

        // Waits out teardown and joins the worker
        let snapshot = tokio::task::spawn_blocking(move || {
            let snapshot = controller.wait_for_terminal(Duration::from_secs(5));
            let snapshot = snapshot.unwrap_or_else(|| controller.snapshot());
            drop(controller);
            snapshot
        })
        .await
        .map_err(|e| CliError::Peer(format!("Controller shutdown failed: {}", e)))?;

        // Last sender of the peer channel goes with the radio
        drop(radio);
        let report = peer
            .await
            .map_err(|e| CliError::Peer(format!("Peer task failed: {}", e)))??;
        for file in &report.files {
            println!("Peer saved {}", file.display());
        }
        if report.aborted > 0 {
            println!("Peer discarded {} partial transfer(s)", report.aborted);
        }

        started?;
        print_snapshot(&snapshot);
        Ok(snapshot)
    }
}

fn print_snapshot(snapshot: &TransferSnapshot) {
    println!(
        "[{}] {}",
        snapshot.status_header(),
        snapshot.status_line().replace('\n', " | ")
    );
}
