//! Shared types: bounded file names and status snapshots

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::protocol::TransferStatus;

// ----------------------------------------------------------------------------
// File Name
// ----------------------------------------------------------------------------

/// Longest display name kept in a session, in bytes
pub const MAX_FILE_NAME_LEN: usize = 63;

/// Cut `s` to at most `max_len` bytes without splitting a character
pub fn truncate_utf8(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Display name of the file being sent, at most 63 bytes
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileName(String);

impl FileName {
    /// Create a name, truncating to the bounded length
    pub fn new(name: &str) -> Self {
        Self(truncate_utf8(name, MAX_FILE_NAME_LEN).to_string())
    }

    /// Take the last component of a `/`-separated path
    pub fn from_path(path: &str) -> Self {
        let name = path.rsplit('/').next().unwrap_or(path);
        Self::new(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ----------------------------------------------------------------------------
// Status Snapshot
// ----------------------------------------------------------------------------

/// Point-in-time view of a session pushed to status reporters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferSnapshot {
    /// Session number, increases with every start
    pub generation: u64,
    pub status: TransferStatus,
    pub file_name: FileName,
    pub bytes_sent: u64,
    pub file_size: u64,
    pub chunks_sent: u32,
    pub total_chunks: u32,
    /// Error that ended a failed session
    pub failure: Option<String>,
}

impl TransferSnapshot {
    /// Percentage of the file sent, 0.0 for empty files
    pub fn progress_percent(&self) -> f32 {
        if self.file_size == 0 {
            return 0.0;
        }
        self.bytes_sent as f32 / self.file_size as f32 * 100.0
    }

    /// Short header for a status popup
    pub fn status_header(&self) -> &'static str {
        match self.status {
            TransferStatus::Transferring => "Sending File...",
            TransferStatus::Complete => "Transfer Complete",
            TransferStatus::Failed => "Transfer Failed",
            _ => "BLE File Transfer",
        }
    }

    /// Body text for a status popup
    pub fn status_line(&self) -> String {
        match self.status {
            TransferStatus::Idle => "Ready".to_string(),
            TransferStatus::Advertising => "Waiting for connection...".to_string(),
            TransferStatus::Connected => "Connected\nPreparing transfer...".to_string(),
            TransferStatus::Transferring => {
                let progress = if self.file_size >= 1024 {
                    format!(
                        "{:.1}% ({}/{} KB)",
                        self.progress_percent(),
                        self.bytes_sent / 1024,
                        self.file_size.div_ceil(1024)
                    )
                } else {
                    format!(
                        "{:.1}% ({}/{} B)",
                        self.progress_percent(),
                        self.bytes_sent,
                        self.file_size
                    )
                };
                format!("{}\nFile: {}", progress, self.file_name)
            }
            TransferStatus::Complete => "File sent successfully".to_string(),
            TransferStatus::Failed => match &self.failure {
                Some(reason) => format!("Error sending file\n{}", reason),
                None => "Error sending file".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_from_path() {
        assert_eq!(FileName::from_path("/ext/documents/readme.txt").as_str(), "readme.txt");
        assert_eq!(FileName::from_path("plain.txt").as_str(), "plain.txt");
        assert!(FileName::from_path("/ext/documents/").is_empty());
    }

    #[test]
    fn test_file_name_is_bounded() {
        let long = "x".repeat(100);
        assert_eq!(FileName::new(&long).as_str().len(), MAX_FILE_NAME_LEN);

        let multibyte = "\u{00e9}".repeat(40); // 80 bytes
        let name = FileName::new(&multibyte);
        assert_eq!(name.as_str().len(), 62);
    }

    #[test]
    fn test_progress_rendering() {
        let snapshot = TransferSnapshot {
            status: TransferStatus::Transferring,
            file_name: FileName::new("a.txt"),
            bytes_sent: 20,
            file_size: 40,
            ..Default::default()
        };
        assert_eq!(snapshot.progress_percent(), 50.0);
        assert_eq!(snapshot.status_line(), "50.0% (20/40 B)\nFile: a.txt");

        let large = TransferSnapshot {
            bytes_sent: 2048,
            file_size: 4097,
            ..snapshot
        };
        assert!(large.status_line().starts_with("50.0% (2/5 KB)"));
    }

    #[test]
    fn test_terminal_rendering() {
        let mut snapshot = TransferSnapshot {
            status: TransferStatus::Failed,
            ..Default::default()
        };
        assert_eq!(snapshot.status_header(), "Transfer Failed");
        assert_eq!(snapshot.status_line(), "Error sending file");

        snapshot.failure = Some("Transfer timed out after 500ms".to_string());
        assert_eq!(
            snapshot.status_line(),
            "Error sending file\nTransfer timed out after 500ms"
        );

        snapshot.status = TransferStatus::Complete;
        assert_eq!(snapshot.status_line(), "File sent successfully");
        assert_eq!(snapshot.progress_percent(), 0.0);
    }
}
