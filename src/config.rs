//! Sniffing limits.

use serde::{Deserialize, Serialize};

/// Bounds on how much content the heavy sniffing stage may load.
///
/// All fields have defaults, so partial configurations deserialize:
///
/// ```
/// # use publication_sniffer::config::SniffingLimits;
/// let limits: SniffingLimits = serde_json::from_str(r#"{"max_whole_read": 1024}"#).unwrap();
/// assert_eq!(limits.max_whole_read, 1024);
/// assert_eq!(limits.signature_length, SniffingLimits::default().signature_length);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SniffingLimits {
    /// Resources larger than this are not decoded as text, XML or JSON.
    pub max_whole_read: u64,

    /// Largest archive the retriever loads in memory to open it as a container.
    pub max_archive_size: u64,

    /// Number of leading bytes read to guess a type from its signature.
    pub signature_length: u64,
}

impl Default for SniffingLimits {
    fn default() -> Self {
        Self {
            max_whole_read: 5 * 1000 * 1000,
            max_archive_size: 512 * 1024 * 1024,
            signature_length: 8 * 1024,
        }
    }
}
