//! Media type sniffing for digital publications.
//!
//! Resolves the media type of an asset from cheap hints first (declared
//! media types, file extensions) and from its content when the hints are
//! not conclusive.
//!
//! # Overview
//!
//! - [`MediaType`]: a parsed, normalized media type with the classifications
//!   used across the publication formats
//! - [`Hints`]: what is known about an asset before reading it
//! - [`Sniffer`]: recognizes one family of formats, from hints, from a
//!   [`Resource`] or from an archive [`Container`]
//! - [`MediaTypeRetriever`]: chains the sniffers, the archive opener and the
//!   system MIME table into a single cascade
//! - [`FormatRegistry`]: display names and file extensions of the known
//!   formats
//!
//! # Examples
//!
//! ```no_run
//! # use publication_sniffer::{Hints, MediaType, MediaTypeRetriever};
//! # async fn example() -> publication_sniffer::error::Result<()> {
//! let retriever = MediaTypeRetriever::new();
//! let media_type = retriever.retrieve_path("books/moby-dick.epub").await?;
//! assert_eq!(media_type, MediaType::EPUB);
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod config;
pub mod content;
pub mod content_disposition;
pub mod error;
pub mod format;
pub mod hints;
pub mod media_type;
pub mod resource;
pub mod retriever;
pub mod rwpm;
pub mod sniffer;
pub mod sniffers;
pub mod system;
pub mod xml;

// Re-export primary types at the crate root for convenience.
pub use crate::config::SniffingLimits;
pub use crate::content::{Container, Resource, SnifferContent};
pub use crate::error::{ContentError, SnifferError};
pub use crate::format::{Format, FormatRegistry};
pub use crate::hints::Hints;
pub use crate::media_type::MediaType;
pub use crate::retriever::MediaTypeRetriever;
pub use crate::sniffer::{CompositeSniffer, Sniffer};

/// The crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
