//! Dialect discovery.
//!
//! Enumerates the message-definition files of a single directory, drops the reserved
//! test/demo dialects, and hands back a name-sorted list so graph construction is
//! deterministic. Choosing which dialects build for which protocol version is a
//! separate step ([`select_for_version`]).

mod discover;
mod selection;

pub use discover::{
    DEFAULT_EXCLUDES, DEFAULT_EXTENSION, DiscoveryError, discover_dialects,
    discover_dialects_with_extension,
};
pub use selection::{VersionSelection, select_for_version};
