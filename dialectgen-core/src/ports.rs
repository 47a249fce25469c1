//! Port traits abstracting artifact I/O away from the pipeline.
//!
//! The code generator itself is the [`Generator`] port from `dialectgen-exec`.

use camino::Utf8Path;

pub use dialectgen_exec::Generator;

/// File-system write operations.
pub trait WritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()>;
    fn create_dir_all(&self, path: &Utf8Path) -> anyhow::Result<()>;
}
