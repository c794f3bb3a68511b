//! Output file writing

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::info;

use crate::error::{TrimFitError, TrimFitResult};

/// Suffix added to the input stem when no output path is given
pub const DEFAULT_OUTPUT_SUFFIX: &str = "_trimfit";

/// Overwrite policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwritePolicy {
    /// Replace an existing file
    Always,
    /// Refuse when the destination exists
    #[default]
    Never,
}

/// `<dir>/<stem>_trimfit.mp4` next to the input
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{}{}.mp4", stem, DEFAULT_OUTPUT_SUFFIX))
}

/// Write `bytes` to `path` through a temp file in the same directory
///
/// The destination either keeps its old content or holds the complete new
/// artifact.
pub fn write_artifact(path: &Path, bytes: &[u8], policy: OverwritePolicy) -> TrimFitResult<()> {
    let output_error = |message: String| TrimFitError::Output {
        path: path.to_path_buf(),
        message,
    };

    if policy == OverwritePolicy::Never && path.exists() {
        return Err(output_error(
            "file already exists (pass --force to replace it)".to_string(),
        ));
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;

    let mut temp = NamedTempFile::new_in(&dir)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(path)
        .map_err(|e| output_error(format!("Failed to move temporary file into place: {}", e)))?;

    info!(path = %path.display(), size_bytes = bytes.len(), "Output file written");
    Ok(())
}
