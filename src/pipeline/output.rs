use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};

use crate::foundation::error::{StackError, StackResult};

/// Permission bits given to written outputs on unix.
pub const OUTPUT_MODE: u32 = 0o644;

static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Create the parent directory of `path` if needed.
pub fn ensure_parent_dir(path: &Path) -> StackResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| StackError::io(parent, e))?;
    }
    Ok(())
}

/// Fail if `path` exists and overwriting is not allowed.
pub fn check_overwrite(path: &Path, overwrite: bool) -> StackResult<()> {
    if !overwrite && path.exists() {
        return Err(StackError::invalid_input(format!(
            "output file '{}' already exists",
            path.display()
        )));
    }
    Ok(())
}

/// Write `bytes` to `path` in one step.
///
/// The bytes go to a hidden sibling file that is renamed over `path` once complete, so the
/// target either keeps its old content or receives the full new content.
pub fn write_output(path: &Path, bytes: &[u8], overwrite: bool) -> StackResult<()> {
    check_overwrite(path, overwrite)?;
    ensure_parent_dir(path)?;

    let tmp_path = temp_sibling(path)?;
    let guard = TempFileGuard(Some(tmp_path.clone()));
    std::fs::write(&tmp_path, bytes).map_err(|e| StackError::io(&tmp_path, e))?;
    set_output_permissions(&tmp_path)?;
    std::fs::rename(&tmp_path, path).map_err(|e| StackError::io(path, e))?;
    guard.disarm();
    Ok(())
}

fn temp_sibling(path: &Path) -> StackResult<PathBuf> {
    let Some(name) = path.file_name() else {
        return Err(StackError::invalid_input(format!(
            "output path '{}' has no file name",
            path.display()
        )));
    };
    // Distinct for every call, including concurrent writers of one target.
    let tmp_name = format!(
        ".{}.{}_{}_{}.partial",
        name.to_string_lossy(),
        std::process::id(),
        TEMP_SEQ.fetch_add(1, Ordering::Relaxed),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0)
    );
    Ok(path.with_file_name(tmp_name))
}

#[cfg(unix)]
fn set_output_permissions(path: &Path) -> StackResult<()> {
    use std::os::unix::fs::PermissionsExt as _;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(OUTPUT_MODE))
        .map_err(|e| StackError::io(path, e))
}

#[cfg(not(unix))]
fn set_output_permissions(_path: &Path) -> StackResult<()> {
    Ok(())
}

struct TempFileGuard(Option<PathBuf>);

impl TempFileGuard {
    fn disarm(mut self) {
        self.0 = None;
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/output.rs"]
mod tests;
