use std::{
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use crate::foundation::error::{ReelError, ReelResult};

/// The opaque encoding engine: a name-keyed staging area plus a single-shot
/// command interface.
///
/// The engine is injected into the pipeline as a dependency rather than
/// accessed as a global, so tests can substitute a fake implementation.
pub trait EncodeEngine {
    /// Instantiate engine resources. Idempotent: a no-op once loaded. On
    /// failure the engine must remain uninitialized (no partial state).
    fn load(&mut self) -> ReelResult<()>;

    fn is_loaded(&self) -> bool;

    /// Register `bytes` in the staging area under `name`.
    fn write_file(&mut self, name: &str, bytes: &[u8]) -> ReelResult<()>;

    /// Invoke the engine once with an explicit, order-sensitive argument
    /// list. Diagnostic lines are streamed to `log`; failures are reported
    /// verbatim, including engine diagnostic text.
    fn exec(&mut self, args: &[String], log: &mut dyn FnMut(&str)) -> ReelResult<()>;

    fn read_file(&mut self, name: &str) -> ReelResult<Vec<u8>>;

    fn delete_file(&mut self, name: &str) -> ReelResult<()>;
}

pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// [`EncodeEngine`] backed by the system `ffmpeg` binary, using a scratch
/// directory as the staging area.
///
/// We intentionally shell out to `ffmpeg` rather than link FFmpeg libraries
/// to avoid native dev header/lib requirements.
pub struct FfmpegEngine {
    scratch_root: PathBuf,
    workdir: Option<PathBuf>,
}

impl FfmpegEngine {
    pub fn new() -> Self {
        Self {
            scratch_root: std::env::temp_dir(),
            workdir: None,
        }
    }

    pub fn with_scratch_root(root: impl Into<PathBuf>) -> Self {
        Self {
            scratch_root: root.into(),
            workdir: None,
        }
    }

    /// Staging directory, present only while loaded.
    pub fn workdir(&self) -> Option<&Path> {
        self.workdir.as_deref()
    }

    fn staged_path(&self, name: &str) -> ReelResult<PathBuf> {
        let dir = self
            .workdir
            .as_ref()
            .ok_or_else(|| ReelError::staging("engine is not loaded"))?;
        if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
            return Err(ReelError::staging(format!(
                "staged name '{name}' must be a bare file name"
            )));
        }
        Ok(dir.join(name))
    }
}

impl Default for FfmpegEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl EncodeEngine for FfmpegEngine {
    fn load(&mut self) -> ReelResult<()> {
        if self.workdir.is_some() {
            return Ok(());
        }
        if !is_ffmpeg_on_path() {
            return Err(ReelError::engine_load(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let dir = self.scratch_root.join(format!(
            "reelgen_stage_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or(0)
        ));
        std::fs::create_dir_all(&dir).map_err(|e| {
            ReelError::engine_load(format!(
                "failed to create staging directory '{}': {e}",
                dir.display()
            ))
        })?;
        tracing::debug!(dir = %dir.display(), "engine staging directory created");
        self.workdir = Some(dir);
        Ok(())
    }

    fn is_loaded(&self) -> bool {
        self.workdir.is_some()
    }

    fn write_file(&mut self, name: &str, bytes: &[u8]) -> ReelResult<()> {
        let path = self.staged_path(name)?;
        std::fs::write(&path, bytes)
            .map_err(|e| ReelError::staging(format!("failed to write '{name}': {e}")))
    }

    fn exec(&mut self, args: &[String], log: &mut dyn FnMut(&str)) -> ReelResult<()> {
        let dir = self
            .workdir
            .as_ref()
            .ok_or_else(|| ReelError::encode("engine is not loaded"))?;

        // `-y` and `-hide_banner` are engine-level invariants: single output
        // per run, non-interactive stdin.
        let output = Command::new("ffmpeg")
            .current_dir(dir)
            .args(["-hide_banner", "-y"])
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                ReelError::encode(format!(
                    "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
                ))
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stderr.lines() {
            log(line);
        }

        if !output.status.success() {
            return Err(ReelError::encode(format!(
                "ffmpeg exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }

    fn read_file(&mut self, name: &str) -> ReelResult<Vec<u8>> {
        let dir = self
            .workdir
            .as_ref()
            .ok_or_else(|| ReelError::read("engine is not loaded"))?;
        let path = dir.join(name);
        std::fs::read(&path)
            .map_err(|e| ReelError::read(format!("failed to read '{name}': {e}")))
    }

    fn delete_file(&mut self, name: &str) -> ReelResult<()> {
        let path = self.staged_path(name)?;
        std::fs::remove_file(&path)
            .map_err(|e| ReelError::staging(format!("failed to delete '{name}': {e}")))
    }
}

impl Drop for FfmpegEngine {
    fn drop(&mut self) {
        if let Some(dir) = self.workdir.take() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/engine.rs"]
mod tests;
