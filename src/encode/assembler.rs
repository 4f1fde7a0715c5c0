use std::{collections::BTreeSet, io::Cursor};

use crate::{
    encode::engine::EncodeEngine,
    foundation::core::{ClipParams, FrameIndex},
    foundation::error::{ReelError, ReelResult},
};

/// Name of the single output artifact inside the engine staging area.
pub const OUTPUT_NAME: &str = "output.mp4";

/// Staged frame name: fixed-width zero-padded, 1-based, so the names sort
/// lexicographically in playback order.
pub fn frame_file_name(frame: FrameIndex) -> String {
    format!("frame{:04}.png", frame.0 + 1)
}

/// The exact engine argument list for one encode invocation: sequential image
/// input at the clip rate, H.264 with 4:2:0 chroma subsampling for broad
/// playback compatibility, a speed-favoring preset, and front-loaded
/// container metadata for progressive playback.
pub fn encode_args(params: &ClipParams) -> Vec<String> {
    [
        "-r",
        &params.fps.to_string(),
        "-f",
        "image2",
        "-i",
        "frame%04d.png",
        "-vcodec",
        "libx264",
        "-pix_fmt",
        "yuv420p",
        "-preset",
        "veryfast",
        "-crf",
        "23",
        "-movflags",
        "+faststart",
        OUTPUT_NAME,
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Turns an ordered set of staged still images into one MP4 byte stream.
///
/// Owns the staged-image set for the duration of one generation run; the set
/// is created at run start and fully consumed by [`VideoAssembler::cleanup`]
/// at run end, success or failure.
pub struct VideoAssembler<'e> {
    engine: &'e mut dyn EncodeEngine,
    params: ClipParams,
    staged: BTreeSet<String>,
    output_ready: bool,
}

impl<'e> VideoAssembler<'e> {
    pub fn new(engine: &'e mut dyn EncodeEngine, params: ClipParams) -> ReelResult<Self> {
        params.validate()?;
        Ok(Self {
            engine,
            params,
            staged: BTreeSet::new(),
            output_ready: false,
        })
    }

    pub fn staged_count(&self) -> usize {
        self.staged.len()
    }

    /// Register one frame image. May be called in any order, once per index
    /// in `[0, frame_count)`, before [`VideoAssembler::encode`].
    pub fn stage_image(&mut self, frame: FrameIndex, png_bytes: &[u8]) -> ReelResult<()> {
        if !self.engine.is_loaded() {
            return Err(ReelError::staging("engine is not loaded"));
        }
        if !self.params.contains(frame) {
            return Err(ReelError::staging(format!(
                "frame index {} out of range (clip has {} frames)",
                frame.0,
                self.params.frame_count()
            )));
        }

        let (w, h) = image::ImageReader::new(Cursor::new(png_bytes))
            .with_guessed_format()
            .map_err(|e| ReelError::staging(format!("malformed frame image: {e}")))?
            .into_dimensions()
            .map_err(|e| ReelError::staging(format!("malformed frame image: {e}")))?;
        if w != self.params.canvas.width || h != self.params.canvas.height {
            return Err(ReelError::staging(format!(
                "frame size mismatch: got {w}x{h}, expected {}x{}",
                self.params.canvas.width, self.params.canvas.height
            )));
        }

        let name = frame_file_name(frame);
        self.engine.write_file(&name, png_bytes)?;
        self.staged.insert(name);
        Ok(())
    }

    /// Invoke the engine exactly once over the full staged sequence.
    pub fn encode(&mut self, log: &mut dyn FnMut(&str)) -> ReelResult<()> {
        if self.staged.is_empty() {
            return Err(ReelError::encode(
                "cannot encode an empty sequence: no frames staged",
            ));
        }
        let expected = self.params.frame_count() as usize;
        if self.staged.len() != expected {
            return Err(ReelError::encode(format!(
                "staged {} of {expected} frames; the input pattern requires a complete sequence",
                self.staged.len()
            )));
        }

        let args = encode_args(&self.params);
        tracing::debug!(args = ?args, "invoking encoding engine");
        self.engine.exec(&args, log)?;
        self.output_ready = true;
        Ok(())
    }

    /// The encoded byte stream. Only valid after a successful
    /// [`VideoAssembler::encode`].
    pub fn read_result(&mut self) -> ReelResult<Vec<u8>> {
        if !self.output_ready {
            return Err(ReelError::read("no encoded output: encode has not succeeded"));
        }
        self.engine.read_file(OUTPUT_NAME)
    }

    /// Delete all staged images and the output artifact from the engine's
    /// storage. Best-effort: per-file failures are returned as warnings, not
    /// errors, since they do not affect the produced artifact. Idempotent.
    pub fn cleanup(&mut self) -> Vec<String> {
        let mut warnings = Vec::new();
        for name in std::mem::take(&mut self.staged) {
            if let Err(e) = self.engine.delete_file(&name) {
                warnings.push(format!("cleanup: {e}"));
            }
        }
        // A failed encode may still leave a partial artifact behind, so the
        // output name is always attempted; a missing file is not a warning.
        match self.engine.delete_file(OUTPUT_NAME) {
            Err(e) if self.output_ready => warnings.push(format!("cleanup: {e}")),
            _ => {}
        }
        self.output_ready = false;
        warnings
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/assembler.rs"]
mod tests;
