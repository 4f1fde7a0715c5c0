use crate::foundation::error::{ReelError, ReelResult};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

/// Immutable timing and size constants for one clip.
///
/// The frame count is derived, never stored: `fps * duration_secs`, fixed for
/// the lifetime of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ClipParams {
    pub canvas: Canvas,
    pub fps: u32,
    pub duration_secs: u32,
}

impl ClipParams {
    /// The clip this crate was built to produce: a 5-second portrait reel.
    pub fn portrait_reel() -> Self {
        Self {
            canvas: Canvas {
                width: 720,
                height: 1280,
            },
            fps: 24,
            duration_secs: 5,
        }
    }

    pub fn validate(&self) -> ReelResult<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(ReelError::validation("canvas width/height must be non-zero"));
        }
        if !self.canvas.width.is_multiple_of(2) || !self.canvas.height.is_multiple_of(2) {
            // The encode step targets yuv420p output for broad playback
            // compatibility, which requires even dimensions.
            return Err(ReelError::validation(
                "canvas width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        if self.fps == 0 {
            return Err(ReelError::validation("fps must be non-zero"));
        }
        if self.duration_secs == 0 {
            return Err(ReelError::validation("duration must be non-zero"));
        }
        Ok(())
    }

    pub fn frame_count(&self) -> u64 {
        u64::from(self.fps) * u64::from(self.duration_secs)
    }

    /// Elapsed time in seconds at `frame`. All animated parameters are driven
    /// by this value alone, so frames are pure functions of their index.
    pub fn time_at(&self, frame: FrameIndex) -> f64 {
        frame.0 as f64 / f64::from(self.fps)
    }

    pub fn contains(&self, frame: FrameIndex) -> bool {
        frame.0 < self.frame_count()
    }
}

/// Straight-alpha RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }
}
