use crate::{foundation::error::ReelResult, scene::plan::ScenePlan};

/// One rasterized frame. `data` is `width * height * 4` bytes, RGBA8.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

#[derive(Clone, Debug, Default)]
pub struct RenderSettings {
    /// If set, the target is cleared to this straight-alpha color before the
    /// plan executes.
    pub clear_rgba: Option<[u8; 4]>,
}

pub trait RenderBackend {
    fn render_plan(&mut self, plan: &ScenePlan) -> ReelResult<FrameRGBA>;
}
