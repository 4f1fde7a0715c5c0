use std::path::{Path, PathBuf};

use crate::foundation::error::{ReelError, ReelResult};

/// Unit brush: paint color is applied at draw time from the plan op, so
/// layouts can be cached independently of the animated text color.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TextBrush;

/// Stateful helper for building Parley text layouts from raw font bytes.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrush>,
    family_name: String,
}

impl TextLayoutEngine {
    /// Register `font_bytes` and resolve the primary family name.
    pub fn new(font_bytes: &[u8]) -> ReelResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.to_vec()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            ReelError::validation("no font families registered from font bytes")
        })?;
        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| ReelError::validation("registered font family has no name"))?
            .to_string();

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family_name,
        })
    }

    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    /// Shape and lay out a single line of plain text.
    pub fn layout_line(
        &mut self,
        text: &str,
        size_px: f32,
        bold: bool,
    ) -> ReelResult<parley::Layout<TextBrush>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(ReelError::validation("text size_px must be finite and > 0"));
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        if bold {
            builder.push_default(parley::style::StyleProperty::FontWeight(
                parley::style::FontWeight::BOLD,
            ));
        }
        builder.push_default(parley::style::StyleProperty::Brush(TextBrush));

        let mut layout: parley::Layout<TextBrush> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }
}

/// Locate a usable default face by scanning well-known font directories.
///
/// The scan is deterministic: directories are visited in a fixed order and
/// entries are sorted, and a face whose file name mentions "sans" wins over
/// the first candidate otherwise.
pub fn find_default_font() -> ReelResult<PathBuf> {
    let mut roots: Vec<PathBuf> = vec![
        PathBuf::from("/usr/share/fonts"),
        PathBuf::from("/usr/local/share/fonts"),
        PathBuf::from("/Library/Fonts"),
        PathBuf::from("/System/Library/Fonts"),
        PathBuf::from("C:\\Windows\\Fonts"),
    ];
    if let Some(home) = std::env::var_os("HOME") {
        let home = PathBuf::from(home);
        roots.push(home.join(".fonts"));
        roots.push(home.join(".local/share/fonts"));
    }

    let mut candidates = Vec::new();
    for root in &roots {
        collect_font_files(root, 0, &mut candidates);
    }
    if candidates.is_empty() {
        return Err(ReelError::validation(
            "no .ttf/.otf font found in system font directories; pass an explicit font path",
        ));
    }

    candidates.sort();
    let sans = candidates.iter().find(|p| {
        p.file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.to_ascii_lowercase().contains("sans"))
            .unwrap_or(false)
    });
    Ok(sans.unwrap_or(&candidates[0]).clone())
}

fn collect_font_files(dir: &Path, depth: usize, out: &mut Vec<PathBuf>) {
    if depth > 3 {
        return;
    }
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    let mut entries: Vec<_> = entries.flatten().map(|e| e.path()).collect();
    entries.sort();
    for path in entries {
        if path.is_dir() {
            collect_font_files(&path, depth + 1, out);
            continue;
        }
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        if matches!(ext.as_deref(), Some("ttf") | Some("otf")) {
            out.push(path);
        }
    }
}

/// Read font bytes from `explicit` when given, otherwise from the best
/// system-wide candidate.
pub fn resolve_font_bytes(explicit: Option<&Path>) -> ReelResult<Vec<u8>> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => find_default_font()?,
    };
    std::fs::read(&path).map_err(|e| {
        ReelError::validation(format!("failed to read font '{}': {e}", path.display()))
    })
}
