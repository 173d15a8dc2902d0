// ============================================================================
// TRANSFORM OPERATIONS - rotate, flip, resize, crop
// ============================================================================
//
// Every transform follows the same protocol: ignore the call when nothing is
// loaded, checkpoint the live state, compute the new source buffer, abandon
// any unapplied crop, install the new source, and recompute the display.
// The last four steps live in `Editor::commit_transform`.
// ============================================================================

use image::imageops;

use crate::canvas::MAX_PIXELS;
use crate::editor::Editor;
use crate::error::EditError;

/// Interpolation method for resize operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Interpolation {
    Nearest,
    #[default]
    Bilinear,
    Bicubic,
    Lanczos3,
}

impl Interpolation {
    pub fn label(&self) -> &'static str {
        match self {
            Interpolation::Nearest => "nearest",
            Interpolation::Bilinear => "bilinear",
            Interpolation::Bicubic => "bicubic",
            Interpolation::Lanczos3 => "lanczos3",
        }
    }

    pub fn all() -> &'static [Interpolation] {
        &[
            Interpolation::Nearest,
            Interpolation::Bilinear,
            Interpolation::Bicubic,
            Interpolation::Lanczos3,
        ]
    }

    pub fn from_name(name: &str) -> Option<Interpolation> {
        let name = name.trim();
        Self::all()
            .iter()
            .copied()
            .find(|i| i.label().eq_ignore_ascii_case(name))
    }

    pub fn to_filter(&self) -> imageops::FilterType {
        match self {
            Interpolation::Nearest => imageops::FilterType::Nearest,
            Interpolation::Bilinear => imageops::FilterType::Triangle,
            Interpolation::Bicubic => imageops::FilterType::CatmullRom,
            Interpolation::Lanczos3 => imageops::FilterType::Lanczos3,
        }
    }
}

/// Quarter-turn direction. `Right` is clockwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RotateDirection {
    Left,
    Right,
}

impl RotateDirection {
    pub fn is_clockwise(&self) -> bool {
        matches!(self, RotateDirection::Right)
    }

    pub fn description(&self) -> &'static str {
        match self {
            RotateDirection::Left => "Rotate Left",
            RotateDirection::Right => "Rotate Right",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlipAxis {
    /// Mirror columns.
    Horizontal,
    /// Mirror rows.
    Vertical,
}

impl FlipAxis {
    pub fn description(&self) -> &'static str {
        match self {
            FlipAxis::Horizontal => "Flip Horizontal",
            FlipAxis::Vertical => "Flip Vertical",
        }
    }
}

fn ignored(op: &str, reason: EditError) -> bool {
    crate::log_warn!("{} ignored: {}", op, reason);
    false
}

/// Rotate the source image 90° in `direction` (swaps W↔H).
pub fn rotate_90(editor: &mut Editor, direction: RotateDirection) -> bool {
    let Some(source) = editor.source() else {
        return ignored(direction.description(), EditError::NoImageLoaded);
    };
    let rotated = source.rotate_90(direction.is_clockwise());
    editor.commit_transform(direction.description(), rotated);
    true
}

/// Mirror the source image along `axis`.
pub fn flip(editor: &mut Editor, axis: FlipAxis) -> bool {
    let Some(source) = editor.source() else {
        return ignored(axis.description(), EditError::NoImageLoaded);
    };
    let flipped = match axis {
        FlipAxis::Horizontal => source.flip_horizontal(),
        FlipAxis::Vertical => source.flip_vertical(),
    };
    editor.commit_transform(axis.description(), flipped);
    true
}

/// Floor a requested resize dimension. `None` for non-finite values, values
/// below 1 after flooring, or values past the pixel limit.
fn resize_dimension(value: f64) -> Option<u32> {
    if !value.is_finite() {
        return None;
    }
    let floored = value.floor();
    if floored < 1.0 || floored > u32::MAX as f64 {
        return None;
    }
    Some(floored as u32)
}

/// Resample the source image to `new_w`×`new_h` with the editor's configured
/// interpolation. Ignored for non-finite or non-positive sizes and when the
/// size would not change.
///
/// The default is bilinear. `Interpolation::Nearest` is accepted from config
/// but gives blocky results below bilinear quality.
pub fn resize_image(editor: &mut Editor, new_w: f64, new_h: f64) -> bool {
    const OP: &str = "Resize";
    let Some(source) = editor.source() else {
        return ignored(OP, EditError::NoImageLoaded);
    };
    let (Some(w), Some(h)) = (resize_dimension(new_w), resize_dimension(new_h)) else {
        return ignored(
            OP,
            EditError::InvalidTransformArgument(format!("{new_w}x{new_h}")),
        );
    };
    if (w as u64) * (h as u64) > MAX_PIXELS {
        return ignored(
            OP,
            EditError::InvalidTransformArgument(format!("{w}x{h} exceeds pixel limit")),
        );
    }
    if (w, h) == source.dimensions() {
        return false;
    }
    let filter = editor.config().interpolation.to_filter();
    let resized = source.resample(w, h, filter);
    editor.commit_transform(OP, resized);
    true
}

/// Replace the source image with the active crop rect. Ignored when no crop
/// is in progress.
pub fn apply_crop(editor: &mut Editor) -> bool {
    const OP: &str = "Crop";
    let Some(source) = editor.source() else {
        return ignored(OP, EditError::NoImageLoaded);
    };
    let Some(rect) = editor.crop().commit_rect() else {
        return ignored(OP, EditError::NoActiveCrop);
    };
    let cropped = source.crop(&rect);
    editor.commit_transform(OP, cropped);
    true
}
