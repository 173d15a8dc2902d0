//! The editing engine: one authoritative source buffer, the filter settings
//! that derive the display buffer from it, the undo/redo history, and the
//! crop interaction.
//!
//! All mutation goes through `&mut self` methods. Conditions a UI could
//! trigger by accident (no image, nothing to undo, bad resize input) are
//! silent no-ops that return `false`; only decoding reports an error.

use crate::canvas::PixelBuffer;
use crate::components::crop::{CropInteraction, CropRect, CursorHint, Edge};
use crate::components::history::HistoryManager;
use crate::config::EditorConfig;
use crate::error::{DecodeError, EditError, EncodeError};
use crate::io::{self, SaveFormat};
use crate::ops::adjustments::{self, FilterSettings};
use crate::ops::transform::{self, FlipAxis, RotateDirection};

/// Description stored with the baseline checkpoint taken at load.
const OPEN_DESCRIPTION: &str = "Open Image";

/// Something that can show a pixel buffer, such as a window or a test double.
pub trait RenderSurface {
    /// Display `buffer`, with the crop rectangle overlaid when one is active.
    fn present(&mut self, buffer: &PixelBuffer, crop: Option<CropRect>);
}

pub struct Editor {
    source: Option<PixelBuffer>,
    display: PixelBuffer,
    settings: FilterSettings,
    history: HistoryManager,
    crop: CropInteraction,
    config: EditorConfig,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            source: None,
            display: PixelBuffer::new(0, 0),
            settings: FilterSettings::default(),
            history: HistoryManager::new(config.max_undo_steps),
            crop: CropInteraction::new(config.crop_min_size, config.crop_edge_tolerance),
            config,
        }
    }

    // ---- state --------------------------------------------------------------

    pub fn has_image(&self) -> bool {
        self.source.is_some()
    }

    pub fn source(&self) -> Option<&PixelBuffer> {
        self.source.as_ref()
    }

    /// The filtered buffer to present. Empty when nothing is loaded.
    pub fn display(&self) -> &PixelBuffer {
        &self.display
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.source.as_ref().map(|s| s.dimensions())
    }

    pub fn settings(&self) -> FilterSettings {
        self.settings
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn crop(&self) -> &CropInteraction {
        &self.crop
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Range offered for the resize inputs: 1 up to twice the current size.
    pub fn resize_limits(&self) -> Option<(std::ops::RangeInclusive<u32>, std::ops::RangeInclusive<u32>)> {
        let (w, h) = self.dimensions()?;
        Some((1..=w.saturating_mul(2).max(1), 1..=h.saturating_mul(2).max(1)))
    }

    // ---- loading ------------------------------------------------------------

    /// Install a freshly decoded image: history and filters are reset, any
    /// crop is abandoned, and the baseline checkpoint is taken.
    pub fn load_buffer(&mut self, buffer: PixelBuffer) {
        crate::log_info!("Loaded image {}x{}", buffer.width(), buffer.height());
        self.history.clear();
        self.settings = FilterSettings::default();
        self.crop.cancel();
        self.source = Some(buffer);
        self.checkpoint(OPEN_DESCRIPTION);
        self.refresh_display();
    }

    /// Apply the outcome of a decode. On failure nothing changes and the
    /// error is handed back.
    pub fn finish_load(&mut self, result: Result<PixelBuffer, DecodeError>) -> Result<(), DecodeError> {
        match result {
            Ok(buffer) => {
                self.load_buffer(buffer);
                Ok(())
            }
            Err(e) => {
                crate::log_err!("Failed to open image: {}", e);
                Err(e)
            }
        }
    }

    /// Decode `bytes` on the calling thread and load the result.
    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<(), DecodeError> {
        self.finish_load(io::decode_image(bytes))
    }

    // ---- filters ------------------------------------------------------------

    /// Replace the filter settings and recompute, without a checkpoint.
    pub fn set_filters(&mut self, settings: FilterSettings) -> bool {
        if !self.require_image("Filter change") {
            return false;
        }
        self.settings = settings;
        self.refresh_display();
        true
    }

    pub fn set_brightness(&mut self, value: i32) -> bool {
        let mut settings = self.settings;
        settings.set_brightness(value);
        self.set_filters(settings)
    }

    pub fn set_contrast(&mut self, value: i32) -> bool {
        let mut settings = self.settings;
        settings.set_contrast(value);
        self.set_filters(settings)
    }

    pub fn set_grayscale(&mut self, on: bool) -> bool {
        let mut settings = self.settings;
        settings.set_grayscale(on);
        self.set_filters(settings)
    }

    /// Record a checkpoint for a finished filter gesture (slider release).
    pub fn commit_filters(&mut self) -> bool {
        if !self.require_image("Filter commit") {
            return false;
        }
        self.checkpoint("Adjust Filters");
        true
    }

    /// Checkpoint, then flip the grayscale flag.
    pub fn toggle_grayscale(&mut self) -> bool {
        if !self.require_image("Grayscale") {
            return false;
        }
        self.checkpoint("Grayscale");
        self.settings.set_grayscale(!self.settings.grayscale());
        self.refresh_display();
        true
    }

    // ---- history ------------------------------------------------------------

    pub fn can_undo(&self) -> bool {
        self.has_image() && self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.has_image() && self.history.can_redo()
    }

    pub fn undo(&mut self) -> bool {
        let Some(source) = self.source.as_ref() else {
            return self.ignore("Undo", EditError::NoImageLoaded);
        };
        match self.history.undo(source, &self.settings) {
            Some(cp) => {
                crate::log_info!(
                    "Undo '{}' (undo depth {}, redo depth {})",
                    cp.description(),
                    self.history.undo_count(),
                    self.history.redo_count()
                );
                let (source, settings) = cp.into_parts();
                self.restore(source, settings);
                true
            }
            None => self.ignore("Undo", EditError::EmptyHistory("undo")),
        }
    }

    pub fn redo(&mut self) -> bool {
        let Some(source) = self.source.as_ref() else {
            return self.ignore("Redo", EditError::NoImageLoaded);
        };
        match self.history.redo(source, &self.settings) {
            Some(cp) => {
                crate::log_info!(
                    "Redo '{}' (undo depth {}, redo depth {})",
                    cp.description(),
                    self.history.undo_count(),
                    self.history.redo_count()
                );
                let (source, settings) = cp.into_parts();
                self.restore(source, settings);
                true
            }
            None => self.ignore("Redo", EditError::EmptyHistory("redo")),
        }
    }

    // ---- transforms ---------------------------------------------------------

    pub fn rotate_90(&mut self, direction: RotateDirection) -> bool {
        transform::rotate_90(self, direction)
    }

    pub fn flip(&mut self, axis: FlipAxis) -> bool {
        transform::flip(self, axis)
    }

    /// Resize to `floor(w)`×`floor(h)`. Ignored for non-finite or
    /// non-positive sizes and for the current size.
    pub fn resize_image(&mut self, w: f64, h: f64) -> bool {
        transform::resize_image(self, w, h)
    }

    /// Checkpoint, abandon any crop, install `new_source`, and recompute.
    /// Callers have already produced `new_source` from the live source.
    pub(crate) fn commit_transform(&mut self, description: &str, new_source: PixelBuffer) {
        self.checkpoint(description);
        if let Some(old) = self.source.as_ref() {
            crate::log_info!(
                "{}: {}x{} -> {}x{}",
                description,
                old.width(),
                old.height(),
                new_source.width(),
                new_source.height()
            );
        }
        self.crop.cancel();
        self.source = Some(new_source);
        self.refresh_display();
    }

    // ---- crop ---------------------------------------------------------------

    /// Start cropping with the rect covering the whole image.
    pub fn enter_crop(&mut self) -> Option<CropRect> {
        let Some((w, h)) = self.dimensions() else {
            self.ignore("Crop", EditError::NoImageLoaded);
            return None;
        };
        Some(self.crop.enter(w, h))
    }

    pub fn crop_pointer_down(&mut self, x: f64, y: f64) -> Option<Edge> {
        self.crop.pointer_down(x, y)
    }

    pub fn crop_pointer_move(&mut self, x: f64, y: f64) -> Option<CropRect> {
        self.crop.pointer_move(x, y)
    }

    pub fn crop_pointer_up(&mut self) {
        self.crop.pointer_up();
    }

    /// Place the active crop rect directly (clamped like a drag).
    pub fn set_crop_rect(&mut self, rect: CropRect) -> Option<CropRect> {
        self.crop.set_rect(rect)
    }

    pub fn crop_cursor_at(&self, x: f64, y: f64) -> CursorHint {
        self.crop.cursor_at(x, y)
    }

    pub fn cancel_crop(&mut self) -> bool {
        self.crop.cancel()
    }

    /// Crop the source to the active rect.
    pub fn commit_crop(&mut self) -> bool {
        transform::apply_crop(self)
    }

    // ---- output -------------------------------------------------------------

    /// Show the display buffer (and crop overlay) on `surface`.
    pub fn render(&self, surface: &mut dyn RenderSurface) {
        if !self.has_image() {
            return;
        }
        surface.present(&self.display, self.crop.rect());
    }

    /// Encode the display buffer, filters included.
    pub fn export(&self, format: SaveFormat, quality: u8) -> Result<Vec<u8>, EncodeError> {
        if !self.has_image() {
            return Err(EncodeError::NoImageLoaded);
        }
        io::encode_image(&self.display, format, quality)
    }

    // ---- internals ----------------------------------------------------------

    fn checkpoint(&mut self, description: &str) {
        if let Some(source) = self.source.as_ref() {
            self.history.checkpoint(source, &self.settings, description);
        }
    }

    fn restore(&mut self, source: PixelBuffer, settings: FilterSettings) {
        self.source = Some(source);
        self.settings = settings;
        self.crop.cancel();
        self.refresh_display();
    }

    fn refresh_display(&mut self) {
        match self.source.as_ref() {
            Some(source) => adjustments::apply_filters_into(source, &self.settings, &mut self.display),
            None => self.display = PixelBuffer::new(0, 0),
        }
    }

    fn require_image(&self, op: &str) -> bool {
        self.has_image() || self.ignore(op, EditError::NoImageLoaded)
    }

    fn ignore(&self, op: &str, reason: EditError) -> bool {
        crate::log_warn!("{} ignored: {}", op, reason);
        false
    }
}
