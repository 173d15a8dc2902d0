// ============================================================================
// CROP INTERACTION - crop rectangle + edge-drag state machine
// ============================================================================
//
// Callers only send named events (enter, pointer down/move/up, cancel).
// Committing the crop is the editor's job: it reads `commit_rect()`, crops
// the source buffer, then resets this machine to `Idle`.
// ============================================================================

/// Minimum crop width/height in buffer pixels.
pub const DEFAULT_MIN_SIZE: f64 = 20.0;

/// Edge hit area thickness in buffer pixels.
pub const DEFAULT_EDGE_TOLERANCE: f64 = 8.0;

/// A crop rectangle in buffer-pixel space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRect {
    /// A rect covering the whole canvas.
    pub fn full(canvas_w: u32, canvas_h: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: canvas_w as f64,
            height: canvas_h as f64,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Round to whole pixels: `(max(0, round(x)), max(0, round(y)),
    /// max(1, round(w)), max(1, round(h)))`. Halves round up.
    pub fn to_pixel_bounds(&self) -> (u32, u32, u32, u32) {
        let ix = round_half_up(self.x).max(0.0) as u32;
        let iy = round_half_up(self.y).max(0.0) as u32;
        let iw = round_half_up(self.width).max(1.0) as u32;
        let ih = round_half_up(self.height).max(1.0) as u32;
        (ix, iy, iw, ih)
    }

    /// Which edge, if any, lies under `(x, y)`.
    ///
    /// Edges are tested Left, Right, Top, Bottom and the first match wins, so
    /// corners resolve to the vertical edges.
    pub fn edge_at(&self, x: f64, y: f64, tolerance: f64) -> Option<Edge> {
        let within_rows = y >= self.y && y <= self.bottom();
        let within_cols = x >= self.x && x <= self.right();

        if (x - self.x).abs() <= tolerance && within_rows {
            return Some(Edge::Left);
        }
        if (x - self.right()).abs() <= tolerance && within_rows {
            return Some(Edge::Right);
        }
        if (y - self.y).abs() <= tolerance && within_cols {
            return Some(Edge::Top);
        }
        if (y - self.bottom()).abs() <= tolerance && within_cols {
            return Some(Edge::Bottom);
        }
        None
    }

    /// Move one edge by the pointer delta.
    fn drag_edge(&mut self, edge: Edge, dx: f64, dy: f64) {
        match edge {
            Edge::Left => {
                self.x += dx;
                self.width -= dx;
            }
            Edge::Right => self.width += dx,
            Edge::Top => {
                self.y += dy;
                self.height -= dy;
            }
            Edge::Bottom => self.height += dy,
        }
    }

    /// Enforce the minimum size and keep the rect inside the canvas.
    ///
    /// The origin is held at most `min_size` short of the far canvas edge so
    /// the final width/height clamp can never undercut the minimum. On a
    /// canvas smaller than `min_size` the rect simply covers the canvas.
    pub fn clamp_to(&mut self, canvas_w: f64, canvas_h: f64, min_size: f64) {
        self.width = self.width.max(min_size);
        self.height = self.height.max(min_size);

        self.x = self.x.min((canvas_w - min_size).max(0.0)).max(0.0);
        self.y = self.y.min((canvas_h - min_size).max(0.0)).max(0.0);

        self.width = self.width.min(canvas_w - self.x);
        self.height = self.height.min(canvas_h - self.y);
    }
}

fn round_half_up(v: f64) -> f64 {
    (v + 0.5).floor()
}

/// One side of the crop rectangle, used as the drag handle identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

/// Pointer cursor a front end should show while hovering the crop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CursorHint {
    #[default]
    Default,
    /// Over the left or right edge.
    ResizeHorizontal,
    /// Over the top or bottom edge.
    ResizeVertical,
}

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum CropState {
    #[default]
    Idle,
    Active(CropRect),
    /// An edge is being dragged; `last` is the previous pointer position.
    Dragging {
        rect: CropRect,
        edge: Edge,
        last: (f64, f64),
    },
}

/// The crop tool's state machine.
#[derive(Clone, Debug)]
pub struct CropInteraction {
    state: CropState,
    canvas_w: f64,
    canvas_h: f64,
    min_size: f64,
    edge_tolerance: f64,
}

impl Default for CropInteraction {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_SIZE, DEFAULT_EDGE_TOLERANCE)
    }
}

impl CropInteraction {
    pub fn new(min_size: f64, edge_tolerance: f64) -> Self {
        Self {
            state: CropState::Idle,
            canvas_w: 0.0,
            canvas_h: 0.0,
            min_size,
            edge_tolerance,
        }
    }

    pub fn state(&self) -> CropState {
        self.state
    }

    /// The rect of an active or dragging crop.
    pub fn rect(&self) -> Option<CropRect> {
        match self.state {
            CropState::Idle => None,
            CropState::Active(rect) | CropState::Dragging { rect, .. } => Some(rect),
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.state, CropState::Idle)
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, CropState::Dragging { .. })
    }

    /// Enter crop mode with the rect covering the whole canvas. Re-entering
    /// resets any rect already in progress.
    pub fn enter(&mut self, canvas_w: u32, canvas_h: u32) -> CropRect {
        self.canvas_w = canvas_w as f64;
        self.canvas_h = canvas_h as f64;
        let rect = CropRect::full(canvas_w, canvas_h);
        self.state = CropState::Active(rect);
        rect
    }

    pub fn edge_at(&self, x: f64, y: f64) -> Option<Edge> {
        self.rect()?.edge_at(x, y, self.edge_tolerance)
    }

    pub fn cursor_at(&self, x: f64, y: f64) -> CursorHint {
        match self.edge_at(x, y) {
            Some(Edge::Left | Edge::Right) => CursorHint::ResizeHorizontal,
            Some(Edge::Top | Edge::Bottom) => CursorHint::ResizeVertical,
            None => CursorHint::Default,
        }
    }

    /// Start dragging the edge under the pointer. Ignored unless the crop is
    /// `Active` and an edge is hit.
    pub fn pointer_down(&mut self, x: f64, y: f64) -> Option<Edge> {
        let CropState::Active(rect) = self.state else {
            return None;
        };
        let edge = rect.edge_at(x, y, self.edge_tolerance)?;
        self.state = CropState::Dragging {
            rect,
            edge,
            last: (x, y),
        };
        Some(edge)
    }

    /// Drag the grabbed edge. Returns the updated rect for the render step, or
    /// `None` when no drag is in progress.
    pub fn pointer_move(&mut self, x: f64, y: f64) -> Option<CropRect> {
        let CropState::Dragging {
            mut rect,
            edge,
            last,
        } = self.state
        else {
            return None;
        };
        rect.drag_edge(edge, x - last.0, y - last.1);
        rect.clamp_to(self.canvas_w, self.canvas_h, self.min_size);
        self.state = CropState::Dragging {
            rect,
            edge,
            last: (x, y),
        };
        Some(rect)
    }

    /// Release the dragged edge.
    pub fn pointer_up(&mut self) {
        if let CropState::Dragging { rect, .. } = self.state {
            self.state = CropState::Active(rect);
        }
    }

    /// Replace the rect of an `Active` crop, applying the same clamping as a
    /// drag. Ignored while idle or mid-drag.
    pub fn set_rect(&mut self, mut rect: CropRect) -> Option<CropRect> {
        let CropState::Active(_) = self.state else {
            return None;
        };
        rect.clamp_to(self.canvas_w, self.canvas_h, self.min_size);
        self.state = CropState::Active(rect);
        Some(rect)
    }

    /// The rect to crop to, if a crop is in progress.
    pub fn commit_rect(&self) -> Option<CropRect> {
        self.rect()
    }

    /// Abandon the crop. Returns `true` if one was in progress.
    pub fn cancel(&mut self) -> bool {
        let was_active = self.is_active();
        self.state = CropState::Idle;
        was_active
    }
}

// ============================================================================
// DISPLAY → BUFFER MAPPING
// ============================================================================

/// Where the buffer is shown on screen, for turning pointer positions into
/// buffer pixels when the display is scaled.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewMapping {
    pub display_left: f64,
    pub display_top: f64,
    pub display_width: f64,
    pub display_height: f64,
    pub buffer_width: u32,
    pub buffer_height: u32,
}

impl ViewMapping {
    /// `(buffer_width / display_width, buffer_height / display_height)`.
    /// A zero-sized display maps 1:1.
    pub fn scale(&self) -> (f64, f64) {
        let sx = if self.display_width > 0.0 {
            self.buffer_width as f64 / self.display_width
        } else {
            1.0
        };
        let sy = if self.display_height > 0.0 {
            self.buffer_height as f64 / self.display_height
        } else {
            1.0
        };
        (sx, sy)
    }

    pub fn to_buffer(&self, screen_x: f64, screen_y: f64) -> (f64, f64) {
        let (sx, sy) = self.scale();
        (
            (screen_x - self.display_left) * sx,
            (screen_y - self.display_top) * sy,
        )
    }
}
