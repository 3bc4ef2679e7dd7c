// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signature capture surface.
//!
//! A bounded RGBA pixel buffer with two states: empty and has-strokes.
//! Pointer and touch input arrive pre-unified as viewport coordinates and are
//! translated into surface-local pixels using the surface origin and the
//! device pixel ratio (applied uniformly to both axes). The first stroke
//! segment that actually paints a pixel notifies the observer exactly once;
//! an explicit clear notifies once the buffer had strokes. While disabled,
//! all input and clears are ignored.
//!
//! The buffer is owned here exclusively; callers only read it through
//! `export_png_data_url` at submit time.

use crate::error::AppError;
use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Stroke color (#333, matching the form's pen).
const STROKE_RGBA: [u8; 4] = [0x33, 0x33, 0x33, 0xff];

/// Stroke width in CSS pixels, before device-pixel-ratio scaling.
const STROKE_WIDTH_CSS_PX: f64 = 2.0;

/// On-screen geometry of the surface at the start of a drawing session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceLayout {
    /// Viewport X of the surface's left edge
    pub left: f64,
    /// Viewport Y of the surface's top edge
    pub top: f64,
    /// CSS width of the surface
    pub width: f64,
    /// CSS height of the surface
    pub height: f64,
    /// Backing-buffer scale factor (1.0 on standard displays)
    pub device_pixel_ratio: f64,
}

impl Default for SurfaceLayout {
    fn default() -> Self {
        // The form's default canvas geometry
        Self {
            left: 0.0,
            top: 0.0,
            width: 600.0,
            height: 200.0,
            device_pixel_ratio: 1.0,
        }
    }
}

/// One pointer event position in viewport coordinates.
///
/// Mouse and touch input are already unified; a touch contributes the first
/// contact point's client coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    pub client_x: f64,
    pub client_y: f64,
}

/// Callback interface for surface state transitions.
///
/// Attached and detached explicitly; there is no implicit listener lifecycle.
pub trait SignatureObserver: Send {
    /// Fired once when the surface transitions empty -> has-strokes.
    fn on_stroke(&mut self);
    /// Fired when an explicit clear empties a surface that had strokes.
    fn on_clear(&mut self);
}

/// Stateful signature drawing surface.
pub struct SignaturePad {
    layout: SurfaceLayout,
    buf_width: u32,
    buf_height: u32,
    pixels: Vec<u8>,
    drawing: bool,
    has_strokes: bool,
    disabled: bool,
    last_point: Option<(f64, f64)>,
    observer: Option<Box<dyn SignatureObserver>>,
}

impl SignaturePad {
    pub fn new() -> Self {
        let mut pad = Self {
            layout: SurfaceLayout::default(),
            buf_width: 0,
            buf_height: 0,
            pixels: Vec::new(),
            drawing: false,
            has_strokes: false,
            disabled: false,
            last_point: None,
            observer: None,
        };
        pad.begin_session(SurfaceLayout::default());
        pad
    }

    /// Start a drawing session against the surface's current on-screen
    /// geometry.
    ///
    /// Recomputes the backing buffer from the CSS size and device pixel
    /// ratio, so strokes render at the same visual scale on any display.
    /// Any strokes drawn before a resize are discarded; the state machine
    /// returns to empty without firing the clear callback.
    pub fn begin_session(&mut self, layout: SurfaceLayout) {
        let dpr = if layout.device_pixel_ratio > 0.0 {
            layout.device_pixel_ratio
        } else {
            1.0
        };
        self.buf_width = (layout.width * dpr).round().max(1.0) as u32;
        self.buf_height = (layout.height * dpr).round().max(1.0) as u32;
        self.layout = SurfaceLayout {
            device_pixel_ratio: dpr,
            ..layout
        };
        self.pixels = vec![0; (self.buf_width * self.buf_height * 4) as usize];
        self.drawing = false;
        self.has_strokes = false;
        self.last_point = None;
    }

    /// Attach the transition observer, replacing any previous one.
    pub fn attach(&mut self, observer: Box<dyn SignatureObserver>) {
        self.observer = Some(observer);
    }

    /// Detach and return the observer; no further callbacks fire.
    pub fn detach(&mut self) -> Option<Box<dyn SignatureObserver>> {
        self.observer.take()
    }

    /// While disabled (during submission), pointer input and clears are
    /// ignored and no callbacks fire.
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
        if disabled {
            self.drawing = false;
            self.last_point = None;
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn has_strokes(&self) -> bool {
        self.has_strokes
    }

    /// Backing buffer dimensions in device pixels.
    pub fn buffer_dimensions(&self) -> (u32, u32) {
        (self.buf_width, self.buf_height)
    }

    /// Number of painted pixels (used by tests and previews).
    pub fn painted_pixel_count(&self) -> usize {
        self.pixels.chunks_exact(4).filter(|px| px[3] != 0).count()
    }

    /// Whether the device pixel at (x, y) has been painted.
    pub fn is_painted(&self, x: u32, y: u32) -> bool {
        if x >= self.buf_width || y >= self.buf_height {
            return false;
        }
        self.pixels[((y * self.buf_width + x) * 4 + 3) as usize] != 0
    }

    /// Translate viewport coordinates into surface-local device pixels.
    fn to_local(&self, input: PointerInput) -> (f64, f64) {
        (
            (input.client_x - self.layout.left) * self.layout.device_pixel_ratio,
            (input.client_y - self.layout.top) * self.layout.device_pixel_ratio,
        )
    }

    pub fn pointer_down(&mut self, input: PointerInput) {
        if self.disabled {
            return;
        }
        self.drawing = true;
        self.last_point = Some(self.to_local(input));
    }

    pub fn pointer_move(&mut self, input: PointerInput) {
        if !self.drawing || self.disabled {
            return;
        }
        let current = self.to_local(input);
        let from = self.last_point.unwrap_or(current);
        let painted = self.draw_segment(from, current);
        self.last_point = Some(current);

        // The transition fires on the first segment that actually rendered,
        // and never again for later segments.
        if painted && !self.has_strokes {
            self.has_strokes = true;
            if let Some(observer) = self.observer.as_mut() {
                observer.on_stroke();
            }
        }
    }

    pub fn pointer_up(&mut self) {
        self.drawing = false;
        self.last_point = None;
    }

    /// Explicit clear (the form's Clear button).
    pub fn clear(&mut self) {
        if self.disabled {
            return;
        }
        self.pixels.fill(0);
        self.drawing = false;
        self.last_point = None;
        if self.has_strokes {
            self.has_strokes = false;
            if let Some(observer) = self.observer.as_mut() {
                observer.on_clear();
            }
        }
    }

    /// External reset (after submit success). Silent: no callback fires.
    pub fn reset(&mut self) {
        self.pixels.fill(0);
        self.drawing = false;
        self.has_strokes = false;
        self.last_point = None;
    }

    /// Serialize the buffer as a PNG data URL. Called at submit time only,
    /// never mid-stroke.
    pub fn export_png_data_url(&self) -> Result<String, AppError> {
        let mut encoded = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut encoded, self.buf_width, self.buf_height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder
                .write_header()
                .map_err(|e| AppError::Internal(anyhow::anyhow!("PNG header: {}", e)))?;
            writer
                .write_image_data(&self.pixels)
                .map_err(|e| AppError::Internal(anyhow::anyhow!("PNG encode: {}", e)))?;
        }
        Ok(format!("data:image/png;base64,{}", STANDARD.encode(encoded)))
    }

    /// Stamp round pen tips along the segment. Returns whether any pixel
    /// inside the buffer was painted.
    fn draw_segment(&mut self, from: (f64, f64), to: (f64, f64)) -> bool {
        let radius = (STROKE_WIDTH_CSS_PX * self.layout.device_pixel_ratio / 2.0).max(0.5);
        let dx = to.0 - from.0;
        let dy = to.1 - from.1;
        let length = (dx * dx + dy * dy).sqrt();
        // Half-pixel steps keep the stamped discs contiguous
        let steps = (length / 0.5).ceil().max(1.0) as u32;

        let mut painted = false;
        for step in 0..=steps {
            let t = f64::from(step) / f64::from(steps);
            let cx = from.0 + dx * t;
            let cy = from.1 + dy * t;
            painted |= self.stamp(cx, cy, radius);
        }
        painted
    }

    fn stamp(&mut self, cx: f64, cy: f64, radius: f64) -> bool {
        let min_x = (cx - radius).floor().max(0.0) as i64;
        let max_x = (cx + radius).ceil() as i64;
        let min_y = (cy - radius).floor().max(0.0) as i64;
        let max_y = (cy + radius).ceil() as i64;

        let mut painted = false;
        for y in min_y..=max_y {
            if y < 0 || y >= i64::from(self.buf_height) {
                continue;
            }
            for x in min_x..=max_x {
                if x < 0 || x >= i64::from(self.buf_width) {
                    continue;
                }
                let px = x as f64 + 0.5 - cx;
                let py = y as f64 + 0.5 - cy;
                if px * px + py * py <= radius * radius {
                    let offset = ((y as u32 * self.buf_width + x as u32) * 4) as usize;
                    self.pixels[offset..offset + 4].copy_from_slice(&STROKE_RGBA);
                    painted = true;
                }
            }
        }
        painted
    }
}

impl Default for SignaturePad {
    fn default() -> Self {
        Self::new()
    }
}
