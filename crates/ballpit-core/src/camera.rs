//! World-to-screen camera.
//!
//! The camera centres `(x, y)` on the canvas and scales the `w` by `h`
//! viewport to fit (or fill) it. Layers further away (larger z) render at
//! `d / (d + z)` of the base scale. Shake and rotation requests accumulate
//! between updates and are fed through low-pass filters, so a single kick
//! decays over the next frames instead of snapping back.

use glam::{Mat3, Vec2};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::canvas::Canvas;
use crate::config::CameraConfig;
use crate::constants::{ANGLE_ALPHA, ANGLE_GAIN, CAMERA_DISTANCE, EASING_ALPHA, SHAKE_ALPHA};
use crate::enums::ScaleMode;
use crate::math::{LowPassFilter, RngExt, SmoothStep};

/// Eased targets of a smooth camera.
#[derive(Debug, Clone)]
pub struct Easing {
    pub x: SmoothStep,
    pub y: SmoothStep,
    pub w: SmoothStep,
    pub h: SmoothStep,
}

impl Easing {
    fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            x: SmoothStep::new(EASING_ALPHA, x),
            y: SmoothStep::new(EASING_ALPHA, y),
            w: SmoothStep::new(EASING_ALPHA, w),
            h: SmoothStep::new(EASING_ALPHA, h),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Camera {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub mode: ScaleMode,
    pub zoom: f32,
    /// Reference distance for depth scaling.
    pub d: f32,

    /// Pixels per world unit, as of the last update.
    pub scale: f32,
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
    pub canvas_width: f32,
    pub canvas_height: f32,

    pub shake_filter: LowPassFilter,
    pub shake_input: f32,
    pub angle_filter: LowPassFilter,
    pub angle_input: f32,

    pub easing: Option<Easing>,
    rng: ChaCha8Rng,
}

impl Camera {
    pub fn new(x: f32, y: f32, w: f32, h: f32, mode: ScaleMode) -> Self {
        Self {
            x,
            y,
            w,
            h,
            mode,
            zoom: 1.0,
            d: CAMERA_DISTANCE,
            scale: 1.0,
            left: 0.0,
            right: 0.0,
            top: 0.0,
            bottom: 0.0,
            canvas_width: 0.0,
            canvas_height: 0.0,
            shake_filter: LowPassFilter::new(SHAKE_ALPHA, 1.0),
            shake_input: 0.0,
            angle_filter: LowPassFilter::new(ANGLE_ALPHA, 1.0),
            angle_input: 0.0,
            easing: None,
            rng: ChaCha8Rng::seed_from_u64(0),
        }
    }

    /// Camera whose centre and viewport ease toward the values set through
    /// [`Camera::set_pos`] and [`Camera::viewport`].
    pub fn smooth(x: f32, y: f32, w: f32, h: f32, mode: ScaleMode) -> Self {
        let mut camera = Self::new(x, y, w, h, mode);
        camera.easing = Some(Easing::new(x, y, w, h));
        camera
    }

    pub fn from_config(config: &CameraConfig, seed: u64) -> Self {
        let mut camera = if config.smooth {
            Self::smooth(config.x, config.y, config.w, config.h, config.mode)
        } else {
            Self::new(config.x, config.y, config.w, config.h, config.mode)
        };
        camera.d = config.distance;
        camera.rng = ChaCha8Rng::seed_from_u64(seed);
        camera
    }

    /// Several shakes within one step add up.
    pub fn shake(&mut self, factor: f32) {
        self.shake_input += factor;
    }

    pub fn rotate(&mut self, factor: f32) {
        self.angle_input += factor;
    }

    /// Scale multiplier of a layer at depth `z`. Only layers with
    /// `z > -d` are in front of the eye; nearer ones would render mirrored.
    pub fn depth_factor(&self, z: i32) -> f32 {
        debug_assert!(
            self.d + z as f32 > 0.0,
            "layer z = {z} is at or behind the camera eye (d = {})",
            self.d
        );
        self.d / (self.d + z as f32)
    }

    /// Recompute scale and bounds for layer `z` and load the resulting
    /// world transform into `canvas`. Consumes the pending shake and
    /// rotation input.
    pub fn update(&mut self, canvas: &mut dyn Canvas, step: f64, z: i32) {
        let dt = step as f32;
        if let Some(e) = self.easing.as_mut() {
            self.w = e.w.update(dt);
            self.h = e.h.update(dt);
            self.x = e.x.update(dt);
            self.y = e.y.update(dt);
        }

        self.canvas_width = canvas.width();
        self.canvas_height = canvas.height();
        let depth = self.depth_factor(z);
        let scale_x = self.canvas_width / self.w * depth;
        let scale_y = self.canvas_height / self.h * depth;
        self.scale = match self.mode {
            ScaleMode::Fit => scale_x.min(scale_y),
            ScaleMode::Fill => scale_x.max(scale_y),
        } * self.zoom;

        let half_w = self.canvas_width / 2.0 / self.scale;
        let half_h = self.canvas_height / 2.0 / self.scale;
        self.left = self.x - half_w;
        self.right = self.x + half_w;
        self.bottom = self.y - half_h;
        self.top = self.y + half_h;

        canvas.set_transform(
            1.0,
            0.0,
            0.0,
            -1.0,
            self.canvas_width / 2.0,
            self.canvas_height / 2.0,
        );
        canvas.scale(self.scale, self.scale);
        canvas.translate(-self.x, -self.y);

        let angle = self.angle_filter.update(self.angle_input, dt) * ANGLE_GAIN;
        self.angle_input = 0.0;
        canvas.rotate(angle);

        let shake = self.shake_filter.update(self.shake_input, dt);
        self.shake_input = 0.0;
        let jitter_x = self.rng.rnda(shake);
        let jitter_y = self.rng.rnda(shake);
        canvas.translate(jitter_x, jitter_y);
    }

    /// Screen pixels (origin bottom-left) to world units. Ignores rotation.
    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        Vec2::new(
            (screen.x / self.canvas_width - 0.5) * (self.right - self.left) + self.x,
            (screen.y / self.canvas_height - 0.5) * (self.top - self.bottom) + self.y,
        )
    }

    /// World units to screen pixels (origin top-left). Ignores rotation.
    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        let sx = self.canvas_width / (self.right - self.left);
        let sy = self.canvas_height / (self.top - self.bottom);
        let p = world - self.pos();
        Vec2::new(
            p.x * sx + self.canvas_width / 2.0,
            self.canvas_height / 2.0 - p.y * sy,
        )
    }

    pub fn fit(&mut self, w: f32, h: f32) {
        self.mode = ScaleMode::Fit;
        self.viewport(w, h);
    }

    pub fn fill(&mut self, w: f32, h: f32) {
        self.mode = ScaleMode::Fill;
        self.viewport(w, h);
    }

    pub fn viewport(&mut self, w: f32, h: f32) {
        match self.easing.as_mut() {
            Some(e) => {
                e.w.target = w;
                e.h.target = h;
            }
            None => {
                self.w = w;
                self.h = h;
            }
        }
    }

    pub fn set_pos(&mut self, pos: Vec2) {
        match self.easing.as_mut() {
            Some(e) => {
                e.x.target = pos.x;
                e.y.target = pos.y;
            }
            None => {
                self.x = pos.x;
                self.y = pos.y;
            }
        }
    }

    pub fn pos(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Column-major 2x2 scale into GL clip space (`[-1, 1]`).
    pub fn mat2(&self) -> [f32; 4] {
        [
            2.0 / (self.right - self.left),
            0.0,
            0.0,
            2.0 / (self.top - self.bottom),
        ]
    }

    /// Column-major 3x3 world-to-unit transform: scale by the inverse
    /// visible extent, then shift the centre to the origin.
    pub fn mat3(&self) -> Mat3 {
        let sx = 1.0 / (self.right - self.left);
        let sy = 1.0 / (self.top - self.bottom);
        Mat3::from_cols_array(&[sx, 0.0, 0.0, 0.0, sy, 0.0, -self.x * sx, -self.y * sy, 1.0])
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default(), 0)
    }
}
