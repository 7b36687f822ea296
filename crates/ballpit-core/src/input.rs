//! Input snapshot: keys, touches and mouse.
//!
//! Positions are stored in screen pixels with the origin at the bottom-left
//! (the raw y from the platform is flipped against the screen height).
//!
//! Touch zones split the screen at half width and two thirds of the
//! height; the lower halves are cut by a diagonal:
//!
//! ```text
//! +-----------------------+
//! | LU        .        RU |
//! |-----------------------|
//! | L /       .       \ B |
//! | /  R      .      A  \ |
//! +-----------------------+
//! ```

use std::collections::{BTreeMap, HashMap};

use glam::Vec2;

use crate::commands::InputEvent;

#[derive(Debug, Clone, Default)]
pub struct Input {
    keys: HashMap<String, bool>,
    previous: HashMap<String, bool>,
    pub touches: BTreeMap<u32, Vec2>,
    pub mouse_screen_pos: Vec2,
    /// Mouse position in GL clip space, `[-1, 1]` on both axes.
    pub mouse_gl_pos: Vec2,
    pub mouse_down: bool,
    pub screen_width: f32,
    pub screen_height: f32,
}

impl Input {
    pub fn new(screen_width: f32, screen_height: f32) -> Self {
        Self {
            screen_width,
            screen_height,
            ..Self::default()
        }
    }

    /// Fold one platform event into the snapshot.
    pub fn apply(&mut self, event: &InputEvent) {
        match event {
            InputEvent::KeyDown { code } => {
                self.keys.insert(code.clone(), true);
            }
            InputEvent::KeyUp { code } => {
                self.keys.insert(code.clone(), false);
            }
            InputEvent::TouchUpdate { touches } => {
                for t in touches {
                    self.touches
                        .insert(t.id, Vec2::new(t.x, self.screen_height - t.y));
                }
                // Primary touch stands in for the mouse.
                self.mouse_down = self.touches.contains_key(&0);
                if self.mouse_down {
                    if let Some(first) = touches.first() {
                        self.set_mouse(first.x, first.y);
                    }
                }
            }
            InputEvent::TouchEnd { touches } => {
                for t in touches {
                    self.touches.remove(&t.id);
                }
                self.mouse_down = self.touches.contains_key(&0);
            }
            InputEvent::MouseMove { x, y } => self.set_mouse(*x, *y),
            InputEvent::MouseDown => self.mouse_down = true,
            InputEvent::MouseUp => self.mouse_down = false,
            InputEvent::Resize { width, height } => {
                self.screen_width = *width;
                self.screen_height = *height;
            }
        }
    }

    fn set_mouse(&mut self, raw_x: f32, raw_y: f32) {
        self.mouse_screen_pos = Vec2::new(raw_x, self.screen_height - raw_y);
        self.mouse_gl_pos = Vec2::new(
            self.mouse_screen_pos.x / self.screen_width * 2.0 - 1.0,
            self.mouse_screen_pos.y / self.screen_height * 2.0 - 1.0,
        );
    }

    pub fn key(&self, code: &str) -> bool {
        self.keys.get(code).copied().unwrap_or(false)
    }

    /// Down now, up at the end of the previous frame.
    pub fn key_just_pressed(&self, code: &str) -> bool {
        self.key(code) && !self.previous.get(code).copied().unwrap_or(false)
    }

    /// Rotate the key snapshot. Called once per processed frame.
    pub fn end_frame(&mut self) {
        self.previous.clone_from(&self.keys);
    }

    /// True if any touch, or the mouse while pressed, passes `test(x, y, w, h)`.
    pub fn touched(&self, test: impl Fn(f32, f32, f32, f32) -> bool) -> bool {
        let (w, h) = (self.screen_width, self.screen_height);
        self.touches.values().any(|p| test(p.x, p.y, w, h))
            || (self.mouse_down && test(self.mouse_screen_pos.x, self.mouse_screen_pos.y, w, h))
    }

    pub fn touch_left(&self) -> bool {
        self.touched(|x, y, w, h| x < w / 2.0 && y < h * 2.0 / 3.0 && y > x)
    }

    pub fn touch_left_up(&self) -> bool {
        self.touched(|x, y, w, h| x < w / 2.0 && y > h * 2.0 / 3.0)
    }

    pub fn touch_right(&self) -> bool {
        self.touched(|x, y, w, h| x < w / 2.0 && y < h * 2.0 / 3.0 && y <= x)
    }

    pub fn touch_right_up(&self) -> bool {
        self.touched(|x, y, w, h| x > w / 2.0 && y > h * 2.0 / 3.0)
    }

    pub fn touch_a(&self) -> bool {
        self.touched(|x, y, w, h| x > w / 2.0 && y < h * 2.0 / 3.0 && y > w - x)
    }

    pub fn touch_b(&self) -> bool {
        self.touched(|x, y, w, h| x > w / 2.0 && y < h * 2.0 / 3.0 && y <= w - x)
    }

    pub fn touch_left_side(&self) -> bool {
        self.touched(|x, _, w, _| x < w / 2.0)
    }

    pub fn touch_right_side(&self) -> bool {
        self.touched(|x, _, w, _| x > w / 2.0)
    }
}
