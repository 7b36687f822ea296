//! Drawing-surface seam.
//!
//! [`Canvas`] is the minimal 2D immediate-mode surface the engine draws on:
//! an affine transform stack, path building, fill/stroke and text. Real
//! backends implement it; [`RecordingCanvas`] keeps every call as a
//! [`DrawCommand`] for headless runs and tests.

use std::cell::RefCell;
use std::f32::consts::TAU;
use std::rc::Rc;

use glam::Vec2;
use serde::{Deserialize, Serialize};

pub trait Canvas {
    fn width(&self) -> f32;
    fn height(&self) -> f32;
    fn resize(&mut self, width: f32, height: f32);

    fn save(&mut self);
    fn restore(&mut self);
    /// Replace the current transform with the matrix
    /// `[a c e; b d f; 0 0 1]`.
    fn set_transform(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32);
    fn reset_transform(&mut self) {
        self.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
    }
    fn translate(&mut self, x: f32, y: f32);
    fn scale(&mut self, x: f32, y: f32);
    fn rotate(&mut self, angle: f32);

    fn set_fill_style(&mut self, style: &str);
    fn set_stroke_style(&mut self, style: &str);
    fn set_line_width(&mut self, width: f32);
    fn set_font(&mut self, font: &str);

    fn clear_rect(&mut self, x: f32, y: f32, w: f32, h: f32);
    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32);

    fn begin_path(&mut self);
    fn move_to(&mut self, x: f32, y: f32);
    fn line_to(&mut self, x: f32, y: f32);
    fn arc(&mut self, x: f32, y: f32, radius: f32, start: f32, end: f32);
    fn rect(&mut self, x: f32, y: f32, w: f32, h: f32);
    fn close_path(&mut self);
    fn fill(&mut self);
    fn stroke(&mut self);

    fn fill_text(&mut self, text: &str, x: f32, y: f32);
}

/// Shape helpers on top of the raw path API. `color` of `None` keeps the
/// current style.
pub trait CanvasExt: Canvas {
    fn fill_circle(&mut self, pos: Vec2, radius: f32, color: Option<&str>) {
        if let Some(color) = color {
            self.set_fill_style(color);
        }
        self.begin_path();
        self.arc(pos.x, pos.y, radius, 0.0, TAU);
        self.fill();
    }

    fn stroke_circle(&mut self, pos: Vec2, radius: f32, color: Option<&str>) {
        if let Some(color) = color {
            self.set_stroke_style(color);
        }
        self.begin_path();
        self.arc(pos.x, pos.y, radius, 0.0, TAU);
        self.stroke();
    }

    fn line(&mut self, from: Vec2, to: Vec2, color: Option<&str>) {
        if let Some(color) = color {
            self.set_stroke_style(color);
        }
        self.begin_path();
        self.move_to(from.x, from.y);
        self.line_to(to.x, to.y);
        self.stroke();
    }

    /// Axis-aligned box centred on `pos`.
    fn fill_box(&mut self, pos: Vec2, size: Vec2, color: Option<&str>) {
        if let Some(color) = color {
            self.set_fill_style(color);
        }
        self.fill_rect(pos.x - size.x / 2.0, pos.y - size.y / 2.0, size.x, size.y);
    }

    fn stroke_box(&mut self, pos: Vec2, size: Vec2, color: Option<&str>) {
        if let Some(color) = color {
            self.set_stroke_style(color);
        }
        self.begin_path();
        self.rect(pos.x - size.x / 2.0, pos.y - size.y / 2.0, size.x, size.y);
        self.stroke();
    }

    fn fill_polygon(&mut self, points: &[Vec2], color: Option<&str>) {
        if let Some(color) = color {
            self.set_fill_style(color);
        }
        if trace_polygon(self, points) {
            self.fill();
        }
    }

    fn stroke_polygon(&mut self, points: &[Vec2], color: Option<&str>) {
        if let Some(color) = color {
            self.set_stroke_style(color);
        }
        if trace_polygon(self, points) {
            self.stroke();
        }
    }

    fn text(&mut self, text: &str, pos: Vec2, color: Option<&str>) {
        if let Some(color) = color {
            self.set_fill_style(color);
        }
        self.fill_text(text, pos.x, pos.y);
    }
}

impl<C: Canvas + ?Sized> CanvasExt for C {}

fn trace_polygon<C: Canvas + ?Sized>(canvas: &mut C, points: &[Vec2]) -> bool {
    let Some((first, rest)) = points.split_first() else {
        return false;
    };
    canvas.begin_path();
    canvas.move_to(first.x, first.y);
    for p in rest {
        canvas.line_to(p.x, p.y);
    }
    canvas.close_path();
    true
}

/// One recorded surface call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op")]
pub enum DrawCommand {
    Resize { width: f32, height: f32 },
    Save,
    Restore,
    SetTransform { m: [f32; 6] },
    Translate { x: f32, y: f32 },
    Scale { x: f32, y: f32 },
    Rotate { angle: f32 },
    FillStyle { style: String },
    StrokeStyle { style: String },
    LineWidth { width: f32 },
    Font { font: String },
    ClearRect { x: f32, y: f32, w: f32, h: f32 },
    FillRect { x: f32, y: f32, w: f32, h: f32 },
    BeginPath,
    MoveTo { x: f32, y: f32 },
    LineTo { x: f32, y: f32 },
    Arc { x: f32, y: f32, radius: f32, start: f32, end: f32 },
    Rect { x: f32, y: f32, w: f32, h: f32 },
    ClosePath,
    Fill,
    Stroke,
    FillText { text: String, x: f32, y: f32 },
}

/// Everything a [`RecordingCanvas`] has seen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    pub width: f32,
    pub height: f32,
    pub commands: Vec<DrawCommand>,
}

/// Headless surface that records every call.
///
/// [`RecordingCanvas::share`] hands out another handle onto the same
/// recording, so a test can keep one after giving the canvas away.
#[derive(Debug, Default)]
pub struct RecordingCanvas {
    inner: Rc<RefCell<Recording>>,
}

impl RecordingCanvas {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Recording {
                width,
                height,
                commands: Vec::new(),
            })),
        }
    }

    pub fn share(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }

    pub fn snapshot(&self) -> Recording {
        self.inner.borrow().clone()
    }

    pub fn clear(&self) {
        self.inner.borrow_mut().commands.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&self, cmd: DrawCommand) {
        self.inner.borrow_mut().commands.push(cmd);
    }

    /// Full circles that were filled: an `Arc` sweeping a whole turn
    /// followed by `Fill` before the next path starts.
    pub fn filled_circles(&self) -> usize {
        let mut count = 0;
        let mut pending = false;
        for cmd in &self.inner.borrow().commands {
            match cmd {
                DrawCommand::BeginPath => pending = false,
                DrawCommand::Arc { start, end, .. } if (end - start).abs() >= TAU - 1e-4 => {
                    pending = true
                }
                DrawCommand::Fill if pending => {
                    count += 1;
                    pending = false;
                }
                _ => {}
            }
        }
        count
    }

    /// Every `fill_text` string, in call order.
    pub fn texts(&self) -> Vec<String> {
        self.inner
            .borrow()
            .commands
            .iter()
            .filter_map(|cmd| match cmd {
                DrawCommand::FillText { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&DrawCommand) -> bool) -> usize {
        self.inner.borrow().commands.iter().filter(|c| pred(c)).count()
    }
}

impl Canvas for RecordingCanvas {
    fn width(&self) -> f32 {
        self.inner.borrow().width
    }

    fn height(&self) -> f32 {
        self.inner.borrow().height
    }

    fn resize(&mut self, width: f32, height: f32) {
        {
            let mut inner = self.inner.borrow_mut();
            inner.width = width;
            inner.height = height;
        }
        self.push(DrawCommand::Resize { width, height });
    }

    fn save(&mut self) {
        self.push(DrawCommand::Save);
    }

    fn restore(&mut self) {
        self.push(DrawCommand::Restore);
    }

    fn set_transform(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) {
        self.push(DrawCommand::SetTransform {
            m: [a, b, c, d, e, f],
        });
    }

    fn translate(&mut self, x: f32, y: f32) {
        self.push(DrawCommand::Translate { x, y });
    }

    fn scale(&mut self, x: f32, y: f32) {
        self.push(DrawCommand::Scale { x, y });
    }

    fn rotate(&mut self, angle: f32) {
        self.push(DrawCommand::Rotate { angle });
    }

    fn set_fill_style(&mut self, style: &str) {
        self.push(DrawCommand::FillStyle {
            style: style.to_string(),
        });
    }

    fn set_stroke_style(&mut self, style: &str) {
        self.push(DrawCommand::StrokeStyle {
            style: style.to_string(),
        });
    }

    fn set_line_width(&mut self, width: f32) {
        self.push(DrawCommand::LineWidth { width });
    }

    fn set_font(&mut self, font: &str) {
        self.push(DrawCommand::Font {
            font: font.to_string(),
        });
    }

    fn clear_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.push(DrawCommand::ClearRect { x, y, w, h });
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.push(DrawCommand::FillRect { x, y, w, h });
    }

    fn begin_path(&mut self) {
        self.push(DrawCommand::BeginPath);
    }

    fn move_to(&mut self, x: f32, y: f32) {
        self.push(DrawCommand::MoveTo { x, y });
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.push(DrawCommand::LineTo { x, y });
    }

    fn arc(&mut self, x: f32, y: f32, radius: f32, start: f32, end: f32) {
        self.push(DrawCommand::Arc {
            x,
            y,
            radius,
            start,
            end,
        });
    }

    fn rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.push(DrawCommand::Rect { x, y, w, h });
    }

    fn close_path(&mut self) {
        self.push(DrawCommand::ClosePath);
    }

    fn fill(&mut self) {
        self.push(DrawCommand::Fill);
    }

    fn stroke(&mut self) {
        self.push(DrawCommand::Stroke);
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32) {
        self.push(DrawCommand::FillText {
            text: text.to_string(),
            x,
            y,
        });
    }
}
