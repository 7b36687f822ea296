//! Debug overlay: physics outlines, joints, stats and free-form lines.

use std::f32::consts::TAU;

use ballpit_core::camera::Camera;
use ballpit_core::canvas::Canvas;
use ballpit_core::constants::{DEBUG_FONT, DEBUG_LINE_SPACING, DEBUG_LINE_WIDTH};
use ballpit_core::input::Input;
use ballpit_core::state::Stats;

use crate::physics::{Physics, ShapeOutline};

/// Outline every body and joint in world space. Expects the camera
/// transform of the last rendered layer to be loaded.
pub fn render_world(canvas: &mut dyn Canvas, physics: &Physics, scale: f32) {
    let width = DEBUG_LINE_WIDTH / scale;
    canvas.save();
    canvas.set_line_width(width);
    canvas.set_fill_style("red");

    for body in physics.outlines() {
        canvas.save();
        canvas.set_stroke_style(if body.awake { "green" } else { "grey" });
        canvas.translate(body.position.x, body.position.y);
        canvas.rotate(body.angle);
        canvas.fill_rect(-2.0 * width, -2.0 * width, 4.0 * width, 4.0 * width);
        for shape in &body.shapes {
            match shape {
                ShapeOutline::Circle { center, radius } => {
                    canvas.begin_path();
                    canvas.arc(center.x, center.y, *radius, 0.0, TAU);
                    // Spoke to the centre shows rotation.
                    canvas.line_to(center.x, center.y);
                    canvas.stroke();
                }
                ShapeOutline::Polygon { points, closed } => {
                    let Some((first, rest)) = points.split_first() else {
                        continue;
                    };
                    canvas.begin_path();
                    canvas.move_to(first.x, first.y);
                    for p in rest {
                        canvas.line_to(p.x, p.y);
                    }
                    if *closed {
                        canvas.close_path();
                    }
                    canvas.stroke();
                }
            }
        }
        canvas.restore();
    }

    canvas.set_stroke_style("yellow");
    for (a, b) in physics.joint_lines() {
        canvas.begin_path();
        canvas.move_to(a.x, a.y);
        canvas.line_to(b.x, b.y);
        canvas.stroke();
    }
    canvas.restore();
}

/// Stats, mouse and touch lines at the bottom-left of the screen.
pub fn print_stats(canvas: &mut dyn Canvas, stats: &Stats, input: &Input, camera: &Camera) {
    let h = canvas.height();
    canvas.reset_transform();
    canvas.set_font(DEBUG_FONT);
    canvas.set_stroke_style("#fff");
    canvas.set_fill_style("#fff");
    canvas.fill_text(&stats.summary(), 5.0, h - 5.0);

    canvas.set_fill_style(if input.mouse_down { "#f00" } else { "#fff" });
    let mouse = input.mouse_screen_pos;
    let world = camera.screen_to_world(mouse);
    canvas.fill_text(
        &format!(
            "mouse: [{:.0}, {:.0}]px, [{:.2},{:.2}]m",
            mouse.x, mouse.y, world.x, world.y
        ),
        5.0,
        h - 25.0,
    );

    canvas.set_fill_style("#fff");
    let touches: Vec<String> = input
        .touches
        .values()
        .map(|t| format!("[{:.0}, {:.0}]", t.x, t.y))
        .collect();
    canvas.fill_text(&format!("touch: {}", touches.join(", ")), 5.0, h - 45.0);
}

pub fn print_debug_lines(canvas: &mut dyn Canvas, lines: &[String]) {
    canvas.reset_transform();
    canvas.set_font(DEBUG_FONT);
    canvas.set_stroke_style("#fff");
    canvas.set_fill_style("#fff");
    for (i, line) in lines.iter().enumerate() {
        canvas.fill_text(line, 0.0, (i + 1) as f32 * DEBUG_LINE_SPACING);
    }
}
