//! The player ball, steered with the arrow keys.

use glam::Vec2;

use ballpit_core::canvas::{Canvas, CanvasExt};
use ballpit_core::error::{EngineError, Result};
use ballpit_core::input::Input;
use ballpit_sim::physics::{BodyDef, BodyHandle, FixtureDef};
use ballpit_sim::{Context, Engine, Entity, EntityCore, Frame};

pub const PLAYER_RADIUS: f32 = 0.5;
pub const PLAYER_COLOR: &str = "#b96767";
/// Top speed in world units per second.
pub const PLAYER_SPEED: f32 = 12.0;
/// Proportional gain of the velocity controller.
pub const PLAYER_FORCE_GAIN: f32 = 20.0;
const PLAYER_LINEAR_DAMPING: f32 = 0.5;
const PLAYER_ANGULAR_DAMPING: f32 = 0.3;

pub struct Player {
    core: EntityCore,
    body: BodyHandle,
    mass: f32,
}

impl Player {
    /// Create the player body at the origin.
    pub fn spawn(engine: &mut Engine) -> Result<Self> {
        let body = engine.body(&BodyDef {
            position: Vec2::ZERO,
            fixed_rotation: true,
            allow_sleep: false,
            linear_damping: PLAYER_LINEAR_DAMPING,
            angular_damping: PLAYER_ANGULAR_DAMPING,
            ..BodyDef::default()
        })?;
        engine.fixture(body, &FixtureDef::circle(PLAYER_RADIUS).filter(1, 1))?;
        let mass = engine.ctx.physics.mass(body).ok_or(EngineError::UnknownBody)?;
        Ok(Self {
            core: EntityCore::with_body(body),
            body,
            mass,
        })
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }
}

/// Desired direction from the arrow keys, each axis in `{-1, 0, 1}`.
pub fn steering(input: &Input) -> Vec2 {
    let axis = |pos: &str, neg: &str| f32::from(u8::from(input.key(pos))) - f32::from(u8::from(input.key(neg)));
    Vec2::new(axis("ArrowRight", "ArrowLeft"), axis("ArrowUp", "ArrowDown"))
}

impl Entity for Player {
    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EntityCore {
        &mut self.core
    }

    fn update(&mut self, frame: &mut Frame, _step: f64) -> Result<()> {
        let dir = steering(&frame.input);
        let vel = frame.physics.velocity(self.body).ok_or(EngineError::UnknownBody)?;
        let force = (dir * PLAYER_SPEED - vel) * PLAYER_FORCE_GAIN * self.mass;
        frame.physics.apply_force(self.body, force * self.mass)
    }

    fn render(&self, canvas: &mut dyn Canvas, ctx: &Context) {
        let Some(pos) = ctx.physics.position(self.body) else {
            return;
        };
        canvas.save();
        canvas.fill_circle(pos, PLAYER_RADIUS, Some(PLAYER_COLOR));
        canvas.restore();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ballpit_core::commands::InputEvent;

    #[test]
    fn steering_cancels_opposite_keys() {
        let mut input = Input::new(100.0, 100.0);
        assert_eq!(steering(&input), Vec2::ZERO);
        input.apply(&InputEvent::key_down("ArrowRight"));
        input.apply(&InputEvent::key_down("ArrowUp"));
        assert_eq!(steering(&input), Vec2::new(1.0, 1.0));
        input.apply(&InputEvent::key_down("ArrowLeft"));
        assert_eq!(steering(&input), Vec2::new(0.0, 1.0));
    }
}
