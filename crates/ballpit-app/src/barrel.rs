use ballpit_core::canvas::{Canvas, CanvasExt};
use ballpit_core::error::Result;
use ballpit_core::math::RngExt;
use ballpit_sim::physics::{BodyDef, BodyHandle, FixtureDef};
use ballpit_sim::{Context, Engine, Entity, EntityCore};

pub const BARREL_RADIUS: f32 = 0.5;
pub const BARREL_COLOR: &str = "#517e42";
/// Side of the square the barrels are scattered in, centred on the origin.
pub const BARREL_AREA: f32 = 20.0;
const BARREL_LINEAR_DAMPING: f32 = 4.0;

/// A heavy-damped ball the player can push around.
pub struct Barrel {
    core: EntityCore,
    body: BodyHandle,
}

impl Barrel {
    /// Create a barrel at a random spot drawn from the engine RNG.
    pub fn spawn(engine: &mut Engine) -> Result<Self> {
        let position = engine.ctx.rng.rndbox(BARREL_AREA, BARREL_AREA);
        let body = engine.body(&BodyDef {
            position,
            fixed_rotation: true,
            allow_sleep: false,
            linear_damping: BARREL_LINEAR_DAMPING,
            ..BodyDef::default()
        })?;
        engine.fixture(body, &FixtureDef::circle(BARREL_RADIUS).filter(1, 1))?;
        Ok(Self {
            core: EntityCore::with_body(body),
            body,
        })
    }
}

impl Entity for Barrel {
    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EntityCore {
        &mut self.core
    }

    fn render(&self, canvas: &mut dyn Canvas, ctx: &Context) {
        if let Some(pos) = ctx.physics.position(self.body) {
            canvas.save();
            canvas.fill_circle(pos, BARREL_RADIUS, Some(BARREL_COLOR));
            canvas.restore();
        }
    }
}
