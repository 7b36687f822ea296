//! Entity contract.
//!
//! Every game object embeds an [`EntityCore`] and implements [`Entity`].
//! All hooks have no-op defaults; an entity overrides only what it needs.

use ballpit_core::canvas::Canvas;
use ballpit_core::constants::NEVER;
use ballpit_core::error::Result;
use ballpit_core::types::EntityId;

use crate::engine::{Context, Frame};
use crate::physics::{BodyHandle, Contact, ContactImpulse, Manifold};

/// Registration state of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Registration {
    /// Never added.
    #[default]
    Fresh,
    /// Live. `slot` is the current position in the live sequence; `z` is the
    /// depth the entity was indexed under.
    Registered { id: EntityId, slot: usize, z: i32 },
    /// Removed. Cannot be added again.
    Retired,
}

#[derive(Debug, Clone)]
pub struct EntityCore {
    /// Render depth. Read once when the entity is added. Must stay above
    /// minus the camera distance (30 by default); larger is further back.
    pub z: i32,
    pub dead: bool,
    /// Simulation time at which the engine kills the entity.
    pub die_at: f64,
    /// Owned body, destroyed on removal.
    pub body: Option<BodyHandle>,
    pub(crate) reg: Registration,
}

impl Default for EntityCore {
    fn default() -> Self {
        Self {
            z: 0,
            dead: false,
            die_at: NEVER,
            body: None,
            reg: Registration::Fresh,
        }
    }
}

impl EntityCore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(body: BodyHandle) -> Self {
        Self {
            body: Some(body),
            ..Self::default()
        }
    }

    pub fn z(mut self, z: i32) -> Self {
        self.z = z;
        self
    }

    pub fn die_at(mut self, time: f64) -> Self {
        self.die_at = time;
        self
    }

    pub fn registration(&self) -> Registration {
        self.reg
    }

    pub fn id(&self) -> Option<EntityId> {
        match self.reg {
            Registration::Registered { id, .. } => Some(id),
            _ => None,
        }
    }

    pub fn slot(&self) -> Option<usize> {
        match self.reg {
            Registration::Registered { slot, .. } => Some(slot),
            _ => None,
        }
    }

    pub fn is_registered(&self) -> bool {
        matches!(self.reg, Registration::Registered { .. })
    }
}

pub trait Entity {
    fn core(&self) -> &EntityCore;
    fn core_mut(&mut self) -> &mut EntityCore;

    /// Per-frame logic, after the world step.
    fn update(&mut self, _frame: &mut Frame, _step: f64) -> Result<()> {
        Ok(())
    }

    /// Draw with the camera transform of the entity's layer loaded.
    fn render(&self, _canvas: &mut dyn Canvas, _ctx: &Context) {}

    /// Last call before removal. May mark other entities dying; they are
    /// reaped in the same pass.
    fn before_die(&mut self, _frame: &mut Frame) -> Result<()> {
        Ok(())
    }

    fn begin_contact(
        &mut self,
        _frame: &mut Frame,
        _contact: &Contact,
        _other: Option<&mut dyn Entity>,
    ) -> Result<()> {
        Ok(())
    }

    fn end_contact(
        &mut self,
        _frame: &mut Frame,
        _contact: &Contact,
        _other: Option<&mut dyn Entity>,
    ) -> Result<()> {
        Ok(())
    }

    fn pre_solve(
        &mut self,
        _frame: &mut Frame,
        _contact: &Contact,
        _manifold: &Manifold,
        _other: Option<&mut dyn Entity>,
    ) -> Result<()> {
        Ok(())
    }

    fn post_solve(
        &mut self,
        _frame: &mut Frame,
        _contact: &Contact,
        _impulse: &ContactImpulse,
        _other: Option<&mut dyn Entity>,
    ) -> Result<()> {
        Ok(())
    }

    /// Mark this entity for removal at the end of the update pass.
    /// Calling it again is a no-op.
    fn die(&mut self, frame: &mut Frame) {
        if self.core().dead {
            return;
        }
        frame.mark_dying(self.core());
        self.core_mut().dead = true;
    }
}
