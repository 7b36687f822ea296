//! Entity registry.
//!
//! Live entities sit in a dense sequence; removal swaps the last entity
//! into the hole. [`EntityIndex`] maps generation-checked ids to slots, so
//! ids stay valid across swaps and go stale after removal.
//!
//! Death is two-phase: [`Ecs::die`] only queues the id, and
//! [`Ecs::let_die`] runs `before_die` and removes everything queued.

use ballpit_core::error::{EngineError, Result};
use ballpit_core::types::EntityId;
use ballpit_core::zmap::ZMap;

use crate::engine::{Context, Frame};
use crate::entity::{Entity, Registration};
use crate::physics::{BodyHandle, Physics};

/// Id allocator with slot lookup.
#[derive(Debug, Default)]
pub struct EntityIndex {
    generations: Vec<u32>,
    slots: Vec<Option<usize>>,
    free_indices: Vec<u32>,
    next_index: u32,
}

impl EntityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, slot: usize) -> EntityId {
        let index = match self.free_indices.pop() {
            Some(index) => index,
            None => {
                let index = self.next_index;
                self.next_index += 1;
                self.generations.push(0);
                self.slots.push(None);
                index
            }
        };
        self.slots[index as usize] = Some(slot);
        EntityId::new(index, self.generations[index as usize])
    }

    pub fn deallocate(&mut self, id: EntityId) {
        if self.is_alive(id) {
            self.generations[id.index as usize] += 1;
            self.slots[id.index as usize] = None;
            self.free_indices.push(id.index);
        }
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        (id.index as usize) < self.generations.len()
            && self.generations[id.index as usize] == id.generation
            && self.slots[id.index as usize].is_some()
    }

    pub fn slot(&self, id: EntityId) -> Option<usize> {
        if self.is_alive(id) {
            self.slots[id.index as usize]
        } else {
            None
        }
    }

    fn set_slot(&mut self, id: EntityId, slot: usize) {
        self.slots[id.index as usize] = Some(slot);
    }

    /// Retire every live id.
    pub fn clear(&mut self) {
        for index in 0..self.generations.len() {
            if self.slots[index].take().is_some() {
                self.generations[index] += 1;
                self.free_indices.push(index as u32);
            }
        }
    }
}

/// Pending-death queue handed to entity hooks through a [`Frame`].
pub struct Deaths<'a> {
    index: &'a EntityIndex,
    dying: &'a mut Vec<EntityId>,
}

impl Deaths<'_> {
    pub(crate) fn push(&mut self, id: EntityId) {
        assert!(self.index.is_alive(id), "{id} marked dying but not registered");
        self.dying.push(id);
    }

    pub fn slot_of(&self, id: EntityId) -> Option<usize> {
        self.index.slot(id)
    }

    pub fn is_pending(&self, id: EntityId) -> bool {
        self.dying.contains(&id)
    }
}

pub type Ents = Vec<Box<dyn Entity>>;

#[derive(Default)]
pub struct Ecs {
    ents: Ents,
    index: EntityIndex,
    dying: Vec<EntityId>,
    zmap: ZMap<EntityId>,
}

impl Ecs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new entity and tag its body with the issued id.
    ///
    /// Panics if the entity was ever registered before.
    pub fn add(&mut self, mut ent: Box<dyn Entity>, physics: &mut Physics) -> EntityId {
        let core = ent.core_mut();
        assert_eq!(
            core.reg,
            Registration::Fresh,
            "entity added twice or re-added after removal"
        );
        let slot = self.ents.len();
        let id = self.index.allocate(slot);
        let z = core.z;
        core.reg = Registration::Registered { id, slot, z };
        if let Some(body) = core.body {
            physics.set_owner(body, Some(id));
        }
        self.zmap.add(z, id);
        self.ents.push(ent);
        id
    }

    /// Unregister an entity and destroy its body.
    ///
    /// Panics if `id` is not registered.
    pub fn remove(&mut self, id: EntityId, physics: &mut Physics) -> Result<Box<dyn Entity>> {
        let slot = self
            .index
            .slot(id)
            .unwrap_or_else(|| panic!("removing unregistered entity {id}"));
        if let Some(body) = self.ents[slot].core().body {
            release_body(physics, body)?;
        }

        let mut ent = self.ents.swap_remove(slot);
        if let Some(moved) = self.ents.get_mut(slot) {
            let core = moved.core_mut();
            if let Registration::Registered { id: moved_id, z, .. } = core.reg {
                core.reg = Registration::Registered {
                    id: moved_id,
                    slot,
                    z,
                };
                self.index.set_slot(moved_id, slot);
            }
        }

        let core = ent.core_mut();
        if let Registration::Registered { z, .. } = core.reg {
            self.zmap.remove(z, id);
        }
        core.reg = Registration::Retired;
        core.body = None;
        self.index.deallocate(id);
        Ok(ent)
    }

    /// Queue `id` for removal. Does not touch the live sequence.
    ///
    /// Panics if `id` is not registered.
    pub fn die(&mut self, id: EntityId) {
        self.deaths().push(id);
    }

    /// Run `before_die` for every queued entity, then remove it, oldest
    /// first. Deaths queued by those hooks are handled in the same call.
    ///
    /// The hook runs once per entity. An entity whose hook fails is still
    /// removed, then the error is returned; deaths still queued wait for
    /// the next call.
    pub fn let_die(&mut self, ctx: &mut Context) -> Result<()> {
        if !self.dying.is_empty() {
            log::trace!("reaping {} entities", self.dying.len());
        }
        while !self.dying.is_empty() {
            let id = self.dying.remove(0);
            let slot = self
                .index
                .slot(id)
                .unwrap_or_else(|| panic!("reaping unregistered entity {id}"));
            let hooked = {
                let (ents, deaths) = self.split();
                let ent = &mut ents[slot];
                ent.core_mut().dead = true;
                let mut frame = Frame::new(ctx, deaths);
                ent.before_die(&mut frame)
            };
            // A hook may have queued its own id again.
            self.dying.retain(|pending| *pending != id);
            self.remove(id, &mut ctx.physics)?;
            if let Err(err) = hooked {
                log::warn!("before_die of {id} failed: {err}");
                return Err(err);
            }
        }
        Ok(())
    }

    /// Drop every entity and body. No `before_die` hooks run.
    pub fn clear(&mut self, physics: &mut Physics) -> Result<()> {
        for ent in &self.ents {
            if let Some(body) = ent.core().body {
                release_body(physics, body)?;
            }
        }
        for ent in &mut self.ents {
            let core = ent.core_mut();
            core.reg = Registration::Retired;
            core.body = None;
        }
        self.ents.clear();
        self.index.clear();
        self.dying.clear();
        self.zmap.clear();
        Ok(())
    }

    /// Live entities alongside the death queue, for building a [`Frame`].
    pub(crate) fn split(&mut self) -> (&mut Ents, Deaths<'_>) {
        (
            &mut self.ents,
            Deaths {
                index: &self.index,
                dying: &mut self.dying,
            },
        )
    }

    fn deaths(&mut self) -> Deaths<'_> {
        self.split().1
    }

    pub fn get(&self, id: EntityId) -> Option<&dyn Entity> {
        self.index.slot(id).map(|slot| self.ents[slot].as_ref())
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut (dyn Entity + 'static)> {
        let slot = self.index.slot(id)?;
        Some(self.ents[slot].as_mut())
    }

    pub fn slot_of(&self, id: EntityId) -> Option<usize> {
        self.index.slot(id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.index.is_alive(id)
    }

    pub fn len(&self) -> usize {
        self.ents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ents.is_empty()
    }

    /// Live entities in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Entity> + '_ {
        self.ents.iter().map(|e| e.as_ref())
    }

    pub fn pending_deaths(&self) -> &[EntityId] {
        &self.dying
    }

    pub fn zmap(&self) -> &ZMap<EntityId> {
        &self.zmap
    }
}

/// Destroy an owned body. A body the game already destroyed is skipped.
fn release_body(physics: &mut Physics, body: BodyHandle) -> Result<()> {
    match physics.destroy_body(body) {
        Err(EngineError::UnknownBody) => Ok(()),
        other => other,
    }
}
