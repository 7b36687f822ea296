//! Contact dispatch: routes physics contact events to the owning entities.
//!
//! Each fixture's owner is read from its user data. Both owners get the
//! callback with the other one as `other`, side A first. A side with no
//! live owner is skipped. Two fixtures of the same entity are delivered with
//! `other = None`.

use ballpit_core::error::Result;

use crate::ecs::{Ecs, Ents};
use crate::engine::{Context, Frame};
use crate::entity::Entity;
use crate::physics::{Contact, ContactEvent, FixtureHandle};

pub(crate) fn dispatch(ctx: &mut Context, ecs: &mut Ecs, events: &[ContactEvent]) -> Result<()> {
    for event in events {
        let contact = event.contact();
        let a = owner_slot(ctx, ecs, contact.this_fixture);
        let b = owner_slot(ctx, ecs, contact.other_fixture);
        if a.is_none() && b.is_none() {
            continue;
        }
        let (ents, deaths) = ecs.split();
        let mut frame = Frame::new(ctx, deaths);
        if let Some(a) = a {
            deliver(ents, &mut frame, event, contact, a, b)?;
        }
        if let Some(b) = b {
            deliver(ents, &mut frame, event, &contact.swapped(), b, a)?;
        }
    }
    Ok(())
}

fn owner_slot(ctx: &Context, ecs: &Ecs, fixture: FixtureHandle) -> Option<usize> {
    let slot = ctx
        .physics
        .fixture_owner(fixture)
        .and_then(|id| ecs.slot_of(id));
    if slot.is_none() {
        log::trace!("contact fixture {fixture:?} has no live owner");
    }
    slot
}

fn deliver(
    ents: &mut Ents,
    frame: &mut Frame,
    event: &ContactEvent,
    contact: &Contact,
    this: usize,
    other: Option<usize>,
) -> Result<()> {
    let (ent, other) = pair_mut(ents, this, other);
    match event {
        ContactEvent::Begin(_) => ent.begin_contact(frame, contact, other),
        ContactEvent::End(_) => ent.end_contact(frame, contact, other),
        ContactEvent::PreSolve(_, manifold) => ent.pre_solve(frame, contact, manifold, other),
        ContactEvent::PostSolve(_, impulse) => ent.post_solve(frame, contact, impulse, other),
    }
}

/// Borrow the entity at `this` together with a distinct `other`.
fn pair_mut(
    ents: &mut Ents,
    this: usize,
    other: Option<usize>,
) -> (&mut dyn Entity, Option<&mut dyn Entity>) {
    match other {
        Some(o) if o != this => {
            let (ent, other): (&mut dyn Entity, &mut dyn Entity) = if this < o {
                let (head, tail) = ents.split_at_mut(o);
                (head[this].as_mut(), tail[0].as_mut())
            } else {
                let (head, tail) = ents.split_at_mut(this);
                (tail[0].as_mut(), head[o].as_mut())
            };
            (ent, Some(other))
        }
        _ => {
            let ent: &mut dyn Entity = ents[this].as_mut();
            (ent, None)
        }
    }
}
