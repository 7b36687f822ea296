//! Tests for the registry, the frame pipeline and contact dispatch.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;

use ballpit_core::canvas::{Canvas, CanvasExt, DrawCommand, RecordingCanvas};
use ballpit_core::commands::InputEvent;
use ballpit_core::config::EngineConfig;
use ballpit_core::enums::RunState;
use ballpit_core::error::{EngineError, Result};
use ballpit_core::types::EntityId;

use crate::ecs::Ecs;
use crate::engine::{Context, Engine, Frame, FrameOutcome};
use crate::entity::{Entity, EntityCore, Registration};
use crate::physics::{BodyDef, Contact, ContactImpulse, FixtureDef, Manifold, Physics};

type Log = Rc<RefCell<Vec<String>>>;

struct Tracer {
    core: EntityCore,
    name: &'static str,
    log: Log,
    victim: Option<EntityId>,
    spawn_on_contact: bool,
    kill_other_on_contact: bool,
    fail_before_die: bool,
}

impl Tracer {
    fn new(name: &'static str, log: &Log) -> Self {
        Self {
            core: EntityCore::new(),
            name,
            log: Rc::clone(log),
            victim: None,
            spawn_on_contact: false,
            kill_other_on_contact: false,
            fail_before_die: false,
        }
    }

    fn ball(engine: &mut Engine, name: &'static str, x: f32, log: &Log) -> Self {
        let body = engine
            .body(&BodyDef {
                position: Vec2::new(x, 0.0),
                ..BodyDef::default()
            })
            .unwrap();
        engine.fixture(body, &FixtureDef::circle(0.5)).unwrap();
        Self {
            core: EntityCore::with_body(body),
            ..Self::new(name, log)
        }
    }

    fn record(&self, line: String) {
        self.log.borrow_mut().push(line);
    }
}

impl Entity for Tracer {
    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EntityCore {
        &mut self.core
    }

    fn update(&mut self, _frame: &mut Frame, _step: f64) -> Result<()> {
        self.record(format!("update {}", self.name));
        Ok(())
    }

    fn render(&self, canvas: &mut dyn Canvas, ctx: &Context) {
        let pos = self
            .core
            .body
            .and_then(|b| ctx.physics.position(b))
            .unwrap_or(Vec2::ZERO);
        canvas.fill_circle(pos, 0.5, None);
    }

    fn before_die(&mut self, frame: &mut Frame) -> Result<()> {
        self.record(format!("before_die {}", self.name));
        if let Some(victim) = self.victim {
            frame.kill(victim);
        }
        if self.fail_before_die {
            return Err(EngineError::UnknownBody);
        }
        Ok(())
    }

    fn begin_contact(
        &mut self,
        frame: &mut Frame,
        _contact: &Contact,
        other: Option<&mut dyn Entity>,
    ) -> Result<()> {
        let other_id = other.as_ref().and_then(|o| o.core().id());
        self.record(format!("begin {} {:?}", self.name, other_id));
        if self.spawn_on_contact {
            frame.physics.create_body(&BodyDef::default())?;
        }
        if self.kill_other_on_contact {
            if let Some(other) = other {
                other.die(frame);
            }
        }
        Ok(())
    }

    fn end_contact(
        &mut self,
        _frame: &mut Frame,
        _contact: &Contact,
        other: Option<&mut dyn Entity>,
    ) -> Result<()> {
        self.record(format!("end {} {:?}", self.name, other.and_then(|o| o.core().id())));
        Ok(())
    }

    fn pre_solve(
        &mut self,
        _frame: &mut Frame,
        _contact: &Contact,
        manifold: &Manifold,
        other: Option<&mut dyn Entity>,
    ) -> Result<()> {
        assert!(!manifold.points.is_empty());
        self.record(format!("pre {} {:?}", self.name, other.and_then(|o| o.core().id())));
        Ok(())
    }

    fn post_solve(
        &mut self,
        _frame: &mut Frame,
        _contact: &Contact,
        impulse: &ContactImpulse,
        other: Option<&mut dyn Entity>,
    ) -> Result<()> {
        assert!(impulse.magnitude >= 0.0);
        self.record(format!("post {} {:?}", self.name, other.and_then(|o| o.core().id())));
        Ok(())
    }
}

fn engine_with(config: EngineConfig) -> (Engine, RecordingCanvas) {
    let canvas = RecordingCanvas::new(800.0, 600.0);
    let surface = canvas.share();
    let engine = Engine::new(config, Some(Box::new(canvas))).unwrap();
    (engine, surface)
}

fn engine() -> (Engine, RecordingCanvas) {
    engine_with(EngineConfig::default())
}

fn lines(log: &Log, prefix: &str) -> Vec<String> {
    log.borrow()
        .iter()
        .filter(|l| l.starts_with(prefix))
        .cloned()
        .collect()
}

fn assert_slots_consistent(ecs: &Ecs) {
    for (slot, ent) in ecs.iter().enumerate() {
        assert_eq!(ent.core().slot(), Some(slot));
        let id = ent.core().id().unwrap();
        assert_eq!(ecs.slot_of(id), Some(slot));
        assert!(ecs.zmap().bucket(ent.core().z).contains(&id));
    }
}

// ---- Registry ----

#[test]
fn test_swap_remove_updates_moved_slot() {
    let mut physics = Physics::default();
    let mut ecs = Ecs::new();
    let log = Log::default();
    let a = ecs.add(Box::new(Tracer::new("a", &log)), &mut physics);
    let b = ecs.add(Box::new(Tracer::new("b", &log)), &mut physics);
    let c = ecs.add(Box::new(Tracer::new("c", &log)), &mut physics);

    let removed = ecs.remove(a, &mut physics).unwrap();
    assert_eq!(removed.core().registration(), Registration::Retired);
    assert_eq!(ecs.len(), 2);
    assert_eq!(ecs.slot_of(c), Some(0));
    assert_eq!(ecs.slot_of(b), Some(1));
    assert!(ecs.get(a).is_none());
    assert!(!ecs.zmap().bucket(0).contains(&a));
    assert_slots_consistent(&ecs);

    ecs.remove(b, &mut physics).unwrap();
    assert_eq!(ecs.slot_of(c), Some(0));
    assert_slots_consistent(&ecs);
}

#[test]
fn test_stale_id_does_not_resolve_after_reuse() {
    let mut physics = Physics::default();
    let mut ecs = Ecs::new();
    let log = Log::default();
    let a = ecs.add(Box::new(Tracer::new("a", &log)), &mut physics);
    ecs.remove(a, &mut physics).unwrap();
    let reused = ecs.add(Box::new(Tracer::new("b", &log)), &mut physics);
    assert_eq!(reused.index, a.index);
    assert_ne!(reused, a);
    assert!(!ecs.contains(a));
    assert!(ecs.contains(reused));
}

#[test]
#[should_panic]
fn test_re_adding_retired_entity_panics() {
    let mut physics = Physics::default();
    let mut ecs = Ecs::new();
    let log = Log::default();
    let a = ecs.add(Box::new(Tracer::new("a", &log)), &mut physics);
    let removed = ecs.remove(a, &mut physics).unwrap();
    ecs.add(removed, &mut physics);
}

#[test]
#[should_panic]
fn test_removing_unregistered_entity_panics() {
    let mut physics = Physics::default();
    let mut ecs = Ecs::new();
    let log = Log::default();
    let a = ecs.add(Box::new(Tracer::new("a", &log)), &mut physics);
    ecs.remove(a, &mut physics).unwrap();
    let _ = ecs.remove(a, &mut physics);
}

#[test]
fn test_remove_destroys_body() {
    let (mut engine, _) = engine();
    let log = Log::default();
    let tracer = Tracer::ball(&mut engine, "a", 0.0, &log);
    let body = tracer.core.body.unwrap();
    let id = engine.add(tracer);
    assert_eq!(engine.ctx.physics.body_owner(body), Some(id));
    assert_eq!(engine.stats().bodies, 2);
    engine.ecs.remove(id, &mut engine.ctx.physics).unwrap();
    assert!(!engine.ctx.physics.contains_body(body));
    assert_eq!(engine.stats().bodies, 1);
}

#[test]
fn test_clear_invalidates_ids_and_bodies() {
    let (mut engine, _) = engine();
    let log = Log::default();
    let a = Tracer::ball(&mut engine, "a", 0.0, &log);
    let a = engine.add(a);
    let b = Tracer::ball(&mut engine, "b", 3.0, &log);
    let b = engine.add(b);
    engine.die(a);
    engine.clear().unwrap();
    assert!(engine.ecs.is_empty());
    assert!(engine.ecs.pending_deaths().is_empty());
    assert!(engine.ecs.get(a).is_none());
    assert!(engine.ecs.get(b).is_none());
    assert!(engine.ecs.zmap().is_empty());
    assert_eq!(engine.ctx.physics.body_count(), 1);
    assert!(log.borrow().iter().all(|l| !l.starts_with("before_die")));
}

// ---- Death ----

#[test]
fn test_two_phase_death() {
    let (mut engine, _) = engine();
    let log = Log::default();
    let _a = engine.add(Tracer::new("a", &log));
    let b = engine.add(Tracer::new("b", &log));
    let c = engine.add(Tracer::new("c", &log));

    assert!(engine.die(b));
    assert!(engine.die(b));
    assert_eq!(engine.ecs.len(), 3);
    assert_eq!(engine.ecs.pending_deaths(), &[b]);
    assert!(engine.ecs.get(b).unwrap().core().dead);

    engine.frame(16.0).unwrap();
    assert_eq!(engine.ecs.len(), 2);
    assert!(engine.ecs.pending_deaths().is_empty());
    assert_eq!(lines(&log, "before_die"), vec!["before_die b"]);
    assert_eq!(engine.ecs.slot_of(c), Some(1));
    assert!(!engine.die(b));
    assert_slots_consistent(&engine.ecs);
}

#[test]
fn test_before_die_deaths_are_reaped_in_same_pass() {
    let (mut engine, _) = engine();
    let log = Log::default();
    let c = engine.add(Tracer::new("c", &log));
    let _b = engine.add(Tracer::new("b", &log));
    let mut a = Tracer::new("a", &log);
    a.victim = Some(c);
    let a = engine.add(a);

    engine.die(a);
    engine.frame(16.0).unwrap();
    assert_eq!(lines(&log, "before_die"), vec!["before_die a", "before_die c"]);
    assert_eq!(engine.ecs.len(), 1);
    assert!(engine.ecs.pending_deaths().is_empty());
}

#[test]
fn test_die_at_expires_entity() {
    let (mut engine, _) = engine();
    let log = Log::default();
    let mut p = Tracer::new("p", &log);
    p.core = EntityCore::new().die_at(0.02);
    engine.add(p);

    engine.frame(16.0).unwrap();
    assert_eq!(engine.ecs.len(), 1);
    engine.frame(33.0).unwrap();
    assert_eq!(engine.ecs.len(), 0);
    assert_eq!(lines(&log, "update"), vec!["update p"]);
    assert_eq!(lines(&log, "before_die"), vec!["before_die p"]);
}

#[test]
fn test_failing_before_die_still_removes_once() {
    let (mut engine, _) = engine();
    let log = Log::default();
    let mut x = Tracer::new("x", &log);
    x.fail_before_die = true;
    let x = engine.add(x);
    let z = engine.add(Tracer::new("z", &log));
    engine.add(Tracer::new("y", &log));

    engine.die(x);
    engine.die(z);
    let err = engine.frame(16.0).unwrap_err();
    assert!(matches!(err, EngineError::UnknownBody));
    assert!(!engine.ecs.contains(x));
    assert_eq!(engine.ecs.pending_deaths(), &[z]);

    engine.frame(32.0).unwrap();
    assert_eq!(lines(&log, "before_die"), vec!["before_die x", "before_die z"]);
    assert_eq!(engine.ecs.len(), 1);
    assert!(engine.ecs.pending_deaths().is_empty());
    assert_slots_consistent(&engine.ecs);
}

// ---- Frame timing ----

#[test]
fn test_long_gap_is_clamped() {
    let (mut engine, _) = engine();
    let outcome = engine.frame(1000.0).unwrap();
    let FrameOutcome::Stepped { step } = outcome else {
        panic!("expected a step, got {outcome:?}");
    };
    assert!((step - 1.0 / 30.0).abs() < 1e-12);
    assert!((engine.time() - 1.0 / 30.0).abs() < 1e-12);
}

#[test]
fn test_time_scale_applies_after_clamp() {
    let (mut engine, _) = engine_with(EngineConfig {
        time_scale: 0.5,
        ..EngineConfig::default()
    });
    engine.frame(1000.0).unwrap();
    assert!((engine.time() - 1.0 / 60.0).abs() < 1e-12);
}

#[test]
fn test_zero_step_skips_frame() {
    let (mut engine, canvas) = engine();
    let log = Log::default();
    engine.add(Tracer::new("p", &log));
    engine.frame(16.0).unwrap();
    let time = engine.time();
    canvas.clear();

    assert_eq!(engine.frame(16.0).unwrap(), FrameOutcome::ZeroStep);
    assert_eq!(engine.time(), time);
    assert!(canvas.is_empty());
    assert_eq!(lines(&log, "update").len(), 1);
}

#[test]
fn test_pause_and_single_step() {
    let (mut engine, _) = engine();
    engine.set_paused(true);
    assert_eq!(engine.frame(16.0).unwrap(), FrameOutcome::Paused);
    assert_eq!(engine.time(), 0.0);
    assert_eq!(engine.stats().frames, 0);

    engine.request_step();
    assert!(matches!(engine.frame(32.0).unwrap(), FrameOutcome::Stepped { .. }));
    assert!((engine.time() - 0.032).abs() < 1e-9);
    assert_eq!(engine.frame(48.0).unwrap(), FrameOutcome::Paused);

    engine.toggle_pause();
    assert_eq!(engine.state(), RunState::Running);
    assert!(matches!(engine.frame(48.0).unwrap(), FrameOutcome::Stepped { .. }));
}

#[test]
fn test_missing_surface_is_an_error() {
    let err = Engine::new(EngineConfig::default(), None).err().unwrap();
    assert!(matches!(err, EngineError::NoSurface));
}

// ---- Rendering ----

#[test]
fn test_layers_render_far_to_near() {
    let (mut engine, canvas) = engine();
    let log = Log::default();
    engine.add(Tracer::new("near", &log));
    let mut far = Tracer::new("far", &log);
    far.core = EntityCore::new().z(5);
    engine.add(far);
    engine.add(Tracer::new("near2", &log));

    engine.frame(16.0).unwrap();
    assert_eq!(canvas.filled_circles(), 3);
    let scales: Vec<f32> = canvas
        .snapshot()
        .commands
        .iter()
        .filter_map(|c| match c {
            DrawCommand::Scale { x, .. } => Some(*x),
            _ => None,
        })
        .collect();
    assert_eq!(scales.len(), 2);
    assert!((scales[0] - 30.0 * 30.0 / 35.0).abs() < 1e-3);
    assert!((scales[1] - 30.0).abs() < 1e-3);
}

#[test]
fn test_debug_overlay_prints_stats() {
    let (mut engine, canvas) = engine();
    let log = Log::default();
    for (i, name) in ["a", "b", "c"].into_iter().enumerate() {
        let p = Tracer::ball(&mut engine, name, i as f32 * 3.0, &log);
        engine.add(p);
    }
    engine.frame(16.0).unwrap();
    assert!(canvas.texts().is_empty());

    engine.toggle_render_world();
    engine.ctx.debug_lines.push("hello".to_string());
    engine.frame(32.0).unwrap();
    let texts = canvas.texts();
    assert!(texts.iter().any(|t| t.ends_with("ents: 3, bodies: 4")));
    assert!(texts.iter().any(|t| t == "hello"));
}

// ---- Contacts ----

#[test]
fn test_contact_delivered_to_both_sides() {
    let (mut engine, _) = engine();
    let log = Log::default();
    let a = Tracer::ball(&mut engine, "a", 0.0, &log);
    let a = engine.add(a);
    let b = Tracer::ball(&mut engine, "b", 0.8, &log);
    let b = engine.add(b);

    engine.frame(16.0).unwrap();
    let begins = lines(&log, "begin");
    assert_eq!(begins.len(), 2);
    assert!(begins.contains(&format!("begin a {:?}", Some(b))));
    assert!(begins.contains(&format!("begin b {:?}", Some(a))));
}

#[test]
fn test_contact_with_unowned_fixture_skips_that_side() {
    let (mut engine, _) = engine();
    let log = Log::default();
    let a = Tracer::ball(&mut engine, "a", 0.0, &log);
    engine.add(a);
    let loose = engine
        .body(&BodyDef {
            position: Vec2::new(0.8, 0.0),
            ..BodyDef::default()
        })
        .unwrap();
    engine.fixture(loose, &FixtureDef::circle(0.5)).unwrap();

    engine.frame(16.0).unwrap();
    assert_eq!(lines(&log, "begin"), vec!["begin a None"]);
}

#[test]
fn test_body_creation_inside_contact_fails_frame() {
    let (mut engine, _) = engine();
    let log = Log::default();
    let mut a = Tracer::ball(&mut engine, "a", 0.0, &log);
    a.spawn_on_contact = true;
    engine.add(a);
    let b = Tracer::ball(&mut engine, "b", 0.8, &log);
    engine.add(b);
    let bodies = engine.ctx.physics.body_count();

    let err = engine.frame(16.0).unwrap_err();
    assert!(matches!(err, EngineError::StepInProgress("body")));
    assert!(!engine.ctx.physics.is_stepping());
    assert_eq!(engine.ctx.physics.body_count(), bodies);
}

#[test]
fn test_contact_can_kill_other() {
    let (mut engine, _) = engine();
    let log = Log::default();
    let mut a = Tracer::ball(&mut engine, "a", 0.0, &log);
    a.kill_other_on_contact = true;
    let a = engine.add(a);
    let b = Tracer::ball(&mut engine, "b", 0.8, &log);
    let b = engine.add(b);

    engine.frame(16.0).unwrap();
    assert!(engine.ecs.contains(a));
    assert!(!engine.ecs.contains(b));
    assert_eq!(lines(&log, "before_die"), vec!["before_die b"]);
}

/// Rank of a contact log line in the per-frame dispatch order.
fn contact_rank(line: &str) -> Option<usize> {
    ["begin", "pre", "post", "end"]
        .iter()
        .position(|kind| line.starts_with(kind))
}

#[test]
fn test_contact_phases_are_symmetric_and_ordered() {
    let (mut engine, _) = engine();
    let log = Log::default();
    let a = Tracer::ball(&mut engine, "a", 0.0, &log);
    let a = engine.add(a);
    let b = Tracer::ball(&mut engine, "b", 0.8, &log);
    let b = engine.add(b);

    let mut seen = Vec::new();
    for frame in 1..=30 {
        log.borrow_mut().clear();
        engine.frame(frame as f64 * 16.0).unwrap();
        let events: Vec<String> = log
            .borrow()
            .iter()
            .filter(|l| contact_rank(l).is_some())
            .cloned()
            .collect();
        let ranks: Vec<usize> = events.iter().filter_map(|l| contact_rank(l)).collect();
        assert!(ranks.windows(2).all(|w| w[0] <= w[1]), "out of order: {events:?}");
        seen.extend(events);
    }
    for kind in ["begin", "pre", "post"] {
        let a_side = format!("{kind} a {:?}", Some(b));
        let b_side = format!("{kind} b {:?}", Some(a));
        assert!(seen.contains(&a_side), "missing {a_side}");
        assert!(seen.contains(&b_side), "missing {b_side}");
    }
}

#[test]
fn test_separating_pair_ends_on_both_sides() {
    let (mut engine, _) = engine();
    let log = Log::default();
    let a = Tracer::ball(&mut engine, "a", 0.0, &log);
    let a_body = a.core.body.unwrap();
    let a = engine.add(a);
    let b = Tracer::ball(&mut engine, "b", 0.8, &log);
    let b_body = b.core.body.unwrap();
    let b = engine.add(b);
    engine.ctx.physics.set_velocity(a_body, Vec2::new(-5.0, 0.0)).unwrap();
    engine.ctx.physics.set_velocity(b_body, Vec2::new(5.0, 0.0)).unwrap();

    for frame in 1..=30 {
        engine.frame(frame as f64 * 16.0).unwrap();
    }
    let ends = lines(&log, "end");
    assert_eq!(ends.len(), 2);
    assert!(ends.contains(&format!("end a {:?}", Some(b))));
    assert!(ends.contains(&format!("end b {:?}", Some(a))));

    let all = log.borrow();
    let last_begin = all.iter().rposition(|l| l.starts_with("begin")).unwrap();
    let first_end = all.iter().position(|l| l.starts_with("end")).unwrap();
    assert!(last_begin < first_end);
}

#[test]
fn test_fixtures_of_same_entity_get_no_other() {
    let (mut engine, _) = engine();
    let log = Log::default();
    let a = Tracer::ball(&mut engine, "a", 0.0, &log);
    let a = engine.add(a);
    let second = engine
        .body(&BodyDef {
            position: Vec2::new(0.8, 0.0),
            ..BodyDef::default()
        })
        .unwrap();
    engine.fixture(second, &FixtureDef::circle(0.5)).unwrap();
    engine.ctx.physics.set_owner(second, Some(a));

    engine.frame(16.0).unwrap();
    assert_eq!(lines(&log, "begin"), vec!["begin a None", "begin a None"]);
}

// ---- Scheduler & input ----

#[test]
fn test_delayed_action_fires_on_time() {
    let (mut engine, _) = engine();
    let fired = Rc::new(RefCell::new(Vec::new()));
    let f = Rc::clone(&fired);
    engine.delay(0.02, move |engine| {
        f.borrow_mut().push("delayed");
        let f = Rc::clone(&f);
        engine.defer(move |_| {
            f.borrow_mut().push("deferred");
            Ok(())
        });
        Ok(())
    });

    engine.frame(16.0).unwrap();
    assert!(fired.borrow().is_empty());
    engine.frame(33.0).unwrap();
    assert_eq!(*fired.borrow(), vec!["delayed", "deferred"]);
    assert_eq!(engine.stats().scheduled, 0);
}

#[test]
fn test_deferred_action_can_create_bodies() {
    let (mut engine, _) = engine();
    let log = Log::default();
    let spawn_log = Rc::clone(&log);
    engine.defer(move |engine| {
        let p = Tracer::ball(engine, "spawned", 10.0, &spawn_log);
        engine.add(p);
        Ok(())
    });
    engine.frame(16.0).unwrap();
    assert_eq!(engine.ecs.len(), 1);
    assert_eq!(engine.stats().bodies, 2);

    // Spawned after the update pass, so first updated next frame.
    assert!(lines(&log, "update").is_empty());
    engine.frame(32.0).unwrap();
    assert_eq!(lines(&log, "update"), vec!["update spawned"]);
}

#[test]
fn test_key_handlers_fire_in_order() {
    let (mut engine, _) = engine();
    let order = Rc::new(RefCell::new(Vec::new()));
    let first = Rc::clone(&order);
    engine.on_key_down("KeyP", move |engine| {
        first.borrow_mut().push(1);
        engine.toggle_pause();
        Ok(())
    });
    let second = Rc::clone(&order);
    engine.on_key_down("KeyP", move |_| {
        second.borrow_mut().push(2);
        Ok(())
    });

    engine.handle_input(&mut (), &InputEvent::key_down("KeyP")).unwrap();
    assert_eq!(*order.borrow(), vec![1, 2]);
    assert_eq!(engine.state(), RunState::Paused);
    assert!(engine.input().key("KeyP"));

    engine.handle_input(&mut (), &InputEvent::key_down("KeyX")).unwrap();
    assert_eq!(order.borrow().len(), 2);
}

#[test]
fn test_resize_updates_surface_and_input() {
    let (mut engine, canvas) = engine();
    engine
        .handle_input(&mut (), &InputEvent::Resize { width: 1024.0, height: 768.0 })
        .unwrap();
    assert_eq!(canvas.width(), 1024.0);
    assert_eq!(engine.input().screen_height, 768.0);
}

#[test]
fn test_key_edges_rotate_after_frame() {
    let (mut engine, _) = engine();
    engine.handle_input(&mut (), &InputEvent::key_down("Space")).unwrap();
    assert!(engine.input().key_just_pressed("Space"));
    engine.frame(16.0).unwrap();
    assert!(!engine.input().key_just_pressed("Space"));
    assert!(engine.input().key("Space"));
}
