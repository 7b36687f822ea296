//! Simulation engine: the per-frame update and render pipeline.
//!
//! `Engine` owns the physics world, the entity registry, the camera, the
//! input snapshot, the scheduler and the drawing surface. The platform
//! calls [`Engine::run_frame`] once per display refresh with a timestamp
//! in milliseconds, and [`Engine::handle_input`] for every input event.
//! Completely headless when given a [`RecordingCanvas`].
//!
//! [`RecordingCanvas`]: ballpit_core::canvas::RecordingCanvas

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use ballpit_core::camera::Camera;
use ballpit_core::canvas::Canvas;
use ballpit_core::commands::InputEvent;
use ballpit_core::config::EngineConfig;
use ballpit_core::constants::FPS_INTERVAL_MS;
use ballpit_core::enums::RunState;
use ballpit_core::error::{EngineError, Result};
use ballpit_core::input::Input;
use ballpit_core::scheduler::Scheduler;
use ballpit_core::state::Stats;
use ballpit_core::types::EntityId;

use crate::contact;
use crate::debug;
use crate::ecs::{Deaths, Ecs};
use crate::entity::{Entity, EntityCore};
use crate::physics::{BodyDef, BodyHandle, DistanceJointDef, FixtureDef, FixtureHandle, JointHandle, Physics};

/// One-shot scheduled work. Runs with full engine access.
pub type Action = Box<dyn FnOnce(&mut Engine) -> Result<()>>;

/// Callback bound to a key code.
pub type KeyHandler = Box<dyn FnMut(&mut Engine) -> Result<()>>;

/// Engine state reachable from entity hooks.
pub struct Context {
    pub physics: Physics,
    pub scheduler: Scheduler<Action>,
    pub camera: Camera,
    pub input: Input,
    pub rng: ChaCha8Rng,
    /// Accumulated simulation time in seconds.
    pub time: f64,
    /// Extra lines printed by the debug overlay.
    pub debug_lines: Vec<String>,
}

impl Context {
    /// Run `action` at the first flush with simulation time `>= time`.
    pub fn schedule(&mut self, time: f64, action: impl FnOnce(&mut Engine) -> Result<()> + 'static) {
        self.scheduler.schedule(time, Box::new(action));
    }

    /// Run `action` at the end of the current (or next) update pass, after
    /// the world step has finished.
    pub fn defer(&mut self, action: impl FnOnce(&mut Engine) -> Result<()> + 'static) {
        self.schedule(0.0, action);
    }

    pub fn delay(&mut self, secs: f64, action: impl FnOnce(&mut Engine) -> Result<()> + 'static) {
        self.schedule(self.time + secs, action);
    }

    pub fn elapsed_from(&self, time: f64) -> f64 {
        self.time - time
    }
}

/// Per-call view handed to entity hooks: the engine context plus the
/// pending-death queue.
pub struct Frame<'a> {
    ctx: &'a mut Context,
    deaths: Deaths<'a>,
}

impl<'a> Frame<'a> {
    pub(crate) fn new(ctx: &'a mut Context, deaths: Deaths<'a>) -> Self {
        Self { ctx, deaths }
    }

    /// Queue a registered entity for removal.
    pub fn mark_dying(&mut self, core: &EntityCore) {
        let id = core
            .id()
            .unwrap_or_else(|| panic!("dying entity is not registered: {:?}", core.registration()));
        if !self.deaths.is_pending(id) {
            self.deaths.push(id);
        }
    }

    /// Queue another entity for removal by id. Returns `false` when the id
    /// is stale or already queued.
    pub fn kill(&mut self, id: EntityId) -> bool {
        if self.deaths.slot_of(id).is_none() || self.deaths.is_pending(id) {
            return false;
        }
        self.deaths.push(id);
        true
    }

    pub fn is_live(&self, id: EntityId) -> bool {
        self.deaths.slot_of(id).is_some()
    }
}

impl Deref for Frame<'_> {
    type Target = Context;

    fn deref(&self) -> &Context {
        self.ctx
    }
}

impl DerefMut for Frame<'_> {
    fn deref_mut(&mut self) -> &mut Context {
        self.ctx
    }
}

/// What a call to [`Engine::run_frame`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    /// Paused with no step requested. Nothing changed.
    Paused,
    /// The clamped, scaled step was zero.
    ZeroStep,
    Stepped { step: f64 },
}

/// Game-level extension points around the frame pipeline.
pub trait Hooks {
    /// Runs once per stepped frame, after the world step and before any
    /// entity update.
    fn update(&mut self, _engine: &mut Engine, _step: f64) -> Result<()> {
        Ok(())
    }

    /// Frame entry point. Overrides usually wrap the default.
    fn render(&mut self, engine: &mut Engine, time_ms: f64) -> Result<FrameOutcome> {
        engine.run_frame(self, time_ms)
    }

    /// Secondary (hardware) render pass, only when enabled in the config.
    fn gl_render(&mut self, _engine: &mut Engine) -> Result<()> {
        Ok(())
    }

    fn on_resize(&mut self, _engine: &mut Engine) -> Result<()> {
        Ok(())
    }
}

impl Hooks for () {}

pub struct Engine {
    pub ctx: Context,
    pub ecs: Ecs,
    canvas: Box<dyn Canvas>,
    config: EngineConfig,
    pub background: String,
    state: RunState,
    step_requested: bool,
    pub render_world: bool,
    pub secondary_render: bool,
    last_update_ms: f64,
    frames: u64,
    fps: f64,
    fps_frames: u64,
    fps_since_ms: Option<f64>,
    key_handlers: HashMap<String, Vec<KeyHandler>>,
}

impl Engine {
    /// Create an engine drawing on `canvas`. Fails with
    /// [`EngineError::NoSurface`] when no surface is given.
    pub fn new(config: EngineConfig, canvas: Option<Box<dyn Canvas>>) -> Result<Self> {
        config.validate()?;
        let canvas = canvas.ok_or(EngineError::NoSurface)?;
        let ctx = Context {
            physics: Physics::new(config.gravity),
            scheduler: Scheduler::new(),
            camera: Camera::from_config(&config.camera, config.seed.wrapping_add(1)),
            input: Input::new(canvas.width(), canvas.height()),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            time: 0.0,
            debug_lines: Vec::new(),
        };
        log::info!(
            "engine started: surface {}x{}, seed {}, max step {:.4}s",
            canvas.width(),
            canvas.height(),
            config.seed,
            config.max_step_sec
        );
        Ok(Self {
            ctx,
            ecs: Ecs::new(),
            canvas,
            background: config.background.clone(),
            state: RunState::Running,
            step_requested: false,
            render_world: config.render_world,
            secondary_render: config.secondary_render,
            config,
            last_update_ms: 0.0,
            frames: 0,
            fps: 0.0,
            fps_frames: 0,
            fps_since_ms: None,
            key_handlers: HashMap::new(),
        })
    }

    /// Run one frame at platform time `time_ms`.
    pub fn run_frame<H: Hooks + ?Sized>(&mut self, hooks: &mut H, time_ms: f64) -> Result<FrameOutcome> {
        if self.state == RunState::Paused {
            if !self.step_requested {
                return Ok(FrameOutcome::Paused);
            }
            self.step_requested = false;
        }

        self.frames += 1;
        self.update_fps(time_ms);
        let raw = (time_ms - self.last_update_ms) / 1000.0;
        let step = raw.min(self.config.max_step_sec) * self.config.time_scale;

        let outcome = if step > 0.0 {
            self.advance(hooks, step)?;
            FrameOutcome::Stepped { step }
        } else {
            log::debug!("zero step at {time_ms}ms, skipping frame");
            FrameOutcome::ZeroStep
        };

        self.last_update_ms = time_ms;
        self.ctx.input.end_frame();
        Ok(outcome)
    }

    /// Frame without game hooks.
    pub fn frame(&mut self, time_ms: f64) -> Result<FrameOutcome> {
        self.run_frame(&mut (), time_ms)
    }

    fn advance<H: Hooks + ?Sized>(&mut self, hooks: &mut H, step: f64) -> Result<()> {
        log::trace!("frame {} step {step:.4}s", self.frames);
        self.clear_screen();

        self.ctx.physics.begin_step();
        let events = self.ctx.physics.step(step);
        let dispatched = contact::dispatch(&mut self.ctx, &mut self.ecs, &events);
        self.ctx.physics.end_step();
        dispatched?;

        self.ctx.time += step;
        hooks.update(self, step)?;
        self.update_entities(step)?;

        if self.secondary_render {
            self.ctx.camera.update(self.canvas.as_mut(), step, 0);
            hooks.gl_render(self)?;
        }

        self.ecs.let_die(&mut self.ctx)?;
        self.render_layers(step);
        self.flush_scheduler()?;

        if self.render_world {
            debug::render_world(self.canvas.as_mut(), &self.ctx.physics, self.ctx.camera.scale);
            let stats = self.stats();
            debug::print_stats(self.canvas.as_mut(), &stats, &self.ctx.input, &self.ctx.camera);
            debug::print_debug_lines(self.canvas.as_mut(), &self.ctx.debug_lines);
        }
        Ok(())
    }

    fn update_fps(&mut self, time_ms: f64) {
        self.fps_frames += 1;
        let since = *self.fps_since_ms.get_or_insert(time_ms);
        let elapsed = time_ms - since;
        if elapsed >= FPS_INTERVAL_MS {
            self.fps = self.fps_frames as f64 * 1000.0 / elapsed;
            self.fps_frames = 0;
            self.fps_since_ms = Some(time_ms);
        }
    }

    fn clear_screen(&mut self) {
        let (w, h) = (self.canvas.width(), self.canvas.height());
        self.canvas.reset_transform();
        self.canvas.clear_rect(0.0, 0.0, w, h);
        self.canvas.set_fill_style(&self.background);
        self.canvas.fill_rect(0.0, 0.0, w, h);
    }

    fn update_entities(&mut self, step: f64) -> Result<()> {
        for slot in 0..self.ecs.len() {
            let (ents, deaths) = self.ecs.split();
            let mut frame = Frame::new(&mut self.ctx, deaths);
            let ent = &mut ents[slot];
            if frame.time >= ent.core().die_at {
                ent.die(&mut frame);
            } else {
                ent.update(&mut frame, step)?;
            }
        }
        Ok(())
    }

    fn render_layers(&mut self, step: f64) {
        let canvas = self.canvas.as_mut();
        for (z, ids) in self.ecs.zmap().layers() {
            self.ctx.camera.update(canvas, step, z);
            for id in ids {
                if let Some(ent) = self.ecs.get(*id) {
                    ent.render(canvas, &self.ctx);
                }
            }
        }
    }

    fn flush_scheduler(&mut self) -> Result<()> {
        let mut fired = 0;
        while let Some(action) = self.ctx.scheduler.pop_due(self.ctx.time) {
            action(self)?;
            fired += 1;
        }
        if fired > 0 {
            log::debug!("scheduler flushed {fired} actions at t={:.3}", self.ctx.time);
        }
        Ok(())
    }

    /// Apply a platform event to the input snapshot and fire the matching
    /// key handlers or resize hook.
    pub fn handle_input<H: Hooks + ?Sized>(&mut self, hooks: &mut H, event: &InputEvent) -> Result<()> {
        self.ctx.input.apply(event);
        match event {
            InputEvent::KeyDown { code } => self.fire_key_handlers(code),
            InputEvent::Resize { width, height } => {
                log::info!("resize, surface now {width}x{height}");
                self.canvas.resize(*width, *height);
                hooks.on_resize(self)
            }
            _ => Ok(()),
        }
    }

    fn fire_key_handlers(&mut self, code: &str) -> Result<()> {
        let Some(mut handlers) = self.key_handlers.remove(code) else {
            return Ok(());
        };
        let mut result = Ok(());
        for handler in handlers.iter_mut() {
            result = handler(self);
            if result.is_err() {
                break;
            }
        }
        // Handlers registered while firing go after the existing ones.
        if let Some(added) = self.key_handlers.remove(code) {
            handlers.extend(added);
        }
        self.key_handlers.insert(code.to_string(), handlers);
        result
    }

    /// Run `handler` on every key-down of `code`, in registration order.
    pub fn on_key_down(&mut self, code: &str, handler: impl FnMut(&mut Engine) -> Result<()> + 'static) {
        self.key_handlers
            .entry(code.to_string())
            .or_default()
            .push(Box::new(handler));
    }

    // --- Registry ---

    pub fn add<E: Entity + 'static>(&mut self, ent: E) -> EntityId {
        self.add_boxed(Box::new(ent))
    }

    pub fn add_boxed(&mut self, ent: Box<dyn Entity>) -> EntityId {
        self.ecs.add(ent, &mut self.ctx.physics)
    }

    /// Mark an entity dying. Returns `false` for an id that is no longer
    /// registered.
    pub fn die(&mut self, id: EntityId) -> bool {
        let Some(slot) = self.ecs.slot_of(id) else {
            return false;
        };
        let (ents, deaths) = self.ecs.split();
        let mut frame = Frame::new(&mut self.ctx, deaths);
        ents[slot].die(&mut frame);
        true
    }

    /// Remove every entity and body.
    pub fn clear(&mut self) -> Result<()> {
        self.ecs.clear(&mut self.ctx.physics)
    }

    // --- Physics ---

    pub fn body(&mut self, def: &BodyDef) -> Result<BodyHandle> {
        self.ctx.physics.create_body(def)
    }

    pub fn fixture(&mut self, body: BodyHandle, def: &FixtureDef) -> Result<FixtureHandle> {
        self.ctx.physics.create_fixture(body, def)
    }

    pub fn distance_joint(&mut self, def: &DistanceJointDef) -> Result<JointHandle> {
        self.ctx.physics.distance_joint(def)
    }

    // --- Scheduling ---

    pub fn schedule(&mut self, time: f64, action: impl FnOnce(&mut Engine) -> Result<()> + 'static) {
        self.ctx.schedule(time, action);
    }

    pub fn defer(&mut self, action: impl FnOnce(&mut Engine) -> Result<()> + 'static) {
        self.ctx.defer(action);
    }

    pub fn delay(&mut self, secs: f64, action: impl FnOnce(&mut Engine) -> Result<()> + 'static) {
        self.ctx.delay(secs, action);
    }

    pub fn elapsed_from(&self, time: f64) -> f64 {
        self.ctx.elapsed_from(time)
    }

    // --- Run state ---

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.state = if paused { RunState::Paused } else { RunState::Running };
        log::info!("pause: {paused}");
    }

    pub fn toggle_pause(&mut self) {
        self.set_paused(self.state == RunState::Running);
    }

    /// Let exactly one frame through while paused.
    pub fn request_step(&mut self) {
        self.step_requested = true;
        log::info!("single step requested");
    }

    pub fn toggle_render_world(&mut self) {
        self.render_world = !self.render_world;
        log::info!("debug overlay: {}", self.render_world);
    }

    // --- Accessors ---

    pub fn time(&self) -> f64 {
        self.ctx.time
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn canvas(&self) -> &dyn Canvas {
        self.canvas.as_ref()
    }

    pub fn canvas_mut(&mut self) -> &mut dyn Canvas {
        self.canvas.as_mut()
    }

    pub fn camera(&mut self) -> &mut Camera {
        &mut self.ctx.camera
    }

    pub fn input(&self) -> &Input {
        &self.ctx.input
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn stats(&self) -> Stats {
        Stats {
            fps: self.fps,
            frames: self.frames,
            time: self.ctx.time,
            entities: self.ecs.len(),
            bodies: self.ctx.physics.body_count(),
            scheduled: self.ctx.scheduler.len(),
            state: self.state,
        }
    }
}
