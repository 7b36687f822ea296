//! rapier2d world wrapper.
//!
//! [`Physics`] owns every rapier set and exposes the handful of operations
//! the engine and game entities need: body/fixture/joint creation and
//! destruction, stepping, contact events and debug geometry.
//!
//! Creation and destruction are refused with
//! [`EngineError::StepInProgress`] while the step guard is set. The engine
//! sets the guard around the world step and contact dispatch; entities that
//! need to spawn from a contact callback defer the work instead.

use glam::Vec2;
use rapier2d::crossbeam::channel::unbounded;
use rapier2d::prelude::*;

use ballpit_core::constants::RIGID_JOINT_FREQUENCY_HZ;
use ballpit_core::enums::BodyKind;
use ballpit_core::error::{EngineError, Result};
use ballpit_core::types::EntityId;

pub type BodyHandle = RigidBodyHandle;
pub type FixtureHandle = ColliderHandle;
pub type JointHandle = ImpulseJointHandle;

fn to_vector(v: Vec2) -> Vector<Real> {
    vector![v.x, v.y]
}

fn to_point(v: Vec2) -> Point<Real> {
    point![v.x, v.y]
}

fn from_vector(v: &Vector<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

fn from_point(p: &Point<Real>) -> Vec2 {
    Vec2::new(p.x, p.y)
}

/// Body creation parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyDef {
    pub kind: BodyKind,
    pub position: Vec2,
    pub angle: f32,
    pub linear_velocity: Vec2,
    pub angular_velocity: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub fixed_rotation: bool,
    /// Continuous collision detection for fast movers.
    pub bullet: bool,
    pub gravity_scale: f32,
    pub allow_sleep: bool,
    pub awake: bool,
    pub enabled: bool,
}

impl Default for BodyDef {
    fn default() -> Self {
        Self {
            kind: BodyKind::Dynamic,
            position: Vec2::ZERO,
            angle: 0.0,
            linear_velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            fixed_rotation: false,
            bullet: false,
            gravity_scale: 1.0,
            allow_sleep: true,
            awake: true,
            enabled: true,
        }
    }
}

/// Fixture geometry in body-local coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeDef {
    Circle { radius: f32 },
    Box { half_width: f32, half_height: f32 },
    /// Convex polygon; the hull of the points is used.
    Polygon { points: Vec<Vec2> },
    Edge { a: Vec2, b: Vec2 },
    Chain { points: Vec<Vec2>, closed: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FixtureDef {
    pub shape: ShapeDef,
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
    pub sensor: bool,
    /// Collision category this fixture belongs to.
    pub category_bits: u32,
    /// Categories this fixture collides with.
    pub mask_bits: u32,
}

impl FixtureDef {
    pub fn new(shape: ShapeDef) -> Self {
        Self {
            shape,
            density: 1.0,
            friction: 0.2,
            restitution: 0.0,
            sensor: false,
            category_bits: 1,
            mask_bits: u32::MAX,
        }
    }

    pub fn circle(radius: f32) -> Self {
        Self::new(ShapeDef::Circle { radius })
    }

    pub fn filter(mut self, category_bits: u32, mask_bits: u32) -> Self {
        self.category_bits = category_bits;
        self.mask_bits = mask_bits;
        self
    }
}

/// Spring link between the origins of two bodies.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceJointDef {
    pub body_a: BodyHandle,
    pub body_b: BodyHandle,
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    /// Rest length; `None` keeps the current anchor distance.
    pub length: Option<f32>,
    /// Oscillation frequency. `None` or zero makes the link stiff.
    pub frequency_hz: Option<f32>,
    pub damping_ratio: f32,
    pub collide_connected: bool,
}

impl DistanceJointDef {
    pub fn new(body_a: BodyHandle, body_b: BodyHandle) -> Self {
        Self {
            body_a,
            body_b,
            local_anchor_a: Vec2::ZERO,
            local_anchor_b: Vec2::ZERO,
            length: None,
            frequency_hz: None,
            damping_ratio: 0.0,
            collide_connected: false,
        }
    }
}

/// A touching pair of fixtures. When handed to an entity hook,
/// `this_fixture` belongs to the receiving entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub this_fixture: FixtureHandle,
    pub other_fixture: FixtureHandle,
    pub sensor: bool,
}

impl Contact {
    pub fn swapped(&self) -> Self {
        Self {
            this_fixture: self.other_fixture,
            other_fixture: self.this_fixture,
            sensor: self.sensor,
        }
    }
}

/// Solver contact geometry for a pair, in world coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifold {
    pub normal: Vec2,
    pub points: Vec<Vec2>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactImpulse {
    pub total_force: Vec2,
    pub magnitude: f32,
    pub max_force_magnitude: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ContactEvent {
    Begin(Contact),
    End(Contact),
    PreSolve(Contact, Manifold),
    PostSolve(Contact, ContactImpulse),
}

impl ContactEvent {
    pub fn contact(&self) -> &Contact {
        match self {
            ContactEvent::Begin(c)
            | ContactEvent::End(c)
            | ContactEvent::PreSolve(c, _)
            | ContactEvent::PostSolve(c, _) => c,
        }
    }
}

/// Shape geometry for the debug overlay, relative to its body.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeOutline {
    Circle { center: Vec2, radius: f32 },
    Polygon { points: Vec<Vec2>, closed: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub struct BodyOutline {
    pub position: Vec2,
    pub angle: f32,
    pub awake: bool,
    pub shapes: Vec<ShapeOutline>,
}

pub struct Physics {
    pipeline: PhysicsPipeline,
    gravity: Vector<Real>,
    integration_params: IntegrationParameters,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    stepping: bool,
    base: BodyHandle,
}

impl Physics {
    /// New world with a static base body at the origin, used as the fixed
    /// end of joints.
    pub fn new(gravity: Vec2) -> Self {
        let mut bodies = RigidBodySet::new();
        let base = bodies.insert(RigidBodyBuilder::fixed().build());
        Self {
            pipeline: PhysicsPipeline::new(),
            gravity: to_vector(gravity),
            integration_params: IntegrationParameters::default(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies,
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            stepping: false,
            base,
        }
    }

    pub fn base(&self) -> BodyHandle {
        self.base
    }

    pub fn begin_step(&mut self) {
        self.stepping = true;
    }

    pub fn end_step(&mut self) {
        self.stepping = false;
    }

    pub fn is_stepping(&self) -> bool {
        self.stepping
    }

    fn guard(&self, what: &'static str) -> Result<()> {
        if self.stepping {
            log::warn!("refused {what} mutation during world step");
            return Err(EngineError::StepInProgress(what));
        }
        Ok(())
    }

    pub fn create_body(&mut self, def: &BodyDef) -> Result<BodyHandle> {
        self.guard("body")?;
        let builder = match def.kind {
            BodyKind::Static => RigidBodyBuilder::fixed(),
            BodyKind::Kinematic => RigidBodyBuilder::kinematic_velocity_based(),
            BodyKind::Dynamic => RigidBodyBuilder::dynamic(),
        };
        let mut builder = builder
            .translation(to_vector(def.position))
            .rotation(def.angle)
            .linvel(to_vector(def.linear_velocity))
            .angvel(def.angular_velocity)
            .linear_damping(def.linear_damping)
            .angular_damping(def.angular_damping)
            .ccd_enabled(def.bullet)
            .gravity_scale(def.gravity_scale)
            .can_sleep(def.allow_sleep)
            .sleeping(!def.awake)
            .enabled(def.enabled);
        if def.fixed_rotation {
            builder = builder.lock_rotations();
        }
        Ok(self.bodies.insert(builder.build()))
    }

    /// Attach a fixture. It inherits the body's owner, if any.
    pub fn create_fixture(&mut self, body: BodyHandle, def: &FixtureDef) -> Result<FixtureHandle> {
        self.guard("fixture")?;
        let owner = self.bodies.get(body).ok_or(EngineError::UnknownBody)?.user_data;
        let builder = match &def.shape {
            ShapeDef::Circle { radius } => ColliderBuilder::ball(*radius),
            ShapeDef::Box {
                half_width,
                half_height,
            } => ColliderBuilder::cuboid(*half_width, *half_height),
            ShapeDef::Polygon { points } => {
                let points: Vec<Point<Real>> = points.iter().copied().map(to_point).collect();
                ColliderBuilder::convex_hull(&points).ok_or_else(|| {
                    EngineError::InvalidShape(format!("degenerate polygon of {} points", points.len()))
                })?
            }
            ShapeDef::Edge { a, b } => ColliderBuilder::segment(to_point(*a), to_point(*b)),
            ShapeDef::Chain { points, closed } => {
                if points.len() < 2 {
                    return Err(EngineError::InvalidShape(format!(
                        "chain needs at least 2 points, got {}",
                        points.len()
                    )));
                }
                let vertices: Vec<Point<Real>> = points.iter().copied().map(to_point).collect();
                let n = vertices.len() as u32;
                let mut indices: Vec<[u32; 2]> = (0..n - 1).map(|i| [i, i + 1]).collect();
                if *closed {
                    indices.push([n - 1, 0]);
                }
                ColliderBuilder::polyline(vertices, Some(indices))
            }
        };
        let groups = InteractionGroups::new(
            Group::from_bits_truncate(def.category_bits),
            Group::from_bits_truncate(def.mask_bits),
        );
        let collider = builder
            .density(def.density)
            .friction(def.friction)
            .restitution(def.restitution)
            .sensor(def.sensor)
            .collision_groups(groups)
            .active_events(ActiveEvents::COLLISION_EVENTS | ActiveEvents::CONTACT_FORCE_EVENTS)
            .contact_force_event_threshold(0.0)
            .user_data(owner)
            .build();
        Ok(self
            .colliders
            .insert_with_parent(collider, body, &mut self.bodies))
    }

    pub fn distance_joint(&mut self, def: &DistanceJointDef) -> Result<JointHandle> {
        self.guard("joint")?;
        let a = self.bodies.get(def.body_a).ok_or(EngineError::UnknownBody)?;
        let b = self.bodies.get(def.body_b).ok_or(EngineError::UnknownBody)?;
        let length = match def.length {
            Some(length) => length,
            None => {
                let pa = a.position() * to_point(def.local_anchor_a);
                let pb = b.position() * to_point(def.local_anchor_b);
                (pb - pa).norm()
            }
        };
        let frequency = match def.frequency_hz {
            Some(f) if f > 0.0 => f,
            _ => RIGID_JOINT_FREQUENCY_HZ,
        };
        let omega = 2.0 * std::f32::consts::PI * frequency;
        let joint = SpringJointBuilder::new(length, omega * omega, 2.0 * def.damping_ratio * omega)
            .local_anchor1(to_point(def.local_anchor_a))
            .local_anchor2(to_point(def.local_anchor_b))
            .contacts_enabled(def.collide_connected)
            .build();
        Ok(self
            .impulse_joints
            .insert(def.body_a, def.body_b, joint, true))
    }

    /// Remove a body with its fixtures and joints.
    pub fn destroy_body(&mut self, body: BodyHandle) -> Result<()> {
        self.guard("body")?;
        self.bodies
            .remove(
                body,
                &mut self.islands,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            )
            .map(|_| ())
            .ok_or(EngineError::UnknownBody)
    }

    /// Tag a body and its current fixtures with their owning entity.
    pub fn set_owner(&mut self, body: BodyHandle, owner: Option<EntityId>) {
        let data = owner.map_or(0, EntityId::to_user_data);
        let Some(rb) = self.bodies.get_mut(body) else {
            return;
        };
        rb.user_data = data;
        for handle in rb.colliders() {
            if let Some(collider) = self.colliders.get_mut(*handle) {
                collider.user_data = data;
            }
        }
    }

    pub fn fixture_owner(&self, fixture: FixtureHandle) -> Option<EntityId> {
        self.colliders
            .get(fixture)
            .and_then(|c| EntityId::from_user_data(c.user_data))
    }

    pub fn body_owner(&self, body: BodyHandle) -> Option<EntityId> {
        self.bodies
            .get(body)
            .and_then(|b| EntityId::from_user_data(b.user_data))
    }

    /// Advance the world by `dt` seconds and return this step's contact
    /// events: begins, pre-solves, post-solves, then ends. Forces applied
    /// before the step are cleared afterwards.
    pub fn step(&mut self, dt: f64) -> Vec<ContactEvent> {
        self.integration_params.dt = dt as Real;

        let (collision_send, collision_recv) = unbounded::<CollisionEvent>();
        let (force_send, force_recv) = unbounded::<ContactForceEvent>();
        let event_handler = ChannelEventCollector::new(collision_send, force_send);

        self.pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &(),
            &event_handler,
        );

        for (_, body) in self.bodies.iter_mut() {
            body.reset_forces(false);
        }

        let mut begins = Vec::new();
        let mut ends = Vec::new();
        while let Ok(event) = collision_recv.try_recv() {
            let (a, b) = (event.collider1(), event.collider2());
            let contact = Contact {
                this_fixture: a,
                other_fixture: b,
                sensor: event.sensor(),
            };
            if event.started() {
                begins.push(ContactEvent::Begin(contact));
            } else {
                ends.push(ContactEvent::End(contact));
            }
        }

        let mut events = begins;
        for pair in self.narrow_phase.contact_pairs() {
            if !pair.has_any_active_contact {
                continue;
            }
            for manifold in &pair.manifolds {
                if manifold.data.solver_contacts.is_empty() {
                    continue;
                }
                let contact = Contact {
                    this_fixture: pair.collider1,
                    other_fixture: pair.collider2,
                    sensor: false,
                };
                events.push(ContactEvent::PreSolve(
                    contact,
                    Manifold {
                        normal: from_vector(&manifold.data.normal),
                        points: manifold
                            .data
                            .solver_contacts
                            .iter()
                            .map(|c| from_point(&c.point))
                            .collect(),
                    },
                ));
            }
        }
        while let Ok(event) = force_recv.try_recv() {
            let contact = Contact {
                this_fixture: event.collider1,
                other_fixture: event.collider2,
                sensor: false,
            };
            events.push(ContactEvent::PostSolve(
                contact,
                ContactImpulse {
                    total_force: from_vector(&event.total_force),
                    magnitude: event.total_force_magnitude,
                    max_force_magnitude: event.max_force_magnitude,
                },
            ));
        }
        events.extend(ends);
        log::trace!("world step {dt:.4}s, {} contact events", events.len());
        events
    }

    pub fn position(&self, body: BodyHandle) -> Option<Vec2> {
        self.bodies.get(body).map(|b| from_vector(b.translation()))
    }

    pub fn angle(&self, body: BodyHandle) -> Option<f32> {
        self.bodies.get(body).map(|b| b.rotation().angle())
    }

    pub fn velocity(&self, body: BodyHandle) -> Option<Vec2> {
        self.bodies.get(body).map(|b| from_vector(b.linvel()))
    }

    pub fn set_velocity(&mut self, body: BodyHandle, velocity: Vec2) -> Result<()> {
        let b = self.bodies.get_mut(body).ok_or(EngineError::UnknownBody)?;
        b.set_linvel(to_vector(velocity), true);
        Ok(())
    }

    pub fn set_position(&mut self, body: BodyHandle, position: Vec2) -> Result<()> {
        let b = self.bodies.get_mut(body).ok_or(EngineError::UnknownBody)?;
        b.set_translation(to_vector(position), true);
        Ok(())
    }

    /// Force at the centre of mass, applied during the next step only.
    pub fn apply_force(&mut self, body: BodyHandle, force: Vec2) -> Result<()> {
        let b = self.bodies.get_mut(body).ok_or(EngineError::UnknownBody)?;
        b.add_force(to_vector(force), true);
        Ok(())
    }

    pub fn apply_impulse(&mut self, body: BodyHandle, impulse: Vec2) -> Result<()> {
        let b = self.bodies.get_mut(body).ok_or(EngineError::UnknownBody)?;
        b.apply_impulse(to_vector(impulse), true);
        Ok(())
    }

    pub fn mass(&self, body: BodyHandle) -> Option<f32> {
        self.bodies.get(body).map(|b| b.mass())
    }

    pub fn is_awake(&self, body: BodyHandle) -> Option<bool> {
        self.bodies.get(body).map(|b| !b.is_sleeping())
    }

    pub fn contains_body(&self, body: BodyHandle) -> bool {
        self.bodies.contains(body)
    }

    /// Number of bodies, the base body included.
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn fixture_count(&self) -> usize {
        self.colliders.len()
    }

    pub fn joint_count(&self) -> usize {
        self.impulse_joints.len()
    }

    /// Every body with its fixture geometry.
    pub fn outlines(&self) -> Vec<BodyOutline> {
        self.bodies
            .iter()
            .map(|(_, body)| {
                let shapes = body
                    .colliders()
                    .iter()
                    .filter_map(|h| self.colliders.get(*h))
                    .filter_map(|c| {
                        let local = c.position_wrt_parent().copied().unwrap_or_else(Isometry::identity);
                        outline_of(c.shape(), &local)
                    })
                    .collect();
                BodyOutline {
                    position: from_vector(body.translation()),
                    angle: body.rotation().angle(),
                    awake: !body.is_sleeping(),
                    shapes,
                }
            })
            .collect()
    }

    /// World-space anchor pairs of every joint.
    pub fn joint_lines(&self) -> Vec<(Vec2, Vec2)> {
        self.impulse_joints
            .iter()
            .filter_map(|(_, joint)| {
                let a = self.bodies.get(joint.body1)?;
                let b = self.bodies.get(joint.body2)?;
                let pa = a.position() * joint.data.local_anchor1();
                let pb = b.position() * joint.data.local_anchor2();
                Some((from_point(&pa), from_point(&pb)))
            })
            .collect()
    }
}

fn outline_of(shape: &dyn Shape, local: &Isometry<Real>) -> Option<ShapeOutline> {
    let map = |p: &Point<Real>| from_point(&(local * p));
    if let Some(ball) = shape.as_ball() {
        return Some(ShapeOutline::Circle {
            center: from_vector(&local.translation.vector),
            radius: ball.radius,
        });
    }
    if let Some(cuboid) = shape.as_cuboid() {
        let he = cuboid.half_extents;
        let corners = [
            point![-he.x, -he.y],
            point![he.x, -he.y],
            point![he.x, he.y],
            point![-he.x, he.y],
        ];
        return Some(ShapeOutline::Polygon {
            points: corners.iter().map(map).collect(),
            closed: true,
        });
    }
    if let Some(poly) = shape.as_convex_polygon() {
        return Some(ShapeOutline::Polygon {
            points: poly.points().iter().map(map).collect(),
            closed: true,
        });
    }
    if let Some(segment) = shape.as_segment() {
        return Some(ShapeOutline::Polygon {
            points: vec![map(&segment.a), map(&segment.b)],
            closed: false,
        });
    }
    if let Some(polyline) = shape.as_polyline() {
        return Some(ShapeOutline::Polygon {
            points: polyline.vertices().iter().map(map).collect(),
            closed: false,
        });
    }
    None
}

impl Default for Physics {
    fn default() -> Self {
        Self::new(Vec2::ZERO)
    }
}
