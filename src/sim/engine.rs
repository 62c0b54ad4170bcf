//! The physics engine and its per-frame pipeline
//!
//! The engine owns the simulated bodies, the global tunables and the contact
//! registers used to debounce collision events across ticks. Bodies are added
//! and removed between ticks only; listeners receive a `&Contact` and have no
//! access to the engine, so they cannot change the collection mid-tick.

use std::collections::{BTreeSet, HashMap, HashSet};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::{Body, BodyId, BodySnapshot};
use super::collision::{
    boundary_edges, broad_phase, clamp_to_edge, contact_normal, overlap, reflect,
    transfer_velocity, transfer_velocity_weighted,
};
use super::contact::{Contact, Edge, Edges};
use super::gravity;
use crate::angle_of;
use crate::config::Tunables;
use crate::error::Result;

/// The arena rectangle, from (0, 0) to (width, height)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
}

impl Arena {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        (0.0..=self.width).contains(&point.x) && (0.0..=self.height).contains(&point.y)
    }
}

/// 2D physics engine over a set of rectangular point-mass bodies
#[derive(Debug)]
pub struct PhysicsEngine {
    /// Global tunables, free to change between ticks
    pub tunables: Tunables,
    bodies: Vec<Body>,
    /// Arena edges each body touched on the previous tick
    edge_contacts: HashMap<BodyId, Edges>,
    /// Bodies each body was overlapping on the previous tick
    body_contacts: HashMap<BodyId, BTreeSet<BodyId>>,
    next_id: u32,
    ticks: u64,
}

impl Default for PhysicsEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsEngine {
    /// Create an engine with default tunables and no bodies
    pub fn new() -> Self {
        Self::build(Tunables::default())
    }

    /// Create an engine with custom tunables, rejecting non-finite or
    /// out-of-range values
    pub fn with_tunables(tunables: Tunables) -> Result<Self> {
        tunables.validate()?;
        Ok(Self::build(tunables))
    }

    fn build(tunables: Tunables) -> Self {
        log::info!("Physics engine initialized: {:?}", tunables);
        Self {
            tunables,
            bodies: Vec::new(),
            edge_contacts: HashMap::new(),
            body_contacts: HashMap::new(),
            next_id: 1,
            ticks: 0,
        }
    }

    // === Collection ===

    /// Add a body and return its engine-assigned id
    pub fn add_body(&mut self, mut body: Body) -> Result<BodyId> {
        body.check_finite()?;
        let id = BodyId(self.next_id);
        self.next_id += 1;
        body.id = id;
        log::debug!("Added body {} '{}' at {}", id, body.label, body.position);
        self.edge_contacts.insert(id, Edges::NONE);
        self.body_contacts.insert(id, BTreeSet::new());
        self.bodies.push(body);
        Ok(id)
    }

    /// Remove a body, dropping every contact it took part in
    pub fn remove_body(&mut self, id: BodyId) -> Option<Body> {
        let index = self.bodies.iter().position(|b| b.id == id)?;
        let body = self.bodies.remove(index);
        self.edge_contacts.remove(&id);
        if let Some(partners) = self.body_contacts.remove(&id) {
            for partner in partners {
                if let Some(set) = self.body_contacts.get_mut(&partner) {
                    set.remove(&id);
                }
            }
        }
        log::debug!("Removed body {} '{}'", id, body.label);
        Some(body)
    }

    /// Remove every body
    pub fn clear(&mut self) {
        self.bodies.clear();
        self.edge_contacts.clear();
        self.body_contacts.clear();
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.iter().find(|b| b.id == id)
    }

    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.iter_mut().find(|b| b.id == id)
    }

    /// First body with the given label
    pub fn lookup(&self, label: &str) -> Option<&Body> {
        self.bodies.iter().find(|b| b.label == label)
    }

    pub fn lookup_mut(&mut self, label: &str) -> Option<&mut Body> {
        self.bodies.iter_mut().find(|b| b.label == label)
    }

    /// Bodies in insertion order
    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    /// Mutable access to body state; the collection itself stays fixed
    pub fn bodies_mut(&mut self) -> &mut [Body] {
        &mut self.bodies
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Number of non-empty ticks simulated
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn snapshot(&self) -> Vec<BodySnapshot> {
        self.bodies.iter().map(Body::snapshot).collect()
    }

    pub fn total_momentum(&self) -> Vec2 {
        self.bodies.iter().map(Body::momentum).sum()
    }

    /// Arena edges the body is currently resting against
    pub fn edge_contacts(&self, id: BodyId) -> Edges {
        self.edge_contacts.get(&id).copied().unwrap_or_default()
    }

    /// Bodies currently overlapping the given body, in id order
    pub fn body_contacts(&self, id: BodyId) -> impl Iterator<Item = BodyId> + '_ {
        self.body_contacts.get(&id).into_iter().flatten().copied()
    }

    /// Forget every active contact so the next tick treats all touching
    /// pairs and edges as new. Bodies are kept.
    pub fn reset(&mut self) {
        for edges in self.edge_contacts.values_mut() {
            edges.clear();
        }
        for set in self.body_contacts.values_mut() {
            set.clear();
        }
        log::info!("Physics engine reset ({} bodies kept)", self.bodies.len());
    }

    // === Tick ===

    /// Advance the simulation by one step.
    ///
    /// Phases run in a fixed order: arena collisions, body collisions, uniform
    /// gravity, pairwise gravity, then position integration. Listeners run
    /// synchronously inside the collision phases. Does nothing without bodies.
    pub fn tick(&mut self, arena: Arena) {
        if self.bodies.is_empty() {
            return;
        }

        self.sync_contact_registers();

        self.static_collision(arena);
        self.dynamic_collision();
        self.static_gravity();
        self.dynamic_gravity();
        self.update_position();

        self.ticks += 1;
    }

    /// Give every live body a register entry and drop entries of departed ones
    fn sync_contact_registers(&mut self) {
        let live: HashSet<BodyId> = self.bodies.iter().map(|b| b.id).collect();
        for id in &live {
            self.edge_contacts.entry(*id).or_default();
            self.body_contacts.entry(*id).or_default();
        }
        self.edge_contacts.retain(|id, _| live.contains(id));
        self.body_contacts.retain(|id, _| live.contains(id));
        for set in self.body_contacts.values_mut() {
            set.retain(|other| live.contains(other));
        }
    }

    /// Bounce bodies off the arena edges.
    ///
    /// A newly touched edge reflects the matching velocity component and fires
    /// one boundary event. An edge already touched on the previous tick only
    /// pulls the body back inside; velocity is left alone unless
    /// `absorb_resting_velocity` is set.
    pub fn static_collision(&mut self, arena: Arena) {
        let penalty = self.tunables.static_collision_penalty;
        let mode = self.tunables.penalty_mode;
        let absorb = self.tunables.absorb_resting_velocity;

        for body in &mut self.bodies {
            let bounds = body.bounds();
            let hit = boundary_edges(&bounds, arena.width, arena.height);
            let active = self.edge_contacts.entry(body.id).or_default();

            let mut fresh = Edges::NONE;
            for edge in hit.iter() {
                if active.contains(edge) {
                    clamp_to_edge(
                        &mut body.position,
                        body.half_extents,
                        edge,
                        arena.width,
                        arena.height,
                    );
                    if absorb {
                        cancel_outward(&mut body.velocity, edge);
                    }
                } else {
                    match edge {
                        Edge::Left | Edge::Right => {
                            body.velocity.x = reflect(body.velocity.x, penalty, mode)
                        }
                        Edge::Top | Edge::Bottom => {
                            body.velocity.y = reflect(body.velocity.y, penalty, mode)
                        }
                    }
                    fresh.insert(edge);
                }
            }
            *active = hit;

            if !fresh.is_empty() {
                log::debug!(
                    "Collision: {} '{}' ({:.3}, {:.3}) hit arena edge(s) {:?}",
                    body.id,
                    body.label,
                    bounds.min.x,
                    bounds.min.y,
                    hit.iter().collect::<Vec<_>>()
                );
                let contact = Contact {
                    body: body.id,
                    other: None,
                    angle: hit.angle(),
                    edges: hit,
                };
                body.collision(&contact);
            } else if !hit.is_empty() {
                log::trace!(
                    "Ignored collision: {} '{}' resting on arena edge(s) {:?}",
                    body.id,
                    body.label,
                    hit.iter().collect::<Vec<_>>()
                );
            }
        }
    }

    /// Resolve body-to-body overlaps.
    ///
    /// Only the first tick of a contact exchanges velocity and fires events;
    /// the pair is then ignored until it separates.
    pub fn dynamic_collision(&mut self) {
        if self.bodies.len() < 2 {
            return;
        }

        let overlapping: Vec<(usize, usize, Vec2)> = broad_phase(&self.bodies)
            .into_iter()
            .filter_map(|(i, j)| {
                overlap(&self.bodies[i], &self.bodies[j]).map(|depth| (i, j, depth))
            })
            .collect();

        // End every contact that is not overlapping anymore, culled pairs included
        let touching: HashSet<(BodyId, BodyId)> = overlapping
            .iter()
            .map(|&(i, j, _)| pair_key(self.bodies[i].id, self.bodies[j].id))
            .collect();
        for (id, set) in self.body_contacts.iter_mut() {
            set.retain(|other| {
                let keep = touching.contains(&pair_key(*id, *other));
                if !keep {
                    log::trace!("Separated: {} and {}", id, other);
                }
                keep
            });
        }

        let transfer = self.tunables.dynamic_collision_transfer;
        let penalty = self.tunables.dynamic_collision_penalty;
        let weighted = self.tunables.mass_weighted_transfer;

        for (i, j, depth) in overlapping {
            let (p, c) = pair_mut(&mut self.bodies, i, j);

            let already = self
                .body_contacts
                .get(&p.id)
                .is_some_and(|s| s.contains(&c.id))
                && self
                    .body_contacts
                    .get(&c.id)
                    .is_some_and(|s| s.contains(&p.id));
            if already {
                log::trace!(
                    "Ignored collision between {} '{}' and {} '{}'; overlap ({:.2}, {:.2})",
                    p.id,
                    p.label,
                    c.id,
                    c.label,
                    depth.x,
                    depth.y
                );
                continue;
            }

            let normal = contact_normal(p, c);
            log::debug!(
                "Collision between {} '{}' ({:.3}, {:.3}) and {} '{}' ({:.3}, {:.3}); \
                 overlap ({:.2}, {:.2})",
                p.id,
                p.label,
                p.position.x,
                p.position.y,
                c.id,
                c.label,
                c.position.x,
                c.position.y,
                depth.x,
                depth.y
            );
            log::debug!(
                "Velocities: ({:.2}, {:.2}), ({:.2}, {:.2})",
                p.velocity.x,
                p.velocity.y,
                c.velocity.x,
                c.velocity.y
            );

            let (vp, vc) = if weighted {
                transfer_velocity_weighted(
                    p.velocity,
                    p.mass(),
                    c.velocity,
                    c.mass(),
                    normal,
                    transfer,
                    penalty,
                )
            } else {
                transfer_velocity(p.velocity, c.velocity, normal, transfer, penalty)
            };
            p.velocity = vp;
            c.velocity = vc;

            self.body_contacts.entry(p.id).or_default().insert(c.id);
            self.body_contacts.entry(c.id).or_default().insert(p.id);

            let to_p = Contact {
                body: p.id,
                other: Some(c.id),
                angle: angle_of(normal),
                edges: Edges::NONE,
            };
            let to_c = Contact {
                body: c.id,
                other: Some(p.id),
                angle: angle_of(-normal),
                edges: Edges::NONE,
            };
            p.collision(&to_p);
            c.collision(&to_c);
        }
    }

    /// Add the uniform gravity vector to every body
    pub fn static_gravity(&mut self) {
        gravity::apply_uniform(&mut self.bodies, self.tunables.gravity);
    }

    /// Newtonian attraction between every pair of bodies
    pub fn dynamic_gravity(&mut self) {
        let constant = self.tunables.dynamic_gravity_constant;
        let skipped = gravity::apply_pairwise(&mut self.bodies, constant);
        if skipped > 0 {
            log::debug!("Pairwise gravity skipped {} coincident pair(s)", skipped);
        }
    }

    /// Explicit Euler step: position += velocity
    pub fn update_position(&mut self) {
        for body in &mut self.bodies {
            body.position += body.velocity;
        }
    }
}

/// Order-independent key for a pair of bodies
#[inline]
fn pair_key(a: BodyId, b: BodyId) -> (BodyId, BodyId) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Two distinct mutable bodies, `i < j`
fn pair_mut(bodies: &mut [Body], i: usize, j: usize) -> (&mut Body, &mut Body) {
    debug_assert!(i < j);
    let (head, tail) = bodies.split_at_mut(j);
    (&mut head[i], &mut tail[0])
}

/// Zero the velocity component pointing out through `edge`
fn cancel_outward(velocity: &mut Vec2, edge: Edge) {
    match edge {
        Edge::Left if velocity.x < 0.0 => velocity.x = 0.0,
        Edge::Right if velocity.x > 0.0 => velocity.x = 0.0,
        Edge::Top if velocity.y < 0.0 => velocity.y = 0.0,
        Edge::Bottom if velocity.y > 0.0 => velocity.y = 0.0,
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PenaltyMode, TunablePreset};
    use crate::error::PhysicsError;
    use std::cell::{Cell, RefCell};
    use std::f32::consts::PI;
    use std::rc::Rc;

    const ARENA: Arena = Arena {
        width: 100.0,
        height: 100.0,
    };

    /// Add a listener counting events on the body
    fn counted(mut body: Body) -> (Body, Rc<Cell<u32>>) {
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        body.add_collision_callback(move |_| h.set(h.get() + 1));
        (body, hits)
    }

    #[test]
    fn test_empty_tick_is_noop() {
        let mut engine = PhysicsEngine::new();
        engine.tick(ARENA);
        assert_eq!(engine.ticks(), 0);
        assert!(engine.is_empty());
        assert!(engine.edge_contacts.is_empty());
        assert!(engine.body_contacts.is_empty());
        assert_eq!(engine.tunables, Tunables::default());
    }

    #[test]
    fn test_full_penalty_absorbs_wall_hit() {
        let mut engine = PhysicsEngine::new();
        engine.tunables.static_collision_penalty = 1.0;
        let (body, hits) =
            counted(Body::new("wall", Vec2::new(0.0, 50.0)).with_velocity(Vec2::new(-5.0, 0.0)));
        let id = engine.add_body(body).unwrap();

        engine.tick(ARENA);

        assert_eq!(engine.body(id).unwrap().velocity.x, 0.0);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_absolute_penalty_bounce() {
        let mut engine = PhysicsEngine::new();
        engine.tunables.static_collision_penalty = 1.0;
        engine.tunables.penalty_mode = PenaltyMode::Absolute;
        let id = engine
            .add_body(Body::new("wall", Vec2::new(0.0, 50.0)).with_velocity(Vec2::new(-5.0, 0.0)))
            .unwrap();

        engine.tick(ARENA);

        let body = engine.body(id).unwrap();
        assert_eq!(body.velocity.x, 4.0);
        assert_eq!(body.position.x, 4.0);
    }

    #[test]
    fn test_boundary_debounce_and_clamp() {
        let mut engine = PhysicsEngine::new();
        let (body, hits) = counted(Body::square("rest", Vec2::new(-10.0, 50.0), 10.0));
        let id = engine.add_body(body).unwrap();

        for _ in 0..10 {
            engine.tick(ARENA);
        }

        assert_eq!(hits.get(), 1);
        let body = engine.body(id).unwrap();
        assert_eq!(body.position.x, 5.0);
        assert!(engine.edge_contacts(id).contains(Edge::Left));
    }

    #[test]
    fn test_boundary_refires_after_leaving() {
        let mut engine = PhysicsEngine::new();
        let (body, hits) =
            counted(Body::new("bounce", Vec2::new(0.0, 50.0)).with_velocity(Vec2::new(-2.0, 0.0)));
        let id = engine.add_body(body).unwrap();

        engine.tick(ARENA);
        assert_eq!(hits.get(), 1);
        // Reflected to +2, now at x = 2 and clear of the edge
        engine.tick(ARENA);
        assert!(engine.edge_contacts(id).is_empty());

        engine.body_mut(id).unwrap().velocity = Vec2::new(-10.0, 0.0);
        engine.tick(ARENA);
        engine.tick(ARENA);
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_corner_hit_single_event() {
        let mut engine = PhysicsEngine::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let mut body =
            Body::new("corner", Vec2::new(0.0, 0.0)).with_velocity(Vec2::new(-1.0, -1.0));
        body.add_collision_callback(move |c| s.borrow_mut().push(*c));
        engine.add_body(body).unwrap();

        engine.tick(ARENA);

        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].is_boundary());
        assert!((seen[0].angle - PI / 4.0).abs() < 1e-5);
        assert!(seen[0].edges.contains(Edge::Left) && seen[0].edges.contains(Edge::Top));
        drop(seen);
        let body = &engine.bodies()[0];
        assert_eq!(body.velocity, Vec2::new(1.0, 1.0));
    }

    #[test]
    fn test_dynamic_debounce() {
        let mut engine = PhysicsEngine::new();
        let (a, hits_a) = counted(Body::square("a", Vec2::new(50.0, 50.0), 10.0));
        let (b, hits_b) = counted(Body::square("b", Vec2::new(55.0, 50.0), 10.0));
        let id_a = engine.add_body(a).unwrap();
        let id_b = engine.add_body(b).unwrap();

        for _ in 0..5 {
            engine.tick(ARENA);
        }
        assert_eq!(hits_a.get(), 1);
        assert_eq!(hits_b.get(), 1);
        assert_eq!(engine.body_contacts(id_a).collect::<Vec<_>>(), vec![id_b]);

        // Separate, then overlap again
        engine.body_mut(id_b).unwrap().position = Vec2::new(80.0, 50.0);
        engine.tick(ARENA);
        assert_eq!(engine.body_contacts(id_a).count(), 0);
        assert_eq!(engine.body_contacts(id_b).count(), 0);

        engine.body_mut(id_b).unwrap().position = Vec2::new(55.0, 50.0);
        engine.tick(ARENA);
        assert_eq!(hits_a.get(), 2);
        assert_eq!(hits_b.get(), 2);
    }

    #[test]
    fn test_dynamic_collision_conserves_velocity_sum() {
        let mut engine = PhysicsEngine::new();
        engine.tunables.dynamic_collision_penalty = 0.0;
        engine.tunables.dynamic_collision_transfer = 1.0;
        let a = Body::square("a", Vec2::new(40.0, 50.0), 10.0).with_velocity(Vec2::new(2.0, 0.5));
        let b = Body::square("b", Vec2::new(48.0, 53.0), 10.0).with_velocity(Vec2::new(-1.0, 0.0));
        engine.add_body(a).unwrap();
        engine.add_body(b).unwrap();

        let before: Vec2 = engine.bodies().iter().map(|b| b.velocity).sum();
        engine.dynamic_collision();
        let after: Vec2 = engine.bodies().iter().map(|b| b.velocity).sum();

        assert!((before - after).length() < 1e-5);
        // Something was actually exchanged
        assert!(engine.bodies()[0].velocity.x < 2.0);
    }

    #[test]
    fn test_unequal_masses_keep_velocity_sum() {
        let mut engine = PhysicsEngine::new();
        engine.tunables.dynamic_collision_penalty = 0.0;
        engine.tunables.dynamic_collision_transfer = 1.0;
        let light = Body::square("light", Vec2::new(40.0, 50.0), 10.0)
            .with_velocity(Vec2::new(2.0, 0.0));
        let heavy = Body::square("heavy", Vec2::new(46.0, 50.0), 10.0)
            .with_mass(3.0)
            .unwrap();
        let a = engine.add_body(light).unwrap();
        let b = engine.add_body(heavy).unwrap();

        engine.dynamic_collision();

        // Full transfer hands the light body's velocity over
        assert_eq!(engine.body(a).unwrap().velocity, Vec2::ZERO);
        assert_eq!(engine.body(b).unwrap().velocity, Vec2::new(2.0, 0.0));
    }

    #[test]
    fn test_mass_weighted_transfer_conserves_momentum() {
        let mut engine = PhysicsEngine::new();
        engine.tunables.dynamic_collision_transfer = 1.0;
        engine.tunables.mass_weighted_transfer = true;
        let light = Body::square("light", Vec2::new(40.0, 50.0), 10.0)
            .with_velocity(Vec2::new(2.0, 0.0));
        let heavy = Body::square("heavy", Vec2::new(46.0, 50.0), 10.0)
            .with_mass(3.0)
            .unwrap();
        let a = engine.add_body(light).unwrap();
        engine.add_body(heavy).unwrap();

        let before = engine.total_momentum();
        engine.dynamic_collision();

        assert!((engine.total_momentum() - before).length() < 1e-5);
        // The light body rebounds off the heavy one
        assert!(engine.body(a).unwrap().velocity.x < 0.0);
    }

    #[test]
    fn test_with_tunables_rejects_invalid() {
        let nan_gravity = Tunables {
            gravity: Vec2::new(f32::NAN, 0.0),
            ..Tunables::default()
        };
        assert!(matches!(
            PhysicsEngine::with_tunables(nan_gravity),
            Err(PhysicsError::InvalidTunable { .. })
        ));

        let wide = Tunables {
            dynamic_collision_transfer: 2.0,
            ..Tunables::default()
        };
        assert!(PhysicsEngine::with_tunables(wide).is_err());

        let arcade = Tunables::from_preset(TunablePreset::Arcade);
        assert!(PhysicsEngine::with_tunables(arcade).is_ok());
    }

    #[test]
    fn test_dynamic_contact_angles_are_opposite() {
        let mut engine = PhysicsEngine::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut a = Body::square("a", Vec2::new(40.0, 50.0), 10.0);
        let mut b = Body::square("b", Vec2::new(46.0, 50.0), 10.0);
        let s = Rc::clone(&seen);
        a.add_collision_callback(move |c| s.borrow_mut().push(*c));
        let s = Rc::clone(&seen);
        b.add_collision_callback(move |c| s.borrow_mut().push(*c));
        let id_a = engine.add_body(a).unwrap();
        let id_b = engine.add_body(b).unwrap();

        engine.dynamic_collision();

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].body, id_a);
        assert_eq!(seen[0].other, Some(id_b));
        assert!(seen[0].angle.abs() < 1e-6);
        assert_eq!(seen[1].body, id_b);
        assert!((seen[1].angle - PI).abs() < 1e-5);
    }

    #[test]
    fn test_coincident_bodies_stay_finite() {
        let mut engine = PhysicsEngine::new();
        engine.add_body(Body::square("a", Vec2::new(50.0, 50.0), 10.0)).unwrap();
        engine.add_body(Body::square("b", Vec2::new(50.0, 50.0), 10.0)).unwrap();

        for _ in 0..3 {
            engine.tick(ARENA);
        }
        assert!(engine.bodies().iter().all(|b| b.velocity.is_finite() && b.position.is_finite()));
    }

    #[test]
    fn test_nbody_equal_and_opposite() {
        let mut engine = PhysicsEngine::new();
        engine.tunables.dynamic_gravity_constant = 1.0;
        let a = engine.add_body(Body::new("a", Vec2::new(0.0, 0.0))).unwrap();
        let b = engine.add_body(Body::new("b", Vec2::new(10.0, 0.0))).unwrap();

        engine.tick(Arena::new(1000.0, 1000.0));

        let va = engine.body(a).unwrap().velocity;
        let vb = engine.body(b).unwrap().velocity;
        assert!(va.x > 0.0);
        assert!((va.x + vb.x).abs() < 1e-7);
        assert!((va.x - 0.01).abs() < 1e-6);
        assert_eq!(va.y, 0.0);
        assert_eq!(vb.y, 0.0);
    }

    #[test]
    fn test_gravity_runs_after_collision() {
        let mut engine = PhysicsEngine::new();
        engine.tunables.gravity = Vec2::new(0.0, 1.0);
        let id = engine
            .add_body(Body::new("fall", Vec2::new(50.0, 100.0)).with_velocity(Vec2::new(0.0, 3.0)))
            .unwrap();

        engine.tick(ARENA);

        // Reflected to -3 first, then gravity +1
        let body = engine.body(id).unwrap();
        assert_eq!(body.velocity.y, -2.0);
        assert_eq!(body.position.y, 98.0);
    }

    #[test]
    fn test_resting_contact_leaves_velocity_by_default() {
        let mut engine = PhysicsEngine::new();
        engine.tunables.gravity = Vec2::new(0.0, 0.5);
        engine.tunables.static_collision_penalty = 1.0;
        let id = engine.add_body(Body::square("rest", Vec2::new(50.0, 95.0), 10.0)).unwrap();

        // Tick 1 absorbs the hit, then gravity adds 0.5 per tick while resting
        for _ in 0..4 {
            engine.tick(ARENA);
        }
        let body = engine.body(id).unwrap();
        assert_eq!(body.velocity.y, 2.0);
        assert!(engine.edge_contacts(id).contains(Edge::Bottom));
    }

    #[test]
    fn test_resting_body_does_not_accumulate_gravity() {
        let mut engine = PhysicsEngine::new();
        engine.tunables.gravity = Vec2::new(0.0, 0.5);
        engine.tunables.static_collision_penalty = 1.0;
        engine.tunables.absorb_resting_velocity = true;
        let id = engine.add_body(Body::square("rest", Vec2::new(50.0, 95.0), 10.0)).unwrap();

        for _ in 0..100 {
            engine.tick(ARENA);
        }
        let body = engine.body(id).unwrap();
        assert!(body.velocity.y <= 0.5);
        assert!(ARENA.contains(body.position));
    }

    #[test]
    fn test_reset_refires_contacts() {
        let mut engine = PhysicsEngine::new();
        let (a, hits_a) = counted(Body::square("a", Vec2::new(50.0, 50.0), 10.0));
        let (b, _) = counted(Body::square("b", Vec2::new(52.0, 50.0), 10.0));
        let (wall, hits_wall) = counted(Body::new("wall", Vec2::new(0.0, 20.0)));
        engine.add_body(a).unwrap();
        engine.add_body(b).unwrap();
        engine.add_body(wall).unwrap();

        engine.tick(ARENA);
        engine.tick(ARENA);
        assert_eq!((hits_a.get(), hits_wall.get()), (1, 1));

        engine.reset();
        assert_eq!(engine.len(), 3);
        engine.tick(ARENA);
        assert_eq!((hits_a.get(), hits_wall.get()), (2, 2));
    }

    #[test]
    fn test_remove_body_drops_contacts() {
        let mut engine = PhysicsEngine::new();
        let a = engine.add_body(Body::square("a", Vec2::new(50.0, 50.0), 10.0)).unwrap();
        let b = engine.add_body(Body::square("b", Vec2::new(52.0, 50.0), 10.0)).unwrap();
        engine.tick(ARENA);
        assert_eq!(engine.body_contacts(a).count(), 1);

        let removed = engine.remove_body(b).unwrap();
        assert_eq!(removed.label, "b");
        assert_eq!(engine.body_contacts(a).count(), 0);
        assert!(engine.remove_body(b).is_none());
        assert!(engine.body(b).is_none());
    }

    #[test]
    fn test_lookup_and_ids() {
        let mut engine = PhysicsEngine::new();
        let a = engine.add_body(Body::new("player", Vec2::new(10.0, 10.0))).unwrap();
        let b = engine.add_body(Body::new("ai-0", Vec2::new(20.0, 10.0))).unwrap();
        assert_ne!(a, b);
        assert_ne!(a, BodyId::UNASSIGNED);
        assert_eq!(engine.lookup("ai-0").unwrap().id(), b);
        assert!(engine.lookup("ghost").is_none());

        engine.lookup_mut("player").unwrap().velocity = Vec2::X;
        assert_eq!(engine.body(a).unwrap().velocity, Vec2::X);
        assert_eq!(engine.snapshot()[0].label, "player");
    }

    #[test]
    fn test_add_rejects_non_finite() {
        let mut engine = PhysicsEngine::new();
        let bad = Body::new("bad", Vec2::ZERO).with_velocity(Vec2::new(f32::NAN, 0.0));
        let result = engine.add_body(bad);
        assert!(result.is_err());
        assert!(engine.is_empty());
    }

    #[test]
    fn test_no_self_contacts() {
        let mut engine = PhysicsEngine::new();
        let ids: Vec<BodyId> = (0..4)
            .map(|i| {
                engine
                    .add_body(Body::square(
                        format!("b{i}"),
                        Vec2::new(40.0 + i as f32 * 3.0, 50.0),
                        10.0,
                    ))
                    .unwrap()
            })
            .collect();
        engine.tick(ARENA);
        for id in &ids {
            assert!(engine.body_contacts(*id).all(|other| other != *id));
            for other in engine.body_contacts(*id) {
                assert!(engine.body_contacts(other).any(|o| o == *id));
            }
        }
    }
}
