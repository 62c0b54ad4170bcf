//! Collision detection and response for rectangular bodies
//!
//! Two kinds of contact: a body against the arena rectangle (static) and two
//! bodies against each other (dynamic). Everything here is pure math over
//! positions and velocities; the debounce bookkeeping lives in the engine.

use glam::Vec2;

use super::body::{Body, Bounds};
use super::contact::{Edge, Edges};
use crate::config::PenaltyMode;

/// Reflect one velocity component off a wall, losing speed to `penalty`.
///
/// The result points the other way and is never faster than the input.
/// `Proportional` keeps `1 - penalty` of the speed (penalty clamped to 0..=1);
/// `Absolute` subtracts `penalty` from the speed and snaps to zero when the
/// speed is not larger than the penalty.
#[inline]
pub fn reflect(v: f32, penalty: f32, mode: PenaltyMode) -> f32 {
    let reversed = -v;
    match mode {
        PenaltyMode::Proportional => reversed * (1.0 - penalty.clamp(0.0, 1.0)),
        PenaltyMode::Absolute => {
            let penalty = penalty.abs();
            if reversed.abs() <= penalty {
                0.0
            } else {
                reversed - penalty * reversed.signum()
            }
        }
    }
}

/// Arena edges a bounding rectangle is touching or crossing.
///
/// At most one edge per axis: Left wins over Right and Top over Bottom when a
/// body is larger than the arena.
pub fn boundary_edges(bounds: &Bounds, width: f32, height: f32) -> Edges {
    let mut edges = Edges::NONE;
    if bounds.min.x <= 0.0 {
        edges.insert(Edge::Left);
    } else if bounds.max.x >= width {
        edges.insert(Edge::Right);
    }
    if bounds.min.y <= 0.0 {
        edges.insert(Edge::Top);
    } else if bounds.max.y >= height {
        edges.insert(Edge::Bottom);
    }
    edges
}

/// Pull a resting body back inside the arena along the axis of `edge`
pub fn clamp_to_edge(
    position: &mut Vec2,
    half_extents: Vec2,
    edge: Edge,
    width: f32,
    height: f32,
) {
    match edge {
        Edge::Left => position.x = position.x.max(half_extents.x),
        Edge::Right => position.x = position.x.min(width - half_extents.x),
        Edge::Top => position.y = position.y.max(half_extents.y),
        Edge::Bottom => position.y = position.y.min(height - half_extents.y),
    }
}

/// Broad phase: candidate pairs whose centers are within the widest body's
/// width of each other along X.
///
/// Using the largest width for every pair keeps the cull conservative: any two
/// overlapping rectangles are always returned. Pairs come back as `(i, j)`
/// indices into `bodies` with `i < j`, each pair once.
pub fn broad_phase(bodies: &[Body]) -> Vec<(usize, usize)> {
    let max_w = bodies
        .iter()
        .map(|b| b.bounds().width())
        .fold(0.0_f32, f32::max);

    // Sweep over bodies sorted by X; stable sort keeps equal-X bodies in
    // insertion order
    let mut order: Vec<usize> = (0..bodies.len()).collect();
    order.sort_by(|&a, &b| {
        bodies[a]
            .position
            .x
            .partial_cmp(&bodies[b].position.x)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut pairs = Vec::new();
    for (k, &i) in order.iter().enumerate() {
        let xi = bodies[i].position.x;
        for &j in &order[k + 1..] {
            if bodies[j].position.x - xi > max_w {
                break;
            }
            pairs.push((i.min(j), i.max(j)));
        }
    }
    pairs.sort_unstable();
    pairs
}

/// Narrow phase: per-axis penetration depth if the two bodies overlap
pub fn overlap(a: &Body, b: &Body) -> Option<Vec2> {
    let delta = (b.position - a.position).abs();
    let reach = a.half_extents + b.half_extents;
    let depth = reach - delta;
    if depth.x > 0.0 && depth.y > 0.0 {
        Some(depth)
    } else {
        None
    }
}

/// Unit vector from `a` toward `b`.
///
/// Coincident centers fall back to the relative velocity direction, then +X,
/// so the result is always a finite unit vector.
pub fn contact_normal(a: &Body, b: &Body) -> Vec2 {
    (b.position - a.position)
        .try_normalize()
        .or_else(|| (a.velocity - b.velocity).try_normalize())
        .unwrap_or(Vec2::X)
}

/// Semi-elastic velocity exchange between two bodies along `normal`.
///
/// Per axis, each body moves `|normal.axis| * transfer` of the way toward the
/// other's velocity, then keeps `1 - penalty` of the result. Both outputs are
/// computed from the incoming velocities, so argument order does not bias the
/// result. With penalty 0 the velocity sum of the pair is unchanged.
pub fn transfer_velocity(
    v_a: Vec2,
    v_b: Vec2,
    normal: Vec2,
    transfer: f32,
    penalty: f32,
) -> (Vec2, Vec2) {
    exchange(v_a, v_b, normal, transfer, penalty, 1.0, 1.0)
}

/// Mass-weighted variant of [`transfer_velocity`]: the lighter body takes
/// the larger share of the exchange, so momentum (not the velocity sum) is
/// conserved with penalty 0. Equal masses match [`transfer_velocity`].
pub fn transfer_velocity_weighted(
    v_a: Vec2,
    m_a: f32,
    v_b: Vec2,
    m_b: f32,
    normal: Vec2,
    transfer: f32,
    penalty: f32,
) -> (Vec2, Vec2) {
    let total = m_a + m_b;
    exchange(
        v_a,
        v_b,
        normal,
        transfer,
        penalty,
        2.0 * m_b / total,
        2.0 * m_a / total,
    )
}

fn exchange(
    v_a: Vec2,
    v_b: Vec2,
    normal: Vec2,
    transfer: f32,
    penalty: f32,
    w_a: f32,
    w_b: f32,
) -> (Vec2, Vec2) {
    let k = normal.abs() * transfer.clamp(0.0, 1.0);
    let keep = 1.0 - penalty.clamp(0.0, 1.0);

    let delta = v_b - v_a;
    let new_a = (v_a + k * w_a * delta) * keep;
    let new_b = (v_b - k * w_b * delta) * keep;
    (new_a, new_b)
}
