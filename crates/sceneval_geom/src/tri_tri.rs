//! Triangle/triangle intersection.
//!
//! Touching counts as intersecting: a shared edge, a vertex resting on a
//! face or two coplanar faces pressed together all produce a contact. The
//! collision detector's separation re-check is what tells touching apart
//! from interpenetration.

use glam::{DVec2, DVec3};

/// Distances below this (in meters, against unit normals) count as lying on
/// a plane.
const PLANE_EPS: f64 = 1e-9;

/// Returns one contact point if `a` and `b` intersect or touch.
pub fn triangle_contact(a: &[DVec3; 3], b: &[DVec3; 3]) -> Option<DVec3> {
    let na = (a[1] - a[0]).cross(a[2] - a[0]).try_normalize()?;
    let nb = (b[1] - b[0]).cross(b[2] - b[0]).try_normalize()?;

    let db = b.map(|p| na.dot(p - a[0]));
    if same_side(&db) {
        return None;
    }
    let da = a.map(|p| nb.dot(p - b[0]));
    if same_side(&da) {
        return None;
    }

    let line = na.cross(nb);
    if db.iter().all(|d| d.abs() <= PLANE_EPS) || line.length_squared() < 1e-18 {
        return coplanar_contact(a, b, na);
    }

    // both triangles cross the other's plane: compare their chords along
    // the planes' intersection line
    let sa = plane_chord(a, &da)?;
    let sb = plane_chord(b, &db)?;
    let proj = |p: DVec3| line.dot(p);
    let (a_lo, a_hi) = interval(proj(sa.0), proj(sa.1));
    let (b_lo, b_hi) = interval(proj(sb.0), proj(sb.1));
    let lo = a_lo.max(b_lo);
    let hi = a_hi.min(b_hi);
    let slack = PLANE_EPS * line.length();
    if lo > hi + slack {
        return None;
    }

    // midpoint of the shared interval, placed on a's chord
    let mid = 0.5 * (lo + hi);
    let (p0, p1) = if proj(sa.0) <= proj(sa.1) { sa } else { (sa.1, sa.0) };
    let span = a_hi - a_lo;
    if span <= f64::EPSILON {
        return Some(p0);
    }
    let s = ((mid - a_lo) / span).clamp(0.0, 1.0);
    Some(p0 + (p1 - p0) * s)
}

fn same_side(d: &[f64; 3]) -> bool {
    d.iter().all(|&x| x > PLANE_EPS) || d.iter().all(|&x| x < -PLANE_EPS)
}

fn interval(x: f64, y: f64) -> (f64, f64) {
    if x <= y {
        (x, y)
    } else {
        (y, x)
    }
}

/// Segment where triangle `t` meets the plane its signed distances `d` are
/// measured against. A single touching vertex yields a zero-length chord.
fn plane_chord(t: &[DVec3; 3], d: &[f64; 3]) -> Option<(DVec3, DVec3)> {
    let mut pts: Vec<DVec3> = Vec::with_capacity(3);
    for i in 0..3 {
        if d[i].abs() <= PLANE_EPS {
            pts.push(t[i]);
        }
    }
    for (i, j) in [(0, 1), (1, 2), (2, 0)] {
        if (d[i] > PLANE_EPS && d[j] < -PLANE_EPS) || (d[i] < -PLANE_EPS && d[j] > PLANE_EPS) {
            let s = d[i] / (d[i] - d[j]);
            pts.push(t[i] + (t[j] - t[i]) * s);
        }
    }
    match pts.as_slice() {
        [] => None,
        [p] => Some((*p, *p)),
        [p, q, ..] => Some((*p, *q)),
    }
}

// ── Coplanar case ──────────────────────────────────────────────────────────

fn coplanar_contact(a: &[DVec3; 3], b: &[DVec3; 3], normal: DVec3) -> Option<DVec3> {
    // drop the dominant normal axis
    let n = normal.abs();
    let flat = |p: DVec3| -> DVec2 {
        if n.x >= n.y && n.x >= n.z {
            DVec2::new(p.y, p.z)
        } else if n.y >= n.z {
            DVec2::new(p.x, p.z)
        } else {
            DVec2::new(p.x, p.y)
        }
    };
    let a2 = a.map(flat);
    let b2 = b.map(flat);

    let mut hits: Vec<DVec3> = Vec::new();
    for i in 0..3 {
        let (p0, p1) = (a2[i], a2[(i + 1) % 3]);
        for j in 0..3 {
            let (q0, q1) = (b2[j], b2[(j + 1) % 3]);
            for s in segment_params(p0, p1, q0, q1) {
                hits.push(a[i] + (a[(i + 1) % 3] - a[i]) * s);
            }
        }
    }
    for i in 0..3 {
        if point_in_triangle(a2[i], &b2) {
            hits.push(a[i]);
        }
        if point_in_triangle(b2[i], &a2) {
            hits.push(b[i]);
        }
    }
    if hits.is_empty() {
        return None;
    }
    Some(hits.iter().copied().sum::<DVec3>() / hits.len() as f64)
}

#[inline]
fn cross2(a: DVec2, b: DVec2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Parameters along `p0→p1` where it meets `q0→q1`; two values for a
/// collinear overlap.
fn segment_params(p0: DVec2, p1: DVec2, q0: DVec2, q1: DVec2) -> Vec<f64> {
    let r = p1 - p0;
    let s = q1 - q0;
    let qp = q0 - p0;
    let denom = cross2(r, s);
    let scale = r.length() * s.length();
    if scale <= f64::EPSILON {
        return Vec::new();
    }
    if denom.abs() > PLANE_EPS * scale {
        let t = cross2(qp, s) / denom;
        let u = cross2(qp, r) / denom;
        let e = PLANE_EPS;
        if (-e..=1.0 + e).contains(&t) && (-e..=1.0 + e).contains(&u) {
            return vec![t.clamp(0.0, 1.0)];
        }
        return Vec::new();
    }
    // parallel: only collinear segments can meet
    if cross2(qp, r).abs() > PLANE_EPS * r.length().max(1.0) {
        return Vec::new();
    }
    let rr = r.length_squared();
    let t0 = qp.dot(r) / rr;
    let t1 = t0 + s.dot(r) / rr;
    let (lo, hi) = interval(t0, t1);
    let (lo, hi) = (lo.max(0.0), hi.min(1.0));
    if lo > hi + PLANE_EPS {
        return Vec::new();
    }
    vec![lo, hi.max(lo)]
}

fn point_in_triangle(p: DVec2, t: &[DVec2; 3]) -> bool {
    let d0 = cross2(t[1] - t[0], p - t[0]);
    let d1 = cross2(t[2] - t[1], p - t[1]);
    let d2 = cross2(t[0] - t[2], p - t[2]);
    let eps = PLANE_EPS;
    let has_neg = d0 < -eps || d1 < -eps || d2 < -eps;
    let has_pos = d0 > eps || d1 > eps || d2 > eps;
    !(has_neg && has_pos)
}
