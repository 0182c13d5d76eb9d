//! Blending utilities for local transform components.
//! - Vec3 linear interpolation for scale and position
//! - quaternion slerp (shortest-arc)
//! - Euler-degree conversions (Z, then X, then Y applied; Y-X-Z composition order)

use glam::{Mat3, Quat, Vec3, Vec4};

/// Linear interpolation for f32
#[inline]
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Component-wise linear interpolation; `t` is not clamped.
#[inline]
pub fn lerp_vec3(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    Vec3::new(
        lerp_f32(a.x, b.x, t),
        lerp_f32(a.y, b.y, t),
        lerp_f32(a.z, b.z, t),
    )
}

fn normalize_quat(q: Quat) -> Quat {
    let len2 = q.length_squared();
    if len2 == 0.0 || !len2.is_finite() {
        Quat::IDENTITY
    } else {
        q * len2.sqrt().recip()
    }
}

/// Slerp between two rotations, always along the shortest arc.
pub fn slerp_quat(a: Quat, b: Quat, t: f32) -> Quat {
    let qa = normalize_quat(a);
    let mut qb = normalize_quat(b);

    let mut dot = qa.dot(qb);

    // q and -q are the same rotation; flip so we travel the short way round.
    if dot < 0.0 {
        qb = -qb;
        dot = -dot;
    }

    // Nearly parallel: fall back to normalized lerp.
    const DOT_THRESHOLD: f32 = 0.9995;
    if dot > DOT_THRESHOLD {
        let v = Vec4::from(qa).lerp(Vec4::from(qb), t);
        return normalize_quat(Quat::from_vec4(v));
    }

    let theta_0 = dot.clamp(-1.0, 1.0).acos();
    let theta = theta_0 * t;
    let sin_theta_0 = theta_0.sin();

    let s0 = (theta_0 - theta).sin() / sin_theta_0;
    let s1 = theta.sin() / sin_theta_0;

    normalize_quat(qa * s0 + qb * s1)
}

/// Wrap an angle into [0, 360).
#[inline]
pub fn normalize_degrees(deg: f32) -> f32 {
    let w = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if w >= 360.0 {
        0.0
    } else {
        w
    }
}

/// Signed shortest difference `to - from` in degrees, in [-180, 180).
#[inline]
pub fn angle_delta_degrees(from: f32, to: f32) -> f32 {
    (to - from + 180.0).rem_euclid(360.0) - 180.0
}

/// Build a rotation from Euler angles in degrees.
///
/// The rotation applies `z` around Z first, then `x` around X, then `y` around Y,
/// i.e. `q = Ry * Rx * Rz`.
pub fn quat_from_euler_degrees(euler: Vec3) -> Quat {
    let x = euler.x.to_radians();
    let y = euler.y.to_radians();
    let z = euler.z.to_radians();
    Quat::from_rotation_y(y) * Quat::from_rotation_x(x) * Quat::from_rotation_z(z)
}

/// Decompose a rotation into Euler degrees (inverse of [`quat_from_euler_degrees`]),
/// each component wrapped into [0, 360).
pub fn euler_degrees_from_quat(q: Quat) -> Vec3 {
    let m = Mat3::from_quat(normalize_quat(q));
    // column-major: m_rc = <col c>.<row r>
    let m02 = m.z_axis.x;
    let m12 = m.z_axis.y;
    let m22 = m.z_axis.z;

    let x = (-m12).clamp(-1.0, 1.0).asin();
    let (y, z) = if m12.abs() < 0.999_999 {
        let y = m02.atan2(m22);
        let z = m.x_axis.y.atan2(m.y_axis.y);
        (y, z)
    } else {
        // Gimbal lock: fold the whole yaw/roll into Y.
        let y = (-m.x_axis.z).atan2(m.x_axis.x);
        (y, 0.0)
    };

    Vec3::new(
        normalize_degrees(x.to_degrees()),
        normalize_degrees(y.to_degrees()),
        normalize_degrees(z.to_degrees()),
    )
}
