//! Model/view transform composition and axis-convention correction.
//!
//! The scene can treat either Y or Z as "up". Shapes are authored around a
//! canonical axis that may not match the active vertical axis, so each shape
//! carries an [`AuthoredAxis`] tag that resolves to one fixed remap matrix
//! (or identity when the authored axis already matches).

use glam::{Mat3, Mat4, Vec3};

/// Which world axis is treated as vertical.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerticalAxis {
    Y,
    Z,
}

/// The canonical axis a shape's geometry was generated around.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthoredAxis {
    /// Generated with +Y as its up axis (skybox, teapot).
    YUp,
    /// Generated with +Z as its up axis (grid, sphere).
    ZUp,
    /// Generated along +Z but displayed lying along +X (cylinder, torus).
    ZAlong,
    /// Matches the world in either convention (ground handles its own tilt).
    World,
}

/// Rotates +Y into +Z (and +Z into -Y). Column-major.
pub const CONVERT_Y2Z: Mat4 = Mat4::from_cols_array(&[
    1.0, 0.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, -1.0, 0.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
]);

/// Rotates +Z into +Y (and +Y into -Z). Column-major.
pub const CONVERT_Z2Y: Mat4 = Mat4::from_cols_array(&[
    1.0, 0.0, 0.0, 0.0, //
    0.0, 0.0, -1.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
]);

/// Rotates +Z into +X (and +X into -Z). Column-major.
pub const CONVERT_Z2X: Mat4 = Mat4::from_cols_array(&[
    0.0, 0.0, -1.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    1.0, 0.0, 0.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
]);

/// Resolves the remap a shape needs under the active vertical axis.
pub fn resolve_remap(authored: AuthoredAxis, vertical: VerticalAxis) -> Mat4 {
    match (authored, vertical) {
        (AuthoredAxis::YUp, VerticalAxis::Z) => CONVERT_Y2Z,
        (AuthoredAxis::ZUp, VerticalAxis::Y) => CONVERT_Z2Y,
        (AuthoredAxis::ZAlong, _) => CONVERT_Z2X,
        _ => Mat4::IDENTITY,
    }
}

/// Builds a rotation from Euler angles in degrees, intrinsic Z then Y then X.
/// This order is what makes the Y-up and Z-up camera start poses produce the
/// same view: yaw happens about the world vertical first.
pub fn rotation_from_euler(euler_deg: Vec3) -> Mat4 {
    Mat4::from_rotation_z(euler_deg.z.to_radians())
        * Mat4::from_rotation_y(euler_deg.y.to_radians())
        * Mat4::from_rotation_x(euler_deg.x.to_radians())
}

/// Composes a model matrix from a position and Euler angles in degrees.
pub fn model_matrix(position: Vec3, euler_deg: Vec3) -> Mat4 {
    Mat4::from_translation(position) * rotation_from_euler(euler_deg)
}

/// Inverts a rotation+translation matrix by treating the upper-left 3x3 as a
/// pure rotation (transpose). An approximation that ignores scale, not a
/// general affine inverse.
pub fn inverse_ignore_scale(m: &Mat4) -> Mat4 {
    let rotation_t = Mat3::from_mat4(*m).transpose();
    let translation = m.w_axis.truncate();
    let mut inv = Mat4::from_mat3(rotation_t);
    inv.w_axis = (-(rotation_t * translation)).extend(1.0);
    inv
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec4, vec3};

    const TOLERANCE: f32 = 1e-5;

    fn assert_mat4_eq(a: &Mat4, b: &Mat4) {
        let a = a.to_cols_array();
        let b = b.to_cols_array();
        for i in 0..16 {
            assert!(
                (a[i] - b[i]).abs() < TOLERANCE,
                "matrices differ at element {i}: {} vs {}",
                a[i],
                b[i]
            );
        }
    }

    #[test]
    fn model_matrix_matches_independent_composition() {
        let position = vec3(3.0, -7.5, 12.25);
        let euler = vec3(-30.0, 45.0, 160.0);
        let expected = Mat4::from_translation(position)
            * Mat4::from_rotation_z(160.0_f32.to_radians())
            * Mat4::from_rotation_y(45.0_f32.to_radians())
            * Mat4::from_rotation_x((-30.0_f32).to_radians());
        assert_mat4_eq(&model_matrix(position, euler), &expected);
    }

    #[test]
    fn inverse_ignore_scale_round_trips() {
        let cases = [
            (vec3(0.0, 0.0, 0.0), vec3(0.0, 0.0, 0.0)),
            (vec3(5.0, -4.0, 2.0), vec3(90.0, 0.0, 0.0)),
            (vec3(15.0, 15.0, 15.0), vec3(-30.0, 45.0, 0.0)),
            (vec3(-1.0, 22.0, 0.5), vec3(17.0, -123.0, 78.0)),
        ];
        for (position, euler) in cases {
            let m = model_matrix(position, euler);
            assert_mat4_eq(&(inverse_ignore_scale(&m) * m), &Mat4::IDENTITY);
        }
    }

    #[test]
    fn remaps_are_mutually_consistent() {
        assert_mat4_eq(&(CONVERT_Y2Z * CONVERT_Z2Y), &Mat4::IDENTITY);
        assert_mat4_eq(&(CONVERT_Z2Y * CONVERT_Y2Z), &Mat4::IDENTITY);
    }

    #[test]
    fn remaps_are_orthogonal() {
        for remap in [CONVERT_Y2Z, CONVERT_Z2Y, CONVERT_Z2X] {
            assert_mat4_eq(&(remap * remap.transpose()), &Mat4::IDENTITY);
        }
    }

    #[test]
    fn remaps_move_the_expected_axes() {
        let y = Vec4::new(0.0, 1.0, 0.0, 0.0);
        let z = Vec4::new(0.0, 0.0, 1.0, 0.0);
        assert!((CONVERT_Y2Z * y - z).length() < TOLERANCE);
        assert!((CONVERT_Z2Y * z - y).length() < TOLERANCE);
        assert!((CONVERT_Z2X * z - Vec4::new(1.0, 0.0, 0.0, 0.0)).length() < TOLERANCE);
    }

    #[test]
    fn matching_authored_axis_needs_no_remap() {
        assert_mat4_eq(
            &resolve_remap(AuthoredAxis::YUp, VerticalAxis::Y),
            &Mat4::IDENTITY,
        );
        assert_mat4_eq(
            &resolve_remap(AuthoredAxis::ZUp, VerticalAxis::Z),
            &Mat4::IDENTITY,
        );
        assert_mat4_eq(
            &resolve_remap(AuthoredAxis::World, VerticalAxis::Y),
            &Mat4::IDENTITY,
        );
    }

    #[test]
    fn mismatched_authored_axis_resolves_to_fixed_remap() {
        assert_mat4_eq(
            &resolve_remap(AuthoredAxis::YUp, VerticalAxis::Z),
            &CONVERT_Y2Z,
        );
        assert_mat4_eq(
            &resolve_remap(AuthoredAxis::ZUp, VerticalAxis::Y),
            &CONVERT_Z2Y,
        );
        assert_mat4_eq(
            &resolve_remap(AuthoredAxis::ZAlong, VerticalAxis::Y),
            &CONVERT_Z2X,
        );
        assert_mat4_eq(
            &resolve_remap(AuthoredAxis::ZAlong, VerticalAxis::Z),
            &CONVERT_Z2X,
        );
    }
}
