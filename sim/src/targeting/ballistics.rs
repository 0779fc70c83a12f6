//! Vertical aim compensation for projectile drop.

use crate::components::UnitClass;
use glam::Vec3;

/// Horizontal distances below this are treated as "already on target".
const MIN_HORIZONTAL_DISTANCE: f32 = 1.0e-4;

/// Vertical launch velocity so a projectile flying at `horizontal_speed`
/// reaches a point `horizontal_distance` away and `vertical_distance` higher.
///
/// `gravity_z` is the signed vertical acceleration (negative pulls down).
/// Returns 0 when there is no horizontal distance to cover.
pub fn vertical_aim_offset(
    horizontal_distance: f32,
    horizontal_speed: f32,
    vertical_distance: f32,
    gravity_z: f32,
) -> f32 {
    if horizontal_distance <= MIN_HORIZONTAL_DISTANCE || horizontal_speed <= 0.0 {
        return 0.0;
    }

    let time_to_target = horizontal_distance / horizontal_speed;
    let gravity_drop = 0.5 * gravity_z * time_to_target * time_to_target;
    (vertical_distance - gravity_drop) / time_to_target
}

/// Aim offset for a shot from `muzzle` to `aim_point` fired by `shooter`.
pub fn aim_offset_between(muzzle: Vec3, aim_point: Vec3, shooter: UnitClass, gravity_z: f32) -> f32 {
    let horizontal_distance = (aim_point.truncate() - muzzle.truncate()).length();
    vertical_aim_offset(
        horizontal_distance,
        shooter.projectile_speed(),
        aim_point.z - muzzle.z,
        gravity_z,
    )
}
