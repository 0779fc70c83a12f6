//! Phased area partitioning.
//!
//! An agent's search area is a `breadth x breadth` grid of square sub-cells
//! laid out in front of it. Each pass looks at exactly one sub-cell, chosen by
//! the shared phase counter, so the whole area is swept once every
//! `breadth * breadth` passes.
//!
//! ```text
//!            forward
//!               ^
//!   +-----+-----+-----+
//!   |  6  |  7  |  8  |
//!   +-----+-----+-----+
//!   |  3  |  4  |  5  |
//!   +-----+-----+-----+
//!   |  0  |  1  |  2  |
//!   +-----+--A--+-----+ --> right
//! ```

use crate::components::Transform;
use crate::geometry::SearchArea;

/// Sub-cell `phase` of the agent's search grid, in world space.
///
/// `phase` is reduced modulo `breadth * breadth`. `breadth` must be at least 1.
pub fn search_area_for_phase(phase: u8, transform: &Transform, breadth: u8, cell_size: f32) -> SearchArea {
    debug_assert!(breadth > 0, "search breadth must be at least 1");
    let breadth = u32::from(breadth.max(1));
    let slot = u32::from(phase) % (breadth * breadth);
    let column = (slot % breadth) as f32;
    let row = (slot / breadth) as f32;

    let forward = transform.forward();
    let right = transform.right();
    let grid_width = breadth as f32 * cell_size;
    let bottom_left = transform.translation - right * (grid_width / 2.0);

    let half = cell_size / 2.0;
    let center = bottom_left + right * (column * cell_size + half) + forward * (row * cell_size + half);

    SearchArea {
        center,
        forward,
        right,
        half_extent: half,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_identical_inputs_give_identical_area() {
        let t = Transform::from_heading(Vec3::new(12.0, -4.0, 1.0), 0.7);
        let a = search_area_for_phase(5, &t, 3, 20.0);
        let b = search_area_for_phase(5, &t, 3, 20.0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_first_row_is_in_front_of_agent() {
        let t = Transform::default();
        let middle = search_area_for_phase(1, &t, 3, 20.0);
        // Column 1 of 3 is centred on the agent laterally, row 0 starts at the agent
        assert!((middle.center - Vec3::new(10.0, 0.0, 0.0)).length() < 1.0e-4);
        assert!(middle.contains(Vec3::new(5.0, 0.0, 0.0)));
    }

    #[test]
    fn test_rotation_covers_grid_exactly_once() {
        let breadth = 3u8;
        let cell = 20.0;
        let t = Transform::from_heading(Vec3::new(3.0, 7.0, 0.0), 1.2);
        let phase_count = breadth * breadth;

        let areas: Vec<_> = (0..phase_count)
            .map(|phase| search_area_for_phase(phase, &t, breadth, cell))
            .collect();

        // Sample every sub-cell centre in the agent's local frame
        for row in 0..breadth {
            for column in 0..breadth {
                let local_right = (column as f32 + 0.5) * cell - breadth as f32 * cell / 2.0;
                let local_forward = (row as f32 + 0.5) * cell;
                let point = t.translation + t.right() * local_right + t.forward() * local_forward;
                let hits = areas.iter().filter(|a| a.contains(point)).count();
                assert_eq!(hits, 1, "cell ({row}, {column}) covered {hits} times");
            }
        }
    }

    #[test]
    fn test_phase_wraps_modulo_grid() {
        let t = Transform::default();
        assert_eq!(search_area_for_phase(0, &t, 2, 10.0), search_area_for_phase(4, &t, 2, 10.0));
    }
}
