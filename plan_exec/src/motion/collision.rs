//! # Collision Checking

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use crate::map::InflatedGrid;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Something the motion model can test positions against.
pub trait CollisionChecker {
    /// True if the robot can't be at the world position `(x_m, y_m)`.
    fn collides(&self, x_m: f64, y_m: f64) -> bool;
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CollisionChecker for InflatedGrid {
    /// Points outside the grid always collide.
    fn collides(&self, x_m: f64, y_m: f64) -> bool {
        match self.world_to_cell(x_m, y_m) {
            Some((row, col)) => self.is_occupied(row, col),
            None => true,
        }
    }
}

impl<F> CollisionChecker for F
where
    F: Fn(f64, f64) -> bool,
{
    fn collides(&self, x_m: f64, y_m: f64) -> bool {
        self(x_m, y_m)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::map::{inflate, MapParams, OccupancyGrid};

    #[test]
    fn test_grid_collisions() {
        let mut raw = OccupancyGrid::new_free(100, 60, 0.1).unwrap();
        raw.add_obstacle((30, 30), (50, 50));
        let params = MapParams {
            robot_size_m: 0.1,
            inflation_ratio: 2.0,
            ..Default::default()
        };
        let grid = inflate(&raw, &params).unwrap();

        assert!(!grid.collides(2.55, 1.55));
        assert!(grid.collides(5.05, 3.05));
        assert!(grid.collides(4.85, 2.85));

        // Border ring and outside the grid
        assert!(grid.collides(0.05, 3.0));
        assert!(grid.collides(3.0, 5.95));
        assert!(grid.collides(-1.0, 3.0));
        assert!(grid.collides(3.0, 6.5));
        assert!(grid.collides(f64::INFINITY, 3.0));
    }
}
