//! Grid-locked movement shared by the player and the adversaries.
//!
//! Positions are continuous but turns only happen through tile centers and
//! collision is tested half a tile ahead of the mover, which keeps entities on
//! the corridor lattice without quantising visible motion.

use maze_chase_core::{CellCoord, Direction, Position};

use crate::grid::GridMap;

/// Geometry constants the motion model depends on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Geometry {
    tile_length: f32,
    snap_threshold: f32,
}

impl Geometry {
    /// Creates a geometry from the tile side length and the turn snapping radius.
    #[must_use]
    pub const fn new(tile_length: f32, snap_threshold: f32) -> Self {
        Self {
            tile_length,
            snap_threshold,
        }
    }

    /// Side length of a square tile in world units.
    #[must_use]
    pub const fn tile_length(&self) -> f32 {
        self.tile_length
    }

    /// Tile containing the position.
    #[must_use]
    pub fn cell_of(&self, position: Position) -> CellCoord {
        CellCoord::new(
            (position.x / self.tile_length).floor() as i32,
            (position.y / self.tile_length).floor() as i32,
        )
    }

    /// Exact center of the tile.
    #[must_use]
    pub fn center_of(&self, cell: CellCoord) -> Position {
        let half = self.tile_length / 2.0;
        Position::new(
            cell.column() as f32 * self.tile_length + half,
            cell.row() as f32 * self.tile_length + half,
        )
    }

    /// Reports whether the position is close enough to its tile center to turn.
    #[must_use]
    pub fn at_decision_point(&self, position: Position) -> bool {
        let center = self.center_of(self.cell_of(position));
        position.distance(center) < self.snap_threshold
    }
}

/// Kinematic state of a moving entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    /// Continuous position in world units.
    pub position: Position,
    /// Active direction of travel.
    pub direction: Option<Direction>,
    /// Desired direction, committed at the next tile center that allows it.
    pub queued: Option<Direction>,
    /// Distance travelled per tick.
    pub speed: f32,
}

impl Body {
    /// Creates a stationary body centered on the provided tile.
    #[must_use]
    pub fn at_rest(geometry: &Geometry, cell: CellCoord, speed: f32) -> Self {
        Self {
            position: geometry.center_of(cell),
            direction: None,
            queued: None,
            speed,
        }
    }
}

/// Advances a body by one tick.
pub fn advance(body: &mut Body, grid: &GridMap, geometry: &Geometry, breach_capable: bool) {
    let cell = geometry.cell_of(body.position);
    let center = geometry.center_of(cell);

    if let Some(queued) = body.queued {
        if body.direction != Some(queued)
            && body.position.distance(center) < geometry.snap_threshold
            && grid.is_passable(cell.step(queued), breach_capable)
        {
            body.position = center;
            body.direction = Some(queued);
        }
    }

    if let Some(direction) = body.direction {
        let (dx, dy) = direction.unit();
        let tentative = Position::new(
            body.position.x + dx * body.speed,
            body.position.y + dy * body.speed,
        );
        let half = geometry.tile_length / 2.0;
        let probe = Position::new(tentative.x + dx * half, tentative.y + dy * half);

        if grid.is_passable(geometry.cell_of(probe), breach_capable) {
            body.position = tentative;
        } else {
            let ahead = (body.position.x - center.x) * dx + (body.position.y - center.y) * dy;
            if ahead >= 0.0 {
                body.position = center;
                body.direction = None;
            } else if -ahead < body.speed {
                body.position = center;
            } else {
                body.position = tentative;
            }
        }
    }

    wrap_and_clamp(&mut body.position, grid, geometry);
}

fn wrap_and_clamp(position: &mut Position, grid: &GridMap, geometry: &Geometry) {
    let half = geometry.tile_length / 2.0;
    let width = grid.columns() as f32 * geometry.tile_length;
    let height = grid.rows() as f32 * geometry.tile_length;

    if position.x < -half {
        position.x = width + half;
    } else if position.x > width + half {
        position.x = -half;
    }

    position.x = position.x.clamp(-half, width + half);
    position.y = position.y.clamp(0.0, height);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Layout;

    const GEOMETRY: Geometry = Geometry::new(20.0, 5.0);

    fn corridor() -> GridMap {
        GridMap::new(
            &Layout::parse(concat!(
                "#######\n",
                "#P...%#\n",
                "#.#####\n",
                "#######\n",
            ))
            .expect("valid layout"),
        )
    }

    fn tunnel() -> GridMap {
        GridMap::new(
            &Layout::parse(concat!(
                "#####\n",
                "..P..\n",
                "#####\n",
            ))
            .expect("valid layout"),
        )
    }

    #[test]
    fn queued_turn_snaps_onto_center() {
        let grid = corridor();
        let mut body = Body::at_rest(&GEOMETRY, CellCoord::new(1, 1), 3.5);
        body.position.x += 3.0;
        body.direction = Some(Direction::Left);
        body.queued = Some(Direction::Down);

        advance(&mut body, &grid, &GEOMETRY, false);

        assert_eq!(body.direction, Some(Direction::Down));
        assert!((body.position.x - 30.0).abs() < 1e-4);
        assert!((body.position.y - 33.5).abs() < 1e-4);
    }

    #[test]
    fn turn_into_wall_is_deferred() {
        let grid = corridor();
        let mut body = Body::at_rest(&GEOMETRY, CellCoord::new(2, 1), 3.5);
        body.direction = Some(Direction::Right);
        body.queued = Some(Direction::Down);

        advance(&mut body, &grid, &GEOMETRY, false);

        assert_eq!(body.direction, Some(Direction::Right));
        assert_eq!(body.queued, Some(Direction::Down));
        assert!((body.position.x - 53.5).abs() < 1e-4);
    }

    #[test]
    fn blocked_mover_stops_on_center() {
        let grid = corridor();
        let mut body = Body::at_rest(&GEOMETRY, CellCoord::new(3, 1), 3.5);
        body.direction = Some(Direction::Right);
        body.queued = Some(Direction::Right);

        for _ in 0..20 {
            advance(&mut body, &grid, &GEOMETRY, false);
            let cell = GEOMETRY.cell_of(body.position);
            assert!(grid.is_passable(cell, false), "entered {cell:?}");
        }

        assert_eq!(body.position, GEOMETRY.center_of(CellCoord::new(4, 1)));
        assert_eq!(body.direction, None);
    }

    #[test]
    fn approach_never_overshoots_center() {
        let grid = corridor();
        let mut body = Body::at_rest(&GEOMETRY, CellCoord::new(4, 1), 3.5);
        body.position.x -= 2.0;
        body.direction = Some(Direction::Right);

        advance(&mut body, &grid, &GEOMETRY, false);

        assert_eq!(body.position, GEOMETRY.center_of(CellCoord::new(4, 1)));
        assert_eq!(body.direction, Some(Direction::Right));
    }

    #[test]
    fn breach_capable_mover_enters_breakable_wall() {
        let grid = corridor();
        let mut body = Body::at_rest(&GEOMETRY, CellCoord::new(4, 1), 3.5);
        body.direction = Some(Direction::Right);

        for _ in 0..6 {
            advance(&mut body, &grid, &GEOMETRY, true);
        }

        assert_eq!(GEOMETRY.cell_of(body.position), CellCoord::new(5, 1));
    }

    #[test]
    fn tunnel_wraps_to_opposite_edge() {
        let grid = tunnel();
        let mut body = Body::at_rest(&GEOMETRY, CellCoord::new(0, 1), 3.5);
        body.direction = Some(Direction::Left);

        let mut wrapped = false;
        for _ in 0..10 {
            advance(&mut body, &grid, &GEOMETRY, false);
            if body.position.x > 100.0 {
                wrapped = true;
                break;
            }
        }

        assert!(wrapped, "body never wrapped: {:?}", body.position);
        assert!((body.position.x - 110.0).abs() < 1e-4);
        assert_eq!(body.direction, Some(Direction::Left));

        advance(&mut body, &grid, &GEOMETRY, false);
        assert!(body.position.x < 110.0);
        assert!(body.position.x <= 100.0 + 10.0);
    }
}
