//! Windowed breadth-first distance field used to plan monster paths.

use jinri_core::{Grid, TileCoord, TileRect};

/// Cell value of an obstacle, or of any cell outside the current window.
pub const OBSTACLE: i32 = -1;

/// Cell value of a walkable cell the flood has not reached.
pub const UNVISITED: i32 = 0;

/// Dense integer field over the whole grid.
///
/// Values are [`OBSTACLE`], [`UNVISITED`], or the breadth-first distance from
/// the goal, the goal itself holding `1`. The contents are only meaningful
/// until the next call to [`FlowField::reload_obstacles`].
#[derive(Clone, Debug, Default)]
pub struct FlowField {
    grid: Grid,
    window: Option<TileRect>,
    cells: Vec<i32>,
}

impl FlowField {
    /// Creates an empty field covering `grid`.
    #[must_use]
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            window: None,
            cells: vec![OBSTACLE; grid.cell_count()],
        }
    }

    /// Grid the field covers.
    #[must_use]
    pub const fn grid(&self) -> Grid {
        self.grid
    }

    /// Window the last reload opened, if any.
    #[must_use]
    pub const fn window(&self) -> Option<TileRect> {
        self.window
    }

    /// Resets every cell of `window` to [`UNVISITED`], then marks `obstacles`.
    ///
    /// Cells outside the window read as obstacles, so neither the flood nor the
    /// descent ever leaves it.
    pub fn reload_obstacles<I>(&mut self, window: TileRect, obstacles: I)
    where
        I: IntoIterator<Item = TileCoord>,
    {
        if self.cells.len() != self.grid.cell_count() {
            self.cells = vec![OBSTACLE; self.grid.cell_count()];
        } else {
            self.cells.fill(OBSTACLE);
        }
        self.window = Some(window);

        for tile in window.iter() {
            if let Some(index) = self.grid.index(tile) {
                self.cells[index] = UNVISITED;
            }
        }

        for tile in obstacles {
            if !window.contains(tile) {
                continue;
            }
            if let Some(index) = self.grid.index(tile) {
                self.cells[index] = OBSTACLE;
            }
        }
    }

    /// Floods distances outward from `goal` one wave at a time.
    ///
    /// A cell keeps the first distance written to it. Each wave is
    /// deduplicated by linear index before it is expanded.
    pub fn flood_from(&mut self, goal: TileCoord) {
        let Some(goal_index) = self.grid.index(goal) else {
            return;
        };
        if self.cells[goal_index] != UNVISITED {
            return;
        }

        let mut wave = vec![goal_index];
        let mut distance = 1;
        while !wave.is_empty() {
            let mut next = Vec::new();
            for &index in &wave {
                if self.cells[index] != UNVISITED {
                    continue;
                }
                self.cells[index] = distance;

                let Some(tile) = self.grid.coord_of(index) else {
                    continue;
                };
                for neighbor in neighbors(tile) {
                    let Some(neighbor_index) = self.grid.index(neighbor) else {
                        continue;
                    };
                    if self.cells[neighbor_index] == UNVISITED {
                        next.push(neighbor_index);
                    }
                }
            }

            next.sort_unstable();
            next.dedup();
            wave = next;
            distance += 1;
        }
    }

    /// Value stored for `tile`, or `None` outside the grid.
    #[must_use]
    pub fn value(&self, tile: TileCoord) -> Option<i32> {
        self.grid
            .index(tile)
            .and_then(|index| self.cells.get(index).copied())
    }

    /// Walks downhill from `start` until the goal is reached.
    ///
    /// Each step takes the reachable neighbour with the smallest distance,
    /// ties resolved in the order up, right, down, left. The returned path
    /// excludes `start` and includes the goal. Returns `None` when the walk
    /// gets stuck or grows past `max_length` tiles.
    #[must_use]
    pub fn descend(&self, start: TileCoord, max_length: usize) -> Option<Vec<TileCoord>> {
        let mut path = Vec::new();
        let mut current = start;

        while self.value(current) != Some(1) {
            let next = neighbors(current)
                .filter_map(|tile| self.value(tile).map(|value| (tile, value)))
                .filter(|&(_, value)| value >= 1)
                .fold(None, |best: Option<(TileCoord, i32)>, candidate| match best {
                    Some((_, value)) if value <= candidate.1 => best,
                    _ => Some(candidate),
                });
            let (tile, _) = next?;

            path.push(tile);
            if path.len() > max_length {
                return None;
            }
            current = tile;
        }

        Some(path)
    }
}

/// Four-connected neighbours in the order up, right, down, left.
fn neighbors(tile: TileCoord) -> impl Iterator<Item = TileCoord> {
    [(0, -1), (1, 0), (0, 1), (-1, 0)]
        .into_iter()
        .map(move |(columns, rows)| tile.offset(columns, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_field(columns: u32, rows: u32, goal: TileCoord) -> FlowField {
        let grid = Grid::new(columns, rows);
        let mut field = FlowField::new(grid);
        let window = TileRect::around(goal, 50, &grid).unwrap();
        field.reload_obstacles(window, []);
        field.flood_from(goal);
        field
    }

    #[test]
    fn goal_holds_one_and_neighbours_count_outward() {
        let field = open_field(3, 4, TileCoord::new(1, 2));

        assert_eq!(field.value(TileCoord::new(1, 2)), Some(1));
        assert_eq!(field.value(TileCoord::new(1, 1)), Some(2));
        assert_eq!(field.value(TileCoord::new(1, 0)), Some(3));
        assert_eq!(field.value(TileCoord::new(0, 0)), Some(4));
    }

    #[test]
    fn obstacles_force_a_detour() {
        let grid = Grid::new(3, 4);
        let goal = TileCoord::new(1, 2);
        let wall = TileCoord::new(1, 1);
        let mut field = FlowField::new(grid);
        field.reload_obstacles(TileRect::around(goal, 10, &grid).unwrap(), [wall]);
        field.flood_from(goal);

        assert_eq!(field.value(wall), Some(OBSTACLE));
        assert_eq!(field.value(TileCoord::new(1, 0)), Some(5));
        assert_eq!(field.value(TileCoord::new(0, 1)), Some(3));
    }

    #[test]
    fn cells_outside_the_window_stay_obstacles() {
        let grid = Grid::new(10, 10);
        let mut field = FlowField::new(grid);
        let window = TileRect::around(TileCoord::new(2, 2), 1, &grid).unwrap();
        field.reload_obstacles(window, [TileCoord::new(8, 8)]);
        field.flood_from(TileCoord::new(2, 2));

        assert_eq!(field.value(TileCoord::new(3, 3)), Some(3));
        assert_eq!(field.value(TileCoord::new(4, 2)), Some(OBSTACLE));
        assert_eq!(field.value(TileCoord::new(10, 2)), None);
    }

    #[test]
    fn blocked_goal_floods_nothing() {
        let grid = Grid::new(4, 4);
        let goal = TileCoord::new(2, 2);
        let mut field = FlowField::new(grid);
        field.reload_obstacles(TileRect::around(goal, 4, &grid).unwrap(), [goal]);
        field.flood_from(goal);

        assert!(TileRect::around(goal, 4, &grid)
            .unwrap()
            .iter()
            .all(|tile| field.value(tile).is_some_and(|value| value <= UNVISITED)));
        assert_eq!(field.descend(TileCoord::new(0, 0), 250), None);
    }

    #[test]
    fn descent_prefers_up_then_right_on_ties() {
        let field = open_field(5, 5, TileCoord::new(3, 1));

        let path = field.descend(TileCoord::new(1, 3), 250).unwrap();

        assert_eq!(
            path,
            vec![
                TileCoord::new(1, 2),
                TileCoord::new(1, 1),
                TileCoord::new(2, 1),
                TileCoord::new(3, 1),
            ]
        );
    }

    #[test]
    fn descent_respects_the_length_cutoff() {
        let field = open_field(20, 1, TileCoord::new(19, 0));

        assert_eq!(field.descend(TileCoord::new(0, 0), 5), None);
        assert_eq!(field.descend(TileCoord::new(0, 0), 19).map(|path| path.len()), Some(19));
    }

    #[test]
    fn starting_on_the_goal_yields_an_empty_path() {
        let field = open_field(4, 4, TileCoord::new(2, 2));

        assert_eq!(field.descend(TileCoord::new(2, 2), 250), Some(Vec::new()));
    }
}
