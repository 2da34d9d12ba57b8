use rustc_hash::FxHashMap;
use tinymush_common::limits::DEFAULT_MAX_GRID_SIZE;
use tinymush_common::Dbref;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GridError {
    #[error("grid dimensions exceed the configured cell limit")]
    TooLarge,
    #[error("coordinate is out of range for the grid's current dimensions")]
    OutOfRange,
}

#[derive(Debug, Clone)]
struct Grid {
    width: usize,
    height: usize,
    cells: Vec<String>,
}

impl Grid {
    fn new(width: usize, height: usize) -> Self {
        Grid {
            width,
            height,
            cells: vec![String::new(); width * height],
        }
    }

    fn index(&self, x: usize, y: usize) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y * self.width + x)
        } else {
            None
        }
    }
}

/// Per-object dense 2-D matrix of string cells, bounded by
/// `max_grid_size` total cells (spec.md §3).
#[derive(Debug, Default)]
pub struct GridStore {
    grids: FxHashMap<Dbref, Grid>,
    max_cells: usize,
}

impl GridStore {
    pub fn new() -> Self {
        GridStore {
            grids: FxHashMap::default(),
            max_cells: DEFAULT_MAX_GRID_SIZE,
        }
    }

    /// (Re)allocates `obj`'s grid to `width` x `height`, clearing all cells.
    pub fn resize(&mut self, obj: Dbref, width: usize, height: usize) -> Result<(), GridError> {
        if width.saturating_mul(height) > self.max_cells {
            return Err(GridError::TooLarge);
        }
        self.grids.insert(obj, Grid::new(width, height));
        Ok(())
    }

    pub fn dimensions(&self, obj: Dbref) -> Option<(usize, usize)> {
        self.grids.get(&obj).map(|g| (g.width, g.height))
    }

    pub fn get(&self, obj: Dbref, x: usize, y: usize) -> &str {
        self.grids
            .get(&obj)
            .and_then(|g| g.index(x, y).map(|i| g.cells[i].as_str()))
            .unwrap_or("")
    }

    pub fn set(&mut self, obj: Dbref, x: usize, y: usize, value: &str) -> Result<(), GridError> {
        let grid = self.grids.get_mut(&obj).ok_or(GridError::OutOfRange)?;
        let idx = grid.index(x, y).ok_or(GridError::OutOfRange)?;
        grid.cells[idx] = value.to_string();
        Ok(())
    }

    /// Drops the entire grid, returning ownership of its space (called on
    /// object destruction).
    pub fn clear_object(&mut self, obj: Dbref) {
        self.grids.remove(&obj);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_round_trips() {
        let mut g = GridStore::new();
        let obj = Dbref(1);
        g.resize(obj, 3, 3).unwrap();
        g.set(obj, 1, 2, "hi").unwrap();
        assert_eq!(g.get(obj, 1, 2), "hi");
        assert_eq!(g.get(obj, 0, 0), "");
    }

    #[test]
    fn out_of_range_coordinates_are_rejected() {
        let mut g = GridStore::new();
        let obj = Dbref(1);
        g.resize(obj, 2, 2).unwrap();
        assert_eq!(g.set(obj, 5, 5, "x"), Err(GridError::OutOfRange));
        assert_eq!(g.get(obj, 5, 5), "");
    }

    #[test]
    fn resize_beyond_cap_is_rejected() {
        let mut g = GridStore {
            grids: FxHashMap::default(),
            max_cells: 4,
        };
        let obj = Dbref(1);
        assert_eq!(g.resize(obj, 3, 3), Err(GridError::TooLarge));
        assert!(g.resize(obj, 2, 2).is_ok());
    }

    #[test]
    fn clearing_object_drops_its_grid() {
        let mut g = GridStore::new();
        let obj = Dbref(1);
        g.resize(obj, 2, 2).unwrap();
        g.clear_object(obj);
        assert_eq!(g.dimensions(obj), None);
    }
}
