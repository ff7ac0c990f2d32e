/// A fixed-size 2D tilemap grid with its origin at (0, 0).
///
/// The map does not wrap: anything outside `[0, width) x [0, height)` is
/// off-grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tilemap<T> {
    pub width: usize,
    pub height: usize,
    data: Vec<T>,
}

impl<T: Clone + Default> Tilemap<T> {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![T::default(); width * height],
        }
    }
}

impl<T: Clone> Tilemap<T> {
    pub fn new_with(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Get the index into the data array.
    ///
    /// Panics when the coordinate is off-grid.
    fn index(&self, x: usize, y: usize) -> usize {
        assert!(
            x < self.width && y < self.height,
            "tile ({}, {}) is outside the {}x{} map",
            x,
            y,
            self.width,
            self.height
        );
        y * self.width + x
    }

    pub fn get(&self, x: usize, y: usize) -> &T {
        &self.data[self.index(x, y)]
    }

    pub fn get_mut(&mut self, x: usize, y: usize) -> &mut T {
        let idx = self.index(x, y);
        &mut self.data[idx]
    }

    pub fn set(&mut self, x: usize, y: usize, value: T) {
        let idx = self.index(x, y);
        self.data[idx] = value;
    }

    /// Get a tile by signed coordinate, `None` when off-grid.
    pub fn try_get(&self, x: i32, y: i32) -> Option<&T> {
        if self.is_on_grid(x, y) {
            Some(self.get(x as usize, y as usize))
        } else {
            None
        }
    }

    /// Iterate over all cells with their coordinates, row by row.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        let width = self.width;
        self.data.iter().enumerate().map(move |(idx, val)| {
            let x = idx % width;
            let y = idx / width;
            (x, y, val)
        })
    }

    /// Iterate mutably over all cells with their coordinates.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, usize, &mut T)> {
        let width = self.width;
        self.data.iter_mut().enumerate().map(move |(idx, val)| {
            let x = idx % width;
            let y = idx / width;
            (x, y, val)
        })
    }

    /// Apply `f` to every tile, keeping the dimensions.
    pub fn map<U, F: FnMut(&T) -> U>(&self, f: F) -> Tilemap<U> {
        Tilemap {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(f).collect(),
        }
    }
}

impl<T> Tilemap<T> {
    pub fn is_on_grid(&self, x: i32, y: i32) -> bool {
        x >= 0 && (x as usize) < self.width && y >= 0 && (y as usize) < self.height
    }

    /// True for cells on the outermost ring of the map.
    pub fn is_border_cell(&self, x: usize, y: usize) -> bool {
        x == 0 || y == 0 || x + 1 == self.width || y + 1 == self.height
    }

    /// Von Neumann neighbourhood (4-connectivity) in N, E, S, W order.
    /// North is `y + 1`. Off-grid positions are reported as [`Neighbor::OffGrid`].
    pub fn von_neumann(&self, x: usize, y: usize) -> Neighbors<'_, T> {
        Neighbors::new(self, x, y, &VON_NEUMANN_OFFSETS)
    }

    /// Moore neighbourhood (8-connectivity), off-grid positions included.
    pub fn moore(&self, x: usize, y: usize) -> Neighbors<'_, T> {
        Neighbors::new(self, x, y, &MOORE_OFFSETS)
    }

    /// Von Neumann neighbours that lie on the grid.
    pub fn on_grid_von_neumann(&self, x: usize, y: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.von_neumann(x, y).filter_map(Neighbor::on_grid)
    }

    /// Moore neighbours that lie on the grid.
    pub fn on_grid_moore(&self, x: usize, y: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.moore(x, y).filter_map(Neighbor::on_grid)
    }
}

/// N, E, S, W
pub const VON_NEUMANN_OFFSETS: [(i32, i32); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

pub const MOORE_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// A neighbouring position, either inside the map or past its edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Neighbor {
    OnGrid(usize, usize),
    OffGrid(i32, i32),
}

impl Neighbor {
    pub fn on_grid(self) -> Option<(usize, usize)> {
        match self {
            Neighbor::OnGrid(x, y) => Some((x, y)),
            Neighbor::OffGrid(..) => None,
        }
    }

    pub fn is_off_grid(&self) -> bool {
        matches!(self, Neighbor::OffGrid(..))
    }
}

/// Lazy neighbour iterator; restart it by asking the map again.
pub struct Neighbors<'a, T> {
    map: &'a Tilemap<T>,
    x: i32,
    y: i32,
    offsets: &'static [(i32, i32)],
    next: usize,
}

impl<'a, T> Neighbors<'a, T> {
    fn new(map: &'a Tilemap<T>, x: usize, y: usize, offsets: &'static [(i32, i32)]) -> Self {
        Self {
            map,
            x: x as i32,
            y: y as i32,
            offsets,
            next: 0,
        }
    }
}

impl<T> Iterator for Neighbors<'_, T> {
    type Item = Neighbor;

    fn next(&mut self) -> Option<Neighbor> {
        let &(dx, dy) = self.offsets.get(self.next)?;
        self.next += 1;

        let nx = self.x + dx;
        let ny = self.y + dy;
        if self.map.is_on_grid(nx, ny) {
            Some(Neighbor::OnGrid(nx as usize, ny as usize))
        } else {
            Some(Neighbor::OffGrid(nx, ny))
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.offsets.len() - self.next;
        (left, Some(left))
    }
}
