/// One of the 8 grid neighbour directions, clockwise from east in image
/// coordinates (y grows downwards).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GridDirection {
    East = 0,
    SouthEast = 1,
    South = 2,
    SouthWest = 3,
    West = 4,
    NorthWest = 5,
    North = 6,
    NorthEast = 7,
}

impl GridDirection {
    pub const ALL: [GridDirection; 8] = [
        GridDirection::East,
        GridDirection::SouthEast,
        GridDirection::South,
        GridDirection::SouthWest,
        GridDirection::West,
        GridDirection::NorthWest,
        GridDirection::North,
        GridDirection::NorthEast,
    ];

    /// Directions probed from the first cell of a walk. Cells before the
    /// current one in scan order have already been consumed, so only the
    /// forward half-plane is worth probing.
    pub const FORWARD: [GridDirection; 4] = [
        GridDirection::East,
        GridDirection::SouthEast,
        GridDirection::South,
        GridDirection::SouthWest,
    ];

    #[inline]
    pub fn from_index(i: usize) -> Self {
        Self::ALL[i % 8]
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Rotates clockwise by `steps` × 45°; negative steps turn anticlockwise.
    #[inline]
    pub fn turned(self, steps: i32) -> Self {
        Self::from_index((self.index() as i32 + steps).rem_euclid(8) as usize)
    }

    /// Direction pointing to the walker's right.
    #[inline]
    pub fn right(self) -> Self {
        self.turned(2)
    }

    #[inline]
    pub fn offset(self) -> (isize, isize) {
        match self {
            GridDirection::East => (1, 0),
            GridDirection::SouthEast => (1, 1),
            GridDirection::South => (0, 1),
            GridDirection::SouthWest => (-1, 1),
            GridDirection::West => (-1, 0),
            GridDirection::NorthWest => (-1, -1),
            GridDirection::North => (0, -1),
            GridDirection::NorthEast => (1, -1),
        }
    }

    /// Neighbour of `cell` in a `grid_w × grid_h` grid, if in bounds.
    #[inline]
    pub fn neighbor(self, cell: usize, grid_w: usize, grid_h: usize) -> Option<usize> {
        let (dx, dy) = self.offset();
        let x = (cell % grid_w) as isize + dx;
        let y = (cell / grid_w) as isize + dy;
        if x < 0 || y < 0 || x >= grid_w as isize || y >= grid_h as isize {
            return None;
        }
        Some(x as usize + y as usize * grid_w)
    }
}
