/// Walks relative cell offsets in shells of increasing Chebyshev radius.
///
/// Shell `0` is the origin cell alone, shell `1` the 26 (8 in 2D) cells
/// around it, and so on. Every offset of a shell is produced exactly once
/// before the first offset of the next shell. In 2D mode the `z` offset is
/// always zero.
///
/// The iterator never ends on its own; callers stop it based on
/// [`CellShellIterator::range`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellShellIterator {
    range: i32,
    current: [i32; 3],
    is_2d: bool,
}

impl CellShellIterator {
    /// Starts at the origin cell (shell `0`).
    pub fn new(is_2d: bool) -> Self {
        Self::starting_at(0, is_2d)
    }

    /// Starts at the first offset of shell `range`.
    pub fn starting_at(range: i32, is_2d: bool) -> Self {
        let mut it = CellShellIterator {
            range: 0,
            current: [0; 3],
            is_2d,
        };
        it.start_shell(range.max(0));
        it
    }

    /// Chebyshev radius of the current offset.
    pub fn range(&self) -> i32 {
        self.range
    }

    /// The current relative offset.
    pub fn current(&self) -> [i32; 3] {
        self.current
    }

    pub fn is_2d(&self) -> bool {
        self.is_2d
    }

    /// Moves to the next offset, entering the next shell when the current
    /// one is exhausted.
    pub fn advance(&mut self) {
        let r = self.range;
        if r == 0 {
            self.start_shell(1);
            return;
        }

        let [x, y, z] = self.current;
        // rows on a face of the shell are walked in full, interior rows
        // only touch the two x faces
        let full_row = y.abs() == r || (!self.is_2d && z.abs() == r);
        if full_row {
            if x < r {
                self.current[0] += 1;
                return;
            }
        } else if x == -r {
            self.current[0] = r;
            return;
        }

        self.current[0] = -r;
        if y < r {
            self.current[1] += 1;
            return;
        }

        self.current[1] = -r;
        if !self.is_2d && z < r {
            self.current[2] += 1;
            return;
        }

        self.start_shell(r + 1);
    }

    fn start_shell(&mut self, range: i32) {
        self.range = range;
        let z = if self.is_2d { 0 } else { -range };
        self.current = [-range, -range, z];
    }
}

impl Iterator for CellShellIterator {
    type Item = [i32; 3];

    fn next(&mut self) -> Option<[i32; 3]> {
        let offset = self.current;
        self.advance();
        Some(offset)
    }
}

/// Number of offsets in shell `range`.
pub fn shell_size(range: i32, is_2d: bool) -> usize {
    if range <= 0 {
        return 1;
    }
    let outer = (2 * range + 1) as usize;
    let inner = (2 * range - 1) as usize;
    if is_2d {
        outer * outer - inner * inner
    } else {
        outer * outer * outer - inner * inner * inner
    }
}
