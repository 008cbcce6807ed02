//! Perfect-maze generation with a randomized depth-first carver.

use std::collections::VecDeque;
use std::fmt;

use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::debug;

use crate::error::GameError;

/// Smallest grid that still has an interior room and a closed outer ring.
pub const MIN_MAZE_SIZE: usize = 5;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Cell {
    Wall,
    Passage,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// The adjacent position in `direction`, or `None` when it would leave a `size`×`size` grid.
    pub fn neighbor(self, direction: Direction, size: usize) -> Option<Position> {
        let (row, col) = match direction {
            Direction::Up => (self.row.checked_sub(1)?, self.col),
            Direction::Down => (self.row.checked_add(1)?, self.col),
            Direction::Left => (self.row, self.col.checked_sub(1)?),
            Direction::Right => (self.row, self.col.checked_add(1)?),
        };

        (row < size && col < size).then_some(Position { row, col })
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Direction of a single orthogonal step from `from` to `to`.
    pub fn between(from: Position, to: Position) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|&d| from.neighbor(d, usize::MAX) == Some(to))
    }
}

impl TryFrom<char> for Direction {
    type Error = char;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        match value.to_ascii_lowercase() {
            'w' | 'k' => Ok(Direction::Up),
            's' | 'j' => Ok(Direction::Down),
            'a' | 'h' => Ok(Direction::Left),
            'd' | 'l' => Ok(Direction::Right),
            _ => Err(value),
        }
    }
}

/// A square grid of walls and passages. Immutable once generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Maze {
    size: usize,
    cells: Vec<Cell>,
}

/// Generate a maze using the thread-local random source.
pub fn generate(size: usize) -> Result<Maze, GameError> {
    generate_with(size, &mut rand::rng())
}

/// Generate a maze drawing every choice from `rng`.
///
/// `size` must be odd and at least [`MIN_MAZE_SIZE`]. Rooms sit on odd
/// coordinates, the cells between them on even ones. Carving starts at the
/// entrance (1,1); the exit at (size-1, size-2) is opened afterwards.
pub fn generate_with<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Result<Maze, GameError> {
    if size < MIN_MAZE_SIZE || size % 2 == 0 {
        return Err(GameError::InvalidMazeSize(size));
    }

    let mut maze = Maze {
        size,
        cells: vec![Cell::Wall; size * size],
    };

    let start = maze.entrance();
    maze.carve(start);
    let mut stack = vec![start];

    while let Some(&current) = stack.last() {
        let candidates = maze.uncarved_rooms(current);

        match candidates.choose(&mut *rng) {
            Some(&next) => {
                let between = Position::new(
                    (current.row + next.row) / 2,
                    (current.col + next.col) / 2,
                );
                maze.carve(between);
                maze.carve(next);
                stack.push(next);
            }
            None => {
                stack.pop();
            }
        }
    }

    let exit = maze.exit();
    maze.carve(exit);

    debug!(size, passages = maze.passage_count(), "generated maze");
    Ok(maze)
}

impl Maze {
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn cell(&self, pos: Position) -> Option<Cell> {
        if pos.row < self.size && pos.col < self.size {
            Some(self.cells[self.index(pos)])
        } else {
            None
        }
    }

    pub fn is_passage(&self, pos: Position) -> bool {
        self.cell(pos) == Some(Cell::Passage)
    }

    pub fn entrance(&self) -> Position {
        Position::new(1, 1)
    }

    /// The opening in the bottom wall next to the bottom-right corner.
    pub fn exit(&self) -> Position {
        Position::new(self.size - 1, self.size - 2)
    }

    pub fn passage_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c == Cell::Passage).count()
    }

    /// Number of odd-coordinate rooms in the grid.
    pub fn room_count(&self) -> usize {
        let per_side = (self.size - 1) / 2;
        per_side * per_side
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.size)
    }

    /// Passage cells orthogonally adjacent to `pos`.
    pub fn open_neighbors(&self, pos: Position) -> Vec<Position> {
        Direction::ALL
            .iter()
            .filter_map(|&d| pos.neighbor(d, self.size))
            .filter(|&p| self.is_passage(p))
            .collect()
    }

    /// Breadth-first search between two passage cells, endpoints included.
    pub fn shortest_path(&self, from: Position, to: Position) -> Option<Vec<Position>> {
        if !self.is_passage(from) || !self.is_passage(to) {
            return None;
        }

        let mut came_from: Vec<Option<Position>> = vec![None; self.cells.len()];
        let mut seen = vec![false; self.cells.len()];
        let mut queue = VecDeque::new();

        seen[self.index(from)] = true;
        queue.push_back(from);

        while let Some(current) = queue.pop_front() {
            if current == to {
                let mut path = vec![current];
                let mut cursor = current;
                while let Some(prev) = came_from[self.index(cursor)] {
                    path.push(prev);
                    cursor = prev;
                }
                path.reverse();
                return Some(path);
            }

            for next in self.open_neighbors(current) {
                let idx = self.index(next);
                if !seen[idx] {
                    seen[idx] = true;
                    came_from[idx] = Some(current);
                    queue.push_back(next);
                }
            }
        }

        None
    }

    /// Text rendering with `@` drawn at `player`.
    pub fn render_with_player(&self, player: Position) -> String {
        let mut out = String::with_capacity(self.size * (self.size + 1));
        for (row, cells) in self.rows().enumerate() {
            for (col, &cell) in cells.iter().enumerate() {
                let ch = if player == Position::new(row, col) {
                    '@'
                } else {
                    cell_char(cell)
                };
                out.push(ch);
            }
            out.push('\n');
        }
        out
    }

    fn index(&self, pos: Position) -> usize {
        pos.row * self.size + pos.col
    }

    fn carve(&mut self, pos: Position) {
        let idx = self.index(pos);
        self.cells[idx] = Cell::Passage;
    }

    /// Rooms two cells away that are strictly inside the outer ring and still walled in.
    fn uncarved_rooms(&self, at: Position) -> Vec<Position> {
        let Position { row, col } = at;
        let mut rooms = Vec::with_capacity(4);

        if row > 2 {
            rooms.push(Position::new(row - 2, col));
        }
        if row + 3 < self.size {
            rooms.push(Position::new(row + 2, col));
        }
        if col > 2 {
            rooms.push(Position::new(row, col - 2));
        }
        if col + 3 < self.size {
            rooms.push(Position::new(row, col + 2));
        }

        rooms.retain(|&p| self.cells[self.index(p)] == Cell::Wall);
        rooms
    }
}

fn cell_char(cell: Cell) -> char {
    match cell {
        Cell::Wall => '#',
        Cell::Passage => ' ',
    }
}

impl fmt::Display for Maze {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cells in self.rows() {
            let line: String = cells.iter().map(|&c| cell_char(c)).collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
