use std::collections::HashMap;

use rally_core::cards::Rotate;
use rally_core::grid::{Direction, Pos};
use rally_core::player::PlayerId;

/// Wall edges declared by a single cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WallSet {
    pub north: bool,
    pub south: bool,
    pub east: bool,
    pub west: bool,
}

impl WallSet {
    pub fn has(self, edge: Direction) -> bool {
        match edge {
            Direction::North => self.north,
            Direction::South => self.south,
            Direction::East => self.east,
            Direction::West => self.west,
        }
    }

    fn set(&mut self, edge: Direction) {
        match edge {
            Direction::North => self.north = true,
            Direction::South => self.south = true,
            Direction::East => self.east = true,
            Direction::West => self.west = true,
        }
    }
}

/// A conveyor belt cell. Express belts run during an extra phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Belt {
    pub direction: Direction,
    pub express: bool,
}

/// Everything a single cell carries. Layers are independent: a cell may be
/// a belt and a checkpoint at the same time.
#[derive(Debug, Clone, Copy, Default)]
pub struct Terrain {
    pub walls: WallSet,
    pub hole: bool,
    pub belt: Option<Belt>,
    pub pad: Option<Rotate>,
    pub flag: Option<u8>,
}

/// A board-mounted laser, firing from a fixed origin every register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaserEmitter {
    pub pos: Pos,
    pub direction: Direction,
}

/// Beam overlay for one cell. Crossing beams merge into both flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LaserOverlay {
    pub vertical: bool,
    pub horizontal: bool,
}

/// Board definition handed over by the map-loading collaborator: an
/// already-parsed rectangular grid of typed features. The builder methods
/// double as the test fixture API.
#[derive(Debug, Clone, Default)]
pub struct BoardDef {
    pub name: String,
    pub width: i32,
    pub height: i32,
    pub walls: Vec<(Pos, Direction)>,
    pub holes: Vec<Pos>,
    pub belts: Vec<(Pos, Belt)>,
    pub pads: Vec<(Pos, Rotate)>,
    pub flags: Vec<(Pos, u8)>,
    pub lasers: Vec<LaserEmitter>,
    pub starts: Vec<(Pos, PlayerId)>,
}

impl BoardDef {
    pub fn new(name: impl Into<String>, width: i32, height: i32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            ..Self::default()
        }
    }

    pub fn wall(mut self, x: i32, y: i32, edge: Direction) -> Self {
        self.walls.push((Pos::new(x, y), edge));
        self
    }

    pub fn hole(mut self, x: i32, y: i32) -> Self {
        self.holes.push(Pos::new(x, y));
        self
    }

    pub fn belt(mut self, x: i32, y: i32, direction: Direction, express: bool) -> Self {
        self.belts
            .push((Pos::new(x, y), Belt { direction, express }));
        self
    }

    pub fn pad(mut self, x: i32, y: i32, rotate: Rotate) -> Self {
        self.pads.push((Pos::new(x, y), rotate));
        self
    }

    pub fn flag(mut self, x: i32, y: i32, number: u8) -> Self {
        self.flags.push((Pos::new(x, y), number));
        self
    }

    pub fn laser(mut self, x: i32, y: i32, direction: Direction) -> Self {
        self.lasers.push(LaserEmitter {
            pos: Pos::new(x, y),
            direction,
        });
        self
    }

    pub fn start(mut self, x: i32, y: i32, number: PlayerId) -> Self {
        self.starts.push((Pos::new(x, y), number));
        self
    }
}

/// A malformed board definition. All of these abort match setup before the
/// turn loop starts; none can occur mid-round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    EmptyBoard,
    OutOfBounds { what: &'static str, pos: Pos },
    BadStartNumber(PlayerId),
    DuplicateStart(PlayerId),
    DuplicateFlag(u8),
    NonContiguousFlags { highest: u8, count: usize },
    BadPadRotation(Pos),
}

impl std::fmt::Display for BoardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyBoard => write!(f, "board has zero width or height"),
            Self::OutOfBounds { what, pos } => {
                write!(f, "{what} at ({}, {}) is outside the board", pos.x, pos.y)
            },
            Self::BadStartNumber(n) => write!(f, "start marker {n} outside 1..=8"),
            Self::DuplicateStart(n) => write!(f, "duplicate start marker {n}"),
            Self::DuplicateFlag(n) => write!(f, "duplicate flag number {n}"),
            Self::NonContiguousFlags { highest, count } => {
                write!(f, "{count} flags but highest number is {highest}")
            },
            Self::BadPadRotation(pos) => {
                write!(
                    f,
                    "rotate pad at ({}, {}) must turn left or right",
                    pos.x, pos.y
                )
            },
        }
    }
}

impl std::error::Error for BoardError {}

/// The static board: terrain layers, board lasers, start markers, and the
/// transient laser overlay. All terrain queries are pure; the overlay is the
/// only mutable part and is cleared after every laser phase.
#[derive(Debug, Clone)]
pub struct Board {
    name: String,
    width: i32,
    height: i32,
    /// Terrain stored row-major (y * width + x).
    terrain: Vec<Terrain>,
    lasers: Vec<LaserEmitter>,
    starts: HashMap<PlayerId, Pos>,
    flag_count: u8,
    overlay: HashMap<Pos, LaserOverlay>,
}

impl Board {
    pub fn from_def(def: &BoardDef) -> Result<Self, BoardError> {
        if def.width <= 0 || def.height <= 0 {
            return Err(BoardError::EmptyBoard);
        }
        let mut board = Self {
            name: def.name.clone(),
            width: def.width,
            height: def.height,
            terrain: vec![Terrain::default(); (def.width * def.height) as usize],
            lasers: Vec::new(),
            starts: HashMap::new(),
            flag_count: 0,
            overlay: HashMap::new(),
        };

        for &(pos, edge) in &def.walls {
            board.cell_mut(pos, "wall")?.walls.set(edge);
        }
        for &pos in &def.holes {
            board.cell_mut(pos, "hole")?.hole = true;
        }
        for &(pos, belt) in &def.belts {
            board.cell_mut(pos, "belt")?.belt = Some(belt);
        }
        for &(pos, rotate) in &def.pads {
            if !matches!(rotate, Rotate::Left | Rotate::Right) {
                return Err(BoardError::BadPadRotation(pos));
            }
            board.cell_mut(pos, "rotate pad")?.pad = Some(rotate);
        }

        let mut flag_numbers = Vec::new();
        for &(pos, number) in &def.flags {
            if flag_numbers.contains(&number) {
                return Err(BoardError::DuplicateFlag(number));
            }
            flag_numbers.push(number);
            board.cell_mut(pos, "flag")?.flag = Some(number);
        }
        let highest = flag_numbers.iter().copied().max().unwrap_or(0);
        if highest as usize != flag_numbers.len() {
            return Err(BoardError::NonContiguousFlags {
                highest,
                count: flag_numbers.len(),
            });
        }
        board.flag_count = highest;

        for &emitter in &def.lasers {
            if !board.inside(emitter.pos) {
                return Err(BoardError::OutOfBounds {
                    what: "laser emitter",
                    pos: emitter.pos,
                });
            }
            board.lasers.push(emitter);
        }

        for &(pos, number) in &def.starts {
            if !(1..=rally_core::player::MAX_PLAYERS as PlayerId).contains(&number) {
                return Err(BoardError::BadStartNumber(number));
            }
            if !board.inside(pos) {
                return Err(BoardError::OutOfBounds {
                    what: "start marker",
                    pos,
                });
            }
            if board.starts.insert(number, pos).is_some() {
                return Err(BoardError::DuplicateStart(number));
            }
        }

        Ok(board)
    }

    fn cell_mut(&mut self, pos: Pos, what: &'static str) -> Result<&mut Terrain, BoardError> {
        if !self.inside(pos) {
            return Err(BoardError::OutOfBounds { what, pos });
        }
        let idx = (pos.y * self.width + pos.x) as usize;
        Ok(&mut self.terrain[idx])
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn inside(&self, pos: Pos) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height
    }

    /// Terrain at `pos`. Cells outside the board read as featureless.
    pub fn terrain(&self, pos: Pos) -> Terrain {
        if !self.inside(pos) {
            return Terrain::default();
        }
        self.terrain[(pos.y * self.width + pos.x) as usize]
    }

    pub fn has_wall(&self, pos: Pos, edge: Direction) -> bool {
        self.terrain(pos).walls.has(edge)
    }

    pub fn is_hole(&self, pos: Pos) -> bool {
        self.terrain(pos).hole
    }

    pub fn belt_at(&self, pos: Pos) -> Option<Belt> {
        self.terrain(pos).belt
    }

    pub fn pad_at(&self, pos: Pos) -> Option<Rotate> {
        self.terrain(pos).pad
    }

    pub fn flag_at(&self, pos: Pos) -> Option<u8> {
        self.terrain(pos).flag
    }

    pub fn flag_count(&self) -> u8 {
        self.flag_count
    }

    pub fn start_position(&self, number: PlayerId) -> Option<Pos> {
        self.starts.get(&number).copied()
    }

    pub fn emitters(&self) -> &[LaserEmitter] {
        &self.lasers
    }

    /// In-bounds cells of the 3×3 neighbourhood around `pos`, centre included.
    pub fn neighbourhood(&self, pos: Pos) -> Vec<Pos> {
        let mut positions = Vec::new();
        for yi in -1..=1 {
            for xi in -1..=1 {
                let candidate = Pos::new(pos.x + xi, pos.y + yi);
                if self.inside(candidate) {
                    positions.push(candidate);
                }
            }
        }
        positions
    }

    /// Mark a beam crossing `pos`. North/south beams light the vertical
    /// overlay, east/west the horizontal one.
    pub fn mark_laser(&mut self, pos: Pos, direction: Direction) {
        let cell = self.overlay.entry(pos).or_default();
        match direction {
            Direction::North | Direction::South => cell.vertical = true,
            Direction::East | Direction::West => cell.horizontal = true,
        }
    }

    pub fn clear_lasers(&mut self) {
        self.overlay.clear();
    }

    /// Overlay cells in deterministic (y, x) order.
    pub fn laser_overlay(&self) -> Vec<(Pos, LaserOverlay)> {
        let mut cells: Vec<(Pos, LaserOverlay)> =
            self.overlay.iter().map(|(&p, &o)| (p, o)).collect();
        cells.sort_by_key(|(p, _)| (p.y, p.x));
        cells
    }
}
