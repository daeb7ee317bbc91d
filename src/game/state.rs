use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use super::rules::{is_decided, sub_board_of};

/// 整个棋盘的边长（9×9）。
pub const BOARD_SIZE: usize = 9;
/// 单个小棋盘的边长（3×3）。
pub const BOX_SIZE: usize = 3;

/// 9×9 的格子网格。
pub type Grid = [[Marker; BOARD_SIZE]; BOARD_SIZE];

/// 格子上的标记：引擎 +1，对手 -1，空 0。
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "i8", into = "i8")]
pub enum Marker {
    Opponent,
    #[default]
    Empty,
    Engine,
}

impl Marker {
    pub fn value(self) -> i8 {
        match self {
            Marker::Opponent => -1,
            Marker::Empty => 0,
            Marker::Engine => 1,
        }
    }

    pub fn negate(self) -> Self {
        match self {
            Marker::Opponent => Marker::Engine,
            Marker::Empty => Marker::Empty,
            Marker::Engine => Marker::Opponent,
        }
    }

    pub fn is_empty(self) -> bool {
        self == Marker::Empty
    }
}

impl From<Marker> for i8 {
    fn from(marker: Marker) -> Self {
        marker.value()
    }
}

impl TryFrom<i8> for Marker {
    type Error = IntegrityError;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Marker::Opponent),
            0 => Ok(Marker::Empty),
            1 => Ok(Marker::Engine),
            _ => Err(IntegrityError::InvalidMarker { value }),
        }
    }
}

/// 对局双方。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Player {
    Engine,
    Opponent,
}

impl Player {
    pub fn marker(self) -> Marker {
        match self {
            Player::Engine => Marker::Engine,
            Player::Opponent => Marker::Opponent,
        }
    }

    pub fn other(self) -> Self {
        match self {
            Player::Engine => Player::Opponent,
            Player::Opponent => Player::Engine,
        }
    }
}

/// 9×9 坐标，序列化为 `[row, col]`。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "(u8, u8)", into = "(u8, u8)")]
pub struct Cell {
    row: u8,
    col: u8,
}

impl Cell {
    /// Panics when the coordinate is off the 9×9 grid.
    pub fn new(row: u8, col: u8) -> Self {
        assert!(
            (row as usize) < BOARD_SIZE && (col as usize) < BOARD_SIZE,
            "cell ({row}, {col}) is outside the 9x9 board"
        );
        Self { row, col }
    }

    pub fn row(self) -> u8 {
        self.row
    }

    pub fn col(self) -> u8 {
        self.col
    }

    /// 该格子所在的小棋盘。
    pub fn box_coord(self) -> BoxCoord {
        BoxCoord {
            row: self.row / BOX_SIZE as u8,
            col: self.col / BOX_SIZE as u8,
        }
    }

    /// Row-major enumeration of all 81 cells.
    pub fn all() -> impl Iterator<Item = Cell> {
        (0..BOARD_SIZE as u8).flat_map(|row| (0..BOARD_SIZE as u8).map(move |col| Cell { row, col }))
    }
}

impl From<Cell> for (u8, u8) {
    fn from(cell: Cell) -> Self {
        (cell.row, cell.col)
    }
}

impl TryFrom<(u8, u8)> for Cell {
    type Error = IntegrityError;

    fn try_from((row, col): (u8, u8)) -> Result<Self, Self::Error> {
        if (row as usize) < BOARD_SIZE && (col as usize) < BOARD_SIZE {
            Ok(Cell { row, col })
        } else {
            Err(IntegrityError::CellOutOfRange { row, col })
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// 小棋盘坐标，取值 {0,1,2}×{0,1,2}。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "(u8, u8)", into = "(u8, u8)")]
pub struct BoxCoord {
    row: u8,
    col: u8,
}

impl BoxCoord {
    /// Panics when the coordinate is outside {0,1,2}×{0,1,2}.
    pub fn new(row: u8, col: u8) -> Self {
        assert!(
            (row as usize) < BOX_SIZE && (col as usize) < BOX_SIZE,
            "sub-board ({row}, {col}) is outside the 3x3 major board"
        );
        Self { row, col }
    }

    pub fn row(self) -> u8 {
        self.row
    }

    pub fn col(self) -> u8 {
        self.col
    }

    /// Row-major enumeration of the nine sub-boards.
    pub fn all() -> impl Iterator<Item = BoxCoord> {
        (0..BOX_SIZE as u8).flat_map(|row| (0..BOX_SIZE as u8).map(move |col| BoxCoord { row, col }))
    }

    /// The nine cells of this sub-board, row-major.
    pub fn cells(self) -> impl Iterator<Item = Cell> {
        let base_row = self.row * BOX_SIZE as u8;
        let base_col = self.col * BOX_SIZE as u8;
        (0..BOX_SIZE as u8).flat_map(move |r| {
            (0..BOX_SIZE as u8).map(move |c| Cell {
                row: base_row + r,
                col: base_col + c,
            })
        })
    }
}

impl From<BoxCoord> for (u8, u8) {
    fn from(coord: BoxCoord) -> Self {
        (coord.row, coord.col)
    }
}

impl TryFrom<(u8, u8)> for BoxCoord {
    type Error = IntegrityError;

    fn try_from((row, col): (u8, u8)) -> Result<Self, Self::Error> {
        if (row as usize) < BOX_SIZE && (col as usize) < BOX_SIZE {
            Ok(BoxCoord { row, col })
        } else {
            Err(IntegrityError::BoxOutOfRange {
                row: row as i16,
                col: col as i16,
            })
        }
    }
}

/// 下一手必须落子的小棋盘；`Any` 表示任意小棋盘，序列化为 `[-1, -1]`。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "(i16, i16)", into = "(i16, i16)")]
pub enum ActiveBox {
    Any,
    Box(BoxCoord),
}

impl ActiveBox {
    pub fn contains(self, cell: Cell) -> bool {
        match self {
            ActiveBox::Any => true,
            ActiveBox::Box(coord) => cell.box_coord() == coord,
        }
    }
}

impl From<ActiveBox> for (i16, i16) {
    fn from(active: ActiveBox) -> Self {
        match active {
            ActiveBox::Any => (-1, -1),
            ActiveBox::Box(coord) => (coord.row as i16, coord.col as i16),
        }
    }
}

impl TryFrom<(i16, i16)> for ActiveBox {
    type Error = IntegrityError;

    fn try_from((row, col): (i16, i16)) -> Result<Self, Self::Error> {
        match (row, col) {
            (-1, -1) => Ok(ActiveBox::Any),
            (0..=2, 0..=2) => Ok(ActiveBox::Box(BoxCoord {
                row: row as u8,
                col: col as u8,
            })),
            _ => Err(IntegrityError::BoxOutOfRange { row, col }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum IntegrityError {
    InvalidMarker { value: i8 },
    CellOutOfRange { row: u8, col: u8 },
    BoxOutOfRange { row: i16, col: i16 },
    DecidedActiveBox { row: u8, col: u8 },
    MoveOutsideActiveBox { row: u8, col: u8 },
    OccupiedMove { row: u8, col: u8 },
    DuplicateMove { row: u8, col: u8 },
    MissingMove { row: u8, col: u8 },
}

impl fmt::Display for IntegrityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityError::InvalidMarker { value } => {
                write!(f, "cell marker {value} is not one of -1, 0, 1")
            }
            IntegrityError::CellOutOfRange { row, col } => {
                write!(f, "cell ({row}, {col}) is outside the 9x9 board")
            }
            IntegrityError::BoxOutOfRange { row, col } => {
                write!(f, "active box ({row}, {col}) is neither a sub-board nor (-1, -1)")
            }
            IntegrityError::DecidedActiveBox { row, col } => {
                write!(f, "active box ({row}, {col}) is already decided")
            }
            IntegrityError::MoveOutsideActiveBox { row, col } => {
                write!(f, "valid move ({row}, {col}) lies outside the active box")
            }
            IntegrityError::OccupiedMove { row, col } => {
                write!(f, "valid move ({row}, {col}) is not empty")
            }
            IntegrityError::DuplicateMove { row, col } => {
                write!(f, "valid move ({row}, {col}) is listed twice")
            }
            IntegrityError::MissingMove { row, col } => {
                write!(f, "empty cell ({row}, {col}) is playable but missing from valid moves")
            }
        }
    }
}

impl std::error::Error for IntegrityError {}

/// 搜索用的局面：格子、当前激活的小棋盘以及合法着法。创建后不可变。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "PositionRecord", into = "PositionRecord")]
pub struct Position {
    cells: Grid,
    active_box: ActiveBox,
    legal_moves: Vec<Cell>,
}

/// Wire shape shared with the game loop: `board_state`, `active_box`, `valid_moves`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PositionRecord {
    pub board_state: Grid,
    pub active_box: ActiveBox,
    pub valid_moves: Vec<Cell>,
}

impl TryFrom<PositionRecord> for Position {
    type Error = IntegrityError;

    fn try_from(record: PositionRecord) -> Result<Self, Self::Error> {
        Position::from_parts(record.board_state, record.active_box, record.valid_moves)
    }
}

impl From<Position> for PositionRecord {
    fn from(position: Position) -> Self {
        PositionRecord {
            board_state: position.cells,
            active_box: position.active_box,
            valid_moves: position.legal_moves,
        }
    }
}

impl Position {
    /// Builds a position and derives its legal moves from `active_box`.
    pub fn new(cells: Grid, active_box: ActiveBox) -> Result<Self, IntegrityError> {
        if let ActiveBox::Box(coord) = active_box {
            if is_decided(&sub_board_of(&cells, coord)) {
                return Err(IntegrityError::DecidedActiveBox {
                    row: coord.row,
                    col: coord.col,
                });
            }
        }
        let legal_moves = empty_cells(&cells, active_box);
        Ok(Self {
            cells,
            active_box,
            legal_moves,
        })
    }

    /// Builds a position from caller-supplied parts, keeping the caller's move order.
    pub fn from_parts(
        cells: Grid,
        active_box: ActiveBox,
        legal_moves: Vec<Cell>,
    ) -> Result<Self, IntegrityError> {
        let position = Self {
            cells,
            active_box,
            legal_moves,
        };
        position.integrity_check()?;
        Ok(position)
    }

    /// 开局：空棋盘，任意小棋盘可落子。
    pub fn empty() -> Self {
        let cells = [[Marker::Empty; BOARD_SIZE]; BOARD_SIZE];
        Self {
            cells,
            active_box: ActiveBox::Any,
            legal_moves: Cell::all().collect(),
        }
    }

    /// Caller guarantees `legal_moves` matches `empty_cells(&cells, active_box)`.
    pub(crate) fn from_trusted(cells: Grid, active_box: ActiveBox, legal_moves: Vec<Cell>) -> Self {
        debug_assert_eq!(legal_moves, empty_cells(&cells, active_box));
        Self {
            cells,
            active_box,
            legal_moves,
        }
    }

    pub fn cells(&self) -> &Grid {
        &self.cells
    }

    pub fn cell(&self, cell: Cell) -> Marker {
        self.cells[cell.row as usize][cell.col as usize]
    }

    pub fn active_box(&self) -> ActiveBox {
        self.active_box
    }

    pub fn legal_moves(&self) -> &[Cell] {
        &self.legal_moves
    }

    pub fn is_legal(&self, cell: Cell) -> bool {
        self.legal_moves.contains(&cell)
    }

    pub fn integrity_check(&self) -> Result<(), IntegrityError> {
        if let ActiveBox::Box(coord) = self.active_box {
            if is_decided(&sub_board_of(&self.cells, coord)) {
                return Err(IntegrityError::DecidedActiveBox {
                    row: coord.row,
                    col: coord.col,
                });
            }
        }

        let mut seen = HashSet::new();
        for &cell in &self.legal_moves {
            if !self.active_box.contains(cell) {
                return Err(IntegrityError::MoveOutsideActiveBox {
                    row: cell.row,
                    col: cell.col,
                });
            }
            if !self.cell(cell).is_empty() {
                return Err(IntegrityError::OccupiedMove {
                    row: cell.row,
                    col: cell.col,
                });
            }
            if !seen.insert(cell) {
                return Err(IntegrityError::DuplicateMove {
                    row: cell.row,
                    col: cell.col,
                });
            }
        }

        if let Some(missing) = empty_cells(&self.cells, self.active_box)
            .into_iter()
            .find(|cell| !seen.contains(cell))
        {
            return Err(IntegrityError::MissingMove {
                row: missing.row,
                col: missing.col,
            });
        }

        Ok(())
    }
}

/// Empty cells implied by `active_box`, in the canonical row-major order.
pub(crate) fn empty_cells(cells: &Grid, active_box: ActiveBox) -> Vec<Cell> {
    let is_open = |cell: &Cell| cells[cell.row as usize][cell.col as usize].is_empty();
    match active_box {
        ActiveBox::Any => Cell::all().filter(is_open).collect(),
        ActiveBox::Box(coord) => coord.cells().filter(is_open).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_with(marks: &[((u8, u8), Marker)]) -> Grid {
        let mut cells = [[Marker::Empty; BOARD_SIZE]; BOARD_SIZE];
        for &((row, col), marker) in marks {
            cells[row as usize][col as usize] = marker;
        }
        cells
    }

    #[test]
    fn empty_position_offers_every_cell() {
        let position = Position::empty();
        assert_eq!(position.active_box(), ActiveBox::Any);
        assert_eq!(position.legal_moves().len(), 81);
        assert_eq!(position.legal_moves()[0], Cell::new(0, 0));
        assert_eq!(position.legal_moves()[80], Cell::new(8, 8));
        position.integrity_check().expect("empty board should be consistent");
    }

    #[test]
    fn new_restricts_moves_to_active_box() {
        let cells = grid_with(&[((4, 4), Marker::Engine)]);
        let position =
            Position::new(cells, ActiveBox::Box(BoxCoord::new(1, 1))).expect("box (1,1) is open");
        assert_eq!(position.legal_moves().len(), 8);
        assert!(position
            .legal_moves()
            .iter()
            .all(|cell| cell.box_coord() == BoxCoord::new(1, 1)));
        assert!(!position.is_legal(Cell::new(4, 4)));
    }

    #[test]
    fn decided_active_box_is_rejected() {
        let cells = grid_with(&[
            ((0, 0), Marker::Engine),
            ((0, 1), Marker::Engine),
            ((0, 2), Marker::Engine),
        ]);
        let error = Position::new(cells, ActiveBox::Box(BoxCoord::new(0, 0)))
            .expect_err("won sub-board cannot be active");
        assert_eq!(error, IntegrityError::DecidedActiveBox { row: 0, col: 0 });
    }

    #[test]
    fn from_parts_detects_inconsistent_moves() {
        let cells = grid_with(&[((0, 0), Marker::Opponent)]);
        let active = ActiveBox::Box(BoxCoord::new(0, 0));

        let occupied = Position::from_parts(cells, active, vec![Cell::new(0, 0)]);
        assert_eq!(occupied, Err(IntegrityError::OccupiedMove { row: 0, col: 0 }));

        let outside = Position::from_parts(cells, active, vec![Cell::new(5, 5)]);
        assert_eq!(outside, Err(IntegrityError::MoveOutsideActiveBox { row: 5, col: 5 }));

        let missing = Position::from_parts(cells, active, vec![Cell::new(0, 1)]);
        assert_eq!(missing, Err(IntegrityError::MissingMove { row: 0, col: 2 }));

        let twice = Position::from_parts(cells, active, vec![Cell::new(0, 1), Cell::new(0, 1)]);
        assert_eq!(twice, Err(IntegrityError::DuplicateMove { row: 0, col: 1 }));
    }

    #[test]
    fn from_parts_keeps_caller_order() {
        let cells = grid_with(&[]);
        let active = ActiveBox::Box(BoxCoord::new(2, 2));
        let mut moves: Vec<Cell> = BoxCoord::new(2, 2).cells().collect();
        moves.reverse();
        let position = Position::from_parts(cells, active, moves.clone()).expect("reordered moves");
        assert_eq!(position.legal_moves(), moves.as_slice());
    }

    #[test]
    fn board_dict_json_round_trips_through_serde() {
        let json = r#"{
            "board_state": [
                [1, 0, 0, 0, 0, 0, 0, 0, 0],
                [0, 0, 0, 0, 0, 0, 0, 0, 0],
                [0, 0, 0, 0, 0, 0, 0, 0, 0],
                [0, 0, 0, 0, 0, 0, 0, 0, 0],
                [0, 0, 0, 0, -1, 0, 0, 0, 0],
                [0, 0, 0, 0, 0, 0, 0, 0, 0],
                [0, 0, 0, 0, 0, 0, 0, 0, 0],
                [0, 0, 0, 0, 0, 0, 0, 0, 0],
                [0, 0, 0, 0, 0, 0, 0, 0, 0]
            ],
            "active_box": [1, 1],
            "valid_moves": [[3, 3], [3, 4], [3, 5], [4, 3], [4, 5], [5, 3], [5, 4], [5, 5]]
        }"#;
        let position: Position = serde_json::from_str(json).expect("board dict should parse");
        assert_eq!(position.cell(Cell::new(0, 0)), Marker::Engine);
        assert_eq!(position.cell(Cell::new(4, 4)), Marker::Opponent);
        assert_eq!(position.active_box(), ActiveBox::Box(BoxCoord::new(1, 1)));

        let encoded = serde_json::to_value(&position).expect("position should serialize");
        assert_eq!(encoded["active_box"], serde_json::json!([1, 1]));
        assert_eq!(encoded["valid_moves"][0], serde_json::json!([3, 3]));
    }

    #[test]
    fn board_dict_rejects_bad_markers_and_sentinels() {
        let mut board = vec![vec![0i8; 9]; 9];
        board[2][2] = 5;
        let bad_marker = serde_json::json!({
            "board_state": board,
            "active_box": [-1, -1],
            "valid_moves": []
        });
        assert!(serde_json::from_value::<Position>(bad_marker).is_err());

        let bad_box = serde_json::json!({
            "board_state": vec![vec![0i8; 9]; 9],
            "active_box": [-1, 2],
            "valid_moves": []
        });
        assert!(serde_json::from_value::<Position>(bad_box).is_err());
    }

    #[test]
    fn any_sentinel_serializes_as_minus_one_pair() {
        let encoded = serde_json::to_value(ActiveBox::Any).expect("sentinel should serialize");
        assert_eq!(encoded, serde_json::json!([-1, -1]));
    }
}
