use serde::{Deserialize, Serialize};

use super::state::{
    empty_cells, ActiveBox, BoxCoord, Cell, Grid, Marker, Player, Position, BOX_SIZE,
};

/// 一个 3×3 小棋盘的切片。
pub type SubBoard = [[Marker; BOX_SIZE]; BOX_SIZE];

/// 大棋盘摘要：每个小棋盘的归属（引擎 +1，对手 -1，未定或平局 0）。
pub type MajorBoardSummary = [[Marker; BOX_SIZE]; BOX_SIZE];

// rows, then columns, then both diagonals
const LINES: [[(usize, usize); 3]; 8] = [
    [(0, 0), (0, 1), (0, 2)],
    [(1, 0), (1, 1), (1, 2)],
    [(2, 0), (2, 1), (2, 2)],
    [(0, 0), (1, 0), (2, 0)],
    [(0, 1), (1, 1), (2, 1)],
    [(0, 2), (1, 2), (2, 2)],
    [(0, 0), (1, 1), (2, 2)],
    [(0, 2), (1, 1), (2, 0)],
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    EngineWins,
    OpponentWins,
    Undecided,
}

impl Outcome {
    /// Marker recorded for this outcome in a [`MajorBoardSummary`].
    pub fn marker(self) -> Marker {
        match self {
            Outcome::EngineWins => Marker::Engine,
            Outcome::OpponentWins => Marker::Opponent,
            Outcome::Undecided => Marker::Empty,
        }
    }

    pub fn winner(self) -> Option<Player> {
        match self {
            Outcome::EngineWins => Some(Player::Engine),
            Outcome::OpponentWins => Some(Player::Opponent),
            Outcome::Undecided => None,
        }
    }
}

pub(crate) fn sub_board_of(cells: &Grid, coord: BoxCoord) -> SubBoard {
    let base_row = coord.row() as usize * BOX_SIZE;
    let base_col = coord.col() as usize * BOX_SIZE;
    let mut board = [[Marker::Empty; BOX_SIZE]; BOX_SIZE];
    for (r, row) in board.iter_mut().enumerate() {
        row.copy_from_slice(&cells[base_row + r][base_col..base_col + BOX_SIZE]);
    }
    board
}

/// 取出指定小棋盘的九个格子。
pub fn sub_board_at(position: &Position, coord: BoxCoord) -> SubBoard {
    sub_board_of(position.cells(), coord)
}

/// 三连判定：依次检查行、列、两条对角线，首个命中者获胜。
pub fn outcome_of(board: &SubBoard) -> Outcome {
    for line in &LINES {
        let [a, b, c] = line.map(|(r, col)| board[r][col]);
        if a == b && b == c {
            match a {
                Marker::Engine => return Outcome::EngineWins,
                Marker::Opponent => return Outcome::OpponentWins,
                Marker::Empty => {}
            }
        }
    }
    Outcome::Undecided
}

/// Won by either side, or full without a line (drawn).
pub fn is_decided(board: &SubBoard) -> bool {
    outcome_of(board) != Outcome::Undecided
        || board.iter().flatten().all(|marker| !marker.is_empty())
}

/// `player` holds two cells of some line whose third cell is empty.
pub fn near_win(board: &SubBoard, player: Player) -> bool {
    let own = player.marker();
    LINES.iter().any(|line| {
        let markers = line.map(|(r, c)| board[r][c]);
        let owned = markers.iter().filter(|&&m| m == own).count();
        let empty = markers.iter().filter(|m| m.is_empty()).count();
        owned == 2 && empty == 1
    })
}

/// 假设落子：返回新局面，原局面保持不变。
///
/// 落子所在的小棋盘若已分出结果（或已下满），下一手可落在任意空格；
/// 否则只能落在该小棋盘内的空格。
///
/// Panics if `mv` is not one of `position.legal_moves()`.
pub fn apply_hypothetical(position: &Position, mv: Cell, player: Player) -> Position {
    assert!(
        position.is_legal(mv),
        "hypothetical move {mv} is not a legal move of this position"
    );

    let mut cells = *position.cells();
    cells[mv.row() as usize][mv.col() as usize] = player.marker();

    let landed = mv.box_coord();
    let active_box = if is_decided(&sub_board_of(&cells, landed)) {
        ActiveBox::Any
    } else {
        ActiveBox::Box(landed)
    };
    let legal_moves = empty_cells(&cells, active_box);
    Position::from_trusted(cells, active_box, legal_moves)
}

pub fn summarize_major_board(position: &Position) -> MajorBoardSummary {
    let mut summary = [[Marker::Empty; BOX_SIZE]; BOX_SIZE];
    for coord in BoxCoord::all() {
        summary[coord.row() as usize][coord.col() as usize] =
            outcome_of(&sub_board_at(position, coord)).marker();
    }
    summary
}

/// 大棋盘胜负，规则与小棋盘相同。
pub fn major_winner(summary: &MajorBoardSummary) -> Outcome {
    outcome_of(summary)
}

/// Sub-boards won by the engine minus sub-boards won by the opponent.
pub fn count_won_boards(summary: &MajorBoardSummary) -> i32 {
    summary
        .iter()
        .flatten()
        .map(|marker| i32::from(marker.value()))
        .sum()
}
