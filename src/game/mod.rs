//! 棋盘模型（局面、小棋盘判定与假设落子）。

pub mod rules;
pub mod state;

pub use rules::{
    apply_hypothetical, count_won_boards, is_decided, major_winner, near_win, outcome_of,
    sub_board_at, summarize_major_board, MajorBoardSummary, Outcome, SubBoard,
};
pub use state::{
    ActiveBox,
    BoxCoord,
    Cell,
    Grid,
    IntegrityError,
    Marker,
    Player,
    Position,
    PositionRecord,
    BOARD_SIZE,
    BOX_SIZE,
};
