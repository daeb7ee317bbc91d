//! AI 搜索模块（固定深度的 minimax 与叶子启发式评估）。

pub mod minimax;
pub mod noise;

pub use minimax::{
    backup, baseline_score, evaluate_leaf, expand, search, select_best, select_move, Difficulty,
    MoveSearcher, SearchConfig, SearchDecision, SearchError, SearchNode, DEFAULT_DEPTH, WIN_SCORE,
};
pub use noise::{NoiseSource, ScriptedNoise};
