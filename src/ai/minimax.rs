use std::fmt;
use std::str::FromStr;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::noise::NoiseSource;
use crate::game::{
    apply_hypothetical, count_won_boards, major_winner, near_win, sub_board_at,
    summarize_major_board, BoxCoord, Cell, IntegrityError, Outcome, Player, Position,
};
use crate::utils::log;

/// 默认搜索深度。
pub const DEFAULT_DEPTH: u8 = 3;
/// 大棋盘胜负的分值，压过其他所有评估项。
pub const WIN_SCORE: i32 = 100_000;
/// Weight of each sub-board won in the static score.
pub const WON_BOARD_WEIGHT: i32 = 2;
pub const NOISE_FLOOR: i32 = -10;
pub const NOISE_CEILING: i32 = 10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
    Expert,
}

impl FromStr for Difficulty {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "normal" | "medium" => Ok(Difficulty::Normal),
            "hard" => Ok(Difficulty::Hard),
            "expert" | "extreme" => Ok(Difficulty::Expert),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchConfig {
    pub depth: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl SearchConfig {
    pub fn from_difficulty(difficulty: Difficulty) -> Self {
        let depth = match difficulty {
            Difficulty::Easy => 1,
            Difficulty::Normal => 2,
            Difficulty::Hard => 3,
            Difficulty::Expert => 4,
        };
        Self { depth, seed: None }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            depth: DEFAULT_DEPTH,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum SearchError {
    NoLegalMoves,
    InvalidDepth { depth: u8 },
    IllegalMove { row: u8, col: u8 },
    InvalidPosition { error: IntegrityError },
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchError::NoLegalMoves => write!(f, "position has no legal moves"),
            SearchError::InvalidDepth { depth } => {
                write!(f, "search depth must be at least 1, got {depth}")
            }
            SearchError::IllegalMove { row, col } => {
                write!(f, "move ({row}, {col}) is not legal in this position")
            }
            SearchError::InvalidPosition { error } => write!(f, "invalid position: {error}"),
        }
    }
}

impl std::error::Error for SearchError {}

impl From<IntegrityError> for SearchError {
    fn from(error: IntegrityError) -> Self {
        SearchError::InvalidPosition { error }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchDecision {
    pub best_move: Cell,
    pub score: i32,
    pub baseline: i32,
    pub depth: u8,
    pub nodes: u64,
    pub candidates: usize,
}

/// 搜索树节点：每个节点独占其局面与子节点。
#[derive(Debug, Clone)]
pub struct SearchNode {
    position: Position,
    move_made: Option<Cell>,
    children: Vec<SearchNode>,
    score: Option<i32>,
}

impl SearchNode {
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// `None` at the root.
    pub fn move_made(&self) -> Option<Cell> {
        self.move_made
    }

    pub fn children(&self) -> &[SearchNode] {
        &self.children
    }

    /// Populated by [`backup`].
    pub fn score(&self) -> Option<i32> {
        self.score
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of nodes in this subtree, including itself.
    pub fn size(&self) -> u64 {
        1 + self.children.iter().map(SearchNode::size).sum::<u64>()
    }
}

/// Major-board differential of `position`, weighted like the static score.
pub fn baseline_score(position: &Position) -> i32 {
    WON_BOARD_WEIGHT * count_won_boards(&summarize_major_board(position))
}

/// 按深度展开完整博弈树；根节点的子节点是引擎的候选着法。
pub fn expand(position: Position, depth_limit: u8) -> SearchNode {
    grow(position, None, 0, depth_limit, Player::Engine)
}

fn grow(
    position: Position,
    move_made: Option<Cell>,
    depth: u8,
    depth_limit: u8,
    actor: Player,
) -> SearchNode {
    let children = if depth < depth_limit {
        position
            .legal_moves()
            .iter()
            .map(|&mv| {
                let next = apply_hypothetical(&position, mv, actor);
                grow(next, Some(mv), depth + 1, depth_limit, actor.other())
            })
            .collect()
    } else {
        Vec::new()
    };

    SearchNode {
        position,
        move_made,
        children,
        score: None,
    }
}

/// 叶子静态评估。
///
/// 1. 大棋盘分出胜负时直接返回 ±[`WIN_SCORE`]。
/// 2. 已赢小棋盘差值 ×2，若超过 `baseline` 即返回。
/// 3. 加上“差一子成线”的修正，若超过 `baseline` 即返回。
/// 4. 否则返回 `[-10, 10]` 区间内的随机值。
pub fn evaluate_leaf<N: NoiseSource + ?Sized>(
    position: &Position,
    baseline: i32,
    noise: &mut N,
) -> i32 {
    let summary = summarize_major_board(position);
    match major_winner(&summary) {
        Outcome::EngineWins => return WIN_SCORE,
        Outcome::OpponentWins => return -WIN_SCORE,
        Outcome::Undecided => {}
    }

    let mut score = WON_BOARD_WEIGHT * count_won_boards(&summary);
    if score > baseline {
        return score;
    }

    // Flags are overwritten per sub-board, so only the last one, (2, 2), reaches the score.
    let mut engine_near = 0;
    let mut opponent_near = 0;
    for coord in BoxCoord::all() {
        let board = sub_board_at(position, coord);
        engine_near = i32::from(near_win(&board, Player::Engine));
        opponent_near = i32::from(near_win(&board, Player::Opponent));
    }
    score += engine_near;
    score -= opponent_near;
    if score > baseline {
        return score;
    }

    noise.draw(NOISE_FLOOR, NOISE_CEILING)
}

/// Minimax 回溯：叶子做静态评估，内部节点取子节点的最大/最小值。
pub fn backup<N: NoiseSource + ?Sized>(
    node: &mut SearchNode,
    maximizing: bool,
    baseline: i32,
    noise: &mut N,
) -> i32 {
    let score = if node.children.is_empty() {
        evaluate_leaf(&node.position, baseline, noise)
    } else {
        let mut value = if maximizing { i32::MIN } else { i32::MAX };
        for child in &mut node.children {
            let child_score = backup(child, !maximizing, baseline, noise);
            value = if maximizing {
                value.max(child_score)
            } else {
                value.min(child_score)
            };
        }
        value
    };
    node.score = Some(score);
    score
}

fn best_child(root: &SearchNode) -> Option<(&SearchNode, i32)> {
    let mut best: Option<(&SearchNode, i32)> = None;
    for child in &root.children {
        let Some(score) = child.score else {
            continue;
        };
        // strict comparison keeps the first child among equal scores
        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((child, score));
        }
    }
    best
}

/// 选出得分最高的根子节点对应的着法；没有已评分的子节点时返回 `None`。
pub fn select_best(root: &SearchNode) -> Option<Cell> {
    best_child(root).and_then(|(child, _)| child.move_made)
}

/// Full expand → backup → select pipeline, reporting search statistics.
pub fn search<N: NoiseSource + ?Sized>(
    position: &Position,
    depth_limit: u8,
    noise: &mut N,
) -> Result<SearchDecision, SearchError> {
    if depth_limit == 0 {
        return Err(SearchError::InvalidDepth { depth: depth_limit });
    }
    if position.legal_moves().is_empty() {
        return Err(SearchError::NoLegalMoves);
    }

    let baseline = baseline_score(position);
    let mut root = expand(position.clone(), depth_limit);
    backup(&mut root, true, baseline, noise);

    let (child, score) = best_child(&root).ok_or(SearchError::NoLegalMoves)?;
    let best_move = child.move_made.ok_or(SearchError::NoLegalMoves)?;

    Ok(SearchDecision {
        best_move,
        score,
        baseline,
        depth: depth_limit,
        nodes: root.size(),
        candidates: root.children.len(),
    })
}

pub fn select_move<N: NoiseSource + ?Sized>(
    position: &Position,
    depth_limit: u8,
    noise: &mut N,
) -> Result<Cell, SearchError> {
    search(position, depth_limit, noise).map(|decision| decision.best_move)
}

/// 有名字的搜索器，持有配置与随机数发生器；每次决策都从头构建搜索树。
pub struct MoveSearcher {
    name: String,
    config: SearchConfig,
    rng: SmallRng,
}

impl MoveSearcher {
    pub fn new(name: impl Into<String>, config: SearchConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Self {
            name: name.into(),
            config,
            rng,
        }
    }

    pub fn with_seed(name: impl Into<String>, config: SearchConfig, seed: u64) -> Self {
        Self::new(name, config.with_seed(seed))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn decide(&mut self, position: &Position) -> Result<SearchDecision, SearchError> {
        let decision = search(position, self.config.depth, &mut self.rng)?;
        log!(
            "[{}] move {} score {} (baseline {}, {} nodes, depth {})",
            self.name,
            decision.best_move,
            decision.score,
            decision.baseline,
            decision.nodes,
            decision.depth
        );
        Ok(decision)
    }
}
