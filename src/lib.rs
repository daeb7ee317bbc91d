pub mod ai;
pub mod game;
pub mod utils;

use gloo_timers::future::TimeoutFuture;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use std::fmt::Display;
use std::str::FromStr;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::Promise;

pub use ai::{
    select_move, Difficulty, MoveSearcher, NoiseSource, ScriptedNoise, SearchConfig,
    SearchDecision, SearchError, SearchNode, DEFAULT_DEPTH,
};
pub use game::{
    apply_hypothetical, ActiveBox, BoxCoord, Cell, IntegrityError, Marker, Outcome, Player,
    Position, PositionRecord,
};

const DEFAULT_BOT_NAME: &str = "uttt_bot";

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    utils::set_panic_hook();
}

fn to_js_error<E: Serialize + Display>(error: E) -> JsValue {
    to_value(&error).unwrap_or_else(|_| JsValue::from_str(&error.to_string()))
}

fn serde_to_js_error<E: Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn config_from(difficulty: Option<&str>, seed: Option<u64>) -> SearchConfig {
    let difficulty = difficulty
        .and_then(|value| Difficulty::from_str(value).ok())
        .unwrap_or(Difficulty::Normal);
    let config = SearchConfig::from_difficulty(difficulty);
    match seed {
        Some(seed) => config.with_seed(seed),
        None => config,
    }
}

fn position_from_js(value: JsValue) -> Result<Position, JsValue> {
    let record: PositionRecord = from_value(value).map_err(JsValue::from)?;
    Position::try_from(record).map_err(to_js_error)
}

fn decide_json(searcher: &mut MoveSearcher, position_json: &str) -> Result<String, JsValue> {
    let record: PositionRecord = serde_json::from_str(position_json).map_err(serde_to_js_error)?;
    let position = Position::try_from(record).map_err(to_js_error)?;
    let decision = searcher.decide(&position).map_err(to_js_error)?;
    serde_json::to_string(&decision).map_err(serde_to_js_error)
}

/// 有名字的对局机器人，供前端游戏循环直接调用。
#[wasm_bindgen]
pub struct UltimateBot {
    searcher: MoveSearcher,
}

#[wasm_bindgen]
impl UltimateBot {
    #[wasm_bindgen(constructor)]
    pub fn new(name: Option<String>, difficulty: Option<String>, seed: Option<u64>) -> UltimateBot {
        let name = name.unwrap_or_else(|| DEFAULT_BOT_NAME.to_string());
        let config = config_from(difficulty.as_deref(), seed);
        UltimateBot {
            searcher: MoveSearcher::new(name, config),
        }
    }

    pub fn name(&self) -> String {
        self.searcher.name().to_string()
    }

    pub fn depth(&self) -> u8 {
        self.searcher.config().depth
    }

    pub fn move_json(&mut self, position_json: &str) -> Result<String, JsValue> {
        decide_json(&mut self.searcher, position_json)
    }

    pub fn think(&self, position_json: String, delay_ms: Option<u32>) -> Promise {
        let name = self.searcher.name().to_string();
        let config = self.searcher.config().clone();
        let delay = delay_ms.unwrap_or(0);

        future_to_promise(async move {
            if delay > 0 {
                TimeoutFuture::new(delay).await;
            }
            let mut searcher = MoveSearcher::new(name, config);
            let json = decide_json(&mut searcher, &position_json)?;
            Ok(JsValue::from_str(&json))
        })
    }
}

/// 为给定局面选出最佳着法，返回 `[row, col]`。
#[wasm_bindgen(js_name = "selectMove")]
pub fn select_move_js(
    position: JsValue,
    depth: Option<u8>,
    seed: Option<u64>,
) -> Result<JsValue, JsValue> {
    let position = position_from_js(position)?;
    let config = SearchConfig {
        depth: depth.unwrap_or(DEFAULT_DEPTH),
        seed,
    };
    let mut searcher = MoveSearcher::new(DEFAULT_BOT_NAME, config);
    let decision = searcher.decide(&position).map_err(to_js_error)?;
    to_value(&decision.best_move).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "computeDecision")]
pub fn compute_decision(
    position: JsValue,
    difficulty: Option<String>,
    seed: Option<u64>,
) -> Result<JsValue, JsValue> {
    let position = position_from_js(position)?;
    let mut searcher = MoveSearcher::new(DEFAULT_BOT_NAME, config_from(difficulty.as_deref(), seed));
    let decision = searcher.decide(&position).map_err(to_js_error)?;
    to_value(&decision).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "validatePosition")]
pub fn validate_position(position: JsValue) -> Result<(), JsValue> {
    position_from_js(position).map(|_| ())
}

/// 假设落子并返回新局面；非法着法以错误返回而不是 panic。
#[wasm_bindgen(js_name = "applyMove")]
pub fn apply_move(position: JsValue, mv: JsValue, player: JsValue) -> Result<JsValue, JsValue> {
    let position = position_from_js(position)?;
    let mv: Cell = from_value(mv).map_err(JsValue::from)?;
    let player: Player = from_value(player).map_err(JsValue::from)?;
    if !position.is_legal(mv) {
        return Err(to_js_error(SearchError::IllegalMove {
            row: mv.row(),
            col: mv.col(),
        }));
    }
    to_value(&apply_hypothetical(&position, mv, player)).map_err(JsValue::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bot_answers_board_dict_json() {
        let position = Position::empty();
        let json = serde_json::to_string(&position).expect("position should serialize");

        let mut bot = UltimateBot::new(Some("tester".into()), Some("easy".into()), Some(3));
        assert_eq!(bot.name(), "tester");
        assert_eq!(bot.depth(), 1);

        let answer = bot.move_json(&json).expect("empty board has moves");
        let decision: SearchDecision =
            serde_json::from_str(&answer).expect("decision should deserialize");
        assert!(position.is_legal(decision.best_move));
        assert_eq!(decision.candidates, 81);
    }

    #[test]
    fn unknown_difficulty_falls_back_to_normal() {
        let bot = UltimateBot::new(None, Some("grandmaster".into()), None);
        assert_eq!(bot.name(), DEFAULT_BOT_NAME);
        assert_eq!(bot.depth(), 2);
    }
}
