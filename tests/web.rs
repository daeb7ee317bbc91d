//! 浏览器 / Node 环境下的绑定测试：`wasm-pack test --node`。

#![cfg(target_arch = "wasm32")]

use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value, Serializer};
use uttt_core::{
    apply_move, compute_decision, select_move_js, validate_position, Cell, Position,
    SearchDecision,
};
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

fn position_js(position: &Position) -> JsValue {
    to_value(position).expect("position should convert to JS")
}

fn forced_row() -> Position {
    let json = serde_json::json!({
        "board_state": [
            [0, 0, 0, 0, 0, 0, 0, 0, 0],
            [0, -1, 0, 0, 0, 0, 0, 0, 0],
            [1, 1, 0, 0, 0, 0, 0, 0, 0],
            [0, 0, 0, 0, 0, 0, 0, 0, 0],
            [0, 0, 0, 0, 0, 0, 0, 0, 0],
            [0, 0, 0, 0, 0, 0, 0, 0, 0],
            [0, 0, 0, 0, 0, 0, 0, 0, 0],
            [0, 0, 0, 0, 0, 0, 0, 0, 0],
            [0, 0, 0, 0, 0, 0, 0, 0, 0]
        ],
        "active_box": [0, 0],
        "valid_moves": [[0, 0], [0, 1], [0, 2], [1, 0], [1, 2], [2, 2]]
    });
    serde_json::from_value(json).expect("board dict should parse")
}

#[wasm_bindgen_test]
fn select_move_returns_a_legal_pair() {
    let position = Position::empty();
    let answer = select_move_js(position_js(&position), Some(1), Some(11)).expect("search runs");
    let cell: Cell = from_value(answer).expect("answer is [row, col]");
    assert!(position.is_legal(cell));
}

#[wasm_bindgen_test]
fn compute_decision_reports_statistics() {
    let position = forced_row();
    let answer = compute_decision(position_js(&position), Some("easy".into()), Some(1))
        .expect("search runs");
    let decision: SearchDecision = from_value(answer).expect("decision converts back");
    assert_eq!(decision.depth, 1);
    assert_eq!(decision.candidates, 6);
    assert_eq!(decision.nodes, 7);
}

#[wasm_bindgen_test]
fn validate_position_rejects_inconsistent_moves() {
    let json = serde_json::json!({
        "board_state": vec![vec![0; 9]; 9],
        "active_box": [1, 1],
        "valid_moves": [[0, 0]]
    });
    let value = json
        .serialize(&Serializer::json_compatible())
        .expect("json converts to JS");
    assert!(validate_position(value).is_err());
    assert!(validate_position(position_js(&Position::empty())).is_ok());
}

#[wasm_bindgen_test]
fn apply_move_rejects_illegal_cells() {
    let position = forced_row();
    let illegal = to_value(&Cell::new(8, 8)).expect("cell converts");
    let player = JsValue::from_str("engine");
    assert!(apply_move(position_js(&position), illegal, player.clone()).is_err());

    let legal = to_value(&Cell::new(2, 2)).expect("cell converts");
    let next = apply_move(position_js(&position), legal, player).expect("legal move applies");
    let next: Position = from_value(next).expect("position converts back");
    assert_eq!(next.legal_moves().len(), 81 - 4);
}
