//! WebAssembly bindings for offline play.
//!
//! Exposes the local controller to JavaScript. State and moves cross the
//! boundary as JSON; the page owns the think-time timer and calls
//! `runComputerTurn` when it fires.

use wasm_bindgen::prelude::*;

use crate::actions::Move;
use crate::board::Mark;
use crate::bot::Difficulty;
use crate::local::{ComputerTurn, LocalConfig, LocalController, PlayMode, TurnOutcome};
use crate::series::SeriesLength;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// WASM-exposed local match
#[wasm_bindgen]
pub struct WasmMatch {
    controller: LocalController,
    ticket: Option<ComputerTurn>,
}

#[wasm_bindgen]
impl WasmMatch {
    /// `computer`: "X", "O" or "" for two local players.
    /// `difficulty`: "Easy", "Medium" or "Hard".
    #[wasm_bindgen(constructor)]
    pub fn new(series_length: u8, computer: &str, difficulty: &str) -> Result<WasmMatch, JsValue> {
        let series_length = SeriesLength::try_from(series_length)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        let mode = match parse_mark(computer) {
            Some(computer) => PlayMode::VsComputer {
                computer,
                difficulty: parse_difficulty(difficulty),
            },
            None => PlayMode::LocalPair,
        };

        let controller = LocalController::new(LocalConfig {
            mode,
            series_length,
            ..LocalConfig::default()
        });
        let ticket = controller.pending_computer_turn();
        Ok(WasmMatch { controller, ticket })
    }

    /// Current match state as JSON
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> String {
        serde_json::to_string(self.controller.state()).unwrap_or_else(|_| "{}".to_string())
    }

    /// Current series state as JSON
    #[wasm_bindgen(js_name = getSeries)]
    pub fn get_series(&self) -> String {
        serde_json::to_string(self.controller.series()).unwrap_or_else(|_| "{}".to_string())
    }

    /// Legal moves for the active mark as a JSON array
    #[wasm_bindgen(js_name = getLegalMoves)]
    pub fn get_legal_moves(&self) -> String {
        serde_json::to_string(&self.controller.state().legal_moves())
            .unwrap_or_else(|_| "[]".to_string())
    }

    /// Apply a move from JSON, returns the new state JSON or an error
    #[wasm_bindgen(js_name = submitMove)]
    pub fn submit_move(&mut self, move_json: &str) -> Result<String, JsValue> {
        let mv: Move = serde_json::from_str(move_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid move JSON: {}", e)))?;

        self.controller
            .submit(mv)
            .map_err(|e| JsValue::from_str(&format!("Move rejected: {}", e)))?;
        self.ticket = self.controller.pending_computer_turn();
        Ok(self.get_state())
    }

    /// Milliseconds to wait before calling `runComputerTurn`, or -1 if none is due
    #[wasm_bindgen(js_name = computerDelayMs)]
    pub fn computer_delay_ms(&self) -> i32 {
        self.ticket
            .map(|t| t.delay_ms())
            .unwrap_or(-1)
    }

    /// Run the pending computer turn; returns the move JSON, or "null" if it was cancelled
    #[wasm_bindgen(js_name = runComputerTurn)]
    pub fn run_computer_turn(&mut self) -> Result<String, JsValue> {
        let Some(ticket) = self.ticket.take() else {
            return Ok("null".to_string());
        };

        let outcome = self
            .controller
            .run_computer_turn(ticket)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.ticket = self.controller.pending_computer_turn();

        match outcome {
            TurnOutcome::Applied(mv) => {
                Ok(serde_json::to_string(&mv).unwrap_or_else(|_| "null".to_string()))
            }
            TurnOutcome::Stale => Ok("null".to_string()),
        }
    }

    #[wasm_bindgen(js_name = startNextMatch)]
    pub fn start_next_match(&mut self) -> Result<String, JsValue> {
        self.controller
            .start_next_match()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.ticket = self.controller.pending_computer_turn();
        Ok(self.get_state())
    }

    #[wasm_bindgen(js_name = resetMatch)]
    pub fn reset_match(&mut self) -> Result<String, JsValue> {
        self.controller
            .reset_match()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.ticket = self.controller.pending_computer_turn();
        Ok(self.get_state())
    }
}

fn parse_mark(value: &str) -> Option<Mark> {
    match value {
        "X" | "x" => Some(Mark::X),
        "O" | "o" => Some(Mark::O),
        _ => None,
    }
}

fn parse_difficulty(value: &str) -> Difficulty {
    match value {
        "Easy" => Difficulty::Easy,
        "Hard" => Difficulty::Hard,
        _ => Difficulty::Medium,
    }
}
