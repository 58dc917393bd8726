#![forbid(unsafe_code)]

//! Tic-tac-toe on a `rewind` store, with time travel.
//!
//! The whole game lives in one namespaced module. Only the turn-handover
//! mutation captures snapshots, so a single undo rewinds half a turn (one
//! mark plus the handover), and the UI theme key is excluded from restore so
//! rewinding the board never flips the theme back.
//!
//! The machine opponent picks the first free cell. An embedding app
//! typically fires [`machine_move`] from a delayed timer; the move itself is
//! just two ordinary commits, so the delay never touches the history engine.

use serde_json::{Value, json};

use rewind_history::{History, HistoryConfig, HistoryOptions, InstallError, ModuleId, ModuleOptions, locate};
use rewind_store::{ModuleDef, ModuleState, Store, StoreBuilder, StoreError};

/// Namespace of the game module.
pub const GAME_NAMESPACE: &str = "game";

/// Mark placed by the human player.
pub const PLAYER_MARK: &str = "X";

/// Mark placed by the machine opponent.
pub const MACHINE_MARK: &str = "O";

/// The eight winning lines of the 3×3 board, as cell indices.
const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Errors raised while building the game.
#[derive(Debug)]
pub enum GameError {
    /// The store rejected the module layout.
    Store(StoreError),
    /// The history plugin rejected its configuration.
    Install(InstallError),
}

impl std::fmt::Display for GameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "store setup failed: {err}"),
            Self::Install(err) => write!(f, "history install failed: {err}"),
        }
    }
}

impl std::error::Error for GameError {}

impl From<StoreError> for GameError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<InstallError> for GameError {
    fn from(err: InstallError) -> Self {
        Self::Install(err)
    }
}

/// Build the game store and install the history plugin on it.
///
/// Snapshots are captured on `set_player_turn` only, and `current_theme` is
/// excluded from restore.
pub fn build_game() -> Result<(Store, History, ModuleId), GameError> {
    let mut store = StoreBuilder::new()
        .module(
            GAME_NAMESPACE,
            ModuleDef::new()
                .namespaced()
                .state("themes", json!(["light", "dark"]))
                .state("current_theme", json!("light"))
                .state("cells", json!([null, null, null, null, null, null, null, null, null]))
                .state("last_cell", Value::Null)
                .state("player_turn", json!(true))
                .mutation("set_theme", |state: &mut ModuleState, payload: &Value| {
                    let known = state
                        .get("themes")
                        .and_then(Value::as_array)
                        .is_some_and(|themes| themes.contains(payload));
                    if known {
                        state.insert("current_theme".into(), payload.clone());
                    }
                })
                .mutation("set_player_turn", |state: &mut ModuleState, payload: &Value| {
                    state.insert("player_turn".into(), payload.clone());
                })
                .mutation("mark_cell", |state: &mut ModuleState, payload: &Value| {
                    let Some(index) = payload.get("index").and_then(Value::as_u64) else {
                        return;
                    };
                    let Some(marker) = payload.get("marker") else {
                        return;
                    };
                    let marker = marker.clone();
                    if let Some(cell) = state
                        .get_mut("cells")
                        .and_then(Value::as_array_mut)
                        .and_then(|cells| cells.get_mut(index as usize))
                    {
                        *cell = marker;
                        state.insert("last_cell".into(), json!(index));
                    }
                }),
        )
        .build()?;

    let options = HistoryOptions::new().track(
        GAME_NAMESPACE,
        ModuleOptions::new()
            .should_snapshot(|_, op| op.ty == "set_player_turn")
            .include_state(|_, key| key != "current_theme"),
    );
    let history = History::install(&mut store, options, HistoryConfig::default())?;
    let id = history
        .module_id(GAME_NAMESPACE)
        .ok_or(InstallError::ModuleNotFound(GAME_NAMESPACE.to_owned()))?;
    Ok((store, history, id))
}

/// The game module's live state, if the store carries one.
#[must_use]
pub fn game_state(store: &Store) -> Option<&ModuleState> {
    locate::find(store.root(), &locate::segments(GAME_NAMESPACE)).map(|node| node.state())
}

/// Place the player's mark and hand the turn to the machine.
///
/// Returns `Ok(false)` without committing anything when the game is over,
/// it is not the player's turn, or the cell is taken.
pub fn player_move(store: &mut Store, index: usize) -> Result<bool, StoreError> {
    let playable = game_state(store)
        .is_some_and(|state| !is_over(state) && player_turn(state) && cell_is_empty(state, index));
    if !playable {
        return Ok(false);
    }
    store.commit(
        "game/mark_cell",
        json!({ "index": index, "marker": PLAYER_MARK }),
    )?;
    store.commit("game/set_player_turn", json!(false))?;
    Ok(true)
}

/// Place the machine's mark on the first free cell and hand the turn back.
///
/// Returns `Ok(false)` without committing anything when the game is over or
/// it is the player's turn.
pub fn machine_move(store: &mut Store) -> Result<bool, StoreError> {
    let choice = game_state(store).and_then(|state| {
        if is_over(state) || player_turn(state) {
            None
        } else {
            first_empty(state)
        }
    });
    let Some(index) = choice else {
        return Ok(false);
    };
    store.commit(
        "game/mark_cell",
        json!({ "index": index, "marker": MACHINE_MARK }),
    )?;
    store.commit("game/set_player_turn", json!(true))?;
    Ok(true)
}

/// The winning mark, if any line is complete.
#[must_use]
pub fn winner(state: &ModuleState) -> Option<String> {
    let cells = state.get("cells").and_then(Value::as_array)?;
    for line in LINES {
        let a = cells.get(line[0]).and_then(Value::as_str);
        let b = cells.get(line[1]).and_then(Value::as_str);
        let c = cells.get(line[2]).and_then(Value::as_str);
        if let (Some(a), Some(b), Some(c)) = (a, b, c) {
            if a == b && b == c {
                return Some(a.to_owned());
            }
        }
    }
    None
}

/// Whether the game has ended (a win or a full board).
#[must_use]
pub fn is_over(state: &ModuleState) -> bool {
    if winner(state).is_some() {
        return true;
    }
    state
        .get("cells")
        .and_then(Value::as_array)
        .is_some_and(|cells| cells.iter().all(|cell| !cell.is_null()))
}

/// Whether it is the player's turn.
#[must_use]
pub fn player_turn(state: &ModuleState) -> bool {
    state
        .get("player_turn")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

fn cell_is_empty(state: &ModuleState, index: usize) -> bool {
    state
        .get("cells")
        .and_then(Value::as_array)
        .and_then(|cells| cells.get(index))
        .is_some_and(Value::is_null)
}

fn first_empty(state: &ModuleState) -> Option<usize> {
    state
        .get("cells")
        .and_then(Value::as_array)?
        .iter()
        .position(Value::is_null)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(marks: [Option<&str>; 9]) -> ModuleState {
        let cells: Vec<Value> = marks
            .iter()
            .map(|m| m.map_or(Value::Null, |s| json!(s)))
            .collect();
        let mut state = ModuleState::new();
        state.insert("cells".into(), json!(cells));
        state
    }

    #[test]
    fn winner_spots_rows_columns_and_diagonals() {
        let row = board([Some("X"), Some("X"), Some("X"), None, None, None, None, None, None]);
        assert_eq!(winner(&row), Some("X".into()));

        let column = board([Some("O"), None, None, Some("O"), None, None, Some("O"), None, None]);
        assert_eq!(winner(&column), Some("O".into()));

        let diagonal = board([Some("X"), None, None, None, Some("X"), None, None, None, Some("X")]);
        assert_eq!(winner(&diagonal), Some("X".into()));
    }

    #[test]
    fn mixed_lines_do_not_win() {
        let state = board([Some("X"), Some("O"), Some("X"), None, None, None, None, None, None]);
        assert_eq!(winner(&state), None);
        assert!(!is_over(&state));
    }

    #[test]
    fn full_board_without_winner_ends_the_game() {
        let state = board([
            Some("X"),
            Some("O"),
            Some("X"),
            Some("X"),
            Some("O"),
            Some("O"),
            Some("O"),
            Some("X"),
            Some("X"),
        ]);
        assert_eq!(winner(&state), None);
        assert!(is_over(&state));
    }

    #[test]
    fn malformed_mark_payloads_change_nothing() {
        let (mut store, _history, _id) = build_game().unwrap();
        store.commit("game/mark_cell", json!({ "marker": "X" })).unwrap();
        store.commit("game/mark_cell", json!({ "index": 99, "marker": "X" })).unwrap();
        let state = game_state(&store).unwrap();
        let cells = state["cells"].as_array().unwrap();
        assert!(cells.iter().all(Value::is_null));
        assert_eq!(state["last_cell"], Value::Null);
    }

    #[test]
    fn unknown_theme_is_rejected() {
        let (mut store, _history, _id) = build_game().unwrap();
        store.commit("game/set_theme", json!("sepia")).unwrap();
        assert_eq!(game_state(&store).unwrap()["current_theme"], json!("light"));
        store.commit("game/set_theme", json!("dark")).unwrap();
        assert_eq!(game_state(&store).unwrap()["current_theme"], json!("dark"));
    }
}
