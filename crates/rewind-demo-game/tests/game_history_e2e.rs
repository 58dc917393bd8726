#![forbid(unsafe_code)]

//! End-to-end tests for the game store with time travel installed.
//!
//! Snapshots are captured on the turn-handover mutation only, so one undo
//! rewinds half a turn: the mark and the handover that followed it.

use rewind_demo_game::{
    GAME_NAMESPACE, MACHINE_MARK, PLAYER_MARK, build_game, game_state, is_over, machine_move,
    player_move, player_turn, winner,
};
use serde_json::{Value, json};

fn cell(store: &rewind_store::Store, index: usize) -> Value {
    game_state(store).unwrap()["cells"].as_array().unwrap()[index].clone()
}

#[test]
fn a_full_turn_captures_two_snapshots() {
    let (mut store, history, id) = build_game().unwrap();

    assert!(player_move(&mut store, 0).unwrap());
    assert_eq!(history.undo_count(id), 1);

    // The opponent fires later in a real app; here "later" is immediately.
    assert!(machine_move(&mut store).unwrap());
    assert_eq!(history.undo_count(id), 2);

    assert_eq!(cell(&store, 0), json!(PLAYER_MARK));
    assert_eq!(cell(&store, 1), json!(MACHINE_MARK));
    assert!(player_turn(game_state(&store).unwrap()));
}

#[test]
fn undo_rewinds_half_a_turn_at_a_time() {
    let (mut store, history, id) = build_game().unwrap();
    player_move(&mut store, 0).unwrap();
    machine_move(&mut store).unwrap();

    assert!(history.undo(&mut store, id));
    // Back to just after the player's mark: machine mark gone, machine to move.
    assert_eq!(cell(&store, 0), json!(PLAYER_MARK));
    assert_eq!(cell(&store, 1), Value::Null);
    assert!(!player_turn(game_state(&store).unwrap()));

    assert!(history.undo(&mut store, id));
    // Back to the empty board.
    assert_eq!(cell(&store, 0), Value::Null);
    assert!(player_turn(game_state(&store).unwrap()));
    assert_eq!(history.undo_count(id), 0);
    assert_eq!(history.redo_count(id), 2);
}

#[test]
fn redo_replays_the_rewound_turn() {
    let (mut store, history, id) = build_game().unwrap();
    player_move(&mut store, 4).unwrap();
    machine_move(&mut store).unwrap();
    history.undo(&mut store, id);
    history.undo(&mut store, id);

    assert!(history.redo(&mut store, id));
    assert!(history.redo(&mut store, id));
    assert_eq!(cell(&store, 4), json!(PLAYER_MARK));
    assert_eq!(cell(&store, 0), json!(MACHINE_MARK));
    assert_eq!(history.undo_count(id), 2);
    assert_eq!(history.redo_count(id), 0);
}

#[test]
fn marks_only_land_on_free_cells_in_turn() {
    let (mut store, history, id) = build_game().unwrap();

    assert!(player_move(&mut store, 0).unwrap());
    // Not the player's turn anymore.
    assert!(!player_move(&mut store, 1).unwrap());
    machine_move(&mut store).unwrap();
    // Both cells are taken now.
    assert!(!player_move(&mut store, 0).unwrap());
    assert!(!player_move(&mut store, 1).unwrap());
    // Machine refuses to move during the player's turn.
    assert!(!machine_move(&mut store).unwrap());
    assert_eq!(history.undo_count(id), 2);
}

#[test]
fn theme_changes_are_never_time_travelled() {
    let (mut store, history, id) = build_game().unwrap();

    store.commit("game/set_theme", json!("dark")).unwrap();
    // The theme mutation itself captures nothing.
    assert_eq!(history.undo_count(id), 0);

    player_move(&mut store, 0).unwrap();
    machine_move(&mut store).unwrap();
    history.undo(&mut store, id);
    history.undo(&mut store, id);

    // The board rewound, the theme did not.
    assert_eq!(cell(&store, 0), Value::Null);
    assert_eq!(game_state(&store).unwrap()["current_theme"], json!("dark"));
}

#[test]
fn first_free_cell_strategy_lets_the_player_win() {
    let (mut store, _history, _id) = build_game().unwrap();

    player_move(&mut store, 0).unwrap();
    machine_move(&mut store).unwrap(); // takes 1
    player_move(&mut store, 3).unwrap();
    machine_move(&mut store).unwrap(); // takes 2
    player_move(&mut store, 6).unwrap(); // completes the 0-3-6 column

    let state = game_state(&store).unwrap();
    assert_eq!(winner(state), Some(PLAYER_MARK.to_owned()));
    assert!(is_over(state));

    // Nobody can move once the game is over.
    assert!(!player_move(&mut store, 5).unwrap());
    assert!(!machine_move(&mut store).unwrap());
}

#[test]
fn undoing_a_finished_game_reopens_play() {
    let (mut store, history, id) = build_game().unwrap();

    player_move(&mut store, 0).unwrap();
    machine_move(&mut store).unwrap();
    player_move(&mut store, 3).unwrap();
    machine_move(&mut store).unwrap();
    player_move(&mut store, 6).unwrap();
    assert!(is_over(game_state(&store).unwrap()));

    assert!(history.undo(&mut store, id));
    let state = game_state(&store).unwrap();
    assert_eq!(winner(state), None);
    assert!(!is_over(state));
    // The winning mark was rewound; the game can continue differently.
    assert_eq!(cell(&store, 6), Value::Null);
}

#[test]
fn game_module_is_tracked_under_its_namespace() {
    let (_store, history, id) = build_game().unwrap();
    assert_eq!(history.module_id(GAME_NAMESPACE), Some(id));
    assert_eq!(history.namespaces(), vec![GAME_NAMESPACE.to_owned()]);
}
