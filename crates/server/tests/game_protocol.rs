#![forbid(unsafe_code)]

mod support;

use serde_json::json;
use support::*;

fn step_id(exchange: &Exchange) -> i64 {
    exchange.notification("newUndoableStep")["params"]["args"]["stepId"]
        .as_i64()
        .expect("step id")
}

#[test]
fn setup_play_undo_restart_confirm() {
    let mut server = Server::start("full_turn");
    let init = server.call("initialize", json!({}));
    assert_eq!(init.result()["serverInfo"]["name"], json!("turnjournal"));

    let setup = server.setup(&[(10, "Ada"), (20, "Bo")]);
    assert_eq!(setup.names(), vec!["message"]);
    let data = setup.result().clone();
    assert_eq!(data["state"]["name"], json!("playerTurn"));
    assert_eq!(data["activePlayer"], json!(10));
    assert_eq!(hand_ids(&data), vec![1, 2, 3, 4]);
    assert_eq!(data["handCounts"]["20"], json!(4));
    assert_eq!(data["previousSteps"], json!([]));

    let rejected = server.act(20, "actPlayCard", json!({ "cardId": 5, "side": "left" }));
    assert_eq!(error_code(&rejected), "INVALID_ACTION");
    assert!(rejected.notifications.is_empty());
    let rejected = server.act(10, "actPlayCard", json!({ "cardId": 5, "side": "left" }));
    assert_eq!(error_code(&rejected), "INVALID_ACTION");
    let rejected = server.act(10, "actPlayCard", json!({ "cardId": 1, "side": "up" }));
    assert_eq!(error_code(&rejected), "INVALID_INPUT");

    let first = server.act(10, "actPlayCard", json!({ "cardId": 1, "side": "left" }));
    assert_eq!(first.result()["success"], json!(true));
    assert_eq!(first.result()["state"]["name"], json!("playerTurn"));
    assert_eq!(first.names(), vec!["newUndoableStep", "cardPlaced"]);
    assert_eq!(
        first.notification("newUndoableStep")["params"]["playerId"],
        json!(10)
    );
    let placed = &first.notification("cardPlaced")["params"]["args"];
    assert_eq!(placed["player_name"], json!("Ada"));
    assert_eq!(placed["card"]["location"], json!("board_left"));
    let step1 = step_id(&first);

    let data = server.data(10);
    assert_eq!(score(&data, 10), 1);
    assert_eq!(data["previousSteps"], json!([step1]));
    assert_eq!(data["previousChoices"], json!(1));
    assert_eq!(data["state"]["args"]["cardPlaced"], json!(true));

    let second = server.act(10, "actPlayCard", json!({ "cardId": 2, "side": "right" }));
    assert_eq!(second.result()["state"]["name"], json!("confirmTurn"));
    let step2 = step_id(&second);
    let data = server.data(10);
    assert_eq!(score(&data, 10), 9);
    assert_eq!(data["state"]["args"]["previousSteps"], json!([step1, step2]));

    let undo = server.act(10, "actUndoToStep", json!({ "stepId": step2 }));
    assert_eq!(undo.result()["state"]["name"], json!("playerTurn"));
    assert_eq!(undo.names(), vec!["clearTurn", "refreshUI"]);
    assert_eq!(
        undo.notification("clearTurn")["params"]["args"]["notifIds"],
        json!(second.uids())
    );
    let datas = &undo.notification("refreshUI")["params"]["args"]["datas"];
    assert_eq!(score(datas, 10), 1);
    assert!(datas.get("hand").is_none(), "refresh must not leak hands");
    let data = server.data(10);
    assert_eq!(hand_ids(&data), vec![2, 3, 4]);
    assert_eq!(data["previousSteps"], json!([step1]));
    assert_eq!(data["canceledNotifIds"], json!(second.uids()));

    let restart = server.act(10, "actRestart", json!({}));
    assert_eq!(restart.result()["state"]["name"], json!("playerTurn"));
    assert_eq!(
        restart.notification("clearTurn")["params"]["args"]["notifIds"],
        json!(first.uids())
    );
    let data = server.data(10);
    assert_eq!(score(&data, 10), 0);
    assert_eq!(hand_ids(&data), vec![1, 2, 3, 4]);
    assert_eq!(data["previousChoices"], json!(0));
    assert_eq!(data["state"]["args"]["cardPlaced"], json!(false));
    assert_eq!(data["board"], json!([]));

    assert_eq!(error_code(&server.act(10, "actRestart", json!({}))), "INVALID_ACTION");
    assert_eq!(
        error_code(&server.act(10, "actUndoToStep", json!({ "stepId": step1 }))),
        "INVALID_ACTION"
    );
    assert_eq!(error_code(&server.act(10, "actConfirmTurn", json!({}))), "INVALID_ACTION");

    server.act(10, "actPlayCard", json!({ "cardId": 1, "side": "left" }));
    let last = server.act(10, "actPlayCard", json!({ "cardId": 3, "side": "left" }));
    assert_eq!(last.result()["state"]["name"], json!("confirmTurn"));
    let confirm = server.act(10, "actConfirmTurn", json!({}));
    assert_eq!(confirm.result()["state"]["name"], json!("playerTurn"));
    assert_eq!(confirm.names(), vec!["message", "message", "message"]);

    let data = server.data(20);
    assert_eq!(data["activePlayer"], json!(20));
    assert_eq!(data["previousSteps"], json!([]));
    assert_eq!(score(&data, 10), 7);
    assert_eq!(data["handCounts"]["10"], json!(2));
    assert_eq!(hand_ids(&data), vec![5, 6, 7, 8]);

    assert_eq!(error_code(&server.act(10, "actRestart", json!({}))), "INVALID_ACTION");
    assert_eq!(error_code(&server.act(20, "actRestart", json!({}))), "INVALID_ACTION");
}

#[test]
fn open_turn_survives_a_server_restart() {
    let mut server = Server::start("reopen");
    server.setup(&[(1, "Ada"), (2, "Bo")]);
    let played = server.act(1, "actPlayCard", json!({ "cardId": 2, "side": "left" }));
    let step = step_id(&played);
    let storage_dir = server.keep_storage();

    let mut server = Server::start_with_storage_dir(storage_dir, &[], true);
    let data = server.data(1);
    assert_eq!(data["previousSteps"], json!([step]));
    assert_eq!(score(&data, 1), 8);

    let restart = server.act(1, "actRestart", json!({}));
    assert_eq!(
        restart.notification("clearTurn")["params"]["args"]["notifIds"],
        json!(played.uids())
    );
    assert_eq!(score(&server.data(1), 1), 0);
}

#[test]
fn disabled_confirmation_passes_the_turn_and_ends_the_game() {
    let mut server = Server::start_with_config(
        "auto_confirm",
        Some("cards_per_turn: 1\nhand_size: 1\nconfirm: disabled\n"),
    );
    server.setup(&[(10, "Ada"), (20, "Bo")]);

    let first = server.act(10, "actPlayCard", json!({ "cardId": 1, "side": "left" }));
    assert_eq!(first.result()["state"]["name"], json!("playerTurn"));
    assert_eq!(
        first.names(),
        vec!["newUndoableStep", "cardPlaced", "message", "message", "message"]
    );
    assert_eq!(server.data(20)["activePlayer"], json!(20));

    let last = server.act(20, "actPlayCard", json!({ "cardId": 2, "side": "right" }));
    assert_eq!(last.result()["state"]["name"], json!("gameEnd"));
    let data = server.data(10);
    assert_eq!(data["state"]["args"]["winners"], json!([20]));
    assert_eq!(data["state"]["args"]["bestScore"], json!(8));

    let after = server.act(20, "actRestart", json!({}));
    assert_eq!(error_code(&after), "INVALID_ACTION");
}

#[test]
fn undo_is_refused_when_the_journal_is_off() {
    let mut server = Server::start_with_config("journal_off", Some("logging: false\n"));
    server.setup(&[(10, "Ada"), (20, "Bo")]);

    let played = server.act(10, "actPlayCard", json!({ "cardId": 1, "side": "left" }));
    assert_eq!(played.result()["success"], json!(true));
    let step = step_id(&played);
    let data = server.data(10);
    assert_eq!(data["previousSteps"], json!([]));
    assert_eq!(data["previousChoices"], json!(1));

    let restart = server.act(10, "actRestart", json!({}));
    assert_eq!(error_code(&restart), "INVALID_ACTION");
    assert!(restart.notifications.is_empty());
    let undo = server.act(10, "actUndoToStep", json!({ "stepId": step }));
    assert_eq!(error_code(&undo), "INVALID_ACTION");
    assert!(undo.notifications.is_empty());

    let data = server.data(10);
    assert_eq!(score(&data, 10), 1);
    assert_eq!(data["canceledNotifIds"], json!([]));
    assert_eq!(hand_ids(&data), vec![2, 3, 4]);
}

#[test]
fn protocol_errors_and_guards() {
    let mut server = Server::start("protocol");

    assert_eq!(server.call("ping", json!({})).result(), &json!({}));
    let unknown = server.call("game/teleport", json!({}));
    assert_eq!(unknown.response["error"]["code"], json!(-32601));

    server.send_raw("{not json");
    assert_eq!(server.recv()["error"]["code"], json!(-32700));
    server.send_raw(r#"{"jsonrpc":"2.0","method":"game/teleport"}"#);
    assert_eq!(server.call("ping", json!({})).result(), &json!({}));

    let early = server.call("game/data", json!({ "playerId": 1 }));
    assert_eq!(error_code(&early), "INVALID_ACTION");
    let malformed = server.call("game/action", json!({ "action": "actRestart" }));
    assert_eq!(error_code(&malformed), "INVALID_INPUT");

    server.setup(&[(1, "Ada")]);
    let again = server.setup(&[(2, "Bo")]);
    assert_eq!(error_code(&again), "INVALID_ACTION");
    assert!(again.notifications.is_empty());

    let bogus = server.act(1, "actPass", json!({}));
    assert_eq!(error_code(&bogus), "INVALID_ACTION");
    let bad_player = server.act(0, "actRestart", json!({}));
    assert_eq!(error_code(&bad_player), "INVALID_INPUT");
}
