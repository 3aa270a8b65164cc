#![forbid(unsafe_code)]
#![allow(dead_code)]

use serde_json::{Value, json};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

pub(crate) struct Server {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    storage_dir: PathBuf,
    cleanup_storage: bool,
    next_id: i64,
}

/// What one request produced: pushed `game/notify` lines, then the response.
pub(crate) struct Exchange {
    pub(crate) notifications: Vec<Value>,
    pub(crate) response: Value,
}

impl Exchange {
    pub(crate) fn result(&self) -> &Value {
        &self.response["result"]
    }

    pub(crate) fn names(&self) -> Vec<String> {
        self.notifications
            .iter()
            .map(|note| note["params"]["name"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    pub(crate) fn notification(&self, name: &str) -> &Value {
        self.notifications
            .iter()
            .find(|note| note["params"]["name"] == json!(name))
            .unwrap_or_else(|| panic!("no {name} notification in {:?}", self.names()))
    }

    pub(crate) fn uids(&self) -> Vec<String> {
        self.notifications
            .iter()
            .map(|note| note["params"]["uid"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}

impl Server {
    pub(crate) fn start(test_name: &str) -> Self {
        Self::start_with_config(test_name, None)
    }

    pub(crate) fn start_with_config(test_name: &str, config_yaml: Option<&str>) -> Self {
        let storage_dir = temp_dir(test_name);
        std::fs::create_dir_all(&storage_dir).expect("create storage dir");
        let mut extra_args = Vec::new();
        if let Some(yaml) = config_yaml {
            let path = storage_dir.join("game.yaml");
            std::fs::write(&path, yaml).expect("write config");
            extra_args.push("--config".to_string());
            extra_args.push(path.to_string_lossy().to_string());
        }
        Self::start_with_storage_dir(storage_dir, &extra_args, true)
    }

    pub(crate) fn start_with_storage_dir(
        storage_dir: PathBuf,
        extra_args: &[String],
        cleanup_storage: bool,
    ) -> Self {
        let mut child = Command::new(env!("CARGO_BIN_EXE_tj_server"))
            .arg("--storage-dir")
            .arg(&storage_dir)
            .args(extra_args)
            .env("TJ_LOG", "warn")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .expect("spawn tj_server");

        let stdin = child.stdin.take().expect("stdin");
        let stdout = BufReader::new(child.stdout.take().expect("stdout"));

        Self {
            child,
            stdin,
            stdout,
            storage_dir,
            cleanup_storage,
            next_id: 1,
        }
    }

    pub(crate) fn storage_dir(&self) -> PathBuf {
        self.storage_dir.clone()
    }

    /// Keeps the database around after drop so a second server can reopen it.
    pub(crate) fn keep_storage(mut self) -> PathBuf {
        self.cleanup_storage = false;
        self.storage_dir.clone()
    }

    pub(crate) fn send_raw(&mut self, raw: &str) {
        writeln!(self.stdin, "{raw}").expect("write request");
        self.stdin.flush().expect("flush request");
    }

    pub(crate) fn recv(&mut self) -> Value {
        let mut line = String::new();
        self.stdout.read_line(&mut line).expect("read response");
        assert!(!line.trim().is_empty(), "empty response line");
        serde_json::from_str(&line).expect("parse response json")
    }

    /// Sends one request and reads lines until the response carrying its id.
    pub(crate) fn call(&mut self, method: &str, params: Value) -> Exchange {
        let id = self.next_id;
        self.next_id += 1;
        self.send_raw(&json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params }).to_string());

        let mut notifications = Vec::new();
        loop {
            let line = self.recv();
            if line.get("id").is_some() {
                assert_eq!(line["id"], json!(id), "response out of order");
                return Exchange {
                    notifications,
                    response: line,
                };
            }
            assert_eq!(line["method"], json!("game/notify"), "unexpected line {line}");
            notifications.push(line);
        }
    }

    pub(crate) fn setup(&mut self, players: &[(i64, &str)]) -> Exchange {
        let players = players
            .iter()
            .map(|(id, name)| json!({ "id": id, "name": name }))
            .collect::<Vec<_>>();
        self.call("game/setup", json!({ "players": players }))
    }

    pub(crate) fn act(&mut self, player_id: i64, action: &str, args: Value) -> Exchange {
        self.call(
            "game/action",
            json!({ "playerId": player_id, "action": action, "args": args }),
        )
    }

    pub(crate) fn data(&mut self, player_id: i64) -> Value {
        self.call("game/data", json!({ "playerId": player_id }))
            .result()
            .clone()
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        if self.cleanup_storage {
            let _ = std::fs::remove_dir_all(&self.storage_dir);
        }
    }
}

pub(crate) fn temp_dir(test_name: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time")
        .as_nanos();
    let mut dir = std::env::temp_dir();
    dir.push(format!("tj_server_{test_name}_{}_{}", std::process::id(), nanos));
    dir
}

pub(crate) fn error_code(exchange: &Exchange) -> String {
    exchange.result()["error"]["code"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}

pub(crate) fn hand_ids(data: &Value) -> Vec<i64> {
    data["hand"]
        .as_array()
        .expect("hand")
        .iter()
        .map(|card| card["id"].as_i64().expect("card id"))
        .collect()
}

pub(crate) fn score(data: &Value, player_id: i64) -> i64 {
    data["players"]
        .as_array()
        .expect("players")
        .iter()
        .find(|player| player["id"] == json!(player_id))
        .and_then(|player| player["score"].as_i64())
        .expect("score")
}
