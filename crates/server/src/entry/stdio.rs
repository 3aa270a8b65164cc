#![forbid(unsafe_code)]

use crate::server::Reply;
use crate::{GameServer, JsonRpcRequest, json_rpc_error};
use serde_json::Value;
use std::io::{BufRead, BufReader, Write};

fn write_newline_json(
    stdout: &mut std::io::StdoutLock<'_>,
    resp: &Value,
) -> Result<(), Box<dyn std::error::Error>> {
    writeln!(stdout, "{}", serde_json::to_string(resp)?)?;
    Ok(())
}

/// One request per line in, one JSON value per line out. Requests are served strictly in order.
pub(crate) fn run_stdio(server: &mut GameServer) -> Result<(), Box<dyn std::error::Error>> {
    let stdin = std::io::stdin();
    let mut reader = BufReader::new(stdin.lock());
    let mut stdout = std::io::stdout().lock();

    loop {
        let mut line = String::new();
        let read = reader.read_line(&mut line)?;
        if read == 0 {
            break;
        }
        let raw = line.trim();
        if raw.is_empty() {
            continue;
        }
        let reply = handle_newline_request(server, raw);
        for notification in &reply.notifications {
            write_newline_json(&mut stdout, notification)?;
        }
        if let Some(response) = &reply.response {
            write_newline_json(&mut stdout, response)?;
        }
        stdout.flush()?;
    }

    tracing::info!("stdin closed, shutting down");
    Ok(())
}

fn handle_newline_request(server: &mut GameServer, raw: &str) -> Reply {
    let reply = |response: Value| Reply {
        notifications: Vec::new(),
        response: Some(response),
    };

    let data: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => return reply(json_rpc_error(None, -32700, &format!("Parse error: {e}"))),
    };

    let (id, has_method) = match data.as_object() {
        Some(obj) => (obj.get("id").cloned(), obj.contains_key("method")),
        None => return reply(json_rpc_error(None, -32600, "Invalid Request")),
    };
    if !has_method {
        return reply(json_rpc_error(id, -32600, "Invalid Request"));
    }

    match serde_json::from_value::<JsonRpcRequest>(data) {
        Ok(request) => server.handle(request),
        Err(e) => reply(json_rpc_error(id, -32600, &format!("Invalid Request: {e}"))),
    }
}
