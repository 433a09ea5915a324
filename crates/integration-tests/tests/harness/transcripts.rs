//! Recorded Messages API streams

use serde_json::{Value, json};

/// Encode events as a server-sent event body, naming each after its `type`
pub fn sse(events: &[Value]) -> String {
    events
        .iter()
        .map(|event| {
            let name = event["type"].as_str().unwrap_or("message");
            format!("event: {name}\ndata: {event}\n\n")
        })
        .collect()
}

fn message_start(id: &str, input_tokens: u32) -> Value {
    json!({
        "type": "message_start",
        "message": {
            "id": id,
            "type": "message",
            "role": "assistant",
            "model": "claude-3-5-haiku-20241022",
            "content": [],
            "stop_reason": null,
            "stop_sequence": null,
            "usage": {"input_tokens": input_tokens, "output_tokens": 1}
        }
    })
}

fn text_block(index: u32, fragments: &[&str]) -> Vec<Value> {
    let mut events = vec![json!({
        "type": "content_block_start",
        "index": index,
        "content_block": {"type": "text", "text": ""}
    })];
    events.extend(fragments.iter().map(|text| {
        json!({
            "type": "content_block_delta",
            "index": index,
            "delta": {"type": "text_delta", "text": text}
        })
    }));
    events.push(json!({"type": "content_block_stop", "index": index}));
    events
}

fn tool_block(index: u32, id: &str, name: &str, partial_json: &[&str]) -> Vec<Value> {
    let mut events = vec![json!({
        "type": "content_block_start",
        "index": index,
        "content_block": {"type": "tool_use", "id": id, "name": name, "input": {}}
    })];
    events.extend(partial_json.iter().map(|chunk| {
        json!({
            "type": "content_block_delta",
            "index": index,
            "delta": {"type": "input_json_delta", "partial_json": chunk}
        })
    }));
    events.push(json!({"type": "content_block_stop", "index": index}));
    events
}

fn message_end(stop_reason: &str, output_tokens: u32) -> Vec<Value> {
    vec![
        json!({
            "type": "message_delta",
            "delta": {"stop_reason": stop_reason, "stop_sequence": null},
            "usage": {"output_tokens": output_tokens}
        }),
        json!({"type": "message_stop"}),
    ]
}

/// Reply to "Hi!"
pub fn greeting() -> String {
    let mut events = vec![message_start("msg_01Greeting", 10), json!({"type": "ping"})];
    events.extend(text_block(0, &["Hello", "! How can I help you today?"]));
    events.extend(message_end("end_turn", 12));
    sse(&events)
}

/// Text followed by a `read_file` call for `readme.txt`, input split across deltas
pub fn read_file_call() -> String {
    let mut events = vec![message_start("msg_01ReadFile", 380)];
    events.extend(text_block(0, &["I'll read the contents of the readme.txt file", " for you."]));
    events.extend(tool_block(1, "toolu_01ReadFile", "read_file", &["", "{\"path\": ", "\"readme.txt\"}"]));
    events.extend(message_end("tool_use", 71));
    sse(&events)
}

/// Answer after the `read_file` result came back
pub fn read_file_answer() -> String {
    let mut events = vec![message_start("msg_01Answer", 470)];
    events.extend(text_block(
        0,
        &["The readme.txt file simply contains the text \"Hi!\"", " - it's a very brief readme file."],
    ));
    events.extend(message_end("end_turn", 24));
    sse(&events)
}

/// A `list_dir` call with no arguments and a single empty input delta
pub fn list_dir_call() -> String {
    let mut events = vec![message_start("msg_01ListDir", 350)];
    events.extend(text_block(0, &["I'll list the current directory."]));
    events.extend(tool_block(1, "toolu_01ListDir", "list_dir", &[""]));
    events.extend(message_end("tool_use", 40));
    sse(&events)
}

/// A `read_file` call whose input is cut off by `max_tokens`
pub fn read_file_cut_off() -> String {
    let mut events = vec![message_start("msg_01CutOff", 200)];
    events.extend(tool_block(0, "toolu_01CutOff", "read_file", &["{\"path\": ", "\"/etc/pass"]));
    events.extend(message_end("max_tokens", 16));
    sse(&events)
}

/// A call to a tool that was never declared
pub fn undeclared_tool_call() -> String {
    let mut events = vec![message_start("msg_01Undeclared", 100)];
    events.extend(tool_block(0, "toolu_01Undeclared", "delete_file", &["{\"path\": \"readme.txt\"}"]));
    events.extend(message_end("tool_use", 20));
    sse(&events)
}

/// Text interrupted by an in-band `overloaded_error`
pub fn overloaded_mid_stream() -> String {
    sse(&[
        message_start("msg_01Overloaded", 10),
        json!({"type": "content_block_start", "index": 0, "content_block": {"type": "text", "text": ""}}),
        json!({"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": "Hello"}}),
        json!({"type": "error", "error": {"type": "overloaded_error", "message": "Overloaded"}}),
    ])
}
