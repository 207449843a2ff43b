use std::fs;

use aicodegen::SessionBuilder;
use aicodegen::tools::Workspace;
use aicodegen_model::{ModelMessage, ToolCallRequest};
use aicodegen_test_model::{PresetEvent, PresetResponse, TestModelProvider};
use serde_json::json;
use tempfile::tempdir;

fn tool_call(id: &str, name: &str, arguments: serde_json::Value) -> PresetEvent {
    PresetEvent::ToolCall(ToolCallRequest {
        id: id.to_owned(),
        name: name.to_owned(),
        arguments,
    })
}

#[tokio::test]
async fn test_list_files_round_trip() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("src")).unwrap();
    fs::write(dir.path().join("src/main.rs"), "fn main() {}\n").unwrap();

    let mut provider = TestModelProvider::default();
    provider.add_response(PresetResponse::with_events([tool_call(
        "call_1",
        "list_files",
        json!({ "path": "./src" }),
    )]));
    provider.add_response(PresetResponse::text("There is only main.rs."));

    let mut session = SessionBuilder::with_model_provider(provider.clone())
        .with_system_prompt("You are a coding assistant.")
        .with_workspace(Workspace::new(dir.path()))
        .build();
    let answer = session.send_message("list files in ./src").await.unwrap();
    assert_eq!(answer, "There is only main.rs.");

    let messages = session.conversation().messages();
    let roles: Vec<_> = messages.iter().map(|msg| msg.role()).collect();
    assert_eq!(roles, ["system", "user", "assistant", "tool", "assistant"]);
    let ModelMessage::Tool(result) = &messages[3] else {
        panic!("expected a tool message");
    };
    assert_eq!(result.id, "call_1");
    assert_eq!(result.content, "Files in ./src:\nmain.rs");

    // Every file-system tool is advertised on every request.
    let requests = provider.requests();
    let names: Vec<_> = requests[0].tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(
        names,
        [
            "read_file",
            "read_and_summarise_documentation",
            "list_files",
            "find_files",
            "list_files_recursive",
            "edit_file",
            "edit_file_regex",
            "write_file",
            "create_file",
            "create_directory",
        ]
    );
    assert_eq!(requests[1].tools, requests[0].tools);
}

#[tokio::test]
async fn test_parallel_edits_and_failures() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "hello world").unwrap();

    let mut provider = TestModelProvider::default();
    provider.add_response(PresetResponse::with_events([
        tool_call(
            "call_1",
            "edit_file",
            json!({ "path": "a.txt", "find": "world", "replace": "there" }),
        ),
        tool_call("call_2", "read_file", json!({ "path": "missing.txt" })),
        tool_call(
            "call_3",
            "write_file",
            json!({ "path": "out/b.txt", "content": "new file" }),
        ),
        tool_call("call_4", "delete_everything", json!({})),
        tool_call("call_5", "create_directory", json!({})),
    ]));
    provider.add_response(PresetResponse::text("Done, with some errors."));

    let mut session = SessionBuilder::with_model_provider(provider)
        .with_workspace(Workspace::new(dir.path()))
        .build();
    session.send_message("Do the chores").await.unwrap();

    let results: Vec<_> = session
        .conversation()
        .messages()
        .iter()
        .filter_map(|msg| match msg {
            ModelMessage::Tool(result) => Some(result),
            _ => None,
        })
        .collect();
    let ids: Vec<_> = results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["call_1", "call_2", "call_3", "call_4", "call_5"]);

    assert!(results[0].content.starts_with("Replaced 1 occurrences"));
    assert!(results[1].content.starts_with("Error: Execution error: "));
    assert!(results[2].content.starts_with("Wrote 8 bytes"));
    assert_eq!(results[3].content, "Error: unknown tool.");
    assert!(results[4].content.starts_with("Error: Invalid input: "));

    assert_eq!(
        fs::read_to_string(dir.path().join("a.txt")).unwrap(),
        "hello there"
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("out/b.txt")).unwrap(),
        "new file"
    );
}
