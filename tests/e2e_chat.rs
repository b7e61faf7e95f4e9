#![cfg(unix)]

use expectrl::{Eof, Error as ExpectError, Session};
use serial_test::serial;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path as path_matcher};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EXPECT_TIMEOUT: Duration = Duration::from_secs(4);
const EXPECT_RETRIES: usize = 3;

#[test]
#[serial]
fn local_backend_reply_is_rendered_and_traced() {
    let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
    let server = rt.block_on(MockServer::start());
    rt.block_on(async {
        Mock::given(method("POST"))
            .and(path_matcher("/api/chat"))
            .and(body_string_contains("\"model\":\"deepseek-r1:3b\""))
            .and(body_string_contains("reverse a string"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"message":{"role":"assistant","content":"Use this:\n```rust\nlet r: String = s.chars().rev().collect();\n```"}}"#,
                "application/json",
            ))
            .expect(1)
            .mount(&server)
            .await;
    });

    let (mut session, _config_home, state_home, _cfg_dir) = spawn_app(
        "backend = \"local\"\nmodel = \"deepseek-r1:3b\"\nlanguage = \"rust\"\nshow_thinking = false\n",
        |command| {
            command.env("OLLAMA_BASE_URL", server.uri());
        },
    );
    expect_text(&mut session, "you> ");

    submit_line(&mut session, "how do I reverse a string?");
    expect_text(&mut session, "companion>");
    expect_text(&mut session, "  ```rust");
    expect_text(&mut session, "  let r: String = s.chars().rev().collect();");

    exit_repl(&mut session);
    let content = read_trace_file(&state_home);
    assert!(
        content.contains("[chat.in    ] how do I reverse a string?"),
        "trace content:\n{content}"
    );
    assert!(
        content.contains("[chat.out   ] Use this:"),
        "trace content:\n{content}"
    );
}

#[test]
#[serial]
fn local_backend_failure_is_reported_and_next_prompt_recovers() {
    let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
    let server = rt.block_on(MockServer::start());
    rt.block_on(async {
        Mock::given(method("POST"))
            .and(path_matcher("/api/chat"))
            .and(body_string_contains("first question"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model crashed"))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path_matcher("/api/chat"))
            .and(body_string_contains("second question"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"message":{"role":"assistant","content":"Recovered answer"}}"#,
                "application/json",
            ))
            .expect(1)
            .mount(&server)
            .await;
    });

    let (mut session, _config_home, state_home, _cfg_dir) =
        spawn_app("backend = \"local\"\nshow_thinking = false\n", |command| {
            command.env("OLLAMA_BASE_URL", server.uri());
        });
    expect_text(&mut session, "you> ");

    submit_line(&mut session, "first question");
    expect_text(
        &mut session,
        "Model request failed: provider request failed with status 500: model crashed",
    );

    submit_line(&mut session, "second question");
    expect_text(&mut session, "Recovered answer");

    submit_line(&mut session, "/history");
    expect_text(&mut session, "Conversation history (3 of 3 turns):");

    exit_repl(&mut session);
    let content = read_trace_file(&state_home);
    assert!(content.contains("[chat.err   ]"), "trace content:\n{content}");
    assert!(
        content.contains("[chat.out   ] Recovered answer"),
        "trace content:\n{content}"
    );
}

#[test]
#[serial]
fn remote_backend_falls_back_when_primary_model_fails() {
    let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
    let server = rt.block_on(MockServer::start());
    rt.block_on(async {
        Mock::given(method("POST"))
            .and(path_matcher("/models/bigscience/bloom"))
            .respond_with(ResponseTemplate::new(503).set_body_string("model is loading"))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path_matcher("/models/gpt2"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"[{"generated_text":"Fallback says hello"}]"#,
                "application/json",
            ))
            .expect(1)
            .mount(&server)
            .await;
    });

    let (mut session, _config_home, state_home, _cfg_dir) =
        spawn_app("model = \"bloom\"\nshow_thinking = false\n", |command| {
            command
                .env("HF_TOKEN", "test-token")
                .env("HF_BASE_URL", server.uri());
        });
    expect_text(&mut session, "you> ");

    submit_line(&mut session, "say hello");
    expect_text(&mut session, "Fallback says hello");
    expect_text(
        &mut session,
        "(Note: This response was generated using a fallback model)",
    );

    exit_repl(&mut session);
    let content = read_trace_file(&state_home);
    assert!(
        content.contains("Error with primary model bigscience/bloom"),
        "trace content:\n{content}"
    );
    assert!(
        !content.contains("HF_TOKEN not found"),
        "token from env should suppress the warning"
    );
}

#[test]
#[serial]
fn thinking_steps_are_traced_while_waiting() {
    let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
    let server = rt.block_on(MockServer::start());
    rt.block_on(async {
        Mock::given(method("POST"))
            .and(path_matcher("/api/chat"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(
                        r#"{"message":{"role":"assistant","content":"Slow answer"}}"#,
                        "application/json",
                    )
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&server)
            .await;
    });

    let (mut session, _config_home, state_home, _cfg_dir) =
        spawn_app("backend = \"local\"\nlanguage = \"kotlin\"\n", |command| {
            command.env("OLLAMA_BASE_URL", server.uri());
        });
    expect_text(&mut session, "you> ");

    submit_line(&mut session, "explain coroutines");
    expect_text(&mut session, "Slow answer");

    exit_repl(&mut session);
    let content = read_trace_file(&state_home);
    assert!(
        content.contains("[chat.think ] Analyzing the problem..."),
        "trace content:\n{content}"
    );
}

fn spawn_app(
    config: &str,
    customize: impl FnOnce(&mut Command),
) -> (Session, TempDir, TempDir, TempDir) {
    let config_home = tempfile::tempdir().expect("create XDG_CONFIG_HOME tempdir");
    let state_home = tempfile::tempdir().expect("create XDG_STATE_HOME tempdir");
    let cfg_dir = tempfile::tempdir().expect("config tempdir");
    let cfg_path = write_test_config(cfg_dir.path(), config);

    let mut command = Command::new(binary_path());
    command
        .arg("--config")
        .arg(&cfg_path)
        .env("NO_COLOR", "1")
        .env("XDG_CONFIG_HOME", config_home.path())
        .env("XDG_STATE_HOME", state_home.path())
        .env_remove("CODE_COMPANION_BACKEND")
        .env_remove("HF_TOKEN");
    customize(&mut command);

    let mut session = Session::spawn(command).expect("spawn code-companion in PTY");
    session.set_expect_timeout(Some(EXPECT_TIMEOUT));

    (session, config_home, state_home, cfg_dir)
}

fn write_test_config(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("config.toml");
    fs::write(&path, content).expect("write test config");
    path
}

fn binary_path() -> String {
    std::env::var("CARGO_BIN_EXE_code-companion")
        .unwrap_or_else(|_| "target/debug/code-companion".to_string())
}

fn submit_line(session: &mut Session, line: &str) {
    session.send(line).expect("send line text");
    session.send([b'\r']).expect("send Enter");
}

fn exit_repl(session: &mut Session) {
    submit_line(session, "quit");
    let _ = session.expect(Eof);
    thread::sleep(Duration::from_millis(25));
}

fn expect_text(session: &mut Session, text: &str) {
    for attempt in 1..=EXPECT_RETRIES {
        match session.expect(text) {
            Ok(_) => return,
            Err(ExpectError::ExpectTimeout) if attempt < EXPECT_RETRIES => continue,
            Err(err) => panic!(
                "failed to match text {:?} on attempt {}: {}",
                text, attempt, err
            ),
        }
    }

    panic!("unreachable: retries exhausted without returning");
}

fn read_trace_file(state_home: &TempDir) -> String {
    let trace_dir = state_home.path().join("code-companion").join("traces");
    let mut entries = fs::read_dir(&trace_dir)
        .unwrap_or_else(|err| panic!("failed to read {}: {err}", trace_dir.display()))
        .collect::<Result<Vec<_>, _>>()
        .unwrap_or_else(|err| panic!("failed to iterate {}: {err}", trace_dir.display()));
    assert_eq!(
        entries.len(),
        1,
        "expected exactly one trace file in {}",
        trace_dir.display()
    );
    let path = entries.remove(0).path();
    fs::read_to_string(&path).unwrap_or_else(|err| panic!("failed to read {}: {err}", path.display()))
}
