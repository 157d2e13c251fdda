//! Integration tests for the process-backed adapter channel (unix only).
//!
//! Uses real child processes: `/bin/cat` as a byte-exact echo adapter and
//! small `/bin/sh` scripts written to a temp directory for scripted
//! behavior.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc;
use tokio::time::timeout;

use dap_link::adapter::{AdapterChannel, AdapterDescription, ChannelConfig, PlatformSpec};
use dap_link::protocol::{RequestMessage, ResponseMessage, SessionEvent};
use dap_link::DapError;

const WAIT: Duration = Duration::from_secs(10);

/// The graceful termination signal `stop` sends on unix.
const SIGTERM: i32 = 15;

/// A description launching `program` with `args` and no platform overrides.
fn describe(program: &str, args: Vec<String>) -> AdapterDescription {
    AdapterDescription {
        defaults: PlatformSpec {
            program: Some(program.to_owned()),
            args: if args.is_empty() { None } else { Some(args) },
            runtime: None,
            runtime_args: None,
        },
        winx86: None,
        win: None,
        osx: None,
        linux: None,
    }
}

fn config(description: AdapterDescription) -> ChannelConfig {
    ChannelConfig {
        description,
        extension_root: PathBuf::from("/"),
        stderr_sink: None,
    }
}

/// Write an executable shell script into `dir` and return its path.
fn write_script(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("script write must succeed");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("chmod must succeed");
    path
}

// ── Launch failures ──────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_executable_fails_to_start() {
    let result = AdapterChannel::start(config(describe(
        "/nonexistent/definitely-missing-adapter",
        Vec::new(),
    )));

    assert!(
        matches!(result, Err(DapError::Launch(_))),
        "spawn of a missing executable must be a launch error"
    );
}

#[tokio::test]
async fn runtime_without_script_fails_to_start() {
    // A description with a runtime but no program never resolves.
    let description = AdapterDescription {
        defaults: PlatformSpec {
            program: None,
            args: None,
            runtime: Some("node".to_owned()),
            runtime_args: None,
        },
        winx86: None,
        win: None,
        osx: None,
        linux: None,
    };

    let result = AdapterChannel::start(config(description));

    assert!(matches!(result, Err(DapError::Launch(_))));
}

// ── Echo loop through a real child ───────────────────────────────────────────

/// `/bin/cat` echoes our framed request byte for byte, so it comes back as
/// an inbound request; answering it sends a response that `cat` echoes
/// again, completing the original pending call. One child exercises the
/// writer, reader, dispatcher, and correlation end to end.
#[tokio::test]
async fn echo_child_round_trips_request_and_response() {
    let (channel, _events) = AdapterChannel::start(config(describe("/bin/cat", Vec::new())))
        .expect("cat must spawn");
    let session = channel.session().clone();

    let (req_tx, mut req_rx) = mpsc::unbounded_channel::<RequestMessage>();
    session
        .on_request(Box::new(move |request| {
            let _ = req_tx.send(request);
        }))
        .await;

    let receiver = session
        .request("ping", Some(json!({"payload": 1})))
        .await
        .expect("send must succeed");

    let echoed = timeout(WAIT, req_rx.recv())
        .await
        .expect("echoed request must dispatch")
        .expect("channel must stay open");
    assert_eq!(echoed.command, "ping");
    assert_eq!(echoed.arguments, Some(json!({"payload": 1})));

    let mut response = ResponseMessage::reply_to(&echoed).with_body(json!({"pong": true}));
    session
        .send_response(&mut response)
        .await
        .expect("response send must succeed");

    let completed = timeout(WAIT, receiver)
        .await
        .expect("echoed response must arrive")
        .expect("pending call must complete");
    assert!(completed.success);
    assert_eq!(completed.request_seq, echoed.seq);
    assert_eq!(completed.body, Some(json!({"pong": true})));

    channel.dispose().await;
}

// ── Scripted adapter ─────────────────────────────────────────────────────────

/// A scripted adapter waits for any input line, then emits one framed
/// event. The event must reach the registered handler.
#[tokio::test]
async fn scripted_adapter_event_reaches_the_handler() {
    let dir = tempfile::tempdir().expect("tempdir must be created");
    let body = r#"{"seq":1,"type":"event","event":"ready"}"#;
    let script = format!(
        "#!/bin/sh\nread _header\nprintf 'Content-Length: {}\\r\\n\\r\\n'\nprintf '%s' '{body}'\ncat > /dev/null\n",
        body.len()
    );
    let path = write_script(dir.path(), "adapter.sh", &script);

    let (channel, _events) = AdapterChannel::start(config(describe(
        path.to_str().expect("path must be UTF-8"),
        Vec::new(),
    )))
    .expect("script must spawn");
    let session = channel.session().clone();

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    session
        .on_event(Box::new(move |event| {
            let _ = event_tx.send(event);
        }))
        .await;

    // Any outbound request unblocks the script's `read`.
    session
        .send_request("initialize", None, None)
        .await
        .expect("send must succeed");

    let event = timeout(WAIT, event_rx.recv())
        .await
        .expect("event must arrive")
        .expect("channel must stay open");
    assert_eq!(event.event, "ready");

    channel.dispose().await;
}

/// Stderr lines reach the diagnostics sink with line endings stripped.
#[tokio::test]
async fn stderr_lines_reach_the_diagnostics_sink() {
    let (sink_tx, mut sink_rx) = mpsc::channel(16);
    let description = describe(
        "/bin/sh",
        vec![
            "-c".to_owned(),
            "echo 'adapter diagnostics' >&2; cat > /dev/null".to_owned(),
        ],
    );
    let (channel, _events) = AdapterChannel::start(ChannelConfig {
        description,
        extension_root: PathBuf::from("/"),
        stderr_sink: Some(sink_tx),
    })
    .expect("sh must spawn");

    let line = timeout(WAIT, sink_rx.recv())
        .await
        .expect("stderr line must arrive")
        .expect("sink must stay open");
    assert_eq!(line, "adapter diagnostics");

    channel.dispose().await;
}

// ── Termination ──────────────────────────────────────────────────────────────

/// `stop` on unix signals the child and returns immediately; the exit
/// monitor then reports the termination signal through the event channel.
#[tokio::test]
async fn stop_delivers_an_exit_event_with_the_signal() {
    let (channel, mut events) = AdapterChannel::start(config(describe("/bin/cat", Vec::new())))
        .expect("cat must spawn");

    channel.stop().await.expect("stop must succeed");

    let event = timeout(WAIT, events.recv())
        .await
        .expect("exit event must arrive")
        .expect("event channel must stay open");

    match event {
        SessionEvent::Exited { code, signal } => {
            assert_eq!(code, None, "a signalled child has no exit code");
            assert_eq!(signal, Some(SIGTERM));
        }
        other => panic!("expected an exit event, got: {other:?}"),
    }

    channel.dispose().await;
}
