use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use hookgate::audit::{AuditLog, AuditLogEntry};
use hookgate::emit::FAIL_CLOSED_REASON;
use hookgate::event::{Phase, ToolInvocationEvent};
use hookgate::policy::Verdict;

fn verdict_for(payload: &str) -> Verdict {
    hookgate::evaluate(payload.as_bytes())
        .expect("payload should decode")
        .verdict()
}

macro_rules! verdict_test {
    ($name:ident, $payload:expr, $verdict:ident) => {
        #[test]
        fn $name() {
            assert_eq!(verdict_for($payload), Verdict::$verdict, "payload: {}", $payload,);
        }
    };
}

// ── BLOCK: credential paths, whichever field carries them ──

verdict_test!(block_file_path, r#"{"tool_input":{"file_path":"/project/.env"}}"#, Block);
verdict_test!(block_path, r#"{"tool_input":{"path":"/project/.env"}}"#, Block);
verdict_test!(block_camel_input, r#"{"tool_input":{"filePath":"/project/.env"}}"#, Block);
verdict_test!(block_response, r#"{"tool_response":{"filePath":"/project/.env"}}"#, Block);
verdict_test!(block_env_local, r#"{"tool_input":{"file_path":"/project/.env.local"}}"#, Block);
verdict_test!(block_env_dir, r#"{"tool_input":{"path":"/project/.envrc"}}"#, Block);
verdict_test!(
    block_with_tool,
    r#"{"tool_name":"Read","tool_input":{"file_path":"/p/config/.env.production"}}"#,
    Block
);
verdict_test!(block_legacy_tool_field, r#"{"tool":"Edit","tool_input":{"filePath":"/p/.env"}}"#, Block);

// ── ALLOW: everything else ──

verdict_test!(allow_source, r#"{"tool_name":"write","tool_input":{"path":"/project/src/app.ts"}}"#, Allow);
verdict_test!(allow_env_without_dot, r#"{"tool_input":{"file_path":"/project/src/env.ts"}}"#, Allow);
verdict_test!(allow_uppercase, r#"{"tool_input":{"file_path":"/project/.ENV"}}"#, Allow);
verdict_test!(allow_no_path, r#"{"tool_name":"Bash","tool_input":{"command":"ls"}}"#, Allow);
verdict_test!(allow_empty_object, r#"{}"#, Allow);
verdict_test!(allow_empty_path, r#"{"tool_input":{"file_path":""}}"#, Allow);
verdict_test!(
    allow_response_wins,
    r#"{"tool_input":{"file_path":"/p/.env"},"tool_response":{"filePath":"/p/notes.md"}}"#,
    Allow
);

#[test]
fn block_reason_is_not_empty() {
    let decision = hookgate::evaluate(br#"{"tool_input":{"file_path":"/project/.env"}}"#).unwrap();
    assert!(decision.reason().is_some_and(|r| !r.is_empty()));
}

#[test]
fn response_path_without_input() {
    let event = hookgate::event::decode(br#"{"tool_response":{"filePath":"/project/out.md"}}"#).unwrap();
    assert_eq!(event.operation_path(), "/project/out.md");
    assert_eq!(event.phase(), Phase::PostInvocation);
}

#[test]
fn empty_input_is_decode_error() {
    assert!(hookgate::evaluate(b"").is_err());
}

// ── Concurrent appends ──

fn assert_well_formed(line: &str) {
    let rest = line.strip_prefix('[').expect("line starts with [");
    let (ts, rest) = rest.split_once("] ").expect("timestamp is closed");
    assert!(ts.ends_with('Z'), "timestamp {ts} is UTC");
    assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok(), "timestamp {ts} parses");
    let (tool, path) = rest.split_once(": ").expect("tool separator");
    assert!(tool.starts_with("worker-"), "tool {tool}");
    assert!(path.starts_with("/project/file-"), "path {path}");
}

#[test]
fn concurrent_appends_do_not_interleave() {
    const WRITERS: usize = 16;
    const PER_WRITER: usize = 50;

    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("changes.log");

    let handles: Vec<_> = (0..WRITERS)
        .map(|w| {
            let log = AuditLog::new(log_path.to_string_lossy());
            std::thread::spawn(move || {
                for i in 0..PER_WRITER {
                    let event = ToolInvocationEvent::new(
                        Some(format!("worker-{w}")),
                        format!("/project/file-{i}-{}", "x".repeat(200)),
                        Phase::PreInvocation,
                    );
                    log.append(&AuditLogEntry::from_event(&event, chrono::Utc::now()))
                        .unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let contents = std::fs::read_to_string(&log_path).unwrap();
    assert!(contents.ends_with('\n'));
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), WRITERS * PER_WRITER);
    for line in lines {
        assert_well_formed(line);
    }
}

// ── End-to-end: the compiled binary ──

struct Run {
    status: i32,
    stderr: String,
}

fn run_hook(home: &Path, args: &[&str], stdin: &[u8]) -> Run {
    let mut child = Command::new(env!("CARGO_BIN_EXE_hookgate"))
        .args(args)
        .env("HOME", home)
        .current_dir(home)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    // The binary may exit before reading stdin (e.g. on a config error).
    if let Err(e) = child.stdin.take().unwrap().write_all(stdin) {
        assert_eq!(e.kind(), std::io::ErrorKind::BrokenPipe, "{e}");
    }
    let output = child.wait_with_output().unwrap();
    Run {
        status: output.status.code().unwrap(),
        stderr: String::from_utf8(output.stderr).unwrap(),
    }
}

fn log_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(String::from)
        .collect()
}

/// Diagnostics land under `$HOME`, never on stderr.
fn diagnostics(home: &Path) -> String {
    std::fs::read_to_string(home.join(".local/share/hookgate/hookgate.log")).unwrap_or_default()
}

#[test]
fn binary_blocks_env_and_logs() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("changes.log");
    let run = run_hook(
        dir.path(),
        &["--audit-log", log.to_str().unwrap()],
        br#"{"tool_input":{"file_path":"/project/.env"}}"#,
    );
    assert_eq!(run.status, 2);
    assert_eq!(
        run.stderr,
        "blocked: credential file access denied (/project/.env)\n"
    );
    let lines = log_lines(&log);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].ends_with("] unknown: /project/.env"));
}

#[test]
fn binary_allows_source_and_logs() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("changes.log");
    let run = run_hook(
        dir.path(),
        &["--audit-log", log.to_str().unwrap()],
        br#"{"tool_name":"write","tool_input":{"path":"/project/src/app.ts"}}"#,
    );
    assert_eq!(run.status, 0);
    let lines = log_lines(&log);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with('['));
    assert!(lines[0].ends_with("] write: /project/src/app.ts"));
}

#[test]
fn binary_default_log_is_project_relative() {
    let dir = tempfile::tempdir().unwrap();
    let run = run_hook(dir.path(), &[], br#"{"tool_name":"Read","tool_input":{"file_path":"/p/a.md"}}"#);
    assert_eq!(run.status, 0);
    assert_eq!(log_lines(&dir.path().join("changes.log")).len(), 1);
}

#[test]
fn binary_empty_input_fails_open() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("changes.log");
    let run = run_hook(dir.path(), &["--audit-log", log.to_str().unwrap()], b"");
    assert_eq!(run.status, 0);
    assert_eq!(run.stderr, "");
    assert!(log_lines(&log).is_empty());
    assert!(diagnostics(dir.path()).contains("empty input"));
}

#[test]
fn binary_malformed_input_fails_closed_on_request() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("changes.log");
    let run = run_hook(
        dir.path(),
        &["--audit-log", log.to_str().unwrap(), "--fail-closed"],
        b"{not json",
    );
    assert_eq!(run.status, 2);
    assert_eq!(run.stderr, format!("{FAIL_CLOSED_REASON}\n"));
    assert!(diagnostics(dir.path()).contains("malformed JSON"));
}

#[test]
fn binary_reads_user_overlay() {
    let dir = tempfile::tempdir().unwrap();
    let config_dir = dir.path().join(".config/hookgate");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("config.toml"),
        r#"
        [audit]
        path = "~/audit/tools.log"

        [[rules]]
        name = "no-ssh"
        action = "block"
        reason = "blocked: ssh keys are off limits"
        path_contains = ["/.ssh/"]
        "#,
    )
    .unwrap();

    let run = run_hook(
        dir.path(),
        &[],
        br#"{"tool_name":"Read","tool_input":{"file_path":"/home/u/.ssh/id_rsa"}}"#,
    );
    assert_eq!(run.status, 2);
    assert_eq!(run.stderr.lines().count(), 1);
    assert!(run.stderr.contains("ssh keys are off limits"));
    assert_eq!(log_lines(&dir.path().join("audit/tools.log")).len(), 1);
}

#[test]
fn binary_invalid_rule_fails_open() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("bad.toml");
    std::fs::write(
        &config,
        r#"
        [[rules]]
        name = "nothing"
        action = "block"
        "#,
    )
    .unwrap();
    let run = run_hook(
        dir.path(),
        &["--config", config.to_str().unwrap()],
        br#"{"tool_input":{"file_path":"/p/.env"}}"#,
    );
    assert_eq!(run.status, 0);
    assert_eq!(run.stderr, "");
    assert!(diagnostics(dir.path()).contains("no conditions"));
}

#[test]
fn binary_unwritable_log_keeps_decision() {
    let dir = tempfile::tempdir().unwrap();
    // The temp directory itself cannot be opened as a log file.
    let run = run_hook(
        dir.path(),
        &["--audit-log", dir.path().to_str().unwrap()],
        br#"{"tool_input":{"file_path":"/project/.env"}}"#,
    );
    assert_eq!(run.status, 2);
    assert_eq!(run.stderr.lines().count(), 1, "stderr: {}", run.stderr);
    assert!(run.stderr.contains("denied"));
    assert!(!run.stderr.contains("audit log"));
    assert!(diagnostics(dir.path()).contains("audit log degraded"));
}

#[test]
fn binary_dump_config() {
    let dir = tempfile::tempdir().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_hookgate"))
        .arg("--dump-config")
        .env("HOME", dir.path())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("secret-path"));
    assert!(stdout.contains("changes.log"));
}

#[test]
fn binary_parallel_invocations() {
    const PROCESSES: usize = 12;

    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("changes.log");
    let handles: Vec<_> = (0..PROCESSES)
        .map(|i| {
            let home = dir.path().to_path_buf();
            let log = log.clone();
            std::thread::spawn(move || {
                let payload = format!(
                    r#"{{"tool_name":"worker-{i}","tool_input":{{"file_path":"/project/file-{i}"}}}}"#
                );
                run_hook(&home, &["--audit-log", log.to_str().unwrap()], payload.as_bytes()).status
            })
        })
        .collect();
    for h in handles {
        assert_eq!(h.join().unwrap(), 0);
    }

    let lines = log_lines(&log);
    assert_eq!(lines.len(), PROCESSES);
    for line in &lines {
        assert_well_formed(line);
    }
}
