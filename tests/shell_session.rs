mod common;

use std::time::Duration;

use chatcast::controller::WorkerStatus;
use chatcast::shell::{Console, Shell, ShellExit, SHUSH_EXIT_CODE};
use common::{harness, spy_text, Harness, SpyBuffer, SpyWriter};

async fn run_session(h: &Harness, script: &str) -> (ShellExit, String) {
    let spy = SpyBuffer::default();
    let mut shell = Shell::new(h.controller.clone(), Console::new(SpyWriter(spy.clone())));
    let exit = shell.run(script.as_bytes()).await;
    (exit, spy_text(&spy))
}

#[tokio::test]
async fn write_block_joins_lines_with_newlines() {
    let h = harness(Duration::from_secs(5));
    let (exit, output) = run_session(&h, "write_block\na\nb\n.\nquit\n").await;

    assert_eq!(exit, ShellExit::Quit);
    assert_eq!(h.controller.buffer().snapshot().content, b"a\nb\n");
    assert!(output.contains("[W] > "));
    assert!(output.contains("[*] Message block written."));
}

#[tokio::test]
async fn write_resets_mode_unless_templated() {
    let h = harness(Duration::from_secs(5));

    h.controller.buffer().set_mode(7);
    run_session(&h, "write hello   world\n").await;
    let snapshot = h.controller.buffer().snapshot();
    assert_eq!(snapshot.content, b"hello world");
    assert_eq!(snapshot.mode, 0);

    h.controller.buffer().set_mode(1);
    run_session(&h, "w Hello {{1+1}}\n").await;
    let snapshot = h.controller.buffer().snapshot();
    assert_eq!(snapshot.content, b"Hello {{1+1}}");
    assert_eq!(snapshot.mode, 1);
}

#[tokio::test]
async fn change_and_print_show_mode() {
    let h = harness(Duration::from_secs(5));
    let (_, output) = run_session(&h, "change 1\nprint\nchange 12\n").await;

    assert!(output.contains("[*] Mode set to 1 (template)."));
    assert!(output.contains("[*] Mode 1 (template), 13 bytes:"));
    assert!(output.contains("[placeholder]"));
    assert!(output.contains("Mode set to 12, which is unknown"));
    assert_eq!(h.controller.buffer().mode(), 12);
}

#[tokio::test]
async fn unknown_command_reports_and_keeps_state() {
    let h = harness(Duration::from_secs(5));
    let before = h.controller.buffer().snapshot();
    let (exit, output) = run_session(&h, "frobnicate\nchange x\nwrite\n").await;

    assert_eq!(exit, ShellExit::Quit);
    assert!(output.contains("[!] Invalid command, type \"help\" or \"h\" for hints."));
    assert!(output.contains("[!] Value must be an integer, got 'x'."));
    assert!(output.contains("[!] You must supply a message."));
    assert_eq!(h.controller.buffer().snapshot(), before);
}

#[tokio::test]
async fn start_status_stop_cycle() {
    let h = harness(Duration::from_secs(5));
    let (_, output) = run_session(&h, "stat\nstart\nstart\nstat\nstop\nstat\nstop\nq\n").await;

    let statuses: Vec<_> = output
        .lines()
        .filter(|line| line.contains("Worker is"))
        .map(|line| line.trim_start_matches("> ").to_string())
        .collect();
    assert_eq!(
        statuses,
        vec![
            "[-] Worker is not running.",
            "[+] Worker is running.",
            "[-] Worker is not running.",
            "[-] Worker is not running.",
        ]
    );
    assert!(output.contains("[*] Started."));
    assert!(output.contains("[*] Already running."));
    assert!(output.contains("[*] Terminated."));
    assert_eq!(h.controller.status(), WorkerStatus::Idle);
}

#[tokio::test]
async fn quit_stops_a_running_worker() {
    let h = harness(Duration::from_secs(5));
    let (exit, _) = run_session(&h, "start\nquit\n").await;
    assert_eq!(exit.code(), 0);
    assert_eq!(h.controller.status(), WorkerStatus::Idle);
}

#[tokio::test]
async fn shush_exits_with_distinct_code() {
    let h = harness(Duration::from_secs(5));
    let (exit, output) = run_session(&h, "tb\nwrite never reached\n").await;

    assert_eq!(exit, ShellExit::Shush);
    assert_eq!(exit.code(), SHUSH_EXIT_CODE);
    assert!(output.contains("TOI TA BOUCHE."));
    assert_eq!(h.controller.buffer().snapshot().content, b"[placeholder]");
}

#[tokio::test]
async fn end_of_input_behaves_like_quit() {
    let h = harness(Duration::from_secs(5));
    let (exit, _) = run_session(&h, "help").await;
    assert_eq!(exit, ShellExit::Quit);
}

#[tokio::test]
async fn save_then_load_round_trips_through_files() {
    let h = harness(Duration::from_secs(5));
    let path = h.dir.path().join("saved.txt");
    let path = path.display();

    let script = format!("write first message\nsave {path}\nquit\n");
    let (_, output) = run_session(&h, &script).await;
    assert!(output.contains("[*] File saved. (13) bytes."), "{output}");

    let script = format!("write something else\nload {path}\nquit\n");
    let (_, output) = run_session(&h, &script).await;
    assert!(output.contains("[*] File loaded. (13) bytes."), "{output}");
    assert_eq!(h.controller.buffer().snapshot().content, b"first message");
}

#[tokio::test]
async fn load_missing_file_reports_error() {
    let h = harness(Duration::from_secs(5));
    let path = h.dir.path().join("nope.txt");
    let script = format!("load {}\n", path.display());
    let (_, output) = run_session(&h, &script).await;

    assert!(output.contains("[!] The filepath"));
    assert!(output.contains("doesn't exist."));
    assert_eq!(h.controller.buffer().snapshot().content, b"[placeholder]");
}

#[tokio::test]
async fn preset_loads_template_in_template_mode() {
    let h = harness(Duration::from_secs(5));
    let (_, output) = run_session(&h, "preset\npreset 4\npreset 9\n").await;

    assert!(output.contains("[*] 3: clock"));
    assert!(output.contains("[*] Preset 'heartbeat' loaded."));
    assert!(output.contains("[!] Invalid preset, must be between 1 and 4."));

    let snapshot = h.controller.buffer().snapshot();
    assert_eq!(snapshot.mode, 1);
    assert!(String::from_utf8_lossy(&snapshot.content).contains("BPM"));
}

#[tokio::test]
async fn clear_emits_terminal_sequence() {
    let h = harness(Duration::from_secs(5));
    let (_, output) = run_session(&h, "clear\n").await;
    assert!(output.contains("\x1b[2J"));
}

#[tokio::test]
async fn exclusive_save_refuses_existing_file() {
    let h = harness(Duration::from_secs(5));
    let path = h.dir.path().join("kept.txt");
    std::fs::write(&path, "keep me").expect("seed file");

    let script = format!("write replacement\nsave -n {}\nquit\n", path.display());
    let (_, output) = run_session(&h, &script).await;

    assert!(output.contains("already exists."), "{output}");
    assert_eq!(std::fs::read_to_string(&path).expect("read"), "keep me");
}

#[tokio::test]
async fn change_keeps_message_and_help_says_so() {
    let h = harness(Duration::from_secs(5));
    let (_, output) = run_session(&h, "write custom\nchange 1\nchange 0\nhelp\n").await;

    let snapshot = h.controller.buffer().snapshot();
    assert_eq!(snapshot.content, b"custom");
    assert_eq!(snapshot.mode, 0);
    assert!(output.contains("the message itself is kept"));
    assert!(output.contains("save [-n] <path>"));
}
