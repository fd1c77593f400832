#![cfg(unix)]

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};

use graceful_stop::config::{ENV_LOG_FILE, ENV_LOG_FORMAT, ENV_LOG_LEVEL};
use tempfile::tempdir;

fn command(args: &[&str], log: &Path) -> Command {
    let me = assert_cmd::cargo::cargo_bin!("graceful_stop");
    let mut cmd = Command::new(me);
    cmd.args(args)
        .env(ENV_LOG_FILE, log)
        .env_remove(ENV_LOG_LEVEL)
        .env_remove(ENV_LOG_FORMAT)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null());
    cmd
}

/// Read stdout until the program reports it is waiting, so signals sent
/// afterwards are guaranteed to hit the registered handler.
fn wait_until_running(out: &mut BufReader<ChildStdout>) -> Vec<String> {
    let mut seen = Vec::new();
    let mut line = String::new();
    loop {
        line.clear();
        let n = out.read_line(&mut line).expect("read child stdout");
        assert!(n > 0, "child exited before it was ready: {seen:#?}");
        seen.push(line.trim_end().to_string());
        if line.contains("Running... press CTRL+C to terminate.") {
            return seen;
        }
    }
}

fn send(child: &Child, signal: libc::c_int) {
    let pid = libc::pid_t::try_from(child.id()).unwrap();
    assert_eq!(unsafe { libc::kill(pid, signal) }, 0);
}

/// Start, deliver `signal`, collect all stdout lines and the exit code.
fn run_with_signal(args: &[&str], log: &Path, signal: libc::c_int) -> (Vec<String>, Option<i32>) {
    let mut child = command(args, log).spawn().expect("spawn binary");
    let mut out = BufReader::new(child.stdout.take().unwrap());
    let mut lines = wait_until_running(&mut out);
    send(&child, signal);
    lines.extend(out.lines().map(Result::unwrap));
    let status = child.wait().unwrap();
    (lines, status.code())
}

fn ticks(lines: &[String]) -> Vec<&String> {
    lines.iter().filter(|l| l.contains("Gracefully terminating the application in T-")).collect()
}

#[test]
fn interrupt_counts_down_and_exits_zero() {
    let td = tempdir().unwrap();
    let log = td.path().join("stop.log");
    let (lines, code) = run_with_signal(&["2"], &log, libc::SIGINT);

    assert_eq!(code, Some(0), "lines: {lines:#?}");
    assert!(lines.iter().any(|l| l.contains("Received the console Interrupt notification")));
    let t = ticks(&lines);
    assert_eq!(t.len(), 2, "lines: {lines:#?}");
    assert!(t[0].contains("T-2...") && t[1].contains("T-1..."));
    assert!(lines.last().unwrap().contains("Bye bye..."));

    let file = fs::read_to_string(&log).expect("log file written");
    assert!(file.contains("Received the console Interrupt notification"));
    assert_eq!(file.lines().filter(|l| l.contains("T-")).count(), 2);
    assert!(file.contains("Bye bye..."));
}

#[test]
fn zero_countdown_says_goodbye_right_away() {
    let td = tempdir().unwrap();
    let log = td.path().join("stop.log");
    let (lines, code) = run_with_signal(&["0"], &log, libc::SIGINT);

    assert_eq!(code, Some(0));
    assert!(ticks(&lines).is_empty());
    let received = lines.iter().position(|l| l.contains("Received the console")).unwrap();
    let bye = lines.iter().position(|l| l.contains("Bye bye...")).unwrap();
    assert!(received < bye);
}

#[test]
fn non_numeric_argument_means_no_countdown() {
    let td = tempdir().unwrap();
    let log = td.path().join("stop.log");
    let (lines, code) = run_with_signal(&["soon"], &log, libc::SIGINT);

    assert_eq!(code, Some(0));
    assert!(ticks(&lines).is_empty());
}

#[test]
fn hangup_stalls_handler_but_main_flow_exits_cleanly() {
    let td = tempdir().unwrap();
    let log = td.path().join("stop.log");
    let (lines, code) = run_with_signal(&["1"], &log, libc::SIGHUP);

    assert_eq!(code, Some(0), "lines: {lines:#?}");
    assert!(lines.iter().any(|l| l.contains("Received the console Close notification")));
    assert_eq!(ticks(&lines).len(), 1);
    assert!(lines.last().unwrap().contains("Bye bye..."));
}

#[test]
fn terminate_is_treated_as_shutdown() {
    let td = tempdir().unwrap();
    let log = td.path().join("stop.log");
    let (lines, code) = run_with_signal(&["0"], &log, libc::SIGTERM);

    assert_eq!(code, Some(0));
    assert!(lines.iter().any(|l| l.contains("Received the console Shutdown notification")));
}

#[test]
fn json_format_reaches_stdout() {
    let td = tempdir().unwrap();
    let log = td.path().join("stop.log");
    let mut child = command(&["0"], &log).env(ENV_LOG_FORMAT, "json").spawn().expect("spawn binary");
    let mut out = BufReader::new(child.stdout.take().unwrap());
    let mut lines = wait_until_running(&mut out);
    send(&child, libc::SIGINT);
    lines.extend(out.lines().map(Result::unwrap));
    assert!(child.wait().unwrap().success());

    let messages: Vec<String> = lines
        .iter()
        .map(|l| {
            let v: serde_json::Value = serde_json::from_str(l).expect("json line");
            v["fields"]["message"].as_str().unwrap_or_default().to_string()
        })
        .collect();
    assert_eq!(messages.last().map(String::as_str), Some("Bye bye..."));
}

#[cfg(target_os = "linux")]
#[test]
fn descriptor_exhaustion_fails_before_registration() {
    use std::os::unix::process::CommandExt;

    let td = tempdir().unwrap();
    let log = td.path().join("stop.log");
    let mut cmd = command(&["5"], &log);
    // Leave one spare descriptor for the loader; the stop event needs two.
    unsafe {
        cmd.pre_exec(|| {
            let lim = libc::rlimit { rlim_cur: 4, rlim_max: 4 };
            if libc::setrlimit(libc::RLIMIT_NOFILE, &lim) != 0 {
                return Err(std::io::Error::last_os_error());
            }
            Ok(())
        });
    }
    let out = cmd.output().expect("spawn binary");
    let stdout = String::from_utf8_lossy(&out.stdout);

    assert_eq!(out.status.code(), Some(libc::EMFILE), "stdout: {stdout}");
    let errors: Vec<_> = stdout.lines().filter(|l| l.contains("ERROR")).collect();
    assert_eq!(errors.len(), 1, "stdout: {stdout}");
    assert!(errors[0].contains("Failed to create the stop event"));
    assert!(!stdout.contains("Running..."));
}
