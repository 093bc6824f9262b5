//! Console contract of the leak fixture. The overflow fixture is never
//! executed here: running it is undefined behavior.

use std::process::Command;

#[test]
fn leak_demo_prints_its_banners_and_exits_zero() {
    let output = Command::new(env!("CARGO_BIN_EXE_leak_demo"))
        .output()
        .expect("run leak_demo");

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "Starting memory leak test...\nAllocated data[0] = 42\nTest finished.\n"
    );
    assert!(output.stderr.is_empty());
}

#[test]
fn leak_demo_output_is_stable_across_runs() {
    let first = Command::new(env!("CARGO_BIN_EXE_leak_demo"))
        .output()
        .expect("run leak_demo");
    let second = Command::new(env!("CARGO_BIN_EXE_leak_demo"))
        .output()
        .expect("run leak_demo");

    assert_eq!(first.stdout, second.stdout);
    assert_eq!(first.status.code(), second.status.code());
}
