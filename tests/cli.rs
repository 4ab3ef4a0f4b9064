use assert_cmd::Command;
use predicates::str::contains;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_root(tag: &str) -> PathBuf {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time should move forward")
        .as_nanos();
    let root = std::env::temp_dir().join(format!("asmforge-cli-{tag}-{unique}"));
    std::fs::create_dir_all(&root).expect("failed to create temp root");
    root
}

#[test]
fn help_flag_prints_usage() {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_asmforge"));
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(contains("Usage: asmforge"))
        .stdout(contains("--outfile"))
        .stdout(contains("--cpu"));
}

#[test]
fn assembles_binary_and_hex() {
    let root = temp_root("ok");
    let input = root.join("demo.s");
    std::fs::write(&input, "        ORG $1000\nstart   MOVEQ #1,D0\n        RTS\n")
        .expect("failed to write input");
    let bin = root.join("demo.bin");
    let hex = root.join("out.hex");

    let mut cmd = Command::new(env!("CARGO_BIN_EXE_asmforge"));
    cmd.arg(&input)
        .arg("-o")
        .arg(&bin)
        .arg(format!("--hex={}", hex.display()))
        .assert()
        .success();

    assert_eq!(
        std::fs::read(&bin).expect("binary written"),
        vec![0x70, 0x01, 0x4E, 0x75]
    );
    let text = std::fs::read_to_string(&hex).expect("hex written");
    assert!(text.starts_with(":04100000"));
    assert!(text.ends_with(":00000001FF\n"));
    assert!(!root.join("demo.lst").exists());
}

#[test]
fn listing_defaults_to_input_base() {
    let root = temp_root("list");
    let input = root.join("prog.asm");
    std::fs::write(&input, "  NOP\n").expect("failed to write input");

    let mut cmd = Command::new(env!("CARGO_BIN_EXE_asmforge"));
    cmd.arg(&input)
        .args(["-c", "6502", "-l"])
        .assert()
        .success();

    let listing = std::fs::read_to_string(root.join("prog.lst")).expect("listing written");
    assert!(listing.starts_with("asmforge 6502 Assembler v"));
    assert!(listing.contains("EA"));
}

#[test]
fn defines_reach_the_source() {
    let root = temp_root("define");
    let input = root.join("def.s");
    std::fs::write(&input, "  LDA #VALUE\n").expect("failed to write input");
    let bin = root.join("def.bin");

    let mut cmd = Command::new(env!("CARGO_BIN_EXE_asmforge"));
    cmd.arg(&input)
        .args(["--cpu", "6502", "-D", "VALUE=$2A", "-o"])
        .arg(&bin)
        .assert()
        .success();

    assert_eq!(std::fs::read(&bin).expect("binary written"), vec![0xA9, 0x2A]);
}

#[test]
fn source_errors_fail_without_output() {
    let root = temp_root("err");
    let input = root.join("bad.s");
    std::fs::write(&input, "  NOP\n  FROB D0\n").expect("failed to write input");
    let bin = root.join("bad.bin");

    let mut cmd = Command::new(env!("CARGO_BIN_EXE_asmforge"));
    cmd.env("NO_COLOR", "1")
        .arg(&input)
        .arg("-o")
        .arg(&bin)
        .assert()
        .failure()
        .stderr(contains("Unknown instruction or directive: FROB"))
        .stderr(contains("1 error(s) in source. No output written."));

    assert!(!bin.exists());
}

#[test]
fn missing_outputs_is_rejected() {
    let root = temp_root("noout");
    let input = root.join("demo.s");
    std::fs::write(&input, "  NOP\n").expect("failed to write input");

    let mut cmd = Command::new(env!("CARGO_BIN_EXE_asmforge"));
    cmd.arg(&input)
        .assert()
        .failure()
        .stderr(contains("No outputs selected"));
}

#[test]
fn unknown_cpu_is_rejected() {
    let root = temp_root("cpu");
    let input = root.join("demo.s");
    std::fs::write(&input, "  NOP\n").expect("failed to write input");

    let mut cmd = Command::new(env!("CARGO_BIN_EXE_asmforge"));
    cmd.arg(&input)
        .args(["-c", "pdp11", "-x"])
        .assert()
        .failure();
    assert!(!root.join("demo.hex").exists());
}
