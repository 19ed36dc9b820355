use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

// Wiring only; every other section falls back to the stock defaults
const PINS: &str = r#"
[pins]
jog_a = 17
jog_b = 27
axis_x = 19
axis_y = 26
axis_z = 21
speed_x1 = 5
speed_x10 = 6
speed_x100 = 13
adaptive = 20
enable_out = 24
sck = 11
mosi = 10
cs_x = 8
cs_y = 7
cs_z = 25
"#;

fn write_config(dir: &tempfile::TempDir, extra: &str) -> PathBuf {
    let path = dir.path().join("pendant.toml");
    fs::write(&path, format!("{PINS}\n{extra}")).unwrap();
    path
}

fn pendant(cfg: &PathBuf) -> Command {
    let mut cmd = Command::cargo_bin("pendant").unwrap();
    cmd.arg("--config").arg(cfg);
    cmd
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["self-check"], 0, "OK", "stdout")]
#[case(&["simulate", "--ticks", "1"], 0, "code=133", "stdout")]
#[case(&["simulate", "--rate-hz", "0"], 1, "rate-hz", "stderr")]
#[case(&["simulate", "--axis", "w"], 2, "unknown axis", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");

    let mut cmd = pendant(&cfg);
    for a in args {
        cmd.arg(a);
    }

    let assert = cmd.assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[rstest]
#[case("[pot]\nresolution = 300\n", "pot.resolution")]
#[case("[adaptive]\nmin_speed = 30\nmax_speed = 20\n", "min_speed")]
#[case("[runner]\ntick_queue_capacity = 0\n", "tick_queue_capacity")]
fn invalid_config_exits_with_code_two(#[case] extra: &str, #[case] needle: &str) {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, extra);

    pendant(&cfg)
        .arg("self-check")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid configuration"))
        .stderr(predicate::str::contains(needle));
}

#[test]
fn duplicate_pin_is_reported() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pendant.toml");
    fs::write(&path, PINS.replace("cs_z = 25", "cs_z = 8")).unwrap();

    pendant(&path)
        .arg("self-check")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("GPIO 8"));
}

#[test]
fn missing_config_file_is_explained() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope.toml");

    pendant(&missing)
        .arg("self-check")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Could not read the config file"));
}

#[test]
fn missing_pins_section_is_a_parse_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pendant.toml");
    fs::write(&path, "[pot]\nresolution = 256\n").unwrap();

    pendant(&path)
        .arg("self-check")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not valid TOML for the pendant"));
}
