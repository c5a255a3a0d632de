use std::process::Command;

fn bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_tensorgraph-basic"))
}

#[test]
fn prints_sums() {
    let output = bin().env_remove("RUST_LOG").output().unwrap();
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        "[0] = 5\n[1] = 7\n[2] = 9\n"
    );
}

#[test]
fn output_is_stable_across_runs() {
    let first = bin().env_remove("RUST_LOG").output().unwrap();
    let second = bin().env_remove("RUST_LOG").output().unwrap();
    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn logging_goes_to_stderr() {
    let output = bin().env("RUST_LOG", "debug").output().unwrap();
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        "[0] = 5\n[1] = 7\n[2] = 9\n"
    );
    assert!(!output.stderr.is_empty());
}
