use std::io::Write;
use std::process::Command;

fn wisp_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_wisp"))
}

fn write_script(name: &str, contents: &str) -> std::path::PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("wisp_cli_test_{}_{}.wisp", name, std::process::id()));
    let mut file = std::fs::File::create(&path).expect("create temp script");
    file.write_all(contents.as_bytes()).expect("write temp script");
    path
}

#[test]
fn running_a_valid_script_exits_zero_and_prints_its_output() {
    let path = write_script("ok", "print 1 + 2;");
    let output = wisp_bin().arg(&path).output().expect("run wisp");
    std::fs::remove_file(&path).ok();

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "3");
}

#[test]
fn a_runtime_type_error_exits_seventy() {
    let path = write_script("runtime_error", "-true;");
    let output = wisp_bin().arg(&path).output().expect("run wisp");
    std::fs::remove_file(&path).ok();

    assert_eq!(output.status.code(), Some(70));
    assert!(String::from_utf8_lossy(&output.stderr).contains("operand must be a number."));
}

#[test]
fn an_unterminated_string_exits_sixty_five() {
    let path = write_script("compile_error", "\"never closed");
    let output = wisp_bin().arg(&path).output().expect("run wisp");
    std::fs::remove_file(&path).ok();

    assert_eq!(output.status.code(), Some(65));
}

#[test]
fn a_missing_file_exits_seventy_four() {
    let output = wisp_bin().arg("/no/such/path/does-not-exist.wisp").output().expect("run wisp");
    assert_eq!(output.status.code(), Some(74));
}

#[test]
fn too_many_arguments_exits_sixty_four() {
    let output = wisp_bin().arg("one").arg("two").output().expect("run wisp");
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn disassemble_flag_prints_a_listing_without_executing() {
    let path = write_script("disasm", "print 1 + 2;");
    let output = wisp_bin().arg("--disassemble").arg(&path).output().expect("run wisp");
    std::fs::remove_file(&path).ok();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("OP_CONSTANT"));
    assert!(stdout.contains("OP_RETURN"));
    assert!(!stdout.contains('3'));
}
