use std::process::Command;

fn combined_output(output: &std::process::Output) -> String {
    let mut combined = String::new();
    combined.push_str(&String::from_utf8_lossy(&output.stdout));
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    combined
}

fn liveguide_bin() -> &'static str {
    option_env!("CARGO_BIN_EXE_liveguide").expect("liveguide test binary not built")
}

#[test]
fn help_mentions_name_and_keys() {
    let output = Command::new(liveguide_bin())
        .arg("--help")
        .output()
        .expect("run liveguide --help");
    assert!(output.status.success());
    let combined = combined_output(&output);
    assert!(combined.contains("LiveGuide"));
    assert!(combined.contains("--case-file"));
}

#[test]
fn list_input_devices_prints_message() {
    let output = Command::new(liveguide_bin())
        .arg("--list-input-devices")
        .output()
        .expect("run liveguide --list-input-devices");
    assert!(output.status.success());
    let combined = combined_output(&output);
    assert!(
        combined.contains("audio input devices")
            || combined.contains("Failed to list audio input devices")
    );
}

#[test]
fn rejects_out_of_range_temperature() {
    let output = Command::new(liveguide_bin())
        .args(["--temperature", "9"])
        .output()
        .expect("run liveguide --temperature 9");
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("--temperature"));
}
