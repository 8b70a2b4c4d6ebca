use std::process::{Command, Output};

fn run_keysweep(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_keysweep"))
        .args(args)
        .output()
        .expect("Failed to execute keysweep")
}

#[test]
fn test_demo_reference_run() {
    let output = run_keysweep(&["demo"]);

    assert!(
        output.status.success(),
        "Command failed with status: {:?}\nstderr: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("KEY FOUND... ######9Hb3######"),
        "Should report the recovered key"
    );
    assert!(
        stdout.contains("Decrypted text using generated key is:\nPlease work..."),
        "Should print the decrypted message"
    );
    assert!(
        stdout.contains("Solution found in"),
        "Should report elapsed time"
    );
}

#[test]
fn test_demo_with_stats() {
    let output = run_keysweep(&[
        "demo",
        "--offset",
        "8",
        "--width",
        "2",
        "--partition",
        "chunked",
        "-j",
        "3",
        "--stats",
    ]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("KEY FOUND... ######9Hb3######"));
    assert!(stdout.contains("Search Statistics:"));
    assert!(stdout.contains("Workers: 3"));
}

#[test]
fn test_demo_unreachable_key_reports_not_found() {
    let output = run_keysweep(&[
        "demo",
        "--key",
        "######9H~3######",
        "--offset",
        "8",
        "--width",
        "2",
    ]);

    assert_eq!(output.status.code(), Some(2), "Not found should exit with 2");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("No key found (exhausted after 8100 of 8100 candidates)"),
        "Should report exhaustion, got: {}",
        stdout
    );
}

#[test]
fn test_encrypt_then_crack() {
    let encrypted = run_keysweep(&[
        "encrypt",
        "--key",
        "secretKEY42abcde",
        "--plaintext",
        "known message",
    ]);
    assert!(encrypted.status.success());
    let ciphertext = String::from_utf8_lossy(&encrypted.stdout).trim().to_string();
    assert_eq!(ciphertext.len(), 32);

    let output = run_keysweep(&[
        "crack",
        "--ciphertext",
        &ciphertext,
        "--plaintext",
        "known message",
        "--prefix",
        "secretKEY4",
        "--suffix",
        "bcde",
    ]);

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("KEY FOUND... secretKEY42abcde"));
    assert!(stdout.contains("known message"));
}

#[test]
fn test_invalid_key_length_is_rejected() {
    let output = run_keysweep(&["demo", "--key", "too short"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Error: expected a 16-byte key or IV, got 9 bytes"),
        "Should print a configuration error, got: {}",
        stderr
    );
}

#[test]
fn test_crack_rejects_unbounded_space() {
    let output = run_keysweep(&[
        "crack",
        "--ciphertext",
        "00112233445566778899aabbccddeeff",
        "--plaintext",
        "anything",
    ]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("overflows a 64-bit index"));
}

#[test]
fn test_crack_rejects_partial_block_ciphertext() {
    let output = run_keysweep(&[
        "crack",
        "--ciphertext",
        "00112233445566778899aabbccddee",
        "--plaintext",
        "known message",
        "--prefix",
        "secretKEY4",
        "--suffix",
        "bcde",
    ]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Error: ciphertext of 15 bytes is not a non-empty multiple"),
        "Should reject the ciphertext before searching, got: {}",
        stderr
    );
    assert!(String::from_utf8_lossy(&output.stdout).is_empty());
}

#[test]
fn test_requires_subcommand() {
    let output = run_keysweep(&[]);
    assert!(!output.status.success());
}
