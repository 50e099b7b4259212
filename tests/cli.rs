use assert_cmd::Command;

#[test]
fn test_help_lists_configuration_surface() {
    let output = Command::cargo_bin("cluster-metrics-agent")
        .unwrap()
        .arg("--help")
        .output()
        .unwrap();
    assert!(output.status.success());

    let text = String::from_utf8_lossy(&output.stdout);
    for flag in [
        "--netdata-url",
        "--hosts",
        "--request-timeout-ms",
        "--cache-ttl-secs",
        "--backup-ttl-secs",
        "--probe",
        "--json-logs",
    ] {
        assert!(text.contains(flag), "missing {flag} in help output");
    }
}

#[test]
fn test_probe_mode_never_fails_on_dead_upstream() {
    // Nothing listens on this port; the probe records the failure and
    // still exits cleanly with a report.
    let output = Command::cargo_bin("cluster-metrics-agent")
        .unwrap()
        .args([
            "--probe",
            "--netdata-url",
            "http://127.0.0.1:1",
            "--hosts",
            "node-a",
            "--request-timeout-ms",
            "500",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains("\"connectivity\""));
    assert!(text.contains("failed"));
}

#[test]
fn test_one_shot_run_emits_degraded_snapshot() {
    let output = Command::cargo_bin("cluster-metrics-agent")
        .unwrap()
        .args([
            "--netdata-url",
            "http://127.0.0.1:1",
            "--hosts",
            "node-a,node-b",
            "--request-timeout-ms",
            "500",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let text = String::from_utf8_lossy(&output.stdout);
    let snapshot: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
    assert_eq!(snapshot["status"], "unavailable");
    assert!(snapshot["cpu"].is_null());
    assert_eq!(snapshot["nodes_count"], 2);
}
