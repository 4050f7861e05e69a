use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::io::Write;

const KEY: &str = "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIGlfTNRyUWtmam7e37oW1GlsC/sez0CQG0vkivS+cOF6 tester@host";

/// The binary with a scratch `$HOME` and no host certificate variables.
fn machine_ignition(home: &tempfile::TempDir) -> assert_cmd::Command {
    let mut cmd: assert_cmd::Command = cargo_bin_cmd!("machine-ignition").into();
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .env_remove("SSL_CERT_FILE")
        .env_remove("SSL_CERT_DIR")
        .env_remove("RUST_LOG");
    cmd
}

fn read_json(path: &std::path::Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn help_works() {
    let home = tempfile::tempdir().unwrap();
    machine_ignition(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("first-boot Ignition"));
}

#[test]
fn generate_writes_descriptor() {
    let home = tempfile::tempdir().unwrap();
    let out = home.path().join("dev.ign");

    machine_ignition(&home)
        .args(["generate", "--ssh-key", KEY, "--uid", "1000", "--output"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote ignition to"));

    let v = read_json(&out);
    assert_eq!(v["ignition"]["version"], "3.2.0");
    let users = v["passwd"]["users"].as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0]["name"], "core");
    assert_eq!(users[0]["uid"], 1000);
    assert_eq!(users[0]["sshAuthorizedKeys"][0], KEY);
    assert_eq!(users[1]["name"], "root");
}

#[test]
fn generate_from_config_file() {
    let home = tempfile::tempdir().unwrap();
    let out = home.path().join("alice.ign");
    let config_path = home.path().join("machine.toml");
    let mut f = std::fs::File::create(&config_path).unwrap();
    write!(
        f,
        r#"
name = "alice-vm"
vm_kind = "applehv"
output = "{}"

[user]
name = "alice"
uid = 100050
ssh_key = "{KEY}"

[machine]
timezone = "Europe/Berlin"
rootful = true
net_recover = true
"#,
        out.display()
    )
    .unwrap();

    machine_ignition(&home)
        .args(["--config", config_path.to_str().unwrap(), "generate"])
        .assert()
        .success();

    let v = read_json(&out);
    let users: Vec<_> = v["passwd"]["users"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(users, ["core", "alice", "root"]);
    assert_eq!(v["passwd"]["users"][0]["shouldExist"], false);

    let files = v["storage"]["files"].as_array().unwrap();
    let subuid = files.iter().find(|f| f["path"] == "/etc/subuid").unwrap();
    assert_eq!(subuid["contents"]["source"], "data:,alice:100051:1000000");
    let tmpfiles = files
        .iter()
        .find(|f| f["path"] == "/etc/tmpfiles.d/podman-docker.conf")
        .unwrap();
    assert!(
        tmpfiles["contents"]["source"]
            .as_str()
            .unwrap()
            .contains("%2Frun%2Fpodman%2Fpodman.sock")
    );
    assert!(files.iter().any(|f| f["path"] == "/usr/local/bin/net-health-recovery.sh"));

    let links = v["storage"]["links"].as_array().unwrap();
    assert_eq!(links.last().unwrap()["target"], "/usr/share/zoneinfo/Europe/Berlin");

    let units = v["systemd"]["units"].as_array().unwrap();
    assert_eq!(units.last().unwrap()["name"], "net-health-recovery.service");
}

#[test]
fn cli_flags_override_config() {
    let home = tempfile::tempdir().unwrap();
    let out = home.path().join("o.ign");
    let config_path = home.path().join("machine.toml");
    std::fs::write(
        &config_path,
        format!("[user]\nname = \"alice\"\nssh_key = \"{KEY}\"\n"),
    )
    .unwrap();

    machine_ignition(&home)
        .args(["--config", config_path.to_str().unwrap(), "generate", "--user", "core", "--output"])
        .arg(&out)
        .assert()
        .success();

    let v = read_json(&out);
    assert_eq!(v["passwd"]["users"].as_array().unwrap().len(), 2);
}

#[test]
fn missing_config_shows_error() {
    let home = tempfile::tempdir().unwrap();
    machine_ignition(&home)
        .args(["--config", "/nonexistent/machine.toml", "generate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load config"));
}

#[test]
fn invalid_ssh_key_is_rejected() {
    let home = tempfile::tempdir().unwrap();
    let out = home.path().join("x.ign");
    machine_ignition(&home)
        .args(["generate", "--ssh-key", "definitely not a key", "--output"])
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid SSH public key"));
    assert!(!out.exists());
}

#[test]
fn unknown_vm_kind_is_rejected() {
    let home = tempfile::tempdir().unwrap();
    machine_ignition(&home)
        .args(["generate", "--ssh-key", KEY, "--vm-kind", "vmware"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown vm kind"));
}

#[test]
fn ignition_file_is_copied_verbatim() {
    let home = tempfile::tempdir().unwrap();
    let custom = home.path().join("custom.ign");
    let out = home.path().join("out.ign");
    let body = "{\"ignition\":{\"version\":\"3.4.0\"},\"custom\":true}";
    std::fs::write(&custom, body).unwrap();

    machine_ignition(&home)
        .args(["generate", "--ignition-file"])
        .arg(&custom)
        .arg("--output")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Copied"));

    assert_eq!(std::fs::read_to_string(&out).unwrap(), body);
}

#[test]
fn ready_unit_and_extra_file_are_appended() {
    let home = tempfile::tempdir().unwrap();
    let out = home.path().join("r.ign");
    let extra = home.path().join("motd");
    std::fs::write(&extra, "hello vm\n").unwrap();

    machine_ignition(&home)
        .args(["generate", "--ssh-key", KEY, "--ready-vsock-port", "1025", "--file"])
        .arg(format!("{}:/etc/motd", extra.display()))
        .arg("--output")
        .arg(&out)
        .assert()
        .success();

    let v = read_json(&out);
    let units = v["systemd"]["units"].as_array().unwrap();
    let ready = units.last().unwrap();
    assert_eq!(ready["name"], "ready.service");
    assert!(ready["contents"].as_str().unwrap().contains("VSOCK-CONNECT:2:1025"));

    let files = v["storage"]["files"].as_array().unwrap();
    let motd = files.last().unwrap();
    assert_eq!(motd["path"], "/etc/motd");
    assert_eq!(motd["contents"]["source"], "data:,hello%20vm%0A");
}

#[test]
fn json_summary() {
    let home = tempfile::tempdir().unwrap();
    let out = home.path().join("j.ign");
    machine_ignition(&home)
        .args(["generate", "--ssh-key", KEY, "--output-format", "json", "--output"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("degraded"))
        .stdout(predicate::str::contains("j.ign"));
}

#[test]
fn rootful_from_config_can_be_turned_off() {
    let home = tempfile::tempdir().unwrap();
    let out = home.path().join("off.ign");
    let config_path = home.path().join("machine.toml");
    std::fs::write(
        &config_path,
        format!("[user]\nuid = 1000\nssh_key = \"{KEY}\"\n\n[machine]\nrootful = true\nnet_recover = true\n"),
    )
    .unwrap();

    machine_ignition(&home)
        .args(["--config", config_path.to_str().unwrap(), "generate"])
        .args(["--rootful=false", "--net-recover=false", "--output"])
        .arg(&out)
        .assert()
        .success();

    let v = read_json(&out);
    let files = v["storage"]["files"].as_array().unwrap();
    let tmpfiles = files
        .iter()
        .find(|f| f["path"] == "/etc/tmpfiles.d/podman-docker.conf")
        .unwrap();
    assert!(
        tmpfiles["contents"]["source"]
            .as_str()
            .unwrap()
            .contains("%2Frun%2Fuser%2F1000%2Fpodman%2Fpodman.sock")
    );
    assert!(!files.iter().any(|f| f["path"] == "/usr/local/bin/net-health-recovery.sh"));
}
