/*
 * Integration tests for hwid
 *
 * These tests run the command line front end against fixture sysfs and
 * procfs trees and temporary storage, checking the identifier end to end.
 */

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use hwid::cli::{run_cli, Cli};
use hwid_core::{
    derive_public_id, encode_record, generate, parse_record, BloomValue, HwidError,
    IdentityConfig, IdentityContext, IdentityOrigin, PlatformSource, StorageScope,
};
use serial_test::serial;
use tempfile::TempDir;

// Test utilities
struct Machine {
    dir: TempDir,
}

impl Machine {
    /// Three permanent interfaces, one volatile modem interface and a CPU
    /// without a usable serial
    fn new() -> Self {
        let machine = Self {
            dir: TempDir::new().unwrap(),
        };
        machine.add_nic("eth0", "b8:27:eb:12:34:50", "0");
        machine.add_nic("eth1", "b8:27:eb:12:34:5b", "0");
        machine.add_nic("wlan0", "b8:27:eb:12:34:b8", "0");
        machine.add_nic("ccmni0", "02:00:00:00:00:01", "0");
        machine.add_nic("veth9", "4a:11:22:33:44:55", "3");
        machine.write("proc/cpuinfo", "processor\t: 0\nSerial\t\t: 0000000000000000\n");
        machine
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn write(&self, rel: &str, content: &str) {
        let path = self.root().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn add_nic(&self, name: &str, address: &str, assign_type: &str) {
        self.write(&format!("sys/class/net/{}/address", name), &format!("{}\n", address));
        self.write(&format!("sys/class/net/{}/addr_assign_type", name), &format!("{}\n", assign_type));
    }

    fn remove_nic(&self, name: &str) {
        fs::remove_dir_all(self.root().join("sys/class/net").join(name)).unwrap();
    }

    fn system_file(&self) -> PathBuf {
        self.root().join("home/.hwid_id")
    }

    fn package_file(&self) -> PathBuf {
        self.root().join("pkg/.hwid_id")
    }

    fn config(&self) -> IdentityConfig {
        serde_json::from_value(serde_json::json!({
            "storage": [
                { "path": self.system_file(), "scope": "system" },
                { "path": self.package_file(), "scope": "package" },
            ],
            "package_dir": self.root().join("pkg"),
            "commands": [],
            "sysfs_root": self.root().join("sys"),
            "procfs_root": self.root().join("proc"),
        }))
        .unwrap()
    }

    fn config_file(&self) -> PathBuf {
        let path = self.root().join("hwid.json");
        fs::write(&path, serde_json::to_string_pretty(&self.config()).unwrap()).unwrap();
        path
    }

    fn run(&self, args: &[&str]) -> String {
        let config = self.config_file();
        let mut argv = vec!["hwid".to_string()];
        argv.extend(args.iter().map(|a| a.to_string()));
        argv.push("--config".to_string());
        argv.push(config.display().to_string());

        let cli = Cli::try_parse_from(argv).unwrap();
        let mut out = Vec::new();
        run_cli(&cli, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }
}

#[test]
fn test_id_is_stable_across_runs() {
    let machine = Machine::new();

    let first = machine.run(&["id"]);
    let second = machine.run(&["id"]);

    assert_eq!(first, second);
    let id = first.trim();
    assert_eq!(id.len(), 32);
    assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
}

#[cfg(target_os = "linux")]
#[test]
fn test_volatile_interfaces_do_not_contribute() {
    let machine = Machine::new();
    let source = PlatformSource::from_config(&machine.config());

    let expected: BloomValue = ["b827eb123450", "b827eb12345b", "b827eb1234b8"]
        .iter()
        .map(|mac| BloomValue::encode_str(mac))
        .collect();
    assert_eq!(generate(&source), expected);
    assert_eq!(expected.weight(), 11);
}

#[cfg(target_os = "linux")]
#[test]
fn test_both_scopes_are_written_with_their_masks() {
    let machine = Machine::new();
    let ctx = IdentityContext::from_config(&machine.config());

    let system = fs::read_to_string(machine.system_file()).unwrap();
    let package = fs::read_to_string(machine.package_file()).unwrap();

    assert_eq!(system, encode_record(ctx.raw(), StorageScope::System));
    assert_eq!(package, encode_record(ctx.raw(), StorageScope::Package));
    assert_eq!(
        parse_record(&system).unwrap() ^ parse_record(&package).unwrap(),
        StorageScope::System.mask() ^ StorageScope::Package.mask()
    );
}

#[cfg(target_os = "linux")]
#[test]
fn test_id_survives_removing_an_interface() {
    let machine = Machine::new();
    let before = IdentityContext::from_config(&machine.config());

    machine.remove_nic("wlan0");
    let after = IdentityContext::from_config(&machine.config());

    assert!(matches!(after.origin(), IdentityOrigin::Stored(_)));
    assert_eq!(before.public_id(), after.public_id());
    assert_eq!(after.last_check().map(|c| c.matches), Some(2));
}

#[cfg(target_os = "linux")]
#[test]
fn test_new_board_gets_new_id() {
    let machine = Machine::new();
    let before = IdentityContext::from_config(&machine.config());

    for nic in ["eth0", "eth1", "wlan0"] {
        machine.remove_nic(nic);
    }
    machine.add_nic("eth0", "0a:1b:2c:3d:4e:5f", "0");
    let after = IdentityContext::from_config(&machine.config());

    assert_eq!(after.origin(), &IdentityOrigin::Generated);
    assert_ne!(before.public_id(), after.public_id());
}

#[cfg(target_os = "linux")]
#[test]
fn test_copied_system_record_in_package_dir_is_rejected() {
    let machine = Machine::new();
    let raw = generate(&PlatformSource::from_config(&machine.config()));

    // Only the package location exists, holding a system-masked value.
    machine.write("pkg/.hwid_id", &encode_record(raw, StorageScope::System));
    let mut config = machine.config();
    config.storage.remove(0);

    let ctx = IdentityContext::from_config(&config);
    assert_eq!(ctx.origin(), &IdentityOrigin::Generated);
    assert_eq!(ctx.raw(), raw);
}

#[test]
fn test_machine_without_identifiers_has_fixed_id() {
    let machine = Machine::new();
    for nic in ["eth0", "eth1", "wlan0", "ccmni0", "veth9"] {
        machine.remove_nic(nic);
    }

    let id = machine.run(&["id"]);
    assert_eq!(id.trim(), derive_public_id(BloomValue::EMPTY));
}

#[cfg(target_os = "linux")]
#[test]
fn test_id_raw_reports_origin() {
    let machine = Machine::new();
    machine.run(&["id"]);

    let output = machine.run(&["id", "--raw"]);
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("raw:"));
    assert!(lines[1].contains("weight 11"));
    assert!(lines[2].starts_with("origin: stored (System)"));
}

#[test]
fn test_status_json() {
    let machine = Machine::new();
    let output = machine.run(&["status", "--json"]);
    let status: serde_json::Value = serde_json::from_str(&output).unwrap();

    assert_eq!(status["state"], "Persisted");
    assert_eq!(status["origin"]["kind"], "generated");
    assert_eq!(status["public_id"].as_str().unwrap().len(), 32);
    assert_eq!(status["persisted_to"].as_array().unwrap().len(), 2);
}

#[cfg(target_os = "linux")]
#[test]
fn test_cpuinfo_probe() {
    let machine = Machine::new();
    assert_eq!(machine.run(&["cpuinfo"]), "Could not get serial\n");

    machine.write("proc/cpuinfo", "Hardware\t: BCM2835\nSerial\t\t: 00000000a1b2c3d4\n");
    assert_eq!(machine.run(&["cpuinfo"]), "Got 0044000009000004\n");
}

#[test]
fn test_diagnostics_need_no_config() {
    let cli = Cli::try_parse_from(["hwid", "bloom", "00000000a1b2c3d4", "b827eb123456"]).unwrap();
    let mut out = Vec::new();
    run_cli(&cli, &mut out).unwrap();

    let text = String::from_utf8(out).unwrap();
    let (weight, value) = text.trim().split_once(' ').unwrap();
    assert_eq!(weight, "11");
    assert_eq!(value.len(), 16);
}

#[test]
#[serial]
fn test_config_from_environment() {
    let machine = Machine::new();
    let path = machine.config_file();

    std::env::set_var("HWID_CONFIG", &path);
    let loaded = IdentityConfig::load(None);
    std::env::remove_var("HWID_CONFIG");

    assert_eq!(loaded.unwrap(), machine.config());
}

#[test]
fn test_malformed_config_is_reported() {
    let machine = Machine::new();
    machine.write("bad.json", "{ not json");
    let bad = machine.root().join("bad.json");

    assert!(matches!(IdentityConfig::load(Some(&bad)), Err(HwidError::JsonParse(_))));

    let cli = Cli::try_parse_from(["hwid", "id", "--config", bad.to_str().unwrap()]).unwrap();
    let mut out = Vec::new();
    let err = run_cli(&cli, &mut out).unwrap_err();
    assert!(err.to_string().contains("identity config"));
    assert!(out.is_empty());
}
