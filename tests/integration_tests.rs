/*
 * Integration tests for hwid
 *
 * These tests drive the builder, codec, matcher and persistence layers
 * together through fixed collectors, the same way the binary does.
 */

use hwid::cli::{Commands, OutputFormat};
use hwid::commands::{execute, Context, EXIT_OK, EXIT_REJECTED};
use hwid_core::constants::capacity::{LEGACY_SLOT_COUNT, MAX_BLOCKS};
use hwid_core::constants::paths::{user_config_dir, CONFIG_DIR_ENV};
use hwid_core::fingerprint::codec;
use hwid_core::{
    is_match, Block, BlockSet, CollectorSet, ComponentType, Fingerprint, FingerprintBuilder,
    FingerprintStore, FixedCollector, MatchVerdict, Settings,
};
use serial_test::serial;

// Test utilities
fn cpuid(ecx: u32) -> Vec<u8> {
    let mut raw = Vec::new();
    for reg in [0x000A_0655u32, 0x0310_0800, ecx, 0xBFEB_FBFF] {
        raw.extend_from_slice(&reg.to_le_bytes());
    }
    raw
}

struct Machine {
    cpu: Vec<u8>,
    host: &'static str,
    macs: Vec<Vec<u8>>,
    volumes: &'static str,
}

impl Machine {
    fn workstation() -> Self {
        Self {
            cpu: cpuid(0x7FFA_FBFF),
            host: "WORKSTATION",
            macs: vec![
                vec![0x00, 0x1B, 0x21, 0x0A, 0x0B, 0x0C],
                vec![0x00, 0x1B, 0x21, 0x0A, 0x0B, 0x0D],
            ],
            volumes: "0b7c-11f3a1-22",
        }
    }

    fn collectors(&self) -> CollectorSet {
        CollectorSet::new(
            Box::new(FixedCollector::single(ComponentType::Cpu, self.cpu.clone())),
            Box::new(FixedCollector::single(ComponentType::Host, self.host)),
            Box::new(FixedCollector::new(ComponentType::Mac, self.macs.clone())),
            Box::new(FixedCollector::single(ComponentType::Hdd, self.volumes)),
        )
    }

    fn blocks(&self) -> BlockSet {
        FingerprintBuilder::new(self.collectors()).build()
    }
}

#[test]
fn test_machine_recognizes_itself() {
    let machine = Machine::workstation();
    let set = machine.blocks();
    let text = set.fingerprint().to_string();

    let parsed = Fingerprint::parse(&text).unwrap();
    assert!(set.matches(parsed.as_bytes()));
    assert_eq!(parsed.blocks(), set.current().to_vec());
}

#[test]
fn test_one_adapter_replaced_still_matches() {
    let reference = Machine::workstation().blocks();
    let mut machine = Machine::workstation();
    machine.macs[0] = vec![0x00, 0x1B, 0x21, 0xFF, 0xFF, 0xFF];

    assert!(reference.matches(&machine.blocks().to_bytes()));
}

#[test]
fn test_one_component_type_stale_matches() {
    let reference = Machine::workstation().blocks();
    let mut machine = Machine::workstation();
    machine.volumes = "new-disk";

    let report = hwid_core::evaluate(reference.current(), &machine.blocks().to_bytes());
    assert_eq!(report.verdict, MatchVerdict::Tolerated);
    assert_eq!(report.changed_components(), vec![ComponentType::Hdd]);
}

#[test]
fn test_two_component_types_changed_rejected() {
    let reference = Machine::workstation().blocks();
    let mut machine = Machine::workstation();
    machine.volumes = "new-disk";
    machine.host = "RENAMED";

    assert!(!reference.matches(&machine.blocks().to_bytes()));
}

#[test]
fn test_cpu_change_always_rejected() {
    let reference = Machine::workstation().blocks();
    let mut machine = Machine::workstation();
    machine.cpu = {
        let mut raw = cpuid(0x7FFA_FBFF);
        raw[0] = 0x57;
        raw
    };

    let report = hwid_core::evaluate(reference.current(), &machine.blocks().to_bytes());
    assert_eq!(report.verdict, MatchVerdict::CpuMismatch);
    assert_eq!(report.matched_count(), 3);
}

#[test]
fn test_osxsave_toggle_does_not_change_fingerprint() {
    let a = Machine::workstation();
    let mut b = Machine::workstation();
    b.cpu = cpuid(0x7FFA_FBFF & !(1 << 27));
    assert_eq!(a.blocks().to_bytes(), b.blocks().to_bytes());
}

#[test]
fn test_legacy_format_fingerprint() {
    let set = Machine::workstation().blocks();
    assert_eq!(set.start_index(), 2);
    assert!(set.start_index() <= LEGACY_SLOT_COUNT);

    // What an older release would have emitted: feature flags intact
    let mut old: Vec<Block> = vec![set.legacy()[0]];
    old.extend_from_slice(&set.current()[1..]);
    let bytes = codec::encode_blocks(&old);

    assert!(set.matches_any_format(&bytes));
    assert!(!set.matches(&bytes));
}

#[test]
fn test_malformed_candidates() {
    let set = Machine::workstation().blocks();
    assert!(!is_match(set.current(), &[]));
    assert!(!is_match(set.current(), &[0xA9, 0x99, 0x3E]));
    assert!(Fingerprint::parse("AQID").is_err());
    assert!(Fingerprint::parse("not base64!").is_err());
}

#[test]
fn test_capacity_with_many_adapters() {
    let mut machine = Machine::workstation();
    machine.macs = (0..40u8).map(|i| vec![0x00, 0x1B, 0x21, 0x00, 0x01, i]).collect();
    let set = machine.blocks();
    assert_eq!(set.len(), MAX_BLOCKS);
    assert_eq!(set.fingerprint().block_count(), MAX_BLOCKS - set.start_index());
}

#[test]
fn test_enrollment_persists_across_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    let set = Machine::workstation().blocks();

    let mut store = FingerprintStore::new();
    store.enroll(set.fingerprint(), Some("workstation".to_string())).unwrap();
    store.save_to(&path).unwrap();

    let loaded = FingerprintStore::load_from(&path).unwrap();
    let reference = loaded.reference().unwrap();
    assert!(set.matches(reference.as_bytes()));
}

#[test]
fn test_cli_enroll_check_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = Context::new(
        Settings::default(),
        Some(dir.path().to_path_buf()),
        Machine::workstation().collectors(),
    )
    .unwrap();

    let mut out = Vec::new();
    let enroll = Commands::Enroll { label: None, force: false };
    assert_eq!(execute(&enroll, &ctx, &mut out).unwrap(), EXIT_OK);
    assert_eq!(execute(&Commands::Check, &ctx, &mut out).unwrap(), EXIT_OK);

    let mut moved = Machine::workstation();
    moved.host = "ELSEWHERE";
    moved.volumes = "other";
    let moved_ctx = Context::new(
        Settings::default(),
        Some(dir.path().to_path_buf()),
        moved.collectors(),
    )
    .unwrap();
    assert_eq!(execute(&Commands::Check, &moved_ctx, &mut out).unwrap(), EXIT_REJECTED);

    let show = Commands::Show { format: OutputFormat::Base64 };
    assert_eq!(execute(&show, &ctx, &mut out).unwrap(), EXIT_OK);
}

#[test]
fn test_strict_policy_from_settings() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("settings.json"),
        r#"{"policy":{"min_matched_types":4}}"#,
    )
    .unwrap();
    let settings = Settings::load_from_dir(dir.path()).unwrap();

    let fingerprint = Machine::workstation().blocks().fingerprint().to_string();
    let mut drifted = Machine::workstation();
    drifted.volumes = "new-disk";
    let ctx = Context::new(settings, Some(dir.path().to_path_buf()), drifted.collectors()).unwrap();

    let mut out = Vec::new();
    let verify = Commands::Verify { fingerprint };
    assert_eq!(execute(&verify, &ctx, &mut out).unwrap(), EXIT_REJECTED);
}

#[test]
#[serial]
fn test_config_dir_env_override() {
    let dir = tempfile::tempdir().unwrap();
    std::env::set_var(CONFIG_DIR_ENV, dir.path());
    let resolved = user_config_dir();
    std::env::remove_var(CONFIG_DIR_ENV);

    assert_eq!(resolved, Some(dir.path().to_path_buf()));
}

#[test]
#[serial]
fn test_settings_load_uses_env_dir() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("settings.json"), r#"{"log_level":"warn"}"#).unwrap();

    std::env::set_var(CONFIG_DIR_ENV, dir.path());
    let settings = Settings::load();
    let store_path = FingerprintStore::default_path();
    std::env::remove_var(CONFIG_DIR_ENV);

    assert_eq!(settings.unwrap().log_level, "warn");
    assert_eq!(store_path.unwrap(), dir.path().join("fingerprint_store.json"));
}
