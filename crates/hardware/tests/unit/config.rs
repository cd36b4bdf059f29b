//! # Configuration Tests
//!
//! Defaults, partial JSON documents, files on disk and validation failures.

use std::io::Write;

use cmpsim_core::common::SimError;
use cmpsim_core::config::*;
use pretty_assertions::assert_eq;
use rstest::rstest;

// ══════════════════════════════════════════════════════════
// 1. Defaults
// ══════════════════════════════════════════════════════════

#[test]
fn machine_defaults() {
    let config = Config::default();
    assert_eq!(config.core.num_cores, 2);
    assert_eq!(config.core.threads_per_core, 2);
    assert_eq!(config.total_threads(), 4);
    assert_eq!(config.core.decode_width, 4);
    assert_eq!(config.core.issue_width, 8);
    assert_eq!(config.core.commit_width, 4);
    assert_eq!(config.core.decode_buffer_capacity, 96);
    assert_eq!(config.core.rob_capacity, 96);
    assert_eq!(config.core.lsq_capacity, 48);
    assert_eq!(config.core.phys_int_regs, 128);
    assert_eq!(config.core.phys_fp_regs, 128);
    assert_eq!(config.core.phys_misc_regs, 16);
}

#[test]
fn memory_system_defaults() {
    let config = Config::default();
    assert_eq!(config.cache.l1d.size_bytes, 32 * 1024);
    assert_eq!(config.cache.l1d.line_bytes, 64);
    assert_eq!(config.cache.l1d.ways, 4);
    assert_eq!(config.cache.l1d.latency, 1);
    assert_eq!(config.cache.l1d.policy, ReplacementPolicy::Lru);
    assert_eq!(config.cache.l2.latency, 10);
    assert_eq!(config.memory.controller, MemoryController::Simple);
    assert_eq!(config.memory.latency, 200);
    assert_eq!(config.network.hop_latency, 2);
    assert_eq!(config.network.bandwidth, 32);
    assert_eq!(config.protocol, Protocol::Mesi);
}

#[test]
fn general_and_predictor_defaults() {
    let config = Config::default();
    assert_eq!(config.general.max_cycles, 10_000_000);
    assert_eq!(config.general.commit_timeout, 1_000_000);
    assert_eq!(config.general.fast_forward_instructions, 0);
    assert_eq!(config.general.warmup_instructions, 0);
    assert_eq!(config.branch_predictor.kind, BranchPredictor::TwoBit);
    assert_eq!(config.threads.main_thread, 0);
    assert_eq!(config.threads.helper_thread, None);
}

// ══════════════════════════════════════════════════════════
// 2. JSON
// ══════════════════════════════════════════════════════════

#[test]
fn empty_document_is_the_default_machine() {
    let config = Config::from_json_str("{}").unwrap();
    assert_eq!(config.core.num_cores, Config::default().core.num_cores);
    assert_eq!(config.protocol, Protocol::Mesi);
}

#[test]
fn combined_predictor_section() {
    let config =
        Config::from_json_str(r#"{"branch_predictor": {"kind": "Combined", "meta_size": 256}}"#).unwrap();
    assert_eq!(config.branch_predictor.kind, BranchPredictor::Combined);
    assert_eq!(config.branch_predictor.meta_size, 256);
    assert_eq!(Config::default().branch_predictor.meta_size, 1024);

    let err = Config::from_json_str(r#"{"branch_predictor": {"meta_size": 100}}"#).unwrap_err();
    assert!(err.to_string().contains("branch_predictor.meta_size"), "got {err}");
}

#[test]
fn tlb_section() {
    let defaults = Config::default().tlb;
    assert_eq!((defaults.size_bytes, defaults.ways, defaults.page_bytes), (32 * 1024, 4, 64));
    assert_eq!((defaults.hit_latency, defaults.miss_latency), (2, 30));

    let config = Config::from_json_str(r#"{"tlb": {"ways": 8, "miss_latency": 100}}"#).unwrap();
    assert_eq!(config.tlb.ways, 8);
    assert_eq!(config.tlb.miss_latency, 100);
    assert_eq!(config.tlb.hit_latency, 2);

    let err = Config::from_json_str(r#"{"tlb": {"size_bytes": 0}}"#).unwrap_err();
    assert!(err.to_string().contains("tlb"), "got {err}");
}

#[rstest]
#[case("\"Msi\"", Protocol::Msi)]
#[case("\"MSI\"", Protocol::Msi)]
#[case("\"Mesi\"", Protocol::Mesi)]
#[case("\"MESI\"", Protocol::Mesi)]
fn protocol_names(#[case] name: &str, #[case] expected: Protocol) {
    let config = Config::from_json_str(&format!("{{\"protocol\": {name}}}")).unwrap();
    assert_eq!(config.protocol, expected);
}

#[rstest]
#[case("LRU", ReplacementPolicy::Lru)]
#[case("Plru", ReplacementPolicy::Plru)]
#[case("FIFO", ReplacementPolicy::Fifo)]
#[case("Random", ReplacementPolicy::Random)]
#[case("MRU", ReplacementPolicy::Mru)]
fn replacement_policy_names(#[case] name: &str, #[case] expected: ReplacementPolicy) {
    let json = format!("{{\"cache\": {{\"l1i\": {{\"policy\": \"{name}\"}}}}}}");
    let config = Config::from_json_str(&json).unwrap();
    assert_eq!(config.cache.l1i.policy, expected);
    assert_eq!(config.cache.l1d.policy, ReplacementPolicy::Lru, "other caches untouched");
}

#[test]
fn dram_controller_with_timings() {
    let json = r#"{ "memory": { "controller": "Dram", "t_cas": 10, "t_ras": 20, "t_pre": 30 } }"#;
    let config = Config::from_json_str(json).unwrap();
    assert_eq!(config.memory.controller, MemoryController::Dram);
    assert_eq!((config.memory.t_cas, config.memory.t_ras, config.memory.t_pre), (10, 20, 30));
}

#[test]
fn helper_thread_role() {
    let json = r#"{ "threads": { "main_thread": 1, "helper_thread": 2 } }"#;
    let config = Config::from_json_str(json).unwrap();
    assert_eq!(config.threads.main_thread, 1);
    assert_eq!(config.threads.helper_thread, Some(2));
}

#[test]
fn malformed_json_is_a_parse_error() {
    let err = Config::from_json_str("{ \"core\": ").unwrap_err();
    assert!(matches!(err, SimError::ConfigParse(_)), "got {err}");
}

#[test]
fn unknown_enum_value_is_a_parse_error() {
    let err = Config::from_json_str(r#"{ "protocol": "Moesi" }"#).unwrap_err();
    assert!(matches!(err, SimError::ConfigParse(_)), "got {err}");
}

#[test]
fn parsed_documents_are_validated() {
    let err = Config::from_json_str(r#"{ "core": { "rob_capacity": 0 } }"#).unwrap_err();
    assert!(err.to_string().contains("core.rob_capacity"), "{err}");
}

// ══════════════════════════════════════════════════════════
// 3. Files
// ══════════════════════════════════════════════════════════

#[test]
fn config_file_round_trip() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{ "core": {{ "num_cores": 4, "threads_per_core": 1 }}, "network": {{ "bandwidth": 16 }} }}"#
    )
    .unwrap();
    let config = Config::from_json_file(file.path()).unwrap();
    assert_eq!(config.core.num_cores, 4);
    assert_eq!(config.total_threads(), 4);
    assert_eq!(config.network.bandwidth, 16);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::from_json_file(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, SimError::Io(_)), "got {err}");
}

// ══════════════════════════════════════════════════════════
// 4. Validation
// ══════════════════════════════════════════════════════════

#[rstest]
#[case::no_cores(|c: &mut Config| c.core.num_cores = 0, "core.num_cores")]
#[case::no_commit(|c: &mut Config| c.core.commit_width = 0, "core.commit_width")]
#[case::no_lsq(|c: &mut Config| c.core.lsq_capacity = 0, "core.lsq_capacity")]
#[case::no_alu(|c: &mut Config| c.fu.int_alu = 0, "fu.int_alu")]
#[case::int_regs(|c: &mut Config| c.core.phys_int_regs = 64, "core.phys_int_regs")]
#[case::btb(|c: &mut Config| c.branch_predictor.btb_size = 500, "branch_predictor.btb_size")]
#[case::main_thread(|c: &mut Config| c.threads.main_thread = 4, "threads.main_thread")]
#[case::bandwidth(|c: &mut Config| c.network.bandwidth = 0, "network.bandwidth")]
fn invalid_settings_are_named(#[case] mutate: fn(&mut Config), #[case] field: &str) {
    let mut config = Config::default();
    mutate(&mut config);
    let err = config.validate().unwrap_err();
    assert!(matches!(err, SimError::Config { .. }), "got {err}");
    assert!(err.to_string().contains(field), "{err} should name {field}");
}

#[test]
fn single_thread_cores_need_fewer_registers() {
    let mut config = Config::default();
    config.core.threads_per_core = 1;
    config.core.phys_int_regs = 64;
    assert!(config.validate().is_ok());
}
