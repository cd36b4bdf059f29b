//! Error Taxonomy Tests.

use cmpsim_core::common::SimError;

#[test]
fn config_error_names_the_reason() {
    let err = SimError::config("core.num_cores must be non-zero");
    assert_eq!(
        err.to_string(),
        "invalid configuration: core.num_cores must be non-zero"
    );
}

#[test]
fn protocol_violation_formats_state_and_event() {
    #[derive(Debug)]
    enum State {
        ImAd,
    }
    #[derive(Debug)]
    enum Ev {
        Inv,
    }
    let err = SimError::protocol(42, "l1d0", State::ImAd, Ev::Inv);
    let msg = err.to_string();
    assert!(msg.contains("cycle 42"), "{msg}");
    assert!(msg.contains("l1d0"), "{msg}");
    assert!(msg.contains("ImAd"), "{msg}");
    assert!(msg.contains("Inv"), "{msg}");
}

#[test]
fn liveness_error_reports_thread_and_progress() {
    let err = SimError::Liveness {
        thread: "c1t0".into(),
        cycle: 6_000_000,
        committed: 17,
    };
    let msg = err.to_string();
    assert!(msg.contains("c1t0"));
    assert!(msg.contains("17 committed"));
}

#[test]
fn json_errors_convert_into_parse_errors() {
    let parse: Result<u32, _> = serde_json::from_str("{");
    let err: SimError = parse.unwrap_err().into();
    assert!(matches!(err, SimError::ConfigParse(_)));
}

#[test]
fn io_errors_convert() {
    let err: SimError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
    assert!(matches!(err, SimError::Io(_)));
    assert!(err.to_string().contains("gone"));
}
