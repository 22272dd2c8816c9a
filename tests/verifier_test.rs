//! Verifier integration tests
//!
//! End-to-end: topology + captured output → verdict.

mod common;

use hwaccel_harness::bundle::{ComponentOutput, ResultBundle, Stream, StreamKind};
use hwaccel_harness::extract::EventPattern;
use hwaccel_harness::topology::{ComponentId, Device, Experiment, Host};
use hwaccel_harness::report::Report;
use hwaccel_harness::verify::MetricValue::{Float, Integer};
use hwaccel_harness::verify::{PlanStep, Side, Verifier, VerifierState};
use hwaccel_harness::ErrorKind;

const START: u64 = 17_597_491_001;
const END: u64 = 17_597_500_001;

fn verifier() -> Verifier {
    common::init_test_logging();
    Verifier::new().unwrap()
}

// =============================================================================
// Passing Runs
// =============================================================================

#[test]
fn test_fixture_passes() {
    let bundle = ResultBundle::load(common::fixture("test0-1.json")).unwrap();
    assert_eq!(bundle.exp_name(), Some("test0"));
    assert_eq!(bundle.success(), Some(true));

    let verdict = verifier().verify(&common::test0(), &bundle);
    assert!(verdict.passed(), "{:?}", verdict.failure());
    assert_eq!(verdict.experiment(), "test0");
    assert_eq!(verdict.metric("cycles_per_op"), Some(Integer(8723)));
    assert_eq!(verdict.metric("sim_ns_per_op"), Some(Float(9000.0)));
    assert_eq!(verdict.metric("elapsed_ticks"), Some(Integer(9_000_000)));
}

#[test]
fn test_first_marker_wins() {
    let bundle = ResultBundle::new()
        .with_component(
            "host.host",
            ComponentOutput::new(
                Stream::from_text("Cycles per operation: 10\nCycles per operation: 99"),
                Stream::default(),
            ),
        )
        .with_component("dev.host.accel", common::device_output(START, END));

    let verdict = verifier().verify(&common::test0(), &bundle);
    assert_eq!(verdict.metric("cycles_per_op"), Some(Integer(10)));
}

#[test]
fn test_zero_elapsed_passes() {
    let bundle = common::test0_bundle("5", START, START);
    let verdict = verifier().verify(&common::test0(), &bundle);
    assert!(verdict.passed());
    assert_eq!(verdict.metric("sim_ns_per_op"), Some(Float(0.0)));
}

#[test]
fn test_custom_clock_scale() {
    let verifier = Verifier::builder().clock_scale(1).build().unwrap();
    let verdict = verifier.verify(&common::test0(), &common::test0_bundle("5", 100, 350));
    assert_eq!(verdict.metric("sim_ns_per_op"), Some(Float(250.0)));
}

#[test]
fn test_verification_is_idempotent() {
    let verifier = verifier();
    let experiment = common::test0();
    let bundle = common::test0_bundle("8723", START, END);

    let first = verifier.verify(&experiment, &bundle);
    let second = verifier.verify(&experiment, &bundle);
    assert_eq!(first, second);
}

// =============================================================================
// Failing Runs
// =============================================================================

#[test]
fn test_missing_cycles_line() {
    let bundle = ResultBundle::new()
        .with_component(
            "host.host",
            ComponentOutput::new(Stream::from_text("AccelApp: crashed"), Stream::default()),
        )
        .with_component("dev.host.accel", common::device_output(START, END));

    let verdict = verifier().verify(&common::test0(), &bundle);
    let failure = verdict.failure().unwrap();
    assert_eq!(failure.kind(), ErrorKind::MissingOutput);
    assert_eq!(failure.component(), Some("host.host"));
    assert_eq!(failure.stream(), Some(StreamKind::Stdout));
    assert_eq!(failure.pattern(), Some("cycles_per_op"));
    assert!(failure.message().contains("cycles line"));
    assert!(verdict.metrics().is_none());
}

#[test]
fn test_missing_done_marker() {
    let bundle = ResultBundle::new()
        .with_component("host.host", common::host_output("8"))
        .with_component(
            "dev.host.accel",
            ComponentOutput::new(
                Stream::default(),
                Stream::from_text("MMIO Write: ctrl 1 ex_time=1 main=1"),
            ),
        );

    let failure = verifier()
        .verify(&common::test0(), &bundle)
        .failure()
        .cloned()
        .unwrap();
    assert_eq!(failure.kind(), ErrorKind::MissingOutput);
    assert_eq!(failure.component(), Some("dev.host.accel"));
    assert_eq!(failure.stream(), Some(StreamKind::Stderr));
    assert_eq!(failure.pattern(), Some("done"));
}

#[test]
fn test_missing_component() {
    let bundle = ResultBundle::new().with_component("host.host", common::host_output("8"));

    let failure = verifier()
        .verify(&common::test0(), &bundle)
        .failure()
        .cloned()
        .unwrap();
    assert_eq!(failure.kind(), ErrorKind::MissingComponent);
    assert_eq!(failure.component(), Some("dev.host.accel"));
}

#[test]
fn test_end_before_start_is_anomaly() {
    let bundle = common::test0_bundle("8", END, START);
    let failure = verifier()
        .verify(&common::test0(), &bundle)
        .failure()
        .cloned()
        .unwrap();
    assert_eq!(failure.kind(), ErrorKind::TimingAnomaly);
    assert_eq!(failure.component(), Some("dev.host.accel"));
}

#[test]
fn test_empty_cycles_capture_is_parse_error() {
    let bundle = common::test0_bundle("", START, END);
    let failure = verifier()
        .verify(&common::test0(), &bundle)
        .failure()
        .cloned()
        .unwrap();
    assert_eq!(failure.kind(), ErrorKind::Parse);
    assert_eq!(failure.pattern(), Some("cycles_per_op"));
    assert_eq!(failure.component(), Some("host.host"));
}

#[test]
fn test_overflowing_cycles_is_parse_error() {
    let bundle = common::test0_bundle("99999999999999999999999", START, END);
    let verdict = verifier().verify(&common::test0(), &bundle);
    assert_eq!(verdict.failure().unwrap().kind(), ErrorKind::Parse);
}

// =============================================================================
// Plans, States and Multi-Host Runs
// =============================================================================

#[test]
fn test_traced_states() {
    let (verdict, states) =
        verifier().verify_traced(&common::test0(), &common::test0_bundle("8", START, END));
    assert!(verdict.passed());
    assert_eq!(
        states,
        vec![
            VerifierState::Init,
            VerifierState::ExtractingHost,
            VerifierState::ExtractingDevice,
            VerifierState::Reconciling,
            VerifierState::Done { passed: true },
        ]
    );

    let (_, states) = verifier().verify_traced(&common::test0(), &ResultBundle::new());
    assert_eq!(
        states,
        vec![VerifierState::Init, VerifierState::Done { passed: false }]
    );
}

fn two_host_experiment() -> Experiment {
    Experiment::builder("pair")
        .add_host(Host::builder("h0").wait(true).pcidev("a0").build())
        .add_host(Host::builder("h1").wait(true).pcidev("a1").build())
        .add_host(Host::builder("idle").pcidev("spare").build())
        .add_device(Device::builder("a0").build())
        .add_device(Device::builder("a1").build())
        .add_device(Device::builder("spare").build())
        .build()
        .unwrap()
}

#[test]
fn test_plan_measures_waited_hosts_only() {
    let plan = verifier().plan(&two_host_experiment());
    let steps = plan.steps();
    assert_eq!(steps.len(), 4);
    assert!(matches!(&steps[0], PlanStep::Measure { host, .. } if host == "h0"));
    assert!(matches!(&steps[1], PlanStep::Measure { host, .. } if host == "h1"));
    assert!(matches!(&steps[2], PlanStep::Presence(id) if id.as_str() == "host.idle"));
    assert!(matches!(&steps[3], PlanStep::Presence(id) if id.as_str() == "dev.idle.spare"));

    let planned: Vec<&str> = plan
        .component_ids()
        .into_iter()
        .map(ComponentId::as_str)
        .collect();
    let expected: Vec<String> = two_host_experiment()
        .component_ids(verifier().roles())
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(planned, expected);
}

#[test]
fn test_multi_host_metric_prefixes() {
    let silent = ComponentOutput::default();
    let bundle = ResultBundle::new()
        .with_component("host.h0", common::host_output("10"))
        .with_component("dev.h0.a0", common::device_output(1_000, 5_000))
        .with_component("host.h1", common::host_output("20"))
        .with_component("dev.h1.a1", common::device_output(1_000, 3_000))
        .with_component("host.idle", silent.clone())
        .with_component("dev.idle.spare", silent);

    let verdict = verifier().verify(&two_host_experiment(), &bundle);
    assert!(verdict.passed(), "{:?}", verdict.failure());
    assert_eq!(verdict.metric("cycles_per_op"), Some(Integer(10)));
    assert_eq!(verdict.metric("sim_ns_per_op"), Some(Float(4.0)));
    assert_eq!(verdict.metric("h1.cycles_per_op"), Some(Integer(20)));
    assert_eq!(verdict.metric("h1.a1.sim_ns_per_op"), Some(Float(2.0)));
}

#[test]
fn test_presence_only_host_still_required() {
    let bundle = ResultBundle::new()
        .with_component("host.h0", common::host_output("10"))
        .with_component("dev.h0.a0", common::device_output(1_000, 5_000))
        .with_component("host.h1", common::host_output("20"))
        .with_component("dev.h1.a1", common::device_output(1_000, 3_000));

    let failure = verifier()
        .verify(&two_host_experiment(), &bundle)
        .failure()
        .cloned()
        .unwrap();
    assert_eq!(failure.kind(), ErrorKind::MissingComponent);
    assert_eq!(failure.component(), Some("host.idle"));
}

fn dma_marker() -> EventPattern {
    EventPattern::new("dma_read", "DMA read", r"^DMA: issuing read of ([0-9]+) bytes")
        .unwrap()
        .integer("bytes", 1)
}

#[test]
fn test_required_device_marker_reported() {
    let verifier = Verifier::builder()
        .require(Side::Device, StreamKind::Stderr, dma_marker())
        .build()
        .unwrap();
    let bundle = ResultBundle::load(common::fixture("test0-1.json")).unwrap();

    let verdict = verifier.verify(&common::test0(), &bundle);
    assert!(verdict.passed(), "{:?}", verdict.failure());
    assert_eq!(verdict.metric("dma_read.bytes"), Some(Integer(512)));
}

#[test]
fn test_required_marker_missing_fails() {
    let never = EventPattern::new(
        "never_present",
        "NEVER_PRESENT marker",
        r"^NEVER_PRESENT ([0-9]+)",
    )
    .unwrap()
    .integer("value", 1);
    let verifier = Verifier::builder()
        .require(Side::Host, StreamKind::Stdout, never)
        .build()
        .unwrap();

    let verdict = verifier.verify(&common::test0(), &common::test0_bundle("8", START, END));
    let failure = verdict.failure().unwrap();
    assert_eq!(failure.kind(), ErrorKind::MissingOutput);
    assert_eq!(failure.pattern(), Some("never_present"));
    assert_eq!(failure.component(), Some("host.host"));
    assert!(failure.message().contains("NEVER_PRESENT marker"));
}

#[test]
fn test_required_marker_tag_clash_rejected() {
    let clash = EventPattern::new("done", "dup", "^DONE").unwrap();
    let result = Verifier::builder()
        .require(Side::Device, StreamKind::Stderr, clash)
        .build();
    assert!(result.is_err());
}

#[test]
fn test_no_waited_host_fails() {
    let experiment = Experiment::builder("background")
        .add_host(Host::builder("host").pcidev("accel").build())
        .add_device(Device::builder("accel").build())
        .build()
        .unwrap();
    let bundle = ResultBundle::new()
        .with_component(
            "host.host",
            ComponentOutput::new(Stream::from_text("segfault"), Stream::default()),
        )
        .with_component("dev.host.accel", ComponentOutput::default());

    let (verdict, states) = verifier().verify_traced(&experiment, &bundle);
    let failure = verdict.failure().unwrap();
    assert_eq!(failure.kind(), ErrorKind::Configuration);
    assert!(verdict.metrics().is_none());
    assert_eq!(
        states,
        vec![VerifierState::Init, VerifierState::Done { passed: false }]
    );
}

#[test]
fn test_large_counts_are_exact() {
    let cycles = 9_007_199_254_740_993_u64;
    let start = u64::MAX - 1_000;
    let bundle = common::test0_bundle(&cycles.to_string(), start, u64::MAX);

    let verdict = verifier().verify(
        &common::test0(),
        &common::test0_bundle(&cycles.to_string(), START, END),
    );
    assert_eq!(verdict.metric("cycles_per_op"), Some(Integer(cycles)));

    let ticks = verifier().verify(&common::test0(), &bundle);
    assert_eq!(ticks.metric("end_tick"), Some(Integer(u64::MAX)));
    assert_eq!(ticks.metric("start_tick"), Some(Integer(start)));
    assert_eq!(ticks.metric("elapsed_ticks"), Some(Integer(1_000)));
}

#[test]
fn test_report_follows_plan_order() {
    let experiment = Experiment::builder("order")
        .add_host(Host::builder("z").wait(true).pcidev("a0").build())
        .add_host(Host::builder("a").wait(true).pcidev("a1").build())
        .add_device(Device::builder("a0").build())
        .add_device(Device::builder("a1").build())
        .build()
        .unwrap();
    let bundle = ResultBundle::new()
        .with_component("host.z", common::host_output("10"))
        .with_component("dev.z.a0", common::device_output(1_000, 5_000))
        .with_component("host.a", common::host_output("20"))
        .with_component("dev.a.a1", common::device_output(1_000, 3_000));

    let verdict = verifier().verify(&experiment, &bundle);
    let text = Report::new(&verdict).to_string();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        [
            "[RESULT HOST]  10 Cycles/op",
            "[RESULT HOST]  20 Cycles/op (a)",
            "[RESULT SIM]   4.0 ns/op",
            "[RESULT SIM]   2.0 ns/op (a.a1)",
            "[PASS] order",
        ]
    );
}

#[test]
fn test_verdict_serializes() {
    let verdict = verifier().verify(&common::test0(), &common::test0_bundle("8", START, END));
    let json = serde_json::to_string(&verdict).unwrap();
    assert!(json.contains("sim_ns_per_op"));
    let back: hwaccel_harness::verify::Verdict = serde_json::from_str(&json).unwrap();
    assert_eq!(back, verdict);
}
