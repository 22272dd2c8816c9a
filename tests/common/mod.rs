//! Shared helpers for integration tests

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Once;

use hwaccel_harness::bundle::{ComponentOutput, ResultBundle, Stream};
use hwaccel_harness::topology::{Application, Device, Experiment, Host};

static INIT_LOGGING: Once = Once::new();

/// Route `tracing` output through the test harness writer.
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .with_target(true)
            .with_ansi(false)
            .try_init();
    });
}

/// Path of a file under `tests/fixtures`.
pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// One timing-CPU host driving one synchronized accelerator.
pub fn test0() -> Experiment {
    Experiment::builder("test0")
        .checkpoint(true)
        .add_host(
            Host::builder("host")
                .cpu_type("TimingSimpleCPU")
                .cpu_freq("1GHz")
                .sync_period(100)
                .pci_latency(100)
                .wait(true)
                .app(Application::new("AccelApp").arg(8))
                .pcidev("accel")
                .build(),
        )
        .add_device(
            Device::builder("accel")
                .sync(true)
                .sync_interval(100)
                .pci_latency(100)
                .build(),
        )
        .build()
        .unwrap()
}

/// Host stdout reporting `cycles` per operation.
pub fn host_output(cycles: &str) -> ComponentOutput {
    ComponentOutput::new(
        Stream::from_text(&format!(
            "AccelApp: starting offload\nCycles per operation: {cycles}\nAccelApp: done"
        )),
        Stream::default(),
    )
}

/// Device stderr with a start marker at `start` and completion at `end`.
pub fn device_output(start: u64, end: u64) -> ComponentOutput {
    ComponentOutput::new(
        Stream::default(),
        Stream::from_text(&format!(
            "sync_pci: connected to host\n\
             MMIO Write: ctrl 1 ex_time={} main={start}\n\
             DONE  main={end}",
            start.saturating_add(5000)
        )),
    )
}

/// Bundle for `test0` with the given host report and device markers.
pub fn test0_bundle(cycles: &str, start: u64, end: u64) -> ResultBundle {
    ResultBundle::new()
        .with_exp_name("test0")
        .with_component("host.host", host_output(cycles))
        .with_component("dev.host.accel", device_output(start, end))
}
