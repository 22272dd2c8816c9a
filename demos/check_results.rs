//! Check a captured run of the single-host accelerator experiment
//!
//! Builds the `test0` topology (one timing-CPU host driving one
//! synchronized accelerator), loads a results document, verifies it and
//! prints the report.
//!
//! Run with: cargo run --example check_results -- [results.json]
//!
//! Set `RUST_LOG=hwaccel_harness=debug` to trace marker lookups and
//! verifier transitions.

use std::process::ExitCode;

use hwaccel_harness::bundle::ResultBundle;
use hwaccel_harness::report::print_report;
use hwaccel_harness::topology::{Application, Device, Experiment, Host};
use hwaccel_harness::verify::Verifier;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_RESULTS: &str = "tests/fixtures/test0-1.json";

fn main() -> anyhow::Result<ExitCode> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    println!("=== hwaccel-harness: test0 ===\n");

    let experiment = Experiment::builder("test0")
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
        .build()?;

    println!("Topology:");
    for attachment in experiment.attachments() {
        println!(
            "  {} ({}, {}) -> {}",
            attachment.host.alias(),
            attachment.host.cpu_type(),
            attachment.host.cpu_freq(),
            attachment.device.alias()
        );
    }
    for warning in experiment.warnings() {
        println!("  warning: {warning}");
    }

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_RESULTS.to_string());
    let bundle = ResultBundle::load(&path)?;
    println!("\nResults: {path} ({} components)", bundle.len());
    if let Some(wall) = bundle.wall_time() {
        println!("Wall time: {}ms", wall.num_milliseconds());
    }
    println!();

    let verdict = Verifier::new()?.verify(&experiment, &bundle);
    print_report(&verdict)?;

    Ok(if verdict.passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
