/// Pin to a cpu, calibrate the invariant TSC from MSR_PLATFORM_INFO, then run a
/// simple timing loop to see if we're close to reality.
///
/// Needs root (or CAP_SYS_RAWIO) and the msr module loaded.
///
/// Run with: sudo cargo run --release --example tsc_report -- 47 [--json]

use std::process::ExitCode;
use std::time::Duration;

use serde::Serialize;
use simple_logger::SimpleLogger;
use tscclock::{try_read_timestamp, TscCalibration};

const SLEEP: Duration = Duration::from_millis(500);

#[derive(Serialize)]
struct Report {
    calibration: TscCalibration,
    expected_nanos: u64,
    cycles: u64,
    nanos: u64,
}

fn pin_to_cpu(cpu: u32) -> std::io::Result<()> {
    // SAFETY: cpu_set_t is plain data and sched_setaffinity only reads it
    unsafe {
        let mut set: libc::cpu_set_t = std::mem::zeroed();
        libc::CPU_SET(cpu as usize, &mut set);
        if libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set) != 0 {
            return Err(std::io::Error::last_os_error());
        }
    }
    Ok(())
}

fn run(cpu: u32, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    // Ideally an isolated cpu
    pin_to_cpu(cpu).map_err(|e| format!("failed to set affinity to cpu {}: {}", cpu, e))?;

    let calibration = TscCalibration::calibrate(cpu)?;

    let start = try_read_timestamp(cpu)?;
    std::thread::sleep(SLEEP);
    let end = try_read_timestamp(cpu)?;

    let cycles = end.checked_sub(start).ok_or("timestamp went backwards")?;
    let report = Report {
        calibration,
        expected_nanos: SLEEP.as_nanos() as u64,
        cycles,
        nanos: calibration.cycles_to_nanos(cycles),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "{} ({}) invariant TSC runs at {} kHz, scale factor {}",
            report.calibration.microarchitecture.name(),
            report.calibration.family_model,
            report.calibration.frequency_khz,
            report.calibration.scale_factor
        );
        println!(
            "Expected to sleep for {} nanos, actually slept for {} cycles, {} nanos",
            report.expected_nanos, report.cycles, report.nanos
        );
    }

    Ok(())
}

fn main() -> ExitCode {
    SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .env()
        .init()
        .expect("logger already set");

    let mut args = std::env::args().skip(1);
    let Some(cpu) = args.next().and_then(|arg| arg.parse::<u32>().ok()) else {
        eprintln!("usage: tsc_report <cpu> [--json]");
        eprintln!("e.g. tsc_report 47");
        eprintln!("will pin to cpu47 and then run a simple timing loop to test tsc and cpu family ident");
        return ExitCode::FAILURE;
    };
    let json = args.any(|arg| arg == "--json");

    match run(cpu, json) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
