use clap::Parser;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use tabular::{Row, Table};
use tracing::warn;
use tracing_subscriber::EnvFilter;
use zgc_log_parser::gclog::event::EventType;
use zgc_log_parser::gclog::{Collector, GcLogParser, GcModel};
use zgc_log_parser::time::Uptime;
use zgc_log_parser::types::GcId;

#[derive(Parser, Debug, Clone)]
#[clap(name = "gclog example", version, about = "Summarize a ZGC unified log file", long_about = None)]
pub struct Opts {
    /// Collector that produced the log, 'zgc' or 'genzgc'
    #[clap(long, short = 'c', default_value = "genzgc")]
    pub collector: Collector,

    /// Print every cycle with its phases
    #[clap(long)]
    pub cycles: bool,

    /// Path to the log file
    #[clap(value_parser)]
    pub path: PathBuf,
}

fn main() {
    match do_main() {
        Ok(()) => (),
        Err(e) => {
            eprintln!("{e}");
            let mut cause = e.source();
            while let Some(err) = cause {
                eprintln!("Caused by: {err}");
                cause = err.source();
            }
            std::process::exit(exitcode::SOFTWARE);
        }
    }
}

fn do_main() -> Result<(), Box<dyn std::error::Error>> {
    let opts = Opts::parse();

    reset_signal_pipe_handler()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let f = File::open(&opts.path)?;
    let r = BufReader::new(f);

    let mut parser = GcLogParser::new(opts.collector);
    for (line_number, line) in r.lines().enumerate() {
        let line = line?;
        match split_line(&line) {
            Some((uptime, gc_id, detail)) => parser.parse_line(uptime, gc_id, detail)?,
            None => warn!(line_number, "Line without an uptime decoration"),
        }
    }
    let model = parser.finish();

    if opts.cycles {
        print_cycles(&model);
    }
    print_summary(&model);

    Ok(())
}

/// Splits `[1.234s][info][gc,phases] GC(3) <detail>` into its uptime,
/// cycle id and detail text. Leading spaces of the detail are significant.
fn split_line(line: &str) -> Option<(Uptime, Option<GcId>, &str)> {
    let mut uptime = None;
    let mut rest = line;
    while let Some(decoration) = rest.strip_prefix('[') {
        let end = decoration.find(']')?;
        let value = &decoration[..end];
        if uptime.is_none() {
            uptime = value
                .strip_suffix('s')
                .and_then(|s| s.parse::<f64>().ok())
                .map(Uptime::from_secs);
        }
        rest = &decoration[end + 1..];
    }
    let rest = rest.strip_prefix(' ').unwrap_or(rest);

    let gc_id = rest
        .strip_prefix("GC(")
        .and_then(|s| s.split_once(')'))
        .and_then(|(id, detail)| Some((id.parse::<u32>().ok()?, detail)));
    match gc_id {
        Some((id, detail)) => Some((
            uptime?,
            Some(GcId::from(id)),
            detail.strip_prefix(' ').unwrap_or(detail),
        )),
        None => Some((uptime?, None, rest)),
    }
}

fn print_cycles(model: &GcModel) {
    for cycle_type in model.registry().parents() {
        for index in model.cycle_indices(*cycle_type) {
            let cycle = &model[*index];
            println!("{cycle}");
            for phase in model.phases(*index) {
                println!("    {phase}");
            }
        }
    }
    println!("----------------------------");
}

fn print_summary(model: &GcModel) {
    let mut table = Table::new("{:<}  {:>}  {:>}  {:>}");
    table.add_row(
        Row::new()
            .with_cell("EVENT TYPE")
            .with_cell("COUNT")
            .with_cell("TOTAL (ms)")
            .with_cell("MAX (ms)"),
    );
    for event_type in model.registry().all() {
        let durations: Vec<f64> = match event_type {
            EventType::AllocationStall => model
                .allocation_stalls()
                .iter()
                .filter_map(|e| e.duration.map(|d| d.as_millis()))
                .collect(),
            EventType::OutOfMemory => model.ooms().iter().map(|_| 0.0).collect(),
            _ => model
                .events_of_type(*event_type)
                .map(|e| e.duration().map(|d| d.as_millis()).unwrap_or(0.0))
                .collect(),
        };
        if durations.is_empty() {
            continue;
        }
        table.add_row(
            Row::new()
                .with_cell(event_type)
                .with_cell(durations.len())
                .with_cell(format!("{:.3}", durations.iter().sum::<f64>()))
                .with_cell(format!("{:.3}", durations.iter().copied().fold(0.0, f64::max))),
        );
    }
    print!("{table}");

    println!("----------------------------");
    println!("  Collector : {}", model.collector());
    if let (Some(start), Some(end)) = (model.start_time(), model.end_time()) {
        println!("  Uptime : {start} .. {end}");
    }
    println!(
        "  Total pause time : {:.3} ms",
        model.total_pause_duration().as_millis()
    );
    println!("  Statistics samples : {}", model.statistics().len());
    println!("----------------------------");
}

// Used to prevent panics on broken pipes.
// See:
//   https://github.com/rust-lang/rust/issues/46016#issuecomment-605624865
fn reset_signal_pipe_handler() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(target_family = "unix")]
    {
        use nix::sys::signal;

        unsafe {
            signal::signal(signal::Signal::SIGPIPE, signal::SigHandler::SigDfl)?;
        }
    }

    Ok(())
}
