use crate::process::{Tally, convert_note, display_name, halts_run};
use crate::utils::{ExportConfig, ExportPlan, plan_export, prepare_destination};
use crossbeam_channel::{Receiver, SendTimeoutError, bounded};
use eyre::{Context, Result, eyre};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::error;

pub fn execute(config: ExportConfig) -> Result<()> {
    let Some(plan) = plan_export(&config)? else {
        return Ok(());
    };
    prepare_destination(&plan.dest_dir)?;

    let tally = run_pipeline(&plan, &config)?;
    tally.log_summary();
    Ok(())
}

fn run_pipeline(plan: &ExportPlan, config: &ExportConfig) -> Result<Tally> {
    let (tx, rx) = bounded::<PathBuf>(64);
    let should_stop = AtomicBool::new(false);
    let n_workers = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(8)
        .min(plan.files.len())
        .max(1);

    let tallies = std::thread::scope(|s| {
        let handles: Vec<_> = (0..n_workers)
            .map(|_| {
                let rx = rx.clone();
                let (plan, config, should_stop) = (plan, config, &should_stop);
                s.spawn(move || worker(rx, plan, config, should_stop))
            })
            .collect();

        drop(rx);

        'outer: for path in &plan.files {
            if should_stop.load(Ordering::Relaxed) {
                break;
            }
            let mut pending = path.clone();
            loop {
                match tx.send_timeout(pending, Duration::from_millis(50)) {
                    Ok(()) => break,
                    Err(SendTimeoutError::Disconnected(_)) => break 'outer,
                    Err(SendTimeoutError::Timeout(p)) => {
                        pending = p;
                        if should_stop.load(Ordering::Relaxed) {
                            break 'outer;
                        }
                    }
                }
            }
        }

        drop(tx);

        handles
            .into_iter()
            .map(|h| {
                h.join()
                    .unwrap_or_else(|_| Err(eyre!("Conversion worker panicked")))
            })
            .collect::<Result<Vec<Tally>>>()
    })
    .wrap_err("Conversion halted")?;

    Ok(tallies.into_iter().fold(Tally::default(), Tally::merge))
}

fn worker(
    rx: Receiver<PathBuf>,
    plan: &ExportPlan,
    config: &ExportConfig,
    should_stop: &AtomicBool,
) -> Result<Tally> {
    let mut tally = Tally::default();
    while let Ok(path) = rx.recv() {
        if should_stop.load(Ordering::Relaxed) {
            break;
        }
        match convert_note(&path, &plan.dest_dir) {
            Ok(result) => tally.record(result),
            Err(e) => {
                tally.errors += 1;
                if halts_run(&e, config.strict) {
                    should_stop.store(true, Ordering::Relaxed);
                    return Err(e.wrap_err(format!("ERROR in {}", display_name(&path))));
                }
                error!("{}: {:#}", display_name(&path), e);
            }
        }
    }
    Ok(tally)
}
