use crate::process::{Tally, convert_note, display_name, halts_run};
use crate::utils::{ExportConfig, plan_export, prepare_destination};
use eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::error;

/// Single-threaded conversion with a progress bar.
pub fn execute(config: ExportConfig) -> Result<()> {
    let Some(plan) = plan_export(&config)? else {
        return Ok(());
    };
    prepare_destination(&plan.dest_dir)?;

    let pb = if config.quiet {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(plan.files.len() as u64);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({percent}%)",
            )?
            .progress_chars("=>-"),
        );
        bar
    };

    let mut tally = Tally::default();
    for path in &plan.files {
        // Log lines are printed with the bar hidden so they don't tear it.
        let outcome = pb.suspend(|| convert_note(path, &plan.dest_dir));
        match outcome {
            Ok(result) => tally.record(result),
            Err(e) => {
                tally.errors += 1;
                if halts_run(&e, config.strict) {
                    pb.abandon();
                    return Err(e.wrap_err(format!("ERROR in {}", display_name(path))));
                }
                pb.suspend(|| error!("{}: {:#}", display_name(path), e));
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    tally.log_summary();
    Ok(())
}
