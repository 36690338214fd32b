//! Batch conversion with a progress bar, Ctrl-C handling and an optional report.

use std::fs::File;
use std::io::BufWriter;
use std::sync::Arc;
use std::time::{Duration, Instant};

use console::style;
use shrink_core::{
    BatchEvent, BatchRunner, BatchStats, CancelFlag, Config, ConversionPipeline, InputFile,
    OutputWriter,
};

use super::ConvertArgs;

type ReportWriter = OutputWriter<BufWriter<File>>;

/// Run the batch to completion (or until Ctrl-C) and print a summary.
pub async fn run_batch(
    config: &Config,
    args: &ConvertArgs,
    files: Vec<InputFile>,
) -> anyhow::Result<BatchStats> {
    let mut report = open_report(args)?;

    let pipeline = Arc::new(ConversionPipeline::new(config));
    let runner = Arc::new(BatchRunner::new(pipeline, config));
    let cancel = CancelFlag::new();

    // First Ctrl-C stops new files from starting
    let flag = cancel.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted: finishing files already in progress");
            flag.cancel();
        }
    });

    let progress = create_progress_bar(files.len() as u64)?;
    let start_time = Instant::now();
    let mut handle = runner.spawn(files, cancel);

    while let Some(event) = handle.events.recv().await {
        let BatchEvent::Processed {
            report: record,
            stats,
            ..
        } = event
        else {
            continue;
        };

        progress.inc(1);
        progress.set_message(format!("{:.1} KB saved", stats.saved_kb()));

        if let Some(writer) = report.as_mut() {
            if let Err(e) = writer.write_report(&record) {
                tracing::warn!("Failed to write report, disabling it: {e}");
                report = None;
            }
        }
    }

    let result = handle.join().await;
    interrupt.abort();
    progress.finish_and_clear();

    let stats = match result {
        Ok(stats) => stats,
        Err(e) => anyhow::bail!(
            "{e}\n\n  Hint: pass a writable directory with --output-dir or set [output] dir."
        ),
    };

    if let (Some(mut writer), Some(path)) = (report, args.report.as_ref()) {
        writer.finish(&stats)?;
        tracing::info!("Report written to {:?}", path);
    }

    print_summary(&stats, start_time.elapsed(), config);
    Ok(stats)
}

fn open_report(args: &ConvertArgs) -> anyhow::Result<Option<ReportWriter>> {
    let Some(path) = &args.report else {
        return Ok(None);
    };
    let file = File::create(path)
        .map_err(|e| anyhow::anyhow!("Cannot create report file {:?}: {e}", path))?;
    Ok(Some(OutputWriter::new(
        BufWriter::new(file),
        args.format.into(),
        true,
    )))
}

/// Create a progress bar for batch processing.
fn create_progress_bar(total: u64) -> anyhow::Result<indicatif::ProgressBar> {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
            )?
            .progress_chars("##-"),
    );
    pb.set_message("starting...");
    Ok(pb)
}

/// Print a formatted summary table after the batch.
fn print_summary(stats: &BatchStats, elapsed: Duration, config: &Config) {
    let rate = if elapsed.as_secs_f64() > 0.0 {
        stats.total as f64 / elapsed.as_secs_f64()
    } else {
        0.0
    };

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!(
        "    Converted:    {:>8}",
        style(stats.succeeded).for_stderr().green()
    );
    if stats.skipped > 0 {
        eprintln!("    Skipped:      {:>8}", stats.skipped);
    }
    if stats.failed > 0 {
        eprintln!(
            "    Failed:       {:>8}",
            style(stats.failed).for_stderr().red()
        );
    }
    if stats.was_cancelled() {
        eprintln!(
            "    Not started:  {:>8}",
            style(stats.not_started).for_stderr().yellow()
        );
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>8}", stats.total);
    eprintln!("    Saved:        {:>8.1} KB", stats.saved_kb());
    eprintln!("    Duration:     {:>7.1}s", elapsed.as_secs_f64());
    eprintln!("    Rate:         {:>7.1} img/sec", rate);
    eprintln!("  ====================================");
    eprintln!("    Output:  {}", config.output_dir().display());
    eprintln!("    Log:     {}", config.log_path().display());
}
