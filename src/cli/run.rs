use crate::cli::args::{Cli, Commands, ReportArgs};
use crate::core::engine::{self, RunConfig, StatsInput};
use crate::report;
use anyhow::{Context, Result, bail};
use clap::Parser;
use std::fs;
use std::path::Path;
use std::sync::Once;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_SAMPLE: &str = "Sample";

static TRACING_INIT: Once = Once::new();

pub fn entry() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Report(args) => run(args),
    }
}

fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    });
}

fn run(args: ReportArgs) -> Result<()> {
    let t0 = Instant::now();

    stage("preflight", || {
        for path in &args.vcf_stats {
            if !path.is_file() {
                bail!("File {} not found.", path.display());
            }
        }
        if args.sample_name.len() > args.vcf_stats.len() {
            bail!(
                "got {} --sample-name values for {} --vcf-stats inputs",
                args.sample_name.len(),
                args.vcf_stats.len()
            );
        }
        if let Some(dir) = &args.versions {
            if !dir.is_dir() {
                bail!("versions directory {} not found.", dir.display());
            }
        }
        if let Some(path) = &args.params {
            if !path.is_file() {
                bail!("File {} not found.", path.display());
            }
        }
        Ok(())
    })?;

    let t_names = Instant::now();
    let names = sample_names(&args.sample_name, args.vcf_stats.len())?;
    stage_done("sample-names", t_names);

    let config = RunConfig {
        inputs: args
            .vcf_stats
            .iter()
            .cloned()
            .zip(names)
            .map(|(path, sample_name)| StatsInput { path, sample_name })
            .collect(),
        versions: args.versions.clone(),
        params: args.params.clone(),
    };

    let t_engine = Instant::now();
    let output = engine::run(&config)?;
    stage_done("engine", t_engine);

    if let Some(parent) = args.report.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output dir {}", parent.display()))?;
    }
    let t_html = Instant::now();
    report::html::write(&args.report, &output)
        .with_context(|| format!("failed to write {}", args.report.display()))?;
    stage_done("html", t_html);
    info!("Written report to '{}'.", args.report.display());

    if let Some(dir) = &args.export_figures {
        let t_fig = Instant::now();
        let stem = bundle_stem(&output.samples, &args.report);
        let bundle = report::figures::write(dir, &output, &stem)
            .with_context(|| "failed to export figures")?;
        stage_done("figures", t_fig);
        info!("Written figures bundle to '{}'.", bundle.display());
    }

    debug!(total = %fmt_dur(t0.elapsed()), "done");
    Ok(())
}

/// Pairs names with inputs positionally; unnamed inputs get a default.
fn sample_names(given: &[String], inputs: usize) -> Result<Vec<String>> {
    let names: Vec<String> = (0..inputs)
        .map(|i| match given.get(i) {
            Some(name) => name.clone(),
            None if inputs == 1 => DEFAULT_SAMPLE.to_string(),
            None => format!("{}{}", DEFAULT_SAMPLE, i + 1),
        })
        .collect();
    let mut seen = names.clone();
    seen.sort();
    if let Some(dup) = seen.windows(2).find(|w| w[0] == w[1]) {
        bail!("sample name {:?} is used for more than one input", dup[0]);
    }
    Ok(names)
}

/// Bundle name: the sample for a single-sample run, the report stem otherwise.
fn bundle_stem(samples: &[String], report: &Path) -> String {
    match samples {
        [only] => only.clone(),
        _ => report
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("report")
            .to_string(),
    }
}

fn stage<F>(name: &str, f: F) -> Result<()>
where
    F: FnOnce() -> Result<()>,
{
    let t = Instant::now();
    let res = f();
    debug!(stage = name, time = %fmt_dur(t.elapsed()), "stage finished");
    res
}

fn stage_done(name: &str, t: Instant) {
    debug!(stage = name, time = %fmt_dur(t.elapsed()), "stage finished");
}

fn fmt_dur(d: Duration) -> String {
    if d.as_secs_f64() < 1.0 {
        format!("{}ms", d.as_millis())
    } else {
        format!("{:.3}s", d.as_secs_f64())
    }
}
