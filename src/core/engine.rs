use crate::core::bcfstats::{self, SECTION_INDELS, SECTION_SUBSTITUTIONS, StatsTables};
use crate::core::io::{InputKind, StatsSource};
use crate::core::meta::{self, SoftwareVersion};
use crate::core::metrics::summary::summarize_sample;
use crate::core::metrics::{
    IndelLengthProfile, SubstitutionMatrix, aggregate_changes, aggregate_indel_sizes,
    indel_records, substitution_records,
};
use crate::core::model::SampleSummary;
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{debug, info, warn};

#[derive(Clone, Debug)]
pub struct StatsInput {
    pub path: PathBuf,
    pub sample_name: String,
}

#[derive(Clone, Debug)]
pub struct RunConfig {
    pub inputs: Vec<StatsInput>,
    pub versions: Option<PathBuf>,
    pub params: Option<PathBuf>,
}

/// Outcome of one report section that depends on optional data.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Section<T> {
    /// No source rows; the report shows a placeholder.
    Empty,
    Ready(T),
    /// Aggregation rejected the data; the message is shown in place of the chart.
    Failed(String),
}

pub struct RunOutput {
    pub samples: Vec<String>,
    pub tables: StatsTables,
    pub summaries: Vec<(String, Option<SampleSummary>)>,
    pub changes: Section<SubstitutionMatrix>,
    pub indels: Section<IndelLengthProfile>,
    pub versions: Vec<SoftwareVersion>,
    pub params: Vec<(String, String)>,
}

pub fn run(config: &RunConfig) -> Result<RunOutput> {
    let mut tables = StatsTables::default();
    for input in &config.inputs {
        let (source, kind) = StatsSource::open(&input.path)?;
        debug!(
            path = %input.path.display(),
            bytes = source.bytes().len(),
            gzip = kind == InputKind::Gzip,
            "loaded stats file"
        );
        let parsed = bcfstats::parse(source.bytes(), &input.sample_name)
            .with_context(|| format!("failed to parse {}", input.path.display()))?;
        if parsed.is_empty() {
            warn!(path = %input.path.display(), "stats file has no data rows");
        }
        tables.merge(parsed);
    }

    let samples: Vec<String> = config
        .inputs
        .iter()
        .map(|i| i.sample_name.clone())
        .collect();

    let mut summaries = Vec::with_capacity(samples.len());
    for sample in &samples {
        let summary = summarize_sample(&tables, sample)
            .with_context(|| format!("failed to summarise sample {}", sample))?;
        summaries.push((sample.clone(), summary));
    }

    let changes = substitution_section(&tables);
    let indels = indel_section(&tables);

    let versions = match &config.versions {
        Some(dir) => meta::load_versions(dir)?,
        None => Vec::new(),
    };
    let params = match &config.params {
        Some(path) => meta::load_params(path)?,
        None => Vec::new(),
    };

    info!(
        samples = samples.len(),
        sections = tables.sections().count(),
        "aggregated variant statistics"
    );

    Ok(RunOutput {
        samples,
        tables,
        summaries,
        changes,
        indels,
        versions,
        params,
    })
}

/// An absent or empty `ST` table still aggregates, to an empty matrix.
pub fn substitution_section(tables: &StatsTables) -> Section<SubstitutionMatrix> {
    let records = match tables.get(SECTION_SUBSTITUTIONS) {
        Some(t) => substitution_records(t),
        None => Ok(Vec::new()),
    };
    match records.and_then(|r| aggregate_changes(&r)) {
        Ok(m) if m.is_empty() => Section::Empty,
        Ok(m) => Section::Ready(m),
        Err(e) => {
            warn!(error = %e, "substitution types section skipped");
            Section::Failed(e.to_string())
        }
    }
}

/// The size aggregator rejects empty input, so emptiness is checked first.
pub fn indel_section(tables: &StatsTables) -> Section<IndelLengthProfile> {
    let Some(table) = tables.get(SECTION_INDELS).filter(|t| !t.is_empty()) else {
        return Section::Empty;
    };
    match indel_records(table).and_then(|r| aggregate_indel_sizes(&r)) {
        Ok(p) => Section::Ready(p),
        Err(e) => {
            warn!(error = %e, "indel length section skipped");
            Section::Failed(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bcfstats::tests::STATS;
    use std::fs;

    fn config(dir: &std::path::Path, files: &[(&str, &str)]) -> RunConfig {
        let inputs = files
            .iter()
            .map(|(name, content)| {
                let path = dir.join(format!("{}.stats", name));
                fs::write(&path, content).unwrap();
                StatsInput {
                    path,
                    sample_name: name.to_string(),
                }
            })
            .collect();
        RunConfig {
            inputs,
            versions: None,
            params: None,
        }
    }

    #[test]
    fn full_stats_produce_every_section() {
        let dir = tempfile::tempdir().unwrap();
        let out = run(&config(dir.path(), &[("HG002", STATS)])).unwrap();
        assert_eq!(out.samples, vec!["HG002"]);
        assert!(out.summaries[0].1.is_some());
        assert!(matches!(out.changes, Section::Ready(ref m) if m.total() == 1000));
        assert!(matches!(out.indels, Section::Ready(ref p) if p.total() == 234));
    }

    #[test]
    fn empty_file_gives_empty_sections() {
        let dir = tempfile::tempdir().unwrap();
        let out = run(&config(dir.path(), &[("S", "")])).unwrap();
        assert_eq!(out.summaries, vec![("S".to_string(), None)]);
        assert_eq!(out.changes, Section::Empty);
        assert_eq!(out.indels, Section::Empty);
    }

    #[test]
    fn multiple_samples_are_aggregated_together() {
        let dir = tempfile::tempdir().unwrap();
        let out = run(&config(dir.path(), &[("A", STATS), ("B", STATS)])).unwrap();
        assert_eq!(out.summaries.len(), 2);
        assert!(matches!(out.changes, Section::Ready(ref m) if m.total() == 2000));
        assert!(matches!(out.indels, Section::Ready(ref p) if p.total() == 468));
    }

    #[test]
    fn inputs_from_different_bcftools_versions_merge() {
        let dir = tempfile::tempdir().unwrap();
        let older = STATS
            .replace("\t[5]number of genotypes\t[6]mean VAF", "")
            .replace("\t10\t.\n", "\n")
            .replace("\t100\t.\n", "\n")
            .replace("\t90\t.\n", "\n")
            .replace("\t34\t.\n", "\n")
            .replace("SN\t0\tnumber of no-ALTs:\t0\n", "");
        let out = run(&config(dir.path(), &[("new", STATS), ("old", &older)])).unwrap();
        assert!(matches!(out.indels, Section::Ready(ref p) if p.total() == 468));
        let old = out.summaries[1].1.as_ref().unwrap();
        assert_eq!(old.records, Some(1234));
        assert_eq!(
            out.tables.get(SECTION_INDELS).unwrap().value(4, "mean VAF"),
            Some("")
        );
    }

    #[test]
    fn bad_substitution_code_fails_only_its_section() {
        let dir = tempfile::tempdir().unwrap();
        let stats = STATS.replace("ST\t0\tA>C\t40", "ST\t0\tA>N\t40");
        let out = run(&config(dir.path(), &[("S", &stats)])).unwrap();
        assert!(matches!(out.changes, Section::Failed(ref msg) if msg.contains("A>N")));
        assert!(matches!(out.indels, Section::Ready(_)));
    }

    #[test]
    fn missing_file_is_an_error() {
        let cfg = RunConfig {
            inputs: vec![StatsInput {
                path: PathBuf::from("/nonexistent/calls.stats"),
                sample_name: "S".to_string(),
            }],
            versions: None,
            params: None,
        };
        assert!(run(&cfg).is_err());
    }
}
