use crate::core::bcfstats::{SAMPLE_COLUMN, SECTION_SUMMARY, SECTION_TSTV, StatsTable, StatsTables};
use crate::core::error::VarStatsError;
use crate::core::model::SampleSummary;

/// Columns hidden when the SN table is shown for a single sample.
pub const SN_HIDDEN_COLUMNS: [&str; 2] = [SAMPLE_COLUMN, "samples"];
pub const TSTV_HIDDEN_COLUMNS: [&str; 1] = [SAMPLE_COLUMN];

/// Report wording: variants are SNVs/MNVs rather than SNPs/MNPs.
pub fn variant_column_name(name: &str) -> String {
    name.replace("SNP", "SNV").replace("MNP", "MNV")
}

/// At-a-glance numbers for one sample, `None` when it has no SN rows.
pub fn summarize_sample(
    tables: &StatsTables,
    sample: &str,
) -> Result<Option<SampleSummary>, VarStatsError> {
    let Some(sn) = tables.get(SECTION_SUMMARY).map(|t| t.for_sample(sample)) else {
        return Ok(None);
    };
    if sn.is_empty() {
        return Ok(None);
    }
    let ts_tv = tables
        .get(SECTION_TSTV)
        .map(|t| t.for_sample(sample))
        .and_then(|t| t.value(0, "ts/tv").map(|v| v.to_string()))
        .filter(|v| !v.is_empty());
    Ok(Some(SampleSummary {
        sample: sample.to_string(),
        records: first_count(&sn, "records")?,
        snvs: first_count(&sn, "SNPs")?,
        indels: first_count(&sn, "indels")?,
        ts_tv,
    }))
}

pub fn display_sn_table(tables: &StatsTables, sample: &str) -> Option<StatsTable> {
    let t = tables.get(SECTION_SUMMARY)?.for_sample(sample);
    if t.is_empty() {
        return None;
    }
    Some(
        t.without_columns(&SN_HIDDEN_COLUMNS)
            .with_renamed_columns(variant_column_name),
    )
}

pub fn display_tstv_table(tables: &StatsTables, sample: &str) -> Option<StatsTable> {
    let t = tables.get(SECTION_TSTV)?.for_sample(sample);
    if t.is_empty() {
        return None;
    }
    Some(t.without_columns(&TSTV_HIDDEN_COLUMNS))
}

fn first_count(sn: &StatsTable, column: &str) -> Result<Option<u64>, VarStatsError> {
    match sn.value(0, column) {
        None => Ok(None),
        // a column only another input had
        Some(v) if v.trim().is_empty() => Ok(None),
        Some(v) => v.trim().parse::<u64>().map(Some).map_err(|_| {
            VarStatsError::malformed(
                SECTION_SUMMARY,
                format!("{} value {:?} is not a count", column, v),
            )
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bcfstats::{self, tests::STATS};

    #[test]
    fn picks_first_rows_of_the_sample() {
        let tables = bcfstats::parse(STATS.as_bytes(), "HG002").unwrap();
        let s = summarize_sample(&tables, "HG002").unwrap().unwrap();
        assert_eq!(s.records, Some(1234));
        assert_eq!(s.snvs, Some(1000));
        assert_eq!(s.indels, Some(234));
        assert_eq!(s.ts_tv.as_deref(), Some("2.12"));
    }

    #[test]
    fn unknown_sample_or_empty_file_has_no_summary() {
        let tables = bcfstats::parse(STATS.as_bytes(), "HG002").unwrap();
        assert_eq!(summarize_sample(&tables, "other").unwrap(), None);
        let empty = bcfstats::parse(b"", "HG002").unwrap();
        assert_eq!(summarize_sample(&empty, "HG002").unwrap(), None);
        assert!(display_sn_table(&empty, "HG002").is_none());
    }

    #[test]
    fn display_tables_hide_sample_columns_and_rename() {
        let tables = bcfstats::parse(STATS.as_bytes(), "HG002").unwrap();
        let sn = display_sn_table(&tables, "HG002").unwrap();
        assert_eq!(sn.columns()[0], "id");
        assert!(sn.columns().iter().any(|c| c == "SNVs"));
        assert!(sn.columns().iter().any(|c| c == "multiallelic SNV sites"));
        assert!(sn.columns().iter().all(|c| c != "samples" && c != "sample"));
        let tstv = display_tstv_table(&tables, "HG002").unwrap();
        assert_eq!(tstv.columns()[0], "id");
        assert_eq!(tstv.value(0, "ts/tv"), Some("2.12"));
    }

    #[test]
    fn bad_count_is_malformed() {
        let input = "# SN\t[2]id\t[3]key\t[4]value\nSN\t0\tnumber of records:\tlots\n";
        let tables = bcfstats::parse(input.as_bytes(), "s").unwrap();
        assert!(summarize_sample(&tables, "s").is_err());
    }
}
