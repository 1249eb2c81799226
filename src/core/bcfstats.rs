//! Reader for `bcftools stats` text output.
//!
//! Every section is kept as a string table so that the report can show it
//! verbatim; typed access happens in the metrics modules.

use crate::core::error::VarStatsError;
use crate::core::io::lines;
use std::collections::BTreeMap;
use tracing::debug;

pub const SAMPLE_COLUMN: &str = "sample";

pub const SECTION_SUMMARY: &str = "SN";
pub const SECTION_TSTV: &str = "TSTV";
pub const SECTION_SUBSTITUTIONS: &str = "ST";
pub const SECTION_INDELS: &str = "IDD";

/// Sections whose rows feed the report; field-count mismatches there are errors.
const CONSUMED_SECTIONS: [&str; 4] = [
    SECTION_SUMMARY,
    SECTION_TSTV,
    SECTION_SUBSTITUTIONS,
    SECTION_INDELS,
];

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StatsTable {
    section: String,
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl StatsTable {
    pub fn new(section: &str, columns: Vec<String>) -> Self {
        Self {
            section: section.to_string(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn section(&self) -> &str {
        &self.section
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize, VarStatsError> {
        self.column_index(name).ok_or_else(|| {
            VarStatsError::malformed(&self.section, format!("missing column {:?}", name))
        })
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx)).map(|s| s.as_str())
    }

    pub fn push_row(&mut self, row: Vec<String>) -> Result<(), VarStatsError> {
        if row.len() != self.columns.len() {
            return Err(VarStatsError::malformed(
                &self.section,
                format!(
                    "expected {} fields, found {}",
                    self.columns.len(),
                    row.len()
                ),
            ));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Appends the rows of another table. Columns are unioned in order of
    /// first appearance; cells a table never had are left empty.
    pub fn append(&mut self, other: StatsTable) {
        if self.columns.is_empty() && self.rows.is_empty() {
            *self = other;
            return;
        }
        for column in &other.columns {
            if self.column_index(column).is_none() {
                self.columns.push(column.clone());
                for row in &mut self.rows {
                    row.push(String::new());
                }
            }
        }
        let layout: Vec<Option<usize>> = self
            .columns
            .iter()
            .map(|c| other.column_index(c))
            .collect();
        for mut row in other.rows {
            let aligned = layout
                .iter()
                .map(|idx| match idx {
                    Some(i) => std::mem::take(&mut row[*i]),
                    None => String::new(),
                })
                .collect();
            self.rows.push(aligned);
        }
    }

    pub fn for_sample(&self, sample: &str) -> StatsTable {
        let mut out = StatsTable::new(&self.section, self.columns.clone());
        if let Some(idx) = self.column_index(SAMPLE_COLUMN) {
            out.rows = self
                .rows
                .iter()
                .filter(|r| r[idx] == sample)
                .cloned()
                .collect();
        }
        out
    }

    pub fn without_columns(&self, drop: &[&str]) -> StatsTable {
        let keep: Vec<usize> = (0..self.columns.len())
            .filter(|&i| !drop.contains(&self.columns[i].as_str()))
            .collect();
        StatsTable {
            section: self.section.clone(),
            columns: keep.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|r| keep.iter().map(|&i| r[i].clone()).collect())
                .collect(),
        }
    }

    pub fn with_renamed_columns<F>(mut self, rename: F) -> StatsTable
    where
        F: Fn(&str) -> String,
    {
        self.columns = self.columns.iter().map(|c| rename(c)).collect();
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct StatsTables {
    tables: BTreeMap<String, StatsTable>,
}

impl StatsTables {
    pub fn get(&self, section: &str) -> Option<&StatsTable> {
        self.tables.get(section)
    }

    pub fn is_section_empty(&self, section: &str) -> bool {
        self.get(section).is_none_or(|t| t.is_empty())
    }

    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(|s| s.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.tables.values().all(|t| t.is_empty())
    }

    pub fn merge(&mut self, other: StatsTables) {
        for (code, table) in other.tables {
            match self.tables.get_mut(&code) {
                Some(existing) => existing.append(table),
                None => {
                    self.tables.insert(code, table);
                }
            }
        }
    }
}

/// Parses one stats file, tagging every row with `sample`.
pub fn parse(bytes: &[u8], sample: &str) -> Result<StatsTables, VarStatsError> {
    let mut tables: BTreeMap<String, StatsTable> = BTreeMap::new();
    for (lineno, raw) in lines(bytes).enumerate() {
        if raw.is_empty() {
            continue;
        }
        let line = std::str::from_utf8(raw).map_err(|_| {
            VarStatsError::malformed("input", format!("line {} is not valid UTF-8", lineno + 1))
        })?;
        if let Some(comment) = line.strip_prefix('#') {
            if let Some((code, columns)) = parse_header(comment) {
                let mut all = Vec::with_capacity(columns.len() + 1);
                all.push(SAMPLE_COLUMN.to_string());
                all.extend(columns);
                tables.insert(code.to_string(), StatsTable::new(code, all));
            }
            continue;
        }
        let mut fields = line.split('\t');
        let code = fields.next().unwrap_or_default();
        let Some(table) = tables.get_mut(code) else {
            debug!(section = code, line = lineno + 1, "skipping row without header");
            continue;
        };
        let mut row = Vec::with_capacity(table.columns.len());
        row.push(sample.to_string());
        row.extend(fields.map(|f| f.to_string()));
        if row.len() != table.columns.len() && !CONSUMED_SECTIONS.contains(&code) {
            debug!(section = code, line = lineno + 1, "skipping row with unexpected width");
            continue;
        }
        table.push_row(row)?;
    }

    if let Some(sn) = tables.remove(SECTION_SUMMARY) {
        tables.insert(SECTION_SUMMARY.to_string(), pivot_summary(&sn)?);
    }
    Ok(StatsTables { tables })
}

/// `# SN\t[2]id\t[3]key\t[4]value` -> ("SN", ["id", "key", "value"]).
fn parse_header(comment: &str) -> Option<(&str, Vec<String>)> {
    let mut fields = comment.trim_start().split('\t');
    let code = fields.next()?.trim();
    let columns: Vec<String> = fields.map(strip_column_index).collect();
    if code.is_empty() || code.contains(' ') || columns.is_empty() {
        return None;
    }
    if !comment.contains("\t[") {
        return None;
    }
    Some((code, columns))
}

fn strip_column_index(field: &str) -> String {
    let field = field.trim();
    match field.strip_prefix('[').and_then(|s| s.split_once(']')) {
        Some((idx, name)) if idx.bytes().all(|b| b.is_ascii_digit()) => name.to_string(),
        _ => field.to_string(),
    }
}

/// `number of SNPs:` -> `SNPs`.
fn summary_key(key: &str) -> String {
    let key = key.trim().trim_end_matches(':').trim_end();
    key.strip_prefix("number of ").unwrap_or(key).to_string()
}

/// Turns the long `id/key/value` SN layout into one row per (sample, id).
fn pivot_summary(sn: &StatsTable) -> Result<StatsTable, VarStatsError> {
    let id_col = sn.require_column("id")?;
    let key_col = sn.require_column("key")?;
    let value_col = sn.require_column("value")?;

    let mut keys: Vec<String> = Vec::new();
    // (sample, id) in order of first appearance
    let mut groups: Vec<((String, String), BTreeMap<String, String>)> = Vec::new();
    for row in sn.rows() {
        let key = summary_key(&row[key_col]);
        if !keys.contains(&key) {
            keys.push(key.clone());
        }
        let group_key = (row[0].clone(), row[id_col].clone());
        let pos = match groups.iter().position(|(k, _)| *k == group_key) {
            Some(pos) => pos,
            None => {
                groups.push((group_key, BTreeMap::new()));
                groups.len() - 1
            }
        };
        groups[pos].1.insert(key, row[value_col].clone());
    }

    let mut columns = vec![SAMPLE_COLUMN.to_string(), "id".to_string()];
    columns.extend(keys.iter().cloned());
    let mut out = StatsTable::new(SECTION_SUMMARY, columns);
    for ((sample, id), values) in groups {
        let mut row = vec![sample, id];
        row.extend(
            keys.iter()
                .map(|k| values.get(k).cloned().unwrap_or_default()),
        );
        out.push_row(row)?;
    }
    Ok(out)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const STATS: &str = "\
# This file was produced by bcftools stats (1.17+htslib-1.17)
# Definition of sets:
# ID\t[2]id\t[3]tab-separated file names
ID\t0\tcalls.vcf.gz
# SN, Summary numbers:
# SN\t[2]id\t[3]key\t[4]value
SN\t0\tnumber of samples:\t1
SN\t0\tnumber of records:\t1234
SN\t0\tnumber of no-ALTs:\t0
SN\t0\tnumber of SNPs:\t1000
SN\t0\tnumber of MNPs:\t0
SN\t0\tnumber of indels:\t234
SN\t0\tnumber of others:\t0
SN\t0\tnumber of multiallelic sites:\t5
SN\t0\tnumber of multiallelic SNP sites:\t2
# TSTV, transitions/transversions:
# TSTV\t[2]id\t[3]ts\t[4]tv\t[5]ts/tv\t[6]ts (1st ALT)\t[7]tv (1st ALT)\t[8]ts/tv (1st ALT)
TSTV\t0\t680\t320\t2.12\t680\t320\t2.12
# ST, Substitution types:
# ST\t[2]id\t[3]type\t[4]count
ST\t0\tA>C\t40
ST\t0\tA>G\t170
ST\t0\tA>T\t30
ST\t0\tC>A\t50
ST\t0\tC>G\t20
ST\t0\tC>T\t180
ST\t0\tG>A\t160
ST\t0\tG>C\t25
ST\t0\tG>T\t55
ST\t0\tT>A\t35
ST\t0\tT>C\t170
ST\t0\tT>G\t45
# IDD, InDel distribution:
# IDD\t[2]id\t[3]length (deletions negative)\t[4]number of sites\t[5]number of genotypes\t[6]mean VAF
IDD\t0\t-3\t10\t10\t.
IDD\t0\t-1\t100\t100\t.
IDD\t0\t1\t90\t90\t.
IDD\t0\t4\t34\t34\t.
";

    #[test]
    fn strips_column_indices_and_adds_sample() {
        let tables = parse(STATS.as_bytes(), "HG002").unwrap();
        let st = tables.get(SECTION_SUBSTITUTIONS).unwrap();
        assert_eq!(st.columns(), &["sample", "id", "type", "count"]);
        assert_eq!(st.len(), 12);
        assert_eq!(st.value(0, "sample"), Some("HG002"));
        assert_eq!(st.value(11, "type"), Some("T>G"));

        let idd = tables.get(SECTION_INDELS).unwrap();
        assert_eq!(
            idd.columns()[2..4],
            ["length (deletions negative)", "number of sites"]
        );
    }

    #[test]
    fn pivots_summary_numbers() {
        let tables = parse(STATS.as_bytes(), "HG002").unwrap();
        let sn = tables.get(SECTION_SUMMARY).unwrap();
        assert_eq!(sn.len(), 1);
        assert_eq!(
            sn.columns(),
            &[
                "sample",
                "id",
                "samples",
                "records",
                "no-ALTs",
                "SNPs",
                "MNPs",
                "indels",
                "others",
                "multiallelic sites",
                "multiallelic SNP sites",
            ]
        );
        assert_eq!(sn.value(0, "records"), Some("1234"));
        assert_eq!(sn.value(0, "SNPs"), Some("1000"));
    }

    #[test]
    fn keeps_sections_it_does_not_consume() {
        let tables = parse(STATS.as_bytes(), "s").unwrap();
        let sections: Vec<&str> = tables.sections().collect();
        assert_eq!(sections, vec!["ID", "IDD", "SN", "ST", "TSTV"]);
    }

    #[test]
    fn rows_without_header_are_skipped() {
        let input = "ST\t0\tA>C\t4\n# ST\t[2]id\t[3]type\t[4]count\nST\t0\tA>G\t7\n";
        let tables = parse(input.as_bytes(), "s").unwrap();
        let st = tables.get(SECTION_SUBSTITUTIONS).unwrap();
        assert_eq!(st.len(), 1);
        assert_eq!(st.value(0, "type"), Some("A>G"));
    }

    #[test]
    fn width_mismatch_in_consumed_section_is_rejected() {
        let input = "# ST\t[2]id\t[3]type\t[4]count\nST\t0\tA>G\n";
        let err = parse(input.as_bytes(), "s").unwrap_err();
        assert!(matches!(err, VarStatsError::MalformedTable { ref section, .. } if section == "ST"));
    }

    #[test]
    fn width_mismatch_elsewhere_is_tolerated() {
        let input = "# QUAL\t[2]id\t[3]Quality\t[4]number of SNPs\nQUAL\t0\t30\nQUAL\t0\t30\t4\n";
        let tables = parse(input.as_bytes(), "s").unwrap();
        assert_eq!(tables.get("QUAL").unwrap().len(), 1);
    }

    #[test]
    fn empty_input_has_no_rows() {
        let tables = parse(b"", "s").unwrap();
        assert!(tables.is_empty());
        assert!(tables.is_section_empty(SECTION_SUMMARY));
        assert!(tables.is_section_empty(SECTION_INDELS));
    }

    #[test]
    fn merges_inputs_per_section() {
        let mut a = parse(STATS.as_bytes(), "one").unwrap();
        let b = parse(STATS.as_bytes(), "two").unwrap();
        a.merge(b);
        let sn = a.get(SECTION_SUMMARY).unwrap();
        assert_eq!(sn.len(), 2);
        assert_eq!(sn.for_sample("two").len(), 1);
        assert_eq!(a.get(SECTION_SUBSTITUTIONS).unwrap().len(), 24);
    }

    #[test]
    fn drops_and_renames_columns() {
        let tables = parse(STATS.as_bytes(), "s").unwrap();
        let tstv = tables
            .get(SECTION_TSTV)
            .unwrap()
            .without_columns(&["sample", "id"])
            .with_renamed_columns(|c| c.to_uppercase());
        assert_eq!(tstv.columns()[0], "TS");
        assert_eq!(tstv.rows()[0][2], "2.12");
    }

    #[test]
    fn merge_unions_differing_layouts() {
        let wide = "# IDD\t[2]id\t[3]length (deletions negative)\t[4]number of sites\t[5]number of genotypes\t[6]mean VAF\n\
IDD\t0\t-1\t7\t7\t.\n\
# SN\t[2]id\t[3]key\t[4]value\n\
SN\t0\tnumber of records:\t7\n\
SN\t0\tnumber of no-ALTs:\t0\n";
        let narrow = "# IDD\t[2]id\t[3]length (deletions negative)\t[4]number of sites\n\
IDD\t0\t2\t5\n\
# SN\t[2]id\t[3]key\t[4]value\n\
SN\t0\tnumber of records:\t5\n";
        let mut a = parse(narrow.as_bytes(), "old").unwrap();
        a.merge(parse(wide.as_bytes(), "new").unwrap());

        let idd = a.get(SECTION_INDELS).unwrap();
        assert_eq!(idd.columns().len(), 6);
        assert_eq!(idd.len(), 2);
        assert_eq!(idd.value(0, "number of sites"), Some("5"));
        assert_eq!(idd.value(0, "mean VAF"), Some(""));
        assert_eq!(idd.value(1, "length (deletions negative)"), Some("-1"));
        assert_eq!(idd.value(1, "mean VAF"), Some("."));

        let sn = a.get(SECTION_SUMMARY).unwrap();
        assert_eq!(sn.value(0, "no-ALTs"), Some(""));
        assert_eq!(sn.value(1, "no-ALTs"), Some("0"));
        assert_eq!(sn.value(1, "records"), Some("7"));
    }
}
