use crate::core::bcfstats::{SECTION_INDELS, StatsTable};
use crate::core::error::VarStatsError;
use crate::core::model::IndelLengthRecord;
use std::collections::BTreeMap;

pub const LENGTH_COLUMN: &str = "length (deletions negative)";
pub const SITES_COLUMN: &str = "number of sites";

/// Widest length axis the profile will materialise.
pub const MAX_LENGTH_SPAN: u64 = 1_000_000;

/// Site counts per signed indel length over a gap-free, ascending length axis
/// that starts one below the shortest observed length.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IndelLengthProfile {
    entries: Vec<(i64, u64)>,
}

impl IndelLengthProfile {
    pub fn entries(&self) -> &[(i64, u64)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn min_length(&self) -> i64 {
        self.entries[0].0
    }

    pub fn max_length(&self) -> i64 {
        self.entries[self.entries.len() - 1].0
    }

    pub fn total(&self) -> u64 {
        self.entries.iter().map(|&(_, n)| n).sum()
    }

    pub fn max_count(&self) -> u64 {
        self.entries.iter().map(|&(_, n)| n).max().unwrap_or(0)
    }
}

pub fn aggregate_indel_sizes(
    records: &[IndelLengthRecord],
) -> Result<IndelLengthProfile, VarStatsError> {
    let mut grouped: BTreeMap<i64, u64> = BTreeMap::new();
    for rec in records {
        let slot = grouped.entry(rec.length).or_insert(0);
        *slot = slot.checked_add(rec.count).ok_or_else(|| {
            VarStatsError::malformed(
                SECTION_INDELS,
                format!("site count overflows at length {}", rec.length),
            )
        })?;
    }
    let (Some((&min_len, _)), Some((&max_len, _))) =
        (grouped.first_key_value(), grouped.last_key_value())
    else {
        return Err(VarStatsError::EmptyInput);
    };
    let start = min_len.checked_sub(1).ok_or_else(|| {
        VarStatsError::malformed(SECTION_INDELS, format!("indel length {} out of range", min_len))
    })?;
    let span = max_len.abs_diff(start);
    if span >= MAX_LENGTH_SPAN {
        return Err(VarStatsError::malformed(
            SECTION_INDELS,
            format!(
                "indel lengths span {}..={}, more than {} positions",
                min_len, max_len, MAX_LENGTH_SPAN
            ),
        ));
    }
    let entries = (start..=max_len)
        .map(|len| (len, grouped.get(&len).copied().unwrap_or(0)))
        .collect();
    Ok(IndelLengthProfile { entries })
}

pub fn indel_records(table: &StatsTable) -> Result<Vec<IndelLengthRecord>, VarStatsError> {
    let len_col = table.require_column(LENGTH_COLUMN)?;
    let sites_col = table.require_column(SITES_COLUMN)?;
    table
        .rows()
        .iter()
        .map(|row| {
            let length = row[len_col].trim().parse::<i64>().map_err(|_| {
                VarStatsError::malformed(
                    table.section(),
                    format!("indel length {:?} is not an integer", row[len_col]),
                )
            })?;
            let count = row[sites_col].trim().parse::<u64>().map_err(|_| {
                VarStatsError::malformed(
                    table.section(),
                    format!("site count {:?} is not a non-negative integer", row[sites_col]),
                )
            })?;
            Ok(IndelLengthRecord::new(length, count))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bcfstats::{self, SECTION_INDELS};

    fn recs(pairs: &[(i64, u64)]) -> Vec<IndelLengthRecord> {
        pairs
            .iter()
            .map(|&(l, n)| IndelLengthRecord::new(l, n))
            .collect()
    }

    #[test]
    fn groups_and_pads_one_below_minimum() {
        let profile = aggregate_indel_sizes(&recs(&[(-2, 3), (1, 5), (1, 2)])).unwrap();
        assert_eq!(
            profile.entries(),
            &[(-3, 0), (-2, 3), (-1, 0), (0, 0), (1, 7)]
        );
        assert_eq!(profile.min_length(), -3);
        assert_eq!(profile.max_length(), 1);
        assert_eq!(profile.total(), 10);
    }

    #[test]
    fn empty_input_is_an_error() {
        assert_eq!(aggregate_indel_sizes(&[]), Err(VarStatsError::EmptyInput));
    }

    #[test]
    fn lowest_length_cannot_be_padded() {
        let err = aggregate_indel_sizes(&recs(&[(i64::MIN, 1)])).unwrap_err();
        assert!(matches!(err, VarStatsError::MalformedTable { ref section, .. } if section == "IDD"));
    }

    #[test]
    fn far_apart_lengths_are_rejected() {
        let err = aggregate_indel_sizes(&recs(&[(-600_000, 1), (600_000, 1)])).unwrap_err();
        assert!(matches!(err, VarStatsError::MalformedTable { .. }));
        assert!(aggregate_indel_sizes(&recs(&[(i64::MIN + 1, 1), (i64::MAX, 1)])).is_err());
        let wide = aggregate_indel_sizes(&recs(&[(-1000, 1), (1000, 1)])).unwrap();
        assert_eq!(wide.len(), 2002);
    }

    #[test]
    fn overflowing_site_counts_are_rejected() {
        let err = aggregate_indel_sizes(&recs(&[(2, u64::MAX), (2, 1)])).unwrap_err();
        assert!(matches!(err, VarStatsError::MalformedTable { .. }));
    }

    #[test]
    fn single_length_still_gets_padding() {
        let profile = aggregate_indel_sizes(&recs(&[(4, 9)])).unwrap();
        assert_eq!(profile.entries(), &[(3, 0), (4, 9)]);
    }

    #[test]
    fn lengths_step_by_one_regardless_of_input_order() {
        let input = recs(&[(12, 1), (-7, 2), (3, 4), (-7, 1), (0, 5)]);
        let profile = aggregate_indel_sizes(&input).unwrap();
        assert_eq!(profile.len(), (12 - (-8) + 1) as usize);
        for w in profile.entries().windows(2) {
            assert_eq!(w[1].0, w[0].0 + 1);
        }
        assert_eq!(profile.total(), 13);
        assert_eq!(profile.max_count(), 5);
        assert_eq!(aggregate_indel_sizes(&input), Ok(profile));
    }

    #[test]
    fn reads_idd_table() {
        let tables = bcfstats::parse(bcfstats::tests::STATS.as_bytes(), "s").unwrap();
        let records = indel_records(tables.get(SECTION_INDELS).unwrap()).unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0], IndelLengthRecord::new(-3, 10));
        let profile = aggregate_indel_sizes(&records).unwrap();
        assert_eq!(profile.min_length(), -4);
        assert_eq!(profile.max_length(), 4);
        assert_eq!(profile.total(), 234);
    }

    #[test]
    fn missing_column_is_reported() {
        let input = "# IDD\t[2]id\t[3]length\t[4]count\nIDD\t0\t1\t2\n";
        let tables = bcfstats::parse(input.as_bytes(), "s").unwrap();
        let err = indel_records(tables.get(SECTION_INDELS).unwrap()).unwrap_err();
        assert!(err.to_string().contains("length (deletions negative)"));
    }
}
