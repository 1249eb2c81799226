use crate::core::bcfstats::{SECTION_SUBSTITUTIONS, StatsTable};
use crate::core::error::VarStatsError;
use crate::core::model::{Base, CanonicalClass, SubstitutionCode, SubstitutionRecord};
use std::collections::BTreeMap;

/// The same event read off the opposite strand, for codes whose reference is G or T.
fn strand_partner(code: SubstitutionCode) -> SubstitutionCode {
    use crate::core::model::Base::*;
    let (reference, alternate) = match (code.reference, code.alternate) {
        (G, A) => (C, T),
        (G, C) => (C, G),
        (G, T) => (C, A),
        (T, A) => (A, T),
        (T, C) => (A, G),
        (T, G) => (A, C),
        _ => return code,
    };
    SubstitutionCode {
        reference,
        alternate,
    }
}

/// Folds a code onto its A/C-anchored representative. Every partner is
/// anchored, so a single lookup suffices.
pub fn canonicalize_code(code: SubstitutionCode) -> SubstitutionCode {
    if code.reference.is_anchor() {
        code
    } else {
        strand_partner(code)
    }
}

/// `"G>A"` -> `(C, T)`.
pub fn canonicalize(code: &str) -> Result<(Base, Base), VarStatsError> {
    let c = canonicalize_code(SubstitutionCode::parse(code)?);
    Ok((c.reference, c.alternate))
}

/// Summed counts keyed by (alternate allele, reference allele).
///
/// Sparse: classes never observed in the input have no cell, and renderers
/// treat a missing cell as zero.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SubstitutionMatrix {
    cells: BTreeMap<(Base, Base), u64>,
}

impl SubstitutionMatrix {
    pub fn get(&self, alternate: Base, reference: Base) -> Option<u64> {
        self.cells.get(&(alternate, reference)).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.cells.values().sum()
    }

    pub fn max(&self) -> u64 {
        self.cells.values().copied().max().unwrap_or(0)
    }

    /// (alternate, reference, count), ordered by alternate then reference.
    pub fn cells(&self) -> impl Iterator<Item = (Base, Base, u64)> + '_ {
        self.cells.iter().map(|(&(a, r), &n)| (a, r, n))
    }

    pub fn reference_alleles(&self) -> Vec<Base> {
        let mut refs: Vec<Base> = self.cells.keys().map(|&(_, r)| r).collect();
        refs.sort();
        refs.dedup();
        refs
    }

    pub fn alternate_alleles(&self) -> Vec<Base> {
        let mut alts: Vec<Base> = self.cells.keys().map(|&(a, _)| a).collect();
        alts.dedup();
        alts
    }

    /// Counts per COSMIC class, zero where the matrix has no cell.
    pub fn class_counts(&self) -> [(CanonicalClass, u64); 6] {
        CanonicalClass::ALL.map(|class| {
            let (reference, alternate) = class.anchored();
            (class, self.get(alternate, reference).unwrap_or(0))
        })
    }
}

pub fn aggregate_changes(
    records: &[SubstitutionRecord],
) -> Result<SubstitutionMatrix, VarStatsError> {
    let mut cells: BTreeMap<(Base, Base), u64> = BTreeMap::new();
    for rec in records {
        let (reference, alternate) = canonicalize(&rec.code)?;
        let cell = cells.entry((alternate, reference)).or_insert(0);
        *cell = cell.checked_add(rec.count).ok_or_else(|| {
            VarStatsError::malformed(
                SECTION_SUBSTITUTIONS,
                format!("count overflows in the {}>{} cell", reference, alternate),
            )
        })?;
    }
    Ok(SubstitutionMatrix { cells })
}

/// Reads the `type`/`count` columns of an `ST` table.
pub fn substitution_records(table: &StatsTable) -> Result<Vec<SubstitutionRecord>, VarStatsError> {
    let type_col = table.require_column("type")?;
    let count_col = table.require_column("count")?;
    table
        .rows()
        .iter()
        .map(|row| {
            let count = row[count_col].trim().parse::<u64>().map_err(|_| {
                VarStatsError::malformed(
                    table.section(),
                    format!("count {:?} is not a non-negative integer", row[count_col]),
                )
            })?;
            Ok(SubstitutionRecord::new(row[type_col].trim(), count))
        })
        .collect()
}
