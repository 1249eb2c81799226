use crate::core::error::VarStatsError;
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Base {
    A,
    C,
    G,
    T,
}

impl Base {
    pub const ALL: [Base; 4] = [Base::A, Base::C, Base::G, Base::T];

    pub fn from_byte(b: u8) -> Option<Base> {
        match b {
            b'A' => Some(Base::A),
            b'C' => Some(Base::C),
            b'G' => Some(Base::G),
            b'T' => Some(Base::T),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Base::A => 'A',
            Base::C => 'C',
            Base::G => 'G',
            Base::T => 'T',
        }
    }

    /// Reference bases the canonical classes are anchored on.
    pub fn is_anchor(self) -> bool {
        matches!(self, Base::A | Base::C)
    }
}

impl fmt::Display for Base {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A raw `X>Y` substitution code as written in the `ST` section.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SubstitutionCode {
    pub reference: Base,
    pub alternate: Base,
}

impl SubstitutionCode {
    pub fn new(reference: Base, alternate: Base) -> Option<Self> {
        if reference == alternate {
            None
        } else {
            Some(Self {
                reference,
                alternate,
            })
        }
    }

    pub fn parse(code: &str) -> Result<Self, VarStatsError> {
        let invalid = || VarStatsError::InvalidSubstitutionCode(code.to_string());
        let bytes = code.as_bytes();
        if bytes.len() != 3 || bytes[1] != b'>' {
            return Err(invalid());
        }
        let reference = Base::from_byte(bytes[0]).ok_or_else(invalid)?;
        let alternate = Base::from_byte(bytes[2]).ok_or_else(invalid)?;
        Self::new(reference, alternate).ok_or_else(invalid)
    }

    /// All twelve valid codes, ordered by reference then alternate.
    pub fn all() -> impl Iterator<Item = SubstitutionCode> {
        Base::ALL.into_iter().flat_map(|r| {
            Base::ALL
                .into_iter()
                .filter_map(move |a| SubstitutionCode::new(r, a))
        })
    }
}

impl FromStr for SubstitutionCode {
    type Err = VarStatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SubstitutionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}>{}", self.reference, self.alternate)
    }
}

/// The six strand-symmetric substitution classes, named the COSMIC way
/// (pyrimidine reference). The matrix coordinate of a class is anchored on
/// A/C instead, so `T>N` classes live in the `A` reference column.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum CanonicalClass {
    CtoA,
    CtoG,
    CtoT,
    TtoA,
    TtoC,
    TtoG,
}

impl CanonicalClass {
    pub const ALL: [CanonicalClass; 6] = [
        CanonicalClass::CtoA,
        CanonicalClass::CtoG,
        CanonicalClass::CtoT,
        CanonicalClass::TtoA,
        CanonicalClass::TtoC,
        CanonicalClass::TtoG,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CanonicalClass::CtoA => "C>A",
            CanonicalClass::CtoG => "C>G",
            CanonicalClass::CtoT => "C>T",
            CanonicalClass::TtoA => "T>A",
            CanonicalClass::TtoC => "T>C",
            CanonicalClass::TtoG => "T>G",
        }
    }

    /// (reference, alternate) cell of this class in the substitution matrix.
    pub fn anchored(self) -> (Base, Base) {
        match self {
            CanonicalClass::CtoA => (Base::C, Base::A),
            CanonicalClass::CtoG => (Base::C, Base::G),
            CanonicalClass::CtoT => (Base::C, Base::T),
            CanonicalClass::TtoA => (Base::A, Base::T),
            CanonicalClass::TtoC => (Base::A, Base::G),
            CanonicalClass::TtoG => (Base::A, Base::C),
        }
    }

    pub fn from_anchored(reference: Base, alternate: Base) -> Option<CanonicalClass> {
        CanonicalClass::ALL
            .into_iter()
            .find(|c| c.anchored() == (reference, alternate))
    }

    /// COSMIC mutational-signature palette.
    pub fn color(self) -> &'static str {
        match self {
            CanonicalClass::CtoA => "#03bcee",
            CanonicalClass::CtoG => "#010101",
            CanonicalClass::CtoT => "#e32926",
            CanonicalClass::TtoA => "#cac9c9",
            CanonicalClass::TtoC => "#a1ce63",
            CanonicalClass::TtoG => "#ebc6c4",
        }
    }
}

impl fmt::Display for CanonicalClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubstitutionRecord {
    pub code: String,
    pub count: u64,
}

impl SubstitutionRecord {
    pub fn new(code: impl Into<String>, count: u64) -> Self {
        Self {
            code: code.into(),
            count,
        }
    }
}

/// Negative lengths are deletions, positive lengths insertions.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct IndelLengthRecord {
    pub length: i64,
    pub count: u64,
}

impl IndelLengthRecord {
    pub fn new(length: i64, count: u64) -> Self {
        Self { length, count }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SampleSummary {
    pub sample: String,
    pub records: Option<u64>,
    pub snvs: Option<u64>,
    pub indels: Option<u64>,
    pub ts_tv: Option<String>,
}
