//! Sequential human-readable codes
//!
//! Every patient, medicine, service and bill carries a code made of a fixed
//! prefix and a counter zero-padded to three digits: `DOC001`, `MED001`,
//! `SER001`, `BILL001`. The padding is a minimum width only, so the code after
//! `BILL999` is `BILL1000`, and codes are always ordered by their numeric part,
//! never by string comparison.
//!
//! Codes are issued by a [`SequencePort`], an atomic per-kind counter owned by
//! the storage adapter. Code columns stay unique in storage; when an insert
//! still collides, [`insert_with_code`] issues a fresh code and retries a
//! bounded number of times.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

use crate::ports::{DomainPort, PortError};

/// Minimum number of digits in a code's numeric part
pub const CODE_WIDTH: usize = 3;

/// The kinds of record that receive sequential codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceKind {
    /// Patient records are filed under `DOC` codes
    Patient,
    Medicine,
    Service,
    Bill,
}

impl SequenceKind {
    /// All kinds, in a stable order
    pub const ALL: [SequenceKind; 4] = [
        SequenceKind::Patient,
        SequenceKind::Medicine,
        SequenceKind::Service,
        SequenceKind::Bill,
    ];

    /// The fixed code prefix for this kind
    pub fn prefix(&self) -> &'static str {
        match self {
            SequenceKind::Patient => "DOC",
            SequenceKind::Medicine => "MED",
            SequenceKind::Service => "SER",
            SequenceKind::Bill => "BILL",
        }
    }

    /// Resolves a kind from its prefix or its name (`BILL`, `bill`, `patient`)
    pub fn parse(value: &str) -> Option<Self> {
        let upper = value.to_ascii_uppercase();
        Self::ALL.into_iter().find(|kind| {
            kind.prefix() == upper || kind.to_string().eq_ignore_ascii_case(value)
        })
    }
}

impl fmt::Display for SequenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SequenceKind::Patient => "patient",
            SequenceKind::Medicine => "medicine",
            SequenceKind::Service => "service",
            SequenceKind::Bill => "bill",
        };
        f.write_str(name)
    }
}

/// Errors raised while parsing a code
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodeError {
    #[error("Unknown code prefix in '{0}'")]
    UnknownPrefix(String),

    #[error("Code '{0}' has no numeric part")]
    MissingNumber(String),

    #[error("Code '{0}' has an invalid numeric part")]
    InvalidNumber(String),
}

/// A parsed sequential code such as `BILL042`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SequentialCode {
    kind: SequenceKind,
    number: u64,
}

impl SequentialCode {
    /// Creates a code for `kind` with the given counter value
    pub fn new(kind: SequenceKind, number: u64) -> Self {
        Self { kind, number }
    }

    /// The first code of a sequence (`<PREFIX>001`)
    pub fn first(kind: SequenceKind) -> Self {
        Self::new(kind, 1)
    }

    pub fn kind(&self) -> SequenceKind {
        self.kind
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    /// The code that follows this one
    pub fn next(&self) -> Self {
        Self::new(self.kind, self.number.saturating_add(1))
    }

    /// Parses a code, requiring it to belong to `kind`
    pub fn parse_as(kind: SequenceKind, value: &str) -> Result<Self, CodeError> {
        let digits = value
            .strip_prefix(kind.prefix())
            .ok_or_else(|| CodeError::UnknownPrefix(value.to_string()))?;
        if digits.is_empty() {
            return Err(CodeError::MissingNumber(value.to_string()));
        }
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CodeError::InvalidNumber(value.to_string()));
        }
        let number = digits
            .parse::<u64>()
            .map_err(|_| CodeError::InvalidNumber(value.to_string()))?;
        Ok(Self::new(kind, number))
    }
}

impl fmt::Display for SequentialCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:0width$}",
            self.kind.prefix(),
            self.number,
            width = CODE_WIDTH
        )
    }
}

impl FromStr for SequentialCode {
    type Err = CodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = SequenceKind::ALL
            .into_iter()
            .find(|kind| s.starts_with(kind.prefix()))
            .ok_or_else(|| CodeError::UnknownPrefix(s.to_string()))?;
        Self::parse_as(kind, s)
    }
}

/// Returns the code after the numerically greatest of `existing`
///
/// Codes that do not parse as `kind` are ignored. With no valid codes the
/// result is `<PREFIX>001`.
pub fn next_code_after<'a, I>(kind: SequenceKind, existing: I) -> SequentialCode
where
    I: IntoIterator<Item = &'a str>,
{
    existing
        .into_iter()
        .filter_map(|code| SequentialCode::parse_as(kind, code).ok())
        .map(|code| code.number())
        .max()
        .map(|max| SequentialCode::new(kind, max).next())
        .unwrap_or_else(|| SequentialCode::first(kind))
}

/// Port for issuing sequence values
///
/// Implementations must hand out each value at most once per kind, even under
/// concurrent callers. Values lost to a rolled-back insert leave gaps, which
/// are acceptable.
#[async_trait]
pub trait SequencePort: DomainPort {
    /// Atomically advances the counter for `kind` and returns the new value
    ///
    /// A counter that does not exist yet starts after the numerically
    /// greatest code already stored for `kind`.
    async fn next_value(&self, kind: SequenceKind) -> Result<u64, PortError>;

    /// Issues the next code for `kind`
    async fn issue_code(&self, kind: SequenceKind) -> Result<SequentialCode, PortError> {
        let value = self.next_value(kind).await?;
        Ok(SequentialCode::new(kind, value))
    }
}

/// Issues a code and runs `insert` with it, retrying on duplicate codes
///
/// `insert` is called with a freshly issued code on every attempt. A
/// `PortError::Duplicate` from `insert` triggers another attempt, up to
/// `max_attempts`; the last duplicate error is returned once they are spent.
/// Any other error is returned immediately.
pub async fn insert_with_code<T, F, Fut>(
    sequences: &dyn SequencePort,
    kind: SequenceKind,
    max_attempts: u32,
    mut insert: F,
) -> Result<T, PortError>
where
    F: FnMut(SequentialCode) -> Fut,
    Fut: Future<Output = Result<T, PortError>>,
{
    let attempts = max_attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=attempts {
        let code = sequences.issue_code(kind).await?;
        match insert(code).await {
            Ok(value) => return Ok(value),
            Err(err @ PortError::Duplicate { .. }) => {
                warn!(%kind, %code, attempt, "sequential code already taken, re-issuing");
                last_error = Some(err);
            }
            Err(err) => return Err(err),
        }
    }

    Err(last_error.unwrap_or_else(|| PortError::Duplicate {
        entity_type: kind.to_string(),
        value: String::new(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_formatting_pads_to_three_digits() {
        assert_eq!(SequentialCode::first(SequenceKind::Bill).to_string(), "BILL001");
        assert_eq!(SequentialCode::new(SequenceKind::Medicine, 42).to_string(), "MED042");
        assert_eq!(SequentialCode::new(SequenceKind::Service, 999).to_string(), "SER999");
    }

    #[test]
    fn test_code_widens_past_999() {
        let code = SequentialCode::new(SequenceKind::Bill, 999).next();
        assert_eq!(code.to_string(), "BILL1000");
    }

    #[test]
    fn test_parse_roundtrip_and_errors() {
        let code: SequentialCode = "DOC017".parse().unwrap();
        assert_eq!(code.kind(), SequenceKind::Patient);
        assert_eq!(code.number(), 17);

        assert_eq!(
            "XYZ001".parse::<SequentialCode>(),
            Err(CodeError::UnknownPrefix("XYZ001".to_string()))
        );
        assert!(matches!(
            SequentialCode::parse_as(SequenceKind::Bill, "BILL"),
            Err(CodeError::MissingNumber(_))
        ));
        assert!(matches!(
            SequentialCode::parse_as(SequenceKind::Bill, "BILL0x1"),
            Err(CodeError::InvalidNumber(_))
        ));
    }

    #[test]
    fn test_next_code_after_empty_is_first() {
        let next = next_code_after(SequenceKind::Bill, std::iter::empty());
        assert_eq!(next.to_string(), "BILL001");
    }

    #[test]
    fn test_next_code_after_uses_numeric_order() {
        // "BILL999" sorts after "BILL1000" as a string
        let existing = ["BILL998", "BILL1000", "BILL999"];
        let next = next_code_after(SequenceKind::Bill, existing);
        assert_eq!(next.to_string(), "BILL1001");
    }

    #[test]
    fn test_next_code_after_ignores_foreign_codes() {
        let existing = ["MED010", "BILL002", "garbage"];
        let next = next_code_after(SequenceKind::Bill, existing);
        assert_eq!(next.to_string(), "BILL003");
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(SequenceKind::parse("BILL"), Some(SequenceKind::Bill));
        assert_eq!(SequenceKind::parse("med"), Some(SequenceKind::Medicine));
        assert_eq!(SequenceKind::parse("patient"), Some(SequenceKind::Patient));
        assert_eq!(SequenceKind::parse("nope"), None);
    }
}
