//! Comparison predicates attached to requirement nodes
//!
//! A predicate is an operator plus a required version. The required version
//! is either a plain string or a `|`-separated list of `glob=version`
//! fallback cases, e.g. `1.8.*=1.8.5|1.9.*=1.9.7|2.0.13`, where the first
//! case whose glob matches the actual version supplies the version to
//! compare against.

use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::version::{self, VersionFormat};

/// Comparison operator of a requirement node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Glob,
    Regex,
}

impl CompareOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "eq",
            CompareOp::Ne => "ne",
            CompareOp::Lt => "lt",
            CompareOp::Gt => "gt",
            CompareOp::Le => "le",
            CompareOp::Ge => "ge",
            CompareOp::Glob => "glob",
            CompareOp::Regex => "regex",
        }
    }

    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Le => ordering != Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less,
            CompareOp::Glob | CompareOp::Regex => false,
        }
    }
}

impl FromStr for CompareOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "eq" => Ok(CompareOp::Eq),
            "ne" => Ok(CompareOp::Ne),
            "lt" => Ok(CompareOp::Lt),
            "gt" => Ok(CompareOp::Gt),
            "le" => Ok(CompareOp::Le),
            "ge" => Ok(CompareOp::Ge),
            "glob" => Ok(CompareOp::Glob),
            "regex" => Ok(CompareOp::Regex),
            other => Err(Error::NotSupported(format!(
                "cannot handle compare operator {}",
                other
            ))),
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shell-glob match with the pattern on the requirement side
pub fn glob_matches(pattern: &str, text: &str) -> Result<bool> {
    let pattern = Pattern::new(pattern)
        .map_err(|e| Error::InvalidFile(format!("invalid glob {}: {}", pattern, e)))?;
    Ok(pattern.matches(text))
}

fn regex_matches_full(pattern: &str, text: &str) -> Result<bool> {
    let re = Regex::new(&format!("^(?:{})$", pattern))
        .map_err(|e| Error::InvalidFile(format!("invalid regex {}: {}", pattern, e)))?;
    Ok(re.is_match(text))
}

/// Compare `actual` against `required` using `op`
pub fn compare(op: CompareOp, required: &str, actual: &str, format: VersionFormat) -> Result<bool> {
    match op {
        CompareOp::Glob => glob_matches(required, actual),
        CompareOp::Regex => regex_matches_full(required, actual),
        _ => Ok(op.accepts(version::compare(actual, required, format))),
    }
}

/// One `glob=version` case; a case without a glob always applies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackCase {
    pub pattern: Option<String>,
    pub version: String,
}

/// Required version of a predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionExpr {
    Plain(String),
    Fallback {
        raw: String,
        cases: Vec<FallbackCase>,
    },
}

impl VersionExpr {
    /// Parse version text; the fallback syntax is not recognised for `regex`
    pub fn parse(text: &str, op: Option<CompareOp>) -> Self {
        let is_fallback =
            op != Some(CompareOp::Regex) && (text.contains('|') || text.contains('='));
        if !is_fallback {
            return VersionExpr::Plain(text.to_string());
        }

        let cases = text
            .split('|')
            .map(|segment| match segment.split_once('=') {
                Some((pattern, version)) => FallbackCase {
                    pattern: Some(pattern.to_string()),
                    version: version.to_string(),
                },
                None => FallbackCase {
                    pattern: None,
                    version: segment.to_string(),
                },
            })
            .collect();
        VersionExpr::Fallback {
            raw: text.to_string(),
            cases,
        }
    }

    pub fn raw(&self) -> &str {
        match self {
            VersionExpr::Plain(text) => text,
            VersionExpr::Fallback { raw, .. } => raw,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, VersionExpr::Fallback { .. })
    }

    /// Pick the version to compare `actual` against, if any case applies
    pub fn resolve(&self, actual: &str) -> Result<Option<&str>> {
        match self {
            VersionExpr::Plain(text) => Ok(Some(text)),
            VersionExpr::Fallback { cases, .. } => {
                for case in cases {
                    match &case.pattern {
                        None => return Ok(Some(&case.version)),
                        Some(pattern) => {
                            if glob_matches(pattern, actual)? {
                                return Ok(Some(&case.version));
                            }
                        }
                    }
                }
                Ok(None)
            }
        }
    }
}

impl fmt::Display for VersionExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.raw())
    }
}

/// Result of running a predicate against an actual version
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Satisfied,
    /// Fallback syntax where no case matched the actual version
    NotApplicable,
    Unsatisfied {
        required: String,
        message: String,
    },
}

/// Operator and required version of a requirement node
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Predicate {
    pub op: Option<CompareOp>,
    pub version: Option<VersionExpr>,
}

impl Predicate {
    pub fn new(op: CompareOp, version: &str) -> Self {
        Self {
            op: Some(op),
            version: Some(VersionExpr::parse(version, Some(op))),
        }
    }

    /// Build from the raw `compare` and `version` attributes
    pub fn from_attrs(compare: Option<&str>, version: Option<&str>) -> Result<Self> {
        let op = compare.map(CompareOp::from_str).transpose()?;
        Ok(Self {
            op,
            version: version.map(|v| VersionExpr::parse(v, op)),
        })
    }

    pub fn raw_version(&self) -> &str {
        self.version.as_ref().map(VersionExpr::raw).unwrap_or_default()
    }

    pub fn uses_fallback(&self) -> bool {
        self.version.as_ref().is_some_and(VersionExpr::is_fallback)
    }

    pub fn evaluate(&self, actual: &str, format: VersionFormat) -> Result<Verdict> {
        let (Some(op), Some(expr)) = (self.op, self.version.as_ref()) else {
            return Err(Error::NotSupported(format!(
                "failed to compare [{}] and [{}]",
                self.raw_version(),
                actual
            )));
        };
        let Some(required) = expr.resolve(actual)? else {
            return Ok(Verdict::NotApplicable);
        };
        if compare(op, required, actual, format)? {
            return Ok(Verdict::Satisfied);
        }
        Ok(Verdict::Unsatisfied {
            required: required.to_string(),
            message: format!("failed predicate [{} {} {}]", required, op, actual),
        })
    }

    /// Whether `actual` positively satisfies the predicate
    pub fn holds(&self, actual: &str, format: VersionFormat) -> bool {
        matches!(self.evaluate(actual, format), Ok(Verdict::Satisfied))
    }
}
