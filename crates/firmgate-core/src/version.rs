//! Version formats and format-aware version ordering
//!
//! Firmware versions are rarely semver: devices report anything from
//! `1.2.3.4` to `0x0102` to `5101AALB`. This module provides:
//! - [`VersionFormat`], describing how a device encodes its version
//! - [`compare`], the ordering every requirement predicate is built on
//! - helpers to render raw integers and to sanity-check version strings

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;

use crate::error::{Error, Result};

/// How a device encodes its version number
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VersionFormat {
    /// Format not declared
    #[default]
    Unknown,
    /// Opaque text, compared lexically
    Plain,
    /// A single integer
    Number,
    /// AABB.CCDD
    Pair,
    /// AA.BB.CCDD
    Triplet,
    /// AA.BB.CC.DD
    Quad,
    /// Binary coded decimal AA.BB.CC.DD
    Bcd,
    /// aaa+11.bbbbb.cccccccc.dddddddddddddddd
    IntelMe,
    /// A.B.CC.DDDD
    IntelMe2,
    /// 10b.12b.10b
    SurfaceLegacy,
    /// 8b.16b.8b
    Surface,
    /// BB.CC.DD
    DellBios,
    /// 0xAABBCCDD
    Hex,
}

impl VersionFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionFormat::Unknown => "unknown",
            VersionFormat::Plain => "plain",
            VersionFormat::Number => "number",
            VersionFormat::Pair => "pair",
            VersionFormat::Triplet => "triplet",
            VersionFormat::Quad => "quad",
            VersionFormat::Bcd => "bcd",
            VersionFormat::IntelMe => "intel-me",
            VersionFormat::IntelMe2 => "intel-me2",
            VersionFormat::SurfaceLegacy => "surface-legacy",
            VersionFormat::Surface => "surface",
            VersionFormat::DellBios => "dell-bios",
            VersionFormat::Hex => "hex",
        }
    }

    /// Parse a format name; anything unrecognized is `Unknown`
    pub fn from_name(name: &str) -> Self {
        match name {
            "plain" => VersionFormat::Plain,
            "number" => VersionFormat::Number,
            "pair" => VersionFormat::Pair,
            "triplet" => VersionFormat::Triplet,
            "quad" => VersionFormat::Quad,
            "bcd" => VersionFormat::Bcd,
            "intel-me" => VersionFormat::IntelMe,
            "intel-me2" => VersionFormat::IntelMe2,
            "surface-legacy" => VersionFormat::SurfaceLegacy,
            "surface" => VersionFormat::Surface,
            "dell-bios" => VersionFormat::DellBios,
            "hex" => VersionFormat::Hex,
            _ => VersionFormat::Unknown,
        }
    }

    /// The dotted shape a version in this format is expected to have
    fn base(self) -> Self {
        match self {
            VersionFormat::IntelMe | VersionFormat::IntelMe2 => VersionFormat::Quad,
            VersionFormat::DellBios => VersionFormat::Triplet,
            VersionFormat::Bcd => VersionFormat::Pair,
            VersionFormat::Hex => VersionFormat::Number,
            other => other,
        }
    }
}

impl fmt::Display for VersionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn decode_bcd(val: u32) -> u32 {
    ((val >> 4) & 0x0f) * 10 + (val & 0x0f)
}

/// Render a raw 32 bit version number in the given format
///
/// Returns `None` for formats that have no integer encoding.
pub fn from_u32(val: u32, format: VersionFormat) -> Option<String> {
    let rendered = match format {
        VersionFormat::Quad => format!(
            "{}.{}.{}.{}",
            (val >> 24) & 0xff,
            (val >> 16) & 0xff,
            (val >> 8) & 0xff,
            val & 0xff
        ),
        VersionFormat::Triplet => format!(
            "{}.{}.{}",
            (val >> 24) & 0xff,
            (val >> 16) & 0xff,
            val & 0xffff
        ),
        VersionFormat::Pair => format!("{}.{}", (val >> 16) & 0xffff, val & 0xffff),
        VersionFormat::Number | VersionFormat::Plain => val.to_string(),
        VersionFormat::Bcd => format!(
            "{}.{}.{}.{}",
            decode_bcd(val >> 24),
            decode_bcd(val >> 16),
            decode_bcd(val >> 8),
            decode_bcd(val)
        ),
        VersionFormat::IntelMe => format!(
            "{}.{}.{}.{}",
            ((val >> 29) & 0x07) + 0x0b,
            (val >> 24) & 0x1f,
            (val >> 16) & 0xff,
            val & 0xffff
        ),
        VersionFormat::IntelMe2 => format!(
            "{}.{}.{}.{}",
            (val >> 28) & 0x0f,
            (val >> 24) & 0x0f,
            (val >> 16) & 0xff,
            val & 0xffff
        ),
        VersionFormat::SurfaceLegacy => format!(
            "{}.{}.{}",
            (val >> 22) & 0x3ff,
            (val >> 10) & 0xfff,
            val & 0x3ff
        ),
        VersionFormat::Surface => format!(
            "{}.{}.{}",
            (val >> 24) & 0xff,
            (val >> 8) & 0xffff,
            val & 0xff
        ),
        VersionFormat::DellBios => format!(
            "{}.{}.{}",
            (val >> 16) & 0xff,
            (val >> 8) & 0xff,
            val & 0xff
        ),
        VersionFormat::Hex => format!("0x{:08x}", val),
        VersionFormat::Unknown => return None,
    };
    Some(rendered)
}

/// Render a raw 16 bit version number in the given format
pub fn from_u16(val: u16, format: VersionFormat) -> Option<String> {
    let rendered = match format {
        VersionFormat::Bcd => format!(
            "{}.{}",
            decode_bcd(u32::from(val >> 8)),
            decode_bcd(u32::from(val))
        ),
        VersionFormat::Pair => format!("{}.{}", (val >> 8) & 0xff, val & 0xff),
        VersionFormat::Number | VersionFormat::Plain => val.to_string(),
        VersionFormat::Hex => format!("0x{:04x}", val),
        _ => return None,
    };
    Some(rendered)
}

/// Convert an undotted integer version into dotted form using `format`
///
/// Dotted versions, `YYYYMMDD` dates and anything non-numeric are returned
/// untouched. Integers may be decimal or `0x`-prefixed hexadecimal.
pub fn parse_from_format(version: &str, format: VersionFormat) -> String {
    if version.contains('.') {
        return version.to_string();
    }
    if version.starts_with("20") && version.len() == 8 {
        return version.to_string();
    }

    let parsed = match version.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None if version.bytes().all(|b| b.is_ascii_digit()) => version.parse::<u64>().ok(),
        None => None,
    };
    match parsed {
        Some(val) if val != 0 => {
            from_u32(val as u32, format).unwrap_or_else(|| version.to_string())
        }
        _ => version.to_string(),
    }
}

/// Guess the version format from the shape of the version string
pub fn guess_format(version: &str) -> VersionFormat {
    if version.is_empty() {
        return VersionFormat::Unknown;
    }

    let sections: Vec<&str> = version.split('.').collect();
    if sections.len() == 1 {
        if version.starts_with("0x") || version.bytes().all(|b| b.is_ascii_digit()) {
            return VersionFormat::Number;
        }
        return VersionFormat::Plain;
    }
    if !sections
        .iter()
        .all(|s| s.bytes().all(|b| b.is_ascii_digit()))
    {
        return VersionFormat::Plain;
    }

    match sections.len() {
        2 => VersionFormat::Pair,
        3 => VersionFormat::Triplet,
        4 => VersionFormat::Quad,
        _ => VersionFormat::Unknown,
    }
}

/// Check that `version` has the shape `format` promises
pub fn verify_format(version: &str, format: VersionFormat) -> Result<()> {
    if matches!(format, VersionFormat::Plain | VersionFormat::Unknown) {
        return Ok(());
    }
    let guessed = guess_format(version);
    if guessed != format.base() {
        return Err(Error::InvalidFile(format!(
            "{} is not a valid {} (guessed {})",
            version, format, guessed
        )));
    }
    Ok(())
}

/// Compare two versions, taking the version format into account
///
/// `Plain` versions compare lexically. Everything else is split on `.` and
/// compared section by section: the leading integer first, then any
/// trailing text, where `~` sorts before everything (including the end of
/// the section).
pub fn compare(a: &str, b: &str, format: VersionFormat) -> Ordering {
    if format == VersionFormat::Plain {
        return a.cmp(b);
    }
    let (a, b): (Cow<'_, str>, Cow<'_, str>) = if format == VersionFormat::Unknown {
        (Cow::Borrowed(a), Cow::Borrowed(b))
    } else {
        (
            Cow::Owned(parse_from_format(a, format)),
            Cow::Owned(parse_from_format(b, format)),
        )
    };
    compare_dotted(&a, &b)
}

fn compare_dotted(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }

    let mut sections_a = a.split('.');
    let mut sections_b = b.split('.');
    loop {
        match (sections_a.next(), sections_b.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(section_a), Some(section_b)) => {
                let (num_a, rest_a) = leading_integer(section_a);
                let (num_b, rest_b) = leading_integer(section_b);
                match num_a.cmp(&num_b) {
                    Ordering::Equal => {}
                    other => return other,
                }
                if !rest_a.is_empty() || !rest_b.is_empty() {
                    match compare_chunk(rest_a, rest_b) {
                        Ordering::Equal => {}
                        other => return other,
                    }
                }
            }
        }
    }
}

/// Split a section into its leading (optionally signed) integer and the rest
fn leading_integer(section: &str) -> (i64, &str) {
    let trimmed = section.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'-') | Some(b'+')) {
        end = 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return (0, section);
    }

    // out of range saturates
    let value = trimmed[..end].parse::<i64>().unwrap_or(if bytes[0] == b'-' {
        i64::MIN
    } else {
        i64::MAX
    });
    (value, &trimmed[end..])
}

fn compare_char(a: Option<u8>, b: Option<u8>) -> Ordering {
    match (a, b) {
        (a, b) if a == b => Ordering::Equal,
        (Some(b'~'), _) => Ordering::Less,
        (_, Some(b'~')) => Ordering::Greater,
        (a, b) => a.unwrap_or(0).cmp(&b.unwrap_or(0)),
    }
}

fn compare_chunk(a: &str, b: &str) -> Ordering {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let common = a.len().min(b.len());
    for i in 0..common {
        let rc = compare_char(Some(a[i]), Some(b[i]));
        if rc != Ordering::Equal {
            return rc;
        }
    }
    compare_char(a.get(common).copied(), b.get(common).copied())
}
