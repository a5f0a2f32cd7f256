//! Plugin target technology versions and range matching.
//!
//! Ranges use the familiar comparator syntax: `>=`, `>`, `<=`, `<`, `=`,
//! caret and tilde ranges, `x`/`*` wildcards, hyphen ranges, whitespace for
//! conjunction and `||` for disjunction. Prerelease and build suffixes are
//! ignored on both sides.

use std::fmt;
use std::str::FromStr;

use super::config::MetaEdConfiguration;

/// Version value that turns a plugin off.
pub const DISABLED: &str = "disabled";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid version `{0}`, expected major.minor.patch")]
pub struct InvalidVersion(pub String);

impl Version {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Smallest version above every `major.*.*`, or `None` when no
    /// representable version is.
    fn after_major(major: u64) -> Option<Self> {
        Some(Self::new(major.checked_add(1)?, 0, 0))
    }

    fn after_minor(major: u64, minor: u64) -> Option<Self> {
        match minor.checked_add(1) {
            Some(minor) => Some(Self::new(major, minor, 0)),
            None => Self::after_major(major),
        }
    }

    fn after_patch(major: u64, minor: u64, patch: u64) -> Option<Self> {
        match patch.checked_add(1) {
            Some(patch) => Some(Self::new(major, minor, patch)),
            None => Self::after_minor(major, minor),
        }
    }
}

impl FromStr for Version {
    type Err = InvalidVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidVersion(s.to_owned());
        let partial = Partial::parse(s).ok_or_else(invalid)?;
        match partial {
            Partial {
                major: Some(major),
                minor: Some(minor),
                patch: Some(patch),
            } => Ok(Self::new(major, minor, patch)),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// True for the `disabled` marker, in any letter case.
pub fn is_disabled(version: &str) -> bool {
    version.trim().eq_ignore_ascii_case(DISABLED)
}

/// Target technology version for one plugin.
///
/// An explicit per-plugin override in the configuration wins, then the
/// manifest's own default, then the configuration-wide default.
pub fn target_technology_version_for(
    short_name: &str,
    manifest_default: Option<&str>,
    config: &MetaEdConfiguration,
) -> String {
    config
        .plugin_tech_versions
        .get(short_name)
        .map(String::as_str)
        .or(manifest_default)
        .unwrap_or(&config.default_plugin_tech_version)
        .to_owned()
}

/// True when `version` falls inside `range`.
///
/// Unparseable versions and ranges never match.
pub fn version_satisfies(version: &str, range: &str) -> bool {
    let Ok(version) = version.trim().parse::<Version>() else {
        return false;
    };
    range.split("||").any(|set| match parse_set(set) {
        Some(comparators) => comparators.iter().all(|c| c.matches(version)),
        None => false,
    })
}

/// A version with optional trailing components, as written in ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Partial {
    major: Option<u64>,
    minor: Option<u64>,
    patch: Option<u64>,
}

impl Partial {
    fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let text = text.strip_prefix(['v', 'V']).unwrap_or(text);
        let core = text.split(['-', '+']).next().unwrap_or_default();
        if core.is_empty() {
            return None;
        }

        let mut parts = core.split('.');
        let mut components = [None; 3];
        let mut wildcard = false;
        for slot in &mut components {
            let Some(part) = parts.next() else {
                break;
            };
            if matches!(part, "x" | "X" | "*") {
                wildcard = true;
                continue;
            }
            // Nothing concrete may follow a wildcard.
            if wildcard {
                return None;
            }
            *slot = Some(part.parse().ok()?);
        }
        if parts.next().is_some() {
            return None;
        }

        let [major, minor, patch] = components;
        Some(Self {
            major,
            minor,
            patch,
        })
    }

    fn floor(&self) -> Version {
        Version::new(
            self.major.unwrap_or(0),
            self.minor.unwrap_or(0),
            self.patch.unwrap_or(0),
        )
    }

    fn exact(&self) -> Option<Version> {
        Some(Version::new(self.major?, self.minor?, self.patch?))
    }

    /// First version past everything this partial covers. `None` for exact
    /// or wildcard partials, and when the bound lies past `u64::MAX`.
    fn next(&self) -> Option<Version> {
        let major = self.major?;
        match (self.minor, self.patch) {
            (None, _) => Version::after_major(major),
            (Some(minor), None) => Version::after_minor(major, minor),
            (Some(_), Some(_)) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Comparator {
    op: Op,
    version: Version,
}

impl Comparator {
    fn new(op: Op, version: Version) -> Self {
        Self { op, version }
    }

    fn matches(&self, version: Version) -> bool {
        match self.op {
            Op::Lt => version < self.version,
            Op::Le => version <= self.version,
            Op::Gt => version > self.version,
            Op::Ge => version >= self.version,
            Op::Eq => version == self.version,
        }
    }
}

const OPERATORS: [&str; 8] = [">=", "<=", "~>", ">", "<", "=", "~", "^"];

/// Parses one whitespace-separated comparator set. An empty set matches anything.
fn parse_set(set: &str) -> Option<Vec<Comparator>> {
    let tokens = join_operators(set);
    let mut comparators = Vec::new();

    if let [low, dash, high] = tokens.as_slice()
        && dash == "-"
    {
        comparators.push(Comparator::new(Op::Ge, Partial::parse(low)?.floor()));
        let high = Partial::parse(high)?;
        match high.exact() {
            Some(version) => comparators.push(Comparator::new(Op::Le, version)),
            None => push_below(high.next(), &mut comparators),
        }
        return Some(comparators);
    }

    for token in &tokens {
        desugar(token, &mut comparators)?;
    }
    Some(comparators)
}

/// Splits on whitespace, gluing a bare operator to the version after it.
fn join_operators(set: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    let mut pending: Option<&str> = None;
    for word in set.split_whitespace() {
        if OPERATORS.contains(&word) {
            pending = Some(word);
            continue;
        }
        match pending.take() {
            Some(op) => tokens.push(format!("{op}{word}")),
            None => tokens.push(word.to_owned()),
        }
    }
    if let Some(op) = pending {
        tokens.push(op.to_owned());
    }
    tokens
}

/// Adds `< upper`; an absent bound lets every version through.
fn push_below(upper: Option<Version>, out: &mut Vec<Comparator>) {
    if let Some(upper) = upper {
        out.push(Comparator::new(Op::Lt, upper));
    }
}

fn desugar(token: &str, out: &mut Vec<Comparator>) -> Option<()> {
    let (op, rest) = OPERATORS
        .iter()
        .find_map(|op| token.strip_prefix(op).map(|rest| (*op, rest)))
        .unwrap_or(("", token));

    let partial = Partial::parse(rest)?;
    let Some(major) = partial.major else {
        // `*` matches everything; `<*` and `>*` match nothing.
        if matches!(op, "<" | ">") {
            out.push(Comparator::new(Op::Lt, Version::new(0, 0, 0)));
        }
        return Some(());
    };
    let floor = partial.floor();

    match op {
        "" | "=" => match partial.exact() {
            Some(version) => out.push(Comparator::new(Op::Eq, version)),
            None => {
                out.push(Comparator::new(Op::Ge, floor));
                push_below(partial.next(), out);
            }
        },
        ">" => match (partial.exact(), partial.next()) {
            (Some(version), _) => out.push(Comparator::new(Op::Gt, version)),
            (None, Some(next)) => out.push(Comparator::new(Op::Ge, next)),
            // Nothing lies above the largest major.
            (None, None) => out.push(Comparator::new(Op::Lt, Version::new(0, 0, 0))),
        },
        ">=" => out.push(Comparator::new(Op::Ge, floor)),
        "<" => out.push(Comparator::new(Op::Lt, floor)),
        "<=" => match partial.exact() {
            Some(version) => out.push(Comparator::new(Op::Le, version)),
            None => push_below(partial.next(), out),
        },
        "~" | "~>" => {
            let upper = match partial.minor {
                Some(minor) => Version::after_minor(major, minor),
                None => Version::after_major(major),
            };
            out.push(Comparator::new(Op::Ge, floor));
            push_below(upper, out);
        }
        "^" => {
            let upper = match (major, partial.minor, partial.patch) {
                (0, Some(0), Some(patch)) => Version::after_patch(0, 0, patch),
                (0, Some(minor), _) => Version::after_minor(0, minor),
                _ => Version::after_major(major),
            };
            out.push(Comparator::new(Op::Ge, floor));
            push_below(upper, out);
        }
        _ => return None,
    }
    Some(())
}
