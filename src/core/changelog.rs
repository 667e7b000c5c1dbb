//! Checks a Keep-a-Changelog style document whose sections are headed by
//! `## YYYY-MM-DD` and hold bullet lists.
//!
//! Problems are reported with their line numbers; the document is never
//! rewritten.

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangelogSection {
    pub line: usize,
    pub heading: String,
    pub date: Option<NaiveDate>,
    pub entries: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FindingKind {
    InvalidDate { heading: String },
    OutOfOrder { date: NaiveDate, previous: NaiveDate },
    DuplicateDate { date: NaiveDate },
    EmptyEntry,
    EmptySection { heading: String },
    OrphanEntry { text: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingSeverity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub line: usize,
    #[serde(flatten)]
    pub kind: FindingKind,
}

impl Finding {
    pub fn severity(&self) -> FindingSeverity {
        match self.kind {
            FindingKind::InvalidDate { .. } | FindingKind::EmptyEntry => FindingSeverity::Error,
            FindingKind::OutOfOrder { .. }
            | FindingKind::DuplicateDate { .. }
            | FindingKind::EmptySection { .. }
            | FindingKind::OrphanEntry { .. } => FindingSeverity::Warning,
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: ", self.line)?;
        match &self.kind {
            FindingKind::InvalidDate { heading } => {
                write!(f, "heading '{}' is not a valid YYYY-MM-DD date", heading)
            }
            FindingKind::OutOfOrder { date, previous } => write!(
                f,
                "{} is newer than the preceding section {} (possible year typo)",
                date, previous
            ),
            FindingKind::DuplicateDate { date } => write!(f, "{} appears more than once", date),
            FindingKind::EmptyEntry => write!(f, "empty bullet entry"),
            FindingKind::EmptySection { heading } => {
                write!(f, "section '{}' has no entries", heading)
            }
            FindingKind::OrphanEntry { text } => {
                write!(f, "entry '{}' comes before the first dated section", text)
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ChangelogReport {
    pub sections: Vec<ChangelogSection>,
    pub findings: Vec<Finding>,
}

impl ChangelogReport {
    pub fn errors(&self) -> usize {
        self.count(FindingSeverity::Error)
    }

    pub fn warnings(&self) -> usize {
        self.count(FindingSeverity::Warning)
    }

    pub fn entry_count(&self) -> usize {
        self.sections.iter().map(|s| s.entries.len()).sum()
    }

    fn count(&self, severity: FindingSeverity) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity() == severity)
            .count()
    }
}

fn date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").expect("valid date regex"))
}

fn parse_heading_date(heading: &str) -> Option<NaiveDate> {
    let caps = date_pattern().captures(heading)?;
    let year = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    let day = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn is_unreleased(heading: &str) -> bool {
    heading.trim_matches(|c: char| c == '[' || c == ']').eq_ignore_ascii_case("unreleased")
}

/// Returns the bullet text when `line` is a bullet item.
fn bullet_text(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    let rest = trimmed.strip_prefix(|c: char| matches!(c, '-' | '*' | '+'))?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

pub fn check_changelog(text: &str) -> ChangelogReport {
    let mut report = ChangelogReport::default();
    let mut previous_date: Option<NaiveDate> = None;
    let mut seen_dates = HashSet::new();

    for (index, raw_line) in text.lines().enumerate() {
        let line_no = index + 1;

        if let Some(heading) = raw_line.strip_prefix("## ") {
            let heading = heading.trim().to_string();
            let date = parse_heading_date(&heading);

            match date {
                Some(date) => {
                    if !seen_dates.insert(date) {
                        report.findings.push(Finding {
                            line: line_no,
                            kind: FindingKind::DuplicateDate { date },
                        });
                    } else if let Some(previous) = previous_date.filter(|p| date > *p) {
                        report.findings.push(Finding {
                            line: line_no,
                            kind: FindingKind::OutOfOrder { date, previous },
                        });
                    }
                    previous_date = Some(date);
                }
                None if is_unreleased(&heading) => {}
                None => report.findings.push(Finding {
                    line: line_no,
                    kind: FindingKind::InvalidDate {
                        heading: heading.clone(),
                    },
                }),
            }

            report.sections.push(ChangelogSection {
                line: line_no,
                heading,
                date,
                entries: Vec::new(),
            });
            continue;
        }

        let Some(section) = report.sections.last_mut() else {
            if let Some(text) = bullet_text(raw_line).filter(|t| !t.is_empty()) {
                report.findings.push(Finding {
                    line: line_no,
                    kind: FindingKind::OrphanEntry {
                        text: text.to_string(),
                    },
                });
            }
            continue;
        };

        if let Some(entry) = bullet_text(raw_line) {
            if entry.is_empty() {
                report.findings.push(Finding {
                    line: line_no,
                    kind: FindingKind::EmptyEntry,
                });
            } else {
                section.entries.push(entry.to_string());
            }
        } else if raw_line.starts_with(char::is_whitespace) && !raw_line.trim().is_empty() {
            // Wrapped continuation of the previous bullet.
            if let Some(last) = section.entries.last_mut() {
                last.push(' ');
                last.push_str(raw_line.trim());
            }
        }
    }

    for section in &report.sections {
        if section.entries.is_empty() && !is_unreleased(&section.heading) {
            report.findings.push(Finding {
                line: section.line,
                kind: FindingKind::EmptySection {
                    heading: section.heading.clone(),
                },
            });
        }
    }
    report.findings.sort_by_key(|f| f.line);

    report
}
