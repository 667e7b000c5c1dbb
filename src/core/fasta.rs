use crate::utils::error::Result;
use regex::Regex;
use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::sync::OnceLock;

fn pe_annotation() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\s*PE=[^\s]+").expect("valid PE regex"))
}

fn pe_value() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"PE=(\d+)").expect("valid PE value regex"))
}

/// Removes every `PE=` annotation (and the whitespace before it).
pub fn strip_pe(header: &str) -> String {
    pe_annotation().replace_all(header, "").into_owned()
}

/// Copies `database` verbatim, then appends the entries of `contaminants`
/// with `prefix` in front of each header. Returns the number of contaminant
/// entries appended.
pub fn append_contaminants<D, C, W>(
    mut database: D,
    contaminants: C,
    out: &mut W,
    prefix: &str,
) -> Result<usize>
where
    D: BufRead,
    C: BufRead,
    W: Write,
{
    let mut line = String::new();
    let mut ends_with_newline = true;
    loop {
        line.clear();
        if database.read_line(&mut line)? == 0 {
            break;
        }
        out.write_all(line.as_bytes())?;
        ends_with_newline = line.ends_with('\n');
    }
    if !ends_with_newline {
        out.write_all(b"\n")?;
    }

    let mut appended = 0;
    for line in contaminants.lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        match line.strip_prefix('>') {
            Some(header) => {
                let cleaned = strip_pe(header);
                writeln!(out, ">{}{}", prefix, cleaned.trim())?;
                appended += 1;
            }
            None => writeln!(out, "{}", line)?,
        }
    }

    Ok(appended)
}

/// Rewrites every header of `input` to end in ` PE={order}`, replacing any
/// existing annotation. Returns the number of entries written.
pub fn annotate_tier<R, W>(input: R, out: &mut W, order: &str) -> Result<usize>
where
    R: BufRead,
    W: Write,
{
    let mut entries = 0;
    for line in input.lines() {
        let line = line?;
        if line.starts_with('>') {
            let cleaned = strip_pe(&line);
            writeln!(out, "{} PE={}", cleaned.trim_end(), order)?;
            entries += 1;
        } else {
            writeln!(out, "{}", line)?;
        }
    }
    Ok(entries)
}

/// Maps each accession (first header token) to its `PE=` tier.
pub fn tier_map<R: BufRead>(reader: R) -> Result<HashMap<String, i64>> {
    let mut tiers = HashMap::new();
    for line in reader.lines() {
        let line = line?;
        let Some(header) = line.strip_prefix('>') else {
            continue;
        };
        let Some(caps) = pe_value().captures(header) else {
            continue;
        };
        let Ok(tier) = caps[1].parse::<i64>() else {
            continue;
        };
        let accession = header.split(' ').next().unwrap_or_default();
        tiers.insert(accession.to_string(), tier);
    }
    Ok(tiers)
}
