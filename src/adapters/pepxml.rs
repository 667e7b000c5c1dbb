//! Streaming pepXML reader keeping the rank-1 hit of every spectrum query.

use crate::domain::model::SpectrumMatch;
use crate::utils::error::{Result, ToolkitError};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::BufRead;
use std::path::{Path, PathBuf};

/// Attributes of an element, unescaped.
pub(crate) fn attributes(element: &BytesStart<'_>) -> Result<HashMap<Vec<u8>, String>> {
    let mut values = HashMap::new();
    for attr in element.attributes() {
        let attr = attr.map_err(quick_xml::Error::InvalidAttr)?;
        values.insert(attr.key.as_ref().to_vec(), attr.unescape_value()?.into_owned());
    }
    Ok(values)
}

fn parse_f64(values: &HashMap<Vec<u8>, String>, key: &[u8]) -> Option<f64> {
    values.get(key).and_then(|v| v.trim().parse().ok())
}

#[derive(Default)]
struct QueryState {
    spectrum: String,
    retention_time: Option<f64>,
    precursor_neutral_mass: f64,
    charge: u8,
}

#[derive(Default)]
struct HitState {
    peptide: String,
    modified_peptide: Option<String>,
    proteins: Vec<String>,
    hyperscore: Option<f64>,
    nextscore: Option<f64>,
    expect: Option<f64>,
    probability: Option<f64>,
    in_peptideprophet: bool,
}

struct PepXmlParser {
    query: Option<QueryState>,
    hit: Option<HitState>,
    matches: Vec<SpectrumMatch>,
}

impl PepXmlParser {
    fn open(&mut self, element: &BytesStart<'_>) -> Result<()> {
        match element.local_name().as_ref() {
            b"spectrum_query" => {
                let a = attributes(element)?;
                self.query = Some(QueryState {
                    spectrum: a.get(b"spectrum".as_slice()).cloned().unwrap_or_default(),
                    retention_time: parse_f64(&a, b"retention_time_sec"),
                    precursor_neutral_mass: parse_f64(&a, b"precursor_neutral_mass").unwrap_or(0.0),
                    charge: a
                        .get(b"assumed_charge".as_slice())
                        .and_then(|c| c.trim().parse().ok())
                        .unwrap_or(0),
                });
            }
            b"search_hit" if self.query.is_some() => {
                let a = attributes(element)?;
                let rank: u32 = a
                    .get(b"hit_rank".as_slice())
                    .and_then(|r| r.trim().parse().ok())
                    .unwrap_or(1);
                if rank == 1 {
                    self.hit = Some(HitState {
                        peptide: a.get(b"peptide".as_slice()).cloned().unwrap_or_default(),
                        proteins: a.get(b"protein".as_slice()).cloned().into_iter().collect(),
                        ..Default::default()
                    });
                }
            }
            name => {
                let Some(hit) = self.hit.as_mut() else {
                    return Ok(());
                };
                match name {
                    b"alternative_protein" => {
                        if let Some(p) = attributes(element)?.remove(b"protein".as_slice()) {
                            hit.proteins.push(p);
                        }
                    }
                    b"modification_info" => {
                        hit.modified_peptide = attributes(element)?.remove(b"modified_peptide".as_slice());
                    }
                    b"search_score" => {
                        let a = attributes(element)?;
                        let value = parse_f64(&a, b"value");
                        match a.get(b"name".as_slice()).map(String::as_str) {
                            Some("hyperscore") => hit.hyperscore = value,
                            Some("nextscore") => hit.nextscore = value,
                            Some("expect") => hit.expect = value,
                            _ => {}
                        }
                    }
                    b"analysis_result" => {
                        hit.in_peptideprophet = attributes(element)?
                            .get(b"analysis".as_slice())
                            .is_some_and(|a| a == "peptideprophet");
                    }
                    b"peptideprophet_result" if hit.in_peptideprophet => {
                        hit.probability = parse_f64(&attributes(element)?, b"probability");
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    fn close(&mut self, name: &[u8]) {
        match name {
            b"search_hit" => {
                let (Some(query), Some(hit)) = (self.query.as_ref(), self.hit.take()) else {
                    return;
                };
                self.matches.push(SpectrumMatch {
                    spectrum: query.spectrum.clone(),
                    retention_time: query.retention_time,
                    precursor_neutral_mass: query.precursor_neutral_mass,
                    charge: query.charge,
                    modified_peptide: hit.modified_peptide.unwrap_or_else(|| hit.peptide.clone()),
                    peptide: hit.peptide,
                    proteins: hit.proteins,
                    hyperscore: hit.hyperscore,
                    nextscore: hit.nextscore,
                    expect: hit.expect,
                    probability: hit.probability,
                });
            }
            b"analysis_result" => {
                if let Some(hit) = self.hit.as_mut() {
                    hit.in_peptideprophet = false;
                }
            }
            b"spectrum_query" => {
                self.query = None;
                self.hit = None;
            }
            _ => {}
        }
    }
}

pub fn read_pepxml<R: BufRead>(source: R) -> Result<Vec<SpectrumMatch>> {
    let mut reader = Reader::from_reader(source);
    reader.trim_text(true);
    let mut buffer = Vec::new();
    let mut parser = PepXmlParser {
        query: None,
        hit: None,
        matches: Vec::new(),
    };

    loop {
        match reader.read_event_into(&mut buffer)? {
            Event::Start(ref e) => parser.open(e)?,
            Event::Empty(ref e) => {
                parser.open(e)?;
                parser.close(e.local_name().as_ref());
            }
            Event::End(ref e) => parser.close(e.local_name().as_ref()),
            Event::Eof => break,
            _ => {}
        }
        buffer.clear();
    }

    Ok(parser.matches)
}

pub fn read_pepxml_file(path: &Path) -> Result<Vec<SpectrumMatch>> {
    let file = std::fs::File::open(path)?;
    read_pepxml(std::io::BufReader::new(file)).inspect_err(|e| {
        tracing::error!("Failed to parse {}: {}", path.display(), e);
    })
}

/// All `*.pep.xml` files directly inside `dir`, sorted by name.
pub fn find_pepxml_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.is_file()
                && p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(".pep.xml"))
        })
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(ToolkitError::NotFound {
            description: "pepXML files".to_string(),
            path: dir.join("*.pep.xml"),
        });
    }
    Ok(files)
}
