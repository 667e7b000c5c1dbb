use crate::adapters::pepxml::attributes;
use crate::domain::model::ProteinGroup;
use crate::utils::error::Result;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

/// Reads one group per `<protein>` element: its `protein_name` followed by
/// the names of its `<indistinguishable_protein>` children.
pub fn read_protxml<R: BufRead>(source: R) -> Result<Vec<ProteinGroup>> {
    let mut reader = Reader::from_reader(source);
    reader.trim_text(true);
    let mut buffer = Vec::new();
    let mut groups = Vec::new();
    let mut current: Option<ProteinGroup> = None;

    loop {
        let event = reader.read_event_into(&mut buffer)?;
        let (element, closes) = match &event {
            Event::Start(e) => (Some(e), false),
            Event::Empty(e) => (Some(e), true),
            Event::End(e) => {
                if e.local_name().as_ref() == b"protein" {
                    groups.extend(current.take());
                }
                (None, false)
            }
            Event::Eof => break,
            _ => (None, false),
        };

        if let Some(e) = element {
            match e.local_name().as_ref() {
                b"protein" => {
                    let mut a = attributes(e)?;
                    let group = ProteinGroup {
                        accessions: a.remove(b"protein_name".as_slice()).into_iter().collect(),
                        probability: a
                            .get(b"probability".as_slice())
                            .and_then(|p| p.trim().parse().ok())
                            .unwrap_or(0.0),
                    };
                    if closes {
                        groups.push(group);
                    } else {
                        current = Some(group);
                    }
                }
                b"indistinguishable_protein" => {
                    if let Some(group) = current.as_mut() {
                        group
                            .accessions
                            .extend(attributes(e)?.remove(b"protein_name".as_slice()));
                    }
                }
                _ => {}
            }
        }
        buffer.clear();
    }

    groups.retain(|g| !g.accessions.is_empty());
    Ok(groups)
}

pub fn read_protxml_file(path: &Path) -> Result<Vec<ProteinGroup>> {
    let file = std::fs::File::open(path)?;
    read_protxml(std::io::BufReader::new(file)).inspect_err(|e| {
        tracing::error!("Failed to parse {}: {}", path.display(), e);
    })
}

/// Highest group probability of every accession.
pub fn protein_probabilities(groups: &[ProteinGroup]) -> HashMap<String, f64> {
    let mut probabilities: HashMap<String, f64> = HashMap::new();
    for group in groups {
        for accession in &group.accessions {
            let entry = probabilities.entry(accession.clone()).or_insert(0.0);
            *entry = entry.max(group.probability);
        }
    }
    probabilities
}
