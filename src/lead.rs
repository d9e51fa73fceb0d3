use crate::error::{Error, Result};
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;

/// Columns every lead table must provide, in canonical order.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "first_name",
    "last_name",
    "role",
    "company",
    "industry",
    "stage",
    "email",
];

/// Shortest email accepted on a kept row.
pub const MIN_EMAIL_LEN: usize = 3;

/// Source label used when the table has no usable `source` value.
pub const DEFAULT_SOURCE: &str = "Apollo";

/// A prospective contact, identified by its lowercased email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    /// Given name
    pub first_name: String,

    /// Family name
    pub last_name: String,

    /// Job title
    pub role: String,

    /// Company name
    pub company: String,

    /// Industry of the company
    pub industry: String,

    /// Company funding or growth stage
    pub stage: String,

    /// Lowercased email, unique within a load
    pub email: String,

    /// Where the lead came from
    pub source: String,
}

impl Lead {
    /// First and last name joined by a space.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Reads and deduplicates leads from a CSV file.
///
/// # Errors
///
/// Returns an error if the file cannot be opened, a required column is
/// missing, or a kept row has an empty required field.
pub fn read_leads(path: impl AsRef<Path>) -> Result<Vec<Lead>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    read_leads_from_reader(BufReader::new(file))
}

/// Reads and deduplicates leads from any CSV source.
///
/// Every field is trimmed and emails are lowercased. Rows with an empty
/// email, or an email already seen, are skipped; the first occurrence wins.
///
/// # Errors
///
/// Returns [`Error::MissingColumns`] before reading any row if the header
/// lacks a required column, and [`Error::InvalidLead`] if a kept row has an
/// empty required field or an email shorter than [`MIN_EMAIL_LEN`].
pub fn read_leads_from_reader<R: Read>(reader: R) -> Result<Vec<Lead>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let header_map = build_header_map(rdr.headers()?);

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| !header_map.contains_key(**column))
        .map(ToString::to_string)
        .collect();
    if !missing.is_empty() {
        return Err(Error::MissingColumns { columns: missing });
    }

    let mut leads = Vec::new();
    let mut seen = HashSet::new();

    for (row_idx, result) in rdr.records().enumerate() {
        let row = row_idx + 2; // header is row 1
        let record = result?;
        let field = |name: &str| get_field(&record, &header_map, name);

        let email = field("email").to_lowercase();
        if email.is_empty() {
            debug!("Row {}: skipping lead without email", row);
            continue;
        }
        if !seen.insert(email.clone()) {
            debug!("Row {}: skipping duplicate lead {}", row, email);
            continue;
        }

        let source = field("source");
        let lead = Lead {
            first_name: field("first_name"),
            last_name: field("last_name"),
            role: field("role"),
            company: field("company"),
            industry: field("industry"),
            stage: field("stage"),
            email,
            source: if source.is_empty() {
                DEFAULT_SOURCE.to_string()
            } else {
                source
            },
        };
        ensure_complete(&lead, row)?;
        leads.push(lead);
    }

    Ok(leads)
}

/// Writes leads back out with the required columns in canonical order.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_clean_csv(path: impl AsRef<Path>, leads: &[Lead]) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut wtr = WriterBuilder::new().from_writer(file);

    wtr.write_record(REQUIRED_COLUMNS)?;
    for lead in leads {
        wtr.write_record([
            &lead.first_name,
            &lead.last_name,
            &lead.role,
            &lead.company,
            &lead.industry,
            &lead.stage,
            &lead.email,
        ])?;
    }
    wtr.flush().map_err(|e| Error::io(path, e))?;

    Ok(())
}

fn ensure_complete(lead: &Lead, row: usize) -> Result<()> {
    let values = [
        ("first_name", &lead.first_name),
        ("last_name", &lead.last_name),
        ("role", &lead.role),
        ("company", &lead.company),
        ("industry", &lead.industry),
        ("stage", &lead.stage),
    ];

    if let Some((field, _)) = values.iter().find(|(_, value)| value.is_empty()) {
        return Err(Error::InvalidLead {
            row,
            field: (*field).to_string(),
        });
    }

    if lead.email.chars().count() < MIN_EMAIL_LEN {
        return Err(Error::InvalidLead {
            row,
            field: "email".to_string(),
        });
    }

    Ok(())
}

/// Maps each header name to its column index; the first duplicate wins.
fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    for (idx, header) in headers.iter().enumerate() {
        map.entry(header.trim().to_string()).or_insert(idx);
    }
    map
}

fn get_field(record: &StringRecord, header_map: &HashMap<String, usize>, field: &str) -> String {
    header_map
        .get(field)
        .and_then(|&idx| record.get(idx))
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}
