use crate::{
    error::{Error, Result},
    lead::Lead,
    message::{MessagePack, Variant},
    template::TemplateEngine,
};
use serde::Serialize;
use std::{
    collections::HashMap,
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

/// Combined lead and message record file.
pub const OUTREACH_PACK_FILE: &str = "outreach_pack.json";
/// Two-rows-per-lead export for the sequencing tool.
pub const INSTANTLY_FILE: &str = "instantly_import.csv";
/// Two-rows-per-lead export for CRM-style tracking.
pub const AIRTABLE_FILE: &str = "airtable_import.csv";
/// Human-readable campaign plan.
pub const CAMPAIGN_PLAN_FILE: &str = "campaign_plan.md";

const INSTANTLY_HEADERS: [&str; 12] = [
    "email",
    "first_name",
    "last_name",
    "company",
    "role",
    "industry",
    "stage",
    "subject",
    "body",
    "followup_1",
    "followup_2",
    "variant",
];

const AIRTABLE_HEADERS: [&str; 12] = [
    "Name",
    "Role",
    "Company",
    "Industry",
    "Stage",
    "Email",
    "Source",
    "Email Version",
    "Opened",
    "Replied",
    "Interested",
    "Notes",
];

#[derive(Serialize)]
struct OutreachRecord<'a> {
    lead: &'a Lead,
    messages: &'a MessagePack,
}

/// Serializes leads and their message packs into the export artifacts.
///
/// Inputs are trusted: every pack has already passed validation.
pub(crate) struct Exporter {
    output_dir: PathBuf,
    template_engine: TemplateEngine,
}

impl Exporter {
    /// Creates an exporter writing into `output_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if template engine initialization fails.
    pub(crate) fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            output_dir: output_dir.into(),
            template_engine: TemplateEngine::new()?,
        })
    }

    /// Writes all four artifacts and returns their paths.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A lead has no message pack
    /// - Template rendering fails
    /// - File write operations fail
    pub(crate) fn export_all(
        &self,
        campaign: &str,
        leads: &[Lead],
        packs: &HashMap<String, MessagePack>,
    ) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.output_dir).map_err(|e| Error::io(&self.output_dir, e))?;

        info!("Exporting {} leads to {}", leads.len(), self.output_dir.display());

        let written = vec![
            self.write_outreach_pack(leads, packs)?,
            self.write_instantly_csv(leads, packs)?,
            self.write_airtable_csv(leads)?,
            self.write_campaign_plan(campaign, leads.len())?,
        ];

        info!("Successfully wrote {} export files", written.len());
        Ok(written)
    }

    /// Writes one `{ lead, messages }` record per lead as pretty JSON.
    pub(crate) fn write_outreach_pack(
        &self,
        leads: &[Lead],
        packs: &HashMap<String, MessagePack>,
    ) -> Result<PathBuf> {
        let records = leads
            .iter()
            .map(|lead| {
                Ok(OutreachRecord {
                    lead,
                    messages: pack_for(packs, lead)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let content = serde_json::to_string_pretty(&records)?;
        self.write_artifact(OUTREACH_PACK_FILE, content.as_bytes())
    }

    /// Writes the sequencing-tool export: one row per lead and variant.
    pub(crate) fn write_instantly_csv(
        &self,
        leads: &[Lead],
        packs: &HashMap<String, MessagePack>,
    ) -> Result<PathBuf> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record(INSTANTLY_HEADERS)?;

        for lead in leads {
            let pack = pack_for(packs, lead)?;
            for variant in Variant::ALL {
                let (subject, body) = pack.variant(variant);
                wtr.write_record([
                    lead.email.as_str(),
                    lead.first_name.as_str(),
                    lead.last_name.as_str(),
                    lead.company.as_str(),
                    lead.role.as_str(),
                    lead.industry.as_str(),
                    lead.stage.as_str(),
                    subject,
                    body,
                    pack.followup_1.as_str(),
                    pack.followup_2.as_str(),
                    variant.tag(),
                ])?;
            }
        }

        self.write_artifact(INSTANTLY_FILE, &finish_csv(wtr)?)
    }

    /// Writes the CRM export with empty tracking columns.
    pub(crate) fn write_airtable_csv(&self, leads: &[Lead]) -> Result<PathBuf> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record(AIRTABLE_HEADERS)?;

        for lead in leads {
            let name = lead.full_name();
            for variant in Variant::ALL {
                wtr.write_record([
                    name.as_str(),
                    lead.role.as_str(),
                    lead.company.as_str(),
                    lead.industry.as_str(),
                    lead.stage.as_str(),
                    lead.email.as_str(),
                    lead.source.as_str(),
                    variant.tag(),
                    "",
                    "",
                    "",
                    "",
                ])?;
            }
        }

        self.write_artifact(AIRTABLE_FILE, &finish_csv(wtr)?)
    }

    /// Renders and writes the campaign plan document.
    pub(crate) fn write_campaign_plan(&self, campaign: &str, lead_count: usize) -> Result<PathBuf> {
        let content = self
            .template_engine
            .render_campaign_plan(campaign, lead_count)?;
        self.write_artifact(CAMPAIGN_PLAN_FILE, content.as_bytes())
    }

    fn write_artifact(&self, name: &str, content: &[u8]) -> Result<PathBuf> {
        let path = self.output_dir.join(name);
        write_file_atomic(&path, content)?;
        debug!("Wrote {} ({} bytes)", path.display(), content.len());
        Ok(path)
    }
}

fn pack_for<'a>(packs: &'a HashMap<String, MessagePack>, lead: &Lead) -> Result<&'a MessagePack> {
    packs.get(&lead.email).ok_or_else(|| Error::MissingPack {
        email: lead.email.clone(),
    })
}

fn finish_csv(wtr: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    wtr.into_inner().map_err(|e| Error::Csv {
        message: e.to_string(),
    })
}

/// Writes a file atomically.
///
/// # Process
///
/// 1. Writes content to a temporary sibling file
/// 2. Syncs the temporary file to disk
/// 3. Atomically renames it over the target path
pub(crate) fn write_file_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let temp_path = path.with_extension("tmp");
    let mut temp_file = fs::File::create(&temp_path).map_err(|e| Error::io(&temp_path, e))?;

    temp_file
        .write_all(content)
        .map_err(|e| Error::io(&temp_path, e))?;

    temp_file
        .sync_all()
        .map_err(|e| Error::io(&temp_path, e))?;

    drop(temp_file);

    fs::rename(&temp_path, path).map_err(|e| Error::io(path, e))?;

    Ok(())
}
