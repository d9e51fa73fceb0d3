use crate::{
    config::Config,
    error::{Error, Result},
    generator::{Generator, PackOrigin},
    lead::{self, Lead},
    message::MessagePack,
    writer::Exporter,
};
use serde::Serialize;
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};
use tracing::{error, info, instrument, warn};

/// Cleaned copy of the input table.
pub const CLEAN_LEADS_FILE: &str = "leads_clean.csv";
/// Subdirectory of the output directory holding the run log.
pub const LOG_DIR: &str = "logs";
/// Run log file name.
pub const LOG_FILE: &str = "run.log";

/// Statistics collected during a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunStats {
    /// Unique leads loaded from the input
    pub leads_loaded: usize,

    /// Packs produced by the backend
    pub packs_generated: usize,

    /// Packs filled with demo copy
    pub demo_packs: usize,

    /// Output files written, the log excluded
    pub files_written: usize,

    /// Total execution time
    pub duration: Duration,

    /// Time spent generating copy
    pub generation_duration: Duration,

    /// Output directory path
    pub output_directory: String,
}

impl RunStats {
    /// Prints a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!("\n╔═══════════════════════════════════════════════════════╗");
        println!("║              Outreach Run Summary                     ║");
        println!("╠═══════════════════════════════════════════════════════╣");
        println!(
            "║ Leads Loaded:         {:>8}                        ║",
            self.leads_loaded
        );
        println!(
            "║   - Generated:        {:>8}                        ║",
            self.packs_generated
        );
        println!(
            "║   - Demo copy:        {:>8}                        ║",
            self.demo_packs
        );
        println!("║                                                       ║");
        println!(
            "║ Files Written:        {:>8}                        ║",
            self.files_written
        );
        println!("║ Output Directory:                                     ║");
        println!(
            "║   {}                                              ║",
            self.output_directory
        );
        println!("║                                                       ║");
        println!(
            "║   - Generation:       {:>8.2}s                     ║",
            self.generation_duration.as_secs_f64()
        );
        println!(
            "║   - Total:            {:>8.2}s                     ║",
            self.duration.as_secs_f64()
        );
        println!("╚═══════════════════════════════════════════════════════╝\n");
    }
}

/// Creates the output directory and its log subdirectory.
///
/// # Errors
///
/// Returns an error if either directory cannot be created.
pub fn ensure_output_dirs(output_dir: &Path) -> Result<PathBuf> {
    let log_dir = output_dir.join(LOG_DIR);
    fs::create_dir_all(&log_dir).map_err(|e| Error::io(&log_dir, e))?;
    Ok(log_dir)
}

/// Runs one outreach batch: load, generate, export.
pub struct Pipeline {
    config: Config,
    generator: Generator,
    exporter: Exporter,
}

impl Pipeline {
    /// Creates a new pipeline with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration validation fails
    /// - The HTTP client or template engine cannot be initialized
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let generator = Generator::new(
            config.settings.clone(),
            config.api_key.as_deref(),
            config.dry_run,
        )?;
        Self::with_generator(config, generator)
    }

    /// Creates a pipeline around an already built generator.
    ///
    /// # Errors
    ///
    /// Returns an error if the template engine cannot be initialized.
    pub fn with_generator(config: Config, generator: Generator) -> Result<Self> {
        let exporter = Exporter::new(&config.output_dir)?;

        Ok(Self {
            config,
            generator,
            exporter,
        })
    }

    /// Executes the run and returns statistics.
    ///
    /// # Process
    ///
    /// 1. **Load**: reads and deduplicates leads, writes the cleaned table
    /// 2. **Generate**: one message pack per lead, strictly in order
    /// 3. **Export**: JSON record file, two CSV exports, campaign plan
    ///
    /// # Errors
    ///
    /// Returns the first error. A lead whose generation fails aborts the run;
    /// files already written are kept.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use outreach_gen::{Config, Pipeline};
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let config = Config::builder()
    ///     .input_path("leads.csv")
    ///     .output_dir("out")
    ///     .campaign("Q3 founders")
    ///     .dry_run(true)
    ///     .build()?;
    ///
    /// let stats = Pipeline::new(config)?.run()?;
    /// stats.print_summary();
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip(self), fields(campaign = %self.config.campaign))]
    pub fn run(self) -> Result<RunStats> {
        let start_time = Instant::now();
        let output_dir = &self.config.output_dir;

        ensure_output_dirs(output_dir)?;

        info!("Stage 1/3: Loading leads from {}", self.config.input_path.display());
        let leads = lead::read_leads(&self.config.input_path)?;
        info!("✓ Loaded {} leads", leads.len());

        let clean_path = output_dir.join(CLEAN_LEADS_FILE);
        lead::write_clean_csv(&clean_path, &leads)?;
        info!("✓ Wrote cleaned leads: {}", clean_path.display());

        if self.generator.is_offline() {
            warn!("No backend configured (dry run or missing credential) - using demo copy");
        }

        info!("Stage 2/3: Generating messages...");
        let generation_start = Instant::now();
        let (packs, origins) = self.generate_all(&leads)?;
        let generation_duration = generation_start.elapsed();
        info!(
            "✓ Generated {} message packs in {:.2}s",
            packs.len(),
            generation_duration.as_secs_f64()
        );

        info!("Stage 3/3: Writing exports...");
        let exported = self
            .exporter
            .export_all(&self.config.campaign, &leads, &packs)?;

        if self.config.dry_run {
            info!("Dry run mode enabled. No external sends performed.");
        }

        let duration = start_time.elapsed();
        let demo_packs = origins
            .iter()
            .filter(|origin| **origin != PackOrigin::Backend)
            .count();

        let stats = RunStats {
            leads_loaded: leads.len(),
            packs_generated: origins.len() - demo_packs,
            demo_packs,
            files_written: exported.len() + 1,
            duration,
            generation_duration,
            output_directory: output_dir.display().to_string(),
        };

        info!("✓ Run completed successfully in {:.2}s", duration.as_secs_f64());

        Ok(stats)
    }

    /// Generates packs in input order, stopping at the first failure.
    fn generate_all(
        &self,
        leads: &[Lead],
    ) -> Result<(HashMap<String, MessagePack>, Vec<PackOrigin>)> {
        let mut packs = HashMap::with_capacity(leads.len());
        let mut origins = Vec::with_capacity(leads.len());

        for (idx, lead) in leads.iter().enumerate() {
            info!("Generating messages for {} ({}/{})", lead.email, idx + 1, leads.len());

            match self.generator.generate(lead) {
                Ok((pack, origin)) => {
                    packs.insert(lead.email.clone(), pack);
                    origins.push(origin);
                }
                Err(err) => {
                    error!("Generation failed for {}: {}", lead.email, err);
                    return Err(err);
                }
            }
        }

        Ok((packs, origins))
    }
}
