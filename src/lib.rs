//! # outreach-gen
//!
//! Generates personalized, validated outreach copy for a list of leads and
//! exports it for sequencing and CRM tools.
//!
//! ## Features
//!
//! - CSV lead loading with normalization and deduplication by email
//! - Two A/B subject/body variants plus two follow-ups per lead
//! - Content validation (word ceiling, ASCII only, banned terms) with
//!   escalating retries against the generation backend
//! - Offline dry-run mode with deterministic demo copy
//! - JSON, CSV and Markdown exports written atomically
//!
//! ## Quick Start
//!
//! ```no_run
//! use outreach_gen::{Config, Pipeline};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::builder()
//!     .input_path("leads.csv")
//!     .output_dir("out")
//!     .campaign("Seed founders")
//!     .dry_run(true)
//!     .build()?;
//!
//! Pipeline::new(config)?.run()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The library follows a pipeline architecture:
//! 1. **Loader**: reads and deduplicates leads
//! 2. **Generator**: prompts the backend, validates, retries or falls back
//! 3. **Exporter**: renders and persists the output files

#![warn(
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::module_name_repetitions)]

mod config;
mod error;
mod generator;
mod lead;
mod message;
mod pipeline;
mod prompt;
mod template;
mod validator;
mod writer;

pub mod backend;

pub use config::{Config, ConfigBuilder, DEFAULT_CONFIG_FILE, ExhaustionPolicy, Settings};
pub use error::{Error, Result};
pub use generator::{Generator, MAX_ATTEMPTS, PackOrigin, demo_pack};
pub use lead::{DEFAULT_SOURCE, Lead, MIN_EMAIL_LEN, REQUIRED_COLUMNS, read_leads, read_leads_from_reader, write_clean_csv};
pub use message::{MessagePack, Variant};
pub use pipeline::{CLEAN_LEADS_FILE, LOG_DIR, LOG_FILE, Pipeline, RunStats, ensure_output_dirs};
pub use prompt::{Prompt, PromptKind, SYSTEM_PROMPT};
pub use validator::{ValidationError, validate_message_pack, word_count};
pub use writer::{AIRTABLE_FILE, CAMPAIGN_PLAN_FILE, INSTANTLY_FILE, OUTREACH_PACK_FILE};

/// Runs a complete outreach batch with the given configuration.
///
/// This is the main entry point for the library.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration is invalid
/// - The lead table lacks required columns
/// - Generation fails for any lead
/// - Output files cannot be written
///
/// # Examples
///
/// ```no_run
/// use outreach_gen::{Config, run};
///
/// # fn main() -> anyhow::Result<()> {
/// let config = Config::builder()
///     .input_path("leads.csv")
///     .campaign("Seed founders")
///     .build()?;
///
/// run(config)?;
/// # Ok(())
/// # }
/// ```
pub fn run(config: Config) -> Result<RunStats> {
    Pipeline::new(config)?.run()
}
