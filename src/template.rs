use crate::error::{Error, Result};
use serde::Serialize;
use tera::{Context, Tera};

const CAMPAIGN_PLAN: &str = "campaign_plan.md";

/// Send cadence: (day, step).
const CADENCE: [(u32, &str); 3] = [
    (1, "Initial outreach (Variant A/B split)"),
    (4, "Follow-up 1"),
    (8, "Follow-up 2"),
];

const DEMO_REMINDERS: [&str; 4] = [
    "Apollo export CSV",
    "OpenAI prompt + JSON output",
    "Instantly campaign screen (sequence + A/B settings)",
    "Airtable table import",
];

#[derive(Serialize)]
struct PlanContext<'a> {
    campaign: &'a str,
    lead_count: usize,
    generated_at: String,
    steps: Vec<StepView>,
    reminders: &'static [&'static str],
}

#[derive(Serialize)]
struct StepView {
    day: u32,
    label: &'static str,
}

/// Template engine for the human-readable campaign documents.
pub(crate) struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    /// Creates the engine with its built-in templates.
    ///
    /// # Errors
    ///
    /// Returns an error if a built-in template fails to parse.
    pub(crate) fn new() -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_template(
            CAMPAIGN_PLAN,
            include_str!("../templates/campaign_plan.tera"),
        )
        .map_err(|e| Error::template(CAMPAIGN_PLAN, e))?;

        Ok(Self { tera })
    }

    /// Renders the campaign plan.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering fails.
    pub(crate) fn render_campaign_plan(&self, campaign: &str, lead_count: usize) -> Result<String> {
        let context = PlanContext {
            campaign,
            lead_count,
            generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            steps: CADENCE
                .iter()
                .map(|&(day, label)| StepView { day, label })
                .collect(),
            reminders: &DEMO_REMINDERS,
        };

        let mut tera_context = Context::new();
        tera_context.insert("ctx", &context);

        self.tera
            .render(CAMPAIGN_PLAN, &tera_context)
            .map_err(|e| Error::template(CAMPAIGN_PLAN, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_engine_creation() {
        assert!(TemplateEngine::new().is_ok());
    }

    #[test]
    fn test_render_campaign_plan() {
        let engine = TemplateEngine::new().unwrap();
        let plan = engine.render_campaign_plan("Seed founders Q3", 2).unwrap();

        assert!(plan.starts_with("# Campaign Plan: Seed founders Q3\n"));
        assert!(plan.contains("for 2 leads."));
        assert!(plan.contains("- Day 1: Initial outreach (Variant A/B split)\n"));
        assert!(plan.contains("- Day 4: Follow-up 1\n"));
        assert!(plan.contains("- Day 8: Follow-up 2\n"));
        assert!(plan.contains("Each lead is exported twice"));
        assert!(plan.contains("- Airtable table import\n"));
        assert!(plan.contains("## Privacy Note"));
    }

    #[test]
    fn test_single_lead_is_not_pluralized() {
        let engine = TemplateEngine::new().unwrap();
        let plan = engine.render_campaign_plan("Solo", 1).unwrap();
        assert!(plan.contains("for 1 lead."));
    }

    #[test]
    fn test_campaign_name_is_not_escaped() {
        let engine = TemplateEngine::new().unwrap();
        let plan = engine.render_campaign_plan("A&B <pilot>", 1).unwrap();
        assert!(plan.contains("A&B <pilot>"));
    }
}
