use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::profile::{DEFAULT_HEIGHT_CM, DEFAULT_WEIGHT_KG, UserProfile};

/// NutrIA: AI nutrition advisor.
///
/// Generates 3-day meal plans and answers nutrition questions with Gemini,
/// and keeps the plans you choose to save as text files.
#[derive(Debug, Parser)]
#[command(name = "nutria", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Ask the AI nutritionist a free question.
    Ask(AskArgs),

    /// Generate a 3-day meal plan from your parameters.
    Plan(PlanArgs),

    /// Print the prompt that `plan` would send, without calling the AI.
    Prompt(ProfileArgs),

    /// List saved plans, most recent first.
    History(HistoryArgs),

    /// Show the content of a saved plan.
    Show(ShowArgs),

    /// Interactive session: fill the form, generate, save and browse history.
    Session,
}

/// Options shared by every subcommand.
///
/// Each can also be set via config file or `NUTRIA_*` env vars.
/// Precedence: CLI > env > file.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct CommonArgs {
    /// Path to a TOML configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Gemini model identifier (default: "gemini-2.5-flash").
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Base URL of the Generative Language API.
    #[arg(long, global = true)]
    pub api_base: Option<String>,

    /// Directory where saved plans live (default: "planes_nutricionales_guardados").
    #[arg(long, global = true)]
    pub storage_dir: Option<PathBuf>,

    /// Secret store holding `gemini_api_key` (default: ".streamlit/secrets.toml").
    #[arg(long, global = true)]
    pub secrets: Option<PathBuf>,

    /// Request timeout in seconds. Unset means no local timeout.
    #[arg(long, global = true)]
    pub request_timeout_sec: Option<u64>,

    /// Stderr log level filter (default: "warn"). Supports tracing directives
    /// (e.g. "debug", "nutria=trace,warn"). Overridden by NUTRIA_LOG env var.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Path to a log file. When set, structured JSON logs are appended here
    /// in addition to the human-readable stderr output.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Print Markdown as-is instead of styling it for the terminal.
    #[arg(long, global = true, default_value_t = false)]
    pub plain: bool,
}

#[derive(Debug, Clone, clap::Args)]
pub struct AskArgs {
    /// The question; multiple words are joined with spaces.
    #[arg(required = true, num_args = 1..)]
    pub question: Vec<String>,
}

impl AskArgs {
    pub fn text(&self) -> String {
        self.question.join(" ")
    }
}

/// The form fields of a meal plan request.
#[derive(Debug, Clone, clap::Args)]
pub struct ProfileArgs {
    /// Nutritional objective (e.g. "lose weight").
    #[arg(long)]
    pub objective: String,

    /// Age in years.
    #[arg(long)]
    pub age: u32,

    /// Height in cm (50-300).
    #[arg(long, default_value_t = DEFAULT_HEIGHT_CM, value_parser = clap::value_parser!(u32).range(50..=300))]
    pub height: u32,

    /// Weight in kg (up to 500).
    #[arg(long, default_value_t = DEFAULT_WEIGHT_KG)]
    pub weight: f64,

    /// Extra context (e.g. a diagnosis or allergies).
    #[arg(long, default_value = "")]
    pub context: String,
}

impl From<&ProfileArgs> for UserProfile {
    fn from(args: &ProfileArgs) -> Self {
        UserProfile {
            objective: args.objective.clone(),
            age: args.age,
            height_cm: args.height,
            weight_kg: args.weight,
            context: args.context.clone(),
        }
    }
}

#[derive(Debug, Clone, clap::Args)]
pub struct PlanArgs {
    #[command(flatten)]
    pub profile: ProfileArgs,

    /// Save the generated plan right away.
    #[arg(long, default_value_t = false)]
    pub save: bool,
}

#[derive(Debug, Clone, clap::Args)]
pub struct HistoryArgs {
    /// Show only the N most recent plans.
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, clap::Args)]
pub struct ShowArgs {
    /// File name as printed by `history`.
    pub filename: String,
}
