use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI-compatible chat completions (OpenAI, Groq, ...)
    #[value(alias = "open-ai", alias = "groq")]
    OpenAI,
    #[value(alias = "claude")]
    Anthropic,
}

#[derive(Parser, Debug)]
#[command(name = "vibe_ui", version, about = "Natural-language UI generator with a sandboxed React preview")]
pub struct Args {
    /// TOML config file; flags override its values
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[arg(long, value_enum, global = true)]
    pub provider: Option<ProviderKind>,

    #[arg(long, global = true)]
    pub model: Option<String>,

    #[arg(long, global = true)]
    pub api_base: Option<String>,

    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    #[arg(long, default_value_t = false, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the HTTP API
    Serve {
        #[arg(long)]
        bind: Option<String>,
    },
    /// Run one Planner → Generator → Explainer cycle and print the result
    Generate(GenerateArgs),
    /// Write a sandboxed preview document for a component source file
    Preview {
        /// Component source (.jsx/.tsx)
        input: String,
        #[arg(long, default_value = "preview.html")]
        out: String,
    },
}

#[derive(ClapArgs, Debug)]
pub struct GenerateArgs {
    /// What to build, e.g. "a login form with email and password"
    #[arg(long)]
    pub intent: String,

    /// File holding the current component source to modify
    #[arg(long)]
    pub current: Option<String>,

    /// Provider credential; prompted for when omitted
    #[arg(long)]
    pub api_key: Option<String>,

    /// Write the generated code here instead of only printing it
    #[arg(long)]
    pub out: Option<String>,

    /// Save plan, code and explanation under DIR/<run id>/
    #[arg(long, value_name = "DIR")]
    pub artifacts: Option<String>,

    /// Disable the per-stage spinner
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,
}
