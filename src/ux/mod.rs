use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::time::Duration;

use crate::errors::Stage;
use crate::usage;
use crate::wire::{AgentResult, Explanation, GeneratedCode, PlanStep};

pub fn show_plan(plan: &PlanStep) {
    println!("\n=== PLAN ===");
    println!("{}", plan.layout.bold());
    if plan.components.is_empty() {
        println!("(no components)");
    }
    for (i, c) in plan.components.iter().enumerate() {
        let tag = if usage::is_allowed(c) { c.green().bold() } else { c.red().bold() };
        println!("{}. {}", i + 1, tag);
    }
    if !plan.reasoning.trim().is_empty() {
        println!("{}", plan.reasoning.dimmed());
    }
    println!();
}

pub fn show_code(code: &GeneratedCode) {
    println!("=== CODE ===");
    let used = code.component_usage.iter().map(|c| c.as_str()).collect::<Vec<_>>().join(", ");
    println!("{} {}", "components:".bold(), if used.is_empty() { "(none)".to_string() } else { used });
    println!("{}", code.code);
    println!();
}

pub fn show_explanation(e: &Explanation) {
    println!("=== EXPLANATION ===");
    println!("{} {}", "Layout:".bold(), e.layout_rationale);
    println!("{} {}", "Components:".bold(), e.component_choices);
    for (i, d) in e.decisions.iter().enumerate() {
        println!("{}. {}", i + 1, d);
    }
    println!();
}

pub fn show_result(r: &AgentResult) {
    show_plan(&r.plan);
    show_code(&r.code);
    show_explanation(&r.explanation);
}

pub fn show_error(msg: &str) {
    eprintln!("{} {}", "error:".red().bold(), msg);
}

fn stage_message(stage: Stage) -> &'static str {
    match stage {
        Stage::Planner => "Planning layout...",
        Stage::Generator => "Generating code...",
        Stage::Explainer => "Explaining decisions...",
    }
}

/// Single spinner re-labelled as the pipeline moves between stages.
pub struct StageSpinner {
    bar: ProgressBar,
}

impl StageSpinner {
    pub fn new(enabled: bool) -> Self {
        let bar = if enabled { ProgressBar::new_spinner() } else { ProgressBar::hidden() };
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} [{elapsed}] {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }

    pub fn on_stage(&self, stage: Stage) {
        self.bar.set_message(stage_message(stage));
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

/// Reads a credential from stdin. Empty input yields an empty string; the
/// pipeline rejects it before any network call.
pub fn prompt_api_key() -> String {
    print!("API key: ");
    let _ = io::stdout().flush();
    let mut s = String::new();
    if io::stdin().read_line(&mut s).is_ok() {
        s.trim().to_string()
    } else {
        String::new()
    }
}
