use std::path::Path;

use anyhow::Context;
use clap::Parser;
use fs_err as fs;
use uuid::Uuid;

use vibe_ui::agent::Agent;
use vibe_ui::cli::{Args, Command, GenerateArgs};
use vibe_ui::config::Config;
use vibe_ui::preview::{build_document, ComponentRegistry};
use vibe_ui::{logging, provider, server, ux};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init(args.debug);
    let cfg = Config::resolve(&args)?;
    log::debug!("config: {:?}", cfg);

    match args.command {
        Command::Serve { bind } => {
            let mut cfg = cfg;
            if let Some(b) = bind {
                cfg.bind = b;
            }
            server::serve(cfg).await
        }
        Command::Generate(g) => generate(&cfg, g).await,
        Command::Preview { input, out } => preview(&cfg, &input, &out),
    }
}

async fn generate(cfg: &Config, g: GenerateArgs) -> anyhow::Result<()> {
    let current = match &g.current {
        Some(p) => fs::read_to_string(p)?,
        None => String::new(),
    };
    let api_key = match g.api_key {
        Some(k) => k,
        None => ux::prompt_api_key(),
    };

    let agent = Agent::new(provider::make_provider(cfg)?);
    let spinner = ux::StageSpinner::new(!g.no_progress);
    let outcome = agent
        .run_with_progress(&g.intent, &current, &api_key, &|stage| spinner.on_stage(stage))
        .await;
    spinner.finish();

    let result = match outcome {
        Ok(r) => r,
        Err(e) => {
            ux::show_error(&e.to_string());
            return Err(e.into());
        }
    };
    ux::show_result(&result);

    if let Some(out) = &g.out {
        fs::write(out, &result.code.code)?;
        println!("code written to {}", out);
    }
    if let Some(dir) = &g.artifacts {
        let saved = logging::save_artifacts(Path::new(dir), Uuid::new_v4(), &result)?;
        println!("artifacts saved in {}", saved.dir.display());
    }
    Ok(())
}

fn preview(cfg: &Config, input: &str, out: &str) -> anyhow::Result<()> {
    let code = fs::read_to_string(input)?;
    let doc = build_document(&code, &ComponentRegistry::standard(), &cfg.preview);
    fs::write(out, &doc.html).with_context(|| format!("writing preview document {out}"))?;
    match &doc.error {
        Some(e) => ux::show_error(e),
        None => println!("preview written to {}", out),
    }
    Ok(())
}
