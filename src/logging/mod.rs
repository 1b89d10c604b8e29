use std::path::{Path, PathBuf};

use fs_err as fs;
use serde_json::to_string_pretty;
use uuid::Uuid;

use crate::wire::AgentResult;

/// `RUST_LOG` wins; otherwise `info`, or `debug` with `--debug`.
pub fn init(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp_millis()
        .try_init();
}

pub struct SavedPaths {
    pub dir: PathBuf,
    pub plan: PathBuf,
    pub code: PathBuf,
    pub explanation: PathBuf,
}

pub fn run_dir(root: &Path, run: Uuid) -> PathBuf {
    root.join(run.to_string())
}

/// Writes one generation's stage outputs under `<root>/<run id>/`.
pub fn save_artifacts(root: &Path, run: Uuid, result: &AgentResult) -> anyhow::Result<SavedPaths> {
    let dir = run_dir(root, run);
    fs::create_dir_all(&dir)?;

    let plan = dir.join("plan.json");
    fs::write(&plan, to_string_pretty(&result.plan)?)?;

    let code = dir.join("generated-ui.tsx");
    fs::write(&code, &result.code.code)?;

    let explanation = dir.join("explanation.json");
    fs::write(&explanation, to_string_pretty(&result.explanation)?)?;

    log::debug!("artifacts saved in {}", dir.display());
    Ok(SavedPaths { dir, plan, code, explanation })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usage::AllowedComponent;
    use crate::wire::{Explanation, GeneratedCode, PlanStep};

    #[test]
    fn test_save_artifacts_writes_each_stage() {
        let tmp = tempfile::tempdir().unwrap();
        let run = Uuid::new_v4();
        let result = AgentResult {
            plan: PlanStep { layout: "stack".into(), components: vec!["Button".into()], reasoning: "r".into() },
            code: GeneratedCode { code: "export default function A() {}".into(), component_usage: vec![AllowedComponent::Button] },
            explanation: Explanation { decisions: vec![], component_choices: "Button".into(), layout_rationale: "stack".into() },
        };

        let saved = save_artifacts(tmp.path(), run, &result).unwrap();
        assert_eq!(saved.dir, tmp.path().join(run.to_string()));
        assert_eq!(fs::read_to_string(&saved.code).unwrap(), "export default function A() {}");
        let plan: PlanStep = serde_json::from_str(&fs::read_to_string(&saved.plan).unwrap()).unwrap();
        assert_eq!(plan, result.plan);
        assert!(fs::read_to_string(&saved.explanation).unwrap().contains("\"layoutRationale\""));
    }
}
