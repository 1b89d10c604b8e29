//! Planner → Generator → Explainer orchestration.
//!
//! The three calls run strictly in sequence because each prompt embeds the
//! previous stage's output. Any failure aborts the cycle; nothing partial is
//! returned and nothing is retried.

use serde::de::DeserializeOwned;

use crate::errors::{GenError, Stage};
use crate::prompt;
use crate::provider::DynProvider;
use crate::sanitize;
use crate::usage;
use crate::wire::{AgentResult, Explanation, GeneratedCode, PlanStep};

pub struct Agent {
    provider: DynProvider,
}

impl Agent {
    pub fn new(provider: DynProvider) -> Self {
        Self { provider }
    }

    pub async fn run(&self, user_intent: &str, current_code: &str, api_key: &str) -> Result<AgentResult, GenError> {
        self.run_with_progress(user_intent, current_code, api_key, &|_| {}).await
    }

    /// Like [`Agent::run`], calling `on_stage` before each LLM call.
    pub async fn run_with_progress(
        &self,
        user_intent: &str,
        current_code: &str,
        api_key: &str,
        on_stage: &(dyn Fn(Stage) + Send + Sync),
    ) -> Result<AgentResult, GenError> {
        check_inputs(user_intent, api_key)?;
        let incremental = !current_code.trim().is_empty() && prompt::is_incremental_edit(user_intent);

        // ===== PLANNER =====
        on_stage(Stage::Planner);
        log::info!("planner: running (incremental edit: {})", incremental);
        let planner_prompt = prompt::planner_prompt(user_intent, current_code);
        log::debug!("planner prompt:\n{}", planner_prompt);
        let raw_plan = self.provider.complete(&planner_prompt, api_key).await?;
        log::debug!("planner response:\n{}", raw_plan);
        let plan: PlanStep = parse_structured(Stage::Planner, &raw_plan)?;
        let unknown: Vec<&str> = plan.components.iter().map(String::as_str).filter(|c| !usage::is_allowed(c)).collect();
        if !unknown.is_empty() {
            log::warn!("planner: plan names components outside the library: {:?}", unknown);
        }
        log::info!("planner: plan created with components {:?}", plan.components);

        // ===== GENERATOR =====
        on_stage(Stage::Generator);
        log::info!("generator: running");
        let generator_prompt = prompt::generator_prompt(&plan, current_code, incremental);
        log::debug!("generator prompt:\n{}", generator_prompt);
        let raw_code = self.provider.complete(&generator_prompt, api_key).await?;
        log::debug!("generator response:\n{}", raw_code);
        if sanitize::strip_fences(&raw_code).is_empty() {
            return Err(GenError::malformed(Stage::Generator, "empty code"));
        }

        let code = sanitize::sanitize(&raw_code);
        let component_usage = usage::extract_component_usage(&code);
        usage::validate_components(&usage::scan_component_tags(&code))?;
        log::info!("generator: code generated, components used: {:?}", component_usage);

        // ===== EXPLAINER =====
        on_stage(Stage::Explainer);
        log::info!("explainer: running");
        let explainer_prompt = prompt::explainer_prompt(&plan, &code);
        log::debug!("explainer prompt:\n{}", explainer_prompt);
        let raw_explanation = self.provider.complete(&explainer_prompt, api_key).await?;
        log::debug!("explainer response:\n{}", raw_explanation);
        let explanation: Explanation = parse_structured(Stage::Explainer, &raw_explanation)?;
        log::info!("explainer: explanation generated");

        Ok(AgentResult {
            plan,
            code: GeneratedCode { code, component_usage },
            explanation,
        })
    }
}

/// Rejects a request before any network call is made.
pub fn check_inputs(user_intent: &str, api_key: &str) -> Result<(), GenError> {
    if api_key.trim().is_empty() {
        return Err(GenError::MissingInput("API key required"));
    }
    if user_intent.trim().is_empty() {
        return Err(GenError::MissingInput("User intent required"));
    }
    Ok(())
}

/// Parses a model reply as JSON: fences stripped, strict parse first, then
/// the first balanced `{...}` object in the text.
pub fn parse_structured<T: DeserializeOwned>(stage: Stage, raw: &str) -> Result<T, GenError> {
    let cleaned = sanitize::strip_fences(raw);
    let strict_err = match serde_json::from_str::<T>(&cleaned) {
        Ok(v) => return Ok(v),
        Err(e) => e,
    };
    if let Some(obj) = extract_first_json_object(&cleaned) {
        if let Ok(v) = serde_json::from_str::<T>(obj) {
            return Ok(v);
        }
    }
    Err(GenError::malformed(stage, strict_err.to_string()))
}

/// First top-level JSON object in `s`, honoring braces inside strings.
pub fn extract_first_json_object(s: &str) -> Option<&str> {
    let bytes = s.as_bytes();
    let start = s.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Provider;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;

    /// Replays canned replies in order and records every prompt.
    struct Scripted {
        replies: Mutex<VecDeque<Result<String, GenError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(replies: Vec<Result<&str, GenError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into_iter().map(|r| r.map(str::to_string)).collect()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.prompts.lock().len()
        }
    }

    #[async_trait]
    impl Provider for Scripted {
        async fn complete(&self, prompt: &str, _api_key: &str) -> Result<String, GenError> {
            self.prompts.lock().push(prompt.to_string());
            self.replies
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(GenError::provider(None, "script exhausted")))
        }
    }

    const LOGIN_PLAN: &str = r#"```json
{
  "layout": "Centered card containing a vertical form",
  "components": ["Card", "Input", "Button"],
  "reasoning": "A login form needs two inputs and a submit action"
}
```"#;

    const LOGIN_CODE: &str = r#"```jsx
import React, { useState } from 'react';
import { Button, Card, Input } from './ComponentLibrary';

export default function GeneratedUI() {
  const [email, setEmail] = useState('');
  const [password, setPassword] = useState('');
  return (
    <Card title="Sign in" variant="elevated">
      <Input label="Email" type="email" value={email} onChange={(e) => setEmail(e.target.value)} />
      <Input label="Password" type="password" value={password} onChange={(e) => setPassword(e.target.value)} />
      <Button variant="primary">Log in</Button>
    </Card>
  );
}
```"#;

    const LOGIN_EXPLANATION: &str = r#"Here is the explanation:
{"decisions": ["Wrap the form in a Card", "Use password type for the secret"], "componentChoices": "Card, Input, Button", "layoutRationale": "Single centered column"}"#;

    #[tokio::test]
    async fn test_login_form_round_trip() {
        let provider = Scripted::new(vec![Ok(LOGIN_PLAN), Ok(LOGIN_CODE), Ok(LOGIN_EXPLANATION)]);
        let agent = Agent::new(provider.clone());

        let result = agent.run("Build a login form with email and password", "", "sk-test").await.unwrap();

        assert!(result.plan.components.iter().any(|c| c == "Input"));
        assert!(result.code.code.contains("<Input"));
        assert!(result.code.code.contains("<Button"));
        assert_eq!(result.code.code.matches("export default").count(), 1);
        assert_eq!(
            result.code.component_usage,
            vec![usage::AllowedComponent::Button, usage::AllowedComponent::Card, usage::AllowedComponent::Input]
        );
        assert!(!result.explanation.decisions.is_empty());

        let prompts = provider.prompts.lock();
        assert_eq!(prompts.len(), 3);
        assert!(prompts[0].contains("User Request: Build a login form with email and password"));
        assert!(prompts[1].contains("Centered card containing a vertical form"));
        // explainer sees the sanitized code
        assert!(prompts[2].contains("const { Button, Card, Input } = ComponentLibrary;"));
    }

    #[tokio::test]
    async fn test_disallowed_component_aborts_before_explainer() {
        let code = "export default function GeneratedUI() { return <Card><DatePicker /></Card>; }";
        let provider = Scripted::new(vec![Ok(LOGIN_PLAN), Ok(code), Ok(LOGIN_EXPLANATION)]);
        let agent = Agent::new(provider.clone());

        let err = agent.run("Build a booking form", "", "k").await.unwrap_err();
        match err {
            GenError::DisallowedComponent { found } => assert_eq!(found, vec!["DatePicker"]),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_malformed_plan_stops_cycle() {
        let provider = Scripted::new(vec![Ok("Sure! I would use a card."), Ok(LOGIN_CODE)]);
        let agent = Agent::new(provider.clone());

        let err = agent.run("Build a login form", "", "k").await.unwrap_err();
        assert!(matches!(err, GenError::MalformedOutput { stage: Stage::Planner, .. }));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_malformed_explanation_returns_no_partial_result() {
        let provider = Scripted::new(vec![Ok(LOGIN_PLAN), Ok(LOGIN_CODE), Ok("{\"decisions\": \"oops\"}")]);
        let err = Agent::new(provider).run("Build a login form", "", "k").await.unwrap_err();
        assert!(matches!(err, GenError::MalformedOutput { stage: Stage::Explainer, .. }));
    }

    #[tokio::test]
    async fn test_provider_error_propagates_unchanged() {
        let provider = Scripted::new(vec![Err(GenError::provider(Some(429), "rate limited"))]);
        let err = Agent::new(provider.clone()).run("Build a table", "", "k").await.unwrap_err();
        assert_eq!(err.to_string(), "AI Error: rate limited");
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_input_makes_no_call() {
        let provider = Scripted::new(vec![]);
        let agent = Agent::new(provider.clone());
        assert!(matches!(agent.run("Build it", "", " ").await, Err(GenError::MissingInput("API key required"))));
        assert!(matches!(agent.run("", "", "k").await, Err(GenError::MissingInput("User intent required"))));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_incremental_edit_uses_current_code() {
        let provider = Scripted::new(vec![Ok(LOGIN_PLAN), Ok(LOGIN_CODE), Ok(LOGIN_EXPLANATION)]);
        let current = "export default function GeneratedUI() { return <Card title=\"Old\" />; }";
        Agent::new(provider.clone()).run("Change the title to Welcome", current, "k").await.unwrap();

        let prompts = provider.prompts.lock();
        assert!(prompts[0].contains(current));
        assert!(prompts[1].contains("make MINIMAL changes"));
    }

    #[tokio::test]
    async fn test_progress_reports_each_stage() {
        let provider = Scripted::new(vec![Ok(LOGIN_PLAN), Ok(LOGIN_CODE), Ok(LOGIN_EXPLANATION)]);
        let seen = Mutex::new(Vec::new());
        Agent::new(provider)
            .run_with_progress("Build a login form", "", "k", &|s| seen.lock().push(s))
            .await
            .unwrap();
        assert_eq!(*seen.lock(), vec![Stage::Planner, Stage::Generator, Stage::Explainer]);
    }

    #[test]
    fn test_extract_first_json_object_handles_braces_in_strings() {
        let s = r#"prefix {"a": "}{", "b": {"c": 1}} trailing {"x": 2}"#;
        assert_eq!(extract_first_json_object(s), Some(r#"{"a": "}{", "b": {"c": 1}}"#));
        assert_eq!(extract_first_json_object("no json"), None);
    }
}
