use crate::usage::AllowedComponent;
use crate::wire::PlanStep;

pub const NO_CURRENT_CODE: &str = "None - generating from scratch";

const PLANNER_TEMPLATE: &str = r#"You are a UI planner. Your job is to analyze user intent and create a structured plan.

RULES:
1. You can ONLY use these components: {allowedComponents}
2. NO inline styles, NO custom CSS, NO new components
3. Output ONLY valid JSON

Analyze the user's request and output a JSON plan with this structure:
{
  "layout": "describe the overall layout structure",
  "components": ["list", "of", "component", "names"],
  "reasoning": "explain why this layout and these components"
}

User Request: {userIntent}

Current Code (if editing): {currentCode}

Output ONLY the JSON, nothing else."#;

const GENERATOR_TEMPLATE: &str = r#"You are a UI code generator. Convert the plan into React code.

STRICT RULES:
1. ONLY use these components: {allowedComponents}
2. Import them exactly like this:
import { {allowedComponents} } from './ComponentLibrary';
3. NO inline styles, NO style prop, NO className except those built into components
4. NO creating new components
5. Use React hooks (useState, etc.) as needed
6. The component must be named GeneratedUI and be the default export

ALLOWED COMPONENTS AND THEIR PROPS:
{componentProps}

DATA RULES:
- title, subtitle, label and footer props must be plain strings
- items arrays must contain plain objects
- Sidebar icons must be strings ("home", "user", etc.)
- DO NOT use JSX inside data objects; JSX is allowed only as component children

PLAN:
{plan}

Current Code (if modifying): {currentCode}

{editInstructions}

Output ONLY the complete React component code, starting with imports. No explanations, no markdown."#;

const EXPLAINER_TEMPLATE: &str = r#"You are a UI decision explainer. Explain what was done and why.

PLAN: {plan}
GENERATED CODE: {code}

Analyze the plan and code, then output a JSON with this structure:
{
  "decisions": ["key decision 1", "key decision 2"],
  "componentChoices": "explain which components were chosen and why",
  "layoutRationale": "explain the overall layout strategy"
}

Output ONLY the JSON, nothing else."#;

const INCREMENTAL_EDIT: &str = "IMPORTANT:
- You are modifying existing code: make MINIMAL changes
- Preserve existing functionality
- Only change what the user requested
- Keep the same component instances where possible";

const FRESH_GENERATION: &str = "IMPORTANT:
- Build the complete UI described by the plan
- Keep the component tree shallow and readable";

const INCREMENTAL_KEYWORDS: [&str; 12] = [
    "change", "modify", "update", "add", "remove", "delete",
    "make it", "adjust", "fix", "alter", "edit", "replace",
];

/// Whether an intent reads like an edit of existing UI rather than a fresh
/// request.
pub fn is_incremental_edit(user_intent: &str) -> bool {
    let t = user_intent.to_lowercase();
    INCREMENTAL_KEYWORDS.iter().any(|k| t.contains(k))
}

/// Substitutes `{name}` placeholders in one left-to-right pass.
///
/// Values are never rescanned, so a user intent containing `{code}` stays
/// literal. Braces that do not form a known placeholder are copied through.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let hit = after.find('}').and_then(|close| {
            let key = &after[..close];
            vars.iter().find(|(k, _)| *k == key).map(|(_, v)| (close, *v))
        });
        match hit {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn current_code_or_none(current_code: &str) -> &str {
    if current_code.trim().is_empty() {
        NO_CURRENT_CODE
    } else {
        current_code
    }
}

fn allowed_list() -> String {
    AllowedComponent::names().join(", ")
}

fn component_props() -> String {
    AllowedComponent::ALL
        .iter()
        .map(|c| format!("{}:\n- {}", c.as_str(), c.props_doc()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn plan_json(plan: &PlanStep) -> String {
    // PlanStep has only string fields; serialization cannot fail.
    serde_json::to_string_pretty(plan).unwrap_or_default()
}

pub fn planner_prompt(user_intent: &str, current_code: &str) -> String {
    render(
        PLANNER_TEMPLATE,
        &[
            ("allowedComponents", &allowed_list()),
            ("userIntent", user_intent),
            ("currentCode", current_code_or_none(current_code)),
        ],
    )
}

pub fn generator_prompt(plan: &PlanStep, current_code: &str, incremental: bool) -> String {
    render(
        GENERATOR_TEMPLATE,
        &[
            ("allowedComponents", &allowed_list()),
            ("componentProps", &component_props()),
            ("plan", &plan_json(plan)),
            ("currentCode", current_code_or_none(current_code)),
            ("editInstructions", if incremental { INCREMENTAL_EDIT } else { FRESH_GENERATION }),
        ],
    )
}

pub fn explainer_prompt(plan: &PlanStep, code: &str) -> String {
    render(EXPLAINER_TEMPLATE, &[("plan", &plan_json(plan)), ("code", code)])
}
