//! Component usage extraction and validation.
//!
//! Both passes are lexical: a tag inside a string literal or a comment counts
//! the same as a real element.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::GenError;

/// The closed set of components generated code may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AllowedComponent {
    Button,
    Card,
    Input,
    Table,
    Modal,
    Sidebar,
    Navbar,
    Chart,
}

impl AllowedComponent {
    pub const ALL: [AllowedComponent; 8] = [
        AllowedComponent::Button,
        AllowedComponent::Card,
        AllowedComponent::Input,
        AllowedComponent::Table,
        AllowedComponent::Modal,
        AllowedComponent::Sidebar,
        AllowedComponent::Navbar,
        AllowedComponent::Chart,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AllowedComponent::Button => "Button",
            AllowedComponent::Card => "Card",
            AllowedComponent::Input => "Input",
            AllowedComponent::Table => "Table",
            AllowedComponent::Modal => "Modal",
            AllowedComponent::Sidebar => "Sidebar",
            AllowedComponent::Navbar => "Navbar",
            AllowedComponent::Chart => "Chart",
        }
    }

    pub fn names() -> [&'static str; 8] {
        Self::ALL.map(|c| c.as_str())
    }

    /// Prop documentation shown to the generator.
    pub fn props_doc(&self) -> &'static str {
        match self {
            AllowedComponent::Button => {
                "children, onClick, variant ('primary'|'secondary'|'danger'|'ghost'), size ('small'|'medium'|'large'), disabled"
            }
            AllowedComponent::Card => {
                "children, title (string), subtitle (string), footer (string), variant ('default'|'elevated'|'bordered')"
            }
            AllowedComponent::Input => {
                "label (string), placeholder, type ('text'|'email'|'password'|'number'), value, onChange, error, disabled"
            }
            AllowedComponent::Table => "headers (string[]), rows (string[][]), striped (boolean)",
            AllowedComponent::Modal => "isOpen, onClose, title (string), children, footer (string)",
            AllowedComponent::Sidebar => {
                "isOpen, items (Array<{icon: string, label: string, id: string}>), onItemClick"
            }
            AllowedComponent::Navbar => "title (string), items (Array<{label: string, onClick}>), onMenuClick",
            AllowedComponent::Chart => "type ('line'|'bar'), data (any[]), xKey, yKey, title (string)",
        }
    }

    fn open_tag_pattern(&self) -> &'static Regex {
        static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
        let patterns = PATTERNS.get_or_init(|| {
            Self::ALL
                .iter()
                .map(|c| Regex::new(&format!(r"<{}(?:\s|>|/>)", c.as_str())).expect("static tag pattern"))
                .collect()
        });
        &patterns[*self as usize]
    }
}

impl fmt::Display for AllowedComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AllowedComponent {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| GenError::DisallowedComponent { found: vec![s.to_string()] })
    }
}

pub fn is_allowed(name: &str) -> bool {
    AllowedComponent::names().contains(&name)
}

/// Allowed components whose opening tag (`<Name` then whitespace, `>` or
/// `/>`) appears in `code`, in canonical order.
pub fn extract_component_usage(code: &str) -> Vec<AllowedComponent> {
    AllowedComponent::ALL
        .iter()
        .copied()
        .filter(|c| c.open_tag_pattern().is_match(code))
        .collect()
}

const STRUCTURAL_TAGS: [&str; 2] = ["Fragment", "React.Fragment"];

/// Every PascalCase opening tag in `code`, deduplicated in order of first
/// appearance. Fragments are not reported.
///
/// A `<` directly after an identifier character is a type argument
/// (`useState<User>`), not an element, and is skipped.
pub fn scan_component_tags(code: &str) -> Vec<String> {
    static TAG: OnceLock<Regex> = OnceLock::new();
    let re = TAG.get_or_init(|| {
        Regex::new(r"<([A-Z][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*)").expect("static tag regex")
    });

    let bytes = code.as_bytes();
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for caps in re.captures_iter(code) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else { continue };
        if let Some(&prev) = whole.start().checked_sub(1).and_then(|i| bytes.get(i)) {
            if prev.is_ascii_alphanumeric() || matches!(prev, b'_' | b'$' | b'.' | b')' | b']') {
                continue;
            }
        }
        match bytes.get(whole.end()) {
            Some(b) if b.is_ascii_whitespace() || *b == b'>' || *b == b'/' => {}
            _ => continue,
        }
        let name = name.as_str();
        if STRUCTURAL_TAGS.contains(&name) {
            continue;
        }
        if seen.insert(name.to_string()) {
            out.push(name.to_string());
        }
    }
    out
}

/// Fails iff `used` contains a name outside the allowed set.
pub fn validate_components<S: AsRef<str>>(used: &[S]) -> Result<(), GenError> {
    let found: Vec<String> = used
        .iter()
        .map(|s| s.as_ref())
        .filter(|name| !is_allowed(name))
        .map(str::to_string)
        .collect();
    if found.is_empty() {
        Ok(())
    } else {
        Err(GenError::DisallowedComponent { found })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_finds_present_components_only() {
        let code = r#"
            <Card title="Login">
              <Input label="Email" type="email" />
              <Button onClick={submit}>Sign in</Button>
            </Card>
        "#;
        assert_eq!(
            extract_component_usage(code),
            vec![AllowedComponent::Button, AllowedComponent::Card, AllowedComponent::Input]
        );
    }

    #[test]
    fn test_extract_requires_tag_boundary() {
        // `<Cards>` and `<Buttons ` are not allowed components
        assert!(extract_component_usage("<Cards><Buttons x/>").is_empty());
        assert_eq!(extract_component_usage("<Input/>"), vec![AllowedComponent::Input]);
    }

    #[test]
    fn test_extract_counts_tags_inside_strings() {
        let code = r#"const help = "wrap it in <Modal >";"#;
        assert_eq!(extract_component_usage(code), vec![AllowedComponent::Modal]);
    }

    #[test]
    fn test_extract_is_subset_of_allowed() {
        let code = "<Button> <Foo> <Chart type='bar' /> <Table\n headers={[]} />";
        let used = extract_component_usage(code);
        assert!(used.iter().all(|c| AllowedComponent::ALL.contains(c)));
        assert_eq!(used.len(), 3);
    }

    #[test]
    fn test_scan_reports_unknown_tags() {
        let code = "<div><Card><Foo bar /><Card></Card></Card><Widget.Item x/></div>";
        assert_eq!(scan_component_tags(code), vec!["Card", "Foo", "Widget.Item"]);
    }

    #[test]
    fn test_scan_skips_type_arguments_and_fragments() {
        let code = r#"
            const [user, setUser] = useState<User>(null);
            const rows: Array<Row> = [];
            return (<React.Fragment><Fragment><Button>x</Button></Fragment></React.Fragment>);
        "#;
        assert_eq!(scan_component_tags(code), vec!["Button"]);
    }

    #[test]
    fn test_validate_rejects_outside_names() {
        let err = validate_components(&["Button", "Foo"]).unwrap_err();
        match err {
            GenError::DisallowedComponent { found } => assert_eq!(found, vec!["Foo"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_validate_accepts_allowed_names() {
        assert!(validate_components(&["Button", "Card"]).is_ok());
        assert!(validate_components::<&str>(&[]).is_ok());
    }

    #[test]
    fn test_from_str_round_trip() {
        for c in AllowedComponent::ALL {
            assert_eq!(c.as_str().parse::<AllowedComponent>().unwrap(), c);
        }
        assert!("Dialog".parse::<AllowedComponent>().is_err());
    }
}
