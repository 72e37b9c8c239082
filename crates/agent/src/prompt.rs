//! System prompt and assistant prefill rendering.

use anxiousroid_config::PromptConfig;
use anxiousroid_core::catalog::{Rule, Term};

const PEOPLE_PLACEHOLDER: &str = "{{people}}";
const RULES_PLACEHOLDER: &str = "{{additional_rules}}";

const PEOPLE_HEADING: &str = "People mentioned in the conversation:";
const RULES_HEADING: &str = "Additional rules for this conversation:";

/// Templates for the two prompt fragments sent with every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    pub system: String,
    pub assistant_prefill: String,
}

/// A rendered prompt, ready for a `ProviderRequest`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    pub system: String,
    /// `None` when the prefill template renders to nothing
    pub assistant_prefill: Option<String>,
}

impl PromptTemplate {
    pub fn new(system: impl Into<String>, assistant_prefill: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            assistant_prefill: assistant_prefill.into(),
        }
    }

    pub fn from_config(config: &PromptConfig) -> Self {
        Self::new(&config.system_template, &config.assistant_prefill)
    }

    /// Render both templates with the matched people and rules.
    ///
    /// Placeholders are replaced in place. If the system template has no
    /// placeholder for a non-empty section, the section is appended under a
    /// heading so matches are never silently dropped.
    pub fn render(&self, people: &[Term], rules: &[Rule]) -> RenderedPrompt {
        let people_section = render_people(people);
        let rules_section = render_rules(rules);

        let mut system = self
            .system
            .replace(PEOPLE_PLACEHOLDER, &people_section)
            .replace(RULES_PLACEHOLDER, &rules_section);

        if !self.system.contains(PEOPLE_PLACEHOLDER) && !people_section.is_empty() {
            append_section(&mut system, PEOPLE_HEADING, &people_section);
        }
        if !self.system.contains(RULES_PLACEHOLDER) && !rules_section.is_empty() {
            append_section(&mut system, RULES_HEADING, &rules_section);
        }

        let prefill = self
            .assistant_prefill
            .replace(PEOPLE_PLACEHOLDER, &people_section)
            .replace(RULES_PLACEHOLDER, &rules_section);

        RenderedPrompt {
            system,
            assistant_prefill: (!prefill.is_empty()).then_some(prefill),
        }
    }
}

fn append_section(system: &mut String, heading: &str, body: &str) {
    if !system.is_empty() {
        system.push_str("\n\n");
    }
    system.push_str(heading);
    system.push('\n');
    system.push_str(body);
}

/// `- name (alias): description`, followed by indented attribute lines.
fn render_people(people: &[Term]) -> String {
    let mut lines = Vec::new();
    for person in people {
        let mut line = format!("- {}", person.name);
        if !person.alias.is_empty() {
            line.push_str(&format!(" ({})", person.alias));
        }
        if !person.description.is_empty() {
            line.push_str(&format!(": {}", person.description));
        }
        lines.push(line);
        for attr in &person.attributes {
            lines.push(format!("  - {}: {}", attr.name, attr.value));
        }
    }
    lines.join("\n")
}

fn render_rules(rules: &[Rule]) -> String {
    rules
        .iter()
        .flat_map(|rule| rule.rules.iter())
        .map(|text| format!("- {text}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use anxiousroid_core::catalog::{TermAttribute, TermCategory};

    fn taro() -> Term {
        Term {
            index_regex: "太郎".into(),
            name: "太郎".into(),
            categories: vec![TermCategory::Person],
            description: "ユーザーの弟。".into(),
            alias: "たろちゃん".into(),
            flags: vec![],
            attributes: vec![TermAttribute {
                name: "年齢".into(),
                value: "12".into(),
            }],
        }
    }

    fn rain() -> Rule {
        Rule {
            index_regex: "雨".into(),
            rules: vec!["傘の心配をする。".into(), "濡れることを嫌がる。".into()],
        }
    }

    #[test]
    fn placeholders_are_replaced_in_place() {
        let template = PromptTemplate::new(
            "Know these people:\n{{people}}\nRules:\n{{additional_rules}}",
            "<response>",
        );
        let rendered = template.render(&[taro()], &[rain()]);
        assert_eq!(
            rendered.system,
            "Know these people:\n- 太郎 (たろちゃん): ユーザーの弟。\n  - 年齢: 12\nRules:\n- 傘の心配をする。\n- 濡れることを嫌がる。"
        );
        assert_eq!(rendered.assistant_prefill.as_deref(), Some("<response>"));
    }

    #[test]
    fn sections_are_appended_without_placeholders() {
        let template = PromptTemplate::new("You are ぴの.", "");
        let rendered = template.render(&[taro()], &[rain()]);
        assert!(rendered.system.starts_with("You are ぴの.\n\n"));
        assert!(rendered.system.contains(PEOPLE_HEADING));
        assert!(rendered.system.contains(RULES_HEADING));
        assert!(rendered.system.ends_with("- 濡れることを嫌がる。"));
    }

    #[test]
    fn nothing_matched_leaves_template_alone() {
        let template = PromptTemplate::new("You are ぴの.", "[ぴの]<response>");
        let rendered = template.render(&[], &[]);
        assert_eq!(rendered.system, "You are ぴの.");
        assert_eq!(rendered.assistant_prefill.as_deref(), Some("[ぴの]<response>"));
    }

    #[test]
    fn empty_placeholder_renders_blank() {
        let template = PromptTemplate::new("People: {{people}}", "");
        assert_eq!(template.render(&[], &[]).system, "People: ");
    }

    #[test]
    fn empty_prefill_is_omitted() {
        let template = PromptTemplate::new("sys", "");
        assert_eq!(template.render(&[], &[]).assistant_prefill, None);
    }

    #[test]
    fn person_without_alias_or_description() {
        let mut person = taro();
        person.alias.clear();
        person.description.clear();
        person.attributes.clear();
        assert_eq!(render_people(&[person]), "- 太郎");
    }

    #[test]
    fn default_config_renders() {
        let template = PromptTemplate::from_config(&PromptConfig::default());
        let rendered = template.render(&[], &[]);
        assert!(rendered.system.contains("ぴの"));
        assert_eq!(rendered.assistant_prefill.as_deref(), Some("[ぴの]<response>"));
    }
}
