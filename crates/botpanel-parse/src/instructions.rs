//! Instructions classifier.
//!
//! Reshapes a raw instructions payload into the base section plus at most one
//! action-scoped section, chosen by the currently active action.

use crate::value::{field, field_in, get_str, opt_str, scalar_text, string_list};
use botpanel_core::{
    ActionSection, BaseSection, BuildSection, ClarifySection, DecisionCriterion, Evidence,
    InstructionsModel, QuestionAnswer, RenderConfigs, RenderSection, Rule, StrategySection,
    ValidateSection,
};
use serde_json::{Map, Value};

const CLARIFY: &str = "clarify";
const STRATEGY: &str = "strategy";
const BUILD: &str = "build";
const RENDER: &str = "render";
const VALIDATE: &str = "validate";

/// Any of these makes the build section available.
const BUILD_KEYS: &[&str] = &["schema", "knowledge_graph_spec", "rules"];

/// Schema fragments, merged in this order; later keys win.
const SCHEMA_SOURCES: &[&str] = &["knowledge_graph_spec", "schema"];

/// Instruction content in either of its two surface shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum InstructionText {
    Lines(Vec<String>),
    Text(String),
}

impl InstructionText {
    fn from_value(v: Option<&Value>) -> Option<Self> {
        match v? {
            Value::String(s) if !s.trim().is_empty() => Some(Self::Text(s.trim().to_string())),
            list @ Value::Array(_) => {
                let lines = string_list(Some(list));
                (!lines.is_empty()).then_some(Self::Lines(lines))
            }
            _ => None,
        }
    }

    fn into_lines(self) -> Vec<String> {
        match self {
            Self::Lines(lines) => lines,
            Self::Text(text) => vec![text],
        }
    }

    /// Display lines; text is split on newlines.
    fn render(self) -> Vec<String> {
        match self {
            Self::Lines(lines) => lines,
            Self::Text(text) => text.lines().map(|l| l.trim_end().to_string()).collect(),
        }
    }
}

/// Behavior-scoped content goes before base content. Two texts stay a text,
/// two lists stay a list, and a mix becomes a list.
pub(crate) fn merge(
    behavior: Option<InstructionText>,
    base: Option<InstructionText>,
) -> Option<InstructionText> {
    match (behavior, base) {
        (Some(InstructionText::Text(a)), Some(InstructionText::Text(b))) => {
            Some(InstructionText::Text(format!("{a}\n{b}")))
        }
        (Some(a), Some(b)) => {
            let mut lines = a.into_lines();
            lines.extend(b.into_lines());
            Some(InstructionText::Lines(lines))
        }
        (Some(only), None) | (None, Some(only)) => Some(only),
        (None, None) => None,
    }
}

/// Classify a raw instructions payload for `action`.
///
/// A string or list payload only yields a base section. An object payload
/// may additionally yield one action section.
pub fn classify(raw: &Value, action: &str) -> InstructionsModel {
    let action = action.trim().to_ascii_lowercase();
    let section = if raw.is_object() {
        select_section(raw, &action)
    } else {
        None
    };
    InstructionsModel {
        base: base_section(raw),
        section,
    }
}

/// Action named by the payload itself (`action.name` or a bare `action`).
pub(crate) fn declared_action(raw: &Value) -> String {
    match field(raw, "action") {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(obj @ Value::Object(_)) => get_str(obj, "name"),
        _ => String::new(),
    }
}

fn base_section(raw: &Value) -> Option<BaseSection> {
    let mut lines = Vec::new();
    let merged = if raw.is_object() {
        lines.extend(scoped_lines("Behavior", field(raw, "behavior")));
        lines.extend(scoped_lines("Action", field(raw, "action")));
        merge(
            InstructionText::from_value(field(raw, "behavior_instructions")),
            InstructionText::from_value(field(raw, "base_instructions")),
        )
    } else {
        InstructionText::from_value(Some(raw))
    };
    lines.extend(merged.map(InstructionText::render).unwrap_or_default());
    (!lines.is_empty()).then_some(BaseSection { lines })
}

/// Render a behavior or action block: heading, description, then its
/// instruction list. Each part is optional.
fn scoped_lines(label: &str, scoped: Option<&Value>) -> Vec<String> {
    let Some(scoped) = scoped else {
        return Vec::new();
    };
    if let Some(name) = scoped.as_str().map(str::trim).filter(|s| !s.is_empty()) {
        return vec![format!("{label}: {name}")];
    }
    let mut lines = Vec::new();
    if let Some(name) = opt_str(scoped, "name") {
        lines.push(format!("{label}: {name}"));
    }
    if let Some(description) = opt_str(scoped, "description") {
        lines.push(description);
    }
    lines.extend(
        InstructionText::from_value(field(scoped, "instructions"))
            .map(InstructionText::render)
            .unwrap_or_default(),
    );
    lines
}

/// The action's own section when it has one; otherwise saved strategy data.
fn select_section(raw: &Value, action: &str) -> Option<ActionSection> {
    let own = match action {
        CLARIFY => clarify_section(raw).map(ActionSection::Clarify),
        STRATEGY => Some(ActionSection::Strategy(strategy_section(raw))),
        BUILD => build_section(raw).map(ActionSection::Build),
        RENDER => Some(ActionSection::Render(render_section(raw))),
        VALIDATE => validate_section(raw).map(ActionSection::Validate),
        _ => None,
    };
    own.or_else(|| has_saved_strategy(raw).then(|| ActionSection::Strategy(strategy_section(raw))))
}

fn non_empty_object(v: Option<&Value>) -> Option<&Value> {
    v.filter(|v| v.as_object().is_some_and(|o| !o.is_empty()))
}

// ── Clarify ──

fn clarify_section(raw: &Value) -> Option<ClarifySection> {
    let dedicated = non_empty_object(field(raw, "clarification"));
    let required = field_in(field(raw, "guardrails"), "required_context");
    let guard_questions = string_list(field_in(required, "key_questions"));
    if dedicated.is_none() && guard_questions.is_empty() {
        return None;
    }

    let dedicated_questions = questions_from_value(field_in(dedicated, "key_questions"));
    let questions = if dedicated_questions.is_empty() {
        guard_questions
            .into_iter()
            .map(|question| QuestionAnswer {
                answer: saved_answer(dedicated, &question),
                question,
            })
            .collect()
    } else {
        dedicated_questions
    };

    let dedicated_evidence = evidence_from_value(field_in(dedicated, "evidence"));
    let evidence = if dedicated_evidence.is_empty() {
        string_list(field_in(required, "evidence"))
            .into_iter()
            .map(|label| Evidence { label, value: None })
            .collect()
    } else {
        dedicated_evidence
    };

    Some(ClarifySection {
        questions,
        evidence,
    })
}

/// Questions as a `{question: answer}` map or a list of strings or
/// `{question, answer}` objects.
fn questions_from_value(v: Option<&Value>) -> Vec<QuestionAnswer> {
    match v {
        Some(Value::Object(map)) => map
            .iter()
            .map(|(question, answer)| QuestionAnswer {
                question: question.trim().to_string(),
                answer: scalar_text(answer).filter(|a| !a.is_empty()),
            })
            .collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::Object(_) => Some(QuestionAnswer {
                    question: opt_str(item, "question")?,
                    answer: opt_str(item, "answer"),
                }),
                other => Some(QuestionAnswer {
                    question: scalar_text(other).filter(|q| !q.is_empty())?,
                    answer: None,
                }),
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn saved_answer(dedicated: Option<&Value>, question: &str) -> Option<String> {
    field_in(dedicated, "answers")
        .and_then(|answers| answers.get(question))
        .and_then(scalar_text)
        .filter(|a| !a.is_empty())
}

fn evidence_from_value(v: Option<&Value>) -> Vec<Evidence> {
    match v {
        Some(Value::Object(map)) => map
            .iter()
            .map(|(label, value)| Evidence {
                label: label.trim().to_string(),
                value: match value {
                    Value::Array(_) => Some(string_list(Some(value)).join(", ")),
                    other => scalar_text(other),
                }
                .filter(|v| !v.is_empty()),
            })
            .collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::Object(_) => Some(Evidence {
                    label: opt_str(item, "label")
                        .or_else(|| opt_str(item, "type"))
                        .or_else(|| opt_str(item, "name"))?,
                    value: opt_str(item, "value"),
                }),
                other => Some(Evidence {
                    label: scalar_text(other).filter(|l| !l.is_empty())?,
                    value: None,
                }),
            })
            .collect(),
        Some(other) => string_list(Some(other))
            .into_iter()
            .map(|label| Evidence { label, value: None })
            .collect(),
        None => Vec::new(),
    }
}

// ── Strategy ──

fn has_saved_strategy(raw: &Value) -> bool {
    non_empty_object(field(raw, "strategy")).is_some()
}

fn strategy_section(raw: &Value) -> StrategySection {
    let saved = non_empty_object(field(raw, "strategy"));
    let guardrails = field(raw, "guardrails");
    let saved_criteria = field_in(saved, "decision_criteria");

    let decision_criteria = match field_in(guardrails, "decision_criteria") {
        Some(declared) => criteria_from_value(declared, saved_criteria),
        None => saved_criteria
            .map(|c| criteria_from_value(c, None))
            .unwrap_or_default(),
    };

    let assumptions = assumptions_text(field_in(saved, "assumptions"))
        .or_else(|| assumptions_text(field_in(guardrails, "assumptions")))
        .unwrap_or_default();

    StrategySection {
        decision_criteria,
        assumptions,
    }
}

fn assumptions_text(v: Option<&Value>) -> Option<String> {
    Some(string_list(v).join("\n")).filter(|s| !s.is_empty())
}

/// Criteria as a list or a `{key: criterion}` map. `answers` holds saved
/// selections keyed by criterion key or question.
fn criteria_from_value(v: &Value, answers: Option<&Value>) -> Vec<DecisionCriterion> {
    let entries: Vec<(Option<&str>, &Value)> = match v {
        Value::Array(items) => items.iter().map(|item| (None, item)).collect(),
        Value::Object(map) => map.iter().map(|(k, item)| (Some(k.as_str()), item)).collect(),
        _ => Vec::new(),
    };
    entries
        .into_iter()
        .filter_map(|(key, item)| criterion_from_entry(key, item, answers))
        .collect()
}

fn criterion_from_entry(
    key: Option<&str>,
    item: &Value,
    answers: Option<&Value>,
) -> Option<DecisionCriterion> {
    if !item.is_object() {
        // A bare saved choice: `{question: "chosen option"}`.
        let choice = scalar_text(item).filter(|c| !c.is_empty());
        return match (key, choice) {
            (Some(question), Some(choice)) => Some(DecisionCriterion {
                question: question.to_string(),
                options: vec![choice],
                selected: Some(0),
            }),
            (Some(question), None) => Some(DecisionCriterion {
                question: question.to_string(),
                ..DecisionCriterion::default()
            }),
            (None, Some(question)) => Some(DecisionCriterion {
                question,
                ..DecisionCriterion::default()
            }),
            (None, None) => None,
        };
    }

    let question = opt_str(item, "question")
        .or_else(|| opt_str(item, "description"))
        .or_else(|| opt_str(item, "name"))
        .or_else(|| key.map(str::to_string))?;
    let options = string_list(field(item, "options"));

    let selected = field(item, "selected")
        .and_then(|s| selection_index(s, &options))
        .or_else(|| {
            let saved = answers?;
            key.and_then(|k| saved.get(k))
                .or_else(|| saved.get(question.as_str()))
                .and_then(|s| saved_selection(s, &options))
        });

    Some(DecisionCriterion {
        question,
        options,
        selected,
    })
}

fn saved_selection(saved: &Value, options: &[String]) -> Option<usize> {
    match saved {
        Value::Object(_) => field(saved, "selected")
            .or_else(|| field(saved, "answer"))
            .and_then(|s| selection_index(s, options)),
        other => selection_index(other, options),
    }
}

/// An index into `options`, or the position of a matching option string.
fn selection_index(v: &Value, options: &[String]) -> Option<usize> {
    match v {
        Value::Number(n) => n
            .as_u64()
            .and_then(|i| usize::try_from(i).ok())
            .filter(|&i| i < options.len()),
        Value::String(s) => options.iter().position(|o| o == s.trim()),
        _ => None,
    }
}

// ── Build / Render / Validate ──

fn build_section(raw: &Value) -> Option<BuildSection> {
    if !BUILD_KEYS.iter().any(|key| field(raw, key).is_some()) {
        return None;
    }
    let mut schema = Map::new();
    for source in SCHEMA_SOURCES {
        if let Some(Value::Object(fragment)) = field(raw, source) {
            schema.extend(fragment.clone());
        }
    }
    Some(BuildSection {
        schema,
        rules: rules_from_value(field(raw, "rules")),
    })
}

fn render_section(raw: &Value) -> RenderSection {
    let configs = match field(raw, "render_configs") {
        Some(Value::Object(one)) => Some(RenderConfigs::One(one.clone())),
        Some(Value::Array(items)) => {
            let many: Vec<Map<String, Value>> = items
                .iter()
                .filter_map(|item| item.as_object().cloned())
                .collect();
            (!many.is_empty()).then_some(RenderConfigs::Many(many))
        }
        _ => None,
    };
    RenderSection {
        config_paths: string_list(field(raw, "config_paths")),
        template_paths: string_list(field(raw, "template_paths")),
        output_paths: string_list(field(raw, "output_paths")),
        synchronizer_paths: string_list(field(raw, "synchronizer_paths")),
        configs,
    }
}

fn validate_section(raw: &Value) -> Option<ValidateSection> {
    let rules = rules_from_value(field(raw, "rules"));
    (!rules.is_empty()).then_some(ValidateSection { rules })
}

/// Rules as strings, `{name, description}` objects, or a `{name: text}` map.
fn rules_from_value(v: Option<&Value>) -> Vec<Rule> {
    match v {
        Some(Value::Array(items)) => items.iter().filter_map(rule_from_value).collect(),
        Some(Value::Object(map)) => map
            .iter()
            .filter_map(|(name, body)| {
                let text = scalar_text(body)
                    .or_else(|| opt_str(body, "description"))
                    .or_else(|| opt_str(body, "text"))
                    .filter(|t| !t.is_empty())?;
                Some(Rule {
                    name: Some(name.clone()),
                    text,
                })
            })
            .collect(),
        Some(other) => rule_from_value(other).into_iter().collect(),
        None => Vec::new(),
    }
}

fn rule_from_value(v: &Value) -> Option<Rule> {
    if !v.is_object() {
        return Some(Rule {
            name: None,
            text: scalar_text(v).filter(|t| !t.is_empty())?,
        });
    }
    let name = opt_str(v, "name").or_else(|| opt_str(v, "file"));
    let text = opt_str(v, "description")
        .or_else(|| opt_str(v, "text"))
        .or_else(|| opt_str(v, "rule"))
        .or_else(|| opt_str(v, "content"))
        .or_else(|| name.clone())?;
    Some(Rule { name, text })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text(s: &str) -> Option<InstructionText> {
        Some(InstructionText::Text(s.into()))
    }

    fn lines(items: &[&str]) -> Option<InstructionText> {
        Some(InstructionText::Lines(
            items.iter().map(|s| s.to_string()).collect(),
        ))
    }

    #[test]
    fn merge_handles_all_four_shapes() {
        assert_eq!(merge(lines(&["b"]), lines(&["x", "y"])), lines(&["b", "x", "y"]));
        assert_eq!(merge(text("b"), lines(&["x"])), lines(&["b", "x"]));
        assert_eq!(merge(lines(&["b"]), text("x")), lines(&["b", "x"]));
        assert_eq!(merge(text("b"), text("x")), text("b\nx"));
    }

    #[test]
    fn merge_with_one_side_keeps_it_as_base() {
        assert_eq!(merge(None, text("x")), text("x"));
        assert_eq!(merge(lines(&["b"]), None), lines(&["b"]));
        assert_eq!(merge(None, None), None);
    }

    #[test]
    fn base_section_orders_behavior_action_then_merged_base() {
        let raw = json!({
            "behavior": {"name": "shape", "description": "Shape the map", "instructions": ["Keep it small"]},
            "action": {"name": "clarify", "instructions": "Ask first"},
            "behavior_instructions": ["Behavior rule"],
            "base_instructions": ["Base rule 1", "Base rule 2"]
        });
        let model = classify(&raw, "");
        assert_eq!(
            model.base.unwrap().lines,
            [
                "Behavior: shape",
                "Shape the map",
                "Keep it small",
                "Action: clarify",
                "Ask first",
                "Behavior rule",
                "Base rule 1",
                "Base rule 2",
            ]
        );
        assert!(model.section.is_none());
    }

    #[test]
    fn plain_text_payload_is_base_only() {
        let model = classify(&json!("Step one\nStep two"), "build");
        assert_eq!(model.base.unwrap().lines, ["Step one", "Step two"]);
        assert!(model.section.is_none());
        assert!(classify(&json!(null), "clarify").is_empty());
    }

    #[test]
    fn build_without_build_keys_is_absent() {
        let model = classify(&json!({"base_instructions": ["do it"]}), "build");
        assert!(model.base.is_some());
        assert!(model.build().is_none());
        assert!(model.section.is_none());
    }

    #[test]
    fn build_merges_schema_fragments_and_rules() {
        let raw = json!({
            "knowledge_graph_spec": {"nodes": ["epic"], "version": 1},
            "schema": {"version": 2, "edges": []},
            "rules": ["Name stories verb-noun", {"name": "size", "description": "Keep stories small"}]
        });
        let model = classify(&raw, "Build");
        let build = model.build().unwrap();
        assert_eq!(build.schema["version"], json!(2));
        assert_eq!(build.schema["nodes"], json!(["epic"]));
        assert!(build.schema.contains_key("edges"));
        assert_eq!(build.rules.len(), 2);
        assert_eq!(build.rules[1].name.as_deref(), Some("size"));
        assert_eq!(build.rules[1].text, "Keep stories small");
        assert!(model.base.is_none());
    }

    #[test]
    fn clarify_prefers_dedicated_data() {
        let raw = json!({
            "base_instructions": "Ask before building",
            "clarification": {
                "key_questions": {"Who are the users?": "Shoppers", "What is out of scope?": ""},
                "evidence": {"interviews": ["a.md", "b.md"], "notes": "n.md"}
            },
            "guardrails": {"required_context": {"key_questions": ["ignored?"], "evidence": ["ignored"]}}
        });
        let model = classify(&raw, "clarify");
        let clarify = model.clarify().unwrap();
        assert_eq!(clarify.questions.len(), 2);
        assert!(clarify
            .questions
            .iter()
            .any(|q| q.question == "Who are the users?" && q.answer.as_deref() == Some("Shoppers")));
        assert!(clarify
            .questions
            .iter()
            .any(|q| q.question == "What is out of scope?" && q.answer.is_none()));
        assert!(clarify
            .evidence
            .iter()
            .any(|e| e.label == "interviews" && e.value.as_deref() == Some("a.md, b.md")));
        assert!(model.base.is_some());
        assert!(model.strategy().is_none());
    }

    #[test]
    fn clarify_falls_back_to_guardrails() {
        let raw = json!({
            "guardrails": {"required_context": {
                "key_questions": ["Who are the users?", "What is the goal?"],
                "evidence": ["Interview notes"]
            }}
        });
        let clarify = classify(&raw, "clarify").clarify().cloned().unwrap();
        assert_eq!(
            clarify.questions,
            [
                QuestionAnswer { question: "Who are the users?".into(), answer: None },
                QuestionAnswer { question: "What is the goal?".into(), answer: None },
            ]
        );
        assert_eq!(clarify.evidence, [Evidence { label: "Interview notes".into(), value: None }]);
    }

    #[test]
    fn clarify_guardrail_questions_pick_up_saved_answers() {
        let raw = json!({
            "clarification": {"answers": {"Who?": "Shoppers"}},
            "guardrails": {"required_context": {"key_questions": ["Who?", "Why?"]}}
        });
        let model = classify(&raw, "clarify");
        let clarify = model.clarify().unwrap();
        assert_eq!(clarify.questions[0].answer.as_deref(), Some("Shoppers"));
        assert_eq!(clarify.questions[1].answer, None);
    }

    #[test]
    fn clarify_without_data_is_absent() {
        let model = classify(&json!({"base_instructions": ["x"]}), "clarify");
        assert!(model.section.is_none());
        assert!(model.base.is_some());
    }

    #[test]
    fn strategy_criteria_with_saved_selection() {
        let raw = json!({
            "guardrails": {
                "decision_criteria": [
                    {"question": "How deep?", "options": ["Epics only", "Down to stories"]},
                    {"question": "Split by?", "options": ["User", "Workflow"], "selected": 1}
                ],
                "assumptions": ["Single team"]
            },
            "strategy": {"decision_criteria": {"How deep?": "Down to stories"}}
        });
        let model = classify(&raw, "strategy");
        let strategy = model.strategy().unwrap();
        assert_eq!(strategy.decision_criteria.len(), 2);
        assert_eq!(strategy.decision_criteria[0].selected, Some(1));
        assert_eq!(
            strategy.decision_criteria[0].selected_option(),
            Some("Down to stories")
        );
        assert_eq!(strategy.decision_criteria[1].selected, Some(1));
        assert_eq!(strategy.assumptions, "Single team");
    }

    #[test]
    fn strategy_for_action_even_without_data() {
        let model = classify(&json!({"base_instructions": ["x"]}), "strategy");
        assert_eq!(model.strategy(), Some(&StrategySection::default()));
    }

    #[test]
    fn saved_strategy_shows_for_other_actions() {
        let raw = json!({
            "strategy": {"decision_criteria": {"Depth": "Stories"}, "assumptions": "Small team"}
        });
        let model = classify(&raw, "");
        let strategy = model.strategy().unwrap();
        assert_eq!(strategy.decision_criteria[0].question, "Depth");
        assert_eq!(strategy.decision_criteria[0].selected_option(), Some("Stories"));
        assert_eq!(strategy.assumptions, "Small team");

        assert!(classify(&raw, "render").strategy().is_none());
    }

    #[test]
    fn saved_strategy_fills_in_when_own_section_is_absent() {
        let raw = json!({"strategy": {"decision_criteria": {"Depth": "Stories"}}});
        for action in ["clarify", "build", "validate"] {
            let model = classify(&raw, action);
            let strategy = model.strategy().unwrap();
            assert_eq!(strategy.decision_criteria[0].question, "Depth");
        }

        // An own section takes precedence over saved strategy.
        let with_rules = json!({"rules": ["No orphans"], "strategy": {"assumptions": "x"}});
        assert!(classify(&with_rules, "validate").validate().is_some());
    }

    #[test]
    fn render_exposes_paths_and_configs() {
        let raw = json!({
            "config_paths": ["render/config.json"],
            "template_paths": "templates/story.md",
            "output_paths": ["out/a.md", "out/b.md"],
            "render_configs": [{"name": "a"}, "skip", {"name": "b"}]
        });
        let model = classify(&raw, "render");
        let render = model.render().unwrap();
        assert_eq!(render.config_paths, ["render/config.json"]);
        assert_eq!(render.template_paths, ["templates/story.md"]);
        assert_eq!(render.output_paths.len(), 2);
        assert!(render.synchronizer_paths.is_empty());
        assert_eq!(render.configs.as_ref().map(RenderConfigs::len), Some(2));

        let single = classify(&json!({"render_configs": {"name": "a"}}), "render");
        assert!(matches!(
            single.render().and_then(|r| r.configs.as_ref()),
            Some(RenderConfigs::One(_))
        ));
    }

    #[test]
    fn validate_requires_rules() {
        let with_rules = classify(&json!({"rules": {"no-orphans": "Every story has a feature"}}), "validate");
        let rules = &with_rules.validate().unwrap().rules;
        assert_eq!(rules[0].name.as_deref(), Some("no-orphans"));
        assert_eq!(rules[0].text, "Every story has a feature");

        assert!(classify(&json!({"rules": []}), "validate").section.is_none());
        assert!(classify(&json!({"base_instructions": "x"}), "validate").section.is_none());
    }

    #[test]
    fn declared_action_reads_name_or_string() {
        assert_eq!(declared_action(&json!({"action": {"name": "build"}})), "build");
        assert_eq!(declared_action(&json!({"action": " render "})), "render");
        assert_eq!(declared_action(&json!({})), "");
    }
}
