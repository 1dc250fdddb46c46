use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Instructions reshaped for the currently active action.
///
/// `base` is present whenever any instruction content exists. `section`
/// carries at most one action-scoped bucket; the enum makes a second one
/// unrepresentable.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct InstructionsModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<BaseSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<ActionSection>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct BaseSection {
    pub lines: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionSection {
    Clarify(ClarifySection),
    Strategy(StrategySection),
    Build(BuildSection),
    Render(RenderSection),
    Validate(ValidateSection),
}

impl ActionSection {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Clarify(_) => "clarify",
            Self::Strategy(_) => "strategy",
            Self::Build(_) => "build",
            Self::Render(_) => "render",
            Self::Validate(_) => "validate",
        }
    }
}

impl InstructionsModel {
    pub fn is_empty(&self) -> bool {
        self.base.is_none() && self.section.is_none()
    }

    pub fn clarify(&self) -> Option<&ClarifySection> {
        match &self.section {
            Some(ActionSection::Clarify(s)) => Some(s),
            _ => None,
        }
    }

    pub fn strategy(&self) -> Option<&StrategySection> {
        match &self.section {
            Some(ActionSection::Strategy(s)) => Some(s),
            _ => None,
        }
    }

    pub fn build(&self) -> Option<&BuildSection> {
        match &self.section {
            Some(ActionSection::Build(s)) => Some(s),
            _ => None,
        }
    }

    pub fn render(&self) -> Option<&RenderSection> {
        match &self.section {
            Some(ActionSection::Render(s)) => Some(s),
            _ => None,
        }
    }

    pub fn validate(&self) -> Option<&ValidateSection> {
        match &self.section {
            Some(ActionSection::Validate(s)) => Some(s),
            _ => None,
        }
    }
}

// ── Clarify ──

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ClarifySection {
    pub questions: Vec<QuestionAnswer>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence: Vec<Evidence>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct QuestionAnswer {
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Evidence {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

// ── Strategy ──

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct StrategySection {
    pub decision_criteria: Vec<DecisionCriterion>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub assumptions: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct DecisionCriterion {
    pub question: String,
    pub options: Vec<String>,
    /// Index into `options` of a previously saved choice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<usize>,
}

impl DecisionCriterion {
    pub fn selected_option(&self) -> Option<&str> {
        self.selected
            .and_then(|i| self.options.get(i))
            .map(String::as_str)
    }
}

// ── Build / Validate ──

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct BuildSection {
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub schema: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<Rule>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidateSection {
    pub rules: Vec<Rule>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Rule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub text: String,
}

// ── Render ──

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct RenderSection {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub config_paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub template_paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output_paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub synchronizer_paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configs: Option<RenderConfigs>,
}

/// Render configuration as reported: a single object or a list of them.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum RenderConfigs {
    One(Map<String, Value>),
    Many(Vec<Map<String, Value>>),
}

impl RenderConfigs {
    pub fn len(&self) -> usize {
        match self {
            Self::One(_) => 1,
            Self::Many(list) => list.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
