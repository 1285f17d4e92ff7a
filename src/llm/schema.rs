//! Typed analysis responses and structural validation of recovered JSON.
//!
//! Validation walks the generic [`serde_json::Value`] tree by hand instead of
//! deserializing straight into the target types, so that one pass reports
//! every mismatched field rather than stopping at the first.

use crate::error::SchemaViolation;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            pub fn parse(text: &str) -> Option<Self> {
                match text {
                    $($text => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum!(
    /// Maturity stage the generator assigns to the project.
    ProjectStage {
        Documentation => "documentation",
        Mvp => "mvp",
        Launched => "launched",
        Growing => "growing",
        Unknown => "unknown",
    }
);

string_enum!(
    /// Severity of an issue and priority of a task share the same scale.
    Level {
        High => "high",
        Medium => "medium",
        Low => "low",
    }
);

string_enum!(TaskCategory {
    Documentation => "documentation",
    Technical => "technical",
    Product => "product",
    Marketing => "marketing",
    Business => "business",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strength {
    pub area: String,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub severity: Level,
    pub area: String,
    pub detail: String,
    pub file_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub title: String,
    pub description: String,
    pub priority: Level,
    pub category: TaskCategory,
    pub estimated_minutes: u32,
    /// Title of another task this one depends on.
    pub depends_on: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    pub project_summary: String,
    pub detected_stage: ProjectStage,
    pub tech_stack: Vec<String>,
    pub strengths: Vec<Strength>,
    pub issues: Vec<Issue>,
    pub tasks: Vec<Task>,
    pub next_milestone: Option<String>,
}

impl Analysis {
    /// Tasks whose `depends_on` names no task in this analysis, as
    /// `(task title, missing dependency)` pairs.
    pub fn dangling_dependencies(&self) -> Vec<(&str, &str)> {
        let titles: HashSet<&str> = self.tasks.iter().map(|t| t.title.as_str()).collect();
        self.tasks
            .iter()
            .filter_map(|task| {
                let dep = task.depends_on.as_deref()?;
                (!titles.contains(dep)).then_some((task.title.as_str(), dep))
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub question: String,
    /// Why the answer matters for the analysis.
    pub why: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialAnalysis {
    pub project_summary: String,
    pub detected_stage: ProjectStage,
    pub tech_stack: Vec<String>,
}

/// A validated generator response: either a full analysis, or questions for
/// the user plus whatever could be inferred so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisResponse {
    Complete(Analysis),
    NeedsClarification { questions: Vec<Question>, partial: Option<PartialAnalysis> },
}

/// Wire shape of [`AnalysisResponse`], flag plus optional sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisEnvelope {
    pub needs_clarification: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub questions: Vec<Question>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_analysis: Option<PartialAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<Analysis>,
}

impl AnalysisResponse {
    pub fn needs_clarification(&self) -> bool {
        matches!(self, AnalysisResponse::NeedsClarification { .. })
    }

    pub fn to_envelope(&self) -> AnalysisEnvelope {
        match self {
            AnalysisResponse::Complete(analysis) => AnalysisEnvelope {
                needs_clarification: false,
                questions: Vec::new(),
                partial_analysis: None,
                analysis: Some(analysis.clone()),
            },
            AnalysisResponse::NeedsClarification { questions, partial } => AnalysisEnvelope {
                needs_clarification: true,
                questions: questions.clone(),
                partial_analysis: partial.clone(),
                analysis: None,
            },
        }
    }
}

impl Serialize for AnalysisResponse {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_envelope().serialize(serializer)
    }
}

/// Validate a recovered JSON tree against the analysis response shape.
///
/// Returns every violation found. Purely structural: task `depends_on` titles
/// are not checked against the task list (see
/// [`Analysis::dangling_dependencies`]).
pub fn validate_analysis(value: &Value) -> Result<AnalysisResponse, Vec<SchemaViolation>> {
    let mut v = Validator::default();
    let Some(root) = v.object(value, "$") else {
        return Err(v.violations);
    };

    let flag = v.required(root, "needs_clarification", "needs_clarification").and_then(|value| {
        let flag = value.as_bool();
        if flag.is_none() {
            v.push("needs_clarification", format!("expected boolean, found {}", kind(value)));
        }
        flag
    });

    let response = match flag {
        Some(true) => {
            let questions = v.questions(root);
            let partial = match root.get("partial_analysis") {
                None | Some(Value::Null) => None,
                Some(value) => v.partial_analysis(value, "partial_analysis"),
            };
            questions.map(|questions| AnalysisResponse::NeedsClarification { questions, partial })
        }
        Some(false) => v
            .required(root, "analysis", "analysis")
            .and_then(|value| v.analysis(value, "analysis"))
            .map(AnalysisResponse::Complete),
        None => None,
    };

    match response {
        Some(response) if v.violations.is_empty() => Ok(response),
        _ => Err(v.violations),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn join(path: &str, key: &str) -> String {
    if path == "$" {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

#[derive(Default)]
struct Validator {
    violations: Vec<SchemaViolation>,
}

impl Validator {
    fn push(&mut self, path: impl Into<String>, reason: impl Into<String>) {
        self.violations.push(SchemaViolation::new(path, reason));
    }

    fn object<'a>(&mut self, value: &'a Value, path: &str) -> Option<&'a Map<String, Value>> {
        let object = value.as_object();
        if object.is_none() {
            self.push(path, format!("expected object, found {}", kind(value)));
        }
        object
    }

    fn array<'a>(&mut self, value: &'a Value, path: &str) -> Option<&'a Vec<Value>> {
        let array = value.as_array();
        if array.is_none() {
            self.push(path, format!("expected array, found {}", kind(value)));
        }
        array
    }

    fn required<'a>(
        &mut self,
        object: &'a Map<String, Value>,
        key: &str,
        path: &str,
    ) -> Option<&'a Value> {
        let value = object.get(key);
        if value.is_none() {
            self.push(path, "missing required field");
        }
        value
    }

    fn string(&mut self, object: &Map<String, Value>, key: &str, parent: &str) -> Option<String> {
        let path = join(parent, key);
        let value = self.required(object, key, &path)?;
        match value.as_str() {
            Some(text) => Some(text.to_string()),
            None => {
                self.push(path, format!("expected string, found {}", kind(value)));
                None
            }
        }
    }

    /// Absent and `null` both mean `None`.
    fn nullable_string(
        &mut self,
        object: &Map<String, Value>,
        key: &str,
        parent: &str,
    ) -> Option<Option<String>> {
        match object.get(key) {
            None | Some(Value::Null) => Some(None),
            Some(Value::String(text)) => Some(Some(text.clone())),
            Some(other) => {
                self.push(join(parent, key), format!("expected string or null, found {}", kind(other)));
                None
            }
        }
    }

    fn string_list(
        &mut self,
        object: &Map<String, Value>,
        key: &str,
        parent: &str,
    ) -> Option<Vec<String>> {
        let path = join(parent, key);
        let items = self.required(object, key, &path).and_then(|value| self.array(value, &path))?;
        let mut out = Vec::with_capacity(items.len());
        let mut ok = true;
        for (idx, item) in items.iter().enumerate() {
            match item.as_str() {
                Some(text) => out.push(text.to_string()),
                None => {
                    self.push(format!("{path}[{idx}]"), format!("expected string, found {}", kind(item)));
                    ok = false;
                }
            }
        }
        ok.then_some(out)
    }

    fn choice<T: Copy + fmt::Display>(
        &mut self,
        object: &Map<String, Value>,
        key: &str,
        parent: &str,
        allowed: &[T],
        parse: fn(&str) -> Option<T>,
    ) -> Option<T> {
        let text = self.string(object, key, parent)?;
        let parsed = parse(&text);
        if parsed.is_none() {
            let expected = allowed.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
            self.push(join(parent, key), format!("expected one of [{expected}], found {text:?}"));
        }
        parsed
    }

    fn minutes(&mut self, object: &Map<String, Value>, key: &str, parent: &str) -> Option<u32> {
        let path = join(parent, key);
        let value = self.required(object, key, &path)?;
        let minutes = value
            .as_f64()
            .filter(|m| m.is_finite() && *m >= 0.0 && *m <= f64::from(u32::MAX))
            .map(|m| m.round() as u32);
        if minutes.is_none() {
            self.push(path, format!("expected non-negative number, found {value}"));
        }
        minutes
    }

    /// Validate every element of a required array field with `item`.
    fn list_of<T>(
        &mut self,
        object: &Map<String, Value>,
        key: &str,
        parent: &str,
        item: fn(&mut Self, &Map<String, Value>, &str) -> Option<T>,
    ) -> Option<Vec<T>> {
        let path = join(parent, key);
        let items = self.required(object, key, &path).and_then(|value| self.array(value, &path))?;
        let mut out = Vec::with_capacity(items.len());
        let mut ok = true;
        for (idx, value) in items.iter().enumerate() {
            let item_path = format!("{path}[{idx}]");
            match self.object(value, &item_path).and_then(|obj| item(self, obj, &item_path)) {
                Some(parsed) => out.push(parsed),
                None => ok = false,
            }
        }
        ok.then_some(out)
    }

    fn questions(&mut self, root: &Map<String, Value>) -> Option<Vec<Question>> {
        let questions = self.list_of(root, "questions", "$", |v, obj, path| {
            let id = v.string(obj, "id", path);
            let question = v.string(obj, "question", path);
            let why = v.string(obj, "why", path);
            Some(Question { id: id?, question: question?, why: why? })
        })?;
        if questions.is_empty() {
            self.push("questions", "expected at least one question when clarification is needed");
            return None;
        }
        Some(questions)
    }

    fn partial_analysis(&mut self, value: &Value, path: &str) -> Option<PartialAnalysis> {
        let obj = self.object(value, path)?;
        let project_summary = self.string(obj, "project_summary", path);
        let detected_stage = self.stage(obj, path);
        let tech_stack = self.string_list(obj, "tech_stack", path);
        Some(PartialAnalysis {
            project_summary: project_summary?,
            detected_stage: detected_stage?,
            tech_stack: tech_stack?,
        })
    }

    fn stage(&mut self, obj: &Map<String, Value>, path: &str) -> Option<ProjectStage> {
        self.choice(obj, "detected_stage", path, ProjectStage::ALL, ProjectStage::parse)
    }

    fn analysis(&mut self, value: &Value, path: &str) -> Option<Analysis> {
        let obj = self.object(value, path)?;
        let project_summary = self.string(obj, "project_summary", path);
        let detected_stage = self.stage(obj, path);
        let tech_stack = self.string_list(obj, "tech_stack", path);
        let strengths = self.list_of(obj, "strengths", path, |v, obj, path| {
            let area = v.string(obj, "area", path);
            let detail = v.string(obj, "detail", path);
            Some(Strength { area: area?, detail: detail? })
        });
        let issues = self.list_of(obj, "issues", path, |v, obj, path| {
            let severity = v.choice(obj, "severity", path, Level::ALL, Level::parse);
            let area = v.string(obj, "area", path);
            let detail = v.string(obj, "detail", path);
            let file_path = v.nullable_string(obj, "file_path", path);
            Some(Issue { severity: severity?, area: area?, detail: detail?, file_path: file_path? })
        });
        let tasks = self.list_of(obj, "tasks", path, |v, obj, path| {
            let title = v.string(obj, "title", path);
            let description = v.string(obj, "description", path);
            let priority = v.choice(obj, "priority", path, Level::ALL, Level::parse);
            let category = v.choice(obj, "category", path, TaskCategory::ALL, TaskCategory::parse);
            let estimated_minutes = v.minutes(obj, "estimated_minutes", path);
            let depends_on = v.nullable_string(obj, "depends_on", path);
            Some(Task {
                title: title?,
                description: description?,
                priority: priority?,
                category: category?,
                estimated_minutes: estimated_minutes?,
                depends_on: depends_on?,
            })
        });
        let next_milestone = self.nullable_string(obj, "next_milestone", path);

        Some(Analysis {
            project_summary: project_summary?,
            detected_stage: detected_stage?,
            tech_stack: tech_stack?,
            strengths: strengths?,
            issues: issues?,
            tasks: tasks?,
            next_milestone: next_milestone?,
        })
    }
}
