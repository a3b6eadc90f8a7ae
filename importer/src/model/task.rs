//! Job configuration consumed by the sandboxed evaluation backend.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};

/// A limit value, carried as text exactly as it was given.
///
/// Written as a bare number only when the number prints back as the same
/// text, so `16384` and `2.0` stay numbers while `0.500` or `1e3` are kept
/// as strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitValue(pub String);

impl Serialize for LimitValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0.parse::<u64>() {
            Ok(v) if v.to_string() == self.0 => return serializer.serialize_u64(v),
            _ => {}
        }
        match self.0.parse::<f64>() {
            Ok(v) if v.is_finite() && format!("{:?}", v) == self.0 => serializer.serialize_f64(v),
            _ => serializer.serialize_str(&self.0),
        }
    }
}

impl<'de> Deserialize<'de> for LimitValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        crate::util::string_or_number(deserializer).map(LimitValue)
    }
}

impl From<&str> for LimitValue {
    fn from(s: &str) -> Self {
        LimitValue(s.to_owned())
    }
}

impl From<String> for LimitValue {
    fn from(s: String) -> Self {
        LimitValue(s)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TaskCommand {
    pub bin: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountMode {
    #[serde(rename = "RW")]
    ReadWrite,
}

/// A host directory made visible inside the sandbox.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BoundDirectory {
    pub src: String,
    pub dst: String,
    pub mode: MountMode,
}

/// Limits of one hardware group.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct SandboxLimits {
    pub hw_group_id: String,
    pub time: LimitValue,
    pub memory: LimitValue,
    pub chdir: String,
    pub environ_variable: BTreeMap<String, String>,
    pub bound_directories: Vec<BoundDirectory>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Sandbox {
    pub name: String,
    pub limits: Vec<SandboxLimits>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct Task {
    pub task_id: String,
    pub priority: u32,
    pub fatal_failure: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    pub cmd: TaskCommand,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sandbox: Option<Sandbox>,
}

/// Something wrong with the wiring of a task graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphDefect {
    DuplicateId(String),
    /// Priority not greater than the one of the task before it.
    PriorityOrder { task: String, priority: u32 },
    /// Dependency on a task that does not come earlier in the list.
    DanglingDependency { task: String, dependency: String },
}

/// An ordered list of tasks. Each task may only depend on tasks before it.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskGraph {
    pub tasks: Vec<Task>,
}

impl TaskGraph {
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.task_id == id)
    }

    pub fn extend(&mut self, other: TaskGraph) {
        self.tasks.extend(other.tasks)
    }

    /// Check that ids are unique, priorities strictly increase and every
    /// dependency points backwards.
    pub fn validate(&self) -> Vec<GraphDefect> {
        let mut defects = vec![];
        let mut seen: HashMap<&str, u32> = HashMap::new();
        let mut last_priority = None;

        for task in &self.tasks {
            if seen.contains_key(task.task_id.as_str()) {
                defects.push(GraphDefect::DuplicateId(task.task_id.clone()));
            }
            if matches!(last_priority, Some(p) if task.priority <= p) {
                defects.push(GraphDefect::PriorityOrder {
                    task: task.task_id.clone(),
                    priority: task.priority,
                });
            }
            for dep in &task.dependencies {
                if !seen.contains_key(dep.as_str()) {
                    defects.push(GraphDefect::DanglingDependency {
                        task: task.task_id.clone(),
                        dependency: dep.clone(),
                    });
                }
            }
            seen.insert(&task.task_id, task.priority);
            last_priority = Some(task.priority);
        }

        defects
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}
