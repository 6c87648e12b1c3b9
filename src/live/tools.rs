//! The tool dispatcher: five declared tools, each one local side effect,
//! every invocation answered.
//!
//! The model's arguments are best-effort JSON; parsing is maximally
//! permissive. A missing field gets a documented default, a wrong type gets
//! coerced, and an unknown tool name still produces a result string, because
//! the protocol owes the model exactly one response per invocation.

use crate::case::{CaseStore, Page};
use crate::live::protocol::FunctionCall;
use crate::{log_debug, log_debug_content};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;

const ACTION_LOG_CAP: usize = 20;

/// Typed view of one invocation after boundary validation. Every field has
/// already been defaulted; handlers never see a missing value.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    AddTask {
        task: String,
        priority: String,
        category: String,
        description: String,
    },
    LogEvidence {
        kind: String,
        description: String,
        people_involved: String,
    },
    AddContact {
        name: String,
        role: String,
        email: String,
        phone: String,
        notes: String,
    },
    NavigateTo {
        page: String,
    },
    LogExpense {
        description: String,
        amount: f64,
        category: String,
    },
    Unknown {
        name: String,
    },
}

fn str_arg(args: &Value, key: &str, default: &str) -> String {
    match args.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => default.to_string(),
    }
}

/// Amounts arrive as numbers, numeric strings, or garbage; garbage becomes 0
/// rather than a rejected call.
fn amount_arg(args: &Value, key: &str) -> f64 {
    match args.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().trim_start_matches('$').parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

impl ToolCall {
    pub fn parse(call: &FunctionCall) -> Self {
        let args = &call.args;
        match call.name.as_str() {
            "add_task" => ToolCall::AddTask {
                task: str_arg(args, "task", ""),
                priority: str_arg(args, "priority", "Other"),
                category: str_arg(args, "category", "General"),
                description: str_arg(args, "description", ""),
            },
            "log_evidence" => ToolCall::LogEvidence {
                kind: str_arg(args, "type", "Other"),
                description: str_arg(args, "description", ""),
                people_involved: str_arg(args, "peopleInvolved", ""),
            },
            "add_contact" => ToolCall::AddContact {
                name: str_arg(args, "name", ""),
                role: str_arg(args, "role", ""),
                email: str_arg(args, "email", ""),
                phone: str_arg(args, "phone", ""),
                notes: str_arg(args, "notes", ""),
            },
            "navigate_to" => ToolCall::NavigateTo {
                page: str_arg(args, "page", ""),
            },
            "log_expense" => ToolCall::LogExpense {
                description: str_arg(args, "description", ""),
                amount: amount_arg(args, "amount"),
                category: str_arg(args, "category", "Other"),
            },
            other => ToolCall::Unknown {
                name: other.to_string(),
            },
        }
    }
}

/// One line of "what the assistant just did", shown in the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionLogEntry {
    pub glyph: &'static str,
    pub text: String,
}

/// Rolling log of recent assistant actions, oldest dropped first.
#[derive(Debug, Default)]
pub struct ActionLog {
    entries: VecDeque<ActionLogEntry>,
}

impl ActionLog {
    pub fn push(&mut self, entry: ActionLogEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > ACTION_LOG_CAP {
            self.entries.pop_front();
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &ActionLogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// What one dispatch produced: the result string owed to the model, the
/// UI-facing log entry, and a navigation target when the tool asked for one.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    pub output: String,
    pub action: ActionLogEntry,
    pub navigate: Option<Page>,
}

/// Executes tool calls against the case store. Stateless between calls; the
/// store write completes before the result is returned so the confirmation
/// sent to the model is never ahead of disk.
pub struct Dispatcher {
    store: Arc<CaseStore>,
}

impl Dispatcher {
    pub fn new(store: Arc<CaseStore>) -> Self {
        Self { store }
    }

    pub fn dispatch(&self, call: &FunctionCall) -> DispatchOutcome {
        let parsed = ToolCall::parse(call);
        log_debug_content(&format!(
            "tool_call|name={}|id={}|args={}",
            call.name, call.id, call.args
        ));
        let outcome = self.run(parsed);
        log_debug(&format!("tool_done|name={}|id={}", call.name, call.id));
        outcome
    }

    fn run(&self, call: ToolCall) -> DispatchOutcome {
        match call {
            ToolCall::AddTask {
                task,
                priority,
                category,
                description,
            } => match self
                .store
                .add_task(task.clone(), priority, category, description)
            {
                Ok(item) => DispatchOutcome {
                    output: format!("Added task: {}", item.task),
                    action: ActionLogEntry {
                        glyph: "+",
                        text: format!("Added task: {}", item.task),
                    },
                    navigate: None,
                },
                Err(err) => store_failure("task", &task, &err),
            },
            ToolCall::LogEvidence {
                kind,
                description,
                people_involved,
            } => match self
                .store
                .add_evidence(kind.clone(), description, people_involved)
            {
                Ok(entry) => {
                    let label = if entry.description.is_empty() {
                        entry.kind.clone()
                    } else {
                        entry.description.clone()
                    };
                    DispatchOutcome {
                        output: format!("Logged {} evidence entry for {}", entry.kind, entry.date),
                        action: ActionLogEntry {
                            glyph: "▣",
                            text: format!("Logged: {label}"),
                        },
                        navigate: None,
                    }
                }
                Err(err) => store_failure("evidence entry", &kind, &err),
            },
            ToolCall::AddContact {
                name,
                role,
                email,
                phone,
                notes,
            } => match self
                .store
                .add_contact(name.clone(), role.clone(), email, phone, notes)
            {
                Ok(contact) => DispatchOutcome {
                    output: format!("Saved contact: {} ({})", contact.name, contact.role),
                    action: ActionLogEntry {
                        glyph: "@",
                        text: format!("Saved contact: {}", contact.name),
                    },
                    navigate: None,
                },
                Err(err) => store_failure("contact", &name, &err),
            },
            ToolCall::NavigateTo { page } => match Page::parse(&page) {
                Some(target) => DispatchOutcome {
                    output: format!("Navigating to {}", target.title()),
                    action: ActionLogEntry {
                        glyph: "→",
                        text: format!("Opened {}", target.title()),
                    },
                    navigate: Some(target),
                },
                None => DispatchOutcome {
                    output: format!("Unknown page: {page}"),
                    action: ActionLogEntry {
                        glyph: "?",
                        text: format!("Ignored navigation to unknown page '{page}'"),
                    },
                    navigate: None,
                },
            },
            ToolCall::LogExpense {
                description,
                amount,
                category,
            } => match self
                .store
                .add_expense(description.clone(), amount, category)
            {
                Ok(entry) => DispatchOutcome {
                    output: format!(
                        "Logged expense: {} (${:.2}, {})",
                        entry.description, entry.amount, entry.category
                    ),
                    action: ActionLogEntry {
                        glyph: "$",
                        text: format!("Logged expense: {} ${:.2}", entry.description, entry.amount),
                    },
                    navigate: None,
                },
                Err(err) => store_failure("expense", &description, &err),
            },
            ToolCall::Unknown { name } => DispatchOutcome {
                output: format!("Unrecognized tool: {name}"),
                action: ActionLogEntry {
                    glyph: "?",
                    text: format!("Ignored unrecognized tool '{name}'"),
                },
                navigate: None,
            },
        }
    }
}

fn store_failure(what: &str, detail: &str, err: &anyhow::Error) -> DispatchOutcome {
    crate::log_swallowed("case_store_write", err);
    DispatchOutcome {
        output: format!("Failed to save {what}: {err}"),
        action: ActionLogEntry {
            glyph: "!",
            text: format!("Could not save {what} '{detail}'"),
        },
        navigate: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(name: &str, args: Value) -> FunctionCall {
        FunctionCall {
            id: "call-1".to_string(),
            name: name.to_string(),
            args,
        }
    }

    fn dispatcher() -> (tempfile::TempDir, Dispatcher, Arc<CaseStore>) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(CaseStore::open(dir.path()).unwrap());
        (dir, Dispatcher::new(store.clone()), store)
    }

    #[test]
    fn add_task_with_full_args_creates_open_item() {
        let (_dir, dispatcher, store) = dispatcher();
        let outcome = dispatcher.dispatch(&call(
            "add_task",
            json!({"task": "File police report", "priority": "Immediate", "category": "Legal"}),
        ));
        assert_eq!(outcome.output, "Added task: File police report");
        let snapshot = store.snapshot();
        assert_eq!(snapshot.tasks.len(), 1);
        assert_eq!(snapshot.tasks[0].priority, "Immediate");
        assert!(!snapshot.tasks[0].completed);
    }

    #[test]
    fn missing_args_get_documented_defaults() {
        let (_dir, dispatcher, store) = dispatcher();
        dispatcher.dispatch(&call("add_task", Value::Null));
        let snapshot = store.snapshot();
        assert_eq!(snapshot.tasks[0].task, "");
        assert_eq!(snapshot.tasks[0].priority, "Other");
        assert_eq!(snapshot.tasks[0].category, "General");
    }

    #[test]
    fn unknown_tool_yields_error_result_not_silence() {
        let (_dir, dispatcher, _) = dispatcher();
        let outcome = dispatcher.dispatch(&call("summon_dragon", json!({})));
        assert_eq!(outcome.output, "Unrecognized tool: summon_dragon");
        assert_eq!(outcome.action.glyph, "?");
    }

    #[test]
    fn unparseable_expense_amount_defaults_to_zero() {
        let (_dir, dispatcher, store) = dispatcher();
        dispatcher.dispatch(&call(
            "log_expense",
            json!({"description": "Taxi", "amount": "not-a-number"}),
        ));
        assert_eq!(store.snapshot().expenses[0].amount, 0.0);
    }

    #[test]
    fn expense_amount_accepts_numbers_and_numeric_strings() {
        let (_dir, dispatcher, store) = dispatcher();
        dispatcher.dispatch(&call("log_expense", json!({"description": "a", "amount": 12.5})));
        dispatcher.dispatch(&call("log_expense", json!({"description": "b", "amount": "$40"})));
        let expenses = store.snapshot().expenses;
        assert_eq!(expenses[0].amount, 12.5);
        assert_eq!(expenses[1].amount, 40.0);
        assert_eq!(expenses[0].category, "Other");
    }

    #[test]
    fn navigation_resolves_known_pages() {
        let (_dir, dispatcher, _) = dispatcher();
        let outcome = dispatcher.dispatch(&call("navigate_to", json!({"page": "tasks"})));
        assert_eq!(outcome.navigate, Some(Page::Tasks));
        assert_eq!(outcome.output, "Navigating to Task List");
    }

    #[test]
    fn navigation_refuses_unknown_pages() {
        let (_dir, dispatcher, _) = dispatcher();
        let outcome = dispatcher.dispatch(&call("navigate_to", json!({"page": "mars"})));
        assert_eq!(outcome.navigate, None);
        assert_eq!(outcome.output, "Unknown page: mars");
    }

    #[test]
    fn evidence_defaults_kind_to_other() {
        let (_dir, dispatcher, store) = dispatcher();
        dispatcher.dispatch(&call("log_evidence", json!({"description": "Saw the car"})));
        let entries = store.snapshot().evidence;
        assert_eq!(entries[0].kind, "Other");
        assert_eq!(entries[0].people_involved, "");
    }

    #[test]
    fn action_log_caps_at_twenty_entries() {
        let mut log = ActionLog::default();
        for i in 0..25 {
            log.push(ActionLogEntry {
                glyph: "+",
                text: format!("entry {i}"),
            });
        }
        assert_eq!(log.len(), 20);
        let first = log.entries().next().unwrap();
        assert_eq!(first.text, "entry 5", "oldest entries drop first");
    }
}
