//! Tool declarations sent in the setup message, and the system instruction
//! that frames the conversation.

use crate::case::{CaseContext, Page};
use serde_json::{json, Value};

pub(super) const PRIORITIES: [&str; 4] = ["Immediate", "High", "Medium", "Low"];
pub(super) const EVIDENCE_KINDS: [&str; 7] = [
    "Phone Call",
    "Email",
    "In-Person",
    "Police Interaction",
    "Court",
    "Sighting",
    "Other",
];
pub(super) const EXPENSE_CATEGORIES: [&str; 5] =
    ["Legal", "Travel", "Investigation", "Administrative", "Other"];

/// The five function declarations the model may call during a session.
pub(super) fn function_declarations() -> Vec<Value> {
    let page_ids: Vec<&str> = Page::ALL.iter().map(|page| page.id()).collect();
    vec![
        json!({
            "name": "add_task",
            "description": "Add one action item to the parent's task list.",
            "parameters": {
                "type": "OBJECT",
                "properties": {
                    "task": {"type": "STRING", "description": "What needs to be done."},
                    "priority": {"type": "STRING", "enum": PRIORITIES},
                    "category": {"type": "STRING", "description": "Short grouping label, e.g. Legal."}
                },
                "required": ["task"]
            }
        }),
        json!({
            "name": "log_evidence",
            "description": "Record one entry in the evidence journal, stamped with the current date and time.",
            "parameters": {
                "type": "OBJECT",
                "properties": {
                    "type": {"type": "STRING", "enum": EVIDENCE_KINDS},
                    "description": {"type": "STRING", "description": "What happened."},
                    "peopleInvolved": {"type": "STRING", "description": "Who was involved, if anyone."}
                },
                "required": ["type", "description"]
            }
        }),
        json!({
            "name": "add_contact",
            "description": "Save a person to the case contact list.",
            "parameters": {
                "type": "OBJECT",
                "properties": {
                    "name": {"type": "STRING"},
                    "role": {"type": "STRING", "description": "e.g. lawyer, consular officer, liaison."},
                    "email": {"type": "STRING"},
                    "phone": {"type": "STRING"},
                    "notes": {"type": "STRING"}
                },
                "required": ["name", "role"]
            }
        }),
        json!({
            "name": "navigate_to",
            "description": "Switch the app to a different view for the parent.",
            "parameters": {
                "type": "OBJECT",
                "properties": {
                    "page": {"type": "STRING", "enum": page_ids}
                },
                "required": ["page"]
            }
        }),
        json!({
            "name": "log_expense",
            "description": "Record one case-related expense, stamped with the current date.",
            "parameters": {
                "type": "OBJECT",
                "properties": {
                    "description": {"type": "STRING"},
                    "amount": {"type": "NUMBER"},
                    "category": {"type": "STRING", "enum": EXPENSE_CATEGORIES}
                },
                "required": ["description", "amount"]
            }
        }),
    ]
}

/// Assemble the system instruction from the case context and the current
/// open-task digest.
pub(super) fn system_instruction(context: &CaseContext, open_tasks: &str) -> String {
    let mut sections = vec![
        "You are LiveGuide, a calm, practical voice assistant for a parent \
         working an international child abduction case. Keep answers short \
         and spoken-word friendly. When the parent mentions something \
         actionable, use your tools to capture it instead of only talking \
         about it."
            .to_string(),
    ];
    sections.push(format!("Case summary: {}", context.summary()));
    sections.push(format!("Current open tasks:\n{open_tasks}"));
    sections.push(
        "Never invent legal facts. When unsure, suggest the parent confirm \
         with their lawyer or the central authority."
            .to_string(),
    );
    sections.join("\n\n")
}
