use super::types::{ActionItem, Contact, EvidenceEntry, ExpenseEntry};
use crate::log_debug;
use anyhow::{Context as _, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const STORE_FILE: &str = "case_store.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CaseDocument {
    #[serde(default)]
    tasks: Vec<ActionItem>,
    #[serde(default)]
    evidence: Vec<EvidenceEntry>,
    #[serde(default)]
    contacts: Vec<Contact>,
    #[serde(default)]
    expenses: Vec<ExpenseEntry>,
}

/// Read-only copy of the store for rendering.
#[derive(Debug, Clone, Default)]
pub struct CaseSnapshot {
    pub tasks: Vec<ActionItem>,
    pub evidence: Vec<EvidenceEntry>,
    pub contacts: Vec<Contact>,
    pub expenses: Vec<ExpenseEntry>,
}

/// JSON-document store for case records.
///
/// Every `add_*` appends one record and flushes the document to disk before
/// returning: a tool result sent back to the model is a confirmation, so the
/// write has to be durable first. The same operations serve user-driven
/// edits; assistant writes get no special path.
pub struct CaseStore {
    path: PathBuf,
    inner: Mutex<CaseDocument>,
}

impl CaseStore {
    /// Open the store under `data_dir`, creating an empty document on first
    /// use. A corrupt document is an error, not a silent reset; losing a
    /// case journal to a truncated write would be unrecoverable.
    pub fn open(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir).with_context(|| {
            format!("failed to create data directory '{}'", data_dir.display())
        })?;
        let path = data_dir.join(STORE_FILE);
        let document = if path.exists() {
            let bytes = fs::read(&path)
                .with_context(|| format!("failed to read case store '{}'", path.display()))?;
            serde_json::from_slice(&bytes)
                .with_context(|| format!("failed to parse case store '{}'", path.display()))?
        } else {
            CaseDocument::default()
        };
        Ok(Self {
            path,
            inner: Mutex::new(document),
        })
    }

    fn mutate<F>(&self, apply: F) -> Result<()>
    where
        F: FnOnce(&mut CaseDocument),
    {
        let mut doc = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        apply(&mut doc);
        let bytes = serde_json::to_vec_pretty(&*doc).context("failed to serialize case store")?;
        // Write-then-rename so a crash mid-write cannot truncate the journal.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, bytes)
            .with_context(|| format!("failed to write case store '{}'", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to replace case store '{}'", self.path.display()))?;
        Ok(())
    }

    pub fn add_task(
        &self,
        task: String,
        priority: String,
        category: String,
        description: String,
    ) -> Result<ActionItem> {
        let item = ActionItem {
            task,
            description,
            priority,
            category,
            completed: false,
            created: Local::now().format("%Y-%m-%d").to_string(),
        };
        let record = item.clone();
        self.mutate(|doc| doc.tasks.push(record))?;
        log_debug("store|op=add_task");
        Ok(item)
    }

    pub fn add_evidence(
        &self,
        kind: String,
        description: String,
        people_involved: String,
    ) -> Result<EvidenceEntry> {
        let now = Local::now();
        let entry = EvidenceEntry {
            kind,
            description,
            people_involved,
            date: now.format("%Y-%m-%d").to_string(),
            time: now.format("%H:%M").to_string(),
        };
        let record = entry.clone();
        self.mutate(|doc| doc.evidence.push(record))?;
        Ok(entry)
    }

    pub fn add_contact(
        &self,
        name: String,
        role: String,
        email: String,
        phone: String,
        notes: String,
    ) -> Result<Contact> {
        let contact = Contact {
            name,
            role,
            email,
            phone,
            notes,
        };
        let record = contact.clone();
        self.mutate(|doc| doc.contacts.push(record))?;
        Ok(contact)
    }

    pub fn add_expense(
        &self,
        description: String,
        amount: f64,
        category: String,
    ) -> Result<ExpenseEntry> {
        let entry = ExpenseEntry {
            description,
            amount,
            category,
            date: Local::now().format("%Y-%m-%d").to_string(),
        };
        let record = entry.clone();
        self.mutate(|doc| doc.expenses.push(record))?;
        Ok(entry)
    }

    pub fn snapshot(&self) -> CaseSnapshot {
        let doc = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        CaseSnapshot {
            tasks: doc.tasks.clone(),
            evidence: doc.evidence.clone(),
            contacts: doc.contacts.clone(),
            expenses: doc.expenses.clone(),
        }
    }

    /// Short digest of open tasks for the system instruction.
    pub fn open_task_summary(&self, limit: usize) -> String {
        let doc = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let open: Vec<&ActionItem> = doc.tasks.iter().filter(|t| !t.completed).collect();
        if open.is_empty() {
            return "No open tasks yet.".to_string();
        }
        let mut lines: Vec<String> = open
            .iter()
            .take(limit)
            .map(|t| format!("- [{}] {}", t.priority, t.task))
            .collect();
        if open.len() > lines.len() {
            lines.push(format!("- ... and {} more", open.len() - lines.len()));
        }
        lines.join("\n")
    }
}
