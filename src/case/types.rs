use serde::{Deserialize, Serialize};

/// One checklist task. Priorities and categories are stored as the strings
/// the model (or the user) supplied; the declared vocabulary is advisory and
/// rejecting a novel value would help nobody.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionItem {
    pub task: String,
    #[serde(default)]
    pub description: String,
    pub priority: String,
    pub category: String,
    pub completed: bool,
    pub created: String,
}

/// One dated entry in the evidence journal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvidenceEntry {
    pub kind: String,
    pub description: String,
    #[serde(default)]
    pub people_involved: String,
    pub date: String,
    pub time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contact {
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpenseEntry {
    pub description: String,
    pub amount: f64,
    pub category: String,
    pub date: String,
}

/// Views the assistant may navigate the UI to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Dashboard,
    Tasks,
    Evidence,
    Contacts,
    Expenses,
}

impl Page {
    /// Identifiers as declared to the model.
    pub const ALL: [Page; 5] = [
        Page::Dashboard,
        Page::Tasks,
        Page::Evidence,
        Page::Contacts,
        Page::Expenses,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Page::Dashboard => "dashboard",
            Page::Tasks => "tasks",
            Page::Evidence => "evidence",
            Page::Contacts => "contacts",
            Page::Expenses => "expenses",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::Tasks => "Task List",
            Page::Evidence => "Evidence Journal",
            Page::Contacts => "Contacts",
            Page::Expenses => "Expense Ledger",
        }
    }

    /// Parse a model-supplied identifier; unknown pages are a refusal, not a
    /// guess, because navigating somewhere arbitrary is worse than telling
    /// the model the page does not exist.
    pub fn parse(id: &str) -> Option<Page> {
        let normalized = id.trim().to_ascii_lowercase();
        Page::ALL
            .into_iter()
            .find(|page| page.id() == normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_ids_round_trip() {
        for page in Page::ALL {
            assert_eq!(Page::parse(page.id()), Some(page));
        }
    }

    #[test]
    fn page_parse_is_case_and_space_tolerant() {
        assert_eq!(Page::parse(" Tasks "), Some(Page::Tasks));
        assert_eq!(Page::parse("EVIDENCE"), Some(Page::Evidence));
    }

    #[test]
    fn unknown_page_is_none() {
        assert_eq!(Page::parse("settings"), None);
        assert_eq!(Page::parse(""), None);
    }
}
