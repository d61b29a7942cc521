//! Idea drafts and search history kept in the local cache.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{configs, StorageManager};

const MAX_DRAFTS: usize = 10;
const MAX_SEARCH_HISTORY: usize = 10;

/// An unsubmitted idea.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftIdea {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub category: String,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub timestamp: Option<i64>,
}

impl DraftIdea {
    pub fn new(title: impl Into<String>, description: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            description: description.into(),
            category: category.into(),
            timestamp: None,
        }
    }
}

impl StorageManager {
    /// Save a draft and return its id. New drafts go first; only the ten
    /// most recent are kept.
    pub fn save_draft(&self, mut draft: DraftIdea) -> String {
        let now = Utc::now().timestamp_millis();
        let id = draft
            .id
            .clone()
            .unwrap_or_else(|| format!("draft_{}", now));
        draft.id = Some(id.clone());
        draft.timestamp.get_or_insert(now);

        let mut drafts = self.drafts();
        match drafts.iter_mut().find(|d| d.id.as_deref() == Some(id.as_str())) {
            Some(existing) => *existing = draft,
            None => drafts.insert(0, draft),
        }
        drafts.truncate(MAX_DRAFTS);

        if !self.set_item(&configs::DRAFTS, &drafts) {
            tracing::warn!(draft_id = %id, "Draft could not be cached");
        }
        id
    }

    pub fn drafts(&self) -> Vec<DraftIdea> {
        self.get_item(&configs::DRAFTS).unwrap_or_default()
    }

    pub fn draft(&self, id: &str) -> Option<DraftIdea> {
        self.drafts()
            .into_iter()
            .find(|d| d.id.as_deref() == Some(id))
    }

    pub fn delete_draft(&self, id: &str) -> bool {
        let drafts: Vec<DraftIdea> = self
            .drafts()
            .into_iter()
            .filter(|d| d.id.as_deref() != Some(id))
            .collect();
        self.set_item(&configs::DRAFTS, &drafts)
    }

    pub fn clear_drafts(&self) -> bool {
        self.set_item(&configs::DRAFTS, &Vec::<DraftIdea>::new())
    }

    /// Most recent search first.
    pub fn search_history(&self) -> Vec<String> {
        self.get_item(&configs::SEARCH_HISTORY).unwrap_or_default()
    }

    /// Record a search term, moving repeats to the front.
    pub fn push_search(&self, term: &str) -> bool {
        let term = term.trim();
        if term.is_empty() {
            return false;
        }

        let mut history = self.search_history();
        history.retain(|t| !t.eq_ignore_ascii_case(term));
        history.insert(0, term.to_string());
        history.truncate(MAX_SEARCH_HISTORY);
        self.set_item(&configs::SEARCH_HISTORY, &history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_drafts_go_first_and_are_capped() {
        let storage = StorageManager::in_memory();
        for i in 0..12 {
            let mut draft = DraftIdea::new(format!("Idea {}", i), "Some description", "esports");
            draft.id = Some(format!("draft_{}", i));
            storage.save_draft(draft);
        }

        let drafts = storage.drafts();
        assert_eq!(drafts.len(), 10);
        assert_eq!(drafts[0].title, "Idea 11");
        assert!(storage.draft("draft_0").is_none());
    }

    #[test]
    fn test_saving_existing_draft_updates_in_place() {
        let storage = StorageManager::in_memory();
        let first = storage.save_draft(DraftIdea::new("First", "aaaaaaaaaa", "fps"));
        assert!(first.starts_with("draft_"));

        let mut second = DraftIdea::new("Second", "bbbbbbbbbb", "fps");
        second.id = Some("draft_second".into());
        storage.save_draft(second);

        let mut edited = storage.draft(&first).unwrap();
        edited.title = "First, edited".into();
        storage.save_draft(edited);

        let drafts = storage.drafts();
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].id.as_deref(), Some("draft_second"));
        assert_eq!(drafts[1].title, "First, edited");
    }

    #[test]
    fn test_delete_draft() {
        let storage = StorageManager::in_memory();
        let id = storage.save_draft(DraftIdea::new("Keep?", "no thanks", ""));
        assert!(storage.delete_draft(&id));
        assert!(storage.drafts().is_empty());
    }

    #[test]
    fn test_search_history_dedupes_and_caps() {
        let storage = StorageManager::in_memory();
        for term in ["valorant", "chess", "Valorant", "  ", "fifa"] {
            storage.push_search(term);
        }
        assert_eq!(storage.search_history(), vec!["fifa", "Valorant", "chess"]);

        for i in 0..15 {
            storage.push_search(&format!("term {}", i));
        }
        let history = storage.search_history();
        assert_eq!(history.len(), 10);
        assert_eq!(history[0], "term 14");
    }
}
