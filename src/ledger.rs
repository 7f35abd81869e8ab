use log::{debug, info, warn};

use crate::error::{Result, StatementError};
use crate::schema::{Transaction, TransactionDraft};
use crate::storage::{KeyValueStore, LEDGER_KEY};
use crate::utils::{fresh_id, sort_by_date, SortOrder};

/// The session's authoritative transaction set, newest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerStore {
    transactions: Vec<Transaction>,
}

impl LedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_transactions(transactions: Vec<Transaction>) -> Self {
        let mut ledger = Self { transactions };
        ledger.resort();
        ledger
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.transactions.iter().any(|t| t.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id == id)
    }

    /// Appends imported entries and re-sorts the whole ledger newest first.
    /// Entries whose id collides with an existing one are given a fresh id.
    pub fn merge(&mut self, entries: Vec<Transaction>) {
        let incoming = entries.len();
        for mut entry in entries {
            if entry.id.is_empty() || self.contains_id(&entry.id) {
                entry.id = fresh_id(|candidate| self.contains_id(candidate));
            }
            self.transactions.push(entry);
        }
        self.resort();
        debug!(
            "Merged {} transactions, ledger now holds {}",
            incoming,
            self.transactions.len()
        );
    }

    /// Inserts a manually created entry under a fresh id and returns that id.
    pub fn add(&mut self, draft: TransactionDraft) -> String {
        let id = fresh_id(|candidate| self.contains_id(candidate));
        self.transactions
            .push(Transaction::from_draft(id.clone(), draft));
        self.resort();
        id
    }

    /// Deletes the entry with the given id. Returns the removed entry, or `None`
    /// when no entry matched.
    pub fn remove(&mut self, id: &str) -> Option<Transaction> {
        let idx = self.transactions.iter().position(|t| t.id == id)?;
        Some(self.transactions.remove(idx))
    }

    /// Empties the ledger and drops the persisted snapshot.
    pub fn clear<S: KeyValueStore>(&mut self, store: &mut S) -> Result<()> {
        self.transactions.clear();
        store.remove(LEDGER_KEY)?;
        info!("Ledger cleared");
        Ok(())
    }

    /// Case-insensitive match against description, category and notes.
    pub fn search(&self, query: &str) -> Vec<&Transaction> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.transactions.iter().collect();
        }

        self.transactions
            .iter()
            .filter(|t| {
                t.description.to_lowercase().contains(&needle)
                    || t.category.to_lowercase().contains(&needle)
                    || t
                        .notes
                        .as_deref()
                        .is_some_and(|n| n.to_lowercase().contains(&needle))
            })
            .collect()
    }

    /// Reads the persisted snapshot. A missing or unreadable snapshot yields an
    /// empty ledger; corruption is logged, never returned.
    pub fn load<S: KeyValueStore>(store: &S) -> Self {
        match Self::try_load(store) {
            Ok(ledger) => ledger,
            Err(e) => {
                warn!("{}; starting with an empty ledger", e);
                Self::new()
            }
        }
    }

    pub fn try_load<S: KeyValueStore>(store: &S) -> Result<Self> {
        let Some(raw) = store.get(LEDGER_KEY)? else {
            return Ok(Self::new());
        };

        let transactions: Vec<Transaction> = serde_json::from_str(&raw)
            .map_err(|e| StatementError::PersistenceCorruption(e.to_string()))?;
        info!("Loaded {} transactions from storage", transactions.len());
        Ok(Self::from_transactions(transactions))
    }

    /// Writes the full ledger snapshot. An empty ledger is never written, so a
    /// transient empty state cannot wipe saved data; use [`LedgerStore::clear`].
    pub fn save<S: KeyValueStore>(&self, store: &mut S) -> Result<bool> {
        if self.transactions.is_empty() {
            debug!("Skipping save of empty ledger");
            return Ok(false);
        }
        let snapshot = serde_json::to_string(&self.transactions)?;
        store.set(LEDGER_KEY, &snapshot)?;
        Ok(true)
    }

    fn resort(&mut self) {
        sort_by_date(
            &mut self.transactions,
            Transaction::parsed_date,
            SortOrder::Descending,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn draft(date: &str, description: &str, amount: f64) -> TransactionDraft {
        TransactionDraft {
            date: date.to_string(),
            description: description.to_string(),
            amount,
            category: "Food".to_string(),
            notes: None,
            is_subscription: false,
        }
    }

    fn tx(id: &str, date: &str, amount: f64) -> Transaction {
        Transaction::from_draft(id.to_string(), draft(date, id, amount))
    }

    fn ids(ledger: &LedgerStore) -> Vec<&str> {
        ledger.transactions().iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn test_merge_sorts_newest_first() {
        let mut ledger = LedgerStore::from_transactions(vec![tx("b", "2024-02-01", -1.0)]);
        ledger.merge(vec![tx("a", "2024-01-01", -1.0), tx("c", "2024-03-01", 2.0)]);
        assert_eq!(ids(&ledger), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_merge_reassigns_colliding_ids() {
        let mut ledger = LedgerStore::from_transactions(vec![tx("same", "2024-02-01", -1.0)]);
        ledger.merge(vec![tx("same", "2024-01-01", -2.0)]);
        assert_eq!(ledger.len(), 2);
        assert_ne!(ledger.transactions()[0].id, ledger.transactions()[1].id);
    }

    #[test]
    fn test_add_assigns_unique_id() {
        let mut ledger = LedgerStore::new();
        let mut seen = std::collections::HashSet::new();
        for day in 1..=20 {
            let id = ledger.add(draft(&format!("2024-01-{:02}", day), "Lunch", -10.0));
            assert!(seen.insert(id));
        }
        assert_eq!(ledger.len(), 20);
        assert_eq!(ledger.transactions()[0].date, "2024-01-20");
    }

    #[test]
    fn test_remove_keeps_other_entries_in_order() {
        let mut ledger = LedgerStore::from_transactions(vec![
            tx("a", "2024-01-03", -1.0),
            tx("b", "2024-01-02", -1.0),
            tx("c", "2024-01-01", -1.0),
        ]);
        let removed = ledger.remove("b").unwrap();
        assert_eq!(removed.id, "b");
        assert_eq!(ids(&ledger), vec!["a", "c"]);
        assert!(ledger.remove("missing").is_none());
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_save_load_round_trip() {
        let mut store = MemoryStore::new();
        let ledger = LedgerStore::from_transactions(vec![
            tx("a", "2024-01-03", -1.5),
            tx("b", "2024-01-02", 100.0),
        ]);
        assert!(ledger.save(&mut store).unwrap());

        let loaded = LedgerStore::load(&store);
        assert_eq!(loaded, ledger);
    }

    #[test]
    fn test_empty_save_does_not_overwrite_snapshot() {
        let mut store = MemoryStore::new();
        LedgerStore::from_transactions(vec![tx("a", "2024-01-03", -1.5)])
            .save(&mut store)
            .unwrap();

        let empty = LedgerStore::new();
        assert!(!empty.save(&mut store).unwrap());
        assert_eq!(LedgerStore::load(&store).len(), 1);
    }

    #[test]
    fn test_clear_drops_snapshot() {
        let mut store = MemoryStore::new();
        let mut ledger = LedgerStore::from_transactions(vec![tx("a", "2024-01-03", -1.5)]);
        ledger.save(&mut store).unwrap();
        ledger.clear(&mut store).unwrap();
        assert!(ledger.is_empty());
        assert_eq!(store.get(LEDGER_KEY).unwrap(), None);
    }

    #[test]
    fn test_corrupt_snapshot_falls_back_to_empty() {
        let mut store = MemoryStore::new();
        store.set(LEDGER_KEY, "{not json").unwrap();
        assert!(matches!(
            LedgerStore::try_load(&store),
            Err(StatementError::PersistenceCorruption(_))
        ));
        assert!(LedgerStore::load(&store).is_empty());
    }

    #[test]
    fn test_search() {
        let mut ledger = LedgerStore::new();
        ledger.add(draft("2024-01-01", "Netflix", -15.0));
        let mut salary = draft("2024-01-02", "ACME Payroll", 3000.0);
        salary.category = "Salary".to_string();
        salary.notes = Some("monthly".to_string());
        ledger.add(salary);

        assert_eq!(ledger.search("netflix").len(), 1);
        assert_eq!(ledger.search("SALARY").len(), 1);
        assert_eq!(ledger.search("month").len(), 1);
        assert_eq!(ledger.search("").len(), 2);
        assert!(ledger.search("rent").is_empty());
    }
}
