//! Local copies of stored records that are kept up to date by applying [Change]s.

use crate::{
    category::{Category, CategoryId},
    transaction::{Transaction, TransactionId},
};

use super::Change;

/// One user's transactions, newest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionSnapshot {
    transactions: Vec<Transaction>,
}

impl TransactionSnapshot {
    /// Wrap transactions already ordered newest first, e.g. from
    /// [get_user_transactions](crate::transaction::get_user_transactions).
    pub fn new(transactions: Vec<Transaction>) -> Self {
        Self { transactions }
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Apply a change to the snapshot.
    ///
    /// New transactions are prepended. An insert or update for an ID that is already
    /// present replaces that entry in place, and updates or deletes for unknown IDs
    /// are ignored.
    pub fn apply(&mut self, change: Change<Transaction, TransactionId>) {
        match change {
            Change::Inserted(transaction) => match self.position(transaction.id) {
                Some(index) => self.transactions[index] = transaction,
                None => self.transactions.insert(0, transaction),
            },
            Change::Updated(transaction) => {
                if let Some(index) = self.position(transaction.id) {
                    self.transactions[index] = transaction;
                }
            }
            Change::Deleted(id) => self.transactions.retain(|transaction| transaction.id != id),
        }
    }

    fn position(&self, id: TransactionId) -> Option<usize> {
        self.transactions
            .iter()
            .position(|transaction| transaction.id == id)
    }
}

/// All categories, sorted by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategorySnapshot {
    categories: Vec<Category>,
}

impl CategorySnapshot {
    pub fn new(mut categories: Vec<Category>) -> Self {
        sort_by_name(&mut categories);

        Self { categories }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Apply a change to the snapshot, keeping the categories sorted by name.
    pub fn apply(&mut self, change: Change<Category, CategoryId>) {
        match change {
            Change::Inserted(category) => match self.position(category.id) {
                Some(index) => self.categories[index] = category,
                None => self.categories.push(category),
            },
            Change::Updated(category) => {
                if let Some(index) = self.position(category.id) {
                    self.categories[index] = category;
                }
            }
            Change::Deleted(id) => {
                self.categories.retain(|category| category.id != id);
                return;
            }
        }

        sort_by_name(&mut self.categories);
    }

    fn position(&self, id: CategoryId) -> Option<usize> {
        self.categories.iter().position(|category| category.id == id)
    }
}

fn sort_by_name(categories: &mut [Category]) {
    categories.sort_by(|a, b| {
        a.name
            .as_ref()
            .cmp(b.name.as_ref())
            .then_with(|| a.id.cmp(&b.id))
    });
}
