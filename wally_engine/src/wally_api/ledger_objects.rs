use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use wally_common::Kobo;

use crate::db_types::{Category, LedgerEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpendingPeriod {
    Weekly,
    Monthly,
}

impl SpendingPeriod {
    pub fn duration(&self) -> Duration {
        match self {
            SpendingPeriod::Weekly => Duration::days(7),
            SpendingPeriod::Monthly => Duration::days(30),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySpend {
    pub category: Category,
    pub amount: Kobo,
    pub count: i64,
}

/// Where a user's money went over a trailing window. Only successful debits count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendingSummary {
    pub period: SpendingPeriod,
    pub since: DateTime<Utc>,
    pub until: DateTime<Utc>,
    pub total: Kobo,
    pub count: i64,
    /// Largest category first.
    pub categories: Vec<CategorySpend>,
}

impl SpendingSummary {
    pub fn from_debits(period: SpendingPeriod, now: DateTime<Utc>, debits: &[LedgerEntry]) -> Self {
        let since = now - period.duration();
        let mut by_category: HashMap<Category, CategorySpend> = HashMap::new();
        for entry in debits.iter().filter(|e| e.created_at >= since && e.created_at <= now) {
            let spend = by_category.entry(entry.category).or_insert(CategorySpend {
                category: entry.category,
                amount: Kobo::default(),
                count: 0,
            });
            spend.amount += entry.amount;
            spend.count += 1;
        }
        let mut categories = by_category.into_values().collect::<Vec<_>>();
        categories.sort_by(|a, b| {
            b.amount.cmp(&a.amount).then_with(|| a.category.to_string().cmp(&b.category.to_string()))
        });
        let total = categories.iter().map(|c| c.amount).sum();
        let count = categories.iter().map(|c| c.count).sum();
        Self { period, since, until: now, total, count, categories }
    }
}
