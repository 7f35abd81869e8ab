//! Derived views over the ledger: summary cards, category breakdown,
//! time buckets and the clipboard export.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::schema::Transaction;

pub const CATEGORY_COLORS: [&str; 8] = [
    "#3b82f6", "#10b981", "#f59e0b", "#ef4444", "#8b5cf6", "#ec4899", "#6366f1", "#14b8a6",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TransactionSummary {
    pub count: usize,
    pub total_income: f64,
    /// Absolute value of all outflows.
    pub total_spending: f64,
}

impl TransactionSummary {
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        let total_income = transactions
            .iter()
            .filter(|t| t.is_income())
            .map(|t| t.amount)
            .sum();
        let total_spending = transactions
            .iter()
            .filter(|t| t.is_expense())
            .map(|t| t.amount)
            .sum::<f64>()
            .abs();

        Self {
            count: transactions.len(),
            total_income,
            total_spending,
        }
    }

    pub fn net(&self) -> f64 {
        self.total_income - self.total_spending
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySlice {
    pub name: String,
    /// Absolute spending in this category.
    pub value: f64,
    /// Share of total spending, 0-100.
    pub percentage: f64,
    /// Value relative to the largest category, 0-1. Drives bar widths.
    pub bar_ratio: f64,
    pub color: &'static str,
}

/// Groups expenses by category, largest first. Income is ignored. Colours are
/// assigned in order of first appearance so a category keeps its colour when
/// the ranking changes.
pub fn category_breakdown(transactions: &[Transaction]) -> Vec<CategorySlice> {
    let mut order: Vec<String> = Vec::new();
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    let mut total_expense = 0.0;

    for t in transactions.iter().filter(|t| t.is_expense()) {
        let amount = t.amount.abs();
        let category = t.category_or_default();
        if !totals.contains_key(category) {
            order.push(category.to_string());
        }
        *totals.entry(category.to_string()).or_insert(0.0) += amount;
        total_expense += amount;
    }

    let mut slices: Vec<CategorySlice> = order
        .into_iter()
        .enumerate()
        .map(|(idx, name)| {
            let value = totals.get(&name).copied().unwrap_or(0.0);
            CategorySlice {
                percentage: if total_expense > 0.0 {
                    value / total_expense * 100.0
                } else {
                    0.0
                },
                value,
                bar_ratio: 0.0,
                color: CATEGORY_COLORS[idx % CATEGORY_COLORS.len()],
                name,
            }
        })
        .collect();

    slices.sort_by(|a, b| b.value.total_cmp(&a.value));

    let max_value = slices.first().map(|s| s.value).unwrap_or(0.0);
    if max_value > 0.0 {
        for slice in &mut slices {
            slice.bar_ratio = slice.value / max_value;
        }
    }

    slices
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    Week,
    Month,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodTotal {
    /// `2024-W05` for weeks, `2024-02` for months.
    pub label: String,
    pub start: NaiveDate,
    pub income: f64,
    pub spending: f64,
    pub count: usize,
}

fn period_start(date: NaiveDate, period: Period) -> NaiveDate {
    match period {
        Period::Week => date
            .checked_sub_days(Days::new(date.weekday().num_days_from_monday() as u64))
            .unwrap_or(date),
        Period::Month => date.with_day(1).unwrap_or(date),
    }
}

fn period_label(start: NaiveDate, period: Period) -> String {
    match period {
        Period::Week => {
            let week = start.iso_week();
            format!("{}-W{:02}", week.year(), week.week())
        }
        Period::Month => start.format("%Y-%m").to_string(),
    }
}

/// Income and spending per week or month, oldest bucket first. Entries with an
/// unparsable date are left out.
pub fn spending_by_period(transactions: &[Transaction], period: Period) -> Vec<PeriodTotal> {
    let mut buckets: BTreeMap<NaiveDate, PeriodTotal> = BTreeMap::new();

    for t in transactions {
        let Some(date) = t.parsed_date() else {
            continue;
        };
        let start = period_start(date, period);
        let bucket = buckets.entry(start).or_insert_with(|| PeriodTotal {
            label: period_label(start, period),
            start,
            income: 0.0,
            spending: 0.0,
            count: 0,
        });

        if t.is_income() {
            bucket.income += t.amount;
        } else if t.is_expense() {
            bucket.spending += t.amount.abs();
        }
        bucket.count += 1;
    }

    buckets.into_values().collect()
}

pub fn subscriptions(transactions: &[Transaction]) -> Vec<&Transaction> {
    transactions
        .iter()
        .filter(|t| t.is_subscription && t.is_expense())
        .collect()
}

/// Tab-separated export with a header row, for pasting into spreadsheets.
pub fn to_tsv(transactions: &[Transaction]) -> String {
    fn clean(value: &str) -> String {
        value.replace(['\t', '\n', '\r'], " ")
    }

    let mut lines = vec![
        ["id", "date", "description", "amount", "category", "notes", "isSubscription"].join("\t"),
    ];
    for t in transactions {
        lines.push(
            [
                clean(&t.id),
                clean(&t.date),
                clean(&t.description),
                t.amount.to_string(),
                clean(&t.category),
                clean(t.notes.as_deref().unwrap_or("")),
                t.is_subscription.to_string(),
            ]
            .join("\t"),
        );
    }
    lines.join("\n")
}
