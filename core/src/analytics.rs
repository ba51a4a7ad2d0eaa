//! Complaint analytics: aggregate views over the actor's read scope.
//!
//! All maps are BTreeMaps so output is stable across runs.

use crate::complaint::Complaint;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicStats {
    pub total_complaints: u64,
    pub by_category: BTreeMap<String, u64>,
    pub by_urgency: BTreeMap<String, u64>,
    pub by_status: BTreeMap<String, u64>,
    /// Percentage of complaints with a staff response.
    pub response_rate: f64,
    /// Percentage assigned to a real support actor (placeholder excluded).
    pub assigned_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossTab {
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    /// data[row][column]
    pub data: Vec<Vec<u64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRelationships {
    pub category_urgency: CrossTab,
    pub category_status: CrossTab,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthBucket {
    /// "YYYY-MM"
    pub month: String,
    pub counts: BTreeMap<String, u64>,
}

/// Parallel arrays: `counts[i]` complaints were filed on `dates[i]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyCounts {
    /// "YYYY-MM-DD", ascending.
    pub dates: Vec<String>,
    pub counts: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeTrends {
    pub daily_counts: DailyCounts,
    pub monthly_by_category: Vec<MonthBucket>,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCount {
    pub word: String,
    pub count: u64,
}

const STOPWORDS: &[&str] = &[
    "the", "and", "to", "of", "is", "in", "it", "that", "was", "for", "on", "are", "with", "as",
    "this", "be", "have", "am", "at", "by", "not", "but", "or", "from", "my", "an", "so", "we",
    "can",
];

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn tally<'a>(labels: impl Iterator<Item = &'a str>) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for label in labels {
        *counts.entry(label.to_string()).or_insert(0) += 1;
    }
    counts
}

pub fn basic_stats(rows: &[Complaint], unassigned_identity: &str) -> BasicStats {
    let responded = rows.iter().filter(|c| c.response.is_some()).count();
    let assigned = rows
        .iter()
        .filter(|c| c.assigned_to.as_deref().is_some_and(|a| a != unassigned_identity))
        .count();

    BasicStats {
        total_complaints: rows.len() as u64,
        by_category: tally(rows.iter().map(|c| c.category.as_str())),
        by_urgency: tally(rows.iter().map(|c| c.urgency.as_str())),
        by_status: tally(rows.iter().map(|c| c.status.as_str())),
        response_rate: percent(responded, rows.len()),
        assigned_rate: percent(assigned, rows.len()),
    }
}

fn cross_tab<'a>(pairs: impl Iterator<Item = (&'a str, &'a str)> + Clone) -> CrossTab {
    let rows: Vec<String> = pairs
        .clone()
        .map(|(r, _)| r.to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let columns: Vec<String> = pairs
        .clone()
        .map(|(_, c)| c.to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut data = vec![vec![0u64; columns.len()]; rows.len()];
    for (r, c) in pairs {
        // Both labels were collected from this same iterator.
        if let (Ok(ri), Ok(ci)) = (
            rows.binary_search_by(|x| x.as_str().cmp(r)),
            columns.binary_search_by(|x| x.as_str().cmp(c)),
        ) {
            data[ri][ci] += 1;
        }
    }
    CrossTab { rows, columns, data }
}

pub fn category_relationships(rows: &[Complaint]) -> CategoryRelationships {
    CategoryRelationships {
        category_urgency: cross_tab(rows.iter().map(|c| (c.category.as_str(), c.urgency.as_str()))),
        category_status: cross_tab(rows.iter().map(|c| (c.category.as_str(), c.status.as_str()))),
    }
}

/// Monthly counts per category, months ascending. Every bucket lists every
/// category seen in the scope, with zeros where needed.
pub fn time_trends(rows: &[Complaint]) -> TimeTrends {
    let categories: Vec<String> = rows
        .iter()
        .map(|c| c.category.as_str().to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut days: BTreeMap<String, u64> = BTreeMap::new();
    let mut months: BTreeMap<String, BTreeMap<String, u64>> = BTreeMap::new();
    for c in rows {
        *days.entry(c.created_at.format("%Y-%m-%d").to_string()).or_insert(0) += 1;
        let month = c.created_at.format("%Y-%m").to_string();
        let bucket = months
            .entry(month)
            .or_insert_with(|| categories.iter().map(|k| (k.clone(), 0)).collect());
        *bucket.entry(c.category.as_str().to_string()).or_insert(0) += 1;
    }

    let (dates, counts): (Vec<String>, Vec<u64>) = days.into_iter().unzip();
    TimeTrends {
        daily_counts: DailyCounts { dates, counts },
        monthly_by_category: months
            .into_iter()
            .map(|(month, counts)| MonthBucket { month, counts })
            .collect(),
        categories,
    }
}

/// Top `limit` words over all texts, most frequent first, ties broken
/// alphabetically. Text is lowercased and stripped of punctuation; words
/// of two characters or fewer and stopwords are skipped.
pub fn word_frequency(rows: &[Complaint], limit: usize) -> Vec<WordCount> {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for c in rows {
        let cleaned: String = c
            .text
            .to_lowercase()
            .chars()
            .filter(|ch| ch.is_alphanumeric() || *ch == '_' || ch.is_whitespace())
            .collect();
        for word in cleaned.split_whitespace() {
            if word.chars().count() <= 2 || STOPWORDS.contains(&word) {
                continue;
            }
            *counts.entry(word.to_string()).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<WordCount> = counts
        .into_iter()
        .map(|(word, count)| WordCount { word, count })
        .collect();
    // Stable sort keeps the alphabetical order of the BTreeMap within a count.
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(limit);
    ranked
}
