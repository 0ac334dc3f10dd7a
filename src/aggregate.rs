//! Turns stored responses into chartable tallies. Everything here is a
//! pure pass over the full response snapshot; malformed or missing
//! answers are skipped rather than surfaced.

use serde::Serialize;

use crate::catalog::{QuestionKind, SurveyCategory, SurveyQuestion};
use crate::store::{Answer, ResponseRecord};

/// How many entries the ranked "top skills" / "pain points" charts show.
const TOP_CHART_LIMIT: usize = 5;

/// Frequency counts keyed by answer value. Entries keep the order in
/// which each value was first seen, so consumers that re-sort get stable
/// tie-breaking for free.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Counts {
    entries: Vec<(String, u64)>,
}

impl Counts {
    pub fn increment(&mut self, value: &str) {
        match self.entries.iter_mut().find(|(name, _)| name == value) {
            Some((_, count)) => *count += 1,
            None => self.entries.push((value.to_string(), 1)),
        }
    }

    pub fn get(&self, value: &str) -> u64 {
        self.entries
            .iter()
            .find(|(name, _)| name == value)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(name, count)| (name.as_str(), *count))
    }
}

/// One bar or pie slice: an answer value and how often it was chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerTally {
    pub name: String,
    pub count: u64,
}

/// Counts single-string answers for a question. Records missing the key
/// or holding a list are skipped.
pub fn count_single_answers(records: &[ResponseRecord], question_text: &str) -> Counts {
    let mut counts = Counts::default();
    for record in records {
        if let Some(Answer::Single(value)) = record.answers.get(question_text) {
            counts.increment(value);
        }
    }
    counts
}

/// Counts every element of list answers for a question. Records where
/// the answer is a single string or absent are skipped.
pub fn count_multi_answers(records: &[ResponseRecord], question_text: &str) -> Counts {
    let mut counts = Counts::default();
    for record in records {
        if let Some(Answer::Multi(values)) = record.answers.get(question_text) {
            for value in values {
                counts.increment(value);
            }
        }
    }
    counts
}

/// Counts both answer shapes in one pass, for views that do not care
/// which kind the question is.
pub fn count_answers(records: &[ResponseRecord], question_text: &str) -> Counts {
    let mut counts = Counts::default();
    for record in records {
        match record.answers.get(question_text) {
            Some(Answer::Single(value)) => counts.increment(value),
            Some(Answer::Multi(values)) => {
                for value in values {
                    counts.increment(value);
                }
            }
            None => {}
        }
    }
    counts
}

/// Ranks counts descending and keeps the first `n`. The sort is stable,
/// so ties stay in first-seen order.
pub fn top_n(counts: &Counts, n: usize) -> Vec<AnswerTally> {
    let mut ranked = counts
        .iter()
        .map(|(name, count)| AnswerTally {
            name: name.to_string(),
            count,
        })
        .collect::<Vec<AnswerTally>>();
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(n);
    ranked
}

/// Share of the total as a whole percent, for display labels. An empty
/// tally yields 0 rather than dividing by zero.
pub fn percentage_of(value: u64, counts: &Counts) -> u32 {
    if counts.is_empty() {
        return 0;
    }
    ((value as f64 / counts.total() as f64) * 100.0).round() as u32
}

/// Tallies aligned to the question's declared option order, zero-filled
/// for options nobody picked. Drives per-option charts.
pub fn option_tallies(records: &[ResponseRecord], question: &SurveyQuestion) -> Vec<AnswerTally> {
    let counts = match question.kind {
        QuestionKind::Rating => count_single_answers(records, &question.text),
        QuestionKind::MultiSelect => count_multi_answers(records, &question.text),
    };
    question
        .options
        .iter()
        .map(|option| AnswerTally {
            name: option.clone(),
            count: counts.get(option),
        })
        .collect()
}

/// One tally entry enriched with its share of the question's total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TallyShare {
    pub name: String,
    pub count: u64,
    pub percent: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSummary {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub answered: u64,
    /// Observed answer values in first-seen order, with shares.
    pub tallies: Vec<TallyShare>,
    /// Counts aligned to the declared option order, zero-filled.
    pub options: Vec<AnswerTally>,
    pub top: Vec<AnswerTally>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub category: String,
    pub questions: Vec<QuestionSummary>,
}

/// Everything the dashboard views need in one payload: headline numbers
/// plus per-question tallies for the whole catalog.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveySummary {
    pub total_responses: usize,
    pub newest: Option<String>,
    pub oldest: Option<String>,
    pub categories: Vec<CategorySummary>,
}

fn summarize_question(records: &[ResponseRecord], question: &SurveyQuestion) -> QuestionSummary {
    let counts = match question.kind {
        QuestionKind::Rating => count_single_answers(records, &question.text),
        QuestionKind::MultiSelect => count_multi_answers(records, &question.text),
    };
    let tallies = counts
        .iter()
        .map(|(name, count)| TallyShare {
            name: name.to_string(),
            count,
            percent: percentage_of(count, &counts),
        })
        .collect();
    QuestionSummary {
        text: question.text.clone(),
        kind: question.kind,
        answered: counts.total(),
        tallies,
        options: option_tallies(records, question),
        top: top_n(&counts, TOP_CHART_LIMIT),
    }
}

/// Tallies for one question by its text key. Questions known to the
/// catalog are counted by their declared kind; unknown texts fall back
/// to counting both answer shapes.
pub fn tallies_for_question(
    records: &[ResponseRecord],
    catalog: &[SurveyCategory],
    question_text: &str,
) -> Counts {
    match crate::catalog::find_question(catalog, question_text) {
        Some(question) => match question.kind {
            QuestionKind::Rating => count_single_answers(records, question_text),
            QuestionKind::MultiSelect => count_multi_answers(records, question_text),
        },
        None => count_answers(records, question_text),
    }
}

pub fn summarize(records: &[ResponseRecord], catalog: &[SurveyCategory]) -> SurveySummary {
    let newest = records.iter().map(|r| r.created_at.clone()).max();
    let oldest = records.iter().map(|r| r.created_at.clone()).min();
    let categories = catalog
        .iter()
        .map(|cat| CategorySummary {
            category: cat.category.clone(),
            questions: cat
                .questions
                .iter()
                .map(|q| summarize_question(records, q))
                .collect(),
        })
        .collect();
    SurveySummary {
        total_responses: records.len(),
        newest,
        oldest,
        categories,
    }
}
