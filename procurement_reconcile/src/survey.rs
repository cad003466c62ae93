/*!
Supplier evaluation survey.

Evaluators score a supplier on a project, question by question, on a five
level scale (or `N/A`). The catalog of questions, their rubrics, the supplier
roster and the admin keys are plain data handed over by the caller.
*/

use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::error::Error;
use std::fmt::Display;

pub const NOT_APPLICABLE: &str = "N/A";

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Question {
    pub id: String,
    pub text: String,
    /// One description per score, lowest first.
    pub rubric: Vec<String>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Category {
    pub name: String,
    pub questions: Vec<Question>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SurveyCatalog {
    pub categories: Vec<Category>,
    pub suppliers: Vec<String>,
    pub options: Vec<String>,
    /// A name is an admin when it contains every fragment of one tuple.
    pub admin_keys: Vec<Vec<String>>,
    pub project_prefix: String,
}

impl SurveyCatalog {
    pub fn default_options() -> Vec<String> {
        ["1", "2", "3", "4", "5", NOT_APPLICABLE]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    pub fn question(&self, category: &str, question_id: &str) -> Option<&Question> {
        self.categories
            .iter()
            .find(|c| c.name == category)
            .and_then(|c| c.questions.iter().find(|q| q.id == question_id))
    }

    /// The rubric of a question, as (score, description) pairs.
    pub fn rubric(&self, category: &str, question_id: &str) -> Option<Vec<(u32, String)>> {
        let q = self.question(category, question_id)?;
        if q.rubric.is_empty() {
            return None;
        }
        Some(
            q.rubric
                .iter()
                .enumerate()
                .map(|(idx, s)| (idx as u32 + 1, s.clone()))
                .collect(),
        )
    }

    pub fn question_count(&self) -> usize {
        self.categories.iter().map(|c| c.questions.len()).sum()
    }
}

/// One answer of one evaluation.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VoteRecord {
    pub user_name: String,
    pub project: String,
    pub supplier: String,
    pub category: String,
    pub question_id: String,
    pub question_text: String,
    pub vote: String,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum SurveyError {
    MissingSelection,
    UnknownSupplier(String),
    UnknownQuestion { category: String, question_id: String },
    MissingAnswer { category: String, question_id: String },
    InvalidOption { question_id: String, vote: String },
    AlreadyEvaluated { supplier: String, project: String },
}

impl Error for SurveyError {}

impl Display for SurveyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SurveyError::MissingSelection => write!(f, "a project and a supplier must be selected"),
            SurveyError::UnknownSupplier(s) => write!(f, "supplier '{}' is not in the roster", s),
            SurveyError::UnknownQuestion {
                category,
                question_id,
            } => write!(f, "question {} does not exist in category {}", question_id, category),
            SurveyError::MissingAnswer {
                category,
                question_id,
            } => write!(f, "question {} of category {} was not answered", question_id, category),
            SurveyError::InvalidOption { question_id, vote } => {
                write!(f, "'{}' is not a valid answer for question {}", vote, question_id)
            }
            SurveyError::AlreadyEvaluated { supplier, project } => write!(
                f,
                "supplier '{}' was already evaluated for project '{}' by this user",
                supplier, project
            ),
        }
    }
}

/// Normalizes the name typed at login: trimmed and upper-cased.
pub fn login_name(raw: &str) -> Option<String> {
    let s = raw.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_uppercase())
    }
}

pub fn is_admin(name: &str, admin_keys: &[Vec<String>]) -> bool {
    let lower = name.to_lowercase();
    admin_keys.iter().any(|tuple| {
        !tuple.is_empty() && tuple.iter().all(|k| lower.contains(&k.to_lowercase()))
    })
}

/// An answer of an evaluation: (category, question id) -> option.
pub type Answers = HashMap<(String, String), String>;

/// All the recorded answers.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct VoteLedger {
    pub records: Vec<VoteRecord>,
}

impl VoteLedger {
    pub fn new(records: Vec<VoteRecord>) -> VoteLedger {
        VoteLedger { records }
    }

    pub fn has_evaluated(&self, user: &str, project: &str, supplier: &str) -> bool {
        self.records
            .iter()
            .any(|r| r.user_name == user && r.project == project && r.supplier == supplier)
    }

    /// Records a full evaluation: one record per question of the catalog.
    pub fn record_evaluation(
        &mut self,
        catalog: &SurveyCatalog,
        user: &str,
        project: &str,
        supplier: &str,
        answers: &Answers,
    ) -> Result<usize, SurveyError> {
        let project = project.trim();
        let supplier = supplier.trim();
        if project.is_empty() || supplier.is_empty() {
            return Err(SurveyError::MissingSelection);
        }
        if !catalog.suppliers.iter().any(|s| s == supplier) {
            return Err(SurveyError::UnknownSupplier(supplier.to_string()));
        }
        if self.has_evaluated(user, project, supplier) {
            return Err(SurveyError::AlreadyEvaluated {
                supplier: supplier.to_string(),
                project: project.to_string(),
            });
        }
        for (category, question_id) in answers.keys() {
            if catalog.question(category, question_id).is_none() {
                return Err(SurveyError::UnknownQuestion {
                    category: category.clone(),
                    question_id: question_id.clone(),
                });
            }
        }

        let mut new_records: Vec<VoteRecord> = Vec::with_capacity(catalog.question_count());
        for category in catalog.categories.iter() {
            for q in category.questions.iter() {
                let vote = answers
                    .get(&(category.name.clone(), q.id.clone()))
                    .ok_or_else(|| SurveyError::MissingAnswer {
                        category: category.name.clone(),
                        question_id: q.id.clone(),
                    })?;
                if !catalog.options.iter().any(|o| o == vote) {
                    return Err(SurveyError::InvalidOption {
                        question_id: q.id.clone(),
                        vote: vote.clone(),
                    });
                }
                new_records.push(VoteRecord {
                    user_name: user.to_string(),
                    project: project.to_string(),
                    supplier: supplier.to_string(),
                    category: category.name.clone(),
                    question_id: q.id.clone(),
                    question_text: q.text.clone(),
                    vote: vote.clone(),
                });
            }
        }
        let n = new_records.len();
        self.records.extend(new_records);
        info!(
            "record_evaluation: {} evaluated {} on {} ({} answers)",
            user, supplier, project, n
        );
        Ok(n)
    }

    /// Removes one evaluation. Returns the number of removed records.
    pub fn delete_evaluation(&mut self, user: &str, project: &str, supplier: &str) -> usize {
        let before = self.records.len();
        self.records
            .retain(|r| !(r.user_name == user && r.project == project && r.supplier == supplier));
        let removed = before - self.records.len();
        debug!(
            "delete_evaluation: {} records removed for {} / {} / {}",
            removed, user, project, supplier
        );
        removed
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// The (project, supplier) pairs a user evaluated.
    pub fn evaluations_of(&self, user: &str) -> BTreeSet<(String, String)> {
        self.records
            .iter()
            .filter(|r| r.user_name == user)
            .map(|r| (r.project.clone(), r.supplier.clone()))
            .collect()
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct CategoryAverage {
    pub supplier: String,
    pub category: String,
    pub mean: f64,
    pub votes: usize,
}

/// Mean score per supplier and category. `N/A` and non numeric answers are
/// ignored. With a project filter only that project's records count.
pub fn category_averages(records: &[VoteRecord], project: Option<&str>) -> Vec<CategoryAverage> {
    let mut sums: BTreeMap<(String, String), (f64, usize)> = BTreeMap::new();
    for r in records.iter() {
        if let Some(p) = project {
            if r.project != p {
                continue;
            }
        }
        if r.vote == NOT_APPLICABLE {
            continue;
        }
        let score = match r.vote.trim().parse::<f64>() {
            Ok(s) => s,
            Err(_) => continue,
        };
        let e = sums
            .entry((r.supplier.clone(), r.category.clone()))
            .or_insert((0.0, 0));
        e.0 += score;
        e.1 += 1;
    }
    sums.into_iter()
        .map(|((supplier, category), (total, votes))| CategoryAverage {
            supplier,
            category,
            mean: total / votes as f64,
            votes,
        })
        .collect()
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Supplier -> category -> mean, rounded to two decimals.
pub fn average_pivot(averages: &[CategoryAverage]) -> BTreeMap<String, BTreeMap<String, f64>> {
    let mut res: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
    for a in averages.iter() {
        res.entry(a.supplier.clone())
            .or_default()
            .insert(a.category.clone(), round2(a.mean));
    }
    res
}

/// Project -> suppliers evaluated on it.
pub fn projects_evaluated(records: &[VoteRecord]) -> BTreeMap<String, BTreeSet<String>> {
    let mut res: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for r in records.iter() {
        res.entry(r.project.clone())
            .or_default()
            .insert(r.supplier.clone());
    }
    res
}

/// User -> project -> suppliers.
pub fn participation(records: &[VoteRecord]) -> BTreeMap<String, BTreeMap<String, BTreeSet<String>>> {
    let mut res: BTreeMap<String, BTreeMap<String, BTreeSet<String>>> = BTreeMap::new();
    for r in records.iter() {
        res.entry(r.user_name.clone())
            .or_default()
            .entry(r.project.clone())
            .or_default()
            .insert(r.supplier.clone());
    }
    res
}

/// Builds the project choices offered to evaluators: `"<code> - <name>"`,
/// restricted to the codes starting with the prefix, sorted and unique.
pub fn project_choices(entries: &[(String, String)], prefix: &str) -> Vec<String> {
    let choices: BTreeSet<String> = entries
        .iter()
        .filter(|(code, name)| !code.trim().is_empty() && !name.trim().is_empty())
        .map(|(code, name)| format!("{} - {}", code, name))
        .filter(|s| s.trim().starts_with(prefix))
        .collect();
    choices.into_iter().collect()
}
