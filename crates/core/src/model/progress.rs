use serde::Serialize;

use crate::model::ids::TopicId;

//
// ─── TALLY ─────────────────────────────────────────────────────────────────────
//

/// Raw per-topic counts for one user, as produced by storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicTally {
    pub topic_id: TopicId,
    pub name: String,
    pub total_questions: u32,
    /// Questions of this topic the user has any answer for.
    pub answered: u32,
    /// Subset of `answered` whose stored answer is correct.
    pub correct: u32,
}

//
// ─── PROGRESS ──────────────────────────────────────────────────────────────────
//

/// Completion state of one topic for one user.
///
/// Correct/wrong counts exist only once every question has been attempted.
/// Serialized untagged, so a `Partial` entry has no count fields at all.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TopicProgress {
    Partial {
        #[serde(rename = "id")]
        topic_id: TopicId,
        name: String,
        total_questions: u32,
        completed: u32,
        percent: f64,
    },
    Complete {
        #[serde(rename = "id")]
        topic_id: TopicId,
        name: String,
        total_questions: u32,
        completed: u32,
        percent: f64,
        correct_count: u32,
        wrong_count: u32,
    },
}

impl TopicProgress {
    /// Derives progress from a tally.
    ///
    /// A topic without questions reports `0.0` percent and counts as complete
    /// with zero correct and zero wrong answers.
    #[must_use]
    pub fn from_tally(tally: TopicTally) -> Self {
        let TopicTally {
            topic_id,
            name,
            total_questions,
            answered,
            correct,
        } = tally;
        let percent = completion_percent(answered, total_questions);

        if answered == total_questions {
            Self::Complete {
                topic_id,
                name,
                total_questions,
                completed: answered,
                percent,
                correct_count: correct,
                wrong_count: answered.saturating_sub(correct),
            }
        } else {
            Self::Partial {
                topic_id,
                name,
                total_questions,
                completed: answered,
                percent,
            }
        }
    }

    #[must_use]
    pub fn topic_id(&self) -> TopicId {
        match self {
            Self::Partial { topic_id, .. } | Self::Complete { topic_id, .. } => *topic_id,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Partial { name, .. } | Self::Complete { name, .. } => name,
        }
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        match self {
            Self::Partial {
                total_questions, ..
            }
            | Self::Complete {
                total_questions, ..
            } => *total_questions,
        }
    }

    #[must_use]
    pub fn completed(&self) -> u32 {
        match self {
            Self::Partial { completed, .. } | Self::Complete { completed, .. } => *completed,
        }
    }

    #[must_use]
    pub fn percent(&self) -> f64 {
        match self {
            Self::Partial { percent, .. } | Self::Complete { percent, .. } => *percent,
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete { .. })
    }

    /// `(correct, wrong)` for a fully attempted topic.
    #[must_use]
    pub fn breakdown(&self) -> Option<(u32, u32)> {
        match self {
            Self::Complete {
                correct_count,
                wrong_count,
                ..
            } => Some((*correct_count, *wrong_count)),
            Self::Partial { .. } => None,
        }
    }
}

/// `completed * 100 / total`, rounded to two decimals; `0.0` when `total == 0`.
#[must_use]
pub fn completion_percent(completed: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = f64::from(completed) * 100.0 / f64::from(total);
    (raw * 100.0).round_ties_even() / 100.0
}

/// Progress for every topic, in storage order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressReport {
    pub progress: Vec<TopicProgress>,
}

impl ProgressReport {
    #[must_use]
    pub fn from_tallies(tallies: impl IntoIterator<Item = TopicTally>) -> Self {
        Self {
            progress: tallies.into_iter().map(TopicProgress::from_tally).collect(),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
