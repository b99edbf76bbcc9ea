//! Completion statistics over the topic → lesson hierarchy.
//!
//! Two entry points exist and stay separate:
//! - [`compute_user_progress`] counts lessons completed by one user.
//! - [`compute_catalog_progress`] counts lessons completed by anyone.
//!
//! Both are pure reductions over the catalog; completions that do not refer
//! to a lesson in the catalog are ignored.

use serde::{Deserialize, Serialize};

use crate::types::{CompletionSet, Topic};

/// Per-topic progress for a single user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicProgress {
    pub topic_id: String,
    pub title: String,
    pub icon: String,
    pub total_lessons: usize,
    pub completed_lessons: usize,
    pub progress_percentage: u32,
    pub completed: bool,
}

/// Progress of a single user across the whole catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgressReport {
    pub user_id: String,
    pub total_topics: usize,
    pub total_lessons: usize,
    pub completed_topics: usize,
    pub completed_lessons: usize,
    pub progress_percentage: u32,
    pub topics: Vec<TopicProgress>,
}

/// Per-topic catalog-wide progress.
///
/// `completedLessons` counts lessons completed by at least one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogTopicProgress {
    pub topic_id: String,
    pub title: String,
    pub icon: String,
    pub total_lessons: usize,
    pub completed_lessons: usize,
    pub progress_percentage: u32,
}

/// Catalog-wide progress snapshot, not scoped to any user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogProgressReport {
    pub total_topics: usize,
    pub total_lessons: usize,
    pub completed_topics: usize,
    pub completed_lessons: usize,
    pub progress_percentage: u32,
    pub topics: Vec<CatalogTopicProgress>,
}

/// `round(100 * done / total)`, or 0 when `total` is 0.
///
/// Rounds half away from zero. `done` is clamped to `total`.
pub fn percentage(done: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    let done = done.min(total);
    (done as f64 * 100.0 / total as f64).round() as u32
}

#[derive(Debug, Default)]
struct Tally {
    total_topics: usize,
    total_lessons: usize,
    completed_topics: usize,
    completed_lessons: usize,
}

impl Tally {
    fn add(&mut self, total: usize, completed: usize) {
        self.total_topics += 1;
        self.total_lessons += total;
        self.completed_lessons += completed;
        if topic_completed(total, completed) {
            self.completed_topics += 1;
        }
    }

    fn percentage(&self) -> u32 {
        percentage(self.completed_lessons, self.total_lessons)
    }
}

fn topic_completed(total: usize, completed: usize) -> bool {
    total > 0 && completed == total
}

fn completed_in(topic: &Topic, completions: &CompletionSet) -> usize {
    topic
        .lessons
        .iter()
        .filter(|lesson| completions.contains(&topic.topic_id, &lesson.lesson_id))
        .count()
}

/// Compute a user's progress from the catalog and that user's completions.
pub fn compute_user_progress(
    user_id: &str,
    catalog: &[Topic],
    completions: &CompletionSet,
) -> UserProgressReport {
    let mut tally = Tally::default();

    let topics = catalog
        .iter()
        .map(|topic| {
            let total = topic.total_lessons();
            let completed = completed_in(topic, completions);
            tally.add(total, completed);

            TopicProgress {
                topic_id: topic.topic_id.clone(),
                title: topic.title.clone(),
                icon: topic.icon.clone(),
                total_lessons: total,
                completed_lessons: completed,
                progress_percentage: percentage(completed, total),
                completed: topic_completed(total, completed),
            }
        })
        .collect();

    UserProgressReport {
        user_id: user_id.to_string(),
        total_topics: tally.total_topics,
        total_lessons: tally.total_lessons,
        completed_topics: tally.completed_topics,
        completed_lessons: tally.completed_lessons,
        progress_percentage: tally.percentage(),
        topics,
    }
}

/// Compute the catalog-wide snapshot from the union of all users' completions.
pub fn compute_catalog_progress(
    catalog: &[Topic],
    completed_by_anyone: &CompletionSet,
) -> CatalogProgressReport {
    let mut tally = Tally::default();

    let topics = catalog
        .iter()
        .map(|topic| {
            let total = topic.total_lessons();
            let completed = completed_in(topic, completed_by_anyone);
            tally.add(total, completed);

            CatalogTopicProgress {
                topic_id: topic.topic_id.clone(),
                title: topic.title.clone(),
                icon: topic.icon.clone(),
                total_lessons: total,
                completed_lessons: completed,
                progress_percentage: percentage(completed, total),
            }
        })
        .collect();

    CatalogProgressReport {
        total_topics: tally.total_topics,
        total_lessons: tally.total_lessons,
        completed_topics: tally.completed_topics,
        completed_lessons: tally.completed_lessons,
        progress_percentage: tally.percentage(),
        topics,
    }
}
