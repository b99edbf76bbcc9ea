//! Test fixtures and factory functions for creating test data.

use serde_json::{json, Value};
use uuid::Uuid;

/// A topic id no other test run will use.
pub fn unique_topic_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4().simple())
}

/// A user id no other test run will use.
pub fn unique_uid(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4().simple())
}

/// Lesson JSON with the given id.
pub fn lesson(lesson_id: &str) -> Value {
    json!({
        "lessonId": lesson_id,
        "title": format!("Lesson {lesson_id}"),
        "content": "Use the present simple for habits.",
        "examples": ["I walk to work.", "She reads every night."]
    })
}

/// Topic payload with `num_lessons` lessons named `l1..ln`.
pub fn topic_payload(topic_id: &str, num_lessons: usize) -> Value {
    let lessons: Vec<Value> = (1..=num_lessons).map(|i| lesson(&format!("l{i}"))).collect();
    json!({
        "topicId": topic_id,
        "title": "Present Simple",
        "icon": "📘",
        "lessons": lessons,
        "order": 1,
        "isLocked": false
    })
}

pub fn completion(topic_id: &str, lesson_id: &str, score: f64) -> Value {
    json!({
        "topicId": topic_id,
        "lessonId": lesson_id,
        "score": score
    })
}

/// Find a topic entry in a progress report by topic id.
pub fn topic_entry<'a>(report: &'a Value, topic_id: &str) -> &'a Value {
    report["topics"]
        .as_array()
        .expect("report has topics")
        .iter()
        .find(|t| t["topicId"] == topic_id)
        .expect("topic present in report")
}
