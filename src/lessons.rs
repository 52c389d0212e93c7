//! Lesson collection, course grouping and per-lesson word statistics.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::char_categories::contains_cjk;
use crate::error::LessonError;
use crate::status::Status;
use crate::storage::{load_json_or_default, save_json, StorageBackend, StorageContext, ARTICLES_KEY};
use crate::tokenizer::Tokenizer;
use crate::vocabulary::VocabularyStore;

pub const DEFAULT_IMAGE: &str = "https://pub-8d9c7b440bdc4316a94cd1a6ec45d0ce.r2.dev/lingq.png";
pub const DEFAULT_LANGUAGE: &str = "English";
pub const DEFAULT_LEVEL: &str = "Beginner";

/// A stored reading text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: i64,
    pub title: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_level")]
    pub level: String,
    pub content: String,
    #[serde(default = "default_image")]
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_title: Option<String>,
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_level() -> String {
    DEFAULT_LEVEL.to_string()
}

fn default_image() -> String {
    DEFAULT_IMAGE.to_string()
}

impl Lesson {
    /// Course this lesson belongs to; standalone lessons form their own
    pub fn course_key(&self) -> String {
        match &self.course_id {
            Some(id) if !id.is_empty() => id.clone(),
            _ => format!("article-{}", self.id),
        }
    }
}

/// Fields supplied when creating a lesson
#[derive(Debug, Clone, Default)]
pub struct NewLesson {
    pub title: String,
    pub content: String,
    pub language: Option<String>,
    pub level: Option<String>,
    pub image: Option<String>,
    pub course_id: Option<String>,
    pub course_title: Option<String>,
}

impl NewLesson {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        NewLesson {
            title: title.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn course(mut self, id: impl Into<String>, title: impl Into<String>) -> Self {
        self.course_id = Some(id.into());
        self.course_title = Some(title.into());
        self
    }
}

/// Lessons grouped under one course, in list order
#[derive(Debug)]
pub struct Course<'a> {
    pub id: String,
    pub title: String,
    pub lessons: Vec<&'a Lesson>,
}

/// Ordered lesson list, newest first
pub struct LessonStore {
    backend: Arc<dyn StorageBackend>,
    lessons: Vec<Lesson>,
}

impl LessonStore {
    pub fn load(storage: &StorageContext) -> Self {
        let backend = Arc::clone(&storage.local);
        let lessons = load_json_or_default(backend.as_ref(), ARTICLES_KEY);
        LessonStore { backend, lessons }
    }

    pub fn reload(&mut self) {
        self.lessons = load_json_or_default(self.backend.as_ref(), ARTICLES_KEY);
    }

    /// Validate and prepend a new lesson, returning it
    pub fn add(&mut self, new: NewLesson) -> Result<&Lesson, LessonError> {
        let title = new.title.trim();
        if title.is_empty() {
            return Err(LessonError::Validation("title"));
        }
        if new.content.trim().is_empty() {
            return Err(LessonError::Validation("content"));
        }

        let lesson = Lesson {
            id: self.next_id(),
            title: title.to_string(),
            language: non_blank(new.language).unwrap_or_else(default_language),
            level: non_blank(new.level).unwrap_or_else(default_level),
            content: new.content,
            image: non_blank(new.image).unwrap_or_else(default_image),
            course_id: non_blank(new.course_id),
            course_title: non_blank(new.course_title),
        };
        info!(id = lesson.id, title = %lesson.title, "adding lesson");
        if contains_cjk(&lesson.content) {
            warn!(id = lesson.id, "lesson contains CJK text, which cannot be tagged word by word");
        }

        self.lessons.insert(0, lesson);
        if let Err(e) = self.flush() {
            self.lessons.remove(0);
            return Err(e.into());
        }
        Ok(&self.lessons[0])
    }

    pub fn get(&self, id: i64) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.id == id)
    }

    pub fn delete(&mut self, id: i64) -> Result<Lesson, LessonError> {
        let pos = self
            .lessons
            .iter()
            .position(|l| l.id == id)
            .ok_or(LessonError::NotFound(id))?;
        let removed = self.lessons.remove(pos);
        if let Err(e) = self.flush() {
            self.lessons.insert(pos, removed);
            return Err(e.into());
        }
        Ok(removed)
    }

    pub fn list(&self) -> &[Lesson] {
        &self.lessons
    }

    pub fn len(&self) -> usize {
        self.lessons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }

    /// Group lessons by course, courses in order of first appearance
    pub fn courses(&self) -> Vec<Course<'_>> {
        let mut courses: Vec<Course<'_>> = Vec::new();
        for lesson in &self.lessons {
            let key = lesson.course_key();
            match courses.iter_mut().find(|c| c.id == key) {
                Some(course) => course.lessons.push(lesson),
                None => courses.push(Course {
                    title: lesson.course_title.clone().unwrap_or_else(|| lesson.title.clone()),
                    id: key,
                    lessons: vec![lesson],
                }),
            }
        }
        courses
    }

    /// Millisecond timestamp, bumped past any existing id
    fn next_id(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let max_existing = self.lessons.iter().map(|l| l.id).max().unwrap_or(i64::MIN);
        if now > max_existing {
            now
        } else {
            max_existing + 1
        }
    }

    fn flush(&self) -> Result<(), crate::error::StorageError> {
        save_json(self.backend.as_ref(), ARTICLES_KEY, &self.lessons)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Word counts of a lesson against the vocabulary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LessonStats {
    /// Distinct words
    pub total: usize,
    /// Status 0
    pub new_words: usize,
    /// Status 2-4
    pub lingqs: usize,
    /// Status 5
    pub known: usize,
    /// Status 1
    pub unknown: usize,
    pub new_percent: u8,
}

pub fn lesson_stats(lesson: &Lesson, vocab: &VocabularyStore) -> LessonStats {
    let words = Tokenizer::unique_words(&lesson.content);
    let mut stats = LessonStats {
        total: words.len(),
        ..Default::default()
    };
    for word in &words {
        match vocab.get_status(word) {
            Status::New => stats.new_words += 1,
            Status::Hard => stats.unknown += 1,
            Status::Known => stats.known += 1,
            Status::Learning | Status::Familiar | Status::AlmostKnown => stats.lingqs += 1,
        }
    }
    if stats.total > 0 {
        stats.new_percent = (stats.new_words as f64 / stats.total as f64 * 100.0).round() as u8;
    }
    stats
}
