use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("a question needs at least two options, got {0}")]
    TooFewOptions(usize),

    #[error("question option cannot be empty")]
    EmptyOption,

    #[error("duplicate option: {0}")]
    DuplicateOption(String),

    #[error("correct answer {0:?} is not one of the options")]
    CorrectNotAnOption(String),

    #[error("image reference cannot be empty")]
    EmptyImageRef,
}

//
// ─── IMAGE REFERENCE ───────────────────────────────────────────────────────────
//

/// Opaque reference to a question illustration.
///
/// The engine never loads the image; it only carries the reference through
/// to whatever renders the question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    FilePath(PathBuf),
    Url(Url),
}

impl ImageRef {
    /// Builds a reference to an image shipped with the level assets.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyImageRef` for an empty path.
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, QuestionError> {
        let p = path.into();
        if p.as_os_str().is_empty() {
            return Err(QuestionError::EmptyImageRef);
        }
        Ok(ImageRef::FilePath(p))
    }

    /// Builds a reference to a remotely hosted image.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyImageRef` if the string is empty or not
    /// a parseable URL.
    pub fn from_url(url: impl AsRef<str>) -> Result<Self, QuestionError> {
        let s = url.as_ref().trim();
        if s.is_empty() {
            return Err(QuestionError::EmptyImageRef);
        }
        let u = Url::parse(s).map_err(|_| QuestionError::EmptyImageRef)?;
        Ok(ImageRef::Url(u))
    }

    #[must_use]
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            ImageRef::FilePath(p) => Some(p.as_path()),
            ImageRef::Url(_) => None,
        }
    }

    #[must_use]
    pub fn as_url(&self) -> Option<&Url> {
        match self {
            ImageRef::Url(u) => Some(u),
            ImageRef::FilePath(_) => None,
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// One multiple-choice question. Immutable once built.
///
/// Invariants enforced at construction (the data-entry boundary):
/// - the prompt is non-empty,
/// - at least two options, unique within the question,
/// - the correct answer is a member of the options set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    image: Option<ImageRef>,
    options: Vec<String>,
    correct_answer: String,
}

impl Question {
    /// Validates and builds a question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the prompt is empty, fewer than two
    /// options are given, options repeat, or the correct answer is not
    /// among the options.
    pub fn new(
        id: QuestionId,
        prompt: impl Into<String>,
        image: Option<ImageRef>,
        options: Vec<String>,
        correct_answer: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }

        if options.len() < 2 {
            return Err(QuestionError::TooFewOptions(options.len()));
        }

        let mut seen = HashSet::with_capacity(options.len());
        for option in &options {
            if option.trim().is_empty() {
                return Err(QuestionError::EmptyOption);
            }
            if !seen.insert(option.as_str()) {
                return Err(QuestionError::DuplicateOption(option.clone()));
            }
        }

        let correct_answer = correct_answer.into();
        if !options.iter().any(|o| *o == correct_answer) {
            return Err(QuestionError::CorrectNotAnOption(correct_answer));
        }

        Ok(Self {
            id,
            prompt,
            image,
            options,
            correct_answer,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn image(&self) -> Option<&ImageRef> {
        self.image.as_ref()
    }

    /// Options in presentation order.
    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    /// Exact, case-sensitive check of a candidate against the correct answer.
    #[must_use]
    pub fn is_correct(&self, candidate: &str) -> bool {
        self.correct_answer == candidate
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
