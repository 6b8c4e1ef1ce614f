use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// JEE subject taxonomy. Closed set: unknown strings are rejected at the
/// deserialization boundary rather than defaulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    Physics,
    Chemistry,
    Mathematics,
}

impl Subject {
    pub fn label(&self) -> &'static str {
        match self {
            Subject::Physics => "Physics",
            Subject::Chemistry => "Chemistry",
            Subject::Mathematics => "Mathematics",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    McqSingle,
    Numerical,
}

/// 3-parameter-logistic item parameters. Validated once at construction so
/// the numeric core can assume well-formed inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IrtParams {
    /// Discrimination, strictly positive.
    pub a: f64,
    /// Difficulty, on the same scale as theta.
    pub b: f64,
    /// Guessing floor. Published items stay within [0, 0.5].
    pub c: f64,
}

impl IrtParams {
    pub fn new(a: f64, b: f64, c: f64) -> Result<Self, EngineError> {
        let params = Self { a, b, c };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.a.is_finite() || self.a <= 0.0 {
            return Err(EngineError::validation(format!(
                "discrimination a must be finite and > 0, got {}",
                self.a
            )));
        }
        if !self.b.is_finite() {
            return Err(EngineError::validation(format!(
                "difficulty b must be finite, got {}",
                self.b
            )));
        }
        if !self.c.is_finite() || self.c < 0.0 || self.c >= 1.0 {
            return Err(EngineError::validation(format!(
                "guessing c must lie in [0, 1), got {}",
                self.c
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub option_id: String,
    pub text: String,
}

/// Canonical tagged answer key. One representation per question type; no
/// string-or-map dual shapes survive past ingress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CorrectAnswer {
    Option { option_id: String },
    Numerical { value: f64, tolerance: f64 },
}

/// Answer payload as normalized at the API boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SubmittedAnswer {
    Option { option_id: String },
    Numerical { value: f64 },
}

/// Taxonomy filter scoping a question pool. Empty filter means the whole
/// bank.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoolFilter {
    pub subject: Option<Subject>,
    pub chapter: Option<String>,
}

impl PoolFilter {
    pub fn for_subject(subject: Subject) -> Self {
        Self {
            subject: Some(subject),
            chapter: None,
        }
    }

    pub fn for_chapter(subject: Subject, chapter: impl Into<String>) -> Self {
        Self {
            subject: Some(subject),
            chapter: Some(chapter.into()),
        }
    }

    pub fn matches(&self, question: &Question) -> bool {
        if let Some(subject) = self.subject {
            if question.subject != subject {
                return false;
            }
        }
        if let Some(chapter) = &self.chapter {
            if &question.chapter != chapter {
                return false;
            }
        }
        true
    }
}

/// A published question with its IRT calibration. Immutable once published.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub subject: Subject,
    pub chapter: String,
    pub question_type: QuestionType,
    pub prompt: String,
    #[serde(default)]
    pub options: Vec<QuestionOption>,
    pub correct: CorrectAnswer,
    #[serde(default)]
    pub explanation: Option<String>,
    pub irt: IrtParams,
}

impl Question {
    /// Checks internal consistency beyond what serde enforces: IRT ranges,
    /// answer key matching the question type, MCQ options present.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.id.trim().is_empty() {
            return Err(EngineError::validation("question id must not be empty"));
        }
        self.irt.validate()?;
        match (self.question_type, &self.correct) {
            (QuestionType::McqSingle, CorrectAnswer::Option { option_id }) => {
                if self.options.is_empty() {
                    return Err(EngineError::validation(format!(
                        "mcq question {} has no options",
                        self.id
                    )));
                }
                if !self.options.iter().any(|o| &o.option_id == option_id) {
                    return Err(EngineError::validation(format!(
                        "mcq question {} answer key references unknown option {}",
                        self.id, option_id
                    )));
                }
                Ok(())
            }
            (QuestionType::Numerical, CorrectAnswer::Numerical { tolerance, .. }) => {
                if !tolerance.is_finite() || *tolerance < 0.0 {
                    return Err(EngineError::validation(format!(
                        "numerical question {} has invalid tolerance {}",
                        self.id, tolerance
                    )));
                }
                Ok(())
            }
            _ => Err(EngineError::validation(format!(
                "question {} answer key does not match its type",
                self.id
            ))),
        }
    }

    /// Grades a submitted answer against the key. A type mismatch (numeric
    /// answer to an MCQ) is simply incorrect, not an error: the client UI
    /// constrains input, but the engine never trusts it.
    pub fn grade(&self, answer: &SubmittedAnswer) -> bool {
        match (&self.correct, answer) {
            (CorrectAnswer::Option { option_id: key }, SubmittedAnswer::Option { option_id }) => {
                key == option_id
            }
            (
                CorrectAnswer::Numerical { value, tolerance },
                SubmittedAnswer::Numerical { value: given },
            ) => (given - value).abs() <= *tolerance,
            _ => false,
        }
    }
}
