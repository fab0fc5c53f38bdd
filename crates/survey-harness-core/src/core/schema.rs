// crates/survey-harness-core/src/core/schema.rs
// ============================================================================
// Module: Survey Schema
// Description: Question definitions answered by synthetic participants.
// Purpose: Describe the response fields the generator fills in.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! A [`SurveySchema`] is an ordered list of questions plus the probability
//! that a synthetic participant finishes the survey. Schemas are validated
//! before use; invalid schemas fail closed with [`SchemaError`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::identifiers::FieldName;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum number of questions in a schema.
pub const MAX_QUESTIONS: usize = 256;
/// Maximum number of options or words per question.
pub const MAX_OPTIONS: usize = 1_024;
/// Maximum length of a field name in bytes.
pub const MAX_FIELD_NAME_LENGTH: usize = 128;
/// Default probability that a participant completes the survey.
pub const DEFAULT_COMPLETION_RATE: f64 = 0.9;
/// Column names reserved for participant metadata in exports.
pub const RESERVED_FIELD_NAMES: [&str; 5] = ["id", "run_id", "status", "start_time", "end_time"];

// ============================================================================
// SECTION: Types
// ============================================================================

/// Answer shape for a single question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuestionKind {
    /// Single choice among labelled options.
    Choice {
        /// Option labels.
        options: Vec<String>,
    },
    /// Integer within an inclusive range.
    Integer {
        /// Inclusive lower bound.
        min: i64,
        /// Inclusive upper bound.
        max: i64,
    },
    /// Float within a half-open range (`min == max` yields `min`).
    Float {
        /// Inclusive lower bound.
        min: f64,
        /// Exclusive upper bound.
        max: f64,
    },
    /// Free text assembled from a word pool.
    Text {
        /// Word pool.
        words: Vec<String>,
    },
    /// Checkbox.
    Check,
}

/// Single survey question.
///
/// Deserialization is strict: keys that do not belong to the question's
/// `kind` are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "QuestionDocument")]
pub struct QuestionSpec {
    /// Response field the answer is stored under.
    pub name: FieldName,
    /// Answer shape.
    #[serde(flatten)]
    pub kind: QuestionKind,
    /// Optional questions are skipped by roughly half of the participants.
    #[serde(default)]
    pub optional: bool,
}

impl QuestionSpec {
    /// Creates a required question.
    #[must_use]
    pub fn required(name: &str, kind: QuestionKind) -> Self {
        Self {
            name: FieldName::new(name),
            kind,
            optional: false,
        }
    }

    /// Creates an optional question.
    #[must_use]
    pub fn optional(name: &str, kind: QuestionKind) -> Self {
        Self {
            name: FieldName::new(name),
            kind,
            optional: true,
        }
    }
}

/// Wire form of a question before its keys are checked against its kind.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct QuestionDocument {
    /// Response field name.
    name: FieldName,
    /// Answer shape tag.
    kind: QuestionKindTag,
    /// Choice options.
    options: Option<Vec<String>>,
    /// Lower bound for numeric questions.
    min: Option<Bound>,
    /// Upper bound for numeric questions.
    max: Option<Bound>,
    /// Word pool for text questions.
    words: Option<Vec<String>>,
    /// Whether the question may be skipped.
    #[serde(default)]
    optional: bool,
}

/// Answer shape tag as written in configuration.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum QuestionKindTag {
    /// Single choice.
    Choice,
    /// Integer range.
    Integer,
    /// Float range.
    Float,
    /// Free text.
    Text,
    /// Checkbox.
    Check,
}

impl QuestionKindTag {
    /// Returns the configuration label.
    const fn as_str(self) -> &'static str {
        match self {
            Self::Choice => "choice",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Text => "text",
            Self::Check => "check",
        }
    }
}

/// Numeric bound as written in configuration.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum Bound {
    /// Integer literal.
    Integer(i64),
    /// Float literal.
    Float(f64),
}

impl TryFrom<QuestionDocument> for QuestionSpec {
    type Error = String;

    fn try_from(document: QuestionDocument) -> Result<Self, Self::Error> {
        let QuestionDocument {
            name,
            kind: tag,
            options,
            min,
            max,
            words,
            optional,
        } = document;
        let present = [
            ("options", options.is_some()),
            ("min", min.is_some()),
            ("max", max.is_some()),
            ("words", words.is_some()),
        ];
        let allowed: &[&str] = match tag {
            QuestionKindTag::Choice => &["options"],
            QuestionKindTag::Integer | QuestionKindTag::Float => &["min", "max"],
            QuestionKindTag::Text => &["words"],
            QuestionKindTag::Check => &[],
        };
        if let Some((key, _)) =
            present.iter().find(|(key, is_set)| *is_set && !allowed.contains(key))
        {
            return Err(format!(
                "question '{name}': key `{key}` is not valid for {} questions",
                tag.as_str()
            ));
        }
        let kind = match tag {
            QuestionKindTag::Choice => QuestionKind::Choice {
                options: required_key(&name, "options", options)?,
            },
            QuestionKindTag::Integer => QuestionKind::Integer {
                min: integer_bound(&name, "min", min)?,
                max: integer_bound(&name, "max", max)?,
            },
            QuestionKindTag::Float => QuestionKind::Float {
                min: float_bound(&name, "min", min)?,
                max: float_bound(&name, "max", max)?,
            },
            QuestionKindTag::Text => QuestionKind::Text {
                words: required_key(&name, "words", words)?,
            },
            QuestionKindTag::Check => QuestionKind::Check,
        };
        Ok(Self {
            name,
            kind,
            optional,
        })
    }
}

/// Unwraps a key the question kind requires.
fn required_key<T>(name: &FieldName, key: &str, value: Option<T>) -> Result<T, String> {
    value.ok_or_else(|| format!("question '{name}': missing key `{key}`"))
}

/// Reads an integer bound.
fn integer_bound(name: &FieldName, key: &str, bound: Option<Bound>) -> Result<i64, String> {
    match required_key(name, key, bound)? {
        Bound::Integer(value) => Ok(value),
        Bound::Float(_) => Err(format!("question '{name}': `{key}` must be an integer")),
    }
}

/// Reads a float bound, widening integer literals.
#[allow(clippy::cast_precision_loss, reason = "Bounds are sampling hints, not exact values.")]
fn float_bound(name: &FieldName, key: &str, bound: Option<Bound>) -> Result<f64, String> {
    match required_key(name, key, bound)? {
        Bound::Integer(value) => Ok(value as f64),
        Bound::Float(value) => Ok(value),
    }
}

/// Ordered survey definition.
///
/// # Invariants
/// - Validated schemas have at least one question and unique, non-empty names.
/// - `completion_rate` is within `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SurveySchema {
    /// Questions in presentation order.
    pub questions: Vec<QuestionSpec>,
    /// Probability that a participant completes the survey.
    #[serde(default = "default_completion_rate")]
    pub completion_rate: f64,
}

/// Returns the default completion rate.
const fn default_completion_rate() -> f64 {
    DEFAULT_COMPLETION_RATE
}

impl Default for SurveySchema {
    fn default() -> Self {
        Self::default_survey()
    }
}

impl SurveySchema {
    /// Returns the built-in demographic and satisfaction survey.
    #[must_use]
    pub fn default_survey() -> Self {
        let words = ["clear", "long", "helpful", "confusing", "quick", "fine", "boring", "fun"];
        Self {
            questions: vec![
                QuestionSpec::required(
                    "age",
                    QuestionKind::Integer {
                        min: 18,
                        max: 80,
                    },
                ),
                QuestionSpec::required(
                    "gender",
                    QuestionKind::Choice {
                        options: vec![
                            "female".to_string(),
                            "male".to_string(),
                            "non_binary".to_string(),
                            "prefer_not_to_say".to_string(),
                        ],
                    },
                ),
                QuestionSpec::required("consent", QuestionKind::Check),
                QuestionSpec::required(
                    "satisfaction",
                    QuestionKind::Integer {
                        min: 1,
                        max: 5,
                    },
                ),
                QuestionSpec::optional(
                    "hours_per_week",
                    QuestionKind::Float {
                        min: 0.0,
                        max: 40.0,
                    },
                ),
                QuestionSpec::optional(
                    "comment",
                    QuestionKind::Text {
                        words: words.iter().map(ToString::to_string).collect(),
                    },
                ),
            ],
            completion_rate: DEFAULT_COMPLETION_RATE,
        }
    }

    /// Validates the schema.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] when the schema is empty, oversized, has
    /// duplicate or malformed names, or contains an unsatisfiable question.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.questions.is_empty() {
            return Err(SchemaError::Empty);
        }
        if self.questions.len() > MAX_QUESTIONS {
            return Err(SchemaError::TooManyQuestions {
                max: MAX_QUESTIONS,
                actual: self.questions.len(),
            });
        }
        if !(0.0 ..= 1.0).contains(&self.completion_rate) {
            return Err(SchemaError::CompletionRate(self.completion_rate));
        }
        let mut seen = BTreeSet::new();
        for question in &self.questions {
            let name = question.name.as_str();
            if name.trim().is_empty() || name.len() > MAX_FIELD_NAME_LENGTH {
                return Err(SchemaError::InvalidName(name.to_string()));
            }
            if RESERVED_FIELD_NAMES.contains(&name) {
                return Err(SchemaError::ReservedName(name.to_string()));
            }
            if !seen.insert(name) {
                return Err(SchemaError::DuplicateName(name.to_string()));
            }
            validate_kind(name, &question.kind)?;
        }
        Ok(())
    }
}

/// Validates a single question's answer shape.
fn validate_kind(name: &str, kind: &QuestionKind) -> Result<(), SchemaError> {
    let invalid = |reason: &str| SchemaError::InvalidQuestion {
        name: name.to_string(),
        reason: reason.to_string(),
    };
    match kind {
        QuestionKind::Choice {
            options,
        } => {
            if options.is_empty() {
                return Err(invalid("choice options must not be empty"));
            }
            if options.len() > MAX_OPTIONS {
                return Err(invalid("too many choice options"));
            }
        }
        QuestionKind::Integer {
            min,
            max,
        } => {
            if min > max {
                return Err(invalid("integer min exceeds max"));
            }
        }
        QuestionKind::Float {
            min,
            max,
        } => {
            if !min.is_finite() || !max.is_finite() || min > max {
                return Err(invalid("float range must be finite with min <= max"));
            }
            if !(max - min).is_finite() {
                return Err(invalid("float range width must be finite"));
            }
        }
        QuestionKind::Text {
            words,
        } => {
            if words.is_empty() {
                return Err(invalid("text word pool must not be empty"));
            }
            if words.len() > MAX_OPTIONS {
                return Err(invalid("too many text words"));
            }
        }
        QuestionKind::Check => {}
    }
    Ok(())
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Survey schema validation errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    /// Schema has no questions.
    #[error("survey schema must contain at least one question")]
    Empty,
    /// Schema exceeds the question limit.
    #[error("survey schema has too many questions: {actual} (max {max})")]
    TooManyQuestions {
        /// Maximum allowed questions.
        max: usize,
        /// Actual question count.
        actual: usize,
    },
    /// Completion rate outside `[0, 1]`.
    #[error("completion rate out of range: {0}")]
    CompletionRate(f64),
    /// Field name is empty or too long.
    #[error("invalid field name: '{0}'")]
    InvalidName(String),
    /// Field name collides with an export metadata column.
    #[error("field name is reserved: {0}")]
    ReservedName(String),
    /// Field name appears more than once.
    #[error("duplicate field name: {0}")]
    DuplicateName(String),
    /// Question cannot be answered.
    #[error("invalid question {name}: {reason}")]
    InvalidQuestion {
        /// Offending field name.
        name: String,
        /// Human-readable reason.
        reason: String,
    },
}
