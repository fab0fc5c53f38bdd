// crates/survey-harness-core/src/runtime/generator.rs
// ============================================================================
// Module: Synthetic Response Generator
// Description: Randomized participant drafts driven by a survey schema.
// Purpose: Stand in for real respondents when exercising storage and export.
// Dependencies: crate::core, rand
// ============================================================================

//! ## Overview
//! [`ResponseGenerator`] walks a validated [`SurveySchema`] and answers each
//! question with a uniformly random value of the right shape. A participant
//! completes the survey with the schema's completion rate; everyone else
//! abandons it after a random prefix of questions. Optional questions are
//! answered by roughly half of the participants who reach them.
//!
//! Output is reproducible for a fixed seed. No claim is made about matching
//! any real respondent distribution.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::core::FieldValue;
use crate::core::ParticipantDraft;
use crate::core::ParticipantStatus;
use crate::core::QuestionKind;
use crate::core::Responses;
use crate::core::RunId;
use crate::core::SchemaError;
use crate::core::SurveySchema;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum age of a generated session start, relative to the reference time.
const MAX_START_OFFSET_MS: i64 = 3_600_000;
/// Minimum generated session duration.
const MIN_SESSION_MS: i64 = 30_000;
/// Maximum generated session duration (exclusive).
const MAX_SESSION_MS: i64 = 1_800_000;
/// Probability that an optional question is answered.
const OPTIONAL_ANSWER_RATE: f64 = 0.5;
/// Maximum number of words in a generated text answer.
const MAX_TEXT_WORDS: usize = 5;

// ============================================================================
// SECTION: Generator
// ============================================================================

/// Seeded generator of synthetic participant drafts.
#[derive(Debug, Clone)]
pub struct ResponseGenerator {
    /// Validated survey schema.
    schema: SurveySchema,
    /// Random source.
    rng: StdRng,
}

impl ResponseGenerator {
    /// Creates a generator for a schema.
    ///
    /// With `seed`, output is deterministic; without it, the generator is
    /// seeded from operating-system entropy.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] when the schema is invalid.
    pub fn new(schema: SurveySchema, seed: Option<u64>) -> Result<Self, SchemaError> {
        schema.validate()?;
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            schema,
            rng,
        })
    }

    /// Returns the schema the generator answers.
    #[must_use]
    pub const fn schema(&self) -> &SurveySchema {
        &self.schema
    }

    /// Produces one participant draft relative to `now_ms`.
    pub fn draft(&mut self, run_id: &RunId, now_ms: i64) -> ParticipantDraft {
        let completed = self.rng.gen_bool(self.schema.completion_rate);
        let question_count = self.schema.questions.len();
        let answered =
            if completed { question_count } else { self.rng.gen_range(0 .. question_count) };

        let mut responses = Responses::new();
        for question in self.schema.questions.iter().take(answered) {
            if question.optional && !self.rng.gen_bool(OPTIONAL_ANSWER_RATE) {
                continue;
            }
            let value = answer(&mut self.rng, &question.kind);
            responses.insert(question.name.clone(), value);
        }

        let started_at_ms = now_ms.saturating_sub(self.rng.gen_range(0 .. MAX_START_OFFSET_MS));
        let ended_at_ms =
            started_at_ms.saturating_add(self.rng.gen_range(MIN_SESSION_MS .. MAX_SESSION_MS));
        ParticipantDraft {
            run_id: run_id.clone(),
            status: if completed { ParticipantStatus::Completed } else { ParticipantStatus::Failed },
            started_at_ms,
            ended_at_ms: Some(ended_at_ms),
            responses,
        }
    }
}

/// Draws a random answer for a question shape.
fn answer(rng: &mut StdRng, kind: &QuestionKind) -> FieldValue {
    match kind {
        QuestionKind::Choice {
            options,
        } => FieldValue::Text(options[rng.gen_range(0 .. options.len())].clone()),
        QuestionKind::Integer {
            min,
            max,
        } => FieldValue::Integer(rng.gen_range(*min ..= *max)),
        QuestionKind::Float {
            min,
            max,
        } => {
            if min >= max {
                FieldValue::Float(*min)
            } else {
                FieldValue::Float(rng.gen_range(*min .. *max))
            }
        }
        QuestionKind::Text {
            words,
        } => {
            let count = rng.gen_range(1 ..= MAX_TEXT_WORDS);
            let text = (0 .. count)
                .map(|_| words[rng.gen_range(0 .. words.len())].as_str())
                .collect::<Vec<_>>()
                .join(" ");
            FieldValue::Text(text)
        }
        QuestionKind::Check => FieldValue::Bool(rng.gen_bool(0.5)),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
