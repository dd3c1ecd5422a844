//! Confidence scoring for generated translations.
//!
//! Low quality is reported through the score and explanation. Only output
//! that cannot be decoded into text at all is an error.

use std::collections::HashSet;

use serde::Deserialize;

use crate::errors::Error;
use crate::types::{ContextMatch, TranslationQuery, TranslationResult};

/// Weights and thresholds of the confidence score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub structural: f64,
    pub terminology: f64,
    pub coverage: f64,
    /// Highest score a translation without any context can reach.
    pub zero_context_ceiling: u8,
    pub min_length_ratio: f64,
    pub max_length_ratio: f64,
    /// Multiplier applied to structural sanity when the length ratio is out of band.
    pub length_penalty: f64,
    /// Multiplier applied when the output repeats the source verbatim.
    pub echo_penalty: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            structural: 0.35,
            terminology: 0.25,
            coverage: 0.40,
            zero_context_ceiling: 70,
            min_length_ratio: 0.3,
            max_length_ratio: 3.0,
            length_penalty: 0.5,
            echo_penalty: 0.6,
        }
    }
}

/// Minimum term length counted by the terminology check.
const MIN_TERM_CHARS: usize = 3;
/// Terminology score when the output has no countable terms.
const NEUTRAL_TERMINOLOGY: f64 = 0.5;
/// Match count at which the coverage count bonus saturates.
const COVERAGE_SATURATION: usize = 3;

/// Derives confidence score and explanation for a model output.
#[derive(Debug, Clone, Default)]
pub struct QualityAssessor {
    weights: ScoringWeights,
}

impl QualityAssessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn with_zero_context_ceiling(mut self, ceiling: u8) -> Self {
        self.weights.zero_context_ceiling = ceiling.min(100);
        self
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Decode `raw_output` and score it against the query and its context.
    ///
    /// # Errors
    ///
    /// Returns `Error::Assessment` if the output contains control characters
    /// or is a JSON object without a string `translation` field.
    pub fn assess(
        &self,
        query: &TranslationQuery,
        raw_output: &str,
        context: &[ContextMatch],
    ) -> Result<TranslationResult, Error> {
        let translation = decode_output(raw_output)?;
        let w = &self.weights;

        let structural = self.structural(&query.source_text, &translation);
        let mut notes = Vec::new();

        if translation.is_empty() {
            notes.push("The model returned an empty translation.".to_string());
            return Ok(TranslationResult {
                translation,
                confidence_score: 0,
                explanation: notes.join(" "),
                matched_context_count: context.len(),
            });
        }

        let raw_score = if context.is_empty() {
            notes.push(format!(
                "No historical context was available for this language, so confidence is capped at {}.",
                w.zero_context_ceiling
            ));
            f64::from(w.zero_context_ceiling) * structural.value
        } else {
            let terminology = terminology(&translation, context);
            let coverage = coverage(context);
            let best = context
                .iter()
                .map(|m| m.similarity)
                .fold(0.0_f64, f64::max);

            notes.push(format!(
                "Grounded in {} past translation{} (best similarity {:.2}).",
                context.len(),
                if context.len() == 1 { "" } else { "s" },
                best
            ));
            match terminology.share {
                Some(share) => notes.push(format!(
                    "{:.0}% of terms match terminology from past translations.",
                    share * 100.0
                )),
                None => notes.push("No terms to check against past terminology.".to_string()),
            }

            100.0
                * (w.structural * structural.value
                    + w.terminology * terminology.value
                    + w.coverage * coverage)
        };

        notes.extend(structural.notes);

        Ok(TranslationResult {
            translation,
            confidence_score: raw_score.round().clamp(0.0, 100.0) as u8,
            explanation: notes.join(" "),
            matched_context_count: context.len(),
        })
    }

    fn structural(&self, source: &str, translation: &str) -> Structural {
        let w = &self.weights;
        if translation.is_empty() {
            return Structural {
                value: 0.0,
                notes: Vec::new(),
            };
        }

        let mut value = 1.0;
        let mut notes = Vec::new();

        let source_chars = source.trim().chars().count();
        let ratio = if source_chars == 0 {
            1.0
        } else {
            translation.chars().count() as f64 / source_chars as f64
        };
        if ratio < w.min_length_ratio || ratio > w.max_length_ratio {
            value *= w.length_penalty;
            notes.push(format!(
                "Length ratio {ratio:.2} is outside the expected {:.1}-{:.1} band.",
                w.min_length_ratio, w.max_length_ratio
            ));
        } else {
            notes.push(format!("Length ratio {ratio:.2} is within the expected band."));
        }

        if translation == source.trim() && source.chars().any(char::is_alphabetic) {
            value *= w.echo_penalty;
            notes.push("The output repeats the source text unchanged.".to_string());
        }

        Structural { value, notes }
    }
}

struct Structural {
    value: f64,
    notes: Vec<String>,
}

struct Terminology {
    value: f64,
    /// `None` when the output has no countable terms.
    share: Option<f64>,
}

fn terminology(translation: &str, context: &[ContextMatch]) -> Terminology {
    let vocabulary: HashSet<String> = context
        .iter()
        .flat_map(|m| terms(&m.record.translation))
        .collect();

    let output_terms = terms(translation);
    if output_terms.is_empty() {
        return Terminology {
            value: NEUTRAL_TERMINOLOGY,
            share: None,
        };
    }

    let known = output_terms
        .iter()
        .filter(|t| vocabulary.contains(*t))
        .count();
    let share = known as f64 / output_terms.len() as f64;
    Terminology {
        value: share,
        share: Some(share),
    }
}

fn coverage(context: &[ContextMatch]) -> f64 {
    let best = context
        .iter()
        .map(|m| m.similarity.clamp(0.0, 1.0))
        .fold(0.0_f64, f64::max);
    let count = context.len().min(COVERAGE_SATURATION) as f64 / COVERAGE_SATURATION as f64;
    0.7 * best + 0.3 * count
}

/// Lowercased alphanumeric tokens of at least `MIN_TERM_CHARS` characters.
fn terms(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= MIN_TERM_CHARS)
        .map(str::to_lowercase)
        .collect()
}

/// Extract the translation text from a raw model response.
///
/// Accepts `{"translation": "..."}` or plain text, either of them optionally
/// inside a Markdown code fence that may follow some preamble. The result is
/// trimmed.
pub fn decode_output(raw: &str) -> Result<String, Error> {
    reject_control_chars(raw)?;

    let body = fenced_block(raw).unwrap_or(raw).trim();
    let translation = match json_object_start(body) {
        Some(start) => {
            let mut de = serde_json::Deserializer::from_str(&body[start..]);
            match serde_json::Value::deserialize(&mut de) {
                Ok(value) => translation_field(&value)?,
                Err(e) if start == 0 => {
                    return Err(Error::Assessment(format!(
                        "model output is not valid JSON: {e}"
                    )));
                }
                Err(_) => body.to_string(),
            }
        }
        None => body.to_string(),
    };

    reject_control_chars(&translation)?;
    Ok(translation.trim().to_string())
}

fn reject_control_chars(text: &str) -> Result<(), Error> {
    if text.chars().any(|c| c.is_control() && !c.is_whitespace()) {
        return Err(Error::Assessment(
            "model output contains control characters".to_string(),
        ));
    }
    Ok(())
}

fn translation_field(value: &serde_json::Value) -> Result<String, Error> {
    match value.get("translation") {
        Some(serde_json::Value::String(text)) => Ok(text.clone()),
        Some(_) => Err(Error::Assessment(
            "'translation' field is not a string".to_string(),
        )),
        None => Err(Error::Assessment(
            "JSON output has no 'translation' field".to_string(),
        )),
    }
}

/// Byte offset of the first `{` that opens a JSON object with a string key.
///
/// Braces around placeholders such as `{name}` are not object starts.
fn json_object_start(text: &str) -> Option<usize> {
    text.match_indices('{')
        .map(|(i, _)| i)
        .find(|&i| text[i + 1..].trim_start().starts_with('"'))
}

/// Contents of the first Markdown code fence, wherever it starts.
///
/// An unterminated fence runs to the end of the text.
fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let rest = &text[open + 3..];

    // info string: ```json or ```text on its own line, or ```json before inline content
    let tag_len = rest
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(rest.len());
    let (tag, after_tag) = rest.split_at(tag_len);
    let rest = if after_tag.starts_with('\n')
        || after_tag.starts_with("\r\n")
        || (tag.eq_ignore_ascii_case("json") && after_tag.starts_with(char::is_whitespace))
    {
        after_tag
    } else {
        rest
    };

    let block = match rest.find("```") {
        Some(close) => &rest[..close],
        None => rest,
    };
    Some(block.trim())
}
