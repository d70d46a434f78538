//! Per-key record of what happened during avatar generation.

use chrono::{DateTime, Utc};
use derive_getters::Getters;
use picturebook_core::AvatarCacheKey;
use picturebook_interface::QualityScores;
use serde::Serialize;

/// Result of one generation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// Image accepted; scores are absent when no gate ran
    Accepted {
        /// Gate scores, if the candidate was evaluated
        scores: Option<QualityScores>,
    },
    /// Image scored below threshold and another attempt followed
    Rejected {
        /// The failing scores
        scores: QualityScores,
    },
    /// Final attempt scored below threshold and was kept anyway
    AcceptedWithShortfall {
        /// The failing scores
        scores: QualityScores,
    },
    /// Image accepted because the gate itself failed
    GateUnavailable {
        /// Why the gate could not score the image
        error: String,
    },
    /// Generation succeeded without an image payload
    NoImage,
    /// Generation call failed
    Failed {
        /// Error reported by the generator
        error: String,
    },
}

/// One attempt in a generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Getters)]
pub struct AttemptRecord {
    attempt: u32,
    outcome: AttemptOutcome,
    finished_at: DateTime<Utc>,
}

impl AttemptRecord {
    /// Record an attempt finishing now.
    pub fn new(attempt: u32, outcome: AttemptOutcome) -> Self {
        Self {
            attempt,
            outcome,
            finished_at: Utc::now(),
        }
    }
}

/// Where the image handed back by a generation run came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Disposition {
    /// A generated image was accepted
    Styled,
    /// A generated image was kept despite failing the gate
    BestEffort,
    /// No usable image was produced; the source reference was returned
    Unstyled,
}

/// Full history of one key's generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Getters)]
pub struct GenerationAudit {
    key: AvatarCacheKey,
    provider: String,
    attempts: Vec<AttemptRecord>,
    disposition: Disposition,
    /// Scores of the kept image when it fell short of the thresholds
    shortfall: Option<QualityScores>,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
}

impl GenerationAudit {
    /// Start an audit for a key.
    pub fn start(key: AvatarCacheKey, provider: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            key,
            provider: provider.into(),
            attempts: Vec::new(),
            disposition: Disposition::Unstyled,
            shortfall: None,
            started_at: now,
            finished_at: now,
        }
    }

    /// Append an attempt.
    pub fn record(&mut self, attempt: u32, outcome: AttemptOutcome) {
        self.attempts.push(AttemptRecord::new(attempt, outcome));
    }

    /// Close the audit with its final disposition.
    pub fn finish(mut self, disposition: Disposition, shortfall: Option<QualityScores>) -> Self {
        self.disposition = disposition;
        self.shortfall = shortfall;
        self.finished_at = Utc::now();
        self
    }

    /// Number of generation calls made.
    pub fn attempt_count(&self) -> usize {
        self.attempts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use picturebook_core::ClothingCategory;

    #[test]
    fn test_audit_serializes_outcomes() {
        let key = AvatarCacheKey::new("Mia", ClothingCategory::Winter, "pixar");
        let mut audit = GenerationAudit::start(key, "mock");
        audit.record(
            1,
            AttemptOutcome::Rejected {
                scores: QualityScores::new(3, Some(8)),
            },
        );
        audit.record(2, AttemptOutcome::NoImage);
        let audit = audit.finish(Disposition::BestEffort, Some(QualityScores::new(3, Some(8))));

        let json = serde_json::to_value(&audit).unwrap();
        assert_eq!(json["disposition"], "best_effort");
        assert_eq!(json["attempts"][0]["outcome"]["outcome"], "rejected");
        assert_eq!(json["attempts"][1]["outcome"]["outcome"], "no_image");
        assert_eq!(json["key"]["character"], "mia");
        assert_eq!(audit.attempt_count(), 2);
        assert!(audit.finished_at() >= audit.started_at());
    }
}
