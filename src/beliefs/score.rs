use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::map::BeliefMap;

/// A user's stance on one belief.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum BeliefScore {
    Disagree,
    #[default]
    Unknown,
    Affirm,
}

impl BeliefScore {
    pub fn value(self) -> i8 {
        match self {
            BeliefScore::Disagree => -1,
            BeliefScore::Unknown => 0,
            BeliefScore::Affirm => 1,
        }
    }

    pub fn is_unknown(self) -> bool {
        self == BeliefScore::Unknown
    }

    fn from_json(value: &Value) -> Option<Self> {
        let number = match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))?,
            Value::String(s) => s.trim().parse::<i64>().ok()?,
            _ => return None,
        };
        i8::try_from(number).ok().and_then(|n| Self::try_from(n).ok())
    }
}

impl From<BeliefScore> for i8 {
    fn from(score: BeliefScore) -> Self {
        score.value()
    }
}

impl TryFrom<i8> for BeliefScore {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(BeliefScore::Disagree),
            0 => Ok(BeliefScore::Unknown),
            1 => Ok(BeliefScore::Affirm),
            other => Err(format!("belief score must be -1, 0 or 1, got {}", other)),
        }
    }
}

/// Scores for every belief key after one user turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreRound {
    scores: BTreeMap<String, BeliefScore>,
}

impl ScoreRound {
    /// A round with every known key at `Unknown`.
    pub fn seeded(beliefs: &BeliefMap) -> Self {
        Self {
            scores: beliefs
                .keys()
                .map(|key| (key.to_string(), BeliefScore::Unknown))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> BeliefScore {
        self.scores.get(key).copied().unwrap_or_default()
    }

    pub fn set(&mut self, key: &str, score: BeliefScore) -> bool {
        match self.scores.get_mut(key) {
            Some(slot) => {
                *slot = score;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, BeliefScore)> {
        self.scores.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Merges one tool call's arguments (`{"belief_key": -1|0|1, ...}`).
    ///
    /// Unknown keys and out-of-range values are skipped. A `0` means no
    /// evidence and never overwrites a score set by an earlier call in the
    /// same round. Returns how many keys were applied.
    pub fn apply_tool_arguments(&mut self, arguments: &Value) -> usize {
        let Some(object) = arguments.as_object() else {
            tracing::warn!("Ignoring belief tool arguments that are not an object");
            return 0;
        };

        let mut applied = 0;
        for (key, raw) in object {
            let Some(score) = BeliefScore::from_json(raw) else {
                tracing::warn!(key = %key, value = %raw, "Ignoring out-of-range belief score");
                continue;
            };
            if !self.scores.contains_key(key) {
                tracing::warn!(key = %key, "Ignoring score for unknown belief");
                continue;
            }
            if !score.is_unknown() && self.set(key, score) {
                applied += 1;
            }
        }
        applied
    }

    /// Fills keys still at `Unknown` from the previous round.
    pub fn carry_forward(&mut self, previous: Option<&ScoreRound>) {
        let Some(previous) = previous else {
            return;
        };
        for (key, score) in self.scores.iter_mut() {
            if score.is_unknown() {
                *score = previous.get(key);
            }
        }
    }
}

/// Append-only sequence of rounds; only an explicit reset clears it.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ScoreHistory {
    rounds: Vec<ScoreRound>,
}

impl ScoreHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, round: ScoreRound) {
        self.rounds.push(round);
    }

    pub fn latest(&self) -> Option<&ScoreRound> {
        self.rounds.last()
    }

    pub fn rounds(&self) -> &[ScoreRound] {
        &self.rounds
    }

    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    pub fn clear(&mut self) {
        self.rounds.clear();
    }
}
