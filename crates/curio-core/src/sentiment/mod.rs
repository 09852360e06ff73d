//! Word-list sentiment classification
//!
//! Maps free text to a polarity label by counting weighted sentiment
//! words. An intensifier boosts the next sentiment word, a negator flips
//! it; both clear once they have applied. The scorer uses the label to
//! pick empathetic phrasing, nothing more.

const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "happy", "love", "like", "wonderful", "amazing", "excellent", "beautiful",
    "nice", "awesome", "fantastic", "joy", "enjoy", "pleased", "glad", "best", "fun", "excited",
    "win", "won", "success", "perfect", "brilliant", "delighted", "thrilled",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad", "sad", "hate", "terrible", "awful", "horrible", "angry", "upset", "worried", "afraid",
    "scared", "hurt", "pain", "lost", "fail", "failed", "wrong", "poor", "worst",
    "disappointing", "frustrated", "annoyed", "tired", "bored", "lonely", "sick",
];

const INTENSIFIERS: &[&str] = &[
    "very", "really", "extremely", "so", "quite", "absolutely", "incredibly", "terribly",
    "awfully",
];

const NEGATORS: &[&str] = &["not", "don't", "doesn't", "didn't", "won't", "can't", "never", "no"];

/// Polarity label for an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classification result with the raw accumulators kept for scoring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentimentReading {
    pub label: Sentiment,
    /// Normalized score in [-1.0, 1.0]
    pub score: f64,
    pub positive: f64,
    pub negative: f64,
}

impl SentimentReading {
    fn neutral() -> Self {
        Self {
            label: Sentiment::Neutral,
            score: 0.0,
            positive: 0.0,
            negative: 0.0,
        }
    }
}

/// Classify the sentiment of a line of text.
///
/// Zero sentiment words yields exactly `(Neutral, 0.0)`; the division only
/// happens once at least one sentiment word has been counted.
pub fn classify(text: &str) -> SentimentReading {
    let mut positive = 0.0_f64;
    let mut negative = 0.0_f64;
    let mut intensity = 1.0_f64;
    let mut negated = false;

    for raw in text.split_whitespace() {
        let word = raw.to_lowercase();
        let word = word.trim_matches(|c: char| !c.is_alphanumeric());

        if NEGATORS.contains(&word) {
            negated = true;
            continue;
        }
        if INTENSIFIERS.contains(&word) {
            intensity = 1.5;
            continue;
        }

        let polarity = if POSITIVE_WORDS.contains(&word) {
            Some(true)
        } else if NEGATIVE_WORDS.contains(&word) {
            Some(false)
        } else {
            None
        };

        // Pending intensity and negation survive intervening neutral words
        // and clear only once a sentiment word absorbs them.
        if let Some(is_positive) = polarity {
            if is_positive != negated {
                positive += intensity;
            } else {
                negative += intensity;
            }
            negated = false;
            intensity = 1.0;
        }
    }

    let total = positive + negative;
    if total == 0.0 {
        return SentimentReading::neutral();
    }

    let score = (positive - negative) / total.max(1.0);
    let label = if score > 0.2 {
        Sentiment::Positive
    } else if score < -0.2 {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    };

    SentimentReading {
        label,
        score,
        positive,
        negative,
    }
}
