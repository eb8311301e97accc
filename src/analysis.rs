//! Sentiment and topic extraction
//!
//! The engine treats this as a black box: anything implementing
//! [`SentimentAnalyzer`] can be plugged into the dispatcher.

use crate::protocol::Sentiment;

/// Polarity above which a request counts as positive (and below whose negation, negative)
pub const POLARITY_THRESHOLD: f64 = 0.3;

const MAX_TOPICS: usize = 3;

/// Result of analysing one request text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Analysis {
    pub sentiment: Sentiment,
    pub topics: Vec<String>,
}

impl Analysis {
    pub fn new(sentiment: Sentiment, topics: Vec<String>) -> Self {
        Self { sentiment, topics }
    }
}

/// Extracts a sentiment label and topic phrases from free text
pub trait SentimentAnalyzer: Send + Sync {
    fn analyze(&self, text: &str) -> Analysis;
}

/// Word-list analyzer used when no external NLP service is wired in
#[derive(Debug, Clone)]
pub struct LexiconAnalyzer {
    positive: Vec<&'static str>,
    negative: Vec<&'static str>,
    stopwords: Vec<&'static str>,
}

impl LexiconAnalyzer {
    pub fn new() -> Self {
        Self {
            positive: vec![
                "good", "great", "excellent", "thanks", "thank", "love", "happy", "awesome",
                "perfect", "nice", "wonderful", "amazing",
            ],
            negative: vec![
                "bad", "terrible", "awful", "hate", "angry", "frustrated", "nothing", "broken",
                "fail", "failed", "failing", "worst", "wrong", "useless", "never", "stuck",
            ],
            stopwords: vec![
                "what", "whats", "what's", "with", "this", "that", "then", "please", "there",
                "their", "about", "have", "need", "from", "into", "your", "just", "some",
                "want", "would", "could", "should", "and", "the", "check",
            ],
        }
    }

    /// Normalised polarity in `[-1.0, 1.0]`
    pub fn polarity(&self, text: &str) -> f64 {
        let mut positive = 0usize;
        let mut negative = 0usize;
        for word in words(text) {
            if self.positive.contains(&word.as_str()) {
                positive += 1;
            } else if self.negative.contains(&word.as_str()) {
                negative += 1;
            }
        }

        let hits = positive + negative;
        if hits == 0 {
            return 0.0;
        }
        (positive as f64 - negative as f64) / hits as f64
    }

    fn topics(&self, text: &str) -> Vec<String> {
        let mut topics: Vec<String> = Vec::new();
        for word in words(text) {
            if word.chars().count() < 4
                || self.stopwords.contains(&word.as_str())
                || self.positive.contains(&word.as_str())
                || self.negative.contains(&word.as_str())
                || topics.contains(&word)
            {
                continue;
            }
            topics.push(word);
            if topics.len() == MAX_TOPICS {
                break;
            }
        }
        topics
    }
}

impl Default for LexiconAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentAnalyzer for LexiconAnalyzer {
    fn analyze(&self, text: &str) -> Analysis {
        let polarity = self.polarity(text);
        let sentiment = if polarity > POLARITY_THRESHOLD {
            Sentiment::Positive
        } else if polarity < -POLARITY_THRESHOLD {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        };

        Analysis {
            sentiment,
            topics: self.topics(text),
        }
    }
}

/// Analyzer that always returns the same result
#[derive(Debug, Clone, Default)]
pub struct FixedAnalyzer(pub Analysis);

impl SentimentAnalyzer for FixedAnalyzer {
    fn analyze(&self, _text: &str) -> Analysis {
        self.0.clone()
    }
}

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|w| !w.is_empty())
        .map(|w| w.trim_matches('\'').to_lowercase())
        .filter(|w| !w.is_empty())
}
