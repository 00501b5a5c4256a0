// src/models/ai.rs
// DOCUMENTATION: DTOs for the generative-AI integration
// PURPOSE: Typed contracts for LLM responses plus deterministic fallbacks

use serde::{Deserialize, Serialize};

/// Sentiment labels, most negative first
pub const SENTIMENTS: [&str; 5] = [
    "VERY_NEGATIVE",
    "NEGATIVE",
    "NEUTRAL",
    "POSITIVE",
    "VERY_POSITIVE",
];

/// Per-dimension scores extracted from review text (0-10)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryScores {
    #[serde(default)]
    pub taste: f32,
    #[serde(default)]
    pub service: f32,
    #[serde(default)]
    pub cleanliness: f32,
    #[serde(default)]
    pub price: f32,
    #[serde(default)]
    pub atmosphere: f32,
}

/// Structured review analysis returned by the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewAnalysis {
    /// Sentiment label: VERY_NEGATIVE..VERY_POSITIVE
    pub sentiment: String,

    /// Overall score 0-10
    #[serde(default)]
    pub score: f32,

    pub categories: CategoryScores,

    /// One-sentence summary of the review
    #[serde(default)]
    pub summary: String,

    /// Extracted topic tags
    #[serde(default)]
    pub tags: Vec<String>,

    /// Model confidence 0-1
    #[serde(default = "default_confidence")]
    pub confidence: f32,
}

fn default_confidence() -> f32 {
    0.5
}

impl ReviewAnalysis {
    /// Clamp every numeric field into its documented range and
    /// normalize unknown sentiment labels to NEUTRAL
    pub fn normalized(mut self) -> Self {
        if !SENTIMENTS.contains(&self.sentiment.as_str()) {
            self.sentiment = "NEUTRAL".to_string();
        }
        self.score = self.score.clamp(0.0, 10.0);
        self.confidence = self.confidence.clamp(0.0, 1.0);
        for value in [
            &mut self.categories.taste,
            &mut self.categories.service,
            &mut self.categories.cleanliness,
            &mut self.categories.price,
            &mut self.categories.atmosphere,
        ] {
            *value = value.clamp(0.0, 10.0);
        }
        self.tags.truncate(10);
        self
    }

    /// Deterministic analysis used when the model is unavailable
    /// DOCUMENTATION: Keyword sentiment over the (Turkish) review text,
    /// with the star rating as a prior. Mirrors the product's original
    /// heuristic so the review pipeline never blocks on the AI provider.
    pub fn fallback(content: &str, rating: i32) -> Self {
        let text = content.to_lowercase();

        let positive_words = [
            "harika", "mükemmel", "güzel", "lezzetli", "temiz", "hızlı", "kaliteli",
            "başarılı", "beğendim", "tavsiye", "great", "excellent", "delicious",
        ];
        let negative_words = [
            "kötü", "berbat", "yavaş", "pahalı", "kirli", "soğuk", "tatsız",
            "başarısız", "beğenmedim", "bad", "terrible", "awful",
        ];

        let positives = positive_words.iter().filter(|w| text.contains(*w)).count() as i32;
        let negatives = negative_words.iter().filter(|w| text.contains(*w)).count() as i32;

        let (sentiment, score) = if positives > negatives + 1 {
            if positives > 3 {
                ("VERY_POSITIVE", (6.0 + positives as f32 * 0.5).min(8.5))
            } else {
                ("POSITIVE", (6.0 + positives as f32 * 0.5).min(8.5))
            }
        } else if negatives > positives + 1 {
            if negatives > 3 {
                ("VERY_NEGATIVE", (5.0 - negatives as f32 * 0.7).max(2.0))
            } else {
                ("NEGATIVE", (5.0 - negatives as f32 * 0.7).max(2.0))
            }
        } else {
            // Fall back to the star rating as the signal
            match rating {
                5 => ("VERY_POSITIVE", 8.0),
                4 => ("POSITIVE", 7.0),
                3 => ("NEUTRAL", 5.0),
                2 => ("NEGATIVE", 3.5),
                _ => ("VERY_NEGATIVE", 2.0),
            }
        };

        let tag_rules: [(&str, &[&str]); 5] = [
            ("taste", &["lezzet", "tat", "yemek", "taste", "food"]),
            ("service", &["servis", "hizmet", "personel", "garson", "service"]),
            ("cleanliness", &["temiz", "hijyen", "kirli", "clean"]),
            ("price", &["fiyat", "ücret", "pahalı", "ucuz", "price"]),
            ("atmosphere", &["atmosfer", "ortam", "dekor", "müzik", "atmosphere"]),
        ];

        let mut tags = Vec::new();
        let mut categories = CategoryScores {
            taste: score,
            service: score,
            cleanliness: score,
            price: score,
            atmosphere: score,
        };
        for (tag, keywords) in tag_rules {
            if keywords.iter().any(|k| text.contains(k)) {
                tags.push(tag.to_string());
                // Mentioned dimensions get a small emphasis toward the sentiment
                let emphasized = if score >= 5.0 { score + 0.5 } else { score - 0.5 };
                match tag {
                    "taste" => categories.taste = emphasized.clamp(0.0, 10.0),
                    "service" => categories.service = emphasized.clamp(0.0, 10.0),
                    "cleanliness" => categories.cleanliness = emphasized.clamp(0.0, 10.0),
                    "price" => categories.price = emphasized.clamp(0.0, 10.0),
                    _ => categories.atmosphere = emphasized.clamp(0.0, 10.0),
                }
            }
        }

        ReviewAnalysis {
            sentiment: sentiment.to_string(),
            score,
            categories,
            summary: String::new(),
            tags,
            confidence: 0.5,
        }
    }
}

/// Structured interpretation of a natural-language search query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchIntent {
    /// Plain-language explanation of what the user is looking for
    #[serde(default)]
    pub interpretation: String,

    /// Intent label, e.g. find_restaurant, find_service, compare_options
    #[serde(default)]
    pub intent: String,

    /// Search terms extracted from the query
    #[serde(default)]
    pub search_terms: Vec<String>,

    /// Structured filters derived from the query
    #[serde(default)]
    pub filters: IntentFilters,

    /// Alternative search suggestions
    #[serde(default)]
    pub suggestions: Vec<String>,

    /// Model confidence 0-1
    #[serde(default = "default_confidence")]
    pub confidence: f32,
}

/// Filters the model may derive from a natural-language query
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntentFilters {
    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub open_now: Option<bool>,

    #[serde(default)]
    pub price_range: Option<Vec<String>>,

    #[serde(default)]
    pub min_rating: Option<f64>,

    /// Preferred search radius in kilometers
    #[serde(default)]
    pub radius_km: Option<f64>,
}

/// Query expansion for AI-enhanced keyword search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryExpansion {
    /// Expanded query with synonyms folded in
    pub enhanced_query: String,

    /// Related search strings to suggest to the user
    #[serde(default)]
    pub related_searches: Vec<String>,
}

/// Request body for POST /ai/analyze-review
#[derive(Debug, Deserialize, validator::Validate)]
pub struct AnalyzeReviewRequest {
    #[validate(length(min = 10, max = 2000))]
    pub review_text: String,

    #[serde(default)]
    pub business_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_clamps_ranges() {
        let analysis = ReviewAnalysis {
            sentiment: "ECSTATIC".to_string(),
            score: 42.0,
            categories: CategoryScores {
                taste: -3.0,
                service: 11.0,
                cleanliness: 5.0,
                price: 5.0,
                atmosphere: 5.0,
            },
            summary: String::new(),
            tags: (0..20).map(|i| format!("tag{}", i)).collect(),
            confidence: 3.0,
        }
        .normalized();

        assert_eq!(analysis.sentiment, "NEUTRAL");
        assert_eq!(analysis.score, 10.0);
        assert_eq!(analysis.categories.taste, 0.0);
        assert_eq!(analysis.categories.service, 10.0);
        assert_eq!(analysis.confidence, 1.0);
        assert_eq!(analysis.tags.len(), 10);
    }

    #[test]
    fn test_fallback_positive_keywords() {
        let analysis = ReviewAnalysis::fallback("Harika bir yer, lezzetli ve temiz. Servis hızlı.", 3);
        assert!(analysis.sentiment.contains("POSITIVE"));
        assert!(analysis.tags.contains(&"taste".to_string()));
        assert!(analysis.tags.contains(&"cleanliness".to_string()));
        assert!(analysis.score > 5.0);
    }

    #[test]
    fn test_fallback_negative_keywords() {
        let analysis = ReviewAnalysis::fallback("Berbat, kirli ve pahalı. Kötü bir deneyim, yavaş servis.", 3);
        assert!(analysis.sentiment.contains("NEGATIVE"));
        assert!(analysis.score < 5.0);
    }

    #[test]
    fn test_fallback_uses_rating_without_keywords() {
        let analysis = ReviewAnalysis::fallback("Bir kere geldim, sonra bir daha geldim.", 5);
        assert_eq!(analysis.sentiment, "VERY_POSITIVE");

        let analysis = ReviewAnalysis::fallback("Bir kere geldim, sonra bir daha geldim.", 1);
        assert_eq!(analysis.sentiment, "VERY_NEGATIVE");
    }
}
