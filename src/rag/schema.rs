//! The structured contract for model output. Parsing is strict (unknown
//! fields rejected, wrong primitive shapes rejected) and `RagAnswer::validate`
//! applies the cross-field rules; a single failure rejects the whole answer.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Summary text required when (and only when) no alternative was found.
pub const NO_ALTERNATIVE_SENTINEL: &str = "Tidak ada alternatif yang sesuai.";

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Model did not return valid JSON: {reason}. Cleaned snippet: {snippet}")]
    InvalidJson { reason: String, snippet: String },
    #[error("is_safe is null but no reasons were given")]
    MissingSafetyReasons,
    #[error("recommendation ranks must be 1..={expected} in order, got {found:?}")]
    NonContiguousRanks { expected: usize, found: Vec<u32> },
    #[error("duplicate recommendation: brand '{brand}', category '{category}'")]
    DuplicateRecommendation { brand: String, category: String },
    #[error("summary must be exactly \"Tidak ada alternatif yang sesuai.\" when recommendations are empty")]
    MissingNoAlternativeSummary,
    #[error("summary claims no suitable alternative although recommendations are present")]
    ContradictorySummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProductType {
    #[serde(rename = "minuman")]
    Minuman,
    #[serde(rename = "makanan")]
    Makanan,
    #[serde(rename = "tidak_diketahui")]
    TidakDiketahui,
}

impl<'de> Deserialize<'de> for ProductType {
    // Normalize before matching: trim, lowercase, spaces to underscores, and
    // the "tidakdiketahui" alias some models emit.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        let mut value = raw.trim().to_lowercase().replace(' ', "_");
        if value == "tidakdiketahui" {
            value = "tidak_diketahui".to_string();
        }
        match value.as_str() {
            "minuman" => Ok(ProductType::Minuman),
            "makanan" => Ok(ProductType::Makanan),
            "tidak_diketahui" => Ok(ProductType::TidakDiketahui),
            _ => Err(serde::de::Error::custom(format!(
                "unknown product_type '{}'",
                raw
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductAssessment {
    pub product_type: ProductType,
    /// `None` means "insufficient information"; `reasons` must then explain
    /// what is missing.
    pub is_safe: Option<bool>,
    pub reasons: Vec<String>,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NutritionSummary {
    pub sugar_g_100g: Option<f64>,
    pub sodium_mg_100g: Option<f64>,
    pub protein_g_100g: Option<f64>,
    pub fiber_g_100g: Option<f64>,
    pub fat_sat_g_100g: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Recommendation {
    pub rank: u32,
    pub brand: String,
    pub category: String,
    pub reasons: Vec<String>,
    pub nutrition: NutritionSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RagAnswer {
    pub product_assessment: ProductAssessment,
    pub recommendations: Vec<Recommendation>,
    pub summary: String,
}

/// Tagged view of a validated answer, so callers never have to compare the
/// summary string against the sentinel themselves.
#[derive(Debug, PartialEq)]
pub enum Outcome<'a> {
    NoneFound,
    Recommended(&'a [Recommendation]),
}

impl RagAnswer {
    /// Cross-field rules, applied in one short-circuiting pass. Structural
    /// shape and enum normalization are already settled by serde at this
    /// point.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.product_assessment.is_safe.is_none()
            && self.product_assessment.reasons.iter().all(|r| r.trim().is_empty())
        {
            return Err(SchemaError::MissingSafetyReasons);
        }

        let ranks: Vec<u32> = self.recommendations.iter().map(|r| r.rank).collect();
        let contiguous = ranks
            .iter()
            .enumerate()
            .all(|(i, &rank)| rank as usize == i + 1);
        if !contiguous {
            return Err(SchemaError::NonContiguousRanks {
                expected: ranks.len(),
                found: ranks,
            });
        }

        let mut seen = std::collections::HashSet::new();
        for rec in &self.recommendations {
            let key = (
                rec.brand.trim().to_lowercase(),
                rec.category.trim().to_lowercase(),
            );
            if !seen.insert(key) {
                return Err(SchemaError::DuplicateRecommendation {
                    brand: rec.brand.clone(),
                    category: rec.category.clone(),
                });
            }
        }

        let says_none_found = self.summary.trim() == NO_ALTERNATIVE_SENTINEL;
        if self.recommendations.is_empty() && !says_none_found {
            return Err(SchemaError::MissingNoAlternativeSummary);
        }
        if !self.recommendations.is_empty() && says_none_found {
            return Err(SchemaError::ContradictorySummary);
        }

        Ok(())
    }

    pub fn outcome(&self) -> Outcome<'_> {
        if self.recommendations.is_empty() {
            Outcome::NoneFound
        } else {
            Outcome::Recommended(&self.recommendations)
        }
    }
}
