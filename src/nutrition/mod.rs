use serde::{Deserialize, Serialize};

/// Health profile sent alongside a search request. Every field is optional;
/// the builders below degrade to generic text when nothing is present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserProfile {
    pub id: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub gender: Option<String>,
    pub height: Option<String>,
    pub weight: Option<String>,
    pub birth_date: Option<String>,
    pub medical_history: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Portion {
    pub size: Option<f64>,
    pub unit: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Product {
    pub name: Option<String>,
    pub portion: Portion,
}

/// One row of a nutrition facts table. Units live inside `value` by
/// convention ("12 g").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NutritionFact {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

const NO_PROFILE_FALLBACK: &str =
    "No user profile data available. Use general assumptions and provide safe recommendations.";
const MINIMAL_PROFILE_FALLBACK: &str =
    "User profile is minimal. Provide general, safe recommendations.";
const FALLBACK_SEARCH_QUERY: &str = "healthier packaged alternative";

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Background context block for the prompt: one line per known field, never
/// fabricated, with fixed fallbacks when the profile is absent or empty.
pub fn build_user_profile_text(user: Option<&UserProfile>) -> String {
    let Some(user) = user else {
        return NO_PROFILE_FALLBACK.to_string();
    };

    let mut lines = Vec::new();
    if let Some(name) = non_empty(&user.full_name) {
        lines.push(format!("Name: {}", name));
    }
    if let Some(gender) = non_empty(&user.gender) {
        lines.push(format!("Gender: {}", gender));
    }
    if let Some(height) = non_empty(&user.height) {
        lines.push(format!("Height: {} cm", height));
    }
    if let Some(weight) = non_empty(&user.weight) {
        lines.push(format!("Weight: {} kg", weight));
    }
    if let Some(birth_date) = non_empty(&user.birth_date) {
        lines.push(format!("Birth date: {}", birth_date));
    }
    if let Some(history) = non_empty(&user.medical_history) {
        lines.push(format!("Medical history: {}", history));
    }

    if lines.is_empty() {
        return MINIMAL_PROFILE_FALLBACK.to_string();
    }
    lines.join("\n")
}

/// The model's explicit instruction, separate from the profile block.
pub fn build_user_query(medical_history: Option<&str>) -> String {
    match medical_history.map(str::trim).filter(|h| !h.is_empty()) {
        Some(history) => format!(
            "Consider this medical history when recommending alternatives: {}",
            history
        ),
        None => "Provide safe, general healthier alternatives.".to_string(),
    }
}

pub fn build_product_profile(product: &Product, facts: &[NutritionFact]) -> String {
    let mut lines = Vec::new();
    if let Some(name) = non_empty(&product.name) {
        lines.push(format!("Product: {}", name));
    }

    match product.portion.size {
        Some(size) => lines.push(format!("Serving size: {} {}", size, product.portion.unit)),
        None => lines.push(format!(
            "Serving size: {} (amount not provided)",
            product.portion.unit
        )),
    }

    let rows: Vec<String> = facts
        .iter()
        .filter_map(|fact| match (non_empty(&fact.label), non_empty(&fact.value)) {
            (Some(label), Some(value)) => Some(format!("- {}: {}", label, value)),
            (Some(label), None) => Some(format!("- {}", label)),
            (None, Some(value)) => Some(format!("- {}", value)),
            (None, None) => None,
        })
        .collect();

    if !rows.is_empty() {
        lines.push("Nutrition per serving:".to_string());
        lines.extend(rows);
    }

    lines.join("\n")
}

/// Free-text query driving the similarity search: user query, product name,
/// then each fact as "label value", joined by " ; ".
pub fn build_search_query(
    query: Option<&str>,
    product_name: Option<&str>,
    facts: &[NutritionFact],
) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(q) = query.map(str::trim).filter(|q| !q.is_empty()) {
        parts.push(q.to_string());
    }
    if let Some(name) = product_name.map(str::trim).filter(|n| !n.is_empty()) {
        parts.push(name.to_string());
    }
    for fact in facts {
        match (non_empty(&fact.label), non_empty(&fact.value)) {
            (Some(label), Some(value)) => parts.push(format!("{} {}", label, value)),
            (Some(label), None) => parts.push(label.to_string()),
            _ => {}
        }
    }

    if parts.is_empty() {
        FALLBACK_SEARCH_QUERY.to_string()
    } else {
        parts.join(" ; ")
    }
}

/// OCR variant: first 6 non-empty lines of the extracted text, joined with
/// spaces and capped at 500 characters.
pub fn build_ocr_search_query(markdown: &str) -> String {
    let snippet: String = markdown
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(6)
        .collect::<Vec<_>>()
        .join(" ");

    if snippet.is_empty() {
        return FALLBACK_SEARCH_QUERY.to_string();
    }
    snippet.chars().take(500).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fact(label: &str, value: &str) -> NutritionFact {
        NutritionFact {
            label: Some(label.to_string()),
            value: Some(value.to_string()),
        }
    }

    #[test]
    fn missing_profile_uses_fixed_fallback() {
        assert_eq!(
            build_user_profile_text(None),
            "No user profile data available. Use general assumptions and provide safe recommendations."
        );
    }

    #[test]
    fn empty_profile_uses_minimal_fallback() {
        let profile = UserProfile::default();
        assert_eq!(
            build_user_profile_text(Some(&profile)),
            "User profile is minimal. Provide general, safe recommendations."
        );
    }

    #[test]
    fn profile_lines_skip_absent_fields() {
        let profile = UserProfile {
            full_name: Some("Budi".to_string()),
            medical_history: Some("diabetes tipe 2".to_string()),
            ..Default::default()
        };
        assert_eq!(
            build_user_profile_text(Some(&profile)),
            "Name: Budi\nMedical history: diabetes tipe 2"
        );
    }

    #[test]
    fn user_query_embeds_history_verbatim() {
        let query = build_user_query(Some("hipertensi"));
        assert!(query.contains("hipertensi"));
        assert_eq!(
            build_user_query(None),
            "Provide safe, general healthier alternatives."
        );
    }

    #[test]
    fn product_profile_without_size_renders_unit_only_line() {
        let product = Product {
            name: None,
            portion: Portion {
                size: None,
                unit: "botol".to_string(),
            },
        };
        assert_eq!(
            build_product_profile(&product, &[]),
            "Serving size: botol (amount not provided)"
        );
    }

    #[test]
    fn product_profile_lists_facts_in_order() {
        let product = Product {
            name: Some("Teh Manis".to_string()),
            portion: Portion {
                size: Some(350.0),
                unit: "ml".to_string(),
            },
        };
        let facts = vec![fact("Gula", "27 g"), fact("Natrium", "40 mg")];
        assert_eq!(
            build_product_profile(&product, &facts),
            "Product: Teh Manis\nServing size: 350 ml\nNutrition per serving:\n- Gula: 27 g\n- Natrium: 40 mg"
        );
    }

    #[test]
    fn product_profile_skips_degenerate_facts() {
        let product = Product {
            name: None,
            portion: Portion {
                size: None,
                unit: "sachet".to_string(),
            },
        };
        let facts = vec![
            NutritionFact::default(),
            NutritionFact {
                label: Some("Serat".to_string()),
                value: None,
            },
        ];
        assert_eq!(
            build_product_profile(&product, &facts),
            "Serving size: sachet (amount not provided)\nNutrition per serving:\n- Serat"
        );
    }

    #[test]
    fn search_query_joins_with_delimiter() {
        let facts = vec![fact("Gula", "27 g")];
        assert_eq!(
            build_search_query(None, Some("Teh Manis"), &facts),
            "Teh Manis ; Gula 27 g"
        );
        assert_eq!(
            build_search_query(Some("minuman rendah gula"), None, &[]),
            "minuman rendah gula"
        );
    }

    #[test]
    fn empty_search_query_falls_back() {
        assert_eq!(
            build_search_query(None, None, &[]),
            "healthier packaged alternative"
        );
        assert_eq!(build_ocr_search_query(""), "healthier packaged alternative");
    }

    #[test]
    fn ocr_query_takes_first_non_empty_lines() {
        let markdown = "Teh Manis 350ml\n\nGula 27g\nNatrium 40mg";
        assert_eq!(
            build_ocr_search_query(markdown),
            "Teh Manis 350ml Gula 27g Natrium 40mg"
        );
    }

    #[test]
    fn ocr_query_is_capped_at_500_chars() {
        let long_line = "a".repeat(600);
        assert_eq!(build_ocr_search_query(&long_line).chars().count(), 500);
    }
}
