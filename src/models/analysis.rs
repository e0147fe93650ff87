use super::transaction::Transaction;
use serde::{Deserialize, Deserializer, Serialize};

// Trend and priority labels are written by a language model; anything it
// invents (or capitalises) lands in `Unknown` instead of failing the report.
fn deserialize_label<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendKind {
    Increase,
    Decrease,
    Stable,
    #[default]
    Unknown,
}

impl<'de> Deserialize<'de> for TrendKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match deserialize_label(deserializer)?.as_str() {
            "increase" => TrendKind::Increase,
            "decrease" => TrendKind::Decrease,
            "stable" => TrendKind::Stable,
            _ => TrendKind::Unknown,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
    #[default]
    Unknown,
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match deserialize_label(deserializer)?.as_str() {
            "high" => Priority::High,
            "medium" => Priority::Medium,
            "low" => Priority::Low,
            _ => Priority::Unknown,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    #[serde(rename = "type", default)]
    pub kind: TrendKind,
    pub category: String,
    pub change: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetHealth {
    pub score: i32,
    pub status: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    #[serde(default)]
    pub month: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub trends: Vec<Trend>,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
    #[serde(default)]
    pub budget_health: Option<BudgetHealth>,
}

#[derive(Debug, Serialize)]
pub struct AnalysisRequest<'a> {
    pub transactions: &'a [Transaction],
    pub month: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_from_server_payload() {
        let json = r#"{
            "month": "2024-02",
            "summary": "Spending went up",
            "trends": [{"type": "increase", "category": "Food",
                        "change": "+12%", "description": "More delivery"}],
            "recommendations": [{"title": "Cook", "description": "Cook twice a week",
                                 "priority": "high"}],
            "budgetHealth": {"score": 72, "status": "good", "description": "Within budget"}
        }"#;
        let report: AnalysisReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.trends[0].kind, TrendKind::Increase);
        assert_eq!(report.recommendations[0].priority, Priority::High);
        assert_eq!(report.budget_health.unwrap().score, 72);
    }

    #[test]
    fn test_unexpected_labels_keep_the_history() {
        let json = r#"[
            {"month": "2024-02", "summary": "ok",
             "recommendations": [{"title": "Save", "description": "d", "priority": "High"}],
             "trends": [{"type": "spike", "category": "Food",
                         "change": "+40%", "description": "d"}]},
            {"month": "2024-03", "summary": "fine",
             "recommendations": [{"title": "Relax", "description": "d", "priority": "critical"},
                                 {"title": "Plan", "description": "d"}]}
        ]"#;
        let history: Vec<AnalysisReport> = serde_json::from_str(json).unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].recommendations[0].priority, Priority::High);
        assert_eq!(history[0].trends[0].kind, TrendKind::Unknown);
        assert_eq!(history[1].recommendations[0].priority, Priority::Unknown);
        assert_eq!(history[1].recommendations[1].priority, Priority::Unknown);
    }
}
