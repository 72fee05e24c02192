use serde::Serialize;
use tracing::debug;

use crate::fmt::money;
use crate::forecaster::OptimizationResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub message: String,
}

/// Turn an optimization result into user-facing alerts.
///
/// The budget-level alert always comes first, followed by one warning per
/// category whose projected spending exceeds its suggested allocation by
/// more than `overspend_factor`, in recommendation order.
pub fn derive_alerts(result: &OptimizationResult, overspend_factor: f64, currency: &str) -> Vec<Alert> {
    if !result.needs_optimization {
        return Vec::new();
    }
    let (Some(recommendations), Some(suggested)) = (&result.recommendations, result.suggested_budget) else {
        debug!("optimization result is missing data, no alerts");
        return Vec::new();
    };
    let current = result.current_budget;
    if current == 0.0 || suggested == 0.0 {
        return Vec::new();
    }

    let mut alerts = Vec::with_capacity(recommendations.len() + 1);
    if suggested < current {
        alerts.push(Alert {
            kind: AlertKind::Warning,
            message: format!(
                "Your spending patterns suggest you might be over-budgeting. \
                 Consider reducing your budget from {} to {}.",
                money(current, currency),
                money(suggested, currency)
            ),
        });
    } else {
        alerts.push(Alert {
            kind: AlertKind::Info,
            message: format!(
                "Based on your spending, you might need to increase your budget from {} to {}.",
                money(current, currency),
                money(suggested, currency)
            ),
        });
    }

    for rec in recommendations {
        if rec.current_spending > rec.suggested_allocation * overspend_factor {
            alerts.push(Alert {
                kind: AlertKind::Warning,
                message: format!(
                    "High spending in {}: {:.1}% of your budget. \
                     Consider reducing expenses in this category.",
                    rec.category, rec.percentage_of_budget
                ),
            });
        }
    }

    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecaster::Recommendation;

    fn rec(category: &str, current: f64, allocation: f64, pct: f64) -> Recommendation {
        Recommendation {
            category: category.to_string(),
            current_spending: current,
            suggested_allocation: allocation,
            percentage_of_budget: pct,
        }
    }

    fn needs(current: f64, suggested: f64, recs: Vec<Recommendation>) -> OptimizationResult {
        OptimizationResult {
            current_budget: current,
            suggested_budget: Some(suggested),
            recommendations: Some(recs),
            needs_optimization: true,
            error: None,
        }
    }

    #[test]
    fn test_no_alerts_without_optimization() {
        assert!(derive_alerts(&OptimizationResult::unchanged(2000.0), 1.2, "£").is_empty());
        assert!(derive_alerts(&OptimizationResult::failed(2000.0, "down"), 1.2, "£").is_empty());
    }

    #[test]
    fn test_no_alerts_with_missing_fields() {
        let mut result = needs(2000.0, 1100.0, vec![]);
        result.recommendations = None;
        assert!(derive_alerts(&result, 1.2, "£").is_empty());

        let mut result = needs(2000.0, 1100.0, vec![]);
        result.suggested_budget = None;
        assert!(derive_alerts(&result, 1.2, "£").is_empty());

        let result = needs(0.0, 1100.0, vec![]);
        assert!(derive_alerts(&result, 1.2, "£").is_empty());
    }

    #[test]
    fn test_over_budgeting_warning() {
        let result = needs(2000.0, 1100.0, vec![rec("Food", 200.0, 1100.0, 100.0)]);
        let alerts = derive_alerts(&result, 1.2, "£");
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::Warning);
        assert!(alerts[0].message.contains("£2,000.00"));
        assert!(alerts[0].message.contains("£1,100.00"));
    }

    #[test]
    fn test_increase_budget_info_then_category_warnings() {
        let result = needs(
            1000.0,
            2000.0,
            vec![
                rec("Housing", 2400.0, 1600.0, 80.0),
                rec("Food", 300.0, 300.0, 15.0),
                rec("Entertainment", 300.0, 100.0, 5.0),
            ],
        );
        let alerts = derive_alerts(&result, 1.2, "£");
        assert_eq!(alerts.len(), 3);
        assert_eq!(alerts[0].kind, AlertKind::Info);
        assert!(alerts[0].message.contains("increase"));
        assert_eq!(alerts[1].kind, AlertKind::Warning);
        assert!(alerts[1].message.contains("High spending in Housing: 80.0%"));
        assert!(alerts[2].message.contains("Entertainment: 5.0%"));
    }

    #[test]
    fn test_modest_overspend_is_quiet() {
        let result = needs(1000.0, 2000.0, vec![rec("Food", 110.0, 100.0, 5.0)]);
        let alerts = derive_alerts(&result, 1.2, "£");
        assert_eq!(alerts.len(), 1);
    }

    #[test]
    fn test_alert_serializes_with_type_field() {
        let alert = Alert {
            kind: AlertKind::Info,
            message: "hi".to_string(),
        };
        let json = serde_json::to_value(&alert).unwrap();
        assert_eq!(json["type"], "info");
    }
}
