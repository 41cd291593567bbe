//! Cross-field roadmap rules that a structural schema cannot express.
//!
//! Every check runs against a roadmap that already passed schema validation,
//! and [`check_all`] reports every violation rather than the first.

use crate::roadmap::Roadmap;
use crate::validation::{ValidationError, ViolationParams};

/// `weeks.len()` must equal `totalWeeks`.
pub fn check_week_count(roadmap: &Roadmap) -> Option<ValidationError> {
    let actual = roadmap.weeks.len();
    if i64::try_from(actual).is_ok_and(|n| n == roadmap.total_weeks) {
        return None;
    }
    Some(
        ValidationError::new(
            "/roadmap/totalWeeks",
            format!(
                "totalWeeks ({}) does not match number of weeks in array ({actual})",
                roadmap.total_weeks
            ),
        )
        .with_params(ViolationParams::CountMismatch {
            declared: roadmap.total_weeks,
            actual,
        }),
    )
}

/// Week `i` (zero-based) must be numbered `i + 1`, and no week may sit past
/// `totalWeeks`. Reported once for the whole array.
pub fn check_week_sequence(roadmap: &Roadmap) -> Option<ValidationError> {
    let in_sequence = roadmap.weeks.iter().enumerate().all(|(i, week)| {
        let expected = i as i64 + 1;
        expected <= roadmap.total_weeks && week.week_number == expected
    });
    if in_sequence {
        return None;
    }
    Some(ValidationError::new(
        "/roadmap/weeks",
        "Week numbers are not sequential starting from 1",
    ))
}

/// `totalEstimatedHours` must match the topic-level sum within `tolerance`.
pub fn check_hour_total(roadmap: &Roadmap, tolerance: f64) -> Option<ValidationError> {
    let computed = roadmap.computed_hours();
    let declared = roadmap.total_estimated_hours;
    if (computed - declared).abs() <= tolerance {
        return None;
    }
    Some(
        ValidationError::new(
            "/roadmap/totalEstimatedHours",
            format!(
                "totalEstimatedHours ({declared}) does not match calculated total ({computed})"
            ),
        )
        .with_params(ViolationParams::HourMismatch {
            declared,
            computed,
            tolerance,
        }),
    )
}

/// Every week's `title`, `weeklyGoal` and `sequencingExplanation` must have
/// non-whitespace content. One error per blank field.
pub fn check_week_text(roadmap: &Roadmap) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for (i, week) in roadmap.weeks.iter().enumerate() {
        let fields = [
            ("title", week.title.as_str(), "Week title cannot be empty"),
            ("weeklyGoal", week.weekly_goal.as_str(), "Weekly goal cannot be empty"),
            (
                "sequencingExplanation",
                week.sequencing_explanation.as_str(),
                "Sequencing explanation cannot be empty",
            ),
        ];
        for (name, value, message) in fields {
            if value.trim().is_empty() {
                errors.push(ValidationError::new(
                    format!("/roadmap/weeks/{i}/{name}"),
                    message,
                ));
            }
        }
    }
    errors
}

/// Run every rule in a fixed order: count, sequence, hours, text.
pub fn check_all(roadmap: &Roadmap, tolerance: f64) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    errors.extend(check_week_count(roadmap));
    errors.extend(check_week_sequence(roadmap));
    errors.extend(check_hour_total(roadmap, tolerance));
    errors.extend(check_week_text(roadmap));
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roadmap::{Topic, Week};

    fn week(number: i64, hours: &[f64]) -> Week {
        Week {
            week_number: number,
            title: format!("Week {number}"),
            topics: hours
                .iter()
                .map(|h| Topic {
                    name: "T".to_string(),
                    description: "D".to_string(),
                    estimated_hours: *h,
                    prerequisites: vec![],
                    resources: vec![],
                })
                .collect(),
            weekly_goal: "Goal".to_string(),
            sequencing_explanation: "Because".to_string(),
        }
    }

    fn roadmap(weeks: Vec<Week>, total_weeks: i64, total_hours: f64) -> Roadmap {
        Roadmap {
            weeks,
            total_weeks,
            total_estimated_hours: total_hours,
            overall_goal: "Goal".to_string(),
            prerequisite_analysis: "Analysis".to_string(),
        }
    }

    #[test]
    fn consistent_roadmap_has_no_errors() {
        let r = roadmap(vec![week(1, &[5.0]), week(2, &[5.0])], 2, 10.0);
        assert!(check_all(&r, 0.1).is_empty());
    }

    #[test]
    fn count_mismatch_carries_both_values() {
        let r = roadmap(vec![week(1, &[5.0]), week(2, &[5.0])], 3, 10.0);
        let err = check_week_count(&r).expect("count mismatch");
        assert_eq!(err.field, "/roadmap/totalWeeks");
        assert_eq!(
            err.params,
            Some(ViolationParams::CountMismatch {
                declared: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn sequence_rejects_gaps_duplicates_and_disorder() {
        for numbers in [[1, 3, 2], [1, 1, 2], [1, 2, 4], [0, 1, 2]] {
            let weeks = numbers.iter().map(|n| week(*n, &[1.0])).collect();
            let r = roadmap(weeks, 3, 3.0);
            let err = check_week_sequence(&r)
                .unwrap_or_else(|| panic!("{numbers:?} should be rejected"));
            assert_eq!(err.field, "/roadmap/weeks");
        }
    }

    #[test]
    fn sequence_rejects_weeks_past_declared_total() {
        let r = roadmap(vec![week(1, &[1.0]), week(2, &[1.0])], 1, 2.0);
        assert!(check_week_sequence(&r).is_some());
    }

    #[test]
    fn hour_total_within_tolerance_passes() {
        let r = roadmap(vec![week(1, &[9.95]), week(2, &[10.0])], 2, 20.0);
        assert!(check_hour_total(&r, 0.1).is_none());
    }

    #[test]
    fn hour_total_outside_tolerance_fails() {
        let r = roadmap(vec![week(1, &[9.0]), week(2, &[9.0])], 2, 20.0);
        let err = check_hour_total(&r, 0.1).expect("hour mismatch");
        assert_eq!(err.field, "/roadmap/totalEstimatedHours");
        assert!(err.message.contains("(20)"), "message: {}", err.message);
        assert!(err.message.contains("(18)"), "message: {}", err.message);
        assert_eq!(
            err.params,
            Some(ViolationParams::HourMismatch {
                declared: 20.0,
                computed: 18.0,
                tolerance: 0.1
            })
        );
    }

    #[test]
    fn tolerance_is_configurable() {
        let r = roadmap(vec![week(1, &[9.0])], 1, 10.0);
        assert!(check_hour_total(&r, 0.1).is_some());
        assert!(check_hour_total(&r, 1.0).is_none());
    }

    #[test]
    fn blank_text_is_reported_per_field() {
        let mut weeks = vec![week(1, &[1.0]), week(2, &[1.0])];
        weeks[1].weekly_goal = "   ".to_string();
        weeks[1].title = String::new();
        let r = roadmap(weeks, 2, 2.0);
        let errors = check_week_text(&r);
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["/roadmap/weeks/1/title", "/roadmap/weeks/1/weeklyGoal"]
        );
        assert_eq!(errors[1].message, "Weekly goal cannot be empty");
    }

    #[test]
    fn check_all_accumulates_in_rule_order() {
        let mut weeks = vec![week(2, &[1.0]), week(1, &[1.0])];
        weeks[0].sequencing_explanation = "\n".to_string();
        let r = roadmap(weeks, 3, 50.0);
        let fields: Vec<String> = check_all(&r, 0.1).into_iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "/roadmap/totalWeeks",
                "/roadmap/weeks",
                "/roadmap/totalEstimatedHours",
                "/roadmap/weeks/0/sequencingExplanation",
            ]
        );
    }
}
