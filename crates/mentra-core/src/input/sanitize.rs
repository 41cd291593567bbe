//! Whitespace normalisation applied to a request before it is validated.

use serde_json::Value;

/// Return a trimmed copy of `raw`.
///
/// Trims `goal.subject`, `goal.specificObjective` and each skill's `name` and
/// `description`. A field is touched only when it is present and a string;
/// absent fields stay absent and non-string values are left for the schema
/// to report. The caller's value is never modified.
pub fn sanitize(raw: &Value) -> Value {
    let mut sanitized = raw.clone();

    if let Some(goal) = sanitized.get_mut("goal").and_then(Value::as_object_mut) {
        for key in ["subject", "specificObjective"] {
            trim_in_place(goal.get_mut(key));
        }
    }

    if let Some(skills) = sanitized.get_mut("skills").and_then(Value::as_array_mut) {
        for skill in skills.iter_mut().filter_map(Value::as_object_mut) {
            for key in ["name", "description"] {
                trim_in_place(skill.get_mut(key));
            }
        }
    }

    sanitized
}

fn trim_in_place(field: Option<&mut Value>) {
    if let Some(Value::String(s)) = field {
        let trimmed = s.trim();
        if trimmed.len() != s.len() {
            *s = trimmed.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn trims_goal_and_skill_strings() {
        let raw = json!({
            "skills": [{ "name": "  Python ", "level": "beginner", "description": "\tscripts\n" }],
            "goal": { "subject": " ML ", "specificObjective": " Build a classifier  ", "depth": "basic" }
        });
        let out = sanitize(&raw);
        assert_eq!(out["skills"][0]["name"], "Python");
        assert_eq!(out["skills"][0]["description"], "scripts");
        assert_eq!(out["goal"]["subject"], "ML");
        assert_eq!(out["goal"]["specificObjective"], "Build a classifier");
        // Caller's value is untouched.
        assert_eq!(raw["goal"]["subject"], " ML ");
    }

    #[test]
    fn leaves_absent_fields_absent() {
        let raw = json!({ "skills": [{ "name": "Rust " }], "goal": {} });
        let out = sanitize(&raw);
        assert!(out["skills"][0].get("description").is_none());
        assert!(out["goal"].get("subject").is_none());
    }

    #[test]
    fn leaves_non_strings_and_other_fields_alone() {
        let raw = json!({
            "skills": [{ "name": 7, "level": " beginner " }, "not an object"],
            "goal": { "subject": null, "depth": " basic " },
            "timeConstraints": { "preferredDays": [" monday "] }
        });
        let out = sanitize(&raw);
        assert_eq!(out, raw);
    }

    #[test]
    fn is_idempotent() {
        let raw = json!({
            "skills": [{ "name": "  Go", "level": "advanced", "description": " x " }],
            "goal": { "subject": " Systems ", "specificObjective": "Kernels ", "depth": "expert" }
        });
        let once = sanitize(&raw);
        assert_eq!(sanitize(&once), once);
    }

    #[test]
    fn tolerates_non_object_root() {
        assert_eq!(sanitize(&json!([1, 2])), json!([1, 2]));
        assert_eq!(sanitize(&Value::Null), Value::Null);
    }
}
