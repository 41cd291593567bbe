//! Prompt construction from a validated request.
//!
//! [`PromptBuilder`] is the seam between validation and the model call.
//! [`DefaultPromptBuilder`] renders the request as plain text and supplies
//! a system instruction spelling out the JSON contract the output validator
//! enforces.

use crate::input::UserInput;

/// Turns a validated request into prompt text.
pub trait PromptBuilder: Send + Sync {
    /// Optional system instruction sent alongside the prompt.
    fn system_instruction(&self) -> Option<String>;

    /// Render the user prompt. Must be a pure function of `input`.
    fn build(&self, input: &UserInput) -> String;
}

const SYSTEM_INSTRUCTION: &str = r#"You are Mentra, an academic mentor that designs prerequisite-aware learning roadmaps.

Plan the learner's path week by week:
- Start from what the learner already knows and fill the gaps their goal requires.
- Order topics by dependency: no topic appears before the topics it builds on.
- Keep each week within the learner's weekly hours, with 3-5 topics per week.
- Explain in sequencingExplanation why each week's topics come in that order.

Respond with JSON only, no prose and no markdown, in exactly this shape:

{
  "roadmap": {
    "weeks": [
      {
        "weekNumber": 1,
        "title": "string",
        "topics": [
          {
            "name": "string",
            "description": "string",
            "estimatedHours": 5,
            "prerequisites": ["topic name"],
            "resources": [
              { "type": "book|course|video|article|tutorial|documentation", "title": "string", "url": "optional" }
            ]
          }
        ],
        "weeklyGoal": "string",
        "sequencingExplanation": "string"
      }
    ],
    "totalWeeks": 1,
    "totalEstimatedHours": 5,
    "overallGoal": "string",
    "prerequisiteAnalysis": "string"
  }
}

Rules the response is checked against:
- weeks has exactly totalWeeks entries, numbered 1, 2, 3, ... in order.
- totalEstimatedHours equals the sum of every topic's estimatedHours.
- title, weeklyGoal and sequencingExplanation are never empty."#;

/// The stock prompt builder.
#[derive(Debug, Clone, Default)]
pub struct DefaultPromptBuilder;

impl PromptBuilder for DefaultPromptBuilder {
    fn system_instruction(&self) -> Option<String> {
        Some(SYSTEM_INSTRUCTION.to_string())
    }

    fn build(&self, input: &UserInput) -> String {
        let skills = input
            .skills
            .iter()
            .map(|skill| match skill.description.as_deref() {
                Some(desc) if !desc.is_empty() => {
                    format!("- {} ({}): {desc}", skill.name, skill.level)
                }
                _ => format!("- {} ({})", skill.name, skill.level),
            })
            .collect::<Vec<_>>()
            .join("\n");

        let goal = &input.goal;
        let time = &input.time_constraints;

        let mut prompt = String::with_capacity(512);
        prompt.push_str("Please create a personalized learning roadmap with the following details:\n\n");
        prompt.push_str("User Skills:\n");
        prompt.push_str(&skills);
        prompt.push_str("\n\nLearning Goal:\n");
        prompt.push_str(&format!(
            "{} - {} (Depth: {})\n\n",
            goal.subject, goal.specific_objective, goal.depth
        ));
        prompt.push_str("Time Constraints:\n");
        prompt.push_str(&format!(
            "{} weeks, {} hours per week\n",
            time.total_weeks, time.hours_per_week
        ));
        if let Some(days) = time.preferred_days.as_ref().filter(|d| !d.is_empty()) {
            let days = days.iter().map(ToString::to_string).collect::<Vec<_>>();
            prompt.push_str(&format!("Preferred days: {}\n", days.join(", ")));
        }
        if let Some(start) = &time.start_date {
            prompt.push_str(&format!("Start date: {start}\n"));
        }
        prompt.push_str(
            "\nPlease generate a comprehensive, prerequisite-aware learning roadmap \
             that fits within these constraints.",
        );
        prompt
    }
}
