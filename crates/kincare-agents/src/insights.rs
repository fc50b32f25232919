//! Wellbeing and contact-time heuristics
//!
//! Pure functions over already-loaded records; `now` is passed in so the
//! results are testable.

use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Timelike, Utc, Weekday};
use kincare_types::{Conversation, FamilyConnection, Reminder};
use serde::Serialize;

pub const BASE_WELLBEING_SCORE: i32 = 70;
/// Tagged conversations that count towards the score
pub const SCORED_STATES: usize = 5;
const POSITIVE_STATES: [&str; 4] = ["happy", "excited", "content", "cheerful"];
const NEGATIVE_STATES: [&str; 5] = ["sad", "lonely", "anxious", "worried", "confused"];

const DEFAULT_CONTACT_HOUR: u32 = 15;
const DEFAULT_CONTACT_DAY: Weekday = Weekday::Sun;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyInsights {
    pub wellbeing_score: i32,
    pub recent_activity: String,
    pub suggestions: Vec<String>,
    pub alerts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSuggestion {
    pub suggested_time: DateTime<Utc>,
    pub reason: String,
    pub confidence: f64,
}

/// `conversations` newest first, `connections` in store order
pub fn family_insights(
    conversations: &[Conversation],
    connections: &[FamilyConnection],
    pending_reminders: &[Reminder],
    now: DateTime<Utc>,
) -> FamilyInsights {
    let states: Vec<String> = conversations
        .iter()
        .filter_map(|c| c.emotional_state.as_deref())
        .take(SCORED_STATES)
        .map(str::to_lowercase)
        .collect();
    let positive = states
        .iter()
        .filter(|s| POSITIVE_STATES.contains(&s.as_str()))
        .count() as i32;
    let negative = states
        .iter()
        .filter(|s| NEGATIVE_STATES.contains(&s.as_str()))
        .count() as i32;
    let wellbeing_score = (BASE_WELLBEING_SCORE + positive * 5 - negative * 10).clamp(0, 100);

    let mut suggestions = Vec::new();
    if negative > 2 {
        suggestions.push("Consider scheduling more frequent check-ins".to_string());
    }
    if conversations.len() < 3 {
        suggestions.push("Encourage more regular conversations".to_string());
    }
    if pending_reminders.len() > 3 {
        suggestions.push("Help with reminder management".to_string());
    }

    let mut alerts = Vec::new();
    if wellbeing_score < 40 {
        alerts.push("Wellbeing score is low - consider immediate contact".to_string());
    }
    if pending_reminders.len() > 5 {
        alerts.push("Multiple pending reminders - assistance may be needed".to_string());
    }
    let last_contact = connections.first().and_then(|c| c.last_contact_date);
    if last_contact.is_some_and(|t| now - t > Duration::days(7)) {
        alerts.push("No contact in over a week".to_string());
    }

    let recent_activity = if conversations.is_empty() {
        "Limited recent activity".to_string()
    } else {
        format!("{} conversations in recent days", conversations.len())
    };

    FamilyInsights {
        wellbeing_score,
        recent_activity,
        suggestions,
        alerts,
    }
}

/// Most frequent value; ties go to the one seen first
fn most_common<T: PartialEq + Copy>(values: impl Iterator<Item = T>) -> Option<T> {
    let mut counts: Vec<(T, usize)> = Vec::new();
    for v in values {
        match counts.iter_mut().find(|(seen, _)| *seen == v) {
            Some((_, n)) => *n += 1,
            None => counts.push((v, 1)),
        }
    }
    let best = counts.iter().map(|(_, n)| *n).max()?;
    counts.into_iter().find(|(_, n)| *n == best).map(|(v, _)| v)
}

/// Next `weekday` at `hour`:00 UTC strictly after `now`
pub fn next_occurrence(now: DateTime<Utc>, weekday: Weekday, hour: u32) -> DateTime<Utc> {
    let days_ahead = (weekday.num_days_from_sunday() + 7 - now.weekday().num_days_from_sunday()) % 7;
    let date = now.date_naive() + Duration::days(days_ahead as i64);
    let time = NaiveTime::from_hms_opt(hour.min(23), 0, 0).unwrap_or_default();
    let candidate = Utc.from_utc_datetime(&date.and_time(time));
    if candidate <= now {
        candidate + Duration::days(7)
    } else {
        candidate
    }
}

fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

pub fn contact_suggestion(conversations: &[Conversation], now: DateTime<Utc>) -> ContactSuggestion {
    let hour = most_common(conversations.iter().map(|c| c.timestamp.hour()))
        .unwrap_or(DEFAULT_CONTACT_HOUR);
    let day = most_common(conversations.iter().map(|c| c.timestamp.weekday()))
        .unwrap_or(DEFAULT_CONTACT_DAY);

    let confidence = (conversations.len() as f64 / 20.0 * 0.8 + 0.1).min(0.9);
    ContactSuggestion {
        suggested_time: next_occurrence(now, day, hour),
        reason: format!(
            "Based on conversation patterns, {} at {}:00 is typically a good time",
            day_name(day),
            hour
        ),
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kincare_types::{AgentId, Priority};

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn conversation(state: Option<&str>, timestamp: DateTime<Utc>) -> Conversation {
        Conversation {
            id: 0,
            user_id: 1,
            agent_id: AgentId::Grace,
            message: "hi".into(),
            response: None,
            emotional_state: state.map(str::to_string),
            timestamp,
            metadata: None,
        }
    }

    fn reminder(now: DateTime<Utc>) -> Reminder {
        Reminder {
            id: 0,
            user_id: 1,
            title: "Pills".into(),
            description: None,
            reminder_type: "medication".into(),
            scheduled_time: now,
            completed: false,
            priority: Priority::Medium,
            care_coordination: None,
            created_at: now,
        }
    }

    #[test]
    fn test_score_counts_first_five_tagged_states() {
        let now = at(2024, 6, 5, 12);
        let convs: Vec<_> = [
            Some("Sad"),
            None,
            Some("lonely"),
            Some("worried"),
            Some("happy"),
            Some("neutral"),
            // sixth tagged state, ignored
            Some("sad"),
        ]
        .into_iter()
        .map(|s| conversation(s, now))
        .collect();

        let insights = family_insights(&convs, &[], &[], now);
        assert_eq!(insights.wellbeing_score, 70 + 5 - 30);
        assert_eq!(
            insights.suggestions,
            vec!["Consider scheduling more frequent check-ins"]
        );
        assert_eq!(insights.recent_activity, "7 conversations in recent days");
    }

    #[test]
    fn test_score_is_clamped_and_alerts() {
        let now = at(2024, 6, 5, 12);
        let convs: Vec<_> = (0..5).map(|_| conversation(Some("sad"), now)).collect();
        let pending: Vec<_> = (0..6).map(|_| reminder(now)).collect();
        let stale = FamilyConnection {
            id: 1,
            elderly_user_id: 1,
            caregiver_user_id: 2,
            relationship_type: "child".into(),
            last_contact_date: Some(now - Duration::days(8)),
            contact_frequency: "weekly".into(),
            created_at: now,
        };

        let insights = family_insights(&convs, &[stale], &pending, now);
        assert_eq!(insights.wellbeing_score, 20);
        assert_eq!(insights.suggestions.len(), 2);
        assert_eq!(
            insights.alerts,
            vec![
                "Wellbeing score is low - consider immediate contact",
                "Multiple pending reminders - assistance may be needed",
                "No contact in over a week",
            ]
        );
    }

    #[test]
    fn test_quiet_user() {
        let insights = family_insights(&[], &[], &[], Utc::now());
        assert_eq!(insights.wellbeing_score, 70);
        assert_eq!(insights.recent_activity, "Limited recent activity");
        assert_eq!(insights.suggestions, vec!["Encourage more regular conversations"]);
        assert!(insights.alerts.is_empty());
    }

    #[test]
    fn test_contact_suggestion_defaults() {
        // Wednesday
        let now = at(2024, 6, 5, 12);
        let suggestion = contact_suggestion(&[], now);
        assert_eq!(suggestion.suggested_time, at(2024, 6, 9, 15));
        assert!((suggestion.confidence - 0.1).abs() < 1e-9);
        assert_eq!(
            suggestion.reason,
            "Based on conversation patterns, Sunday at 15:00 is typically a good time"
        );
    }

    #[test]
    fn test_contact_suggestion_from_history() {
        let now = at(2024, 6, 5, 12);
        // Two Wednesdays at 10:00, one Monday at 18:00
        let convs = vec![
            conversation(None, at(2024, 5, 29, 10)),
            conversation(None, at(2024, 5, 27, 18)),
            conversation(None, at(2024, 5, 22, 10)),
        ];
        let suggestion = contact_suggestion(&convs, now);
        // Wednesday 10:00 has already passed today
        assert_eq!(suggestion.suggested_time, at(2024, 6, 12, 10));
        assert!(suggestion.reason.contains("Wednesday at 10:00"));

        let many: Vec<_> = (0..40).map(|_| conversation(None, now)).collect();
        assert!((contact_suggestion(&many, now).confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_next_occurrence_later_today() {
        let now = at(2024, 6, 5, 9);
        assert_eq!(next_occurrence(now, Weekday::Wed, 10), at(2024, 6, 5, 10));
        assert_eq!(next_occurrence(now, Weekday::Wed, 9), at(2024, 6, 12, 9));
    }
}
