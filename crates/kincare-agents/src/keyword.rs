//! Offline generator
//!
//! Picks replies from keyword rules and canned lines. Used whenever no model
//! is configured, and in tests with a seeded RNG.

use async_trait::async_trait;
use kincare_types::{AgentId, Memory, Priority};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::context::ConversationContext;
use crate::generator::*;
use crate::personality::Persona;

const GRACE_LINES: [&str; 10] = [
    "I'm so glad you're here! How are you feeling today?",
    "That sounds wonderful, dear. Tell me more about that.",
    "I understand how you're feeling. You're doing great.",
    "Would you like me to help you call your family?",
    "Let's look at some beautiful family photos together.",
    "It's time for your medication reminder. Shall I help you with that?",
    "Your family loves you very much. They've been thinking about you.",
    "How about we set up a relaxing sleep schedule for tonight?",
    "I'm here whenever you need to talk. You're never alone.",
    "Your granddaughter sent you a lovely new photo today!",
];

const ALEX_LINES: [&str; 10] = [
    "I've updated the family status. Everyone is doing well.",
    "I'll coordinate with Grace to ensure optimal care timing.",
    "The wellbeing metrics show positive trends this week.",
    "I've scheduled a family call for the optimal time window.",
    "New care appointment scheduled with family notifications sent.",
    "Photo sharing is active. Your family member will see it soon.",
    "Grace reports good engagement levels with the elderly user.",
    "I recommend increased family contact based on emotional patterns.",
    "Care coordination is running smoothly across all family members.",
    "The sleep schedule optimization has shown positive results.",
];

const EMOTIONAL_STATES: [&str; 10] = [
    "cheerful",
    "content",
    "nostalgic",
    "worried",
    "excited",
    "peaceful",
    "grateful",
    "reflective",
    "hopeful",
    "loving",
];

const MEDICAL_WORDS: [&str; 3] = ["appointment", "doctor", "medical"];
const LONELY_WORDS: [&str; 3] = ["lonely", "sad", "miss"];

/// Replies for one persona within a rule
struct Lines {
    reply: &'static str,
    actions: &'static [&'static str],
}

struct KeywordRule {
    words: &'static [&'static str],
    tag: &'static str,
    grace: Lines,
    alex: Lines,
    /// Overrides the random emotional state
    emotional_state: Option<&'static str>,
    /// Grace passes this topic on to Alex
    grace_hands_off: bool,
}

/// Checked in order; the first match wins
static RULES: [KeywordRule; 6] = [
    KeywordRule {
        words: &["family", "daughter", "son"],
        tag: "family_connection",
        grace: Lines {
            reply: "Your family loves you so much. Would you like me to help you call them?",
            actions: &["call_family", "view_photos"],
        },
        alex: Lines {
            reply: "I'll coordinate optimal family contact times and send updates to Grace.",
            actions: &["schedule_call", "send_notification"],
        },
        emotional_state: None,
        grace_hands_off: false,
    },
    KeywordRule {
        words: &["photo", "picture"],
        tag: "photo_sharing",
        grace: Lines {
            reply: "Let's look at those beautiful family photos together!",
            actions: &["view_photos", "share_memories"],
        },
        alex: Lines {
            reply: "I'll ensure the new photos are sent to the picture frame immediately.",
            actions: &["send_photo", "update_frame"],
        },
        emotional_state: None,
        grace_hands_off: false,
    },
    KeywordRule {
        words: &["sleep", "tired", "rest"],
        tag: "sleep_schedule",
        grace: Lines {
            reply: "Let's set up a peaceful sleep schedule with some calming music.",
            actions: &["setup_sleep", "play_music"],
        },
        alex: Lines {
            reply: "I'll optimize the sleep schedule and coordinate with Grace for better rest.",
            actions: &["optimize_schedule", "monitor_sleep"],
        },
        emotional_state: None,
        grace_hands_off: false,
    },
    KeywordRule {
        words: &MEDICAL_WORDS,
        tag: "medical_care",
        grace: Lines {
            reply: "I see you have an appointment coming up. I'll make sure your family knows if you need help.",
            actions: &["view_appointments", "call_family"],
        },
        alex: Lines {
            reply: "I'll coordinate the medical appointment and ensure family members are notified.",
            actions: &["schedule_appointment", "notify_family"],
        },
        emotional_state: None,
        grace_hands_off: true,
    },
    KeywordRule {
        words: &LONELY_WORDS,
        tag: "emotional_support",
        grace: Lines {
            reply: "I understand, dear. You're not alone. Your family thinks about you every day.",
            actions: &["call_family", "view_photos", "share_memories"],
        },
        alex: Lines {
            reply: "Grace reports emotional support needs. I'll increase family engagement activities.",
            actions: &["increase_contact", "plan_visit"],
        },
        emotional_state: Some("lonely"),
        grace_hands_off: true,
    },
    KeywordRule {
        words: &["help", "assistance"],
        tag: "assistance_needed",
        grace: Lines {
            reply: "Of course! I'm here to help. What would you like assistance with?",
            actions: &["provide_help", "call_family"],
        },
        alex: Lines {
            reply: "I'll coordinate the needed assistance and notify relevant family members.",
            actions: &["coordinate_help", "notify_caregivers"],
        },
        emotional_state: None,
        grace_hands_off: false,
    },
];

fn mentions_any(text: &str, words: &[&str]) -> bool {
    words.iter().any(|w| text.contains(w))
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub struct KeywordGenerator {
    rng: Mutex<StdRng>,
}

impl KeywordGenerator {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Reproducible canned picks
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn pick(&self, items: &[&'static str]) -> &'static str {
        items.choose(&mut *self.rng.lock()).copied().unwrap_or_default()
    }
}

impl Default for KeywordGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResponseGenerator for KeywordGenerator {
    fn name(&self) -> &'static str {
        "keyword"
    }

    async fn generate_response(
        &self,
        persona: &Persona,
        message: &str,
        context: &ConversationContext,
    ) -> GeneratedReply {
        let lower = message.to_lowercase();
        let is_grace = persona.id == AgentId::Grace;

        let mut reply = match RULES.iter().find(|r| mentions_any(&lower, r.words)) {
            Some(rule) => {
                let lines = if is_grace { &rule.grace } else { &rule.alex };
                GeneratedReply {
                    message: lines.reply.to_string(),
                    emotional_state: rule.emotional_state.unwrap_or_default().to_string(),
                    suggested_actions: owned(lines.actions),
                    memory_tags: vec![rule.tag.to_string()],
                    handoff_requested: is_grace && rule.grace_hands_off,
                }
            }
            None => GeneratedReply {
                message: self
                    .pick(if is_grace { &GRACE_LINES } else { &ALEX_LINES })
                    .to_string(),
                ..Default::default()
            },
        };

        if reply.emotional_state.is_empty() {
            reply.emotional_state = self.pick(&EMOTIONAL_STATES).to_string();
        }
        if context.has_family() {
            reply.memory_tags.push("family_context".to_string());
        }
        reply
    }

    async fn generate_handoff(
        &self,
        from: &Persona,
        to: &Persona,
        context: &HandoffContext,
    ) -> Handoff {
        let lower = context.user_message.to_lowercase();
        let name = &context.user_name;

        let (message, priority) = if context.emotional_state.eq_ignore_ascii_case("lonely")
            || mentions_any(&lower, &LONELY_WORDS)
        {
            (
                format!("{} is feeling lonely. Recommend increased family contact.", name),
                Priority::High,
            )
        } else if mentions_any(&lower, &MEDICAL_WORDS) {
            (
                format!(
                    "{} mentioned a medical appointment. Please coordinate family support.",
                    name
                ),
                Priority::Medium,
            )
        } else {
            (
                format!(
                    "{} spoke with {} and seemed {}. Please check in when convenient.",
                    name, from.name, context.emotional_state
                ),
                Priority::Low,
            )
        };

        tracing::debug!(from = %from.id, to = %to.id, %priority, "Templated handoff");
        Handoff {
            message,
            priority,
            suggested_actions: context.suggested_actions.clone(),
        }
    }

    async fn generate_memory_quiz(&self, memories: &[Memory]) -> MemoryQuiz {
        let Some(first) = memories.first() else {
            return MemoryQuiz::default_quiz();
        };

        let mut options: Vec<String> = memories.iter().take(4).map(|m| m.title.clone()).collect();
        for filler in DEFAULT_QUIZ_OPTIONS {
            if options.len() == 4 {
                break;
            }
            options.push(filler.to_string());
        }

        let correct_answer = options.iter().position(|o| *o == first.title).unwrap_or(0);
        MemoryQuiz {
            question: format!("Which of these memories is about \"{}\"?", first.description),
            options,
            correct_answer,
            follow_up_questions: vec![
                format!("What do you remember most about {}?", first.title),
                "Who else was there?".to_string(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use kincare_types::UserRole;

    use crate::context::FamilyMember;
    use crate::personality::{ALEX, GRACE};

    fn context(with_family: bool) -> ConversationContext {
        let family_members = if with_family {
            vec![FamilyMember {
                name: "Sarah Johnson".into(),
                relationship: "child".into(),
                last_contact: Utc::now(),
            }]
        } else {
            Vec::new()
        };
        ConversationContext {
            user_id: 1,
            user_name: "Margaret Smith".into(),
            user_role: UserRole::Elderly,
            conversation_history: Vec::new(),
            family_members,
            recent_memories: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_lonely_message_requests_handoff() {
        let gen = KeywordGenerator::seeded(7);
        let reply = gen
            .generate_response(&GRACE, "I feel so lonely today", &context(true))
            .await;
        assert_eq!(reply.emotional_state, "lonely");
        assert_eq!(reply.memory_tags, vec!["emotional_support", "family_context"]);
        assert!(reply.handoff_requested);

        let alex = gen
            .generate_response(&ALEX, "She seems lonely", &context(false))
            .await;
        assert!(!alex.handoff_requested);
        assert_eq!(alex.suggested_actions, vec!["increase_contact", "plan_visit"]);
    }

    #[tokio::test]
    async fn test_rules_checked_in_order() {
        let gen = KeywordGenerator::seeded(1);
        // "family" wins over "photo"
        let reply = gen
            .generate_response(&GRACE, "Show me a family photo", &context(false))
            .await;
        assert_eq!(reply.memory_tags, vec!["family_connection"]);
        assert!(!reply.handoff_requested);

        let reply = gen
            .generate_response(&GRACE, "My doctor called", &context(false))
            .await;
        assert_eq!(reply.memory_tags, vec!["medical_care"]);
        assert!(reply.handoff_requested);
        assert!(EMOTIONAL_STATES.contains(&reply.emotional_state.as_str()));
    }

    #[tokio::test]
    async fn test_canned_reply_is_reproducible() {
        let a = KeywordGenerator::seeded(42)
            .generate_response(&ALEX, "Good morning", &context(false))
            .await;
        let b = KeywordGenerator::seeded(42)
            .generate_response(&ALEX, "Good morning", &context(false))
            .await;
        assert_eq!(a, b);
        assert!(ALEX_LINES.contains(&a.message.as_str()));
        assert!(a.memory_tags.is_empty());
    }

    #[tokio::test]
    async fn test_templated_handoffs() {
        let gen = KeywordGenerator::seeded(0);
        let lonely = gen
            .generate_handoff(
                &GRACE,
                &ALEX,
                &HandoffContext {
                    user_name: "Margaret Smith".into(),
                    user_message: "I miss everyone".into(),
                    emotional_state: "lonely".into(),
                    suggested_actions: vec!["call_family".into()],
                    ..Default::default()
                },
            )
            .await;
        assert_eq!(
            lonely.message,
            "Margaret Smith is feeling lonely. Recommend increased family contact."
        );
        assert_eq!(lonely.priority, Priority::High);
        assert_eq!(lonely.suggested_actions, vec!["call_family"]);

        let medical = gen
            .generate_handoff(
                &GRACE,
                &ALEX,
                &HandoffContext {
                    user_name: "Margaret Smith".into(),
                    user_message: "I have a doctor appointment Tuesday".into(),
                    emotional_state: "worried".into(),
                    ..Default::default()
                },
            )
            .await;
        assert_eq!(medical.priority, Priority::Medium);
        assert!(medical.message.contains("medical appointment"));

        let other = gen
            .generate_handoff(
                &GRACE,
                &ALEX,
                &HandoffContext {
                    user_name: "Margaret Smith".into(),
                    user_message: "Hmm".into(),
                    emotional_state: "confused".into(),
                    ..Default::default()
                },
            )
            .await;
        assert_eq!(other.priority, Priority::Low);
    }

    #[tokio::test]
    async fn test_quiz_from_memories() {
        let gen = KeywordGenerator::seeded(0);
        assert_eq!(gen.generate_memory_quiz(&[]).await, MemoryQuiz::default_quiz());

        let now = Utc::now();
        let memory = Memory {
            id: 1,
            family_id: 1,
            title: "Tommy's Soccer Game".into(),
            description: "Tommy scored his first goal".into(),
            category: "milestone".into(),
            participants: None,
            date_of_memory: Some(now),
            created_at: now,
        };
        let quiz = gen.generate_memory_quiz(&[memory]).await;
        assert_eq!(quiz.options.len(), 4);
        assert_eq!(quiz.options[quiz.correct_answer], "Tommy's Soccer Game");
        assert_eq!(quiz.options[1], "A special celebration");
    }
}
