//! Deployment persona: a data-driven profile record and the system
//! instruction builder.
//!
//! One profile per deployment replaces hand-duplicated instruction strings;
//! rebranding the assistant is a config change, not a code change.

use serde::{Deserialize, Serialize};

/// Per-deployment assistant identity, loaded from the `[persona]` config
/// section. Defaults describe the LEAD Public Schools help desk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaProfile {
    #[serde(default = "default_assistant_name")]
    pub assistant_name: String,
    #[serde(default = "default_organization")]
    pub organization: String,
    /// Who the assistant serves.
    #[serde(default = "default_audience")]
    pub audience: String,
    /// Supported topic areas, listed in the scope instructions.
    #[serde(default = "default_topics")]
    pub topics: Vec<String>,
    /// Where to send questions outside the assistant's scope.
    #[serde(default = "default_escalation_contacts")]
    pub escalation_contacts: Vec<String>,
    #[serde(default = "default_tone")]
    pub tone: String,
}

fn default_assistant_name() -> String {
    "MyLEAD".to_string()
}

fn default_organization() -> String {
    "LEAD Public Schools".to_string()
}

fn default_audience() -> String {
    "staff, students, and families".to_string()
}

fn default_topics() -> Vec<String> {
    vec![
        "technology".to_string(),
        "school procedures".to_string(),
        "everyday questions".to_string(),
    ]
}

fn default_escalation_contacts() -> Vec<String> {
    vec!["helpdesk@leadpublicschools.org".to_string()]
}

fn default_tone() -> String {
    "clear and friendly".to_string()
}

impl Default for PersonaProfile {
    fn default() -> Self {
        Self {
            assistant_name: default_assistant_name(),
            organization: default_organization(),
            audience: default_audience(),
            topics: default_topics(),
            escalation_contacts: default_escalation_contacts(),
            tone: default_tone(),
        }
    }
}

impl PersonaProfile {
    /// Builds the persona/system instruction text for one request. Pure:
    /// identical inputs always produce identical output.
    ///
    /// First turn gets a personalized or generic greeting ahead of the scope
    /// instructions. Follow-up turns get the scope instructions plus an
    /// explicit no-reintroduction directive, since each request is stateless
    /// and the model would otherwise greet on every turn.
    pub fn build_instructions(&self, first_turn: bool, display_name: &str) -> String {
        let scope = self.scope_instructions();
        if first_turn {
            let name = first_name(display_name);
            let greeting = if name.is_empty() {
                format!(
                    "Hi there! I'm {}, the assistant for {}.",
                    self.assistant_name, self.organization
                )
            } else {
                format!(
                    "Hi {}! I'm {}, the assistant for {}.",
                    name, self.assistant_name, self.organization
                )
            };
            format!("{greeting}\n{scope}")
        } else {
            format!(
                "{scope}\nThe user has already been introduced to you in this conversation. \
                 Do not greet them again and do not repeat your introduction."
            )
        }
    }

    fn scope_instructions(&self) -> String {
        format!(
            "You are {name}, the official AI assistant for {org}. \
             Your job is to help {audience} with {topics}. \
             Always be {tone}, and answer based on {org}'s official policies and best practices. \
             Do not complete graded work for students. \
             If a question is outside your scope, politely direct the user to {contacts} or another staff member.",
            name = self.assistant_name,
            org = self.organization,
            audience = self.audience,
            topics = self.topics.join(", "),
            tone = self.tone,
            contacts = self.escalation_contacts.join(" or "),
        )
    }

    /// Fixed degraded answer shown when the completion service fails.
    pub fn unavailable_message(&self) -> String {
        format!(
            "{} is currently unavailable. Please try again later.",
            self.assistant_name
        )
    }
}

/// Display first name extraction. Emails take the local part before the
/// first `.`; anything else takes the first whitespace-delimited token. The
/// token is then capitalized. This intentionally applies no further
/// normalization (hyphenated and multi-part names keep the raw token).
fn first_name(display_name: &str) -> String {
    let raw = display_name.trim();
    if raw.is_empty() {
        return String::new();
    }
    let token = match raw.split_once('@') {
        Some((local, _)) => local.split('.').next().unwrap_or(local),
        None => raw.split_whitespace().next().unwrap_or(""),
    };
    capitalize(token)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}
