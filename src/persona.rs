use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Oldest exchanges are evicted once the history grows past this.
pub const MAX_CONVERSATION_HISTORY: usize = 100;

const DEFAULT_LEARNING_RATE: f64 = 0.1;

/// One facet of the persona's character. `strength` is the current
/// intensity, `influence` its weight in shaping behavior; both nominally
/// live in [0,1] but are stored as given, without clamping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalityTrait {
    pub name: String,
    pub description: String,
    pub strength: f64,
    pub influence: f64,
}

impl PersonalityTrait {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        strength: f64,
        influence: f64,
    ) -> Self {
        PersonalityTrait {
            name: name.into(),
            description: description.into(),
            strength,
            influence,
        }
    }
}

/// A structured record of something the persona lived through. Only
/// `description` is rendered into context; any extra fields round-trip
/// through the flattened map untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl Experience {
    pub fn new(description: impl Into<String>) -> Self {
        Experience {
            description: description.into(),
            details: serde_json::Map::new(),
        }
    }
}

/// One user-message/AI-response pair with its capture time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub user_message: String,
    pub ai_response: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    #[serde(default)]
    pub facts: Vec<String>,
    #[serde(default)]
    pub preferences: IndexMap<String, String>,
    #[serde(default)]
    pub experiences: Vec<Experience>,
}

/// The named character profile injected into every model request.
///
/// Construction is pure; loading persisted state is an explicit
/// `PersonaStore::load` step so tests never touch the filesystem.
#[derive(Debug, Clone)]
pub struct Persona {
    pub name: String,
    pub description: String,
    pub personality_traits: Vec<PersonalityTrait>,
    pub knowledge_base: KnowledgeBase,
    pub conversation_history: Vec<Exchange>,
    pub learning_rate: f64,
}

impl Persona {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        personality_traits: Vec<PersonalityTrait>,
    ) -> Self {
        Persona {
            name: name.into(),
            description: description.into(),
            personality_traits,
            knowledge_base: KnowledgeBase::default(),
            conversation_history: Vec::new(),
            learning_rate: DEFAULT_LEARNING_RATE,
        }
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Add or reinforce a personality trait. A trait whose name is already
    /// present is blended toward the incoming values with an exponential
    /// moving average; its description is kept. New names are appended.
    pub fn add_trait(&mut self, incoming: PersonalityTrait) {
        let lr = self.learning_rate;
        match self
            .personality_traits
            .iter_mut()
            .find(|t| t.name == incoming.name)
        {
            Some(existing) => {
                existing.strength = (1.0 - lr) * existing.strength + lr * incoming.strength;
                existing.influence = (1.0 - lr) * existing.influence + lr * incoming.influence;
            }
            None => self.personality_traits.push(incoming),
        }
    }

    /// Append a fact unless it is already known. Returns whether the fact
    /// was new; first-seen order is preserved.
    pub fn add_fact(&mut self, fact: impl Into<String>) -> bool {
        let fact = fact.into();
        if self.knowledge_base.facts.contains(&fact) {
            return false;
        }
        self.knowledge_base.facts.push(fact);
        true
    }

    /// Set the preference for a topic, returning the previous value if the
    /// topic was already known.
    pub fn add_preference(
        &mut self,
        topic: impl Into<String>,
        preference: impl Into<String>,
    ) -> Option<String> {
        self.knowledge_base
            .preferences
            .insert(topic.into(), preference.into())
    }

    pub fn add_experience(&mut self, experience: Experience) {
        self.knowledge_base.experiences.push(experience);
    }

    /// Record one exchange stamped with the current time, then evict the
    /// oldest entries beyond the history cap.
    pub fn record_conversation(&mut self, user_message: &str, ai_response: &str) {
        self.conversation_history.push(Exchange {
            user_message: user_message.to_string(),
            ai_response: ai_response.to_string(),
            timestamp: Utc::now(),
        });

        if self.conversation_history.len() > MAX_CONVERSATION_HISTORY {
            let excess = self.conversation_history.len() - MAX_CONVERSATION_HISTORY;
            self.conversation_history.drain(..excess);
        }
    }
}
