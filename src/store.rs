use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{PersonaError, Result};
use crate::persona::{Exchange, KnowledgeBase, Persona, PersonalityTrait};

/// Owns a persona's lifecycle against durable storage: one JSON snapshot
/// file per persona, keyed by the lowercased name. Every save is a full
/// overwrite; every load replaces the in-memory state wholesale.
pub struct PersonaStore {
    data_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct PersonaState {
    #[serde(default)]
    personality_traits: Vec<PersonalityTrait>,
    #[serde(default)]
    knowledge_base: KnowledgeBase,
    #[serde(default)]
    conversation_history: Vec<Exchange>,
}

#[derive(Serialize)]
struct PersonaStateRef<'a> {
    personality_traits: &'a [PersonalityTrait],
    knowledge_base: &'a KnowledgeBase,
    conversation_history: &'a [Exchange],
}

impl PersonaStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        PersonaStore {
            data_dir: data_dir.into(),
        }
    }

    pub fn state_file(&self, name: &str) -> PathBuf {
        self.data_dir
            .join(format!("{}_state.json", name.to_lowercase()))
    }

    /// Load persisted state into the persona, replacing its traits,
    /// knowledge base, and history. Returns false if no state file exists
    /// yet, leaving the construction-time values in place. A file that
    /// exists but cannot be parsed is a hard error; the persona is left
    /// untouched.
    pub fn load(&self, persona: &mut Persona) -> Result<bool> {
        let path = self.state_file(&persona.name);
        if !path.exists() {
            return Ok(false);
        }

        let content = fs::read_to_string(&path).map_err(PersonaError::StorageRead)?;
        let state: PersonaState = serde_json::from_str(&content)?;

        persona.personality_traits = state.personality_traits;
        persona.knowledge_base = state.knowledge_base;
        persona.conversation_history = state.conversation_history;

        Ok(true)
    }

    /// Write a full snapshot of the persona, overwriting any previous one.
    pub fn save(&self, persona: &Persona) -> Result<()> {
        fs::create_dir_all(&self.data_dir).map_err(PersonaError::StorageWrite)?;

        let state = PersonaStateRef {
            personality_traits: &persona.personality_traits,
            knowledge_base: &persona.knowledge_base,
            conversation_history: &persona.conversation_history,
        };

        let content = serde_json::to_string_pretty(&state)?;
        fs::write(self.state_file(&persona.name), content)
            .map_err(PersonaError::StorageWrite)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::Experience;
    use tempfile::tempdir;

    fn populated_persona() -> Persona {
        let mut persona = Persona::new(
            "Nigel",
            "A friendly AI assistant.",
            vec![PersonalityTrait::new("Friendliness", "Warm demeanor", 0.9, 0.8)],
        );
        persona.add_fact("Dugongs are sirenians");
        persona.add_preference("tea", "earl grey");
        persona.add_experience(Experience::new("Visited the reef"));
        persona.record_conversation("hello", "hello there");
        persona
    }

    #[test]
    fn test_state_file_is_keyed_by_lowercased_name() {
        let store = PersonaStore::new("/tmp/personas");
        assert!(store.state_file("Nigel").ends_with("nigel_state.json"));
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let store = PersonaStore::new(dir.path());

        let persona = populated_persona();
        store.save(&persona).unwrap();

        let mut reloaded = Persona::new("Nigel", "A friendly AI assistant.", Vec::new());
        assert!(store.load(&mut reloaded).unwrap());

        assert_eq!(reloaded.personality_traits, persona.personality_traits);
        assert_eq!(reloaded.knowledge_base, persona.knowledge_base);
        assert_eq!(reloaded.conversation_history, persona.conversation_history);
    }

    #[test]
    fn test_load_without_state_file_keeps_construction_values() {
        let dir = tempdir().unwrap();
        let store = PersonaStore::new(dir.path());

        let mut persona = populated_persona();
        assert!(!store.load(&mut persona).unwrap());
        assert_eq!(persona.personality_traits.len(), 1);
        assert_eq!(persona.knowledge_base.facts.len(), 1);
    }

    #[test]
    fn test_load_replaces_state_wholesale() {
        let dir = tempdir().unwrap();
        let store = PersonaStore::new(dir.path());

        let saved = Persona::new("Nigel", "A friendly AI assistant.", Vec::new());
        store.save(&saved).unwrap();

        // Construction-time traits not present in the file are discarded.
        let mut persona = populated_persona();
        assert!(store.load(&mut persona).unwrap());
        assert!(persona.personality_traits.is_empty());
        assert!(persona.knowledge_base.facts.is_empty());
        assert!(persona.conversation_history.is_empty());
    }

    #[test]
    fn test_load_malformed_file_fails_without_resetting() {
        let dir = tempdir().unwrap();
        let store = PersonaStore::new(dir.path());

        std::fs::write(store.state_file("Nigel"), "{ not json").unwrap();

        let mut persona = populated_persona();
        let err = store.load(&mut persona).unwrap_err();
        assert!(matches!(err, PersonaError::StorageParse(_)));
        assert_eq!(persona.personality_traits.len(), 1);
    }

    #[test]
    fn test_load_tolerates_unknown_fields() {
        let dir = tempdir().unwrap();
        let store = PersonaStore::new(dir.path());

        let content = r#"{
            "personality_traits": [],
            "knowledge_base": {"facts": ["known"], "preferences": {}, "experiences": []},
            "conversation_history": [],
            "schema_version": 2
        }"#;
        std::fs::write(store.state_file("Nigel"), content).unwrap();

        let mut persona = Persona::new("Nigel", "A friendly AI assistant.", Vec::new());
        assert!(store.load(&mut persona).unwrap());
        assert_eq!(persona.knowledge_base.facts, vec!["known"]);
    }

    #[test]
    fn test_save_overwrites_previous_snapshot() {
        let dir = tempdir().unwrap();
        let store = PersonaStore::new(dir.path());

        let mut persona = populated_persona();
        store.save(&persona).unwrap();

        persona.add_fact("Manatees are too");
        store.save(&persona).unwrap();

        let mut reloaded = Persona::new("Nigel", "A friendly AI assistant.", Vec::new());
        store.load(&mut reloaded).unwrap();
        assert_eq!(reloaded.knowledge_base.facts.len(), 2);
    }

    #[test]
    fn test_experience_extra_fields_round_trip() {
        let dir = tempdir().unwrap();
        let store = PersonaStore::new(dir.path());

        let content = r#"{
            "personality_traits": [],
            "knowledge_base": {
                "facts": [],
                "preferences": {},
                "experiences": [{"description": "met a diver", "location": "reef"}]
            },
            "conversation_history": []
        }"#;
        std::fs::write(store.state_file("Nigel"), content).unwrap();

        let mut persona = Persona::new("Nigel", "A friendly AI assistant.", Vec::new());
        store.load(&mut persona).unwrap();

        let exp = &persona.knowledge_base.experiences[0];
        assert_eq!(exp.description, "met a diver");
        assert_eq!(exp.details.get("location").unwrap(), "reef");

        store.save(&persona).unwrap();
        let raw = std::fs::read_to_string(store.state_file("Nigel")).unwrap();
        assert!(raw.contains("\"location\""));
    }
}
