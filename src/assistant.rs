use anyhow::Result;

use crate::config::Config;
use crate::context;
use crate::persona::Persona;
use crate::provider::AIProviderClient;
use crate::store::PersonaStore;

/// Wires the persona lifecycle together for one process: explicit load on
/// startup, context assembly before each model call, record and save after.
/// Requests are issued one at a time; persona mutation and the snapshot
/// save happen strictly after the response arrives, so losing at most the
/// in-flight exchange on a crash.
pub struct Assistant {
    config: Config,
    store: PersonaStore,
    persona: Persona,
}

impl Assistant {
    pub fn new(config: Config) -> Result<Self> {
        let store = PersonaStore::new(config.data_dir.clone());

        let seed = &config.persona;
        let mut persona = Persona::new(
            seed.name.clone(),
            seed.description.clone(),
            seed.traits.clone(),
        )
        .with_learning_rate(seed.learning_rate);

        store.load(&mut persona)?;

        Ok(Assistant {
            config,
            store,
            persona,
        })
    }

    /// Send one question to the remote model, primed with the current
    /// persona context, then record the exchange and persist the full
    /// state. A model failure leaves the persona untouched and unsaved.
    pub async fn ask(
        &mut self,
        question: &str,
        provider: Option<String>,
        model: Option<String>,
    ) -> Result<String> {
        let ai_config = self.config.get_ai_config(provider, model)?;
        let client = AIProviderClient::new(ai_config);

        let prompt = context::build_prompt(&self.persona, question);
        let response = client.generate(&prompt).await?;

        self.persona.record_conversation(question, &response);
        self.store.save(&self.persona)?;

        Ok(response)
    }

    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    pub fn persona_mut(&mut self) -> &mut Persona {
        &mut self.persona
    }

    pub fn save(&self) -> Result<()> {
        self.store.save(&self.persona)?;
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_new_seeds_persona_from_config() {
        let dir = tempdir().unwrap();
        let config = Config::new(Some(dir.path().to_path_buf())).unwrap();
        let assistant = Assistant::new(config).unwrap();

        let persona = assistant.persona();
        assert_eq!(persona.name, "Nigel");
        assert_eq!(persona.personality_traits.len(), 2);
        assert!(persona.conversation_history.is_empty());
    }

    #[test]
    fn test_new_prefers_persisted_state_over_seed() {
        let dir = tempdir().unwrap();
        let config = Config::new(Some(dir.path().to_path_buf())).unwrap();

        {
            let mut assistant = Assistant::new(config.clone()).unwrap();
            assistant.persona_mut().add_fact("Dugongs are sirenians");
            assistant.persona_mut().personality_traits.clear();
            assistant.save().unwrap();
        }

        let assistant = Assistant::new(config).unwrap();
        let persona = assistant.persona();
        assert_eq!(persona.knowledge_base.facts, vec!["Dugongs are sirenians"]);
        // Seed traits were replaced wholesale by the loaded snapshot.
        assert!(persona.personality_traits.is_empty());
    }
}
