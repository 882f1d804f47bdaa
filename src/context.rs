use crate::persona::Persona;

/// Only the most recent experiences are surfaced to the model.
const RECENT_EXPERIENCES: usize = 5;

/// Render the persona's identity and traits, in storage order.
pub fn personality_context(persona: &Persona) -> String {
    let mut context = format!("I am {}. {}\n\n", persona.name, persona.description);
    context.push_str("My personality traits:\n");
    for t in &persona.personality_traits {
        context.push_str(&format!(
            "- {}: {} (strength: {:.2})\n",
            t.name, t.description, t.strength
        ));
    }
    context
}

/// Render facts, preferences, and the last few experiences. Empty
/// collections are omitted entirely, headers included.
pub fn knowledge_context(persona: &Persona) -> String {
    let kb = &persona.knowledge_base;
    let mut context = String::from("My knowledge and preferences:\n");

    if !kb.facts.is_empty() {
        context.push_str("\nFacts I know:\n");
        for fact in &kb.facts {
            context.push_str(&format!("- {}\n", fact));
        }
    }

    if !kb.preferences.is_empty() {
        context.push_str("\nMy preferences:\n");
        for (topic, preference) in &kb.preferences {
            context.push_str(&format!("- {}: {}\n", topic, preference));
        }
    }

    if !kb.experiences.is_empty() {
        context.push_str("\nMy experiences:\n");
        let start = kb.experiences.len().saturating_sub(RECENT_EXPERIENCES);
        for exp in &kb.experiences[start..] {
            context.push_str(&format!("- {}\n", exp.description));
        }
    }

    context
}

/// The complete context block prepended to every model request.
pub fn full_context(persona: &Persona) -> String {
    format!(
        "{}\n{}",
        personality_context(persona),
        knowledge_context(persona)
    )
}

/// Frame the user's question with the persona context and an instruction
/// to stay in character.
pub fn build_prompt(persona: &Persona, question: &str) -> String {
    format!(
        "Context about who I am:\n{}\n\nUser's question: {}\n\nPlease respond as {}, \
         taking into account my personality traits and knowledge. Be consistent with my character.",
        full_context(persona),
        question,
        persona.name
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::{Experience, PersonalityTrait};

    fn bare_persona() -> Persona {
        Persona::new("Nigel", "A friendly AI assistant.", Vec::new())
    }

    #[test]
    fn test_personality_context_renders_traits_in_order() {
        let mut persona = bare_persona();
        persona.add_trait(PersonalityTrait::new("Friendliness", "Warm demeanor", 0.9, 0.8));
        persona.add_trait(PersonalityTrait::new("Knowledge", "Knows many domains", 0.8, 0.7));

        let context = personality_context(&persona);
        assert!(context.starts_with("I am Nigel. A friendly AI assistant.\n\n"));

        let friendliness = context.find("- Friendliness: Warm demeanor (strength: 0.90)").unwrap();
        let knowledge = context.find("- Knowledge: Knows many domains (strength: 0.80)").unwrap();
        assert!(friendliness < knowledge);
    }

    #[test]
    fn test_knowledge_context_omits_empty_sections() {
        let context = knowledge_context(&bare_persona());

        assert_eq!(context, "My knowledge and preferences:\n");
        assert!(!context.contains("Facts I know:"));
        assert!(!context.contains("My preferences:"));
        assert!(!context.contains("My experiences:"));
    }

    #[test]
    fn test_knowledge_context_renders_each_section() {
        let mut persona = bare_persona();
        persona.add_fact("Dugongs are sirenians");
        persona.add_preference("tea", "earl grey");
        persona.add_experience(Experience::new("Visited the reef"));

        let context = knowledge_context(&persona);
        assert!(context.contains("\nFacts I know:\n- Dugongs are sirenians\n"));
        assert!(context.contains("\nMy preferences:\n- tea: earl grey\n"));
        assert!(context.contains("\nMy experiences:\n- Visited the reef\n"));
    }

    #[test]
    fn test_knowledge_context_limits_to_last_five_experiences() {
        let mut persona = bare_persona();
        for i in 1..=7 {
            persona.add_experience(Experience::new(format!("experience {}", i)));
        }

        let context = knowledge_context(&persona);
        assert!(!context.contains("experience 1\n"));
        assert!(!context.contains("experience 2\n"));
        for i in 3..=7 {
            assert!(context.contains(&format!("- experience {}\n", i)));
        }
    }

    #[test]
    fn test_full_context_separates_blocks_with_blank_line() {
        let mut persona = bare_persona();
        persona.add_trait(PersonalityTrait::new("Friendliness", "Warm demeanor", 0.9, 0.8));

        let context = full_context(&persona);
        assert!(context.contains("(strength: 0.90)\n\nMy knowledge and preferences:\n"));
    }

    #[test]
    fn test_build_prompt_frames_question_in_character() {
        let persona = bare_persona();
        let prompt = build_prompt(&persona, "What are dugongs?");

        assert!(prompt.starts_with("Context about who I am:\nI am Nigel."));
        assert!(prompt.contains("\n\nUser's question: What are dugongs?\n\n"));
        assert!(prompt.contains("Please respond as Nigel"));
        assert!(prompt.ends_with("Be consistent with my character."));
    }
}
