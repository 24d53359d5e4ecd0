//! Prompt for the battle recommendation.

/// Renders the matchup prompt for `wild` against the owned list.
///
/// The answer layout is fixed so clients can render the reply as markdown;
/// the reply itself is passed through without parsing.
pub fn battle_prompt(owned: &[String], wild: &str) -> String {
    let owned = owned.join(", ");

    format!(
        r#"You are an expert on the Nintendo game Pokémon Sword and Shield.
The Pokémon I currently own are: {owned}.
I just encountered a wild "{wild}".

Answer using exactly this format:

### Wild Pokémon Analysis ({wild})
*   **Type**: [e.g. Electric/Flying]
*   **Notable Abilities**: [e.g. Static, or an ability the Pokémon is known for in the game]
*   **Type Matchups**:
    *   Strong against: [e.g. Water, Flying]
    *   Weak against: [e.g. Ground]

### Battle Recommendation
*   **Recommended Pokémon**: [the name of the Pokémon from my list with the best advantage]
*   **Reason**: [a short explanation of why that Pokémon has the advantage]
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embeds_owned_list_and_wild_name() {
        let owned = vec!["Pikachu".to_string(), "Charmander".to_string()];
        let prompt = battle_prompt(&owned, "Geodude");

        assert!(prompt.contains("The Pokémon I currently own are: Pikachu, Charmander."));
        assert!(prompt.contains(r#"I just encountered a wild "Geodude"."#));
        assert!(prompt.contains("### Wild Pokémon Analysis (Geodude)"));
        assert!(prompt.contains("### Battle Recommendation"));
        assert!(prompt.contains("**Recommended Pokémon**"));
    }

    #[test]
    fn single_owned_pokemon_has_no_separator() {
        let prompt = battle_prompt(&["Eevee".to_string()], "Zubat");
        assert!(prompt.contains("own are: Eevee."));
    }
}
