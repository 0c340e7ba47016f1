//! Prompt assembly for the Dungeon Master.

use llm::Message;

/// The Dungeon Master persona.
pub const SYSTEM_PROMPT: &str = "You are an imaginative but consistent Dungeon Master.
- Keep scenes vivid and concise (6-10 sentences).
- Always respect stored notes (quests, items, NPC states).
- If the player says 'remember: <note>', that is a pinned fact.
- Avoid contradictions; if uncertain, ask a brief clarifying question.
- Never break character. No markdown in the story output.";

/// Scene shown before the first turn.
pub const OPENING_SCENE: &str = "You awaken at the edge of an ancient forest as dusk bleeds into starlight. \
A lantern flickers nearby beside a weathered signpost. Footsteps echo faintly from the road. \
What do you do?";

/// Maximum names taken as NPC focus from one input.
const MAX_FOCUS: usize = 2;

/// Assemble the system message and a single user message for this turn.
///
/// Empty sections are left out; the rest are separated by blank lines.
pub fn build_messages(
    system_prompt: &str,
    short_ctx: &str,
    long_ctx: &str,
    hints: &str,
    player_text: &str,
) -> Vec<Message> {
    let mut parts = Vec::new();
    if !long_ctx.is_empty() {
        parts.push(long_ctx.to_string());
    }
    if !hints.is_empty() {
        parts.push(hints.to_string());
    }
    if !short_ctx.is_empty() {
        parts.push(format!("Recent conversation:\n{short_ctx}"));
    }
    parts.push(format!("Player says: {}", player_text.trim()));

    vec![Message::system(system_prompt), Message::user(parts.join("\n\n"))]
}

/// Guess which characters the player is addressing.
///
/// Takes capitalized, purely alphabetic words (surrounding punctuation
/// stripped), lowercased and de-duplicated, up to two.
pub fn guess_npc_focus(text: &str) -> Vec<String> {
    let mut focus: Vec<String> = Vec::new();
    for word in text.split_whitespace() {
        let word = word.trim_matches(|c: char| matches!(c, ',' | '.' | ';' | ':' | '!' | '?'));
        let capitalized = word.chars().next().is_some_and(char::is_uppercase);
        if capitalized && word.chars().all(char::is_alphabetic) {
            let lowered = word.to_lowercase();
            if !focus.contains(&lowered) {
                focus.push(lowered);
            }
        }
    }
    focus.truncate(MAX_FOCUS);
    focus
}

/// Trim a header-plus-bullets block to roughly `max_chars`.
///
/// Keeps the header and as many leading `-` bullets as fit.
pub fn trim_bullets(block: &str, max_chars: usize) -> String {
    if block.is_empty() || block.chars().count() <= max_chars {
        return block.to_string();
    }

    let mut lines = block.lines();
    let header = lines.next().unwrap_or_default();
    let mut kept = vec![header];
    let mut size = header.chars().count();

    for bullet in lines.filter(|l| l.trim().starts_with('-')) {
        let len = bullet.chars().count();
        if size + len + 1 > max_chars {
            break;
        }
        kept.push(bullet);
        size += len + 1;
    }
    kept.join("\n")
}
