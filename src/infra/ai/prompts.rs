//! System prompts and parsing of structured model replies.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;

use crate::domain::Community;

pub const CHAT_SYSTEM_PROMPT: &str = "You are the assistant of a community discovery platform. \
Help members find communities and events, explain how reputation points and badges work, \
and keep answers short and friendly. Do not invent communities that were not mentioned to you.";

pub const MODERATION_SYSTEM_PROMPT: &str = "You review user-generated posts for a community platform. \
Flag harassment, hate, sexual content involving minors, threats, self-harm encouragement, \
spam and scams. Reply with JSON only, shaped as \
{\"flagged\": bool, \"categories\": [string], \"reason\": string or null}.";

pub const RECOMMENDATION_SYSTEM_PROMPT: &str = "You match people with communities. \
Pick the communities that best fit the person's interests from the numbered list. \
Reply with JSON only, shaped as [{\"id\": \"<community id>\", \"reason\": \"<one sentence>\"}], \
best match first.";

static FENCED_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").expect("valid regex"));

static OBJECT_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("valid regex"));

static ARRAY_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\[.*\]").expect("valid regex"));

/// Parse JSON out of a model reply.
///
/// Tries the whole reply, then a fenced code block, then the widest
/// `[...]` and `{...}` spans. Returns `None` when nothing deserializes.
pub fn extract_json<T: DeserializeOwned>(reply: &str) -> Option<T> {
    let trimmed = reply.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }

    let fenced = FENCED_BLOCK
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str());

    fenced
        .into_iter()
        .chain(ARRAY_SPAN.find(trimmed).map(|m| m.as_str()))
        .chain(OBJECT_SPAN.find(trimmed).map(|m| m.as_str()))
        .find_map(|candidate| serde_json::from_str(candidate).ok())
}

/// User turn for the recommendation prompt
pub fn recommendation_request(
    interests: &[String],
    extra: Option<&str>,
    candidates: &[Community],
    limit: usize,
) -> String {
    let mut prompt = String::new();

    if interests.is_empty() {
        prompt.push_str("Interests: none listed\n");
    } else {
        prompt.push_str(&format!("Interests: {}\n", interests.join(", ")));
    }
    if let Some(extra) = extra.map(str::trim).filter(|e| !e.is_empty()) {
        prompt.push_str(&format!("Looking for: {}\n", extra));
    }

    prompt.push_str(&format!("\nPick up to {} of these communities:\n", limit));
    for (i, community) in candidates.iter().enumerate() {
        prompt.push_str(&format!(
            "{}. id={} | {} | category: {} | {}\n",
            i + 1,
            community.id,
            community.name,
            community.category,
            community.description
        ));
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Verdict {
        flagged: bool,
    }

    #[test]
    fn test_plain_json() {
        let v: Verdict = extract_json(r#"{"flagged": true}"#).unwrap();
        assert!(v.flagged);
    }

    #[test]
    fn test_fenced_json() {
        let reply = "Sure, here you go:\n```json\n{\"flagged\": false}\n```\nAnything else?";
        let v: Verdict = extract_json(reply).unwrap();
        assert!(!v.flagged);
    }

    #[test]
    fn test_embedded_array() {
        let reply = r#"My picks: [{"flagged": true}, {"flagged": false}] hope that helps"#;
        let v: Vec<Verdict> = extract_json(reply).unwrap();
        assert_eq!(v.len(), 2);
    }

    #[test]
    fn test_unparseable_reply() {
        assert!(extract_json::<Verdict>("I cannot help with that.").is_none());
        assert!(extract_json::<Verdict>("{not json}").is_none());
    }

    #[test]
    fn test_recommendation_request_lists_candidates() {
        let now = chrono::Utc::now();
        let community = Community {
            id: uuid::Uuid::nil(),
            name: "Night Owls Chess".into(),
            description: "Blitz after dark".into(),
            category: "games".into(),
            created_by: uuid::Uuid::nil(),
            created_at: now,
            updated_at: now,
        };
        let prompt = recommendation_request(&["chess".into()], Some("  "), &[community], 3);
        assert!(prompt.contains("Interests: chess"));
        assert!(!prompt.contains("Looking for"));
        assert!(prompt.contains("1. id=00000000-0000-0000-0000-000000000000 | Night Owls Chess"));
    }
}
