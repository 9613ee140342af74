// Custom guild emoji lookup by team / org name
// Reads the live emoji list, nothing is cached

use poise::serenity_prelude as serenity;
use tracing::debug;

/// Expected custom emoji name for a team: every space becomes an underscore.
/// "Orion Esports" -> "Orion_Esports"
pub fn emoji_name_for_team(team_name: &str) -> String {
    team_name.replace(' ', "_")
}

/// Expected custom emoji name for an organization code: "MRC" -> "MRC"
pub fn emoji_name_for_org(org_code: &str) -> String {
    org_code
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

/// Exact, case-sensitive lookup of `key` in a collection of named things
pub fn find_by_name<'a, T>(
    items: impl IntoIterator<Item = &'a T>,
    key: &str,
    name_of: impl Fn(&T) -> &str,
) -> Option<&'a T>
where
    T: 'a,
{
    if key.is_empty() {
        return None;
    }
    items.into_iter().find(|item| name_of(item) == key)
}

/// Fetch the guild's current custom emojis. A failed fetch counts as "no emojis".
pub async fn guild_emojis(http: &serenity::Http, guild_id: serenity::GuildId) -> Vec<serenity::Emoji> {
    match guild_id.emojis(http).await {
        Ok(emojis) => emojis,
        Err(e) => {
            debug!("Failed to fetch emojis for guild {}: {:?}", guild_id, e);
            Vec::new()
        }
    }
}

/// Find the team's emoji in an already fetched emoji list
pub fn team_emoji<'a>(emojis: &'a [serenity::Emoji], team_name: &str) -> Option<&'a serenity::Emoji> {
    find_by_name(emojis, &emoji_name_for_team(team_name), |e| e.name.as_str())
}

/// Find the organization's emoji in an already fetched emoji list
pub fn org_emoji<'a>(emojis: &'a [serenity::Emoji], org_code: &str) -> Option<&'a serenity::Emoji> {
    find_by_name(emojis, &emoji_name_for_org(org_code), |e| e.name.as_str())
}

/// Render an optional emoji followed by a space, or nothing
pub fn emoji_prefix(emoji: Option<&serenity::Emoji>) -> String {
    emoji.map(|e| format!("{} ", e)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    #[test]
    fn test_emoji_name_for_team() {
        assert_eq!(emoji_name_for_team("Orion Esports"), "Orion_Esports");
        assert_eq!(emoji_name_for_team("A  B C"), "A__B_C");
        assert_eq!(emoji_name_for_team("Solo"), "Solo");
    }

    #[test]
    fn test_emoji_name_is_idempotent() {
        for name in ["Orion Esports", " lead", "trail ", "no_spaces", "x y z"] {
            let once = emoji_name_for_team(name);
            assert_eq!(emoji_name_for_team(&once), once);
            assert_eq!(once, name.replace(' ', "_"));
            assert!(!once.contains(' '));
        }
    }

    #[test]
    fn test_emoji_name_for_org() {
        assert_eq!(emoji_name_for_org(" MRC "), "MRC");
        assert_eq!(emoji_name_for_org("R.H.Q"), "RHQ");
    }

    #[test]
    fn test_find_by_name_is_exact() {
        let items = [Named("Orion_Esports"), Named("MRC")];

        let hit = find_by_name(&items, "Orion_Esports", |n| n.0);
        assert_eq!(hit.map(|n| n.0), Some("Orion_Esports"));

        assert!(find_by_name(&items, "orion_esports", |n| n.0).is_none());
        assert!(find_by_name(&items, "Orion", |n| n.0).is_none());
        assert!(find_by_name(&items, "", |n| n.0).is_none());
    }

    fn emoji(id: u64, name: &str) -> serenity::Emoji {
        serde_json::from_value(serde_json::json!({
            "id": id.to_string(),
            "name": name,
            "animated": false,
            "available": true,
            "managed": false,
            "require_colons": true,
            "roles": [],
            "user": null
        }))
        .unwrap()
    }

    #[test]
    fn test_team_and_org_emoji_lookup() {
        let emojis = vec![emoji(11, "Orion_Esports"), emoji(22, "MRC")];

        let hit = team_emoji(&emojis, "Orion Esports").unwrap();
        assert_eq!(hit.id, serenity::EmojiId::new(11));
        assert_eq!(emoji_prefix(Some(hit)), "<:Orion_Esports:11> ");

        assert_eq!(org_emoji(&emojis, " MRC ").map(|e| e.id), Some(serenity::EmojiId::new(22)));

        assert!(team_emoji(&emojis, "orion esports").is_none());
        assert!(team_emoji(&emojis, "Nova").is_none());
        assert!(org_emoji(&emojis, "RHQ").is_none());
        assert_eq!(emoji_prefix(team_emoji(&emojis, "Nova")), "");
    }

    #[test]
    fn test_emoji_prefix_without_emoji() {
        assert_eq!(emoji_prefix(None), "");
    }
}
