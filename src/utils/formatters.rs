// Formatting and parsing helpers for modal input and embeds

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::utils::config::paris_local_to_utc;

static TIMESTAMP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^<t:(\d+)(?::[tTdDfFR])?>$").expect("valid regex"));
static USER_MENTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<@!?(\d+)>").expect("valid regex"));
static SNOWFLAKE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{15,20})").expect("valid regex"));
static FLAG_ALIAS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^:flag_([a-z]{2}):$").expect("valid regex"));

/// Common country names -> ISO-2 codes
static COUNTRY_CODES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("france", "FR"),
        ("french", "FR"),
        ("germany", "DE"),
        ("deutschland", "DE"),
        ("serbia", "RS"),
        ("spain", "ES"),
        ("hungary", "HU"),
        ("italy", "IT"),
        ("portugal", "PT"),
        ("netherlands", "NL"),
        ("holland", "NL"),
        ("belgium", "BE"),
        ("switzerland", "CH"),
        ("austria", "AT"),
        ("sweden", "SE"),
        ("norway", "NO"),
        ("denmark", "DK"),
        ("finland", "FI"),
        ("poland", "PL"),
        ("czech republic", "CZ"),
        ("czechia", "CZ"),
        ("romania", "RO"),
        ("bulgaria", "BG"),
        ("greece", "GR"),
        ("turkey", "TR"),
        ("ukraine", "UA"),
        ("russia", "RU"),
        ("united kingdom", "GB"),
        ("uk", "GB"),
        ("england", "GB"),
        ("scotland", "GB"),
        ("wales", "GB"),
        ("ireland", "IE"),
        ("united states", "US"),
        ("usa", "US"),
        ("canada", "CA"),
        ("mexico", "MX"),
        ("brazil", "BR"),
        ("argentina", "AR"),
        ("chile", "CL"),
        ("colombia", "CO"),
        ("peru", "PE"),
        ("japan", "JP"),
        ("china", "CN"),
        ("south korea", "KR"),
        ("korea", "KR"),
        ("india", "IN"),
        ("australia", "AU"),
        ("new zealand", "NZ"),
        ("saudi arabia", "SA"),
        ("morocco", "MA"),
        ("tunisia", "TN"),
        ("algeria", "DZ"),
        ("egypt", "EG"),
        ("south africa", "ZA"),
    ])
});

/// Discord timestamp markup, e.g. `<t:1739300400:t>`
pub fn discord_timestamp(dt: DateTime<Utc>, style: char) -> String {
    format!("<t:{}:{}>", dt.timestamp(), style)
}

/// Turn user input into a full-date Discord timestamp.
/// Accepts `<t:...>`, unix seconds, `YYYY-MM-DD` and `YYYY-MM-DD HH:MM` (Paris time).
/// Anything else is shown as typed.
pub fn to_discord_timestamp(raw: &str) -> Option<String> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(caps) = TIMESTAMP_RE.captures(s) {
        return Some(format!("<t:{}:F>", &caps[1]));
    }
    if s.chars().all(|c| c.is_ascii_digit()) {
        return Some(format!("<t:{}:F>", s));
    }

    let normalized = s.replace('/', "-");
    let local = NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%d %H:%M")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        });

    Some(match local {
        Some(local) => discord_timestamp(paris_local_to_utc(local), 'F'),
        None => s.to_string(),
    })
}

/// Split `Entry | Prize | Date & time` (`/` also works as separator).
/// Extra separators stay in the date part.
pub fn split_entry_prize_and_time(raw: &str) -> Option<(String, String, String)> {
    let s = raw.trim();
    let sep = if s.contains('|') {
        '|'
    } else if s.contains('/') {
        '/'
    } else {
        return None;
    };

    let mut parts = s.splitn(3, sep).map(str::trim);
    let entry = parts.next()?.to_string();
    let prize = parts.next()?.to_string();
    let when = parts.next()?.to_string();

    if entry.is_empty() || prize.is_empty() || when.is_empty() {
        return None;
    }
    Some((entry, prize, when))
}

/// Euro amount as shown in embeds: `10€`, `12.5€` or `-`
pub fn format_eur(amount: Option<f64>) -> String {
    match amount {
        Some(v) if v.fract() == 0.0 => format!("{}€", v as i64),
        Some(v) => format!("{}€", v),
        None => "-".to_string(),
    }
}

/// Markdown link labelled "URL", or `-` when empty
pub fn link_or_dash(url: &str) -> String {
    let url = url.trim();
    if url.is_empty() {
        "-".to_string()
    } else {
        format!("[URL]({})", url)
    }
}

/// Read a Discord user id from a mention, a bare id or a longer text
pub fn extract_user_id(raw: &str) -> Option<String> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Some(caps) = USER_MENTION_RE.captures(s) {
        return Some(caps[1].to_string());
    }
    if s.chars().all(|c| c.is_ascii_digit()) {
        return Some(s.to_string());
    }
    SNOWFLAKE_RE.captures(s).map(|caps| caps[1].to_string())
}

/// Regional-indicator flag for an ISO-2 country code
pub fn flag_from_iso2(code: &str) -> Option<String> {
    let code = code.trim().to_ascii_uppercase();
    if code.len() != 2 || !code.chars().all(|c| c.is_ascii_uppercase()) {
        return None;
    }
    code.chars()
        .map(|c| char::from_u32(0x1F1E6 + (c as u32 - 'A' as u32)))
        .collect()
}

fn is_regional_indicator(c: char) -> bool {
    ('\u{1F1E6}'..='\u{1F1FF}').contains(&c)
}

/// Flag from a pasted flag emoji, `:flag_fr:`, `FR` or a common country name
pub fn country_to_flag(raw: &str) -> Option<String> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if s.chars().count() <= 4 && s.chars().any(is_regional_indicator) {
        return Some(s.to_string());
    }
    if let Some(caps) = FLAG_ALIAS_RE.captures(s) {
        return flag_from_iso2(&caps[1]);
    }
    if s.len() == 2 && s.chars().all(|c| c.is_ascii_alphabetic()) {
        return flag_from_iso2(s);
    }

    let name = s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    COUNTRY_CODES.get(name.as_str()).and_then(|code| flag_from_iso2(code))
}

/// Parse a roster, one `<id or mention> <country>` per line (either order).
/// Returns lines like `🇫🇷 <@123>` or a user-facing error.
pub fn parse_roster(raw: &str) -> Result<Vec<String>, String> {
    let mut out = Vec::new();

    for line in raw.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let uid = extract_user_id(line)
            .ok_or_else(|| format!("Couldn't read a Discord user id from: `{}`", line))?;

        let without_mention = USER_MENTION_RE.replace_all(line, "");
        let rest = without_mention.trim().replacen(&uid, "", 1);
        let rest = rest.trim();
        if rest.is_empty() {
            return Err(format!("Missing country for: `<@{}>` (line: `{}`)", uid, line));
        }

        let flag = country_to_flag(rest).ok_or_else(|| {
            format!(
                "Couldn't read a country/flag from: `{}`.\n\
                Use `FR`, `:flag_fr:`, or `🇫🇷` (or a common country name like `France`).",
                rest
            )
        })?;

        out.push(format!("{} <@{}>", flag, uid));
    }

    if out.is_empty() {
        return Err("Roster is required (at least 1 player line).".to_string());
    }
    Ok(out)
}

/// Truncate string to max characters with ellipsis
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max_chars.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_to_discord_timestamp() {
        assert_eq!(to_discord_timestamp(""), None);
        assert_eq!(
            to_discord_timestamp("<t:1739300400:R>"),
            Some("<t:1739300400:F>".to_string())
        );
        assert_eq!(
            to_discord_timestamp("1739300400"),
            Some("<t:1739300400:F>".to_string())
        );

        let expected = Utc.with_ymd_and_hms(2026, 2, 11, 18, 0, 0).unwrap().timestamp();
        assert_eq!(
            to_discord_timestamp("2026-02-11 19:00"),
            Some(format!("<t:{}:F>", expected))
        );
        assert_eq!(
            to_discord_timestamp("2026/02/11 19:00"),
            Some(format!("<t:{}:F>", expected))
        );
        assert_eq!(
            to_discord_timestamp("tonight 9pm"),
            Some("tonight 9pm".to_string())
        );
    }

    #[test]
    fn test_split_entry_prize_and_time() {
        assert_eq!(
            split_entry_prize_and_time("€10 | €200 | 2026-02-11 19:00"),
            Some(("€10".into(), "€200".into(), "2026-02-11 19:00".into()))
        );
        assert_eq!(
            split_entry_prize_and_time("€10 / €200 / 2026/02/11"),
            Some(("€10".into(), "€200".into(), "2026/02/11".into()))
        );
        assert_eq!(split_entry_prize_and_time("€10 | €200"), None);
        assert_eq!(split_entry_prize_and_time("free"), None);
        assert_eq!(split_entry_prize_and_time(" | €200 | today"), None);
    }

    #[test]
    fn test_format_eur() {
        assert_eq!(format_eur(Some(10.0)), "10€");
        assert_eq!(format_eur(Some(12.5)), "12.5€");
        assert_eq!(format_eur(None), "-");
    }

    #[test]
    fn test_link_or_dash() {
        assert_eq!(link_or_dash(""), "-");
        assert_eq!(link_or_dash("https://x.gg"), "[URL](https://x.gg)");
    }

    #[test]
    fn test_extract_user_id() {
        assert_eq!(extract_user_id("<@!123>"), Some("123".into()));
        assert_eq!(extract_user_id("456"), Some("456".into()));
        assert_eq!(
            extract_user_id("player 123456789012345678 FR"),
            Some("123456789012345678".into())
        );
        assert_eq!(extract_user_id("nobody"), None);
    }

    #[test]
    fn test_country_to_flag() {
        assert_eq!(country_to_flag("FR"), Some("🇫🇷".into()));
        assert_eq!(country_to_flag(":flag_de:"), Some("🇩🇪".into()));
        assert_eq!(country_to_flag("🇪🇸"), Some("🇪🇸".into()));
        assert_eq!(country_to_flag("United   Kingdom"), Some("🇬🇧".into()));
        assert_eq!(country_to_flag("Atlantis"), None);
    }

    #[test]
    fn test_parse_roster() {
        let roster = parse_roster("<@111> FR\n\n:flag_de: 222222222222222222\n").unwrap();
        assert_eq!(roster, vec!["🇫🇷 <@111>", "🇩🇪 <@222222222222222222>"]);

        assert!(parse_roster("").is_err());
        assert!(parse_roster("<@111>").unwrap_err().contains("Missing country"));
        assert!(parse_roster("Alice FR").unwrap_err().contains("user id"));
        assert!(parse_roster("<@111> Atlantis").unwrap_err().contains("country/flag"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Orion Esports Academy", 10), "Orion Esp…");
    }
}
