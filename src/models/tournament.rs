// Tournament records read from the Notion database

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use serde_json::{json, Value};

use crate::utils::config::{paris_date_of, paris_local_to_utc};

/// Only 5v5 cups are announced
pub const TOURNAMENT_TYPE: &str = "Cup";
pub const TOURNAMENT_FORMAT: &str = "5v5";

#[derive(Debug, Clone, PartialEq)]
pub struct Tournament {
    pub title: String,
    pub organization: String,
    pub starts_at: DateTime<Utc>,
    pub entry_fee_eur: Option<f64>,
    pub prize_pool_eur: Option<f64>,
    pub website_url: String,
    pub discord_url: String,
}

/// Property names of the tournaments database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotionProps {
    pub title: String,
    pub organization: String,
    pub kind: String,
    pub starts_at: String,
    pub format: String,
    pub entry_fee: String,
    pub prize_pool: String,
    pub website_url: String,
    pub discord_url: String,
}

impl Default for NotionProps {
    fn default() -> Self {
        Self {
            title: "Name".into(),
            organization: "Organization".into(),
            kind: "Type".into(),
            starts_at: "Date & Time".into(),
            format: "Format".into(),
            entry_fee: "Entry Fee".into(),
            prize_pool: "Prize Pool".into(),
            website_url: "Website URL".into(),
            discord_url: "Discord URL".into(),
        }
    }
}

/// Detect property names from a database schema (`GET /databases/{id}`).
///
/// A property of the right type whose name contains all needles wins,
/// otherwise the first one containing any needle, otherwise the default name.
pub fn detect_props(db: &Value) -> NotionProps {
    let empty = serde_json::Map::new();
    let props = db
        .get("properties")
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    let pick = |prop_type: &str, needles: &[&str]| -> Option<String> {
        let mut best = None;
        for (name, meta) in props {
            if meta.get("type").and_then(Value::as_str) != Some(prop_type) {
                continue;
            }
            let lower = name.to_lowercase();
            if needles.iter().all(|n| lower.contains(n)) {
                return Some(name.clone());
            }
            if best.is_none() && needles.iter().any(|n| lower.contains(n)) {
                best = Some(name.clone());
            }
        }
        best
    };

    let defaults = NotionProps::default();
    let title = props
        .iter()
        .find(|(_, meta)| meta.get("type").and_then(Value::as_str) == Some("title"))
        .map(|(name, _)| name.clone())
        .unwrap_or(defaults.title);

    NotionProps {
        title,
        organization: pick("select", &["org"]).unwrap_or(defaults.organization),
        kind: pick("select", &["type"]).unwrap_or(defaults.kind),
        starts_at: pick("date", &["date"])
            .or_else(|| pick("date", &["time"]))
            .unwrap_or(defaults.starts_at),
        format: pick("select", &["format"]).unwrap_or(defaults.format),
        entry_fee: pick("number", &["entry"]).unwrap_or(defaults.entry_fee),
        prize_pool: pick("number", &["prize"]).unwrap_or(defaults.prize_pool),
        website_url: pick("url", &["web"]).unwrap_or(defaults.website_url),
        discord_url: pick("url", &["discord"]).unwrap_or(defaults.discord_url),
    }
}

fn prop<'a>(page: &'a Value, name: &str) -> Option<&'a Value> {
    page.get("properties")?.get(name)
}

fn title_text(page: &Value, name: &str) -> String {
    prop(page, name)
        .and_then(|p| p.get("title"))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|it| it.get("plain_text").and_then(Value::as_str))
                .collect::<String>()
        })
        .unwrap_or_default()
        .trim()
        .to_string()
}

fn select_name(page: &Value, name: &str) -> String {
    prop(page, name)
        .and_then(|p| p.get("select"))
        .and_then(|s| s.get("name"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string()
}

fn number(page: &Value, name: &str) -> Option<f64> {
    prop(page, name)?.get("number")?.as_f64()
}

fn url(page: &Value, name: &str) -> String {
    prop(page, name)
        .and_then(|p| p.get("url"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string()
}

fn date_start(page: &Value, name: &str) -> Option<DateTime<Utc>> {
    let start = prop(page, name)?.get("date")?.get("start")?.as_str()?;
    parse_notion_date(start)
}

/// Notion dates are RFC 3339, a naive datetime or a bare date. Naive values are UTC.
pub fn parse_notion_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    None
}

/// Turn a Notion page into a tournament. Only 5v5 cups with a title and start are kept.
pub fn extract_tournament(page: &Value, props: &NotionProps) -> Option<Tournament> {
    let title = title_text(page, &props.title);
    if title.is_empty() {
        return None;
    }

    if select_name(page, &props.kind) != TOURNAMENT_TYPE {
        return None;
    }
    if select_name(page, &props.format) != TOURNAMENT_FORMAT {
        return None;
    }
    let starts_at = date_start(page, &props.starts_at)?;

    Some(Tournament {
        title,
        organization: select_name(page, &props.organization),
        starts_at,
        entry_fee_eur: number(page, &props.entry_fee),
        prize_pool_eur: number(page, &props.prize_pool),
        website_url: url(page, &props.website_url),
        discord_url: url(page, &props.discord_url),
    })
}

/// Query body for today's (Paris day) 5v5 cups, sorted by start time
pub fn today_query_payload(props: &NotionProps, now: DateTime<Utc>) -> Value {
    let today = paris_date_of(now);
    let start_naive = today.and_hms_opt(0, 0, 0).unwrap_or_default();
    let start = paris_local_to_utc(start_naive);
    let end = paris_local_to_utc(start_naive + Duration::days(1));

    json!({
        "filter": {
            "and": [
                { "property": props.kind, "select": { "equals": TOURNAMENT_TYPE } },
                { "property": props.format, "select": { "equals": TOURNAMENT_FORMAT } },
                {
                    "property": props.starts_at,
                    "date": {
                        "on_or_after": start.to_rfc3339(),
                        "before": end.to_rfc3339(),
                    }
                },
            ]
        },
        "sorts": [{ "property": props.starts_at, "direction": "ascending" }],
        "page_size": 100,
    })
}
