use super::id::deserialize_id;
use serde::{Deserialize, Serialize};

/// Palette the web dashboard picks new marker colors from.
pub const MARKER_COLORS: [&str; 6] = [
    "bg-rose-600",
    "bg-blue-600",
    "bg-emerald-600",
    "bg-violet-600",
    "bg-slate-700",
    "bg-amber-600",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkItem {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub title: String,
    pub color: String,
    #[serde(default)]
    pub sort_order: i64,
    #[serde(default)]
    pub links: Vec<LinkItem>,
}

impl Marker {
    pub fn new(id: String, title: String, color: String, sort_order: i64) -> Self {
        Self {
            id,
            title,
            color,
            sort_order,
            links: Vec::new(),
        }
    }
}

/// Marker as stored in local storage by earlier dashboard revisions
/// (`my-markers`); its links lived under `marker-links-{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyMarker {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub title: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
}

/// `POST /api/markers` has answered both with the bare new id and with the
/// full marker over time.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CreatedMarker {
    Full(Marker),
    Id(#[serde(deserialize_with = "deserialize_id")] String),
}

pub fn pick_color(seed: u8) -> &'static str {
    MARKER_COLORS[seed as usize % MARKER_COLORS.len()]
}

pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    if url.starts_with("http") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_from_server_payload() {
        let json = r#"{"id": 3, "title": "Lost Ark", "color": "bg-rose-600", "sortOrder": 2,
            "links": [{"id": 9, "title": "Guide", "url": "https://example.com"}]}"#;
        let marker: Marker = serde_json::from_str(json).unwrap();
        assert_eq!(marker.id, "3");
        assert_eq!(marker.sort_order, 2);
        assert_eq!(marker.links[0].id, "9");
    }

    #[test]
    fn test_created_marker_accepts_id_or_body() {
        let by_id: CreatedMarker = serde_json::from_str("12").unwrap();
        assert!(matches!(by_id, CreatedMarker::Id(ref id) if id == "12"));

        let by_body: CreatedMarker = serde_json::from_str(
            r#"{"id": 12, "title": "Elden Ring", "color": "bg-blue-600", "sortOrder": 4, "links": []}"#,
        )
        .unwrap();
        assert!(matches!(by_body, CreatedMarker::Full(ref m) if m.sort_order == 4));
    }

    #[test]
    fn test_normalize_url_adds_scheme() {
        assert_eq!(normalize_url("example.com/guide"), "https://example.com/guide");
        assert_eq!(normalize_url("http://example.com"), "http://example.com");
    }

    #[test]
    fn test_pick_color_wraps() {
        assert_eq!(pick_color(0), "bg-rose-600");
        assert_eq!(pick_color(6), "bg-rose-600");
        assert_eq!(pick_color(7), "bg-blue-600");
    }
}
