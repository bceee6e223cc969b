//! Typed views over items in query responses
//!
//! Each item wraps the decoded XML of one element. Fields are read on demand
//! and coerced according to the sets each item type declares: dates are UTC
//! timestamps, booleans are `"true"`, integers use their leading digits.
//! An empty field always reads as `None`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::xml::{XmlMap, XmlValue};

/// A coerced field value, see [`Item::field`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Date(DateTime<Utc>),
    Bool(bool),
    Int(i64),
}

pub trait Item: Sized {
    /// Fields read as UTC timestamps.
    const DATE_FIELDS: &'static [&'static str] = &[];
    /// Fields read as `value == "true"`.
    const BOOLEAN_FIELDS: &'static [&'static str] = &[];
    const INTEGER_FIELDS: &'static [&'static str] = &[];

    fn from_map(data: XmlMap) -> Self;

    /// The decoded element.
    fn data(&self) -> &XmlMap;

    fn raw(&self, name: &str) -> Option<&XmlValue> {
        self.data().get(name)
    }

    /// Text of a field, `None` when missing or empty.
    fn text(&self, name: &str) -> Option<&str> {
        self.raw(name)?.text().filter(|s| !s.is_empty())
    }

    fn id(&self) -> Option<&str> {
        self.text("id")
    }

    /// `false` when the item was requested by id but the server could not
    /// find it. Such items carry only `id` and an `error` element.
    fn exists(&self) -> bool {
        !self.data().contains_key("error")
    }

    /// Message of the embedded error for items that do not exist.
    fn error_message(&self) -> Option<&str> {
        self.raw("error")?.get("message")?.text()
    }

    fn date(&self, name: &str) -> Option<DateTime<Utc>> {
        let value = self.text(name)?;
        let parsed = parse_date(value);
        if parsed.is_none() {
            log::warn!("Unparseable date in field '{}': {}", name, value);
        }
        parsed
    }

    fn boolean(&self, name: &str) -> Option<bool> {
        self.raw(name).map(|v| v.text() == Some("true"))
    }

    fn integer(&self, name: &str) -> Option<i64> {
        self.text(name).map(to_integer)
    }

    /// Read a field coerced by the declared date, boolean and integer sets.
    /// Undeclared fields come back as text.
    fn field(&self, name: &str) -> Option<FieldValue> {
        if Self::DATE_FIELDS.contains(&name) {
            self.date(name).map(FieldValue::Date)
        } else if Self::BOOLEAN_FIELDS.contains(&name) {
            self.boolean(name).map(FieldValue::Bool)
        } else if Self::INTEGER_FIELDS.contains(&name) {
            self.integer(name).map(FieldValue::Int)
        } else {
            self.text(name).map(|s| FieldValue::Text(s.to_string()))
        }
    }

    fn thumbnails(&self) -> Vec<ThumbnailItem> {
        nested_items(self.data(), "thumbnails", "thumbnail")
    }

    fn players(&self) -> Vec<PlayerItem> {
        nested_items(self.data(), "players", "player")
    }
}

/// Items listed at the top level of a collection response.
pub trait CollectionItem: Item {
    /// Element name of one item, e.g. `episode`.
    const ELEMENT: &'static str;
    /// Elements that must always decode as lists for this response.
    const FORCE_ARRAY: &'static [&'static str];
}

/// Collect `<group><element/>...</group>` children of an item.
pub fn nested_items<I: Item>(data: &XmlMap, group: &str, element: &str) -> Vec<I> {
    data.get(group)
        .and_then(|g| g.get(element))
        .map(|v| v.as_slice().iter().map(|e| I::from_map(e.to_map())).collect())
        .unwrap_or_default()
}

/// Parse a Platform timestamp. The Platform sends `YYYY-MM-DD HH:MM:SS` in UTC.
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.and_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(d) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    None
}

/// Leading integer of a string, 0 when there is none ("12abc" -> 12, "x" -> 0).
pub fn to_integer(value: &str) -> i64 {
    let value = value.trim_start();
    let (sign, digits) = match value.as_bytes().first() {
        Some(b'-') => (-1, &value[1..]),
        Some(b'+') => (1, &value[1..]),
        _ => (1, value),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().map(|n| sign * n).unwrap_or(0)
}

macro_rules! define_item {
    (
        $(#[$meta:meta])*
        $name:ident
        $(, dates: [$($date:literal),* $(,)?])?
        $(, booleans: [$($boolean:literal),* $(,)?])?
        $(, integers: [$($integer:literal),* $(,)?])?
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            data: XmlMap,
        }

        impl Item for $name {
            $(const DATE_FIELDS: &'static [&'static str] = &[$($date),*];)?
            $(const BOOLEAN_FIELDS: &'static [&'static str] = &[$($boolean),*];)?
            $(const INTEGER_FIELDS: &'static [&'static str] = &[$($integer),*];)?

            fn from_map(data: XmlMap) -> Self {
                Self { data }
            }

            fn data(&self) -> &XmlMap {
                &self.data
            }
        }
    };
}

define_item!(
    /// A show from a shows query
    ShowItem
);

define_item!(
    /// An episode from an episodes query
    EpisodeItem,
    dates: ["air_date", "off_air_date"]
);

define_item!(
    /// A playlist from a playlists query
    PlaylistItem,
    dates: ["created_at"]
);

define_item!(ThumbnailItem);

define_item!(
    PlayerItem,
    booleans: ["default"]
);

define_item!(DownloadItem);

define_item!(
    /// A custom metadata field on an episode or playlist
    CustomFieldItem,
    booleans: ["required"],
    integers: ["position"]
);

define_item!(
    /// A playlist an episode belongs to, as listed in an episodes query
    EpisodePlaylistItem,
    integers: ["position"]
);

define_item!(
    /// An episode in a playlist, as listed in a playlists query
    PlaylistEpisodeItem,
    integers: ["position"]
);

impl CollectionItem for ShowItem {
    const ELEMENT: &'static str = "show";
    const FORCE_ARRAY: &'static [&'static str] = &["show", "thumbnail", "player"];
}

impl CollectionItem for EpisodeItem {
    const ELEMENT: &'static str = "episode";
    const FORCE_ARRAY: &'static [&'static str] =
        &["episode", "thumbnail", "player", "download", "field", "playlist"];
}

impl CollectionItem for PlaylistItem {
    const ELEMENT: &'static str = "playlist";
    const FORCE_ARRAY: &'static [&'static str] =
        &["playlist", "thumbnail", "player", "field", "episode"];
}

impl ShowItem {
    pub fn name(&self) -> Option<&str> {
        self.text("name")
    }

    pub fn description(&self) -> Option<&str> {
        self.text("description")
    }
}

impl EpisodeItem {
    pub fn name(&self) -> Option<&str> {
        self.text("name")
    }

    pub fn description(&self) -> Option<&str> {
        self.text("description")
    }

    pub fn air_date(&self) -> Option<DateTime<Utc>> {
        self.date("air_date")
    }

    pub fn off_air_date(&self) -> Option<DateTime<Utc>> {
        self.date("off_air_date")
    }

    /// Running time as `HH:MM:SS`
    pub fn duration(&self) -> Option<&str> {
        self.text("duration")
    }

    /// Publishing status, e.g. `on_the_air` or `publish_failed`
    pub fn status(&self) -> Option<&str> {
        self.text("status")
    }

    pub fn downloads(&self) -> Vec<DownloadItem> {
        nested_items(&self.data, "downloads", "download")
    }

    pub fn custom_fields(&self) -> Vec<CustomFieldItem> {
        nested_items(&self.data, "custom_fields", "field")
    }

    pub fn playlists(&self) -> Vec<EpisodePlaylistItem> {
        nested_items(&self.data, "playlists", "playlist")
    }
}

impl PlaylistItem {
    pub fn name(&self) -> Option<&str> {
        self.text("name")
    }

    pub fn description(&self) -> Option<&str> {
        self.text("description")
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.date("created_at")
    }

    pub fn custom_fields(&self) -> Vec<CustomFieldItem> {
        nested_items(&self.data, "custom_fields", "field")
    }

    pub fn episodes(&self) -> Vec<PlaylistEpisodeItem> {
        nested_items(&self.data, "episodes", "episode")
    }
}

impl ThumbnailItem {
    /// The URL is the element's text.
    pub fn url(&self) -> Option<&str> {
        self.text(crate::xml::CONTENT_KEY)
    }
}

impl PlayerItem {
    pub fn name(&self) -> Option<&str> {
        self.text("name")
    }

    /// Whether this is the show's default player.
    pub fn is_default(&self) -> bool {
        self.boolean("default").unwrap_or(false)
    }

    /// URL of the player configuration.
    pub fn config(&self) -> Option<&str> {
        self.text("config")
    }

    pub fn embed_code(&self) -> Option<&str> {
        self.text("embed_code")
    }
}

impl DownloadItem {
    /// First listed URL of the downloadable file.
    pub fn url(&self) -> Option<&str> {
        self.text("url")
    }
}

/// One value of a custom field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomFieldValue {
    Text(String),
    /// An external select choice: the external id and its display value.
    External { id: String, value: String },
}

impl CustomFieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CustomFieldValue::Text(s) => Some(s),
            CustomFieldValue::External { .. } => None,
        }
    }
}

impl CustomFieldItem {
    pub fn name(&self) -> Option<&str> {
        self.text("name")
    }

    /// Field type, e.g. `text`, `number`, `date` or `external_select`.
    pub fn field_type(&self) -> Option<&str> {
        self.text("type")
    }

    pub fn required(&self) -> bool {
        self.boolean("required").unwrap_or(false)
    }

    pub fn position(&self) -> Option<i64> {
        self.integer("position")
    }

    /// Values of the field, trimmed. External select values carry their id.
    pub fn values(&self) -> Vec<CustomFieldValue> {
        let Some(raw) = self.raw("value") else {
            return Vec::new();
        };

        let mut values = Vec::new();
        for v in raw.as_slice() {
            match v {
                XmlValue::Text(s) if !s.trim().is_empty() => {
                    values.push(CustomFieldValue::Text(s.trim().to_string()));
                }
                XmlValue::Map(m) => {
                    let id = m.get("id").and_then(XmlValue::text).map(str::trim);
                    let value = v.text().map(str::trim).unwrap_or_default();
                    match id {
                        Some(id) => values.push(CustomFieldValue::External {
                            id: id.to_string(),
                            value: value.to_string(),
                        }),
                        None if !value.is_empty() => {
                            values.push(CustomFieldValue::Text(value.to_string()))
                        }
                        None => {}
                    }
                }
                _ => {}
            }
        }
        values
    }
}

impl EpisodePlaylistItem {
    pub fn position(&self) -> Option<i64> {
        self.integer("position")
    }
}

impl PlaylistEpisodeItem {
    pub fn name(&self) -> Option<&str> {
        self.text("name")
    }

    pub fn position(&self) -> Option<i64> {
        self.integer("position")
    }
}

#[cfg(test)]
#[path = "items_tests.rs"]
mod tests;
