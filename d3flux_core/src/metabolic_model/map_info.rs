//! This module provides the `map_info` annotation map, which holds the layout and styling
//! metadata attached to metabolites, reactions, and the model itself.
//!
//! The map lives inside the `notes` field of each object, so it round-trips through the
//! regular model JSON. Every key is optional, and absence of a key means "use the default".
//! A key holding a value of the wrong type is read as absent, so one odd annotation never
//! keeps a model from loading.
use std::fmt::{Display, Formatter};

use indexmap::IndexMap;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

/// Notes attached to a model object
///
/// Only the `map_info` entry is interpreted, all other entries are preserved verbatim.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Notes {
    /// Layout and styling metadata
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub map_info: Option<MapInfo>,
    /// Any other notes
    #[serde(flatten)]
    pub other: IndexMap<String, Value>,
}

impl Notes {
    pub fn is_empty(&self) -> bool {
        self.map_info.is_none() && self.other.is_empty()
    }
}

/// Annotation map used to decide how an object is drawn
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct MapInfo {
    /// When true, the object is not rendered. Any truthy JSON value counts
    #[serde(
        default,
        deserialize_with = "lenient::truthy",
        skip_serializing_if = "Option::is_none"
    )]
    pub hidden: Option<bool>,
    /// Reaction color group (see [`Group`])
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub group: Option<Group>,
    /// Reaction flux, or flux carried by a metabolite
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub flux: Option<f64>,
    /// Label drawn next to the node
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub display_name: Option<String>,
    /// Cofactors drawn as separate nodes for this reaction, keyed by metabolite id
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub cofactors: Option<IndexMap<String, MapInfo>>,
    /// Whether the reverse arrowhead is drawn when the reaction carries no flux
    #[serde(
        default,
        deserialize_with = "lenient::truthy",
        skip_serializing_if = "Option::is_none"
    )]
    pub reversibility: Option<bool>,
    /// Label alignment hint, e.g. `left` or `upper right`
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub align: Option<String>,
    /// Node fill color
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub color: Option<String>,
    /// Pinned x position
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub x: Option<f64>,
    /// Pinned y position
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub y: Option<f64>,
    /// Keys not interpreted here (including model level render options)
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl MapInfo {
    /// A map with only the hidden flag set
    pub fn hidden() -> Self {
        MapInfo {
            hidden: Some(true),
            ..Default::default()
        }
    }

    /// True only if the hidden flag is present and set
    pub fn is_hidden(&self) -> bool {
        self.hidden.unwrap_or(false)
    }

    /// Ids of the cofactors registered for this reaction
    pub fn cofactor_ids(&self) -> impl Iterator<Item = &str> {
        self.cofactors
            .iter()
            .flat_map(|cofactors| cofactors.keys().map(String::as_str))
    }

    pub fn has_cofactor(&self, metabolite_id: &str) -> bool {
        self.cofactors
            .as_ref()
            .is_some_and(|cofactors| cofactors.contains_key(metabolite_id))
    }
}

/// Reaction color group
///
/// Knocked out reactions use the `"ko"` label, redox coloring uses numbered groups
/// (1 through 8 have distinct colors in the rendered figure).
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum Group {
    /// Numbered color group
    Index(i64),
    /// Named group
    Label(String),
}

impl Group {
    pub const KNOCKOUT_LABEL: &'static str = "ko";

    /// The group used for knocked out reactions
    pub fn knockout() -> Self {
        Group::Label(Self::KNOCKOUT_LABEL.to_string())
    }

    pub fn is_knockout(&self) -> bool {
        matches!(self, Group::Label(label) if label == Self::KNOCKOUT_LABEL)
    }
}

impl<'de> Deserialize<'de> for Group {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawGroup {
            Index(i64),
            Number(f64),
            Label(String),
        }

        match RawGroup::deserialize(deserializer)? {
            RawGroup::Index(idx) => Ok(Group::Index(idx)),
            // Files written by other tools store `1.0` for group 1
            RawGroup::Number(number) if number.is_finite() && number.fract() == 0. => {
                Ok(Group::Index(number as i64))
            }
            RawGroup::Number(number) => Err(D::Error::custom(format!(
                "group {} is not a whole number",
                number
            ))),
            RawGroup::Label(label) => Ok(Group::Label(label)),
        }
    }
}

impl Display for Group {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Group::Index(idx) => write!(f, "{}", idx),
            Group::Label(label) => write!(f, "{}", label),
        }
    }
}

/// Objects carrying notes, and therefore a `map_info` annotation map
pub trait Annotated {
    fn notes(&self) -> &Notes;

    fn notes_mut(&mut self) -> &mut Notes;

    /// The annotation map, if one has been created
    fn map_info(&self) -> Option<&MapInfo> {
        self.notes().map_info.as_ref()
    }

    /// The annotation map, created empty if it does not exist yet
    fn map_info_mut(&mut self) -> &mut MapInfo {
        self.notes_mut().map_info.get_or_insert_with(MapInfo::default)
    }

    /// Whether the object is excluded from rendering
    fn is_hidden(&self) -> bool {
        self.map_info().is_some_and(MapInfo::is_hidden)
    }
}

mod lenient {
    use super::*;

    /// A value of the expected type, or whatever was found instead
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient<T> {
        Valid(T),
        Invalid(Value),
    }

    /// `None` for null and for values of the wrong type
    pub(super) fn optional<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        match Option::<Lenient<T>>::deserialize(deserializer)? {
            Some(Lenient::Valid(value)) => Ok(Some(value)),
            Some(Lenient::Invalid(value)) => {
                debug!(%value, "ignoring map_info value of unexpected type");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Truth value of any JSON value: false, null, zero and empty values are false
    pub(super) fn truthy<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<bool>, D::Error> {
        Ok(Option::<Value>::deserialize(deserializer)?.map(|value| match value {
            Value::Null => false,
            Value::Bool(flag) => flag,
            Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.),
            Value::String(text) => !text.is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::Object(entries) => !entries.is_empty(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserialize_map_info() {
        let data = r#"{
            "hidden": true,
            "group": "ko",
            "display_name": "ATP",
            "cofactors": {"atp_c": {}, "adp_c": {"x": 10.0, "y": 20.5}},
            "align": "lower center",
            "figsize": [300, 250]
        }"#;
        let info: MapInfo = serde_json::from_str(data).unwrap();
        assert!(info.is_hidden());
        assert!(info.group.clone().unwrap().is_knockout());
        assert_eq!(info.display_name.as_deref(), Some("ATP"));
        assert_eq!(info.cofactor_ids().collect::<Vec<_>>(), vec!["atp_c", "adp_c"]);
        let adp = &info.cofactors.as_ref().unwrap()["adp_c"];
        assert_eq!(adp.x, Some(10.0));
        assert_eq!(adp.y, Some(20.5));
        assert_eq!(info.align.as_deref(), Some("lower center"));
        // Unrecognised keys are kept
        assert_eq!(info.extra["figsize"], json!([300, 250]));
    }

    #[test]
    fn truthy_hidden_flag() {
        for (data, hidden) in [
            (r#"{"hidden": 1}"#, true),
            (r#"{"hidden": 0}"#, false),
            (r#"{"hidden": "yes"}"#, true),
            (r#"{"hidden": ""}"#, false),
            (r#"{"hidden": [1]}"#, true),
            (r#"{"reversibility": 0.0}"#, false),
        ] {
            let info: MapInfo = serde_json::from_str(data).unwrap();
            assert_eq!(info.is_hidden(), hidden, "{}", data);
        }
        let info: MapInfo = serde_json::from_str(r#"{"hidden": null}"#).unwrap();
        assert_eq!(info.hidden, None);
        let info: MapInfo = serde_json::from_str(r#"{"reversibility": 1}"#).unwrap();
        assert_eq!(info.reversibility, Some(true));
    }

    #[test]
    fn wrong_types_fall_back_to_defaults() {
        let data = r#"{
            "group": {"nested": true},
            "flux": "high",
            "display_name": 5,
            "cofactors": ["atp_c"],
            "x": 12,
            "color": "red"
        }"#;
        let info: MapInfo = serde_json::from_str(data).unwrap();
        assert_eq!(info.group, None);
        assert_eq!(info.flux, None);
        assert_eq!(info.display_name, None);
        assert_eq!(info.cofactors, None);
        assert_eq!(info.x, Some(12.));
        assert_eq!(info.color.as_deref(), Some("red"));

        let notes: Notes = serde_json::from_str(r#"{"map_info": "oops"}"#).unwrap();
        assert_eq!(notes.map_info, None);
    }

    #[test]
    fn whole_float_group() {
        let info: MapInfo = serde_json::from_str(r#"{"group": 1.0}"#).unwrap();
        assert_eq!(info.group, Some(Group::Index(1)));
        let info: MapInfo = serde_json::from_str(r#"{"group": 1.5}"#).unwrap();
        assert_eq!(info.group, None);
    }

    #[test]
    fn numbered_group() {
        let info: MapInfo = serde_json::from_value(json!({"group": 3})).unwrap();
        assert_eq!(info.group, Some(Group::Index(3)));
        assert!(!info.group.unwrap().is_knockout());
    }

    #[test]
    fn absent_keys_are_not_serialized() {
        let info = MapInfo::hidden();
        assert_eq!(serde_json::to_string(&info).unwrap(), r#"{"hidden":true}"#);
        assert_eq!(serde_json::to_string(&MapInfo::default()).unwrap(), "{}");
    }

    #[test]
    fn notes_keep_other_entries() {
        let data = json!({
            "original_bigg_ids": ["PFK"],
            "map_info": {"flux": 1.5}
        });
        let notes: Notes = serde_json::from_value(data.clone()).unwrap();
        assert_eq!(notes.map_info.as_ref().unwrap().flux, Some(1.5));
        assert_eq!(notes.other["original_bigg_ids"], json!(["PFK"]));
        assert_eq!(serde_json::to_value(&notes).unwrap(), data);
    }

    #[test]
    fn missing_hidden_flag_is_visible() {
        let info = MapInfo {
            hidden: Some(false),
            ..Default::default()
        };
        assert!(!info.is_hidden());
        assert!(!MapInfo::default().is_hidden());
    }
}
