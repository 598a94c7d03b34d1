use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString, IntoStaticStr};

use super::validation::BuiltinKind;
use super::value::FieldValue;

/// Closed set of field kinds understood by the engine.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    PartialEq,
    Hash,
    EnumString,
    EnumIter,
    IntoStaticStr,
    strum::Display,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    Text,
    Number,
    Email,
    Phone,
    Password,
    Hidden,
    Textarea,
    Checkbox,
    Radio,
    Custom,
    Fieldset,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DefaultValue {
    Blank,
    False,
    Null,
}

impl DefaultValue {
    pub fn to_value(self) -> FieldValue {
        match self {
            DefaultValue::Blank => FieldValue::Text(String::new()),
            DefaultValue::False => FieldValue::Bool(false),
            DefaultValue::Null => FieldValue::Null,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TypeProfile {
    pub field_type: FieldType,
    pub default_value: DefaultValue,
    pub builtin: Option<BuiltinKind>,
    pub html_type: &'static str,
}

const fn profile(
    field_type: FieldType,
    default_value: DefaultValue,
    builtin: Option<BuiltinKind>,
    html_type: &'static str,
) -> TypeProfile {
    TypeProfile {
        field_type,
        default_value,
        builtin,
        html_type,
    }
}

// Indexed by discriminant, keep in declaration order.
const PROFILES: [TypeProfile; 11] = [
    profile(FieldType::Text, DefaultValue::Blank, None, "text"),
    profile(FieldType::Number, DefaultValue::Blank, None, "number"),
    profile(
        FieldType::Email,
        DefaultValue::Blank,
        Some(BuiltinKind::Email),
        "email",
    ),
    profile(
        FieldType::Phone,
        DefaultValue::Blank,
        Some(BuiltinKind::Phone),
        "text",
    ),
    profile(FieldType::Password, DefaultValue::Blank, None, "password"),
    profile(FieldType::Hidden, DefaultValue::Null, None, "hidden"),
    profile(FieldType::Textarea, DefaultValue::Blank, None, "textarea"),
    profile(FieldType::Checkbox, DefaultValue::False, None, "checkbox"),
    profile(FieldType::Radio, DefaultValue::False, None, "radio"),
    profile(FieldType::Custom, DefaultValue::Null, None, "custom"),
    profile(FieldType::Fieldset, DefaultValue::Null, None, "fieldset"),
];

impl FieldType {
    /// Parses a raw type name; empty or unrecognized names become `Text`.
    pub fn parse_lenient(raw: &str) -> Self {
        raw.trim().parse().unwrap_or_default()
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }

    pub fn profile(self) -> TypeProfile {
        PROFILES[self as usize]
    }

    pub fn default_value(self) -> FieldValue {
        self.profile().default_value.to_value()
    }

    pub fn builtin(self) -> Option<BuiltinKind> {
        self.profile().builtin
    }

    /// HTML input type a renderer should use. Phone numbers are checked by
    /// pattern, so they render as plain text.
    pub fn html_type(self) -> &'static str {
        self.profile().html_type
    }

    pub fn is_fieldset(self) -> bool {
        self == FieldType::Fieldset
    }
}
