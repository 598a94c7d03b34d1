//! Caller-facing field descriptors and shared default settings.
//!
//! Descriptors are plain data plus two kinds of closures: the `is_required`
//! predicate and custom validator predicates. The data-only subset can be
//! loaded from JSON through [`DescriptorConfig`] and [`DefaultSettingsConfig`].

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};

use super::controller::FormResult;
use super::field_type::FieldType;
use super::validation::{
    CustomValidator, ErrorMessages, FieldPredicate, RequiredPredicate, Requirement,
};
use super::value::FieldValue;

#[derive(Clone, Debug, Default)]
pub struct FieldDescriptor {
    pub name: String,
    pub field_type: Option<FieldType>,
    pub initial_value: Option<FieldValue>,
    pub is_required: Option<Requirement>,
    /// `None` inherits the default settings' validators.
    pub custom_validators: Option<Vec<CustomValidator>>,
    pub error_messages: ErrorMessages,
    pub validate_on_change: Option<bool>,
    pub children: Vec<FieldDescriptor>,
    pub label: Option<String>,
    pub placeholder: Option<String>,
    pub props: JsonMap<String, JsonValue>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Groups `children`; the group itself never becomes a field.
    pub fn fieldset(name: impl Into<String>, children: Vec<FieldDescriptor>) -> Self {
        Self {
            name: name.into(),
            field_type: Some(FieldType::Fieldset),
            children,
            ..Self::default()
        }
    }

    pub fn kind(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }

    /// Sets the type from its name; unknown names become `text`.
    pub fn kind_name(self, raw: &str) -> Self {
        self.kind(FieldType::parse_lenient(raw))
    }

    pub fn initial_value(mut self, value: impl Into<FieldValue>) -> Self {
        self.initial_value = Some(value.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.is_required = Some(Requirement::Fixed(required));
        self
    }

    pub fn required_when<P>(mut self, predicate: P) -> Self
    where
        P: RequiredPredicate + 'static,
    {
        self.is_required = Some(Requirement::when(predicate));
        self
    }

    pub fn validator(mut self, validator: CustomValidator) -> Self {
        self.custom_validators
            .get_or_insert_with(Vec::new)
            .push(validator);
        self
    }

    pub fn validate_with<P>(self, predicate: P, message: impl Into<String>) -> Self
    where
        P: FieldPredicate + 'static,
    {
        self.validator(CustomValidator::with_message(predicate, message))
    }

    pub fn messages(mut self, messages: ErrorMessages) -> Self {
        self.error_messages = messages;
        self
    }

    pub fn validate_on_change(mut self, enabled: bool) -> Self {
        self.validate_on_change = Some(enabled);
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn prop(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    pub fn is_fieldset(&self) -> bool {
        self.field_type.is_some_and(FieldType::is_fieldset)
    }

    pub fn from_json(json: &str) -> FormResult<Self> {
        Ok(serde_json::from_str::<DescriptorConfig>(json)?.into())
    }

    pub fn list_from_json(json: &str) -> FormResult<Vec<Self>> {
        let configs = serde_json::from_str::<Vec<DescriptorConfig>>(json)?;
        Ok(configs.into_iter().map(Self::from).collect())
    }
}

/// Settings shared by every field of a form. A descriptor value always wins
/// over the matching default.
#[derive(Clone, Debug, Default)]
pub struct DefaultSettings {
    pub field_type: Option<FieldType>,
    pub is_required: Option<Requirement>,
    pub custom_validators: Vec<CustomValidator>,
    pub error_messages: ErrorMessages,
    pub validate_on_change: Option<bool>,
    pub label: Option<String>,
    pub placeholder: Option<String>,
    pub props: JsonMap<String, JsonValue>,
}

impl DefaultSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.is_required = Some(Requirement::Fixed(required));
        self
    }

    pub fn validator(mut self, validator: CustomValidator) -> Self {
        self.custom_validators.push(validator);
        self
    }

    pub fn messages(mut self, messages: ErrorMessages) -> Self {
        self.error_messages = messages;
        self
    }

    pub fn validate_on_change(mut self, enabled: bool) -> Self {
        self.validate_on_change = Some(enabled);
        self
    }

    pub fn prop(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    pub fn from_json(json: &str) -> FormResult<Self> {
        Ok(serde_json::from_str::<DefaultSettingsConfig>(json)?.into())
    }
}

/// Data-only form of a [`FieldDescriptor`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DescriptorConfig {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
    #[serde(
        alias = "value",
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub initial_value: Option<FieldValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_required: Option<bool>,
    pub error_messages: ErrorMessages,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validate_on_change: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "JsonMap::is_empty")]
    pub props: JsonMap<String, JsonValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DescriptorConfig>,
}

// An explicit `null` is a value, a missing key is not.
fn present_value<'de, D>(deserializer: D) -> Result<Option<FieldValue>, D::Error>
where
    D: Deserializer<'de>,
{
    FieldValue::deserialize(deserializer).map(Some)
}

impl From<DescriptorConfig> for FieldDescriptor {
    fn from(config: DescriptorConfig) -> Self {
        Self {
            name: config.name,
            field_type: config.field_type.as_deref().map(FieldType::parse_lenient),
            initial_value: config.initial_value,
            is_required: config.is_required.map(Requirement::Fixed),
            custom_validators: None,
            error_messages: config.error_messages,
            validate_on_change: config.validate_on_change,
            children: config.children.into_iter().map(Self::from).collect(),
            label: config.label,
            placeholder: config.placeholder,
            props: config.props,
        }
    }
}

/// Data-only form of [`DefaultSettings`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DefaultSettingsConfig {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_required: Option<bool>,
    pub error_messages: ErrorMessages,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validate_on_change: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "JsonMap::is_empty")]
    pub props: JsonMap<String, JsonValue>,
}

impl From<DefaultSettingsConfig> for DefaultSettings {
    fn from(config: DefaultSettingsConfig) -> Self {
        Self {
            field_type: config.field_type.as_deref().map(FieldType::parse_lenient),
            is_required: config.is_required.map(Requirement::Fixed),
            custom_validators: Vec::new(),
            error_messages: config.error_messages,
            validate_on_change: config.validate_on_change,
            label: config.label,
            placeholder: config.placeholder,
            props: config.props,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{FormError, FormValues};

    #[test]
    fn descriptor_list_loads_from_json() {
        let descriptors = FieldDescriptor::list_from_json(
            r#"[
                {"name": "login", "isRequired": true, "label": "Login"},
                {"name": "email", "type": "email", "errorMessages": {"email": "Bad email"}},
                {"name": "contact", "type": "fieldset", "children": [
                    {"name": "phone", "type": "phone", "validateOnChange": true}
                ]},
                {"name": "birthday", "type": "datetime", "value": null}
            ]"#,
        )
        .expect("descriptor json must parse");

        assert_eq!(descriptors.len(), 4);
        assert_eq!(descriptors[0].label.as_deref(), Some("Login"));
        assert!(matches!(
            descriptors[0].is_required,
            Some(Requirement::Fixed(true))
        ));
        assert_eq!(descriptors[1].field_type, Some(FieldType::Email));
        assert_eq!(
            descriptors[1].error_messages.email.as_deref(),
            Some("Bad email")
        );
        assert!(descriptors[2].is_fieldset());
        assert_eq!(descriptors[2].children[0].validate_on_change, Some(true));
        assert_eq!(descriptors[3].field_type, Some(FieldType::Text));
        assert_eq!(descriptors[3].initial_value, Some(FieldValue::Null));
        assert_eq!(descriptors[0].initial_value, None);
    }

    #[test]
    fn legacy_message_keys_are_accepted() {
        let settings = DefaultSettings::from_json(
            r#"{"errorMessages": {"isRequired": "Required!", "validation": "Nope"}}"#,
        )
        .expect("settings json must parse");
        assert_eq!(settings.error_messages.required.as_deref(), Some("Required!"));
        assert_eq!(settings.error_messages.default.as_deref(), Some("Nope"));
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let error = FieldDescriptor::list_from_json("[{\"name\": 3}]").expect_err("must fail");
        assert!(matches!(error, FormError::Config(_)));
    }

    #[test]
    fn kind_names_parse_leniently() {
        assert_eq!(
            FieldDescriptor::new("mail").kind_name("EMAIL").field_type,
            Some(FieldType::Email)
        );
        assert_eq!(
            FieldDescriptor::new("when").kind_name("datetime").field_type,
            Some(FieldType::Text)
        );
    }

    #[test]
    fn builder_collects_validators_in_order() {
        let descriptor = FieldDescriptor::new("age")
            .kind(FieldType::Number)
            .validate_with(|_: &FieldValue, _: &FormValues| true, "first")
            .validate_with(|_: &FieldValue, _: &FormValues| true, "second");
        let messages = descriptor
            .custom_validators
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|validator| validator.error_message())
            .collect::<Vec<_>>();
        assert_eq!(messages, vec![Some("first"), Some("second")]);
    }
}
