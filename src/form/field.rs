use serde_json::{Map as JsonMap, Value as JsonValue};
use tracing::trace;

use super::controller::ErrorVisibility;
use super::descriptor::{DefaultSettings, FieldDescriptor};
use super::field_type::FieldType;
use super::validation::{BuiltinRules, FieldMessages, FieldValidators, Requirement};
use super::value::{FieldValue, FormValues};

/// When a field validates itself. The two triggers are exclusive.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ValidationTrigger {
    OnChange,
    #[default]
    OnBlur,
}

/// Runtime state of one form field.
#[derive(Clone, Debug)]
pub struct Field {
    name: String,
    field_type: FieldType,
    is_required: Requirement,
    validators: FieldValidators,
    messages: FieldMessages,
    trigger: ValidationTrigger,
    label: Option<String>,
    placeholder: Option<String>,
    props: JsonMap<String, JsonValue>,
    initial_value: FieldValue,
    current_value: Option<FieldValue>,
    is_pristine: bool,
    current_error: Option<String>,
}

impl Field {
    /// Builds a pristine field from `descriptor`, falling back to `defaults`
    /// for every setting the descriptor leaves unset.
    pub fn create(
        descriptor: &FieldDescriptor,
        defaults: &DefaultSettings,
        rules: &BuiltinRules,
    ) -> Self {
        let field_type = match descriptor.field_type.or(defaults.field_type) {
            // A group is never a field of its own.
            Some(FieldType::Fieldset) | None => FieldType::Text,
            Some(field_type) => field_type,
        };

        let initial_value = descriptor
            .initial_value
            .clone()
            .unwrap_or_else(|| field_type.default_value());

        let is_required = descriptor
            .is_required
            .clone()
            .or_else(|| defaults.is_required.clone())
            .unwrap_or_default();

        let custom = descriptor
            .custom_validators
            .clone()
            .unwrap_or_else(|| defaults.custom_validators.clone());
        let validators = FieldValidators::new(custom, field_type.builtin(), rules);

        let messages = FieldMessages::resolve(
            &descriptor.error_messages,
            &defaults.error_messages,
            &rules.messages,
        );

        let trigger = if descriptor
            .validate_on_change
            .or(defaults.validate_on_change)
            .unwrap_or(false)
        {
            ValidationTrigger::OnChange
        } else {
            ValidationTrigger::OnBlur
        };

        let mut props = defaults.props.clone();
        props.extend(
            descriptor
                .props
                .iter()
                .map(|(key, value)| (key.clone(), value.clone())),
        );

        Self {
            name: descriptor.name.clone(),
            field_type,
            is_required,
            validators,
            messages,
            trigger,
            label: descriptor.label.clone().or_else(|| defaults.label.clone()),
            placeholder: descriptor
                .placeholder
                .clone()
                .or_else(|| defaults.placeholder.clone()),
            props,
            initial_value,
            current_value: None,
            is_pristine: true,
            current_error: None,
        }
    }

    /// Replaces the initial value, discarding any edit.
    pub fn with_initial_value(mut self, value: FieldValue) -> Self {
        self.initial_value = value;
        self.reset();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn html_type(&self) -> &'static str {
        self.field_type.html_type()
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn placeholder(&self) -> Option<&str> {
        self.placeholder.as_deref()
    }

    pub fn props(&self) -> &JsonMap<String, JsonValue> {
        &self.props
    }

    pub fn requirement(&self) -> &Requirement {
        &self.is_required
    }

    pub fn validators(&self) -> &FieldValidators {
        &self.validators
    }

    pub fn messages(&self) -> &FieldMessages {
        &self.messages
    }

    pub fn trigger(&self) -> ValidationTrigger {
        self.trigger
    }

    pub fn validate_on_change(&self) -> bool {
        self.trigger == ValidationTrigger::OnChange
    }

    pub fn validate_on_blur(&self) -> bool {
        self.trigger == ValidationTrigger::OnBlur
    }

    pub fn initial_value(&self) -> &FieldValue {
        &self.initial_value
    }

    /// The edited value if any, otherwise the initial value.
    pub fn value(&self) -> &FieldValue {
        self.current_value.as_ref().unwrap_or(&self.initial_value)
    }

    pub fn is_pristine(&self) -> bool {
        self.is_pristine
    }

    pub fn is_dirty(&self) -> bool {
        !self.is_pristine
    }

    /// Verdict of the last validation, regardless of visibility.
    pub fn error(&self) -> Option<&str> {
        self.current_error.as_deref()
    }

    /// Error a renderer should show under `visibility`.
    pub fn input_error(&self, visibility: ErrorVisibility) -> Option<&str> {
        match visibility {
            ErrorVisibility::AfterValidate => self.error(),
            ErrorVisibility::AfterEdit if self.is_pristine => None,
            ErrorVisibility::AfterEdit => self.error(),
        }
    }

    /// Records user input. Any previous verdict is stale after an edit.
    pub fn set_input_value(&mut self, value: FieldValue) {
        self.current_value = Some(value);
        self.is_pristine = false;
        self.current_error = None;
    }

    pub fn validate(&mut self, values: &FormValues) -> bool {
        let required = self.is_required.resolve(values);
        self.current_error = self
            .validators
            .evaluate(self.value(), values, required, &self.messages)
            .err();
        trace!(
            field = %self.name,
            required,
            valid = self.current_error.is_none(),
            "field validated"
        );
        self.current_error.is_none()
    }

    pub fn reset(&mut self) {
        self.current_value = None;
        self.is_pristine = true;
        self.current_error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::validation::{BuiltinKind, CustomValidator, ErrorMessages};
    use rust_decimal::Decimal;

    fn create(descriptor: FieldDescriptor) -> Field {
        Field::create(&descriptor, &DefaultSettings::default(), &BuiltinRules::default())
    }

    #[test]
    fn new_field_is_pristine_with_type_default() {
        let field = create(FieldDescriptor::new("agree").kind(FieldType::Checkbox));
        assert!(field.is_pristine());
        assert_eq!(field.value(), &FieldValue::Bool(false));
        assert_eq!(field.error(), None);
        assert!(field.validate_on_blur());
    }

    #[test]
    fn descriptor_settings_win_over_defaults() {
        let defaults = DefaultSettings::new()
            .kind(FieldType::Email)
            .required(true)
            .validate_on_change(true)
            .messages(ErrorMessages::default().required("form required").email("form email"))
            .prop("size", "sm");
        let descriptor = FieldDescriptor::new("nickname")
            .kind(FieldType::Text)
            .required(false)
            .messages(ErrorMessages::default().required("field required"))
            .prop("size", "lg");
        let field = Field::create(&descriptor, &defaults, &BuiltinRules::default());

        assert_eq!(field.field_type(), FieldType::Text);
        assert!(!field.requirement().resolve(&FormValues::new()));
        assert!(field.validate_on_change());
        assert_eq!(field.messages().required, "field required");
        assert_eq!(field.messages().email, "form email");
        assert_eq!(field.props().get("size"), Some(&JsonValue::from("lg")));
    }

    #[test]
    fn fieldset_type_degrades_to_text() {
        let field = create(FieldDescriptor::new("group").kind(FieldType::Fieldset));
        assert_eq!(field.field_type(), FieldType::Text);
    }

    #[test]
    fn email_and_phone_install_builtins() {
        let email = create(FieldDescriptor::new("email").kind(FieldType::Email));
        let phone = create(FieldDescriptor::new("phone").kind(FieldType::Phone));
        assert_eq!(email.validators().builtin_kind(), Some(BuiltinKind::Email));
        assert_eq!(phone.validators().builtin_kind(), Some(BuiltinKind::Phone));
        assert_eq!(phone.html_type(), "text");
    }

    #[test]
    fn required_field_fails_until_filled() {
        let mut field = create(FieldDescriptor::new("login").required(true));
        assert!(!field.validate(&FormValues::new()));
        assert_eq!(field.error(), Some("This field is required"));

        field.set_input_value("x".into());
        assert!(field.validate(&FormValues::new()));
        assert_eq!(field.error(), None);
    }

    #[test]
    fn edit_clears_previous_verdict() {
        let mut field = create(FieldDescriptor::new("login").required(true));
        field.validate(&FormValues::new());
        field.set_input_value("".into());
        assert!(field.is_dirty());
        assert_eq!(field.error(), None);
    }

    #[test]
    fn after_edit_visibility_hides_errors_on_pristine_fields() {
        let mut field = create(FieldDescriptor::new("login").required(true));
        field.validate(&FormValues::new());
        assert_eq!(field.input_error(ErrorVisibility::AfterEdit), None);
        assert_eq!(
            field.input_error(ErrorVisibility::AfterValidate),
            Some("This field is required")
        );

        field.set_input_value("".into());
        field.validate(&FormValues::new());
        assert_eq!(
            field.input_error(ErrorVisibility::AfterEdit),
            Some("This field is required")
        );
    }

    #[test]
    fn required_predicate_is_evaluated_at_validation_time() {
        let mut field = create(FieldDescriptor::new("phone").required_when(|values: &FormValues| {
            values.get("by_phone") == Some(&FieldValue::Bool(true))
        }));
        let mut values = FormValues::new();
        assert!(field.validate(&values));

        values.insert("by_phone".into(), true.into());
        assert!(!field.validate(&values));
    }

    #[test]
    fn custom_validator_without_message_uses_default_message() {
        let mut field = create(
            FieldDescriptor::new("age")
                .kind(FieldType::Number)
                .validator(CustomValidator::new(|value: &FieldValue, _: &FormValues| {
                    value.as_decimal().is_some_and(|age| age >= Decimal::from(18))
                })),
        );
        field.set_input_value(12.into());
        assert!(!field.validate(&FormValues::new()));
        assert_eq!(field.error(), Some("Invalid field value"));
    }

    #[test]
    fn reset_restores_initial_value() {
        let mut field = create(FieldDescriptor::new("city").initial_value("Lyon"));
        field.set_input_value("Paris".into());
        field.validate(&FormValues::new());
        field.reset();
        assert_eq!(field.value(), &FieldValue::from("Lyon"));
        assert!(field.is_pristine());
        assert_eq!(field.error(), None);
    }
}
