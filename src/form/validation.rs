use std::fmt::{Debug, Formatter};
use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::controller::{FormError, FormResult};
use super::value::{FieldValue, FormValues};
use crate::i18n::{self, Locale, Translator};

/// Caller-supplied check over a field value and the current form values.
pub trait FieldPredicate: Send + Sync {
    fn check(&self, value: &FieldValue, values: &FormValues) -> bool;
}

impl<F> FieldPredicate for F
where
    F: Fn(&FieldValue, &FormValues) -> bool + Send + Sync,
{
    fn check(&self, value: &FieldValue, values: &FormValues) -> bool {
        (self)(value, values)
    }
}

/// Decides whether a field is required given the current form values.
pub trait RequiredPredicate: Send + Sync {
    fn is_required(&self, values: &FormValues) -> bool;
}

impl<F> RequiredPredicate for F
where
    F: Fn(&FormValues) -> bool + Send + Sync,
{
    fn is_required(&self, values: &FormValues) -> bool {
        (self)(values)
    }
}

/// Required-ness of a field, either fixed or computed at validation time.
#[derive(Clone)]
pub enum Requirement {
    Fixed(bool),
    When(Arc<dyn RequiredPredicate>),
}

impl Requirement {
    pub fn when<P>(predicate: P) -> Self
    where
        P: RequiredPredicate + 'static,
    {
        Requirement::When(Arc::new(predicate))
    }

    /// Evaluated on every call, never cached.
    pub fn resolve(&self, values: &FormValues) -> bool {
        match self {
            Requirement::Fixed(required) => *required,
            Requirement::When(predicate) => predicate.is_required(values),
        }
    }

    pub fn is_conditional(&self) -> bool {
        matches!(self, Requirement::When(_))
    }
}

impl Default for Requirement {
    fn default() -> Self {
        Requirement::Fixed(false)
    }
}

impl From<bool> for Requirement {
    fn from(value: bool) -> Self {
        Requirement::Fixed(value)
    }
}

impl Debug for Requirement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Requirement::Fixed(required) => f.debug_tuple("Fixed").field(required).finish(),
            Requirement::When(_) => f.write_str("When(..)"),
        }
    }
}

#[derive(Clone)]
pub struct CustomValidator {
    predicate: Arc<dyn FieldPredicate>,
    error_message: Option<String>,
}

impl CustomValidator {
    pub fn new<P>(predicate: P) -> Self
    where
        P: FieldPredicate + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
            error_message: None,
        }
    }

    pub fn with_message<P>(predicate: P, message: impl Into<String>) -> Self
    where
        P: FieldPredicate + 'static,
    {
        Self::new(predicate).message(message)
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn check(&self, value: &FieldValue, values: &FormValues) -> bool {
        self.predicate.check(value, values)
    }
}

impl Debug for CustomValidator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomValidator")
            .field("error_message", &self.error_message)
            .finish_non_exhaustive()
    }
}

/// Built-in rules attached from the field type.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum BuiltinKind {
    Email,
    Phone,
}

/// Digit-format policy for phone fields.
#[derive(Clone, Debug, Default)]
pub enum PhoneFormat {
    /// Digits optionally separated by one of space, `_`, `.`, `-`.
    #[default]
    Digits,
    /// Ten-digit French national numbers: `0[1-68]` then four digit pairs.
    FrenchNational,
    Custom(Regex),
}

impl PhoneFormat {
    pub fn custom(pattern: &str) -> FormResult<Self> {
        Regex::new(pattern)
            .map(PhoneFormat::Custom)
            .map_err(FormError::InvalidPattern)
    }

    pub fn regex(&self) -> &Regex {
        match self {
            PhoneFormat::Digits => digits_phone_re(),
            PhoneFormat::FrenchNational => french_phone_re(),
            PhoneFormat::Custom(regex) => regex,
        }
    }
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"^(?:[^<>()\[\]\\.,;:\s@"]+(?:\.[^<>()\[\]\\.,;:\s@"]+)*|".+")@(?:\[[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\]|(?:[a-zA-Z\-0-9]+\.)+[a-zA-Z]{2,})$"#,
        )
        .expect("email regex must compile")
    })
}

fn digits_phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9](?:[ _.-]?[0-9])+$").expect("phone regex must compile"))
}

fn french_phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^0[1-68](?:[ _.-]?[0-9]{2}){4}$").expect("french phone regex must compile")
    })
}

pub fn is_valid_email(text: &str) -> bool {
    email_re().is_match(text.trim())
}

pub fn is_valid_phone(text: &str, format: &PhoneFormat) -> bool {
    format.regex().is_match(text.trim())
}

#[derive(Clone, Debug)]
enum BuiltinRule {
    Email,
    Phone(PhoneFormat),
}

impl BuiltinRule {
    fn passes(&self, value: &FieldValue, required: bool) -> bool {
        if !required && !value.is_truthy() {
            return true;
        }
        let Some(text) = value.pattern_text() else {
            return false;
        };
        match self {
            BuiltinRule::Email => is_valid_email(&text),
            BuiltinRule::Phone(format) => is_valid_phone(&text, format),
        }
    }

    fn message<'a>(&self, messages: &'a FieldMessages) -> &'a str {
        match self {
            BuiltinRule::Email => &messages.email,
            BuiltinRule::Phone(_) => &messages.phone,
        }
    }
}

/// Per-kind error message overrides. Unset kinds fall through to the next
/// configuration layer.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ErrorMessages {
    #[serde(alias = "isRequired", skip_serializing_if = "Option::is_none")]
    pub required: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(alias = "validation", skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl ErrorMessages {
    pub fn required(mut self, message: impl Into<String>) -> Self {
        self.required = Some(message.into());
        self
    }

    pub fn email(mut self, message: impl Into<String>) -> Self {
        self.email = Some(message.into());
        self
    }

    pub fn phone(mut self, message: impl Into<String>) -> Self {
        self.phone = Some(message.into());
        self
    }

    pub fn default_message(mut self, message: impl Into<String>) -> Self {
        self.default = Some(message.into());
        self
    }

    pub fn get(&self, kind: MessageKind) -> Option<&str> {
        match kind {
            MessageKind::Required => self.required.as_deref(),
            MessageKind::Email => self.email.as_deref(),
            MessageKind::Phone => self.phone.as_deref(),
            MessageKind::Default => self.default.as_deref(),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum MessageKind {
    Required,
    Email,
    Phone,
    Default,
}

impl MessageKind {
    pub const ALL: [MessageKind; 4] = [
        MessageKind::Required,
        MessageKind::Email,
        MessageKind::Phone,
        MessageKind::Default,
    ];

    fn catalog_key(self) -> &'static str {
        match self {
            MessageKind::Required => i18n::REQUIRED_KEY,
            MessageKind::Email => i18n::EMAIL_KEY,
            MessageKind::Phone => i18n::PHONE_KEY,
            MessageKind::Default => i18n::DEFAULT_KEY,
        }
    }
}

/// First non-empty message among the field override, the form default and
/// the built-in text.
pub fn resolve(field_override: Option<&str>, form_default: Option<&str>, builtin: &str) -> String {
    field_override
        .filter(|message| !message.is_empty())
        .or(form_default.filter(|message| !message.is_empty()))
        .unwrap_or(builtin)
        .to_string()
}

/// Built-in message texts for one locale.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BuiltinMessages {
    required: String,
    email: String,
    phone: String,
    default: String,
}

impl BuiltinMessages {
    pub fn for_locale(locale: &Locale) -> Self {
        let translator = Translator::new(locale.clone());
        Self {
            required: translator.t(MessageKind::Required.catalog_key()),
            email: translator.t(MessageKind::Email.catalog_key()),
            phone: translator.t(MessageKind::Phone.catalog_key()),
            default: translator.t(MessageKind::Default.catalog_key()),
        }
    }

    pub fn get(&self, kind: MessageKind) -> &str {
        match kind {
            MessageKind::Required => &self.required,
            MessageKind::Email => &self.email,
            MessageKind::Phone => &self.phone,
            MessageKind::Default => &self.default,
        }
    }
}

impl Default for BuiltinMessages {
    fn default() -> Self {
        Self::for_locale(&Locale::System)
    }
}

/// Fully resolved messages of one field.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldMessages {
    pub required: String,
    pub email: String,
    pub phone: String,
    pub default: String,
}

impl FieldMessages {
    pub fn resolve(
        field_overrides: &ErrorMessages,
        form_defaults: &ErrorMessages,
        builtin: &BuiltinMessages,
    ) -> Self {
        let pick = |kind: MessageKind| {
            resolve(
                field_overrides.get(kind),
                form_defaults.get(kind),
                builtin.get(kind),
            )
        };
        Self {
            required: pick(MessageKind::Required),
            email: pick(MessageKind::Email),
            phone: pick(MessageKind::Phone),
            default: pick(MessageKind::Default),
        }
    }
}

/// Everything a field needs from the form configuration to install its
/// built-in rules.
#[derive(Clone, Debug, Default)]
pub struct BuiltinRules {
    pub messages: BuiltinMessages,
    pub phone_format: PhoneFormat,
}

/// Ordered rule set of one field: custom validators in declaration order,
/// then the type's built-in rule.
#[derive(Clone, Debug, Default)]
pub struct FieldValidators {
    custom: Vec<CustomValidator>,
    builtin: Option<BuiltinRule>,
}

impl FieldValidators {
    pub fn new(
        custom: Vec<CustomValidator>,
        builtin: Option<BuiltinKind>,
        rules: &BuiltinRules,
    ) -> Self {
        let builtin = builtin.map(|kind| match kind {
            BuiltinKind::Email => BuiltinRule::Email,
            BuiltinKind::Phone => BuiltinRule::Phone(rules.phone_format.clone()),
        });
        Self { custom, builtin }
    }

    pub fn len(&self) -> usize {
        self.custom.len() + usize::from(self.builtin.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn builtin_kind(&self) -> Option<BuiltinKind> {
        self.builtin.as_ref().map(|rule| match rule {
            BuiltinRule::Email => BuiltinKind::Email,
            BuiltinRule::Phone(_) => BuiltinKind::Phone,
        })
    }

    /// Required check first, then the rules in order, stopping at the first
    /// failure. Rules never run against an empty value.
    pub fn evaluate(
        &self,
        value: &FieldValue,
        values: &FormValues,
        required: bool,
        messages: &FieldMessages,
    ) -> Result<(), String> {
        if value.is_empty() {
            return if required {
                Err(messages.required.clone())
            } else {
                Ok(())
            };
        }

        for validator in &self.custom {
            if !validator.check(value, values) {
                return Err(validator
                    .error_message()
                    .filter(|message| !message.is_empty())
                    .unwrap_or(&messages.default)
                    .to_string());
            }
        }

        if let Some(rule) = &self.builtin {
            if !rule.passes(value, required) {
                return Err(rule.message(messages).to_string());
            }
        }

        Ok(())
    }
}
