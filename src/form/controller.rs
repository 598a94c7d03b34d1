use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;
use thiserror::Error;
use tracing::{debug, trace};

use super::descriptor::{DefaultSettings, FieldDescriptor};
use super::field::Field;
use super::store::{self, FormState};
use super::validation::{BuiltinMessages, BuiltinRules, PhoneFormat};
use super::value::{FieldValue, FormValues};
use crate::i18n::Locale;

#[derive(Debug, Error)]
pub enum FormError {
    #[error("form state lock poisoned while {0}")]
    StatePoisoned(&'static str),
    #[error("unknown form field `{name}`")]
    UnknownField { name: String },
    #[error("form has not been initialized")]
    NotInitialized,
    #[error("invalid form configuration: {0}")]
    Config(#[from] serde_json::Error),
    #[error("invalid phone pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

pub type FormResult<T> = Result<T, FormError>;

/// What the controller does with a field name absent from the form.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LookupPolicy {
    #[default]
    Ignore,
    Reject,
}

/// When a field's error becomes visible to a renderer.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ErrorVisibility {
    /// As soon as validation produced it.
    #[default]
    AfterValidate,
    /// Only once the user edited the field.
    AfterEdit,
}

/// Which remote values override a field's initial value.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum RemoteValuePolicy {
    /// Truthy values only: `null`, `""`, `false` and `0` are skipped.
    #[default]
    Truthy,
    /// Every value present in the map, falsy ones included.
    Present,
}

impl RemoteValuePolicy {
    pub fn accepts(self, value: &FieldValue) -> bool {
        match self {
            RemoteValuePolicy::Truthy => value.is_truthy(),
            RemoteValuePolicy::Present => true,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct FormOptions {
    pub lookup_policy: LookupPolicy,
    pub error_visibility: ErrorVisibility,
    pub remote_values: RemoteValuePolicy,
    pub phone_format: PhoneFormat,
    pub locale: Locale,
}

impl FormOptions {
    pub fn builtin_rules(&self) -> BuiltinRules {
        BuiltinRules {
            messages: BuiltinMessages::for_locale(&self.locale),
            phone_format: self.phone_format.clone(),
        }
    }
}

struct ControllerState {
    descriptors: Vec<FieldDescriptor>,
    defaults: DefaultSettings,
    remote_values: Option<FormValues>,
    form: Option<FormState>,
}

impl ControllerState {
    /// Fresh form whose revision continues after the current one.
    fn generate(&self, options: &FormOptions) -> FormState {
        let form = store::generate_form_data(
            &self.descriptors,
            &self.defaults,
            self.remote_values.as_ref(),
            options,
        );
        match &self.form {
            Some(previous) => form.succeeding(previous),
            None => form,
        }
    }
}

/// Shared handle over one form. Clones observe the same state.
#[derive(Clone)]
pub struct FormController {
    options: FormOptions,
    state: Arc<RwLock<ControllerState>>,
}

impl FormController {
    pub fn new(
        descriptors: Vec<FieldDescriptor>,
        defaults: DefaultSettings,
        options: FormOptions,
    ) -> Self {
        Self {
            options,
            state: Arc::new(RwLock::new(ControllerState {
                descriptors,
                defaults,
                remote_values: None,
                form: None,
            })),
        }
    }

    pub fn from_descriptors(descriptors: Vec<FieldDescriptor>) -> Self {
        Self::new(descriptors, DefaultSettings::default(), FormOptions::default())
    }

    pub fn options(&self) -> &FormOptions {
        &self.options
    }

    /// Generates the form, replacing any current state. `remote_values` are
    /// merged over the ones already known and seed this and later resets.
    pub fn initialize(&self, remote_values: Option<FormValues>) -> FormResult<()> {
        let mut state = write_lock(&self.state, "initializing form")?;
        if let Some(remote_values) = remote_values {
            state
                .remote_values
                .get_or_insert_with(FormValues::new)
                .extend(remote_values);
        }
        let form = state.generate(&self.options);
        debug!(fields = form.len(), "form initialized");
        state.form = Some(form);
        Ok(())
    }

    pub fn is_initialized(&self) -> FormResult<bool> {
        Ok(read_lock(&self.state, "reading initialization")?
            .form
            .is_some())
    }

    /// Current value of every field; empty before initialization.
    pub fn values(&self) -> FormResult<FormValues> {
        Ok(read_lock(&self.state, "reading form values")?
            .form
            .as_ref()
            .map(FormState::values)
            .unwrap_or_default())
    }

    pub fn snapshot(&self) -> FormResult<Option<FormState>> {
        Ok(read_lock(&self.state, "creating form snapshot")?.form.clone())
    }

    pub fn field(&self, name: &str) -> FormResult<Option<Field>> {
        let state = read_lock(&self.state, "reading field")?;
        Ok(state
            .form
            .as_ref()
            .and_then(|form| form.get(name))
            .cloned())
    }

    pub fn set_field_value(&self, name: &str, value: impl Into<FieldValue>) -> FormResult<()> {
        let value = value.into();
        self.update_field(name, "setting field value", move |form| {
            store::update_form_field(form, name, value)
        })
    }

    pub fn validate_field(&self, name: &str) -> FormResult<()> {
        self.update_field(name, "validating field", |form| {
            store::validate_field(form, name)
        })
    }

    /// Validates the field when it validates on blur; on-change fields are
    /// left as they are.
    pub fn blur_field(&self, name: &str) -> FormResult<()> {
        self.update_field(name, "blurring field", |form| {
            match form.get(name) {
                Some(field) if field.validate_on_blur() => store::validate_field(form, name),
                _ => form.clone(),
            }
        })
    }

    pub fn validate_form(&self) -> FormResult<bool> {
        let mut state = write_lock(&self.state, "validating form")?;
        let form = state.form.as_ref().ok_or(FormError::NotInitialized)?;
        let result = store::validate_form(form);
        state.form = Some(result.updated_state);
        Ok(result.is_valid)
    }

    /// Visible error of the named field under the configured visibility.
    pub fn get_field_error(&self, name: &str) -> FormResult<Option<String>> {
        let state = read_lock(&self.state, "reading field error")?;
        let Some(form) = state.form.as_ref() else {
            return self.missing_form();
        };
        let Some(field) = form.get(name) else {
            return self.unknown_field(name);
        };
        Ok(field
            .input_error(self.options.error_visibility)
            .map(str::to_string))
    }

    pub fn field_errors(&self) -> FormResult<IndexMap<String, String>> {
        let state = read_lock(&self.state, "reading field errors")?;
        Ok(state
            .form
            .as_ref()
            .map(|form| form.errors(self.options.error_visibility))
            .unwrap_or_default())
    }

    /// Whether no field carries an error, without running validation.
    pub fn is_valid(&self) -> FormResult<bool> {
        let state = read_lock(&self.state, "reading form validity")?;
        let form = state.form.as_ref().ok_or(FormError::NotInitialized)?;
        Ok(!form.has_errors())
    }

    /// Regenerates the form from the descriptors, default settings and the
    /// remote values known now. Every edit is discarded.
    pub fn reset_form(&self) -> FormResult<()> {
        let mut state = write_lock(&self.state, "resetting form")?;
        let form = state.generate(&self.options);
        debug!(fields = form.len(), "form reset");
        state.form = Some(form);
        Ok(())
    }

    /// Replaces the descriptor set. An initialized form is regenerated.
    pub fn set_descriptors(&self, descriptors: Vec<FieldDescriptor>) -> FormResult<()> {
        let mut state = write_lock(&self.state, "replacing descriptors")?;
        state.descriptors = descriptors;
        if state.form.is_some() {
            let form = state.generate(&self.options);
            debug!(fields = form.len(), "form regenerated for new descriptors");
            state.form = Some(form);
        }
        Ok(())
    }

    /// Records late remote values for future resets and merges them into the
    /// current form. Fields they do not name keep their state.
    pub fn apply_remote_values(&self, remote_values: FormValues) -> FormResult<()> {
        let mut state = write_lock(&self.state, "applying remote values")?;
        if let Some(form) = state.form.as_ref() {
            let merged = store::merge_remote_values(form, &remote_values, &self.options);
            state.form = Some(merged);
        }
        state
            .remote_values
            .get_or_insert_with(FormValues::new)
            .extend(remote_values);
        Ok(())
    }

    fn update_field(
        &self,
        name: &str,
        context: &'static str,
        update: impl FnOnce(&FormState) -> FormState,
    ) -> FormResult<()> {
        let mut state = write_lock(&self.state, context)?;
        let Some(form) = state.form.as_ref() else {
            return self.missing_form();
        };
        if !form.contains(name) {
            return self.unknown_field(name);
        }
        let next = update(form);
        trace!(field = name, revision = next.revision(), context, "field state replaced");
        state.form = Some(next);
        Ok(())
    }

    fn missing_form<T: Default>(&self) -> FormResult<T> {
        match self.options.lookup_policy {
            LookupPolicy::Ignore => Ok(T::default()),
            LookupPolicy::Reject => Err(FormError::NotInitialized),
        }
    }

    fn unknown_field<T: Default>(&self, name: &str) -> FormResult<T> {
        match self.options.lookup_policy {
            LookupPolicy::Ignore => {
                trace!(field = name, "ignoring unknown field");
                Ok(T::default())
            }
            LookupPolicy::Reject => Err(FormError::UnknownField {
                name: name.to_string(),
            }),
        }
    }
}

pub(super) fn read_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockReadGuard<'a, T>> {
    lock.read().map_err(|_| FormError::StatePoisoned(context))
}

pub(super) fn write_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockWriteGuard<'a, T>> {
    lock.write().map_err(|_| FormError::StatePoisoned(context))
}
