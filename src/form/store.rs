//! Normalized form snapshots and the pure operations over them.
//!
//! Every operation takes a snapshot by reference and hands back a snapshot.
//! Fields live behind `Arc`, so a new snapshot only copies the fields it
//! touches; an operation that changes nothing returns the very same snapshot.

use std::sync::Arc;

use indexmap::IndexMap;
use indexmap::map::Entry;
use tracing::{debug, trace, warn};

use super::controller::{ErrorVisibility, FormOptions};
use super::descriptor::{DefaultSettings, FieldDescriptor};
use super::field::Field;
use super::value::{FieldValue, FormValues};

/// Immutable view of every field of a form at one point in time.
#[derive(Clone, Debug)]
pub struct FormState {
    fields: Arc<IndexMap<String, Arc<Field>>>,
    revision: u64,
}

impl FormState {
    fn from_fields(fields: IndexMap<String, Arc<Field>>, revision: u64) -> Self {
        Self {
            fields: Arc::new(fields),
            revision,
        }
    }

    /// Copies the field table, applies `update`, and stamps the next revision.
    fn derive(&self, update: impl FnOnce(&mut IndexMap<String, Arc<Field>>)) -> Self {
        let mut fields = (*self.fields).clone();
        update(&mut fields);
        Self::from_fields(fields, self.revision + 1)
    }

    /// Restamps a regenerated form so its revision follows `previous`.
    pub fn succeeding(mut self, previous: &FormState) -> Self {
        self.revision = previous.revision + 1;
        self
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name).map(Arc::as_ref)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.values().map(Arc::as_ref)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Current value of every field, in form order.
    pub fn values(&self) -> FormValues {
        self.iter()
            .map(|field| (field.name().to_string(), field.value().clone()))
            .collect()
    }

    /// Visible errors keyed by field name.
    pub fn errors(&self, visibility: ErrorVisibility) -> IndexMap<String, String> {
        self.iter()
            .filter_map(|field| {
                field
                    .input_error(visibility)
                    .map(|error| (field.name().to_string(), error.to_string()))
            })
            .collect()
    }

    /// Whether any field currently carries an error. Fields that were never
    /// validated count as valid.
    pub fn has_errors(&self) -> bool {
        self.iter().any(|field| field.error().is_some())
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Identity comparison: true only for the very same snapshot.
    pub fn same_snapshot(&self, other: &FormState) -> bool {
        Arc::ptr_eq(&self.fields, &other.fields)
    }
}

#[derive(Clone, Debug)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub updated_state: FormState,
}

/// Expands `fieldset` descriptors into their children, one level deep.
pub fn flatten_descriptors(descriptors: &[FieldDescriptor]) -> Vec<&FieldDescriptor> {
    let mut flat = Vec::with_capacity(descriptors.len());
    for descriptor in descriptors {
        if !descriptor.is_fieldset() {
            flat.push(descriptor);
            continue;
        }
        for child in &descriptor.children {
            if child.is_fieldset() {
                warn!(
                    fieldset = %descriptor.name,
                    nested = %child.name,
                    "nested fieldsets are not supported, dropping"
                );
                continue;
            }
            flat.push(child);
        }
    }
    flat
}

/// Builds a fresh snapshot with one pristine field per named descriptor.
pub fn generate_form_data(
    descriptors: &[FieldDescriptor],
    defaults: &DefaultSettings,
    remote_values: Option<&FormValues>,
    options: &FormOptions,
) -> FormState {
    let rules = options.builtin_rules();
    let mut fields = IndexMap::<String, Arc<Field>>::new();
    let mut skipped = 0usize;

    for descriptor in flatten_descriptors(descriptors) {
        if descriptor.name.is_empty() {
            skipped += 1;
            continue;
        }

        let mut field = Field::create(descriptor, defaults, &rules);
        if let Some(remote) = remote_values.and_then(|values| values.get(&descriptor.name)) {
            if options.remote_values.accepts(remote) {
                field = field.with_initial_value(remote.clone());
            }
        }

        match fields.entry(descriptor.name.clone()) {
            Entry::Occupied(mut entry) => {
                warn!(
                    field = %descriptor.name,
                    "duplicate field name, keeping the last descriptor"
                );
                entry.insert(Arc::new(field));
            }
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(field));
            }
        }
    }

    debug!(fields = fields.len(), skipped, "form data generated");
    FormState::from_fields(fields, 0)
}

/// Records `value` on the named field, validating it when it validates on
/// change. Unknown names return `state` itself.
pub fn update_form_field(state: &FormState, name: &str, value: FieldValue) -> FormState {
    if !state.contains(name) {
        trace!(field = name, "update ignored, unknown field");
        return state.clone();
    }

    state.derive(|fields| {
        let validate_on_change = fields.get_mut(name).is_some_and(|field| {
            let field = Arc::make_mut(field);
            field.set_input_value(value);
            field.validate_on_change()
        });
        if validate_on_change {
            let values = project_values(fields);
            if let Some(field) = fields.get_mut(name) {
                Arc::make_mut(field).validate(&values);
            }
        }
        trace!(field = name, validate_on_change, "field updated");
    })
}

/// Validates exactly the named field. Unknown names return `state` itself.
pub fn validate_field(state: &FormState, name: &str) -> FormState {
    if !state.contains(name) {
        trace!(field = name, "validation ignored, unknown field");
        return state.clone();
    }

    let values = state.values();
    state.derive(|fields| {
        if let Some(field) = fields.get_mut(name) {
            Arc::make_mut(field).validate(&values);
        }
    })
}

/// Validates every field in form order without short-circuiting.
pub fn validate_form(state: &FormState) -> ValidationResult {
    let values = state.values();
    let mut is_valid = true;
    let updated_state = state.derive(|fields| {
        for field in fields.values_mut() {
            let field_valid = Arc::make_mut(field).validate(&values);
            is_valid = is_valid && field_valid;
        }
    });
    debug!(is_valid, fields = updated_state.len(), "form validated");
    ValidationResult {
        is_valid,
        updated_state,
    }
}

/// Returns every field to its initial value with no error.
pub fn reset_form(state: &FormState) -> FormState {
    let reset = state.derive(|fields| {
        for field in fields.values_mut() {
            Arc::make_mut(field).reset();
        }
    });
    debug!(fields = reset.len(), "form reset");
    reset
}

/// Applies late remote values through the update path. Fields not named in
/// `remote_values` keep their state; values the policy rejects are skipped.
pub fn merge_remote_values(
    state: &FormState,
    remote_values: &FormValues,
    options: &FormOptions,
) -> FormState {
    let mut merged = state.clone();
    for (name, value) in remote_values {
        if options.remote_values.accepts(value) {
            merged = update_form_field(&merged, name, value.clone());
        }
    }
    debug!(
        remote = remote_values.len(),
        changed = !merged.same_snapshot(state),
        "remote values merged"
    );
    merged
}

fn project_values(fields: &IndexMap<String, Arc<Field>>) -> FormValues {
    fields
        .iter()
        .map(|(name, field)| (name.clone(), field.value().clone()))
        .collect()
}
