mod controller;
mod descriptor;
mod field;
mod field_type;
mod schema;
pub mod store;
mod validation;
mod value;


pub use calmform_derive::FormSchema;
pub use controller::{
    ErrorVisibility, FormController, FormError, FormOptions, FormResult, LookupPolicy,
    RemoteValuePolicy,
};
pub use descriptor::{DefaultSettings, DefaultSettingsConfig, DescriptorConfig, FieldDescriptor};
pub use field::{Field, ValidationTrigger};
pub use field_type::{DefaultValue, FieldType, TypeProfile};
pub use schema::FormSchema;
pub use store::{FormState, ValidationResult};
pub use validation::{
    BuiltinKind, BuiltinMessages, BuiltinRules, CustomValidator, ErrorMessages, FieldMessages,
    FieldPredicate, FieldValidators, MessageKind, PhoneFormat, RequiredPredicate, Requirement,
    is_valid_email, is_valid_phone, resolve as resolve_message,
};
pub use value::{FieldValue, FormValues};
