pub use crate::form::{
    CustomValidator, DefaultSettings, ErrorMessages, ErrorVisibility, FieldDescriptor, FieldType,
    FieldValue, FormController, FormError, FormOptions, FormResult, FormSchema, FormState,
    FormValues, LookupPolicy, PhoneFormat, RemoteValuePolicy,
};
pub use crate::i18n::{Locale, Translator};
