use super::descriptor::FieldDescriptor;

/// A struct whose named fields describe a form.
///
/// Usually derived with `#[derive(FormSchema)]`; every field becomes one
/// descriptor, customized through `#[form(...)]` attributes.
pub trait FormSchema {
    /// Name accessors, one `const fn` per field.
    type Fields;

    fn fields() -> Self::Fields;

    fn descriptors() -> Vec<FieldDescriptor>;
}
