use calmform::form::{FieldType, FormController, FormSchema};

#[allow(dead_code)]
#[derive(calmform::form::FormSchema)]
struct ContactForm {
    #[form(required, label = "Name")]
    name: String,
    #[form(kind = "email", validate_on_change)]
    email: String,
    #[form(rename = "opt_in")]
    newsletter: bool,
}

fn main() {
    let fields = ContactForm::fields();
    assert_eq!(fields.email(), "email");
    assert_eq!(fields.newsletter(), "opt_in");

    let descriptors = ContactForm::descriptors();
    assert_eq!(descriptors.len(), 3);
    assert_eq!(descriptors[1].field_type, Some(FieldType::Email));

    let controller = FormController::from_descriptors(descriptors);
    controller.initialize(None).expect("initialize form");
    assert!(!controller.validate_form().expect("validate form"));
    controller.set_field_value(fields.name(), "Ada").expect("set name");
    assert!(controller.validate_form().expect("validate form"));
}
