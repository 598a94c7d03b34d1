use proc_macro::TokenStream;
use proc_macro2::{Ident, Span, TokenStream as TokenStream2};
use proc_macro_crate::{FoundCrate, crate_name};
use quote::{format_ident, quote};
use syn::{Attribute, Data, DeriveInput, Fields, LitStr, Type, parse_macro_input};

// Field kinds a struct field may declare. Groups have no struct counterpart.
const KINDS: &[&str] = &[
    "text", "number", "email", "phone", "password", "hidden", "textarea", "checkbox", "radio",
    "custom",
];

#[proc_macro_derive(FormSchema, attributes(form))]
pub fn derive_form_schema(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    if !input.generics.params.is_empty() {
        return syn::Error::new_spanned(
            input.ident,
            "FormSchema derive currently supports only non-generic structs",
        )
        .to_compile_error()
        .into();
    }

    let schema_ident = input.ident;
    let fields_struct_ident = format_ident!("{schema_ident}Fields");

    let named_fields = match input.data {
        Data::Struct(data) => match data.fields {
            Fields::Named(fields) => fields.named,
            _ => {
                return syn::Error::new(
                    Span::call_site(),
                    "FormSchema derive requires a struct with named fields",
                )
                .to_compile_error()
                .into();
            }
        },
        _ => {
            return syn::Error::new(
                Span::call_site(),
                "FormSchema derive is only supported on structs",
            )
            .to_compile_error()
            .into();
        }
    };

    let calmform = calmform_path();
    let mut descriptors = Vec::new();
    let mut fields_methods = Vec::new();

    for field in named_fields {
        let Some(field_ident) = field.ident else {
            continue;
        };
        let attrs = match FieldAttrs::parse(&field.attrs) {
            Ok(attrs) => attrs,
            Err(error) => return error.to_compile_error().into(),
        };
        if attrs.skip {
            continue;
        }

        let field_name = attrs
            .rename
            .clone()
            .unwrap_or_else(|| field_ident.to_string());
        let kind = attrs
            .kind
            .clone()
            .or_else(|| is_bool(&field.ty).then(|| "checkbox".to_string()));

        let mut descriptor = quote! {
            #calmform::form::FieldDescriptor::new(#field_name)
        };
        if let Some(kind) = kind {
            let variant = Ident::new(&to_pascal_case(&kind), Span::call_site());
            descriptor.extend(quote! { .kind(#calmform::form::FieldType::#variant) });
        }
        if attrs.required {
            descriptor.extend(quote! { .required(true) });
        }
        if attrs.validate_on_change {
            descriptor.extend(quote! { .validate_on_change(true) });
        }
        if let Some(label) = &attrs.label {
            descriptor.extend(quote! { .label(#label) });
        }
        if let Some(placeholder) = &attrs.placeholder {
            descriptor.extend(quote! { .placeholder(#placeholder) });
        }
        descriptors.push(descriptor);

        fields_methods.push(quote! {
            pub const fn #field_ident(&self) -> &'static str {
                #field_name
            }
        });
    }

    quote! {
        #[derive(Clone, Copy, Debug, Default)]
        pub struct #fields_struct_ident;

        impl #fields_struct_ident {
            #(#fields_methods)*
        }

        impl #calmform::form::FormSchema for #schema_ident {
            type Fields = #fields_struct_ident;

            fn fields() -> Self::Fields {
                #fields_struct_ident
            }

            fn descriptors() -> ::std::vec::Vec<#calmform::form::FieldDescriptor> {
                ::std::vec![#(#descriptors),*]
            }
        }
    }
    .into()
}

#[derive(Default)]
struct FieldAttrs {
    kind: Option<String>,
    required: bool,
    validate_on_change: bool,
    label: Option<String>,
    placeholder: Option<String>,
    rename: Option<String>,
    skip: bool,
}

impl FieldAttrs {
    fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut parsed = Self::default();
        for attr in attrs.iter().filter(|attr| attr.path().is_ident("form")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("kind") {
                    let lit: LitStr = meta.value()?.parse()?;
                    let kind = lit.value().trim().to_ascii_lowercase();
                    if !KINDS.contains(&kind.as_str()) {
                        return Err(syn::Error::new_spanned(
                            lit,
                            format!("unknown field kind, expected one of: {}", KINDS.join(", ")),
                        ));
                    }
                    parsed.kind = Some(kind);
                } else if meta.path.is_ident("required") {
                    parsed.required = true;
                } else if meta.path.is_ident("validate_on_change") {
                    parsed.validate_on_change = true;
                } else if meta.path.is_ident("label") {
                    parsed.label = Some(meta.value()?.parse::<LitStr>()?.value());
                } else if meta.path.is_ident("placeholder") {
                    parsed.placeholder = Some(meta.value()?.parse::<LitStr>()?.value());
                } else if meta.path.is_ident("rename") {
                    parsed.rename = Some(meta.value()?.parse::<LitStr>()?.value());
                } else if meta.path.is_ident("skip") {
                    parsed.skip = true;
                } else {
                    return Err(meta.error("unsupported form attribute"));
                }
                Ok(())
            })?;
        }
        Ok(parsed)
    }
}

fn is_bool(ty: &Type) -> bool {
    matches!(ty, Type::Path(path) if path.qself.is_none() && path.path.is_ident("bool"))
}

fn calmform_path() -> TokenStream2 {
    match crate_name("calmform") {
        Ok(FoundCrate::Name(name)) => {
            let ident = Ident::new(&name, Span::call_site());
            quote!(::#ident)
        }
        Ok(FoundCrate::Itself) => quote!(crate),
        Err(_) => quote!(::calmform),
    }
}

fn to_pascal_case(input: &str) -> String {
    let mut out = String::new();
    for segment in input.split('_') {
        if segment.is_empty() {
            continue;
        }
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            out.push(first.to_ascii_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}
