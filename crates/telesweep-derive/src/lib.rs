//! Provides derive macros for `sweep::Identity`.
use quote::quote;
use syn::{Data, DataStruct, DeriveInput, Field, Fields, FieldsNamed};

#[derive(Debug, Default)]
struct FieldDetails {
    rename: Option<syn::LitStr>,
    skip: bool,
}

fn get_field_details(field: &Field) -> syn::Result<FieldDetails> {
    let mut details = FieldDetails::default();
    for att in field.attrs.iter() {
        if att.path().is_ident("identity") {
            att.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    let value = meta.value()?;
                    let name: syn::LitStr = value.parse()?;
                    details.rename = Some(name);
                    Ok(())
                } else if meta.path.is_ident("skip") {
                    details.skip = true;
                    Ok(())
                } else {
                    Err(meta.error(format!(
                        "unsupported field attribute {:?} - must be one of \
                         'rename' or 'skip'",
                        meta.path
                            .get_ident()
                            .map(|id| id.to_string())
                            .unwrap_or("unknown".to_string())
                    )))
                }
            })?;
        }
    }
    Ok(details)
}

fn get_attributes_body(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let fields = match &input.data {
        Data::Struct(DataStruct {
            fields: Fields::Named(FieldsNamed { named, .. }),
            ..
        }) => named,
        _ => {
            return Err(syn::Error::new(
                name.span(),
                "deriving Identity only supports structs with named fields".to_string(),
            ));
        }
    };

    let mut pairs = vec![];
    for field in fields.iter() {
        let details = get_field_details(field)?;
        if details.skip {
            continue;
        }
        // UNWRAP: safe because we only support structs with named fields
        let ident = field.ident.clone().unwrap();
        let attribute_name = details
            .rename
            .map(|lit| lit.value())
            .unwrap_or_else(|| ident.to_string());
        pairs.push(quote! {
            .with(#attribute_name, ::std::string::ToString::to_string(&self.#ident))
        });
    }

    Ok(quote! {
        sweep::Attributes::new()
            #(#pairs)*
    })
}

#[proc_macro_derive(Identity, attributes(identity))]
pub fn derive_identity(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input: DeriveInput = syn::parse_macro_input!(input);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let body = match get_attributes_body(&input) {
        Ok(body) => body,
        Err(e) => return e.into_compile_error().into(),
    };

    let output = quote! {
        impl #impl_generics sweep::Identity for #name #ty_generics #where_clause {
            fn attributes(&self) -> sweep::Attributes {
                #body
            }
        }
    };
    output.into()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn named_fields_become_attributes() {
        let input: DeriveInput = syn::parse_quote! {
            struct Delegation {
                #[identity(rename = "assessment_id")]
                assessment: String,
                id: String,
                #[identity(skip)]
                token: String,
            }
        };
        let body = get_attributes_body(&input).unwrap().to_string();
        assert!(body.contains("\"assessment_id\""), "{body}");
        assert!(body.contains("\"id\""), "{body}");
        assert!(!body.contains("token"), "{body}");
        assert!(!body.contains("\"assessment\""), "{body}");
    }

    #[test]
    fn tuple_structs_are_rejected() {
        let input: DeriveInput = syn::parse_quote! {
            struct Id(String);
        };
        let err = get_attributes_body(&input).unwrap_err();
        assert_eq!(
            "deriving Identity only supports structs with named fields",
            err.to_string()
        );
    }

    #[test]
    fn enums_are_rejected() {
        let input: DeriveInput = syn::parse_quote! {
            enum Kind { A, B }
        };
        assert!(get_attributes_body(&input).is_err());
    }

    #[test]
    fn unknown_field_attributes_are_rejected() {
        let input: DeriveInput = syn::parse_quote! {
            struct Id {
                #[identity(alias = "name")]
                id: String,
            }
        };
        let err = get_attributes_body(&input).unwrap_err().to_string();
        assert!(err.contains("unsupported field attribute"), "{err}");
        assert!(err.contains("alias"), "{err}");
    }
}
