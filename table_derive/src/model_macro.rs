use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, parse_quote, Data, DeriveInput, Error, Fields};

use crate::parsing::has_attribute;

/// Adds the derives a repository needs and flattens the `#[lifecycle]`
/// field so its four columns sit next to the model's own.
pub fn model_attribute(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let DeriveInput {
        attrs,
        vis,
        ident: name,
        generics,
        data,
    } = parse_macro_input!(item as DeriveInput);

    let mut fields = match data {
        Data::Struct(data) => match data.fields {
            Fields::Named(fields) => fields,
            _ => {
                return Error::new_spanned(&name, "model requires named fields")
                    .to_compile_error()
                    .into()
            }
        },
        _ => {
            return Error::new_spanned(&name, "model can only be used on structs")
                .to_compile_error()
                .into()
        }
    };

    for field in fields.named.iter_mut() {
        if has_attribute(&field.attrs, "lifecycle") {
            field.attrs.push(parse_quote!(#[serde(flatten)]));
        }
    }

    let expanded = quote! {
        #[derive(Debug, Clone, serde::Serialize, serde::Deserialize, TableMetadata)]
        #(#attrs)*
        #vis struct #name #generics #fields
    };

    TokenStream::from(expanded)
}
