//! Expansion of `#[derive(Record)]`.
//!
//! Generates one setter function per hydrated field plus a static descriptor
//! table wiring column names (and camelCase aliases) to those setters.

use heck::ToLowerCamelCase;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Error, Field, Fields, LitStr, Result};

#[derive(Default)]
struct FieldAttrs {
    column: Option<String>,
    skip: bool,
}

pub(crate) fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(Error::new_spanned(
            &input.generics,
            "Record cannot be derived for generic types",
        ));
    }
    let Data::Struct(data) = &input.data else {
        return Err(Error::new_spanned(
            name,
            "Record can only be derived for structs",
        ));
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(Error::new_spanned(
            name,
            "Record requires a struct with named fields",
        ));
    };

    let mut setters = Vec::new();
    let mut entries = Vec::new();
    for field in &fields.named {
        let Some(ident) = &field.ident else {
            return Err(Error::new_spanned(field, "expected a named field"));
        };
        let attrs = parse_field_attrs(field)?;
        if attrs.skip {
            continue;
        }
        let ty = &field.ty;
        let column = attrs.column.clone().unwrap_or_else(|| ident.to_string());
        // An explicit column is taken literally; otherwise the camelCase
        // spelling of the field doubles as an alias when it differs.
        let alias = if attrs.column.is_none() {
            let camel = column.to_lower_camel_case();
            (camel != column).then_some(camel)
        } else {
            None
        };
        let alias_tokens = match &alias {
            Some(alias) => quote! { ::core::option::Option::Some(#alias) },
            None => quote! { ::core::option::Option::None },
        };
        let setter = format_ident!("set_{}", ident);
        setters.push(quote! {
            fn #setter(
                record: &mut #name,
                value: &::sqlbind::Value,
            ) -> ::core::result::Result<(), ::sqlbind::TypeMismatch> {
                record.#ident = <#ty as ::sqlbind::FromValue>::from_value(value)?;
                ::core::result::Result::Ok(())
            }
        });
        entries.push(quote! {
            ::sqlbind::RecordColumn {
                name: #column,
                alias: #alias_tokens,
                set: #setter,
            }
        });
    }

    Ok(quote! {
        impl ::sqlbind::Record for #name {
            fn columns() -> &'static [::sqlbind::RecordColumn<#name>] {
                #(#setters)*
                static COLUMNS: &[::sqlbind::RecordColumn<#name>] = &[#(#entries),*];
                COLUMNS
            }
        }
    })
}

fn parse_field_attrs(field: &Field) -> Result<FieldAttrs> {
    let mut attrs = FieldAttrs::default();
    for attr in &field.attrs {
        if !attr.path().is_ident("record") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("column") {
                let value: LitStr = meta.value()?.parse()?;
                attrs.column = Some(value.value());
                Ok(())
            } else if meta.path.is_ident("skip") {
                attrs.skip = true;
                Ok(())
            } else {
                Err(meta.error("unsupported record attribute"))
            }
        })?;
    }
    Ok(attrs)
}
