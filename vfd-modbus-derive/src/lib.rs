//! Macros to `derive` the `vfd-modbus` register block trait

use proc_macro::TokenStream;
use quote::quote;

mod entry;
mod mapping;
mod utils;

/// Derive macro to implement `vfd_modbus::core::RegisterBlock`
///
/// Every field needs a `modbus` attribute with the logical `addr` of its first register
/// and optionally a `unit`. The field type (`u16`, `i16`, `u32` or `i32`, big-endian)
/// decides how many words it spans. Gaps between fields are read and skipped.
#[proc_macro_derive(RegisterBlock, attributes(modbus))]
pub fn derive_register_block(input: TokenStream) -> TokenStream {
    let ast = syn::parse_macro_input!(input as syn::DeriveInput);

    let name = &ast.ident;

    let mapping = mapping::Mapping::new(&ast);
    mapping.check_layout(&name.to_string());

    let field_name = mapping.field_name_vec();
    let ty = mapping.ty_vec();
    let offset = mapping.offset_vec();
    let cnt = mapping.cnt_vec();

    let (start, end) = mapping.register_range();
    let len = end - start;

    let tokens = quote! {
        impl vfd_modbus::core::RegisterBlock for #name {
            const START: vfd_modbus::codec::Address = #start;
            const COUNT: vfd_modbus::codec::Quantity = #len;

            fn from_words(words: &[vfd_modbus::codec::Word]) -> Result<Self, vfd_modbus::codec::WordsCountError> {
                if words.len() != #len as usize {
                    return Err(vfd_modbus::codec::WordsCountError {
                        expected: #len as usize,
                        actual: words.len(),
                    });
                }
                Ok(Self {
                    #(
                        #field_name: <#ty as vfd_modbus::codec::Decode>::from_be_words(
                            &words[#offset as usize..(#offset + #cnt) as usize],
                        )?,
                    )*
                })
            }
        }
    };

    tokens.into()
}

#[proc_macro_attribute]
pub fn modbus_doc(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut ast = syn::parse_macro_input!(item as syn::DeriveInput);
    match &mut ast.data {
        syn::Data::Struct(ref mut struct_data) => {
            match &mut struct_data.fields {
                syn::Fields::Named(fields_named) => {
                    for field in &mut fields_named.named {
                        if field
                            .attrs
                            .iter()
                            .any(|attr| attr.path().is_ident("modbus"))
                        {
                            let entry: entry::Entry = field.clone().into();
                            let unit = if entry.unit.is_empty() {
                                "raw".to_string()
                            } else {
                                entry.unit.clone()
                            };
                            let doc = format!(
                                "logical address - `{}`, data type - `{:?}` (`{}` registers), unit - `{}`.",
                                entry.addr,
                                entry.ty,
                                entry.ty.word_size(),
                                unit
                            );
                            let doc: syn::Attribute = syn::parse_quote!(#[doc = #doc]);
                            field.attrs.push(doc);
                        }
                    }
                }
                _ => panic!("`modbus_doc` has to be applied to structs with named fields"),
            }

            quote! {
                #ast
            }
            .into()
        }
        _ => panic!("`modbus_doc` has to be applied with structs"),
    }
}
