use crate::utils::{find_lit, get_punctuated, panic_no_key, panic_not_literal};
use proc_macro2::{Ident, Span};
use syn::{punctuated::Punctuated, token::Comma, ExprAssign, Field, Lit, Type};

#[derive(Debug, Clone)]
/// Single register entry of a block. Parsed from field attributes and to be used in proc macros
pub struct Entry {
    pub field_name: String,
    pub addr: Address,
    pub ty: DataType,
    pub unit: String,
}

pub type Address = u16;
pub type Quantity = u16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    U16,
    I16,
    U32,
    I32,
}

impl DataType {
    fn from_field_ty(value: &str, field_name: &str) -> Self {
        match value {
            "u16" => DataType::U16,
            "i16" => DataType::I16,
            "u32" => DataType::U32,
            "i32" => DataType::I32,
            s => panic!(
                "Unsupported type `{s}` for `{field_name}` field. Use one of `u16`, `i16`, `u32` or `i32`."
            ),
        }
    }

    pub fn word_size(&self) -> Quantity {
        match self {
            DataType::U16 | DataType::I16 => 1,
            DataType::U32 | DataType::I32 => 2,
        }
    }
}

impl From<Field> for Entry {
    fn from(value: Field) -> Self {
        let field_name = value
            .ident
            .unwrap_or_else(|| panic!("Unexpected unnamed struct field."))
            .to_string();

        let ty = match value.ty {
            Type::Path(type_path) => {
                let ident = type_path.path.get_ident().unwrap_or_else(|| {
                    panic!("Unexpected no ident for `{field_name}` field type.")
                });
                DataType::from_field_ty(&ident.to_string(), &field_name)
            }
            _ => panic!("Unexpected `syn::Type` variant in `{field_name}` field."),
        };

        let attr = value
            .attrs
            .iter()
            .find(|attr| attr.path().is_ident("modbus"))
            .unwrap_or_else(|| {
                panic!("Unexpected missing attribute `modbus` for `{field_name}` field.")
            })
            .clone();
        let punctuated = get_punctuated(&attr, &field_name);

        let addr = Self::get_addr(&punctuated, &field_name);
        let unit = Self::get_unit(&punctuated, &field_name);

        Self {
            field_name,
            addr,
            ty,
            unit,
        }
    }
}

impl Entry {
    // Macro helpers

    pub fn ty_ident(&self) -> Ident {
        let ty = match &self.ty {
            DataType::U16 => "u16",
            DataType::I16 => "i16",
            DataType::U32 => "u32",
            DataType::I32 => "i32",
        };
        Ident::new(ty, Span::call_site())
    }

    pub fn field_name_ident(&self) -> Ident {
        Ident::new(&self.field_name, Span::call_site())
    }

    pub fn end(&self) -> Address {
        self.addr + self.ty.word_size()
    }

    // Parsing helpers

    fn get_addr(punctuated: &Punctuated<ExprAssign, Comma>, field_name: &str) -> Address {
        match find_lit(punctuated, "addr", field_name) {
            Some(Lit::Int(lit_int)) => lit_int.base10_parse::<Address>().unwrap_or_else(|_| {
                panic!("In `modbus` attribute for `{field_name}`, the key `addr` could not be parsed to u16.")
            }),
            Some(_) => panic_not_literal("addr", "integer", field_name),
            None => panic_no_key("addr", field_name),
        }
    }

    /// `unit` is optional, raw words such as status bitfields have none.
    fn get_unit(punctuated: &Punctuated<ExprAssign, Comma>, field_name: &str) -> String {
        match find_lit(punctuated, "unit", field_name) {
            Some(Lit::Str(lit_str)) => lit_str.value(),
            Some(_) => panic_not_literal("unit", "string", field_name),
            None => String::new(),
        }
    }
}
