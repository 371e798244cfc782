use crate::entry::{Address, Entry, Quantity};
use proc_macro2::Ident;
use syn::{Data, DeriveInput, Fields};

/// Largest register count allowed in a single FC03/FC04 request.
pub const MAX_QUANTITY: Quantity = 125;

#[derive(Debug, Clone)]
pub struct Mapping(pub Vec<Entry>);

impl Mapping {
    pub fn new(ast: &DeriveInput) -> Self {
        let data_struct = match ast.data.clone() {
            Data::Struct(data_struct) => data_struct,
            _ => panic!("Trait can be implemented only for a struct."),
        };

        let named_fields = match data_struct.fields {
            Fields::Named(fields_named) => fields_named.named,
            _ => panic!("Trait can be implemented only for a struct with named fields."),
        };
        let mut map: Vec<Entry> = named_fields.into_iter().map(From::from).collect::<Vec<_>>();

        map.sort_by_key(|x| x.addr);

        Self(map)
    }

    pub fn field_name_vec(&self) -> Vec<Ident> {
        self.0
            .iter()
            .map(|x| x.field_name_ident())
            .collect::<Vec<_>>()
    }

    pub fn ty_vec(&self) -> Vec<Ident> {
        self.0
            .iter()
            .map(|entry| entry.ty_ident())
            .collect::<Vec<_>>()
    }

    pub fn cnt_vec(&self) -> Vec<Quantity> {
        self.0.iter().map(|x| x.ty.word_size()).collect::<Vec<_>>()
    }

    /// Word offset of every entry relative to the block start.
    pub fn offset_vec(&self) -> Vec<Quantity> {
        let (start, _) = self.register_range();
        self.0.iter().map(|x| x.addr - start).collect::<Vec<_>>()
    }

    pub fn register_range(&self) -> (Address, Address) {
        match (self.0.first(), self.0.last()) {
            (Some(first), Some(last)) => (first.addr, last.end()),
            _ => (0, 0),
        }
    }

    /// Panics on an empty block, overlapping entries or a block too long for one request.
    pub fn check_layout(&self, name: &str) {
        if self.0.is_empty() {
            panic!("`{name}` has no register fields.");
        }
        for pair in self.0.windows(2) {
            if pair[0].end() > pair[1].addr {
                panic!(
                    "In `{name}`, fields `{}` and `{}` overlap.",
                    pair[0].field_name, pair[1].field_name
                );
            }
        }
        let (start, end) = self.register_range();
        if end - start > MAX_QUANTITY {
            panic!(
                "`{name}` spans {} registers, more than {MAX_QUANTITY} per request.",
                end - start
            );
        }
    }
}
