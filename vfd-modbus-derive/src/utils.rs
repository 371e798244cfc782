use syn::{punctuated::Punctuated, token::Comma, Attribute, Expr, ExprAssign, Lit, Meta};

pub fn get_punctuated(attr: &Attribute, name: &str) -> Punctuated<ExprAssign, Comma> {
    match &attr.meta {
        Meta::List(meta_list) => meta_list
            .clone()
            .parse_args_with(Punctuated::<ExprAssign, Comma>::parse_terminated)
            .unwrap_or_else(|_| panic!("`modbus` attribute for `{name}` is not a comma separated sequence of `key = value` pairs.")),
        _ => panic!("The `modbus` attribute for `{name}` is not `MetaList`"),
    }
}

/// Literal assigned to `key`, if the key is present.
pub fn find_lit(punctuated: &Punctuated<ExprAssign, Comma>, key: &str, name: &str) -> Option<Lit> {
    punctuated
        .iter()
        .find(|expr_assign| match expr_assign.left.as_ref() {
            Expr::Path(left) => left.path.is_ident(key),
            not_expr_path => panic!(
                "In the `modbus` attribute for {}, the key `{:?}` is not a path expression.",
                name, not_expr_path
            ),
        })
        .map(|expr_assign| match expr_assign.right.as_ref() {
            Expr::Lit(right) => right.lit.clone(),
            _ => panic_not_literal(key, "", name),
        })
}

pub fn panic_not_literal(key: &str, lit_ty: &str, name: &str) -> ! {
    panic!(
        "In `modbus` attribute for `{}`, the key `{}` is not set to a {} literal.",
        name, key, lit_ty
    )
}

pub fn panic_no_key(key: &str, name: &str) -> ! {
    panic!("In `modbus` attribute for `{}`, no key `{}`", name, key)
}
