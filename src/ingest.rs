//! Source ingest.
//!
//! Parses the input file with `syn` and classifies its top-level items into
//! [`Decl`]s:
//! - methods of inherent `impl` blocks whose doc text carries `apigen:api`,
//! - named-field structs with at least one tagged field.
//!
//! Everything else (free functions, trait impls, nested modules, tuple and
//! unit structs, enums) is skipped. Shape errors on annotated methods and
//! unsupported kinds on tagged fields are fatal.
use quote::ToTokens;
use syn::ext::IdentExt;
use syn::{
    Attribute, Expr, ExprLit, Fields, FnArg, GenericArgument, ImplItem, ImplItemFn, Item,
    ItemImpl, ItemStruct, Lit, Meta, Pat, PathArguments, ReturnType, Type,
};

use crate::annotation::{has_directive, has_serialization_tag, is_struct_tag, lookup, VALIDATOR_TAG};
use crate::error::{GenError, Location};
use crate::ir::{ContextArg, FieldKind};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// One declaration of interest, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decl {
    Method(MethodDecl),
    Record(RecordDecl),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDecl {
    pub receiver_name: String,
    pub handler_name: String,
    pub doc: String,
    pub context: Option<ContextArg>,
    pub argument_name: String,
    pub argument_record_name: String,
    pub argument_by_ref: bool,
    pub result_type_name: String,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDecl {
    pub name: String,
    pub fields: Vec<FieldDecl>,
    pub has_untagged_fields: bool,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: String,
    pub kind: FieldKind,
    pub raw_tag: String,
    pub location: Location,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

pub fn parse_source(source: &str, file: &str) -> Result<syn::File, GenError> {
    syn::parse_file(source).map_err(|error| GenError::parse(file, &error))
}

/// Walks the top-level items of a parsed file.
pub fn declarations(ast: &syn::File, file: &str) -> Result<Vec<Decl>, GenError> {
    let mut out = Vec::new();
    for item in &ast.items {
        match item {
            Item::Impl(item_impl) => {
                for method in annotated_methods(item_impl, file)? {
                    out.push(Decl::Method(method));
                }
            }
            Item::Struct(item_struct) => {
                if let Some(record) = tagged_record(item_struct, file)? {
                    out.push(Decl::Record(record));
                }
            }
            _ => {}
        }
    }
    Ok(out)
}

/// [`parse_source`] followed by [`declarations`].
pub fn ingest(source: &str, file: &str) -> Result<Vec<Decl>, GenError> {
    let ast = parse_source(source, file)?;
    declarations(&ast, file)
}

/// Joined `///` lines (and `#[doc = "..."]` attributes) of an item.
pub fn doc_text(attrs: &[Attribute]) -> String {
    doc_lines(attrs).join("\n")
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn doc_lines(attrs: &[Attribute]) -> Vec<String> {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            Meta::NameValue(nv) => match &nv.value {
                Expr::Lit(ExprLit { lit: Lit::Str(s), .. }) => Some(s.value()),
                _ => None,
            },
            _ => None,
        })
        .flat_map(|value| value.lines().map(str::to_string).collect::<Vec<_>>())
        .collect()
}

/// Struct-tag doc lines plus folded `#[serde(...)]` attributes.
fn raw_tag(attrs: &[Attribute]) -> String {
    let mut parts = doc_lines(attrs)
        .into_iter()
        .filter(|line| is_struct_tag(line))
        .map(|line| line.trim().to_string())
        .collect::<Vec<_>>();

    let serde = attrs
        .iter()
        .filter(|attr| attr.path().is_ident("serde"))
        .filter_map(|attr| match &attr.meta {
            Meta::List(list) => Some(list.tokens.to_string()),
            _ => None,
        })
        .collect::<Vec<_>>();
    if !serde.is_empty() {
        let joined = serde.join(", ").replace('\\', "\\\\").replace('"', "\\\"");
        parts.push(format!("serde:\"{joined}\""));
    }

    parts.join(" ")
}

fn is_tagged(raw_tag: &str) -> bool {
    lookup(raw_tag, VALIDATOR_TAG).is_some_and(|value| !value.trim().is_empty())
        || has_serialization_tag(raw_tag)
}

fn tagged_record(item: &ItemStruct, file: &str) -> Result<Option<RecordDecl>, GenError> {
    let Fields::Named(named) = &item.fields else {
        return Ok(None);
    };
    let name = item.ident.to_string();

    let mut fields = Vec::new();
    let mut has_untagged_fields = false;
    for field in &named.named {
        let Some(ident) = &field.ident else { continue };
        let raw_tag = raw_tag(&field.attrs);
        if !is_tagged(&raw_tag) {
            has_untagged_fields = true;
            continue;
        }
        let location = Location::from_span(file, ident.span());
        let kind = scalar_kind(&field.ty).ok_or_else(|| GenError::UnsupportedKind {
            location: location.clone(),
            record: name.clone(),
            field: ident.unraw().to_string(),
            kind: type_text(&field.ty),
        })?;
        fields.push(FieldDecl { name: ident.unraw().to_string(), kind, raw_tag, location });
    }

    if fields.is_empty() {
        tracing::trace!(record = %name, "skipping struct without tagged fields");
        return Ok(None);
    }
    tracing::debug!(record = %name, fields = fields.len(), "found tagged record");
    Ok(Some(RecordDecl {
        name,
        fields,
        has_untagged_fields,
        location: Location::from_span(file, item.ident.span()),
    }))
}

fn scalar_kind(ty: &Type) -> Option<FieldKind> {
    let Type::Path(path) = ty else { return None };
    if path.qself.is_some() {
        return None;
    }
    let last = path.path.segments.last()?;
    if !matches!(last.arguments, PathArguments::None) {
        return None;
    }
    FieldKind::from_rust_type(&last.ident.to_string())
}

fn annotated_methods(item: &ItemImpl, file: &str) -> Result<Vec<MethodDecl>, GenError> {
    if item.trait_.is_some() {
        return Ok(Vec::new());
    }
    let annotated = item
        .items
        .iter()
        .filter_map(|impl_item| match impl_item {
            ImplItem::Fn(method) => Some(method),
            _ => None,
        })
        .filter(|method| has_directive(&doc_text(&method.attrs)))
        .collect::<Vec<_>>();
    if annotated.is_empty() {
        return Ok(Vec::new());
    }

    let receiver_name = type_name(&item.self_ty).unwrap_or_else(|| type_text(&item.self_ty));
    let mut out = Vec::new();
    for method in annotated {
        let unsupported = |reason: &str| GenError::UnsupportedSignature {
            location: Location::from_span(file, method.sig.ident.span()),
            receiver: receiver_name.clone(),
            method: method.sig.ident.to_string(),
            reason: reason.to_string(),
        };
        if !item.generics.params.is_empty() {
            return Err(unsupported("generic impl blocks are not supported"));
        }
        if type_name(&item.self_ty).is_none() {
            return Err(unsupported("the receiver must be a named type"));
        }
        let decl = method_decl(method, &receiver_name, file).map_err(|reason| unsupported(reason))?;
        tracing::debug!(receiver = %receiver_name, method = %decl.handler_name, "found annotated method");
        out.push(decl);
    }
    Ok(out)
}

fn method_decl(method: &ImplItemFn, receiver_name: &str, file: &str) -> Result<MethodDecl, &'static str> {
    let sig = &method.sig;
    if sig.asyncness.is_some() {
        return Err("async handlers are not supported");
    }
    if !sig.generics.params.is_empty() {
        return Err("generic handlers are not supported");
    }
    match sig.receiver() {
        Some(receiver) if receiver.reference.is_some() && receiver.mutability.is_none() => {}
        _ => return Err("the receiver must be `&self`"),
    }

    let typed = sig
        .inputs
        .iter()
        .filter_map(|input| match input {
            FnArg::Typed(pat_type) => Some(pat_type),
            FnArg::Receiver(_) => None,
        })
        .collect::<Vec<_>>();
    let (context_arg, argument) = match typed.as_slice() {
        [argument] => (None, *argument),
        [context, argument] => (Some(*context), *argument),
        _ => return Err("expected `(params)` or `(ctx, params)`"),
    };

    let context = match context_arg {
        None => None,
        Some(arg) => {
            let (ty, by_ref) = strip_reference(&arg.ty);
            if type_name(ty).as_deref() != Some("Context") {
                return Err("the context parameter must be `Context` or `&Context`");
            }
            Some(if by_ref { ContextArg::ByRef } else { ContextArg::ByValue })
        }
    };

    let Pat::Ident(argument_ident) = argument.pat.as_ref() else {
        return Err("the params argument must be a plain identifier");
    };
    let (argument_ty, argument_by_ref) = strip_reference(&argument.ty);
    let argument_record_name = type_name(argument_ty).ok_or("the params argument must be a named record")?;

    let result_type_name = result_ok_type(&sig.output).ok_or("the return type must be `Result<T, E>`")?;

    Ok(MethodDecl {
        receiver_name: receiver_name.to_string(),
        handler_name: sig.ident.to_string(),
        doc: doc_text(&method.attrs),
        context,
        argument_name: argument_ident.ident.to_string(),
        argument_record_name,
        argument_by_ref,
        result_type_name,
        location: Location::from_span(file, sig.ident.span()),
    })
}

fn strip_reference(ty: &Type) -> (&Type, bool) {
    match ty {
        Type::Reference(reference) => (reference.elem.as_ref(), true),
        other => (other, false),
    }
}

/// Last path segment of a plain, argument-free type path.
fn type_name(ty: &Type) -> Option<String> {
    let Type::Path(path) = ty else { return None };
    if path.qself.is_some() {
        return None;
    }
    let last = path.path.segments.last()?;
    matches!(last.arguments, PathArguments::None).then(|| last.ident.to_string())
}

/// `T` of `Result<T, ..>`, with `Box<..>` and `&..` peeled off.
fn result_ok_type(output: &ReturnType) -> Option<String> {
    let ReturnType::Type(_, ty) = output else { return None };
    let Type::Path(path) = ty.as_ref() else { return None };
    let last = path.path.segments.last()?;
    if last.ident != "Result" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &last.arguments else { return None };
    let ok = args.args.iter().find_map(|arg| match arg {
        GenericArgument::Type(ty) => Some(ty),
        _ => None,
    })?;
    let ok = peel(ok);
    Some(type_name(ok).unwrap_or_else(|| type_text(ok)))
}

fn peel(ty: &Type) -> &Type {
    match ty {
        Type::Reference(reference) => peel(&reference.elem),
        Type::Path(path) => {
            let boxed = path.path.segments.last().and_then(|last| {
                if last.ident != "Box" {
                    return None;
                }
                let PathArguments::AngleBracketed(args) = &last.arguments else { return None };
                args.args.iter().find_map(|arg| match arg {
                    GenericArgument::Type(inner) => Some(inner),
                    _ => None,
                })
            });
            boxed.map_or(ty, peel)
        }
        other => other,
    }
}

fn type_text(ty: &Type) -> String {
    ty.to_token_stream().to_string()
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    const SOURCE: &str = indoc! {r#"
        use apigen_rt::{ApiError, Context};

        pub struct MyApi;

        pub struct ProfileParams {
            /// apivalidator:"required"
            pub login: String,
        }

        #[derive(Default)]
        pub struct CreateParams {
            /// The account login.
            /// apivalidator:"required,min=10"
            pub login: String,
            /// apivalidator:"min=0,max=128"
            pub age: i64,
            #[serde(rename = "id")]
            pub user_id: u64,
            pub note: Vec<String>,
        }

        pub struct Plain {
            pub name: String,
        }

        pub struct Tuple(String);

        impl MyApi {
            /// Looks a user up.
            /// apigen:api {"url": "/user/profile", "auth": false}
            pub fn profile(&self, ctx: &Context, params: ProfileParams) -> Result<Box<User>, ApiError> {
                todo!()
            }

            /// apigen:api {"url": "/user/create", "auth": true, "method": "POST"}
            pub fn create(&self, params: &CreateParams) -> Result<NewUser, ApiError> {
                todo!()
            }

            pub fn helper(&self) {}
        }

        impl std::fmt::Debug for MyApi {
            /// apigen:api {"url": "/ignored"}
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { Ok(()) }
        }

        /// apigen:api {"url": "/free"}
        pub fn free_function() {}
    "#};

    fn methods(decls: &[Decl]) -> Vec<&MethodDecl> {
        decls.iter().filter_map(|d| match d { Decl::Method(m) => Some(m), _ => None }).collect()
    }

    fn records(decls: &[Decl]) -> Vec<&RecordDecl> {
        decls.iter().filter_map(|d| match d { Decl::Record(r) => Some(r), _ => None }).collect()
    }

    #[test]
    fn classifies_top_level_items() {
        let decls = ingest(SOURCE, "api.rs").unwrap();
        let names = decls
            .iter()
            .map(|d| match d {
                Decl::Method(m) => format!("method {}", m.handler_name),
                Decl::Record(r) => format!("record {}", r.name),
            })
            .collect::<Vec<_>>();
        assert_eq!(names, ["record ProfileParams", "record CreateParams", "method profile", "method create"]);
    }

    #[test]
    fn method_signature_details() {
        let decls = ingest(SOURCE, "api.rs").unwrap();
        let methods = methods(&decls);

        let profile = methods[0];
        assert_eq!(profile.receiver_name, "MyApi");
        assert_eq!(profile.context, Some(ContextArg::ByRef));
        assert_eq!(profile.argument_name, "params");
        assert_eq!(profile.argument_record_name, "ProfileParams");
        assert!(!profile.argument_by_ref);
        assert_eq!(profile.result_type_name, "User");
        assert!(profile.doc.contains("apigen:api"));
        assert_eq!(profile.location.line, 31);

        let create = methods[1];
        assert_eq!(create.context, None);
        assert!(create.argument_by_ref);
        assert_eq!(create.result_type_name, "NewUser");
    }

    #[test]
    fn record_fields_and_tags() {
        let decls = ingest(SOURCE, "api.rs").unwrap();
        let create = records(&decls)[1];
        let fields = create
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f.kind, f.raw_tag.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(
            fields,
            [
                ("login", FieldKind::String, r#"apivalidator:"required,min=10""#),
                ("age", FieldKind::Int, r#"apivalidator:"min=0,max=128""#),
                ("user_id", FieldKind::Uint64, r#"serde:"rename = \"id\"""#),
            ]
        );
        assert!(create.has_untagged_fields);
        assert!(!records(&decls)[0].has_untagged_fields);
    }

    #[test]
    fn unsupported_kind_is_fatal() {
        let source = indoc! {r#"
            pub struct Params {
                /// apivalidator:"required"
                pub tags: Vec<String>,
            }
        "#};
        let err = ingest(source, "api.rs").unwrap_err();
        match &err {
            GenError::UnsupportedKind { record, field, kind, location } => {
                assert_eq!((record.as_str(), field.as_str()), ("Params", "tags"));
                assert_eq!(kind, "Vec < String >");
                assert_eq!((location.line, location.column), (3, 9));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().starts_with("api.rs:3:9: unsupported field kind `Vec < String >`"));
    }

    #[test]
    fn parse_errors_carry_a_location() {
        let err = ingest("pub struct {", "broken.rs").unwrap_err();
        assert!(matches!(err, GenError::Parse { ref location, .. } if location.file == "broken.rs" && location.line == 1));
    }

    #[test]
    fn bad_signatures_are_fatal() {
        let cases = [
            ("pub async fn m(&self, p: P) -> Result<X, E>", "async"),
            ("pub fn m(p: P) -> Result<X, E>", "&self"),
            ("pub fn m(&mut self, p: P) -> Result<X, E>", "&self"),
            ("pub fn m(&self) -> Result<X, E>", "(params)"),
            ("pub fn m(&self, a: &Context, b: P, c: P) -> Result<X, E>", "(params)"),
            ("pub fn m(&self, a: Request, p: P) -> Result<X, E>", "context"),
            ("pub fn m(&self, p: P) -> X", "Result"),
            ("pub fn m(&self, p: Vec<P>) -> Result<X, E>", "named record"),
        ];
        for (signature, needle) in cases {
            let source = format!("impl Api {{\n    /// apigen:api {{\"url\": \"/m\"}}\n    {signature} {{ todo!() }}\n}}\n");
            match ingest(&source, "api.rs") {
                Err(GenError::UnsupportedSignature { reason, .. }) => {
                    assert!(reason.contains(needle), "{signature}: {reason}");
                }
                other => panic!("{signature}: unexpected result {other:?}"),
            }
        }
    }

    #[test]
    fn generic_impls_are_fatal() {
        let source = indoc! {r#"
            impl<T> Api<T> {
                /// apigen:api {"url": "/m"}
                pub fn m(&self, p: P) -> Result<X, E> { todo!() }
            }
        "#};
        assert!(matches!(ingest(source, "api.rs"), Err(GenError::UnsupportedSignature { .. })));
    }

    #[test]
    fn doc_attributes_count_as_doc_text() {
        let source = indoc! {r#"
            pub struct Params {
                #[doc = "apivalidator:\"required\""]
                pub login: String,
            }
        "#};
        let decls = ingest(source, "api.rs").unwrap();
        assert_eq!(records(&decls)[0].fields[0].raw_tag, r#"apivalidator:"required""#);
    }

    #[test]
    fn raw_identifiers_are_stored_unraw() {
        let source = indoc! {r#"
            pub struct Params {
                /// apivalidator:"required"
                pub r#type: String,
            }
        "#};
        let decls = ingest(source, "api.rs").unwrap();
        assert_eq!(records(&decls)[0].fields[0].name, "type");
    }
}
