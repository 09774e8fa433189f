//! Rust emitter for a linked [`Ir`].
//!
//! Output layout, all in one module meant to be `include!`d as a child of the
//! module that declares the records and receivers:
//! 1. preamble (banner + imports),
//! 2. one `serve_http` router per receiver,
//! 3. one `handle_<method>` per annotated method, grouped by receiver,
//! 4. the middleware block.
//!
//! Receivers and methods keep their first-appearance order, so the output is
//! a pure function of the input file.
use crate::error::GenError;
use crate::ir::{ContextArg, Ir, MethodDescriptor, RecordDescriptor};

/// Header and token checked by the emitted auth middleware.
pub const AUTH_HEADER: &str = "X-Auth";
pub const AUTH_TOKEN: &str = "100500";

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Default)]
pub struct Codegen {
    out: String,
    indent: usize,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Codegen {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the generated module for `ir`. `source_label` is the input file
    /// as it should appear in the banner.
    pub fn emit(&mut self, ir: &Ir, source_label: &str) -> Result<(), GenError> {
        let receivers = ir.receivers();
        for methods in receivers.values() {
            for method in methods {
                resolve(ir, method)?;
            }
        }

        self.preamble(&ir.module, source_label);
        for (receiver, methods) in &receivers {
            self.blank();
            self.router(receiver, methods);
        }
        for (receiver, methods) in &receivers {
            self.blank();
            self.line(format!("impl {receiver} {{"));
            self.indent += 1;
            for (i, method) in methods.iter().enumerate() {
                if i > 0 {
                    self.blank();
                }
                self.handler(method, resolve(ir, method)?);
            }
            self.indent -= 1;
            self.line("}");
        }
        self.blank();
        self.middleware();
        Ok(())
    }

    pub fn into_string(self) -> String {
        self.out
    }

    fn preamble(&mut self, module: &str, source_label: &str) {
        self.line(format!(
            "// Code generated by apigen from {source_label} (module `{module}`). DO NOT EDIT."
        ));
        self.blank();
        self.line("#[allow(unused_imports)]");
        self.line("use super::*;");
        self.line("#[allow(unused_imports)]");
        self.line("use apigen_rt::http::{Request, Response, StatusCode};");
        self.line("#[allow(unused_imports)]");
        self.line("use apigen_rt::{Context, InputField, Kind};");
    }

    fn router(&mut self, receiver: &str, methods: &[&MethodDescriptor]) {
        self.line(format!("impl {receiver} {{"));
        self.indent += 1;
        self.line("/// Dispatches a request to the handler registered for its path.");
        self.line("pub fn serve_http<B: AsRef<[u8]>>(&self, req: &Request<B>) -> Response<String> {");
        self.indent += 1;
        for method in methods {
            let directive = &method.directive;
            self.line(format!("if req.uri().path() == {:?} {{", directive.url));
            self.indent += 1;
            if directive.has_method() {
                self.line(format!("if req.method().as_str() != {:?} {{", directive.method));
                self.indent += 1;
                self.line("return apigen_rt::respond_error(StatusCode::METHOD_NOT_ALLOWED, \"bad method\");");
                self.indent -= 1;
                self.line("}");
            }
            let call = format!("self.{}(req)", handler_fn(method));
            let call = if directive.auth {
                format!("auth_middleware(req, |req| {call})")
            } else {
                call
            };
            self.line(format!("return error_middleware(req, |req| {call});"));
            self.indent -= 1;
            self.line("}");
        }
        self.line("apigen_rt::respond_error(StatusCode::NOT_FOUND, \"unknown method\")");
        self.indent -= 1;
        self.line("}");
        self.indent -= 1;
        self.line("}");
    }

    fn handler(&mut self, method: &MethodDescriptor, record: &RecordDescriptor) {
        self.line(format!(
            "fn {}<B: AsRef<[u8]>>(&self, req: &Request<B>) -> Response<String> {{",
            handler_fn(method)
        ));
        self.indent += 1;

        self.line("const TEMPLATE: &[(&str, &str)] = &[");
        self.indent += 1;
        for (key, expression) in record.template_map() {
            self.line(format!("({key:?}, {expression:?}),"));
        }
        self.indent -= 1;
        self.line("];");

        self.line("const INPUTS: &[InputField] = &[");
        self.indent += 1;
        for field in &record.fields {
            self.line(format!(
                "InputField {{ param_name: {:?}, default: {:?}, kind: {}, has_default: {} }},",
                field.external_key(),
                field.meta.default,
                field.kind.runtime_variant(),
                field.meta.has_default(),
            ));
        }
        self.indent -= 1;
        self.line("];");
        self.blank();

        self.line("let form = match apigen_rt::parse_form(req) {");
        self.indent += 1;
        self.line("Ok(form) => form,");
        self.line("Err(err) => return apigen_rt::respond_error(StatusCode::BAD_REQUEST, err),");
        self.indent -= 1;
        self.line("};");
        self.line("let mut inputs = match apigen_rt::input_map(INPUTS, &form) {");
        self.indent += 1;
        self.line("Ok(inputs) => inputs,");
        self.line("Err(err) => return apigen_rt::respond_error(StatusCode::BAD_REQUEST, err),");
        self.indent -= 1;
        self.line("};");
        self.line("if let Err(err) = apigen_rt::validate_map(&inputs, TEMPLATE) {");
        self.indent += 1;
        self.line("return apigen_rt::respond_error(StatusCode::BAD_REQUEST, err);");
        self.indent -= 1;
        self.line("}");
        self.blank();

        self.line(format!("let params = {} {{", record.name));
        self.indent += 1;
        for field in &record.fields {
            self.line(format!(
                "{}: inputs.{}({:?}),",
                field_ident(&field.name),
                field.kind.take_method(),
                field.external_key()
            ));
        }
        if record.has_untagged_fields {
            self.line("..Default::default()");
        }
        self.indent -= 1;
        self.line("};");

        let argument = if method.argument_by_ref { "&params" } else { "params" };
        let arguments = match method.context {
            None => argument.to_string(),
            Some(context) => {
                self.line("let ctx = Context::from_request(req);");
                match context {
                    ContextArg::ByRef => format!("&ctx, {argument}"),
                    ContextArg::ByValue => format!("ctx, {argument}"),
                }
            }
        };
        self.line(format!("match self.{}({arguments}) {{", method.handler_name));
        self.indent += 1;
        self.line("Ok(value) => apigen_rt::respond(&value),");
        self.line("Err(err) => apigen_rt::respond_error(apigen_rt::business_status(&err), err),");
        self.indent -= 1;
        self.line("}");

        self.indent -= 1;
        self.line("}");
    }

    fn middleware(&mut self) {
        self.line("#[allow(dead_code)]");
        self.line("fn auth_middleware<B, F>(req: &Request<B>, next: F) -> Response<String>");
        self.line("where");
        self.line("    F: FnOnce(&Request<B>) -> Response<String>,");
        self.line("{");
        self.indent += 1;
        self.line(format!(
            "let token = req.headers().get({AUTH_HEADER:?}).map(|value| value.as_bytes()).unwrap_or_default();"
        ));
        self.line(format!("if !apigen_rt::constant_time_eq(token, b{AUTH_TOKEN:?}) {{"));
        self.indent += 1;
        self.line("apigen_rt::tracing::debug!(path = req.uri().path(), \"no auth\");");
        self.line("return apigen_rt::respond_error(StatusCode::FORBIDDEN, \"unauthorized\");");
        self.indent -= 1;
        self.line("}");
        self.line("next(req)");
        self.indent -= 1;
        self.line("}");
        self.blank();

        self.line("#[allow(dead_code)]");
        self.line("fn error_middleware<B, F>(req: &Request<B>, next: F) -> Response<String>");
        self.line("where");
        self.line("    F: FnOnce(&Request<B>) -> Response<String>,");
        self.line("{");
        self.indent += 1;
        self.line("match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| next(req))) {");
        self.indent += 1;
        self.line("Ok(response) => response,");
        self.line("Err(payload) => {");
        self.indent += 1;
        self.line("let message = apigen_rt::panic_message(&*payload);");
        self.line("apigen_rt::tracing::error!(path = req.uri().path(), panic = %message, \"recovered from panic\");");
        self.line("apigen_rt::respond_error(StatusCode::INTERNAL_SERVER_ERROR, message)");
        self.indent -= 1;
        self.line("}");
        self.indent -= 1;
        self.line("}");
        self.indent -= 1;
        self.line("}");
    }

    fn line(&mut self, text: impl AsRef<str>) {
        for _ in 0..self.indent {
            self.out.push_str("    ");
        }
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }
}

/// Generates the whole module for `ir` in one go.
pub fn render(ir: &Ir, source_label: &str) -> Result<String, GenError> {
    let mut codegen = Codegen::new();
    codegen.emit(ir, source_label)?;
    Ok(codegen.into_string())
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn handler_fn(method: &MethodDescriptor) -> String {
    format!("handle_{}", method.handler_name.trim_start_matches("r#"))
}

/// Field names are stored unraw; keywords need `r#` back in a struct literal.
fn field_ident(name: &str) -> String {
    if syn::parse_str::<syn::Ident>(name).is_ok() {
        name.to_string()
    } else {
        format!("r#{name}")
    }
}

fn resolve<'ir>(ir: &'ir Ir, method: &MethodDescriptor) -> Result<&'ir RecordDescriptor, GenError> {
    ir.linked_record(method).ok_or_else(|| GenError::UnresolvedRecord {
        location: method.location.clone(),
        receiver: method.receiver_name.clone(),
        method: method.handler_name.clone(),
        record: method.argument_record_name.clone(),
    })
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
