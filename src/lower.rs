//! Declarations → linked [`Ir`].
use crate::annotation::{parse_directive, parse_validator};
use crate::error::GenError;
use crate::ingest::{Decl, MethodDecl, RecordDecl};
use crate::ir::{FieldDescriptor, Ir, MethodDescriptor, RecordDescriptor};

/// Builds every descriptor, then links methods to their argument records.
pub fn lower_to_ir(module: &str, decls: Vec<Decl>) -> Result<Ir, GenError> {
    let mut ir = Ir { module: module.to_string(), ..Ir::default() };
    for decl in decls {
        match decl {
            Decl::Method(method) => ir.methods.push(lower_method(method)?),
            Decl::Record(record) => ir.records.push(lower_record(record)?),
        }
    }
    link(&mut ir)?;
    tracing::debug!(
        module = %ir.module,
        methods = ir.methods.len(),
        records = ir.records.len(),
        "lowered declarations"
    );
    Ok(ir)
}

/// Resolves `linked_record` for every method. The first record with a
/// matching name wins.
pub fn link(ir: &mut Ir) -> Result<(), GenError> {
    for method in &mut ir.methods {
        let index = ir
            .records
            .iter()
            .position(|record| record.name == method.argument_record_name)
            .ok_or_else(|| GenError::UnresolvedRecord {
                location: method.location.clone(),
                receiver: method.receiver_name.clone(),
                method: method.handler_name.clone(),
                record: method.argument_record_name.clone(),
            })?;
        method.linked_record = Some(index);
    }
    Ok(())
}

fn lower_method(method: MethodDecl) -> Result<MethodDescriptor, GenError> {
    let directive = parse_directive(&method.doc).map_err(|reason| GenError::InvalidDirective {
        location: method.location.clone(),
        receiver: method.receiver_name.clone(),
        method: method.handler_name.clone(),
        reason,
    })?;
    Ok(MethodDescriptor {
        receiver_name: method.receiver_name,
        handler_name: method.handler_name,
        argument_name: method.argument_name,
        argument_record_name: method.argument_record_name,
        argument_by_ref: method.argument_by_ref,
        context: method.context,
        result_type_name: method.result_type_name,
        directive,
        linked_record: None,
        location: method.location,
    })
}

fn lower_record(record: RecordDecl) -> Result<RecordDescriptor, GenError> {
    let mut fields = Vec::with_capacity(record.fields.len());
    for field in record.fields {
        let meta = parse_validator(&field.raw_tag).map_err(|reason| GenError::InvalidTag {
            location: field.location.clone(),
            record: record.name.clone(),
            field: field.name.clone(),
            reason,
        })?;
        fields.push(FieldDescriptor { name: field.name, kind: field.kind, raw_tag: field.raw_tag, meta });
    }
    Ok(RecordDescriptor {
        name: record.name,
        fields,
        has_untagged_fields: record.has_untagged_fields,
        location: record.location,
    })
}
