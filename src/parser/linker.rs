use crate::error::ParseError;
use crate::types::*;

/// Merge every `extend` block's fields into its target message.
///
/// Top-level blocks are linked first, then blocks nested in messages in
/// depth-first order. A nested block names its target relative to the
/// messages enclosing it. Each field's tag must fall inside one of the
/// target's `extensions` ranges and must not collide with an existing field.
/// Targets not defined in this file are left alone.
pub fn link_extensions(schema: &mut Schema) -> Result<(), ParseError> {
    let mut extends: Vec<(Vec<String>, Extend)> = schema
        .extends
        .iter()
        .map(|extend| (Vec::new(), extend.clone()))
        .collect();
    collect_nested_extends(&schema.messages, &mut Vec::new(), &mut extends);

    for (scope, extend) in &extends {
        let Some(target) = schema.resolve_message_mut(scope, &extend.name) else {
            log::debug!("extend target {} is not defined in this file", extend.name);
            continue;
        };
        for field in &extend.message.fields {
            if !target.accepts_extension(field.tag) {
                return Err(ParseError::ExtensionOutOfRange {
                    message: target.name.clone(),
                    tag: field.tag,
                });
            }
            if target.field(&field.name).is_some() || target.field_by_tag(field.tag).is_some() {
                return Err(ParseError::duplicate("extended field", &field.name));
            }
            target.fields.push(field.clone());
        }
        log::debug!(
            "linked {} extension field(s) into {}",
            extend.message.fields.len(),
            target.name
        );
    }
    Ok(())
}

fn collect_nested_extends(
    messages: &[Message],
    scope: &mut Vec<String>,
    out: &mut Vec<(Vec<String>, Extend)>,
) {
    for message in messages {
        scope.push(message.name.clone());
        out.extend(message.extends.iter().map(|e| (scope.clone(), e.clone())));
        collect_nested_extends(&message.messages, scope, out);
        scope.pop();
    }
}
