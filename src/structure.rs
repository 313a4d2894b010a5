use std::path::Path;
use tree_sitter::Parser;

use crate::error::MappingError;
use crate::metadata::MappingDirective;

/// Name of the static method a type declares to describe its own mapping.
pub const METADATA_METHOD: &str = "loadMetadata";

#[derive(Debug, Clone)]
pub struct SourceStructure {
    pub package: String,
    pub types: Vec<TypeStructure>,
}

#[derive(Debug, Clone)]
pub struct TypeStructure {
    pub name: String,
    /// `Some` iff the type declares a static metadata method; the directives
    /// its body issues, in order. An empty body yields an empty vector.
    pub directives: Option<Vec<MappingDirective>>,
}

impl SourceStructure {
    pub fn qualified_name(&self, type_name: &str) -> String {
        if self.package.is_empty() {
            type_name.to_string()
        } else {
            format!("{}.{}", self.package, type_name)
        }
    }
}

/// Parses one Java source and extracts its top-level type declarations.
///
/// Nested types are not visited; a syntactically broken file fails the whole
/// load, the same way a broken include would.
pub fn parse_source(path: &Path, source: &str) -> Result<SourceStructure, MappingError> {
    let parse_err = |reason: String| MappingError::SourceParse {
        path: path.to_path_buf(),
        reason,
    };

    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_java::LANGUAGE.into())
        .map_err(|e| parse_err(e.to_string()))?;
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| parse_err("parser produced no tree".to_string()))?;
    let root = tree.root_node();
    if root.has_error() {
        return Err(parse_err("syntax error".to_string()));
    }
    let bytes = source.as_bytes();

    let mut package = String::new();
    let mut types = Vec::new();

    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        match child.kind() {
            "package_declaration" => {
                package = extract_package(&child, bytes);
            }
            "class_declaration"
            | "interface_declaration"
            | "enum_declaration"
            | "record_declaration"
            | "annotation_type_declaration" => {
                if let Some(ty) = extract_type(&child, bytes)? {
                    types.push(ty);
                }
            }
            _ => {}
        }
    }

    Ok(SourceStructure { package, types })
}

fn extract_package(node: &tree_sitter::Node, source: &[u8]) -> String {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "scoped_identifier" || child.kind() == "identifier" {
            return node_text(&child, source).to_string();
        }
    }
    String::new()
}

fn extract_type(
    node: &tree_sitter::Node,
    source: &[u8],
) -> Result<Option<TypeStructure>, MappingError> {
    let Some(name_node) = node.child_by_field_name("name") else {
        return Ok(None);
    };
    let name = node_text(&name_node, source).to_string();
    if name.is_empty() {
        return Ok(None);
    }

    let directives = match find_body(node) {
        Some(body) => extract_metadata_method(&body, source, &name)?,
        None => None,
    };

    Ok(Some(TypeStructure { name, directives }))
}

fn find_body<'a>(node: &tree_sitter::Node<'a>) -> Option<tree_sitter::Node<'a>> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "class_body" | "interface_body" | "enum_body" | "annotation_type_body" => {
                return Some(child);
            }
            _ => {}
        }
    }
    None
}

fn extract_metadata_method(
    body: &tree_sitter::Node,
    source: &[u8],
    type_name: &str,
) -> Result<Option<Vec<MappingDirective>>, MappingError> {
    let mut cursor = body.walk();
    for child in body.children(&mut cursor) {
        match child.kind() {
            "method_declaration" => {
                if let Some(directives) = metadata_method_directives(&child, source, type_name)? {
                    return Ok(Some(directives));
                }
            }
            "enum_body_declarations" => {
                let mut inner_cursor = child.walk();
                for inner in child.children(&mut inner_cursor) {
                    if inner.kind() == "method_declaration"
                        && let Some(directives) =
                            metadata_method_directives(&inner, source, type_name)?
                    {
                        return Ok(Some(directives));
                    }
                }
            }
            _ => {}
        }
    }
    Ok(None)
}

fn metadata_method_directives(
    method: &tree_sitter::Node,
    source: &[u8],
    type_name: &str,
) -> Result<Option<Vec<MappingDirective>>, MappingError> {
    let Some(name_node) = method.child_by_field_name("name") else {
        return Ok(None);
    };
    if node_text(&name_node, source) != METADATA_METHOD {
        return Ok(None);
    }
    // The capability is the static method; an instance method of the same
    // name does not count.
    if !has_static_modifier(method) {
        return Ok(None);
    }

    let invalid = |reason: String| MappingError::InvalidMetadataMethod {
        type_name: type_name.to_string(),
        reason,
    };

    let receiver = first_parameter_name(method, source)
        .ok_or_else(|| invalid(format!("{METADATA_METHOD} must accept the metadata parameter")))?;
    let block = method
        .child_by_field_name("body")
        .ok_or_else(|| invalid(format!("{METADATA_METHOD} has no body")))?;

    let directives = extract_directives(&block, source, type_name, &receiver)?;
    Ok(Some(directives))
}

fn has_static_modifier(method: &tree_sitter::Node) -> bool {
    let mut cursor = method.walk();
    for child in method.children(&mut cursor) {
        if child.kind() == "modifiers" {
            let mut inner = child.walk();
            for modifier in child.children(&mut inner) {
                if modifier.kind() == "static" {
                    return true;
                }
            }
        }
    }
    false
}

fn first_parameter_name(method: &tree_sitter::Node, source: &[u8]) -> Option<String> {
    let params = method.child_by_field_name("parameters")?;
    let mut cursor = params.walk();
    for child in params.children(&mut cursor) {
        if child.kind() == "formal_parameter" {
            let name = child.child_by_field_name("name")?;
            return Some(node_text(&name, source).to_string());
        }
    }
    None
}

fn extract_directives(
    block: &tree_sitter::Node,
    source: &[u8],
    type_name: &str,
    receiver: &str,
) -> Result<Vec<MappingDirective>, MappingError> {
    let mut directives = Vec::new();
    let mut cursor = block.walk();
    for child in block.children(&mut cursor) {
        match child.kind() {
            "{" | "}" | ";" | "line_comment" | "block_comment" => {}
            "expression_statement" => {
                directives.push(parse_directive(&child, source, type_name, receiver)?);
            }
            other => {
                return Err(MappingError::InvalidMetadataMethod {
                    type_name: type_name.to_string(),
                    reason: format!("unsupported statement `{other}` in {METADATA_METHOD}"),
                });
            }
        }
    }
    Ok(directives)
}

fn parse_directive(
    statement: &tree_sitter::Node,
    source: &[u8],
    type_name: &str,
    receiver: &str,
) -> Result<MappingDirective, MappingError> {
    let invalid = |reason: String| MappingError::InvalidMetadataMethod {
        type_name: type_name.to_string(),
        reason,
    };

    let mut call = None;
    let mut cursor = statement.walk();
    for child in statement.children(&mut cursor) {
        if child.kind() == "method_invocation" {
            call = Some(child);
        }
    }
    let call = call.ok_or_else(|| {
        invalid(format!(
            "only calls on `{receiver}` are allowed in {METADATA_METHOD}"
        ))
    })?;

    let object = call
        .child_by_field_name("object")
        .map(|n| node_text(&n, source).to_string());
    if object.as_deref() != Some(receiver) {
        return Err(invalid(format!(
            "only calls on `{receiver}` are allowed in {METADATA_METHOD}"
        )));
    }

    let call_name = call
        .child_by_field_name("name")
        .map(|n| node_text(&n, source).to_string())
        .unwrap_or_default();
    let args = string_arguments(&call, source)
        .ok_or_else(|| invalid(format!("`{call_name}` arguments must be string literals")))?;

    match (call_name.as_str(), args.as_slice()) {
        ("setTableName", [table]) => Ok(MappingDirective::SetTableName {
            table: table.clone(),
        }),
        ("mapIdField", [name, sql_type]) => Ok(MappingDirective::MapIdField {
            name: name.clone(),
            sql_type: sql_type.clone(),
        }),
        ("mapField", [name, sql_type]) => Ok(MappingDirective::MapField {
            name: name.clone(),
            sql_type: sql_type.clone(),
            column: None,
        }),
        ("mapField", [name, sql_type, column]) => Ok(MappingDirective::MapField {
            name: name.clone(),
            sql_type: sql_type.clone(),
            column: Some(column.clone()),
        }),
        ("mapManyToOne", [field, target_class]) => Ok(MappingDirective::MapManyToOne {
            field: field.clone(),
            target_class: target_class.clone(),
        }),
        ("mapOneToMany", [field, target_class]) => Ok(MappingDirective::MapOneToMany {
            field: field.clone(),
            target_class: target_class.clone(),
        }),
        _ => Err(invalid(format!(
            "unsupported mapping call `{call_name}` with {} argument(s)",
            args.len()
        ))),
    }
}

fn string_arguments(call: &tree_sitter::Node, source: &[u8]) -> Option<Vec<String>> {
    let args = call.child_by_field_name("arguments")?;
    let mut out = Vec::new();
    let mut cursor = args.walk();
    for child in args.children(&mut cursor) {
        match child.kind() {
            "(" | ")" | "," => {}
            "string_literal" => out.push(string_value(&child, source)?),
            _ => return None,
        }
    }
    Some(out)
}

/// Decodes a plain `"..."` literal into its runtime value, resolving the
/// standard Java escape sequences. Text blocks and malformed escapes yield
/// `None`.
fn string_value(node: &tree_sitter::Node, source: &[u8]) -> Option<String> {
    let raw = node_text(node, source);
    let inner = raw.strip_prefix('"')?.strip_suffix('"')?;
    if inner.starts_with("\"\"") {
        return None;
    }

    let mut value = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            value.push(c);
            continue;
        }
        match chars.next()? {
            'b' => value.push('\u{0008}'),
            's' => value.push(' '),
            't' => value.push('\t'),
            'n' => value.push('\n'),
            'f' => value.push('\u{000C}'),
            'r' => value.push('\r'),
            '"' => value.push('"'),
            '\'' => value.push('\''),
            '\\' => value.push('\\'),
            'u' => {
                let mut code = 0u32;
                for _ in 0..4 {
                    code = code * 16 + chars.next()?.to_digit(16)?;
                }
                value.push(char::from_u32(code)?);
            }
            d @ '0'..='7' => {
                // Octal escape: up to three digits, three only below \400.
                let mut code = d.to_digit(8)?;
                let extra = if code <= 3 { 2 } else { 1 };
                for _ in 0..extra {
                    let Some(digit) = chars.peek().and_then(|c| c.to_digit(8)) else {
                        break;
                    };
                    code = code * 8 + digit;
                    chars.next();
                }
                value.push(char::from_u32(code)?);
            }
            _ => return None,
        }
    }
    Some(value)
}

fn node_text<'a>(node: &tree_sitter::Node, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}
