//! XML loader and validator for IPPcode22 source documents (spec
//! §4.1). Grounded on the teacher's `vasm` crate, which turns raw
//! assembly text into a validated `Vec<ParsedInstruction>` before
//! handing it to `vcpu`: same division of labour here, except the
//! input grammar is XML rather than a `pest` grammar, since nothing in
//! the example pack parses XML with `pest` and `roxmltree` is the
//! crate the wider corpus reaches for when a tree-shaped document
//! (not a line-oriented text format) needs validating (see
//! `other_examples`'s TwinCAT parser).
//!
//! Well-formedness failures surface as [`ippcode22::ErrorKind::XmlFormat`];
//! anything well-formed but schema-violating surfaces as
//! [`ippcode22::ErrorKind::XmlStructure`] — the loader never produces
//! any other error kind.

use std::collections::HashSet;

use log::{debug, trace};

use ippcode22::opcode::{arg_roles, ArgRole};
use ippcode22::{Arg, FrameId, Instruction, Literal, Opcode, Result, TypeTag};
use ippcode22_util::EnumFromStr;
use roxmltree::{Document, Node};

/// Parses and validates a full IPPcode22 XML document, returning its
/// instructions sorted by `order` (spec §4.1's final sort step; label
/// resolution and execution are the caller's concern).
pub fn load(xml_text: &str) -> Result<Vec<Instruction>> {
    let document = Document::parse(xml_text)
        .map_err(|e| ippcode22::error::xml_format(format!("malformed XML: {e}")))?;
    trace!("parsed {} bytes of XML", xml_text.len());

    let root = document.root_element();
    validate_root(root)?;

    let mut instructions = Vec::new();
    for child in element_children(root) {
        if child.tag_name().name() != "instruction" {
            return Err(structure(format!(
                "unexpected child <{}> of <program>",
                child.tag_name().name()
            )));
        }
        let instr = load_instruction(child)?;
        trace!("validated order={} opcode={}", instr.order, instr.opcode);
        instructions.push(instr);
    }

    instructions.sort_by_key(|i| i.order);
    reject_duplicate_orders(&instructions)?;
    debug!("loaded and sorted {} instructions", instructions.len());

    Ok(instructions)
}

fn structure(message: impl Into<String>) -> ippcode22::InterpretError {
    ippcode22::error::xml_structure(message)
}

fn element_children<'a, 'd: 'a>(node: Node<'a, 'd>) -> Vec<Node<'a, 'd>> {
    node.children().filter(|n| n.is_element()).collect()
}

fn text_content(node: Node) -> String {
    node.children()
        .filter(|c| c.is_text())
        .map(|c| c.text().unwrap_or(""))
        .collect()
}

fn only_whitespace_text(node: Node) -> bool {
    node.children()
        .filter(|c| c.is_text())
        .all(|c| c.text().unwrap_or("").trim().is_empty())
}

fn validate_root(root: Node) -> Result<()> {
    if !root.is_element() || root.tag_name().name() != "program" {
        return Err(structure("root element must be <program>"));
    }
    if !only_whitespace_text(root) {
        return Err(structure("<program> may not contain non-whitespace text"));
    }

    let attrs: Vec<_> = root.attributes().collect();
    if attrs.is_empty() || attrs.len() > 3 {
        return Err(structure("<program> must have 1 to 3 attributes"));
    }
    let mut seen_language = false;
    for attr in &attrs {
        match attr.name() {
            "language" => {
                seen_language = true;
                if attr.value().to_uppercase() != "IPPCODE22" {
                    return Err(structure(format!(
                        "unsupported language '{}'",
                        attr.value()
                    )));
                }
            }
            "name" | "description" => {}
            other => return Err(structure(format!("unexpected <program> attribute '{other}'"))),
        }
    }
    if !seen_language {
        return Err(structure("<program> is missing the required 'language' attribute"));
    }
    Ok(())
}

fn load_instruction(node: Node) -> Result<Instruction> {
    if !only_whitespace_text(node) {
        return Err(structure("<instruction> may not contain non-whitespace text"));
    }

    let attrs: Vec<_> = node.attributes().collect();
    if attrs.len() != 2 {
        return Err(structure("<instruction> must have exactly 'order' and 'opcode'"));
    }
    let order_text = attribute(node, "order")?;
    let opcode_text = attribute(node, "opcode")?;

    let order: i64 = order_text
        .parse()
        .map_err(|_| structure(format!("invalid instruction order '{order_text}'")))?;
    if order <= 0 {
        return Err(structure(format!("instruction order must be positive, got {order}")));
    }

    let opcode = Opcode::from_str(&opcode_text.to_uppercase())
        .map_err(|_| structure(format!("unknown opcode '{opcode_text}'")))?;

    let args = load_args(node, opcode)?;
    Ok(Instruction::new(order, opcode, args))
}

fn attribute(node: Node, name: &str) -> Result<String> {
    node.attribute(name)
        .map(str::to_string)
        .ok_or_else(|| structure(format!("<{}> is missing attribute '{name}'", node.tag_name().name())))
}

fn load_args(node: Node, opcode: Opcode) -> Result<Vec<Arg>> {
    let roles = arg_roles(opcode);
    let mut children = element_children(node);
    children.sort_by_key(|c| c.tag_name().name().to_string());

    let expected_tags: Vec<String> = (1..=roles.len()).map(|i| format!("arg{i}")).collect();
    let actual_tags: Vec<String> = children
        .iter()
        .map(|c| c.tag_name().name().to_string())
        .collect();
    if actual_tags != expected_tags {
        return Err(structure(format!(
            "{opcode} expects argument tags {expected_tags:?}, found {actual_tags:?}"
        )));
    }

    children
        .iter()
        .zip(roles.iter())
        .map(|(child, role)| load_arg(*child, *role))
        .collect()
}

fn load_arg(node: Node, role: ArgRole) -> Result<Arg> {
    if !element_children(node).is_empty() {
        return Err(structure(format!(
            "<{}> may not contain child elements",
            node.tag_name().name()
        )));
    }
    let attrs: Vec<_> = node.attributes().collect();
    if attrs.len() != 1 || attrs[0].name() != "type" {
        return Err(structure(format!(
            "<{}> must have exactly one attribute 'type'",
            node.tag_name().name()
        )));
    }
    let type_tag = attrs[0].value();
    let text = text_content(node);

    let arg = match type_tag {
        "var" => Arg::Var(parse_var(&text)?.0, parse_var(&text)?.1),
        "int" => Arg::Const(Literal::Int(parse_int(&text)?)),
        "string" => Arg::Const(Literal::Str(text)),
        "bool" => Arg::Const(Literal::Bool(parse_bool(&text)?)),
        "nil" => {
            if text.trim() != "nil" {
                return Err(structure(format!("invalid nil literal '{text}'")));
            }
            Arg::Const(Literal::Nil)
        }
        "label" => Arg::Label(text.trim().to_string()),
        "type" => Arg::Type(
            TypeTag::from_str(text.trim())
                .map_err(|_| structure(format!("invalid type payload '{text}'")))?,
        ),
        other => return Err(structure(format!("unknown argument type '{other}'"))),
    };

    if !role_matches(role, &arg) {
        return Err(structure(format!(
            "argument of type '{type_tag}' is not valid in a {role:?} position"
        )));
    }
    Ok(arg)
}

fn role_matches(role: ArgRole, arg: &Arg) -> bool {
    match (role, arg) {
        (ArgRole::Var, Arg::Var(..)) => true,
        (ArgRole::Symb, Arg::Var(..)) | (ArgRole::Symb, Arg::Const(_)) => true,
        (ArgRole::Label, Arg::Label(_)) => true,
        (ArgRole::Type, Arg::Type(_)) => true,
        _ => false,
    }
}

fn parse_var(text: &str) -> Result<(FrameId, String)> {
    let text = text.trim();
    let (frame_text, name) = text
        .split_once('@')
        .ok_or_else(|| structure(format!("invalid variable reference '{text}'")))?;
    let frame = FrameId::from_str(frame_text)
        .map_err(|_| structure(format!("unknown frame '{frame_text}'")))?;
    if name.is_empty() {
        return Err(structure(format!("invalid variable reference '{text}'")));
    }
    Ok((frame, name.to_string()))
}

fn parse_int(text: &str) -> Result<i64> {
    let trimmed = text.trim();
    let digits = match trimmed.as_bytes().first() {
        Some(b'+') | Some(b'-') => &trimmed[1..],
        _ => trimmed,
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(structure(format!("invalid int literal '{text}'")));
    }
    trimmed
        .parse()
        .map_err(|_| structure(format!("int literal '{text}' does not fit in 64 bits")))
}

fn parse_bool(text: &str) -> Result<bool> {
    match text.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(structure(format!("invalid bool literal '{other}'"))),
    }
}

fn reject_duplicate_orders(instructions: &[Instruction]) -> Result<()> {
    let mut seen = HashSet::new();
    for instr in instructions {
        if !seen.insert(instr.order) {
            return Err(structure(format!(
                "instruction order {} is used more than once",
                instr.order
            )));
        }
    }
    Ok(())
}
