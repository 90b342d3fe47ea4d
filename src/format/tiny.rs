//! Tiny v1 mappings.
//!
//! ```text
//! v1	official	named
//! CLASS	a	com/example/Foo
//! FIELD	a	I	b	count
//! METHOD	a	(I)V	c	setCount
//! MTH-ARG	a	(I)V	c	1	value
//! ```

use std::fmt::Write;

use crate::descriptor::{MethodDescriptor, TypeDescriptor};
use crate::entry::{ClassEntry, Entry, FieldEntry, LocalVariableEntry, MethodEntry};
use crate::mapping::{EntryMapping, EntryTree};
use crate::resolver::VoidEntryResolver;
use crate::translate::{MappingTranslator, Translator};

use super::{MappingFormat, MappingParseError, ParseErrorKind};

const HEADER: &str = "v1\tofficial\tnamed";

pub(super) fn read(source: &str) -> Result<EntryTree<EntryMapping>, MappingParseError> {
    let mut mappings = EntryTree::new();
    let mut lines = source.lines().enumerate();
    if let Some((_, header)) = lines.next() {
        if header.split('\t').next() != Some("v1") {
            return Err(MappingParseError::new(
                1,
                ParseErrorKind::BadHeader(header.to_owned()),
            ));
        }
    }
    for (number, line) in lines {
        let line_number = number + 1;
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }
        let (entry, mapping) =
            parse_line(line).map_err(|kind| MappingParseError::new(line_number, kind))?;
        mappings.insert(entry, mapping);
    }
    Ok(mappings)
}

fn parse_line(line: &str) -> Result<(Entry, EntryMapping), ParseErrorKind> {
    let tokens: Vec<&str> = line.split('\t').collect();
    let expect = |expected: usize| {
        if tokens.len() < expected {
            Err(ParseErrorKind::MissingColumn {
                expected,
                found: tokens.len(),
            })
        } else {
            Ok(())
        }
    };

    match tokens[0] {
        "CLASS" => {
            expect(3)?;
            // inner classes are named relative to their outer class
            let mapped = ClassEntry::new(tokens[2]);
            Ok((
                Entry::Class(ClassEntry::new(tokens[1])),
                EntryMapping::new(mapped.name()),
            ))
        }
        "FIELD" => {
            expect(5)?;
            let field = FieldEntry::new(
                ClassEntry::new(tokens[1]),
                tokens[3],
                TypeDescriptor::parse(tokens[2])?,
            );
            Ok((Entry::Field(field), EntryMapping::new(tokens[4])))
        }
        "METHOD" => {
            expect(5)?;
            let method = parse_method(tokens[1], tokens[2], tokens[3])?;
            Ok((Entry::Method(method), EntryMapping::new(tokens[4])))
        }
        "MTH-ARG" => {
            expect(6)?;
            let method = parse_method(tokens[1], tokens[2], tokens[3])?;
            let index = tokens[4].parse::<u16>()?;
            let local = LocalVariableEntry::new(method, index, "", true);
            Ok((Entry::LocalVariable(local), EntryMapping::new(tokens[5])))
        }
        "" => Err(ParseErrorKind::Malformed(MappingFormat::TinyFile)),
        key => Err(ParseErrorKind::UnknownKey(key.to_owned())),
    }
}

fn parse_method(owner: &str, desc: &str, name: &str) -> Result<MethodEntry, ParseErrorKind> {
    Ok(MethodEntry::new(
        ClassEntry::new(owner),
        name,
        MethodDescriptor::parse(desc)?,
    ))
}

pub(super) fn write(mappings: &EntryTree<EntryMapping>) -> String {
    let translator = MappingTranslator::new(mappings, VoidEntryResolver);
    let mut out = String::new();
    out.push_str(HEADER);
    out.push('\n');

    for (entry, mapping) in mappings.iter() {
        let Some(name) = mapping.target_name() else {
            continue;
        };
        // writing to a String cannot fail
        let _ = match entry {
            Entry::Class(class) => writeln!(
                out,
                "CLASS\t{}\t{}",
                class.full_name(),
                translator.translate_class(class).full_name()
            ),
            Entry::Field(field) => writeln!(
                out,
                "FIELD\t{}\t{}\t{}\t{}",
                field.parent().full_name(),
                field.desc(),
                field.name(),
                name
            ),
            Entry::Method(method) => writeln!(
                out,
                "METHOD\t{}\t{}\t{}\t{}",
                method.parent().full_name(),
                method.desc(),
                method.name(),
                name
            ),
            Entry::LocalVariable(local) if local.is_argument() => {
                let method = local.parent();
                writeln!(
                    out,
                    "MTH-ARG\t{}\t{}\t{}\t{}\t{}",
                    method.parent().full_name(),
                    method.desc(),
                    method.name(),
                    local.index(),
                    name
                )
            }
            Entry::LocalVariable(_) => Ok(()),
        };
    }
    out
}
