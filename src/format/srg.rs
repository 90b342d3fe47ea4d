//! SRG mappings, write only.
//!
//! Classes, fields and methods are written; local variables have no SRG
//! representation.

use std::fmt::Write;

use crate::entry::Entry;
use crate::mapping::{EntryMapping, EntryTree};
use crate::resolver::VoidEntryResolver;
use crate::translate::{MappingTranslator, Translator};

pub(super) fn write(mappings: &EntryTree<EntryMapping>) -> String {
    let translator = MappingTranslator::new(mappings, VoidEntryResolver);
    let mut classes = Vec::new();
    let mut fields = Vec::new();
    let mut methods = Vec::new();

    for (entry, mapping) in mappings.iter() {
        if mapping.target_name().is_none() {
            continue;
        }
        match entry {
            Entry::Class(class) => classes.push(format!(
                "CL: {} {}",
                class.full_name(),
                translator.translate_class(class).full_name()
            )),
            Entry::Field(field) => {
                let mapped = translator.translate_field(field);
                fields.push(format!(
                    "FD: {}/{} {}/{}",
                    field.parent().full_name(),
                    field.name(),
                    mapped.parent().full_name(),
                    mapped.name()
                ));
            }
            Entry::Method(method) => {
                let mapped = translator.translate_method(method);
                methods.push(format!(
                    "MD: {}/{} {} {}/{} {}",
                    method.parent().full_name(),
                    method.name(),
                    method.desc(),
                    mapped.parent().full_name(),
                    mapped.name(),
                    mapped.desc()
                ));
            }
            Entry::LocalVariable(_) => {}
        }
    }

    let mut out = String::new();
    for line in classes.iter().chain(&fields).chain(&methods) {
        let _ = writeln!(out, "{line}");
    }
    out
}
