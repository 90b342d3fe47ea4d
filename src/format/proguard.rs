//! Proguard and R8 mapping files, read only.
//!
//! The format is described
//! [here](https://www.guardsquare.com/en/products/proguard/manual/retrace).
//! Mapping files name the original entry first; entries are re-keyed by
//! their obfuscated names, with descriptors rewritten into the obfuscated
//! namespace.

use std::collections::HashMap;

use serde::Deserialize;

use crate::descriptor::{MethodDescriptor, TypeDescriptor};
use crate::entry::{ClassEntry, Entry, FieldEntry, MethodEntry};
use crate::mapping::{EntryMapping, EntryTree};

use super::{MappingFormat, MappingParseError, ParseErrorKind};

/// A single line of a Proguard mapping file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProguardRecord<'s> {
    /// A `# key: value` comment.
    Header {
        /// The key of the header.
        key: &'s str,
        /// Optional value if the header is a key-value pair.
        value: Option<&'s str>,
    },
    /// An R8 JSON metadata comment such as
    /// `# {"id":"sourceFile","fileName":"Foo.java"}`.
    Metadata {
        /// The kind of metadata.
        id: String,
    },
    /// A class mapping.
    Class {
        /// Original name of the class, dot separated.
        original: &'s str,
        /// Obfuscated name of the class, dot separated.
        obfuscated: &'s str,
    },
    /// A field mapping.
    Field {
        /// Java type of the field.
        ty: &'s str,
        /// Original name of the field.
        original: &'s str,
        /// Obfuscated name of the field.
        obfuscated: &'s str,
    },
    /// A method mapping.
    Method {
        /// Java return type of the method.
        ty: &'s str,
        /// Original name of the method.
        original: &'s str,
        /// Obfuscated name of the method.
        obfuscated: &'s str,
        /// Comma separated Java argument types.
        arguments: &'s str,
        /// Original class of a method inlined from another class.
        original_class: Option<&'s str>,
    },
}

#[derive(Deserialize)]
struct R8Metadata {
    id: String,
}

impl<'s> ProguardRecord<'s> {
    /// Parses a line from a Proguard mapping file.
    ///
    /// # Examples
    ///
    /// ```
    /// use jvm_remap::format::ProguardRecord;
    ///
    /// let parsed = ProguardRecord::try_parse("    1:3:void run(int,java.lang.String):10:12 -> a");
    /// assert_eq!(
    ///     parsed.unwrap(),
    ///     ProguardRecord::Method {
    ///         ty: "void",
    ///         original: "run",
    ///         obfuscated: "a",
    ///         arguments: "int,java.lang.String",
    ///         original_class: None,
    ///     }
    /// );
    /// ```
    pub fn try_parse(line: &'s str) -> Result<Self, ParseErrorKind> {
        let line = line.trim_end_matches(['\r', '\n']);
        let record = if let Some(comment) = line.strip_prefix('#') {
            parse_header(comment)?
        } else if let Some(member) = line.strip_prefix("    ") {
            parse_field_or_method(member)
        } else {
            parse_class(line)
        };
        record.ok_or(ParseErrorKind::Malformed(MappingFormat::Proguard))
    }
}

fn parse_header(comment: &str) -> Result<Option<ProguardRecord<'_>>, ParseErrorKind> {
    let comment = comment.trim();
    if comment.starts_with('{') {
        let metadata: R8Metadata = serde_json::from_str(comment)?;
        return Ok(Some(ProguardRecord::Metadata { id: metadata.id }));
    }
    let record = match comment.split_once(':') {
        Some((key, value)) => ProguardRecord::Header {
            key: key.trim(),
            value: Some(value.trim()),
        },
        None => ProguardRecord::Header {
            key: comment,
            value: None,
        },
    };
    Ok(Some(record))
}

/// `originaltype originalname -> obfuscatedname` or
/// `[start:end:]returntype [class.]name(args)[:origstart[:origend]] -> obfuscatedname`
fn parse_field_or_method(line: &str) -> Option<ProguardRecord<'_>> {
    let (original, obfuscated) = line.split_once(" -> ")?;
    let obfuscated = obfuscated.trim();

    let original = skip_line_numbers(original);
    let (ty, original) = original.split_once(' ')?;
    if ty.is_empty() || original.is_empty() || obfuscated.is_empty() {
        return None;
    }

    let Some((name, rest)) = original.split_once('(') else {
        return Some(ProguardRecord::Field {
            ty,
            original,
            obfuscated,
        });
    };
    let (arguments, rest) = rest.split_once(')')?;
    // trailing original line numbers
    if !rest.is_empty() && !is_line_range(rest.strip_prefix(':')?) {
        return None;
    }

    let (original_class, original) = match name.rsplit_once('.') {
        Some((class, name)) => (Some(class), name),
        None => (None, name),
    };
    Some(ProguardRecord::Method {
        ty,
        original,
        obfuscated,
        arguments,
        original_class,
    })
}

fn skip_line_numbers(line: &str) -> &str {
    let mut rest = line;
    for _ in 0..2 {
        match rest.split_once(':') {
            Some((number, tail)) if is_number(number) => rest = tail,
            _ => break,
        }
    }
    rest
}

fn is_line_range(range: &str) -> bool {
    range.split(':').all(is_number)
}

fn is_number(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|c| c.is_ascii_digit())
}

/// `originalclassname -> obfuscatedclassname:`
fn parse_class(line: &str) -> Option<ProguardRecord<'_>> {
    let (original, obfuscated) = line.split_once(" -> ")?;
    let obfuscated = obfuscated.strip_suffix(':')?;
    if original.is_empty() || original.contains(' ') || obfuscated.is_empty() {
        return None;
    }
    Some(ProguardRecord::Class {
        original,
        obfuscated,
    })
}

fn internal_name(java_name: &str) -> String {
    java_name.replace('.', "/")
}

pub(super) fn read(source: &str) -> Result<EntryTree<EntryMapping>, MappingParseError> {
    let mut records = Vec::new();
    for (number, line) in source.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record =
            ProguardRecord::try_parse(line).map_err(|kind| MappingParseError::new(number + 1, kind))?;
        records.push((number + 1, record));
    }

    // member types name original classes
    let obfuscated_names: HashMap<String, String> = records
        .iter()
        .filter_map(|(_, record)| match record {
            ProguardRecord::Class {
                original,
                obfuscated,
            } => Some((internal_name(original), internal_name(obfuscated))),
            _ => None,
        })
        .collect();
    let obfuscate = |desc: TypeDescriptor| desc.remap(|name| obfuscated_names.get(name).cloned());

    let mut mappings = EntryTree::new();
    let mut current: Option<(&str, ClassEntry)> = None;
    for (line, record) in &records {
        match record {
            ProguardRecord::Header { .. } | ProguardRecord::Metadata { .. } => {}
            ProguardRecord::Class {
                original,
                obfuscated,
            } => {
                let class = ClassEntry::new(&internal_name(obfuscated));
                let original_name = internal_name(original);
                let target = if class.is_inner() {
                    ClassEntry::new(&original_name).name().to_owned()
                } else {
                    original_name
                };
                if target != class.name() {
                    mappings.insert(Entry::Class(class.clone()), EntryMapping::new(target));
                }
                current = Some((*original, class));
            }
            ProguardRecord::Field {
                ty,
                original,
                obfuscated,
            } => {
                let (_, class) = current
                    .as_ref()
                    .ok_or_else(|| orphan_member(*line))?;
                if original == obfuscated {
                    continue;
                }
                let desc = obfuscate(TypeDescriptor::from_java_type(ty));
                let field = FieldEntry::new(class.clone(), *obfuscated, desc);
                mappings.insert(Entry::Field(field), EntryMapping::new(*original));
            }
            ProguardRecord::Method {
                ty,
                original,
                obfuscated,
                arguments,
                original_class,
            } => {
                let (class_name, class) = current
                    .as_ref()
                    .ok_or_else(|| orphan_member(*line))?;
                // inlined from elsewhere, not a method of this class
                if original_class.map_or(false, |owner| owner != *class_name) {
                    continue;
                }
                if original == obfuscated {
                    continue;
                }
                let args: Vec<TypeDescriptor> = arguments
                    .split(',')
                    .filter(|arg| !arg.trim().is_empty())
                    .map(|arg| obfuscate(TypeDescriptor::from_java_type(arg)))
                    .collect();
                let ret = obfuscate(TypeDescriptor::from_java_type(ty));
                let method = MethodEntry::new(
                    class.clone(),
                    *obfuscated,
                    MethodDescriptor::from_parts(&args, &ret),
                );
                mappings.insert(Entry::Method(method), EntryMapping::new(*original));
            }
        }
    }
    Ok(mappings)
}

fn orphan_member(line: usize) -> MappingParseError {
    MappingParseError::new(line, ParseErrorKind::Malformed(MappingFormat::Proguard))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_parse_header() {
        assert_eq!(
            ProguardRecord::try_parse("# compiler: R8").unwrap(),
            ProguardRecord::Header {
                key: "compiler",
                value: Some("R8")
            }
        );
        assert_eq!(
            ProguardRecord::try_parse(r#"# {"id":"sourceFile","fileName":"Foo.java"}"#).unwrap(),
            ProguardRecord::Metadata {
                id: "sourceFile".into()
            }
        );
        assert!(matches!(
            ProguardRecord::try_parse(r#"# {"fileName":"Foo.java""#),
            Err(ParseErrorKind::BadMetadata(_))
        ));
    }

    #[test]
    fn try_parse_members() {
        assert_eq!(
            ProguardRecord::try_parse("    java.util.List items -> a").unwrap(),
            ProguardRecord::Field {
                ty: "java.util.List",
                original: "items",
                obfuscated: "a",
            }
        );
        assert_eq!(
            ProguardRecord::try_parse("    1016:1016:void com.example.Bean.doWork():16:16 -> b")
                .unwrap(),
            ProguardRecord::Method {
                ty: "void",
                original: "doWork",
                obfuscated: "b",
                arguments: "",
                original_class: Some("com.example.Bean"),
            }
        );
        assert!(ProguardRecord::try_parse("  int x -> a").is_err());
        assert!(ProguardRecord::try_parse("com.example.Foo -> a").is_err());
    }

    #[test]
    fn test_read() {
        let source = r#"# compiler: R8
com.example.Foo -> a:
# {"id":"sourceFile","fileName":"Foo.java"}
    com.example.Foo$Bar bar -> a
    int count -> count
    1:2:void setBar(com.example.Foo$Bar,int[]):5:6 -> a
    3:3:void com.example.Other.helper():9:9 -> b
com.example.Foo$Bar -> a$a:
"#;
        let tree = read(source).unwrap();
        assert_eq!(tree.len(), 4);

        let get = |entry: Entry| tree.get(&entry).and_then(EntryMapping::target_name);
        assert_eq!(get(Entry::Class(ClassEntry::new("a"))), Some("com/example/Foo"));
        assert_eq!(get(Entry::Class(ClassEntry::new("a$a"))), Some("Bar"));
        assert_eq!(get(Entry::Field(FieldEntry::parse("a", "a", "La$a;"))), Some("bar"));
        assert_eq!(
            get(Entry::Method(MethodEntry::parse("a", "a", "(La$a;[I)V"))),
            Some("setBar")
        );
    }

    #[test]
    fn test_read_inner_class_names() {
        let tree = read("com.example.Foo$Bar -> a$b:\ncom.example.$Gen -> a$c:\n").unwrap();
        let get = |name: &str| {
            tree.get(&Entry::Class(ClassEntry::new(name)))
                .and_then(EntryMapping::target_name)
        };
        assert_eq!(get("a$b"), Some("Bar"));
        assert_eq!(get("a$c"), Some("com/example/$Gen"));
    }

    #[test]
    fn test_read_errors() {
        let err = read("    int x -> a\n").unwrap_err();
        assert_eq!(err.line(), 1);

        let err = read("a -> b:\nnot a record\n").unwrap_err();
        assert_eq!(err.line(), 2);
        assert!(matches!(err.kind(), ParseErrorKind::Malformed(MappingFormat::Proguard)));
    }
}
