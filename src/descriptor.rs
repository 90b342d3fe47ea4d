//! JVM type and method descriptors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::entry::ClassEntry;

/// Error when a descriptor string is not well formed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid descriptor `{descriptor}`: {reason}")]
pub struct DescriptorError {
    descriptor: String,
    reason: &'static str,
}

impl DescriptorError {
    fn new(descriptor: &str, reason: &'static str) -> Self {
        Self {
            descriptor: descriptor.to_owned(),
            reason,
        }
    }

    /// The offending descriptor.
    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }
}

fn java_base_type(encoded_ty: char) -> Option<&'static str> {
    match encoded_ty {
        'Z' => Some("boolean"),
        'B' => Some("byte"),
        'C' => Some("char"),
        'S' => Some("short"),
        'I' => Some("int"),
        'J' => Some("long"),
        'F' => Some("float"),
        'D' => Some("double"),
        'V' => Some("void"),
        _ => None,
    }
}

fn java_base_descriptor(java_ty: &str) -> Option<char> {
    match java_ty {
        "boolean" => Some('Z'),
        "byte" => Some('B'),
        "char" => Some('C'),
        "short" => Some('S'),
        "int" => Some('I'),
        "long" => Some('J'),
        "float" => Some('F'),
        "double" => Some('D'),
        "void" => Some('V'),
        _ => None,
    }
}

/// Returns the length of the first complete field type in `desc`.
fn field_type_len(desc: &str) -> Option<usize> {
    let mut chrs = desc.char_indices();
    while let Some((idx, token)) = chrs.next() {
        match token {
            '[' => continue,
            'L' => {
                for (i, c) in chrs.by_ref() {
                    if c == ';' {
                        // `L;` has no class name
                        return (i > idx + 1).then_some(i + 1);
                    }
                }
                return None;
            }
            c if java_base_type(c).is_some() && c != 'V' => return Some(idx + 1),
            _ => return None,
        }
    }
    None
}

/// The descriptor of a single field, argument or return type, e.g. `I`,
/// `[Ljava/lang/String;` or `V`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeDescriptor(String);

impl TypeDescriptor {
    /// Wraps a raw descriptor without validating it.
    pub fn new(desc: impl Into<String>) -> Self {
        Self(desc.into())
    }

    /// Parses and validates a field/return type descriptor.
    pub fn parse(desc: &str) -> Result<Self, DescriptorError> {
        if desc == "V" {
            return Ok(Self::new(desc));
        }
        match field_type_len(desc) {
            Some(len) if len == desc.len() => Ok(Self::new(desc)),
            _ => Err(DescriptorError::new(desc, "not a single field type")),
        }
    }

    /// The descriptor of the given internal class name.
    pub fn of_class(internal_name: &str) -> Self {
        Self(format!("L{internal_name};"))
    }

    /// Converts a Java source type such as `java.lang.String[]` into a
    /// descriptor.
    pub fn from_java_type(java_ty: &str) -> Self {
        let mut element = java_ty.trim();
        let mut dimensions = 0;
        while let Some(stripped) = element.strip_suffix("[]") {
            element = stripped;
            dimensions += 1;
        }
        let mut desc = "[".repeat(dimensions);
        match java_base_descriptor(element) {
            Some(c) => desc.push(c),
            None => {
                desc.push('L');
                desc.push_str(&element.replace('.', "/"));
                desc.push(';');
            }
        }
        Self(desc)
    }

    /// The raw descriptor string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `V`
    pub fn is_void(&self) -> bool {
        self.0 == "V"
    }

    /// A primitive type other than `void`.
    pub fn is_primitive(&self) -> bool {
        self.0.len() == 1 && !self.is_void() && self.0.chars().all(|c| java_base_type(c).is_some())
    }

    /// An object (non-array) reference type.
    pub fn is_type(&self) -> bool {
        self.0.starts_with('L') && self.0.ends_with(';')
    }

    /// An array type.
    pub fn is_array(&self) -> bool {
        self.0.starts_with('[')
    }

    /// Whether values of this type are references.
    pub fn is_reference(&self) -> bool {
        self.is_type() || self.is_array()
    }

    /// Number of array dimensions.
    pub fn array_dimension(&self) -> usize {
        self.0.chars().take_while(|c| *c == '[').count()
    }

    /// The element type of an array, or `None` if this is no array.
    pub fn array_element(&self) -> Option<TypeDescriptor> {
        self.0.strip_prefix('[').map(TypeDescriptor::new)
    }

    /// The class of an object type. Arrays yield the class of their element
    /// type, if any.
    pub fn type_entry(&self) -> Option<ClassEntry> {
        let element = self.0.trim_start_matches('[');
        element
            .strip_prefix('L')
            .and_then(|s| s.strip_suffix(';'))
            .map(ClassEntry::new)
    }

    /// The number of local variable slots occupied by a value of this type.
    pub fn size(&self) -> usize {
        match self.0.as_str() {
            "V" => 0,
            "J" | "D" => 2,
            _ => 1,
        }
    }

    /// Renders the type as Java source would, e.g. `int[]`.
    pub fn to_java_type(&self) -> String {
        let dimensions = self.array_dimension();
        let element = &self.0[dimensions..];
        let mut out = match element.chars().next().and_then(java_base_type) {
            Some(ty) if element.len() == 1 => ty.to_owned(),
            _ => element
                .strip_prefix('L')
                .and_then(|s| s.strip_suffix(';'))
                .unwrap_or(element)
                .replace('/', "."),
        };
        for _ in 0..dimensions {
            out.push_str("[]");
        }
        out
    }

    /// Rewrites the class name of an object or array type.
    ///
    /// `remap` receives the internal class name and returns the replacement,
    /// or `None` to keep it.
    pub fn remap<F>(&self, remap: F) -> TypeDescriptor
    where
        F: Fn(&str) -> Option<String>,
    {
        let dimensions = self.array_dimension();
        let element = &self.0[dimensions..];
        let class = element.strip_prefix('L').and_then(|s| s.strip_suffix(';'));
        match class.and_then(|name| remap(name)) {
            Some(mapped) => TypeDescriptor(format!("{}L{};", &self.0[..dimensions], mapped)),
            None => self.clone(),
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TypeDescriptor {
    type Err = DescriptorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// Splits `(args)ret` into the argument types and the return type.
fn split_method_descriptor(signature: &str) -> Option<(Vec<&str>, &str)> {
    let signature = signature.strip_prefix('(')?;
    let (mut parameter_types, return_type) = signature.split_once(')')?;
    if return_type.is_empty() {
        return None;
    }
    if return_type != "V" && field_type_len(return_type)? != return_type.len() {
        return None;
    }

    let mut types = Vec::new();
    while !parameter_types.is_empty() {
        let len = field_type_len(parameter_types)?;
        types.push(&parameter_types[..len]);
        parameter_types = &parameter_types[len..];
    }
    Some((types, return_type))
}

/// The descriptor of a method, e.g. `(ILjava/lang/String;)V`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MethodDescriptor(String);

impl MethodDescriptor {
    /// Wraps a raw descriptor without validating it.
    pub fn new(desc: impl Into<String>) -> Self {
        Self(desc.into())
    }

    /// Parses and validates a method descriptor.
    pub fn parse(desc: &str) -> Result<Self, DescriptorError> {
        split_method_descriptor(desc)
            .map(|_| Self::new(desc))
            .ok_or_else(|| DescriptorError::new(desc, "not a method descriptor"))
    }

    /// Builds a descriptor from its parts.
    pub fn from_parts<'a, I>(arguments: I, return_desc: &TypeDescriptor) -> Self
    where
        I: IntoIterator<Item = &'a TypeDescriptor>,
    {
        let mut desc = String::from("(");
        for arg in arguments {
            desc.push_str(arg.as_str());
        }
        desc.push(')');
        desc.push_str(return_desc.as_str());
        Self(desc)
    }

    /// The raw descriptor string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The argument types. Empty for a malformed descriptor.
    pub fn argument_descs(&self) -> Vec<TypeDescriptor> {
        split_method_descriptor(&self.0)
            .map(|(args, _)| args.into_iter().map(TypeDescriptor::new).collect())
            .unwrap_or_default()
    }

    /// The return type. `V` for a malformed descriptor.
    pub fn return_desc(&self) -> TypeDescriptor {
        split_method_descriptor(&self.0)
            .map(|(_, ret)| TypeDescriptor::new(ret))
            .unwrap_or_else(|| TypeDescriptor::new("V"))
    }

    /// Number of local variable slots taken by the arguments, excluding the
    /// receiver.
    pub fn argument_slots(&self) -> usize {
        self.argument_descs().iter().map(TypeDescriptor::size).sum()
    }

    /// Whether two methods with these descriptors would clash when given the
    /// same name: the JVM language only distinguishes overloads by argument
    /// types.
    pub fn can_conflict_with(&self, other: &MethodDescriptor) -> bool {
        self.argument_descs() == other.argument_descs()
    }

    /// Rewrites every class name mentioned by the descriptor.
    pub fn remap<F>(&self, remap: F) -> MethodDescriptor
    where
        F: Fn(&str) -> Option<String>,
    {
        let args: Vec<_> = self
            .argument_descs()
            .iter()
            .map(|arg| arg.remap(&remap))
            .collect();
        Self::from_parts(&args, &self.return_desc().remap(&remap))
    }

    /// Renders the arguments like a Java parameter list, e.g. `(int, java.lang.String)`.
    pub fn format_arguments(&self) -> String {
        let args: Vec<String> = self
            .argument_descs()
            .iter()
            .map(TypeDescriptor::to_java_type)
            .collect();
        format!("({})", args.join(", "))
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MethodDescriptor {
    type Err = DescriptorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_to_java_type() {
        let tests = HashMap::from([
            ("[I", "int[]"),
            ("I", "int"),
            ("[Ljava/lang/String;", "java.lang.String[]"),
            ("[[J", "long[][]"),
            ("La/b$c;", "a.b$c"),
        ]);

        for (ty, expected) in tests {
            assert_eq!(TypeDescriptor::new(ty).to_java_type(), expected);
            assert_eq!(TypeDescriptor::from_java_type(expected).as_str(), ty);
        }
    }

    #[test]
    fn test_parse_method_descriptor() {
        let desc = MethodDescriptor::parse("(I[JLjava/lang/String;)Ljava/lang/Object;").unwrap();
        assert_eq!(
            desc.argument_descs(),
            vec![
                TypeDescriptor::new("I"),
                TypeDescriptor::new("[J"),
                TypeDescriptor::new("Ljava/lang/String;"),
            ]
        );
        assert_eq!(desc.return_desc().as_str(), "Ljava/lang/Object;");
        assert_eq!(desc.argument_slots(), 3);
        assert_eq!(desc.format_arguments(), "(int, long[], java.lang.String)");

        for invalid in ["", "()", "(L)V", "(I", "()VV", "(L;)V", "(Q)V"] {
            assert!(MethodDescriptor::parse(invalid).is_err(), "{invalid}");
        }
    }

    #[test]
    fn test_parse_type_descriptor() {
        assert!(TypeDescriptor::parse("Ljava/lang/String;").is_ok());
        assert!(TypeDescriptor::parse("[[D").is_ok());
        assert!(TypeDescriptor::parse("II").is_err());
        assert!(TypeDescriptor::parse("Ljava/lang/String").is_err());
    }

    #[test]
    fn test_remap() {
        let desc = MethodDescriptor::new("(La;[La;I)Lb;");
        let remapped = desc.remap(|name| (name == "a").then(|| "pkg/Alpha".to_owned()));
        assert_eq!(remapped.as_str(), "(Lpkg/Alpha;[Lpkg/Alpha;I)Lb;");
    }

    #[test]
    fn test_overload_conflicts_ignore_return_type() {
        let a = MethodDescriptor::new("(I)V");
        let b = MethodDescriptor::new("(I)Ljava/lang/Object;");
        let c = MethodDescriptor::new("(J)V");
        assert!(a.can_conflict_with(&b));
        assert!(!a.can_conflict_with(&c));
    }
}
