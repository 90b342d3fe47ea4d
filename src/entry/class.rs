use std::fmt;

use serde::{Deserialize, Serialize};

/// A class, identified by its internal binary name.
///
/// Nested classes keep their outer class as parent: `a/b$c` is the class `c`
/// nested in `a/b`. The [`name`](Self::name) of a nested class is therefore
/// only its last segment, while [`full_name`](Self::full_name) is the complete
/// binary name.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClassEntry {
    outer: Option<Box<ClassEntry>>,
    name: String,
}

impl ClassEntry {
    /// Creates a class from its full internal name, e.g. `java/util/Map$Entry`.
    pub fn new(full_name: &str) -> Self {
        match split_outer(full_name) {
            Some((outer, inner)) => Self {
                outer: Some(Box::new(ClassEntry::new(outer))),
                name: inner.to_owned(),
            },
            None => Self {
                outer: None,
                name: full_name.to_owned(),
            },
        }
    }

    /// Creates a class with an explicit outer class.
    pub fn nested(outer: Option<ClassEntry>, name: impl Into<String>) -> Self {
        Self {
            outer: outer.map(Box::new),
            name: name.into(),
        }
    }

    /// The default name: the simple name for nested classes, the full name
    /// otherwise.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name without package, e.g. `Map` for `java/util/Map`.
    pub fn simple_name(&self) -> &str {
        match self.outer {
            Some(_) => &self.name,
            None => match self.name.rfind('/') {
                Some(pos) => &self.name[pos + 1..],
                None => &self.name,
            },
        }
    }

    /// The complete internal name, e.g. `java/util/Map$Entry`.
    pub fn full_name(&self) -> String {
        match &self.outer {
            Some(outer) => format!("{}${}", outer.full_name(), self.name),
            None => self.name.clone(),
        }
    }

    /// The name relative to the package, e.g. `Map$Entry`.
    pub fn contextual_name(&self) -> String {
        match &self.outer {
            Some(outer) => format!("{}${}", outer.contextual_name(), self.name),
            None => self.simple_name().to_owned(),
        }
    }

    /// The package of the outermost class, or `None` for the default package.
    pub fn package_name(&self) -> Option<&str> {
        match &self.outer {
            Some(outer) => outer.package_name(),
            None => self.name.rfind('/').map(|pos| &self.name[..pos]),
        }
    }

    /// The enclosing class of a nested class.
    pub fn outer_class(&self) -> Option<&ClassEntry> {
        self.outer.as_deref()
    }

    /// Whether this class is nested in another one.
    pub fn is_inner(&self) -> bool {
        self.outer.is_some()
    }

    /// The outermost enclosing class, or `self` for a top-level class.
    pub fn outermost_class(&self) -> &ClassEntry {
        match &self.outer {
            Some(outer) => outer.outermost_class(),
            None => self,
        }
    }

    /// Whether this is an array pseudo class such as `[I`.
    pub fn is_array(&self) -> bool {
        self.name.starts_with('[')
    }

    /// Whether this class belongs to the Java platform.
    pub fn is_jre(&self) -> bool {
        let package = self.package_name().unwrap_or("");
        package == "java" || package.starts_with("java/") || package.starts_with("javax/")
    }

    /// Returns a copy with a different (simple) name.
    pub fn with_name(&self, name: &str) -> Self {
        Self {
            outer: self.outer.clone(),
            name: name.to_owned(),
        }
    }

    /// Returns a copy nested in a different outer class.
    pub fn with_outer(&self, outer: Option<ClassEntry>) -> Self {
        Self {
            outer: outer.map(Box::new),
            name: self.name.clone(),
        }
    }
}

impl fmt::Display for ClassEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())
    }
}

impl From<&str> for ClassEntry {
    fn from(full_name: &str) -> Self {
        ClassEntry::new(full_name)
    }
}

fn split_outer(full_name: &str) -> Option<(&str, &str)> {
    if full_name.starts_with('[') {
        return None;
    }
    let pos = full_name.rfind('$')?;
    // `$` at either end is part of the name, not a nesting separator
    if pos == 0 || pos + 1 == full_name.len() || full_name[..pos].ends_with('/') {
        return None;
    }
    Some((&full_name[..pos], &full_name[pos + 1..]))
}
