//! A deobfuscation session over one binary, and its export.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use thiserror::Error;

use crate::access::AccessFlags;
use crate::classfile::{ClassDef, MethodDef};
use crate::config::{DecompileErrorStrategy, ProjectConfig};
use crate::entry::{ClassEntry, Entry};
use crate::index::JarIndex;
use crate::mapping::{Dropped, EntryMapping, EntryTree};
use crate::progress::ProgressListener;
use crate::remapper::EntryRemapper;
use crate::services::{NameProposalService, ObfuscationTestService};
use crate::translate::Translator;

/// An indexed binary together with its current mappings.
///
/// # Examples
///
/// ```
/// use jvm_remap::access::AccessFlags;
/// use jvm_remap::classfile::{ClassBuilder, MethodDef};
/// use jvm_remap::config::ProjectConfig;
/// use jvm_remap::entry::{ClassEntry, Entry, MethodEntry};
/// use jvm_remap::mapping::EntryMapping;
/// use jvm_remap::progress::NoopProgress;
/// use jvm_remap::project::Project;
///
/// let mut project = Project::new(
///     vec![ClassBuilder::new("a")
///         .method(MethodDef::new("m_1", "()V", AccessFlags::PUBLIC))
///         .build()],
///     ProjectConfig::default(),
/// );
/// let class = Entry::Class(ClassEntry::new("a"));
/// assert!(project.is_renamable(&class));
///
/// project
///     .remapper_mut()
///     .put_mapping(&class, EntryMapping::new("com/example/Foo"))
///     .unwrap();
/// let export = project.export_remapped(&NoopProgress);
/// assert!(export.class("com/example/Foo").is_some());
/// ```
pub struct Project {
    index: Arc<JarIndex>,
    classes: BTreeMap<String, ClassDef>,
    remapper: EntryRemapper,
    config: ProjectConfig,
}

impl Project {
    /// Indexes `classes` and starts without mappings.
    pub fn new(classes: Vec<ClassDef>, config: ProjectConfig) -> Self {
        let index = Arc::new(JarIndex::index(&classes));
        let classes = classes
            .into_iter()
            .map(|class| (class.entry.full_name(), class))
            .collect();
        Self {
            remapper: EntryRemapper::empty(index.clone()),
            index,
            classes,
            config,
        }
    }

    /// Sets the name proposal services.
    pub fn with_name_proposers(mut self, proposers: Vec<Arc<dyn NameProposalService>>) -> Self {
        self.remapper = self.remapper.with_name_proposers(proposers);
        self
    }

    /// Sets the obfuscation test services.
    pub fn with_obfuscation_tests(mut self, tests: Vec<Arc<dyn ObfuscationTestService>>) -> Self {
        self.remapper = self.remapper.with_obfuscation_tests(tests);
        self
    }

    /// The index of the binary.
    pub fn index(&self) -> &JarIndex {
        &self.index
    }

    /// The settings of this project.
    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// An obfuscated class by its full internal name.
    pub fn class(&self, name: &str) -> Option<&ClassDef> {
        self.classes.get(name)
    }

    /// The remapper holding the mappings.
    pub fn remapper(&self) -> &EntryRemapper {
        &self.remapper
    }

    /// The remapper holding the mappings, for editing.
    pub fn remapper_mut(&mut self) -> &mut EntryRemapper {
        &mut self.remapper
    }

    /// Replaces all mappings. Services stay in place.
    pub fn set_mappings(&mut self, mappings: Option<EntryTree<EntryMapping>>) {
        self.remapper.set_mappings(mappings);
    }

    /// Drops the mappings that do not fit the binary, recording the drops as
    /// changes.
    pub fn drop_mappings(&mut self) -> Dropped {
        self.remapper.drop_mappings()
    }

    /// Whether the entry is declared in the binary and can be navigated to.
    pub fn is_navigable(&self, entry: &Entry) -> bool {
        if let Entry::Class(class) = entry {
            if self.is_anonymous_or_local(class) {
                return false;
            }
        }
        self.index.entries().has_entry(entry)
    }

    /// Whether the entry may be given a name.
    ///
    /// Methods are only renamable when their name carries the configured
    /// obfuscation prefix. Locals other than parameters are only renamable
    /// when the configuration maps locals.
    pub fn is_renamable(&self, entry: &Entry) -> bool {
        match entry {
            Entry::Method(method) => {
                method.name().starts_with(&self.config.obfuscated_method_prefix)
                    && self.index.entries().has_entry(entry)
            }
            Entry::LocalVariable(local) => self.config.map_locals || local.is_argument(),
            Entry::Class(class) if self.is_anonymous_or_local(class) => false,
            _ => self.index.entries().has_entry(entry),
        }
    }

    /// Whether nothing gives the entry a readable name.
    pub fn is_obfuscated(&self, entry: &Entry) -> bool {
        self.remapper.is_obfuscated(entry)
    }

    /// Whether the entry is declared and flagged synthetic.
    pub fn is_synthetic(&self, entry: &Entry) -> bool {
        self.index
            .entries()
            .entry_access(entry)
            .map_or(false, |access| access.is_synthetic())
    }

    /// Whether the class was declared inside a method.
    pub fn is_anonymous_or_local(&self, class: &ClassEntry) -> bool {
        self.index.entries().is_anonymous_or_local(class)
    }

    /// Translates every class of the binary in parallel.
    pub fn export_remapped(&self, progress: &dyn ProgressListener) -> RemappedExport {
        let classes: Vec<&ClassDef> = self.classes.values().collect();
        progress.init(classes.len(), "deobfuscating classes");

        let count = AtomicUsize::new(0);
        let translated = classes
            .par_iter()
            .map(|class| {
                let translated = self.remapper.translate_class_def(class);
                progress.step(
                    count.fetch_add(1, Ordering::Relaxed),
                    &translated.entry.full_name(),
                );
                (translated.entry.full_name(), translated)
            })
            .collect();

        RemappedExport {
            classes: translated,
            strategy: self.config.decompile_error_strategy,
        }
    }
}

/// Error raised by a [`Decompiler`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("failed to decompile {class}: {message}")]
pub struct DecompileError {
    class: String,
    message: String,
}

impl DecompileError {
    /// Creates an error for the named class.
    pub fn new(class: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            message: message.into(),
        }
    }

    /// The class that failed.
    pub fn class(&self) -> &str {
        &self.class
    }
}

/// Error when exporting remapped classes or sources.
#[derive(Debug, Error)]
pub enum ExportError {
    /// A class failed to decompile under [`DecompileErrorStrategy::Propagate`].
    #[error(transparent)]
    Decompile(#[from] DecompileError),
    /// Writing the export failed.
    #[error("failed to write export")]
    Io(#[from] io::Error),
}

/// Turns translated classes into source text.
pub trait Decompiler: Sync {
    /// Decompiles a top-level class. `classes` holds every translated class,
    /// inner classes included.
    fn decompile(&self, class: &ClassDef, classes: &RemappedExport) -> Result<String, DecompileError>;
}

/// The translated classes of a binary, keyed by their full name.
///
/// Decompilation failures are handled by the project's
/// [`decompile_error_strategy`](ProjectConfig::decompile_error_strategy)
/// unless overridden with [`with_error_strategy`](Self::with_error_strategy).
#[derive(Clone, Debug, Default)]
pub struct RemappedExport {
    classes: BTreeMap<String, ClassDef>,
    strategy: DecompileErrorStrategy,
}

impl RemappedExport {
    /// How a failing class is handled by [`decompile`](Self::decompile).
    pub fn error_strategy(&self) -> DecompileErrorStrategy {
        self.strategy
    }

    /// Replaces the strategy for failing classes.
    pub fn with_error_strategy(mut self, strategy: DecompileErrorStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// A translated class by its full internal name.
    pub fn class(&self, name: &str) -> Option<&ClassDef> {
        self.classes.get(name)
    }

    /// All translated classes, ordered by name.
    pub fn classes(&self) -> impl Iterator<Item = &ClassDef> {
        self.classes.values()
    }

    /// The classes nested directly in `outer`.
    pub fn inner_classes<'a>(&'a self, outer: &'a ClassEntry) -> impl Iterator<Item = &'a ClassDef> {
        self.classes
            .values()
            .filter(move |class| class.entry.outer_class() == Some(outer))
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether there are no classes.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Decompiles every top-level class in parallel.
    ///
    /// Inner classes are left to the decompiler of their top-level class.
    pub fn decompile(
        &self,
        progress: &dyn ProgressListener,
        decompiler: &dyn Decompiler,
    ) -> Result<SourceExport, ExportError> {
        let top_level: Vec<&ClassDef> = self
            .classes
            .values()
            .filter(|class| !class.entry.is_inner())
            .collect();
        progress.init(top_level.len(), "decompiling classes");

        let count = AtomicUsize::new(0);
        let decompiled: Vec<Option<ClassSource>> = top_level
            .par_iter()
            .map(|class| {
                let name = class.entry.full_name();
                progress.step(count.fetch_add(1, Ordering::Relaxed), &name);

                let source = match decompiler.decompile(class, self) {
                    Ok(source) => source,
                    Err(err) => match self.strategy {
                        DecompileErrorStrategy::Propagate => return Err(err),
                        DecompileErrorStrategy::Ignore => {
                            log::warn!("skipping {}: {}", name, err);
                            return Ok(None);
                        }
                        DecompileErrorStrategy::TraceAsSource => err.to_string(),
                    },
                };
                Ok(Some(ClassSource { name, source }))
            })
            .collect::<Result<_, DecompileError>>()?;

        Ok(SourceExport {
            decompiled: decompiled.into_iter().flatten().collect(),
        })
    }
}

/// Decompiled sources, ready to be written out.
#[derive(Clone, Debug, Default)]
pub struct SourceExport {
    /// One source per top-level class, ordered by name.
    pub decompiled: Vec<ClassSource>,
}

impl SourceExport {
    /// Writes every source below `root`, one file per class.
    pub fn write(&self, root: &Path, progress: &dyn ProgressListener) -> Result<(), ExportError> {
        progress.init(self.decompiled.len(), "writing sources");
        for (n, source) in self.decompiled.iter().enumerate() {
            progress.step(n, &source.name);
            source.write_to(&source.resolve_path(root))?;
        }
        Ok(())
    }
}

/// The source of one top-level class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassSource {
    /// Full internal name of the class.
    pub name: String,
    /// The source text.
    pub source: String,
}

impl ClassSource {
    /// The file below `root` the source belongs in.
    pub fn resolve_path(&self, root: &Path) -> PathBuf {
        root.join(format!("{}.java", self.name.replace('.', "/")))
    }

    /// Writes the source to `path`, creating parent directories.
    pub fn write_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &self.source)
    }
}

/// Renders classes as a bytecode listing.
#[derive(Clone, Copy, Debug, Default)]
pub struct BytecodeDecompiler;

impl Decompiler for BytecodeDecompiler {
    fn decompile(&self, class: &ClassDef, classes: &RemappedExport) -> Result<String, DecompileError> {
        let mut out = String::new();
        if let Some(source_file) = &class.source_file {
            let _ = writeln!(out, "// {source_file}");
        }
        render_class(&mut out, class, classes, 0);
        Ok(out)
    }
}

fn render_class(out: &mut String, class: &ClassDef, classes: &RemappedExport, depth: usize) {
    let indent = "    ".repeat(depth);
    let kind = if class.access.is_interface() {
        "interface"
    } else if class.access.is_enum() {
        "enum"
    } else {
        "class"
    };
    let _ = write!(
        out,
        "{indent}{}{kind} {}",
        modifiers(class.access),
        class.entry.full_name()
    );
    if let Some(super_class) = &class.super_class {
        let _ = write!(out, " extends {}", super_class.full_name());
    }
    if !class.interfaces.is_empty() {
        let interfaces: Vec<String> = class.interfaces.iter().map(ClassEntry::full_name).collect();
        let _ = write!(out, " implements {}", interfaces.join(", "));
    }
    out.push_str(" {\n");

    for field in &class.fields {
        let _ = writeln!(
            out,
            "{indent}    {}{} {};",
            modifiers(field.access),
            field.desc.to_java_type(),
            field.name
        );
    }
    for method in &class.methods {
        out.push('\n');
        render_method(out, method, &indent);
    }
    for inner in classes.inner_classes(&class.entry) {
        out.push('\n');
        render_class(out, inner, classes, depth + 1);
    }

    let _ = writeln!(out, "{indent}}}");
}

fn modifiers(access: AccessFlags) -> String {
    let words = access.to_string();
    if words.is_empty() {
        words
    } else {
        words + " "
    }
}

fn render_method(out: &mut String, method: &MethodDef, indent: &str) {
    let args: Vec<String> = method
        .desc
        .argument_descs()
        .iter()
        .enumerate()
        .map(|(n, desc)| {
            let slot = method.first_argument_slot() as usize
                + method.desc.argument_descs()[..n].iter().map(|d| d.size()).sum::<usize>();
            let name = method
                .locals
                .iter()
                .find(|local| local.index as usize == slot)
                .map_or_else(|| format!("arg{n}"), |local| local.name.clone());
            format!("{} {}", desc.to_java_type(), name)
        })
        .collect();
    let _ = write!(
        out,
        "{indent}    {}{} {}({})",
        modifiers(method.access),
        method.desc.return_desc().to_java_type(),
        method.name,
        args.join(", ")
    );
    if method.code.is_empty() {
        out.push_str(";\n");
        return;
    }
    out.push_str(" {\n");
    for (offset, instruction) in method.code.iter().enumerate() {
        let _ = write!(out, "{indent}        {offset}: {}", instruction.mnemonic());
        if let Some(member) = instruction.member_reference() {
            let _ = write!(out, " {member}");
        }
        out.push('\n');
    }
    let _ = writeln!(out, "{indent}    }}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Instruction;
    use crate::classfile::ClassBuilder;
    use crate::entry::{FieldEntry, LocalVariableEntry, MethodEntry};
    use crate::progress::NoopProgress;

    fn project(config: ProjectConfig) -> Project {
        Project::new(
            vec![
                ClassBuilder::new("a")
                    .field("a", "I", AccessFlags::PRIVATE | AccessFlags::SYNTHETIC)
                    .method(
                        MethodDef::new("m_1", "(I)V", AccessFlags::PUBLIC)
                            .with_local(1, "x", "I")
                            .with_code(vec![Instruction::Return(None)]),
                    )
                    .method(MethodDef::new("toString", "()Ljava/lang/String;", AccessFlags::PUBLIC))
                    .source_file("a.java")
                    .build(),
                ClassBuilder::new("a$1")
                    .enclosed_in("a", Some(("m_1", "(I)V")))
                    .build(),
                ClassBuilder::new("a$b").build(),
            ],
            config,
        )
    }

    #[test]
    fn test_predicates() {
        let project = project(ProjectConfig::default());
        let anonymous = Entry::Class(ClassEntry::new("a$1"));
        let inner = Entry::Class(ClassEntry::new("a$b"));
        let method = MethodEntry::parse("a", "m_1", "(I)V");
        let arg = LocalVariableEntry::new(method.clone(), 1, "x", true);
        let local = LocalVariableEntry::new(method.clone(), 2, "y", false);

        assert!(!project.is_navigable(&anonymous));
        assert!(!project.is_renamable(&anonymous));
        assert!(project.is_navigable(&inner));
        assert!(project.is_renamable(&inner));

        assert!(project.is_renamable(&Entry::Method(method)));
        assert!(!project.is_renamable(&Entry::Method(MethodEntry::parse(
            "a",
            "toString",
            "()Ljava/lang/String;"
        ))));
        assert!(project.is_renamable(&Entry::LocalVariable(arg)));
        assert!(!project.is_renamable(&Entry::LocalVariable(local.clone())));

        let project = Project::new(Vec::new(), ProjectConfig {
            map_locals: true,
            ..ProjectConfig::default()
        });
        assert!(project.is_renamable(&Entry::LocalVariable(local)));
    }

    #[test]
    fn test_synthetic() {
        let project = project(ProjectConfig::default());
        assert!(project.is_synthetic(&Entry::Field(FieldEntry::parse("a", "a", "I"))));
        assert!(!project.is_synthetic(&Entry::Field(FieldEntry::parse("a", "b", "I"))));
    }

    #[test]
    fn test_export_and_decompile() {
        let mut project = project(ProjectConfig::default());
        let class = Entry::Class(ClassEntry::new("a"));
        project
            .remapper_mut()
            .put_mapping(&class, EntryMapping::new("pkg/Foo"))
            .unwrap();
        project
            .remapper_mut()
            .put_mapping(
                &Entry::Method(MethodEntry::parse("a", "m_1", "(I)V")),
                EntryMapping::new("run"),
            )
            .unwrap();

        let export = project.export_remapped(&NoopProgress);
        assert_eq!(export.len(), 3);
        assert!(export.class("pkg/Foo$b").is_some());

        let sources = export
            .decompile(&NoopProgress, &BytecodeDecompiler)
            .unwrap();
        assert_eq!(sources.decompiled.len(), 1);
        let source = &sources.decompiled[0];
        assert_eq!(source.name, "pkg/Foo");
        assert!(source.source.starts_with("// a.java\n"));
        assert!(source.source.contains("public void run(int x) {"));
        assert!(source.source.contains("class pkg/Foo$b"));
        assert_eq!(
            source.resolve_path(Path::new("out")),
            Path::new("out/pkg/Foo.java")
        );
    }

    struct Failing;

    impl Decompiler for Failing {
        fn decompile(&self, class: &ClassDef, _: &RemappedExport) -> Result<String, DecompileError> {
            Err(DecompileError::new(class.entry.full_name(), "unsupported"))
        }
    }

    #[test]
    fn test_decompile_error_strategies() {
        let export = project(ProjectConfig::default()).export_remapped(&NoopProgress);
        assert_eq!(export.error_strategy(), DecompileErrorStrategy::Propagate);
        assert!(matches!(
            export.decompile(&NoopProgress, &Failing),
            Err(ExportError::Decompile(_))
        ));

        let traced = export
            .clone()
            .with_error_strategy(DecompileErrorStrategy::TraceAsSource)
            .decompile(&NoopProgress, &Failing)
            .unwrap();
        assert_eq!(traced.decompiled[0].source, "failed to decompile a: unsupported");
    }

    #[test]
    fn test_error_strategy_follows_config() {
        let config = ProjectConfig {
            decompile_error_strategy: DecompileErrorStrategy::Ignore,
            ..ProjectConfig::default()
        };
        let export = project(config).export_remapped(&NoopProgress);
        assert_eq!(export.error_strategy(), DecompileErrorStrategy::Ignore);

        let ignored = export.decompile(&NoopProgress, &Failing).unwrap();
        assert!(ignored.decompiled.is_empty());
    }

    #[test]
    fn test_dollar_names_are_top_level() {
        let project = Project::new(
            vec![
                ClassBuilder::new("$Proxy").build(),
                ClassBuilder::new("a/Foo$").build(),
                ClassBuilder::new("a/Foo$Bar").build(),
            ],
            ProjectConfig::default(),
        );
        let sources = project
            .export_remapped(&NoopProgress)
            .decompile(&NoopProgress, &BytecodeDecompiler)
            .unwrap();
        let names: Vec<&str> = sources.decompiled.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["$Proxy", "a/Foo$"]);
    }
}
