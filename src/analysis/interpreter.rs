use crate::classfile::MethodDef;
use crate::descriptor::TypeDescriptor;
use crate::entry::{ClassEntry, Entry, MethodEntry};

use super::{
    AnalyzerError, AnalyzerErrorKind, Constant, HandleKind, InvokeKind, Instruction, Lambda,
    LambdaEdge, MethodAnalysis, ReferenceEdge, ReferenceTargetType, ValueKind,
};

const OBJECT: &str = "java/lang/Object";
const THROWABLE: &str = "java/lang/Throwable";

/// Class hierarchy queries the interpreter needs to merge reference types
/// flowing in from different paths.
pub trait TypeHierarchy {
    /// The closest common superclass of two classes. `java/lang/Object` if
    /// nothing better is known.
    fn common_supertype(&self, a: &ClassEntry, b: &ClassEntry) -> ClassEntry;
}

/// An abstract value in a local variable slot or on the operand stack.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    /// Unusable: an unset slot, the second word of a wide value, or the
    /// merge of incompatible values.
    Top,
    /// `int` (and narrower)
    Int,
    /// `long`
    Long,
    /// `float`
    Float,
    /// `double`
    Double,
    /// The `null` constant.
    Null,
    /// A reference of the given static type.
    Reference(TypeDescriptor),
    /// The result of a `new` not yet passed to a constructor.
    Uninitialized {
        /// The instantiated class.
        class: ClassEntry,
        /// Index of the `new` instruction.
        site: usize,
    },
    /// `this` inside a constructor before the superclass constructor ran.
    UninitializedThis,
}

impl Value {
    /// The value a descriptor describes; `None` for `void`.
    pub fn of_desc(desc: &TypeDescriptor) -> Option<Value> {
        match ValueKind::of(desc)? {
            ValueKind::Reference => Some(Value::Reference(desc.clone())),
            kind => Some(Value::of_kind(kind)),
        }
    }

    fn of_kind(kind: ValueKind) -> Value {
        match kind {
            ValueKind::Int => Value::Int,
            ValueKind::Long => Value::Long,
            ValueKind::Float => Value::Float,
            ValueKind::Double => Value::Double,
            ValueKind::Reference => Value::Null,
        }
    }

    fn object(class: &str) -> Value {
        Value::Reference(TypeDescriptor::of_class(class))
    }

    /// Whether the value takes two words.
    pub fn is_wide(&self) -> bool {
        matches!(self, Value::Long | Value::Double)
    }
}

/// The locals and operand stack before an instruction executes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Local variable slots. Wide values are followed by [`Value::Top`].
    pub locals: Vec<Value>,
    /// The operand stack, top last. Wide values take a single entry.
    pub stack: Vec<Value>,
}

impl Frame {
    fn pop(&mut self) -> Result<Value, AnalyzerErrorKind> {
        self.stack.pop().ok_or(AnalyzerErrorKind::StackUnderflow)
    }

    fn pop_n(&mut self, n: usize) -> Result<(), AnalyzerErrorKind> {
        for _ in 0..n {
            self.pop()?;
        }
        Ok(())
    }

    fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    fn peek(&self, depth: usize) -> Result<&Value, AnalyzerErrorKind> {
        self.stack
            .len()
            .checked_sub(depth + 1)
            .and_then(|index| self.stack.get(index))
            .ok_or(AnalyzerErrorKind::StackUnderflow)
    }

    fn local(&self, index: u16) -> Result<&Value, AnalyzerErrorKind> {
        self.locals
            .get(index as usize)
            .ok_or(AnalyzerErrorKind::LocalOutOfRange(index))
    }

    fn set_local(&mut self, index: u16, value: Value) -> Result<(), AnalyzerErrorKind> {
        let slot = index as usize;
        let wide = value.is_wide();
        if slot >= self.locals.len() || (wide && slot + 1 >= self.locals.len()) {
            return Err(AnalyzerErrorKind::LocalOutOfRange(index));
        }
        // overwriting the second word of a wide value invalidates it
        if slot > 0 && self.locals[slot - 1].is_wide() {
            self.locals[slot - 1] = Value::Top;
        }
        self.locals[slot] = value;
        if wide {
            self.locals[slot + 1] = Value::Top;
        }
        Ok(())
    }

    fn replace_all(&mut self, old: &Value, new: &Value) {
        for value in self.locals.iter_mut().chain(self.stack.iter_mut()) {
            if value == old {
                *value = new.clone();
            }
        }
    }
}

/// Abstract interpreter extracting the reference edges of method bodies.
///
/// The interpreter runs a worklist fixpoint over the control flow graph,
/// then walks every reachable instruction once with its final frame to emit
/// edges.
pub struct Analyzer<'a, H: ?Sized> {
    hierarchy: &'a H,
}

impl<'a, H: TypeHierarchy + ?Sized> Analyzer<'a, H> {
    /// Creates an analyzer merging types through `hierarchy`.
    pub fn new(hierarchy: &'a H) -> Self {
        Self { hierarchy }
    }

    /// Analyzes one method body of `owner`.
    pub fn analyze(&self, owner: &ClassEntry, method: &MethodDef) -> MethodAnalysis {
        let entry = MethodEntry::def(
            owner.clone(),
            method.name.clone(),
            method.desc.clone(),
            method.access,
        );
        let mut analysis = MethodAnalysis::new(entry);
        if method.code.is_empty() {
            return analysis;
        }

        let (frames, error) = self.compute_frames(owner, method);
        analysis.error = error.map(|(offset, kind)| {
            AnalyzerError::new(analysis.method.clone(), offset, kind)
        });

        for (offset, (insn, frame)) in method.code.iter().zip(frames.iter()).enumerate() {
            let Some(frame) = frame else {
                continue;
            };
            if let Err(kind) = self.emit(offset, insn, frame, &mut analysis) {
                if analysis.error.is_none() {
                    analysis.error = Some(AnalyzerError::new(analysis.method.clone(), offset, kind));
                }
            }
        }

        if let Some(error) = &analysis.error {
            log::warn!("{}", error);
        }
        analysis
    }

    fn compute_frames(
        &self,
        owner: &ClassEntry,
        method: &MethodDef,
    ) -> (Vec<Option<Frame>>, Option<(usize, AnalyzerErrorKind)>) {
        let code = &method.code;
        let mut frames: Vec<Option<Frame>> = vec![None; code.len()];
        frames[0] = Some(initial_frame(owner, method));
        let mut worklist = vec![0usize];
        let mut queued = vec![false; code.len()];
        queued[0] = true;

        while let Some(index) = worklist.pop() {
            queued[index] = false;
            let Some(before) = frames[index].clone() else {
                continue;
            };
            let insn = &code[index];

            let mut after = before.clone();
            if let Err(kind) = self.execute(owner, index, insn, &mut after) {
                return (frames, Some((index, kind)));
            }

            let mut successors: Vec<(usize, Frame)> = Vec::new();
            for target in insn.jump_targets() {
                successors.push((target, after.clone()));
            }
            if insn.falls_through() {
                if index + 1 >= code.len() {
                    return (frames, Some((index, AnalyzerErrorKind::FallsOffEnd)));
                }
                successors.push((index + 1, after));
            }
            for handler in &method.handlers {
                if handler.start <= index && index < handler.end {
                    let caught = handler
                        .catch_type
                        .as_ref()
                        .map(ClassEntry::full_name)
                        .unwrap_or_else(|| THROWABLE.to_owned());
                    let frame = Frame {
                        locals: before.locals.clone(),
                        stack: vec![Value::object(&caught)],
                    };
                    successors.push((handler.handler, frame));
                }
            }

            for (target, frame) in successors {
                if target >= code.len() {
                    return (frames, Some((index, AnalyzerErrorKind::JumpOutOfRange(target))));
                }
                match self.merge_into(&mut frames[target], frame) {
                    Ok(true) if !queued[target] => {
                        queued[target] = true;
                        worklist.push(target);
                    }
                    Ok(_) => {}
                    Err(kind) => return (frames, Some((target, kind))),
                }
            }
        }

        (frames, None)
    }

    fn execute(
        &self,
        owner: &ClassEntry,
        index: usize,
        insn: &Instruction,
        frame: &mut Frame,
    ) -> Result<(), AnalyzerErrorKind> {
        match insn {
            Instruction::Nop | Instruction::Goto(_) | Instruction::Return(None) => {}
            Instruction::AconstNull => frame.push(Value::Null),
            Instruction::Const(kind) => frame.push(Value::of_kind(*kind)),
            Instruction::Ldc(constant) => frame.push(match constant {
                Constant::Int(_) => Value::Int,
                Constant::Long(_) => Value::Long,
                Constant::Float(_) => Value::Float,
                Constant::Double(_) => Value::Double,
                Constant::String(_) => Value::object("java/lang/String"),
                Constant::Class(_) => Value::object("java/lang/Class"),
                Constant::MethodType(_) => Value::object("java/lang/invoke/MethodType"),
                Constant::MethodHandle(_) => Value::object("java/lang/invoke/MethodHandle"),
            }),
            Instruction::Load(kind, slot) => {
                let value = frame.local(*slot)?.clone();
                frame.push(match kind {
                    ValueKind::Reference => value,
                    kind => Value::of_kind(*kind),
                });
            }
            Instruction::Store(_, slot) => {
                let value = frame.pop()?;
                frame.set_local(*slot, value)?;
            }
            Instruction::ArrayLoad(kind) => {
                frame.pop()?;
                let array = frame.pop()?;
                frame.push(match (kind, array) {
                    (ValueKind::Reference, Value::Reference(desc)) => desc
                        .array_element()
                        .map(Value::Reference)
                        .unwrap_or_else(|| Value::object(OBJECT)),
                    (ValueKind::Reference, Value::Null) => Value::Null,
                    (ValueKind::Reference, _) => Value::object(OBJECT),
                    (kind, _) => Value::of_kind(*kind),
                });
            }
            Instruction::ArrayStore(_) => frame.pop_n(3)?,
            Instruction::Pop => {
                frame.pop()?;
            }
            Instruction::Pop2 => {
                if !frame.pop()?.is_wide() {
                    frame.pop()?;
                }
            }
            Instruction::Dup => {
                let value = frame.peek(0)?.clone();
                frame.push(value);
            }
            Instruction::DupX1 => {
                let v1 = frame.pop()?;
                let v2 = frame.pop()?;
                frame.stack.extend([v1.clone(), v2, v1]);
            }
            Instruction::DupX2 => {
                let v1 = frame.pop()?;
                let v2 = frame.pop()?;
                if v2.is_wide() {
                    frame.stack.extend([v1.clone(), v2, v1]);
                } else {
                    let v3 = frame.pop()?;
                    frame.stack.extend([v1.clone(), v3, v2, v1]);
                }
            }
            Instruction::Dup2 => {
                let v1 = frame.pop()?;
                if v1.is_wide() {
                    frame.stack.extend([v1.clone(), v1]);
                } else {
                    let v2 = frame.pop()?;
                    frame.stack.extend([v2.clone(), v1.clone(), v2, v1]);
                }
            }
            Instruction::Dup2X1 => {
                let v1 = frame.pop()?;
                if v1.is_wide() {
                    let v2 = frame.pop()?;
                    frame.stack.extend([v1.clone(), v2, v1]);
                } else {
                    let v2 = frame.pop()?;
                    let v3 = frame.pop()?;
                    frame.stack.extend([v2.clone(), v1.clone(), v3, v2, v1]);
                }
            }
            Instruction::Dup2X2 => {
                let v1 = frame.pop()?;
                if v1.is_wide() {
                    let v2 = frame.pop()?;
                    if v2.is_wide() {
                        frame.stack.extend([v1.clone(), v2, v1]);
                    } else {
                        let v3 = frame.pop()?;
                        frame.stack.extend([v1.clone(), v3, v2, v1]);
                    }
                } else {
                    let v2 = frame.pop()?;
                    let v3 = frame.pop()?;
                    if v3.is_wide() {
                        frame.stack.extend([v2.clone(), v1.clone(), v3, v2, v1]);
                    } else {
                        let v4 = frame.pop()?;
                        frame.stack.extend([v2.clone(), v1.clone(), v4, v3, v2, v1]);
                    }
                }
            }
            Instruction::Swap => {
                let v1 = frame.pop()?;
                let v2 = frame.pop()?;
                frame.stack.extend([v1, v2]);
            }
            Instruction::Binary(kind) | Instruction::Shift(kind) => {
                frame.pop_n(2)?;
                frame.push(Value::of_kind(*kind));
            }
            Instruction::Negate(kind) | Instruction::Convert(_, kind) => {
                frame.pop()?;
                frame.push(Value::of_kind(*kind));
            }
            Instruction::Compare(_) => {
                frame.pop_n(2)?;
                frame.push(Value::Int);
            }
            Instruction::Iinc(slot, _) => {
                frame.local(*slot)?;
            }
            Instruction::If(condition, _) => match condition {
                super::Condition::Int | super::Condition::Null => frame.pop_n(1)?,
                super::Condition::IntCompare | super::Condition::ReferenceCompare => {
                    frame.pop_n(2)?
                }
            },
            Instruction::Switch { .. }
            | Instruction::Return(Some(_))
            | Instruction::Athrow
            | Instruction::PutStatic(_)
            | Instruction::MonitorEnter
            | Instruction::MonitorExit => frame.pop_n(1)?,
            Instruction::GetStatic(field) => {
                frame.push(Value::of_desc(field.desc()).unwrap_or(Value::Top));
            }
            Instruction::GetField(field) => {
                frame.pop()?;
                frame.push(Value::of_desc(field.desc()).unwrap_or(Value::Top));
            }
            Instruction::PutField(_) => frame.pop_n(2)?,
            Instruction::Invoke(kind, method) => {
                frame.pop_n(method.desc().argument_descs().len())?;
                if *kind != InvokeKind::Static {
                    let receiver = frame.pop()?;
                    if *kind == InvokeKind::Special && method.is_constructor() {
                        let initialized = match &receiver {
                            Value::Uninitialized { class, .. } => Some(Value::object(&class.full_name())),
                            Value::UninitializedThis => Some(Value::object(&owner.full_name())),
                            _ => None,
                        };
                        if let Some(initialized) = initialized {
                            frame.replace_all(&receiver, &initialized);
                        }
                    }
                }
                if let Some(value) = Value::of_desc(&method.desc().return_desc()) {
                    frame.push(value);
                }
            }
            Instruction::InvokeDynamic { desc, .. } => {
                frame.pop_n(desc.argument_descs().len())?;
                if let Some(value) = Value::of_desc(&desc.return_desc()) {
                    frame.push(value);
                }
            }
            Instruction::New(class) => frame.push(Value::Uninitialized {
                class: class.clone(),
                site: index,
            }),
            Instruction::NewArray(element) => {
                frame.pop()?;
                frame.push(Value::Reference(TypeDescriptor::new(format!("[{element}"))));
            }
            Instruction::MultiNewArray(desc, dimensions) => {
                frame.pop_n(*dimensions as usize)?;
                frame.push(Value::Reference(desc.clone()));
            }
            Instruction::ArrayLength | Instruction::InstanceOf(_) => {
                frame.pop()?;
                frame.push(Value::Int);
            }
            Instruction::CheckCast(desc) => {
                let value = frame.pop()?;
                frame.push(match value {
                    Value::Null => Value::Null,
                    _ => Value::Reference(desc.clone()),
                });
            }
        }
        Ok(())
    }

    fn emit(
        &self,
        offset: usize,
        insn: &Instruction,
        frame: &Frame,
        analysis: &mut MethodAnalysis,
    ) -> Result<(), AnalyzerErrorKind> {
        let (target, target_type) = match insn {
            Instruction::GetStatic(field) | Instruction::PutStatic(field) => {
                (Entry::Field(field.clone()), ReferenceTargetType::None)
            }
            Instruction::GetField(field) => {
                (Entry::Field(field.clone()), target_type(frame.peek(0)?)?)
            }
            Instruction::PutField(field) => {
                (Entry::Field(field.clone()), target_type(frame.peek(1)?)?)
            }
            Instruction::Invoke(InvokeKind::Static, method) => {
                (Entry::Method(method.clone()), ReferenceTargetType::None)
            }
            Instruction::Invoke(_, method) => {
                let receiver = frame.peek(method.desc().argument_descs().len())?;
                (Entry::Method(method.clone()), target_type(receiver)?)
            }
            Instruction::InvokeDynamic {
                name,
                desc,
                bootstrap,
                args,
            } => {
                let Some(lambda) = Lambda::from_invoke_dynamic(name, desc, bootstrap, args) else {
                    return Ok(());
                };

                let captured = desc.argument_descs().len();
                let implementation = &lambda.implementation;
                let has_receiver = !matches!(
                    implementation.kind,
                    HandleKind::GetStatic | HandleKind::PutField | HandleKind::InvokeStatic
                ) && lambda.instantiated_method_type.argument_descs().len()
                    < implementation.argument_count();
                let target_type = if has_receiver && captured > 0 {
                    target_type(frame.peek(captured - 1)?)?
                } else {
                    ReferenceTargetType::None
                };

                analysis.lambdas.push(LambdaEdge {
                    offset,
                    lambda,
                    target_type,
                });
                return Ok(());
            }
            _ => return Ok(()),
        };

        analysis.references.push(ReferenceEdge {
            offset,
            target,
            target_type,
        });
        Ok(())
    }

    fn merge_into(&self, slot: &mut Option<Frame>, incoming: Frame) -> Result<bool, AnalyzerErrorKind> {
        if slot.is_none() {
            *slot = Some(incoming);
            return Ok(true);
        }
        let Some(existing) = slot.as_mut() else {
            return Ok(false);
        };
        if existing.stack.len() != incoming.stack.len() {
            return Err(AnalyzerErrorKind::IncompatibleStackHeights);
        }

        let mut changed = false;
        let pairs = existing
            .locals
            .iter_mut()
            .zip(incoming.locals.iter())
            .chain(existing.stack.iter_mut().zip(incoming.stack.iter()));
        for (old, new) in pairs {
            let merged = self.merge_values(old, new);
            if merged != *old {
                *old = merged;
                changed = true;
            }
        }
        Ok(changed)
    }

    fn merge_values(&self, a: &Value, b: &Value) -> Value {
        match (a, b) {
            _ if a == b => a.clone(),
            (Value::Null, Value::Reference(_)) => b.clone(),
            (Value::Reference(_), Value::Null) => a.clone(),
            (Value::Reference(x), Value::Reference(y)) => Value::Reference(self.merge_types(x, y)),
            _ => Value::Top,
        }
    }

    fn merge_types(&self, a: &TypeDescriptor, b: &TypeDescriptor) -> TypeDescriptor {
        if a == b {
            return a.clone();
        }
        if a.is_type() && b.is_type() {
            if let (Some(x), Some(y)) = (a.type_entry(), b.type_entry()) {
                let common = self.hierarchy.common_supertype(&x, &y);
                return TypeDescriptor::of_class(&common.full_name());
            }
        }
        if let (Some(x), Some(y)) = (a.array_element(), b.array_element()) {
            if x.is_reference() && y.is_reference() {
                return TypeDescriptor::new(format!("[{}", self.merge_types(&x, &y)));
            }
        }
        TypeDescriptor::of_class(OBJECT)
    }
}

fn initial_frame(owner: &ClassEntry, method: &MethodDef) -> Frame {
    let mut max_locals = method.first_argument_slot() as usize + method.desc.argument_slots();
    for insn in &method.code {
        let used = match insn {
            Instruction::Load(kind, slot) | Instruction::Store(kind, slot) => {
                *slot as usize + if kind.is_wide() { 2 } else { 1 }
            }
            Instruction::Iinc(slot, _) => *slot as usize + 1,
            _ => 0,
        };
        max_locals = max_locals.max(used);
    }

    let mut locals = vec![Value::Top; max_locals];
    let mut slot = 0;
    if !method.access.is_static() {
        locals[0] = if method.name == "<init>" {
            Value::UninitializedThis
        } else {
            Value::object(&owner.full_name())
        };
        slot = 1;
    }
    for arg in method.desc.argument_descs() {
        if let Some(value) = Value::of_desc(&arg) {
            locals[slot] = value;
        }
        slot += arg.size();
    }

    Frame {
        locals,
        stack: Vec::new(),
    }
}

fn target_type(receiver: &Value) -> Result<ReferenceTargetType, AnalyzerErrorKind> {
    match receiver {
        Value::Uninitialized { .. } | Value::UninitializedThis => {
            Ok(ReferenceTargetType::Uninitialized)
        }
        Value::Reference(desc) if desc.is_array() => {
            Ok(ReferenceTargetType::ClassType(ClassEntry::new(OBJECT)))
        }
        Value::Reference(desc) => desc
            .type_entry()
            .map(ReferenceTargetType::ClassType)
            .ok_or(AnalyzerErrorKind::NonObjectReceiver),
        Value::Null => Ok(ReferenceTargetType::ClassType(ClassEntry::new(OBJECT))),
        _ => Err(AnalyzerErrorKind::NonObjectReceiver),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::AccessFlags;
    use crate::analysis::{Condition, MethodHandle};
    use crate::descriptor::MethodDescriptor;
    use crate::entry::FieldEntry;

    struct FlatHierarchy;

    impl TypeHierarchy for FlatHierarchy {
        fn common_supertype(&self, _: &ClassEntry, _: &ClassEntry) -> ClassEntry {
            ClassEntry::new(OBJECT)
        }
    }

    fn analyze(method: MethodDef) -> MethodAnalysis {
        Analyzer::new(&FlatHierarchy).analyze(&ClassEntry::new("a/Owner"), &method)
    }

    fn target_types(analysis: &MethodAnalysis) -> Vec<ReferenceTargetType> {
        analysis
            .references
            .iter()
            .map(|edge| edge.target_type.clone())
            .collect()
    }

    #[test]
    fn test_static_and_instance_targets() {
        let method = MethodDef::new("m", "(La/Other;)V", AccessFlags::PUBLIC).with_code(vec![
            Instruction::GetStatic(FieldEntry::parse("a/S", "f", "I")),
            Instruction::Pop,
            Instruction::Load(ValueKind::Reference, 1),
            Instruction::GetField(FieldEntry::parse("a/Other", "g", "[I")),
            Instruction::ArrayLength,
            Instruction::Pop,
            Instruction::Load(ValueKind::Reference, 0),
            Instruction::Const(ValueKind::Long),
            Instruction::invoke_virtual("a/Owner", "n", "(J)V"),
            Instruction::Const(ValueKind::Int),
            Instruction::invoke_static("a/S", "s", "(I)V"),
            Instruction::Return(None),
        ]);
        let analysis = analyze(method);
        assert_eq!(analysis.error, None);
        assert_eq!(
            target_types(&analysis),
            vec![
                ReferenceTargetType::None,
                ReferenceTargetType::ClassType(ClassEntry::new("a/Other")),
                ReferenceTargetType::ClassType(ClassEntry::new("a/Owner")),
                ReferenceTargetType::None,
            ]
        );
        assert_eq!(analysis.references[2].offset, 8);
    }

    #[test]
    fn test_constructor_receivers() {
        let method = MethodDef::new("<init>", "()V", AccessFlags::PUBLIC).with_code(vec![
            Instruction::Load(ValueKind::Reference, 0),
            Instruction::invoke_special("java/lang/Object", "<init>", "()V"),
            Instruction::New(ClassEntry::new("a/Thing")),
            Instruction::Dup,
            Instruction::invoke_special("a/Thing", "<init>", "()V"),
            Instruction::invoke_virtual("a/Thing", "go", "()V"),
            Instruction::Load(ValueKind::Reference, 0),
            Instruction::invoke_virtual("a/Owner", "go", "()V"),
            Instruction::Return(None),
        ]);
        let analysis = analyze(method);
        assert_eq!(analysis.error, None);
        assert_eq!(
            target_types(&analysis),
            vec![
                ReferenceTargetType::Uninitialized,
                ReferenceTargetType::Uninitialized,
                ReferenceTargetType::ClassType(ClassEntry::new("a/Thing")),
                ReferenceTargetType::ClassType(ClassEntry::new("a/Owner")),
            ]
        );
    }

    #[test]
    fn test_array_receiver_is_object() {
        let method = MethodDef::new("m", "([Ljava/lang/String;)V", AccessFlags::STATIC).with_code(vec![
            Instruction::Load(ValueKind::Reference, 0),
            Instruction::invoke_virtual("java/lang/Object", "clone", "()Ljava/lang/Object;"),
            Instruction::Pop,
            Instruction::Return(None),
        ]);
        let analysis = analyze(method);
        assert_eq!(
            target_types(&analysis),
            vec![ReferenceTargetType::ClassType(ClassEntry::new(OBJECT))]
        );
    }

    #[test]
    fn test_primitive_receiver_is_reported() {
        let method = MethodDef::new("m", "(I)V", AccessFlags::STATIC).with_code(vec![
            Instruction::invoke_static("a/S", "before", "()V"),
            Instruction::Load(ValueKind::Int, 0),
            Instruction::invoke_virtual("a/Owner", "n", "()V"),
            Instruction::Return(None),
        ]);
        let analysis = analyze(method);
        let error = analysis.error.as_ref().unwrap();
        assert_eq!(error.offset(), 2);
        assert_eq!(error.kind(), &AnalyzerErrorKind::NonObjectReceiver);
        // the edge before the failure survives
        assert_eq!(analysis.references.len(), 1);
    }

    #[test]
    fn test_branches_merge() {
        let method = MethodDef::new("m", "(Z)V", AccessFlags::PUBLIC).with_code(vec![
            Instruction::Load(ValueKind::Int, 1),
            Instruction::If(Condition::Int, 4),
            Instruction::New(ClassEntry::new("a/X")),
            Instruction::Goto(5),
            Instruction::AconstNull,
            Instruction::Store(ValueKind::Reference, 2),
            Instruction::Return(None),
        ]);
        let analysis = analyze(method);
        // `new` without `<init>` merged with null leaves an unusable slot,
        // which is fine as long as nothing dispatches on it
        assert_eq!(analysis.error, None);
    }

    #[test]
    fn test_stack_height_mismatch() {
        let method = MethodDef::new("m", "(Z)V", AccessFlags::STATIC).with_code(vec![
            Instruction::Load(ValueKind::Int, 0),
            Instruction::If(Condition::Int, 3),
            Instruction::Const(ValueKind::Int),
            Instruction::Return(None),
        ]);
        let analysis = analyze(method);
        assert_eq!(
            analysis.error.map(|e| e.kind().clone()),
            Some(AnalyzerErrorKind::IncompatibleStackHeights)
        );
    }

    #[test]
    fn test_lambda_capturing_this() {
        let bootstrap = MethodHandle::method(
            HandleKind::InvokeStatic,
            crate::analysis::LAMBDA_METAFACTORY,
            "metafactory",
            "(Ljava/lang/invoke/MethodHandles$Lookup;Ljava/lang/String;Ljava/lang/invoke/MethodType;Ljava/lang/invoke/MethodType;Ljava/lang/invoke/MethodHandle;Ljava/lang/invoke/MethodType;)Ljava/lang/invoke/CallSite;",
        );
        let method = MethodDef::new("m", "()V", AccessFlags::PUBLIC).with_code(vec![
            Instruction::Load(ValueKind::Reference, 0),
            Instruction::InvokeDynamic {
                name: "run".into(),
                desc: MethodDescriptor::new("(La/Owner;)Ljava/lang/Runnable;"),
                bootstrap,
                args: vec![
                    Constant::MethodType(MethodDescriptor::new("()V")),
                    Constant::MethodHandle(MethodHandle::method(
                        HandleKind::InvokeSpecial,
                        "a/Owner",
                        "lambda$m$0",
                        "(La/Owner;)V",
                    )),
                    Constant::MethodType(MethodDescriptor::new("()V")),
                ],
            },
            Instruction::Pop,
            Instruction::Return(None),
        ]);
        let analysis = analyze(method);
        assert_eq!(analysis.lambdas.len(), 1);
        let edge = &analysis.lambdas[0];
        assert_eq!(
            edge.target_type,
            ReferenceTargetType::ClassType(ClassEntry::new("a/Owner"))
        );
        assert_eq!(
            edge.lambda.sam_method(),
            Some(MethodEntry::parse("java/lang/Runnable", "run", "()V"))
        );
    }

    #[test]
    fn test_wide_locals_and_dup2() {
        let method = MethodDef::new("m", "(JLa/Owner;)V", AccessFlags::STATIC).with_code(vec![
            Instruction::Load(ValueKind::Long, 0),
            Instruction::Dup2,
            Instruction::Pop2,
            Instruction::Pop2,
            Instruction::Load(ValueKind::Reference, 2),
            Instruction::invoke_virtual("a/Owner", "n", "()V"),
            Instruction::Return(None),
        ]);
        let analysis = analyze(method);
        assert_eq!(analysis.error, None);
        assert_eq!(
            target_types(&analysis),
            vec![ReferenceTargetType::ClassType(ClassEntry::new("a/Owner"))]
        );
    }
}
