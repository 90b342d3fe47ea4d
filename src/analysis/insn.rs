use crate::descriptor::{MethodDescriptor, TypeDescriptor};
use crate::entry::{ClassEntry, Entry, FieldEntry, MethodEntry};

/// The computational type of an operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// `int` and everything narrower.
    Int,
    /// `long`
    Long,
    /// `float`
    Float,
    /// `double`
    Double,
    /// Object and array references.
    Reference,
}

impl ValueKind {
    /// The kind of values with the given descriptor, `None` for `void`.
    pub fn of(desc: &TypeDescriptor) -> Option<ValueKind> {
        match desc.as_str() {
            "V" => None,
            "J" => Some(ValueKind::Long),
            "F" => Some(ValueKind::Float),
            "D" => Some(ValueKind::Double),
            "Z" | "B" | "C" | "S" | "I" => Some(ValueKind::Int),
            _ => Some(ValueKind::Reference),
        }
    }

    /// Whether values of this kind take two stack words.
    pub fn is_wide(self) -> bool {
        matches!(self, ValueKind::Long | ValueKind::Double)
    }
}

/// A loadable constant.
#[derive(Clone, Debug, PartialEq)]
pub enum Constant {
    /// An `int` constant.
    Int(i32),
    /// A `long` constant.
    Long(i64),
    /// A `float` constant.
    Float(f32),
    /// A `double` constant.
    Double(f64),
    /// A string literal.
    String(String),
    /// A class literal.
    Class(TypeDescriptor),
    /// A method type.
    MethodType(MethodDescriptor),
    /// A method handle.
    MethodHandle(MethodHandle),
}

/// The reference kind of a [`MethodHandle`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandleKind {
    /// `REF_getField`
    GetField,
    /// `REF_getStatic`
    GetStatic,
    /// `REF_putField`
    PutField,
    /// `REF_putStatic`
    PutStatic,
    /// `REF_invokeVirtual`
    InvokeVirtual,
    /// `REF_invokeStatic`
    InvokeStatic,
    /// `REF_invokeSpecial`
    InvokeSpecial,
    /// `REF_newInvokeSpecial`
    NewInvokeSpecial,
    /// `REF_invokeInterface`
    InvokeInterface,
}

impl HandleKind {
    /// Whether the handle points at a field rather than a method.
    pub fn is_field(self) -> bool {
        matches!(
            self,
            HandleKind::GetField | HandleKind::GetStatic | HandleKind::PutField | HandleKind::PutStatic
        )
    }
}

/// A constant method handle.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MethodHandle {
    /// How the target is accessed.
    pub kind: HandleKind,
    /// The target field or method.
    pub target: Entry,
}

impl MethodHandle {
    /// A handle to a method.
    pub fn method(kind: HandleKind, owner: &str, name: &str, desc: &str) -> Self {
        Self {
            kind,
            target: Entry::Method(MethodEntry::parse(owner, name, desc)),
        }
    }

    /// A handle to a field.
    pub fn field(kind: HandleKind, owner: &str, name: &str, desc: &str) -> Self {
        Self {
            kind,
            target: Entry::Field(FieldEntry::parse(owner, name, desc)),
        }
    }

    /// The argument types the target consumes, not counting an implicit
    /// receiver.
    pub fn argument_count(&self) -> usize {
        match &self.target {
            Entry::Method(method) => method.desc().argument_descs().len(),
            // setters take the value
            Entry::Field(_) if matches!(self.kind, HandleKind::PutField | HandleKind::PutStatic) => 1,
            _ => 0,
        }
    }
}

/// The dispatch kind of a method invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InvokeKind {
    /// `invokevirtual`
    Virtual,
    /// `invokespecial`
    Special,
    /// `invokestatic`
    Static,
    /// `invokeinterface`
    Interface,
}

/// The operands tested by a conditional branch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Condition {
    /// `ifeq` and friends: one `int`.
    Int,
    /// `if_icmpeq` and friends: two `int`s.
    IntCompare,
    /// `ifnull` and `ifnonnull`: one reference.
    Null,
    /// `if_acmpeq` and `if_acmpne`: two references.
    ReferenceCompare,
}

/// A decoded bytecode instruction.
///
/// Branch targets are indices into the method's instruction list, not byte
/// offsets. Operations that only differ in their constant operand or in the
/// exact arithmetic performed are folded together: the reference analysis
/// only cares about stack shapes and member references.
#[derive(Clone, Debug, PartialEq)]
#[allow(missing_docs)]
pub enum Instruction {
    Nop,
    AconstNull,
    /// `iconst_*`, `bipush`, `lconst_*`, `fconst_*`, ... of the given kind.
    Const(ValueKind),
    Ldc(Constant),
    Load(ValueKind, u16),
    Store(ValueKind, u16),
    /// `iaload`, `laload`, ..., `aaload`.
    ArrayLoad(ValueKind),
    /// `iastore`, `lastore`, ..., `aastore`.
    ArrayStore(ValueKind),
    Pop,
    Pop2,
    Dup,
    DupX1,
    DupX2,
    Dup2,
    Dup2X1,
    Dup2X2,
    Swap,
    /// Two operands of the kind in, one out.
    Binary(ValueKind),
    /// A value of the kind and an `int` shift distance in, the value out.
    Shift(ValueKind),
    Negate(ValueKind),
    /// `lcmp`, `fcmpl`, `dcmpg`, ...: two operands in, an `int` out.
    Compare(ValueKind),
    Convert(ValueKind, ValueKind),
    Iinc(u16, i16),
    If(Condition, usize),
    Goto(usize),
    /// `tableswitch` and `lookupswitch`.
    Switch {
        default: usize,
        targets: Vec<usize>,
    },
    Return(Option<ValueKind>),
    Athrow,
    GetStatic(FieldEntry),
    PutStatic(FieldEntry),
    GetField(FieldEntry),
    PutField(FieldEntry),
    Invoke(InvokeKind, MethodEntry),
    InvokeDynamic {
        name: String,
        desc: MethodDescriptor,
        bootstrap: MethodHandle,
        args: Vec<Constant>,
    },
    New(ClassEntry),
    /// `newarray` and `anewarray`, with the element type.
    NewArray(TypeDescriptor),
    /// The full array type and the number of dimensions popped.
    MultiNewArray(TypeDescriptor, u8),
    ArrayLength,
    CheckCast(TypeDescriptor),
    InstanceOf(TypeDescriptor),
    MonitorEnter,
    MonitorExit,
}

impl Instruction {
    /// Shorthand for an `invokevirtual`.
    pub fn invoke_virtual(owner: &str, name: &str, desc: &str) -> Self {
        Instruction::Invoke(InvokeKind::Virtual, MethodEntry::parse(owner, name, desc))
    }

    /// Shorthand for an `invokespecial`.
    pub fn invoke_special(owner: &str, name: &str, desc: &str) -> Self {
        Instruction::Invoke(InvokeKind::Special, MethodEntry::parse(owner, name, desc))
    }

    /// Shorthand for an `invokestatic`.
    pub fn invoke_static(owner: &str, name: &str, desc: &str) -> Self {
        Instruction::Invoke(InvokeKind::Static, MethodEntry::parse(owner, name, desc))
    }

    /// Shorthand for an `invokeinterface`.
    pub fn invoke_interface(owner: &str, name: &str, desc: &str) -> Self {
        Instruction::Invoke(InvokeKind::Interface, MethodEntry::parse(owner, name, desc))
    }

    /// Indices control may transfer to besides falling through.
    pub fn jump_targets(&self) -> Vec<usize> {
        match self {
            Instruction::If(_, target) | Instruction::Goto(target) => vec![*target],
            Instruction::Switch { default, targets } => {
                let mut all = targets.clone();
                all.push(*default);
                all
            }
            _ => Vec::new(),
        }
    }

    /// Whether execution can continue with the next instruction.
    pub fn falls_through(&self) -> bool {
        !matches!(
            self,
            Instruction::Goto(_)
                | Instruction::Switch { .. }
                | Instruction::Return(_)
                | Instruction::Athrow
        )
    }

    /// The member this instruction references, if any.
    pub fn member_reference(&self) -> Option<Entry> {
        match self {
            Instruction::GetStatic(field)
            | Instruction::PutStatic(field)
            | Instruction::GetField(field)
            | Instruction::PutField(field) => Some(Entry::Field(field.clone())),
            Instruction::Invoke(_, method) => Some(Entry::Method(method.clone())),
            _ => None,
        }
    }

    /// The mnemonic used in listings.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Instruction::Nop => "nop",
            Instruction::AconstNull => "aconst_null",
            Instruction::Const(_) => "const",
            Instruction::Ldc(_) => "ldc",
            Instruction::Load(..) => "load",
            Instruction::Store(..) => "store",
            Instruction::ArrayLoad(_) => "aload",
            Instruction::ArrayStore(_) => "astore",
            Instruction::Pop => "pop",
            Instruction::Pop2 => "pop2",
            Instruction::Dup => "dup",
            Instruction::DupX1 => "dup_x1",
            Instruction::DupX2 => "dup_x2",
            Instruction::Dup2 => "dup2",
            Instruction::Dup2X1 => "dup2_x1",
            Instruction::Dup2X2 => "dup2_x2",
            Instruction::Swap => "swap",
            Instruction::Binary(_) => "binop",
            Instruction::Shift(_) => "shift",
            Instruction::Negate(_) => "neg",
            Instruction::Compare(_) => "cmp",
            Instruction::Convert(..) => "convert",
            Instruction::Iinc(..) => "iinc",
            Instruction::If(..) => "if",
            Instruction::Goto(_) => "goto",
            Instruction::Switch { .. } => "switch",
            Instruction::Return(_) => "return",
            Instruction::Athrow => "athrow",
            Instruction::GetStatic(_) => "getstatic",
            Instruction::PutStatic(_) => "putstatic",
            Instruction::GetField(_) => "getfield",
            Instruction::PutField(_) => "putfield",
            Instruction::Invoke(InvokeKind::Virtual, _) => "invokevirtual",
            Instruction::Invoke(InvokeKind::Special, _) => "invokespecial",
            Instruction::Invoke(InvokeKind::Static, _) => "invokestatic",
            Instruction::Invoke(InvokeKind::Interface, _) => "invokeinterface",
            Instruction::InvokeDynamic { .. } => "invokedynamic",
            Instruction::New(_) => "new",
            Instruction::NewArray(_) => "newarray",
            Instruction::MultiNewArray(..) => "multianewarray",
            Instruction::ArrayLength => "arraylength",
            Instruction::CheckCast(_) => "checkcast",
            Instruction::InstanceOf(_) => "instanceof",
            Instruction::MonitorEnter => "monitorenter",
            Instruction::MonitorExit => "monitorexit",
        }
    }
}
