//! Reference extraction from method bodies.
//!
//! Every method body is abstractly interpreted once. The interpreter tracks a
//! small typed model of the operand stack and the local variables, which is
//! enough to tell, for every field access and invocation, what kind of
//! receiver it operates on. The result is an immutable list of edges per
//! method ([`MethodAnalysis`]) that the reference index is built from.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::descriptor::MethodDescriptor;
use crate::entry::{ClassEntry, Entry, MethodEntry};

mod insn;
mod interpreter;

pub use insn::{
    Condition, Constant, HandleKind, InvokeKind, Instruction, MethodHandle, ValueKind,
};
pub use interpreter::{Analyzer, Frame, TypeHierarchy, Value};

const LAMBDA_METAFACTORY: &str = "java/lang/invoke/LambdaMetafactory";

/// Error when the analyzer cannot make sense of a method body.
///
/// Analysis of the affected method stops at the offending instruction. Edges
/// found up to that point are kept, other methods are not affected.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("failed to analyze {method} at instruction {offset}: {kind}")]
pub struct AnalyzerError {
    method: MethodEntry,
    offset: usize,
    kind: AnalyzerErrorKind,
}

impl AnalyzerError {
    pub(crate) fn new(method: MethodEntry, offset: usize, kind: AnalyzerErrorKind) -> Self {
        Self {
            method,
            offset,
            kind,
        }
    }

    /// The method that failed to analyze.
    pub fn method(&self) -> &MethodEntry {
        &self.method
    }

    /// Index of the offending instruction.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// What went wrong.
    pub fn kind(&self) -> &AnalyzerErrorKind {
        &self.kind
    }
}

/// The specific analyzer error.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AnalyzerErrorKind {
    /// A field access or invocation on a primitive value.
    #[error("called method on or accessed field of non-object type")]
    NonObjectReceiver,
    /// An instruction popped more values than the stack holds.
    #[error("operand stack underflow")]
    StackUnderflow,
    /// Two paths reach an instruction with different stack heights.
    #[error("incompatible stack heights at merge point")]
    IncompatibleStackHeights,
    /// A branch to a nonexistent instruction.
    #[error("jump target {0} out of range")]
    JumpOutOfRange(usize),
    /// A local variable slot past the end of the frame.
    #[error("local variable {0} out of range")]
    LocalOutOfRange(u16),
    /// The last instruction falls through.
    #[error("execution falls off the end of the code")]
    FallsOffEnd,
}

/// What a referencing instruction dispatches on.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReferenceTargetType {
    /// Static access, there is no receiver.
    None,
    /// The receiver is not constructed yet, e.g. the `super()` call of a
    /// constructor.
    Uninitialized,
    /// Instance access on a receiver of the given static type.
    ClassType(ClassEntry),
}

impl fmt::Display for ReferenceTargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceTargetType::None => f.write_str("(none)"),
            ReferenceTargetType::Uninitialized => f.write_str("(uninitialized)"),
            ReferenceTargetType::ClassType(class) => class.fmt(f),
        }
    }
}

/// A lambda created through `LambdaMetafactory`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Lambda {
    /// The name of the functional interface method being implemented.
    pub invoked_name: String,
    /// The call site descriptor: captured values in, interface out.
    pub invoked_type: MethodDescriptor,
    /// The erased descriptor of the interface method.
    pub sam_method_type: MethodDescriptor,
    /// The method (or field) implementing the lambda.
    pub implementation: MethodHandle,
    /// The descriptor of the interface method after generic specialization.
    pub instantiated_method_type: MethodDescriptor,
}

impl Lambda {
    /// Recognizes a `LambdaMetafactory` call site.
    ///
    /// Returns `None` for other bootstrap methods and for malformed
    /// bootstrap arguments.
    pub fn from_invoke_dynamic(
        name: &str,
        desc: &MethodDescriptor,
        bootstrap: &MethodHandle,
        args: &[Constant],
    ) -> Option<Lambda> {
        let Entry::Method(bsm) = &bootstrap.target else {
            return None;
        };
        if bsm.parent().full_name() != LAMBDA_METAFACTORY
            || !(bsm.name() == "metafactory" || bsm.name() == "altMetafactory")
        {
            return None;
        }
        match args {
            [Constant::MethodType(sam), Constant::MethodHandle(implementation), Constant::MethodType(instantiated), ..] => {
                Some(Lambda {
                    invoked_name: name.to_owned(),
                    invoked_type: desc.clone(),
                    sam_method_type: sam.clone(),
                    implementation: implementation.clone(),
                    instantiated_method_type: instantiated.clone(),
                })
            }
            _ => None,
        }
    }

    /// The functional interface the lambda implements.
    pub fn interface(&self) -> Option<ClassEntry> {
        self.invoked_type.return_desc().type_entry()
    }

    /// The interface method the lambda implements.
    pub fn sam_method(&self) -> Option<MethodEntry> {
        self.interface().map(|interface| {
            MethodEntry::new(interface, self.invoked_name.clone(), self.sam_method_type.clone())
        })
    }

    /// Returns a copy with a different invoked name.
    pub fn with_invoked_name(&self, name: &str) -> Self {
        Self {
            invoked_name: name.to_owned(),
            ..self.clone()
        }
    }
}

/// A single field access or invocation found in a method body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferenceEdge {
    /// Index of the referencing instruction.
    pub offset: usize,
    /// The referenced field or method, as written in the instruction.
    pub target: Entry,
    /// What the instruction dispatches on.
    pub target_type: ReferenceTargetType,
}

/// A lambda creation site found in a method body.
#[derive(Clone, Debug, PartialEq)]
pub struct LambdaEdge {
    /// Index of the `invokedynamic` instruction.
    pub offset: usize,
    /// The lambda.
    pub lambda: Lambda,
    /// What the lambda body dispatches on.
    pub target_type: ReferenceTargetType,
}

/// The edges extracted from one method body.
#[derive(Clone, Debug, PartialEq)]
pub struct MethodAnalysis {
    /// The analyzed method.
    pub method: MethodEntry,
    /// Field and method references, in instruction order.
    pub references: Vec<ReferenceEdge>,
    /// Lambda creation sites, in instruction order.
    pub lambdas: Vec<LambdaEdge>,
    /// Set if analysis stopped early. The edges above are then incomplete.
    pub error: Option<AnalyzerError>,
}

impl MethodAnalysis {
    fn new(method: MethodEntry) -> Self {
        Self {
            method,
            references: Vec::new(),
            lambdas: Vec::new(),
            error: None,
        }
    }
}
