//! JVM access flags.

use std::fmt;

use serde::{Deserialize, Serialize};

bitflags::bitflags! {
    /// Access and property flags of a class, field or method.
    ///
    /// The bit values are the `ACC_*` constants of the class file format, so
    /// an ingested `access_flags` word can be wrapped directly with
    /// [`AccessFlags::from_bits_retain`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct AccessFlags: u32 {
        /// `ACC_PUBLIC`
        const PUBLIC = 0x0001;
        /// `ACC_PRIVATE`
        const PRIVATE = 0x0002;
        /// `ACC_PROTECTED`
        const PROTECTED = 0x0004;
        /// `ACC_STATIC`
        const STATIC = 0x0008;
        /// `ACC_FINAL`
        const FINAL = 0x0010;
        /// `ACC_SYNCHRONIZED` on methods.
        const SYNCHRONIZED = 0x0020;
        /// `ACC_BRIDGE` on methods.
        const BRIDGE = 0x0040;
        /// `ACC_VARARGS` on methods.
        const VARARGS = 0x0080;
        /// `ACC_NATIVE`
        const NATIVE = 0x0100;
        /// `ACC_INTERFACE`
        const INTERFACE = 0x0200;
        /// `ACC_ABSTRACT`
        const ABSTRACT = 0x0400;
        /// `ACC_STRICT`
        const STRICT = 0x0800;
        /// `ACC_SYNTHETIC`
        const SYNTHETIC = 0x1000;
        /// `ACC_ANNOTATION`
        const ANNOTATION = 0x2000;
        /// `ACC_ENUM`
        const ENUM = 0x4000;
    }
}

impl AccessFlags {
    /// Whether the `private` modifier is set.
    pub fn is_private(self) -> bool {
        self.contains(Self::PRIVATE)
    }

    /// Whether the `protected` modifier is set.
    pub fn is_protected(self) -> bool {
        self.contains(Self::PROTECTED)
    }

    /// Whether the `public` modifier is set.
    pub fn is_public(self) -> bool {
        self.contains(Self::PUBLIC)
    }

    /// Whether the `static` modifier is set.
    pub fn is_static(self) -> bool {
        self.contains(Self::STATIC)
    }

    /// Whether the `final` modifier is set.
    pub fn is_final(self) -> bool {
        self.contains(Self::FINAL)
    }

    /// Whether the compiler marked this member as synthetic.
    pub fn is_synthetic(self) -> bool {
        self.contains(Self::SYNTHETIC)
    }

    /// Whether the compiler marked this method as a bridge.
    pub fn is_bridge(self) -> bool {
        self.contains(Self::BRIDGE)
    }

    /// Whether this is an enum class or an enum constant.
    pub fn is_enum(self) -> bool {
        self.contains(Self::ENUM)
    }

    /// Whether this class is an interface.
    pub fn is_interface(self) -> bool {
        self.contains(Self::INTERFACE)
    }

    /// Neither public, protected nor private.
    pub fn is_package_private(self) -> bool {
        !self.intersects(Self::PUBLIC | Self::PROTECTED | Self::PRIVATE)
    }
}

impl fmt::Display for AccessFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut words = Vec::new();
        if self.is_public() {
            words.push("public");
        } else if self.is_protected() {
            words.push("protected");
        } else if self.is_private() {
            words.push("private");
        }
        if self.contains(Self::ABSTRACT) && !self.is_interface() {
            words.push("abstract");
        }
        if self.is_static() {
            words.push("static");
        }
        if self.is_final() {
            words.push("final");
        }
        if self.contains(Self::SYNCHRONIZED) {
            words.push("synchronized");
        }
        if self.contains(Self::NATIVE) {
            words.push("native");
        }
        if self.is_synthetic() {
            words.push("/* synthetic */");
        }
        if self.is_bridge() {
            words.push("/* bridge */");
        }
        write!(f, "{}", words.join(" "))
    }
}
