//! Unified type taxonomy shared by every backend.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unified object type tag.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjType {
    Unknown,
    Memory,
    Module,
    Net,
    Parameter,
    Register,
    NetArray,
    Enum,
    Structure,
    Real,
    Integer,
    String,
    /// Pseudo-region standing in for every instance of one generate-loop label.
    GenArray,
    Package,
    Logic,
    LogicArray,
    Array,
}

impl ObjType {
    /// Types that carry a value and accept get/set operations.
    #[must_use]
    pub const fn is_signal(self) -> bool {
        matches!(
            self,
            Self::Net
                | Self::Register
                | Self::Enum
                | Self::Real
                | Self::Integer
                | Self::String
                | Self::Logic
                | Self::LogicArray
                | Self::Parameter
        )
    }

    /// Types whose children are addressed by index.
    #[must_use]
    pub const fn is_indexable(self) -> bool {
        matches!(
            self,
            Self::Memory | Self::NetArray | Self::GenArray | Self::LogicArray | Self::Array
        )
    }

    /// Types that form a level of the design hierarchy.
    #[must_use]
    pub const fn is_scope(self) -> bool {
        matches!(self, Self::Module | Self::GenArray | Self::Package | Self::Structure)
    }
}

impl fmt::Display for ObjType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unknown => "UNKNOWN",
            Self::Memory => "MEMORY",
            Self::Module => "MODULE",
            Self::Net => "NET",
            Self::Parameter => "PARAMETER",
            Self::Register => "REGISTER",
            Self::NetArray => "NET_ARRAY",
            Self::Enum => "ENUM",
            Self::Structure => "STRUCTURE",
            Self::Real => "REAL",
            Self::Integer => "INTEGER",
            Self::String => "STRING",
            Self::GenArray => "GENARRAY",
            Self::Package => "PACKAGE",
            Self::Logic => "LOGIC",
            Self::LogicArray => "LOGIC_ARRAY",
            Self::Array => "ARRAY",
        };
        f.write_str(s)
    }
}

/// Direction of an index range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeDirection {
    /// The vendor did not report one.
    Undetermined,
    /// `left to right`, ascending.
    Up,
    /// `left downto right`, descending.
    Down,
}

/// Bounds of an indexable object, as declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexRange {
    /// Left bound.
    pub left: i32,
    /// Right bound.
    pub right: i32,
    /// Declared direction.
    pub direction: RangeDirection,
}

impl IndexRange {
    /// Build a range, inferring direction from the bounds.
    #[must_use]
    pub const fn new(left: i32, right: i32) -> Self {
        let direction = if left > right {
            RangeDirection::Down
        } else {
            RangeDirection::Up
        };
        Self {
            left,
            right,
            direction,
        }
    }

    /// Build a range with an explicit direction.
    #[must_use]
    pub const fn with_direction(left: i32, right: i32, direction: RangeDirection) -> Self {
        Self {
            left,
            right,
            direction,
        }
    }

    /// Number of elements covered. Null ranges have length zero.
    #[must_use]
    pub const fn len(&self) -> usize {
        let span = match self.direction {
            RangeDirection::Down => self.left as i64 - self.right as i64,
            RangeDirection::Up | RangeDirection::Undetermined => self.right as i64 - self.left as i64,
        };
        if span < 0 {
            0
        } else {
            (span + 1) as usize
        }
    }

    /// True for a null range.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Zero-based position of `index` within the range.
    #[must_use]
    pub const fn offset_of(&self, index: i32) -> Option<usize> {
        let offset = match self.direction {
            RangeDirection::Down => self.left as i64 - index as i64,
            RangeDirection::Up | RangeDirection::Undetermined => index as i64 - self.left as i64,
        };
        if offset < 0 || offset as usize >= self.len() {
            None
        } else {
            Some(offset as usize)
        }
    }
}

/// Relationship selector for iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IterSelector {
    /// Hierarchical children.
    Objects,
    /// Drivers of a signal.
    Drivers,
    /// Loads of a signal.
    Loads,
}

/// How `get_handle_by_name` may cross backend boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LookupMode {
    /// Only the base object's own backend.
    Native,
    /// Own backend first, then every other backend in registration order.
    #[default]
    Auto,
}

/// How a written value is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetAction {
    /// Scheduled like a normal assignment.
    Deposit,
    /// Held until released.
    Force,
    /// Drop a previous force.
    Release,
    /// Applied immediately, propagating within the current delta.
    NoDelay,
}

/// Value-change filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    /// Only when the new value is `1`.
    Rising,
    /// Only when the new value is `0`.
    Falling,
    /// Any change.
    ValueChange,
}

impl Edge {
    /// Whether a sampled binary-string value passes this filter.
    #[must_use]
    pub fn accepts(self, binstr: &str) -> bool {
        match self {
            Self::Rising => binstr == "1",
            Self::Falling => binstr == "0",
            Self::ValueChange => true,
        }
    }
}

/// Requested value representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueFormat {
    /// Binary string of `0 1 X Z ...` characters.
    BinStr,
    /// Character string.
    Str,
    /// Floating point.
    Real,
    /// Signed integer.
    Long,
}

/// A signal value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format", content = "value", rename_all = "snake_case")]
pub enum SignalValue {
    /// Binary string.
    BinStr(String),
    /// Character string.
    Str(String),
    /// Floating point.
    Real(f64),
    /// Signed integer.
    Long(i64),
}

impl SignalValue {
    /// The format this value is encoded in.
    #[must_use]
    pub const fn format(&self) -> ValueFormat {
        match self {
            Self::BinStr(_) => ValueFormat::BinStr,
            Self::Str(_) => ValueFormat::Str,
            Self::Real(_) => ValueFormat::Real,
            Self::Long(_) => ValueFormat::Long,
        }
    }
}
