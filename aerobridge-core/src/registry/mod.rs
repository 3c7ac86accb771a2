//! The variable registry: the single source of truth for every variable the
//! bridge knows about.
//!
//! Each variable has three equivalent keys: its dotted name, the simulator's
//! 64-bit name hash, and a dense logical index assigned by position in the
//! declarative [`table::TABLE`]. Everything else in the bridge is derived
//! from that table: decoder dispatch, the JSON field list, the shared-memory
//! layout export, and command validation.

pub mod table;

pub use table::TABLE;

use crate::codec::{message_hash, DataType};
use crate::snapshot::{self, StrField, Vec2Field, Vec3Field};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Hard cap on the registry size; the snapshot scalar array is sized by it.
pub const MAX_VARIABLES: usize = 400;

/// Number of registered variables (the snapshot scalar array length).
pub const VAR_COUNT: usize = TABLE.len();

const _: () = assert!(VAR_COUNT <= MAX_VARIABLES, "registry exceeds MAX_VARIABLES");
const _: () = assert!(names_unique(), "duplicate variable name in registry table");

/// How the simulator interprets writes to a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryFlag {
    Value,
    Event,
    Toggle,
    Active,
    Step,
    Move,
    Offset,
    State,
    None,
}

impl PrimaryFlag {
    /// Wire flag bits carried on outgoing command messages.
    pub fn wire_flags(self) -> u32 {
        match self {
            PrimaryFlag::Event => 0x01,
            PrimaryFlag::Toggle => 0x02,
            PrimaryFlag::Step => 0x04,
            PrimaryFlag::Active => 0x08,
            PrimaryFlag::Move => 0x10,
            PrimaryFlag::Offset => 0x20,
            PrimaryFlag::State => 0x40,
            PrimaryFlag::Value | PrimaryFlag::None => 0,
        }
    }
}

/// Command/telemetry direction of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    Read,
    Write,
    ReadWrite,
    None,
}

impl Access {
    /// True when the variable accepts commands.
    #[inline]
    pub fn is_writable(self) -> bool {
        matches!(self, Access::Write | Access::ReadWrite)
    }
}

/// Advisory unit of a variable's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    None,
    Second,
    Meter,
    MeterPerSecond,
    MeterPerSecond2,
    Radian,
    RadianPerSecond,
    Hertz,
    Degree,
}

/// Where a variable's latest value lives in the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    /// `values[logical_index]` in the scalar array.
    Scalar,
    Vector2(Vec2Field),
    Vector3(Vec3Field),
    Str(StrField),
    /// No snapshot slot; the variable only exists as messages (e.g. pure
    /// command events like frequency swaps).
    MessageOnly,
}

/// One row of the authoritative table.
#[derive(Debug, Clone, Copy)]
pub struct VariableDef {
    pub name: &'static str,
    pub data_type: DataType,
    pub flag: PrimaryFlag,
    pub access: Access,
    pub unit: Unit,
    pub storage: Storage,
}

/// Storage class as exported in the sidecar descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageClass {
    ScalarArray,
    StructField,
    MessageOnly,
}

/// Fully resolved view of one variable, offsets included.
#[derive(Debug, Clone)]
pub struct Descriptor {
    pub name: &'static str,
    pub hash: u64,
    pub logical_index: usize,
    pub data_type: DataType,
    pub flag: PrimaryFlag,
    pub access: Access,
    pub unit: Unit,
    pub storage: StorageClass,
    pub byte_offset: usize,
    pub byte_length: usize,
}

impl Descriptor {
    /// Group prefix of the dotted name (`Aircraft.Altitude` -> `Aircraft`).
    pub fn group(&self) -> &'static str {
        self.name.split('.').next().unwrap_or(self.name)
    }
}

/// Registry with O(1) lookup by name and by hash.
pub struct Registry {
    by_name: HashMap<&'static str, usize>,
    by_hash: HashMap<u64, usize>,
    hashes: Vec<u64>,
}

static REGISTRY: OnceLock<Registry> = OnceLock::new();

/// The process-wide registry instance.
pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::build)
}

impl Registry {
    fn build() -> Self {
        let mut by_name = HashMap::with_capacity(VAR_COUNT);
        let mut by_hash = HashMap::with_capacity(VAR_COUNT);
        let mut hashes = Vec::with_capacity(VAR_COUNT);

        for (index, def) in TABLE.iter().enumerate() {
            let hash = message_hash(def.name);
            hashes.push(hash);
            let prev = by_name.insert(def.name, index);
            assert!(prev.is_none(), "duplicate variable name: {}", def.name);
            let prev = by_hash.insert(hash, index);
            assert!(
                prev.is_none(),
                "message hash collision on {} (index {index})",
                def.name
            );
        }

        Self {
            by_name,
            by_hash,
            hashes,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        VAR_COUNT
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        VAR_COUNT == 0
    }

    #[inline]
    pub fn index_of_name(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    #[inline]
    pub fn index_of_hash(&self, hash: u64) -> Option<usize> {
        self.by_hash.get(&hash).copied()
    }

    #[inline]
    pub fn def(&self, index: usize) -> &'static VariableDef {
        &TABLE[index]
    }

    #[inline]
    pub fn hash_of(&self, index: usize) -> u64 {
        self.hashes[index]
    }

    /// Resolve one variable including its shared-memory span.
    pub fn descriptor(&self, index: usize) -> Descriptor {
        let def = self.def(index);
        let (storage, byte_offset, byte_length) = match def.storage {
            Storage::Scalar => (
                StorageClass::ScalarArray,
                snapshot::scalar_array_offset() + snapshot::SCALAR_STRIDE * index,
                snapshot::SCALAR_STRIDE,
            ),
            Storage::Vector2(f) => (StorageClass::StructField, f.byte_offset(), f.byte_len()),
            Storage::Vector3(f) => (StorageClass::StructField, f.byte_offset(), f.byte_len()),
            Storage::Str(f) => (StorageClass::StructField, f.byte_offset(), f.byte_len()),
            Storage::MessageOnly => (StorageClass::MessageOnly, 0, 0),
        };
        Descriptor {
            name: def.name,
            hash: self.hashes[index],
            logical_index: index,
            data_type: def.data_type,
            flag: def.flag,
            access: def.access,
            unit: def.unit,
            storage,
            byte_offset,
            byte_length,
        }
    }

    /// All descriptors in logical-index order (the sidecar export).
    pub fn export(&self) -> Vec<Descriptor> {
        (0..VAR_COUNT).map(|i| self.descriptor(i)).collect()
    }
}

const fn str_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    let mut i = 0;
    while i < a.len() {
        if a[i] != b[i] {
            return false;
        }
        i += 1;
    }
    true
}

const fn names_unique() -> bool {
    let mut i = 0;
    while i < TABLE.len() {
        let mut j = i + 1;
        while j < TABLE.len() {
            if str_eq(TABLE[i].name, TABLE[j].name) {
                return false;
            }
            j += 1;
        }
        i += 1;
    }
    true
}
