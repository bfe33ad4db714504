//! Small value types shared by headers and records.

use std::fmt;
use std::marker::PhantomData;

use binrw::BinRead;

/// Per-file unique 32-bit record identifier.
///
/// The top byte is the load-order index of the master that introduced the
/// record; the low 24 bits are the object index within that master.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, BinRead)]
#[br(little)]
pub struct FormId(pub u32);

impl FormId {
    /// The null form id
    pub const NONE: Self = Self(0);

    /// Whether this id is the null id
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Load-order index of the owning master
    #[must_use]
    pub const fn master_index(self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Object index within the owning master
    #[must_use]
    pub const fn object_index(self) -> u32 {
        self.0 & 0x00FF_FFFF
    }
}

impl fmt::Display for FormId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}", self.0)
    }
}

impl fmt::Debug for FormId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FormId({:08X})", self.0)
    }
}

/// Lookup key of a referenced record.
///
/// Morrowind references records by editor id; every later game by form id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FormKey {
    /// Numeric form id
    Id(FormId),
    /// Editor id string (Morrowind only)
    EditorId(String),
}

/// Typed weak reference to another record.
///
/// `T` names the expected record shape. The reference is only a key: it owns
/// nothing and is resolved through [`Database::resolve`](crate::Database::resolve).
pub struct FormRef<T> {
    key: FormKey,
    _target: PhantomData<fn() -> T>,
}

impl<T> FormRef<T> {
    /// Reference by form id
    #[must_use]
    pub fn id(id: FormId) -> Self {
        Self {
            key: FormKey::Id(id),
            _target: PhantomData,
        }
    }

    /// Reference by editor id
    #[must_use]
    pub fn editor_id(id: impl Into<String>) -> Self {
        Self {
            key: FormKey::EditorId(id.into()),
            _target: PhantomData,
        }
    }

    /// The lookup key
    pub fn key(&self) -> &FormKey {
        &self.key
    }

    /// Form id, if this is a numeric reference
    pub fn form_id(&self) -> Option<FormId> {
        match self.key {
            FormKey::Id(id) => Some(id),
            FormKey::EditorId(_) => None,
        }
    }

    /// Whether the reference points nowhere
    pub fn is_null(&self) -> bool {
        match &self.key {
            FormKey::Id(id) => id.is_none(),
            FormKey::EditorId(name) => name.is_empty(),
        }
    }
}

impl<T> Clone for FormRef<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            _target: PhantomData,
        }
    }
}

impl<T> PartialEq for FormRef<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<T> Eq for FormRef<T> {}

impl<T> fmt::Debug for FormRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            FormKey::Id(id) => write!(f, "FormRef({id})"),
            FormKey::EditorId(name) => write!(f, "FormRef({name:?})"),
        }
    }
}

/// RGBA color as stored on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, BinRead)]
#[br(little)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Position and rotation of a placed object (24 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Default, BinRead)]
#[br(little)]
pub struct Placement {
    /// World position
    pub position: [f32; 3],
    /// Rotation in radians
    pub rotation: [f32; 3],
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Weapon;

    #[test]
    fn form_id_parts() {
        let id = FormId(0x0100_0ABC);
        assert_eq!(id.master_index(), 1);
        assert_eq!(id.object_index(), 0xABC);
        assert_eq!(id.to_string(), "01000ABC");
    }

    #[test]
    fn form_ref_keys() {
        let by_id: FormRef<Weapon> = FormRef::id(FormId(0x14));
        assert_eq!(by_id.form_id(), Some(FormId(0x14)));
        assert!(!by_id.is_null());

        let by_name: FormRef<Weapon> = FormRef::editor_id("iron dagger");
        assert_eq!(by_name.form_id(), None);
        assert_eq!(by_name.key(), &FormKey::EditorId("iron dagger".into()));

        assert!(FormRef::<Weapon>::id(FormId::NONE).is_null());
    }
}
