//! Typed record bodies.
//!
//! Each modelled record type is a plain struct implementing [`FieldSink`].
//! [`RecordData`] is the closed set of those shapes; the registry decides
//! which shape a record tag decodes into.

use crate::error::Result;
use crate::field::{FieldOutcome, FieldReader, FieldSink, LString};

/// Identity accessors every record body offers.
pub trait RecordBody {
    /// Editor id, if the record carries one
    fn editor_id(&self) -> Option<&str>;

    /// Display name, if the record carries one
    fn name(&self) -> Option<&LString> {
        None
    }
}

/// Record shapes that can be borrowed out of a [`RecordData`].
pub trait RecordShape: Sized {
    /// Borrow the body if `data` holds this shape
    fn extract(data: &RecordData) -> Option<&Self>;
}

/// Targets of typed form references.
pub trait RecordKind {
    /// Whether a decoded body is acceptable for this target
    fn matches(data: &RecordData) -> bool;
}

/// Implements [`RecordBody`] for records built around an `ObjectCore`.
macro_rules! object_body {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::records::RecordBody for $ty {
                fn editor_id(&self) -> Option<&str> {
                    self.core.editor_id.as_deref()
                }

                fn name(&self) -> Option<&$crate::field::LString> {
                    self.core.name.as_ref()
                }
            }
        )+
    };
}

pub mod actors;
pub mod character;
pub mod common;
pub mod dialogue;
pub mod items;
pub mod magic;
pub mod objects;
pub mod plugin;
pub mod settings;
pub mod world;

pub use actors::Actor;
pub use character::{Birthsign, Class, Faction, Race, Skill};
pub use common::{Effect, EffectId, ItemEntry, ObjectCore, ObjectRecord};
pub use dialogue::{Dialogue, DialogueInfo, Quest};
pub use items::{Ammo, Armor, Book, Clothing, Light, SimpleItem, Weapon};
pub use magic::{Enchantment, Ingredient, MagicEffect, Potion, Script, Spell};
pub use objects::{Container, Door, FormList, LandTexture, LeveledList, Sound, TextureSet};
pub use plugin::{MasterFile, PluginHeader};
pub use settings::{GameSetting, Global, SettingValue};
pub use world::{Cell, Climate, Land, PathGrid, Reference, Region, Worldspace};

object_body!(ObjectRecord);

macro_rules! record_data {
    ($($variant:ident($ty:ty)),+ $(,)?) => {
        /// Decoded body of a record.
        #[derive(Debug, Clone, PartialEq)]
        pub enum RecordData {
            $($variant($ty),)+
        }

        impl RecordData {
            /// Editor id of the body
            pub fn editor_id(&self) -> Option<&str> {
                match self {
                    $(Self::$variant(body) => body.editor_id(),)+
                }
            }

            /// Display name of the body
            pub fn name(&self) -> Option<&LString> {
                match self {
                    $(Self::$variant(body) => body.name(),)+
                }
            }

            /// Name of the decoded shape
            pub fn shape(&self) -> &'static str {
                match self {
                    $(Self::$variant(_) => stringify!($variant),)+
                }
            }
        }

        impl FieldSink for RecordData {
            fn read_field(&mut self, field: &mut FieldReader<'_>) -> Result<FieldOutcome> {
                match self {
                    $(Self::$variant(body) => body.read_field(field),)+
                }
            }
        }

        $(
            impl RecordShape for $ty {
                fn extract(data: &RecordData) -> Option<&Self> {
                    match data {
                        RecordData::$variant(body) => Some(body),
                        _ => None,
                    }
                }
            }

            impl RecordKind for $ty {
                fn matches(data: &RecordData) -> bool {
                    matches!(data, RecordData::$variant(_))
                }
            }

            impl From<$ty> for RecordData {
                fn from(body: $ty) -> Self {
                    Self::$variant(body)
                }
            }
        )+
    };
}

record_data! {
    Header(PluginHeader),
    GameSetting(GameSetting),
    Global(Global),
    Class(Class),
    Faction(Faction),
    Race(Race),
    Birthsign(Birthsign),
    Skill(Skill),
    Sound(Sound),
    MagicEffect(MagicEffect),
    Script(Script),
    LandTexture(LandTexture),
    Spell(Spell),
    Enchantment(Enchantment),
    Potion(Potion),
    Ingredient(Ingredient),
    Weapon(Weapon),
    Armor(Armor),
    Ammo(Ammo),
    Book(Book),
    Clothing(Clothing),
    Light(Light),
    Item(SimpleItem),
    Container(Container),
    Door(Door),
    TextureSet(TextureSet),
    FormList(FormList),
    LeveledList(LeveledList),
    Actor(Actor),
    Cell(Cell),
    Land(Land),
    Worldspace(Worldspace),
    Region(Region),
    Climate(Climate),
    PathGrid(PathGrid),
    Reference(Reference),
    Dialogue(Dialogue),
    Info(DialogueInfo),
    Quest(Quest),
    Object(ObjectRecord),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{ReadContext, read_fields};
    use crate::tag::FormTag;
    use crate::version::GameEdition;

    #[test]
    fn record_data_dispatches_to_body() {
        let mut data = RecordData::from(Weapon::default());
        let mut bytes = b"EDID".to_vec();
        bytes.extend_from_slice(&6u16.to_le_bytes());
        bytes.extend_from_slice(b"Sword\0");

        read_fields(
            &bytes,
            0,
            FormTag::WEAP,
            ReadContext::new(GameEdition::Oblivion),
            &mut data,
        )
        .unwrap();

        assert_eq!(data.editor_id(), Some("Sword"));
        assert_eq!(data.shape(), "Weapon");
        assert!(Weapon::extract(&data).is_some());
        assert!(Armor::extract(&data).is_none());
        assert!(Weapon::matches(&data));
    }
}
