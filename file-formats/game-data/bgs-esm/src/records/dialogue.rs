//! Dialogue topics, responses and quests.
//!
//! Tes3 stores the responses of a topic as `INFO` records directly after
//! their `DIAL` record; later games nest them in a `TopicChildren` group.

use crate::error::Result;
use crate::field::{FieldOutcome, FieldReader, FieldSink, LString};
use crate::records::actors::Actor;
use crate::records::common::{ObjectCore, read_ref};
use crate::tag::FormTag;
use crate::types::{FormId, FormRef};
use crate::version::FormatVersion;

/// Condition attached to an info or quest (`CTDA`).
///
/// Only the leading 20 bytes shared by every game are decoded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Condition {
    /// Comparison operator and flags
    pub operator: u8,
    /// Comparison value
    pub value: f32,
    /// Condition function index
    pub function: u16,
    /// Function parameters
    pub parameters: [u32; 2],
}

impl Condition {
    fn read(field: &mut FieldReader<'_>) -> Result<Self> {
        let operator = field.read_u8()?;
        field.skip(3)?;
        let value = field.read_f32()?;
        let function = field.read_u16()?;
        field.skip(2)?;
        let parameters = [field.read_u32()?, field.read_u32()?];
        field.skip(field.remaining())?;
        Ok(Self {
            operator,
            value,
            function,
            parameters,
        })
    }
}

/// `DIAL` record
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dialogue {
    /// Common fields; Tes3 topics use the topic text as editor id
    pub core: ObjectCore,
    /// Topic type (topic, voice, greeting, persuasion, journal, ...)
    pub kind: u8,
    /// Topic flags
    pub flags: u8,
    /// Owning quests (`QSTI`, Oblivion and Fallout)
    pub quests: Vec<FormId>,
    /// Owning quest (`QNAM`, Skyrim and later)
    pub quest: Option<FormId>,
    /// Priority (`PNAM`)
    pub priority: Option<f32>,
    /// Subtype (`DATA` on Skyrim and later)
    pub subtype: Option<u16>,
    /// Number of infos (`TIFC`)
    pub info_count: Option<u32>,
}

impl FieldSink for Dialogue {
    fn read_field(&mut self, field: &mut FieldReader<'_>) -> Result<FieldOutcome> {
        let format = field.format();
        match (field.tag(), field.len()) {
            (FormTag::DATA, 1 | 4) if format == FormatVersion::Tes3 => {
                self.kind = field.read_u8()?;
                field.skip(field.remaining())?;
            }
            (FormTag::DATA, 4) if format == FormatVersion::Tes5 => {
                self.flags = field.read_u8()?;
                self.kind = field.read_u8()?;
                self.subtype = Some(field.read_u16()?);
            }
            (FormTag::DATA, 1 | 2) => {
                self.kind = field.read_u8()?;
                if field.remaining() > 0 {
                    self.flags = field.read_u8()?;
                }
            }
            (FormTag::QSTI, 4) => self.quests.push(field.read_form_id()?),
            (FormTag::QNAM, 4) => self.quest = Some(field.read_form_id()?),
            (FormTag::PNAM, 4) => self.priority = Some(field.read_f32()?),
            (FormTag::TIFC, 4) => self.info_count = Some(field.read_u32()?),
            _ => return self.core.read_field(field),
        }
        Ok(FieldOutcome::Handled)
    }
}

/// One spoken line of an info.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Response {
    /// Emotion type
    pub emotion: u32,
    /// Emotion value
    pub emotion_value: i32,
    /// Response number
    pub number: u8,
    /// Spoken text (`NAM1`)
    pub text: Option<LString>,
    /// Actor notes (`NAM2`)
    pub notes: Option<String>,
}

/// `INFO` record
///
/// ```text
/// Tes3  INAM id, PNAM previous id, NNAM next id,
///       DATA (12 bytes): type u8, pad u8[3], disposition i32, rank i8,
///                        gender i8, pc rank i8, pad u8
///       NAME response text
/// Tes4+ DATA (2-4 bytes): type u8, next speaker u8, flags
///       TRDT (20/24 bytes) + NAM1 + NAM2 per response
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DialogueInfo {
    /// Common fields; Tes3 infos use their `INAM` id as editor id
    pub core: ObjectCore,
    /// Info type
    pub kind: u8,
    /// Required disposition (Tes3)
    pub disposition: Option<i32>,
    /// Previous info in the topic
    pub previous: Option<FormRef<DialogueInfo>>,
    /// Next info in the topic (Tes3)
    pub next: Option<String>,
    /// Owning topic (`TPIC`)
    pub topic: Option<FormId>,
    /// Owning quest (`QSTI`)
    pub quest: Option<FormId>,
    /// Speaker (Tes3 `ONAM`, `ANAM` on Skyrim and later)
    pub speaker: Option<FormRef<Actor>>,
    /// Responses
    pub responses: Vec<Response>,
    /// Conditions (`CTDA`)
    pub conditions: Vec<Condition>,
    /// Tes3 script conditions (`SCVR`)
    pub script_conditions: Vec<String>,
    /// Result script source (`BNAM` on Tes3, `SCTX` otherwise)
    pub result_script: Option<String>,
}

impl DialogueInfo {
    fn last_response(&mut self) -> &mut Response {
        if self.responses.is_empty() {
            self.responses.push(Response::default());
        }
        let last = self.responses.len() - 1;
        &mut self.responses[last]
    }

    fn read_tes3(&mut self, field: &mut FieldReader<'_>) -> Result<FieldOutcome> {
        match (field.tag(), field.len()) {
            (FormTag::INAM, _) => self.core.editor_id = Some(field.read_zstring()?),
            (FormTag::PNAM, _) => self.previous = Some(read_ref(field)?),
            (FormTag::NNAM, _) => self.next = Some(field.read_zstring()?),
            (FormTag::DATA, 12) => {
                self.kind = field.read_u8()?;
                field.skip(3)?;
                self.disposition = Some(field.read_i32()?);
                field.skip(4)?;
            }
            (FormTag::ONAM, _) => self.speaker = Some(read_ref(field)?),
            (FormTag::NAME, _) => {
                let text = field.read_zstring()?;
                self.last_response().text = Some(LString::Text(text));
            }
            (FormTag::SCVR, len) => {
                let condition = field.read_fixed_string(len)?;
                self.script_conditions.push(condition);
            }
            (FormTag::INTV | FormTag::FLTV, 4) => field.skip(4)?,
            (FormTag::BNAM, _) => self.result_script = Some(field.read_zstring()?),
            _ => return self.core.read_field(field),
        }
        Ok(FieldOutcome::Handled)
    }
}

impl FieldSink for DialogueInfo {
    fn read_field(&mut self, field: &mut FieldReader<'_>) -> Result<FieldOutcome> {
        if field.format() == FormatVersion::Tes3 {
            return self.read_tes3(field);
        }
        match (field.tag(), field.len()) {
            (FormTag::DATA, 2..=4) => {
                self.kind = field.read_u8()?;
                field.skip(field.remaining())?;
            }
            (FormTag::QSTI, 4) => self.quest = Some(field.read_form_id()?),
            (FormTag::TPIC, 4) => self.topic = Some(field.read_form_id()?),
            (FormTag::PNAM, 4) => self.previous = Some(FormRef::id(field.read_form_id()?)),
            (FormTag::ANAM, 4) => self.speaker = Some(FormRef::id(field.read_form_id()?)),
            (FormTag::TRDT, 20 | 24) => {
                let emotion = field.read_u32()?;
                let emotion_value = field.read_i32()?;
                field.skip(4)?;
                let number = field.read_u8()?;
                field.skip(field.remaining())?;
                self.responses.push(Response {
                    emotion,
                    emotion_value,
                    number,
                    ..Response::default()
                });
            }
            (FormTag::NAM1, _) => {
                let text = field.read_lstring()?;
                self.last_response().text = Some(text);
            }
            (FormTag::NAM2, _) => {
                let notes = field.read_zstring()?;
                self.last_response().notes = Some(notes);
            }
            (FormTag::CTDA, 20..) => self.conditions.push(Condition::read(field)?),
            (FormTag::SCTX, _) => {
                let len = field.len();
                self.result_script = Some(field.read_fixed_string(len)?);
            }
            _ => return self.core.read_field(field),
        }
        Ok(FieldOutcome::Handled)
    }
}

/// Quest stage with its journal entries.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QuestStage {
    /// Stage index (`INDX`)
    pub index: i16,
    /// Stage flags
    pub flags: u8,
    /// Journal entries (`CNAM`)
    pub log_entries: Vec<LString>,
}

/// Quest objective.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QuestObjective {
    /// Objective index (`QOBJ`)
    pub index: i32,
    /// Display text (`NNAM`)
    pub text: Option<LString>,
}

/// `QUST` record (Oblivion and later)
///
/// ```text
/// Tes4  DATA (2/8 bytes): flags u8, priority u8, ...
///       INDX (2 bytes) stage, QSDT entry flags, CNAM log entry
///       QOBJ (4 bytes) objective index, NNAM text
/// Tes5+ DNAM (12 bytes): flags u16, priority u8, ..., type u32
///       INDX (4 bytes): stage u16, flags u8, pad u8
///       QOBJ (2 bytes) objective index
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Quest {
    /// Common fields
    pub core: ObjectCore,
    /// Quest flags
    pub flags: u16,
    /// Priority
    pub priority: u8,
    /// Quest type (Skyrim and later)
    pub kind: Option<u32>,
    /// Stages
    pub stages: Vec<QuestStage>,
    /// Objectives
    pub objectives: Vec<QuestObjective>,
    /// Conditions (`CTDA`)
    pub conditions: Vec<Condition>,
}

impl FieldSink for Quest {
    fn read_field(&mut self, field: &mut FieldReader<'_>) -> Result<FieldOutcome> {
        match (field.tag(), field.len()) {
            (FormTag::DATA, 2 | 8) => {
                self.flags = u16::from(field.read_u8()?);
                self.priority = field.read_u8()?;
                field.skip(field.remaining())?;
            }
            (FormTag::DNAM, 12) => {
                self.flags = field.read_u16()?;
                self.priority = field.read_u8()?;
                field.skip(5)?;
                self.kind = Some(field.read_u32()?);
            }
            (FormTag::INDX, 2) => self.stages.push(QuestStage {
                index: field.read_i16()?,
                ..QuestStage::default()
            }),
            (FormTag::INDX, 4) => {
                let index = field.read_u16()? as i16;
                let flags = field.read_u8()?;
                field.skip(1)?;
                self.stages.push(QuestStage {
                    index,
                    flags,
                    ..QuestStage::default()
                });
            }
            (FormTag::QSDT, 1) => {
                let flags = field.read_u8()?;
                if let Some(stage) = self.stages.last_mut() {
                    stage.flags = flags;
                }
            }
            (FormTag::CNAM, _) => {
                let entry = field.read_lstring()?;
                match self.stages.last_mut() {
                    Some(stage) => stage.log_entries.push(entry),
                    None => log::warn!("quest log entry outside of a stage"),
                }
            }
            (FormTag::QOBJ, 2) => self.objectives.push(QuestObjective {
                index: i32::from(field.read_u16()?),
                text: None,
            }),
            (FormTag::QOBJ, 4) => self.objectives.push(QuestObjective {
                index: field.read_i32()?,
                text: None,
            }),
            (FormTag::NNAM, _) if !self.objectives.is_empty() => {
                let text = field.read_lstring()?;
                if let Some(objective) = self.objectives.last_mut() {
                    objective.text = Some(text);
                }
            }
            (FormTag::CTDA, 20..) => self.conditions.push(Condition::read(field)?),
            _ => return self.core.read_field(field),
        }
        Ok(FieldOutcome::Handled)
    }
}

object_body!(Dialogue, DialogueInfo, Quest);
