//! Four-byte tags identifying records, fields and groups.
//!
//! Every chunk in a master/plugin file starts with four raw ASCII bytes. The
//! reader never decodes them as text: they are loaded as a little-endian `u32`
//! and compared as opaque keys. The stored bytes are in reading order, so the
//! record type "CELL" sits in the file as `[b'C', b'E', b'L', b'L']`.
//!
//! ```text
//! File bytes: [0x43, 0x45, 0x4C, 0x4C] -> FormTag(0x4C4C_4543) -> displays "CELL"
//! ```

use binrw::BinRead;
use std::fmt;

/// Opaque four-byte tag read as a little-endian `u32`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, BinRead)]
#[br(little)]
pub struct FormTag(pub u32);

macro_rules! tags {
    ($($name:ident => $bytes:literal),* $(,)?) => {
        impl FormTag {
            $(
                #[allow(missing_docs)]
                pub const $name: Self = Self::new($bytes);
            )*
        }
    };
}

impl FormTag {
    /// Build a tag from its four ASCII bytes.
    #[must_use]
    pub const fn new(bytes: &[u8; 4]) -> Self {
        Self(u32::from_le_bytes(*bytes))
    }

    /// Create from a 4-character string; `None` if the length is not 4.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        let bytes: [u8; 4] = s.as_bytes().try_into().ok()?;
        Some(Self::new(&bytes))
    }

    /// The raw bytes in file order.
    #[must_use]
    pub const fn to_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    /// Printable form of the tag. Non-ASCII bytes render as `?`.
    #[must_use]
    pub fn as_str(&self) -> String {
        self.to_bytes()
            .iter()
            .map(|&b| {
                if b.is_ascii_graphic() || b == b' ' {
                    b as char
                } else {
                    '?'
                }
            })
            .collect()
    }
}

impl fmt::Display for FormTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str())
    }
}

impl fmt::Debug for FormTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FormTag({})", self.as_str())
    }
}

// Chunk markers and file roots
tags! {
    GRUP => b"GRUP",
    TES3 => b"TES3",
    TES4 => b"TES4",
    XXXX => b"XXXX",
}

// Record types
tags! {
    AACT => b"AACT", ACHR => b"ACHR", ACRE => b"ACRE", ACTI => b"ACTI", ADDN => b"ADDN",
    ALCH => b"ALCH", ALOC => b"ALOC", AMEF => b"AMEF", AMMO => b"AMMO", ANIO => b"ANIO",
    APPA => b"APPA", ARMA => b"ARMA", ARMO => b"ARMO", ARTO => b"ARTO", ASPC => b"ASPC",
    ASTP => b"ASTP", AVIF => b"AVIF", BODY => b"BODY", BOOK => b"BOOK", BPTD => b"BPTD",
    BSGN => b"BSGN", CAMS => b"CAMS", CCRD => b"CCRD", CELL => b"CELL", CHAL => b"CHAL",
    CHIP => b"CHIP", CLAS => b"CLAS", CLFM => b"CLFM", CLMT => b"CLMT", CLOT => b"CLOT",
    CMNY => b"CMNY", COBJ => b"COBJ", COLL => b"COLL", CONT => b"CONT", CPTH => b"CPTH",
    CREA => b"CREA", CSNO => b"CSNO", CSTY => b"CSTY", DEBR => b"DEBR", DIAL => b"DIAL",
    DLBR => b"DLBR", DLVW => b"DLVW", DOBJ => b"DOBJ", DOOR => b"DOOR", DUAL => b"DUAL",
    ECZN => b"ECZN", EFSH => b"EFSH", ENCH => b"ENCH", EQUP => b"EQUP", EXPL => b"EXPL",
    EYES => b"EYES", FACT => b"FACT", FLOR => b"FLOR", FLST => b"FLST", FSTP => b"FSTP",
    FSTS => b"FSTS", FURN => b"FURN", GLOB => b"GLOB", GMST => b"GMST", GRAS => b"GRAS",
    HAIR => b"HAIR", HAZD => b"HAZD", HDPT => b"HDPT", IDLE => b"IDLE", IDLM => b"IDLM",
    IMAD => b"IMAD", IMGS => b"IMGS", IMOD => b"IMOD", INFO => b"INFO", INGR => b"INGR",
    IPCT => b"IPCT", IPDS => b"IPDS", KEYM => b"KEYM", KYWD => b"KYWD", LAND => b"LAND",
    LEVC => b"LEVC", LEVI => b"LEVI",
    LCRT => b"LCRT", LCTN => b"LCTN", LGTM => b"LGTM", LIGH => b"LIGH", LOCK => b"LOCK",
    LSCR => b"LSCR", LSCT => b"LSCT", LTEX => b"LTEX", LVLC => b"LVLC", LVLI => b"LVLI",
    LVLN => b"LVLN", LVSP => b"LVSP", MATO => b"MATO", MATT => b"MATT", MESG => b"MESG",
    MGEF => b"MGEF", MICN => b"MICN", MISC => b"MISC", MOVT => b"MOVT", MSET => b"MSET",
    MSTT => b"MSTT", MUSC => b"MUSC", MUST => b"MUST", NAVI => b"NAVI", NAVM => b"NAVM",
    NOTE => b"NOTE", NPC_ => b"NPC_", OMOD => b"OMOD", OTFT => b"OTFT", PACK => b"PACK",
    PARW => b"PARW", PBAR => b"PBAR", PBEA => b"PBEA", PCON => b"PCON", PERK => b"PERK",
    PFLA => b"PFLA", PGRD => b"PGRD", PGRE => b"PGRE", PHZD => b"PHZD", PMIS => b"PMIS",
    PROB => b"PROB", PROJ => b"PROJ", PWAT => b"PWAT", QUST => b"QUST", RACE => b"RACE",
    RADS => b"RADS", RCCT => b"RCCT", RCPE => b"RCPE", REFR => b"REFR", REGN => b"REGN",
    RELA => b"RELA", REPA => b"REPA", REPU => b"REPU", REVB => b"REVB", RGDL => b"RGDL",
    ROAD => b"ROAD", SBSP => b"SBSP", SCEN => b"SCEN", SCOL => b"SCOL", SCPT => b"SCPT",
    SCRL => b"SCRL", SGST => b"SGST", SHOU => b"SHOU", SKIL => b"SKIL", SLGM => b"SLGM",
    SMBN => b"SMBN", SMEN => b"SMEN", SMQN => b"SMQN", SNCT => b"SNCT", SNDG => b"SNDG",
    SNDR => b"SNDR", SOPM => b"SOPM", SOUN => b"SOUN", SPEL => b"SPEL", SPGD => b"SPGD",
    SSCR => b"SSCR", STAT => b"STAT", TACT => b"TACT", TERM => b"TERM", TREE => b"TREE",
    TXST => b"TXST", VTYP => b"VTYP", WATR => b"WATR", WEAP => b"WEAP", WOOP => b"WOOP",
    WRLD => b"WRLD", WTHR => b"WTHR",
}

// Field types
tags! {
    AADT => b"AADT", ACBS => b"ACBS", ALDT => b"ALDT", AMBI => b"AMBI", ANAM => b"ANAM",
    AODT => b"AODT", ATXT => b"ATXT", BKDT => b"BKDT", BNAM => b"BNAM", BTXT => b"BTXT",
    CLDT => b"CLDT", CNAM => b"CNAM", CNDT => b"CNDT", CNTO => b"CNTO", CTDA => b"CTDA",
    CTDT => b"CTDT", DATA => b"DATA", DELE => b"DELE", DESC => b"DESC", DNAM => b"DNAM",
    DODT => b"DODT", EDID => b"EDID", EFID => b"EFID", EFIT => b"EFIT", ENAM => b"ENAM",
    ENDT => b"ENDT", ENIT => b"ENIT", FADT => b"FADT", FLAG => b"FLAG", FLTV => b"FLTV",
    FNAM => b"FNAM", FRMR => b"FRMR", FULL => b"FULL", GNAM => b"GNAM", HEDR => b"HEDR",
    HNAM => b"HNAM", ICON => b"ICON", INAM => b"INAM", INCC => b"INCC", INDX => b"INDX",
    INTV => b"INTV", IRDT => b"IRDT", ITEX => b"ITEX", KNAM => b"KNAM", KSIZ => b"KSIZ",
    KWDA => b"KWDA", LHDT => b"LHDT", LKDT => b"LKDT", LLCT => b"LLCT", LNAM => b"LNAM",
    LVLD => b"LVLD", LVLF => b"LVLF", LVLO => b"LVLO", MAST => b"MAST", MCDT => b"MCDT",
    MEDT => b"MEDT", MICO => b"MICO", MNAM => b"MNAM", MODB => b"MODB", MODL => b"MODL",
    MODT => b"MODT", NAM0 => b"NAM0", NAM1 => b"NAM1", NAM2 => b"NAM2", NAM5 => b"NAM5",
    NAM9 => b"NAM9", NAME => b"NAME", NNAM => b"NNAM", NPCO => b"NPCO", NPCS => b"NPCS",
    NPDT => b"NPDT", OBND => b"OBND", OFST => b"OFST", ONAM => b"ONAM", PBDT => b"PBDT",
    PGRC => b"PGRC", PGRP => b"PGRP", PGRR => b"PGRR", PKID => b"PKID", PNAM => b"PNAM",
    QNAM => b"QNAM", QOBJ => b"QOBJ", QSDT => b"QSDT", QSTI => b"QSTI", RADT => b"RADT",
    RCLR => b"RCLR", RGNN => b"RGNN", RIDT => b"RIDT", RNAM => b"RNAM", RPLD => b"RPLD",
    RPLI => b"RPLI", SCDA => b"SCDA", SCDT => b"SCDT", SCHD => b"SCHD", SCHR => b"SCHR",
    SCRI => b"SCRI", SCRO => b"SCRO", SCTX => b"SCTX", SKDT => b"SKDT", SLCP => b"SLCP",
    SNAM => b"SNAM", SOUL => b"SOUL", SPDT => b"SPDT", SPLO => b"SPLO", STRV => b"STRV",
    TEXT => b"TEXT", TIFC => b"TIFC", TNAM => b"TNAM", TPIC => b"TPIC", TRDT => b"TRDT",
    TX00 => b"TX00", TX01 => b"TX01", TX02 => b"TX02", TX03 => b"TX03", TX04 => b"TX04",
    TX05 => b"TX05", TX06 => b"TX06", TX07 => b"TX07", VCLR => b"VCLR", VHGT => b"VHGT",
    VNML => b"VNML", VTEX => b"VTEX", VTXT => b"VTXT", WEAT => b"WEAT", WHGT => b"WHGT",
    WLST => b"WLST", WNAM => b"WNAM", WPDT => b"WPDT", XCAS => b"XCAS", XCCM => b"XCCM",
    XCIM => b"XCIM", XCLC => b"XCLC", XCLL => b"XCLL", XCLR => b"XCLR", XCLW => b"XCLW",
    XCMT => b"XCMT", XCWT => b"XCWT", XESP => b"XESP", XEZN => b"XEZN", XLCN => b"XLCN",
    XLOC => b"XLOC", XMRK => b"XMRK", XNAM => b"XNAM", XOWN => b"XOWN", XSCL => b"XSCL",
    XTEL => b"XTEL", SCVR => b"SCVR", SPIT => b"SPIT", COCT => b"COCT", BMDT => b"BMDT",
    QSTN => b"QSTN", QSTF => b"QSTF", QSTR => b"QSTR", SLSD => b"SLSD", PGRI => b"PGRI",
    TCLT => b"TCLT", LVLG => b"LVLG", AIDT => b"AIDT",
}
