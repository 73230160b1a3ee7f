use strum::{EnumString, IntoStaticStr};

/// Sections of a `.gug` file
#[derive(Debug, IntoStaticStr, EnumString, PartialEq, Eq, Clone, Copy)]
#[strum(ascii_case_insensitive)]
pub enum Section {
    Header,
    MapInfo,
}

/// Keys of the `[Header]` section
#[derive(Debug, IntoStaticStr, EnumString, PartialEq, Eq, Clone, Copy)]
#[strum(ascii_case_insensitive)]
pub enum HeaderField {
    FileVersion,
    MapInfo,
    Title,
    BkColor,
    Gauges,
}

/// Keys of a `[MapInfo]` section
#[derive(Debug, IntoStaticStr, EnumString, PartialEq, Eq, Clone, Copy)]
#[strum(ascii_case_insensitive)]
#[allow(clippy::upper_case_acronyms)]
pub enum LevelField {
    Type,
    Path,
    Ellipsoid,
    Projection,
    BaseMed,
    Zone,
    WorldOrgX,
    WorldOrgY,
    WPPX,
    WPPY,
    RADX,
    RADY,
    ImageWidth,
    ImageHeight,
}

impl HeaderField {
    pub fn as_str(self) -> &'static str {
        Into::<&'static str>::into(self)
    }
}

impl LevelField {
    pub fn as_str(self) -> &'static str {
        Into::<&'static str>::into(self)
    }
}
