use bon::{bon, Builder};
use std::str::FromStr;

use crate::transform::Rotation;

use super::{
    error::Error,
    field::{HeaderField, LevelField},
    utils::{parse_color, parse_value, split_gauges},
};

/// Record identifier: `[Header]`
///
/// File level metadata of a `.gug` map
#[derive(Builder, Default, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct HeaderRecord {
    /// Field identifier: `FileVersion`
    #[builder(default)]
    pub file_version: f32,

    /// Field identifier: `MapInfo`
    ///
    /// Free-form description of the map
    #[builder(default)]
    pub map_info: String,

    /// Field identifier: `Title`
    #[builder(default)]
    pub title: String,

    /// Field identifier: `BkColor`
    ///
    /// Background color as `0xRRGGBB`
    #[builder(default)]
    pub background_color: u32,

    /// Field identifier: `Gauges`
    ///
    /// Delimited list of the available resolution steps
    #[builder(default)]
    pub gauges: String,
}

impl HeaderRecord {
    /// Sets a field from its `.gug` key and raw value.
    ///
    /// Returns `Ok(false)` if the key is not a header field.
    ///
    /// # Errors
    ///
    /// Errors if the value cannot be converted to the field's type
    pub fn set_field(&mut self, key: &str, value: &str) -> Result<bool, Error> {
        let Ok(field) = HeaderField::from_str(key) else {
            return Ok(false);
        };
        match field {
            HeaderField::FileVersion => self.file_version = parse_value(field.as_str(), value)?,
            HeaderField::MapInfo => value.clone_into(&mut self.map_info),
            HeaderField::Title => value.clone_into(&mut self.title),
            HeaderField::BkColor => {
                self.background_color = match parse_color(value) {
                    Ok(("", color)) => color,
                    _ => {
                        return Err(Error::InvalidValue {
                            field: field.as_str(),
                            value: value.to_owned(),
                        })
                    }
                };
            }
            HeaderField::Gauges => value.clone_into(&mut self.gauges),
        }
        Ok(true)
    }

    /// Number of resolution steps announced by [`Self::gauges`]
    #[must_use]
    pub fn count_gauges(&self) -> usize {
        split_gauges(&self.gauges).count()
    }

    /// Background color split into RGB channels
    #[must_use]
    pub const fn background_rgb(&self) -> [u8; 3] {
        let [_, r, g, b] = self.background_color.to_be_bytes();
        [r, g, b]
    }
}

/// Record identifier: `[MapInfo]`
///
/// Projection and pixel geometry of one resolution level. The rotation's
/// sine/cosine are derived by [`LevelRecord::complete_initialization`], which
/// has to run before any coordinate conversion.
#[derive(Default, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct LevelRecord {
    /// Field identifier: `Type`
    pub kind: String,
    /// Field identifier: `Path`
    ///
    /// `.gup` file holding the tiles, optionally followed by `,N` to select the
    /// N-th image entry of that file
    pub path: String,
    /// Field identifier: `Ellipsoid`
    pub ellipsoid: String,
    /// Field identifier: `Projection`
    pub projection: String,
    /// Field identifier: `BaseMed`
    pub base_meridian: f64,
    /// Field identifier: `Zone`
    pub zone: i32,
    /// Field identifiers: `WorldOrgX`, `WorldOrgY`
    pub world_origin: (f64, f64),
    /// Field identifiers: `WPPX`, `WPPY`
    ///
    /// Ground distance covered by one pixel
    pub pixel_size: (f64, f64),
    /// Field identifiers: `ImageWidth`, `ImageHeight`
    pub image_width_height: (u32, u32),
    pub(crate) rotation_x: Rotation,
    pub(crate) rotation_y: Rotation,
}

#[bon]
impl LevelRecord {
    /// Creates a fully initialized level record
    #[builder]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        path: String,
        world_origin: (f64, f64),
        pixel_size: (f64, f64),
        #[builder(default)] kind: String,
        #[builder(default)] ellipsoid: String,
        #[builder(default)] projection: String,
        #[builder(default)] base_meridian: f64,
        #[builder(default)] zone: i32,
        #[builder(default)] rotation: (f64, f64),
        #[builder(default)] image_width_height: (u32, u32),
    ) -> Self {
        let mut level = Self {
            kind,
            path,
            ellipsoid,
            projection,
            base_meridian,
            zone,
            world_origin,
            pixel_size,
            image_width_height,
            rotation_x: Rotation::new(rotation.0),
            rotation_y: Rotation::new(rotation.1),
        };
        level.complete_initialization();
        level
    }
}

impl LevelRecord {
    /// Sets a field from its `.gug` key and raw value.
    ///
    /// Returns `Ok(false)` if the key is not a level field.
    ///
    /// # Errors
    ///
    /// Errors if the value cannot be converted to the field's type
    pub fn set_field(&mut self, key: &str, value: &str) -> Result<bool, Error> {
        let Ok(field) = LevelField::from_str(key) else {
            return Ok(false);
        };
        let name = field.as_str();
        match field {
            LevelField::Type => value.clone_into(&mut self.kind),
            LevelField::Path => value.clone_into(&mut self.path),
            LevelField::Ellipsoid => value.clone_into(&mut self.ellipsoid),
            LevelField::Projection => value.clone_into(&mut self.projection),
            LevelField::BaseMed => self.base_meridian = parse_value(name, value)?,
            LevelField::Zone => self.zone = parse_value(name, value)?,
            LevelField::WorldOrgX => self.world_origin.0 = parse_value(name, value)?,
            LevelField::WorldOrgY => self.world_origin.1 = parse_value(name, value)?,
            LevelField::WPPX => self.pixel_size.0 = parse_value(name, value)?,
            LevelField::WPPY => self.pixel_size.1 = parse_value(name, value)?,
            LevelField::RADX => self.rotation_x = Rotation::new(parse_value(name, value)?),
            LevelField::RADY => self.rotation_y = Rotation::new(parse_value(name, value)?),
            LevelField::ImageWidth => self.image_width_height.0 = parse_value(name, value)?,
            LevelField::ImageHeight => self.image_width_height.1 = parse_value(name, value)?,
        }
        Ok(true)
    }

    /// Rotation of the pixel x axis, in radians
    #[must_use]
    pub const fn rotation_x(&self) -> f64 {
        self.rotation_x.angle()
    }

    /// Rotation of the pixel y axis, in radians
    #[must_use]
    pub const fn rotation_y(&self) -> f64 {
        self.rotation_y.angle()
    }

    /// Ground area covered by one pixel; smaller means more detail
    #[must_use]
    pub fn pixel_area(&self) -> f64 {
        (self.pixel_size.0 * self.pixel_size.1).abs()
    }
}
