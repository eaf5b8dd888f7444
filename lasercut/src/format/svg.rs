use common::{config::Profile, serde::Serializer};
use svg::{
    node::element::{path::Data, Path},
    Document,
};

use crate::layout::{Layout, PathCommand};

/// A laid out object ready to be written as a single-path SVG document.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgFile {
    layout: Layout,
    profile: Profile,
}

impl SvgFile {
    pub fn new(layout: Layout, profile: Profile) -> Self {
        Self { layout, profile }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn width(&self) -> f64 {
        self.layout.width
    }

    pub fn height(&self) -> f64 {
        self.layout.height
    }

    /// Path data for every outline, in absolute coordinates.
    pub fn path_data(&self) -> Data {
        self.layout
            .commands()
            .fold(Data::new(), |data, command| match command {
                PathCommand::MoveTo(x) => data.move_to((x.x as f32, x.y as f32)),
                PathCommand::LineTo(x) => data.line_to((x.x as f32, x.y as f32)),
                PathCommand::Close => data.close(),
            })
    }

    pub fn document(&self) -> Document {
        let (width, height) = (self.width() as f32, self.height() as f32);
        let document = Document::new()
            .set("version", self.profile.version())
            .set("baseProfile", self.profile.base_profile())
            .set("width", width)
            .set("height", height)
            .set("viewBox", (0, 0, width, height));

        if self.layout.outlines.is_empty() {
            return document;
        }

        let style = &self.layout.style;
        document.add(
            Path::new()
                .set("d", self.path_data())
                .set("stroke", style.stroke.as_str())
                .set("stroke-width", style.stroke_width as f32)
                .set("fill", style.fill.as_str())
                .set("fill-opacity", style.fill_opacity as f32),
        )
    }

    pub fn serialize<T: Serializer>(&self, ser: &mut T) {
        ser.write_bytes(self.document().to_string().as_bytes());
    }
}
