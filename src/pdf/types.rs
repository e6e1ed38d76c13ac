//! Core types shared between the document backend and the render pipeline

/// Page rotation, always one of the four quarter turns
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Rotation in degrees, in `[0, 360)`
    #[must_use]
    pub const fn degrees(self) -> u16 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }

    /// Normalise any multiple of 90 to its non-negative representative.
    /// Values that are not a multiple of 90 round down to the previous quarter turn.
    #[must_use]
    pub fn from_degrees(degrees: i32) -> Self {
        match degrees.rem_euclid(360) / 90 {
            1 => Self::Deg90,
            2 => Self::Deg180,
            3 => Self::Deg270,
            _ => Self::Deg0,
        }
    }

    #[must_use]
    pub fn clockwise(self) -> Self {
        Self::from_degrees(i32::from(self.degrees()) + 90)
    }

    #[must_use]
    pub fn counter_clockwise(self) -> Self {
        Self::from_degrees(i32::from(self.degrees()) - 90)
    }

    /// True for 90 and 270, where width and height swap
    #[must_use]
    pub const fn is_sideways(self) -> bool {
        matches!(self, Self::Deg90 | Self::Deg270)
    }
}

/// Page box in PDF user space (points, y axis up)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl PageBox {
    #[must_use]
    pub const fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// A box anchored at the origin
    #[must_use]
    pub const fn sized(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    #[must_use]
    pub fn width(&self) -> f32 {
        (self.x1 - self.x0).abs()
    }

    #[must_use]
    pub fn height(&self) -> f32 {
        (self.y1 - self.y0).abs()
    }
}

/// A text run as reported by the backend.
///
/// `transform` is the run's text matrix in page space; its translation part is
/// the glyph origin of the first character.
#[derive(Clone, Debug, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub transform: [f32; 6],
    pub width: f32,
    pub height: f32,
    pub font_name: Option<String>,
}

impl TextRun {
    /// Horizontal run of `size`-point text starting at `(x, y)` in page space
    #[must_use]
    pub fn at(text: impl Into<String>, x: f32, y: f32, size: f32) -> Self {
        let text = text.into();
        let width = text.chars().count() as f32 * size * 0.5;
        Self {
            text,
            transform: [size, 0.0, 0.0, size, x, y],
            width,
            height: size,
            font_name: None,
        }
    }
}

/// Raw rasterised page pixels (RGBA, 4 bytes per pixel)
#[derive(Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RasterImage {
    /// Opaque white image of the given size
    #[must_use]
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0xFF; width as usize * height as usize * 4],
        }
    }
}

impl std::fmt::Debug for RasterImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// Positioned text span in surface coordinates
#[derive(Clone, Debug, PartialEq)]
pub struct TextSpan {
    pub text: String,
    pub left: f32,
    pub top: f32,
    pub font_size: f32,
    pub font_name: Option<String>,
}

/// Rendered page: raster plus the text layer aligned with it
#[derive(Clone, Debug)]
pub struct PageSurface {
    /// Page number (1-based)
    pub page_number: usize,
    pub scale: f32,
    pub rotation: Rotation,
    /// Surface size in pixels
    pub width: u32,
    pub height: u32,
    pub raster: RasterImage,
    pub text_spans: Vec<TextSpan>,
}

/// Target of an outline entry, resolved on demand
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Destination {
    /// Named destination looked up in the document's name tree
    Named(String),
    /// Explicit reference to a page object
    Reference { object: u32, generation: u16 },
    /// Page index (0-based) already known to the backend
    PageIndex(usize),
}

/// A raw outline entry from the backend
#[derive(Clone, Debug, PartialEq)]
pub struct OutlineItem {
    pub title: String,
    pub destination: Option<Destination>,
    pub children: Vec<OutlineItem>,
}

impl OutlineItem {
    pub fn new(title: impl Into<String>, destination: Option<Destination>) -> Self {
        Self {
            title: title.into(),
            destination,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<OutlineItem>) -> Self {
        self.children = children;
        self
    }
}

/// Where a followed link leads
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkTarget {
    /// `#page=N` or `#N`: a page number (1-based)
    Page(usize),
    /// `#name`: a named destination inside the document
    Named(String),
    /// Anything else leaves the document
    External(String),
}

impl LinkTarget {
    #[must_use]
    pub fn parse(url: &str) -> Self {
        let Some(fragment) = url.strip_prefix('#') else {
            return Self::External(url.to_string());
        };
        let number = fragment.strip_prefix("page=").unwrap_or(fragment);
        match number.parse::<usize>() {
            Ok(page) => Self::Page(page),
            Err(_) => Self::Named(fragment.to_string()),
        }
    }

    #[must_use]
    pub fn is_internal(&self) -> bool {
        !matches!(self, Self::External(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_wraps_in_both_directions() {
        let mut rotation = Rotation::Deg0;
        for _ in 0..4 {
            rotation = rotation.clockwise();
        }
        assert_eq!(rotation, Rotation::Deg0);
        assert_eq!(Rotation::Deg0.counter_clockwise(), Rotation::Deg270);
        assert_eq!(Rotation::Deg0.counter_clockwise().degrees(), 270);
    }

    #[test]
    fn rotation_normalises_negative_degrees() {
        assert_eq!(Rotation::from_degrees(-90), Rotation::Deg270);
        assert_eq!(Rotation::from_degrees(450), Rotation::Deg90);
        assert_eq!(Rotation::from_degrees(-360), Rotation::Deg0);
    }

    #[test]
    fn link_targets_parse_fragments() {
        assert_eq!(LinkTarget::parse("#page=4"), LinkTarget::Page(4));
        assert_eq!(LinkTarget::parse("#7"), LinkTarget::Page(7));
        assert_eq!(
            LinkTarget::parse("#chapter2"),
            LinkTarget::Named("chapter2".into())
        );
        let external = LinkTarget::parse("https://example.com/#page=2");
        assert!(!external.is_internal());
    }

    #[test]
    fn page_box_dimensions_ignore_orientation() {
        let b = PageBox::new(10.0, 20.0, 0.0, 0.0);
        assert_eq!(b.width(), 10.0);
        assert_eq!(b.height(), 20.0);
    }
}
