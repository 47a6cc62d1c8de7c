pub mod geometry;
pub mod sampler;

use serde::{Deserialize, Serialize};

pub use geometry::PixelGeometry;
pub use sampler::{roi_footprint, sample_roi};

/// Role an ROI plays in a FRAP experiment.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RoiKind {
    Background,
    Reference,
    Stimulation,
    /// Any other ROI type recorded by the acquisition software.
    Other(String),
}

impl From<String> for RoiKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "background" => Self::Background,
            "reference" => Self::Reference,
            "stimulation" => Self::Stimulation,
            _ => Self::Other(s),
        }
    }
}

impl From<RoiKind> for String {
    fn from(kind: RoiKind) -> Self {
        kind.to_string()
    }
}

impl std::fmt::Display for RoiKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Background => write!(f, "background"),
            Self::Reference => write!(f, "reference"),
            Self::Stimulation => write!(f, "stimulation"),
            Self::Other(s) => write!(f, "{s}"),
        }
    }
}

/// Outline of an ROI. Shapes other than circles and rectangles are kept so
/// that sampling can reject them explicitly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RoiShape {
    Circle,
    Rectangle,
    Unsupported(String),
}

impl From<String> for RoiShape {
    fn from(s: String) -> Self {
        match s.as_str() {
            "circle" => Self::Circle,
            "rectangle" => Self::Rectangle,
            _ => Self::Unsupported(s),
        }
    }
}

impl From<RoiShape> for String {
    fn from(shape: RoiShape) -> Self {
        shape.to_string()
    }
}

impl std::fmt::Display for RoiShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Circle => write!(f, "circle"),
            Self::Rectangle => write!(f, "rectangle"),
            Self::Unsupported(s) => write!(f, "{s}"),
        }
    }
}

/// A region of interest as stored in the experiment metadata.
///
/// `position` is the center in microns. For circles `size[0]` is the radius,
/// for rectangles `size` is `(width, height)`, also in microns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Roi {
    #[serde(rename = "type")]
    pub kind: RoiKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<RoiShape>,
    pub position: [f64; 2],
    #[serde(default)]
    pub size: [f64; 2],
}

impl Roi {
    pub fn circle(kind: RoiKind, center: [f64; 2], radius: f64) -> Self {
        Self {
            kind,
            shape: Some(RoiShape::Circle),
            position: center,
            size: [radius, radius],
        }
    }

    pub fn rectangle(kind: RoiKind, center: [f64; 2], width: f64, height: f64) -> Self {
        Self {
            kind,
            shape: Some(RoiShape::Rectangle),
            position: center,
            size: [width, height],
        }
    }
}

/// First ROI of the requested kind, if any.
pub fn find_roi<'a>(rois: &'a [Roi], kind: &RoiKind) -> Option<&'a Roi> {
    rois.iter().find(|roi| &roi.kind == kind)
}
