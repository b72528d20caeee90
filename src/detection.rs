use serde_derive::{Deserialize, Serialize};

/// Object category a detection may carry. Closed set: the external
/// detector filters everything else out before it reaches this crate.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ObjectClass {
    Ball,
    Player,
}

/// Axis-aligned bounding box in pixel coordinates, `(x1, y1)` top-left,
/// `(x2, y2)` bottom-right. Immutable once produced for a frame.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    #[serde(rename = "p")]
    pub confidence: f32,
    #[serde(rename = "c")]
    pub class: ObjectClass,
}

impl Detection {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32, confidence: f32, class: ObjectClass) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            confidence,
            class,
        }
    }

    #[inline(always)]
    pub fn cx(&self) -> f32 {
        (self.x1 + self.x2) / 2.
    }

    #[inline(always)]
    pub fn cy(&self) -> f32 {
        (self.y1 + self.y2) / 2.
    }

    #[inline(always)]
    pub fn w(&self) -> f32 {
        self.x2 - self.x1
    }

    #[inline(always)]
    pub fn h(&self) -> f32 {
        self.y2 - self.y1
    }

    #[inline(always)]
    pub fn area(&self) -> f32 {
        self.w() * self.h()
    }

    /// Intersection over union with `other`. 0 for disjoint or degenerate
    /// boxes, 1 for identical boxes, symmetric.
    pub fn iou(&self, other: &Detection) -> f32 {
        let i_xmin = self.x1.max(other.x1);
        let i_ymin = self.y1.max(other.y1);
        let i_xmax = self.x2.min(other.x2);
        let i_ymax = self.y2.min(other.y2);

        let inter = (i_xmax - i_xmin).max(0.) * (i_ymax - i_ymin).max(0.);
        if inter == 0. {
            return 0.;
        }

        let union = self.area() + other.area() - inter;
        if union > 0. {
            inter / union
        } else {
            0.
        }
    }
}
