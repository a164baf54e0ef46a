use serde::Serialize;

/// A 2D axis-aligned bounding box in corner form.
///
/// `min` is the top-left corner `(x1, y1)` and `max` the bottom-right corner
/// `(x2, y2)` in image coordinates (Y grows downward). Serialises as the
/// flat array `[x1, y1, x2, y2]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(into = "[f32; 4]")]
pub struct Bbox {
    /// The top-left corner.
    pub min: glam::Vec2,
    /// The bottom-right corner.
    pub max: glam::Vec2,
}

impl Bbox {
    /// Creates a new bounding box from its two corners.
    ///
    /// # Example
    /// ```
    /// use glam::Vec2;
    /// use sightline_core::analysis::bbox::Bbox;
    /// let bbox = Bbox::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 5.0));
    /// assert_eq!(bbox.to_array(), [0.0, 0.0, 10.0, 5.0]);
    /// ```
    pub fn new(min: glam::Vec2, max: glam::Vec2) -> Self {
        Self { min, max }
    }

    /// Creates a bounding box from `[x1, y1, x2, y2]`.
    pub fn from_corners(corners: [f32; 4]) -> Self {
        let [x1, y1, x2, y2] = corners;
        Self::new(glam::Vec2::new(x1, y1), glam::Vec2::new(x2, y2))
    }

    /// Creates a new bounding box from a center point and size vector.
    ///
    /// This is the conversion applied to detector records, which describe a
    /// box as `(center_x, center_y, width, height)`.
    ///
    /// # Example
    /// ```
    /// use glam::Vec2;
    /// use sightline_core::analysis::bbox::Bbox;
    /// // Create a bbox centered at (100, 200) with size 50x80
    /// let bbox = Bbox::from_center_size(Vec2::new(100.0, 200.0), Vec2::new(50.0, 80.0));
    /// assert_eq!(bbox.min, Vec2::new(75.0, 160.0));
    /// assert_eq!(bbox.max, Vec2::new(125.0, 240.0));
    /// ```
    pub fn from_center_size(center: glam::Vec2, size: glam::Vec2) -> Self {
        let half_size = size / 2.0;
        Self {
            min: center - half_size,
            max: center + half_size,
        }
    }

    /// Returns the corners as `[x1, y1, x2, y2]`.
    pub fn to_array(&self) -> [f32; 4] {
        [self.min.x, self.min.y, self.max.x, self.max.y]
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// Calculates the area of the bounding box (width × height).
    ///
    /// Inverted boxes (max below min on an axis) report zero area.
    pub fn area(&self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    /// Calculates the center point of the bounding box.
    pub fn center(&self) -> glam::Vec2 {
        (self.min + self.max) / 2.0
    }

    /// Calculates the area of intersection between this bounding box and another.
    ///
    /// Boxes that only touch along an edge, or do not overlap at all,
    /// intersect with area 0.0.
    ///
    /// # Example
    /// ```
    /// use glam::Vec2;
    /// use sightline_core::analysis::bbox::Bbox;
    /// let bbox1 = Bbox::new(Vec2::new(0.0, 0.0), Vec2::new(4.0, 4.0));
    /// let bbox2 = Bbox::new(Vec2::new(2.0, 2.0), Vec2::new(6.0, 6.0));
    /// assert_eq!(bbox1.intersection(&bbox2), 4.0); // 2x2 intersection area
    /// ```
    pub fn intersection(&self, other: &Self) -> f32 {
        let min = self.min.max(other.min);
        let max = self.max.min(other.max);

        if max.x > min.x && max.y > min.y {
            (max.x - min.x) * (max.y - min.y)
        } else {
            0.
        }
    }

    /// Calculates the Intersection over Union (IoU) between this bounding box and another.
    ///
    /// # Formula
    /// IoU = Intersection Area / Union Area
    /// Union Area = Area1 + Area2 - Intersection Area
    ///
    /// A union of zero area (two degenerate boxes) yields 0.0 rather than NaN.
    ///
    /// # Example
    /// ```
    /// use glam::Vec2;
    /// use sightline_core::analysis::bbox::Bbox;
    /// let bbox1 = Bbox::new(Vec2::new(0.0, 0.0), Vec2::new(2.0, 2.0));
    /// let bbox2 = Bbox::new(Vec2::new(0.0, 0.0), Vec2::new(2.0, 2.0));
    /// assert_eq!(bbox1.iou(&bbox2), 1.0); // Identical boxes
    /// ```
    pub fn iou(&self, other: &Self) -> f32 {
        let intersection_area = self.intersection(other);
        let union_area = self.area() + other.area() - intersection_area;

        if union_area > 0.0 {
            intersection_area / union_area
        } else {
            0.0
        }
    }
}

impl From<Bbox> for [f32; 4] {
    fn from(bbox: Bbox) -> Self {
        bbox.to_array()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_area() {
        let bbox = Bbox::new(glam::Vec2::ZERO, glam::Vec2::new(2.0, 3.0));
        assert_eq!(bbox.area(), 6.0);

        // Test unit square
        let unit = Bbox::new(glam::Vec2::ZERO, glam::Vec2::ONE);
        assert_eq!(unit.area(), 1.0);

        // Test zero area (degenerate case)
        let line = Bbox::new(glam::Vec2::ZERO, glam::Vec2::new(5.0, 0.0));
        assert_eq!(line.area(), 0.0);

        // Inverted boxes never report negative area
        let inverted = Bbox::new(glam::Vec2::new(4.0, 4.0), glam::Vec2::new(2.0, 6.0));
        assert_eq!(inverted.area(), 0.0);
    }

    #[test]
    fn test_bbox_from_center_size() {
        // Test YOLO-style detection coordinates
        let yolo_detection =
            Bbox::from_center_size(glam::Vec2::new(320.0, 240.0), glam::Vec2::new(100.0, 200.0));
        assert_eq!(yolo_detection.min, glam::Vec2::new(270.0, 140.0));
        assert_eq!(yolo_detection.max, glam::Vec2::new(370.0, 340.0));
        assert_eq!(yolo_detection.area(), 20000.0);
        assert_eq!(yolo_detection.center(), glam::Vec2::new(320.0, 240.0));

        // Test with zero size (degenerate case)
        let point = Bbox::from_center_size(glam::Vec2::new(5.0, 7.0), glam::Vec2::ZERO);
        assert_eq!(point.min, point.max);
        assert_eq!(point.area(), 0.0);
    }

    #[test]
    fn test_bbox_intersection_area() {
        let a = Bbox::new(glam::Vec2::new(0.0, 0.0), glam::Vec2::new(4.0, 4.0));
        let b = Bbox::new(glam::Vec2::new(2.0, 2.0), glam::Vec2::new(6.0, 6.0));
        assert_eq!(a.intersection(&b), 4.0);
        assert_eq!(b.intersection(&a), 4.0);

        // Edge touching
        let left = Bbox::new(glam::Vec2::new(0.0, 0.0), glam::Vec2::new(2.0, 2.0));
        let right = Bbox::new(glam::Vec2::new(2.0, 0.0), glam::Vec2::new(4.0, 2.0));
        assert_eq!(left.intersection(&right), 0.0);
    }

    #[test]
    fn test_bbox_iou() {
        // Identical boxes (perfect overlap, IoU = 1.0)
        let bbox1 = Bbox::new(glam::Vec2::new(0.0, 0.0), glam::Vec2::new(4.0, 4.0));
        assert_eq!(bbox1.iou(&bbox1), 1.0);

        let odd = Bbox::new(glam::Vec2::new(13.5, 7.25), glam::Vec2::new(101.0, 58.75));
        assert!((odd.iou(&odd) - 1.0).abs() < 1e-6);

        // Non-overlapping boxes (IoU = 0.0)
        let bbox3 = Bbox::new(glam::Vec2::new(0.0, 0.0), glam::Vec2::new(2.0, 2.0));
        let bbox4 = Bbox::new(glam::Vec2::new(3.0, 3.0), glam::Vec2::new(5.0, 5.0));
        assert_eq!(bbox3.iou(&bbox4), 0.0);

        // bbox1: (0,0) to (4,4), area = 16
        // bbox2: (2,2) to (6,6), area = 16
        // intersection: 4, union: 28
        let bbox5 = Bbox::new(glam::Vec2::new(2.0, 2.0), glam::Vec2::new(6.0, 6.0));
        assert!((bbox1.iou(&bbox5) - 4.0 / 28.0).abs() < 1e-6);
        assert_eq!(bbox1.iou(&bbox5), bbox5.iou(&bbox1));

        // Zero area boxes (degenerate case, IoU = 0.0)
        let line1 = Bbox::new(glam::Vec2::new(0.0, 0.0), glam::Vec2::new(5.0, 0.0));
        let line2 = Bbox::new(glam::Vec2::new(2.0, 0.0), glam::Vec2::new(7.0, 0.0));
        assert_eq!(line1.iou(&line2), 0.0);
        assert_eq!(line1.iou(&line1), 0.0);
    }

    #[test]
    fn test_bbox_serializes_as_corner_array() {
        let bbox = Bbox::from_corners([1.0, 2.0, 3.5, 4.0]);
        let json = serde_json::to_string(&bbox).unwrap();
        assert_eq!(json, "[1.0,2.0,3.5,4.0]");
    }
}
