pub mod geometry {
    use glam::DVec2;
    use serde::{Deserialize, Serialize};

    /// 二维点，内部以 `glam::DVec2` 表示，坐标文件中的一对数值对应一个点。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point2(pub DVec2);

    impl Point2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_vec(vec: DVec2) -> Self {
            Self(vec)
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }
    }

    impl From<DVec2> for Point2 {
        fn from(value: DVec2) -> Self {
            Self::from_vec(value)
        }
    }

    /// 轴对齐边界框，供渲染层计算图形范围、适配视口。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Bounds2D {
        min: Point2,
        max: Point2,
    }

    impl Bounds2D {
        #[inline]
        pub fn new(min: Point2, max: Point2) -> Self {
            Self { min, max }
        }

        #[inline]
        pub fn empty() -> Self {
            Self {
                min: Point2::new(f64::INFINITY, f64::INFINITY),
                max: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
            }
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.min.x() > self.max.x() || self.min.y() > self.max.y()
        }

        #[inline]
        pub fn min(&self) -> Point2 {
            self.min
        }

        #[inline]
        pub fn max(&self) -> Point2 {
            self.max
        }

        pub fn include_point(&mut self, point: Point2) {
            if self.is_empty() {
                self.min = point;
                self.max = point;
                return;
            }
            let min_vec = self.min.as_vec2().min(point.as_vec2());
            let max_vec = self.max.as_vec2().max(point.as_vec2());
            self.min = Point2::from_vec(min_vec);
            self.max = Point2::from_vec(max_vec);
        }

        pub fn include_bounds(&mut self, other: &Bounds2D) {
            if other.is_empty() {
                return;
            }
            self.include_point(other.min);
            self.include_point(other.max);
        }

        #[inline]
        pub fn center(&self) -> Point2 {
            debug_assert!(!self.is_empty());
            let center = (self.min.as_vec2() + self.max.as_vec2()) * 0.5;
            Point2::from_vec(center)
        }
    }
}

pub mod shape {
    use std::fmt;

    use serde::{Deserialize, Serialize};
    use thiserror::Error;

    use crate::geometry::{Bounds2D, Point2};

    #[derive(Debug, Clone, PartialEq, Eq, Error)]
    pub enum CoordinatesError {
        #[error("expected an even number of at least two coordinates, found {count}")]
        Uneven { count: usize },
        #[error("coordinate #{position} is not a finite number")]
        NonFinite { position: usize },
    }

    /// 一条记录解析出的坐标序列：长度为偶数且不小于 2，所有值均为有限数。
    ///
    /// 不满足条件的序列无法构造，解析阶段即被拒绝。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
    pub struct Coordinates(Vec<f64>);

    impl Coordinates {
        #[inline]
        pub fn as_slice(&self) -> &[f64] {
            &self.0
        }

        #[inline]
        pub fn len(&self) -> usize {
            self.0.len()
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.0.is_empty()
        }

        /// 按 `(c0, c1), (c2, c3), …` 的顺序成对读取。
        pub fn points(&self) -> impl Iterator<Item = Point2> + '_ {
            self.0
                .chunks_exact(2)
                .map(|pair| Point2::new(pair[0], pair[1]))
        }

        #[inline]
        pub fn into_vec(self) -> Vec<f64> {
            self.0
        }

        /// 由点序列展开，同样经过长度与有限值检查。
        pub fn from_points(
            points: impl IntoIterator<Item = Point2>,
        ) -> Result<Self, CoordinatesError> {
            let values: Vec<f64> = points
                .into_iter()
                .flat_map(|point| [point.x(), point.y()])
                .collect();
            Self::try_from(values)
        }
    }

    impl TryFrom<Vec<f64>> for Coordinates {
        type Error = CoordinatesError;

        fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
            let count = values.len();
            if count < 2 || count % 2 != 0 {
                return Err(CoordinatesError::Uneven { count });
            }
            if let Some(position) = values.iter().position(|value| !value.is_finite()) {
                return Err(CoordinatesError::NonFinite {
                    position: position + 1,
                });
            }
            Ok(Self(values))
        }
    }

    impl From<Coordinates> for Vec<f64> {
        fn from(value: Coordinates) -> Self {
            value.0
        }
    }

    /// 图形种类，渲染层据此选择绘制的图元。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub enum ShapeKind {
        Point,
        Segment,
        Polygon,
    }

    impl ShapeKind {
        pub fn describe(&self) -> &'static str {
            match self {
                ShapeKind::Point => "point",
                ShapeKind::Segment => "segment",
                ShapeKind::Polygon => "polygon",
            }
        }
    }

    impl fmt::Display for ShapeKind {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.describe())
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Segment {
        pub start: Point2,
        pub end: Point2,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Error)]
    pub enum PolygonError {
        #[error("a polygon needs at least three vertices, found {count}")]
        TooFewVertices { count: usize },
    }

    /// 多边形，顶点按文件中的顺序保存，至少三个顶点。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(try_from = "Vec<Point2>", into = "Vec<Point2>")]
    pub struct Polygon {
        vertices: Vec<Point2>,
    }

    impl Polygon {
        /// 顶点不足三个时返回 `None`。
        pub fn new(vertices: Vec<Point2>) -> Option<Self> {
            if vertices.len() < 3 {
                None
            } else {
                Some(Self { vertices })
            }
        }

        #[inline]
        pub fn vertices(&self) -> &[Point2] {
            &self.vertices
        }
    }

    impl TryFrom<Vec<Point2>> for Polygon {
        type Error = PolygonError;

        fn try_from(vertices: Vec<Point2>) -> Result<Self, Self::Error> {
            let count = vertices.len();
            Self::new(vertices).ok_or(PolygonError::TooFewVertices { count })
        }
    }

    impl From<Polygon> for Vec<Point2> {
        fn from(value: Polygon) -> Self {
            value.vertices
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub enum Shape {
        Point(Point2),
        Segment(Segment),
        Polygon(Polygon),
    }

    impl Shape {
        /// 仅依据坐标数量分类：2 个为点，4 个为线段，其余（偶数且 ≥ 6）为多边形。
        pub fn classify(coordinates: &Coordinates) -> Self {
            match *coordinates.as_slice() {
                [x, y] => Shape::Point(Point2::new(x, y)),
                [x1, y1, x2, y2] => Shape::Segment(Segment {
                    start: Point2::new(x1, y1),
                    end: Point2::new(x2, y2),
                }),
                _ => Shape::Polygon(Polygon {
                    vertices: coordinates.points().collect(),
                }),
            }
        }

        #[inline]
        pub fn kind(&self) -> ShapeKind {
            match self {
                Shape::Point(_) => ShapeKind::Point,
                Shape::Segment(_) => ShapeKind::Segment,
                Shape::Polygon(_) => ShapeKind::Polygon,
            }
        }

        /// 按原始顺序返回图形的全部顶点。
        pub fn points(&self) -> Vec<Point2> {
            match self {
                Shape::Point(point) => vec![*point],
                Shape::Segment(segment) => vec![segment.start, segment.end],
                Shape::Polygon(polygon) => polygon.vertices.clone(),
            }
        }

        /// `classify` 的逆操作，还原为与输入顺序一致的坐标序列。
        ///
        /// 手工构造的图形可能含有非有限值，此时返回错误。
        pub fn flatten(&self) -> Result<Coordinates, CoordinatesError> {
            Coordinates::from_points(self.points())
        }

        pub fn bounds(&self) -> Bounds2D {
            let mut bounds = Bounds2D::empty();
            for point in self.points() {
                bounds.include_point(point);
            }
            bounds
        }
    }

    impl From<&Coordinates> for Shape {
        fn from(value: &Coordinates) -> Self {
            Shape::classify(value)
        }
    }

}

pub mod registry {
    use std::fmt;
    use std::num::ParseIntError;
    use std::str::FromStr;

    use serde::{Deserialize, Serialize};

    use crate::geometry::Bounds2D;
    use crate::shape::Shape;

    /// 图形句柄，由注册表单调递增分配，删除后不会复用。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    pub struct ShapeHandle(u64);

    impl ShapeHandle {
        #[inline]
        pub fn new(raw: u64) -> Self {
            Self(raw)
        }

        /// 提供原始数值，便于日志输出或命令行引用。
        #[inline]
        pub fn get(self) -> u64 {
            self.0
        }
    }

    impl fmt::Display for ShapeHandle {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "#{}", self.0)
        }
    }

    /// 同时接受 `3` 与 `#3` 两种写法。
    impl FromStr for ShapeHandle {
        type Err = ParseIntError;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            let raw = s.strip_prefix('#').unwrap_or(s);
            raw.parse::<u64>().map(ShapeHandle)
        }
    }

    /// 当前图形集合，按插入顺序保存。句柄只能由 `insert` 分配。
    #[derive(Debug, Default, Clone)]
    pub struct ShapeRegistry {
        shapes: Vec<(ShapeHandle, Shape)>,
        next_handle: u64,
    }

    impl ShapeRegistry {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert(&mut self, shape: Shape) -> ShapeHandle {
            let handle = self.next_handle();
            self.shapes.push((handle, shape));
            handle
        }

        #[inline]
        pub fn get(&self, handle: ShapeHandle) -> Option<&Shape> {
            self.shapes.iter().find_map(|(candidate, shape)| {
                if *candidate == handle {
                    Some(shape)
                } else {
                    None
                }
            })
        }

        #[inline]
        pub fn contains(&self, handle: ShapeHandle) -> bool {
            self.get(handle).is_some()
        }

        /// 删除指定图形；句柄不存在时不做任何事，返回 `None`。
        pub fn remove(&mut self, handle: ShapeHandle) -> Option<Shape> {
            let index = self
                .shapes
                .iter()
                .position(|(candidate, _)| *candidate == handle)?;
            Some(self.shapes.remove(index).1)
        }

        #[inline]
        pub fn shapes(&self) -> impl Iterator<Item = &(ShapeHandle, Shape)> {
            self.shapes.iter()
        }

        #[inline]
        pub fn handles(&self) -> impl Iterator<Item = ShapeHandle> + '_ {
            self.shapes.iter().map(|(handle, _)| *handle)
        }

        #[inline]
        pub fn len(&self) -> usize {
            self.shapes.len()
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.shapes.is_empty()
        }

        /// 清空图形集合。句柄计数器不回退，旧句柄不会指向新图形。
        pub fn clear(&mut self) {
            self.shapes.clear();
        }

        pub fn bounds(&self) -> Option<Bounds2D> {
            if self.shapes.is_empty() {
                return None;
            }
            let mut bounds = Bounds2D::empty();
            for (_, shape) in &self.shapes {
                bounds.include_bounds(&shape.bounds());
            }
            Some(bounds)
        }

        #[inline]
        fn next_handle(&mut self) -> ShapeHandle {
            let handle = self.next_handle;
            self.next_handle += 1;
            ShapeHandle(handle)
        }
    }

}
