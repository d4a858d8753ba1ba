use crate::error::Error;
use num_traits::cast::ToPrimitive;
use ordered_float::NotNan;
use std::ops::{Add, Sub};

/// A 2-D position in image space.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Result<Self, Error> {
        Ok(Self {
            x: NotNan::new(x)
                .map_err(|e| Error::ConstructNotNan(e, x))?
                .into_inner(),
            y: NotNan::new(y)
                .map_err(|e| Error::ConstructNotNan(e, y))?
                .into_inner(),
        })
    }

    pub fn squared_distance(self, other: Self) -> f32 {
        let delta = other - self;
        delta.dot(delta)
    }

    #[inline]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Clamp each coordinate into `[min, max]` of the corresponding axis.
    pub fn clamp(self, min: Self, max: Self) -> Self {
        Self {
            x: self.x.clamp(min.x, max.x),
            y: self.y.clamp(min.y, max.y),
        }
    }

    /// The heatmap cell nearest to this point, clamped to a `height x width` grid.
    pub(crate) fn nearest_cell(
        self,
        output_stride: f32,
        height: usize,
        width: usize,
    ) -> Result<(usize, usize), Error> {
        let max_y = height.to_f32().ok_or(Error::ConvertToF32)? - 1.0;
        let max_x = width.to_f32().ok_or(Error::ConvertToF32)? - 1.0;
        let cell = Self {
            x: (self.x / output_stride).round(),
            y: (self.y / output_stride).round(),
        }
        .clamp(Self::default(), Self { x: max_x, y: max_y });
        Ok((
            cell.y.to_usize().ok_or(Error::ConvertToUSize)?,
            cell.x.to_usize().ok_or(Error::ConvertToUSize)?,
        ))
    }

    /// Image-space position of heatmap cell `(y, x)` displaced by `(dy, dx)`.
    pub(crate) fn from_cell(
        y: usize,
        x: usize,
        output_stride: f32,
        dy: f32,
        dx: f32,
    ) -> Result<Self, Error> {
        Self::new(
            x.to_f32().ok_or(Error::ConvertToF32)? * output_stride + dx,
            y.to_f32().ok_or(Error::ConvertToF32)? * output_stride + dy,
        )
    }

    #[inline]
    pub fn x(self) -> f32 {
        self.x
    }

    #[inline]
    pub fn y(self) -> f32 {
        self.y
    }
}

impl Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::Output {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::Output {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}
