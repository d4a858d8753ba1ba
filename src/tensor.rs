use crate::error::Error;
use ndarray::{Array3, ArrayView3};
use std::path::Path;

/// A read-only `[height, width, channels]` view over a row-major `f32` buffer.
#[derive(Debug, Clone, Copy)]
pub struct Tensor3<'a> {
    view: ArrayView3<'a, f32>,
}

impl<'a> Tensor3<'a> {
    pub fn from_slice(
        data: &'a [f32],
        (height, width, channels): (usize, usize, usize),
    ) -> Result<Self, Error> {
        Ok(Self {
            view: ArrayView3::from_shape((height, width, channels), data)
                .map_err(Error::ConstructArrayView)?,
        })
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.view.dim().0
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.view.dim().1
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.view.dim().2
    }

    #[inline]
    pub fn dim(&self) -> (usize, usize, usize) {
        self.view.dim()
    }

    /// Value at `(y, x, channel)`.
    ///
    /// Out of range indices are a caller bug: they trip a debug assertion and
    /// panic in ndarray's indexing otherwise. Use [`Tensor3::checked_get`] when
    /// the indices come from untrusted input.
    #[inline]
    pub fn get(&self, y: usize, x: usize, channel: usize) -> f32 {
        debug_assert!(
            self.contains(y, x, channel),
            "index ({}, {}, {}) out of bounds for {:?}",
            y,
            x,
            channel,
            self.dim()
        );
        self.view[(y, x, channel)]
    }

    pub fn checked_get(&self, y: usize, x: usize, channel: usize) -> Result<f32, Error> {
        self.view
            .get((y, x, channel))
            .copied()
            .ok_or(Error::OutOfBounds {
                y,
                x,
                channel,
                shape: self.dim(),
            })
    }

    #[inline]
    fn contains(&self, y: usize, x: usize, channel: usize) -> bool {
        let (height, width, channels) = self.dim();
        y < height && x < width && channel < channels
    }

    pub(crate) fn view(&self) -> ArrayView3<'a, f32> {
        self.view
    }
}

/// An owned tensor as delivered by the inference backend.
#[derive(Debug, Clone)]
pub struct TensorBuf {
    array: Array3<f32>,
}

impl TensorBuf {
    pub fn from_vec(data: Vec<f32>, shape: (usize, usize, usize)) -> Result<Self, Error> {
        Ok(Self {
            array: Array3::from_shape_vec(shape, data).map_err(Error::ConstructArrayView)?,
        })
    }

    pub fn zeros(shape: (usize, usize, usize)) -> Self {
        Self {
            array: Array3::zeros(shape),
        }
    }

    /// Load a raw little-endian `f32` file.
    pub fn read<P>(path: P, shape: (usize, usize, usize)) -> Result<Self, Error>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| Error::ReadTensor(e, path.to_path_buf()))?;
        if bytes.len() % 4 != 0 {
            return Err(Error::TensorByteLength(path.to_path_buf(), bytes.len()));
        }
        let data = bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();
        Self::from_vec(data, shape)
    }

    /// Turn heatmap logits into probabilities.
    pub fn sigmoid(mut self) -> Self {
        self.array.mapv_inplace(sigmoid);
        self
    }

    pub fn as_tensor(&self) -> Tensor3<'_> {
        Tensor3 {
            view: self.array.view(),
        }
    }

    pub fn set(&mut self, (y, x, channel): (usize, usize, usize), value: f32) {
        self.array[(y, x, channel)] = value;
    }

    pub fn dim(&self) -> (usize, usize, usize) {
        self.array.dim()
    }
}

#[inline]
pub(crate) fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::{sigmoid, Tensor3, TensorBuf};
    use crate::error::Error;
    use assert_approx_eq::assert_approx_eq;
    use num_traits::cast::ToPrimitive;

    fn linear_tensor(height: usize, width: usize, channels: usize) -> Vec<f32> {
        (0..height * width * channels)
            .map(|i| i.to_f32().unwrap())
            .collect()
    }

    #[test]
    fn get_is_row_major() {
        const HEIGHT: usize = 3;
        const WIDTH: usize = 4;
        const CHANNELS: usize = 5;
        let data = linear_tensor(HEIGHT, WIDTH, CHANNELS);
        let tensor = Tensor3::from_slice(&data, (HEIGHT, WIDTH, CHANNELS)).unwrap();
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                for c in 0..CHANNELS {
                    let expected = ((y * WIDTH + x) * CHANNELS + c).to_f32().unwrap();
                    assert_eq!(tensor.get(y, x, c), expected);
                }
            }
        }
    }

    #[test]
    fn checked_get_reports_out_of_bounds() {
        let data = linear_tensor(2, 2, 2);
        let tensor = Tensor3::from_slice(&data, (2, 2, 2)).unwrap();
        assert_eq!(tensor.checked_get(1, 1, 1).unwrap(), 7.0);
        for (y, x, c) in [(2, 0, 0), (0, 2, 0), (0, 0, 2)].iter().copied() {
            match tensor.checked_get(y, x, c) {
                Err(Error::OutOfBounds { shape, .. }) => assert_eq!(shape, (2, 2, 2)),
                other => panic!("expected OutOfBounds, got {:?}", other),
            }
        }
    }

    #[test]
    #[should_panic]
    fn get_panics_out_of_bounds() {
        let data = linear_tensor(2, 2, 2);
        let tensor = Tensor3::from_slice(&data, (2, 2, 2)).unwrap();
        tensor.get(0, 0, 2);
    }

    #[test]
    fn buffer_length_must_match_shape() {
        let data = linear_tensor(2, 2, 2);
        assert!(matches!(
            Tensor3::from_slice(&data, (2, 2, 3)),
            Err(Error::ConstructArrayView(_))
        ));
        assert!(TensorBuf::from_vec(data, (3, 2, 2)).is_err());
    }

    #[test]
    fn sigmoid_values() {
        assert_approx_eq!(sigmoid(0.0), 0.5);
        assert_approx_eq!(sigmoid(20.0), 1.0);
        assert_approx_eq!(sigmoid(-5.0), 0.006692851);
    }

    #[test]
    fn read_little_endian_file() {
        let path = std::env::temp_dir().join(format!(
            "posenet-decode-tensor-{}.f32",
            std::process::id()
        ));
        let values = [0.25_f32, -1.5, 3.0, 0.0];
        let bytes = values
            .iter()
            .flat_map(|v| v.to_le_bytes().to_vec())
            .collect::<Vec<_>>();
        std::fs::write(&path, &bytes).unwrap();

        let tensor = TensorBuf::read(&path, (1, 2, 2)).unwrap();
        std::fs::remove_file(&path).unwrap();

        let view = tensor.as_tensor();
        assert_eq!(view.get(0, 0, 0), 0.25);
        assert_eq!(view.get(0, 0, 1), -1.5);
        assert_eq!(view.get(0, 1, 0), 3.0);
        assert_eq!(view.get(0, 1, 1), 0.0);
    }

    #[test]
    fn read_rejects_truncated_file() {
        let path = std::env::temp_dir().join(format!(
            "posenet-decode-truncated-{}.f32",
            std::process::id()
        ));
        std::fs::write(&path, [0_u8; 7]).unwrap();
        let result = TensorBuf::read(&path, (1, 1, 1));
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(Error::TensorByteLength(_, 7))));
    }
}
