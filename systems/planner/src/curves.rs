//! Response curves mapping normalised inputs in `[0, 1]` onto utilities in `[0, 1]`.

/// Shape of a [`ResponseCurve`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CurveShape {
    /// `x`
    Linear,
    /// `x²`
    Quadratic,
    /// `(e^{kx} − 1) / (e^k − 1)`; flat at first, then rising steeply.
    Exponential {
        /// Growth rate `k`.
        steepness: f32,
    },
    /// Logistic `1 / (1 + e^{−k(x − m)})`, rescaled so the endpoints map to 0 and 1.
    Logistic {
        /// Slope `k` at the midpoint.
        steepness: f32,
        /// Input `m` at which the unscaled curve crosses one half.
        midpoint: f32,
    },
}

/// Utility curve with an optional output inversion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResponseCurve {
    shape: CurveShape,
    inverted: bool,
}

impl ResponseCurve {
    /// Identity curve.
    #[must_use]
    pub const fn linear() -> Self {
        Self::new(CurveShape::Linear)
    }

    /// Squared curve.
    #[must_use]
    pub const fn quadratic() -> Self {
        Self::new(CurveShape::Quadratic)
    }

    /// Normalised exponential curve with the provided growth rate.
    #[must_use]
    pub const fn exponential(steepness: f32) -> Self {
        Self::new(CurveShape::Exponential { steepness })
    }

    /// Normalised logistic curve.
    #[must_use]
    pub const fn logistic(steepness: f32, midpoint: f32) -> Self {
        Self::new(CurveShape::Logistic {
            steepness,
            midpoint,
        })
    }

    const fn new(shape: CurveShape) -> Self {
        Self {
            shape,
            inverted: false,
        }
    }

    /// Same curve with its output mirrored to `1 − f(x)`.
    #[must_use]
    pub const fn inverted(self) -> Self {
        Self {
            shape: self.shape,
            inverted: !self.inverted,
        }
    }

    /// Shape of the curve.
    #[must_use]
    pub const fn shape(&self) -> CurveShape {
        self.shape
    }

    /// Evaluates the curve; inputs are clamped to `[0, 1]` and non-finite inputs read as zero.
    #[must_use]
    pub fn evaluate(&self, input: f32) -> f32 {
        let x = if input.is_finite() {
            input.clamp(0.0, 1.0)
        } else {
            0.0
        };

        let y = match self.shape {
            CurveShape::Linear => x,
            CurveShape::Quadratic => x * x,
            CurveShape::Exponential { steepness } => {
                if steepness.abs() <= f32::EPSILON {
                    x
                } else {
                    (steepness * x).exp_m1() / steepness.exp_m1()
                }
            }
            CurveShape::Logistic {
                steepness,
                midpoint,
            } => {
                let raw = |t: f32| 1.0 / (1.0 + (-steepness * (t - midpoint)).exp());
                let low = raw(0.0);
                let span = raw(1.0) - low;
                if span <= f32::EPSILON {
                    x
                } else {
                    (raw(x) - low) / span
                }
            }
        };

        let y = y.clamp(0.0, 1.0);
        if self.inverted {
            1.0 - y
        } else {
            y
        }
    }
}
