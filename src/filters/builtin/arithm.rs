//! Arithmetic nodes: element-wise addition and normalization.

use crate::core::context::{ParameterSet, PortSet};
use crate::core::error::{ExecutionError, PortResult};
use crate::core::node::{Category, NodeMetadata, ProcessingNode, StatusCode};
use crate::core::types::PortValue;
use crate::imgproc::{abs, add, norm_inf, Depth, Mat};
use std::fmt;
use std::marker::PhantomData;

/// Port types that [`BinaryAdd`] can sum.
pub trait Summable: PortValue {
    /// Registry id of the `BinaryAdd` instantiation for this type.
    const NODE_ID: &'static str;
    /// Display name of that instantiation.
    const NODE_NAME: &'static str;

    /// `a + b`, or the error the node reports.
    fn sum(a: &Self, b: &Self) -> Result<Self, ExecutionError>;
}

impl Summable for Mat {
    const NODE_ID: &'static str = "add_image";
    const NODE_NAME: &'static str = "Add Images";

    /// Element-wise; 8-bit samples saturate.
    fn sum(a: &Self, b: &Self) -> Result<Self, ExecutionError> {
        add(a, b).map_err(|e| ExecutionError::unsupported(Self::NODE_ID, e))
    }
}

impl Summable for f64 {
    const NODE_ID: &'static str = "add_float";
    const NODE_NAME: &'static str = "Add Floats";

    fn sum(a: &Self, b: &Self) -> Result<Self, ExecutionError> {
        Ok(a + b)
    }
}

impl Summable for i64 {
    const NODE_ID: &'static str = "add_integer";
    const NODE_NAME: &'static str = "Add Integers";

    fn sum(a: &Self, b: &Self) -> Result<Self, ExecutionError> {
        a.checked_add(*b).ok_or_else(|| ExecutionError::NumericDegeneracy {
            node: Self::NODE_ID.to_string(),
            reason: format!("{} + {} overflows", a, b),
        })
    }
}

/// `out = a + b` for any [`Summable`] port type.
pub struct BinaryAdd<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> Default for BinaryAdd<T> {
    fn default() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Clone for BinaryAdd<T> {
    fn clone(&self) -> Self {
        Self::default()
    }
}

impl<T> fmt::Debug for BinaryAdd<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BinaryAdd<{}>", std::any::type_name::<T>())
    }
}

impl<T: Summable> ProcessingNode for BinaryAdd<T> {
    fn metadata() -> NodeMetadata {
        NodeMetadata::builder(T::NODE_ID, T::NODE_NAME)
            .description(format!("Add two {} values (a + b)", T::PORT_TYPE))
            .category(Category::Math)
            .tags(["add", "sum", "arithmetic"])
            .build()
    }

    fn declare_ports(
        _params: &ParameterSet,
        inputs: &mut PortSet,
        outputs: &mut PortSet,
    ) -> PortResult<()> {
        inputs.declare::<T>("a", "First operand")?;
        inputs.declare::<T>("b", "Second operand")?;
        outputs.declare::<T>("out", "Sum (a + b)")
    }

    fn process(
        &mut self,
        inputs: &PortSet,
        outputs: &mut PortSet,
    ) -> Result<StatusCode, ExecutionError> {
        let a = inputs.get::<T>("a")?;
        let b = inputs.get::<T>("b")?;
        outputs.set("out", T::sum(a, b)?)?;
        Ok(StatusCode::OK)
    }

    fn clone_box(&self) -> Box<dyn ProcessingNode> {
        Box::new(self.clone())
    }
}

/// `|input| / (0.5 * max|input|)`, giving a 32-bit float image in [0, 2].
///
/// An all-zero input has no scale and yields an all-zero output.
#[derive(Debug, Clone, Default)]
pub struct AbsNormalize;

impl ProcessingNode for AbsNormalize {
    fn metadata() -> NodeMetadata {
        NodeMetadata::builder("abs_normalized", "Abs Normalized")
            .description("Absolute value scaled by half the infinity norm")
            .category(Category::Adjust)
            .tags(["abs", "normalize", "norm"])
            .build()
    }

    fn declare_ports(
        _params: &ParameterSet,
        inputs: &mut PortSet,
        outputs: &mut PortSet,
    ) -> PortResult<()> {
        inputs.declare::<Mat>("input", "Image to normalize")?;
        outputs.declare::<Mat>("out", "Normalized image (f32)")
    }

    fn process(
        &mut self,
        inputs: &PortSet,
        outputs: &mut PortSet,
    ) -> Result<StatusCode, ExecutionError> {
        let input = inputs.get::<Mat>("input")?;
        if input.is_empty() {
            return Err(ExecutionError::unsupported("abs_normalized", "empty image"));
        }

        let norm = norm_inf(input);
        if !norm.is_finite() {
            return Err(ExecutionError::NumericDegeneracy {
                node: "abs_normalized".to_string(),
                reason: format!("infinity norm is {}", norm),
            });
        }

        let out = if norm == 0.0 {
            log::warn!("abs_normalized: input {} is all zeros, output left at zero", input);
            let (w, h) = input.dimensions();
            Mat::zeros(w, h, input.channels(), Depth::F32)
                .map_err(|e| ExecutionError::unsupported("abs_normalized", e))?
        } else {
            abs(input).convert_to(Depth::F32, 2.0 / norm, 0.0)
        };
        outputs.set("out", out)?;
        Ok(StatusCode::OK)
    }

    fn clone_box(&self) -> Box<dyn ProcessingNode> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::instance::NodeInstance;
    use crate::core::types::Value;
    use proptest::prelude::*;

    fn add_values<T: Summable>(a: Value, b: Value) -> Result<Value, ExecutionError> {
        let mut node = NodeInstance::of::<BinaryAdd<T>>().unwrap();
        node.configure().unwrap();
        node.bind_input("a", a).unwrap();
        node.bind_input("b", b).unwrap();
        node.execute()?;
        Ok(node.output("out").unwrap().clone())
    }

    fn normalize(input: Mat) -> Result<Mat, ExecutionError> {
        let mut node = NodeInstance::of::<AbsNormalize>().unwrap();
        node.configure().unwrap();
        node.bind_input("input", Value::Image(input)).unwrap();
        node.execute()?;
        Ok(node.output_as::<Mat>("out").unwrap().clone())
    }

    #[test]
    fn test_add_images_saturates() {
        let a = Mat::from_u8(2, 1, 1, vec![100, 200]).unwrap();
        let b = Mat::from_u8(2, 1, 1, vec![1, 100]).unwrap();
        let out = add_values::<Mat>(Value::Image(a), Value::Image(b)).unwrap();
        assert_eq!(out.as_image().unwrap().as_u8().unwrap(), &[101, 255]);
    }

    #[test]
    fn test_add_images_shape_mismatch() {
        let a = Mat::zeros(2, 2, 1, Depth::U8).unwrap();
        let b = Mat::zeros(2, 3, 1, Depth::U8).unwrap();
        assert!(matches!(
            add_values::<Mat>(Value::Image(a), Value::Image(b)),
            Err(ExecutionError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_add_integers_overflow() {
        assert_eq!(
            add_values::<i64>(Value::Integer(2), Value::Integer(40)),
            Ok(Value::Integer(42))
        );
        assert!(matches!(
            add_values::<i64>(Value::Integer(i64::MAX), Value::Integer(1)),
            Err(ExecutionError::NumericDegeneracy { .. })
        ));
    }

    #[test]
    fn test_add_rejects_wrong_input_type() {
        assert!(matches!(
            add_values::<f64>(Value::Integer(1), Value::Float(1.0)),
            Err(ExecutionError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_metadata_per_instantiation() {
        assert_eq!(BinaryAdd::<Mat>::metadata().id, "add_image");
        assert_eq!(BinaryAdd::<f64>::metadata().id, "add_float");
        assert_eq!(BinaryAdd::<i64>::metadata().id, "add_integer");
    }

    #[test]
    fn test_normalize_range() {
        let img = Mat::from_f32(3, 1, 1, vec![-4.0, 1.0, 2.0]).unwrap();
        let out = normalize(img).unwrap();
        assert_eq!(out.as_f32().unwrap(), &[2.0, 0.5, 1.0]);
    }

    #[test]
    fn test_normalize_zero_input() {
        let img = Mat::zeros(3, 2, 2, Depth::U8).unwrap();
        let out = normalize(img).unwrap();
        assert_eq!(out.shape(), (3, 2, 2));
        assert_eq!(out.depth(), Depth::F32);
        assert!(out.as_f32().unwrap().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_normalize_non_finite() {
        let img = Mat::from_f32(2, 1, 1, vec![1.0, f32::NAN]).unwrap();
        assert!(matches!(
            normalize(img),
            Err(ExecutionError::NumericDegeneracy { .. })
        ));
        let img = Mat::from_f32(2, 1, 1, vec![1.0, f32::INFINITY]).unwrap();
        assert!(matches!(
            normalize(img),
            Err(ExecutionError::NumericDegeneracy { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_add_float_matches_native(a in -1.0e300f64..1.0e300, b in -1.0e300f64..1.0e300) {
            let out = add_values::<f64>(Value::Float(a), Value::Float(b)).unwrap();
            let swapped = add_values::<f64>(Value::Float(b), Value::Float(a)).unwrap();
            let out = out.as_float().unwrap();
            prop_assert_eq!(out.to_bits(), (a + b).to_bits());
            prop_assert_eq!(swapped.as_float().unwrap().to_bits(), out.to_bits());
        }

        #[test]
        fn prop_add_image_commutes(a in prop::collection::vec(any::<u8>(), 6), b in prop::collection::vec(any::<u8>(), 6)) {
            let a = Mat::from_u8(3, 2, 1, a).unwrap();
            let b = Mat::from_u8(3, 2, 1, b).unwrap();
            let ab = add_values::<Mat>(Value::Image(a.clone()), Value::Image(b.clone())).unwrap();
            let ba = add_values::<Mat>(Value::Image(b), Value::Image(a)).unwrap();
            prop_assert_eq!(ab, ba);
        }

        #[test]
        fn prop_normalized_within_range(data in prop::collection::vec(-1.0e6f32..1.0e6, 8)) {
            let out = normalize(Mat::from_f32(4, 2, 1, data).unwrap()).unwrap();
            prop_assert!(out.as_f32().unwrap().iter().all(|&v| (0.0..=2.0).contains(&v)));
        }
    }
}
