//! # The `ResNet` Shortcut Implementation.
//!
//! A [`Shortcut`] merges a block's input with its residual branch by
//! elementwise sum. When the branch changes resolution or channel count,
//! the input is first passed through a strided 1x1 projection convolution;
//! otherwise the identity is used.

use crate::models::resnet::util::{
    CONV_INTO_RELU_INITIALIZER, stride_div_output_resolution,
};
use bimm_contracts::assert_shape_contract_periodically;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::{Initializer, PaddingConfig2d};
use burn::prelude::{Backend, Config, Module, Tensor};

/// [`Shortcut`] Meta trait.
pub trait ShortcutMeta {
    /// The size of the in channels dimension.
    fn in_planes(&self) -> usize;

    /// The size of the out channels dimension.
    fn out_planes(&self) -> usize;

    /// The stride of the shortcut.
    fn stride(&self) -> usize;

    /// Whether the shortcut projects (vs. passing the identity).
    ///
    /// A projection is needed iff the stride or the channel count changes.
    fn is_projection(&self) -> bool {
        self.stride() != 1 || self.in_planes() != self.out_planes()
    }

    /// Get the output resolution for a given input resolution.
    ///
    /// The input must be a multiple of the stride.
    ///
    /// # Arguments
    ///
    /// - `input_resolution`: ``[in_height=out_height*stride, in_width=out_width*stride]``.
    ///
    /// # Returns
    ///
    /// ``[out_height, out_width]``
    ///
    /// # Panics
    ///
    /// If the input resolution is not a multiple of the stride.
    fn output_resolution(
        &self,
        input_resolution: [usize; 2],
    ) -> [usize; 2] {
        stride_div_output_resolution(input_resolution, self.stride())
    }
}

/// [`Shortcut`] configuration.
///
/// Implements [`ShortcutMeta`].
#[derive(Config, Debug)]
pub struct ShortcutConfig {
    /// The size of the in channels dimension.
    in_planes: usize,

    /// The size of the out channels dimension.
    out_planes: usize,

    /// The stride of the shortcut.
    #[config(default = 1)]
    stride: usize,

    /// The projection conv initializer.
    #[config(default = "CONV_INTO_RELU_INITIALIZER.clone()")]
    pub initializer: Initializer,
}

impl ShortcutMeta for ShortcutConfig {
    fn in_planes(&self) -> usize {
        self.in_planes
    }

    fn out_planes(&self) -> usize {
        self.out_planes
    }

    fn stride(&self) -> usize {
        self.stride
    }
}

impl ShortcutConfig {
    /// Initialize a [`Shortcut`] `Module`.
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> Shortcut<B> {
        let projection = if self.is_projection() {
            // The projection carries a bias and no norm; the residual branch
            // norm precedes the sum in the pre-activation scheme.
            Conv2dConfig::new([self.in_planes, self.out_planes], [1, 1])
                .with_stride([self.stride, self.stride])
                .with_padding(PaddingConfig2d::Explicit(0, 0))
                .with_initializer(self.initializer.clone())
                .init(device)
                .into()
        } else {
            None
        };

        Shortcut { projection }
    }
}

/// `ResNet` shortcut merge layer.
///
/// Sums a (possibly projected) input with the residual branch:
/// both operands map to ``[batch, out_planes, out_height, out_width]``.
#[derive(Module, Debug)]
pub struct Shortcut<B: Backend> {
    /// Optional 1x1 projection conv.
    pub projection: Option<Conv2d<B>>,
}

impl<B: Backend> Shortcut<B> {
    /// Whether the shortcut projects (vs. passing the identity).
    pub fn is_projection(&self) -> bool {
        self.projection.is_some()
    }

    /// Forward pass.
    ///
    /// # Arguments
    ///
    /// - `input`: ``[batch, in_planes, in_height=out_height*stride, in_width=out_width*stride]``.
    /// - `residual`: ``[batch, out_planes, out_height, out_width]``.
    ///
    /// # Returns
    ///
    /// The ``shortcut(input) + residual`` sum,
    /// a ``[batch, out_planes, out_height, out_width]`` tensor.
    pub fn forward(
        &self,
        input: Tensor<B, 4>,
        residual: Tensor<B, 4>,
    ) -> Tensor<B, 4> {
        let shortcut = match &self.projection {
            Some(projection) => projection.forward(input),
            None => input,
        };

        let [batch, out_planes, out_height, out_width] = residual.dims();
        assert_shape_contract_periodically!(
            ["batch", "out_planes", "out_height", "out_width"],
            &shortcut,
            &[
                ("batch", batch),
                ("out_planes", out_planes),
                ("out_height", out_height),
                ("out_width", out_width)
            ]
        );

        shortcut + residual
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bimm_contracts::assert_shape_contract;
    use burn::backend::NdArray;

    #[test]
    fn test_shortcut_config() {
        let config = ShortcutConfig::new(16, 16);
        assert_eq!(config.in_planes(), 16);
        assert_eq!(config.out_planes(), 16);
        assert_eq!(config.stride(), 1);
        assert!(!config.is_projection());
        assert_eq!(config.output_resolution([8, 8]), [8, 8]);

        let config = config.with_stride(2);
        assert!(config.is_projection());
        assert_eq!(config.output_resolution([8, 8]), [4, 4]);

        let config = ShortcutConfig::new(16, 32);
        assert!(config.is_projection());
    }

    #[test]
    fn test_identity_shortcut_sums() {
        type B = NdArray<f32>;
        let device = Default::default();

        let shortcut: Shortcut<B> = ShortcutConfig::new(4, 4).init(&device);
        assert!(!shortcut.is_projection());

        let input = Tensor::ones([2, 4, 8, 8], &device);
        let residual = Tensor::ones([2, 4, 8, 8], &device);
        let out = shortcut.forward(input.clone(), residual);

        let expected = input.mul_scalar(2.0);
        out.to_data().assert_eq(&expected.to_data(), true);
    }

    #[test]
    fn test_projection_shortcut() {
        type B = NdArray<f32>;
        let device = Default::default();

        let batch_size = 2;
        let in_planes = 4;
        let out_planes = 8;

        let shortcut: Shortcut<B> = ShortcutConfig::new(in_planes, out_planes)
            .with_stride(2)
            .init(&device);
        assert!(shortcut.is_projection());

        let input = Tensor::ones([batch_size, in_planes, 8, 8], &device);
        let residual = Tensor::ones([batch_size, out_planes, 4, 4], &device);
        let out = shortcut.forward(input, residual);

        assert_shape_contract!(
            ["batch", "out_planes", "out_height", "out_width"],
            &out,
            &[
                ("batch", batch_size),
                ("out_planes", out_planes),
                ("out_height", 4),
                ("out_width", 4)
            ],
        );
    }
}
