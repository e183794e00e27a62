//! # `NormActConv2d` - norm/act/conv block.
//!
//! A [`NormActConv2d`] module is a [`BatchNorm`] layer followed by a [`Relu`]
//! activation and a [`Conv2d`] layer.
//!
//! This is the full pre-activation ordering of
//! [Identity Mappings in Deep Residual Networks](https://arxiv.org/abs/1603.05027),
//! used by the `ResNet` residual units.

use bimm_contracts::{assert_shape_contract_periodically, unpack_shape_contract};
use burn::config::Config;
use burn::module::Module;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::{BatchNorm, BatchNormConfig, Relu};
use burn::prelude::{Backend, Tensor};

/// [`NormActConv2d`] Meta.
pub trait NormActConv2dMeta {
    /// Number of input channels.
    fn in_channels(&self) -> usize;

    /// Number of groups.
    fn groups(&self) -> usize;

    /// Number of output channels.
    fn out_channels(&self) -> usize;

    /// Get the stride.
    fn stride(&self) -> [usize; 2];
}

/// [`NormActConv2d`] Config.
#[derive(Config, Debug)]
pub struct NormActConv2dConfig {
    /// The [`Conv2d`] config.
    pub conv: Conv2dConfig,
}

impl From<Conv2dConfig> for NormActConv2dConfig {
    fn from(conv: Conv2dConfig) -> Self {
        Self { conv }
    }
}

impl NormActConv2dMeta for NormActConv2dConfig {
    fn in_channels(&self) -> usize {
        self.conv.channels[0]
    }

    fn groups(&self) -> usize {
        self.conv.groups
    }

    fn out_channels(&self) -> usize {
        self.conv.channels[1]
    }

    fn stride(&self) -> [usize; 2] {
        self.conv.stride
    }
}

impl NormActConv2dConfig {
    /// Initialize a [`NormActConv2d`].
    ///
    /// The norm layer features are matched to the conv *input* channels,
    /// since the norm is applied before the conv.
    pub fn init<B: Backend>(
        self,
        device: &B::Device,
    ) -> NormActConv2d<B> {
        NormActConv2d {
            norm: BatchNormConfig::new(self.conv.channels[0]).init(device),
            act: Relu::new(),
            conv: self.conv.init(device),
        }
    }
}

/// [`BatchNorm`] + [`Relu`] + [`Conv2d`] block.
///
/// Implements [`NormActConv2dMeta`].
#[derive(Module, Debug)]
pub struct NormActConv2d<B: Backend> {
    /// Internal Norm layer.
    pub norm: BatchNorm<B, 2>,

    /// Internal activation.
    pub act: Relu,

    /// Internal Conv2d layer.
    pub conv: Conv2d<B>,
}

impl<B: Backend> NormActConv2dMeta for NormActConv2d<B> {
    fn in_channels(&self) -> usize {
        self.conv.weight.shape().dims[1] * self.groups()
    }

    fn groups(&self) -> usize {
        self.conv.groups
    }

    fn out_channels(&self) -> usize {
        self.conv.weight.shape().dims[0]
    }

    fn stride(&self) -> [usize; 2] {
        self.conv.stride
    }
}

impl<B: Backend> NormActConv2d<B> {
    /// Forward Pass.
    ///
    /// # Arguments
    ///
    /// - `input`: ``[batch, in_channels, in_height, in_width]``.
    ///
    /// # Returns
    ///
    /// A ``[batch, out_channels, out_height, out_width]`` tensor.
    pub fn forward(
        &self,
        input: Tensor<B, 4>,
    ) -> Tensor<B, 4> {
        let [batch, out_height, out_width] = unpack_shape_contract!(
            [
                "batch",
                "in_channels",
                "in_height" = "out_height" * "height_stride",
                "in_width" = "out_width" * "width_stride"
            ],
            &input,
            &["batch", "out_height", "out_width"],
            &[
                ("in_channels", self.in_channels()),
                ("height_stride", self.stride()[0]),
                ("width_stride", self.stride()[1]),
            ]
        );

        let x = self.norm.forward(input);
        let x = self.act.forward(x);
        let x = self.conv.forward(x);

        assert_shape_contract_periodically!(
            ["batch", "out_channels", "out_height", "out_width"],
            &x,
            &[
                ("batch", batch),
                ("out_channels", self.out_channels()),
                ("out_height", out_height),
                ("out_width", out_width)
            ]
        );

        x
    }
}
