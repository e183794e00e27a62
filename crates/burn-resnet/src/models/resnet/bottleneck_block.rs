//! # Bottleneck Block for `ResNet`
//!
//! [`BottleneckBlock`] is the 1x1/3x3/1x1 pre-activation residual unit used
//! by the deeper variants (ResNet-50/101/152). The 1x1 convolutions reduce
//! and then restore channel depth around the 3x3 convolution; the final unit
//! emits ``planes * 4`` channels.
//!
//! [`BottleneckBlockMeta`] defines a common meta API for [`BottleneckBlock`]
//! and [`BottleneckBlockConfig`].
//!
//! [`BottleneckBlockConfig`] implements [`Config`], and provides
//! [`BottleneckBlockConfig::init`] to initialize a [`BottleneckBlock`].
//!
//! [`BottleneckBlock`] implements [`Module`], and provides
//! [`BottleneckBlock::forward`].

use crate::layers::blocks::norm_act_conv::{
    NormActConv2d, NormActConv2dConfig, NormActConv2dMeta,
};
use crate::models::resnet::shortcut::{Shortcut, ShortcutConfig};
use crate::models::resnet::util::{
    CONV_INTO_RELU_INITIALIZER, scalar_to_array, stride_div_output_resolution,
};
use burn::nn::PaddingConfig2d;
use burn::nn::conv::Conv2dConfig;
use burn::prelude::{Backend, Config, Module, Tensor};

/// Channel expansion factor of bottleneck blocks.
pub const BOTTLENECK_EXPANSION: usize = 4;

/// [`BottleneckBlock`] Meta trait.
pub trait BottleneckBlockMeta {
    /// The size of the in channels dimension.
    fn in_planes(&self) -> usize;

    /// The filter count of the narrow conv layers.
    fn planes(&self) -> usize;

    /// The size of the out channels dimension.
    ///
    /// ``out_planes = planes * BOTTLENECK_EXPANSION``
    fn out_planes(&self) -> usize {
        self.planes() * BOTTLENECK_EXPANSION
    }

    /// The stride of the first convolution.
    ///
    /// Affects shortcut behavior.
    fn stride(&self) -> usize;

    /// Get the output resolution for a given input resolution.
    ///
    /// The input must be a multiple of the stride.
    ///
    /// # Arguments
    ///
    /// - `input_resolution`: \
    ///   ``[in_height=out_height*stride, in_width=out_width*stride]``.
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

/// [`BottleneckBlock`] Config.
///
/// Implements [`BottleneckBlockMeta`].
#[derive(Config, Debug)]
pub struct BottleneckBlockConfig {
    /// The size of the in channels dimension.
    pub in_planes: usize,

    /// The filter count of the narrow conv layers.
    pub planes: usize,

    /// The stride of the first convolution.
    #[config(default = 1)]
    pub stride: usize,
}

impl BottleneckBlockMeta for BottleneckBlockConfig {
    fn in_planes(&self) -> usize {
        self.in_planes
    }

    fn planes(&self) -> usize {
        self.planes
    }

    fn stride(&self) -> usize {
        self.stride
    }
}

impl BottleneckBlockConfig {
    /// Initialize a [`BottleneckBlock`].
    pub fn init<B: Backend>(
        self,
        device: &B::Device,
    ) -> BottleneckBlock<B> {
        let in_planes = self.in_planes();
        let planes = self.planes();
        let out_planes = self.out_planes();
        let stride = self.stride();

        let nac1: NormActConv2dConfig = Conv2dConfig::new([in_planes, planes], scalar_to_array(1))
            .with_stride(scalar_to_array(stride))
            .with_initializer(CONV_INTO_RELU_INITIALIZER.clone())
            .into();

        let nac2: NormActConv2dConfig = Conv2dConfig::new([planes, planes], scalar_to_array(3))
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .with_initializer(CONV_INTO_RELU_INITIALIZER.clone())
            .into();

        let nac3: NormActConv2dConfig = Conv2dConfig::new([planes, out_planes], scalar_to_array(1))
            .with_initializer(CONV_INTO_RELU_INITIALIZER.clone())
            .into();

        BottleneckBlock {
            nac1: nac1.init(device),
            nac2: nac2.init(device),
            nac3: nac3.init(device),

            shortcut: ShortcutConfig::new(in_planes, out_planes)
                .with_stride(stride)
                .init(device),
        }
    }
}

/// Bottleneck Block for `ResNet`.
///
/// Implements [`BottleneckBlockMeta`].
#[derive(Module, Debug)]
pub struct BottleneckBlock<B: Backend> {
    /// Reducing 1x1 Norm/Act/Conv block; carries the stride.
    pub nac1: NormActConv2d<B>,

    /// Inner 3x3 Norm/Act/Conv block.
    pub nac2: NormActConv2d<B>,

    /// Restoring 1x1 Norm/Act/Conv block.
    pub nac3: NormActConv2d<B>,

    /// Shortcut merge for the residual connection.
    pub shortcut: Shortcut<B>,
}

impl<B: Backend> BottleneckBlockMeta for BottleneckBlock<B> {
    fn in_planes(&self) -> usize {
        self.nac1.in_channels()
    }

    fn planes(&self) -> usize {
        self.nac1.out_channels()
    }

    fn out_planes(&self) -> usize {
        self.nac3.out_channels()
    }

    fn stride(&self) -> usize {
        self.nac1.stride()[0]
    }
}

impl<B: Backend> BottleneckBlock<B> {
    /// Forward Pass.
    ///
    /// # Arguments
    ///
    /// - `input`: ``[batch, in_planes, in_height=out_height*stride, in_width=out_width*stride]``.
    ///
    /// # Returns
    ///
    /// A ``[batch, out_planes=planes*4, out_height, out_width]`` tensor.
    pub fn forward(
        &self,
        input: Tensor<B, 4>,
    ) -> Tensor<B, 4> {
        #[cfg(debug_assertions)]
        bimm_contracts::assert_shape_contract_periodically!(
            [
                "batch",
                "in_planes",
                "in_height" = "out_height" * "stride",
                "in_width" = "out_width" * "stride"
            ],
            &input,
            &[("in_planes", self.in_planes()), ("stride", self.stride())],
        );

        let x = self.nac1.forward(input.clone());
        let x = self.nac2.forward(x);
        let residual = self.nac3.forward(x);

        self.shortcut.forward(input, residual)
    }
}
