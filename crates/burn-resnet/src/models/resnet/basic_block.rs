//! # Basic Block for `ResNet`
//!
//! [`BasicBlock`] is the 3x3 pre-activation residual unit used by the
//! shallower variants (ResNet-18/34).
//!
//! [`BasicBlockMeta`] defines a common meta API for [`BasicBlock`]
//! and [`BasicBlockConfig`].
//!
//! [`BasicBlockConfig`] implements [`Config`], and provides
//! [`BasicBlockConfig::init`] to initialize a [`BasicBlock`].
//!
//! [`BasicBlock`] implements [`Module`], and provides
//! [`BasicBlock::forward`].

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

/// [`BasicBlock`] Meta trait.
pub trait BasicBlockMeta {
    /// The size of the in channels dimension.
    fn in_planes(&self) -> usize;

    /// The filter count of the conv layers.
    fn planes(&self) -> usize;

    /// The size of the out channels dimension.
    ///
    /// Basic blocks do not expand: ``out_planes = planes``.
    fn out_planes(&self) -> usize {
        self.planes()
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

/// [`BasicBlock`] Config.
///
/// Implements [`BasicBlockMeta`].
#[derive(Config, Debug)]
pub struct BasicBlockConfig {
    /// The size of the in channels dimension.
    pub in_planes: usize,

    /// The filter count of the conv layers.
    pub planes: usize,

    /// The stride of the first convolution.
    #[config(default = 1)]
    pub stride: usize,
}

impl BasicBlockMeta for BasicBlockConfig {
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

impl BasicBlockConfig {
    /// Initialize a [`BasicBlock`].
    pub fn init<B: Backend>(
        self,
        device: &B::Device,
    ) -> BasicBlock<B> {
        let in_planes = self.in_planes();
        let planes = self.planes();
        let stride = self.stride();

        let nac1: NormActConv2dConfig = Conv2dConfig::new([in_planes, planes], scalar_to_array(3))
            .with_stride(scalar_to_array(stride))
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .with_initializer(CONV_INTO_RELU_INITIALIZER.clone())
            .into();

        let nac2: NormActConv2dConfig = Conv2dConfig::new([planes, planes], scalar_to_array(3))
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .with_initializer(CONV_INTO_RELU_INITIALIZER.clone())
            .into();

        BasicBlock {
            nac1: nac1.init(device),
            nac2: nac2.init(device),

            shortcut: ShortcutConfig::new(in_planes, planes)
                .with_stride(stride)
                .init(device),
        }
    }
}

/// Basic Block for `ResNet`.
///
/// Implements [`BasicBlockMeta`].
#[derive(Module, Debug)]
pub struct BasicBlock<B: Backend> {
    /// First Norm/Act/Conv block; carries the stride.
    pub nac1: NormActConv2d<B>,

    /// Second Norm/Act/Conv block.
    pub nac2: NormActConv2d<B>,

    /// Shortcut merge for the residual connection.
    pub shortcut: Shortcut<B>,
}

impl<B: Backend> BasicBlockMeta for BasicBlock<B> {
    fn in_planes(&self) -> usize {
        self.nac1.in_channels()
    }

    fn planes(&self) -> usize {
        self.nac1.out_channels()
    }

    fn stride(&self) -> usize {
        self.nac1.stride()[0]
    }
}

impl<B: Backend> BasicBlock<B> {
    /// Forward Pass.
    ///
    /// # Arguments
    ///
    /// - `input`: ``[batch, in_planes, in_height=out_height*stride, in_width=out_width*stride]``.
    ///
    /// # Returns
    ///
    /// A ``[batch, out_planes=planes, out_height, out_width]`` tensor.
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
        let residual = self.nac2.forward(x);

        self.shortcut.forward(input, residual)
    }
}
