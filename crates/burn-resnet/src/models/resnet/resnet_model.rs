//! # `ResNet` Core Model
//!
//! [`ResNetConfig`] is the parametric architecture builder: given an input
//! shape, an output count, a [`BlockKind`], per-stage repetition counts, and
//! a [`ClassifierMode`], it assembles the stem, the residual stages, and the
//! classifier head.
//!
//! [`ResNetConfig`] implements [`Config`], and provides
//! [`ResNetConfig::init`] to initialize a [`ResNet`].
//!
//! [`ResNet`] implements [`Module`], and provides [`ResNet::forward`].
//!
//! The named variant constructors live in
//! [`crate::models::resnet::prefabs`].

use crate::layers::blocks::conv_norm_act::{
    ConvNormAct2d, ConvNormAct2dConfig, ConvNormAct2dMeta,
};
use crate::models::resnet::head::{ClassifierHead, ClassifierHeadConfig, ClassifierMode};
use crate::models::resnet::residual_block::BlockKind;
use crate::models::resnet::stage::{Stage, StageConfig, StageMeta};
use crate::models::resnet::util::{
    CONV_INTO_RELU_INITIALIZER, stride_div_output_resolution,
};
use bimm_contracts::unpack_shape_contract;
use burn::module::Module;
use burn::nn::PaddingConfig2d;
use burn::nn::conv::Conv2dConfig;
use burn::nn::pool::{
    AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig,
};
use burn::prelude::{Backend, Config, Tensor};

/// `ResNet` model configuration.
///
/// Mirrors the classic builder signature: input shape, output count,
/// block function, and per-stage repetition counts. At each stage the
/// filter count doubles and the spatial resolution halves.
#[derive(Config, Debug)]
pub struct ResNetConfig {
    /// The input shape, as ``[channels, height, width]``.
    pub input_shape: [usize; 3],

    /// The number of outputs of the classifier head.
    pub num_outputs: usize,

    /// Per-stage residual block repetition counts.
    pub repetitions: Vec<usize>,

    /// The residual block function.
    #[config(default = "BlockKind::Basic")]
    pub block: BlockKind,

    /// The classifier head mode.
    #[config(default = "ClassifierMode::Categorical")]
    pub mode: ClassifierMode,

    /// The filter count of the stem convolution, and of the first stage.
    #[config(default = "64")]
    pub stem_planes: usize,
}

impl ResNetConfig {
    /// The number of residual stages.
    pub fn num_stages(&self) -> usize {
        self.repetitions.len()
    }

    /// The feature width entering the classifier head.
    ///
    /// ``stem_planes * 2^(num_stages - 1) * expansion``
    pub fn feature_planes(&self) -> usize {
        self.stem_planes * (1 << (self.num_stages() - 1)) * self.block.expansion_factor()
    }

    /// The total downsampling stride of the stem plus stages.
    ///
    /// The stem conv and max-pool each halve the resolution; every stage
    /// after the first halves it again.
    pub fn total_stride(&self) -> usize {
        4 * (1 << (self.num_stages() - 1))
    }

    /// Get the pre-pooling output resolution for a given input resolution.
    ///
    /// The input must be a multiple of [`Self::total_stride`].
    ///
    /// # Panics
    ///
    /// If the input resolution is not a multiple of the total stride.
    pub fn output_resolution(
        &self,
        input_resolution: [usize; 2],
    ) -> [usize; 2] {
        stride_div_output_resolution(input_resolution, self.total_stride())
    }

    /// Check if the config is valid.
    ///
    /// # Returns
    ///
    /// A `Result<(), String>`
    pub fn try_validate(&self) -> Result<(), String> {
        let [_channels, height, width] = self.input_shape;
        if height == 0 || width == 0 {
            return Err(format!(
                "input resolution must be positive, got [{height}, {width}]",
            ));
        }

        if self.repetitions.is_empty() {
            return Err("repetitions is empty".to_string());
        }

        self.head_config().try_validate()
    }

    /// Panic if `try_validate` returns an error.
    pub fn expect_valid(&self) {
        match self.try_validate() {
            Ok(_) => (),
            Err(err) => panic!("{}", err),
        }
    }

    /// Build the per-stage [`StageConfig`]s.
    ///
    /// Stage 0 runs at stride 1 (the stem max-pool has already
    /// downsampled); each later stage opens with a stride-2 block and
    /// doubles the filter count.
    pub fn stage_configs(&self) -> Vec<StageConfig> {
        let mut stages = Vec::with_capacity(self.repetitions.len());

        let mut in_planes = self.stem_planes;
        let mut planes = self.stem_planes;
        for (idx, &num_blocks) in self.repetitions.iter().enumerate() {
            let stride = if idx == 0 { 1 } else { 2 };
            let stage =
                StageConfig::build(num_blocks, in_planes, planes, stride, self.block.clone());
            in_planes = stage.out_planes();
            stages.push(stage);
            planes *= 2;
        }

        stages
    }

    fn head_config(&self) -> ClassifierHeadConfig {
        ClassifierHeadConfig::new(self.feature_planes(), self.num_outputs)
            .with_mode(self.mode.clone())
    }

    /// Initialize a [`ResNet`] model.
    pub fn init<B: Backend>(
        self,
        device: &B::Device,
    ) -> ResNet<B> {
        self.expect_valid();

        let [in_channels, _height, _width] = self.input_shape;

        // 7x7 conv, stem_planes, /2
        let stem: ConvNormAct2dConfig = Conv2dConfig::new([in_channels, self.stem_planes], [7, 7])
            .with_stride([2, 2])
            .with_padding(PaddingConfig2d::Explicit(3, 3))
            .with_bias(false)
            .with_initializer(CONV_INTO_RELU_INITIALIZER.clone())
            .into();

        // 3x3 maxpool, /2
        let maxpool = MaxPool2dConfig::new([3, 3])
            .with_strides([2, 2])
            .with_padding(PaddingConfig2d::Explicit(1, 1));

        let head = self.head_config();

        ResNet {
            stem: stem.init(device),
            maxpool: maxpool.init(),

            stages: self
                .stage_configs()
                .into_iter()
                .map(|stage| stage.init(device))
                .collect(),

            // Global pooling [B, features, H, W] -> [B, features, 1, 1]
            avgpool: AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            head: head.init(device),
        }
    }
}

/// `ResNet` model.
#[derive(Module, Debug)]
pub struct ResNet<B: Backend> {
    /// Stem Conv/Norm/Act block.
    pub stem: ConvNormAct2d<B>,

    /// Stem pooling.
    pub maxpool: MaxPool2d,

    /// Residual stages.
    pub stages: Vec<Stage<B>>,

    /// Global average pooling.
    pub avgpool: AdaptiveAvgPool2d,

    /// Classifier head.
    pub head: ClassifierHead<B>,
}

impl<B: Backend> ResNet<B> {
    /// The feature width entering the classifier head.
    pub fn feature_planes(&self) -> usize {
        self.stages[self.stages.len() - 1].out_planes()
    }

    /// The number of outputs of the classifier head.
    pub fn num_outputs(&self) -> usize {
        self.head.num_outputs()
    }

    /// `ResNet` forward pass.
    ///
    /// # Arguments
    ///
    /// - `input`: a ``[batch, channels, height, width]`` tensor.
    ///
    /// # Returns
    ///
    /// A ``[batch, num_outputs]`` tensor of probabilities.
    pub fn forward(
        &self,
        input: Tensor<B, 4>,
    ) -> Tensor<B, 2> {
        let [_batch] = unpack_shape_contract!(
            ["batch", "channels", "height", "width"],
            &input,
            &["batch"],
            &[("channels", self.stem.in_channels())],
        );

        // Stem
        let x = self.stem.forward(input);
        let x = self.maxpool.forward(x);

        // Residual stages
        let x = self.stages.iter().fold(x, |x, stage| stage.forward(x));

        // Head
        let x = self.avgpool.forward(x);
        // Reshape [B, C, 1, 1] -> [B, C]
        let x = x.flatten(1, 3);

        self.head.forward(x)
    }
}
