//! # Named `ResNet` Variants
//!
//! The published per-stage repetition tables, and constructors binding them
//! to [`ResNetConfig`].

use crate::models::resnet::head::ClassifierMode;
use crate::models::resnet::residual_block::BlockKind;
use crate::models::resnet::resnet_model::ResNetConfig;

/// ResNet-18 per-stage repetitions.
pub const RESNET18_REPEATS: [usize; 4] = [2, 2, 2, 2];
/// ResNet-34 per-stage repetitions.
pub const RESNET34_REPEATS: [usize; 4] = [3, 4, 6, 3];
/// ResNet-50 per-stage repetitions.
pub const RESNET50_REPEATS: [usize; 4] = [3, 4, 6, 3];
/// ResNet-101 per-stage repetitions.
pub const RESNET101_REPEATS: [usize; 4] = [3, 4, 23, 3];
/// ResNet-152 per-stage repetitions.
pub const RESNET152_REPEATS: [usize; 4] = [3, 8, 36, 3];

impl ResNetConfig {
    /// ResNet-18: basic blocks, ``[2, 2, 2, 2]``.
    ///
    /// # Arguments
    ///
    /// - `input_shape`: ``[channels, height, width]``.
    /// - `num_outputs`: the number of classifier outputs.
    pub fn resnet18(
        input_shape: [usize; 3],
        num_outputs: usize,
    ) -> Self {
        Self::new(input_shape, num_outputs, RESNET18_REPEATS.to_vec())
    }

    /// ResNet-34: basic blocks, ``[3, 4, 6, 3]``.
    pub fn resnet34(
        input_shape: [usize; 3],
        num_outputs: usize,
    ) -> Self {
        Self::new(input_shape, num_outputs, RESNET34_REPEATS.to_vec())
    }

    /// ResNet-34 with a single sigmoid output.
    pub fn resnet34_binary(input_shape: [usize; 3]) -> Self {
        Self::new(input_shape, 1, RESNET34_REPEATS.to_vec()).with_mode(ClassifierMode::Binary)
    }

    /// ResNet-50: bottleneck blocks, ``[3, 4, 6, 3]``.
    pub fn resnet50(
        input_shape: [usize; 3],
        num_outputs: usize,
    ) -> Self {
        Self::new(input_shape, num_outputs, RESNET50_REPEATS.to_vec())
            .with_block(BlockKind::Bottleneck)
    }

    /// ResNet-101: bottleneck blocks, ``[3, 4, 23, 3]``.
    pub fn resnet101(
        input_shape: [usize; 3],
        num_outputs: usize,
    ) -> Self {
        Self::new(input_shape, num_outputs, RESNET101_REPEATS.to_vec())
            .with_block(BlockKind::Bottleneck)
    }

    /// ResNet-152: bottleneck blocks, ``[3, 8, 36, 3]``.
    pub fn resnet152(
        input_shape: [usize; 3],
        num_outputs: usize,
    ) -> Self {
        Self::new(input_shape, num_outputs, RESNET152_REPEATS.to_vec())
            .with_block(BlockKind::Bottleneck)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resnet::stage::StageMeta;

    /// Conv depth of a variant: stem + per-block convs + dense.
    fn conv_depth(config: &ResNetConfig) -> usize {
        let convs_per_block = match config.block {
            BlockKind::Basic => 2,
            BlockKind::Bottleneck => 3,
        };
        2 + convs_per_block * config.repetitions.iter().sum::<usize>()
    }

    #[test]
    fn test_variant_depths() {
        let shape = [3, 224, 224];

        assert_eq!(conv_depth(&ResNetConfig::resnet18(shape, 1000)), 18);
        assert_eq!(conv_depth(&ResNetConfig::resnet34(shape, 1000)), 34);
        assert_eq!(conv_depth(&ResNetConfig::resnet50(shape, 1000)), 50);
        assert_eq!(conv_depth(&ResNetConfig::resnet101(shape, 1000)), 101);
        assert_eq!(conv_depth(&ResNetConfig::resnet152(shape, 1000)), 152);
    }

    #[test]
    fn test_resnet18_structure() {
        let config = ResNetConfig::resnet18([3, 224, 224], 1000);
        assert_eq!(config.block, BlockKind::Basic);
        assert_eq!(config.repetitions, vec![2, 2, 2, 2]);
        assert_eq!(config.feature_planes(), 512);
        assert_eq!(config.output_resolution([224, 224]), [7, 7]);
        assert!(config.try_validate().is_ok());
    }

    #[test]
    fn test_resnet50_structure() {
        let config = ResNetConfig::resnet50([3, 224, 224], 1000);
        assert_eq!(config.block, BlockKind::Bottleneck);
        assert_eq!(config.feature_planes(), 2048);

        let stages = config.stage_configs();
        assert_eq!(
            stages.iter().map(|s| s.out_planes()).collect::<Vec<_>>(),
            vec![256, 512, 1024, 2048],
        );
        for stage in &stages {
            stage.expect_valid();
        }
    }

    #[test]
    fn test_resnet34_binary_structure() {
        let config = ResNetConfig::resnet34_binary([3, 224, 224]);
        assert_eq!(config.block, BlockKind::Basic);
        assert_eq!(config.mode, ClassifierMode::Binary);
        assert_eq!(config.num_outputs, 1);
        assert!(config.try_validate().is_ok());
    }

    #[test]
    fn test_deep_variant_stage_lengths() {
        let config = ResNetConfig::resnet152([3, 224, 224], 1000);
        let stages = config.stage_configs();
        assert_eq!(
            stages.iter().map(|s| s.len()).collect::<Vec<_>>(),
            vec![3, 8, 36, 3],
        );
    }
}
