//! # `ResNet`

pub mod basic_block;
pub mod bottleneck_block;
pub mod head;
pub mod prefabs;
pub mod residual_block;
pub mod resnet_model;
pub mod shortcut;
pub mod stage;
pub mod util;
