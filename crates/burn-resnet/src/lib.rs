#![warn(missing_docs)]
//!# burn-resnet - parametric ResNet builders for burn
//!
//! Assembles the classic `ResNet` family (18/34/50/101/152, plus a
//! binary-classifier variant) from ``burn`` layers. The residual units use the
//! full pre-activation scheme (norm/act/conv) of
//! [Identity Mappings in Deep Residual Networks](https://arxiv.org/abs/1603.05027);
//! the stem uses the conventional conv/norm/act ordering.
//!
//! ## Notable Components
//!
//! * [`layers`] - reusable building blocks.
//!   * [`layers::blocks::conv_norm_act`] - ``Conv2d + BatchNorm + Relu`` block.
//!   * [`layers::blocks::norm_act_conv`] - ``BatchNorm + Relu + Conv2d`` block.
//! * [`models`] - complete model families.
//!   * [`models::resnet`] - the `ResNet` builder, blocks, stages, and the
//!     named variant constructors in [`models::resnet::prefabs`].

pub mod layers;
pub mod models;
