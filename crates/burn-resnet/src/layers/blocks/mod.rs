//! # Miscellaneous blocks.

pub mod conv_norm_act;
pub mod norm_act_conv;
