//! Builds a named `ResNet` variant on the `NdArray` backend, prints the
//! stage geometry, and runs a single forward pass.

use burn::backend::NdArray;
use burn::prelude::Tensor;
use burn_resnet::models::resnet::resnet_model::{ResNet, ResNetConfig};
use burn_resnet::models::resnet::stage::StageMeta;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Named variant to build:
    /// resnet18, resnet34, resnet34-binary, resnet50, resnet101, resnet152.
    #[arg(long, default_value = "resnet18")]
    variant: String,

    /// Number of classifier outputs.
    #[arg(long, default_value_t = 1000)]
    num_outputs: usize,

    /// Input height and width.
    #[arg(long, default_value_t = 224)]
    resolution: usize,

    /// Batch size of the forward pass.
    #[arg(long, default_value_t = 1)]
    batch_size: usize,
}

fn main() {
    let args = Args::parse();

    let input_shape = [3, args.resolution, args.resolution];
    let config = match args.variant.as_str() {
        "resnet18" => ResNetConfig::resnet18(input_shape, args.num_outputs),
        "resnet34" => ResNetConfig::resnet34(input_shape, args.num_outputs),
        "resnet34-binary" => ResNetConfig::resnet34_binary(input_shape),
        "resnet50" => ResNetConfig::resnet50(input_shape, args.num_outputs),
        "resnet101" => ResNetConfig::resnet101(input_shape, args.num_outputs),
        "resnet152" => ResNetConfig::resnet152(input_shape, args.num_outputs),
        other => panic!("unknown variant: {other}"),
    };

    println!("variant: {}", args.variant);
    println!("input shape: {:?}", config.input_shape);
    println!("repetitions: {:?}", config.repetitions);
    println!("feature planes: {}", config.feature_planes());
    println!(
        "pre-pooling resolution: {:?}",
        config.output_resolution([args.resolution, args.resolution]),
    );

    for (idx, stage) in config.stage_configs().iter().enumerate() {
        println!(
            "stage {idx}: {} blocks, {} -> {} planes, /{}",
            stage.len(),
            stage.in_planes(),
            stage.out_planes(),
            stage.stride(),
        );
    }

    let device = Default::default();
    let model: ResNet<NdArray> = config.init(&device);

    let input = Tensor::ones([args.batch_size, 3, args.resolution, args.resolution], &device);
    let output = model.forward(input);
    println!("output shape: {:?}", output.dims());
}
