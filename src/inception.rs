use burn::config::Config;
use burn::module::Module;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::pool::{MaxPool2d, MaxPool2dConfig};
use burn::nn::{Linear, LinearConfig, PaddingConfig2d, Relu};
use burn::prelude::*;

/// Multi-branch feature-extraction block. Every branch preserves the spatial
/// dimensions, so the outputs concatenate along the channel axis.
#[derive(Module, Debug)]
pub struct InceptionBlock<B: Backend> {
    branch1: Conv2d<B>,

    // 1x1 reduction feeding the wider kernels; absent in the slim variant
    branch3_reduce: Option<Conv2d<B>>,
    branch3: Conv2d<B>,
    branch5: Option<(Conv2d<B>, Conv2d<B>)>,

    pool: MaxPool2d,
    pool_proj: Conv2d<B>,

    activation: Relu,
}

impl<B: Backend> InceptionBlock<B> {
    pub fn new(
        in_channels: usize,
        reduce_channels: Option<usize>,
        branch_channels: usize,
        with_5x5: bool,
        device: &B::Device,
    ) -> Self {
        let point = |input: usize, output: usize| {
            Conv2dConfig::new([input, output], [1, 1]).init(device)
        };

        let branch3_input = reduce_channels.unwrap_or(in_channels);
        let branch3 = Conv2dConfig::new([branch3_input, branch_channels], [3, 3])
            .with_padding(PaddingConfig2d::Same)
            .init(device);

        let branch5 = with_5x5.then(|| {
            let reduce = point(in_channels, branch3_input);
            let conv = Conv2dConfig::new([branch3_input, branch_channels], [5, 5])
                .with_padding(PaddingConfig2d::Same)
                .init(device);
            (reduce, conv)
        });

        Self {
            branch1: point(in_channels, branch_channels),
            branch3_reduce: reduce_channels.map(|channels| point(in_channels, channels)),
            branch3,
            branch5,
            pool: MaxPool2dConfig::new([3, 3])
                .with_strides([1, 1])
                .with_padding(PaddingConfig2d::Same)
                .init(),
            pool_proj: point(in_channels, branch_channels),
            activation: Relu::new(),
        }
    }

    /// Number of channels the concatenated output carries.
    pub fn out_channels(branch_channels: usize, with_5x5: bool) -> usize {
        branch_channels * if with_5x5 { 4 } else { 3 }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let direct = self.activation.forward(self.branch1.forward(x.clone()));

        let reduced = match &self.branch3_reduce {
            Some(reduce) => self.activation.forward(reduce.forward(x.clone())),
            None => x.clone(),
        };
        let wide = self.activation.forward(self.branch3.forward(reduced));

        let mut branches = vec![direct, wide];

        if let Some((reduce, conv)) = &self.branch5 {
            let reduced = self.activation.forward(reduce.forward(x.clone()));
            branches.push(self.activation.forward(conv.forward(reduced)));
        }

        let pooled = self.pool.forward(x);
        branches.push(self.activation.forward(self.pool_proj.forward(pooled)));

        Tensor::cat(branches, 1)
    }
}

/// Inception-style variant of the frozen topology. Same input and output
/// contract as the LeNet-style network; the blob selects which one ships.
#[derive(Module, Debug)]
pub struct Inception<B: Backend> {
    block1: InceptionBlock<B>,
    pool1: MaxPool2d,
    block2: InceptionBlock<B>,
    pool2: MaxPool2d,
    linear1: Linear<B>,
    linear2: Linear<B>,
    activation: Relu,
}

impl<B: Backend> Inception<B> {
    pub fn forward(&self, images: Tensor<B, 3>) -> Tensor<B, 2> {
        let [batch_size, height, width] = images.dims();

        let x = images.reshape([batch_size, 1, height, width]);

        let x = self.pool1.forward(self.block1.forward(x));
        let x = self.pool2.forward(self.block2.forward(x));

        let x = x.reshape([batch_size, 12 * 7 * 7]);
        let x = self.activation.forward(self.linear1.forward(x));

        self.linear2.forward(x)
    }
}

#[derive(Config, Debug)]
pub struct InceptionConfig {
    num_classes: usize,
}

impl InceptionConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Inception<B> {
        let block1 = InceptionBlock::new(1, Some(16), 10, true, device);
        let block1_out = InceptionBlock::<B>::out_channels(10, true);
        let block2 = InceptionBlock::new(block1_out, None, 4, false, device);
        let block2_out = InceptionBlock::<B>::out_channels(4, false);

        Inception {
            block1,
            pool1: MaxPool2dConfig::new([2, 2]).init(),
            block2,
            pool2: MaxPool2dConfig::new([2, 2]).init(),
            linear1: LinearConfig::new(block2_out * 7 * 7, 32).init(device),
            linear2: LinearConfig::new(32, self.num_classes).init(device),
            activation: Relu::new(),
        }
    }
}
