mod functional_conv2d;
mod functional_upsample;
mod op_batch_norm;
mod op_registry;
