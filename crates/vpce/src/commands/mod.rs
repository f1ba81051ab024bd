pub mod diff;
pub mod init;
pub mod outputs;
pub mod synth;
pub mod validate;
