// Platform-specific code module

pub mod gpu;
pub mod threads;

pub use gpu::{get_gpu_provider, GpuProvider, GpuReading};
pub use threads::{process_threads, ProcessThreads, ThreadTimes};
