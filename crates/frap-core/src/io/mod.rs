pub mod dataset;
pub mod metadata;
pub mod ser;
pub mod ser_writer;

pub use dataset::{sidecar_path, write_dataset, FrameSource, MemorySource, SerDataset};
pub use metadata::{AcquisitionLoop, Experiment, ExperimentMetadata};
