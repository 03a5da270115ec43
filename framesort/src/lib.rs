pub mod error;
pub mod features;
pub mod job;
pub mod rank;
pub mod record;
pub mod runner;
pub mod sampler;
pub mod thumbnail;
pub mod video_source;
