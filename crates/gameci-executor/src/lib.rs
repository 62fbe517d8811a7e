//! Container orchestration for gameci.
//!
//! This crate drives a [`ContainerRuntime`] through a build or test run:
//!
//! - **Workspace staging**: a filtered scratch copy of the project tree
//! - **Environments**: disposable containers from the versioned editor image,
//!   with the library cache volume attached
//! - **Licensing**: one activation strategy per run, always released
//! - **Report conversion**: NUnit results to JUnit in a secondary environment
//! - **Artifact export**: `/builds` or `/results` copied back to the host
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use gameci_core::PipelineSettings;
//! use gameci_executor::DockerRuntime;
//! use gameci_executor::Pipeline;
//!
//! let pipeline = Pipeline::new(Arc::new(DockerRuntime::new("docker")), PipelineSettings::default());
//! let report = pipeline.run(&config, Path::new("./builds")).await?;
//! println!("artifacts in {}", report.artifacts.host_path.display());
//! ```

#![warn(missing_docs)]

pub mod environment;
pub mod error;
pub mod pipeline;
pub mod runtime;
pub mod workspace;

pub use environment::Environment;
pub use error::ExecutorError;
pub use pipeline::ArtifactDirectory;
pub use pipeline::Pipeline;
pub use pipeline::RunReport;
pub use pipeline::StepStatus;
pub use runtime::ContainerRuntime;
pub use runtime::DockerRuntime;
pub use runtime::InMemoryRuntime;
pub use runtime::RuntimeEvent;
pub use workspace::PreparedWorkspace;
pub use workspace::StageStats;
pub use workspace::prepare_workspace;
