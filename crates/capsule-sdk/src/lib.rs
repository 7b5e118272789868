//! # capsule-sdk
//!
//! Client SDK for Capsule isolated execution environments.
//!
//! A capsule server exposes sandbox lifecycle, command execution and file
//! operations as JSON-RPC 2.0 methods on `POST /rpc`. This crate wraps them
//! in a typed API.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                   capsule-sdk (client)                   │
//! ├──────────────────────────────────────────────────────────┤
//! │                                                          │
//! │  ┌─────────────────┐     ┌──────────────────────────┐   │
//! │  │    Capsule      │────▶│   CapsuleClient          │   │
//! │  │  - run()        │     │   - create() / delete()  │   │
//! │  │  - exec()       │     │   - exec()               │   │
//! │  │  - scoped()     │     │   - write/read/list      │   │
//! │  └─────────────────┘     └──────────────────────────┘   │
//! │                                     │                    │
//! │                                     ▼                    │
//! │  ┌─────────────────┐     ┌──────────────────────────┐   │
//! │  │  HttpTransport  │◀────│   RpcClient              │   │
//! │  │  (reqwest)      │     │   - call()  ids 1, 2, …  │   │
//! │  └─────────────────┘     └──────────────────────────┘   │
//! │           │                                              │
//! └───────────┼──────────────────────────────────────────────┘
//!             ▼
//!      capsule server  (sandbox.v1.* over /rpc)
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use capsule_sdk::{CapsuleClient, Error, ExecOptions, Template, TextEncoding};
//!
//! # async fn example() -> Result<(), Error> {
//! let client = CapsuleClient::new("http://localhost:8080")?;
//!
//! // The sandbox is deleted when the closure finishes, even on error.
//! client
//!     .with_capsule(Template::Python, |capsule| async move {
//!         let result = capsule.run("print(1 + 1)").await?;
//!         println!("Output: {}", result.stdout);
//!
//!         capsule.write_file("/workspace/data.txt", "Hello, World!").await?;
//!         let text = capsule
//!             .read_file_text("/workspace/data.txt", TextEncoding::Utf8)
//!             .await?;
//!         println!("File content: {text}");
//!
//!         let opts = ExecOptions::new().cwd("/workspace").timeout_ms(5_000);
//!         capsule.exec(["ls", "-la"], &opts).await?;
//!         Ok::<_, Error>(())
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **Sandbox Lifecycle**: Create and delete sandboxes, with scoped cleanup
//! - **Code Execution**: Run Python, Node.js and Go code, or any command
//! - **File Operations**: Binary-safe read and write, directory listing
//! - **Typed Errors**: One error type for every remote failure
//! - **Terminal**: WebSocket URL for live terminal access

mod capsule;
mod client;
mod config;
mod error;
mod protocol;
mod rpc;
mod template;
mod transport;
mod types;

#[cfg(test)]
mod testing;

pub use capsule::Capsule;
pub use client::{CapsuleClient, DEFAULT_TTL, DEFAULT_WORKSPACE};
pub use config::{ClientConfig, ClientConfigBuilder, DEFAULT_TIMEOUT};
pub use error::{codes, CapsuleError, ConfigError, Error, Result};
pub use protocol::methods;
pub use rpc::{Request, Response, RpcClient, JSONRPC_VERSION};
pub use template::{RunPlan, SourceFile, Template, GO_SOURCE_PATH};
pub use transport::{HttpTransport, Transport, TransportError};
pub use types::{ExecOptions, ExecResult, FileInfo, TextEncoding};
