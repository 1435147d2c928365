//! CommonJS interop for fob
//!
//! Lets ES module bundles consume CommonJS modules. Each candidate module is
//! classified during `transform`; CommonJS sources are handed to a
//! [`CommonJsRewriter`], ES modules pass through with their export shape
//! recorded. Importers reach a module through a synthetic *proxy* whose
//! source is generated once the target's classification settles.
//!
//! ## Architecture
//!
//! ```text
//! CommonJsInterop (config, filter, analyzer, rewriter, resolver)
//!        │ start_build(entries)
//!        ▼
//! CommonJsSession ── transform(code, id) ──► ClassificationRegistry
//!        │                                   ModuleKindTracker
//!        └──────────── load(proxy id) ◄───── awaits classification
//! ```
//!
//! Synthetic ids live in three namespaces prefixed with a NUL byte, see
//! [`SyntheticId`]. Proxy loads may be requested before the target has been
//! transformed; they wait rather than fail.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use fob_commonjs::{CommonJsConfig, CommonJsInterop, CommonJsRewriter};
//! use std::sync::Arc;
//!
//! # async fn example(rewriter: Arc<dyn CommonJsRewriter>) -> fob_commonjs::Result<()> {
//! let config = CommonJsConfig::new()
//!     .with_cwd("/path/to/project")
//!     .with_named_exports("react", ["createElement", "Component"]);
//!
//! let interop = CommonJsInterop::new(config, rewriter)?;
//! let session = interop.start_build("src/main.js").await?;
//!
//! let code = "module.exports = 42;";
//! let rewritten = session.transform(code, "/path/to/project/src/answer.js").await?;
//! # let _ = rewritten;
//! # Ok(())
//! # }
//! ```

mod analyzer;
mod config;
mod entries;
mod error;
mod filter;
mod ids;
mod memo;
mod naming;
mod proxy;
mod registry;
mod resolver;
mod rewrite;
mod session;
mod tracker;

pub use analyzer::{ModuleAnalysis, ModuleAnalyzer, OxcModuleAnalyzer};
pub use config::{CommonJsConfig, EntryInput, IgnoreRequire};
pub use entries::{EntrySet, resolve_entries};
pub use error::{CommonJsError, Result, SourceLocation};
pub use filter::ModuleFilter;
pub use ids::{EXTERNAL_PREFIX, HELPERS_ID, HELPERS_SOURCE, PROXY_PREFIX, SyntheticId};
pub use memo::{AlreadyRegistered, Memo, MemoMap, MemoState, SharedValue};
pub use naming::{make_legal_identifier, module_binding_name};
pub use proxy::{ProxyShape, external_source, proxy_source};
pub use registry::{ClassificationRegistry, ClassificationState};
pub use resolver::{ModuleResolver, NodeModuleResolver};
pub use rewrite::{CommonJsRewriter, RewriteRequest, TransformedModule};
pub use session::{CommonJsInterop, CommonJsSession};
pub use tracker::{ExportShape, ModuleKindTracker};
