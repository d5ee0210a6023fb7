//! Gridline Kernel Library
//!
//! Filter, sort and pagination engine for tabular JSON rows, working either
//! in memory or against a remote endpoint. The `gridline` binary is a thin
//! command-line front end over [`DataTable`].

pub mod config;
pub mod error;
pub mod event;
pub mod filter;
pub mod pager;
pub mod persistence;
pub mod pipeline;
pub mod sort;
pub mod source;
pub mod table;
pub mod types;

pub use config::{ColumnConfig, RemoteProcessing, TableConfig};
pub use error::{EngineError, EngineResult};
pub use event::{EventBus, Handler};
pub use filter::{FilterFn, FilterOp, Operator, filter_fn};
pub use pager::{Navigation, PageState, Paginator};
pub use persistence::Persistence;
pub use pipeline::{Pipeline, step_callback};
pub use sort::{SortEngine, SortIndicator, SortState};
pub use source::{DataSource, HttpDataSource, LogNotifier, Notifier};
pub use table::{DataTable, Mode, TableState};
pub use types::{ColumnDescriptor, ColumnType, Params, Row, SortDirection};
