//! Data table facade.
//!
//! [`DataTable`] owns the shared [`TableState`] and wires the filter, sort
//! and pager onto the event bus for the configured mode:
//!
//! - local: `render` runs filter (1), sort (2) and pager (3) against the
//!   in-memory rows
//! - remote: filter (10), sort (20) and pager (30) reduce the
//!   `remoteParams` chain, and a single `render` handler fetches the page
//!
//! Every action that renders takes `&mut self`, so render passes on one
//! table never overlap.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::config::{TableConfig, validate_columns};
use crate::error::{EngineError, EngineResult};
use crate::event::{EventBus, Handler};
use crate::filter::{FilterEngine, FilterFn, FilterOp};
use crate::pager::{Navigation, PageState, Paginator, row_count_of};
use crate::persistence::Persistence;
use crate::pipeline::{Pipeline, StepCallback, step_callback};
use crate::sort::{SortEngine, SortIndicator, SortState};
use crate::source::{DataSource, Notifier};
use crate::types::{
    ColumnDescriptor, INIT_PIPELINE, Params, REFRESH_PIPELINE, REMOTE_PARAMS_EVENT, RENDER_EVENT,
    Row,
};

/// Priorities of the `render` subscribers.
const RENDER_FILTER_PRIORITY: i32 = 1;
const RENDER_SORT_PRIORITY: i32 = 2;
const RENDER_PAGER_PRIORITY: i32 = 3;

/// Priorities of the `remoteParams` reducers.
const REMOTE_FILTER_PRIORITY: i32 = 10;
const REMOTE_SORT_PRIORITY: i32 = 20;
const REMOTE_PAGER_PRIORITY: i32 = 30;

/// Where filtering, sorting and paging happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Local,
    Remote,
}

/// Engine state handed to every bus handler and pipeline callback.
pub struct TableState {
    bus: Arc<EventBus<TableState>>,
    pipeline: Arc<Pipeline<TableState>>,
    source: Arc<dyn DataSource>,
    notifier: Arc<dyn Notifier>,
    mode: Mode,
    remote_url: Option<String>,
    persistence: Persistence,
    filter: FilterEngine,
    sort: SortEngine,
    pager: Paginator,
}

impl std::fmt::Debug for TableState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableState")
            .field("mode", &self.mode)
            .field("remote_url", &self.remote_url)
            .field("rows", &self.persistence.row_count())
            .field("page", &self.pager.state())
            .finish_non_exhaustive()
    }
}

impl TableState {
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn persistence(&self) -> &Persistence {
        &self.persistence
    }

    pub fn filter(&self) -> &FilterEngine {
        &self.filter
    }

    pub fn sort(&self) -> &SortEngine {
        &self.sort
    }

    pub fn pager(&self) -> &Paginator {
        &self.pager
    }

    /// Collect the outgoing query from every `remoteParams` reducer.
    pub fn remote_params(&self) -> EngineResult<Params> {
        let bus = Arc::clone(&self.bus);
        Ok(bus
            .chain(REMOTE_PARAMS_EVENT, self, Params::new())?
            .unwrap_or_default())
    }

    /// Fetch one page from the remote endpoint and take it as the working
    /// set.
    async fn fetch_remote_page(&mut self) -> EngineResult<()> {
        let Some(url) = self.remote_url.clone() else {
            return Err(EngineError::Config(
                "remote mode requires remoteUrl".to_string(),
            ));
        };
        let params = self.remote_params()?;
        let source = Arc::clone(&self.source);

        let body = match source.fetch(&url, &params).await {
            Ok(body) => body,
            Err(e) => {
                error!(url = %url, error = %e, "remote page request failed");
                self.notifier
                    .notify(&format!("Failed to load data from {url}: {e}"));
                return Err(e);
            }
        };

        let row_count = row_count_of(&body);
        self.persistence.set_data(dataset_of(body));
        self.pager.render_remote(&self.persistence, row_count);
        Ok(())
    }
}

async fn render_remote(state: &mut TableState) -> EngineResult<()> {
    state.fetch_remote_page().await
}

/// Rows of a dataset body: a bare array, or the `data` of `{data, ...}`.
fn dataset_of(body: Value) -> Value {
    match body {
        Value::Object(mut obj) => obj.remove("data").unwrap_or(Value::Null),
        other => other,
    }
}

/// Filter, sort and paginate rows, locally or through a remote endpoint.
pub struct DataTable {
    state: TableState,
    valid: bool,
}

impl std::fmt::Debug for DataTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataTable")
            .field("valid", &self.valid)
            .field("state", &self.state)
            .finish()
    }
}

impl DataTable {
    /// Build a table from configuration.
    ///
    /// An invalid configuration (no columns, remote mode without a URL, ...)
    /// is logged and yields a table with nothing wired; check
    /// [`is_valid`](Self::is_valid).
    pub fn new(
        config: TableConfig,
        source: Arc<dyn DataSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let columns = config.descriptors();
        Self::with_columns(config, columns, source, notifier)
    }

    /// Build a table from configuration plus runtime column descriptors,
    /// which may carry custom filter predicates. `config.columns` is
    /// ignored.
    pub fn with_columns(
        config: TableConfig,
        columns: Vec<ColumnDescriptor>,
        source: Arc<dyn DataSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let errors = validate_columns(&config, columns.iter().map(|c| c.field.as_str()));
        let valid = errors.is_empty();
        for e in &errors {
            error!(error = %e, "invalid table configuration");
        }

        let mode = if config.is_remote() {
            Mode::Remote
        } else {
            Mode::Local
        };
        let remote_url = config.remote_url.clone().filter(|u| !u.is_empty());

        let mut sort = SortEngine::new(&columns);
        if let Some((column, direction)) = config.remote_processing.default_sort() {
            if !columns.iter().any(|c| c.field == column) {
                warn!(column = %column, "default sort column is not a declared column");
            }
            sort = sort.with_default(column, direction);
        }

        let bus = Arc::new(EventBus::new());
        let pipeline = Arc::new(Pipeline::new(
            remote_url.clone().unwrap_or_default(),
            Arc::clone(&source),
            Arc::clone(&notifier),
        ));

        let mut table = Self {
            state: TableState {
                bus,
                pipeline,
                source,
                notifier,
                mode,
                remote_url,
                persistence: Persistence::default(),
                filter: FilterEngine::new(columns),
                sort,
                pager: Paginator::new(config.pager_rows_per_page, config.pager_pages_to_display),
            },
            valid,
        };

        if valid {
            table.wire();
            info!(
                mode = ?table.state.mode,
                columns = table.state.filter.columns().len(),
                "data table ready"
            );
        }
        table
    }

    /// Seed the dataset without rendering.
    pub fn with_rows(mut self, rows: Vec<Row>) -> Self {
        self.state.persistence.set_rows(rows);
        self
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    /// The bus, for presentation-layer subscribers.
    pub fn events(&self) -> Arc<EventBus<TableState>> {
        Arc::clone(&self.state.bus)
    }

    /// The pipelines, for extra `init`/`refresh` steps.
    pub fn pipelines(&self) -> Arc<Pipeline<TableState>> {
        Arc::clone(&self.state.pipeline)
    }

    pub fn state(&self) -> &TableState {
        &self.state
    }

    fn wire(&mut self) {
        match self.state.mode {
            Mode::Local => self.wire_local(),
            Mode::Remote => self.wire_remote(),
        }
        self.wire_pipelines();
    }

    fn wire_local(&self) {
        let bus = &self.state.bus;
        bus.subscribe(
            RENDER_EVENT,
            Handler::sync(|state: &mut TableState| {
                state.filter.apply(&mut state.persistence);
                Ok(())
            }),
            RENDER_FILTER_PRIORITY,
        );
        bus.subscribe(
            RENDER_EVENT,
            Handler::sync(|state: &mut TableState| {
                state.sort.apply(&mut state.persistence);
                Ok(())
            }),
            RENDER_SORT_PRIORITY,
        );
        bus.subscribe(
            RENDER_EVENT,
            Handler::sync(|state: &mut TableState| {
                state.pager.render_local(&state.persistence);
                Ok(())
            }),
            RENDER_PAGER_PRIORITY,
        );
    }

    fn wire_remote(&self) {
        let bus = &self.state.bus;
        bus.subscribe(
            REMOTE_PARAMS_EVENT,
            Handler::chain(|state: &TableState, params| Ok(state.filter.remote_params(params))),
            REMOTE_FILTER_PRIORITY,
        );
        bus.subscribe(
            REMOTE_PARAMS_EVENT,
            Handler::chain(|state: &TableState, params| Ok(state.sort.remote_params(params))),
            REMOTE_SORT_PRIORITY,
        );
        bus.subscribe(
            REMOTE_PARAMS_EVENT,
            Handler::chain(|state: &TableState, params| Ok(state.pager.remote_params(params))),
            REMOTE_PAGER_PRIORITY,
        );
        bus.subscribe(
            RENDER_EVENT,
            Handler::<TableState>::asynchronous(|state| Box::pin(render_remote(state))),
            RENDER_PAGER_PRIORITY,
        );
    }

    /// Option hydration on `init`, plus the dataset load in local mode
    /// when a URL is configured.
    fn wire_pipelines(&self) {
        let pipeline = &self.state.pipeline;

        for column in self.state.filter.columns() {
            let Some(url) = column.filter_values_remote_source.as_deref() else {
                continue;
            };
            let field = column.field.clone();
            let callback: Arc<StepCallback<TableState>> =
                step_callback(move |state: &mut TableState, body| {
                    state.filter.set_options_from_body(&field, body);
                    Ok(())
                });
            pipeline.add_step(INIT_PIPELINE, callback, Some(url));
        }

        if self.state.mode == Mode::Local && self.state.remote_url.is_some() {
            let load: Arc<StepCallback<TableState>> =
                step_callback(|state: &mut TableState, body| {
                    state.persistence.set_data(dataset_of(body));
                    Ok(())
                });
            pipeline.add_step(INIT_PIPELINE, Arc::clone(&load), None);
            pipeline.add_step(REFRESH_PIPELINE, load, None);
        }
    }

    /// Run the `init` pipeline, then render.
    ///
    /// A failed step still renders whatever the earlier steps produced;
    /// the step's error is returned afterwards.
    pub async fn init(&mut self) -> EngineResult<()> {
        self.run_pipeline_and_render(INIT_PIPELINE).await
    }

    /// Run the `refresh` pipeline, then render. Failures behave as in
    /// [`init`](Self::init).
    pub async fn refresh(&mut self) -> EngineResult<()> {
        self.run_pipeline_and_render(REFRESH_PIPELINE).await
    }

    async fn run_pipeline_and_render(&mut self, name: &str) -> EngineResult<()> {
        let pipeline = Arc::clone(&self.state.pipeline);
        let outcome = pipeline.execute(name, &mut self.state).await;
        if let Err(e) = &outcome {
            warn!(pipeline = %name, error = %e, "pipeline failed; rendering current rows");
        }
        self.render().await?;
        outcome
    }

    /// Fire `render`.
    pub async fn render(&mut self) -> EngineResult<()> {
        let bus = Arc::clone(&self.state.bus);
        bus.trigger(RENDER_EVENT, &mut self.state).await
    }

    /// Replace the dataset and render.
    pub async fn set_data(&mut self, data: Value) -> EngineResult<()> {
        self.state.persistence.set_data(data);
        self.render().await
    }

    /// Set a filter control's value. Real-time controls go back to page 1
    /// and render at once; others wait for [`apply_filters`](Self::apply_filters).
    ///
    /// Returns `false` when the column has no filter control.
    pub async fn set_filter_input(&mut self, field: &str, value: Value) -> EngineResult<bool> {
        if !self.state.filter.set_input(field, value) {
            return Ok(false);
        }
        if self.state.filter.is_real_time(field) {
            self.apply_filters().await?;
        }
        Ok(true)
    }

    /// Go back to page 1 and render with the current filters.
    pub async fn apply_filters(&mut self) -> EngineResult<()> {
        self.state.pager.set_page(1);
        self.render().await
    }

    /// Add or replace the programmatic filter on `field`, then render.
    pub async fn set_filter(
        &mut self,
        field: &str,
        value: Value,
        op: impl Into<FilterOp>,
    ) -> EngineResult<()> {
        self.state.filter.set_filter(field, value, op, Value::Null);
        self.apply_filters().await
    }

    /// Programmatic filter with a custom predicate.
    pub async fn set_filter_fn(
        &mut self,
        field: &str,
        value: Value,
        predicate: FilterFn,
        params: Value,
    ) -> EngineResult<()> {
        self.state
            .filter
            .set_filter(field, value, FilterOp::Custom(predicate), params);
        self.apply_filters().await
    }

    pub async fn remove_filter(&mut self, field: &str) -> EngineResult<bool> {
        let removed = self.state.filter.remove_filter(field);
        if removed {
            self.apply_filters().await?;
        }
        Ok(removed)
    }

    pub async fn clear_filters(&mut self) -> EngineResult<()> {
        self.state.filter.clear_filters();
        self.apply_filters().await
    }

    /// Activate a sort column and render. Returns `false` for unknown
    /// columns.
    pub async fn sort_by(&mut self, field: &str) -> EngineResult<bool> {
        if !self.state.sort.activate(field) {
            return Ok(false);
        }
        self.render().await?;
        Ok(true)
    }

    pub async fn go_to_page(&mut self, page: i64) -> EngineResult<()> {
        let page = self.state.pager.set_page(page);
        debug!(page, "page requested");
        self.render().await
    }

    pub async fn next_page(&mut self) -> EngineResult<()> {
        let page = self.state.pager.next_page();
        self.go_to_page(page).await
    }

    pub async fn previous_page(&mut self) -> EngineResult<()> {
        let page = self.state.pager.previous_page();
        self.go_to_page(page).await
    }

    pub async fn first_page(&mut self) -> EngineResult<()> {
        self.go_to_page(1).await
    }

    pub async fn last_page(&mut self) -> EngineResult<()> {
        let page = self.state.pager.last_page();
        self.go_to_page(page).await
    }

    /// Rows of the visible page.
    pub fn page_rows(&self) -> &[Row] {
        self.state.pager.page_rows()
    }

    /// Working rows: filtered and sorted, before paging.
    pub fn working_rows(&self) -> &[Row] {
        self.state.persistence.rows()
    }

    pub fn navigation(&self) -> &Navigation {
        self.state.pager.navigation()
    }

    pub fn page_state(&self) -> PageState {
        self.state.pager.state()
    }

    pub fn sort_state(&self) -> &SortState {
        self.state.sort.state()
    }

    pub fn sort_indicator(&self, field: &str) -> SortIndicator {
        self.state.sort.indicator(field)
    }

    /// Options for a select-style control.
    ///
    /// Configured or fetched options win; otherwise the distinct values of
    /// the cached rows.
    pub fn filter_options(&self, field: &str) -> Vec<Value> {
        match self.state.filter.options(field) {
            Some(options) => options.to_vec(),
            None => {
                if self.state.filter.column(field).is_none() {
                    warn!(field = %field, "options requested for unknown column");
                }
                self.state.persistence.distinct_values(field)
            }
        }
    }

    /// Outgoing query the next remote render would send.
    pub fn remote_params(&self) -> EngineResult<Params> {
        self.state.remote_params()
    }
}
