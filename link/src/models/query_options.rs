use futures_util::future::BoxFuture;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::column_descriptor::ColumnDescriptor;
use super::decoded_value::DecodedValue;
use super::decoder_config::DecoderConfig;
use super::retry_policy::RetryPolicy;
use crate::binder::Record;
use crate::error::BoxError;

/// Rewrites a decoded value before it is assigned to a record field.
pub type DecodeHook =
    Arc<dyn Fn(&ColumnDescriptor, DecodedValue) -> Result<DecodedValue, BoxError> + Send + Sync>;

/// Runs once after every row has been read and before post-processing.
/// Returning an error aborts the whole call.
pub type PostFetch =
    Arc<dyn Fn(CancellationToken) -> BoxFuture<'static, Result<(), BoxError>> + Send + Sync>;

/// Per-call options for [`crate::query`].
///
/// `T` is the destination record type. `QueryOptions::new()` produces
/// generic rows; `QueryOptions::<T>::for_records()` binds every row into a
/// `T`. The choice is made once per call, never per row.
///
/// # Example
///
/// ```rust
/// use dbq_link::{QueryOptions, RetryPolicy};
///
/// let opts = QueryOptions::new()
///     .with_single_result(true)
///     .with_retry_policy(RetryPolicy::fast());
/// ```
pub struct QueryOptions<T: Record = ()> {
    /// Bind rows into `T` instead of returning generic rows
    pub bind_records: bool,

    /// Binder tuning (weak typing)
    pub decoder: DecoderConfig,

    /// Optional per-field value rewrite applied by the generic binder
    pub decode_hook: Option<DecodeHook>,

    /// Collapse the result to the first row (or nothing)
    pub single_result: bool,

    /// Return every column as a copy of its raw bytes
    pub raw_results: bool,

    /// Retry transient failures of the query round trip
    pub retry_policy: Option<RetryPolicy>,

    pub post_fetch: Option<PostFetch>,

    /// Run record post-processing hooks concurrently when more than one
    /// logical processor is available
    pub concurrent_post_process: bool,

    /// Upper bound on concurrently running hooks.
    /// Default: None (number of logical processors)
    pub max_concurrency: Option<usize>,

    _record: PhantomData<fn() -> T>,
}

impl QueryOptions<()> {
    /// Options producing generic rows
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: Record> QueryOptions<T> {
    /// Options binding every row into a `T`
    pub fn for_records() -> Self {
        Self {
            bind_records: true,
            ..Self::default()
        }
    }

    pub fn with_decoder(mut self, decoder: DecoderConfig) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn with_weakly_typed_input(mut self, enabled: bool) -> Self {
        self.decoder.weakly_typed_input = enabled;
        self
    }

    pub fn with_decode_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ColumnDescriptor, DecodedValue) -> Result<DecodedValue, BoxError>
            + Send
            + Sync
            + 'static,
    {
        self.decode_hook = Some(Arc::new(hook));
        self
    }

    pub fn with_single_result(mut self, enabled: bool) -> Self {
        self.single_result = enabled;
        self
    }

    pub fn with_raw_results(mut self, enabled: bool) -> Self {
        self.raw_results = enabled;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    pub fn with_post_fetch<F>(mut self, callback: F) -> Self
    where
        F: Fn(CancellationToken) -> BoxFuture<'static, Result<(), BoxError>>
            + Send
            + Sync
            + 'static,
    {
        self.post_fetch = Some(Arc::new(callback));
        self
    }

    pub fn with_concurrent_post_process(mut self, enabled: bool) -> Self {
        self.concurrent_post_process = enabled;
        self
    }

    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = Some(limit);
        self
    }
}

impl<T: Record> Default for QueryOptions<T> {
    fn default() -> Self {
        Self {
            bind_records: false,
            decoder: DecoderConfig::default(),
            decode_hook: None,
            single_result: false,
            raw_results: false,
            retry_policy: None,
            post_fetch: None,
            concurrent_post_process: false,
            max_concurrency: None,
            _record: PhantomData,
        }
    }
}

impl<T: Record> Clone for QueryOptions<T> {
    fn clone(&self) -> Self {
        Self {
            bind_records: self.bind_records,
            decoder: self.decoder,
            decode_hook: self.decode_hook.clone(),
            single_result: self.single_result,
            raw_results: self.raw_results,
            retry_policy: self.retry_policy.clone(),
            post_fetch: self.post_fetch.clone(),
            concurrent_post_process: self.concurrent_post_process,
            max_concurrency: self.max_concurrency,
            _record: PhantomData,
        }
    }
}

impl<T: Record> fmt::Debug for QueryOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryOptions")
            .field("bind_records", &self.bind_records)
            .field("decoder", &self.decoder)
            .field("decode_hook", &self.decode_hook.is_some())
            .field("single_result", &self.single_result)
            .field("raw_results", &self.raw_results)
            .field("retry_policy", &self.retry_policy)
            .field("post_fetch", &self.post_fetch.is_some())
            .field("concurrent_post_process", &self.concurrent_post_process)
            .field("max_concurrency", &self.max_concurrency)
            .finish()
    }
}
