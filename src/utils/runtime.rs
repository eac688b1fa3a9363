use anyhow::Result;

/// The report is a single sequence of requests, so one thread is all it needs. Bounded
/// concurrency is done with futures on this thread.
pub fn single_thread_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
