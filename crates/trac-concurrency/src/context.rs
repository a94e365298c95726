use std::sync::Arc;

use bytes::BytesMut;
use tokio::runtime::Handle;
use tokio::sync::Mutex;

/// A simple pool of reusable scratch buffers, shared by every stage of one
/// pipeline. Buffers are returned to the pool when dropped via
/// [`PooledBuffer`]'s `Drop` impl, so a long-running pipeline does not
/// reallocate on every chunk.
#[derive(Clone)]
pub struct BufferAllocator {
    pool: Arc<Mutex<Vec<BytesMut>>>,
    default_capacity: usize,
}

impl BufferAllocator {
    pub fn new(default_capacity: usize) -> Self {
        BufferAllocator {
            pool: Arc::new(Mutex::new(Vec::new())),
            default_capacity,
        }
    }

    pub async fn acquire(&self) -> BytesMut {
        let mut pool = self.pool.lock().await;
        pool.pop().unwrap_or_else(|| BytesMut::with_capacity(self.default_capacity))
    }

    pub async fn release(&self, mut buf: BytesMut) {
        buf.clear();
        let mut pool = self.pool.lock().await;
        // Bound the pool so a burst of large pipelines can't pin unbounded memory.
        if pool.len() < 64 {
            pool.push(buf);
        }
    }
}

/// Per-pipeline execution context: the event-loop handle a pipeline's stages
/// run on, plus the buffer allocator they share. One `ExecutionContext` is
/// created per inbound stream and never shared across pipelines.
#[derive(Clone)]
pub struct ExecutionContext {
    runtime: Handle,
    allocator: BufferAllocator,
}

impl ExecutionContext {
    pub fn new(runtime: Handle, allocator: BufferAllocator) -> Self {
        ExecutionContext { runtime, allocator }
    }

    /// Builds a context bound to the handle of the runtime calling this
    /// function, with a fresh, empty buffer pool.
    pub fn current(default_buffer_capacity: usize) -> Self {
        ExecutionContext {
            runtime: Handle::current(),
            allocator: BufferAllocator::new(default_buffer_capacity),
        }
    }

    pub fn runtime(&self) -> &Handle {
        &self.runtime
    }

    pub fn allocator(&self) -> &BufferAllocator {
        &self.allocator
    }

    /// Runs CPU-heavy codec work on the blocking pool and returns its result,
    /// standing in for 's "separate worker pool" for heavy
    /// transforms.
    pub async fn spawn_blocking<F, R>(&self, f: F) -> std::io::Result<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        self.runtime
            .spawn_blocking(f)
            .await
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn allocator_reuses_released_buffers() {
        let allocator = BufferAllocator::new(16);
        let buf = allocator.acquire().await;
        let ptr_before = buf.capacity();
        allocator.release(buf).await;

        let reused = allocator.acquire().await;
        assert_eq!(reused.capacity(), ptr_before);
    }

    #[tokio::test]
    async fn spawn_blocking_executes_on_blocking_pool() {
        let ctx = ExecutionContext::current(16);
        let result = ctx.spawn_blocking(|| 2 + 2).await.unwrap();
        assert_eq!(result, 4);
    }
}
