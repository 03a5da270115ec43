use std::{any::Any, fmt, thread};

/// Spawns named threads that are all joined when [`scoped_workers`] returns. Threads
/// may borrow from the environment `'env`, just like with [`thread::scope`].
pub struct WorkerScope<'scope, 'env, T> {
    inner: &'scope thread::Scope<'scope, 'env>,
    handles: Vec<(String, thread::ScopedJoinHandle<'scope, T>)>,
}

impl<'work_scope, 'scope, 'env, T> WorkerScope<'scope, 'env, T> {
    /// Spawns `f` on a new thread named `{name}{index}`, where `index` is the number of
    /// threads spawned before this one.
    pub fn spawn<F>(&'work_scope mut self, name: impl AsRef<str>, f: F)
    where
        F: FnOnce() -> T + Send + 'scope,
        T: Send + 'scope,
    {
        let name = format!("{}{:>02}", name.as_ref(), self.num_spawned());
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn_scoped(self.inner, f)
            .expect("the name does not contain null bytes");
        self.handles.push((name, handle));
    }

    pub fn num_spawned(&self) -> usize {
        self.handles.len()
    }
}

pub struct CaughtPanic(pub Box<dyn Any + Send + 'static>);

pub struct FinishedWorker<T> {
    pub name: String,
    pub result: Result<T, CaughtPanic>,
}

impl<T> FinishedWorker<T> {
    /// The value the worker returned, or `None` after logging how it panicked.
    pub fn ok_or_log(self) -> Option<T> {
        match self.result {
            Ok(value) => Some(value),
            Err(panic) => {
                log::error!("Worker {} panicked: {}", self.name, panic);
                None
            }
        }
    }
}

/// Runs `f`, which spawns workers, and then waits for all of them. The results are in
/// spawn order.
pub fn scoped_workers<'env, F, T>(f: F) -> Vec<FinishedWorker<T>>
where
    F: for<'scope, 'work_scope> FnOnce(&'work_scope mut WorkerScope<'scope, 'env, T>),
{
    thread::scope(|scope| {
        let mut scope = WorkerScope {
            inner: scope,
            handles: vec![],
        };
        f(&mut scope);
        scope
            .handles
            .into_iter()
            .map(|(name, handle)| FinishedWorker {
                name,
                result: handle.join().map_err(CaughtPanic),
            })
            .collect()
    })
}

impl CaughtPanic {
    /// The message given to `panic!`, if it was a string.
    pub fn message(&self) -> Option<&str> {
        let payload = &self.0;
        payload
            .downcast_ref::<String>()
            .map(String::as_str)
            .or_else(|| payload.downcast_ref::<&str>().copied())
    }
}

impl fmt::Display for CaughtPanic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message().unwrap_or("non-string panic payload"))
    }
}

impl fmt::Debug for CaughtPanic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CaughtPanic({self})")
    }
}
