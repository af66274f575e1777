use std::fs;
use std::path::Path;

use ci_queue_api::{Environment, Node, ResourceController, Task};
use tracing::warn;

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::queue::Queue;

impl<T, N, R, Env, C> Queue<T, N, R, Env, C>
where
    T: Task,
    N: Node,
    R: ResourceController<T>,
    Env: Environment<T>,
    C: Clock,
{
    /// Writes one task name per line, across all three stages, to `path`.
    /// Best-effort: callers log and move on rather than propagate, since
    /// losing the persisted snapshot never loses an in-memory task.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut buf = String::new();
        for item in self.get_items() {
            buf.push_str(item.task().name());
            buf.push('\n');
        }
        fs::write(path, buf).map_err(|source| Error::PersistenceWrite {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads `path` line by line, re-adding each name that
    /// [`Environment::resolve_task`] can still resolve, and removes the
    /// file afterwards regardless of how many lines resolved. A missing or
    /// unreadable file is logged and treated as an empty snapshot, per the
    /// same best-effort contract as [`Queue::save`].
    pub fn load(&self) -> usize {
        self.load_from(Path::new("queue.txt"))
    }

    pub fn load_from(&self, path: &Path) -> usize {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(source) => {
                warn!(?path, %source, "failed to read persisted queue state, starting empty");
                return 0;
            }
        };

        let mut restored = 0;
        for name in contents.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match self.env.resolve_task(name) {
                Some(task) => {
                    self.add(task);
                    restored += 1;
                }
                None => warn!(task = name, "dropping persisted task, no longer resolvable"),
            }
        }

        if let Err(source) = fs::remove_file(path) {
            warn!(?path, %source, "failed to remove queue state file after restore");
        }

        restored
    }
}
