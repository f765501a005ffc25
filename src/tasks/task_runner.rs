use tracing::info;

type Spawner = Box<dyn FnOnce() + Send>;

/// Background jobs collected during bootstrap and spawned together before
/// the gateway client starts.
#[derive(Default)]
pub struct TaskRunner {
    tasks: Vec<(&'static str, Spawner)>,
}

impl TaskRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_task<F>(&mut self, name: &'static str, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.tasks.push((name, Box::new(task)));
    }

    pub fn start_all(self) {
        for (name, task) in self.tasks {
            info!(task = name, "starting background task");
            task();
        }
    }
}
