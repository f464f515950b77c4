use std::cell::OnceCell;
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;

use tracing::{debug, info, info_span};

use crate::core::error::UtilResult;

type Work = Box<dyn Fn() -> UtilResult<PathBuf>>;

/// A named unit of build work that always produces a file.
///
/// The work runs at most once; later calls to [`Task::execute`] hand back the
/// cached path. Dependencies are executed first, in the order given.
pub struct Task {
    name: String,
    deps: Vec<Rc<Task>>,
    work: Work,
    output: OnceCell<PathBuf>,
}

impl Task {
    pub fn named<F>(name: impl Into<String>, deps: Vec<Rc<Task>>, work: F) -> Rc<Self>
    where
        F: Fn() -> UtilResult<PathBuf> + 'static,
    {
        Rc::new(Self {
            name: name.into(),
            deps,
            work: Box::new(work),
            output: OnceCell::new(),
        })
    }

    /// A task with no dependencies.
    pub fn leaf<F>(name: impl Into<String>, work: F) -> Rc<Self>
    where
        F: Fn() -> UtilResult<PathBuf> + 'static,
    {
        Self::named(name, Vec::new(), work)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the work has already produced its file.
    pub fn is_done(&self) -> bool {
        self.output.get().is_some()
    }

    pub fn execute(&self) -> UtilResult<PathBuf> {
        if let Some(path) = self.output.get() {
            return Ok(path.clone());
        }

        for dep in &self.deps {
            dep.execute()?;
        }

        info!("{}", self.name);
        let span = info_span!("task", name = %self.name);
        let _enter = span.enter();

        let path = (self.work)()?;
        debug!("-> {}", path.display());
        Ok(self.output.get_or_init(|| path).clone())
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Task[{}]", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::UtilError;
    use std::cell::RefCell;

    #[test]
    fn work_runs_once() {
        let runs = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&runs);
        let task = Task::leaf("compile", move || {
            *counter.borrow_mut() += 1;
            Ok(PathBuf::from("build/classes"))
        });

        assert!(!task.is_done());
        assert_eq!(task.execute().unwrap(), PathBuf::from("build/classes"));
        assert_eq!(task.execute().unwrap(), PathBuf::from("build/classes"));
        assert_eq!(*runs.borrow(), 1);
        assert!(task.is_done());
    }

    #[test]
    fn dependencies_run_first_and_are_shared() {
        let order = Rc::new(RefCell::new(Vec::new()));

        let log = Rc::clone(&order);
        let download = Task::leaf("download", move || {
            log.borrow_mut().push("download");
            Ok(PathBuf::from("raw.jar"))
        });

        let log = Rc::clone(&order);
        let split = Task::named("split", vec![Rc::clone(&download)], move || {
            log.borrow_mut().push("split");
            Ok(PathBuf::from("slim.jar"))
        });

        let log = Rc::clone(&order);
        let merge = Task::named(
            "merge",
            vec![Rc::clone(&download), Rc::clone(&split)],
            move || {
                log.borrow_mut().push("merge");
                Ok(PathBuf::from("merged.jar"))
            },
        );

        assert_eq!(merge.execute().unwrap(), PathBuf::from("merged.jar"));
        assert_eq!(*order.borrow(), vec!["download", "split", "merge"]);
        assert_eq!(format!("{:?}", split), "Task[split]");
    }

    #[test]
    fn failed_work_is_retried() {
        let attempts = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&attempts);
        let task = Task::leaf("flaky", move || {
            *counter.borrow_mut() += 1;
            if *counter.borrow() == 1 {
                Err(UtilError::IllegalState("not yet".into()))
            } else {
                Ok(PathBuf::from("out"))
            }
        });

        assert!(task.execute().is_err());
        assert!(!task.is_done());
        assert_eq!(task.execute().unwrap(), PathBuf::from("out"));
        assert_eq!(*attempts.borrow(), 2);
    }
}
