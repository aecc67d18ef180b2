//! Build task graph: named tasks, explicit dependencies, topological runs.
//!
//! The build side of the pipeline is orchestration, not transformation: the
//! style, script and image tasks delegate to external tools run as
//! subprocesses, and asset copy is a native glob-driven file copy. Tasks are
//! registered into a [`TaskGraph`] and executed depth-first in dependency
//! order, each at most once per run, failing on the first task that fails.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::process::Command;

use tracing::{debug, error, info};

use crate::config::BuildConfig;
use crate::error::TaskError;
use crate::manifest;

/// An external command line, whitespace-split. No shell is involved, so
/// quoting is not interpreted; arguments with spaces are not supported.
#[derive(Debug, Clone)]
pub struct ExternalCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ExternalCommand {
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }
}

/// What a task does when it runs. Aggregate tasks carry no action.
#[derive(Debug, Clone)]
pub enum TaskAction {
    /// Run an external tool as a subprocess.
    Command { command: ExternalCommand, cwd: PathBuf },
    /// Copy glob-matched files under `dest`, preserving paths relative to `base`.
    CopyFiles {
        root: PathBuf,
        globs: Vec<String>,
        base: PathBuf,
        dest: PathBuf,
    },
}

#[derive(Debug, Clone)]
pub struct Task {
    pub name: String,
    pub deps: Vec<String>,
    pub action: Option<TaskAction>,
}

/// A directed graph of named tasks executed in topological order.
#[derive(Debug, Default)]
pub struct TaskGraph {
    tasks: BTreeMap<String, Task>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, task: Task) -> Result<(), TaskError> {
        if self.tasks.contains_key(&task.name) {
            return Err(TaskError::DuplicateTask(task.name));
        }
        self.tasks.insert(task.name.clone(), task);
        Ok(())
    }

    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(String::as_str)
    }

    /// Dependency-first execution order for `target`, each task once.
    pub fn execution_order(&self, target: &str) -> Result<Vec<&str>, TaskError> {
        let mut order = Vec::new();
        let mut done = BTreeSet::new();
        let mut visiting = BTreeSet::new();
        self.visit(target, &mut order, &mut done, &mut visiting)?;
        Ok(order)
    }

    fn visit<'a>(
        &'a self,
        name: &str,
        order: &mut Vec<&'a str>,
        done: &mut BTreeSet<&'a str>,
        visiting: &mut BTreeSet<&'a str>,
    ) -> Result<(), TaskError> {
        let task = self
            .tasks
            .get(name)
            .ok_or_else(|| TaskError::UnknownTask(name.to_string()))?;
        let key = task.name.as_str();
        if done.contains(key) {
            return Ok(());
        }
        if !visiting.insert(key) {
            return Err(TaskError::Cycle(key.to_string()));
        }
        for dep in &task.deps {
            self.visit(dep, order, done, visiting)?;
        }
        visiting.remove(key);
        done.insert(key);
        order.push(key);
        Ok(())
    }

    /// Run `target` and everything it depends on, failing on the first
    /// task that fails.
    pub fn run(&self, target: &str) -> Result<(), TaskError> {
        let order = self.execution_order(target)?;
        info!(target, order = ?order, "Running task graph");
        for name in order {
            let task = &self.tasks[name];
            match &task.action {
                None => debug!(task = name, "Aggregate task, nothing to do"),
                Some(action) => run_action(name, action)?,
            }
        }
        Ok(())
    }
}

fn run_action(name: &str, action: &TaskAction) -> Result<(), TaskError> {
    match action {
        TaskAction::Command { command, cwd } => {
            info!(task = name, program = %command.program, "Running external command");
            let status = Command::new(&command.program)
                .args(&command.args)
                .current_dir(cwd)
                .status()
                .map_err(|e| TaskError::Spawn {
                    task: name.to_string(),
                    source: e,
                })?;
            if !status.success() {
                error!(task = name, %status, "External command failed");
                return Err(TaskError::CommandFailed {
                    task: name.to_string(),
                    status: status.to_string(),
                });
            }
            Ok(())
        }
        TaskAction::CopyFiles {
            root,
            globs,
            base,
            dest,
        } => {
            let entries = manifest::collect(root, globs).map_err(|e| TaskError::Copy {
                task: name.to_string(),
                path: root.clone(),
                message: e.to_string(),
            })?;
            info!(task = name, files = entries.len(), dest = %dest.display(), "Copying assets");
            for entry in entries {
                let relative =
                    manifest::relative_path(&entry.path, base).map_err(|e| TaskError::Copy {
                        task: name.to_string(),
                        path: entry.path.clone(),
                        message: e.to_string(),
                    })?;
                let target = dest.join(relative.split('/').collect::<PathBuf>());
                if let Some(parent) = target.parent() {
                    std::fs::create_dir_all(parent).map_err(|e| TaskError::Copy {
                        task: name.to_string(),
                        path: parent.to_path_buf(),
                        message: e.to_string(),
                    })?;
                }
                std::fs::copy(root.join(&entry.path), &target).map_err(|e| TaskError::Copy {
                    task: name.to_string(),
                    path: entry.path.clone(),
                    message: e.to_string(),
                })?;
            }
            Ok(())
        }
    }
}

/// Assemble the default site pipeline from a [`BuildConfig`].
///
/// `styles`, `scripts` and `images` delegate to the configured commands;
/// `copy` plants static assets into the output folder; `build` aggregates
/// the four; `serve` builds and then hands off to the dev-server command.
pub fn default_graph(config: &BuildConfig) -> Result<TaskGraph, TaskError> {
    let mut graph = TaskGraph::new();

    let command_task = |name: &str, line: &str| -> Result<Task, TaskError> {
        let command = ExternalCommand::parse(line).ok_or_else(|| TaskError::EmptyCommand {
            task: name.to_string(),
        })?;
        Ok(Task {
            name: name.to_string(),
            deps: Vec::new(),
            action: Some(TaskAction::Command {
                command,
                cwd: config.root.clone(),
            }),
        })
    };

    graph.register(command_task("styles", &config.styles_command)?)?;
    graph.register(command_task("scripts", &config.scripts_command)?)?;
    graph.register(command_task("images", &config.images_command)?)?;
    graph.register(Task {
        name: "copy".to_string(),
        deps: Vec::new(),
        action: Some(TaskAction::CopyFiles {
            root: config.root.clone(),
            globs: config.asset_globs.clone(),
            base: config.asset_base.clone(),
            dest: config.root.join(&config.dist_dir),
        }),
    })?;
    graph.register(Task {
        name: "build".to_string(),
        deps: vec![
            "styles".to_string(),
            "scripts".to_string(),
            "images".to_string(),
            "copy".to_string(),
        ],
        action: None,
    })?;
    let mut serve = command_task("serve", &config.serve_command)?;
    serve.deps = vec!["build".to_string()];
    graph.register(serve)?;

    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(name: &str, deps: &[&str]) -> Task {
        Task {
            name: name.to_string(),
            deps: deps.iter().map(|d| d.to_string()).collect(),
            action: None,
        }
    }

    #[test]
    fn execution_order_puts_dependencies_first() {
        let mut graph = TaskGraph::new();
        graph.register(noop("styles", &[])).unwrap();
        graph.register(noop("scripts", &[])).unwrap();
        graph.register(noop("build", &["styles", "scripts"])).unwrap();

        let order = graph.execution_order("build").unwrap();
        assert_eq!(order.last(), Some(&"build"));
        assert!(order.contains(&"styles"));
        assert!(order.contains(&"scripts"));
    }

    #[test]
    fn shared_dependency_runs_once() {
        let mut graph = TaskGraph::new();
        graph.register(noop("base", &[])).unwrap();
        graph.register(noop("a", &["base"])).unwrap();
        graph.register(noop("b", &["base"])).unwrap();
        graph.register(noop("all", &["a", "b"])).unwrap();

        let order = graph.execution_order("all").unwrap();
        assert_eq!(order.iter().filter(|n| **n == "base").count(), 1);
    }

    #[test]
    fn cycle_is_rejected() {
        let mut graph = TaskGraph::new();
        graph.register(noop("a", &["b"])).unwrap();
        graph.register(noop("b", &["a"])).unwrap();
        let err = graph.execution_order("a").unwrap_err();
        assert!(matches!(err, TaskError::Cycle(_)));
    }

    #[test]
    fn unknown_task_is_rejected() {
        let graph = TaskGraph::new();
        let err = graph.execution_order("nope").unwrap_err();
        assert!(matches!(err, TaskError::UnknownTask(_)));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut graph = TaskGraph::new();
        graph.register(noop("a", &[])).unwrap();
        let err = graph.register(noop("a", &[])).unwrap_err();
        assert!(matches!(err, TaskError::DuplicateTask(_)));
    }

    #[test]
    fn failing_command_stops_the_run() {
        let mut graph = TaskGraph::new();
        graph
            .register(Task {
                name: "bad".to_string(),
                deps: Vec::new(),
                action: Some(TaskAction::Command {
                    command: ExternalCommand::parse("false").unwrap(),
                    cwd: PathBuf::from("."),
                }),
            })
            .unwrap();
        let err = graph.run("bad").unwrap_err();
        assert!(matches!(err, TaskError::CommandFailed { .. }));
    }

    #[test]
    fn successful_command_runs() {
        let mut graph = TaskGraph::new();
        graph
            .register(Task {
                name: "ok".to_string(),
                deps: Vec::new(),
                action: Some(TaskAction::Command {
                    command: ExternalCommand::parse("true").unwrap(),
                    cwd: PathBuf::from("."),
                }),
            })
            .unwrap();
        graph.run("ok").unwrap();
    }

    #[test]
    fn copy_task_preserves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("static/fonts")).unwrap();
        std::fs::write(root.join("static/fonts/site.woff2"), b"font").unwrap();
        std::fs::write(root.join("static/favicon.ico"), b"icon").unwrap();

        let mut graph = TaskGraph::new();
        graph
            .register(Task {
                name: "copy".to_string(),
                deps: Vec::new(),
                action: Some(TaskAction::CopyFiles {
                    root: root.to_path_buf(),
                    globs: vec!["static/**".to_string()],
                    base: PathBuf::from("static"),
                    dest: root.join("dist"),
                }),
            })
            .unwrap();
        graph.run("copy").unwrap();

        assert!(root.join("dist/fonts/site.woff2").exists());
        assert!(root.join("dist/favicon.ico").exists());
    }
}
