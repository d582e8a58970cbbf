use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info};

use super::bindings::{RunBindings, UiHandles};
use super::lifecycle::{ConsoleGuard, ConsoleOutput, LogConsole, NoRefresh, RecorderEnd, RecorderGuard, RefreshGuard, UiRefresh};
use super::provider::ProviderRegistry;
use crate::commands::{CommandRecorder, UndoStack};
use crate::config::ScriptingConfig;
use crate::dom::{DomContext, DomRootRegistry};
use crate::error::{RunError, ScriptError};
use crate::script_files::{is_link_file, resolve_link_file, script_label};

/// What to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptSource {
    /// A script file, possibly a link file
    File(PathBuf),
    /// Source text typed by the user
    Inline(String),
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    /// The script called `exit()`
    Exited,
    Failed(String),
}

impl RunOutcome {
    /// Completed and exited runs both count as success
    pub fn is_success(&self) -> bool {
        !matches!(self, RunOutcome::Failed(_))
    }
}

/// Summary of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Commands in the pushed undo unit
    pub commands_recorded: usize,
    /// Label of the pushed undo unit, `None` when nothing was pushed
    pub undo_label: Option<String>,
    /// Commands undone because the run failed
    pub commands_rolled_back: usize,
}

/// Collaborators provided by the host application
#[derive(Clone)]
pub struct HostServices {
    /// Present only when a UI host is running
    pub ui: Option<UiHandles>,
    pub console: Arc<dyn ConsoleOutput>,
    pub refresh: Arc<dyn UiRefresh>,
    pub undo_stack: Arc<Mutex<dyn UndoStack>>,
}

impl HostServices {
    /// Host without a UI: console output goes to the log, nothing to refresh
    pub fn headless(undo_stack: Arc<Mutex<dyn UndoStack>>) -> Self {
        Self {
            ui: None,
            console: Arc::new(LogConsole),
            refresh: Arc::new(NoRefresh),
            undo_stack,
        }
    }
}

/// Runs one script at a time against the registered providers and DOM roots
pub struct ScriptRunner {
    config: ScriptingConfig,
    providers: ProviderRegistry,
    dom_roots: Arc<dyn DomRootRegistry>,
    host: HostServices,
    recorder: CommandRecorder,
}

impl ScriptRunner {
    pub fn new(
        config: ScriptingConfig,
        providers: ProviderRegistry,
        dom_roots: Arc<dyn DomRootRegistry>,
        host: HostServices,
    ) -> Self {
        Self {
            config,
            providers,
            dom_roots,
            host,
            recorder: CommandRecorder::new(),
        }
    }

    pub fn config(&self) -> &ScriptingConfig {
        &self.config
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    /// Recorder shared with every proxy handed to scripts
    pub fn recorder(&self) -> &CommandRecorder {
        &self.recorder
    }

    /// Run a script to completion
    ///
    /// # Errors
    /// Only failures that happen before the script starts: no provider, a
    /// broken link file, engine creation, or a run already in progress. Script
    /// errors are reported through [`RunReport::outcome`].
    pub fn run(&self, source: ScriptSource) -> Result<RunReport, RunError> {
        if self.recorder.is_active() {
            return Err(RunError::SessionActive);
        }

        // Provider
        let (provider, script_path) = match &source {
            ScriptSource::File(path) => {
                let resolved = if is_link_file(path) {
                    resolve_link_file(path, self.config.max_link_depth)?
                } else {
                    path.clone()
                };
                let provider = self
                    .providers
                    .provider_for_file(&resolved)
                    .ok_or_else(|| RunError::ProviderNotFound(path.display().to_string()))?;
                (provider, Some(resolved))
            }
            ScriptSource::Inline(_) => {
                let provider = self
                    .providers
                    .provider_by_id(&self.config.default_provider)
                    .ok_or_else(|| RunError::ProviderNotFound(self.config.default_provider.clone()))?;
                (provider, None)
            }
        };
        let label = script_path
            .as_deref()
            .map(script_label)
            .unwrap_or_else(|| self.config.inline_label.clone());
        info!("Running script '{}' with {}", label, provider.name());

        // Engine
        let mut engine = provider.create_engine(&self.config)?;

        // Globals
        let ctx = DomContext::new(self.recorder.clone());
        let bindings = RunBindings::build(
            self.host.ui.as_ref(),
            self.config.scripts_dir.as_deref(),
            self.dom_roots.as_ref(),
            &ctx,
        );
        let bound = bindings.apply(engine.as_mut());
        debug!("Bound {} globals: {:?}", bound, bindings.names());

        for name in &self.config.blocked_globals {
            if let Err(e) = engine.remove(name) {
                debug!("Could not remove global '{}': {}", name, e);
            }
        }

        // Lifecycles, released in reverse order
        let console = ConsoleGuard::start(self.host.console.clone());
        let recorder = RecorderGuard::start(self.recorder.clone(), label.clone(), self.host.undo_stack.clone());
        let refresh = RefreshGuard::start(self.host.refresh.clone());

        let result = match (&source, &script_path) {
            (_, Some(path)) => provider.run_file(path, engine.as_mut()),
            (ScriptSource::Inline(text), None) => provider.run_source(text, &label, engine.as_mut()),
            (ScriptSource::File(_), None) => Ok(()),
        };

        let outcome = match result {
            Ok(()) => RunOutcome::Completed,
            Err(ScriptError::Exit) => {
                info!("Exited");
                RunOutcome::Exited
            }
            Err(e) => {
                error!("Script Error: {}", e);
                RunOutcome::Failed(e.to_string())
            }
        };

        drop(refresh);
        let rollback = self.config.rollback_on_error && !outcome.is_success();
        let end = recorder.finish(rollback);
        drop(console);

        let report = match end {
            RecorderEnd::Committed(count) => RunReport {
                outcome,
                commands_recorded: count,
                undo_label: (count > 0).then_some(label),
                commands_rolled_back: 0,
            },
            RecorderEnd::RolledBack(count) => RunReport {
                outcome,
                commands_recorded: 0,
                undo_label: None,
                commands_rolled_back: count,
            },
        };
        debug!("Run finished: {:?}", report);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{CommandStack, CompoundCommand, ScriptCommand};
    use crate::dom::{DomRegistration, DomRootSupplier, ModelRootFactory, StaticDomRegistry};
    use crate::engine::{Binding, HostHandle};
    use crate::model::{Property, TextAttribute};
    use crate::test_support::{sample_model, SampleModel, ScriptedProvider};
    use std::fs;

    #[derive(Default)]
    struct EventLog(Mutex<Vec<String>>);

    impl EventLog {
        fn push(&self, event: impl Into<String>) {
            self.0.lock().unwrap().push(event.into());
        }

        fn events(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    struct RecordingConsole(Arc<EventLog>);

    impl ConsoleOutput for RecordingConsole {
        fn start(&self) {
            self.0.push("console.start");
        }
        fn end(&self) {
            self.0.push("console.end");
        }
    }

    struct RecordingRefresh(Arc<EventLog>);

    impl UiRefresh for RecordingRefresh {
        fn init(&self) {
            self.0.push("refresh.init");
        }
        fn finalise(&self) {
            self.0.push("refresh.finalise");
        }
    }

    struct RecordingStack {
        log: Arc<EventLog>,
        inner: CommandStack,
    }

    impl UndoStack for RecordingStack {
        fn push(&mut self, unit: CompoundCommand) {
            self.log.push(format!("push:{}:{}", unit.label(), unit.len()));
            self.inner.push(unit);
        }
    }

    struct Harness {
        sample: SampleModel,
        stack: Arc<Mutex<CommandStack>>,
        runner: ScriptRunner,
    }

    fn harness(provider: ScriptedProvider, config: ScriptingConfig) -> Harness {
        let sample = sample_model();
        let stack = Arc::new(Mutex::new(CommandStack::default()));

        let mut providers = ProviderRegistry::new();
        providers.register(Arc::new(provider));
        let roots = StaticDomRegistry::new().with(DomRegistration::new(
            "scriptor.dom.model",
            "model",
            DomRootSupplier::Factory(Arc::new(ModelRootFactory::new(sample.graph.clone()))),
        ));

        let runner = ScriptRunner::new(config, providers, Arc::new(roots), HostServices::headless(stack.clone()));
        Harness { sample, stack, runner }
    }

    fn inline_config() -> ScriptingConfig {
        ScriptingConfig {
            default_provider: "test.scripted".into(),
            ..ScriptingConfig::default()
        }
    }

    #[test]
    fn test_unknown_extension_is_a_configuration_error() {
        let h = harness(ScriptedProvider::new("test.scripted", &[".ajs"]), inline_config());
        let err = h.runner.run(ScriptSource::File(PathBuf::from("script.py"))).unwrap_err();
        assert!(matches!(err, RunError::ProviderNotFound(_)));
        assert!(!h.runner.recorder().is_active());
    }

    #[test]
    fn test_unknown_inline_provider() {
        let h = harness(ScriptedProvider::new("test.scripted", &[".ajs"]), ScriptingConfig::default());
        let err = h.runner.run(ScriptSource::Inline("anything".into())).unwrap_err();
        assert!(matches!(err, RunError::ProviderNotFound(id) if id == "scriptor.provider.js"));
    }

    #[test]
    fn test_set_relationship_then_undo_unit() {
        let provider = ScriptedProvider::new("test.scripted", &[".ajs"]).on("rewire", |scope| {
            let model = scope.entity("model")?;
            let view = model.children_matching(".Views").pop().ok_or_else(|| scope.fail("no views"))?;
            let diagram = view.children().pop().ok_or_else(|| scope.fail("no diagram"))?;
            let object = diagram.children_matching(".Clerk").pop().ok_or_else(|| scope.fail("no object"))?;
            let connection = scope.connection_from(&object)?;
            let relations = model.children_matching(".Relations").pop().ok_or_else(|| scope.fail("no relations"))?;
            let serving = relations
                .children_matching("serving-relationship")
                .pop()
                .ok_or_else(|| scope.fail("no serving"))?;
            connection.set_relationship(&serving).map_err(scope.dom())?;
            Ok(())
        });
        let h = harness(provider, inline_config());
        let before = h.sample.graph.to_json().unwrap();

        let report = h.runner.run(ScriptSource::Inline("rewire".into())).unwrap();
        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.commands_recorded, 1);
        assert_eq!(report.undo_label.as_deref(), Some("Local Script"));
        assert_eq!(
            h.sample.graph.connection_relationship(&h.sample.connection).unwrap(),
            Some(h.sample.serving.clone())
        );

        let undone = h.stack.lock().unwrap().undo().unwrap();
        assert_eq!(undone.as_deref(), Some("Local Script"));
        assert_eq!(
            h.sample.graph.connection_relationship(&h.sample.connection).unwrap(),
            Some(h.sample.assignment.clone())
        );
        assert_eq!(h.sample.graph.to_json().unwrap(), before);
    }

    #[test]
    fn test_exit_after_two_mutations() {
        let provider = ScriptedProvider::new("test.scripted", &[".ajs"]).on("two-then-exit", |scope| {
            let model = scope.entity("model")?;
            model.add_property("a", "1").map_err(scope.dom())?;
            model.add_property("b", "2").map_err(scope.dom())?;
            Err(ScriptError::Exit)
        });
        let h = harness(provider, inline_config());

        let report = h.runner.run(ScriptSource::Inline("two-then-exit".into())).unwrap();
        assert_eq!(report.outcome, RunOutcome::Exited);
        assert!(report.outcome.is_success());
        assert_eq!(report.commands_recorded, 2);

        let stack = h.stack.lock().unwrap();
        let unit = stack.peek().unwrap();
        assert_eq!(unit.len(), 2);
        assert_eq!(unit.labels(), vec!["Set properties", "Set properties"]);
        assert_eq!(
            h.sample.graph.properties(&h.sample.graph.root()).unwrap(),
            vec![Property::new("a", "1"), Property::new("b", "2")]
        );
    }

    #[test]
    fn test_error_keeps_performed_commands() {
        let provider = ScriptedProvider::new("test.scripted", &[".ajs"]).on("half", |scope| {
            let model = scope.entity("model")?;
            model.set_name("Renamed").map_err(scope.dom())?;
            Err(ScriptError::Evaluation("TypeError: x is undefined".into()))
        });
        let h = harness(provider, inline_config());

        let report = h.runner.run(ScriptSource::Inline("half".into())).unwrap();
        assert_eq!(report.outcome, RunOutcome::Failed("TypeError: x is undefined".into()));
        assert_eq!(report.commands_recorded, 1);
        assert_eq!(
            h.sample.graph.text_attribute(&h.sample.graph.root(), TextAttribute::Name).as_deref(),
            Some("Renamed")
        );
        assert!(!h.runner.recorder().is_active());
    }

    #[test]
    fn test_rollback_on_error() {
        let provider = ScriptedProvider::new("test.scripted", &[".ajs"]).on("half", |scope| {
            let model = scope.entity("model")?;
            model.set_name("Renamed").map_err(scope.dom())?;
            Err(ScriptError::Evaluation("boom".into()))
        });
        let config = ScriptingConfig {
            rollback_on_error: true,
            ..inline_config()
        };
        let h = harness(provider, config);
        let before = h.sample.graph.to_json().unwrap();

        let report = h.runner.run(ScriptSource::Inline("half".into())).unwrap();
        assert_eq!(report.commands_rolled_back, 1);
        assert_eq!(report.commands_recorded, 0);
        assert_eq!(report.undo_label, None);
        assert!(!h.stack.lock().unwrap().can_undo());
        assert_eq!(h.sample.graph.to_json().unwrap(), before);
    }

    #[test]
    fn test_no_commands_no_unit() {
        let provider = ScriptedProvider::new("test.scripted", &[".ajs"]).on("read", |scope| {
            scope.entity("model")?.children();
            Ok(())
        });
        let h = harness(provider, inline_config());

        let report = h.runner.run(ScriptSource::Inline("read".into())).unwrap();
        assert_eq!(report.commands_recorded, 0);
        assert_eq!(report.undo_label, None);
        assert!(!h.stack.lock().unwrap().can_undo());
    }

    #[test]
    fn test_access_denied_surfaces_as_script_error() {
        let provider = ScriptedProvider::new("test.scripted", &[".ajs"]).on("rename", |scope| {
            scope.entity("model")?.set_name("x").map_err(scope.dom())?;
            Ok(())
        });
        let h = harness(provider, inline_config());
        h.sample.graph.set_read_only(true);

        let report = h.runner.run(ScriptSource::Inline("rename".into())).unwrap();
        match report.outcome {
            RunOutcome::Failed(message) => assert!(message.contains("read-only")),
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(report.commands_recorded, 0);
    }

    #[test]
    fn test_link_file_evaluates_target() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Real Script.ajs"), "target-body").unwrap();
        fs::write(dir.path().join("shortcut.link"), "Real Script.ajs\n").unwrap();

        let provider = ScriptedProvider::new("test.scripted", &[".ajs"]).on("target-body", |_| Ok(()));
        let log = provider.log();
        let h = harness(provider, inline_config());

        let report = h
            .runner
            .run(ScriptSource::File(dir.path().join("shortcut.link")))
            .unwrap();
        assert_eq!(report.outcome, RunOutcome::Completed);
        assert!(log.lock().unwrap().contains(&"eval:Real Script:target-body".to_string()));
    }

    #[test]
    fn test_file_label_is_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Tag Actors.ajs");
        fs::write(&path, "tag").unwrap();

        let provider = ScriptedProvider::new("test.scripted", &[".ajs"]).on("tag", |scope| {
            scope.entity("model")?.add_property("tagged", "yes").map_err(scope.dom())?;
            Ok(())
        });
        let h = harness(provider, inline_config());

        let report = h.runner.run(ScriptSource::File(path)).unwrap();
        assert_eq!(report.undo_label.as_deref(), Some("Tag Actors"));
        assert_eq!(h.stack.lock().unwrap().undo_label(), Some("Tag Actors"));
    }

    #[test]
    fn test_missing_file_fails_but_cleans_up() {
        let provider = ScriptedProvider::new("test.scripted", &[".ajs"]);
        let h = harness(provider, inline_config());

        let report = h
            .runner
            .run(ScriptSource::File(PathBuf::from("/no/such/dir/x.ajs")))
            .unwrap();
        assert!(matches!(report.outcome, RunOutcome::Failed(_)));
        assert!(!h.runner.recorder().is_active());
    }

    #[test]
    fn test_blocked_globals_removed_after_bindings() {
        let provider = ScriptedProvider::new("test.scripted", &[".ajs"]).on("noop", |_| Ok(()));
        let log = provider.log();
        let h = harness(provider, inline_config());

        h.runner.run(ScriptSource::Inline("noop".into())).unwrap();
        let events = log.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                "put:model".to_string(),
                "remove:exit".to_string(),
                "remove:quit".to_string(),
                "eval:Local Script:noop".to_string(),
            ]
        );
    }

    #[test]
    fn test_lifecycle_order() {
        let events = Arc::new(EventLog::default());
        let sample = sample_model();

        let provider = ScriptedProvider::new("test.scripted", &[".ajs"]).on("go", |scope| {
            scope.entity("model")?.set_name("d").map_err(scope.dom())?;
            Err(ScriptError::Evaluation("late failure".into()))
        });
        let mut providers = ProviderRegistry::new();
        providers.register(Arc::new(provider));
        let roots = StaticDomRegistry::new().with(DomRegistration::new(
            "scriptor.dom.model",
            "model",
            DomRootSupplier::Factory(Arc::new(ModelRootFactory::new(sample.graph.clone()))),
        ));
        let host = HostServices {
            ui: Some(UiHandles {
                workbench: HostHandle::new("workbench", "wb"),
                window: HostHandle::new("window", "win"),
                shell: HostHandle::new("shell", "sh"),
            }),
            console: Arc::new(RecordingConsole(events.clone())),
            refresh: Arc::new(RecordingRefresh(events.clone())),
            undo_stack: Arc::new(Mutex::new(RecordingStack {
                log: events.clone(),
                inner: CommandStack::default(),
            })),
        };
        let runner = ScriptRunner::new(inline_config(), providers, Arc::new(roots), host);

        runner.run(ScriptSource::Inline("go".into())).unwrap();
        assert_eq!(
            events.events(),
            vec![
                "console.start",
                "refresh.init",
                "refresh.finalise",
                "push:Local Script:1",
                "console.end",
            ]
        );
    }

    #[test]
    fn test_ui_host_bindings_reach_engine() {
        let provider = ScriptedProvider::new("test.scripted", &[".ajs"]).on("ui", |scope| {
            match scope.get("shell") {
                Some(Binding::Host(handle)) if handle.kind == "shell" => Ok(()),
                other => Err(ScriptError::Evaluation(format!("shell missing: {other:?}"))),
            }
        });
        let sample = sample_model();
        let mut providers = ProviderRegistry::new();
        providers.register(Arc::new(provider));
        let mut host = HostServices::headless(Arc::new(Mutex::new(CommandStack::default())));
        host.ui = Some(UiHandles {
            workbench: HostHandle::new("workbench", "wb"),
            window: HostHandle::new("window", "win"),
            shell: HostHandle::new("shell", "sh"),
        });
        let runner = ScriptRunner::new(
            inline_config(),
            providers,
            Arc::new(StaticDomRegistry::new().with(DomRegistration::new(
                "scriptor.dom.model",
                "model",
                DomRootSupplier::Factory(Arc::new(ModelRootFactory::new(sample.graph.clone()))),
            ))),
            host,
        );

        let report = runner.run(ScriptSource::Inline("ui".into())).unwrap();
        assert_eq!(report.outcome, RunOutcome::Completed);
    }
}
