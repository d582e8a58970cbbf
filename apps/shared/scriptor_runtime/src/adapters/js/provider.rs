use rquickjs::{Context, Runtime, Value};
use tracing::{debug, info};

use super::bindings::{self, is_exit_signal, JS_GLUE_CODE, SCRIPT_GLOBAL};
use super::JsEngineConfig;
use crate::config::ScriptingConfig;
use crate::engine::{Binding, ScriptEngine, ScriptEngineProvider};
use crate::error::{RunError, ScriptError};

/// Provider id of the JavaScript provider
pub const JS_PROVIDER_ID: &str = "scriptor.provider.js";

const JS_EXTENSIONS: &[&str] = &[".ajs", ".js"];

/// JavaScript provider backed by QuickJS
#[derive(Debug, Default, Clone, Copy)]
pub struct JsProvider;

impl JsProvider {
    pub fn new() -> Self {
        Self
    }
}

impl ScriptEngineProvider for JsProvider {
    fn id(&self) -> &str {
        JS_PROVIDER_ID
    }

    fn name(&self) -> &str {
        "JavaScript"
    }

    fn extensions(&self) -> &[&str] {
        JS_EXTENSIONS
    }

    fn create_engine(&self, config: &ScriptingConfig) -> Result<Box<dyn ScriptEngine>, RunError> {
        let engine = JsEngine::new(JsEngineConfig::from(&config.js)).map_err(|e| RunError::Engine {
            provider: JS_PROVIDER_ID.to_string(),
            message: e.to_string(),
        })?;
        Ok(Box::new(engine))
    }

    /// Evaluate the glue, then the script
    fn run_source(&self, source: &str, origin: &str, engine: &mut dyn ScriptEngine) -> Result<(), ScriptError> {
        engine.eval(JS_GLUE_CODE, "init")?;
        engine.eval(source, origin)
    }
}

/// One QuickJS runtime with a single full context
///
/// QuickJS is single-threaded: a JsEngine lives and dies on the thread that
/// runs the script.
pub struct JsEngine {
    context: Context,
    #[allow(dead_code)]
    runtime: Runtime,
}

impl JsEngine {
    /// Create a new engine
    ///
    /// # Arguments
    /// * `config` - Memory and stack limits
    pub fn new(config: JsEngineConfig) -> Result<Self, rquickjs::Error> {
        debug!("Initializing QuickJS runtime");

        let runtime = Runtime::new()?;
        if let Some(limit) = config.memory_limit() {
            runtime.set_memory_limit(limit);
        }
        if let Some(limit) = config.max_stack_size() {
            runtime.set_max_stack_size(limit);
        }
        let context = Context::full(&runtime)?;

        context.with(bindings::setup_native_api)?;

        info!("JavaScript runtime initialized successfully");
        Ok(Self { context, runtime })
    }
}

impl ScriptEngine for JsEngine {
    fn put(&mut self, name: &str, value: &Binding) -> Result<(), ScriptError> {
        self.context
            .with(|ctx| {
                let value = bindings::binding_to_js(&ctx, value)?;
                ctx.globals().set(name, value)
            })
            .map_err(|e| ScriptError::Evaluation(format!("Cannot bind '{}': {}", name, e)))
    }

    fn remove(&mut self, name: &str) -> Result<(), ScriptError> {
        self.context
            .with(|ctx| ctx.globals().remove(name))
            .map_err(|e| ScriptError::Evaluation(format!("Cannot remove '{}': {}", name, e)))
    }

    /// The run ends as `Exit` only when the exception that escaped the script
    /// is the `exit()` signal
    fn eval(&mut self, source: &str, origin: &str) -> Result<(), ScriptError> {
        self.context.with(|ctx| {
            ctx.globals()
                .set(SCRIPT_GLOBAL, origin)
                .map_err(|e| ScriptError::Evaluation(e.to_string()))?;

            match ctx.eval::<Value, _>(source) {
                Ok(_) => Ok(()),
                Err(rquickjs::Error::Exception) => {
                    let exception = ctx.catch();
                    if is_exit_signal(&exception) {
                        Err(ScriptError::Exit)
                    } else {
                        Err(ScriptError::Evaluation(format_js_error(&exception)))
                    }
                }
                Err(e) => Err(ScriptError::Evaluation(e.to_string())),
            }
        })
    }
}

/// Format a caught JavaScript exception with its stack trace
fn format_js_error(exception: &Value) -> String {
    if let Some(obj) = exception.as_object() {
        let text = |key: &str| -> Option<String> {
            obj.get::<_, Value>(key)
                .ok()
                .and_then(|v| v.as_string().and_then(|s| s.to_string().ok()))
                .filter(|s| !s.is_empty())
        };
        let name = text("name").unwrap_or_else(|| String::from("Error"));
        let mut output = match text("message") {
            Some(message) => format!("{}: {}", name, message),
            None => name.clone(),
        };
        if let Some(stack) = text("stack") {
            if stack.starts_with(&name) {
                output = stack;
            } else {
                output.push('\n');
                output.push_str(stack.trim_end());
            }
        }
        return output;
    }

    if let Some(s) = exception.as_string() {
        if let Ok(msg) = s.to_string() {
            return format!("Error: {}", msg);
        }
    }

    String::from("Error: Unknown JavaScript error")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::CommandStack;
    use crate::dom::{DomRegistration, DomRootSupplier, ModelRootFactory, StaticDomRegistry};
    use crate::engine::{HostServices, RunOutcome, ScriptRunner, ScriptSource};
    use crate::engine::ProviderRegistry;
    use crate::model::TextAttribute;
    use crate::test_support::{sample_model, SampleModel};
    use std::sync::{Arc, Mutex};

    fn runner(sample: &SampleModel) -> (ScriptRunner, Arc<Mutex<CommandStack>>) {
        let mut providers = ProviderRegistry::new();
        providers.register(Arc::new(JsProvider::new()));
        let registry = StaticDomRegistry::new().with(DomRegistration::new(
            "scriptor.dom.model",
            "model",
            DomRootSupplier::Factory(Arc::new(ModelRootFactory::new(sample.graph.clone()))),
        ));
        let stack = Arc::new(Mutex::new(CommandStack::new(0)));
        let host = HostServices::headless(stack.clone());
        (
            ScriptRunner::new(ScriptingConfig::default(), providers, Arc::new(registry), host),
            stack,
        )
    }

    fn name_of(sample: &SampleModel) -> Option<String> {
        sample.graph.text_attribute(&sample.actor, TextAttribute::Name)
    }

    #[test]
    fn test_script_renames_through_commands() {
        let sample = sample_model();
        let (runner, stack) = runner(&sample);

        let report = runner
            .run(ScriptSource::Inline(
                r#"
                const business = model.children("folder").find((f) => f.name === "Business");
                const clerk = business.children("business-actor")[0];
                clerk.name = "Teller";
                clerk.addProperty("tier", "gold");
                console.log("renamed", clerk);
                "#
                .into(),
            ))
            .unwrap();

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.commands_recorded, 2);
        assert_eq!(name_of(&sample).as_deref(), Some("Teller"));

        stack.lock().unwrap().undo().unwrap();
        assert_eq!(name_of(&sample).as_deref(), Some("Clerk"));
        assert!(sample.graph.properties(&sample.actor).unwrap().is_empty());
    }

    #[test]
    fn test_exit_keeps_earlier_changes() {
        let sample = sample_model();
        let (runner, _) = runner(&sample);

        let report = runner
            .run(ScriptSource::Inline(
                r#"
                model.name = "Renamed";
                exit();
                model.name = "Unreachable";
                "#
                .into(),
            ))
            .unwrap();

        assert_eq!(report.outcome, RunOutcome::Exited);
        assert_eq!(report.commands_recorded, 1);
        assert_eq!(
            sample.graph.text_attribute(&sample.graph.root(), TextAttribute::Name).as_deref(),
            Some("Renamed")
        );
    }

    #[test]
    fn test_caught_exit_then_error_fails() {
        let sample = sample_model();
        let (runner, _) = runner(&sample);

        let report = runner
            .run(ScriptSource::Inline(
                r#"
                try { exit(); } catch (e) {}
                model.name = "After";
                throw new Error("real failure");
                "#
                .into(),
            ))
            .unwrap();

        match report.outcome {
            RunOutcome::Failed(message) => assert!(message.contains("Error: real failure"), "{message}"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(report.commands_recorded, 1);
    }

    #[test]
    fn test_caught_exit_then_success_completes() {
        let sample = sample_model();
        let (runner, _) = runner(&sample);

        let report = runner
            .run(ScriptSource::Inline("try { exit(); } catch (e) {} model.name = 'After';".into()))
            .unwrap();

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.commands_recorded, 1);
    }

    #[test]
    fn test_error_named_exit_is_a_failure() {
        let sample = sample_model();
        let (runner, _) = runner(&sample);

        let report = runner.run(ScriptSource::Inline("throw new Error('exit');".into())).unwrap();

        assert!(matches!(report.outcome, RunOutcome::Failed(_)));
    }

    #[test]
    fn test_thrown_error_is_reported() {
        let sample = sample_model();
        let (runner, _) = runner(&sample);

        let report = runner
            .run(ScriptSource::Inline("throw new TypeError('bad input');".into()))
            .unwrap();

        match report.outcome {
            RunOutcome::Failed(message) => assert!(message.contains("TypeError: bad input"), "{message}"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_quit_is_not_defined() {
        let sample = sample_model();
        let (runner, _) = runner(&sample);

        let report = runner
            .run(ScriptSource::Inline("if (typeof quit !== 'undefined') throw new Error('quit');".into()))
            .unwrap();

        assert_eq!(report.outcome, RunOutcome::Completed);
    }

    #[test]
    fn test_deleting_the_root_throws() {
        let sample = sample_model();
        let (runner, _) = runner(&sample);

        let report = runner.run(ScriptSource::Inline("model.delete();".into())).unwrap();

        assert!(matches!(report.outcome, RunOutcome::Failed(_)));
        assert!(sample.graph.contains(&sample.graph.root()));
    }

    #[test]
    fn test_properties_round_trip() {
        let sample = sample_model();
        let (runner, _) = runner(&sample);

        let report = runner
            .run(ScriptSource::Inline(
                r#"
                model.setProperties([{ key: "a", value: "1" }, ["b", ""], { key: "c" }]);
                const props = model.getProperties();
                if (props.length !== 2 || props[1].key !== "b" || props[1].value !== "") {
                    throw new Error(JSON.stringify(props));
                }
                model.setProperties(model.getProperties());
                "#
                .into(),
            ))
            .unwrap();

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.commands_recorded, 1);
    }

    #[test]
    fn test_property_accessor_names() {
        let sample = sample_model();
        let (runner, _) = runner(&sample);

        let report = runner
            .run(ScriptSource::Inline(
                r#"
                model.addProperty("k", "v1");
                model.addProperty("k", "v2");
                const keys = model.getPropertyKey();
                const values = model.getPropertyValue("k");
                if (keys.length !== 1 || keys[0] !== "k") throw new Error(JSON.stringify(keys));
                if (values.join(",") !== "v1,v2") throw new Error(JSON.stringify(values));
                if (model.getPropertyKeys()[0] !== "k") throw new Error("keys alias");
                if (model.getPropertyValues("k").length !== 2) throw new Error("values alias");
                "#
                .into(),
            ))
            .unwrap();

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.commands_recorded, 2);
    }

    #[test]
    fn test_connection_relationship_swap() {
        let sample = sample_model();
        let (runner, _) = runner(&sample);

        let script = format!(
            r##"
            const views = model.children("folder").find((f) => f.name === "Views");
            const view = views.children()[0];
            const clerk = view.children()[0];
            if (clerk.concept().type !== "business-actor") throw new Error("concept");
            const relations = model.children("folder").find((f) => f.name === "Relations");
            const serving = relations.children("#{}")[0];
            const assignment = relations.children("#{}")[0];
            if (!serving.source().equals(assignment.target())) throw new Error("ends");
            "##,
            sample.serving, sample.assignment
        );
        let report = runner.run(ScriptSource::Inline(script)).unwrap();

        assert_eq!(report.outcome, RunOutcome::Completed);
    }
}
