//! End-to-end prompt run.
//!
//! 1. Locate the template in the search directories
//! 2. Resolve `--module` and merge its variables
//! 3. Render the template (injectors run here)
//! 4. Mirror the prompt to the active buffer file
//! 5. Run one rotation round
//! 6. Optionally continue as an interactive session
//! 7. Remove the buffer file
//!
//! The buffer is removed on every exit path: explicitly on success and by its
//! destructor when an error returns early.

use crate::backend::{Backend, rotate};
use crate::buffer::PromptBuffer;
use crate::config::Settings;
use crate::error::Result;
use crate::session::{Operator, Session};
use crate::template::{
    Injectors, Renderer, Variables, locate, resolve_module, with_trailing_slash,
};
use log::info;
use serde_json::Value;
use std::sync::Arc;

/// Everything the operator asked for on the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptRequest {
    pub template_name: String,
    pub variables: Variables,
    pub module: Option<String>,
    /// Rotation order; never empty.
    pub models: Vec<String>,
    pub interactive: bool,
}

/// Locate, resolve and render the requested template.
pub fn render_prompt(
    request: &PromptRequest,
    settings: &Settings,
    injectors: Arc<dyn Injectors>,
) -> Result<String> {
    let template = locate(
        &request.template_name,
        &settings.search_dirs,
        &settings.template_extension,
    )?;

    let mut vars = request.variables.clone();
    match &request.module {
        Some(name) => {
            let module = resolve_module(name, &settings.module_roots)?;
            info!(
                "[Context] Targeting {} module: {}",
                module.kind, module.name
            );
            module.apply(&mut vars);
        }
        None => {
            vars.entry("root_path".to_string()).or_insert_with(|| {
                Value::String(with_trailing_slash(&settings.project_root))
            });
        }
    }

    info!(
        "[Render] Rendering {} with variables: {}",
        template.path.display(),
        serde_json::to_string_pretty(&vars).unwrap_or_default()
    );

    Renderer::new(injectors, settings.search_dirs.clone()).render(&template, &vars)
}

/// Run the whole request.
pub fn run<B, O>(
    request: &PromptRequest,
    settings: &Settings,
    backend: &mut B,
    operator: &mut O,
    injectors: Arc<dyn Injectors>,
) -> Result<()>
where
    B: Backend + ?Sized,
    O: Operator + ?Sized,
{
    let rendered = render_prompt(request, settings, injectors)?;
    let buffer = PromptBuffer::create(&settings.temp_dir, &rendered)?;

    info!(
        "[Agent] Model rotation strategy: [{}]",
        request.models.join(", ")
    );
    let output = rotate(backend, &rendered, &request.models).into_output()?;

    if request.interactive {
        let mut session = Session::start(rendered, output);
        session.run(backend, operator, &request.models, &buffer)?;
    }

    buffer.close();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::buffer_file_name;
    use crate::config::{Config, ModuleKind, ModuleRoot};
    use crate::error::RelayError;
    use crate::test_support::{ScriptedBackend, ScriptedOperator, StubInjectors, models};
    use serde_json::json;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    struct Fixture {
        _temp_dir: TempDir,
        settings: Settings,
    }

    impl Fixture {
        fn new() -> Self {
            let temp_dir = TempDir::new().unwrap();
            let root = temp_dir.path().to_path_buf();
            for dir in [
                "prompts",
                "agents",
                "apps/frontend/modules",
                "apps/backend/modules",
                "tmp",
            ] {
                std::fs::create_dir_all(root.join(dir)).unwrap();
            }

            let config = Config {
                search_dirs: vec![PathBuf::from("prompts"), PathBuf::from("agents")],
                module_roots: vec![
                    ModuleRoot {
                        kind: ModuleKind::Frontend,
                        path: PathBuf::from("apps/frontend/modules"),
                    },
                    ModuleRoot {
                        kind: ModuleKind::Backend,
                        path: PathBuf::from("apps/backend/modules"),
                    },
                ],
                temp_dir: Some(PathBuf::from("tmp")),
                ..Config::default()
            };
            let settings = Settings::resolve(config, root.clone(), root.join("unused"));

            Self {
                _temp_dir: temp_dir,
                settings,
            }
        }

        fn root(&self) -> &Path {
            &self.settings.project_root
        }

        fn write(&self, relative: &str, content: &str) {
            std::fs::write(self.root().join(relative), content).unwrap();
        }

        fn buffer_path(&self) -> PathBuf {
            self.settings
                .temp_dir
                .join(buffer_file_name(std::process::id()))
        }
    }

    fn request(template: &str, vars: serde_json::Value) -> PromptRequest {
        PromptRequest {
            template_name: template.to_string(),
            variables: serde_json::from_value(vars).unwrap(),
            module: None,
            models: models(&["backendA", "backendB"]),
            interactive: false,
        }
    }

    fn stub() -> Arc<dyn Injectors> {
        Arc::new(StubInjectors::default())
    }

    #[test]
    fn test_render_uses_cli_variables_and_default_root_path() {
        let fx = Fixture::new();
        fx.write("agents/review.md", "Review {{ target }} under {{ root_path }}");

        let out = render_prompt(
            &request("review", json!({"target": "src/foo.ts"})),
            &fx.settings,
            stub(),
        )
        .unwrap();

        assert_eq!(
            out,
            format!("Review src/foo.ts under {}/", fx.root().display())
        );
    }

    #[test]
    fn test_cli_root_path_is_kept_without_module() {
        let fx = Fixture::new();
        fx.write("prompts/a.md", "{{ root_path }}");

        let out = render_prompt(
            &request("a", json!({"root_path": "/custom/"})),
            &fx.settings,
            stub(),
        )
        .unwrap();
        assert_eq!(out, "/custom/");
    }

    #[test]
    fn test_module_variables_reach_template() {
        let fx = Fixture::new();
        std::fs::create_dir_all(fx.root().join("apps/backend/modules/ledger")).unwrap();
        fx.write(
            "prompts/brief.md",
            "{{ module_type }}:{{ module_name }}:{{ root_path }}\n{{ context(module_root) }}",
        );
        let mut req = request("brief", json!({}));
        req.module = Some("ledger".to_string());

        let out = render_prompt(&req, &fx.settings, stub()).unwrap();

        let module_root = fx.root().join("apps/backend/modules/ledger");
        assert_eq!(
            out,
            format!(
                "backend:ledger:{}/\n<CODEBASE_CONTEXT path=\"{}\">\nstub context for {}\n</CODEBASE_CONTEXT>",
                module_root.display(),
                module_root.display(),
                module_root.display()
            )
        );
    }

    #[test]
    fn test_failing_injectors_do_not_abort_render() {
        let fx = Fixture::new();
        fx.write("prompts/a.md", "[{{ context('src') }}][{{ read('gone.md') }}]");
        let injectors = StubInjectors {
            missing_files: vec!["gone.md".to_string()],
            failing_contexts: vec!["src".to_string()],
        };

        let out = render_prompt(&request("a", json!({})), &fx.settings, Arc::new(injectors))
            .unwrap();

        assert_eq!(out, "[[Error generating context for src]][]");
    }

    #[test]
    fn test_success_cleans_up_buffer() {
        let fx = Fixture::new();
        fx.write("prompts/a.md", "hello {{ who }}");
        let mut backend = ScriptedBackend::new()
            .rate_limit("backendA")
            .succeed("backendB", "done");

        run(
            &request("a", json!({"who": "world"})),
            &fx.settings,
            &mut backend,
            &mut ScriptedOperator::new(&[]),
            stub(),
        )
        .unwrap();

        assert_eq!(backend.calls(), vec!["backendA", "backendB"]);
        assert_eq!(backend.prompts()[1], "hello world");
        assert!(!fx.buffer_path().exists());
    }

    #[test]
    fn test_fatal_backend_cleans_up_buffer_and_propagates_code() {
        let fx = Fixture::new();
        fx.write("prompts/a.md", "x");
        let mut backend = ScriptedBackend::new()
            .fail("backendA", 2, "bad input")
            .succeed("backendB", "never");

        let err = run(
            &request("a", json!({})),
            &fx.settings,
            &mut backend,
            &mut ScriptedOperator::new(&[]),
            stub(),
        )
        .unwrap_err();

        assert_eq!(err.exit_code(), 2);
        assert_eq!(backend.calls(), vec!["backendA"]);
        assert!(!fx.buffer_path().exists());
    }

    #[test]
    fn test_exhausted_queue_cleans_up_buffer() {
        let fx = Fixture::new();
        fx.write("prompts/a.md", "x");
        let mut backend = ScriptedBackend::new()
            .rate_limit("backendA")
            .rate_limit("backendB");

        let err = run(
            &request("a", json!({})),
            &fx.settings,
            &mut backend,
            &mut ScriptedOperator::new(&[]),
            stub(),
        )
        .unwrap_err();

        assert!(matches!(err, RelayError::Exhausted { .. }));
        assert_eq!(err.exit_code(), 1);
        assert!(!fx.buffer_path().exists());
    }

    #[test]
    fn test_interactive_session_then_exit() {
        let fx = Fixture::new();
        fx.write("prompts/a.md", "P");
        let mut backend = ScriptedBackend::new()
            .succeed("backendA", "first")
            .succeed("backendA", "second");
        let mut req = request("a", json!({}));
        req.interactive = true;

        run(
            &req,
            &fx.settings,
            &mut backend,
            &mut ScriptedOperator::new(&["more", "Quit "]),
            stub(),
        )
        .unwrap();

        assert_eq!(backend.prompts(), vec!["P", "P\nfirst\nUser: more\n"]);
        assert!(!fx.buffer_path().exists());
    }

    #[test]
    fn test_interactive_failure_cleans_up_buffer() {
        let fx = Fixture::new();
        fx.write("prompts/a.md", "P");
        let mut backend = ScriptedBackend::new()
            .succeed("backendA", "first")
            .fail("backendA", 5, "oops");
        let mut req = request("a", json!({}));
        req.interactive = true;

        let err = run(
            &req,
            &fx.settings,
            &mut backend,
            &mut ScriptedOperator::new(&["again"]),
            stub(),
        )
        .unwrap_err();

        assert_eq!(err.exit_code(), 5);
        assert!(!fx.buffer_path().exists());
    }

    #[test]
    fn test_non_interactive_never_asks_operator() {
        let fx = Fixture::new();
        fx.write("prompts/a.md", "P");
        let mut backend = ScriptedBackend::new().succeed("backendA", "out");
        let mut operator = ScriptedOperator::new(&["unused"]);

        run(&request("a", json!({})), &fx.settings, &mut backend, &mut operator, stub()).unwrap();

        assert_eq!(operator.remaining(), 1);
    }

    #[test]
    fn test_missing_template_runs_no_backend() {
        let fx = Fixture::new();
        let mut backend = ScriptedBackend::new();

        let err = run(
            &request("absent", json!({})),
            &fx.settings,
            &mut backend,
            &mut ScriptedOperator::new(&[]),
            stub(),
        )
        .unwrap_err();

        assert!(matches!(err, RelayError::TemplateNotFound { .. }));
        assert!(backend.calls().is_empty());
        assert!(!fx.buffer_path().exists());
    }

    #[test]
    fn test_missing_module_is_fatal() {
        let fx = Fixture::new();
        fx.write("prompts/a.md", "x");
        let mut req = request("a", json!({}));
        req.module = Some("ghost".to_string());
        let mut backend = ScriptedBackend::new();

        let err = run(
            &req,
            &fx.settings,
            &mut backend,
            &mut ScriptedOperator::new(&[]),
            stub(),
        )
        .unwrap_err();

        assert!(matches!(err, RelayError::ModuleNotFound { .. }));
        assert_eq!(err.exit_code(), 1);
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_render_error_is_fatal() {
        let fx = Fixture::new();
        fx.write("prompts/bad.md", "{% for x in %}");
        let mut backend = ScriptedBackend::new();

        let err = run(
            &request("bad", json!({})),
            &fx.settings,
            &mut backend,
            &mut ScriptedOperator::new(&[]),
            stub(),
        )
        .unwrap_err();

        assert!(matches!(err, RelayError::Render { .. }));
        assert!(err.to_string().contains("bad.md"));
        assert!(backend.calls().is_empty());
    }

    /// Records whether the buffer file exists each time a backend starts.
    struct BufferWatch {
        inner: ScriptedBackend,
        buffer_path: PathBuf,
        seen: Vec<(bool, String)>,
    }

    impl BufferWatch {
        fn new(inner: ScriptedBackend, buffer_path: PathBuf) -> Self {
            Self {
                inner,
                buffer_path,
                seen: Vec::new(),
            }
        }
    }

    impl Backend for BufferWatch {
        fn attempt(&mut self, model: &str, prompt: &str) -> crate::backend::Attempt {
            let contents = std::fs::read_to_string(&self.buffer_path).unwrap_or_default();
            self.seen.push((self.buffer_path.exists(), contents));
            self.inner.attempt(model, prompt)
        }
    }

    #[test]
    fn test_buffer_exists_before_first_backend_on_success() {
        let fx = Fixture::new();
        fx.write("prompts/a.md", "rendered {{ who }}");
        let mut backend = BufferWatch::new(
            ScriptedBackend::new().rate_limit("backendA").succeed("backendB", "ok"),
            fx.buffer_path(),
        );

        run(
            &request("a", json!({"who": "text"})),
            &fx.settings,
            &mut backend,
            &mut ScriptedOperator::new(&[]),
            stub(),
        )
        .unwrap();

        assert_eq!(
            backend.seen,
            vec![
                (true, "rendered text".to_string()),
                (true, "rendered text".to_string())
            ]
        );
        assert!(!fx.buffer_path().exists());
    }

    #[test]
    fn test_buffer_exists_before_first_backend_on_fatal_failure() {
        let fx = Fixture::new();
        fx.write("prompts/a.md", "x");
        let mut backend = BufferWatch::new(
            ScriptedBackend::new().fail("backendA", 3, "broken"),
            fx.buffer_path(),
        );

        let err = run(
            &request("a", json!({})),
            &fx.settings,
            &mut backend,
            &mut ScriptedOperator::new(&[]),
            stub(),
        )
        .unwrap_err();

        assert_eq!(err.exit_code(), 3);
        assert_eq!(backend.seen, vec![(true, "x".to_string())]);
        assert!(!fx.buffer_path().exists());
    }

    #[test]
    fn test_buffer_tracks_interactive_turns_then_disappears() {
        let fx = Fixture::new();
        fx.write("prompts/a.md", "P");
        let mut backend = BufferWatch::new(
            ScriptedBackend::new()
                .succeed("backendA", "first")
                .succeed("backendA", "second"),
            fx.buffer_path(),
        );
        let mut req = request("a", json!({}));
        req.interactive = true;

        run(
            &req,
            &fx.settings,
            &mut backend,
            &mut ScriptedOperator::new(&["more", "exit"]),
            stub(),
        )
        .unwrap();

        assert_eq!(
            backend.seen,
            vec![
                (true, "P".to_string()),
                (true, "P\nfirst\nUser: more\n".to_string())
            ]
        );
        assert!(!fx.buffer_path().exists());
    }
}
