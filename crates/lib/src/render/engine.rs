//! The template engine.
//!
//! [`TemplateEngine`] is the seam between the pipeline and whatever evaluates
//! templates. [`JinjaEngine`] is the implementation shipped with the crate; it
//! renders every template of the chart tree with [`minijinja`].
//!
//! Each template sees:
//!
//! ```text
//! Values        values scoped to the template's own chart
//! Release       release information (shared)
//! Capabilities  cluster capabilities (shared)
//! Chart         metadata of the template's own chart
//! Template      Name (template identifier) and BasePath
//! ```
//!
//! Includes are resolved relative to the owning chart's `templates/` directory,
//! so `{% include "_helpers.tpl" %}` finds the chart's own helpers from any
//! nested template. A `./` prefix resolves next to the including template.

use std::borrow::Cow;
use std::collections::HashMap;

use minijinja::{Environment, ErrorKind, UndefinedBehavior};
use serde_yaml::Value;
use thiserror::Error;
use tracing::debug;

use crate::chart::Chart;
use crate::consts::{CHARTS_DIR, NOTES_FILE, TEMPLATES_DIR};
use crate::values::{Values, child_table};

/// Rendered file bodies keyed by template identifier, in no particular order.
pub type RenderedFiles = HashMap<String, String>;

/// Errors reported by the template engine.
#[derive(Debug, Error)]
pub enum RenderEngineError {
  /// A template failed to parse.
  #[error("failed to parse template {name}: {source}")]
  Parse {
    name: String,
    #[source]
    source: minijinja::Error,
  },

  /// A template failed to evaluate.
  #[error("failed to render template {name}: {source}")]
  Render {
    name: String,
    #[source]
    source: minijinja::Error,
  },

  /// The render values lack a required top-level key.
  #[error("render values have no '{0}' entry")]
  MissingKey(&'static str),
}

/// Renders every template of a chart tree against the full values tree.
pub trait TemplateEngine: Send + Sync {
  fn render(&self, chart: &Chart, values: &Values) -> Result<RenderedFiles, RenderEngineError>;
}

/// Template engine backed by [`minijinja`].
#[derive(Debug, Clone, Copy, Default)]
pub struct JinjaEngine {
  strict: bool,
}

impl JinjaEngine {
  pub fn new() -> Self {
    Self::default()
  }

  /// Fail on undefined values instead of rendering them as empty.
  pub fn strict(mut self, strict: bool) -> Self {
    self.strict = strict;
    self
  }
}

struct Job {
  name: String,
  context: Values,
}

impl TemplateEngine for JinjaEngine {
  fn render(&self, chart: &Chart, values: &Values) -> Result<RenderedFiles, RenderEngineError> {
    let scoped = match values.get("Values") {
      Some(Value::Mapping(scoped)) => scoped.clone(),
      _ => return Err(RenderEngineError::MissingKey("Values")),
    };

    let mut env = Environment::new();
    env.set_undefined_behavior(if self.strict {
      UndefinedBehavior::Strict
    } else {
      UndefinedBehavior::Lenient
    });
    env.set_keep_trailing_newline(true);
    env.set_path_join_callback(join_template_path);
    env.add_filter("toyaml", to_yaml);
    env.add_filter("quote", quote);

    let mut jobs = Vec::new();
    register(&mut env, chart, &scoped, values, &mut jobs)?;

    let mut rendered = RenderedFiles::with_capacity(jobs.len());
    for job in jobs {
      let source = |source| RenderEngineError::Render {
        name: job.name.clone(),
        source,
      };
      let template = env.get_template(&job.name).map_err(source)?;
      let body = template
        .render(minijinja::Value::from_serialize(&job.context))
        .map_err(source)?;
      debug!(template = %job.name, bytes = body.len(), "rendered template");
      rendered.insert(job.name, body);
    }

    Ok(rendered)
  }
}

fn register(
  env: &mut Environment<'static>,
  chart: &Chart,
  scoped: &Values,
  top: &Values,
  jobs: &mut Vec<Job>,
) -> Result<(), RenderEngineError> {
  let base = chart.full_path();

  for template in &chart.templates {
    let name = chart.template_id(template);
    env
      .add_template_owned(name.clone(), template.data.clone())
      .map_err(|source| RenderEngineError::Parse {
        name: name.clone(),
        source,
      })?;

    if template.is_partial() || template.display_name() == NOTES_FILE {
      continue;
    }

    let mut context = Values::new();
    for key in ["Release", "Capabilities"] {
      if let Some(value) = top.get(key) {
        context.insert(key.into(), value.clone());
      }
    }
    context.insert("Values".into(), Value::Mapping(scoped.clone()));
    context.insert("Chart".into(), chart.metadata.to_template_object());
    let mut template_info = Values::new();
    template_info.insert("Name".into(), name.as_str().into());
    template_info.insert("BasePath".into(), format!("{}/{}", base, TEMPLATES_DIR).into());
    context.insert("Template".into(), Value::Mapping(template_info));

    jobs.push(Job { name, context });
  }

  for dep in chart.dependencies() {
    let child = child_table(scoped, dep.name()).unwrap_or_default();
    register(env, dep, &child, top, jobs)?;
  }

  Ok(())
}

/// Resolve an include name against the including template.
///
/// Names containing a `templates/` segment are template identifiers and used
/// as is. Names starting with `./` are relative to the including template's
/// directory. Anything else is relative to the owning chart's `templates/`
/// directory, so nested templates reach the chart's `_helpers.tpl`.
fn join_template_path<'s>(name: &'s str, parent: &'s str) -> Cow<'s, str> {
  if name.split('/').any(|segment| segment == TEMPLATES_DIR) {
    return Cow::Borrowed(name);
  }

  let base = match name.strip_prefix("./") {
    Some(_) => parent.rsplit_once('/').map(|(dir, _)| dir),
    None => template_base(parent).or_else(|| parent.rsplit_once('/').map(|(dir, _)| dir)),
  };
  match base {
    Some(base) => Cow::Owned(format!("{}/{}", base, name.trim_start_matches("./"))),
    None => Cow::Borrowed(name),
  }
}

/// The `<chart full path>/templates` prefix of a template identifier.
///
/// Identifiers look like `root(/charts/<name>)*/templates/<file>`.
fn template_base(id: &str) -> Option<&str> {
  let segments: Vec<&str> = id.split('/').collect();
  let mut i = 1;
  while segments.get(i) == Some(&CHARTS_DIR) && i + 2 < segments.len() {
    i += 2;
  }
  if segments.get(i) != Some(&TEMPLATES_DIR) {
    return None;
  }
  let len = segments[..=i].iter().map(|s| s.len()).sum::<usize>() + i;
  Some(&id[..len])
}

fn to_yaml(value: minijinja::Value) -> Result<String, minijinja::Error> {
  serde_yaml::to_string(&value)
    .map(|s| s.trim_end_matches('\n').to_string())
    .map_err(|e| minijinja::Error::new(ErrorKind::InvalidOperation, format!("cannot convert to YAML: {}", e)))
}

fn quote(value: minijinja::Value) -> String {
  let text = match value.as_str() {
    Some(s) => s.to_string(),
    None => value.to_string(),
  };
  serde_json::to_string(&text).unwrap_or(text)
}
