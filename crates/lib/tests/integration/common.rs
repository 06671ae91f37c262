//! Shared fixtures for the integration tests.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A chart tree in a temporary directory.
pub struct Fixture {
  _temp: TempDir,
  pub root: PathBuf,
}

impl Fixture {
  pub fn new(name: &str) -> Self {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join(name);
    let fixture = Self { _temp: temp, root };
    fixture.write("Chart.yaml", &format!("apiVersion: v2\nname: {}\nversion: 0.1.0\n", name));
    fixture
  }

  pub fn write(&self, relative: &str, content: &str) -> &Self {
    let path = self.root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
    self
  }

  pub fn path(&self) -> &Path {
    &self.root
  }

  pub fn file(&self, relative: &str) -> PathBuf {
    self.root.join(relative)
  }
}

/// A web application chart with a database dependency that has its own cache.
///
/// ```text
/// web/
///   templates/{deployment.yaml, service.yaml, _helpers.tpl, NOTES.txt, empty.yaml}
///   charts/db/
///     templates/secret.yaml
///     charts/cache/templates/svc.yaml
/// ```
pub fn web_chart() -> Fixture {
  let fixture = Fixture::new("web");
  fixture
    .write(
      "Chart.yaml",
      r#"apiVersion: v2
name: web
version: 0.1.0
appVersion: "2.4.1"
dependencies:
  - name: db
    version: ^1.0.0
    condition: db.enabled
"#,
    )
    .write(
      "values.yaml",
      "replicas: 1\nimage:\n  repository: nginx\n  tag: stable\nglobal:\n  domain: example.com\ndb:\n  enabled: true\n",
    )
    .write(
      "templates/_helpers.tpl",
      "{% macro fullname(release, chart) %}{{ release }}-{{ chart }}{% endmacro %}",
    )
    .write(
      "templates/deployment.yaml",
      r#"{% from "_helpers.tpl" import fullname %}kind: Deployment
metadata:
  name: {{ fullname(Release.Name, Chart.Name) }}
spec:
  replicas: {{ Values.replicas }}
  image: {{ Values.image.repository }}:{{ Values.image.tag }}
  version: {{ Chart.AppVersion }}
"#,
    )
    .write("templates/service.yaml", "kind: Service\nhost: {{ Values.global.domain }}\n")
    .write("templates/NOTES.txt", "Visit https://{{ Values.global.domain }}\n")
    .write("templates/empty.yaml", "{% if false %}kind: Nothing{% endif %}\n  \n")
    .write("charts/db/Chart.yaml", "apiVersion: v2\nname: db\nversion: 1.2.0\n")
    .write("charts/db/values.yaml", "port: 5432\n")
    .write(
      "charts/db/templates/secret.yaml",
      "kind: Secret\nport: {{ Values.port }}\ndomain: {{ Values.global.domain }}\n",
    )
    .write("charts/db/charts/cache/Chart.yaml", "apiVersion: v2\nname: cache\nversion: 0.3.0\n")
    .write("charts/db/charts/cache/templates/svc.yaml", "kind: Service\nname: {{ Template.Name }}\n");
  fixture
}
