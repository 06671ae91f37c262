//! The whole render pipeline against charts on disk.

use chartpeek_lib::assemble::{RenderError, RenderSource, assemble};
use chartpeek_lib::chart::load_chart;
use chartpeek_lib::render::{JinjaEngine, split_document};
use chartpeek_lib::values::{OverlayError, ReleaseOptions, load_overlays};

use super::common::{Fixture, web_chart};

fn release() -> ReleaseOptions {
  ReleaseOptions::new("prod", "web-ns", false)
}

mod rendering {
  use super::*;

  #[test]
  fn renders_every_chart_in_the_tree() {
    let fixture = web_chart();
    let chart = load_chart(fixture.path()).unwrap();

    let response = assemble(&chart, &[], &release(), &JinjaEngine::new()).unwrap();
    let names: Vec<_> = response.preview_files.iter().map(|f| f.filename.as_str()).collect();
    assert_eq!(
      names,
      vec!["db/cache/svc.yaml", "db/secret.yaml", "deployment.yaml", "service.yaml"]
    );

    let deployment = &response.preview_files[2].preview;
    assert!(deployment.contains("name: prod-web\n"), "{}", deployment);
    assert!(deployment.contains("image: nginx:stable\n"));
    assert!(deployment.contains("version: 2.4.1\n"));

    let secret = &response.preview_files[1].preview;
    assert_eq!(secret, "kind: Secret\nport: 5432\ndomain: example.com\n");

    let cache = &response.preview_files[0].preview;
    assert_eq!(cache, "kind: Service\nname: web/charts/db/charts/cache/templates/svc.yaml\n");
  }

  #[test]
  fn notes_partials_and_blank_output_are_not_previewed() {
    let fixture = web_chart();
    let chart = load_chart(fixture.path()).unwrap();

    let response = assemble(&chart, &[], &release(), &JinjaEngine::new()).unwrap();
    for hidden in ["NOTES.txt", "_helpers.tpl", "empty.yaml"] {
      assert!(!response.preview.contains(hidden), "{} leaked into the preview", hidden);
    }
  }

  #[test]
  fn rerendering_is_byte_identical() {
    let fixture = web_chart();
    let chart = load_chart(fixture.path()).unwrap();
    let engine = JinjaEngine::new();

    let first = serde_json::to_string(&assemble(&chart, &[], &release(), &engine).unwrap()).unwrap();
    for _ in 0..5 {
      let again = serde_json::to_string(&assemble(&chart, &[], &release(), &engine).unwrap()).unwrap();
      assert_eq!(first, again);
    }
  }

  #[test]
  fn preview_document_splits_back_into_entries() {
    let fixture = web_chart();
    let chart = load_chart(fixture.path()).unwrap();

    let response = assemble(&chart, &[], &release(), &JinjaEngine::new()).unwrap();
    assert_eq!(split_document(&response.preview), response.preview_files);
  }
}

mod overlays {
  use super::*;

  #[test]
  fn later_overlays_win_and_siblings_survive() {
    let fixture = web_chart();
    fixture
      .write("env/base.yaml", "replicas: 2\nimage:\n  tag: alpine\n")
      .write("env/prod.yaml", "replicas: 5\n");
    let chart = load_chart(fixture.path()).unwrap();
    let overlays = load_overlays(&[fixture.file("env/base.yaml"), fixture.file("env/prod.yaml")]).unwrap();

    let response = assemble(&chart, &overlays, &release(), &JinjaEngine::new()).unwrap();
    assert_eq!(response.values, "image:\n  tag: alpine\nreplicas: 5\n");

    let deployment = &response.preview_files[2].preview;
    assert!(deployment.contains("replicas: 5\n"));
    assert!(deployment.contains("image: nginx:alpine\n"));
  }

  #[test]
  fn overlays_reach_into_subcharts() {
    let fixture = web_chart();
    fixture.write("env/db.yaml", "db:\n  port: 6543\nglobal:\n  domain: test.local\n");
    let chart = load_chart(fixture.path()).unwrap();
    let overlays = load_overlays(&[fixture.file("env/db.yaml")]).unwrap();

    let response = assemble(&chart, &overlays, &release(), &JinjaEngine::new()).unwrap();
    assert_eq!(
      response.preview_files[1].preview,
      "kind: Secret\nport: 6543\ndomain: test.local\n"
    );
  }

  #[test]
  fn disabling_a_dependency_drops_its_files() {
    let fixture = web_chart();
    fixture.write("env/nodb.yaml", "db:\n  enabled: false\n");
    let chart = load_chart(fixture.path()).unwrap();
    let overlays = load_overlays(&[fixture.file("env/nodb.yaml")]).unwrap();

    let response = assemble(&chart, &overlays, &release(), &JinjaEngine::new()).unwrap();
    assert!(response.preview_files.iter().all(|f| !f.filename.starts_with("db/")));
  }

  #[test]
  fn missing_overlay_fails_before_rendering() {
    let fixture = web_chart();
    fixture.write("templates/broken.yaml", "{% if %}");

    let err = RenderSource::load(fixture.path(), &[fixture.file("nope.yaml")], release()).unwrap_err();
    assert!(matches!(err, RenderError::Overlay(OverlayError::Read { .. })));
  }
}

mod failures {
  use super::*;

  #[test]
  fn dependency_version_mismatch() {
    let fixture = web_chart();
    fixture.write("charts/db/Chart.yaml", "apiVersion: v2\nname: db\nversion: 2.0.0\n");
    let chart = load_chart(fixture.path()).unwrap();

    let err = assemble(&chart, &[], &release(), &JinjaEngine::new()).unwrap_err();
    assert!(matches!(err, RenderError::Dependency(_)));
    assert!(err.to_string().contains("does not satisfy"), "{}", err);
  }

  #[test]
  fn strict_engine_reports_undefined_values() {
    let fixture = web_chart();
    fixture.write("templates/cm.yaml", "value: {{ Values.nothing }}\n");
    let chart = load_chart(fixture.path()).unwrap();

    assemble(&chart, &[], &release(), &JinjaEngine::new()).unwrap();
    let err = assemble(&chart, &[], &release(), &JinjaEngine::new().strict(true)).unwrap_err();
    assert!(matches!(err, RenderError::RenderEngine(_)));
  }
}

#[test]
fn source_renders_value_file_listing() {
  let fixture = Fixture::new("solo");
  fixture
    .write("templates/pod.yaml", "kind: Pod\n")
    .write("values/dev.yaml", "debug: true\n");

  let source = RenderSource::load(fixture.path(), &[fixture.file("values/dev.yaml")], ReleaseOptions::default()).unwrap();
  let response = source.render(&JinjaEngine::new()).unwrap();

  assert_eq!(
    response.chart,
    "apiVersion: v2\nname: solo\nversion: 0.1.0\n\n---\nvalue_files:\n- values/dev.yaml\n"
  );
  assert!(response.release.contains("Name: solo\n"));
  assert!(response.release.contains("Namespace: default\n"));
  assert!(response.release.contains("Revision: 1\n"));
  assert_eq!(response.preview, "# pod.yaml\nkind: Pod\n---\n");
}
