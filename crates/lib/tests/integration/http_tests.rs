//! `/data` and the viewer over a real socket.

use std::sync::Arc;

use chartpeek_lib::assemble::{RenderResponse, RenderSource};
use chartpeek_lib::render::JinjaEngine;
use chartpeek_lib::server::{bind, router, serve_with_shutdown};
use chartpeek_lib::values::{ReleaseOptions, load_overlays};
use tokio::sync::oneshot;

use super::common::web_chart;

async fn start(source: RenderSource) -> (String, oneshot::Sender<()>, tokio::task::JoinHandle<()>) {
  let (listener, url) = bind(0).await.unwrap();
  let (stop, stopped) = oneshot::channel::<()>();
  let app = router(Arc::new(source), Arc::new(JinjaEngine::new()));
  let handle = tokio::spawn(async move {
    serve_with_shutdown(listener, app, async {
      let _ = stopped.await;
    })
    .await
    .unwrap();
  });
  (url, stop, handle)
}

#[tokio::test]
async fn data_round_trip() {
  let fixture = web_chart();
  fixture.write("env/prod.yaml", "replicas: 4\n");
  let source = RenderSource::load(
    fixture.path(),
    &[fixture.file("env/prod.yaml")],
    ReleaseOptions::new("", "prod", true),
  )
  .unwrap()
  .with_chart_versions(vec!["0.1.0 [2024-01-01T00:00:00Z]".to_string()]);
  let (url, stop, handle) = start(source).await;

  let response = reqwest::get(format!("{}/data", url)).await.unwrap();
  assert_eq!(response.status(), 200);
  assert_eq!(response.headers()["content-type"], "text/plain; charset=utf-8");
  assert_eq!(response.headers()["access-control-allow-origin"], "*");

  let data: RenderResponse = serde_json::from_str(&response.text().await.unwrap()).unwrap();
  assert_eq!(data.preview_files.len(), 4);
  assert_eq!(data.values, "replicas: 4\n");
  assert!(data.release.contains("Name: web\n"));
  assert!(data.release.contains("IsUpgrade: true\n"));
  assert!(data.chart.contains("\n---\nvalue_files:\n- env/prod.yaml\n"));
  assert!(data.chart.ends_with("\n---\nchart_versions:\n- 0.1.0 [2024-01-01T00:00:00Z]\n"));
  assert!(data.full_values.contains("replicas: 4\n"));
  assert!(data.render_values.contains("Release:\n"));

  stop.send(()).unwrap();
  handle.await.unwrap();
}

#[tokio::test]
async fn every_request_renders_again() {
  let fixture = web_chart();
  fixture.write("env/a.yaml", "replicas: 7\n");
  let chart_path = fixture.path().to_path_buf();
  let overlays = load_overlays(&[fixture.file("env/a.yaml")]).unwrap();
  let source = RenderSource::load(&chart_path, &[], ReleaseOptions::default())
    .unwrap()
    .with_overlays(vec!["env/a.yaml".to_string()], overlays);
  let (url, stop, handle) = start(source).await;

  let client = reqwest::Client::new();
  let first = client.get(format!("{}/data", url)).send().await.unwrap().text().await.unwrap();
  let second = client.get(format!("{}/data", url)).send().await.unwrap().text().await.unwrap();
  assert_eq!(first, second);
  assert!(first.contains("replicas: 7"));

  stop.send(()).unwrap();
  handle.await.unwrap();
}

#[tokio::test]
async fn broken_template_answers_500() {
  let fixture = web_chart();
  fixture.write("templates/broken.yaml", "{{ Values.replicas | nosuchfilter }}\n");
  let source = RenderSource::load(fixture.path(), &[], ReleaseOptions::default()).unwrap();
  let (url, stop, handle) = start(source).await;

  let response = reqwest::get(format!("{}/data", url)).await.unwrap();
  assert_eq!(response.status(), 500);
  let body = response.text().await.unwrap();
  assert!(body.starts_with("cannot render template using engine:"), "{}", body);
  assert!(body.contains("web/templates/broken.yaml"), "{}", body);

  let viewer = reqwest::get(&url).await.unwrap();
  assert_eq!(viewer.status(), 200);
  assert!(viewer.text().await.unwrap().contains("fetch(\"/data\")"));

  stop.send(()).unwrap();
  handle.await.unwrap();
}
