//! Well-known file names and defaults shared across the crate.

/// Chart metadata file at the root of every chart directory.
pub const CHART_FILE: &str = "Chart.yaml";

/// Default values shipped with a chart.
pub const VALUES_FILE: &str = "values.yaml";

/// Directory holding a chart's template files.
pub const TEMPLATES_DIR: &str = "templates";

/// Directory holding a chart's sub-charts (directories or `.tgz` archives).
pub const CHARTS_DIR: &str = "charts";

/// Template that is rendered for humans by the package manager but never emitted as a manifest.
pub const NOTES_FILE: &str = "NOTES.txt";

/// Key under which values are shared with every sub-chart.
pub const GLOBAL_KEY: &str = "global";

/// Namespace used when none is given.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Fixed port used while developing the viewer UI against a running server.
pub const DEV_HTTP_PORT: u16 = 17821;

/// Number of repository versions listed next to the chart metadata.
pub const VERSION_LISTING_LIMIT: usize = 20;

/// Kubernetes version advertised to templates through `Capabilities`.
pub const KUBE_VERSION: &str = "v1.29.0";

/// Index file served at the root of a chart repository.
pub const REPO_INDEX_FILE: &str = "index.yaml";
